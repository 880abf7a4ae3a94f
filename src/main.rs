use clap::{arg,crate_version,Command};
use statichuff::{huffman,Error,STD_OPTIONS};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";
const COMPRESSED_EXT: &str = ".spd";
const EXPANDED_EXT: &str = ".txt";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        if std::io::stdin().read_line(&mut ans).is_err() {
            return false;
        }
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            log::warn!("existing file will not be truncated");
            return true;
        }
        return false;
    }
    true
}

/// open input and output, the output is not truncated, caller sets the length when done
fn open_files(path_in: &str,path_out: &str) -> Result<(std::fs::File,std::fs::File),Error> {
    let in_file = std::fs::File::open(path_in).map_err(Error::SourceUnreadable)?;
    let out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)
        .map_err(Error::SinkUnwritable)?;
    Ok((in_file,out_file))
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `statichuff compress -i my_file.txt -o my_file.spd`
Expand:        `statichuff expand -i my_file.spd -o my_file.txt`
Default names: `statichuff compress -i my_file` writes `my_file.spd`,
               `statichuff expand -i my_file.spd` writes `my_file.spd.txt`";

    let mut main_cmd = Command::new("statichuff")
        .about("Compress and expand with static Huffman codes")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path, default is input path with .spd appended").required(false))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path, default is input path with .txt appended").required(false))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = match cmd.get_one::<String>("output") {
            Some(p) => p.to_owned(),
            None => [path_in.as_str(),COMPRESSED_EXT].concat()
        };
        if !ok_to_overwrite(&path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let (mut in_file,mut out_file) = open_files(path_in,&path_out)?;
        log::info!("compressing {} into {}",path_in,path_out);
        let (in_size,out_size) = huffman::compress(&mut in_file,&mut out_file,&STD_OPTIONS)?;
        out_file.set_len(out_size).map_err(Error::SinkUnwritable)?;
        eprintln!("compressed {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = match cmd.get_one::<String>("output") {
            Some(p) => p.to_owned(),
            None => [path_in.as_str(),EXPANDED_EXT].concat()
        };
        if !ok_to_overwrite(&path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let (mut in_file,mut out_file) = open_files(path_in,&path_out)?;
        log::info!("expanding {} into {}",path_in,path_out);
        let (in_size,out_size) = huffman::expand(&mut in_file,&mut out_file,&STD_OPTIONS)?;
        out_file.set_len(out_size).map_err(Error::SinkUnwritable)?;
        eprintln!("expanded {} into {}",in_size,out_size);
    }

    Ok(())
}
