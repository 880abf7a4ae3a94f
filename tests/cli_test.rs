use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const SAMPLE: &str = "HAMLET: To be, or not to be, that is the question:
Whether 'tis nobler in the mind to suffer
The slings and arrows of outrageous fortune,
Or to take arms against a sea of troubles
And by opposing end them.\r\n";

fn compress(in_path: &Path,out_path: Option<&Path>) -> Result<assert_cmd::assert::Assert,Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("statichuff")?;
    cmd.arg("compress").arg("-i").arg(in_path);
    if let Some(p) = out_path {
        cmd.arg("-o").arg(p);
    }
    Ok(cmd.assert())
}

fn expand(in_path: &Path,out_path: Option<&Path>) -> Result<assert_cmd::assert::Assert,Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("statichuff")?;
    cmd.arg("expand").arg("-i").arg(in_path);
    if let Some(p) = out_path {
        cmd.arg("-o").arg(p);
    }
    Ok(cmd.assert())
}

fn round_trip(dat: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original.txt");
    let cmp_path = temp_dir.path().join("compressed.spd");
    let out_path = temp_dir.path().join("expanded.txt");
    std::fs::write(&in_path,dat)?;
    compress(&in_path,Some(cmp_path.as_path()))?.success();
    expand(&cmp_path,Some(out_path.as_path()))?.success();
    match (std::fs::read(in_path),std::fs::read(out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn text_round_trip() -> STDRESULT {
    round_trip(SAMPLE.as_bytes())
}

#[test]
fn binary_round_trip() -> STDRESULT {
    let dat: Vec<u8> = (0..4096).map(|i: u32| ((i * 7919) % 251) as u8 ^ (i % 3) as u8).collect();
    round_trip(&dat)
}

#[test]
fn empty_round_trip() -> STDRESULT {
    round_trip(&[])
}

#[test]
fn compressed_bytes() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("aaab.txt");
    let cmp_path = temp_dir.path().join("aaab.spd");
    std::fs::write(&in_path,"aaab")?;
    compress(&in_path,Some(cmp_path.as_path()))?
        .success()
        .stderr(predicate::str::contains("compressed 4 into 11"));
    assert_eq!(std::fs::read(cmp_path)?,hex::decode("0261010000620180000410")?);
    Ok(())
}

#[test]
fn default_names() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("notes");
    std::fs::write(&in_path,SAMPLE)?;
    compress(&in_path,None)?.success();
    let cmp_path = temp_dir.path().join("notes.spd");
    assert!(cmp_path.exists());
    expand(&cmp_path,None)?.success();
    let out_path = temp_dir.path().join("notes.spd.txt");
    assert_eq!(std::fs::read(out_path)?,SAMPLE.as_bytes());
    Ok(())
}

#[test]
fn truncated_input_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let cmp_path = temp_dir.path().join("short.spd");
    let out_path = temp_dir.path().join("short.txt");
    // declares 5 symbols, provides 2
    std::fs::write(&cmp_path,hex::decode("05610100006201800004")?)?;
    expand(&cmp_path,Some(out_path.as_path()))?
        .failure()
        .stderr(predicate::str::contains("TruncatedHeader"));
    Ok(())
}

#[test]
fn missing_input_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("does_not_exist.txt");
    let cmp_path = temp_dir.path().join("does_not_exist.spd");
    compress(&in_path,Some(cmp_path.as_path()))?
        .failure()
        .stderr(predicate::str::contains("SourceUnreadable"));
    Ok(())
}
