//! Static Huffman Compression
//!
//! The whole input is buffered, symbols are counted, and a Huffman tree is built
//! from the counts.  The resulting code table goes into the header (see the `header`
//! module), followed by the codes of every input byte packed MSB first.
//! The payload always ends with 1 to 8 zero bits of padding.
//!
//! * Ties among equal frequencies are broken by first-seen order, so the output is reproducible
//! * An input with a single distinct symbol is coded with the one bit code `0`
//! * An empty input produces an empty output
//!
//! Decoding reads the payload one byte at a time, growing a candidate code bit by bit
//! until it exactly matches an entry of the table.

use std::collections::HashMap;
use std::io::{Cursor,Read,Write,BufReader,BufWriter,ErrorKind};
use crate::tools::freq_table::FrequencyTable;
use crate::tools::huff_tree::HuffmanTree;
use crate::tools::code_table::{CodeTable,Codeword};
use crate::tools::bit_io::{BitWriter,BitReader};
use crate::header::Header;
use crate::{Error,Options};

/// Codeword to symbol lookup used while decoding
enum Lookup {
    /// the only code that can ever match
    Single {
        symbol: u8,
        code: Codeword
    },
    Table(HashMap<Codeword,u8>)
}

impl Lookup {
    fn create(table: &CodeTable) -> Self {
        match table.entries() {
            [(symbol,code)] => Lookup::Single {
                symbol: *symbol,
                code: *code
            },
            entries => Lookup::Table(entries.iter().map(|(s,c)| (*c,*s)).collect())
        }
    }
    fn get(&self,candidate: &Codeword) -> Option<u8> {
        match self {
            Lookup::Single { symbol, code } => match candidate==code {
                true => Some(*symbol),
                false => None
            },
            Lookup::Table(map) => map.get(candidate).copied()
        }
    }
}

/// Decoding session, holds all state between payload bytes.
struct Decoder {
    lookup: Lookup,
    /// a candidate this long that does not match can never match
    max_len: usize,
    padding: u8,
    bits: BitReader,
    /// bits taken from the queue that do not yet form a codeword
    candidate: Codeword,
    /// set once the final byte, which carries the padding, has been fed
    padding_consumed: bool
}

impl Decoder {
    fn create(header: &Header) -> Self {
        Self {
            lookup: Lookup::create(&header.table),
            max_len: header.table.max_len(),
            padding: header.padding,
            bits: BitReader::new(),
            candidate: Codeword::default(),
            padding_consumed: false
        }
    }
    /// Feed one payload byte and append the symbols it completes to `out`.
    /// For the last byte only the bits ahead of the padding are used.
    fn feed(&mut self,byte: u8,last: bool,out: &mut Vec<u8>) -> Result<(),Error> {
        let count = match last {
            true => {
                let mask = ((1u16 << self.padding) - 1) as u8;
                if byte & mask != 0 {
                    log::error!("padding bits are not zero: {:08b}",byte);
                    return Err(Error::CorruptPayload);
                }
                self.padding_consumed = true;
                8 - self.padding as usize
            },
            false => 8
        };
        self.bits.push_byte(byte,count);
        while let Some(bit) = self.bits.get_bit() {
            self.candidate.push(bit);
            if let Some(symbol) = self.lookup.get(&self.candidate) {
                log::trace!("{} -> {:#04x}",self.candidate,symbol);
                out.push(symbol);
                self.candidate.clear();
            } else if self.candidate.len() >= self.max_len {
                log::error!("no codeword matches {}",self.candidate);
                return Err(Error::CorruptPayload);
            }
        }
        Ok(())
    }
    /// After the last byte, nothing may be left over but the padding.
    fn finish(&self) -> Result<(),Error> {
        if !self.padding_consumed || self.bits.pending() > 0 {
            log::error!("payload ended before the padding");
            return Err(Error::CorruptPayload);
        }
        if !self.candidate.is_empty() {
            log::error!("unmatched bits {} run into the padding",self.candidate);
            return Err(Error::CorruptPayload);
        }
        Ok(())
    }
}

/// Write decoded symbols and empty the buffer, returns the count.
fn put_symbols<W: Write>(writer: &mut W,symbols: &mut Vec<u8>) -> Result<u64,Error> {
    writer.write_all(symbols).map_err(Error::SinkUnwritable)?;
    let ans = symbols.len() as u64;
    symbols.clear();
    Ok(ans)
}

/// Main compression function.
/// `expanded_in` is an object with the `Read` trait, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<(u64,u64),Error>
where R: Read, W: Write {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BufWriter::new(compressed_out);
    let mut dat = Vec::new();
    reader.by_ref().take(opt.max_file_size.saturating_add(1)).read_to_end(&mut dat).map_err(Error::SourceUnreadable)?;
    let in_size = dat.len() as u64;
    if in_size > opt.max_file_size {
        return Err(Error::FileTooLarge);
    }
    log::debug!("counting symbols in {} bytes",in_size);
    let freq = FrequencyTable::from_bytes(&dat);
    let table = match HuffmanTree::build(&freq) {
        Some(tree) => CodeTable::assign(&tree,&freq)?,
        None => {
            log::debug!("empty input, nothing to write");
            writer.flush().map_err(Error::SinkUnwritable)?;
            return Ok((0,0));
        }
    };
    let padding = table.padding(&freq);
    let header = Header::new(table,padding);
    let header_size = header.write(&mut writer)?;
    log::debug!("writing payload");
    let mut bits = BitWriter::new(&mut writer);
    for byte in &dat {
        bits.put_code(&header.table.get(*byte)).map_err(Error::SinkUnwritable)?;
    }
    let actual_padding = bits.finish().map_err(Error::SinkUnwritable)?;
    debug_assert_eq!(actual_padding,padding);
    let payload_size = bits.bytes_out();
    writer.flush().map_err(Error::SinkUnwritable)?;
    log::debug!("header {} bytes, payload {} bytes",header_size,payload_size);
    Ok((in_size,header_size + payload_size))
}

/// Main decompression function.
/// `compressed_in` is an object with the `Read` trait, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),Error>
where R: Read, W: Write {
    let mut reader = BufReader::new(compressed_in);
    let mut writer = BufWriter::new(expanded_out);
    let header = match Header::read(&mut reader)? {
        Some(h) => h,
        None => {
            writer.flush().map_err(Error::SinkUnwritable)?;
            return Ok((0,0));
        }
    };
    let mut decoder = Decoder::create(&header);
    let mut in_size = header.size();
    let mut out_size: u64 = 0;
    let mut symbols: Vec<u8> = Vec::new();
    // the byte most recently read, it is only decoded once we know whether it is the last
    let mut held: Option<u8> = None;
    let mut byte: [u8;1] = [0];
    log::debug!("entering loop over payload bytes");
    loop {
        match reader.read_exact(&mut byte) {
            Ok(()) => {
                in_size += 1;
                if in_size > opt.max_file_size {
                    return Err(Error::FileTooLarge);
                }
                if let Some(prev) = held.replace(byte[0]) {
                    decoder.feed(prev,false,&mut symbols)?;
                    out_size += put_symbols(&mut writer,&mut symbols)?;
                }
            },
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::SourceUnreadable(e))
        }
    }
    match held {
        Some(last) => decoder.feed(last,true,&mut symbols)?,
        None => {
            log::error!("header is not followed by a payload");
            return Err(Error::CorruptPayload);
        }
    }
    decoder.finish()?;
    out_size += put_symbols(&mut writer,&mut symbols)?;
    writer.flush().map_err(Error::SinkUnwritable)?;
    log::debug!("expanded {} bytes into {}",in_size,out_size);
    Ok((in_size,out_size))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}


// *************** TESTS *****************

#[cfg(test)]
use crate::STD_OPTIONS;

#[test]
fn compression_works() {
    // a:3 b:1 gives a=0 b=1, 4 data bits and 4 padding bits
    let test_data = "aaab".as_bytes();
    let huff_str = "02 61 01 00 00 62 01 80 00 04 10";
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode(huff_str.replace(" ","")).unwrap());
}

#[test]
fn compression_works_aligned() {
    // equal counts, a is taken first so it goes right, 8 data bits get a full byte of padding
    let test_data = "aaaabbbb".as_bytes();
    let huff_str = "02 61 01 80 00 62 01 00 00 08 F0 00";
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode(huff_str.replace(" ","")).unwrap());
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert!(compressed.len() < 2*test_data.len());
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "1234567".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "x".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_skewed() {
    // pseudo random bytes with a skewed distribution, long codes included
    let mut test_data = Vec::new();
    let mut state: u32 = 12345;
    for _i in 0..20000 {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let r = (state >> 16) & 0x7fff;
        test_data.push((r % (1 + r % 31)) as u8);
    }
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn empty_input() {
    let compressed = compress_slice(&[],&STD_OPTIONS).expect("compression failed");
    assert!(compressed.is_empty());
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn single_symbol() {
    let test_data = vec![b'a';1000];
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    // 1000 bits is byte aligned, so a whole byte of padding follows 125 bytes
    assert_eq!(compressed[0..6].to_vec(),hex::decode("016101000008").unwrap());
    assert_eq!(compressed.len(),6 + 126);
    let header = Header::read(&mut compressed.as_slice()).expect("read failed").expect("no header");
    assert_eq!(header.table.len(),1);
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn full_alphabet() {
    let mut test_data: Vec<u8> = (0..=255u8).collect();
    test_data.extend_from_slice("more of the usual letters".as_bytes());
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed[0],0);
    let header = Header::read(&mut compressed.as_slice()).expect("read failed").expect("no header");
    assert_eq!(header.table.len(),256);
    assert!(header.table.is_prefix_free());
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn prefix_free_codes() {
    let test_data = "It was the best of times, it was the worst of times.".as_bytes();
    let freq = FrequencyTable::from_bytes(test_data);
    let tree = HuffmanTree::build(&freq).expect("no tree");
    let table = CodeTable::assign(&tree,&freq).expect("assign failed");
    assert_eq!(table.len(),freq.len());
    assert!(table.is_prefix_free());
    // more frequent symbols never get longer codes
    for (s1,c1) in freq.iter() {
        for (s2,c2) in freq.iter() {
            if c1 > c2 {
                assert!(table.get(s1).len() <= table.get(s2).len());
            }
        }
    }
}

#[test]
fn deterministic_output() {
    let test_data = "abcdefgabcdefabcdeabcdabcaba".as_bytes();
    let first = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    for _i in 0..5 {
        assert_eq!(compress_slice(test_data,&STD_OPTIONS).expect("compression failed"),first);
    }
}

#[test]
fn oversized_codeword() {
    let mut counts: Vec<usize> = vec![1,1];
    for i in 2..18 {
        counts.push(counts[i-1] + counts[i-2]);
    }
    let mut test_data = Vec::new();
    for (symbol,count) in counts.iter().enumerate() {
        test_data.extend(std::iter::repeat(symbol as u8).take(*count));
    }
    match compress_slice(&test_data,&STD_OPTIONS) {
        Err(Error::OversizedCodeword { len, .. }) => assert_eq!(len,17),
        _ => panic!("expected oversized codeword")
    }
}

#[test]
fn truncated_header() {
    let compressed = hex::decode("05610100006201800004").unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::TruncatedHeader)));
    let compressed = hex::decode("02").unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::TruncatedHeader)));
}

#[test]
fn corrupt_payload() {
    // header without payload
    let compressed = hex::decode("02610100006201800004").unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::CorruptPayload)));
    // nonzero padding
    let compressed = hex::decode("0261010000620180000411").unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::CorruptPayload)));
    // a=0 b=10, the single data bit 1 runs into the padding
    let compressed = hex::decode("0261010000620280000780").unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::CorruptPayload)));
    // a=00 b=01, the bits 11 can never match
    let compressed = hex::decode("026102000062024000 02 C0".replace(" ","")).unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::CorruptPayload)));
    // single symbol a=0, a 1 bit is not a code
    let compressed = hex::decode("01610100000440").unwrap();
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::CorruptPayload)));
}

#[test]
fn size_limit() {
    let opt = Options { max_file_size: 8 };
    assert!(matches!(compress_slice("123456789".as_bytes(),&opt),Err(Error::FileTooLarge)));
    let compressed = compress_slice("aaab".as_bytes(),&STD_OPTIONS).expect("compression failed");
    assert!(matches!(expand_slice(&compressed,&opt),Err(Error::FileTooLarge)));
    assert!(compress_slice("12345678".as_bytes(),&opt).is_ok());
}

#[test]
fn independent_sessions() {
    let handles: Vec<std::thread::JoinHandle<Vec<u8>>> = (0..4).map(|i| {
        std::thread::spawn(move || {
            let test_data = format!("session {} says hello, hello, hello",i).into_bytes();
            let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
            let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
            assert_eq!(test_data,expanded);
            compressed
        })
    }).collect();
    let results: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().expect("thread panicked")).collect();
    assert_eq!(results[0],compress_slice("session 0 says hello, hello, hello".as_bytes(),&STD_OPTIONS).unwrap());
}
