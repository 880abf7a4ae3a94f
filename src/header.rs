//! Header of the compressed file.
//!
//! ```text
//! offset   size   field
//! 0        1      symbol count N, 0 means 256
//! 1        4*N    records: symbol, code length (1-16), code left aligned in 2 bytes big endian
//! 1+4*N    1      padding bits at the end of the payload (1-8)
//! ```
//!
//! An empty input has no header at all, so a stream that ends before the first
//! byte is read as empty, while a stream that ends anywhere after it is truncated.

use std::collections::HashSet;
use std::io::{Read,Write,ErrorKind};
use crate::tools::code_table::{CodeTable,Codeword};
use crate::Error;

/// size of one code table record in bytes
pub const RECORD_SIZE: usize = 4;

pub struct Header {
    pub table: CodeTable,
    /// number of zero bits completing the last payload byte
    pub padding: u8
}

/// read exactly `buf.len()` bytes, running out is a truncated header
fn read_field<R: Read>(reader: &mut R,buf: &mut [u8]) -> Result<(),Error> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            log::error!("header ended early");
            Err(Error::TruncatedHeader)
        },
        Err(e) => Err(Error::SourceUnreadable(e))
    }
}

impl Header {
    pub fn new(table: CodeTable,padding: u8) -> Self {
        Self {
            table,
            padding
        }
    }
    /// length of the serialized header in bytes
    pub fn size(&self) -> u64 {
        (2 + RECORD_SIZE * self.table.len()) as u64
    }
    /// Write the header, returns the number of bytes written.
    pub fn write<W: Write>(&self,writer: &mut W) -> Result<u64,Error> {
        let n = self.table.len();
        if n==0 || n > 256 || !(1..=8).contains(&self.padding) {
            return Err(Error::MalformedHeader);
        }
        let mut buf: Vec<u8> = Vec::with_capacity(self.size() as usize);
        // 256 does not fit, it is stored as 0
        buf.push((n % 256) as u8);
        for (symbol,code) in self.table.entries() {
            buf.push(*symbol);
            buf.push(code.len() as u8);
            buf.extend_from_slice(&code.to_field());
        }
        buf.push(self.padding);
        writer.write_all(&buf).map_err(Error::SinkUnwritable)?;
        log::debug!("header has {} symbols, padding {}",n,self.padding);
        Ok(buf.len() as u64)
    }
    /// Read the header, returns None if the stream is empty.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>,Error> {
        let mut count: [u8;1] = [0];
        loop {
            match reader.read(&mut count) {
                Ok(0) => {
                    log::debug!("empty stream, no header");
                    return Ok(None);
                },
                Ok(_) => break,
                Err(e) if e.kind()==ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::SourceUnreadable(e))
            }
        }
        let n = match count[0] {
            0 => 256,
            c => c as usize
        };
        log::debug!("header declares {} symbols",n);
        let mut records = vec![0;n*RECORD_SIZE];
        read_field(reader,&mut records)?;
        let mut padding: [u8;1] = [0];
        read_field(reader,&mut padding)?;
        let mut entries = Vec::with_capacity(n);
        let mut symbols_seen = HashSet::new();
        let mut codes_seen = HashSet::new();
        for rec in records.chunks_exact(RECORD_SIZE) {
            let code = match Codeword::from_field(rec[1] as usize,[rec[2],rec[3]]) {
                Some(c) => c,
                None => {
                    log::error!("symbol {:#04x} has code length {}",rec[0],rec[1]);
                    return Err(Error::MalformedHeader);
                }
            };
            if !symbols_seen.insert(rec[0]) || !codes_seen.insert(code) {
                log::error!("duplicate record for symbol {:#04x}",rec[0]);
                return Err(Error::MalformedHeader);
            }
            entries.push((rec[0],code));
        }
        if !(1..=8).contains(&padding[0]) {
            log::error!("padding {} is out of range",padding[0]);
            return Err(Error::MalformedHeader);
        }
        Ok(Some(Self {
            table: CodeTable::from_entries(entries),
            padding: padding[0]
        }))
    }
}

#[cfg(test)]
fn table_of(pairs: &[(u8,&str)]) -> CodeTable {
    CodeTable::from_entries(pairs.iter().map(|(s,c)| (*s,Codeword::parse(c).expect("bad code"))).collect())
}

#[test]
fn header_bytes() {
    let header = Header::new(table_of(&[(b'a',"0"),(b'b',"1")]),4);
    let mut buf: Vec<u8> = Vec::new();
    assert_eq!(header.write(&mut buf).expect("write failed"),10);
    assert_eq!(buf,hex::decode("02610100006201800004").unwrap());
    let restored = Header::read(&mut buf.as_slice()).expect("read failed").expect("no header");
    assert_eq!(restored.padding,4);
    assert_eq!(restored.table.entries(),header.table.entries());
}

#[test]
fn full_alphabet_uses_zero() {
    // 256 codes of length 8
    let pairs: Vec<(u8,Codeword)> = (0..=255u8).map(|s| {
        Codeword::from_field(8,[s,0]).map(|c| (s,c)).expect("bad code")
    }).collect();
    let header = Header::new(CodeTable::from_entries(pairs),8);
    let mut buf: Vec<u8> = Vec::new();
    header.write(&mut buf).expect("write failed");
    assert_eq!(buf[0],0);
    assert_eq!(buf.len(),2 + 256*RECORD_SIZE);
    let restored = Header::read(&mut buf.as_slice()).expect("read failed").expect("no header");
    assert_eq!(restored.table.len(),256);
}

#[test]
fn truncated() {
    // declares 5 records but only 2 follow
    let buf = hex::decode("05610100006201800004").unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::TruncatedHeader)));
    // records complete but padding missing
    let buf = hex::decode("026101000062018000").unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::TruncatedHeader)));
    let buf: Vec<u8> = Vec::new();
    assert!(matches!(Header::read(&mut buf.as_slice()),Ok(None)));
}

#[test]
fn malformed() {
    // code length 0
    let buf = hex::decode("0161000000 04".replace(" ","")).unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::MalformedHeader)));
    // code length 17
    let buf = hex::decode("0161110000 04".replace(" ","")).unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::MalformedHeader)));
    // padding 0 and 9
    let buf = hex::decode("0161010000 00".replace(" ","")).unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::MalformedHeader)));
    let buf = hex::decode("0161010000 09".replace(" ","")).unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::MalformedHeader)));
    // same symbol twice, same code twice
    let buf = hex::decode("02 61010000 61018000 04".replace(" ","")).unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::MalformedHeader)));
    let buf = hex::decode("02 61010000 62010000 04".replace(" ","")).unwrap();
    assert!(matches!(Header::read(&mut buf.as_slice()),Err(Error::MalformedHeader)));
    // trailing bits of the code field are ignored
    let buf = hex::decode("01 61017fff 04".replace(" ","")).unwrap();
    let header = Header::read(&mut buf.as_slice()).expect("read failed").expect("no header");
    assert_eq!(header.table.get(b'a').to_string(),"0");
}
