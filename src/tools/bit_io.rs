//! Bit level I/O, most significant bit first.
//!
//! The writer packs codes into bytes and passes each finished byte to the sink.
//! The reader is fed whole bytes (or the meaningful part of the final byte) and
//! hands out bits one at a time.

use std::io::Write;
use bit_vec::BitVec;
use super::code_table::Codeword;

/// Packs bits into a byte sink.  Each session owns its own partial byte.
pub struct BitWriter<W: Write> {
    writer: W,
    /// partial byte, filled from the MSB
    acc: u8,
    /// number of bits in `acc`, 0-7
    count: u8,
    bytes_out: u64
}

impl <W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            acc: 0,
            count: 0,
            bytes_out: 0
        }
    }
    pub fn put_bit(&mut self,bit: bool) -> std::io::Result<()> {
        if bit {
            self.acc |= 1 << (7 - self.count);
        }
        self.count += 1;
        if self.count==8 {
            self.writer.write_all(&[self.acc])?;
            self.bytes_out += 1;
            self.acc = 0;
            self.count = 0;
        }
        Ok(())
    }
    pub fn put_code(&mut self,code: &Codeword) -> std::io::Result<()> {
        for bit in code.iter() {
            self.put_bit(bit)?;
        }
        Ok(())
    }
    /// Pad with zeros up to the next byte boundary and return the number of padding bits.
    /// If already aligned, a whole zero byte is written, so the answer is always 1-8.
    pub fn finish(&mut self) -> std::io::Result<u8> {
        let padding = 8 - self.count;
        for _i in 0..padding {
            self.put_bit(false)?;
        }
        log::trace!("payload padded with {} bits",padding);
        Ok(padding)
    }
    /// number of complete bytes passed to the sink
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Queue of bits waiting to be matched.
pub struct BitReader {
    bits: BitVec,
    ptr: usize
}

impl BitReader {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
            ptr: 0
        }
    }
    /// keep the bit vector small, we don't need the bits behind us
    fn drop_leading_bits(&mut self) {
        let cpy = self.bits.clone();
        self.bits = BitVec::new();
        for bit in cpy.iter().skip(self.ptr) {
            self.bits.push(bit);
        }
        self.ptr = 0;
    }
    /// Append the `count` most significant bits of `byte`.
    pub fn push_byte(&mut self,byte: u8,count: usize) {
        if self.ptr > 512 || (self.ptr > 0 && self.ptr==self.bits.len()) {
            self.drop_leading_bits();
        }
        for i in 0..count.min(8) {
            self.bits.push(byte & (0x80 >> i) > 0);
        }
    }
    /// Next bit in the queue, or None if all bits were consumed.
    pub fn get_bit(&mut self) -> Option<bool> {
        let ans = self.bits.get(self.ptr);
        if ans.is_some() {
            self.ptr += 1;
        }
        ans
    }
    /// number of bits not yet consumed
    pub fn pending(&self) -> usize {
        self.bits.len() - self.ptr
    }
}

impl Default for BitReader {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn writer_packs_msb_first() {
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    writer.put_code(&Codeword::parse("101").expect("bad code")).expect("write failed");
    writer.put_code(&Codeword::parse("11").expect("bad code")).expect("write failed");
    assert_eq!(writer.bytes_out(),0);
    assert_eq!(writer.finish().expect("write failed"),3);
    assert_eq!(writer.bytes_out(),1);
    assert_eq!(out,vec![0b10111000]);
}

#[test]
fn aligned_payload_gets_full_padding() {
    let mut out: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut out);
    for _i in 0..8 {
        writer.put_bit(true).expect("write failed");
    }
    assert_eq!(writer.finish().expect("write failed"),8);
    assert_eq!(out,vec![0xff,0x00]);
}

#[test]
fn reader_queue() {
    let mut reader = BitReader::new();
    reader.push_byte(0b1010_0000,3);
    assert_eq!(reader.pending(),3);
    assert_eq!(reader.get_bit(),Some(true));
    assert_eq!(reader.get_bit(),Some(false));
    reader.push_byte(0xff,8);
    assert_eq!(reader.pending(),9);
    assert_eq!(reader.get_bit(),Some(true));
    for _i in 0..8 {
        assert_eq!(reader.get_bit(),Some(true));
    }
    assert_eq!(reader.get_bit(),None);
    reader.push_byte(0x00,1);
    assert_eq!(reader.pending(),1);
    assert_eq!(reader.get_bit(),Some(false));
}
