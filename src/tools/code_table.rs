//! Codewords and the symbol to codeword table.
//!
//! A codeword is at most 16 bits, which is the width of the codeword field in
//! the header.  The table keeps its entries in first-seen order of the symbols,
//! which is also the record order on disk.

use std::fmt;
use bit_vec::BitVec;
use super::freq_table::FrequencyTable;
use super::huff_tree::HuffmanTree;
use crate::Error;

/// longest codeword the header can store
pub const MAX_CODE_LEN: usize = 16;

/// A bit string of length 0 to 16.
/// The bits are right aligned, so the first bit of the code is at position `len-1`.
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug,Default)]
pub struct Codeword {
    bits: u16,
    len: u8
}

impl Codeword {
    /// Convert a tree path, returns None if the path is too long to store.
    pub fn from_bits(path: &BitVec) -> Option<Self> {
        if path.len() > MAX_CODE_LEN {
            return None;
        }
        let mut ans = Self::default();
        for bit in path.iter() {
            ans.push(bit);
        }
        Some(ans)
    }
    /// Parse a string of `0` and `1`, mostly useful for tests and logging.
    pub fn parse(s: &str) -> Option<Self> {
        let mut path = BitVec::new();
        for c in s.chars() {
            match c {
                '0' => path.push(false),
                '1' => path.push(true),
                _ => return None
            }
        }
        Self::from_bits(&path)
    }
    /// Recover a codeword from its header field, the code is left aligned in
    /// big endian order, bits beyond `len` are ignored.
    pub fn from_field(len: usize,field: [u8;2]) -> Option<Self> {
        if len==0 || len > MAX_CODE_LEN {
            return None;
        }
        Some(Self {
            bits: u16::from_be_bytes(field) >> (MAX_CODE_LEN - len),
            len: len as u8
        })
    }
    /// Left aligned big endian field for the header, unused bits are 0.
    pub fn to_field(&self) -> [u8;2] {
        match self.len {
            0 => [0,0],
            l => (self.bits << (MAX_CODE_LEN - l as usize)).to_be_bytes()
        }
    }
    pub fn len(&self) -> usize {
        self.len as usize
    }
    pub fn is_empty(&self) -> bool {
        self.len==0
    }
    /// append one bit, caller must not exceed MAX_CODE_LEN
    pub fn push(&mut self,bit: bool) {
        debug_assert!(self.len() < MAX_CODE_LEN);
        self.bits = (self.bits << 1) | bit as u16;
        self.len += 1;
    }
    pub fn clear(&mut self) {
        self.bits = 0;
        self.len = 0;
    }
    /// bit `i` counting from the start of the code
    pub fn bit(&self,i: usize) -> bool {
        (self.bits >> (self.len() - 1 - i)) & 1 > 0
    }
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(|i| self.bit(i))
    }
    /// true if self is a prefix of `other`, including equality
    pub fn is_prefix_of(&self,other: &Self) -> bool {
        if self.len > other.len {
            return false;
        }
        if self.len==0 {
            return true;
        }
        other.bits >> (other.len - self.len) == self.bits
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            write!(f,"{}",match bit { true => '1', false => '0' })?;
        }
        Ok(())
    }
}

/// Symbol to codeword mapping, with entries kept in header order.
#[derive(Clone)]
pub struct CodeTable {
    entries: Vec<(u8,Codeword)>,
    /// direct lookup for encoding, symbols that are not in the table have an empty code
    by_symbol: [Codeword;256]
}

impl CodeTable {
    /// Assign codes by walking the tree, then order them like the frequency table.
    pub fn assign(tree: &HuffmanTree,freq: &FrequencyTable) -> Result<Self,Error> {
        let mut by_symbol = [Codeword::default();256];
        for (symbol,code) in tree.assign_codes()? {
            by_symbol[symbol as usize] = code;
        }
        let entries = freq.symbols().iter().map(|s| (*s,by_symbol[*s as usize])).collect();
        Ok(Self {
            entries,
            by_symbol
        })
    }
    /// Table in the given order, e.g. as read from a header.
    pub fn from_entries(entries: Vec<(u8,Codeword)>) -> Self {
        let mut by_symbol = [Codeword::default();256];
        for (symbol,code) in &entries {
            by_symbol[*symbol as usize] = *code;
        }
        Self {
            entries,
            by_symbol
        }
    }
    pub fn entries(&self) -> &[(u8,Codeword)] {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// codeword for `symbol`, empty if the symbol is not in the table
    pub fn get(&self,symbol: u8) -> Codeword {
        self.by_symbol[symbol as usize]
    }
    /// length of the longest codeword
    pub fn max_len(&self) -> usize {
        self.entries.iter().map(|(_,c)| c.len()).max().unwrap_or(0)
    }
    /// number of payload bits that coding `freq` produces, not counting padding
    pub fn payload_bits(&self,freq: &FrequencyTable) -> u64 {
        freq.iter().map(|(s,count)| count * self.get(s).len() as u64).sum()
    }
    /// Padding that will complete the last payload byte, always 1 to 8.
    pub fn padding(&self,freq: &FrequencyTable) -> u8 {
        8 - (self.payload_bits(freq) % 8) as u8
    }
    /// check that no codeword is a prefix of another
    pub fn is_prefix_free(&self) -> bool {
        for (i,(_,a)) in self.entries.iter().enumerate() {
            for (j,(_,b)) in self.entries.iter().enumerate() {
                if i!=j && a.is_prefix_of(b) {
                    return false;
                }
            }
        }
        true
    }
}

#[test]
fn field_layout() {
    let code = Codeword::parse("101").expect("bad code");
    assert_eq!(code.to_field(),[0xa0,0x00]);
    assert_eq!(Codeword::from_field(3,[0xbf,0xff]),Some(code));
    let code = Codeword::parse("1000000000000001").expect("bad code");
    assert_eq!(code.to_field(),[0x80,0x01]);
    assert_eq!(Codeword::from_field(16,[0x80,0x01]),Some(code));
    assert_eq!(Codeword::from_field(0,[0,0]),None);
    assert_eq!(Codeword::from_field(17,[0,0]),None);
    assert_eq!(Codeword::parse("10000000000000011"),None);
}

#[test]
fn prefixes() {
    let a = Codeword::parse("10").expect("bad code");
    let b = Codeword::parse("101").expect("bad code");
    let c = Codeword::parse("011").expect("bad code");
    assert!(a.is_prefix_of(&b));
    assert!(!b.is_prefix_of(&a));
    assert!(!a.is_prefix_of(&c));
    assert_eq!(b.to_string(),"101");
    let table = CodeTable::from_entries(vec![(1,a),(2,b)]);
    assert!(!table.is_prefix_free());
    let table = CodeTable::from_entries(vec![(1,a),(2,c)]);
    assert!(table.is_prefix_free());
    assert_eq!(table.get(2),c);
    assert!(table.get(3).is_empty());
    assert_eq!(table.max_len(),3);
}

#[test]
fn padding_counts() {
    let freq = FrequencyTable::from_bytes("aaab".as_bytes());
    let table = CodeTable::from_entries(vec![
        (b'a',Codeword::parse("0").expect("bad code")),
        (b'b',Codeword::parse("1").expect("bad code"))
    ]);
    assert_eq!(table.payload_bits(&freq),4);
    assert_eq!(table.padding(&freq),4);
    let freq = FrequencyTable::from_bytes("aaaabbbb".as_bytes());
    assert_eq!(table.padding(&freq),8);
}
