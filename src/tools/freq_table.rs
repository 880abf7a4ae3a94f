//! Symbol frequency table.
//! Counts are kept per byte value, and the distinct values are remembered in
//! the order they were first seen.  That order fixes the layout of the code table,
//! and also serves as the tie-break when building the tree.

/// Occurrence counts of every byte value in an input
#[derive(Clone)]
pub struct FrequencyTable {
    counts: [u64;256],
    /// distinct symbols in first-seen order
    order: Vec<u8>
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            counts: [0;256],
            order: Vec::new()
        }
    }
    /// Count every byte in `dat`
    pub fn from_bytes(dat: &[u8]) -> Self {
        let mut ans = Self::new();
        for b in dat {
            ans.add(*b,1);
        }
        ans
    }
    /// Build from explicit `(symbol,count)` pairs, zero counts are skipped and repeated symbols accumulate.
    pub fn from_counts(pairs: &[(u8,u64)]) -> Self {
        let mut ans = Self::new();
        for (symbol,count) in pairs {
            if *count > 0 {
                ans.add(*symbol,*count);
            }
        }
        ans
    }
    fn add(&mut self,symbol: u8,count: u64) {
        let slot = &mut self.counts[symbol as usize];
        if *slot == 0 {
            self.order.push(symbol);
        }
        *slot += count;
    }
    pub fn count(&self,symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }
    /// distinct symbols in first-seen order
    pub fn symbols(&self) -> &[u8] {
        &self.order
    }
    /// number of distinct symbols
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
    /// sum of all counts, i.e., length of the input
    pub fn total(&self) -> u64 {
        self.order.iter().map(|s| self.counts[*s as usize]).sum()
    }
    /// `(symbol,count)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (u8,u64)> + '_ {
        self.order.iter().map(|s| (*s,self.counts[*s as usize]))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn first_seen_order() {
    let freq = FrequencyTable::from_bytes("abracadabra".as_bytes());
    assert_eq!(freq.symbols(),"abrcd".as_bytes());
    assert_eq!(freq.count(b'a'),5);
    assert_eq!(freq.count(b'b'),2);
    assert_eq!(freq.count(b'z'),0);
    assert_eq!(freq.len(),5);
    assert_eq!(freq.total(),11);
}

#[test]
fn explicit_counts() {
    let freq = FrequencyTable::from_counts(&[(7,3),(2,0),(9,1),(7,2)]);
    let pairs: Vec<(u8,u64)> = freq.iter().collect();
    assert_eq!(pairs,vec![(7,5),(9,1)]);
    assert!(FrequencyTable::from_bytes(&[]).is_empty());
}
