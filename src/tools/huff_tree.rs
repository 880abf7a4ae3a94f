//! Static Huffman tree.
//!
//! Nodes live in an arena and refer to their children by index.  The tree is
//! built once from a frequency table, walked once to assign codes, and dropped.
//!
//! Tie-break rule, which is part of the file format: the heap is ordered by
//! `(frequency, arena index)`.  Leaves enter the arena in first-seen order and
//! internal nodes are appended as they are created, so among equal frequencies
//! the node inserted first comes out first.  Of the two nodes taken from the heap,
//! the first becomes the right (1) child and the second the left (0) child.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use bit_vec::BitVec;
use super::freq_table::FrequencyTable;
use super::code_table::Codeword;
use crate::Error;

enum Node {
    Leaf {
        symbol: u8,
        freq: u64
    },
    Internal {
        freq: u64,
        left: usize,
        right: usize
    }
}

impl Node {
    fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal { freq, .. } => *freq
        }
    }
}

pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize
}

impl HuffmanTree {
    /// Build the tree, returns None if there are no symbols.
    /// With one symbol the root is that symbol's leaf.
    pub fn build(freq: &FrequencyTable) -> Option<Self> {
        if freq.is_empty() {
            return None;
        }
        let mut nodes: Vec<Node> = freq.iter().map(|(symbol,freq)| Node::Leaf { symbol, freq }).collect();
        let mut heap: BinaryHeap<Reverse<(u64,usize)>> = nodes.iter()
            .enumerate()
            .map(|(i,node)| Reverse((node.freq(),i)))
            .collect();
        let mut root = 0;
        while let Some(Reverse((right_freq,right))) = heap.pop() {
            let Some(Reverse((left_freq,left))) = heap.pop() else {
                root = right;
                break;
            };
            let freq = left_freq + right_freq;
            nodes.push(Node::Internal { freq, left, right });
            heap.push(Reverse((freq,nodes.len()-1)));
        }
        log::debug!("tree has {} nodes for {} symbols",nodes.len(),freq.len());
        Some(Self {
            nodes,
            root
        })
    }
    /// total frequency, equal to the input length
    pub fn weight(&self) -> u64 {
        self.nodes[self.root].freq()
    }
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n,Node::Leaf { .. })).count()
    }
    /// Walk the tree depth first, left=0, right=1, and return the code of every leaf
    /// in the order visited.  A lone leaf gets the code `0`.
    pub fn assign_codes(&self) -> Result<Vec<(u8,Codeword)>,Error> {
        let mut ans = Vec::new();
        if let Node::Leaf { symbol, .. } = self.nodes[self.root] {
            let mut code = Codeword::default();
            code.push(false);
            ans.push((symbol,code));
            return Ok(ans);
        }
        let mut path = BitVec::new();
        self.walk(self.root,&mut path,&mut ans)?;
        Ok(ans)
    }
    fn walk(&self,idx: usize,path: &mut BitVec,ans: &mut Vec<(u8,Codeword)>) -> Result<(),Error> {
        match &self.nodes[idx] {
            Node::Leaf { symbol, .. } => {
                let code = Codeword::from_bits(path).ok_or(Error::OversizedCodeword {
                    symbol: *symbol,
                    len: path.len()
                })?;
                log::trace!("symbol {:#04x} has code {}",symbol,code);
                ans.push((*symbol,code));
            },
            Node::Internal { left, right, .. } => {
                path.push(false);
                self.walk(*left,path,ans)?;
                path.pop();
                path.push(true);
                self.walk(*right,path,ans)?;
                path.pop();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
fn codes_as_strings(tree: &HuffmanTree) -> Vec<(u8,String)> {
    tree.assign_codes().expect("assign failed").iter().map(|(s,c)| (*s,c.to_string())).collect()
}

#[test]
fn two_symbols() {
    let freq = FrequencyTable::from_bytes("aaab".as_bytes());
    let tree = HuffmanTree::build(&freq).expect("no tree");
    assert_eq!(tree.weight(),4);
    assert_eq!(codes_as_strings(&tree),vec![(b'a',"0".to_string()),(b'b',"1".to_string())]);
}

#[test]
fn equal_frequencies() {
    // a,b are combined first (a on the right), then c,d, then the two pairs
    let freq = FrequencyTable::from_bytes("abcd".as_bytes());
    let tree = HuffmanTree::build(&freq).expect("no tree");
    assert_eq!(tree.leaf_count(),4);
    assert_eq!(codes_as_strings(&tree),vec![
        (b'd',"00".to_string()),
        (b'c',"01".to_string()),
        (b'b',"10".to_string()),
        (b'a',"11".to_string())
    ]);
}

#[test]
fn single_and_empty() {
    assert!(HuffmanTree::build(&FrequencyTable::new()).is_none());
    let freq = FrequencyTable::from_bytes(&[b'z';10]);
    let tree = HuffmanTree::build(&freq).expect("no tree");
    assert_eq!(tree.weight(),10);
    assert_eq!(codes_as_strings(&tree),vec![(b'z',"0".to_string())]);
}

#[test]
fn oversized_codeword() {
    // Fibonacci counts make a chain, the deepest leaves sit at depth 17
    let mut fib: Vec<(u8,u64)> = vec![(0,1),(1,1)];
    for i in 2..18 {
        fib.push((i as u8,fib[i-1].1 + fib[i-2].1));
    }
    let freq = FrequencyTable::from_counts(&fib);
    let tree = HuffmanTree::build(&freq).expect("no tree");
    match tree.assign_codes() {
        Err(Error::OversizedCodeword { len, .. }) => assert_eq!(len,17),
        _ => panic!("expected oversized codeword")
    }
    // one fewer symbol fits exactly
    let freq = FrequencyTable::from_counts(&fib[0..17]);
    let tree = HuffmanTree::build(&freq).expect("no tree");
    let codes = tree.assign_codes().expect("assign failed");
    assert_eq!(codes.iter().map(|(_,c)| c.len()).max(),Some(16));
}
