//! # statichuff
//!
//! File compression with a static Huffman code.  The code is built from the
//! byte frequencies of the whole input, stored in a small header, and followed
//! by the bit-packed payload.
//!
//! * `huffman` has the `compress` and `expand` entry points
//! * `header` reads and writes the code table
//! * `tools` has the frequency table, tree, code table, and bit level I/O

pub mod tools;
pub mod header;
pub mod huffman;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("source could not be read: {0}")]
    SourceUnreadable(#[source] std::io::Error),
    #[error("sink could not be written: {0}")]
    SinkUnwritable(#[source] std::io::Error),
    #[error("header is truncated")]
    TruncatedHeader,
    #[error("header is malformed")]
    MalformedHeader,
    #[error("codeword for symbol {symbol:#04x} needs {len} bits, limit is 16")]
    OversizedCodeword {
        symbol: u8,
        len: usize
    },
    #[error("payload is corrupt")]
    CorruptPayload,
    #[error("file too large")]
    FileTooLarge
}

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// return error if the input (compress) or the compressed stream (expand) is larger
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    max_file_size: u32::MAX as u64
};

#[test]
fn errors_display() {
    let e = Error::OversizedCodeword { symbol: 0x41, len: 17 };
    assert_eq!(e.to_string(),"codeword for symbol 0x41 needs 17 bits, limit is 16");
    let e = Error::SourceUnreadable(std::io::Error::new(std::io::ErrorKind::NotFound,"gone"));
    assert!(std::error::Error::source(&e).is_some());
}
