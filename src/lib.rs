//! Persistent prefix trie: a mutable build trie over byte-string keys,
//! a flat-file codec, and a memory-mapped reader that serves lookups
//! without copying or deserialising.

/// Error kinds
pub mod error;
mod idxmap;
mod node;
/// Offset widths of the flat-file codec
pub mod offset;
/// Flat-region and memory-mapped readers
pub mod read;
mod store;
/// Symbol alphabets and presence masks
pub mod symbols;
/// Build trie
pub mod trie;
/// Flat-file writer
pub mod write;

pub use self::error::Error;
pub use self::offset::{Offset, OffsetWidth};
pub use self::read::{FlatStore, FlatTrie, MmapTrie, RootFinder, trailer_root};
pub use self::symbols::{Alphabet, Bytes, Digits, Mask};
pub use self::trie::{Dir, Trie};
pub use self::write::{FileStore, PayloadEncoder};
