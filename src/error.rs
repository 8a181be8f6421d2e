use std::{error, fmt, io};

/// Errors reported by trie operations and the flat-file codec.
///
/// Nothing is retried inside the crate; every error surfaces to the
/// caller as-is.
#[derive(Debug)]
pub enum Error {
    /// Node allocation failed against the store's node budget.
    OutOfMemory,
    /// A non-null pointer value did not resolve to a node. Carries the
    /// offending offset: the slot index for a build store, the file
    /// offset for a flat store.
    CorruptStore { offset: u64 },
    /// A computed file offset is not representable in the chosen offset
    /// width. The caller may retry the export with a wider width.
    OffsetOverflow { offset: u64, width: usize },
    /// A key symbol outside the trie's alphabet, or a region too small
    /// to carry the format.
    BadArgument(&'static str),
    /// Underlying I/O failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("node store exhausted"),
            Self::CorruptStore { offset } => {
                write!(f, "bad store pointer at offset {offset}")
            }
            Self::OffsetOverflow { offset, width } => {
                write!(f, "offset {offset} not representable in {width} byte(s)")
            }
            Self::BadArgument(what) => f.write_str(what),
            Self::Io(err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
