use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// First byte of every trie file; whether the reader consumes it is the
/// root-finder's business.
pub(crate) const MAGIC: u8 = b'A';

/// Encodes payloads into the output file.
///
/// `encode` writes the payload (if any) through `out` and returns the
/// offset it starts at, or `None` when the payload is to be treated as
/// absent and recorded as the null sentinel.
pub trait PayloadEncoder<T> {
    fn encode(&mut self, value: &T, out: &mut FileStore) -> Result<Option<u64>, Error>;
}

/// Buffered output file tracking the write position.
///
/// The guard keeps the path until [`commit`](Self::commit): dropping an
/// uncommitted store closes the file and removes it, so an aborted
/// export leaves no partial file visible. Failures while closing during
/// drop are swallowed; the error that aborted the export propagates
/// instead.
pub struct FileStore {
    out: BufWriter<File>,
    path: PathBuf,
    pos: u64,
    committed: bool,
}

impl FileStore {
    pub fn create(path: &Path) -> Result<Self, Error> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
            pos: 0,
            committed: false,
        })
    }

    /// Append `bytes`, returning the offset they start at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64, Error> {
        let at = self.pos;
        self.out.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(at)
    }

    /// Current write position.
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Flush and keep the file.
    pub fn commit(mut self) -> Result<(), Error> {
        self.out.flush()?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[test]
fn test_append_tracks_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");
    let mut out = FileStore::create(&path).unwrap();
    assert_eq!(0, out.append(b"abc").unwrap());
    assert_eq!(3, out.append(b"").unwrap());
    assert_eq!(3, out.append(b"de").unwrap());
    assert_eq!(5, out.tell());
    out.commit().unwrap();
    assert_eq!(b"abcde".to_vec(), fs::read(&path).unwrap());
}

#[test]
fn test_uncommitted_file_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.bin");
    {
        let mut out = FileStore::create(&path).unwrap();
        out.append(b"half a trie").unwrap();
    }
    assert!(!path.exists());
}
