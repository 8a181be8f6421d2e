use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Error;
use crate::offset::Offset;
use crate::symbols::{Alphabet, Digits, Mask};
use crate::trie::{Dir, index_of};

/// Read-only node and payload store over a flat byte region.
///
/// Pointer values are file-absolute offsets; dereferencing never copies.
/// Every access is bounds-checked and an out-of-range offset reports
/// [`Error::CorruptStore`] with the offending offset. Deallocation is
/// meaningless here; the region outlives every lookup.
#[derive(Clone, Copy)]
pub struct FlatStore<'a> {
    region: &'a [u8],
}

impl<'a> FlatStore<'a> {
    #[must_use]
    pub fn new(region: &'a [u8]) -> Self {
        Self { region }
    }

    /// Bounds-checked slice of the region; this is what fold functors
    /// use to decode payload bytes.
    pub fn bytes(&self, offset: u64, len: usize) -> Result<&'a [u8], Error> {
        usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(len).map(|end| start..end))
            .and_then(|range| self.region.get(range))
            .ok_or(Error::CorruptStore { offset })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.region.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Parse the node header at `at`: payload offset, presence mask,
    /// then one child offset per set mask bit.
    fn node<A: Alphabet, O: Offset>(&self, at: O) -> Result<FlatNode<'a, O>, Error> {
        let offset = at.to_u64();
        let header = self.bytes(offset, O::WIDTH + A::MASK_BYTES)?;
        let payload = O::read_from(header);
        let mask = Mask::read_le(&header[O::WIDTH..]);
        let children = self.bytes(
            offset + (O::WIDTH + A::MASK_BYTES) as u64,
            mask.count() * O::WIDTH,
        )?;
        Ok(FlatNode {
            payload,
            mask,
            children,
        })
    }
}

/// Parsed node header borrowed from the region.
struct FlatNode<'a, O> {
    payload: O,
    mask: Mask,
    children: &'a [u8],
}

impl<O: Offset> FlatNode<'_, O> {
    fn child(&self, index: u8) -> Option<O> {
        if !self.mask.test(index) {
            return None;
        }
        Some(self.child_at(self.mask.rank(index)))
    }

    fn child_at(&self, rank: usize) -> O {
        O::read_from(&self.children[rank * O::WIDTH..])
    }
}

/// Root-finder policy: inspects the region and yields the root node
/// offset. Supplied at open time, so alternative layouts (a root-first
/// file, say) need no reader changes.
pub type RootFinder<O> = fn(&[u8]) -> Result<O, Error>;

/// Default root finder: the trailer holds the root offset in the last
/// `WIDTH` bytes. A region too short for the magic byte plus a trailer
/// has lost its trailer and is corrupt, as is a root pointing at or
/// past the trailer.
pub fn trailer_root<O: Offset>(region: &[u8]) -> Result<O, Error> {
    if region.len() < O::WIDTH + 1 {
        return Err(Error::CorruptStore {
            offset: region.len() as u64,
        });
    }
    let root = O::read_from(&region[region.len() - O::WIDTH..]);
    if root.to_u64() >= (region.len() - O::WIDTH) as u64 {
        return Err(Error::CorruptStore {
            offset: root.to_u64(),
        });
    }
    Ok(root)
}

/// Read-only trie view over a serialised byte region.
///
/// Shares the fold / fold_full / for_each contract with the build trie,
/// except that the payload argument is the raw payload offset (possibly
/// [`Offset::NULL`]) together with the store to decode it from.
pub struct FlatTrie<'a, A: Alphabet = Digits, O: Offset = u32> {
    store: FlatStore<'a>,
    root: O,
    _alphabet: PhantomData<A>,
}

impl<'a, A: Alphabet, O: Offset> FlatTrie<'a, A, O> {
    /// Open a region with the default trailer root finder.
    pub fn new(region: &'a [u8]) -> Result<Self, Error> {
        Self::with_root_finder(region, trailer_root::<O>)
    }

    pub fn with_root_finder(region: &'a [u8], find_root: RootFinder<O>) -> Result<Self, Error> {
        let root = find_root(region)?;
        Ok(Self {
            store: FlatStore::new(region),
            root,
            _alphabet: PhantomData,
        })
    }

    /// The underlying store, for decoding payload offsets a fold left
    /// in its accumulator. From a mapped trie this is the only way at
    /// the region once the fold has returned.
    #[must_use]
    pub fn store(&self) -> &FlatStore<'a> {
        &self.store
    }

    /// Key-guided walk over existing nodes; same contract as the build
    /// trie's fold, with the payload offset in place of the payload.
    pub fn fold<B, F>(&self, key: &[u8], acc: &mut B, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&mut B, O, &FlatStore<'a>, u32, bool) -> bool,
    {
        let mut node = self.store.node::<A, O>(self.root)?;
        for (pos, &sym) in key.iter().enumerate() {
            let index = index_of::<A>(sym)?;
            let Some(next) = node.child(index) else {
                return Ok(());
            };
            node = self.store.node::<A, O>(next)?;
            let has_next = pos + 1 < key.len();
            if !f(acc, node.payload, &self.store, pos as u32 + 1, has_next) {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Like [`fold`](Self::fold), but when the walk stops short of the
    /// key's end, `f` is called once more with [`Offset::NULL`] at the
    /// position of the missing symbol; `has_next` is `true` there.
    pub fn fold_full<B, F>(&self, key: &[u8], acc: &mut B, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&mut B, O, &FlatStore<'a>, u32, bool) -> bool,
    {
        let mut node = self.store.node::<A, O>(self.root)?;
        for (pos, &sym) in key.iter().enumerate() {
            let index = index_of::<A>(sym)?;
            let Some(next) = node.child(index) else {
                f(acc, O::NULL, &self.store, pos as u32 + 1, true);
                return Ok(());
            };
            node = self.store.node::<A, O>(next)?;
            let has_next = pos + 1 < key.len();
            if !f(acc, node.payload, &self.store, pos as u32 + 1, has_next) {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Visit every node with its accumulated key, in the same order the
    /// build trie visits them.
    pub fn for_each<F>(&self, dir: Dir, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&[u8], O, &FlatStore<'a>),
    {
        let mut key = Vec::new();
        self.visit(self.root, dir, &mut key, &mut f)
    }

    fn visit<F>(&self, at: O, dir: Dir, key: &mut Vec<u8>, f: &mut F) -> Result<(), Error>
    where
        F: FnMut(&[u8], O, &FlatStore<'a>),
    {
        let node = self.store.node::<A, O>(at)?;
        if dir == Dir::Down {
            f(key, node.payload, &self.store);
        }
        for (rank, index) in node.mask.iter().enumerate() {
            key.push(A::symbol(index));
            self.visit(node.child_at(rank), dir, key, f)?;
            key.pop();
        }
        if dir == Dir::Up {
            f(key, node.payload, &self.store);
        }
        Ok(())
    }
}

/// Persistent trie in a memory-mapped file: load once, look up with no
/// copying and no deserialisation.
///
/// The region is mapped read-only and is safe to share across threads
/// and processes; dropping the trie unmaps it.
pub struct MmapTrie<A: Alphabet = Digits, O: Offset = u32> {
    map: Mmap,
    root: O,
    _alphabet: PhantomData<A>,
}

impl<A: Alphabet, O: Offset> MmapTrie<A, O> {
    /// Map `path` read-only and locate the root via the trailer.
    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::open_with(path, trailer_root::<O>)
    }

    /// Map `path` read-only with a caller-supplied root finder.
    pub fn open_with(path: &Path, find_root: RootFinder<O>) -> Result<Self, Error> {
        let file = File::open(path)?;
        // the mapping is never written through; truncating the file
        // behind a live mapping is the caller's contract to avoid
        let map = unsafe { Mmap::map(&file)? };
        let root = find_root(&map)?;
        Ok(Self {
            map,
            root,
            _alphabet: PhantomData,
        })
    }

    /// Borrowed view over the mapped region.
    #[must_use]
    pub fn view(&self) -> FlatTrie<'_, A, O> {
        FlatTrie {
            store: FlatStore::new(&self.map),
            root: self.root,
            _alphabet: PhantomData,
        }
    }

    pub fn fold<'s, B, F>(&'s self, key: &[u8], acc: &mut B, f: F) -> Result<(), Error>
    where
        F: FnMut(&mut B, O, &FlatStore<'s>, u32, bool) -> bool,
    {
        self.view().fold(key, acc, f)
    }

    pub fn fold_full<'s, B, F>(&'s self, key: &[u8], acc: &mut B, f: F) -> Result<(), Error>
    where
        F: FnMut(&mut B, O, &FlatStore<'s>, u32, bool) -> bool,
    {
        self.view().fold_full(key, acc, f)
    }

    pub fn for_each<'s, F>(&'s self, dir: Dir, f: F) -> Result<(), Error>
    where
        F: FnMut(&[u8], O, &FlatStore<'s>),
    {
        self.view().for_each(dir, f)
    }
}

#[test]
fn test_trailer_root() {
    // magic, one leaf node (null payload, empty mask), trailer -> leaf
    let region = [b'A', 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
    assert_eq!(1u32, trailer_root::<u32>(&region).unwrap());
    assert!(matches!(
        trailer_root::<u32>(&region[..4]),
        Err(Error::CorruptStore { .. })
    ));
    // root pointing into the trailer
    let bad = [b'A', 0x01, 0x00, 0x00, 0x00];
    assert!(matches!(
        trailer_root::<u32>(&bad),
        Err(Error::CorruptStore { offset: 1 })
    ));
}

#[test]
fn test_flat_store_bounds() {
    let region = [1u8, 2, 3, 4];
    let store = FlatStore::new(&region);
    assert_eq!(4, store.len());
    assert!(!store.is_empty());
    assert_eq!(&[2u8, 3][..], store.bytes(1, 2).unwrap());
    assert!(matches!(
        store.bytes(3, 2),
        Err(Error::CorruptStore { offset: 3 })
    ));
    assert!(store.bytes(u64::MAX, 1).is_err());
    assert!(FlatStore::new(&[]).is_empty());
}

#[test]
fn test_flat_node_parse() {
    // node with children under symbols 0 and 3 (digit mask 0b1001)
    let mut region = vec![b'A'];
    region.extend_from_slice(&[0x07, 0x00]); // payload offset 7
    region.extend_from_slice(&[0x09, 0x00]); // mask
    region.extend_from_slice(&[0x20, 0x00]); // child 0 at 0x20
    region.extend_from_slice(&[0x30, 0x00]); // child 3 at 0x30
    let store = FlatStore::new(&region);
    let node = store.node::<Digits, u16>(1u16).unwrap();
    assert_eq!(7, node.payload);
    assert_eq!(Some(0x20), node.child(0));
    assert_eq!(None, node.child(1));
    assert_eq!(Some(0x30), node.child(3));
    // header running past the region
    assert!(matches!(
        store.node::<Digits, u16>(6u16),
        Err(Error::CorruptStore { .. })
    ));
}
