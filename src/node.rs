use crate::idxmap;
use crate::store::NodeId;
use crate::symbols::Mask;

/// Sparse symbol-to-child map: a presence mask plus a dense child array
/// in symbol-ascending order.
#[derive(Default)]
pub(crate) struct SymbolVec {
    mask: Mask,
    children: Vec<NodeId>,
}

impl SymbolVec {
    pub fn get(&self, index: u8) -> Option<NodeId> {
        if !self.mask.test(index) {
            return None;
        }
        Some(self.children[self.slot(index)])
    }

    /// Link a child at the rank position of its symbol. The symbol must
    /// not be present yet.
    pub fn insert(&mut self, index: u8, id: NodeId) {
        let at = self.slot(index);
        self.children.insert(at, id);
        self.mask.set(index);
    }

    /// Entries in symbol-ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.mask.iter().zip(self.children.iter().copied())
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    fn slot(&self, index: u8) -> usize {
        // table fast path for the digit alphabet
        match self.mask.low10() {
            Some(low) if index < 10 => usize::from(idxmap::rank(low, index)),
            _ => self.mask.rank(index),
        }
    }
}

/// A payload slot plus the child map. Payload emptiness is a caller
/// concept; the node itself does not track it.
#[derive(Default)]
pub(crate) struct Node<T> {
    pub data: T,
    pub children: SymbolVec,
}

#[cfg(test)]
fn id(slot: u32) -> NodeId {
    NodeId::fake(slot)
}

#[test]
fn test_symbol_vec_order() {
    let mut map = SymbolVec::default();
    map.insert(5, id(0));
    map.insert(1, id(1));
    map.insert(9, id(2));
    map.insert(3, id(3));
    assert_eq!(4, map.len());
    assert_eq!(Some(id(1)), map.get(1));
    assert_eq!(Some(id(3)), map.get(3));
    assert_eq!(Some(id(0)), map.get(5));
    assert_eq!(Some(id(2)), map.get(9));
    assert_eq!(None, map.get(0));
    assert_eq!(None, map.get(4));
    let order: Vec<u8> = map.iter().map(|(index, _)| index).collect();
    assert_eq!(vec![1, 3, 5, 9], order);
}

#[test]
fn test_symbol_vec_wide_indices() {
    // indices past the table fast path fall back to the bitmap rank
    let mut map = SymbolVec::default();
    map.insert(200, id(0));
    map.insert(7, id(1));
    map.insert(63, id(2));
    map.insert(64, id(3));
    let order: Vec<u8> = map.iter().map(|(index, _)| index).collect();
    assert_eq!(vec![7, 63, 64, 200], order);
    assert_eq!(Some(id(3)), map.get(64));
    assert_eq!(None, map.get(65));
}
