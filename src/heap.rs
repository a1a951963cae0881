/*!
# Addressable Mergeable Pairing Heap

A priority queue used pervasively by the matching solver for best-edge
selection. Beyond the usual `insert` / `find_min` / `delete_min` it supports

- `decrease_key` and `delete` through **handles** returned by `insert`,
- destructive `meld` of two heaps where handles of the absorbed heap
  **keep working** against the surviving heap.

All heap nodes live in one shared arena, the [`PairingForest`]. A heap is
identified by a [`HeapId`]; melding marks the absorbed header and points it
at the survivor, forming a union-find forest over headers. Handle operations
resolve their current owner by a path-compressing walk of these pointers,
so handle validity survives any number of melds without iteration.

The heap itself is a classic pairing heap: `delete_min` performs multi-pass
pairing (left-to-right pairing of adjacent siblings, then a right-to-left
fold), `meld` concatenates root lists with a single comparison-link, and
`decrease_key` detaches the subtree and links it with the root.

Keys are floats (any [`num::Float`]) and must not be NaN. Amortized `O(log n)` for `insert`,
`delete_min`, `decrease_key`, `meld`; `O(1)` for `find_min`.

Every method comes in a checked `try_`-variant returning a [`HeapError`]
and an unchecked variant that panics on misuse, mirroring the
`try_add_edge` / `add_edge` split of the graph editing traits.
*/

use std::fmt::Display;

use num::Float;
use smallvec::SmallVec;

const EMPTY: u32 = u32::MAX;

/// Identifier of a single heap inside a [`PairingForest`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeapId(u32);

/// Addressable reference to an element previously inserted into a heap.
///
/// Stays valid until the element is deleted (directly or via `delete_min`),
/// even if the owning heap has since been melded away.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeapHandle {
    slot: u32,
    generation: u32,
}

/// Error conditions of the checked heap operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeapError {
    /// The heap was absorbed by a `meld` and can no longer be used directly.
    Melded,
    /// The handle's element was already removed from its heap.
    InvalidHandle,
    /// `decrease_key` was called with a key larger than the current one.
    KeyNotDecreased,
}

impl Display for HeapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeapError::Melded => write!(f, "heap already melded"),
            HeapError::InvalidHandle => write!(f, "heap handle no longer addresses an element"),
            HeapError::KeyNotDecreased => write!(f, "new key is larger than the current key"),
        }
    }
}

impl std::error::Error for HeapError {}

#[derive(Debug, Clone)]
struct HeapNode<K, V> {
    key: K,
    value: V,
    generation: u32,
    /// Heap this node was inserted into; resolved through the header
    /// union-find on access, so it may lag behind melds
    heap: u32,
    /// Leftmost child
    child: u32,
    /// Right sibling
    next: u32,
    /// Left sibling, or the parent if this is the leftmost child
    prev: u32,
    occupied: bool,
}

#[derive(Debug, Copy, Clone)]
struct HeapHeader {
    /// Union-find parent; `self` while the heap is live
    owner: u32,
    root: u32,
    count: u32,
    melded: bool,
}

/// Arena owning any number of pairing heaps that may meld into each other.
///
/// # Example
/// ```
/// # use wmatching::heap::PairingForest;
/// let mut forest = PairingForest::new();
/// let a = forest.new_heap();
/// let b = forest.new_heap();
///
/// let h1 = forest.insert(a, 3.0, "x");
/// forest.insert(b, 1.0, "y");
///
/// forest.meld(a, b);
/// assert_eq!(forest.count(a), 2);
/// assert_eq!(*forest.peek_min(a).unwrap().1, "y");
///
/// // handles survive the meld
/// forest.decrease_key(h1, 0.5);
/// assert_eq!(*forest.peek_min(a).unwrap().1, "x");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PairingForest<K, V> {
    nodes: Vec<HeapNode<K, V>>,
    free: Vec<u32>,
    heaps: Vec<HeapHeader>,
}

impl<K: Float, V> PairingForest<K, V> {
    /// Creates an empty forest with no heaps.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            heaps: Vec::new(),
        }
    }

    /// Creates an empty forest with room for `nodes` elements and `heaps` heaps.
    pub fn with_capacity(nodes: usize, heaps: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            free: Vec::new(),
            heaps: Vec::with_capacity(heaps),
        }
    }

    /// Creates a new, empty heap and returns its identifier.
    pub fn new_heap(&mut self) -> HeapId {
        let id = self.heaps.len() as u32;
        self.heaps.push(HeapHeader {
            owner: id,
            root: EMPTY,
            count: 0,
            melded: false,
        });
        HeapId(id)
    }

    /// Resolves a possibly-absorbed heap to its live owner, compressing the
    /// walked chain.
    fn find_owner(&mut self, heap: u32) -> u32 {
        let mut root = heap;
        while self.heaps[root as usize].owner != root {
            root = self.heaps[root as usize].owner;
        }
        // Path compression
        let mut cur = heap;
        while cur != root {
            let next = self.heaps[cur as usize].owner;
            self.heaps[cur as usize].owner = root;
            cur = next;
        }
        root
    }

    fn require_live(&self, heap: HeapId) -> Result<u32, HeapError> {
        if self.heaps[heap.0 as usize].melded {
            Err(HeapError::Melded)
        } else {
            Ok(heap.0)
        }
    }

    fn resolve_handle(&self, handle: HeapHandle) -> Result<u32, HeapError> {
        let node = self
            .nodes
            .get(handle.slot as usize)
            .ok_or(HeapError::InvalidHandle)?;
        if !node.occupied || node.generation != handle.generation {
            return Err(HeapError::InvalidHandle);
        }
        Ok(handle.slot)
    }

    /// Links two root nodes; the one with the smaller key becomes the parent.
    fn link(&mut self, a: u32, b: u32) -> u32 {
        debug_assert!(a != EMPTY && b != EMPTY && a != b);

        let (winner, loser) = if self.nodes[a as usize].key <= self.nodes[b as usize].key {
            (a, b)
        } else {
            (b, a)
        };

        let first_child = self.nodes[winner as usize].child;
        self.nodes[loser as usize].next = first_child;
        self.nodes[loser as usize].prev = winner;
        if first_child != EMPTY {
            self.nodes[first_child as usize].prev = loser;
        }
        self.nodes[winner as usize].child = loser;
        self.nodes[winner as usize].next = EMPTY;
        self.nodes[winner as usize].prev = EMPTY;

        winner
    }

    /// Unlinks `node` from its sibling list, fixing the parent's child
    /// pointer if `node` was the leftmost child. `node` must not be a root.
    fn detach(&mut self, node: u32) {
        let prev = self.nodes[node as usize].prev;
        let next = self.nodes[node as usize].next;
        debug_assert_ne!(prev, EMPTY);

        if self.nodes[prev as usize].child == node {
            self.nodes[prev as usize].child = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next != EMPTY {
            self.nodes[next as usize].prev = prev;
        }

        self.nodes[node as usize].prev = EMPTY;
        self.nodes[node as usize].next = EMPTY;
    }

    /// Multi-pass pairing of a sibling list: pair adjacent trees left to
    /// right, then fold the pairs right to left into a single tree.
    fn pair_siblings(&mut self, first: u32) -> u32 {
        if first == EMPTY {
            return EMPTY;
        }

        let mut paired: SmallVec<[u32; 16]> = SmallVec::new();
        let mut cur = first;
        while cur != EMPTY {
            let a = cur;
            let a_next = self.nodes[a as usize].next;
            self.nodes[a as usize].prev = EMPTY;
            self.nodes[a as usize].next = EMPTY;

            if a_next == EMPTY {
                paired.push(a);
                break;
            }

            let b = a_next;
            cur = self.nodes[b as usize].next;
            self.nodes[b as usize].prev = EMPTY;
            self.nodes[b as usize].next = EMPTY;

            paired.push(self.link(a, b));
        }

        let mut root = paired.pop().unwrap();
        while let Some(tree) = paired.pop() {
            root = self.link(root, tree);
        }
        root
    }

    fn alloc(&mut self, heap: u32, key: K, value: V) -> u32 {
        if let Some(slot) = self.free.pop() {
            let node = &mut self.nodes[slot as usize];
            node.key = key;
            node.value = value;
            node.heap = heap;
            node.child = EMPTY;
            node.next = EMPTY;
            node.prev = EMPTY;
            node.occupied = true;
            slot
        } else {
            let slot = self.nodes.len() as u32;
            self.nodes.push(HeapNode {
                key,
                value,
                generation: 0,
                heap,
                child: EMPTY,
                next: EMPTY,
                prev: EMPTY,
                occupied: true,
            });
            slot
        }
    }

    fn release(&mut self, slot: u32) {
        let node = &mut self.nodes[slot as usize];
        node.occupied = false;
        node.generation += 1;
        self.free.push(slot);
    }

    /// Removes `slot` from the tree structure of the heap with header `h`
    /// without releasing it.
    fn unlink_anywhere(&mut self, h: u32, slot: u32) {
        if self.heaps[h as usize].root == slot {
            let children = self.nodes[slot as usize].child;
            self.nodes[slot as usize].child = EMPTY;
            self.heaps[h as usize].root = self.pair_siblings(children);
        } else {
            self.detach(slot);
            let children = self.nodes[slot as usize].child;
            self.nodes[slot as usize].child = EMPTY;
            let sub = self.pair_siblings(children);
            if sub != EMPTY {
                let root = self.heaps[h as usize].root;
                self.heaps[h as usize].root = self.link(root, sub);
            }
        }
        self.heaps[h as usize].count -= 1;
    }

    /// Finds the live heap that currently owns the handle's element.
    ///
    /// The node remembers the heap it was inserted into; that heap may have
    /// been melded away since, so the stored id is resolved through the
    /// header union-find and refreshed. This lazy refresh is the only place
    /// where an otherwise read-only-looking handle access mutates state.
    fn owner_of(&mut self, slot: u32) -> u32 {
        let stored = self.nodes[slot as usize].heap;
        let owner = self.find_owner(stored);
        self.nodes[slot as usize].heap = owner;
        owner
    }

    // ---------- Checked Operations ----------

    /// Inserts `(key, value)` into `heap` and returns an addressable handle.
    pub fn try_insert(&mut self, heap: HeapId, key: K, value: V) -> Result<HeapHandle, HeapError> {
        debug_assert!(!key.is_nan());
        let h = self.require_live(heap)?;

        let slot = self.alloc(h, key, value);
        let root = self.heaps[h as usize].root;
        self.heaps[h as usize].root = if root == EMPTY {
            slot
        } else {
            self.link(root, slot)
        };
        self.heaps[h as usize].count += 1;

        Ok(HeapHandle {
            slot,
            generation: self.nodes[slot as usize].generation,
        })
    }

    /// Returns key and value of the minimum element without removing it.
    pub fn try_peek_min(&self, heap: HeapId) -> Result<Option<(K, &V)>, HeapError> {
        let h = self.require_live(heap)?;
        let root = self.heaps[h as usize].root;
        Ok((root != EMPTY).then(|| {
            let node = &self.nodes[root as usize];
            (node.key, &node.value)
        }))
    }

    /// Removes and returns the minimum element.
    pub fn try_delete_min(&mut self, heap: HeapId) -> Result<Option<(K, V)>, HeapError>
    where
        V: Copy,
    {
        let h = self.require_live(heap)?;
        let root = self.heaps[h as usize].root;
        if root == EMPTY {
            return Ok(None);
        }

        let children = self.nodes[root as usize].child;
        self.nodes[root as usize].child = EMPTY;
        self.heaps[h as usize].root = self.pair_siblings(children);
        self.heaps[h as usize].count -= 1;

        let key = self.nodes[root as usize].key;
        let value = self.nodes[root as usize].value;
        self.release(root);

        Ok(Some((key, value)))
    }

    /// Lowers the key of the element addressed by `handle` to `new_key`.
    ///
    /// Fails with [`HeapError::KeyNotDecreased`] if `new_key` is strictly
    /// larger than the current key.
    pub fn try_decrease_key(&mut self, handle: HeapHandle, new_key: K) -> Result<(), HeapError> {
        debug_assert!(!new_key.is_nan());
        let slot = self.resolve_handle(handle)?;

        if new_key > self.nodes[slot as usize].key {
            return Err(HeapError::KeyNotDecreased);
        }
        self.nodes[slot as usize].key = new_key;

        if self.nodes[slot as usize].prev != EMPTY {
            let h = self.owner_of(slot);
            self.detach(slot);
            let root = self.heaps[h as usize].root;
            self.heaps[h as usize].root = self.link(root, slot);
        }

        Ok(())
    }

    /// Removes the element addressed by `handle` from its heap.
    pub fn try_delete(&mut self, handle: HeapHandle) -> Result<(K, V), HeapError>
    where
        V: Copy,
    {
        let slot = self.resolve_handle(handle)?;
        let h = self.owner_of(slot);

        self.unlink_anywhere(h, slot);

        let key = self.nodes[slot as usize].key;
        let value = self.nodes[slot as usize].value;
        self.release(slot);

        Ok((key, value))
    }

    /// Melds `other` into `heap`. Afterwards `other` is unusable for direct
    /// operations, but handles into it keep addressing `heap`.
    pub fn try_meld(&mut self, heap: HeapId, other: HeapId) -> Result<(), HeapError> {
        let a = self.require_live(heap)?;
        let b = self.require_live(other)?;
        if a == b {
            return Ok(());
        }

        let b_root = self.heaps[b as usize].root;
        let b_count = self.heaps[b as usize].count;
        self.heaps[b as usize].melded = true;
        self.heaps[b as usize].owner = a;
        self.heaps[b as usize].root = EMPTY;
        self.heaps[b as usize].count = 0;

        if b_root != EMPTY {
            let a_root = self.heaps[a as usize].root;
            self.heaps[a as usize].root = if a_root == EMPTY {
                b_root
            } else {
                self.link(a_root, b_root)
            };
            self.heaps[a as usize].count += b_count;
        }

        Ok(())
    }

    /// Removes all elements of `heap`, releasing their slots.
    pub fn try_clear(&mut self, heap: HeapId) -> Result<(), HeapError>
    where
        V: Copy,
    {
        while self.try_delete_min(heap)?.is_some() {}
        Ok(())
    }

    // ---------- Unchecked Operations ----------
    //
    // Panic on the conditions the `try_`-variants report. The matching
    // solver never triggers them and uses these directly.

    /// See [`PairingForest::try_insert`]. **Panics if `heap` was melded.**
    pub fn insert(&mut self, heap: HeapId, key: K, value: V) -> HeapHandle {
        match self.try_insert(heap, key, value) {
            Ok(handle) => handle,
            Err(e) => panic!("insert: {e}"),
        }
    }

    /// See [`PairingForest::try_peek_min`]. **Panics if `heap` was melded.**
    pub fn peek_min(&self, heap: HeapId) -> Option<(K, &V)> {
        match self.try_peek_min(heap) {
            Ok(min) => min,
            Err(e) => panic!("peek_min: {e}"),
        }
    }

    /// Key of the minimum element, if any. **Panics if `heap` was melded.**
    pub fn min_key(&self, heap: HeapId) -> Option<K> {
        self.peek_min(heap).map(|(key, _)| key)
    }

    /// Handle of the minimum element, if any. **Panics if `heap` was melded.**
    pub fn min_handle(&self, heap: HeapId) -> Option<HeapHandle> {
        match self.require_live(heap) {
            Ok(h) => {
                let root = self.heaps[h as usize].root;
                (root != EMPTY).then(|| HeapHandle {
                    slot: root,
                    generation: self.nodes[root as usize].generation,
                })
            }
            Err(e) => panic!("min_handle: {e}"),
        }
    }

    /// See [`PairingForest::try_delete_min`]. **Panics if `heap` was melded.**
    pub fn delete_min(&mut self, heap: HeapId) -> Option<(K, V)>
    where
        V: Copy,
    {
        match self.try_delete_min(heap) {
            Ok(min) => min,
            Err(e) => panic!("delete_min: {e}"),
        }
    }

    /// See [`PairingForest::try_decrease_key`]. **Panics on stale handles
    /// and increasing keys.**
    pub fn decrease_key(&mut self, handle: HeapHandle, new_key: K) {
        if let Err(e) = self.try_decrease_key(handle, new_key) {
            panic!("decrease_key: {e}");
        }
    }

    /// See [`PairingForest::try_delete`]. **Panics on stale handles.**
    pub fn delete(&mut self, handle: HeapHandle) -> (K, V)
    where
        V: Copy,
    {
        match self.try_delete(handle) {
            Ok(entry) => entry,
            Err(e) => panic!("delete: {e}"),
        }
    }

    /// See [`PairingForest::try_meld`]. **Panics if either heap was melded.**
    pub fn meld(&mut self, heap: HeapId, other: HeapId) {
        if let Err(e) = self.try_meld(heap, other) {
            panic!("meld: {e}");
        }
    }

    /// See [`PairingForest::try_clear`]. **Panics if `heap` was melded.**
    pub fn clear(&mut self, heap: HeapId)
    where
        V: Copy,
    {
        if let Err(e) = self.try_clear(heap) {
            panic!("clear: {e}");
        }
    }

    /// Number of elements in `heap`. **Panics if `heap` was melded.**
    pub fn count(&self, heap: HeapId) -> u32 {
        match self.require_live(heap) {
            Ok(h) => self.heaps[h as usize].count,
            Err(e) => panic!("count: {e}"),
        }
    }

    /// Returns `true` if `heap` has no elements. **Panics if `heap` was melded.**
    pub fn is_empty(&self, heap: HeapId) -> bool {
        self.count(heap) == 0
    }

    /// Returns the heap that `heap` resolved to after all melds.
    pub fn surviving_heap(&mut self, heap: HeapId) -> HeapId {
        HeapId(self.find_owner(heap.0))
    }

    /// Value stored at `handle`. **Panics on stale handles.**
    pub fn value(&self, handle: HeapHandle) -> &V {
        match self.resolve_handle(handle) {
            Ok(slot) => &self.nodes[slot as usize].value,
            Err(e) => panic!("value: {e}"),
        }
    }

    /// Key stored at `handle`. **Panics on stale handles.**
    pub fn key(&self, handle: HeapHandle) -> K {
        match self.resolve_handle(handle) {
            Ok(slot) => self.nodes[slot as usize].key,
            Err(e) => panic!("key: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn insert_and_delete_min_sorts() {
        let rng = &mut Pcg64Mcg::seed_from_u64(7);
        let mut forest = PairingForest::new();
        let heap = forest.new_heap();

        let mut keys = (0..200).map(|_| rng.random_range(0..1000) as f64).collect_vec();
        for (i, &key) in keys.iter().enumerate() {
            forest.insert(heap, key, i);
        }

        keys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut drained = Vec::new();
        while let Some((key, _)) = forest.delete_min(heap) {
            drained.push(key);
        }

        assert_eq!(keys, drained);
        assert!(forest.is_empty(heap));
    }

    #[test]
    fn decrease_key_moves_to_front() {
        let mut forest = PairingForest::new();
        let heap = forest.new_heap();

        forest.insert(heap, 1.0, 'a');
        let h = forest.insert(heap, 5.0, 'b');
        forest.insert(heap, 3.0, 'c');

        forest.decrease_key(h, 0.5);
        assert_eq!(forest.delete_min(heap), Some((0.5, 'b')));
        assert_eq!(forest.delete_min(heap), Some((1.0, 'a')));
    }

    #[test]
    fn decrease_key_rejects_increase() {
        let mut forest = PairingForest::new();
        let heap = forest.new_heap();
        let h = forest.insert(heap, 2.0, ());

        assert_eq!(forest.try_decrease_key(h, 3.0), Err(HeapError::KeyNotDecreased));
        // equal keys are fine
        assert_eq!(forest.try_decrease_key(h, 2.0), Ok(()));
    }

    #[test]
    fn delete_arbitrary_element() {
        let mut forest = PairingForest::new();
        let heap = forest.new_heap();

        let handles = (0..10)
            .map(|i| forest.insert(heap, i as f64, i))
            .collect_vec();

        assert_eq!(forest.delete(handles[4]), (4.0, 4));
        assert_eq!(forest.count(heap), 9);
        assert_eq!(forest.try_delete(handles[4]), Err(HeapError::InvalidHandle));

        let drained = std::iter::from_fn(|| forest.delete_min(heap).map(|(_, v)| v)).collect_vec();
        assert_eq!(drained, vec![0, 1, 2, 3, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn meld_absorbs_and_invalidates_source() {
        let mut forest = PairingForest::new();
        let a = forest.new_heap();
        let b = forest.new_heap();

        forest.insert(a, 3.0, 0);
        let hb = forest.insert(b, 1.0, 1);

        forest.meld(a, b);
        assert_eq!(forest.count(a), 2);
        assert_eq!(forest.try_insert(b, 0.0, 2), Err(HeapError::Melded));
        assert_eq!(forest.try_peek_min(b), Err(HeapError::Melded));

        // the handle into `b` now addresses `a`
        forest.decrease_key(hb, 0.1);
        assert_eq!(forest.delete_min(a), Some((0.1, 1)));
        assert_eq!(forest.surviving_heap(b), a);
    }

    #[test]
    fn meld_chain_resolves_through_compression() {
        let mut forest = PairingForest::new();
        let heaps = (0..8).map(|_| forest.new_heap()).collect_vec();
        let handle = forest.insert(heaps[7], 42.0, 7u32);

        for i in (1..8).rev() {
            forest.meld(heaps[i - 1], heaps[i]);
        }

        assert_eq!(forest.surviving_heap(heaps[7]), heaps[0]);
        assert_eq!(forest.count(heaps[0]), 1);
        assert_eq!(forest.delete(handle), (42.0, 7));
        assert!(forest.is_empty(heaps[0]));
    }

    #[test]
    fn clear_releases_all_elements() {
        let mut forest = PairingForest::new();
        let heap = forest.new_heap();
        for i in 0..20 {
            forest.insert(heap, i as f64, i);
        }
        assert_eq!(forest.min_key(heap), Some(0.0));

        forest.clear(heap);
        assert!(forest.is_empty(heap));
        assert_eq!(forest.min_key(heap), None);

        // the freed slots are reusable
        forest.insert(heap, 5.0, 99);
        assert_eq!(forest.delete_min(heap), Some((5.0, 99)));
    }

    #[test]
    fn randomized_against_reference() {
        let rng = &mut Pcg64Mcg::seed_from_u64(1234);

        for _ in 0..20 {
            let mut forest = PairingForest::new();
            let heap = forest.new_heap();
            let mut reference: Vec<(i64, u32)> = Vec::new();
            let mut handles: Vec<(HeapHandle, i64, u32)> = Vec::new();
            let mut next_value = 0u32;

            for _ in 0..500 {
                match rng.random_range(0..4u32) {
                    0 | 1 => {
                        let key = rng.random_range(-1000..1000i64);
                        let handle = forest.insert(heap, key as f64, next_value);
                        reference.push((key, next_value));
                        handles.push((handle, key, next_value));
                        next_value += 1;
                    }
                    2 => {
                        let expect = reference.iter().map(|&(k, _)| k).min();
                        let got = forest.delete_min(heap);
                        assert_eq!(expect.map(|k| k as f64), got.map(|(k, _)| k));
                        if let Some((_, v)) = got {
                            let pos = reference.iter().position(|&(_, rv)| rv == v).unwrap();
                            reference.swap_remove(pos);
                            handles.retain(|&(_, _, hv)| hv != v);
                        }
                    }
                    _ => {
                        if handles.is_empty() {
                            continue;
                        }
                        let i = rng.random_range(0..handles.len());
                        let (handle, key, value) = handles[i];
                        let new_key = key - rng.random_range(0..100i64);
                        forest.decrease_key(handle, new_key as f64);
                        handles[i] = (handle, new_key, value);
                        let pos = reference.iter().position(|&(_, rv)| rv == value).unwrap();
                        reference[pos] = (new_key, value);
                    }
                }

                assert_eq!(forest.count(heap) as usize, reference.len());
            }
        }
    }
}
