/*!
# Solver State

Flat-array data model of the Blossom V solver: surface nodes and blossoms,
edges with migrating endpoints, alternating trees and the cross-tree
connections between them.

Everything is index-linked. Nodes for the `n` original vertices occupy
indices `0..n`; index `n` is a sentinel anchoring the doubly-linked list of
tree roots; blossom nodes are appended behind it as they are created.
Links use [`EMPTY`] instead of `Option` to keep the arrays compact.

Edges keep both their **current** endpoints (`head`, changed by shrink and
expand) and their **original** endpoints (`head_original`, fixed for their
lifetime). Every edge sits in one circular incident list per current
endpoint; the list direction `d` is chosen so that `head[d]` is the
*opposite* endpoint when traversing from the list owner.

All heaps live in one shared [`PairingForest`]; trees and tree edges store
[`HeapId`]s into it, nodes and edges store their current [`HeapHandle`].
*/

use crate::heap::{HeapHandle, HeapId, PairingForest};
use crate::{edge::*, node::*};

use super::{MatcherOptions, MatchingStats, Objective};

/// Sentinel for absent links in the flat arrays.
pub(crate) const EMPTY: u32 = INVALID_NODE;

/// Label of an outer node with respect to its alternating tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Label {
    Plus,
    Minus,
    Infinity,
}

/// A surface vertex or a blossom (contracted odd cycle).
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub label: Label,
    pub is_tree_root: bool,
    pub is_blossom: bool,
    pub is_outer: bool,
    /// Scratch flag, always cleared by the function that set it
    pub is_processed: bool,
    /// Scratch flag, always cleared by the function that set it
    pub is_marked: bool,
    /// Lazy dual; the true dual of an outer +/- node includes `tree.eps`
    pub dual: f64,
    /// Heads of the two circular incident edge lists
    pub first: [u32; 2],
    /// The matched edge, if any
    pub matched: u32,
    /// Cheapest known boundary edge (fractional initialization only)
    pub best_edge: u32,
    /// Owning tree while the node is labeled +/-
    pub tree: u32,
    /// Edge to the tree parent
    pub parent_edge: u32,
    pub first_tree_child: u32,
    /// Sibling links in the parent's child list; for tree roots these
    /// form the global root list anchored at the sentinel node
    pub tree_sibling_next: u32,
    pub tree_sibling_prev: u32,
    /// Direct enclosing blossom
    pub blossom_parent: u32,
    /// Skip pointer towards the outermost blossom, path-compressed
    pub blossom_grandparent: u32,
    /// Edge to the next node on the enclosing blossom's circuit
    pub blossom_sibling: u32,
    /// Heap handle while queued (minus blossom / best-edge heap)
    pub handle: Option<HeapHandle>,
    /// Index of this node in the node array
    pub pos: u32,
}

impl NodeData {
    pub(crate) fn new(pos: u32) -> Self {
        Self {
            label: Label::Infinity,
            is_tree_root: false,
            is_blossom: false,
            is_outer: true,
            is_processed: false,
            is_marked: false,
            dual: 0.0,
            first: [EMPTY; 2],
            matched: EMPTY,
            best_edge: EMPTY,
            tree: EMPTY,
            parent_edge: EMPTY,
            first_tree_child: EMPTY,
            tree_sibling_next: EMPTY,
            tree_sibling_prev: EMPTY,
            blossom_parent: EMPTY,
            blossom_grandparent: EMPTY,
            blossom_sibling: EMPTY,
            handle: None,
            pos,
        }
    }

    #[inline(always)]
    pub(crate) fn is_plus(&self) -> bool {
        self.label == Label::Plus
    }

    #[inline(always)]
    pub(crate) fn is_minus(&self) -> bool {
        self.label == Label::Minus
    }

    #[inline(always)]
    pub(crate) fn is_infinity(&self) -> bool {
        self.label == Label::Infinity
    }
}

/// A solver edge. Current endpoints migrate under shrink/expand.
#[derive(Debug, Clone)]
pub(crate) struct EdgeData {
    /// Lazy slack; the true slack additionally accounts for the tree eps
    /// of outer +/- endpoints
    pub slack: f64,
    /// Current endpoints; `head[d]` is reached by traversing the edge
    /// from the owner of incident list `d` (which is `head[1 - d]`)
    pub head: [u32; 2],
    /// Initial endpoints, fixed for the lifetime of the edge
    pub head_original: [u32; 2],
    /// Links of the two circular incident lists
    pub prev: [u32; 2],
    pub next: [u32; 2],
    /// Heap handle while the edge sits in some heap
    pub handle: Option<HeapHandle>,
    /// Index of this edge in the edge array
    pub pos: u32,
}

/// An alternating tree.
#[derive(Debug, Clone)]
pub(crate) struct TreeData {
    pub root: u32,
    /// Pending dual change of all tree nodes (lazy delta spreading)
    pub eps: f64,
    /// Scratch for the connected-component dual strategy
    pub accumulated_eps: f64,
    /// In-tree (+, +) edges, keyed by slack
    pub plus_plus_edges: HeapId,
    /// (+, infinity) boundary edges, keyed by slack
    pub plus_infinity_edges: HeapId,
    /// "-" blossoms of this tree, keyed by dual
    pub minus_blossoms: HeapId,
    /// Tree edge shared with the tree currently being processed
    pub current_edge: u32,
    /// Direction under which the processed tree sees `current_edge`
    pub current_direction: usize,
    /// Heads of the two tree-edge lists
    pub first: [u32; 2],
    /// Scratch link for the connected-component dual strategy
    pub next_tree: u32,
}

/// A connection between two trees, carrying the cross-tree edge heaps.
#[derive(Debug, Clone)]
pub(crate) struct TreeEdgeData {
    /// `head[d]` is the tree reached when traversing with direction `d`;
    /// the edge sits in `head[1 - d]`'s list `d`
    pub head: [u32; 2],
    pub prev: [u32; 2],
    pub next: [u32; 2],
    /// Cross-tree (+, +) edges
    pub plus_plus_edges: HeapId,
    /// Cross-tree (+, -) edges; `plus_minus_edges[d]` holds the edges
    /// whose "+" endpoint lies in `head[d]`
    pub plus_minus_edges: [HeapId; 2],
    pub used: bool,
}

/// Payload discriminator for heap values: all heaps store `u32` indices,
/// either of edges (slack-keyed heaps) or of nodes (minus blossoms,
/// fractional best-edge heap).
pub(crate) type HeapPayload = u32;

/// The owning container of everything the solver mutates.
pub(crate) struct State {
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
    pub trees: Vec<TreeData>,
    pub tree_edges: Vec<TreeEdgeData>,
    pub tree_edge_free: Vec<u32>,
    pub heaps: PairingForest<f64, HeapPayload>,
    /// Number of original vertices; `nodes[node_num]` is the sentinel
    pub node_num: usize,
    /// Number of remaining alternating trees
    pub tree_num: usize,
    /// Original external edge per solver edge
    pub ext_edges: Vec<Edge>,
    /// Uniform weight shift applied so all initial slacks are nonnegative
    pub min_edge_weight: f64,
    pub objective: Objective,
    pub options: MatcherOptions,
    pub stats: MatchingStats,
}

impl State {
    // ---------- Node & Edge Basics ----------

    #[inline(always)]
    pub fn sentinel(&self) -> u32 {
        self.node_num as u32
    }

    /// The endpoint of `e` reached with direction `dir`.
    #[inline(always)]
    pub fn edge_head(&self, e: u32, dir: usize) -> u32 {
        self.edges[e as usize].head[dir]
    }

    /// The current endpoint of `e` opposite to `v`.
    pub fn edge_opposite(&self, e: u32, v: u32) -> u32 {
        let edge = &self.edges[e as usize];
        debug_assert!(edge.head[0] == v || edge.head[1] == v);
        if edge.head[0] == v {
            edge.head[1]
        } else {
            edge.head[0]
        }
    }

    /// The direction `d` such that `e` sits in `v`'s incident list `d`
    /// (i.e. `head[d]` is the endpoint opposite to `v`).
    pub fn edge_dir_from(&self, e: u32, v: u32) -> usize {
        let edge = &self.edges[e as usize];
        debug_assert!(edge.head[0] == v || edge.head[1] == v);
        if edge.head[1] == v {
            0
        } else {
            1
        }
    }

    /// The original endpoint of `e` on the side of the current endpoint `v`.
    pub fn edge_current_original(&self, e: u32, v: u32) -> u32 {
        let edge = &self.edges[e as usize];
        debug_assert!(edge.head[0] == v || edge.head[1] == v);
        if edge.head[0] == v {
            edge.head_original[0]
        } else {
            edge.head_original[1]
        }
    }

    /// Slack of `e` with all pending tree deltas of its endpoints applied.
    pub fn edge_true_slack(&self, e: u32) -> f64 {
        let edge = &self.edges[e as usize];
        let mut slack = edge.slack;
        for dir in 0..2 {
            let head = &self.nodes[edge.head[dir] as usize];
            if head.tree != EMPTY {
                match head.label {
                    Label::Plus => slack -= self.trees[head.tree as usize].eps,
                    Label::Minus => slack += self.trees[head.tree as usize].eps,
                    Label::Infinity => {}
                }
            }
        }
        slack
    }

    /// Dual of `v` with the pending tree delta applied.
    pub fn node_true_dual(&self, v: u32) -> f64 {
        let node = &self.nodes[v as usize];
        if node.tree == EMPTY {
            return node.dual;
        }
        match node.label {
            Label::Plus => node.dual + self.trees[node.tree as usize].eps,
            Label::Minus => node.dual - self.trees[node.tree as usize].eps,
            Label::Infinity => node.dual,
        }
    }

    // ---------- Incident Edge Lists ----------

    /// Appends `e` to `v`'s circular incident list `dir` and records `v`
    /// as the endpoint `head[1 - dir]`.
    pub fn add_edge_to_node(&mut self, v: u32, e: u32, dir: usize) {
        self.edges[e as usize].head[1 - dir] = v;
        let first = self.nodes[v as usize].first[dir];
        if first == EMPTY {
            self.nodes[v as usize].first[dir] = e;
            self.edges[e as usize].next[dir] = e;
            self.edges[e as usize].prev[dir] = e;
        } else {
            let last = self.edges[first as usize].prev[dir];
            self.edges[e as usize].prev[dir] = last;
            self.edges[e as usize].next[dir] = first;
            self.edges[last as usize].next[dir] = e;
            self.edges[first as usize].prev[dir] = e;
        }
    }

    /// Removes `e` from the incident list `dir` of its owner `head[1 - dir]`.
    pub fn remove_edge_from_node(&mut self, e: u32, dir: usize) {
        let owner = self.edges[e as usize].head[1 - dir];
        let next = self.edges[e as usize].next[dir];
        let prev = self.edges[e as usize].prev[dir];

        if next == e {
            // single element
            self.nodes[owner as usize].first[dir] = EMPTY;
        } else {
            self.edges[prev as usize].next[dir] = next;
            self.edges[next as usize].prev[dir] = prev;
            if self.nodes[owner as usize].first[dir] == e {
                self.nodes[owner as usize].first[dir] = next;
            }
        }
    }

    /// Moves the tail of `e` from node `from` to node `to`, keeping the
    /// list direction. Used when blossoms absorb or release boundary edges.
    pub fn move_edge_tail(&mut self, from: u32, to: u32, e: u32) {
        let dir = self.edge_dir_from(e, from);
        self.remove_edge_from_node(e, dir);
        self.add_edge_to_node(to, e, dir);
    }

    /// Starts a manual cursor over the incident edges of `v`, direction-0
    /// edges before direction-1 edges. The cursor pre-resolves its next
    /// element, so the current edge may be moved away mid-iteration.
    pub fn incident_edges(&self, v: u32) -> IncidentEdges {
        IncidentEdges::new(self, v)
    }

    // ---------- Tree Structure ----------

    /// Appends `child` to `parent`'s child list and links `parent_edge`.
    pub fn add_child(&mut self, parent: u32, child: u32, parent_edge: u32) {
        self.nodes[child as usize].parent_edge = parent_edge;
        self.nodes[child as usize].tree = self.nodes[parent as usize].tree;
        self.nodes[child as usize].tree_sibling_next = self.nodes[parent as usize].first_tree_child;
        if self.nodes[parent as usize].first_tree_child != EMPTY {
            let first = self.nodes[parent as usize].first_tree_child;
            self.nodes[first as usize].tree_sibling_prev = child;
        }
        self.nodes[child as usize].tree_sibling_prev = EMPTY;
        self.nodes[parent as usize].first_tree_child = child;
    }

    /// Unlinks `v` from its parent's child list (or from the root list).
    pub fn remove_from_child_list(&mut self, v: u32, parent: u32) {
        let prev = self.nodes[v as usize].tree_sibling_prev;
        let next = self.nodes[v as usize].tree_sibling_next;
        if prev == EMPTY {
            self.nodes[parent as usize].first_tree_child = next;
        } else {
            self.nodes[prev as usize].tree_sibling_next = next;
        }
        if next != EMPTY {
            self.nodes[next as usize].tree_sibling_prev = prev;
        }
    }

    /// Splices the child list of `from` onto the child list of `to`. The
    /// children keep their parent edges; their tree parent resolves through
    /// the (possibly migrated) edge endpoint.
    pub fn move_children_to(&mut self, from: u32, to: u32) {
        let first = self.nodes[from as usize].first_tree_child;
        if first == EMPTY {
            return;
        }
        let to_first = self.nodes[to as usize].first_tree_child;
        if to_first == EMPTY {
            self.nodes[to as usize].first_tree_child = first;
        } else {
            let mut last = to_first;
            while self.nodes[last as usize].tree_sibling_next != EMPTY {
                last = self.nodes[last as usize].tree_sibling_next;
            }
            self.nodes[last as usize].tree_sibling_next = first;
            self.nodes[first as usize].tree_sibling_prev = last;
        }
        self.nodes[from as usize].first_tree_child = EMPTY;
    }

    /// The parent edge connecting two adjacent tree nodes (whichever of
    /// the two is the deeper one owns it).
    pub fn connecting_parent_edge(&self, a: u32, b: u32) -> u32 {
        let pe = self.nodes[a as usize].parent_edge;
        if pe != EMPTY && self.edge_opposite(pe, a) == b {
            return pe;
        }
        let pe = self.nodes[b as usize].parent_edge;
        debug_assert!(pe != EMPTY && self.edge_opposite(pe, b) == a);
        pe
    }

    /// Inserts `root` into the global root list, behind the sentinel.
    pub fn add_tree_root(&mut self, root: u32) {
        let sentinel = self.sentinel();
        let first = self.nodes[sentinel as usize].tree_sibling_next;
        self.nodes[root as usize].is_tree_root = true;
        self.nodes[root as usize].tree_sibling_prev = sentinel;
        self.nodes[root as usize].tree_sibling_next = first;
        if first != EMPTY {
            self.nodes[first as usize].tree_sibling_prev = root;
        }
        self.nodes[sentinel as usize].tree_sibling_next = root;
    }

    /// Unlinks `root` from the global root list.
    pub fn remove_tree_root(&mut self, root: u32) {
        debug_assert!(self.nodes[root as usize].is_tree_root);
        let prev = self.nodes[root as usize].tree_sibling_prev;
        let next = self.nodes[root as usize].tree_sibling_next;
        self.nodes[prev as usize].tree_sibling_next = next;
        if next != EMPTY {
            self.nodes[next as usize].tree_sibling_prev = prev;
        }
        self.nodes[root as usize].is_tree_root = false;
    }

    /// All nodes of the tree rooted at `root`, parents before children.
    pub fn tree_nodes(&self, root: u32) -> Vec<u32> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            result.push(v);
            let mut child = self.nodes[v as usize].first_tree_child;
            while child != EMPTY {
                stack.push(child);
                child = self.nodes[child as usize].tree_sibling_next;
            }
        }
        result
    }

    // ---------- Blossom Hierarchy ----------

    /// Tree parent of `v`: the opposite endpoint of its parent edge.
    pub fn tree_parent(&self, v: u32) -> u32 {
        let parent_edge = self.nodes[v as usize].parent_edge;
        debug_assert_ne!(parent_edge, EMPTY);
        self.edge_opposite(parent_edge, v)
    }

    /// Tree grandparent of `v` (`parent.parent`), used when marching along
    /// alternating branches two levels at a time.
    pub fn tree_grandparent(&self, v: u32) -> u32 {
        self.tree_parent(self.tree_parent(v))
    }

    /// Flips the matching along the alternating path from the "+" node `v`
    /// up to the tree root, leaving the root matched.
    pub fn flip_matching_to_root(&mut self, v: u32, root: u32) {
        let mut cur = v;
        while cur != root {
            let minus = self.tree_parent(cur);
            let up_edge = self.nodes[minus as usize].parent_edge;
            let plus = self.edge_opposite(up_edge, minus);
            self.nodes[minus as usize].matched = up_edge;
            self.nodes[plus as usize].matched = up_edge;
            cur = plus;
        }
    }

    /// Walks to the child of the outermost blossom above `v` (the
    /// *penultimate* blossom), compressing `blossom_grandparent` pointers
    /// along the way. The amortized cost of the solver relies on this
    /// compression. `v` must lie inside some blossom.
    pub fn penultimate_blossom(&mut self, v: u32) -> u32 {
        debug_assert_ne!(self.nodes[v as usize].blossom_parent, EMPTY);
        let mut current = v;
        loop {
            let gp = self.nodes[current as usize].blossom_grandparent;
            if !self.nodes[gp as usize].is_outer {
                current = gp;
            } else if gp != self.nodes[current as usize].blossom_parent {
                // grandparent points at an already dissolved blossom
                let parent = self.nodes[current as usize].blossom_parent;
                self.nodes[current as usize].blossom_grandparent = parent;
            } else {
                break;
            }
        }

        // compress the walked chain onto the penultimate node
        let mut prev = v;
        while prev != current {
            let next = self.nodes[prev as usize].blossom_grandparent;
            self.nodes[prev as usize].blossom_grandparent = current;
            prev = next;
        }

        current
    }

    /// Like [`State::penultimate_blossom`] but compresses onto the node
    /// *below* the penultimate blossom. Used by expand, which dissolves the
    /// penultimate layer and would otherwise leave the compressed pointers
    /// stale.
    pub fn penultimate_blossom_fix_grandparent(&mut self, v: u32) -> u32 {
        debug_assert_ne!(self.nodes[v as usize].blossom_parent, EMPTY);
        let mut current = v;
        let mut below = EMPTY;
        loop {
            let gp = self.nodes[current as usize].blossom_grandparent;
            if !self.nodes[gp as usize].is_outer {
                below = current;
                current = gp;
            } else if gp != self.nodes[current as usize].blossom_parent {
                let parent = self.nodes[current as usize].blossom_parent;
                self.nodes[current as usize].blossom_grandparent = parent;
            } else {
                break;
            }
        }

        if below != EMPTY {
            let mut prev = v;
            while prev != below {
                let next = self.nodes[prev as usize].blossom_grandparent;
                self.nodes[prev as usize].blossom_grandparent = below;
                prev = next;
            }
        }

        current
    }

    // ---------- Tree Edges ----------

    fn new_tree_edge_slot(&mut self) -> u32 {
        if let Some(idx) = self.tree_edge_free.pop() {
            idx
        } else {
            let idx = self.tree_edges.len() as u32;
            self.tree_edges.push(TreeEdgeData {
                head: [EMPTY; 2],
                prev: [EMPTY; 2],
                next: [EMPTY; 2],
                plus_plus_edges: self.heaps.new_heap(),
                plus_minus_edges: [self.heaps.new_heap(), self.heaps.new_heap()],
                used: false,
            });
            idx
        }
    }

    /// Creates a tree edge between `from` and `to`. `from` traverses it
    /// with direction 0, `to` with direction 1.
    pub fn add_tree_edge(&mut self, from: u32, to: u32) -> u32 {
        let te = self.new_tree_edge_slot();
        {
            let data = &mut self.tree_edges[te as usize];
            data.head = [to, from];
            data.prev = [EMPTY; 2];
            data.next = [EMPTY; 2];
            data.used = true;
        }
        // fresh heaps for a recycled slot
        self.tree_edges[te as usize].plus_plus_edges = self.heaps.new_heap();
        self.tree_edges[te as usize].plus_minus_edges =
            [self.heaps.new_heap(), self.heaps.new_heap()];

        for (tree, dir) in [(from, 0usize), (to, 1usize)] {
            let first = self.trees[tree as usize].first[dir];
            self.tree_edges[te as usize].next[dir] = first;
            if first != EMPTY {
                self.tree_edges[first as usize].prev[dir] = te;
            }
            self.trees[tree as usize].first[dir] = te;
        }
        te
    }

    /// Unlinks `te` from both tree-edge lists and recycles the slot.
    pub fn remove_tree_edge(&mut self, te: u32) {
        for dir in 0..2 {
            let owner = self.tree_edges[te as usize].head[1 - dir];
            let prev = self.tree_edges[te as usize].prev[dir];
            let next = self.tree_edges[te as usize].next[dir];
            if prev == EMPTY {
                self.trees[owner as usize].first[dir] = next;
            } else {
                self.tree_edges[prev as usize].next[dir] = next;
            }
            if next != EMPTY {
                self.tree_edges[next as usize].prev[dir] = prev;
            }
        }
        self.tree_edges[te as usize].used = false;
        self.tree_edge_free.push(te);
    }

    /// All tree edges of `tree` as `(tree_edge, direction)` pairs, where
    /// `direction` is the one under which `tree` traverses the edge.
    pub fn tree_edges_of(&self, tree: u32) -> Vec<(u32, usize)> {
        let mut result = Vec::new();
        for dir in 0..2 {
            let mut te = self.trees[tree as usize].first[dir];
            while te != EMPTY {
                result.push((te, dir));
                te = self.tree_edges[te as usize].next[dir];
            }
        }
        result
    }

    /// Sets `current_edge`/`current_direction` on every tree adjacent to
    /// `tree`, so edge reclassification can find the shared tree edge in
    /// constant time.
    pub fn set_current_edges(&mut self, tree: u32) {
        for (te, dir) in self.tree_edges_of(tree) {
            let opposite = self.tree_edges[te as usize].head[dir];
            self.trees[opposite as usize].current_edge = te;
            self.trees[opposite as usize].current_direction = dir;
        }
    }

    /// Clears the pointers installed by [`State::set_current_edges`].
    pub fn clear_current_edges(&mut self, tree: u32) {
        for (te, dir) in self.tree_edges_of(tree) {
            let opposite = self.tree_edges[te as usize].head[dir];
            self.trees[opposite as usize].current_edge = EMPTY;
        }
    }

    // ---------- Heap Bookkeeping ----------

    /// Inserts `e` into the (+, infinity) heap of `tree`.
    pub fn add_plus_infinity_edge(&mut self, tree: u32, e: u32) {
        let heap = self.trees[tree as usize].plus_infinity_edges;
        let slack = self.edges[e as usize].slack;
        self.edges[e as usize].handle = Some(self.heaps.insert(heap, slack, e));
    }

    /// Inserts `e` into the in-tree (+, +) heap of `tree`.
    pub fn add_plus_plus_edge(&mut self, tree: u32, e: u32) {
        let heap = self.trees[tree as usize].plus_plus_edges;
        let slack = self.edges[e as usize].slack;
        self.edges[e as usize].handle = Some(self.heaps.insert(heap, slack, e));
    }

    /// Inserts `e` into the cross-tree (+, +) heap of tree edge `te`.
    pub fn add_cross_plus_plus_edge(&mut self, te: u32, e: u32) {
        let heap = self.tree_edges[te as usize].plus_plus_edges;
        let slack = self.edges[e as usize].slack;
        self.edges[e as usize].handle = Some(self.heaps.insert(heap, slack, e));
    }

    /// Inserts `e` into the (+, -) heap of `te` whose "+" endpoint lies in
    /// `te.head[plus_dir]`.
    pub fn add_cross_plus_minus_edge(&mut self, te: u32, plus_dir: usize, e: u32) {
        let heap = self.tree_edges[te as usize].plus_minus_edges[plus_dir];
        let slack = self.edges[e as usize].slack;
        self.edges[e as usize].handle = Some(self.heaps.insert(heap, slack, e));
    }

    /// Inserts blossom `b` into the minus-blossom heap of `tree`.
    pub fn add_minus_blossom(&mut self, tree: u32, b: u32) {
        let heap = self.trees[tree as usize].minus_blossoms;
        let dual = self.nodes[b as usize].dual;
        self.nodes[b as usize].handle = Some(self.heaps.insert(heap, dual, b));
    }

    /// Removes `e` from whatever heap it currently sits in.
    pub fn remove_edge_from_heap(&mut self, e: u32) {
        if let Some(handle) = self.edges[e as usize].handle.take() {
            self.heaps.delete(handle);
        }
    }

    /// Removes blossom `b` from the minus-blossom heap.
    pub fn remove_minus_blossom(&mut self, b: u32) {
        if let Some(handle) = self.nodes[b as usize].handle.take() {
            self.heaps.delete(handle);
        }
    }

    /// Minimum of a slack-keyed edge heap, healing entries whose key went
    /// stale through an augment-time meld. Returns `(slack, edge)`.
    pub fn edge_heap_min(&mut self, heap: HeapId) -> Option<(f64, u32)> {
        loop {
            let handle = self.heaps.min_handle(heap)?;
            let e = *self.heaps.value(handle);
            if self.edges[e as usize].handle != Some(handle) {
                // superseded entry; the edge lives in another heap by now
                self.heaps.delete(handle);
                continue;
            }
            let key = self.heaps.key(handle);
            let slack = self.edges[e as usize].slack;
            if key == slack {
                return Some((key, e));
            }
            // stale key from a meld: rekey with the current slack
            self.heaps.delete(handle);
            self.edges[e as usize].handle = Some(self.heaps.insert(heap, slack, e));
        }
    }

    /// Drains a heap of edges, clearing their handles.
    pub fn drain_edge_heap(&mut self, heap: HeapId) {
        while let Some((_, e)) = self.heaps.delete_min(heap) {
            self.edges[e as usize].handle = None;
        }
    }

    /// Drains a heap of nodes, clearing their handles.
    pub fn drain_node_heap(&mut self, heap: HeapId) {
        while let Some((_, v)) = self.heaps.delete_min(heap) {
            self.nodes[v as usize].handle = None;
        }
    }
}

/// Manual cursor over the incident edges of a node.
///
/// Yields `(edge, dir)` where `edge.head[dir]` is the opposite endpoint.
/// The next element is resolved *before* the current one is handed out, so
/// callers may move the current edge to another node (shrink/expand do).
pub(crate) struct IncidentEdges {
    node: u32,
    dir: usize,
    current: u32,
}

impl IncidentEdges {
    fn new(state: &State, node: u32) -> Self {
        let mut it = Self {
            node,
            dir: 0,
            current: state.nodes[node as usize].first[0],
        };
        if it.current == EMPTY {
            it.enter_second_list(state);
        }
        it
    }

    fn enter_second_list(&mut self, state: &State) {
        self.dir = 1;
        self.current = state.nodes[self.node as usize].first[1];
    }

    pub fn next(&mut self, state: &State) -> Option<(u32, usize)> {
        if self.current == EMPTY {
            return None;
        }
        let result = (self.current, self.dir);

        // resolve the follow-up element before handing out the current one;
        // the wrap test reads the live list head, which tracks removals of
        // already visited edges
        let next = state.edges[self.current as usize].next[self.dir];
        let first = state.nodes[self.node as usize].first[self.dir];
        if next != first && next != self.current {
            self.current = next;
        } else if self.dir == 0 {
            self.enter_second_list(state);
        } else {
            self.current = EMPTY;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_state(n: usize) -> State {
        let mut nodes: Vec<NodeData> = (0..=n).map(|i| NodeData::new(i as u32)).collect();
        nodes[n].is_outer = false;
        State {
            nodes,
            edges: Vec::new(),
            trees: Vec::new(),
            tree_edges: Vec::new(),
            tree_edge_free: Vec::new(),
            heaps: PairingForest::new(),
            node_num: n,
            tree_num: 0,
            ext_edges: Vec::new(),
            min_edge_weight: 0.0,
            objective: Objective::Minimize,
            options: MatcherOptions::default(),
            stats: MatchingStats::default(),
        }
    }

    fn push_edge(state: &mut State, u: u32, v: u32) -> u32 {
        let e = state.edges.len() as u32;
        state.edges.push(EdgeData {
            slack: 0.0,
            head: [EMPTY; 2],
            head_original: [u, v],
            prev: [EMPTY; 2],
            next: [EMPTY; 2],
            handle: None,
            pos: e,
        });
        state.add_edge_to_node(u, e, 0);
        state.add_edge_to_node(v, e, 1);
        state.ext_edges.push(Edge(u, v));
        e
    }

    fn collect_incident(state: &State, v: u32) -> Vec<(u32, usize)> {
        let mut result = Vec::new();
        let mut it = state.incident_edges(v);
        while let Some(entry) = it.next(state) {
            result.push(entry);
        }
        result
    }

    #[test]
    fn incident_lists_link_both_directions() {
        let mut state = empty_state(4);
        let e01 = push_edge(&mut state, 0, 1);
        let e02 = push_edge(&mut state, 0, 2);
        let e31 = push_edge(&mut state, 3, 1);

        // node 0 owns e01 and e02 in direction 0
        assert_eq!(collect_incident(&state, 0), vec![(e01, 0), (e02, 0)]);
        // node 1 sees e01 and e31 with direction 1 (it is head[1]'s owner)
        assert_eq!(collect_incident(&state, 1), vec![(e01, 1), (e31, 1)]);

        assert_eq!(state.edge_opposite(e01, 0), 1);
        assert_eq!(state.edge_opposite(e01, 1), 0);
        assert_eq!(state.edge_dir_from(e01, 0), 0);
        assert_eq!(state.edge_dir_from(e01, 1), 1);
    }

    #[test]
    fn move_edge_tail_migrates_list_membership() {
        let mut state = empty_state(4);
        let e01 = push_edge(&mut state, 0, 1);
        let _e02 = push_edge(&mut state, 0, 2);

        state.move_edge_tail(1, 3, e01);

        assert!(collect_incident(&state, 1).is_empty());
        assert_eq!(collect_incident(&state, 3), vec![(e01, 1)]);
        assert_eq!(state.edge_opposite(e01, 3), 0);
        // the original endpoint is remembered
        assert_eq!(state.edge_current_original(e01, 3), 1);
    }

    #[test]
    fn root_list_is_anchored_at_sentinel() {
        let mut state = empty_state(3);
        state.add_tree_root(0);
        state.add_tree_root(1);
        state.add_tree_root(2);

        let sentinel = state.sentinel();
        let mut roots = Vec::new();
        let mut cur = state.nodes[sentinel as usize].tree_sibling_next;
        while cur != EMPTY {
            roots.push(cur);
            cur = state.nodes[cur as usize].tree_sibling_next;
        }
        assert_eq!(roots, vec![2, 1, 0]);

        state.remove_tree_root(1);
        assert_eq!(state.nodes[2].tree_sibling_next, 0);
        assert_eq!(state.nodes[0].tree_sibling_prev, 2);
    }

    #[test]
    fn child_list_append_and_move() {
        let mut state = empty_state(6);
        let e1 = push_edge(&mut state, 0, 1);
        let e2 = push_edge(&mut state, 0, 2);

        state.add_child(0, 1, e1);
        state.add_child(0, 2, e2);
        assert_eq!(state.nodes[0].first_tree_child, 2);

        state.move_children_to(0, 4);
        assert_eq!(state.nodes[0].first_tree_child, EMPTY);
        // both children now hang below node 4
        let mut children = Vec::new();
        let mut cur = state.nodes[4].first_tree_child;
        while cur != EMPTY {
            children.push(cur);
            cur = state.nodes[cur as usize].tree_sibling_next;
        }
        children.sort_unstable();
        assert_eq!(children, vec![1, 2]);
    }
}
