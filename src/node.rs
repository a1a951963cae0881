/*!
# Node Representation

Nodes are unlabelled and numbered `0` to `n - 1`.

We represent **nodes** as `u32`: most graphs handed to a matching solver do
not exceed `2^32` vertices, and halving the index width compared to
`u64/usize` keeps the solver's flat arrays compact.

External callers with arbitrary hashable vertex identifiers (e.g. the Swiss
pairing driver with player records) intern their identifiers into this range
before building a graph and translate back afterwards.
*/

use stream_bitset::bitset::BitSetImpl;

/// A node of a graph, numbered `0..n`.
pub type Node = u32;

/// There can be at most `2^32 - 1` nodes in a graph!
pub type NumNodes = Node;

/// BitSet for Nodes
pub type NodeBitSet = BitSetImpl<Node>;

/// Sentinel for "no node" in index-linked structures.
///
/// Prefer `Option<Node>` in public signatures; the sentinel is for the
/// solver's internal flat arrays where an `Option` per link would double
/// the memory traffic.
pub const INVALID_NODE: Node = Node::MAX;
