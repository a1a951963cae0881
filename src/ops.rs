/*!
# Graph Operations

Core graph traits and operations.

This module defines the **fundamental traits** that all graph
representations in `wmatching` should implement (if possible).
It covers:
- **Graph type metadata** ([`GraphType`], [`GraphDir`], [`GraphDirection`]).
- **Node and edge counts** ([`GraphNodeOrder`], [`GraphEdgeOrder`]).
- **Neighborhood access** ([`AdjacencyList`]).
- **Edge testing and editing** ([`AdjacencyTest`], [`GraphEdgeEditing`], [`GraphVertexEditing`]).
- **Edge weights** ([`EdgeWeights`]): the capability the matching solver
  reads weights through. Plain graphs report [`DEFAULT_EDGE_WEIGHT`] for
  every edge; the decorators in [`crate::repr::weighted`] overlay real
  weights.

The matching solver is generic over exactly this capability set: vertex
enumeration, incident edges of a vertex, endpoint lookup, edge weight,
edge count.

# Examples
```
use wmatching::prelude::*;

// Build a simple undirected triangle graph
let g = AdjArrayUndir::from_edges(3, [(0,1), (1,2), (2,0)]);

assert_eq!(g.number_of_nodes(), 3);
assert_eq!(g.number_of_edges(), 3);
assert!(g.has_edge(0,1));
assert!(g.has_edge(1,0)); // undirected
assert_eq!(g.weight_of(Edge(0,1)), DEFAULT_EDGE_WEIGHT);
```
*/

use std::ops::Range;

use itertools::Itertools;

use super::{edge::*, node::*};

/// Whether a graph is `Directed` or `Undirected`.
///
/// Used by [`GraphType`] to specialize behavior.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GraphDirection {
    Directed,
    Undirected,
}

/// Marker type representing a directed graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Directed;

/// Marker type representing an undirected graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Undirected;

/// Trait implemented by [`Directed`] and [`Undirected`].
///
/// Provides a compile-time constant [`GraphDirection`].
pub trait GraphDir {
    const DIRECTION: GraphDirection;
}

impl GraphDir for Directed {
    const DIRECTION: GraphDirection = GraphDirection::Directed;
}

impl GraphDir for Undirected {
    const DIRECTION: GraphDirection = GraphDirection::Undirected;
}

/// Identifies whether a graph is directed or undirected.
///
/// Every graph representation **must implement this trait**.
/// The matching solver restricts itself to `GraphType<Dir = Undirected>`.
pub trait GraphType {
    /// Getter for graph direction.
    /// As `#![feature(associated_const_equality)]` is not stable yet,
    /// this allows for selective implementations of algorithms
    /// that are only meant for directed/undirected graphs.
    type Dir: GraphDir;

    /// Returns *true* if the graph is directed
    #[inline(always)]
    fn is_directed() -> bool {
        Self::Dir::DIRECTION == GraphDirection::Directed
    }

    /// Returns *true* if the graph is undirected
    #[inline(always)]
    fn is_undirected() -> bool {
        Self::Dir::DIRECTION == GraphDirection::Undirected
    }
}

/// Provides accessors related to the number of nodes.
///
/// Implemented by all graph representations.
pub trait GraphNodeOrder {
    /// Iterator over all nodes in the graph.
    ///
    /// Returned by [`GraphNodeOrder::vertices`].
    type VertexIter<'a>: Iterator<Item = Node> + 'a
    where
        Self: 'a;

    /// Returns the number of nodes in the graph.
    fn number_of_nodes(&self) -> NumNodes;

    /// Returns the number of nodes as a `usize`.
    fn len(&self) -> usize {
        self.number_of_nodes() as usize
    }

    /// Returns an iterator over all nodes in the graph.
    fn vertices(&self) -> Self::VertexIter<'_>;

    /// Returns an empty bitset with one entry per node.
    ///
    /// Useful for marking or filtering nodes.
    fn vertex_bitset_unset(&self) -> NodeBitSet {
        NodeBitSet::new(self.number_of_nodes())
    }

    /// Returns a bitset with all bits set, one per node.
    fn vertex_bitset_set(&self) -> NodeBitSet {
        NodeBitSet::new_all_set(self.number_of_nodes())
    }

    /// Returns a range of all nodes.
    ///
    /// Unlike `vertices()`, this does not borrow `self` and can be used
    /// where additional mutable references are needed.
    fn vertices_range(&self) -> Range<Node> {
        0..self.number_of_nodes()
    }

    /// Returns `true` if the graph has no nodes (and therefore no edges).
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Provides accessors related to the number of edges.
pub trait GraphEdgeOrder {
    /// Returns the number of edges in the graph.
    fn number_of_edges(&self) -> NumEdges;

    /// Returns an empty bitset with one entry per edge.
    fn edge_bitset_unset(&self) -> EdgeBitSet {
        EdgeBitSet::new(self.number_of_edges())
    }

    /// Returns `true` if the graph has no edges.
    fn is_singleton_graph(&self) -> bool {
        self.number_of_edges() == 0
    }
}

/// Generic iterator that maps each node to some value `T`.
///
/// Helper iterator used internally by node-based traversal methods
/// (e.g. [`AdjacencyList::degrees`]).
pub struct NodeMapIter<'a, G, T, I>
where
    I: Iterator<Item = Node>,
{
    node_iter: I,
    graph: &'a G,
    map_fn: fn(&'a G, Node) -> T,
}

impl<'a, G, T, I> Iterator for NodeMapIter<'a, G, T, I>
where
    I: Iterator<Item = Node>,
{
    type Item = T;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        Some((self.map_fn)(self.graph, self.node_iter.next()?))
    }
}

macro_rules! node_iterator {
    ($iter : ident, $single : ident, $type : ty, $($doc:tt)*) => {
        $($doc)*
        fn $iter(&self) -> $type {
            NodeMapIter {
                node_iter: self.vertices(),
                graph: self,
                map_fn: Self::$single,
            }
        }
    };
}

/// Iterator over the edges adjacent to a single node.
///
/// Used internally by [`AdjacencyList::edges_of`].
pub struct EdgesOfIterImpl<I>
where
    I: Iterator<Item = Node>,
{
    iter: I,
    node: Node,
    only_normalized: bool,
}

impl<I> Iterator for EdgesOfIterImpl<I>
where
    I: Iterator<Item = Node>,
{
    type Item = Edge;

    fn next(&mut self) -> Option<Self::Item> {
        for u in self.iter.by_ref() {
            let edge = Edge(self.node, u);
            if edge.is_normalized() || !self.only_normalized {
                return Some(edge);
            }
        }

        None
    }
}

/// Iterator over all edges in a graph.
///
/// This drives [`AdjacencyList::edges`] and [`AdjacencyList::ordered_edges`],
/// traversing the adjacency lists of all nodes in sequence.
pub struct EdgesIterImpl<'a, G, I>
where
    I: Iterator<Item = Edge>,
{
    iter: Option<I>,
    graph: &'a G,
    edges_of_fn: fn(&'a G, Node, bool) -> I,
    node_range: Range<Node>,
    only_normalized: bool,
}

impl<'a, G: AdjacencyList, I> Iterator for EdgesIterImpl<'a, G, I>
where
    I: Iterator<Item = Edge>,
{
    type Item = Edge;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(iter) = self.iter.as_mut() {
                if let Some(edge) = iter.next() {
                    return Some(edge);
                }
            }

            let next_node = self.node_range.next()?;
            self.iter = Some((self.edges_of_fn)(self.graph, next_node, self.only_normalized));
        }
    }
}

// ---------- Iterator-Types ----------

/// Iterator over the degrees of all nodes in a graph.
///
/// Returned by [`AdjacencyList::degrees`].
pub type DegreesIter<'a, G> = NodeMapIter<'a, G, NumNodes, <G as GraphNodeOrder>::VertexIter<'a>>;

/// Iterator over the edges adjacent to a given node.
///
/// Returned by [`AdjacencyList::edges_of`].
pub type EdgesOf<'a, G> = EdgesOfIterImpl<<G as AdjacencyList>::NeighborIter<'a>>;

/// Iterator over edges of a node, in deterministic order.
///
/// Returned by [`AdjacencyList::ordered_edges_of`].
pub type OrderedEdgesOf = std::vec::IntoIter<Edge>;

/// Iterator over all edges in a graph.
///
/// Returned by [`AdjacencyList::edges`].
pub type Edges<'a, G> = EdgesIterImpl<'a, G, EdgesOf<'a, G>>;

/// Iterator over all edges in a graph, in deterministic order.
///
/// Returned by [`AdjacencyList::ordered_edges`].
pub type OrderedEdges<'a, G> = EdgesIterImpl<'a, G, OrderedEdgesOf>;

/// Trait providing access to neighborhoods and edges.
///
/// Many algorithms rely on this trait for traversals. Neighbors of a node
/// are reported in insertion order, which makes algorithms that break ties
/// by iteration order deterministic.
///
/// # Examples
/// ```
/// use wmatching::prelude::*;
///
/// let g = AdjArrayUndir::from_edges(3, [(0,1), (1,2)]);
///
/// assert_eq!(g.degree_of(1), 2);
/// assert_eq!(g.neighbors_of(1).collect::<Vec<_>>(), vec![0,2]);
///
/// let edges: Vec<_> = g.edges(true).collect();
/// assert_eq!(edges.len(), 2); // normalized edges only
/// ```
pub trait AdjacencyList: GraphNodeOrder + Sized {
    /// Iterator over all neighbors in the open neighborhood of a vertex in the graph.
    ///
    /// Returned by [`AdjacencyList::neighbors_of`].
    type NeighborIter<'a>: Iterator<Item = Node> + 'a
    where
        Self: 'a;

    /// Returns an iterator over the (open) neighborhood of a given vertex.
    ///
    /// **Panics if `u >= n`.**
    fn neighbors_of(&self, u: Node) -> Self::NeighborIter<'_>;

    /// Returns the number of neighbors (degree) of a vertex.
    ///
    /// **Panics if `u >= n`.**
    fn degree_of(&self, u: Node) -> NumNodes;

    /// Returns the maximum degree among all vertices.
    ///
    /// Returns `0` if the graph has no vertices.
    fn max_degree(&self) -> NumNodes {
        self.degrees().max().unwrap_or(0)
    }

    node_iterator!(
        degrees,
        degree_of,
        DegreesIter<'_, Self>,
        /// Returns an iterator over the degree of each vertex in the graph.
        ///
        /// Equivalent to mapping `degree_of` over all vertices.
    );

    /// Returns an iterator over outgoing edges of a vertex.
    ///
    /// If `only_normalized` is `true`, only edges `(u,v)` with `u <= v` are returned.
    ///
    /// **Panics if `u >= n`.**
    fn edges_of(&self, u: Node, only_normalized: bool) -> EdgesOf<'_, Self> {
        EdgesOfIterImpl {
            iter: self.neighbors_of(u),
            node: u,
            only_normalized,
        }
    }

    /// Returns an iterator over outgoing edges of a vertex in sorted order.
    ///
    /// If `only_normalized` is `true`, only edges `(u,v)` with `u <= v` are returned.
    ///
    /// **Panics if `u >= n`.**
    fn ordered_edges_of(&self, u: Node, only_normalized: bool) -> OrderedEdgesOf {
        let mut edges = self.edges_of(u, only_normalized).collect_vec();
        edges.sort();
        edges.into_iter()
    }

    /// Returns an iterator over all edges in the graph.
    ///
    /// If `only_normalized` is `true`, only edges `(u,v)` with `u <= v` are returned.
    fn edges(&self, only_normalized: bool) -> Edges<'_, Self> {
        EdgesIterImpl {
            iter: None,
            graph: self,
            edges_of_fn: Self::edges_of,
            node_range: self.vertices_range(),
            only_normalized,
        }
    }

    /// Returns an iterator over all edges in the graph in sorted order.
    ///
    /// If `only_normalized` is `true`, only edges `(u,v)` with `u <= v` are returned.
    fn ordered_edges(&self, only_normalized: bool) -> OrderedEdges<'_, Self> {
        EdgesIterImpl {
            iter: None,
            graph: self,
            edges_of_fn: Self::ordered_edges_of,
            node_range: self.vertices_range(),
            only_normalized,
        }
    }
}

/// Trait for testing the existence of edges.
///
/// # Examples
/// ```
/// use wmatching::prelude::*;
///
/// let g = AdjArrayUndir::from_edges(3, [(0,1), (1,2)]);
///
/// assert!(g.has_edge(0,1));
/// assert!(!g.has_edge(0,2));
/// ```
pub trait AdjacencyTest: GraphNodeOrder {
    /// Returns `true` if the edge `(u, v)` exists in the graph.
    /// **Panics if `u >= n || v >= n`**
    fn has_edge(&self, u: Node, v: Node) -> bool;

    /// Returns `true` if a self-loop `(u, u)` exists at the given vertex.
    /// **Panics if `u >= n`**
    fn has_self_loop(&self, u: Node) -> bool {
        self.has_edge(u, u)
    }
}

/// Creates a new empty graph with a given number of nodes.
pub trait GraphNew {
    /// Creates a new graph with `n` singleton nodes (nodes with no edges).
    fn new(n: NumNodes) -> Self;
}

/// Provides vertex insertion.
///
/// Needed by callers that discover their vertex set incrementally, e.g.
/// the pairing driver appending a bye node to an otherwise fixed roster.
///
/// # Examples
/// ```
/// use wmatching::prelude::*;
///
/// let mut g = AdjArrayUndir::new(2);
/// let bye = g.add_node();
/// assert_eq!(bye, 2);
/// g.add_edge(0, bye);
/// assert_eq!(g.number_of_nodes(), 3);
/// ```
pub trait GraphVertexEditing: GraphNodeOrder {
    /// Appends a new isolated node and returns its index.
    fn add_node(&mut self) -> Node;
}

/// Provides edge insertion and deletion operations.
///
/// # Examples
/// ```
/// use wmatching::prelude::*;
///
/// let mut g = AdjArrayUndir::new(3);
/// g.add_edge(0,1);
/// assert!(g.has_edge(0,1));
/// g.remove_edge(0,1);
/// assert!(!g.has_edge(0,1));
/// ```
pub trait GraphEdgeEditing: GraphNew {
    /// Adds the edge `(u, v)` to the graph.
    ///
    /// **Panics if `u >= n` or `v >= n`, or if the edge already exists**
    fn add_edge(&mut self, u: Node, v: Node) {
        assert!(!self.try_add_edge(u, v))
    }

    /// Adds the edge `(u, v)` to the graph.
    ///
    /// Returns `true` exactly if the edge was present previously.
    ///
    /// **Panics if `u >= n || v >= n`**
    fn try_add_edge(&mut self, u: Node, v: Node) -> bool;

    /// Adds all edges in the provided collection to the graph.
    ///
    /// **Panics if any edge `(u, v)` is invalid or already exists**
    fn add_edges<I, E>(&mut self, edges: I)
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>,
    {
        for Edge(u, v) in edges.into_iter().map(|d| d.into()) {
            self.add_edge(u, v);
        }
    }

    /// Tries to add all edges in the provided collection to the graph.
    ///
    /// Returns the number of edges successfully added.
    ///
    /// **Panics if any edge `(u, v)` is invalid**
    fn try_add_edges<I, E>(&mut self, edges: I) -> NumEdges
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>,
    {
        edges
            .into_iter()
            .map(|e| {
                let Edge(u, v) = e.into();
                !self.try_add_edge(u, v) as NumEdges
            })
            .sum()
    }

    /// Removes the edge `(u, v)` from the graph.
    ///
    /// **Panics if the edge does not exist or if `u >= n || v >= n`**
    fn remove_edge(&mut self, u: Node, v: Node) {
        assert!(self.try_remove_edge(u, v));
    }

    /// Removes the edge `(u, v)` from the graph.
    ///
    /// Returns `true` if the edge was present previously.
    ///
    /// **Panics if `u >= n || v >= n`**
    fn try_remove_edge(&mut self, u: Node, v: Node) -> bool;
}

/// Extends [`GraphEdgeEditing`] with local edge removals at nodes.
///
/// Removing all edges at a node is the index-stable equivalent of removing
/// the node itself.
pub trait GraphLocalEdgeEditing: GraphEdgeEditing {
    /// Removes all edges incident to the given node `u`.
    ///
    /// **Panics if `u >= n`**
    fn remove_edges_at_node(&mut self, u: Node);

    /// Removes all edges adjacent to any node in the provided iterator.
    ///
    /// **Panics if any node in the iterator is `>= n`**
    fn remove_edges_at_nodes<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = Node>,
    {
        for node in nodes {
            self.remove_edges_at_node(node);
        }
    }
}

/// Build a graph from scratch given a number of nodes and edges.
///
/// Preferred over building with `new + add_edges` when possible.
pub trait GraphFromScratch {
    /// Creates a new graph with `n` nodes and the given edges.
    fn from_edges<I, E>(n: NumNodes, edges: I) -> Self
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>;

    /// Creates a new graph with `n` nodes and the given edges,
    /// adding edges via `try_add_edge` instead of `add_edge`.
    ///
    /// This allows edges to be ignored if they already exist.
    fn from_try_edges<I, E>(n: NumNodes, edges: I) -> Self
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>;
}

impl<G> GraphFromScratch for G
where
    G: GraphNew + GraphEdgeEditing,
{
    fn from_edges<I, E>(n: NumNodes, edges: I) -> Self
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>,
    {
        let mut graph = Self::new(n);
        graph.add_edges(edges);
        graph
    }

    fn from_try_edges<I, E>(n: NumNodes, edges: I) -> Self
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>,
    {
        let mut graph = Self::new(n);
        graph.try_add_edges(edges);
        graph
    }
}

/// Read (and optionally write) access to edge weights.
///
/// This is the seam the matching solver consumes weights through. The
/// orientation of the queried edge is irrelevant: `weight_of(Edge(u, v))`
/// equals `weight_of(Edge(v, u))`.
///
/// Plain (unweighted) representations implement this with a constant
/// [`DEFAULT_EDGE_WEIGHT`] and ignore writes; the decorators in
/// [`crate::repr::weighted`] overlay a real mapping or weight function.
pub trait EdgeWeights {
    /// Returns the weight of `edge`.
    ///
    /// Implementations may not verify that the edge exists; querying a
    /// non-edge returns the default weight.
    fn weight_of(&self, edge: Edge) -> Weight;

    /// Sets the weight of `edge`, if the representation stores weights.
    ///
    /// Returns `true` if the write took effect. The default implementation
    /// of unweighted representations is a no-op returning `false`.
    fn try_set_weight(&mut self, _edge: Edge, _weight: Weight) -> bool {
        false
    }

    /// Sum of weights over the given edges.
    fn total_weight<I, E>(&self, edges: I) -> Weight
    where
        E: Into<Edge>,
        I: IntoIterator<Item = E>,
    {
        edges
            .into_iter()
            .map(|e| self.weight_of(e.into()))
            .sum()
    }
}
