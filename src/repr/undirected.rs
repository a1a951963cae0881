/*!
# Undirected Graph Representation

The concrete **undirected graph** the matching pipeline runs on.

[`AdjArrayUndir`] stores one adjacency list (`Vec<Node>`) per vertex. Two
of its properties are load-bearing for the solver on top of it:

- Neighbors are kept in **insertion order** (removals shift instead of
  swapping), so every edge iteration of the initializer and the Swiss
  driver is deterministic and ties break reproducibly.
- [`GraphEdgeEditing::add_edge`] does not deduplicate, so **parallel
  edges** are representable; the solver treats each copy as its own edge.
  `try_add_edge` is the checked variant for callers that want a simple
  graph.

Vertices can be appended after construction ([`GraphVertexEditing`]),
which the pairing driver uses for its bye node. Edge weights default to
[`DEFAULT_EDGE_WEIGHT`]; overlay a decorator from
[`weighted`](crate::repr::weighted) for real weights.
*/

use crate::testing::test_graph_ops;

use std::ops::Range;

use super::*;

/// Undirected graph backed by one adjacency list per vertex.
///
/// # Example
/// ```
/// use wmatching::prelude::*;
///
/// let mut g = AdjArrayUndir::from_edges(3, [(0, 1), (1, 2)]);
/// assert_eq!(g.degree_of(1), 2);
///
/// let bye = g.add_node();
/// g.add_edge(bye, 0);
/// assert!(g.has_edge(0, bye));
/// ```
#[derive(Clone, Default)]
pub struct AdjArrayUndir {
    nbs: Vec<Vec<Node>>,
    num_edges: NumEdges,
}

impl GraphType for AdjArrayUndir {
    type Dir = Undirected;
}

impl GraphNodeOrder for AdjArrayUndir {
    type VertexIter<'a>
        = Range<Node>
    where
        Self: 'a;

    fn vertices(&self) -> Self::VertexIter<'_> {
        self.vertices_range()
    }

    fn number_of_nodes(&self) -> NumNodes {
        self.nbs.len() as NumNodes
    }
}

impl GraphEdgeOrder for AdjArrayUndir {
    fn number_of_edges(&self) -> NumEdges {
        self.num_edges
    }
}

impl AdjacencyList for AdjArrayUndir {
    type NeighborIter<'a>
        = std::iter::Copied<std::slice::Iter<'a, Node>>
    where
        Self: 'a;

    fn neighbors_of(&self, u: Node) -> Self::NeighborIter<'_> {
        self.nbs[u as usize].iter().copied()
    }

    fn degree_of(&self, u: Node) -> NumNodes {
        self.nbs[u as usize].len() as NumNodes
    }
}

impl AdjacencyTest for AdjArrayUndir {
    fn has_edge(&self, u: Node, v: Node) -> bool {
        self.nbs[u as usize].contains(&v)
    }
}

impl GraphNew for AdjArrayUndir {
    fn new(n: NumNodes) -> Self {
        Self {
            nbs: vec![Vec::new(); n as usize],
            num_edges: 0,
        }
    }
}

impl GraphVertexEditing for AdjArrayUndir {
    fn add_node(&mut self) -> Node {
        let u = self.number_of_nodes();
        self.nbs.push(Vec::new());
        u
    }
}

impl GraphEdgeEditing for AdjArrayUndir {
    fn add_edge(&mut self, u: Node, v: Node) {
        self.nbs[u as usize].push(v);
        if u != v {
            self.nbs[v as usize].push(u);
        }
        self.num_edges += 1;
    }

    fn try_add_edge(&mut self, u: Node, v: Node) -> bool {
        if self.has_edge(u, v) {
            true
        } else {
            self.add_edge(u, v);
            false
        }
    }

    fn try_remove_edge(&mut self, u: Node, v: Node) -> bool {
        // `remove` instead of `swap_remove` keeps the insertion order of
        // the remaining neighbors intact
        let Some(pos) = self.nbs[u as usize].iter().position(|&x| x == v) else {
            return false;
        };
        self.nbs[u as usize].remove(pos);
        if u != v {
            let pos = self.nbs[v as usize]
                .iter()
                .position(|&x| x == u)
                .expect("undirected adjacency must be symmetric");
            self.nbs[v as usize].remove(pos);
        }
        self.num_edges -= 1;
        true
    }
}

impl GraphLocalEdgeEditing for AdjArrayUndir {
    fn remove_edges_at_node(&mut self, u: Node) {
        let removed = std::mem::take(&mut self.nbs[u as usize]);
        self.num_edges -= removed.len() as NumEdges;

        // one back-reference per occurrence, so parallel edges stay balanced
        for v in removed {
            if v == u {
                continue;
            }
            let list = &mut self.nbs[v as usize];
            let pos = list
                .iter()
                .position(|&x| x == u)
                .expect("undirected adjacency must be symmetric");
            list.remove(pos);
        }
    }
}

// Without a weight overlay every edge weighs the same; writes go nowhere.
impl EdgeWeights for AdjArrayUndir {
    fn weight_of(&self, _edge: Edge) -> Weight {
        DEFAULT_EDGE_WEIGHT
    }
}

// ---------- Testing ----------

test_graph_ops!(
    test_adj_array_undir,
    AdjArrayUndir,
    (GraphNew, AdjacencyList, GraphEdgeEditing, GraphVertexEditing)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_edges_are_kept_per_copy() {
        let mut g = AdjArrayUndir::new(2);
        g.add_edge(0, 1);
        g.add_edge(0, 1);

        assert_eq!(g.number_of_edges(), 2);
        assert_eq!(g.edges_of(0, true).count(), 2);

        assert!(g.try_remove_edge(0, 1));
        assert_eq!(g.number_of_edges(), 1);
        assert!(g.has_edge(0, 1));
    }

    #[test]
    fn removals_preserve_insertion_order() {
        let mut g = AdjArrayUndir::from_edges(5, [(0, 1), (0, 2), (0, 3), (0, 4)]);
        g.remove_edge(0, 2);

        let neighbors: Vec<_> = g.neighbors_of(0).collect();
        assert_eq!(neighbors, vec![1, 3, 4]);
    }

    #[test]
    fn self_loops_touch_one_list() {
        let mut g = AdjArrayUndir::new(2);
        g.add_edge(1, 1);
        assert_eq!(g.number_of_edges(), 1);
        assert_eq!(g.degree_of(1), 1);

        g.remove_edges_at_node(1);
        assert!(g.is_singleton_graph());
    }
}
