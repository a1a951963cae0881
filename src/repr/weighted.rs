/*!
# Weight Overlays

Decorators that attach edge weights to any graph representation.

- [`WeightedGraph`] keeps an explicit edge→weight mapping next to the
  wrapped graph. Missing entries fall back to a configurable default.
- [`FnWeightedGraph`] computes weights on demand from a weight function,
  optionally memoizing them for all current edges.

Both decorators delegate every structural operation to the wrapped graph,
so they satisfy the same traits and can be handed to any algorithm that
works on the underlying representation. Weights are keyed on **normalized**
edges: `Edge(u, v)` and `Edge(v, u)` share one weight.

# Examples
```
use wmatching::prelude::*;

let mut g = WeightedGraph::<AdjArrayUndir>::from_weighted_edges(4, [
    (0, 1, 7.0),
    (1, 2, 4.0),
    (2, 3, 3.0),
    (3, 0, 4.0),
]);

assert_eq!(g.weight_of(Edge(1, 0)), 7.0);
g.set_weight(Edge(0, 1), 6.5);
assert_eq!(g.weight_of(Edge(0, 1)), 6.5);
```
*/

use fxhash::FxHashMap;

use super::*;

/// Wraps a graph and overlays an explicit edge→weight mapping.
///
/// Edges without an entry report the default weight
/// ([`DEFAULT_EDGE_WEIGHT`] unless overridden).
#[derive(Clone)]
pub struct WeightedGraph<G> {
    graph: G,
    weights: FxHashMap<Edge, Weight>,
    default_weight: Weight,
}

impl<G> WeightedGraph<G> {
    /// Wraps `graph` with an empty weight mapping.
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            weights: FxHashMap::default(),
            default_weight: DEFAULT_EDGE_WEIGHT,
        }
    }

    /// Sets the weight reported for edges without a mapping entry.
    pub fn with_default_weight(mut self, weight: Weight) -> Self {
        self.default_weight = weight;
        self
    }

    /// Read access to the wrapped graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Consumes the overlay and returns the wrapped graph.
    pub fn into_inner(self) -> G {
        self.graph
    }

    /// Sets the weight of `edge` (stored under the normalized key).
    pub fn set_weight(&mut self, edge: Edge, weight: Weight) {
        self.weights.insert(edge.normalized(), weight);
    }
}

impl<G> WeightedGraph<G>
where
    G: GraphNew + GraphEdgeEditing,
{
    /// Creates a graph with `n` nodes from `(u, v, weight)` triples.
    ///
    /// **Panics if an edge appears twice or has an endpoint `>= n`**
    pub fn from_weighted_edges<I>(n: NumNodes, edges: I) -> Self
    where
        I: IntoIterator<Item = (Node, Node, Weight)>,
    {
        let mut graph = Self::new(G::new(n));
        for (u, v, w) in edges {
            graph.add_weighted_edge(u, v, w);
        }
        graph
    }

    /// Adds the edge `(u, v)` with the given weight.
    ///
    /// **Panics if the edge already exists or an endpoint is out of range**
    pub fn add_weighted_edge(&mut self, u: Node, v: Node, weight: Weight) {
        self.graph.add_edge(u, v);
        self.weights.insert(Edge(u, v).normalized(), weight);
    }
}

impl<G: GraphType> GraphType for WeightedGraph<G> {
    type Dir = G::Dir;
}

impl<G: GraphNodeOrder> GraphNodeOrder for WeightedGraph<G> {
    type VertexIter<'a>
        = G::VertexIter<'a>
    where
        Self: 'a;

    fn number_of_nodes(&self) -> NumNodes {
        self.graph.number_of_nodes()
    }

    fn vertices(&self) -> Self::VertexIter<'_> {
        self.graph.vertices()
    }
}

impl<G: GraphEdgeOrder> GraphEdgeOrder for WeightedGraph<G> {
    fn number_of_edges(&self) -> NumEdges {
        self.graph.number_of_edges()
    }
}

impl<G: AdjacencyList> AdjacencyList for WeightedGraph<G> {
    type NeighborIter<'a>
        = G::NeighborIter<'a>
    where
        Self: 'a;

    fn neighbors_of(&self, u: Node) -> Self::NeighborIter<'_> {
        self.graph.neighbors_of(u)
    }

    fn degree_of(&self, u: Node) -> NumNodes {
        self.graph.degree_of(u)
    }
}

impl<G: AdjacencyTest> AdjacencyTest for WeightedGraph<G> {
    fn has_edge(&self, u: Node, v: Node) -> bool {
        self.graph.has_edge(u, v)
    }
}

impl<G: GraphVertexEditing> GraphVertexEditing for WeightedGraph<G> {
    fn add_node(&mut self) -> Node {
        self.graph.add_node()
    }
}

impl<G: GraphNew> GraphNew for WeightedGraph<G> {
    fn new(n: NumNodes) -> Self {
        Self::new(G::new(n))
    }
}

impl<G: GraphEdgeEditing> GraphEdgeEditing for WeightedGraph<G> {
    fn add_edge(&mut self, u: Node, v: Node) {
        self.graph.add_edge(u, v);
    }

    fn try_add_edge(&mut self, u: Node, v: Node) -> bool {
        self.graph.try_add_edge(u, v)
    }

    fn try_remove_edge(&mut self, u: Node, v: Node) -> bool {
        let removed = self.graph.try_remove_edge(u, v);
        if removed {
            self.weights.remove(&Edge(u, v).normalized());
        }
        removed
    }
}

impl<G> EdgeWeights for WeightedGraph<G> {
    fn weight_of(&self, edge: Edge) -> Weight {
        self.weights
            .get(&edge.normalized())
            .copied()
            .unwrap_or(self.default_weight)
    }

    fn try_set_weight(&mut self, edge: Edge, weight: Weight) -> bool {
        self.set_weight(edge, weight);
        true
    }
}

/// Wraps a graph and computes weights through a function `Edge -> Weight`.
///
/// The function always receives the **normalized** edge. Calling
/// [`FnWeightedGraph::cache_current_edges`] memoizes the weight of every
/// edge present at that moment; explicit writes via
/// [`EdgeWeights::try_set_weight`] also land in the memo and shadow the
/// function from then on.
#[derive(Clone)]
pub struct FnWeightedGraph<G, F> {
    graph: G,
    weight_fn: F,
    memo: FxHashMap<Edge, Weight>,
}

impl<G, F> FnWeightedGraph<G, F>
where
    F: Fn(Edge) -> Weight,
{
    /// Wraps `graph`; weights are computed by `weight_fn` on every query.
    pub fn new(graph: G, weight_fn: F) -> Self {
        Self {
            graph,
            weight_fn,
            memo: FxHashMap::default(),
        }
    }

    /// Read access to the wrapped graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Evaluates and memoizes the weight of every current edge, so later
    /// queries are map lookups instead of function calls.
    pub fn cache_current_edges(&mut self)
    where
        G: AdjacencyList,
    {
        let edges: Vec<Edge> = self.graph.edges(true).collect();
        for edge in edges {
            let weight = (self.weight_fn)(edge);
            self.memo.insert(edge, weight);
        }
    }
}

impl<G: GraphType, F> GraphType for FnWeightedGraph<G, F> {
    type Dir = G::Dir;
}

impl<G: GraphNodeOrder, F> GraphNodeOrder for FnWeightedGraph<G, F> {
    type VertexIter<'a>
        = G::VertexIter<'a>
    where
        Self: 'a;

    fn number_of_nodes(&self) -> NumNodes {
        self.graph.number_of_nodes()
    }

    fn vertices(&self) -> Self::VertexIter<'_> {
        self.graph.vertices()
    }
}

impl<G: GraphEdgeOrder, F> GraphEdgeOrder for FnWeightedGraph<G, F> {
    fn number_of_edges(&self) -> NumEdges {
        self.graph.number_of_edges()
    }
}

impl<G: AdjacencyList, F> AdjacencyList for FnWeightedGraph<G, F> {
    type NeighborIter<'a>
        = G::NeighborIter<'a>
    where
        Self: 'a;

    fn neighbors_of(&self, u: Node) -> Self::NeighborIter<'_> {
        self.graph.neighbors_of(u)
    }

    fn degree_of(&self, u: Node) -> NumNodes {
        self.graph.degree_of(u)
    }
}

impl<G: AdjacencyTest, F> AdjacencyTest for FnWeightedGraph<G, F> {
    fn has_edge(&self, u: Node, v: Node) -> bool {
        self.graph.has_edge(u, v)
    }
}

impl<G, F> EdgeWeights for FnWeightedGraph<G, F>
where
    F: Fn(Edge) -> Weight,
{
    fn weight_of(&self, edge: Edge) -> Weight {
        let edge = edge.normalized();
        self.memo
            .get(&edge)
            .copied()
            .unwrap_or_else(|| (self.weight_fn)(edge))
    }

    fn try_set_weight(&mut self, edge: Edge, weight: Weight) -> bool {
        self.memo.insert(edge.normalized(), weight);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::AdjArrayUndir;

    #[test]
    fn mapping_overlay_reads_both_orientations() {
        let g: WeightedGraph<AdjArrayUndir> =
            WeightedGraph::from_weighted_edges(3, [(0, 1, 2.5), (1, 2, -1.0)]);

        assert_eq!(g.weight_of(Edge(0, 1)), 2.5);
        assert_eq!(g.weight_of(Edge(1, 0)), 2.5);
        assert_eq!(g.weight_of(Edge(2, 1)), -1.0);
        assert_eq!(g.number_of_edges(), 2);
    }

    #[test]
    fn default_weight_for_unmapped_edges() {
        let mut g = WeightedGraph::new(AdjArrayUndir::new(2)).with_default_weight(0.25);
        g.try_add_edge(0, 1);
        assert_eq!(g.weight_of(Edge(0, 1)), 0.25);
    }

    #[test]
    fn removing_edge_drops_weight() {
        let mut g: WeightedGraph<AdjArrayUndir> =
            WeightedGraph::from_weighted_edges(2, [(0, 1, 9.0)]);
        assert!(g.try_remove_edge(1, 0));
        g.try_add_edge(0, 1);
        assert_eq!(g.weight_of(Edge(0, 1)), DEFAULT_EDGE_WEIGHT);
    }

    #[test]
    fn fn_weights_with_memo() {
        let graph = AdjArrayUndir::from_edges(3, [(0, 1), (1, 2)]);
        let mut g = FnWeightedGraph::new(graph, |Edge(u, v)| (u + v) as Weight);

        assert_eq!(g.weight_of(Edge(1, 0)), 1.0);
        g.cache_current_edges();
        assert!(g.try_set_weight(Edge(1, 2), 100.0));
        assert_eq!(g.weight_of(Edge(2, 1)), 100.0);
        assert_eq!(g.weight_of(Edge(0, 1)), 1.0);
    }
}
