/*!
`wmatching` is a **w**eighted matching library for graphs that are
- **undirected** : Edges have no orientation
- **unlabelled** : Nodes are numbered `0` to `n - 1`
- **weighted** : Edges carry real weights through an overlay

# Representation

We represent **nodes** as `u32` in the range `0..n` if `n` is the number of nodes in the graph.
As most common graphs do not exceed `2^32` nodes, this should normally suffice and save space as compared to `u64/usize`.
For **edges**, we use a simple tuple-struct `Edge(Node, Node)`; `Edge(u, v)` is treated as
equivalent to `Edge(v, u)`. Weights live in a decorator ([`WeightedGraph`](crate::repr::WeightedGraph) /
[`FnWeightedGraph`](crate::repr::FnWeightedGraph)) wrapped around the plain adjacency-list
representation from [`repr`].

# Solver

The core of the crate is a minimum/maximum weight **perfect matching** solver
for general (non-bipartite) graphs implementing Kolmogorov's *Blossom V*
algorithm, exposed as the [`WeightedPerfectMatching`](crate::blossom::WeightedPerfectMatching)
trait on every suitable graph type:

```
use wmatching::prelude::*;

let g = WeightedGraph::<AdjArrayUndir>::from_weighted_edges(4, [
    (0, 1, 7.0), (1, 2, 4.0), (2, 3, 3.0), (3, 0, 4.0),
]);
assert_eq!(g.minimum_weight_perfect_matching().unwrap().weight, 8.0);
```

Its supporting pieces are usable on their own:
- [`heap`] — an addressable, mergeable pairing heap whose handles survive melds,
- [`repr`] — the adjacency-list graph and the weight overlays,
- [`swiss`] — a Swiss-tournament pairing round generator on top of the solver,
- [`io`] — persistence for computed matchings.

# Design

All algorithms are provided as configurable structs that one can alter to their needs using
either the *Builder* / *Setter* pattern before calling the configured algorithm on a provided
graph. Alternatively, the most important functionality is implemented via traits on graphs
itself, making it usable without configuring the algorithm beforehand.

# When to use

You should only use this library if the following apply:
- Your graphs are unlabelled, with weights attached per edge
- You want to work in *Rust*
- You need exact optimum matchings (no approximation)

In all other cases, it might make sense for you to check out
[petgraph](https://crates.io/crates/petgraph) who provide a more extensive library for
general graphs in *Rust*.
*/

pub mod blossom;
pub mod edge;
pub mod heap;
pub mod io;
pub mod node;
pub mod ops;
pub mod repr;
pub mod swiss;
pub(crate) mod testing;

/// `wmatching::prelude` includes definitions for nodes and edges, all basic graph operation
/// traits, all implemented representations as well as the matching solver surface.
pub mod prelude {
    pub use super::{blossom::*, edge::*, node::*, ops::*, repr::*};
}
