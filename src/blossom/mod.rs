/*!
# Weighted Perfect Matching

Minimum/maximum weight **perfect matching** in general (non-bipartite)
undirected weighted graphs, implementing Kolmogorov's Blossom V algorithm.

The solver works on any graph providing the capability set of
[`AdjacencyList`] + [`EdgeWeights`] (+ [`GraphType<Dir = Undirected>`]):

```
use wmatching::prelude::*;

let g = WeightedGraph::<AdjArrayUndir>::from_weighted_edges(4, [
    (0, 1, 7.0), (1, 2, 4.0), (2, 3, 3.0), (3, 0, 4.0),
]);

let matching = g.minimum_weight_perfect_matching().unwrap();
assert_eq!(matching.weight, 8.0);

let matching = g.maximum_weight_perfect_matching().unwrap();
assert_eq!(matching.weight, 10.0);
```

Internally the solver always **minimizes**; for [`Objective::Maximize`] the
edge weights are negated on the way in and the reported weight on the way
out.

## Structure

- [`state`] — flat-array solver state: surface nodes, blossoms, alternating
  trees, cross-tree connections, and the shared [`PairingForest`] all heaps
  live in.
- [`init`] — problem construction and the `None` / `Greedy` / `Fractional`
  warm starts.
- [`primal`] — the four primal operations: grow, augment, shrink, expand.
- [`dual`] — single-tree and multi-tree dual updates.
- [`solve`] — the driver loop, blossom finishing, dual-solution extraction
  and the optimality checks.
*/

use std::fmt::Display;
use std::time::Duration;

use fxhash::FxHashMap;

use crate::{edge::*, node::*, ops::*};

pub(crate) mod dual;
pub(crate) mod init;
pub(crate) mod primal;
pub(crate) mod solve;
pub(crate) mod state;

/// Tolerance used for all floating point comparisons of the solver.
pub const EPS: f64 = 1e-9;

/// A value considered larger than any finite slack or dual.
pub const INFINITY: f64 = 1e100;

/// When a dual change would exceed this threshold, the instance has no
/// perfect matching. Two orders above any realistic slack, so the
/// condition is unambiguous.
pub const NO_PERFECT_MATCHING_THRESHOLD: f64 = 1e10;

/// Optimization direction of the solve.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Objective {
    /// Find the perfect matching of smallest total weight.
    #[default]
    Minimize,
    /// Find the perfect matching of largest total weight.
    Maximize,
}

/// Warm-start strategy run before the main loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Initialization {
    /// No warm start; every node becomes a trivial tree.
    None,
    /// Greedy dual initialization and matching of tight edges.
    Greedy,
    /// Greedy warm start followed by solving the fractional matching
    /// relaxation. Usually the fastest option.
    #[default]
    Fractional,
}

/// How dual changes are distributed across alternating trees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DualUpdateStrategy {
    /// One common delta for every tree.
    #[default]
    MultipleTreeFixedDelta,
    /// One delta per connected component of trees linked by tight
    /// cross-tree edges.
    MultipleTreeConnectedComponents,
}

/// Configuration of the matching solver, built in setter style.
///
/// ```
/// # use wmatching::blossom::*;
/// let options = MatcherOptions::default()
///     .with_objective(Objective::Maximize)
///     .with_initialization(Initialization::Greedy)
///     .with_update_duals_before(false);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MatcherOptions {
    /// Optimization direction. Default: minimize.
    pub objective: Objective,
    /// Warm-start strategy. Default: fractional.
    pub initialization: Initialization,
    /// Dual update strategy of the main loop. Default: fixed delta.
    pub dual_update_strategy: DualUpdateStrategy,
    /// Perform a single-tree dual update before processing a tree.
    /// Default: `true`.
    pub update_duals_before: bool,
    /// Perform a single-tree dual update after processing a tree.
    /// Default: `false`.
    pub update_duals_after: bool,
}

impl MatcherOptions {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            objective: Objective::Minimize,
            initialization: Initialization::Fractional,
            dual_update_strategy: DualUpdateStrategy::MultipleTreeFixedDelta,
            update_duals_before: true,
            update_duals_after: false,
        }
    }

    /// Sets the optimization direction.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the warm-start strategy.
    pub fn with_initialization(mut self, initialization: Initialization) -> Self {
        self.initialization = initialization;
        self
    }

    /// Sets the dual update strategy.
    pub fn with_dual_update_strategy(mut self, strategy: DualUpdateStrategy) -> Self {
        self.dual_update_strategy = strategy;
        self
    }

    /// Enables/disables the single-tree dual update before tree processing.
    pub fn with_update_duals_before(mut self, enabled: bool) -> Self {
        self.update_duals_before = enabled;
        self
    }

    /// Enables/disables the single-tree dual update after tree processing.
    pub fn with_update_duals_after(mut self, enabled: bool) -> Self {
        self.update_duals_after = enabled;
        self
    }
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure surfaces of the solver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchingError {
    /// A perfect matching cannot exist on an odd number of vertices.
    OddNumberOfVertices,
    /// The dual objective diverged: some vertices can never be matched.
    NoPerfectMatching,
}

impl Display for MatchingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchingError::OddNumberOfVertices => {
                write!(f, "graph has an odd number of vertices")
            }
            MatchingError::NoPerfectMatching => write!(f, "graph admits no perfect matching"),
        }
    }
}

impl std::error::Error for MatchingError {}

/// Operation counts and per-phase times of one solve.
#[derive(Debug, Copy, Clone, Default)]
pub struct MatchingStats {
    /// Number of grow operations performed.
    pub grow_num: u64,
    /// Number of shrink operations performed.
    pub shrink_num: u64,
    /// Number of expand operations performed.
    pub expand_num: u64,
    /// Number of trees after initialization.
    pub initial_tree_num: usize,
    /// Time spent growing trees.
    pub grow_time: Duration,
    /// Time spent augmenting.
    pub augment_time: Duration,
    /// Time spent shrinking blossoms.
    pub shrink_time: Duration,
    /// Time spent expanding blossoms.
    pub expand_time: Duration,
    /// Time spent updating duals.
    pub dual_update_time: Duration,
}

/// A perfect matching found by the solver.
#[derive(Debug, Clone)]
pub struct PerfectMatching {
    /// The matched edges, with their original endpoint order preserved.
    pub edges: Vec<Edge>,
    /// Total weight of the matching in the input graph.
    pub weight: Weight,
    /// Operation counts and phase times of the solve.
    pub stats: MatchingStats,
}

impl PerfectMatching {
    /// Returns the matched partner of `u`, if `u` is an endpoint of a
    /// matched edge.
    pub fn partner_of(&self, u: Node) -> Option<Node> {
        self.edges.iter().find_map(|e| {
            if e.0 == u {
                Some(e.1)
            } else if e.1 == u {
                Some(e.0)
            } else {
                None
            }
        })
    }
}

/// The dual solution certifying optimality of a matching.
///
/// Maps odd-cardinality subsets of vertices to their dual value: a
/// singleton per vertex, plus the contracted vertex set of every blossom
/// with non-zero dual.
#[derive(Debug, Clone, Default)]
pub struct DualSolution {
    /// Dual value per odd vertex subset. Subsets are sorted node lists.
    pub duals: FxHashMap<Vec<Node>, Weight>,
}

impl DualSolution {
    /// Dual value of a single vertex.
    pub fn of_vertex(&self, u: Node) -> Weight {
        self.duals.get(&vec![u]).copied().unwrap_or(0.0)
    }
}

/// Matching algorithms on weighted undirected graphs.
///
/// Blanket-implemented for every graph type providing adjacency, weights
/// and the undirected marker.
pub trait WeightedPerfectMatching:
    AdjacencyList + GraphEdgeOrder + EdgeWeights + GraphType<Dir = Undirected>
{
    /// Computes a perfect matching optimizing the configured objective.
    ///
    /// Fails with [`MatchingError::OddNumberOfVertices`] on odd-order
    /// graphs and [`MatchingError::NoPerfectMatching`] when no perfect
    /// matching exists.
    fn perfect_matching(&self, options: MatcherOptions) -> Result<PerfectMatching, MatchingError> {
        Ok(self.perfect_matching_with_duals(options)?.0)
    }

    /// Like [`WeightedPerfectMatching::perfect_matching`], additionally
    /// returning the dual solution certifying optimality.
    fn perfect_matching_with_duals(
        &self,
        options: MatcherOptions,
    ) -> Result<(PerfectMatching, DualSolution), MatchingError>;

    /// Shorthand for a minimize solve with default options.
    fn minimum_weight_perfect_matching(&self) -> Result<PerfectMatching, MatchingError> {
        self.perfect_matching(MatcherOptions::new())
    }

    /// Shorthand for a maximize solve with default options.
    fn maximum_weight_perfect_matching(&self) -> Result<PerfectMatching, MatchingError> {
        self.perfect_matching(MatcherOptions::new().with_objective(Objective::Maximize))
    }

    /// Magnitude of complementary-slackness violations of a matching and
    /// dual solution pair. Optimal solutions return a value `< EPS`.
    fn matching_error(
        &self,
        matching: &PerfectMatching,
        duals: &DualSolution,
        objective: Objective,
    ) -> Weight {
        solve::compute_error(self, matching, duals, objective)
    }

    /// Returns `true` if matching and duals together certify optimality.
    fn test_optimality(
        &self,
        matching: &PerfectMatching,
        duals: &DualSolution,
        objective: Objective,
    ) -> bool {
        self.matching_error(matching, duals, objective) < EPS
    }

    /// Returns `true` if the dual solution is feasible: no negative
    /// blossom duals and no negative edge slacks.
    fn test_dual_feasibility(&self, duals: &DualSolution, objective: Objective) -> bool {
        solve::dual_feasible(self, duals, objective)
    }
}

impl<G> WeightedPerfectMatching for G
where
    G: AdjacencyList + GraphEdgeOrder + EdgeWeights + GraphType<Dir = Undirected>,
{
    fn perfect_matching_with_duals(
        &self,
        options: MatcherOptions,
    ) -> Result<(PerfectMatching, DualSolution), MatchingError> {
        solve::run(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{AdjArrayUndir, WeightedGraph};
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    type TestGraph = WeightedGraph<AdjArrayUndir>;

    fn graph_from(n: u32, edges: &[(Node, Node, Weight)]) -> TestGraph {
        WeightedGraph::from_weighted_edges(n, edges.iter().copied())
    }

    fn four_cycle() -> TestGraph {
        graph_from(4, &[(0, 1, 7.0), (1, 2, 4.0), (2, 3, 3.0), (3, 0, 4.0)])
    }

    fn triangulation() -> TestGraph {
        graph_from(
            8,
            &[
                (0, 1, 8.0),
                (0, 2, 10.0),
                (1, 2, 8.0),
                (0, 3, 11.0),
                (1, 3, 5.0),
                (2, 5, 3.0),
                (1, 5, 6.0),
                (2, 4, 3.0),
                (4, 5, 1.0),
                (1, 6, 5.0),
                (3, 6, 4.0),
                (3, 7, 5.0),
                (6, 7, 2.0),
                (5, 7, 6.0),
                (4, 7, 7.0),
                (1, 7, 5.0),
            ],
        )
    }

    fn all_option_combinations(objective: Objective) -> Vec<MatcherOptions> {
        let mut combos = Vec::new();
        for initialization in [
            Initialization::None,
            Initialization::Greedy,
            Initialization::Fractional,
        ] {
            for strategy in [
                DualUpdateStrategy::MultipleTreeFixedDelta,
                DualUpdateStrategy::MultipleTreeConnectedComponents,
            ] {
                combos.push(
                    MatcherOptions::new()
                        .with_objective(objective)
                        .with_initialization(initialization)
                        .with_dual_update_strategy(strategy),
                );
            }
        }
        combos
    }

    /// Exhaustive minimum/maximum perfect matching weight by recursion.
    fn brute_force(n: u32, edges: &[(Node, Node, Weight)], objective: Objective) -> Option<Weight> {
        fn recurse(
            n: u32,
            edges: &[(Node, Node, Weight)],
            matched: &mut Vec<bool>,
            objective: Objective,
        ) -> Option<Weight> {
            let u = match (0..n).find(|&u| !matched[u as usize]) {
                Some(u) => u,
                None => return Some(0.0),
            };

            let mut best: Option<Weight> = None;
            matched[u as usize] = true;
            for &(a, b, w) in edges {
                let v = if a == u {
                    b
                } else if b == u {
                    a
                } else {
                    continue;
                };
                if v == u || matched[v as usize] {
                    continue;
                }
                matched[v as usize] = true;
                if let Some(rest) = recurse(n, edges, matched, objective) {
                    let total = w + rest;
                    best = Some(match (best, objective) {
                        (None, _) => total,
                        (Some(b), Objective::Minimize) => b.min(total),
                        (Some(b), Objective::Maximize) => b.max(total),
                    });
                }
                matched[v as usize] = false;
            }
            matched[u as usize] = false;
            best
        }

        recurse(n, edges, &mut vec![false; n as usize], objective)
    }

    fn assert_perfect(matching: &PerfectMatching, n: u32) {
        assert_eq!(matching.edges.len(), n as usize / 2);
        let mut covered = vec![false; n as usize];
        for &Edge(u, v) in &matching.edges {
            assert!(!covered[u as usize] && !covered[v as usize]);
            covered[u as usize] = true;
            covered[v as usize] = true;
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn four_cycle_minimize() {
        let matching = four_cycle().minimum_weight_perfect_matching().unwrap();
        assert_perfect(&matching, 4);
        assert_eq!(matching.weight, 8.0);

        let edges = matching.edges.iter().map(|e| e.normalized()).sorted().collect_vec();
        assert_eq!(edges, vec![Edge(0, 3), Edge(1, 2)]);
        assert_eq!(matching.partner_of(1), Some(2));
        assert_eq!(matching.partner_of(4), None);
    }

    #[test]
    fn four_cycle_maximize() {
        let matching = four_cycle().maximum_weight_perfect_matching().unwrap();
        assert_perfect(&matching, 4);
        assert_eq!(matching.weight, 10.0);
    }

    #[test]
    fn triangulation_min_and_max() {
        let g = triangulation();
        assert_eq!(g.minimum_weight_perfect_matching().unwrap().weight, 18.0);
        assert_eq!(g.maximum_weight_perfect_matching().unwrap().weight, 27.0);
    }

    #[test]
    fn empty_graph_has_empty_matching() {
        let g = graph_from(0, &[]);
        for objective in [Objective::Minimize, Objective::Maximize] {
            let matching = g
                .perfect_matching(MatcherOptions::new().with_objective(objective))
                .unwrap();
            assert!(matching.edges.is_empty());
            assert_eq!(matching.weight, 0.0);
        }
    }

    #[test]
    fn odd_vertex_count_is_invalid_input() {
        let g = graph_from(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(
            g.minimum_weight_perfect_matching().unwrap_err(),
            MatchingError::OddNumberOfVertices
        );
    }

    #[test]
    fn odd_components_have_no_perfect_matching() {
        let g = graph_from(
            6,
            &[(0, 1, 1.0), (1, 2, 1.0), (3, 4, 1.0), (4, 5, 1.0)],
        );
        for options in all_option_combinations(Objective::Minimize) {
            assert_eq!(
                g.perfect_matching(options).unwrap_err(),
                MatchingError::NoPerfectMatching
            );
        }
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut g = four_cycle();
        g.add_weighted_edge(1, 1, -100.0);
        assert_eq!(g.minimum_weight_perfect_matching().unwrap().weight, 8.0);
    }

    #[test]
    fn parallel_edges_do_not_corrupt_the_solve() {
        let mut g = four_cycle();
        // a second copy of (0, 1); both report the overlay weight
        g.add_edge(0, 1);
        let matching = g.minimum_weight_perfect_matching().unwrap();
        assert_perfect(&matching, 4);
        assert_eq!(matching.weight, 8.0);
    }

    #[test]
    fn dual_solution_certifies_optimality() {
        let g = triangulation();
        for objective in [Objective::Minimize, Objective::Maximize] {
            let options = MatcherOptions::new().with_objective(objective);
            let (matching, duals) = g.perfect_matching_with_duals(options).unwrap();
            assert!(g.test_dual_feasibility(&duals, objective));
            assert!(g.test_optimality(&matching, &duals, objective));
        }
    }

    #[test]
    fn perturbed_dual_fails_the_optimality_check() {
        let g = four_cycle();
        let options = MatcherOptions::new();
        let (matching, mut duals) = g.perfect_matching_with_duals(options).unwrap();
        assert!(g.test_optimality(&matching, &duals, Objective::Minimize));

        *duals.duals.get_mut(&vec![0]).unwrap() += 1.0;
        assert!(!g.test_optimality(&matching, &duals, Objective::Minimize));
    }

    #[test]
    fn minimize_equals_maximize_on_negated_weights() {
        let edges = [
            (0, 1, 8.0),
            (0, 2, 10.0),
            (1, 2, 8.0),
            (0, 3, 11.0),
            (1, 3, 5.0),
            (2, 3, 7.0),
        ];
        let g = graph_from(4, &edges);
        let negated: Vec<_> = edges.iter().map(|&(u, v, w)| (u, v, -w)).collect();
        let g_neg = graph_from(4, &negated);

        let min = g.minimum_weight_perfect_matching().unwrap();
        let max = g_neg.maximum_weight_perfect_matching().unwrap();

        assert_eq!(min.weight, -max.weight);
        assert_eq!(
            min.edges.iter().map(|e| e.normalized()).sorted().collect_vec(),
            max.edges.iter().map(|e| e.normalized()).sorted().collect_vec()
        );
    }

    #[test]
    fn all_strategies_agree_on_the_optimum() {
        let g = triangulation();
        for options in all_option_combinations(Objective::Minimize) {
            assert_eq!(g.perfect_matching(options).unwrap().weight, 18.0);
        }
        for options in all_option_combinations(Objective::Maximize) {
            assert_eq!(g.perfect_matching(options).unwrap().weight, 27.0);
        }
    }

    #[test]
    fn deterministic_edge_sets() {
        let options = MatcherOptions::new();
        let first = triangulation().perfect_matching(options).unwrap();
        let second = triangulation().perfect_matching(options).unwrap();
        assert_eq!(first.edges, second.edges);
    }

    #[test]
    fn statistics_are_reported() {
        let matching = triangulation().minimum_weight_perfect_matching().unwrap();
        assert!(matching.stats.initial_tree_num <= 8);
        // at least the grow phase must have been exercised on this instance
        assert!(matching.stats.grow_num + matching.stats.shrink_num + matching.stats.expand_num > 0
            || matching.stats.initial_tree_num == 0);
    }

    #[test]
    fn randomized_against_brute_force() {
        let rng = &mut Pcg64Mcg::seed_from_u64(0xb10550);

        for n in [4u32, 6, 8] {
            for _ in 0..15 {
                // dense enough to almost surely admit a perfect matching
                let mut edges = Vec::new();
                for u in 0..n {
                    for v in u + 1..n {
                        if rng.random_range(0..4u32) > 0 {
                            edges.push((u, v, rng.random_range(1..100u32) as Weight));
                        }
                    }
                }
                let g = graph_from(n, &edges);

                for objective in [Objective::Minimize, Objective::Maximize] {
                    let expected = brute_force(n, &edges, objective);
                    for options in all_option_combinations(objective) {
                        match (expected, g.perfect_matching(options)) {
                            (Some(weight), Ok(matching)) => {
                                assert_perfect(&matching, n);
                                assert!(
                                    (matching.weight - weight).abs() < EPS,
                                    "n={n} {objective:?} {options:?}: {} != {weight}",
                                    matching.weight
                                );
                            }
                            (None, Err(MatchingError::NoPerfectMatching)) => {}
                            (expected, got) => {
                                panic!("n={n} {objective:?}: expected {expected:?}, got {got:?}")
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn randomized_duals_certify_optimality() {
        let rng = &mut Pcg64Mcg::seed_from_u64(99);

        for _ in 0..10 {
            let n = 10u32;
            let mut edges = Vec::new();
            for u in 0..n {
                for v in u + 1..n {
                    edges.push((u, v, rng.random_range(1..50u32) as Weight));
                }
            }
            let g = graph_from(n, &edges);

            let (matching, duals) = g
                .perfect_matching_with_duals(MatcherOptions::new())
                .unwrap();
            assert_perfect(&matching, n);
            assert!(g.matching_error(&matching, &duals, Objective::Minimize) < EPS);
        }
    }
}
