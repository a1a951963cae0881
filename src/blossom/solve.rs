/*!
# Matching Driver

The top-level loop coordinating primal and dual updates, the blossom
finishing pass, and the extraction of the matching, its weight and the
dual solution. Also home of the post-hoc verification helpers exposed on
[`WeightedPerfectMatching`](super::WeightedPerfectMatching).
*/

use std::time::Instant;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::{edge::*, node::*, ops::*};

use super::state::*;
use super::{
    dual, init, primal, DualSolution, DualUpdateStrategy, MatcherOptions, MatchingError,
    Objective, PerfectMatching, EPS,
};

/// Runs the full solve on `graph`.
pub(crate) fn run<G>(
    graph: &G,
    options: MatcherOptions,
) -> Result<(PerfectMatching, DualSolution), MatchingError>
where
    G: AdjacencyList + GraphEdgeOrder + EdgeWeights,
{
    let mut state = init::initialize(graph, options)?;
    main_loop(&mut state)?;
    finish(&mut state);

    let matching = extract_matching(graph, &state);
    let duals = extract_duals(&state);
    Ok((matching, duals))
}

/// The tight cross-tree `(+, +)` edge of minimum slack on any tree edge of
/// `tree`, if one exists.
fn tight_cross_edge(state: &mut State, tree: u32) -> Option<u32> {
    let tree_eps = state.trees[tree as usize].eps;
    for (te, dir) in state.tree_edges_of(tree) {
        let opposite = state.tree_edges[te as usize].head[dir];
        let opposite_eps = state.trees[opposite as usize].eps;
        let plus_plus = state.tree_edges[te as usize].plus_plus_edges;
        if let Some((key, e)) = state.edge_heap_min(plus_plus) {
            if key - tree_eps - opposite_eps <= EPS {
                return Some(e);
            }
        }
    }
    None
}

/// Alternates primal operations and dual updates until no tree remains.
fn main_loop(state: &mut State) -> Result<(), MatchingError> {
    let sentinel = state.sentinel();
    let options = state.options;

    while state.tree_num > 0 {
        let cycle_tree_num = state.tree_num;
        let cycle_ops = state.stats.grow_num + state.stats.shrink_num + state.stats.expand_num;
        let mut cycle_dual_change = 0.0;
        let mut cycle_single_growth = false;

        let mut root = state.nodes[sentinel as usize].tree_sibling_next;
        while root != EMPTY {
            // an augmentation may remove this root and one other; resolve
            // the two follow-up candidates before touching anything
            let next = state.nodes[root as usize].tree_sibling_next;
            let next_next = if next != EMPTY {
                state.nodes[next as usize].tree_sibling_next
            } else {
                EMPTY
            };

            let tree = state.nodes[root as usize].tree;
            let iteration_tree_num = state.tree_num;
            state.set_current_edges(tree);

            if let Some(e) = tight_cross_edge(state, tree) {
                primal::augment(state, e);
            } else {
                let mut augmented = false;
                if options.update_duals_before {
                    let progressed = dual::update_duals_single(state, tree)?;
                    cycle_single_growth |= progressed;
                    augmented = progressed && iteration_tree_num != state.tree_num;
                }

                while !augmented && iteration_tree_num == state.tree_num {
                    let eps = state.trees[tree as usize].eps;

                    let plus_infinity = state.trees[tree as usize].plus_infinity_edges;
                    if let Some((key, e)) = state.edge_heap_min(plus_infinity) {
                        if key <= eps + EPS {
                            primal::grow(state, e, true, true);
                            continue;
                        }
                    }

                    let plus_plus = state.trees[tree as usize].plus_plus_edges;
                    if let Some((key, e)) = state.edge_heap_min(plus_plus) {
                        if key <= 2.0 * eps + EPS {
                            primal::shrink(state, e, true);
                            continue;
                        }
                    }

                    let minus_blossoms = state.trees[tree as usize].minus_blossoms;
                    let blossom_candidate =
                        state.heaps.peek_min(minus_blossoms).map(|(key, &b)| (key, b));
                    if let Some((key, b)) = blossom_candidate {
                        if key <= eps + EPS {
                            primal::expand(state, b, true);
                            continue;
                        }
                    }

                    break;
                }

                if iteration_tree_num == state.tree_num {
                    if options.update_duals_after {
                        let progressed = dual::update_duals_single(state, tree)?;
                        cycle_single_growth |= progressed;
                        if progressed && iteration_tree_num != state.tree_num {
                            // the tree augmented away; its current edges are gone
                        } else {
                            state.clear_current_edges(tree);
                        }
                    } else {
                        state.clear_current_edges(tree);
                    }
                }
            }

            root = if next != EMPTY && state.nodes[next as usize].is_tree_root {
                next
            } else if next_next != EMPTY && state.nodes[next_next as usize].is_tree_root {
                next_next
            } else {
                EMPTY
            };
        }

        if state.tree_num == 0 {
            break;
        }

        if cycle_tree_num == state.tree_num {
            let timer = Instant::now();
            let change = dual::update_duals_global(state, options.dual_update_strategy)?;
            cycle_dual_change += change;
            if change <= EPS && cycle_tree_num == state.tree_num {
                let change = dual::update_duals_global(
                    state,
                    DualUpdateStrategy::MultipleTreeConnectedComponents,
                )?;
                cycle_dual_change += change;
            }
            state.stats.dual_update_time += timer.elapsed();
        }

        // a cycle with no primal operation, no augmentation and no dual
        // movement cannot make progress anymore
        let ops_after = state.stats.grow_num + state.stats.shrink_num + state.stats.expand_num;
        if cycle_tree_num == state.tree_num
            && ops_after == cycle_ops
            && cycle_dual_change <= EPS
            && !cycle_single_growth
        {
            return Err(MatchingError::NoPerfectMatching);
        }
    }

    Ok(())
}

/// Rewrites the interior matchings of all surviving blossoms, outside in,
/// so that each blossom's circuit agrees with its external matched edge.
fn finish(state: &mut State) {
    for b in (state.node_num + 1..state.nodes.len()).rev() {
        let b = b as u32;
        if state.nodes[b as usize].is_blossom
            && state.nodes[b as usize].is_outer
            && state.nodes[b as usize].matched != EMPTY
        {
            let matched = state.nodes[b as usize].matched;
            fix_blossom(state, b, matched);
        }
    }
}

/// Re-roots the circuit of `b` at the child containing the endpoint of
/// `external_edge`, pairs the remaining even path along the sibling ring,
/// and recurses into circuit members that are themselves blossoms.
fn fix_blossom(state: &mut State, b: u32, external_edge: u32) {
    let orig = state.edge_current_original(external_edge, b);

    // the direct child of `b` containing the original endpoint
    let mut child = orig;
    while state.nodes[child as usize].blossom_parent != b {
        child = state.nodes[child as usize].blossom_parent;
    }

    state.nodes[child as usize].matched = external_edge;

    let mut ring = Vec::new();
    let mut ring_edges = Vec::new();
    let mut cur = child;
    loop {
        let e = state.nodes[cur as usize].blossom_sibling;
        ring.push(cur);
        ring_edges.push(e);
        cur = state.edge_opposite(e, cur);
        if cur == child {
            break;
        }
    }

    let mut i = 1;
    while i + 1 < ring.len() {
        let e = ring_edges[i];
        state.nodes[ring[i] as usize].matched = e;
        state.nodes[ring[i + 1] as usize].matched = e;
        i += 2;
    }

    for &c in &ring {
        if state.nodes[c as usize].is_blossom {
            let matched = state.nodes[c as usize].matched;
            fix_blossom(state, c, matched);
        }
    }
}

/// Collects the matched edges of the original vertices and their total
/// weight in the input graph.
fn extract_matching<G>(graph: &G, state: &State) -> PerfectMatching
where
    G: EdgeWeights,
{
    let mut seen = vec![false; state.edges.len()];
    let mut edges = Vec::with_capacity(state.node_num / 2);
    let mut weight = 0.0;

    for v in 0..state.node_num as u32 {
        let e = state.nodes[v as usize].matched;
        debug_assert_ne!(e, EMPTY, "finished matching must cover every vertex");
        if !seen[e as usize] {
            seen[e as usize] = true;
            let ext = state.ext_edges[e as usize];
            edges.push(ext);
            weight += graph.weight_of(ext);
        }
    }

    PerfectMatching {
        edges,
        weight,
        stats: state.stats,
    }
}

/// Builds the dual solution: one singleton per original vertex (shifted
/// back by half the minimum edge weight) and the contracted vertex set of
/// every blossom with non-zero dual. Maximization negates all values.
fn extract_duals(state: &State) -> DualSolution {
    let sign = match state.objective {
        Objective::Minimize => 1.0,
        Objective::Maximize => -1.0,
    };
    let shift = state.min_edge_weight / 2.0;

    let mut duals = FxHashMap::default();
    let mut blossom_sets: FxHashMap<u32, Vec<Node>> = FxHashMap::default();

    for v in 0..state.node_num as u32 {
        duals.insert(vec![v], sign * (state.nodes[v as usize].dual + shift));

        let mut b = state.nodes[v as usize].blossom_parent;
        while b != EMPTY {
            blossom_sets.entry(b).or_default().push(v);
            b = state.nodes[b as usize].blossom_parent;
        }
    }

    for (b, mut set) in blossom_sets {
        let dual = state.nodes[b as usize].dual;
        if dual.abs() > EPS {
            set.sort_unstable();
            duals.insert(set, sign * dual);
        }
    }

    DualSolution { duals }
}

// ---------- Verification ----------

/// Sum of the dual values of all subsets containing exactly one endpoint
/// of the edge.
fn dual_sum_crossing(duals: &DualSolution, u: Node, v: Node) -> Weight {
    duals
        .duals
        .iter()
        .filter(|(set, _)| set.contains(&u) != set.contains(&v))
        .map(|(_, &y)| y)
        .sum()
}

/// Slack of an edge under the reported dual solution, oriented so that
/// feasibility always means `slack >= 0`.
fn reported_slack<G>(graph: &G, duals: &DualSolution, edge: Edge, objective: Objective) -> Weight
where
    G: EdgeWeights,
{
    let crossing = dual_sum_crossing(duals, edge.0, edge.1);
    match objective {
        Objective::Minimize => graph.weight_of(edge) - crossing,
        Objective::Maximize => crossing - graph.weight_of(edge),
    }
}

/// Magnitude of all complementary-slackness violations: negative odd-set
/// duals, negative edge slacks, and non-zero slacks on matched edges.
pub(crate) fn compute_error<G>(
    graph: &G,
    matching: &PerfectMatching,
    duals: &DualSolution,
    objective: Objective,
) -> Weight
where
    G: AdjacencyList + EdgeWeights,
{
    let mut error = 0.0;

    for (set, &y) in duals.duals.iter() {
        if set.len() > 1 && y < 0.0 {
            error += -y;
        }
    }

    let matched: Vec<Edge> = matching.edges.iter().map(|e| e.normalized()).collect_vec();
    for edge in graph.edges(true) {
        if edge.is_loop() {
            continue;
        }
        let slack = reported_slack(graph, duals, edge, objective);
        if slack < 0.0 {
            error += -slack;
        } else if matched.contains(&edge.normalized()) {
            error += slack;
        }
    }

    error
}

/// Returns `true` if the dual solution is feasible for the graph.
pub(crate) fn dual_feasible<G>(graph: &G, duals: &DualSolution, objective: Objective) -> bool
where
    G: AdjacencyList + EdgeWeights,
{
    for (set, &y) in duals.duals.iter() {
        if set.len() > 1 && y < -EPS {
            return false;
        }
    }

    graph
        .edges(true)
        .filter(|edge| !edge.is_loop())
        .all(|edge| reported_slack(graph, duals, edge, objective) >= -EPS)
}
