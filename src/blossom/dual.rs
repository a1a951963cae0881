/*!
# Dual Updater

Raises the eps of alternating trees as far as the slack and dual
constraints allow.

For a single tree the admissible increase is bounded by its own heaps
(minimum `(+, infinity)` slack, minimum "-" blossom dual, half the minimum
in-tree `(+, +)` slack) and by the cross-tree edges to its neighbors. The
multi-tree strategies distribute one delta over all trees at once:

- **fixed delta** applies one common delta bounded by every tree's in-tree
  limit and half of every cross-tree `(+, +)` slack; `(+, -)` edges stay
  valid under a symmetric delta and impose no bound.
- **connected components** groups trees linked by tight `(+, -)` edges and
  gives every component its own delta, bounded additionally by `(+, +)`
  slacks between components and `(+, -)` slacks towards components fixed
  earlier with a possibly smaller delta.

Exceeding [`NO_PERFECT_MATCHING_THRESHOLD`] in any strategy means some
tree can grow forever: the graph has no perfect matching. A cross-tree
`(+, +)` edge that became tight is augmented once before returning.
*/

use super::state::*;
use super::{primal, DualUpdateStrategy, MatchingError, EPS, INFINITY, NO_PERFECT_MATCHING_THRESHOLD};

/// Largest admissible eps of `tree` respecting only in-tree constraints.
fn eps_max_in_tree(state: &mut State, tree: u32) -> f64 {
    let mut eps = INFINITY;

    let plus_infinity = state.trees[tree as usize].plus_infinity_edges;
    if let Some((key, _)) = state.edge_heap_min(plus_infinity) {
        eps = eps.min(key);
    }

    let plus_plus = state.trees[tree as usize].plus_plus_edges;
    if let Some((key, _)) = state.edge_heap_min(plus_plus) {
        eps = eps.min(key / 2.0);
    }

    let minus_blossoms = state.trees[tree as usize].minus_blossoms;
    if let Some((key, _)) = state.heaps.peek_min(minus_blossoms) {
        eps = eps.min(key);
    }

    eps
}

/// All live trees, taken from the global root list.
fn live_trees(state: &State) -> Vec<u32> {
    let mut trees = Vec::with_capacity(state.tree_num);
    let mut root = state.nodes[state.sentinel() as usize].tree_sibling_next;
    while root != EMPTY {
        trees.push(state.nodes[root as usize].tree);
        root = state.nodes[root as usize].tree_sibling_next;
    }
    trees
}

/// Single-tree dual update. Returns `true` if the tree was augmented away
/// or its eps grew.
pub(crate) fn update_duals_single(state: &mut State, tree: u32) -> Result<bool, MatchingError> {
    let mut eps = eps_max_in_tree(state, tree);
    let mut augment_candidate: Option<(f64, u32)> = None;

    for (te, dir) in state.tree_edges_of(tree) {
        let opposite = state.tree_edges[te as usize].head[dir];
        let opposite_eps = state.trees[opposite as usize].eps;

        // cross (+, +): tightens while this tree grows, the other fixed
        let plus_plus = state.tree_edges[te as usize].plus_plus_edges;
        if let Some((key, e)) = state.edge_heap_min(plus_plus) {
            let bound = key - opposite_eps;
            if augment_candidate.map_or(true, |(b, _)| bound < b) {
                augment_candidate = Some((bound, e));
            }
        }

        // cross (+, -) with "+" on this side; (-, +) edges only relax
        let plus_minus = state.tree_edges[te as usize].plus_minus_edges[1 - dir];
        if let Some((key, _)) = state.edge_heap_min(plus_minus) {
            eps = eps.min(key + opposite_eps);
        }
    }

    if let Some((bound, _)) = augment_candidate {
        eps = eps.min(bound);
    }

    let old_eps = state.trees[tree as usize].eps;
    let eps = eps.max(old_eps);
    if eps > NO_PERFECT_MATCHING_THRESHOLD {
        return Err(MatchingError::NoPerfectMatching);
    }
    let grew = eps > old_eps + EPS;
    state.trees[tree as usize].eps = eps;

    if let Some((bound, e)) = augment_candidate {
        if bound <= eps + EPS {
            primal::augment(state, e);
            return Ok(true);
        }
    }

    Ok(grew)
}

/// Multi-tree dual update with the configured strategy. Returns the
/// accumulated dual change (zero means no progress was possible).
pub(crate) fn update_duals_global(
    state: &mut State,
    strategy: DualUpdateStrategy,
) -> Result<f64, MatchingError> {
    match strategy {
        DualUpdateStrategy::MultipleTreeFixedDelta => update_duals_fixed_delta(state),
        DualUpdateStrategy::MultipleTreeConnectedComponents => {
            update_duals_connected_components(state)
        }
    }
}

/// One common delta for every tree.
fn update_duals_fixed_delta(state: &mut State) -> Result<f64, MatchingError> {
    let trees = live_trees(state);
    if trees.is_empty() {
        return Ok(0.0);
    }

    let mut delta = INFINITY;
    let mut augment_candidate: Option<(f64, u32)> = None;

    for &tree in &trees {
        let tree_eps = state.trees[tree as usize].eps;
        delta = delta.min(eps_max_in_tree(state, tree) - tree_eps);

        for (te, dir) in state.tree_edges_of(tree) {
            if dir != 0 {
                // each tree edge is owned by its direction-0 side
                continue;
            }
            let opposite = state.tree_edges[te as usize].head[0];
            let opposite_eps = state.trees[opposite as usize].eps;

            let plus_plus = state.tree_edges[te as usize].plus_plus_edges;
            if let Some((key, e)) = state.edge_heap_min(plus_plus) {
                let true_slack = key - tree_eps - opposite_eps;
                delta = delta.min(true_slack / 2.0);
                if augment_candidate.map_or(true, |(s, _)| true_slack < s) {
                    augment_candidate = Some((true_slack, e));
                }
            }
        }
    }

    if delta > NO_PERFECT_MATCHING_THRESHOLD {
        return Err(MatchingError::NoPerfectMatching);
    }
    let delta = delta.max(0.0);

    for &tree in &trees {
        state.trees[tree as usize].eps += delta;
    }

    if let Some((true_slack, e)) = augment_candidate {
        if true_slack - 2.0 * delta <= EPS {
            primal::augment(state, e);
        }
    }

    Ok(delta)
}

/// Returns `true` if the tree edge carries a tight cross `(+, -)` edge in
/// either direction.
fn has_tight_plus_minus(state: &mut State, te: u32) -> bool {
    for plus_dir in 0..2 {
        let heap = state.tree_edges[te as usize].plus_minus_edges[plus_dir];
        if let Some((key, _)) = state.edge_heap_min(heap) {
            let plus_tree = state.tree_edges[te as usize].head[plus_dir];
            let minus_tree = state.tree_edges[te as usize].head[1 - plus_dir];
            let true_slack =
                key - state.trees[plus_tree as usize].eps + state.trees[minus_tree as usize].eps;
            if true_slack <= EPS {
                return true;
            }
        }
    }
    false
}

/// One delta per connected component of trees linked by tight `(+, -)`
/// edges.
fn update_duals_connected_components(state: &mut State) -> Result<f64, MatchingError> {
    let trees = live_trees(state);
    if trees.is_empty() {
        return Ok(0.0);
    }

    for &tree in &trees {
        state.trees[tree as usize].next_tree = EMPTY;
        state.trees[tree as usize].accumulated_eps = 0.0;
    }

    let mut fixed = vec![false; state.trees.len()];
    let mut component_of = vec![EMPTY; state.trees.len()];
    let mut total_change = 0.0;
    let mut augment_candidate: Option<(f64, u32)> = None;

    for (component_id, &start) in trees.iter().enumerate() {
        let component_id = component_id as u32;
        if component_of[start as usize] != EMPTY {
            continue;
        }

        // collect the component, chaining it through `next_tree`
        let mut component = vec![start];
        component_of[start as usize] = component_id;
        let mut i = 0;
        while i < component.len() {
            let u = component[i];
            for (te, dir) in state.tree_edges_of(u) {
                let opposite = state.tree_edges[te as usize].head[dir];
                if component_of[opposite as usize] == EMPTY && has_tight_plus_minus(state, te) {
                    component_of[opposite as usize] = component_id;
                    state.trees[u as usize].next_tree = opposite;
                    component.push(opposite);
                }
            }
            i += 1;
        }

        // the common delta of this component
        let mut delta = INFINITY;
        for &u in &component {
            let u_eps = state.trees[u as usize].eps;
            delta = delta.min(eps_max_in_tree(state, u) - u_eps);

            for (te, dir) in state.tree_edges_of(u) {
                let opposite = state.tree_edges[te as usize].head[dir];
                let opposite_eps = state.trees[opposite as usize].eps;
                let same_component = component_of[opposite as usize] == component_id;

                let plus_plus = state.tree_edges[te as usize].plus_plus_edges;
                if let Some((key, _)) = state.edge_heap_min(plus_plus) {
                    let true_slack = key - u_eps - opposite_eps;
                    if same_component {
                        delta = delta.min(true_slack / 2.0);
                    } else if fixed[opposite as usize] {
                        delta = delta.min(true_slack);
                    } else {
                        delta = delta.min(true_slack / 2.0);
                    }
                }

                if !same_component {
                    // (+, -) with "+" on this side towards another component
                    let plus_minus = state.tree_edges[te as usize].plus_minus_edges[1 - dir];
                    if let Some((key, _)) = state.edge_heap_min(plus_minus) {
                        delta = delta.min(key - u_eps + opposite_eps);
                    }
                }
            }
        }

        if delta > NO_PERFECT_MATCHING_THRESHOLD {
            return Err(MatchingError::NoPerfectMatching);
        }
        let delta = delta.max(0.0);

        for &u in &component {
            state.trees[u as usize].accumulated_eps = delta;
            state.trees[u as usize].eps += delta;
            fixed[u as usize] = true;
        }
        total_change += delta;
    }

    // find a cross (+, +) edge that the update made tight
    for &tree in &trees {
        for (te, dir) in state.tree_edges_of(tree) {
            if dir != 0 {
                continue;
            }
            let plus_plus = state.tree_edges[te as usize].plus_plus_edges;
            if let Some((key, e)) = state.edge_heap_min(plus_plus) {
                let opposite = state.tree_edges[te as usize].head[0];
                let true_slack =
                    key - state.trees[tree as usize].eps - state.trees[opposite as usize].eps;
                if augment_candidate.map_or(true, |(s, _)| true_slack < s) {
                    augment_candidate = Some((true_slack, e));
                }
            }
        }
    }
    if let Some((true_slack, e)) = augment_candidate {
        if true_slack <= EPS {
            primal::augment(state, e);
        }
    }

    Ok(total_change)
}
