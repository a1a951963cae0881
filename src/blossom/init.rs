/*!
# Initializer

Builds the solver [`State`] from the input graph and runs the configured
warm start.

- `None` — every node becomes a trivial alternating tree.
- `Greedy` — duals are raised to half the cheapest incident slack and
  tight edges between unmatched nodes are matched.
- `Fractional` — after the greedy pass, the fractional matching
  relaxation is solved: single alternating trees are grown one at a time
  with a lazily advanced branch eps; odd alternating circuits are stored
  as half-valued rings (directed `matched` pointers) and rounded in the
  finishing step, which leaves one tree root per ring.

All three strategies end by wiring the auxiliary graph: hooking boundary
edges of every tree root into the `(+, infinity)` heap and cross-tree
`(+, +)` edges into freshly created tree edges.
*/

use crate::heap::PairingForest;
use crate::{edge::*, node::*, ops::*};

use super::state::*;
use super::{
    Initialization, MatcherOptions, MatchingError, MatchingStats, Objective, EPS, INFINITY,
    NO_PERFECT_MATCHING_THRESHOLD,
};

/// Translates the graph and runs the configured warm start.
pub(crate) fn initialize<G>(graph: &G, options: MatcherOptions) -> Result<State, MatchingError>
where
    G: AdjacencyList + GraphEdgeOrder + EdgeWeights,
{
    let n = graph.len();
    if n % 2 == 1 {
        return Err(MatchingError::OddNumberOfVertices);
    }

    let mut state = build_state(graph, options);

    match options.initialization {
        Initialization::None => {}
        Initialization::Greedy => init_greedy(&mut state),
        Initialization::Fractional => {
            init_greedy(&mut state);
            init_fractional(&mut state)?;
        }
    }

    allocate_trees(&mut state);
    init_auxiliary_graph(&mut state);
    state.stats.initial_tree_num = state.tree_num;

    Ok(state)
}

/// Allocates nodes `0..n` plus the sentinel and translates all edges,
/// skipping self-loops. Weights are negated for maximization and shifted
/// by the minimum edge weight so every initial slack is nonnegative.
fn build_state<G>(graph: &G, options: MatcherOptions) -> State
where
    G: AdjacencyList + GraphEdgeOrder + EdgeWeights,
{
    let n = graph.len();
    let mut nodes: Vec<NodeData> = (0..=n).map(|i| NodeData::new(i as u32)).collect();
    nodes[n].is_outer = false;

    let mut weighted_edges: Vec<(Edge, f64)> = Vec::with_capacity(graph.number_of_edges() as usize);
    for edge in graph.edges(true) {
        if edge.is_loop() {
            continue;
        }
        let weight = match options.objective {
            Objective::Minimize => graph.weight_of(edge),
            Objective::Maximize => -graph.weight_of(edge),
        };
        weighted_edges.push((edge, weight));
    }

    let min_edge_weight = weighted_edges
        .iter()
        .map(|&(_, w)| w)
        .fold(f64::INFINITY, f64::min);
    let min_edge_weight = if weighted_edges.is_empty() {
        0.0
    } else {
        min_edge_weight
    };

    let mut state = State {
        nodes,
        edges: Vec::with_capacity(weighted_edges.len()),
        trees: Vec::new(),
        tree_edges: Vec::new(),
        tree_edge_free: Vec::new(),
        heaps: PairingForest::with_capacity(weighted_edges.len(), 2 * n + 2),
        node_num: n,
        tree_num: 0,
        ext_edges: Vec::with_capacity(weighted_edges.len()),
        min_edge_weight,
        objective: options.objective,
        options,
        stats: MatchingStats::default(),
    };

    for (edge, weight) in weighted_edges {
        let pos = state.edges.len() as u32;
        state.edges.push(EdgeData {
            slack: weight - min_edge_weight,
            head: [EMPTY; 2],
            head_original: [edge.0, edge.1],
            prev: [EMPTY; 2],
            next: [EMPTY; 2],
            handle: None,
            pos,
        });
        state.add_edge_to_node(edge.0, pos, 0);
        state.add_edge_to_node(edge.1, pos, 1);
        state.ext_edges.push(edge);
    }

    state
}

/// Greedy warm start: raise duals, then match tight edges between
/// unmatched nodes.
fn init_greedy(state: &mut State) {
    let n = state.node_num;

    // (1) dual of every node = min slack of its incident edges
    for v in 0..n as u32 {
        state.nodes[v as usize].dual = INFINITY;
    }
    for e in 0..state.edges.len() {
        let slack = state.edges[e].slack;
        for dir in 0..2 {
            let head = state.edges[e].head[dir] as usize;
            if state.nodes[head].dual > slack {
                state.nodes[head].dual = slack;
            }
        }
    }

    // (2) halve duals and subtract them from incident slacks
    for v in 0..n as u32 {
        if state.nodes[v as usize].dual == INFINITY {
            state.nodes[v as usize].dual = 0.0;
            continue;
        }
        state.nodes[v as usize].dual *= 0.5;
        let dual = state.nodes[v as usize].dual;
        let mut it = state.incident_edges(v);
        while let Some((e, _)) = it.next(state) {
            state.edges[e as usize].slack -= dual;
        }
    }

    // (3) raise each unmatched node's dual to its new min slack and match
    // along a tight edge if one leads to another unmatched node
    for v in 0..n as u32 {
        if state.nodes[v as usize].matched != EMPTY {
            continue;
        }

        let mut min_slack = INFINITY;
        let mut it = state.incident_edges(v);
        while let Some((e, _)) = it.next(state) {
            min_slack = min_slack.min(state.edges[e as usize].slack);
        }
        if min_slack == INFINITY {
            continue;
        }

        state.nodes[v as usize].dual += min_slack;
        let mut tight = EMPTY;
        let mut it = state.incident_edges(v);
        while let Some((e, dir)) = it.next(state) {
            state.edges[e as usize].slack -= min_slack;
            let opposite = state.edge_head(e, dir);
            if tight == EMPTY
                && state.edges[e as usize].slack < EPS
                && state.nodes[opposite as usize].matched == EMPTY
                && opposite != v
            {
                tight = e;
            }
        }

        if tight != EMPTY {
            let opposite = state.edge_opposite(tight, v);
            state.nodes[v as usize].matched = tight;
            state.nodes[opposite as usize].matched = tight;
        }
    }
}

// ---------- Fractional Initialization ----------

/// Kind of event ending the growth of a fractional branch.
enum BranchEvent {
    /// Tight edge to an unmatched infinity node
    AugmentNode(u32),
    /// Tight edge to a node on a half-valued ring
    AugmentRing(u32),
    /// Tight in-tree (+, +) edge closing an odd circuit
    Shrink(u32),
}

/// Returns `true` if the matched pointer structure of `v` marks ring
/// membership (directed, non-symmetric matched edges).
fn on_ring(state: &State, v: u32) -> bool {
    let matched = state.nodes[v as usize].matched;
    if matched == EMPTY {
        return false;
    }
    let partner = state.edge_opposite(matched, v);
    state.nodes[partner as usize].matched != matched
}

/// Solves the fractional matching relaxation on top of the greedy start.
///
/// Grows one alternating tree per remaining unmatched node. The tree's
/// pending dual change (`branch eps`) is advanced lazily to either the
/// cheapest boundary edge (growing it) or the critical eps of a primal
/// event, whichever is smaller. Each growth ends in an augmentation or in
/// an odd circuit stored as a half-valued ring.
fn init_fractional(state: &mut State) -> Result<(), MatchingError> {
    let n = state.node_num;

    for root in 0..n as u32 {
        if state.nodes[root as usize].matched != EMPTY {
            continue;
        }
        grow_fractional_branch(state, root)?;
    }

    finish_fractional(state);
    Ok(())
}

/// Grows a single alternating tree from `root` until a primal event fires.
fn grow_fractional_branch(state: &mut State, root: u32) -> Result<(), MatchingError> {
    // transient single-tree bookkeeping: an eps accumulator, the best-edge
    // heap of boundary infinity nodes, and the in-tree (+, +) heap
    let infinity_nodes = state.heaps.new_heap();
    let plus_plus = state.heaps.new_heap();
    let mut branch_eps = 0.0f64;
    let mut tree_nodes: Vec<u32> = Vec::new();

    state.nodes[root as usize].label = Label::Plus;
    tree_nodes.push(root);
    process_fractional_plus(state, root, infinity_nodes, plus_plus);

    let event = loop {
        // cheapest boundary edge: grow or augment at eps = slack
        let grow_candidate = state.heaps.peek_min(infinity_nodes).map(|(key, &v)| (key, v));
        // cheapest in-tree (+, +) edge: circuit at eps = slack / 2
        let shrink_candidate = state.edge_heap_min(plus_plus);

        let grow_eps = grow_candidate.map_or(INFINITY, |(key, _)| key);
        let critical_eps = shrink_candidate.map_or(INFINITY, |(key, _)| key / 2.0);

        if grow_eps.min(critical_eps) > NO_PERFECT_MATCHING_THRESHOLD {
            return Err(MatchingError::NoPerfectMatching);
        }

        if grow_eps <= critical_eps {
            let (_, v) = grow_candidate.unwrap();
            branch_eps = grow_eps;
            state.heaps.delete(state.nodes[v as usize].handle.take().unwrap());
            let edge = state.nodes[v as usize].best_edge;
            state.nodes[v as usize].best_edge = EMPTY;

            if state.nodes[v as usize].matched == EMPTY {
                break BranchEvent::AugmentNode(edge);
            }
            if on_ring(state, v) {
                break BranchEvent::AugmentRing(edge);
            }

            // regular grow: attach v as "-" and its partner as "+"
            let partner_edge = state.nodes[v as usize].matched;
            let partner = state.edge_opposite(partner_edge, v);

            // the partner may still sit in the boundary heap itself
            if let Some(handle) = state.nodes[partner as usize].handle.take() {
                state.heaps.delete(handle);
                state.nodes[partner as usize].best_edge = EMPTY;
            }

            attach_fractional(state, v, edge, Label::Minus, branch_eps);
            attach_fractional(state, partner, partner_edge, Label::Plus, branch_eps);
            tree_nodes.push(v);
            tree_nodes.push(partner);
            process_fractional_plus(state, partner, infinity_nodes, plus_plus);
        } else {
            let (_, e) = shrink_candidate.unwrap();
            branch_eps = critical_eps;
            state.remove_edge_from_heap(e);
            break BranchEvent::Shrink(e);
        }
    };

    match event {
        BranchEvent::AugmentNode(e) => {
            let (v, w) = fractional_edge_sides(state, e);
            state.flip_matching_to_root(v, root);
            state.nodes[v as usize].matched = e;
            state.nodes[w as usize].matched = e;
        }
        BranchEvent::AugmentRing(e) => {
            let (v, w) = fractional_edge_sides(state, e);
            dissolve_ring_at(state, w);
            state.flip_matching_to_root(v, root);
            state.nodes[v as usize].matched = e;
            state.nodes[w as usize].matched = e;
        }
        BranchEvent::Shrink(e) => {
            shrink_fractional_circuit(state, e, root);
        }
    }

    // spread the branch eps into node duals and dissolve the tree
    for &v in &tree_nodes {
        spread_fractional_eps(state, v, branch_eps);
    }
    for &v in &tree_nodes {
        let node = &mut state.nodes[v as usize];
        node.label = Label::Infinity;
        node.parent_edge = EMPTY;
        node.first_tree_child = EMPTY;
        node.tree_sibling_next = EMPTY;
        node.tree_sibling_prev = EMPTY;
    }

    state.drain_edge_heap(plus_plus);
    while let Some((_, v)) = state.heaps.delete_min(infinity_nodes) {
        state.nodes[v as usize].handle = None;
        state.nodes[v as usize].best_edge = EMPTY;
    }

    Ok(())
}

/// The endpoints of a boundary edge ending a branch: `(in_tree, outside)`.
fn fractional_edge_sides(state: &State, e: u32) -> (u32, u32) {
    let h0 = state.edges[e as usize].head[0];
    let h1 = state.edges[e as usize].head[1];
    if state.nodes[h0 as usize].label == Label::Plus {
        (h0, h1)
    } else {
        (h1, h0)
    }
}

/// Attaches `child` to the growing branch with the given label, applying
/// the pending branch eps so the lazy dual/slack formulas stay continuous.
fn attach_fractional(state: &mut State, child: u32, parent_edge: u32, label: Label, eps: f64) {
    state.nodes[child as usize].label = label;
    state.nodes[child as usize].parent_edge = parent_edge;

    match label {
        Label::Minus => {
            state.nodes[child as usize].dual += eps;
            let mut it = state.incident_edges(child);
            while let Some((e, _)) = it.next(state) {
                state.edges[e as usize].slack -= eps;
            }
        }
        Label::Plus => {
            state.nodes[child as usize].dual -= eps;
            let mut it = state.incident_edges(child);
            while let Some((e, _)) = it.next(state) {
                state.edges[e as usize].slack += eps;
            }
        }
        Label::Infinity => unreachable!("fractional trees never attach infinity nodes"),
    }
}

/// Applies the final branch eps to a tree node leaving the tree.
fn spread_fractional_eps(state: &mut State, v: u32, eps: f64) {
    match state.nodes[v as usize].label {
        Label::Plus => {
            state.nodes[v as usize].dual += eps;
            let mut it = state.incident_edges(v);
            while let Some((e, _)) = it.next(state) {
                state.edges[e as usize].slack -= eps;
            }
        }
        Label::Minus => {
            state.nodes[v as usize].dual -= eps;
            let mut it = state.incident_edges(v);
            while let Some((e, _)) = it.next(state) {
                state.edges[e as usize].slack += eps;
            }
        }
        Label::Infinity => {}
    }
}

/// Scans the incident edges of a freshly attached "+" node, recording
/// boundary infinity nodes in the best-edge heap and in-tree (+, +)
/// edges in the circuit heap.
fn process_fractional_plus(
    state: &mut State,
    v: u32,
    infinity_nodes: crate::heap::HeapId,
    plus_plus: crate::heap::HeapId,
) {
    let mut it = state.incident_edges(v);
    while let Some((e, dir)) = it.next(state) {
        let w = state.edge_head(e, dir);
        let slack = state.edges[e as usize].slack;
        match state.nodes[w as usize].label {
            Label::Infinity => {
                // keep only the cheapest edge per boundary node
                match state.nodes[w as usize].handle {
                    None => {
                        state.nodes[w as usize].best_edge = e;
                        state.nodes[w as usize].handle =
                            Some(state.heaps.insert(infinity_nodes, slack, w));
                    }
                    Some(handle) => {
                        if slack < state.heaps.key(handle) {
                            state.nodes[w as usize].best_edge = e;
                            state.heaps.decrease_key(handle, slack);
                        }
                    }
                }
            }
            Label::Plus => {
                if w != v && state.edges[e as usize].handle.is_none() {
                    state.edges[e as usize].handle =
                        Some(state.heaps.insert(plus_plus, slack, e));
                }
            }
            Label::Minus => {}
        }
    }
}

/// Rematches a half-valued ring into pairs after `entry` was matched
/// outside the ring.
fn dissolve_ring_at(state: &mut State, entry: u32) {
    let mut ring = vec![entry];
    let mut ring_edges = Vec::new();
    let mut cur = entry;
    loop {
        let e = state.nodes[cur as usize].matched;
        ring_edges.push(e);
        let next = state.edge_opposite(e, cur);
        if next == entry {
            break;
        }
        ring.push(next);
        cur = next;
    }

    debug_assert!(ring.len() % 2 == 1);
    let mut i = 1;
    while i + 1 < ring.len() {
        let e = ring_edges[i];
        state.nodes[ring[i] as usize].matched = e;
        state.nodes[ring[i + 1] as usize].matched = e;
        i += 2;
    }
}

/// Handles a tight in-tree (+, +) edge: finds the odd circuit through the
/// two branches, flips the matching from the circuit base towards the
/// root, and stores the circuit as a half-valued ring of directed
/// `matched` pointers.
fn shrink_fractional_circuit(state: &mut State, e: u32, root: u32) {
    let x = state.edges[e as usize].head[0];
    let y = state.edges[e as usize].head[1];

    // march towards the root two levels at a time, marking x's branch
    let mut cur = x;
    loop {
        state.nodes[cur as usize].is_marked = true;
        if cur == root {
            break;
        }
        cur = state.tree_grandparent(cur);
    }
    // first marked "+" ancestor of y is the circuit base
    let mut base = y;
    while !state.nodes[base as usize].is_marked {
        base = state.tree_grandparent(base);
    }
    // unmark
    cur = x;
    loop {
        state.nodes[cur as usize].is_marked = false;
        if cur == root {
            break;
        }
        cur = state.tree_grandparent(cur);
    }

    // collect the circuit: base -> x along one branch, then y -> base
    let mut circuit = Vec::new();
    let mut branch_x = Vec::new();
    cur = x;
    while cur != base {
        branch_x.push(cur);
        cur = state.tree_parent(cur);
    }
    circuit.push(base);
    circuit.extend(branch_x.iter().rev());
    cur = y;
    while cur != base {
        circuit.push(cur);
        cur = state.tree_parent(cur);
    }

    debug_assert!(circuit.len() % 2 == 1);

    // the circuit base trades its matched edge for ring membership
    state.flip_matching_to_root(base, root);

    // directed ring: every circuit node points at its successor edge;
    // the closing (x, y) pair is connected by the tight edge itself
    let len = circuit.len();
    for i in 0..len {
        let a = circuit[i];
        let b = circuit[(i + 1) % len];
        let ring_edge = if a == x && b == y {
            e
        } else {
            state.connecting_parent_edge(a, b)
        };
        state.nodes[a as usize].matched = ring_edge;
    }
}

/// Rounds the half-valued rings: each ring releases one node as a tree
/// root and matches the remaining even path pairwise.
fn finish_fractional(state: &mut State) {
    for v in 0..state.node_num as u32 {
        if on_ring(state, v) {
            let matched = state.nodes[v as usize].matched;
            state.nodes[v as usize].matched = EMPTY;
            let entry = state.edge_opposite(matched, v);
            // `v` stays unmatched; rematch the others starting at entry
            rematch_ring_path(state, entry, v);
        }
    }
}

/// Pairs up the ring nodes from `entry` around to (excluding) `open`.
fn rematch_ring_path(state: &mut State, entry: u32, open: u32) {
    let mut path = vec![entry];
    let mut path_edges = Vec::new();
    let mut cur = entry;
    loop {
        let e = state.nodes[cur as usize].matched;
        let next = state.edge_opposite(e, cur);
        if next == open {
            break;
        }
        path_edges.push(e);
        path.push(next);
        cur = next;
    }

    debug_assert!(path.len() % 2 == 0);
    let mut i = 0;
    while i + 1 < path.len() {
        let e = path_edges[i];
        state.nodes[path[i] as usize].matched = e;
        state.nodes[path[i + 1] as usize].matched = e;
        i += 2;
    }
}

// ---------- Trees & Auxiliary Graph ----------

/// Creates one alternating tree per unmatched node and anchors it in the
/// global root list.
fn allocate_trees(state: &mut State) {
    for v in (0..state.node_num as u32).rev() {
        if state.nodes[v as usize].matched == EMPTY {
            alloc_tree(state, v);
        }
    }
}

/// Allocates a fresh tree rooted at `root`.
pub(crate) fn alloc_tree(state: &mut State, root: u32) -> u32 {
    let tree = state.trees.len() as u32;
    state.trees.push(TreeData {
        root,
        eps: 0.0,
        accumulated_eps: 0.0,
        plus_plus_edges: state.heaps.new_heap(),
        plus_infinity_edges: state.heaps.new_heap(),
        minus_blossoms: state.heaps.new_heap(),
        current_edge: EMPTY,
        current_direction: 0,
        first: [EMPTY; 2],
        next_tree: EMPTY,
    });

    state.nodes[root as usize].tree = tree;
    state.nodes[root as usize].label = Label::Plus;
    state.add_tree_root(root);
    state.tree_num += 1;
    tree
}

/// Hooks the incident edges of every tree root into the auxiliary graph:
/// `(+, infinity)` edges into the root's tree heap, `(+, +)` cross edges
/// into (newly created) tree edges.
fn init_auxiliary_graph(state: &mut State) {
    let sentinel = state.sentinel();
    let mut root = state.nodes[sentinel as usize].tree_sibling_next;
    while root != EMPTY {
        let tree = state.nodes[root as usize].tree;

        let mut it = state.incident_edges(root);
        while let Some((e, dir)) = it.next(state) {
            let opposite = state.edge_head(e, dir);
            if state.nodes[opposite as usize].is_infinity() {
                state.add_plus_infinity_edge(tree, e);
            } else if !state.nodes[opposite as usize].is_processed {
                let opposite_tree = state.nodes[opposite as usize].tree;
                if state.trees[opposite_tree as usize].current_edge == EMPTY {
                    let te = state.add_tree_edge(tree, opposite_tree);
                    state.trees[opposite_tree as usize].current_edge = te;
                }
                let te = state.trees[opposite_tree as usize].current_edge;
                state.add_cross_plus_plus_edge(te, e);
            }
        }

        state.nodes[root as usize].is_processed = true;
        for (te, dir) in state.tree_edges_of(tree) {
            let opposite = state.tree_edges[te as usize].head[dir];
            state.trees[opposite as usize].current_edge = EMPTY;
        }

        root = state.nodes[root as usize].tree_sibling_next;
    }

    // clear the scratch flags
    let mut root = state.nodes[sentinel as usize].tree_sibling_next;
    while root != EMPTY {
        state.nodes[root as usize].is_processed = false;
        root = state.nodes[root as usize].tree_sibling_next;
    }
}
