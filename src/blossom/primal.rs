/*!
# Primal Updater

The four primal operations of the Blossom V algorithm.

- **grow** attaches a tight `(+, infinity)` edge's endpoint and its matched
  partner to an alternating tree, optionally depth-first into further
  tight boundary edges.
- **augment** flips the matching along the paths from a tight cross-tree
  `(+, +)` edge to both tree roots and dissolves both trees.
- **shrink** contracts the odd circuit closed by a tight in-tree `(+, +)`
  edge into a new "+" blossom node.
- **expand** dissolves a "-" blossom whose dual became zero, re-inserting
  its even branch into the tree and releasing the odd branch as matched
  infinity nodes.

Every operation keeps the lazy formulas intact: a node entering or leaving
a tree applies the owning tree's current eps to its dual and to the slack
of every incident edge, and every affected edge is moved between the
`(+, infinity)`, in-tree `(+, +)`, cross-tree `(+, +)` and `(+, -)` heaps
according to its new endpoint labels.

The caller (driver or dual updater) guarantees that `current_edge` /
`current_direction` of all trees adjacent to the processed tree are set
before grow, shrink or expand run.
*/

use std::time::Instant;

use super::state::*;
use super::EPS;

/// The tree edge between the processed tree and `opposite_tree`, created
/// on demand. Returns `(tree_edge, dir)` where `dir` is the direction
/// under which the processed tree traverses it (so the opposite tree is
/// `head[dir]`).
fn current_tree_edge(state: &mut State, tree: u32, opposite_tree: u32) -> (u32, usize) {
    if state.trees[opposite_tree as usize].current_edge == EMPTY {
        let te = state.add_tree_edge(tree, opposite_tree);
        state.trees[opposite_tree as usize].current_edge = te;
        state.trees[opposite_tree as usize].current_direction = 0;
    }
    let te = state.trees[opposite_tree as usize].current_edge;
    let dir = state.trees[opposite_tree as usize].current_direction;
    (te, dir)
}

/// True slack of a cross-tree edge assuming both endpoints are "+".
fn cross_plus_plus_slack(state: &State, e: u32) -> f64 {
    let t0 = state.nodes[state.edges[e as usize].head[0] as usize].tree;
    let t1 = state.nodes[state.edges[e as usize].head[1] as usize].tree;
    state.edges[e as usize].slack - state.trees[t0 as usize].eps - state.trees[t1 as usize].eps
}

// ---------- Grow ----------

/// Grows the tree of the "+" endpoint of the tight boundary edge `e` by
/// the infinity endpoint and its matched partner.
///
/// With `recursive`, newly uncovered tight boundary edges are grown
/// depth-first as well. With `immediate_augment`, a tight cross-tree
/// `(+, +)` edge discovered on the way triggers an augmentation and stops
/// the operation.
pub(crate) fn grow(state: &mut State, e: u32, recursive: bool, immediate_augment: bool) {
    let timer = Instant::now();
    let mut stack = vec![e];

    while let Some(edge) = stack.pop() {
        let (in_tree, minus) = match grow_sides(state, edge) {
            Some(sides) => sides,
            // the boundary node was grabbed by an earlier recursive step
            None => continue,
        };

        state.remove_edge_from_heap(edge);

        let tree = state.nodes[in_tree as usize].tree;
        let matched_edge = state.nodes[minus as usize].matched;
        let plus = state.edge_opposite(matched_edge, minus);

        state.add_child(in_tree, minus, edge);
        state.nodes[minus as usize].label = Label::Minus;
        state.add_child(minus, plus, matched_edge);
        state.nodes[plus as usize].label = Label::Plus;
        state.stats.grow_num += 1;

        process_minus_node(state, minus, tree);
        let tight_cross = process_plus_node(state, plus, tree, recursive, &mut stack);

        if let Some(cross) = tight_cross {
            if immediate_augment {
                state.stats.grow_time += timer.elapsed();
                augment(state, cross);
                return;
            }
        }
    }

    state.stats.grow_time += timer.elapsed();
}

/// Resolves the `(+ in tree, infinity)` sides of a boundary edge, or
/// `None` if the edge is no longer a boundary edge.
fn grow_sides(state: &State, e: u32) -> Option<(u32, u32)> {
    let h0 = state.edges[e as usize].head[0];
    let h1 = state.edges[e as usize].head[1];
    let n0 = &state.nodes[h0 as usize];
    let n1 = &state.nodes[h1 as usize];
    if n0.is_plus() && n0.tree != EMPTY && n1.is_infinity() {
        Some((h0, h1))
    } else if n1.is_plus() && n1.tree != EMPTY && n0.is_infinity() {
        Some((h1, h0))
    } else {
        None
    }
}

/// Applies the infinity -> "-" transition to a freshly attached node:
/// lazy delta on dual and incident slacks, heap reclassification, and
/// minus-blossom registration.
fn process_minus_node(state: &mut State, minus: u32, tree: u32) {
    let eps = state.trees[tree as usize].eps;
    state.nodes[minus as usize].dual += eps;

    let mut it = state.incident_edges(minus);
    while let Some((e, dir)) = it.next(state) {
        state.edges[e as usize].slack -= eps;
        let w = state.edge_head(e, dir);
        let w_node = &state.nodes[w as usize];

        // a (infinity, +) edge of another tree becomes a cross (-, +) edge
        if w_node.is_plus() && w_node.tree != EMPTY && w_node.tree != tree {
            let opposite_tree = w_node.tree;
            state.remove_edge_from_heap(e);
            let (te, dir_to_opposite) = current_tree_edge(state, tree, opposite_tree);
            state.add_cross_plus_minus_edge(te, dir_to_opposite, e);
        } else if w_node.is_plus() && w_node.tree == tree {
            // former (+, infinity) edge of this tree, now in-tree (+, -)
            state.remove_edge_from_heap(e);
        }
    }

    if state.nodes[minus as usize].is_blossom {
        state.add_minus_blossom(tree, minus);
    }
}

/// Applies the infinity -> "+" transition and scans the node's edges into
/// their new heaps. Returns a tight cross-tree `(+, +)` edge if one was
/// uncovered.
fn process_plus_node(
    state: &mut State,
    plus: u32,
    tree: u32,
    recursive: bool,
    stack: &mut Vec<u32>,
) -> Option<u32> {
    let eps = state.trees[tree as usize].eps;
    state.nodes[plus as usize].dual -= eps;
    let mut tight_cross = None;

    let mut it = state.incident_edges(plus);
    while let Some((e, dir)) = it.next(state) {
        state.edges[e as usize].slack += eps;
        let w = state.edge_head(e, dir);
        let w_label = state.nodes[w as usize].label;
        let w_tree = state.nodes[w as usize].tree;

        match w_label {
            Label::Infinity => {
                state.remove_edge_from_heap(e);
                state.add_plus_infinity_edge(tree, e);
                if recursive && state.edges[e as usize].slack <= eps + EPS {
                    stack.push(e);
                }
            }
            Label::Plus if w_tree == tree => {
                // in-tree (+, +): previously a (+, infinity) edge of this tree
                state.remove_edge_from_heap(e);
                state.add_plus_plus_edge(tree, e);
            }
            Label::Plus => {
                // cross-tree (+, +): previously (+, infinity) of the other tree
                state.remove_edge_from_heap(e);
                let (te, _) = current_tree_edge(state, tree, w_tree);
                state.add_cross_plus_plus_edge(te, e);
                if tight_cross.is_none() && cross_plus_plus_slack(state, e) <= EPS {
                    tight_cross = Some(e);
                }
            }
            Label::Minus if w_tree != tree && w_tree != EMPTY => {
                // cross-tree (+, -); the "+" endpoint lies in the processed tree
                state.remove_edge_from_heap(e);
                let (te, dir_to_opposite) = current_tree_edge(state, tree, w_tree);
                state.add_cross_plus_minus_edge(te, 1 - dir_to_opposite, e);
            }
            Label::Minus => {}
        }
    }

    tight_cross
}

// ---------- Augment ----------

/// Augments the matching along the tight cross-tree `(+, +)` edge `e`,
/// dissolving both trees.
pub(crate) fn augment(state: &mut State, e: u32) {
    let timer = Instant::now();
    debug_assert!(state.edge_true_slack(e) <= EPS);
    let h0 = state.edges[e as usize].head[0];
    let h1 = state.edges[e as usize].head[1];
    augment_branch(state, h0, e);
    augment_branch(state, h1, e);
    state.stats.augment_time += timer.elapsed();
}

/// Dissolves the tree of `v`: melds the cross heaps of its tree edges into
/// the opposite trees, drains its own heaps, flips the matching along the
/// path from `v` to the root, and turns every tree node into a matched
/// infinity node.
fn augment_branch(state: &mut State, v: u32, augment_edge: u32) {
    let tree = state.nodes[v as usize].tree;
    let eps = state.trees[tree as usize].eps;
    let root = state.trees[tree as usize].root;

    // cross-tree heaps: the (+, +) and (-, +) populations become
    // (+, infinity) edges of the opposite tree and survive through a meld;
    // the (+, -) population leaves all heaps
    for (te, dir) in state.tree_edges_of(tree) {
        let opposite = state.tree_edges[te as usize].head[dir];
        state.trees[opposite as usize].current_edge = EMPTY;

        let target = state.trees[opposite as usize].plus_infinity_edges;
        let plus_plus = state.tree_edges[te as usize].plus_plus_edges;
        let minus_plus = state.tree_edges[te as usize].plus_minus_edges[dir];
        let plus_minus = state.tree_edges[te as usize].plus_minus_edges[1 - dir];

        state.heaps.meld(target, plus_plus);
        state.heaps.meld(target, minus_plus);
        state.drain_edge_heap(plus_minus);
        state.remove_tree_edge(te);
    }

    // the tree's own heaps cease to exist
    let plus_plus = state.trees[tree as usize].plus_plus_edges;
    let plus_infinity = state.trees[tree as usize].plus_infinity_edges;
    let minus_blossoms = state.trees[tree as usize].minus_blossoms;
    state.drain_edge_heap(plus_plus);
    state.drain_edge_heap(plus_infinity);
    state.drain_node_heap(minus_blossoms);

    // flip the matching along the path to the root
    state.nodes[v as usize].matched = augment_edge;
    state.flip_matching_to_root(v, root);

    // unlink the root before its sibling links are cleared below
    state.remove_tree_root(root);
    state.tree_num -= 1;

    // spread the final eps and release every tree node
    for node in state.tree_nodes(root) {
        match state.nodes[node as usize].label {
            Label::Plus => {
                state.nodes[node as usize].dual += eps;
                let mut it = state.incident_edges(node);
                while let Some((e, _)) = it.next(state) {
                    state.edges[e as usize].slack -= eps;
                }
            }
            Label::Minus => {
                state.nodes[node as usize].dual -= eps;
                let mut it = state.incident_edges(node);
                while let Some((e, _)) = it.next(state) {
                    state.edges[e as usize].slack += eps;
                }
            }
            Label::Infinity => unreachable!("trees contain no infinity nodes"),
        }
        let data = &mut state.nodes[node as usize];
        data.label = Label::Infinity;
        data.tree = EMPTY;
        data.parent_edge = EMPTY;
        data.first_tree_child = EMPTY;
        data.tree_sibling_next = EMPTY;
        data.tree_sibling_prev = EMPTY;
    }
}

// ---------- Shrink ----------

/// Contracts the odd circuit closed by the tight in-tree `(+, +)` edge `e`
/// into a new "+" blossom node, which takes over the circuit's boundary
/// edges, children and tree position.
pub(crate) fn shrink(state: &mut State, e: u32, immediate_augment: bool) {
    let timer = Instant::now();
    let x = state.edges[e as usize].head[0];
    let y = state.edges[e as usize].head[1];
    let tree = state.nodes[x as usize].tree;
    let eps = state.trees[tree as usize].eps;

    state.remove_edge_from_heap(e);
    let blossom_root = find_blossom_root(state, e);
    let circuit = collect_circuit(state, e, blossom_root);

    // the new pseudonode; true dual starts at zero
    let b = state.nodes.len() as u32;
    state.nodes.push(NodeData::new(b));
    {
        let data = &mut state.nodes[b as usize];
        data.label = Label::Plus;
        data.is_blossom = true;
        data.tree = tree;
        data.dual = -eps;
    }

    // detach circuit nodes from the child lists they sit in
    for &c in circuit.iter() {
        if c != blossom_root {
            let parent = state.tree_parent(c);
            state.remove_from_child_list(c, parent);
        }
    }

    for &c in circuit.iter() {
        state.nodes[c as usize].is_processed = true;
    }

    // apply the lazy delta once per circuit node and sort its edges:
    // boundary edges migrate to the blossom, inner edges freeze
    let mut tight_cross = None;
    for &c in circuit.iter() {
        let c_plus = state.nodes[c as usize].is_plus();
        if c_plus {
            state.nodes[c as usize].dual += eps;
        } else {
            state.nodes[c as usize].dual -= eps;
        }

        let mut it = state.incident_edges(c);
        while let Some((e2, dir)) = it.next(state) {
            let w = state.edge_head(e2, dir);
            if state.nodes[w as usize].is_processed {
                // inner edge; the slack becomes absolute, chords leave
                // the (+, +) heap on their first visit
                if c_plus {
                    state.edges[e2 as usize].slack -= eps;
                } else {
                    state.edges[e2 as usize].slack += eps;
                }
                state.remove_edge_from_heap(e2);
                continue;
            }

            state.move_edge_tail(c, b, e2);
            if c_plus {
                // classification is unchanged: the blossom is "+" in the
                // same tree, and the slack shift cancels out
                continue;
            }

            state.edges[e2 as usize].slack += 2.0 * eps;
            state.remove_edge_from_heap(e2);
            let w_label = state.nodes[w as usize].label;
            let w_tree = state.nodes[w as usize].tree;
            match w_label {
                Label::Infinity => state.add_plus_infinity_edge(tree, e2),
                Label::Plus if w_tree == tree => state.add_plus_plus_edge(tree, e2),
                Label::Plus => {
                    let (te, _) = current_tree_edge(state, tree, w_tree);
                    state.add_cross_plus_plus_edge(te, e2);
                    if tight_cross.is_none() && cross_plus_plus_slack(state, e2) <= EPS {
                        tight_cross = Some(e2);
                    }
                }
                Label::Minus if w_tree != tree && w_tree != EMPTY => {
                    let (te, dir_to_opposite) = current_tree_edge(state, tree, w_tree);
                    state.add_cross_plus_minus_edge(te, 1 - dir_to_opposite, e2);
                }
                Label::Minus => {}
            }
        }
    }

    // minus circuit blossoms leave the minus-blossom heap
    for &c in circuit.iter() {
        if state.nodes[c as usize].is_blossom && state.nodes[c as usize].is_minus() {
            state.remove_minus_blossom(c);
        }
    }

    for &c in circuit.iter() {
        state.move_children_to(c, b);
    }

    // install the blossom in the circuit root's surface position
    state.nodes[b as usize].matched = state.nodes[blossom_root as usize].matched;
    if state.nodes[blossom_root as usize].is_tree_root {
        let prev = state.nodes[blossom_root as usize].tree_sibling_prev;
        let next = state.nodes[blossom_root as usize].tree_sibling_next;
        state.nodes[b as usize].is_tree_root = true;
        state.nodes[b as usize].tree_sibling_prev = prev;
        state.nodes[b as usize].tree_sibling_next = next;
        state.nodes[prev as usize].tree_sibling_next = b;
        if next != EMPTY {
            state.nodes[next as usize].tree_sibling_prev = b;
        }
        state.nodes[blossom_root as usize].is_tree_root = false;
        state.trees[tree as usize].root = b;
    } else {
        let parent_edge = state.nodes[blossom_root as usize].parent_edge;
        let parent = state.edge_opposite(parent_edge, b);
        state.add_child(parent, b, parent_edge);
    }

    // close the sibling ring and retire the circuit from the surface
    let len = circuit.len();
    for i in 0..len {
        let a = circuit[i];
        let nxt = circuit[(i + 1) % len];
        let ring_edge = if a == x && nxt == y {
            e
        } else {
            state.connecting_parent_edge(a, nxt)
        };
        let data = &mut state.nodes[a as usize];
        data.blossom_sibling = ring_edge;
        data.blossom_parent = b;
        data.blossom_grandparent = b;
        data.is_outer = false;
        data.is_processed = false;
        data.tree = EMPTY;
        data.parent_edge = EMPTY;
        data.first_tree_child = EMPTY;
        data.tree_sibling_next = EMPTY;
        data.tree_sibling_prev = EMPTY;
    }

    state.stats.shrink_num += 1;
    state.stats.shrink_time += timer.elapsed();

    if immediate_augment {
        if let Some(cross) = tight_cross {
            augment(state, cross);
        }
    }
}

/// Nearest common tree ancestor of the endpoints of `e`, found by
/// marching both branches alternately two levels at a time and marking
/// visited "+" nodes; a follow-up pass clears the marks.
fn find_blossom_root(state: &mut State, e: u32) -> u32 {
    let h0 = state.edges[e as usize].head[0];
    let h1 = state.edges[e as usize].head[1];
    let tree = state.nodes[h0 as usize].tree;
    let root_node = state.trees[tree as usize].root;

    let mut cur = [h0, h1];
    let mut done = [false, false];
    let mut branch = 0;
    let blossom_root = loop {
        if !done[branch] {
            let c = cur[branch];
            if state.nodes[c as usize].is_marked {
                break c;
            }
            state.nodes[c as usize].is_marked = true;
            if c == root_node {
                done[branch] = true;
            } else {
                cur[branch] = state.tree_grandparent(c);
            }
        }
        branch = 1 - branch;
    };

    for start in [h0, h1] {
        let mut c = start;
        while state.nodes[c as usize].is_marked {
            state.nodes[c as usize].is_marked = false;
            if c == root_node {
                break;
            }
            c = state.tree_grandparent(c);
        }
    }

    blossom_root
}

/// The circuit closed by `e` in ring order: the blossom root, the branch
/// towards `head[0]`, then back from `head[1]`.
fn collect_circuit(state: &State, e: u32, blossom_root: u32) -> Vec<u32> {
    let x = state.edges[e as usize].head[0];
    let y = state.edges[e as usize].head[1];

    let mut branch_x = Vec::new();
    let mut cur = x;
    while cur != blossom_root {
        branch_x.push(cur);
        cur = state.tree_parent(cur);
    }

    let mut circuit = vec![blossom_root];
    circuit.extend(branch_x.iter().rev().copied());
    let mut cur = y;
    while cur != blossom_root {
        circuit.push(cur);
        cur = state.tree_parent(cur);
    }

    debug_assert!(circuit.len() % 2 == 1);
    circuit
}

// ---------- Expand ----------

/// Dissolves the "-" blossom `b` (whose true dual reached zero): the even
/// branch of its circuit rejoins the tree alternating "-", "+", ..., "-",
/// the odd branch becomes matched infinity nodes.
pub(crate) fn expand(state: &mut State, b: u32, immediate_augment: bool) {
    let timer = Instant::now();
    let tree = state.nodes[b as usize].tree;
    let eps = state.trees[tree as usize].eps;
    debug_assert!(state.node_true_dual(b).abs() <= EPS);

    state.remove_minus_blossom(b);
    state.nodes[b as usize].dual -= eps;

    let parent_edge = state.nodes[b as usize].parent_edge;
    let matched_edge = state.nodes[b as usize].matched;

    let endpoint_orig = state.edge_current_original(parent_edge, b);
    let root_orig = state.edge_current_original(matched_edge, b);

    // hand every boundary edge back to its penultimate circuit node; the
    // blossom-leaving shift applies here, the branch labels add theirs in
    // the second pass
    let mut it = state.incident_edges(b);
    while let Some((e2, _)) = it.next(state) {
        let orig = state.edge_current_original(e2, b);
        let c = state.penultimate_blossom(orig);
        state.remove_edge_from_heap(e2);
        state.edges[e2 as usize].slack += eps;
        state.move_edge_tail(b, c, e2);
    }

    let branches_endpoint = state.penultimate_blossom_fix_grandparent(endpoint_orig);
    let blossom_root_node = state.penultimate_blossom(root_orig);

    // the circuit in ring order starting at the blossom root
    let (ring, ring_edges) = collect_ring(state, blossom_root_node);
    let j = ring
        .iter()
        .position(|&c| c == branches_endpoint)
        .expect("branches endpoint lies on the circuit");

    // orient so the even branch runs root -> endpoint
    let (even, even_edges, odd_pairs) = split_branches(&ring, &ring_edges, j);

    let parent = state.edge_opposite(parent_edge, branches_endpoint);
    state.remove_from_child_list(b, parent);
    state.move_children_to(b, blossom_root_node);

    // pass 1: labels, tree links and matching for the whole circuit
    let m = even.len() - 1;
    let mut i = m;
    loop {
        let node = even[i];
        let (up_parent, up_edge) = if i == m {
            (parent, parent_edge)
        } else {
            (even[i + 1], even_edges[i])
        };
        state.add_child(up_parent, node, up_edge);
        state.nodes[node as usize].label = if i % 2 == 0 { Label::Minus } else { Label::Plus };
        state.nodes[node as usize].is_outer = true;
        state.nodes[node as usize].blossom_parent = EMPTY;
        state.nodes[node as usize].blossom_grandparent = EMPTY;
        state.nodes[node as usize].blossom_sibling = EMPTY;

        if i % 2 == 0 {
            if i > 0 {
                let pair_edge = even_edges[i - 1];
                state.nodes[node as usize].matched = pair_edge;
                state.nodes[even[i - 1] as usize].matched = pair_edge;
            } else {
                state.nodes[node as usize].matched = matched_edge;
            }
        }

        if i == 0 {
            break;
        }
        i -= 1;
    }

    for &(a, c, pair_edge) in odd_pairs.iter() {
        for node in [a, c] {
            let data = &mut state.nodes[node as usize];
            data.label = Label::Infinity;
            data.is_outer = true;
            data.tree = EMPTY;
            data.blossom_parent = EMPTY;
            data.blossom_grandparent = EMPTY;
            data.blossom_sibling = EMPTY;
            data.matched = pair_edge;
            data.parent_edge = EMPTY;
        }
    }

    // pass 2: lazy deltas and heap reclassification with final labels
    let mut tight_cross = None;
    for (i, &node) in even.iter().enumerate() {
        if i % 2 == 0 {
            process_minus_node(state, node, tree);
        } else {
            let mut unused = Vec::new();
            let found = process_plus_node(state, node, tree, false, &mut unused);
            if tight_cross.is_none() {
                tight_cross = found;
            }
        }
    }
    for &(a, c, _) in odd_pairs.iter() {
        process_infinity_node(state, a);
        process_infinity_node(state, c);
    }

    // the dissolved pseudonode stays allocated but leaves the surface
    {
        let data = &mut state.nodes[b as usize];
        data.label = Label::Infinity;
        data.tree = EMPTY;
        data.matched = EMPTY;
        data.parent_edge = EMPTY;
        data.first_tree_child = EMPTY;
        data.tree_sibling_next = EMPTY;
        data.tree_sibling_prev = EMPTY;
    }

    state.stats.expand_num += 1;
    state.stats.expand_time += timer.elapsed();

    if immediate_augment {
        if let Some(cross) = tight_cross {
            augment(state, cross);
        }
    }
}

/// Ring nodes and their connecting edges, starting at `start` and
/// following the `blossom_sibling` pointers.
fn collect_ring(state: &State, start: u32) -> (Vec<u32>, Vec<u32>) {
    let mut ring = Vec::new();
    let mut ring_edges = Vec::new();
    let mut cur = start;
    loop {
        let e = state.nodes[cur as usize].blossom_sibling;
        ring.push(cur);
        ring_edges.push(e);
        cur = state.edge_opposite(e, cur);
        if cur == start {
            break;
        }
    }
    debug_assert!(ring.len() % 2 == 1);
    (ring, ring_edges)
}

/// Splits the ring at the branches endpoint (index `j`) into the even
/// branch (root first, endpoint last, with its connecting edges) and the
/// odd branch as matched pairs `(node, node, edge)`.
fn split_branches(ring: &[u32], ring_edges: &[u32], j: usize) -> (Vec<u32>, Vec<u32>, Vec<(u32, u32, u32)>) {
    let len = ring.len();
    let mut even = Vec::new();
    let mut even_edges = Vec::new();
    let mut odd_pairs = Vec::new();

    if j % 2 == 0 {
        // forward direction: ring[0..=j] is the even branch
        even.extend_from_slice(&ring[..=j]);
        even_edges.extend_from_slice(&ring_edges[..j]);
        let mut i = j + 1;
        while i + 1 < len {
            odd_pairs.push((ring[i], ring[i + 1], ring_edges[i]));
            i += 2;
        }
    } else {
        // backward direction: root, then the ring tail in reverse
        even.push(ring[0]);
        even_edges.push(ring_edges[len - 1]);
        let mut i = len - 1;
        while i > j {
            even.push(ring[i]);
            if i > j + 1 {
                even_edges.push(ring_edges[i - 1]);
            }
            i -= 1;
        }
        even.push(ring[j]);
        even_edges.push(ring_edges[j]);
        let mut i = 1;
        while i + 1 <= j {
            odd_pairs.push((ring[i], ring[i + 1], ring_edges[i]));
            i += 2;
        }
    }

    debug_assert_eq!(even.len() % 2, 1);
    debug_assert_eq!(even_edges.len() + 1, even.len());
    (even, even_edges, odd_pairs)
}

/// Reclassifies the edges of a circuit node released as an infinity node:
/// edges to "+" nodes join the owning tree's `(+, infinity)` heap.
fn process_infinity_node(state: &mut State, node: u32) {
    let mut it = state.incident_edges(node);
    while let Some((e, dir)) = it.next(state) {
        let w = state.edge_head(e, dir);
        let w_node = &state.nodes[w as usize];
        if w_node.is_plus() && w_node.tree != EMPTY {
            let w_tree = w_node.tree;
            state.remove_edge_from_heap(e);
            state.add_plus_infinity_edge(w_tree, e);
        }
    }
}
