//! Layer assignment by network simplex (Gansner et al., TSE '93).
//!
//! Ranks every node so each edge spans at least one layer and the total
//! weighted span is minimal: initial ranks, a tight spanning tree grown with
//! minimum-slack shifts, postorder cut values, then pivoting while any tree
//! edge has a negative cut value. The caller is expected to hand in an
//! acyclic graph (cycle removal runs first in the pipeline).

use selkie_graph::{EdgeAttribute, EdgeId, GraphRead, NodeAttribute, NodeId};

/// The layers of nodes during layered graph drawing.
#[derive(Debug, Clone)]
pub struct LayerAssignment {
    pub layers: NodeAttribute<usize>,
    pub layer_count: usize,
}

pub fn network_simplex(g: &impl GraphRead) -> LayerAssignment {
    let mut simplex = Simplex::new(g);
    simplex.feasible_tree();
    simplex.optimize();
    simplex.normalize()
}

/// Longest-path layering in the style of Tamassia: sinks settle on layer 1
/// and every other node lands one layer above its deepest child. Cheaper
/// than the simplex ranker, at the cost of longer edges; useful when a
/// caller only needs a feasible stratification.
pub fn longest_path(g: &impl GraphRead) -> LayerAssignment {
    let nodes = g.node_ids();
    let mut layers = NodeAttribute::new(g.max_node_id(), 0usize);
    let mut placed: NodeAttribute<bool> = NodeAttribute::new(g.max_node_id(), false);
    let mut settled: NodeAttribute<bool> = NodeAttribute::new(g.max_node_id(), false);

    let mut placed_count = 0usize;
    let mut current_layer = 1usize;
    let mut progressed = true;

    while placed_count < nodes.len() {
        let candidate = nodes.iter().copied().find(|&n| {
            !placed.value(n)
                && g
                    .child_nodes(n)
                    .into_iter()
                    .all(|child| settled.value(child))
        });

        if let Some(v) = candidate {
            layers.set(v, current_layer);
            placed.set(v, true);
            placed_count += 1;
            progressed = true;
            continue;
        }

        if !progressed {
            // A cycle keeps every remaining node unplaceable; park them.
            for &n in &nodes {
                if !placed.value(n) {
                    layers.set(n, current_layer);
                    placed.set(n, true);
                    placed_count += 1;
                }
            }
            break;
        }

        current_layer += 1;
        for &n in &nodes {
            if placed.value(n) {
                settled.set(n, true);
            }
        }
        progressed = false;
    }

    LayerAssignment {
        layers,
        layer_count: current_layer + 1,
    }
}

const UNRANKED: i64 = i64::MIN;

struct Simplex<'a, G: GraphRead> {
    g: &'a G,
    nodes: Vec<NodeId>,
    ranks: NodeAttribute<i64>,
    in_tree: NodeAttribute<bool>,
    tree_edge: EdgeAttribute<bool>,

    // Derived per rebuild.
    parent: NodeAttribute<Option<NodeId>>,
    parent_edge: NodeAttribute<Option<EdgeId>>,
    cut: NodeAttribute<i64>,
    low: NodeAttribute<usize>,
    lim: NodeAttribute<usize>,
    postorder: Vec<NodeId>,

    /// Round-robin start for the leave-edge search.
    cursor: usize,
}

impl<'a, G: GraphRead> Simplex<'a, G> {
    fn new(g: &'a G) -> Self {
        Self {
            g,
            nodes: g.node_ids(),
            ranks: NodeAttribute::new(g.max_node_id(), UNRANKED),
            in_tree: NodeAttribute::new(g.max_node_id(), false),
            tree_edge: EdgeAttribute::new(g.max_edge_id(), false),
            parent: NodeAttribute::new(g.max_node_id(), None),
            parent_edge: NodeAttribute::new(g.max_node_id(), None),
            cut: NodeAttribute::new(g.max_node_id(), 0),
            low: NodeAttribute::new(g.max_node_id(), 0),
            lim: NodeAttribute::new(g.max_node_id(), 0),
            postorder: Vec::new(),
            cursor: 0,
        }
    }

    fn slack(&self, e: EdgeId) -> i64 {
        let (from, to) = self.g.edge_ends(e);
        self.ranks.value(to) - self.ranks.value(from) - 1
    }

    /// Rank r goes to any node whose parents all carry ranks below r.
    fn init_ranks(&mut self) {
        self.ranks.set(self.g.root(), 0);
        let mut found = 1usize;
        let mut rank = 1i64;

        while found < self.nodes.len() {
            let before = found;
            for &node in &self.nodes {
                if self.ranks.value(node) != UNRANKED {
                    continue;
                }
                let blocked = self
                    .g
                    .parent_nodes(node)
                    .into_iter()
                    .any(|p| {
                        let r = self.ranks.value(p);
                        r == UNRANKED || r >= rank
                    });
                if blocked {
                    continue;
                }
                self.ranks.set(node, rank);
                found += 1;
            }

            if found == before && found < self.nodes.len() {
                // Nothing became rankable; the graph is not the acyclic,
                // fully reachable input this pass expects. Park the
                // stragglers at the current rank rather than spinning.
                for &node in &self.nodes {
                    if self.ranks.value(node) == UNRANKED {
                        self.ranks.set(node, rank);
                        found += 1;
                    }
                }
            }
            rank += 1;
        }
    }

    /// Extends the tree along tight edges; returns the tree size.
    fn grow_tight_tree(&mut self, tree_nodes: &mut Vec<NodeId>) -> usize {
        let mut i = 0;
        while i < tree_nodes.len() {
            let node = tree_nodes[i];
            i += 1;
            for e in self.g.node_edges(node) {
                let neighbor = self.g.edge_other(e, node);
                if self.in_tree.value(neighbor) || self.slack(e) != 0 {
                    continue;
                }
                self.in_tree.set(neighbor, true);
                self.tree_edge.set(e, true);
                tree_nodes.push(neighbor);
            }
        }
        tree_nodes.len()
    }

    fn feasible_tree(&mut self) {
        self.init_ranks();

        let root = self.g.root();
        self.in_tree.set(root, true);
        let mut tree_nodes = vec![root];

        while self.grow_tight_tree(&mut tree_nodes) < self.nodes.len() {
            // Minimum-slack edge between the tree and the rest.
            let mut best: Option<(i64, EdgeId)> = None;
            for &node in &self.nodes {
                if self.in_tree.value(node) {
                    continue;
                }
                for e in self.g.node_edges(node) {
                    let neighbor = self.g.edge_other(e, node);
                    if !self.in_tree.value(neighbor) {
                        continue;
                    }
                    let s = self.slack(e);
                    if best.is_none_or(|(b, _)| s < b) {
                        best = Some((s, e));
                    }
                }
            }

            let Some((slack, e)) = best else {
                break;
            };

            let delta = if self.in_tree.value(self.g.edge_to(e)) {
                -slack
            } else {
                slack
            };
            for &t in &tree_nodes {
                let r = self.ranks.value(t);
                self.ranks.set(t, r + delta);
            }
        }
    }

    /// Recomputes parent links, low/lim numbering, postorder and cut values
    /// for the current tree edge set.
    fn rebuild(&mut self) {
        for &n in &self.nodes {
            self.parent.set(n, None);
            self.parent_edge.set(n, None);
        }
        self.postorder.clear();

        struct Frame {
            node: NodeId,
            edges: Vec<EdgeId>,
            cursor: usize,
            low: usize,
        }

        let mut next = 1usize;
        let root = self.g.root();
        let mut visited: NodeAttribute<bool> = NodeAttribute::new(self.g.max_node_id(), false);
        visited.set(root, true);

        let mut stack = vec![Frame {
            node: root,
            edges: self.g.node_edges(root),
            cursor: 0,
            low: next,
        }];

        while let Some(top) = stack.last_mut() {
            if let Some(&e) = top.edges.get(top.cursor) {
                top.cursor += 1;
                if !self.tree_edge.value(e) {
                    continue;
                }
                let node = top.node;
                let child = self.g.edge_other(e, node);
                if visited.value(child) {
                    continue;
                }
                visited.set(child, true);
                self.parent.set(child, Some(node));
                self.parent_edge.set(child, Some(e));
                stack.push(Frame {
                    node: child,
                    edges: self.g.node_edges(child),
                    cursor: 0,
                    low: next,
                });
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            self.low.set(frame.node, frame.low);
            self.lim.set(frame.node, next);
            next += 1;
            self.postorder.push(frame.node);
        }

        self.compute_cut_values();
    }

    fn compute_cut_values(&mut self) {
        for ix in 0..self.postorder.len() {
            let child = self.postorder[ix];
            let Some(parent_edge) = self.parent_edge.value(child) else {
                continue;
            };

            let child_is_tail = self.g.edge_from(parent_edge) == child;
            let out_sign: i64 = if child_is_tail { 1 } else { -1 };
            let in_sign = -out_sign;
            let mut cut = 1i64;

            for e in self.g.child_edges(child) {
                if e == parent_edge {
                    continue;
                }
                let other = self.g.edge_to(e);
                cut += out_sign;
                if self.parent.value(other) == Some(child) {
                    cut += -out_sign * self.cut.value(other);
                }
            }

            for e in self.g.parent_edges(child) {
                if e == parent_edge {
                    continue;
                }
                let other = self.g.edge_from(e);
                cut += in_sign;
                if self.parent.value(other) == Some(child) {
                    cut += -in_sign * self.cut.value(other);
                }
            }

            self.cut.set(child, cut);
        }
    }

    /// A tree edge with a negative cut value, searched round-robin across
    /// calls so repeated pivots do not always revisit the same region.
    fn find_leave_edge(&mut self) -> Option<NodeId> {
        let len = self.postorder.len();
        for offset in 0..len {
            let child = self.postorder[(self.cursor + offset) % len];
            if self.parent.value(child).is_some() && self.cut.value(child) < 0 {
                self.cursor = (self.cursor + offset + 1) % len;
                return Some(child);
            }
        }
        None
    }

    fn in_subtree(&self, root: NodeId, v: NodeId) -> bool {
        let lim = self.lim.value(v);
        self.low.value(root) <= lim && lim <= self.lim.value(root)
    }

    fn optimize(&mut self) {
        self.rebuild();

        // Far beyond any realistic pivot count; guards against cycling on
        // degenerate inputs.
        let max_pivots = 4 * self.nodes.len().max(1) * self.g.edge_count().max(4);

        for _ in 0..max_pivots {
            let Some(child) = self.find_leave_edge() else {
                break;
            };
            let Some(leave) = self.parent_edge.value(child) else {
                break;
            };
            let child_is_tail = self.g.edge_from(leave) == child;

            // Minimum-slack edge crossing the cut against the leave edge's
            // direction: head inside the subtree when the child is the tail,
            // tail inside otherwise.
            let mut best: Option<(i64, EdgeId)> = None;
            for e in self.g.edge_ids() {
                if e == leave {
                    continue;
                }
                let (from, to) = self.g.edge_ends(e);
                let (inside, outside) = if child_is_tail {
                    (to, from)
                } else {
                    (from, to)
                };
                if !self.in_subtree(child, inside) || self.in_subtree(child, outside) {
                    continue;
                }
                let s = self.slack(e);
                if best.is_none_or(|(b, _)| s < b) {
                    best = Some((s, e));
                }
            }

            let Some((slack, enter)) = best else {
                break;
            };

            let delta = if child_is_tail { -slack } else { slack };
            if delta != 0 {
                for &n in &self.nodes {
                    if self.in_subtree(child, n) {
                        let r = self.ranks.value(n);
                        self.ranks.set(n, r + delta);
                    }
                }
            }

            self.tree_edge.set(leave, false);
            self.tree_edge.set(enter, true);
            self.rebuild();
        }
    }

    /// Inverts ranks so the root sits on the top layer and every rank is at
    /// least 1, leaving layer 0 free for the bottom edge channel.
    fn normalize(&self) -> LayerAssignment {
        let max_rank = self
            .nodes
            .iter()
            .map(|&n| self.ranks.value(n))
            .max()
            .unwrap_or(0);

        let mut layers = NodeAttribute::new(self.g.max_node_id(), 0usize);
        let mut top_layer = 0usize;
        for &n in &self.nodes {
            let layer = (max_rank - self.ranks.value(n) + 1) as usize;
            layers.set(n, layer);
            top_layer = top_layer.max(layer);
        }

        LayerAssignment {
            layers,
            layer_count: top_layer + 1,
        }
    }
}
