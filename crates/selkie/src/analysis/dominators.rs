//! Immediate dominators, Lengauer–Tarjan style.
//!
//! Follows the classic formulation (semidominators computed in reverse DFS
//! order, ancestor evaluation in a forest with path compression, buckets
//! flushed at the DFS parent, final forward sweep). Path compression is
//! iterative so deep graphs cannot exhaust the call stack.

use selkie_graph::{GraphRead, NodeAttribute, NodeId};

use crate::analysis::dfs::Dfs;

struct Forest {
    ancestors: NodeAttribute<Option<NodeId>>,
    labels: NodeAttribute<NodeId>,
}

impl Forest {
    fn new(g: &impl GraphRead) -> Self {
        let mut labels = NodeAttribute::new(g.max_node_id(), NodeId::from_index(0));
        for id in g.node_ids() {
            labels.set(id, id);
        }
        Self {
            ancestors: NodeAttribute::new(g.max_node_id(), None),
            labels,
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.ancestors.set(child, Some(parent));
    }

    fn eval(&mut self, v: NodeId, semis: &NodeAttribute<usize>) -> NodeId {
        if self.ancestors.value(v).is_none() {
            return v;
        }
        self.compress(v, semis);
        self.labels.value(v)
    }

    fn compress(&mut self, v: NodeId, semis: &NodeAttribute<usize>) {
        // Nodes whose forest ancestor is itself linked, nearest-root last.
        let mut chain = Vec::new();
        let mut cursor = v;
        while let Some(ancestor) = self.ancestors.value(cursor) {
            if self.ancestors.value(ancestor).is_none() {
                break;
            }
            chain.push(cursor);
            cursor = ancestor;
        }

        for &x in chain.iter().rev() {
            let ancestor = match self.ancestors.value(x) {
                Some(a) => a,
                None => continue,
            };
            if semis.value(self.labels.value(ancestor)) < semis.value(self.labels.value(x)) {
                self.labels.set(x, self.labels.value(ancestor));
            }
            self.ancestors.set(x, self.ancestors.value(ancestor));
        }
    }
}

/// Immediate dominator of every node reachable from the root; the root maps
/// to `None`.
pub fn immediate_dominators(g: &impl GraphRead) -> NodeAttribute<Option<NodeId>> {
    let dfs = Dfs::new(g);
    let order = dfs.order().to_vec();

    let mut doms: NodeAttribute<Option<NodeId>> = NodeAttribute::new(g.max_node_id(), None);
    let mut semis: NodeAttribute<usize> = NodeAttribute::new(g.max_node_id(), 0);
    let mut buckets: NodeAttribute<Vec<NodeId>> = NodeAttribute::new(g.max_node_id(), Vec::new());
    let mut forest = Forest::new(g);

    for &n in &order {
        semis.set(n, dfs.number(n));
    }

    for &w in order.iter().skip(1).rev() {
        for v in g.parent_nodes(w) {
            if !dfs.was_visited(v) {
                continue;
            }
            let u = forest.eval(v, &semis);
            let candidate = semis.value(u);
            if candidate < semis.value(w) {
                semis.set(w, candidate);
            }
        }

        buckets.get_mut(order[semis.value(w)]).push(w);
        let parent = dfs.parent(w);
        forest.link(parent, w);

        for v in std::mem::take(buckets.get_mut(parent)) {
            let u = forest.eval(v, &semis);
            let idom = if semis.value(u) < semis.value(v) {
                u
            } else {
                parent
            };
            doms.set(v, Some(idom));
        }
    }

    // Relative dominators become immediate dominators.
    for &w in order.iter().skip(1) {
        if doms.value(w) != Some(order[semis.value(w)]) {
            if let Some(relative) = doms.value(w) {
                doms.set(w, doms.value(relative));
            }
        }
    }

    doms
}
