//! Parent/child bookkeeping shared by the traversal analyses.

use std::collections::VecDeque;

use selkie_graph::{GraphRead, NodeAttribute, NodeId};

/// The parent/child relation a traversal discovers, with BFS ancestor
/// queries on top.
#[derive(Debug)]
pub struct Family {
    parents: NodeAttribute<Vec<NodeId>>,
    children: NodeAttribute<Vec<NodeId>>,
}

impl Family {
    pub fn new(g: &impl GraphRead) -> Self {
        Self {
            parents: NodeAttribute::new(g.max_node_id(), Vec::new()),
            children: NodeAttribute::new(g.max_node_id(), Vec::new()),
        }
    }

    pub(crate) fn add_parent(&mut self, parent: NodeId, child: NodeId) {
        self.parents.get_mut(child).push(parent);
        self.children.get_mut(parent).push(child);
    }

    pub fn parents(&self, n: NodeId) -> &[NodeId] {
        self.parents.get(n)
    }

    /// The node's only parent. Traversal trees give every non-root node
    /// exactly one.
    pub fn parent(&self, n: NodeId) -> NodeId {
        let parents = self.parents.get(n);
        debug_assert_eq!(parents.len(), 1, "node {n} has {} parents", parents.len());
        parents[0]
    }

    pub fn children(&self, n: NodeId) -> &[NodeId] {
        self.children.get(n)
    }

    /// Does `n1` precede `n2`, following child links?
    pub fn precedes(&self, n1: NodeId, n2: NodeId) -> bool {
        self.bfs(n1, n2, |family, n| family.children.get(n))
    }

    /// Does `n1` succeed `n2`, following parent links?
    pub fn succeeds(&self, n1: NodeId, n2: NodeId) -> bool {
        self.bfs(n1, n2, |family, n| family.parents.get(n))
    }

    fn bfs(&self, from: NodeId, to: NodeId, next: impl Fn(&Self, NodeId) -> &[NodeId]) -> bool {
        if from == to {
            return true;
        }

        let mut visited: NodeAttribute<bool> =
            NodeAttribute::new(self.parents.len().max(self.children.len()), false);
        let mut queue = VecDeque::from([from]);

        while let Some(n) = queue.pop_front() {
            if visited.value(n) {
                continue;
            }
            visited.set(n, true);

            for &step in next(self, n) {
                if step == to {
                    return true;
                }
                if !visited.value(step) {
                    queue.push_back(step);
                }
            }
        }

        false
    }
}
