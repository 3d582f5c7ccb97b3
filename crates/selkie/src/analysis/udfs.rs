//! Unordered (undirected) depth-first traversal.

use selkie_graph::{EdgeAttribute, EdgeId, GraphRead, NodeAttribute, NodeId};

use crate::analysis::family::Family;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndirectedEdgeKind {
    #[default]
    None,
    Tree,
    Back,
}

/// Depth-first search that ignores edge direction. Edges are Tree or Back;
/// the cycle-equivalence pass may promote synthetic edges to Back itself.
#[derive(Debug)]
pub struct UnorderedDfs {
    order: Vec<NodeId>,
    numbers: NodeAttribute<usize>,
    visited: NodeAttribute<bool>,
    kinds: EdgeAttribute<UndirectedEdgeKind>,
    family: Family,
}

impl UnorderedDfs {
    pub fn new(g: &impl GraphRead) -> Self {
        let mut dfs = Self {
            order: Vec::with_capacity(g.node_count()),
            numbers: NodeAttribute::new(g.max_node_id(), 0),
            visited: NodeAttribute::new(g.max_node_id(), false),
            kinds: EdgeAttribute::new(g.max_edge_id(), UndirectedEdgeKind::None),
            family: Family::new(g),
        };
        dfs.traverse(g);
        dfs
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn number(&self, n: NodeId) -> usize {
        self.numbers.value(n)
    }

    pub fn was_visited(&self, n: NodeId) -> bool {
        self.visited.value(n)
    }

    pub fn is_tree(&self, e: EdgeId) -> bool {
        self.kinds.value(e) == UndirectedEdgeKind::Tree
    }

    pub fn is_back(&self, e: EdgeId) -> bool {
        self.kinds.value(e) == UndirectedEdgeKind::Back
    }

    pub fn set_back(&mut self, e: EdgeId) {
        self.kinds.set(e, UndirectedEdgeKind::Back);
    }

    pub fn parent(&self, n: NodeId) -> NodeId {
        self.family.parent(n)
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    fn visit(&mut self, n: NodeId) {
        self.visited.set(n, true);
        self.numbers.set(n, self.order.len());
        self.order.push(n);
    }

    fn traverse(&mut self, g: &impl GraphRead) {
        struct Frame {
            node: NodeId,
            edges: Vec<EdgeId>,
            cursor: usize,
        }

        let root = g.root();
        self.visit(root);

        let mut stack = vec![Frame {
            node: root,
            edges: g.node_edges(root),
            cursor: 0,
        }];

        while let Some(top) = stack.last_mut() {
            let Some(&edge) = top.edges.get(top.cursor) else {
                stack.pop();
                continue;
            };
            top.cursor += 1;

            let child = g.edge_other(edge, top.node);
            if !self.visited.value(child) {
                let parent = top.node;
                self.visit(child);
                self.family.add_parent(parent, child);
                self.kinds.set(edge, UndirectedEdgeKind::Tree);
                stack.push(Frame {
                    node: child,
                    edges: g.node_edges(child),
                    cursor: 0,
                });
            } else if self.kinds.value(edge) == UndirectedEdgeKind::None {
                self.kinds.set(edge, UndirectedEdgeKind::Back);
            }
        }
    }
}
