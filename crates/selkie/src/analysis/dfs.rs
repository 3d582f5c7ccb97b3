//! Ordered depth-first traversal with edge typing.

use selkie_graph::{EdgeAttribute, EdgeId, GraphRead, NodeAttribute, NodeId};

use crate::analysis::family::Family;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeKind {
    /// Not reached by the traversal.
    #[default]
    None,
    Tree,
    Back,
    Forward,
    Cross,
}

/// Depth-first search following edge direction from the root.
///
/// Nodes get a dfs number in visit order; every reachable edge is labelled
/// Tree, Back (ancestor target, self-loops included), Forward (non-tree
/// descendant target) or Cross.
#[derive(Debug)]
pub struct Dfs {
    order: Vec<NodeId>,
    numbers: NodeAttribute<usize>,
    visited: NodeAttribute<bool>,
    kinds: EdgeAttribute<EdgeKind>,
    family: Family,
}

impl Dfs {
    pub fn new(g: &impl GraphRead) -> Self {
        let mut dfs = Self {
            order: Vec::with_capacity(g.node_count()),
            numbers: NodeAttribute::new(g.max_node_id(), 0),
            visited: NodeAttribute::new(g.max_node_id(), false),
            kinds: EdgeAttribute::new(g.max_edge_id(), EdgeKind::None),
            family: Family::new(g),
        };
        dfs.traverse(g);
        dfs.type_edges(g);
        dfs
    }

    /// Reachable nodes in visit order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn number(&self, n: NodeId) -> usize {
        self.numbers.value(n)
    }

    pub fn was_visited(&self, n: NodeId) -> bool {
        self.visited.value(n)
    }

    pub fn kind(&self, e: EdgeId) -> EdgeKind {
        self.kinds.value(e)
    }

    pub fn is_tree(&self, e: EdgeId) -> bool {
        self.kind(e) == EdgeKind::Tree
    }

    pub fn is_back(&self, e: EdgeId) -> bool {
        self.kind(e) == EdgeKind::Back
    }

    pub fn is_forward(&self, e: EdgeId) -> bool {
        self.kind(e) == EdgeKind::Forward
    }

    pub fn is_cross(&self, e: EdgeId) -> bool {
        self.kind(e) == EdgeKind::Cross
    }

    /// The DFS tree parent of a non-root reachable node.
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

            // Incoming edges and self-loops are not traversed.
            let child = g.edge_to(edge);
            if child == top.node {
                continue;
            }

            if !self.visited.value(child) {
                let parent = top.node;
                self.visit(child);
                self.family.add_parent(parent, child);
                self.kinds.set(edge, EdgeKind::Tree);
                stack.push(Frame {
                    node: child,
                    edges: g.node_edges(child),
                    cursor: 0,
                });
            }
        }
    }

    fn type_edges(&mut self, g: &impl GraphRead) {
        for edge in g.edge_ids() {
            if self.is_tree(edge) {
                continue;
            }

            let (from, to) = g.edge_ends(edge);
            if !self.visited.value(from) {
                continue;
            }

            let kind = if from == to || self.family.succeeds(from, to) {
                EdgeKind::Back
            } else if self.family.succeeds(to, from) {
                EdgeKind::Forward
            } else {
                EdgeKind::Cross
            };
            self.kinds.set(edge, kind);
        }
    }
}
