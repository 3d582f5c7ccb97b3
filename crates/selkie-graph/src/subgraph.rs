//! Subgraph selections.
//!
//! A [`SubGraph`] is a plain selection value: sorted id lists plus an
//! optional distinguished root. It is bound to its parent graph on demand,
//! via [`SubGraph::as_ref`] for reading or [`SubGraph::as_mut`] for the full
//! edit interface, so several selections over the same graph can coexist
//! without back-pointers.

use crate::{EdgeId, Graph, GraphEdit, GraphError, GraphRead, NodeId};

#[derive(Debug, Default, Clone)]
pub struct SubGraph {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    root: Option<NodeId>,
}

fn insert_sorted<T: Ord + Copy>(list: &mut Vec<T>, value: T) {
    if let Err(slot) = list.binary_search(&value) {
        list.insert(slot, value);
    }
}

fn remove_sorted<T: Ord + Copy>(list: &mut Vec<T>, value: T) {
    if let Ok(slot) = list.binary_search(&value) {
        list.remove(slot);
    }
}

impl SubGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node of the parent graph to the selection (idempotent) and
    /// pulls in every incident edge whose other endpoint is already selected.
    pub fn select_node(&mut self, g: &Graph, id: NodeId) {
        insert_sorted(&mut self.nodes, id);
        for edge in g.node_edges(id) {
            let other = g.edge_other(edge, id);
            if self.contains_node(other) {
                insert_sorted(&mut self.edges, edge);
            }
        }
    }

    /// Removes a node from the selection together with its selected edges.
    pub fn unselect_node(&mut self, g: &Graph, id: NodeId) {
        remove_sorted(&mut self.nodes, id);
        for edge in g.node_edges(id) {
            remove_sorted(&mut self.edges, edge);
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.binary_search(&id).is_ok()
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.binary_search(&id).is_ok()
    }

    pub fn selected_nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn selected_edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn as_ref<'a>(&'a self, g: &'a Graph) -> SubGraphRef<'a> {
        SubGraphRef { g, sub: self }
    }

    pub fn as_mut<'a>(&'a mut self, g: &'a mut Graph) -> SubGraphMut<'a> {
        SubGraphMut { g, sub: self }
    }

    fn read_root(&self, g: &Graph) -> NodeId {
        self.root
            .or_else(|| self.nodes.first().copied())
            .unwrap_or_else(|| g.root())
    }

    fn read_node_edges(&self, g: &Graph, id: NodeId) -> Vec<EdgeId> {
        g.node_edges(id)
            .into_iter()
            .filter(|&e| self.contains_edge(e))
            .collect()
    }

    /// Drops selected ids that no longer exist in the parent graph.
    fn prune(&mut self, g: &Graph) {
        self.nodes.retain(|&n| g.has_node(n));
        self.edges.retain(|&e| g.has_edge(e));
        if let Some(root) = self.root {
            if !g.has_node(root) {
                self.root = None;
            }
        }
    }

    /// Restores the selection invariant: every live edge with both endpoints
    /// selected is selected. A popped parent frame can resurrect edges the
    /// selection had dropped.
    fn pull_edges(&mut self, g: &Graph) {
        for ix in 0..self.nodes.len() {
            let node = self.nodes[ix];
            for edge in g.node_edges(node) {
                let other = g.edge_other(edge, node);
                if self.contains_node(other) {
                    insert_sorted(&mut self.edges, edge);
                }
            }
        }
    }
}

/// Read-only view of a selection bound to its parent graph.
#[derive(Clone, Copy)]
pub struct SubGraphRef<'a> {
    g: &'a Graph,
    sub: &'a SubGraph,
}

/// Read/edit view of a selection bound to its parent graph. Structural
/// mutations are delegated to the parent and the selection is kept coherent.
pub struct SubGraphMut<'a> {
    g: &'a mut Graph,
    sub: &'a mut SubGraph,
}

macro_rules! subgraph_read_impl {
    ($ty:ty) => {
        impl GraphRead for $ty {
            fn root(&self) -> NodeId {
                self.sub.read_root(self.g)
            }

            fn node_ids(&self) -> Vec<NodeId> {
                self.sub.nodes.clone()
            }

            fn edge_ids(&self) -> Vec<EdgeId> {
                self.sub.edges.clone()
            }

            fn has_node(&self, id: NodeId) -> bool {
                self.sub.contains_node(id)
            }

            fn has_edge(&self, id: EdgeId) -> bool {
                self.sub.contains_edge(id)
            }

            fn edge_ends(&self, id: EdgeId) -> (NodeId, NodeId) {
                self.g.edge_ends(id)
            }

            fn node_edges(&self, id: NodeId) -> Vec<EdgeId> {
                self.sub.read_node_edges(self.g, id)
            }

            fn max_node_id(&self) -> usize {
                self.g.max_node_id()
            }

            fn max_edge_id(&self) -> usize {
                self.g.max_edge_id()
            }

            fn node_count(&self) -> usize {
                self.sub.nodes.len()
            }

            fn edge_count(&self) -> usize {
                self.sub.edges.len()
            }
        }
    };
}

subgraph_read_impl!(SubGraphRef<'_>);
subgraph_read_impl!(SubGraphMut<'_>);

impl GraphEdit for SubGraphMut<'_> {
    fn push(&mut self) {
        self.g.push();
    }

    fn pop(&mut self) {
        self.g.pop();
        self.sub.prune(self.g);
        self.sub.pull_edges(self.g);
    }

    fn commit(&mut self) {
        self.g.commit();
    }

    fn make_node(&mut self) -> Result<NodeId, GraphError> {
        let id = self.g.make_node()?;
        insert_sorted(&mut self.sub.nodes, id);
        Ok(id)
    }

    fn make_edge(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        let id = self.g.make_edge(from, to)?;
        if self.sub.contains_node(from) && self.sub.contains_node(to) {
            insert_sorted(&mut self.sub.edges, id);
        }
        Ok(id)
    }

    fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.g.remove_node(id)?;
        remove_sorted(&mut self.sub.nodes, id);
        self.sub.edges.retain(|&e| self.g.has_edge(e));
        if self.sub.root == Some(id) {
            self.sub.root = None;
        }
        Ok(())
    }

    fn remove_edge(&mut self, id: EdgeId) -> Result<(), GraphError> {
        self.g.remove_edge(id)?;
        remove_sorted(&mut self.sub.edges, id);
        Ok(())
    }

    fn edit_edge(&mut self, id: EdgeId, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.g.edit_edge(id, from, to)?;
        if self.sub.contains_node(from) && self.sub.contains_node(to) {
            insert_sorted(&mut self.sub.edges, id);
        } else {
            remove_sorted(&mut self.sub.edges, id);
        }
        Ok(())
    }
}
