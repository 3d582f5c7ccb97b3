//! The owning graph and its versioned editor.
//!
//! Mutations happen inside nested edit frames. A frame records enough to undo
//! itself exactly: `pop` reverts edge edits first, then edge deletions, then
//! node deletions, then creations, LIFO within each category. Reverting in
//! any other order would surface transient dangling ids. `commit` discards
//! every frame, keeping the changes.

use crate::{EdgeId, GraphEdit, GraphRead, NodeId};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph mutated with no open edit frame")]
    NoOpenFrame,

    #[error("unknown node id {0}")]
    UnknownNode(NodeId),

    #[error("unknown edge id {0}")]
    UnknownEdge(EdgeId),

    #[error("the root node cannot be removed")]
    RemoveRoot,
}

#[derive(Debug, Clone)]
struct NodeData {
    edges: Vec<EdgeId>,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct EdgeData {
    from: NodeId,
    to: NodeId,
    deleted: bool,
}

/// An edge detached from its endpoints, with the incidence slots it occupied
/// so a pop can restore the lists in their original order.
#[derive(Debug, Clone)]
struct DetachedEdge {
    id: EdgeId,
    from: NodeId,
    to: NodeId,
    from_slot: usize,
    to_slot: usize,
}

#[derive(Debug, Default)]
struct Frame {
    created_nodes: Vec<NodeId>,
    created_edges: Vec<EdgeId>,
    deleted_nodes: Vec<NodeId>,
    deleted_edges: Vec<DetachedEdge>,
    edited_edges: Vec<DetachedEdge>,
}

/// A directed graph that owns its nodes and edges.
///
/// Ids are dense and never reused within a frame; deletion is a tombstone.
/// The first node created becomes the root unless [`Graph::set_root`] says
/// otherwise.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    root: Option<NodeId>,
    frames: Vec<Frame>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn has_open_frame(&self) -> bool {
        !self.frames.is_empty()
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.index())
            .filter(|n| !n.deleted)
            .ok_or(GraphError::UnknownNode(id))
    }

    fn edge(&self, id: EdgeId) -> Result<&EdgeData, GraphError> {
        self.edges
            .get(id.index())
            .filter(|e| !e.deleted)
            .ok_or(GraphError::UnknownEdge(id))
    }

    fn frame(&mut self) -> Result<&mut Frame, GraphError> {
        self.frames.last_mut().ok_or(GraphError::NoOpenFrame)
    }

    /// Removes `id` from its endpoints' incidence lists, remembering the
    /// slots it occupied.
    fn detach(&mut self, id: EdgeId) -> DetachedEdge {
        let EdgeData { from, to, .. } = self.edges[id.index()];

        let from_list = &mut self.nodes[from.index()].edges;
        let from_slot = from_list.iter().position(|&e| e == id).unwrap_or(0);
        from_list.remove(from_slot);

        let to_slot = if to == from {
            from_slot
        } else {
            let to_list = &mut self.nodes[to.index()].edges;
            let slot = to_list.iter().position(|&e| e == id).unwrap_or(0);
            to_list.remove(slot);
            slot
        };

        DetachedEdge {
            id,
            from,
            to,
            from_slot,
            to_slot,
        }
    }

    /// Reinserts `id` into its current endpoints' incidence lists at the
    /// recorded slots.
    fn attach_at(&mut self, id: EdgeId, from_slot: usize, to_slot: usize) {
        let EdgeData { from, to, .. } = self.edges[id.index()];

        let from_list = &mut self.nodes[from.index()].edges;
        from_list.insert(from_slot.min(from_list.len()), id);

        if to != from {
            let to_list = &mut self.nodes[to.index()].edges;
            to_list.insert(to_slot.min(to_list.len()), id);
        }
    }

    fn attach_end(&mut self, id: EdgeId) {
        let EdgeData { from, to, .. } = self.edges[id.index()];
        self.nodes[from.index()].edges.push(id);
        if to != from {
            self.nodes[to.index()].edges.push(id);
        }
    }

    fn undo_frame(&mut self, mut frame: Frame) {
        // Edge edits.
        for record in frame.edited_edges.drain(..).rev() {
            let deleted = self.edges[record.id.index()].deleted;
            if !deleted {
                self.detach(record.id);
            }
            let data = &mut self.edges[record.id.index()];
            data.from = record.from;
            data.to = record.to;
            if !deleted {
                self.attach_at(record.id, record.from_slot, record.to_slot);
            }
        }

        // Edge deletions.
        for record in frame.deleted_edges.drain(..).rev() {
            self.edges[record.id.index()].deleted = false;
            self.attach_at(record.id, record.from_slot, record.to_slot);
        }

        // Node deletions.
        for id in frame.deleted_nodes.drain(..).rev() {
            self.nodes[id.index()].deleted = false;
        }

        // Creations. Created ids are always the storage tail: inner frames
        // are unwound before outer ones and commit clears the whole stack.
        for id in frame.created_edges.drain(..).rev() {
            if !self.edges[id.index()].deleted {
                self.detach(id);
            }
            debug_assert_eq!(id.index(), self.edges.len() - 1);
            self.edges.pop();
        }

        for id in frame.created_nodes.drain(..).rev() {
            debug_assert_eq!(id.index(), self.nodes.len() - 1);
            self.nodes.pop();
        }
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                self.frames.is_empty(),
                "graph dropped with {} open edit frame(s)",
                self.frames.len()
            );
        }
    }
}

impl GraphRead for Graph {
    fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId::from_index(0))
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.deleted)
            .map(|(ix, _)| NodeId::from_index(ix))
            .collect()
    }

    fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.deleted)
            .map(|(ix, _)| EdgeId::from_index(ix))
            .collect()
    }

    fn has_node(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    fn has_edge(&self, id: EdgeId) -> bool {
        self.edge(id).is_ok()
    }

    fn edge_ends(&self, id: EdgeId) -> (NodeId, NodeId) {
        let data = &self.edges[id.index()];
        (data.from, data.to)
    }

    fn node_edges(&self, id: NodeId) -> Vec<EdgeId> {
        self.nodes[id.index()].edges.clone()
    }

    fn max_node_id(&self) -> usize {
        self.nodes.len()
    }

    fn max_edge_id(&self) -> usize {
        self.edges.len()
    }

    fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.deleted).count()
    }

    fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| !e.deleted).count()
    }
}

impl GraphEdit for Graph {
    fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "pop with no open edit frame");
        if let Some(frame) = self.frames.pop() {
            self.undo_frame(frame);
        }
    }

    fn commit(&mut self) {
        self.frames.clear();
    }

    fn make_node(&mut self) -> Result<NodeId, GraphError> {
        self.frame()?;
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData {
            edges: Vec::new(),
            deleted: false,
        });
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.frames
            .last_mut()
            .ok_or(GraphError::NoOpenFrame)?
            .created_nodes
            .push(id);
        Ok(id)
    }

    fn make_edge(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        self.node(from)?;
        self.node(to)?;
        self.frame()?;
        let id = EdgeId::from_index(self.edges.len());
        self.edges.push(EdgeData {
            from,
            to,
            deleted: false,
        });
        self.attach_end(id);
        self.frames
            .last_mut()
            .ok_or(GraphError::NoOpenFrame)?
            .created_edges
            .push(id);
        Ok(id)
    }

    fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.node(id)?;
        self.frame()?;
        if self.root == Some(id) {
            return Err(GraphError::RemoveRoot);
        }

        while let Some(&edge) = self.nodes[id.index()].edges.last() {
            self.remove_edge(edge)?;
        }

        self.nodes[id.index()].deleted = true;
        self.frame()?.deleted_nodes.push(id);
        Ok(())
    }

    fn remove_edge(&mut self, id: EdgeId) -> Result<(), GraphError> {
        self.edge(id)?;
        self.frame()?;
        let record = self.detach(id);
        self.edges[id.index()].deleted = true;
        self.frame()?.deleted_edges.push(record);
        Ok(())
    }

    fn edit_edge(&mut self, id: EdgeId, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.edge(id)?;
        self.node(from)?;
        self.node(to)?;
        self.frame()?;
        let record = self.detach(id);
        let data = &mut self.edges[id.index()];
        data.from = from;
        data.to = to;
        self.attach_end(id);
        self.frame()?.edited_edges.push(record);
        Ok(())
    }
}
