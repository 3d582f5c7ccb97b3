//! Graph container APIs used by `selkie`.
//!
//! The container is deliberately small: dense integer ids, tombstoned
//! deletion, a versioned editor with nested frames, subgraph selections over
//! a parent graph, and sparse attribute stores keyed by id. Everything a
//! layout pass needs, nothing it does not.

pub mod attribute;
mod graph;
mod subgraph;

pub use attribute::{Attribute, EdgeAttribute, NodeAttribute};
pub use graph::{Graph, GraphError};
pub use subgraph::{SubGraph, SubGraphMut, SubGraphRef};

use std::fmt;

/// Key type usable with [`Attribute`].
pub trait Id: Copy {
    fn index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl Id for $name {
            fn index(self) -> usize {
                self.0
            }

            fn from_index(index: usize) -> Self {
                Self(index)
            }
        }

        impl $name {
            pub const fn index(self) -> usize {
                self.0
            }

            pub const fn from_index(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// Identity of a node. Dense, assigned on creation, never reused within
    /// an edit frame.
    NodeId
}

id_type! {
    /// Identity of an edge.
    EdgeId
}

/// Read access shared by [`Graph`] and subgraph views.
///
/// `node_ids`/`edge_ids` return live ids in creation order. `max_node_id` /
/// `max_edge_id` are exclusive upper bounds on ids ever created, tombstones
/// included; attribute stores size themselves from these.
pub trait GraphRead {
    fn root(&self) -> NodeId;
    fn node_ids(&self) -> Vec<NodeId>;
    fn edge_ids(&self) -> Vec<EdgeId>;
    fn has_node(&self, id: NodeId) -> bool;
    fn has_edge(&self, id: EdgeId) -> bool;
    /// `(from, to)` endpoints of a live edge.
    fn edge_ends(&self, id: EdgeId) -> (NodeId, NodeId);
    /// Incident edges of a node, both directions, insertion-ordered.
    fn node_edges(&self, id: NodeId) -> Vec<EdgeId>;
    fn max_node_id(&self) -> usize;
    fn max_edge_id(&self) -> usize;
    fn node_count(&self) -> usize;
    fn edge_count(&self) -> usize;

    fn edge_from(&self, id: EdgeId) -> NodeId {
        self.edge_ends(id).0
    }

    fn edge_to(&self, id: EdgeId) -> NodeId {
        self.edge_ends(id).1
    }

    /// The endpoint of `id` on the far side of `n`.
    fn edge_other(&self, id: EdgeId, n: NodeId) -> NodeId {
        let (from, to) = self.edge_ends(id);
        if to == n { from } else { to }
    }

    /// Outgoing edges of `n`.
    fn child_edges(&self, n: NodeId) -> Vec<EdgeId> {
        self.node_edges(n)
            .into_iter()
            .filter(|&e| self.edge_from(e) == n)
            .collect()
    }

    /// Incoming edges of `n`.
    fn parent_edges(&self, n: NodeId) -> Vec<EdgeId> {
        self.node_edges(n)
            .into_iter()
            .filter(|&e| self.edge_to(e) == n)
            .collect()
    }

    fn child_nodes(&self, n: NodeId) -> Vec<NodeId> {
        self.child_edges(n)
            .into_iter()
            .map(|e| self.edge_to(e))
            .collect()
    }

    fn parent_nodes(&self, n: NodeId) -> Vec<NodeId> {
        self.parent_edges(n)
            .into_iter()
            .map(|e| self.edge_from(e))
            .collect()
    }

    fn neighbors(&self, n: NodeId) -> Vec<NodeId> {
        self.node_edges(n)
            .into_iter()
            .map(|e| self.edge_other(e, n))
            .collect()
    }
}

/// Structural mutation on top of [`GraphRead`].
///
/// Mutations are recorded in the topmost edit frame; `pop` undoes the frame,
/// `commit` discards the whole stack keeping the changes. Mutating with no
/// open frame fails with [`GraphError::NoOpenFrame`].
pub trait GraphEdit: GraphRead {
    fn push(&mut self);
    fn pop(&mut self);
    fn commit(&mut self);
    fn make_node(&mut self) -> Result<NodeId, GraphError>;
    fn make_edge(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError>;
    /// Removes a node together with every incident edge.
    fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError>;
    fn remove_edge(&mut self, id: EdgeId) -> Result<(), GraphError>;
    /// Detaches `id` from its endpoints and reattaches it to `from`/`to`,
    /// preserving the edge identity.
    fn edit_edge(&mut self, id: EdgeId, from: NodeId, to: NodeId) -> Result<(), GraphError>;
}
