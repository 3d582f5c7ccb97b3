//! Layout passes: per-region Sugiyama pipeline and recursive region
//! composition.

pub mod region;
pub mod sugiyama;

use selkie_graph::{EdgeId, NodeId};

/// Horizontal spacing between nodes and at layer margins.
pub(crate) const X_GUTTER: f64 = 20.0;
/// Vertical padding above and below an inter-layer edge channel.
pub(crate) const Y_GUTTER: f64 = 15.0;
/// Height of one horizontal routing channel.
pub(crate) const EDGE_HEIGHT: f64 = 10.0;
/// Footprint of a synthetic waypoint node.
pub(crate) const WAYPOINT_WIDTH: f64 = 10.0;
pub(crate) const WAYPOINT_HEIGHT: f64 = 1.0;

/// The (member node, crossing edge) tuple recorded on every region an
/// inter-region edge traverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoPair {
    pub node: NodeId,
    pub edge: EdgeId,
}
