//! Control-flow-graph layout.
//!
//! Feed in a directed graph with per-node sizes, get back a 2-D placement
//! plus an orthogonal polyline for every edge: the graph is decomposed into
//! single-entry/single-exit regions, each region is drawn with a
//! Sugiyama-style layered pipeline, and the region drawings are composed
//! recursively into one picture.
//!
//! ```no_run
//! use selkie::LayoutBuilder;
//!
//! # fn main() -> selkie::Result<()> {
//! let mut builder = LayoutBuilder::new();
//! let a = builder.make_node_with_size(100.0, 100.0);
//! let b = builder.make_node_with_size(100.0, 100.0);
//! builder.make_edge(a, b)?;
//!
//! let layout = builder.build()?;
//! let (x, y) = (layout.get_coords(a)?.x, layout.get_coords(a)?.y);
//! # let _ = (x, y);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod error;
pub mod geom;
pub mod layout;
pub mod render;
pub mod tree;

use std::path::Path;

use selkie_graph::{EdgeAttribute, GraphEdit, GraphRead, NodeAttribute};

pub use error::{Error, Result};
pub use geom::Point;
pub use layout::region::RegionLayout;
pub use render::{Color, ExportingRenderer, Renderer, StrokeStyle, TextStyle, Theme};
pub use selkie_graph as graph;
pub use selkie_graph::{EdgeId, Graph, NodeId};

/// How an edge should be styled when rendered: the fall-through default or
/// one arm of a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeKind {
    #[default]
    Default,
    True,
    False,
}

/// Collects nodes, edges and sizes, then runs the layout pipeline.
#[derive(Debug)]
pub struct LayoutBuilder {
    graph: Graph,
    widths: NodeAttribute<f64>,
    heights: NodeAttribute<f64>,
    labels: NodeAttribute<String>,
    edge_kinds: EdgeAttribute<EdgeKind>,
    seed: u64,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            widths: NodeAttribute::new(0, 1.0),
            heights: NodeAttribute::new(0, 1.0),
            labels: NodeAttribute::new(0, String::new()),
            edge_kinds: EdgeAttribute::new(0, EdgeKind::Default),
            seed: 1,
        }
    }

    /// Seed for the crossing-reduction shuffle; fixed by default so repeated
    /// builds of the same graph are identical.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Builder mutations commit immediately; each one runs in its own frame.
    pub fn make_node(&mut self) -> NodeId {
        self.graph.push();
        let id = match self.graph.make_node() {
            Ok(id) => id,
            Err(_) => unreachable!("a frame was just pushed"),
        };
        self.graph.commit();
        id
    }

    pub fn make_node_with_size(&mut self, width: f64, height: f64) -> NodeId {
        let node = self.make_node();
        self.widths.set(node, width);
        self.heights.set(node, height);
        node
    }

    /// The label sizes the node using renderer-independent text metrics.
    pub fn make_node_with_label(&mut self, label: &str) -> NodeId {
        let node = self.make_node();
        let bbox = render::measure_text_deterministic(label, &Theme::default().text);
        self.widths.set(node, bbox.x);
        self.heights.set(node, bbox.y);
        self.labels.set(node, label.to_string());
        node
    }

    /// The label sizes the node using the renderer's own text metrics.
    pub fn make_node_measured(&mut self, renderer: &dyn Renderer, label: &str) -> NodeId {
        let node = self.make_node();
        let bbox = renderer.measure_text(label, &Theme::default().text);
        self.widths.set(node, bbox.x);
        self.heights.set(node, bbox.y);
        self.labels.set(node, label.to_string());
        node
    }

    /// Recomputes every node's size from its label, overwriting custom
    /// sizes.
    pub fn measure_nodes(&mut self, renderer: &dyn Renderer) {
        for node in self.graph.node_ids() {
            let bbox = renderer.measure_text(self.labels.get(node), &Theme::default().text);
            self.widths.set(node, bbox.x);
            self.heights.set(node, bbox.y);
        }
    }

    pub fn make_edge(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId> {
        self.graph.push();
        match self.graph.make_edge(from, to) {
            Ok(edge) => {
                self.graph.commit();
                Ok(edge)
            }
            Err(e) => {
                self.graph.pop();
                Err(e.into())
            }
        }
    }

    pub fn make_edge_with_kind(
        &mut self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
    ) -> Result<EdgeId> {
        let edge = self.make_edge(from, to)?;
        self.edge_kinds.set(edge, kind);
        Ok(edge)
    }

    /// Runs the full pipeline. Consumes the builder; no partial layout is
    /// ever returned.
    pub fn build(mut self) -> Result<CfgLayout> {
        if self.graph.node_count() == 0 {
            return Ok(CfgLayout {
                layout: RegionLayout {
                    xs: NodeAttribute::new(0, 0.0),
                    ys: NodeAttribute::new(0, 0.0),
                    widths: self.widths,
                    heights: self.heights,
                    waypoints: EdgeAttribute::new(0, Vec::new()),
                    width: 0.0,
                    height: 0.0,
                    region_count: 0,
                },
                graph: self.graph,
                labels: self.labels,
                edge_kinds: self.edge_kinds,
            });
        }

        // Self-loops are permitted in the input but normalised out before
        // routing.
        self.graph.push();
        for e in self.graph.edge_ids() {
            let (from, to) = self.graph.edge_ends(e);
            if from == to {
                self.graph.remove_edge(e)?;
            }
        }
        self.graph.commit();

        tracing::debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "building layout"
        );

        let layout = RegionLayout::build(&mut self.graph, &self.widths, &self.heights, self.seed)?;
        Ok(CfgLayout {
            graph: self.graph,
            labels: self.labels,
            edge_kinds: self.edge_kinds,
            layout,
        })
    }
}

/// A finished layout: query coordinates and polylines, or render the whole
/// graph against an injected [`Renderer`].
#[derive(Debug)]
pub struct CfgLayout {
    graph: Graph,
    labels: NodeAttribute<String>,
    edge_kinds: EdgeAttribute<EdgeKind>,
    layout: RegionLayout,
}

impl CfgLayout {
    /// Top-left corner of a node.
    pub fn get_coords(&self, node: NodeId) -> Result<Point> {
        if !self.graph.has_node(node) {
            return Err(Error::InvalidArgument {
                kind: "node",
                id: node.index(),
            });
        }
        Ok(Point::new(
            self.layout.xs.value(node),
            self.layout.ys.value(node),
        ))
    }

    /// Size of a node as laid out.
    pub fn get_size(&self, node: NodeId) -> Result<Point> {
        if !self.graph.has_node(node) {
            return Err(Error::InvalidArgument {
                kind: "node",
                id: node.index(),
            });
        }
        Ok(Point::new(
            self.layout.widths.value(node),
            self.layout.heights.value(node),
        ))
    }

    /// The orthogonal polyline an edge follows, source to target.
    pub fn get_waypoints(&self, edge: EdgeId) -> Result<&[Point]> {
        if !self.graph.has_edge(edge) {
            return Err(Error::InvalidArgument {
                kind: "edge",
                id: edge.index(),
            });
        }
        Ok(self.layout.waypoints.get(edge))
    }

    pub fn get_width(&self) -> f64 {
        self.layout.width
    }

    pub fn get_height(&self) -> f64 {
        self.layout.height
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn region_count(&self) -> usize {
        self.layout.region_count
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.render_with_theme(renderer, &Theme::default());
    }

    pub fn render_with_theme(&self, renderer: &mut dyn Renderer, theme: &Theme) {
        renderer.begin(self.get_width(), self.get_height());

        for node in self.graph.node_ids() {
            let tl = Point::new(self.layout.xs.value(node), self.layout.ys.value(node));
            let width = self.layout.widths.value(node);
            let height = self.layout.heights.value(node);

            renderer.draw_rectangle_border(tl, width, height, &theme.block_border);
            let label = self.labels.get(node);
            if !label.is_empty() {
                renderer.draw_text(tl, label, &theme.text);
            }
        }

        for edge in self.graph.edge_ids() {
            let points = self.layout.waypoints.get(edge);
            if points.is_empty() {
                continue;
            }

            let style = match self.edge_kinds.value(edge) {
                EdgeKind::Default => &theme.edge,
                EdgeKind::True => &theme.edge_true,
                EdgeKind::False => &theme.edge_false,
            };

            for pair in points.windows(2) {
                renderer.draw_line(pair[0], pair[1], style);
            }

            if let Some(&tip) = points.last() {
                let half = theme.triangle_size / 2.0;
                renderer.draw_triangle(
                    tip,
                    tip + Point::new(-half, -theme.triangle_size),
                    tip + Point::new(half, -theme.triangle_size),
                    style.color,
                );
            }
        }

        renderer.end();
    }

    pub fn render_and_save(
        &self,
        renderer: &mut dyn ExportingRenderer,
        path: &Path,
    ) -> Result<()> {
        self.render_with_theme(renderer, &Theme::default());
        renderer.save(path)
    }
}
