//! The per-region Sugiyama pipeline.
//!
//! Runs inside editor frames so none of its scaffolding (reversed edges,
//! waypoint nodes, io ghosts) survives into the caller's graph. The outer
//! frame holds cycle removal, io extremities and long-edge splitting; the
//! inner frame holds edge flipping and everything coordinate-related.

pub mod network_simplex;
pub mod ordering;

use rustc_hash::FxHashMap;
use selkie_graph::{EdgeAttribute, EdgeId, GraphEdit, NodeAttribute, NodeId};

use crate::analysis::dfs::Dfs;
use crate::error::Result;
use crate::geom::Point;
use crate::layout::{EDGE_HEIGHT, IoPair, WAYPOINT_HEIGHT, WAYPOINT_WIDTH, X_GUTTER, Y_GUTTER};

/// Edges closer than this overlap for channel-assignment purposes.
const CHANNEL_TOLERANCE: f64 = 10.0;

/// Horizontal sweep count for the x-coordinate relaxation.
const X_SWEEPS: usize = 5;

/// Placement priority during x assignment: waypoints yield to real nodes,
/// io ghosts yield to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
    Dummy,
    Real,
    Io,
}

/// What a Sugiyama run leaves behind for the region driver.
#[derive(Debug)]
pub struct Sugiyama {
    pub xs: NodeAttribute<f64>,
    pub ys: NodeAttribute<f64>,
    pub waypoints: EdgeAttribute<Vec<Point>>,
    pub io_waypoints: FxHashMap<IoPair, Vec<Point>>,
    pub width: f64,
    pub height: f64,
    /// The run reserved a channel band above the top layer; the caller
    /// reclaims it by shifting the region up.
    pub had_top_channel: bool,
}

pub struct SugiyamaInputs<'a> {
    pub widths: NodeAttribute<f64>,
    pub heights: NodeAttribute<f64>,
    pub start_x_offsets: &'a mut EdgeAttribute<f64>,
    pub end_x_offsets: &'a mut EdgeAttribute<f64>,
    pub entries: &'a [IoPair],
    pub exits: &'a [IoPair],
    pub seed: u64,
}

pub fn sugiyama<G: GraphEdit>(g: &mut G, inputs: SugiyamaInputs<'_>) -> Result<Sugiyama> {
    g.push();
    let mut pass = Pass::new(g, inputs);
    let result = pass.execute();
    let out = pass.into_parts();
    g.pop();
    result?;
    Ok(out)
}

struct Pass<'a, G: GraphEdit> {
    g: &'a mut G,
    widths: NodeAttribute<f64>,
    heights: NodeAttribute<f64>,

    layers: NodeAttribute<usize>,
    layer_count: usize,
    orders: NodeAttribute<usize>,
    xs: NodeAttribute<f64>,
    ys: NodeAttribute<f64>,

    waypoints: EdgeAttribute<Vec<Point>>,
    /// Segment chain an original edge was split into.
    edge_segments: EdgeAttribute<Vec<EdgeId>>,
    /// Original edges removed by long-edge splitting (io edges excluded).
    split_edges: Vec<EdgeId>,
    flipped: EdgeAttribute<bool>,
    edge_weights: EdgeAttribute<f64>,
    priorities: NodeAttribute<Priority>,

    entries: Vec<IoPair>,
    exits: Vec<IoPair>,
    start_x_offsets: &'a mut EdgeAttribute<f64>,
    end_x_offsets: &'a mut EdgeAttribute<f64>,
    io_edges: FxHashMap<IoPair, EdgeId>,
    io_waypoints: FxHashMap<IoPair, Vec<Point>>,

    has_top_channel: bool,
    has_bottom_channel: bool,

    node_layers: Vec<Vec<NodeId>>,
    seed: u64,
    width: f64,
    height: f64,
}

impl<'a, G: GraphEdit> Pass<'a, G> {
    fn new(g: &'a mut G, inputs: SugiyamaInputs<'a>) -> Self {
        let nodes = g.max_node_id();
        let edges = g.max_edge_id();
        Self {
            g,
            widths: inputs.widths,
            heights: inputs.heights,
            layers: NodeAttribute::new(nodes, 0),
            layer_count: 0,
            orders: NodeAttribute::new(nodes, 0),
            xs: NodeAttribute::new(nodes, 0.0),
            ys: NodeAttribute::new(nodes, 0.0),
            waypoints: EdgeAttribute::new(edges, Vec::new()),
            edge_segments: EdgeAttribute::new(edges, Vec::new()),
            split_edges: Vec::new(),
            flipped: EdgeAttribute::new(edges, false),
            edge_weights: EdgeAttribute::new(edges, 1.0),
            priorities: NodeAttribute::new(nodes, Priority::Real),
            entries: inputs.entries.to_vec(),
            exits: inputs.exits.to_vec(),
            start_x_offsets: inputs.start_x_offsets,
            end_x_offsets: inputs.end_x_offsets,
            io_edges: FxHashMap::default(),
            io_waypoints: FxHashMap::default(),
            has_top_channel: false,
            has_bottom_channel: false,
            node_layers: Vec::new(),
            seed: inputs.seed,
            width: 0.0,
            height: 0.0,
        }
    }

    fn execute(&mut self) -> Result<()> {
        self.cycle_removal()?;
        self.layer_assignment();
        self.slide_nodes();
        self.ensure_io_at_extremities()?;
        self.split_long_edges()?;
        self.init_node_layers();

        self.g.push();
        let inner = self.coordinate_phases();
        self.g.pop();
        inner?;

        self.make_io_waypoints();
        self.assemble_split_edges();
        Ok(())
    }

    fn coordinate_phases(&mut self) -> Result<()> {
        self.flip_edges()?;
        self.assign_y();
        self.order_vertices();
        self.create_waypoints();
        self.assign_x();
        self.translate_waypoints();
        self.assign_channel_y();
        self.height = self.compute_graph_height();
        self.width = self.compute_graph_width();
        Ok(())
    }

    fn into_parts(self) -> Sugiyama {
        Sugiyama {
            xs: self.xs,
            ys: self.ys,
            waypoints: self.waypoints,
            io_waypoints: self.io_waypoints,
            width: self.width,
            height: self.height,
            had_top_channel: self.has_top_channel,
        }
    }

    /// Reverses every back edge; self-loops are simply dropped.
    fn cycle_removal(&mut self) -> Result<()> {
        let dfs = Dfs::new(&*self.g);
        for e in self.g.edge_ids() {
            if !dfs.is_back(e) {
                continue;
            }
            let (from, to) = self.g.edge_ends(e);
            if from == to {
                self.g.remove_edge(e)?;
            } else {
                self.g.edit_edge(e, to, from)?;
                self.flipped.set(e, true);
            }
        }
        Ok(())
    }

    fn layer_assignment(&mut self) {
        let assignment = network_simplex::network_simplex(&*self.g);
        self.layers = assignment.layers;
        self.layer_count = assignment.layer_count;
    }

    fn set_layer(&mut self, node: NodeId, layer: usize) {
        debug_assert!(layer < self.layer_count);
        self.layers.set(node, layer);
        if layer == 0 {
            self.has_bottom_channel = true;
        }
    }

    /// Nodes with slack between their neighbour layers slide to whichever
    /// layer minimises the graph height, tallest first.
    fn slide_nodes(&mut self) {
        struct Candidate {
            node: NodeId,
            min_layer: usize,
            max_layer: usize,
            height: f64,
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        for node in self.g.node_ids() {
            let layer = self.layers.value(node);
            let neighbor_layers: Vec<usize> = self
                .g
                .neighbors(node)
                .into_iter()
                .map(|n| self.layers.value(n))
                .collect();

            let min_layer = neighbor_layers
                .iter()
                .filter(|&&l| l <= layer)
                .max()
                .map(|&l| l + 1)
                .unwrap_or(layer);
            let max_layer = neighbor_layers
                .iter()
                .filter(|&&l| l >= layer)
                .min()
                .map(|&l| l - 1)
                .unwrap_or(layer);
            debug_assert!(min_layer <= layer && layer <= max_layer);

            if min_layer == max_layer {
                continue;
            }
            candidates.push(Candidate {
                node,
                min_layer,
                max_layer,
                height: self.heights.value(node),
            });
        }

        candidates.sort_by(|a, b| {
            b.height
                .partial_cmp(&a.height)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for candidate in candidates {
            let layer = self.layers.value(candidate.node);
            let mut best_height = self.compute_graph_height();
            let mut best_layer = layer;

            for r in candidate.min_layer..=candidate.max_layer {
                if r == layer {
                    continue;
                }
                self.layers.set(candidate.node, r);
                let height = self.compute_graph_height();
                if height < best_height {
                    best_height = height;
                    best_layer = r;
                }
            }

            self.layers.set(candidate.node, best_layer);
        }
    }

    fn create_waypoint(&mut self) -> Result<NodeId> {
        let waypoint = self.g.make_node()?;
        self.heights.set(waypoint, WAYPOINT_HEIGHT);
        self.widths.set(waypoint, WAYPOINT_WIDTH);
        self.priorities.set(waypoint, Priority::Dummy);
        Ok(waypoint)
    }

    fn create_ghost_node(&mut self, layer: usize) -> Result<NodeId> {
        let waypoint = self.create_waypoint()?;
        self.set_layer(waypoint, layer);
        Ok(waypoint)
    }

    /// Region entries get a ghost above the top layer, exits one below the
    /// bottom, so boundary edges always leave through the extremities.
    fn ensure_io_at_extremities(&mut self) -> Result<()> {
        let top_layer = self.layer_count;
        self.layer_count += 1;

        for pair in self.entries.clone() {
            let ghost = self.create_ghost_node(top_layer)?;
            self.priorities.set(ghost, Priority::Io);
            let edge = self.g.make_edge(ghost, pair.node)?;
            self.io_edges.insert(pair, edge);
        }

        for pair in self.exits.clone() {
            let ghost = self.create_ghost_node(0)?;
            self.priorities.set(ghost, Priority::Io);
            let edge = self.g.make_edge(pair.node, ghost)?;
            self.io_edges.insert(pair, edge);
        }

        // Channel bands, not loops, but they reserve the same space.
        self.has_top_channel = true;
        self.has_bottom_channel = true;
        Ok(())
    }

    fn is_io_edge(&self, edge: EdgeId) -> bool {
        self.io_edges.values().any(|&e| e == edge)
    }

    /// Splits every edge spanning more than one layer (and every reversed
    /// edge) into one segment per layer gap. Reversed edges wrap around the
    /// extremities through zero-weight segments.
    fn split_long_edges(&mut self) -> Result<()> {
        let mut to_split: Vec<EdgeId> = Vec::new();
        for e in self.g.edge_ids() {
            let (from, to) = self.g.edge_ends(e);
            let from_layer = self.layers.value(from);
            let to_layer = self.layers.value(to);
            let span = from_layer.abs_diff(to_layer);
            if span > 1 || self.flipped.value(e) {
                to_split.push(e);
            }
        }

        while let Some(edge) = to_split.pop() {
            let (from, to) = self.g.edge_ends(edge);
            let from_layer = self.layers.value(from) as i64;
            let to_layer = self.layers.value(to) as i64;

            let mut bottom_layer = from_layer.min(to_layer);
            let mut top_layer = from_layer.max(to_layer);
            let bottom = if bottom_layer == from_layer { from } else { to };
            let top = if top_layer == to_layer { to } else { from };

            let is_flipped = self.flipped.value(edge);
            let is_going_up = (is_flipped && from_layer != bottom_layer)
                || (!is_flipped && from_layer == bottom_layer);

            self.g.remove_edge(edge)?;
            if !self.is_io_edge(edge) {
                self.split_edges.push(edge);
            }

            if is_going_up {
                // Wrap below the bottom and above the top.
                bottom_layer -= 2;
                top_layer += 2;
            }

            let mut segments: Vec<EdgeId> = Vec::new();
            let mut previous = bottom;
            let mut layer = bottom_layer + 1;
            while layer < top_layer {
                let waypoint = self.create_ghost_node(layer.max(0) as usize)?;
                let segment = self.g.make_edge(waypoint, previous)?;
                segments.push(segment);
                if is_going_up && layer == bottom_layer + 1 {
                    self.edge_weights.set(segment, 0.0);
                }
                previous = waypoint;
                layer += 1;
            }

            let last = self.g.make_edge(top, previous)?;
            segments.push(last);
            if is_going_up {
                self.edge_weights.set(last, 0.0);
            }

            if !is_going_up {
                segments.reverse();
                for &segment in &segments {
                    let (f, t) = self.g.edge_ends(segment);
                    self.g.edit_edge(segment, t, f)?;
                }
            }

            self.edge_segments.set(edge, segments);
        }

        Ok(())
    }

    fn init_node_layers(&mut self) {
        self.node_layers = vec![Vec::new(); self.layer_count];
        for node in self.g.node_ids() {
            self.node_layers[self.layers.value(node)].push(node);
        }
    }

    /// Flips edges so every one points from its higher layer to its lower
    /// layer, top-down in render terms.
    fn flip_edges(&mut self) -> Result<()> {
        for e in self.g.edge_ids() {
            let (from, to) = self.g.edge_ends(e);
            debug_assert_ne!(self.layers.value(from), self.layers.value(to));
            if self.layers.value(from) < self.layers.value(to) {
                self.g.edit_edge(e, to, from)?;
            }
        }
        Ok(())
    }

    fn assign_y(&mut self) {
        let mut y = 0.0;
        for layer in (0..self.layer_count).rev() {
            let mut layer_height = 0.0f64;
            let mut layer_gap = 2.0 * Y_GUTTER;

            for &node in &self.node_layers[layer] {
                self.ys.set(node, y);
                layer_height = layer_height.max(self.heights.value(node));
                layer_gap += self.g.child_edges(node).len() as f64 * EDGE_HEIGHT;
            }

            if layer_gap == 2.0 * Y_GUTTER {
                // No edges in this gap.
                layer_gap = 0.0;
            }

            y += layer_height + layer_gap;
        }
    }

    fn order_vertices(&mut self) {
        self.orders =
            ordering::vertex_ordering(&*self.g, &self.layers, self.layer_count, self.seed);
        for nodes in &mut self.node_layers {
            nodes.sort_by_key(|&n| self.orders.value(n));
        }
    }

    fn compute_graph_height(&self) -> f64 {
        let mut layer_heights = vec![0.0f64; self.layer_count];
        let mut layer_gaps = vec![2.0 * Y_GUTTER; self.layer_count];

        for node in self.g.node_ids() {
            let layer = self.layers.value(node);
            layer_heights[layer] = layer_heights[layer].max(self.heights.value(node));
            layer_gaps[layer] += self.g.child_edges(node).len() as f64 * EDGE_HEIGHT;
        }

        let mut y = 0.0;
        if self.has_top_channel {
            y -= 2.0 * Y_GUTTER;
        }
        for layer in (0..self.layer_count).rev() {
            let mut gap = layer_gaps[layer];
            if gap == 2.0 * Y_GUTTER {
                gap = 0.0;
            }
            y += layer_heights[layer] + gap;
        }
        if self.has_bottom_channel {
            y -= 2.0 * Y_GUTTER;
        }
        y
    }

    fn compute_graph_width(&self) -> f64 {
        let mut width = 0.0f64;
        for nodes in &self.node_layers {
            let mut layer_width = X_GUTTER;
            for &node in nodes {
                layer_width += self.widths.value(node) + X_GUTTER;
            }
            width = width.max(layer_width);
        }
        width
    }

    /// Lays down the four control points of every edge: x fan-out across the
    /// source's child edges and the destination's parent edges, y pinned to
    /// the node boundaries. Channel y values come later.
    fn create_waypoints(&mut self) {
        for e in self.g.edge_ids() {
            self.waypoints.get_mut(e).resize(4, Point::default());
        }

        for layer in 0..self.layer_count {
            let mut nodes = self.node_layers[layer].clone();
            nodes.sort_by_key(|&n| self.orders.value(n));

            // Exit side.
            for &node in &nodes {
                let y0 = self.ys.value(node) + self.heights.value(node);

                let mut edges = self.g.child_edges(node);
                edges.sort_by(|&a, &b| {
                    let order_a = self.orders.value(self.g.edge_to(a));
                    let order_b = self.orders.value(self.g.edge_to(b));
                    order_a.cmp(&order_b).then_with(|| {
                        self.end_x_offsets
                            .value(a)
                            .partial_cmp(&self.end_x_offsets.value(b))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                });

                let spacer = self.widths.value(node) / (edges.len() + 1) as f64;
                let mut x = spacer;

                for edge in edges {
                    debug_assert!(
                        self.ys.value(self.g.edge_to(edge)) > self.ys.value(self.g.edge_from(edge))
                    );

                    let imposed = self.start_x_offsets.value(edge);
                    let points = self.waypoints.get_mut(edge);
                    if imposed < 0.0 {
                        points[0].x = x;
                        points[1].x = x;
                        self.start_x_offsets.set(edge, x);
                    } else {
                        points[0].x = imposed;
                        points[1].x = imposed;
                    }

                    let to = self.g.edge_to(edge);
                    let points = self.waypoints.get_mut(edge);
                    points[0].y = y0;
                    points[3].y = self.ys.value(to);

                    x += spacer;
                }
            }

            // Entry side.
            for &node in &nodes {
                let mut edges = self.g.parent_edges(node);
                edges.sort_by(|&a, &b| {
                    let order_a = self.orders.value(self.g.edge_from(a));
                    let order_b = self.orders.value(self.g.edge_from(b));
                    order_a.cmp(&order_b).then_with(|| {
                        self.start_x_offsets
                            .value(a)
                            .partial_cmp(&self.start_x_offsets.value(b))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                });

                let spacer = self.widths.value(node) / (edges.len() + 1) as f64;
                let mut x = spacer;

                for edge in edges {
                    let imposed = self.end_x_offsets.value(edge);
                    let points = self.waypoints.get_mut(edge);
                    if imposed < 0.0 {
                        points[2].x = x;
                        points[3].x = x;
                        self.end_x_offsets.set(edge, x);
                    } else {
                        points[2].x = imposed;
                        points[3].x = imposed;
                    }

                    x += spacer;
                }
            }
        }
    }

    /// Weighted average x of the node's neighbours on `layer`, corrected by
    /// the waypoint fan-out offsets; negative when the node has none.
    fn average_position(&self, node: NodeId, layer: usize, is_going_down: bool) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for edge in self.g.node_edges(node) {
            let other = self.g.edge_other(edge, node);
            if self.layers.value(other) != layer {
                continue;
            }

            let weight = self.edge_weights.value(edge);
            let points = self.waypoints.get(edge);
            let mut offset = points[1].x - points[2].x;
            if is_going_down {
                offset = -offset;
            }

            numerator += (self.xs.value(other) + offset) * weight;
            denominator += weight;
        }

        if denominator == 0.0 {
            return -1.0;
        }
        numerator / denominator
    }

    /// Lowest x this node can take without pushing equal-or-higher priority
    /// left neighbours around.
    fn min_x(&self, nodes: &[NodeId], ix: usize) -> f64 {
        let priority = self.priorities.value(nodes[ix]);
        let mut width = 0.0;

        for i in (0..ix).rev() {
            width += self.widths.value(nodes[i]) + X_GUTTER;
            if self.priorities.value(nodes[i]) >= priority {
                return self.xs.value(nodes[i]) + width;
            }
        }

        width + X_GUTTER
    }

    fn max_x(&self, nodes: &[NodeId], ix: usize, graph_width: f64) -> f64 {
        let priority = self.priorities.value(nodes[ix]);
        let mut width = self.widths.value(nodes[ix]) + X_GUTTER;

        for i in ix + 1..nodes.len() {
            if self.priorities.value(nodes[i]) > priority {
                return self.xs.value(nodes[i]) - width;
            }
            width += self.widths.value(nodes[i]) + X_GUTTER;
        }

        graph_width - width
    }

    fn sweep_layer(&mut self, layer: usize, next_layer: usize, graph_width: f64) {
        let nodes = self.node_layers[layer].clone();

        let mut by_priority: Vec<usize> = (0..nodes.len()).collect();
        by_priority.sort_by(|&a, &b| {
            self.priorities
                .value(nodes[b])
                .cmp(&self.priorities.value(nodes[a]))
        });

        for ix in by_priority {
            let node = nodes[ix];
            let mut lo = self.min_x(&nodes, ix);
            let mut hi = self.max_x(&nodes, ix, graph_width);

            if (hi - lo).abs() < 0.01 {
                hi = lo;
            }
            if lo > hi {
                lo = (lo + hi) / 2.0;
                hi = lo;
            }

            let average = self.average_position(node, next_layer, next_layer < layer);
            let x = if average >= 0.0 {
                average.clamp(lo, hi)
            } else {
                self.xs.value(node).clamp(lo, hi)
            };
            self.xs.set(node, x);
        }
    }

    fn assign_x(&mut self) {
        let graph_width = self.compute_graph_width();

        for layer in 0..self.layer_count {
            let mut nodes = self.node_layers[layer].clone();
            nodes.sort_by_key(|&n| self.orders.value(n));

            let mut x = X_GUTTER;
            for node in nodes {
                self.xs.set(node, x);
                x += self.widths.value(node) + X_GUTTER;
            }
        }

        for _ in 0..X_SWEEPS {
            for layer in 1..self.layer_count {
                self.sweep_layer(layer, layer - 1, graph_width);
            }
            for layer in (0..self.layer_count).rev() {
                self.sweep_layer(layer, layer + 1, graph_width);
            }
        }

        for layer in 1..self.layer_count {
            self.sweep_layer(layer, layer - 1, graph_width);
        }
    }

    /// The fan-out x values are node-relative up to here.
    fn translate_waypoints(&mut self) {
        for edge in self.g.edge_ids() {
            let (from, to) = self.g.edge_ends(edge);
            let from_x = self.xs.value(from);
            let to_x = self.xs.value(to);

            let points = self.waypoints.get_mut(edge);
            points[0].x += from_x;
            points[1].x += from_x;
            points[2].x += to_x;
            points[3].x += to_x;
        }
    }

    /// Stacks the horizontal legs within each layer gap so no vertical of
    /// one edge crosses the horizontal of another. Constraints are resolved
    /// as a fixed point; cyclic ones are dropped.
    fn assign_channel_y(&mut self) {
        const UNVISITED: i64 = i64::MIN;

        for layer in 0..self.layer_count {
            let mut edges: Vec<EdgeId> = Vec::new();
            for &node in &self.node_layers[layer] {
                edges.extend(self.g.child_edges(node));
            }
            if edges.is_empty() {
                continue;
            }

            let spans: Vec<(f64, f64)> = edges
                .iter()
                .map(|&e| {
                    let points = self.waypoints.get(e);
                    let lo = points[1].x.min(points[2].x);
                    let hi = points[1].x.max(points[2].x);
                    (lo, hi)
                })
                .collect();

            let mut channels = vec![UNVISITED; edges.len()];

            for start in 0..edges.len() {
                if channels[start] != UNVISITED {
                    continue;
                }
                self.resolve_channel(start, &edges, &spans, &mut channels);
            }

            let min_channel = channels.iter().copied().min().unwrap_or(0);
            for (ix, &edge) in edges.iter().enumerate() {
                let offset = (channels[ix] - min_channel) as f64;
                let points = self.waypoints.get_mut(edge);
                let y = points[3].y - Y_GUTTER - offset * EDGE_HEIGHT;
                points[1].y = y;
                points[2].y = y;
            }
        }
    }

    /// Iterative fixed point for one segment's channel. A segment must sit
    /// above any segment whose horizontal run its down-leg would pierce, and
    /// below any whose run covers its up-leg.
    fn resolve_channel(
        &self,
        start: usize,
        edges: &[EdgeId],
        spans: &[(f64, f64)],
        channels: &mut [i64],
    ) {
        const UNVISITED: i64 = i64::MIN;
        const IN_PROGRESS: i64 = i64::MAX;

        struct Frame {
            id: usize,
            cursor: usize,
            lmin: i64,
            lmax: i64,
        }

        channels[start] = IN_PROGRESS;
        let mut stack = vec![Frame {
            id: start,
            cursor: 0,
            lmin: i64::MAX,
            lmax: i64::MIN,
        }];

        while let Some(top) = stack.last_mut() {
            if top.cursor < edges.len() {
                let other = top.cursor;
                if other == top.id {
                    top.cursor += 1;
                    continue;
                }

                let points = self.waypoints.get(edges[top.id]);
                let x1 = points[1].x;
                let x2 = points[2].x;
                let (other_lo, other_hi) = spans[other];

                if other_lo - CHANNEL_TOLERANCE <= x2 && x2 <= other_hi + CHANNEL_TOLERANCE {
                    match channels[other] {
                        UNVISITED => {
                            channels[other] = IN_PROGRESS;
                            stack.push(Frame {
                                id: other,
                                cursor: 0,
                                lmin: i64::MAX,
                                lmax: i64::MIN,
                            });
                            continue;
                        }
                        IN_PROGRESS => {
                            // Over-constrained cycle; drop the constraint.
                            tracing::trace!("cyclic channel constraint dropped");
                            top.cursor += 1;
                        }
                        level => {
                            top.lmin = top.lmin.min(level - 1);
                            top.cursor += 1;
                        }
                    }
                } else if other_lo - CHANNEL_TOLERANCE <= x1 && x1 <= other_hi + CHANNEL_TOLERANCE {
                    let level = channels[other];
                    if level != UNVISITED && level != IN_PROGRESS {
                        top.lmax = top.lmax.max(level + 1);
                    }
                    top.cursor += 1;
                } else {
                    top.cursor += 1;
                }
            } else {
                let Some(frame) = stack.pop() else {
                    break;
                };
                let channel = if frame.lmin != i64::MAX {
                    frame.lmin
                } else if frame.lmax != i64::MIN {
                    frame.lmax
                } else {
                    0
                };
                channels[frame.id] = channel;
            }
        }
    }

    fn make_io_waypoints(&mut self) {
        let pairs: Vec<IoPair> = self
            .entries
            .iter()
            .chain(self.exits.iter())
            .copied()
            .collect();

        for pair in pairs {
            let Some(&edge) = self.io_edges.get(&pair) else {
                continue;
            };
            self.assemble_waypoints(edge);
            self.io_waypoints.insert(pair, self.waypoints.get(edge).clone());
        }
    }

    fn assemble_split_edges(&mut self) {
        for ix in 0..self.split_edges.len() {
            self.assemble_waypoints(self.split_edges[ix]);
        }
    }

    /// Concatenates a split edge's segment runs back into one polyline,
    /// reversing segments so the sequence always starts at the logical
    /// source.
    fn assemble_waypoints(&mut self, edge: EdgeId) {
        let segments = self.edge_segments.get(edge).clone();
        if segments.is_empty() {
            return;
        }

        let mut points = std::mem::take(self.waypoints.get_mut(edge));
        for segment in segments {
            let (from, to) = self.g.edge_ends(segment);
            let run = self.waypoints.get(segment);
            if self.layers.value(from) < self.layers.value(to) {
                points.extend_from_slice(run);
            } else {
                points.extend(run.iter().rev().copied());
            }
        }
        self.waypoints.set(edge, points);
    }
}
