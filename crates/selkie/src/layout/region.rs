//! Recursive composition of per-region layouts over the program structure
//! tree.
//!
//! Every region gets a subgraph of its member nodes plus one synthetic
//! "region node" per child region. Cross-region edges are rewritten to
//! terminate at the appropriate region node in the closest common ancestor,
//! recording an io-pair at every level they traverse. Regions are laid out
//! bottom-up (children first, their bounding boxes sizing the region nodes),
//! translated top-down, and boundary polylines are stitched through the
//! region walls at the end.

use rustc_hash::FxHashMap;
use selkie_graph::{
    EdgeAttribute, EdgeId, Graph, GraphEdit, GraphRead, NodeAttribute, NodeId, SubGraph,
};

use crate::analysis::sese::Sese;
use crate::error::{Error, Result};
use crate::geom::Point;
use crate::layout::sugiyama::{Sugiyama, SugiyamaInputs, sugiyama};
use crate::layout::{IoPair, Y_GUTTER};
use crate::tree::TreeId;

#[derive(Debug, Default)]
struct RegionData {
    subgraph: SubGraph,
    node_id: Option<NodeId>,
    entries: Vec<IoPair>,
    exits: Vec<IoPair>,
    io_waypoints: FxHashMap<IoPair, Vec<Point>>,
    was_layout: bool,
    width: f64,
    height: f64,
}

/// The finished placement: global coordinates per node, orthogonal
/// polylines per edge.
#[derive(Debug)]
pub struct RegionLayout {
    pub xs: NodeAttribute<f64>,
    pub ys: NodeAttribute<f64>,
    pub widths: NodeAttribute<f64>,
    pub heights: NodeAttribute<f64>,
    pub waypoints: EdgeAttribute<Vec<Point>>,
    pub width: f64,
    pub height: f64,
    pub region_count: usize,
}

impl RegionLayout {
    /// Runs the whole decomposition + layout pipeline on `g`.
    ///
    /// The graph must be free of self-loops (the builder deletes them before
    /// calling in) and fully reachable from its root.
    pub fn build(
        g: &mut Graph,
        widths: &NodeAttribute<f64>,
        heights: &NodeAttribute<f64>,
        seed: u64,
    ) -> Result<RegionLayout> {
        for e in g.edge_ids() {
            let (from, to) = g.edge_ends(e);
            if from == to {
                return Err(Error::Unsupported { edge: e.index() });
            }
        }

        let mut sese = Sese::new(g)?;
        sese.elide_single_node_regions();

        let mut driver = Driver {
            xs: NodeAttribute::new(g.max_node_id(), 0.0),
            ys: NodeAttribute::new(g.max_node_id(), 0.0),
            widths: widths.clone(),
            heights: heights.clone(),
            waypoints: EdgeAttribute::new(g.max_edge_id(), Vec::new()),
            start_x_offsets: EdgeAttribute::new(g.max_edge_id(), -1.0),
            end_x_offsets: EdgeAttribute::new(g.max_edge_id(), -1.0),
            regions: (0..sese.regions.capacity())
                .map(|_| RegionData::default())
                .collect(),
            sese,
            seed,
        };

        g.push();
        let result = driver.run(g);
        g.pop();
        result?;

        driver.stitch_boundaries();
        Ok(driver.finish(g))
    }
}

struct Driver {
    xs: NodeAttribute<f64>,
    ys: NodeAttribute<f64>,
    widths: NodeAttribute<f64>,
    heights: NodeAttribute<f64>,
    waypoints: EdgeAttribute<Vec<Point>>,
    start_x_offsets: EdgeAttribute<f64>,
    end_x_offsets: EdgeAttribute<f64>,
    regions: Vec<RegionData>,
    sese: Sese,
    seed: u64,
}

impl Driver {
    fn run(&mut self, g: &mut Graph) -> Result<()> {
        self.create_region_subgraphs(g);
        self.create_region_nodes(g)?;
        self.rewrite_cross_region_edges(g)?;
        self.set_region_roots(g);

        let Some(root) = self.sese.regions.root() else {
            return Ok(());
        };

        for r in self.sese.regions.post_order(root) {
            self.layout_region(g, r)?;
        }
        self.translate_regions(root);
        Ok(())
    }

    fn create_region_subgraphs(&mut self, g: &Graph) {
        for node in g.node_ids() {
            let r = self.sese.region_of(node);
            self.regions[r.index()].subgraph.select_node(g, node);
        }
    }

    /// One synthetic node per region, selected into the parent's subgraph
    /// to stand in for the region during the parent's layering.
    fn create_region_nodes(&mut self, g: &mut Graph) -> Result<()> {
        let region_ids: Vec<TreeId> = self.sese.regions.ids().collect();

        for &r in &region_ids {
            let node = g.make_node()?;
            self.regions[r.index()].node_id = Some(node);
        }

        for &r in &region_ids {
            let Some(parent) = self.sese.regions.parent(r) else {
                continue;
            };
            let Some(node) = self.regions[r.index()].node_id else {
                continue;
            };
            self.regions[parent.index()].subgraph.select_node(g, node);
        }
        Ok(())
    }

    /// A region's layout is rooted at its entry; the root region keeps the
    /// graph root.
    fn set_region_roots(&mut self, g: &Graph) {
        let region_ids: Vec<TreeId> = self.sese.regions.ids().collect();
        for r in region_ids {
            let root = if self.sese.regions.is_root(r) {
                Some(g.root())
            } else {
                self.sese.regions.get(r).entry_node
            };
            if let Some(root) = root {
                if self.regions[r.index()].subgraph.contains_node(root) {
                    self.regions[r.index()].subgraph.set_root(root);
                }
            }
        }
    }

    /// Reroutes every cross-region edge to region nodes in the closest
    /// common ancestor, recording the io-pair at each traversed level.
    fn rewrite_cross_region_edges(&mut self, g: &mut Graph) -> Result<()> {
        for edge in g.edge_ids() {
            let (from, to) = g.edge_ends(edge);
            let from_region = self.sese.region_of(from);
            let to_region = self.sese.region_of(to);
            if from_region == to_region {
                continue;
            }

            if self.sese.regions.is_descendant(from_region, to_region) {
                // Entry path: descend from the ancestor into to_region.
                let node = self.record_entries(to_region, from_region, to, edge);
                self.edit_in_region(g, from_region, edge, from, node)?;
            } else if self.sese.regions.is_descendant(to_region, from_region) {
                // Exit path.
                let node = self.record_exits(from_region, to_region, from, edge);
                self.edit_in_region(g, to_region, edge, node, to)?;
            } else {
                // Siblings connect through their closest common ancestor.
                let ancestor = self.sese.regions.common_ancestor(from_region, to_region);
                let from_node = self.record_exits(from_region, ancestor, from, edge);
                let to_node = self.record_entries(to_region, ancestor, to, edge);
                self.edit_in_region(g, ancestor, edge, from_node, to_node)?;
            }
        }
        Ok(())
    }

    /// Walks from `region` up to (exclusive) `ancestor`, recording an entry
    /// io-pair per level; returns the node standing in for the edge target
    /// at the ancestor level.
    fn record_entries(
        &mut self,
        region: TreeId,
        ancestor: TreeId,
        target: NodeId,
        edge: EdgeId,
    ) -> NodeId {
        let mut node = target;
        let mut cursor = region;
        while cursor != ancestor {
            self.regions[cursor.index()]
                .entries
                .push(IoPair { node, edge });
            node = self.regions[cursor.index()]
                .node_id
                .unwrap_or(node);
            let Some(parent) = self.sese.regions.parent(cursor) else {
                break;
            };
            cursor = parent;
        }
        node
    }

    fn record_exits(
        &mut self,
        region: TreeId,
        ancestor: TreeId,
        source: NodeId,
        edge: EdgeId,
    ) -> NodeId {
        let mut node = source;
        let mut cursor = region;
        while cursor != ancestor {
            self.regions[cursor.index()]
                .exits
                .push(IoPair { node, edge });
            node = self.regions[cursor.index()]
                .node_id
                .unwrap_or(node);
            let Some(parent) = self.sese.regions.parent(cursor) else {
                break;
            };
            cursor = parent;
        }
        node
    }

    fn edit_in_region(
        &mut self,
        g: &mut Graph,
        region: TreeId,
        edge: EdgeId,
        from: NodeId,
        to: NodeId,
    ) -> Result<()> {
        let mut view = self.regions[region.index()].subgraph.as_mut(g);
        view.edit_edge(edge, from, to)?;
        Ok(())
    }

    fn layout_region(&mut self, g: &mut Graph, r: TreeId) -> Result<()> {
        if self.regions[r.index()].was_layout {
            return Ok(());
        }
        self.regions[r.index()].was_layout = true;

        // Children ran first; their bounding boxes size the region nodes.
        for &child in self.sese.regions.children(r) {
            let data = &self.regions[child.index()];
            debug_assert!(data.was_layout);
            if let Some(node) = data.node_id {
                self.widths.set(node, data.width);
                self.heights.set(node, data.height);
            }
        }

        let entries = self.regions[r.index()].entries.clone();
        let exits = self.regions[r.index()].exits.clone();

        let result = {
            let inputs = SugiyamaInputs {
                widths: self.widths.clone(),
                heights: self.heights.clone(),
                start_x_offsets: &mut self.start_x_offsets,
                end_x_offsets: &mut self.end_x_offsets,
                entries: &entries,
                exits: &exits,
                seed: self.seed,
            };
            let mut view = self.regions[r.index()].subgraph.as_mut(g);
            sugiyama(&mut view, inputs)?
        };

        self.absorb_region_layout(r, result);
        Ok(())
    }

    fn absorb_region_layout(&mut self, r: TreeId, result: Sugiyama) {
        let data = &mut self.regions[r.index()];

        for &node in data.subgraph.selected_nodes() {
            self.xs.set(node, result.xs.value(node));
            self.ys.set(node, result.ys.value(node));
        }
        for &edge in data.subgraph.selected_edges() {
            self.waypoints.set(edge, result.waypoints.get(edge).clone());
        }

        data.width = result.width;
        data.height = result.height;
        data.io_waypoints = result.io_waypoints;

        for pair in &data.entries {
            if let Some(first) = data.io_waypoints.get(pair).and_then(|w| w.first()) {
                self.end_x_offsets.set(pair.edge, first.x);
            }
        }
        for pair in &data.exits {
            if let Some(last) = data.io_waypoints.get(pair).and_then(|w| w.last()) {
                self.start_x_offsets.set(pair.edge, last.x);
            }
        }

        if let Some(node) = data.node_id {
            self.widths.set(node, data.width);
            self.heights.set(node, data.height);
        }

        tracing::debug!(
            region = r.index(),
            width = data.width,
            height = data.height,
            "region laid out"
        );

        if result.had_top_channel {
            self.translate_region_by(r, Point::new(0.0, -2.0 * Y_GUTTER));
        }
    }

    fn translate_region_by(&mut self, r: TreeId, v: Point) {
        let data = &mut self.regions[r.index()];

        for &node in data.subgraph.selected_nodes() {
            let x = self.xs.value(node);
            let y = self.ys.value(node);
            self.xs.set(node, x + v.x);
            self.ys.set(node, y + v.y);
        }

        for &edge in data.subgraph.selected_edges() {
            for point in self.waypoints.get_mut(edge) {
                *point += v;
            }
        }

        for points in data.io_waypoints.values_mut() {
            for point in points {
                *point += v;
            }
        }
    }

    /// Top-down: every region moves to its region node's position in the
    /// parent, children after their parents.
    fn translate_regions(&mut self, root: TreeId) {
        let mut stack = vec![root];
        while let Some(r) = stack.pop() {
            if !self.sese.regions.is_root(r) {
                if let Some(node) = self.regions[r.index()].node_id {
                    let v = Point::new(self.xs.value(node), self.ys.value(node));
                    self.translate_region_by(r, v);
                }
            }
            stack.extend(self.sese.regions.children(r).iter().copied());
        }
    }

    /// Splices each region's io-waypoint runs into the crossing edges'
    /// polylines so they pass continuously through region boundaries.
    /// Parents come first so inner runs land inside outer ones.
    fn stitch_boundaries(&mut self) {
        let region_ids: Vec<TreeId> = self.sese.regions.ids().collect();

        for r in region_ids {
            let data = &mut self.regions[r.index()];

            for pair in &data.exits {
                let Some(exit_run) = data.io_waypoints.get_mut(pair) else {
                    continue;
                };
                let points = self.waypoints.get_mut(pair.edge);
                if exit_run.is_empty() || points.is_empty() {
                    continue;
                }

                points.remove(0);
                if let (Some(first), Some(&last)) = (points.first_mut(), exit_run.last()) {
                    first.x = last.x;
                }
                exit_run.pop();
                points.splice(0..0, exit_run.iter().copied());
            }

            for pair in &data.entries {
                let Some(entry_run) = data.io_waypoints.get_mut(pair) else {
                    continue;
                };
                let points = self.waypoints.get_mut(pair.edge);
                if entry_run.is_empty() || points.is_empty() {
                    continue;
                }

                points.pop();
                if let (Some(last), Some(&first)) = (points.last_mut(), entry_run.first()) {
                    last.x = first.x;
                }
                entry_run.remove(0);
                points.extend(entry_run.iter().copied());
            }
        }
    }

    /// Shifts everything into the positive quadrant and computes the final
    /// bounding box.
    fn finish(mut self, g: &Graph) -> RegionLayout {
        let mut min_x = 0.0f64;
        let mut min_y = 0.0f64;
        for node in g.node_ids() {
            min_x = min_x.min(self.xs.value(node));
            min_y = min_y.min(self.ys.value(node));
        }
        for edge in g.edge_ids() {
            for point in self.waypoints.get(edge) {
                min_x = min_x.min(point.x);
                min_y = min_y.min(point.y);
            }
        }

        let shift = Point::new(-min_x, -min_y);
        if shift.x != 0.0 || shift.y != 0.0 {
            for node in g.node_ids() {
                let x = self.xs.value(node);
                let y = self.ys.value(node);
                self.xs.set(node, x + shift.x);
                self.ys.set(node, y + shift.y);
            }
            for edge in g.edge_ids() {
                for point in self.waypoints.get_mut(edge) {
                    *point += shift;
                }
            }
        }

        let mut width = 0.0f64;
        let mut height = 0.0f64;
        for node in g.node_ids() {
            width = width.max(self.xs.value(node) + self.widths.value(node));
            height = height.max(self.ys.value(node) + self.heights.value(node));
        }
        for edge in g.edge_ids() {
            for point in self.waypoints.get(edge) {
                width = width.max(point.x);
                height = height.max(point.y);
            }
        }

        let root = self.sese.regions.root();
        let root_data = root.map(|r| &self.regions[r.index()]);
        width = width.max(root_data.map_or(0.0, |d| d.width));
        height = height.max(root_data.map_or(0.0, |d| d.height));

        RegionLayout {
            xs: self.xs,
            ys: self.ys,
            widths: self.widths,
            heights: self.heights,
            waypoints: self.waypoints,
            width,
            height,
            region_count: self.sese.regions.len(),
        }
    }
}
