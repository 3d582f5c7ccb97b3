//! Single-entry/single-exit region analysis.
//!
//! Cycle-equivalence classes over the undirected graph (Johnson, Pearson &
//! Pingali) followed by a directed walk that pairs region entries with exits
//! and builds the program structure tree. The graph is preprocessed inside an
//! edit frame (a synthetic exit node, edges from childless nodes to it and a
//! back edge to the root) and the frame is popped before region extraction,
//! so callers never observe the synthetic structure.

use selkie_graph::{EdgeAttribute, EdgeId, Graph, GraphEdit, GraphRead, NodeAttribute, NodeId};

use crate::analysis::dfs::Dfs;
use crate::analysis::udfs::UnorderedDfs;
use crate::error::{Error, Result};
use crate::tree::{Tree, TreeId};

/// One region of the program structure tree.
#[derive(Debug, Default, Clone)]
pub struct Region {
    pub entry_edge: Option<EdgeId>,
    pub entry_node: Option<NodeId>,
    pub exit_edge: Option<EdgeId>,
    pub exit_node: Option<NodeId>,
    /// Member graph nodes, in discovery order; the entry node comes first.
    pub nodes: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Sese {
    /// The program structure tree.
    pub regions: Tree<Region>,
    node_region: NodeAttribute<Option<TreeId>>,
    classes: EdgeAttribute<usize>,
    entry_edges: EdgeAttribute<bool>,
    exit_edges: EdgeAttribute<bool>,
}

/// An open region on the boundary-determination path.
#[derive(Debug, Clone, Copy)]
struct OpenClass {
    edge: EdgeId,
    class: usize,
}

impl Sese {
    pub fn new(g: &mut Graph) -> Result<Self> {
        let reachable = Dfs::new(&*g).order().len();
        if reachable < g.node_count() {
            return Err(Error::DegenerateInput {
                unreachable: g.node_count() - reachable,
            });
        }

        let mut sese = Self {
            regions: Tree::new(),
            node_region: NodeAttribute::new(g.max_node_id(), None),
            classes: EdgeAttribute::new(g.max_edge_id(), 0),
            entry_edges: EdgeAttribute::new(g.max_edge_id(), false),
            exit_edges: EdgeAttribute::new(g.max_edge_id(), false),
        };

        g.push();
        preprocess(g)?;
        sese.cycle_equivalence(g)?;
        g.pop();

        sese.determine_region_boundaries(g);
        sese.construct_program_structure_tree(g);

        tracing::debug!(
            regions = sese.regions.len(),
            "program structure tree built"
        );
        Ok(sese)
    }

    /// The region a node belongs to.
    pub fn region_of(&self, n: NodeId) -> TreeId {
        self.node_region
            .value(n)
            .unwrap_or_else(|| self.regions.root().expect("tree has a root"))
    }

    pub fn is_entry_edge(&self, e: EdgeId) -> bool {
        self.entry_edges.value(e)
    }

    pub fn is_exit_edge(&self, e: EdgeId) -> bool {
        self.exit_edges.value(e)
    }

    /// Cycle-equivalence class of an edge (0 = unclassified).
    pub fn edge_class(&self, e: EdgeId) -> usize {
        self.classes.value(e)
    }

    /// Merges single-node childless regions into their parents; such regions
    /// contribute no layout structure. Their tree slots are tombstoned.
    pub fn elide_single_node_regions(&mut self) {
        let elidable: Vec<TreeId> = self
            .regions
            .ids()
            .filter(|&r| {
                !self.regions.is_root(r)
                    && self.regions.children(r).is_empty()
                    && self.regions.get(r).nodes.len() == 1
            })
            .collect();

        for r in elidable {
            let Some(parent) = self.regions.parent(r) else {
                continue;
            };
            let node = self.regions.get(r).nodes[0];
            self.regions.get_mut(parent).nodes.push(node);
            self.node_region.set(node, Some(parent));
            self.regions.remove_leaf(r);
        }
    }

    fn cycle_equivalence(&mut self, g: &mut Graph) -> Result<()> {
        let mut udfs = UnorderedDfs::new(&*g);

        let mut his: NodeAttribute<usize> = NodeAttribute::new(g.max_node_id(), usize::MAX);
        let mut blists: NodeAttribute<Vec<EdgeId>> =
            NodeAttribute::new(g.max_node_id(), Vec::new());
        let mut recent_sizes: EdgeAttribute<usize> = EdgeAttribute::new(g.max_edge_id(), 0);
        let mut recent_classes: EdgeAttribute<usize> = EdgeAttribute::new(g.max_edge_id(), 0);
        let mut capping: Vec<EdgeId> = Vec::new();
        let mut next_class = 0usize;
        let mut new_class = move || {
            next_class += 1;
            next_class
        };

        let order = udfs.order().to_vec();
        for &n in order.iter().rev() {
            // A back edge "starts from" its lower endpoint; self-loops take
            // no part in bracket bookkeeping.
            let is_back_from = |udfs: &UnorderedDfs, e: EdgeId, from: NodeId, to: NodeId| {
                from != to && udfs.is_back(e) && udfs.family().succeeds(from, to)
            };

            let incident = g.node_edges(n);

            let mut hi0 = usize::MAX;
            for &e in &incident {
                let t = g.edge_other(e, n);
                if is_back_from(&udfs, e, n, t) {
                    hi0 = hi0.min(udfs.number(t));
                }
            }

            let mut hi1 = usize::MAX;
            for &e in &incident {
                let child = g.edge_other(e, n);
                if !udfs.family().parents(child).is_empty() && udfs.parent(child) == n {
                    hi1 = hi1.min(his.value(child));
                }
            }

            his.set(n, hi0.min(hi1));

            // The lowest hi among children other than the one achieving hi1.
            let mut hi2 = usize::MAX;
            let mut skipped_one = false;
            for &e in &incident {
                let child = g.edge_other(e, n);
                if !udfs.family().parents(child).is_empty() && udfs.parent(child) == n {
                    let hi = his.value(child);
                    if !skipped_one && hi == hi1 {
                        skipped_one = true;
                    } else {
                        hi2 = hi2.min(hi);
                    }
                }
            }

            let mut blist = std::mem::take(blists.get_mut(n));
            let children: Vec<NodeId> = udfs.family().children(n).to_vec();
            for child in children {
                let mut child_list = std::mem::take(blists.get_mut(child));
                blist.append(&mut child_list);
            }

            // Capping brackets terminating at n are spent.
            for &d in &capping {
                if g.edge_to(d) == n {
                    blist.retain(|&b| b != d);
                }
            }

            for &e in &incident {
                let t = g.edge_other(e, n);
                if is_back_from(&udfs, e, t, n) {
                    blist.retain(|&b| b != e);
                    if self.classes.value(e) == 0 {
                        self.classes.set(e, new_class());
                    }
                }
            }

            for &e in &incident {
                let t = g.edge_other(e, n);
                if is_back_from(&udfs, e, n, t) {
                    blist.push(e);
                }
            }

            if hi2 < hi0 {
                let target = order[hi2];
                let d = g.make_edge(n, target)?;
                udfs.set_back(d);
                capping.push(d);
                blist.push(d);
            }

            if n != g.root() {
                let parent = udfs.parent(n);
                let tree_edge = incident.iter().copied().find(|&e| {
                    udfs.is_tree(e) && g.edge_other(e, n) == parent
                });
                let Some(tree_edge) = tree_edge else {
                    debug_assert!(false, "non-root node {n} has no tree edge to its parent");
                    continue;
                };

                match blist.last().copied() {
                    Some(top) => {
                        if recent_sizes.value(top) != blist.len() {
                            recent_sizes.set(top, blist.len());
                            recent_classes.set(top, new_class());
                        }
                        let class = recent_classes.value(top);
                        self.classes.set(tree_edge, class);
                        if blist.len() == 1 {
                            self.classes.set(top, class);
                        }
                    }
                    None => {
                        self.classes.set(tree_edge, new_class());
                    }
                }
            }

            blists.set(n, blist);
        }

        Ok(())
    }

    /// Walks tree edges carrying the stack of open classes; an edge whose
    /// class matches an open region closes it, marking the pair.
    fn determine_region_boundaries(&mut self, g: &Graph) {
        struct Frame {
            edges: Vec<EdgeId>,
            cursor: usize,
            open: Vec<OpenClass>,
        }

        let mut visited: NodeAttribute<bool> = NodeAttribute::new(g.max_node_id(), false);
        let root = g.root();
        visited.set(root, true);

        let mut stack = vec![Frame {
            edges: g.child_edges(root),
            cursor: 0,
            open: Vec::new(),
        }];

        while let Some(top) = stack.last_mut() {
            let Some(&edge) = top.edges.get(top.cursor) else {
                stack.pop();
                continue;
            };
            top.cursor += 1;

            let child = g.edge_to(edge);
            let class = self.classes.value(edge);
            let mut open = top.open.clone();

            if let Some(found) = open.iter().rposition(|oc| oc.class == class) {
                self.exit_edges.set(edge, true);
                self.entry_edges.set(open[found].edge, true);
                open.truncate(found);
            }

            if !visited.value(child) {
                visited.set(child, true);
                open.push(OpenClass { edge, class });
                stack.push(Frame {
                    edges: g.child_edges(child),
                    cursor: 0,
                    open,
                });
            }
        }
    }

    fn construct_program_structure_tree(&mut self, g: &Graph) {
        struct Frame {
            node: NodeId,
            edges: Vec<EdgeId>,
            cursor: usize,
        }

        fn enter(
            sese: &mut Sese,
            g: &Graph,
            visited: &mut NodeAttribute<bool>,
            stack: &mut Vec<Frame>,
            node: NodeId,
            region: TreeId,
        ) {
            visited.set(node, true);
            sese.node_region.set(node, Some(region));
            sese.regions.get_mut(region).nodes.push(node);
            stack.push(Frame {
                node,
                edges: g.child_edges(node),
                cursor: 0,
            });
        }

        let root_region = self.regions.make_node(Region::default());
        self.regions.set_root(root_region);

        let mut visited: NodeAttribute<bool> = NodeAttribute::new(g.max_node_id(), false);
        let root = g.root();

        let mut stack: Vec<Frame> = Vec::new();
        enter(self, g, &mut visited, &mut stack, root, root_region);

        while let Some(top) = stack.last_mut() {
            let Some(&edge) = top.edges.get(top.cursor) else {
                stack.pop();
                continue;
            };
            top.cursor += 1;
            let node = top.node;

            let child = g.edge_to(edge);
            let region = self.region_of(node);
            let mut current = region;

            if self.exit_edges.value(edge) {
                self.regions.get_mut(region).exit_edge = Some(edge);
                self.regions.get_mut(region).exit_node = Some(g.edge_from(edge));
                current = self.regions.parent(region).unwrap_or(region);
            }

            if self.entry_edges.value(edge) {
                let opened = self.regions.make_node(Region {
                    entry_edge: Some(edge),
                    entry_node: Some(g.edge_to(edge)),
                    ..Region::default()
                });
                self.regions.add_child(current, opened);
                current = opened;
            }

            if !visited.value(child) {
                enter(self, g, &mut visited, &mut stack, child, current);
            }
        }
    }
}

/// Adds a synthetic exit node, links every childless node to it and closes
/// the loop back to the root.
fn preprocess(g: &mut Graph) -> Result<()> {
    let nodes = g.node_ids();
    let exit = g.make_node()?;

    for node in nodes {
        if g.child_edges(node).is_empty() {
            g.make_edge(node, exit)?;
        }
    }

    g.make_edge(exit, g.root())?;
    Ok(())
}
