use selkie::analysis::sese::Sese;
use selkie::graph::{EdgeId, Graph, GraphEdit, GraphRead, NodeId};

fn diamond(g: &mut Graph, top: NodeId) -> (NodeId, Vec<EdgeId>) {
    let b = g.make_node().unwrap();
    let c = g.make_node().unwrap();
    let d = g.make_node().unwrap();
    let edges = vec![
        g.make_edge(top, b).unwrap(),
        g.make_edge(top, c).unwrap(),
        g.make_edge(b, d).unwrap(),
        g.make_edge(c, d).unwrap(),
    ];
    (d, edges)
}

/// Three diamonds in series, connected by single edges.
fn diamond_chain() -> (Graph, Vec<NodeId>, Vec<EdgeId>) {
    let mut g = Graph::new();
    g.push();

    let a1 = g.make_node().unwrap();
    let (d1, _) = diamond(&mut g, a1);
    let a2 = g.make_node().unwrap();
    let link1 = g.make_edge(d1, a2).unwrap();
    let (d2, _) = diamond(&mut g, a2);
    let a3 = g.make_node().unwrap();
    let link2 = g.make_edge(d2, a3).unwrap();
    let (d3, _) = diamond(&mut g, a3);

    g.commit();
    (g, vec![a1, d1, a2, d2, a3, d3], vec![link1, link2])
}

#[test]
fn single_diamond_collapses_to_one_region() {
    let mut g = Graph::new();
    g.push();
    let a = g.make_node().unwrap();
    let (_, _) = diamond(&mut g, a);
    g.commit();

    let mut sese = Sese::new(&mut g).unwrap();
    sese.elide_single_node_regions();

    assert_eq!(sese.regions.len(), 1);
    let root = sese.regions.root().unwrap();
    assert_eq!(sese.regions.get(root).nodes.len(), 4);
}

#[test]
fn diamond_chain_has_a_nested_region() {
    let (mut g, nodes, links) = diamond_chain();
    let mut sese = Sese::new(&mut g).unwrap();
    sese.elide_single_node_regions();

    // The middle diamond is bounded by the two links and becomes a child
    // region. The last diamond's only would-be exit is the synthetic edge
    // to the preprocessing sink, so it stays in the root region alongside
    // the first.
    assert_eq!(sese.regions.len(), 2);

    let root = sese.regions.root().unwrap();
    assert_eq!(sese.regions.children(root).len(), 1);

    let middle = sese.region_of(nodes[2]);
    assert_ne!(middle, root);
    assert_eq!(sese.regions.get(middle).entry_edge, Some(links[0]));
    assert_eq!(sese.regions.get(middle).exit_edge, Some(links[1]));
    assert_eq!(sese.regions.get(middle).entry_node, Some(nodes[2]));
    assert_eq!(sese.regions.get(middle).exit_node, Some(nodes[3]));
    assert_eq!(sese.regions.get(middle).nodes.len(), 4);

    assert_eq!(sese.region_of(nodes[4]), root);
    assert_eq!(sese.regions.get(root).nodes.len(), 8);
}

#[test]
fn every_boundary_crossing_uses_the_entry_or_exit_edge() {
    let (mut g, _, _) = diamond_chain();
    let sese = {
        let mut sese = Sese::new(&mut g).unwrap();
        sese.elide_single_node_regions();
        sese
    };

    for r in sese.regions.ids() {
        if sese.regions.is_root(r) {
            continue;
        }
        let region = sese.regions.get(r);

        for e in g.edge_ids() {
            let (from, to) = g.edge_ends(e);
            let from_inside = sese.regions.is_descendant(r, sese.region_of(from));
            let to_inside = sese.regions.is_descendant(r, sese.region_of(to));

            if !from_inside && to_inside {
                assert_eq!(Some(e), region.entry_edge, "stray edge into region");
            }
            if from_inside && !to_inside {
                assert_eq!(Some(e), region.exit_edge, "stray edge out of region");
            }
        }
    }
}

#[test]
fn nodes_belong_to_exactly_one_region() {
    let (mut g, _, _) = diamond_chain();
    let mut sese = Sese::new(&mut g).unwrap();
    sese.elide_single_node_regions();

    let mut total = 0;
    for r in sese.regions.ids() {
        total += sese.regions.get(r).nodes.len();
        for &node in &sese.regions.get(r).nodes {
            assert_eq!(sese.region_of(node), r);
        }
    }
    assert_eq!(total, g.node_count());
}

#[test]
fn unreachable_nodes_are_rejected() {
    let mut g = Graph::new();
    g.push();
    let a = g.make_node().unwrap();
    let b = g.make_node().unwrap();
    g.make_edge(a, b).unwrap();
    g.make_node().unwrap(); // island
    g.commit();

    let err = Sese::new(&mut g).unwrap_err();
    assert_eq!(err, selkie::Error::DegenerateInput { unreachable: 1 });
}

#[test]
fn analysis_leaves_the_graph_untouched() {
    let (mut g, _, _) = diamond_chain();
    let nodes_before = g.node_ids();
    let edges_before = g.edge_ids();

    let _ = Sese::new(&mut g).unwrap();

    assert_eq!(g.node_ids(), nodes_before);
    assert_eq!(g.edge_ids(), edges_before);
    assert!(!g.has_open_frame());
}
