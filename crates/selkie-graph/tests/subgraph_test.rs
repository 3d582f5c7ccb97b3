use selkie_graph::{EdgeId, Graph, GraphEdit, GraphRead, NodeId, SubGraph};

fn graph1() -> (Graph, Vec<NodeId>, Vec<EdgeId>) {
    let mut g = Graph::new();
    g.push();

    let n: Vec<NodeId> = (0..8).map(|_| g.make_node().unwrap()).collect();

    let edges = [
        (0, 1),
        (0, 4),
        (0, 7),
        (1, 2),
        (2, 3),
        (3, 1),
        (4, 5),
        (5, 2),
        (5, 6),
        (5, 7),
    ];
    let e: Vec<EdgeId> = edges
        .iter()
        .map(|&(a, b)| g.make_edge(n[a], n[b]).unwrap())
        .collect();

    g.commit();
    (g, n, e)
}

#[test]
fn selecting_a_node() {
    let (g, n, _) = graph1();
    let mut sub = SubGraph::new();

    sub.select_node(&g, n[0]);

    let view = sub.as_ref(&g);
    assert_eq!(view.node_count(), 1);
    assert!(view.has_node(n[0]));
    assert_eq!(view.edge_count(), 0);
}

#[test]
fn selecting_both_endpoints_pulls_the_edge_in() {
    let (g, n, e) = graph1();
    let mut sub = SubGraph::new();

    sub.select_node(&g, n[0]);
    sub.select_node(&g, n[1]);

    let view = sub.as_ref(&g);
    assert_eq!(view.edge_count(), 1);
    assert!(view.has_edge(e[0]));
}

#[test]
fn select_is_idempotent_and_unselect_reverses_it() {
    let (g, n, _) = graph1();
    let mut sub = SubGraph::new();

    sub.select_node(&g, n[1]);
    sub.select_node(&g, n[2]);
    sub.select_node(&g, n[2]);
    assert_eq!(sub.as_ref(&g).node_count(), 2);

    sub.unselect_node(&g, n[2]);
    let view = sub.as_ref(&g);
    assert_eq!(view.node_count(), 1);
    assert_eq!(view.edge_count(), 0);
}

#[test]
fn node_edges_are_filtered_to_the_selection() {
    let (g, n, e) = graph1();
    let mut sub = SubGraph::new();

    sub.select_node(&g, n[5]);
    sub.select_node(&g, n[6]);

    let view = sub.as_ref(&g);
    // n5 has four incident edges in the parent; only 5 -> 6 is selected.
    assert_eq!(view.node_edges(n[5]), vec![e[8]]);
    assert_eq!(view.child_nodes(n[5]), vec![n[6]]);
}

#[test]
fn added_node_disappears_on_pop() {
    let (mut g, n, _) = graph1();
    let mut sub = SubGraph::new();
    sub.select_node(&g, n[0]);

    let mut view = sub.as_mut(&mut g);
    view.push();
    let added = view.make_node().unwrap();
    assert_eq!(view.node_count(), 2);

    view.pop();
    assert_eq!(view.node_count(), 1);
    assert!(!view.has_node(added));
    assert!(!view.node_ids().contains(&added));
}

#[test]
fn remove_node_prunes_selected_edges_and_pop_restores() {
    let (mut g, n, e) = graph1();
    let mut sub = SubGraph::new();
    sub.select_node(&g, n[1]);
    sub.select_node(&g, n[2]);

    let mut view = sub.as_mut(&mut g);
    let before = view.node_count();

    view.push();
    view.remove_node(n[2]).unwrap();

    assert_eq!(view.node_count(), before - 1);
    assert!(!view.has_edge(e[3]));
    assert!(!view.node_ids().contains(&n[2]));

    view.pop();
    assert_eq!(view.node_count(), before);
    assert!(view.has_edge(e[3]));
}

#[test]
fn added_edge_disappears_on_pop() {
    let (mut g, n, _) = graph1();
    let mut sub = SubGraph::new();
    sub.select_node(&g, n[0]);
    sub.select_node(&g, n[4]);

    let mut view = sub.as_mut(&mut g);
    view.push();
    let before = view.edge_count();
    let added = view.make_edge(n[0], n[4]).unwrap();

    assert_eq!(view.edge_count(), before + 1);
    assert!(view.node_edges(n[0]).contains(&added));

    view.pop();
    assert_eq!(view.edge_count(), before);
    assert!(!view.has_edge(added));
}

#[test]
fn edit_edge_keeps_the_selection_coherent() {
    let (mut g, n, e) = graph1();
    let mut sub = SubGraph::new();
    for &ix in &[0, 2, 3, 4] {
        sub.select_node(&g, n[ix]);
    }

    let mut view = sub.as_mut(&mut g);
    view.push();
    view.edit_edge(e[4], n[0], n[4]).unwrap();

    assert_eq!(view.edge_ends(e[4]), (n[0], n[4]));
    assert!(view.node_edges(n[0]).contains(&e[4]));
    assert!(!view.node_edges(n[3]).contains(&e[4]));

    view.pop();
    assert_eq!(view.edge_ends(e[4]), (n[2], n[3]));
    assert!(view.node_edges(n[2]).contains(&e[4]));
    assert!(view.node_edges(n[3]).contains(&e[4]));
}

#[test]
fn edit_edge_out_of_the_selection_drops_the_edge() {
    let (mut g, n, e) = graph1();
    let mut sub = SubGraph::new();
    sub.select_node(&g, n[2]);
    sub.select_node(&g, n[3]);
    assert!(sub.contains_edge(e[4]));

    let mut view = sub.as_mut(&mut g);
    view.push();
    view.edit_edge(e[4], n[2], n[6]).unwrap();
    assert!(!view.has_edge(e[4]));
    view.pop();
}

#[test]
fn subgraph_root_defaults_to_first_selected_node() {
    let (mut g, n, _) = graph1();
    let mut sub = SubGraph::new();
    sub.select_node(&g, n[5]);
    sub.select_node(&g, n[2]);
    assert_eq!(sub.as_ref(&g).root(), n[2]);

    sub.set_root(n[5]);
    assert_eq!(sub.as_ref(&g).root(), n[5]);

    // A removed root is forgotten.
    let mut view = sub.as_mut(&mut g);
    view.push();
    view.remove_node(n[5]).unwrap();
    view.commit();
    assert_eq!(sub.as_ref(&g).root(), n[2]);
}
