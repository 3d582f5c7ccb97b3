use selkie_graph::{EdgeAttribute, Graph, GraphEdit, GraphRead, NodeAttribute, NodeId};

#[test]
fn reads_past_the_backing_yield_the_default() {
    let attr: NodeAttribute<i32> = NodeAttribute::new(2, 7);
    assert_eq!(attr.value(NodeId::from_index(0)), 7);
    assert_eq!(attr.value(NodeId::from_index(100)), 7);
    assert_eq!(attr.len(), 2);
}

#[test]
fn writes_grow_the_backing() {
    let mut attr: NodeAttribute<&str> = NodeAttribute::new(0, "");
    attr.set(NodeId::from_index(5), "five");

    assert_eq!(attr.len(), 6);
    assert_eq!(*attr.get(NodeId::from_index(5)), "five");
    assert_eq!(*attr.get(NodeId::from_index(3)), "");
}

#[test]
fn get_mut_grows_and_defaults() {
    let mut attr: NodeAttribute<Vec<u32>> = NodeAttribute::new(0, Vec::new());
    attr.get_mut(NodeId::from_index(2)).push(9);

    assert_eq!(attr.get(NodeId::from_index(2)).as_slice(), &[9]);
    assert!(attr.get(NodeId::from_index(1)).is_empty());
}

#[test]
fn attributes_track_graph_growth() {
    let mut g = Graph::new();
    g.push();
    let a = g.make_node().unwrap();
    g.commit();

    let mut labels: NodeAttribute<String> = NodeAttribute::new(g.max_node_id(), String::new());
    labels.set(a, "entry".into());

    g.push();
    let b = g.make_node().unwrap();
    let e = g.make_edge(a, b).unwrap();
    g.commit();

    // New ids read as default until written.
    assert_eq!(labels.get(b), "");
    labels.set(b, "exit".into());
    assert_eq!(labels.get(b), "exit");

    let mut weights: EdgeAttribute<f64> = EdgeAttribute::new(g.max_edge_id(), 1.0);
    assert_eq!(weights.value(e), 1.0);
    weights.set(e, 0.5);
    assert_eq!(weights.value(e), 0.5);
}
