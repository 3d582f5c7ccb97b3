use selkie::{CfgLayout, EdgeKind, Error, LayoutBuilder, NodeId, Point};

fn assert_well_formed(layout: &CfgLayout, nodes: &[NodeId]) {
    let width = layout.get_width();
    let height = layout.get_height();

    // Placement stays inside the graph's bounding box.
    for &node in nodes {
        let tl = layout.get_coords(node).unwrap();
        let size = layout.get_size(node).unwrap();
        assert!(tl.x >= 0.0 && tl.y >= 0.0, "node {node} at {tl:?}");
        assert!(
            tl.x + size.x <= width + 1e-6,
            "node {node} sticks out right: {} > {width}",
            tl.x + size.x
        );
        assert!(
            tl.y + size.y <= height + 1e-6,
            "node {node} sticks out below: {} > {height}",
            tl.y + size.y
        );
    }

    // No two node interiors intersect.
    for (ix, &a) in nodes.iter().enumerate() {
        for &b in &nodes[ix + 1..] {
            let pa = layout.get_coords(a).unwrap();
            let sa = layout.get_size(a).unwrap();
            let pb = layout.get_coords(b).unwrap();
            let sb = layout.get_size(b).unwrap();

            let disjoint = pa.x + sa.x <= pb.x + 1e-6
                || pb.x + sb.x <= pa.x + 1e-6
                || pa.y + sa.y <= pb.y + 1e-6
                || pb.y + sb.y <= pa.y + 1e-6;
            assert!(disjoint, "nodes {a} and {b} overlap");
        }
    }
}

fn assert_orthogonal(points: &[Point]) {
    assert!(points.len() >= 4, "expected at least 4 waypoints");
    for pair in points.windows(2) {
        let dx = (pair[0].x - pair[1].x).abs();
        let dy = (pair[0].y - pair[1].y).abs();
        assert!(
            dx < 1e-6 || dy < 1e-6,
            "diagonal segment {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
}

fn assert_touches(
    layout: &CfgLayout,
    points: &[Point],
    from: NodeId,
    to: NodeId,
) {
    let from_tl = layout.get_coords(from).unwrap();
    let from_size = layout.get_size(from).unwrap();
    let to_tl = layout.get_coords(to).unwrap();
    let to_size = layout.get_size(to).unwrap();

    let first = points[0];
    assert!(
        (first.y - (from_tl.y + from_size.y)).abs() < 1e-6,
        "polyline must start on the source's bottom boundary"
    );
    assert!(
        first.x >= from_tl.x - 1e-6 && first.x <= from_tl.x + from_size.x + 1e-6,
        "polyline start is outside the source's width"
    );

    let last = points[points.len() - 1];
    assert!(
        (last.y - to_tl.y).abs() < 1e-6,
        "polyline must end on the target's top boundary"
    );
    assert!(
        last.x >= to_tl.x - 1e-6 && last.x <= to_tl.x + to_size.x + 1e-6,
        "polyline end is outside the target's width"
    );
}

#[test]
fn diamond_layout() {
    let mut builder = LayoutBuilder::new();
    let a = builder.make_node_with_size(100.0, 100.0);
    let b = builder.make_node_with_size(100.0, 100.0);
    let c = builder.make_node_with_size(100.0, 100.0);
    let d = builder.make_node_with_size(100.0, 100.0);
    let edges = [
        builder.make_edge(a, b).unwrap(),
        builder.make_edge(a, c).unwrap(),
        builder.make_edge(b, d).unwrap(),
        builder.make_edge(c, d).unwrap(),
    ];

    let layout = builder.build().unwrap();
    assert_eq!(layout.node_count(), 4);
    assert_eq!(layout.edge_count(), 4);

    // Three layers: a on top, b and c side by side, d at the bottom.
    let ya = layout.get_coords(a).unwrap().y;
    let yb = layout.get_coords(b).unwrap().y;
    let yc = layout.get_coords(c).unwrap().y;
    let yd = layout.get_coords(d).unwrap().y;
    assert!(ya < yb);
    assert_eq!(yb, yc);
    assert!(yc < yd);

    // Single-layer spans keep their four control points.
    for edge in edges {
        let points = layout.get_waypoints(edge).unwrap();
        assert_eq!(points.len(), 4);
        assert_orthogonal(points);
    }

    assert_touches(&layout, layout.get_waypoints(edges[0]).unwrap(), a, b);
    assert_touches(&layout, layout.get_waypoints(edges[3]).unwrap(), c, d);
    assert_well_formed(&layout, &[a, b, c, d]);
}

#[test]
fn self_loop_is_normalised_away() {
    let mut builder = LayoutBuilder::new();
    let a = builder.make_node_with_size(100.0, 100.0);
    let looping = builder.make_edge(a, a).unwrap();

    let layout = builder.build().unwrap();
    assert_eq!(layout.node_count(), 1);
    assert_eq!(layout.edge_count(), 0);
    assert!(layout.get_coords(a).is_ok());
    assert!(matches!(
        layout.get_waypoints(looping),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn wikipedia_dfs_graph_routes_orthogonally() {
    let mut builder = LayoutBuilder::new();
    let n: Vec<NodeId> = (0..8)
        .map(|_| builder.make_node_with_size(80.0, 40.0))
        .collect();

    let pairs = [
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
    let edges: Vec<_> = pairs
        .iter()
        .map(|&(a, b)| builder.make_edge(n[a], n[b]).unwrap())
        .collect();

    let layout = builder.build().unwrap();
    assert_eq!(layout.node_count(), 8);
    assert_eq!(layout.edge_count(), 10);

    for &edge in &edges {
        assert_orthogonal(layout.get_waypoints(edge).unwrap());
    }

    // The back edge 4 -> 2 is routed around, starting at its source's
    // bottom like every other edge.
    assert_touches(&layout, layout.get_waypoints(edges[5]).unwrap(), n[3], n[1]);
    assert_well_formed(&layout, &n);
}

#[test]
fn nested_regions_stack_vertically() {
    let mut builder = LayoutBuilder::new();

    let mut diamond = |builder: &mut LayoutBuilder, top: NodeId| {
        let b = builder.make_node_with_size(60.0, 30.0);
        let c = builder.make_node_with_size(60.0, 30.0);
        let d = builder.make_node_with_size(60.0, 30.0);
        builder.make_edge(top, b).unwrap();
        builder.make_edge(top, c).unwrap();
        builder.make_edge(b, d).unwrap();
        builder.make_edge(c, d).unwrap();
        (d, vec![top, b, c, d])
    };

    let a1 = builder.make_node_with_size(60.0, 30.0);
    let (d1, first) = diamond(&mut builder, a1);
    let a2 = builder.make_node_with_size(60.0, 30.0);
    let link1 = builder.make_edge(d1, a2).unwrap();
    let (d2, second) = diamond(&mut builder, a2);
    let a3 = builder.make_node_with_size(60.0, 30.0);
    let link2 = builder.make_edge(d2, a3).unwrap();
    let (d3, third) = diamond(&mut builder, a3);
    let _ = d3;

    let layout = builder.build().unwrap();
    assert_eq!(layout.node_count(), 12);
    assert_eq!(layout.edge_count(), 14);
    // The middle diamond is a nested region; the outer diamonds live in the
    // root region (the last one's only exit would be the synthetic sink).
    assert_eq!(layout.region_count(), 2);

    // The diamonds stack: everything in an earlier diamond sits strictly
    // above everything in a later one.
    let max_y = |nodes: &[NodeId]| -> f64 {
        nodes
            .iter()
            .map(|&n| {
                let p = layout.get_coords(n).unwrap();
                let s = layout.get_size(n).unwrap();
                p.y + s.y
            })
            .fold(0.0, f64::max)
    };
    let min_y = |nodes: &[NodeId]| -> f64 {
        nodes
            .iter()
            .map(|&n| layout.get_coords(n).unwrap().y)
            .fold(f64::INFINITY, f64::min)
    };

    assert!(max_y(&first) <= min_y(&second) + 1e-6);
    assert!(max_y(&second) <= min_y(&third) + 1e-6);

    // The connecting edges pass continuously through the region walls.
    for (link, from, to) in [(link1, d1, a2), (link2, d2, a3)] {
        let points = layout.get_waypoints(link).unwrap();
        assert_orthogonal(points);
        assert_touches(&layout, points, from, to);
    }

    let all: Vec<NodeId> = first
        .iter()
        .chain(second.iter())
        .chain(third.iter())
        .copied()
        .collect();
    assert_well_formed(&layout, &all);
}

#[test]
fn back_edges_route_around_the_graph() {
    let mut builder = LayoutBuilder::new();
    let a = builder.make_node_with_size(80.0, 40.0);
    let b = builder.make_node_with_size(80.0, 40.0);
    let c = builder.make_node_with_size(80.0, 40.0);
    builder.make_edge(a, b).unwrap();
    builder.make_edge(b, c).unwrap();
    let back = builder.make_edge(c, b).unwrap();

    let layout = builder.build().unwrap();
    let points = layout.get_waypoints(back).unwrap();
    assert_orthogonal(points);
    assert_touches(&layout, points, c, b);
    assert_well_formed(&layout, &[a, b, c]);
}

#[test]
fn two_identical_builders_produce_identical_layouts() {
    let build = || {
        let mut builder = LayoutBuilder::new();
        let n: Vec<NodeId> = (0..6)
            .map(|_| builder.make_node_with_size(50.0, 20.0))
            .collect();
        for &(a, b) in &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4), (4, 5), (5, 3)] {
            builder.make_edge(n[a], n[b]).unwrap();
        }
        builder.build().unwrap()
    };

    let one = build();
    let two = build();

    assert_eq!(one.node_count(), two.node_count());
    assert_eq!(one.edge_count(), two.edge_count());
    assert_eq!(one.get_width(), two.get_width());
    assert_eq!(one.get_height(), two.get_height());
}

#[test]
fn branch_kinds_and_labels_survive_into_the_layout() {
    let mut builder = LayoutBuilder::new();
    let cond = builder.make_node_with_label("if (x < 0)");
    let then = builder.make_node_with_label("return -x;");
    let other = builder.make_node_with_label("return x;");
    builder
        .make_edge_with_kind(cond, then, EdgeKind::True)
        .unwrap();
    builder
        .make_edge_with_kind(cond, other, EdgeKind::False)
        .unwrap();

    let layout = builder.build().unwrap();
    assert_eq!(layout.node_count(), 3);
    let size = layout.get_size(cond).unwrap();
    assert!(size.x > 0.0 && size.y > 0.0);
}

#[test]
fn unknown_endpoints_are_invalid_arguments() {
    let mut builder = LayoutBuilder::new();
    let a = builder.make_node();
    let bogus = NodeId::from_index(99);

    assert!(matches!(
        builder.make_edge(a, bogus),
        Err(Error::InvalidArgument { kind: "node", .. })
    ));
}

#[test]
fn disconnected_graphs_are_degenerate() {
    let mut builder = LayoutBuilder::new();
    let _a = builder.make_node_with_size(10.0, 10.0);
    let _b = builder.make_node_with_size(10.0, 10.0);

    assert!(matches!(
        builder.build(),
        Err(Error::DegenerateInput { unreachable: 1 })
    ));
}

#[test]
fn empty_builder_builds_an_empty_layout() {
    let layout = LayoutBuilder::new().build().unwrap();
    assert_eq!(layout.node_count(), 0);
    assert_eq!(layout.edge_count(), 0);
    assert_eq!(layout.get_width(), 0.0);
    assert_eq!(layout.get_height(), 0.0);
}
