//! Unit tests for wh-graph.
//!
//! All tests use hand-built floors; nothing is read from disk.

#[cfg(test)]
mod helpers {
    use wh_core::{NodeId, Point2, TierId};

    use crate::{Graph, GraphBuilder};

    /// 3×3 grid with 1 m spacing, all edges bidirectional.
    ///
    /// ```text
    ///   6 - 7 - 8
    ///   |   |   |
    ///   3 - 4 - 5
    ///   |   |   |
    ///   0 - 1 - 2
    /// ```
    pub fn grid3() -> (Graph, Vec<NodeId>) {
        let mut b = GraphBuilder::new();
        let mut ids = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                ids.push(b.add_node(Point2::new(x as f64, y as f64), TierId(0)));
            }
        }
        for y in 0..3 {
            for x in 0..3 {
                let i = y * 3 + x;
                if x < 2 {
                    b.add_edge(ids[i], ids[i + 1]);
                }
                if y < 2 {
                    b.add_edge(ids[i], ids[i + 3]);
                }
            }
        }
        (b.build().unwrap(), ids)
    }
}

// ── Builder & structure ───────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use wh_core::{Angle, ElevatorId, NodeId, Point2, TierId};

    use crate::{GraphBuilder, GraphError};

    #[test]
    fn empty_build() {
        let g = GraphBuilder::new().build().unwrap();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.is_empty());
        assert!(crate::Graph::empty().is_empty());
    }

    #[test]
    fn edge_geometry_derived_from_positions() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        let c = b.add_node(Point2::new(0.0, 2.5), TierId(0));
        b.add_directed_edge(a, c);
        let g = b.build().unwrap();
        let e = g.edge_between(a, c).unwrap();
        assert!((g.edge_distance[e.index()] - 2.5).abs() < 1e-12);
        assert_eq!(g.edge_angle[e.index()], Angle::NORTH);
        assert!(g.edge_between(c, a).is_none());
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        let c = b.add_node(Point2::new(1.0, 0.0), TierId(0));
        b.add_edge(a, c);
        b.add_directed_edge(a, c);
        assert_eq!(b.build().unwrap().edge_count(), 2);
    }

    #[test]
    fn rejects_unknown_node() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        b.add_directed_edge(a, NodeId(9));
        assert!(matches!(b.build(), Err(GraphError::NodeNotFound(NodeId(9)))));
    }

    #[test]
    fn rejects_self_loop_and_cross_tier() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        b.add_directed_edge(a, a);
        assert!(matches!(b.build(), Err(GraphError::SelfLoop(_))));

        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        let up = b.add_node(Point2::new(0.0, 0.0), TierId(1));
        b.add_edge(a, up);
        assert!(matches!(b.build(), Err(GraphError::CrossTierEdge { .. })));
    }

    #[test]
    fn elevator_edges_grouped_by_source() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        let up = b.add_node(Point2::new(0.0, 0.0), TierId(1));
        b.add_elevator_edge(up, a, 8.0, ElevatorId(3));
        b.add_elevator_edge(a, up, 8.0, ElevatorId(3));
        let g = b.build().unwrap();
        assert_eq!(g.elevators_from(a).len(), 1);
        assert_eq!(g.elevators_from(a)[0].to, up);
        assert_eq!(g.elevators_from(up)[0].elevator, ElevatorId(3));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn rejects_negative_elevator_time() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        let up = b.add_node(Point2::new(0.0, 0.0), TierId(1));
        b.add_elevator_edge(a, up, -1.0, ElevatorId(0));
        assert!(matches!(b.build(), Err(GraphError::InvalidTravelTime { .. })));
    }
}

// ── Adjacency ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod adjacency {
    use wh_core::Angle;

    #[test]
    fn forward_and_backward_agree() {
        let (g, _) = super::helpers::grid3();
        for n in 0..g.node_count() {
            let node = wh_core::NodeId(n as u32);
            for e in g.out_edges(node) {
                assert_eq!(g.edge_from[e.index()], node);
                let to = g.edge_to[e.index()];
                assert!(g.in_edges(to).any(|back| back == e));
            }
            for e in g.in_edges(node) {
                assert_eq!(g.edge_to[e.index()], node);
            }
        }
    }

    #[test]
    fn degrees() {
        let (g, ids) = super::helpers::grid3();
        assert_eq!(g.out_degree(ids[0]), 2);
        assert_eq!(g.out_degree(ids[4]), 4);
        assert_eq!(g.in_edges(ids[4]).count(), 4);
    }

    #[test]
    fn hop_walk_in_direction() {
        let (g, ids) = super::helpers::grid3();
        let e1 = g.next_in_direction(ids[0], Angle::EAST).unwrap();
        assert_eq!(g.edge_to[e1.index()], ids[1]);
        let e2 = g.next_in_direction(ids[1], Angle::EAST).unwrap();
        assert_eq!(g.edge_to[e2.index()], ids[2]);
        assert!(g.next_in_direction(ids[2], Angle::EAST).is_none());
        assert!(g.next_in_direction(ids[0], Angle::SOUTH).is_none());
    }
}

// ── Flags ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod flags {
    use wh_core::NodeId;

    #[test]
    fn generation_bumps_only_on_change() {
        let (mut g, ids) = super::helpers::grid3();
        assert_eq!(g.flags_generation(), 0);
        g.set_locked(ids[4], true).unwrap();
        assert_eq!(g.flags_generation(), 1);
        g.set_locked(ids[4], true).unwrap();
        assert_eq!(g.flags_generation(), 1);
        g.set_obstacle(ids[4], true).unwrap();
        assert_eq!(g.flags_generation(), 2);
        assert!(g.is_locked(ids[4]));
        assert!(g.is_obstacle(ids[4]));
    }

    #[test]
    fn blocked_respects_obstacle_permission() {
        let (mut g, ids) = super::helpers::grid3();
        g.set_obstacle(ids[1], true).unwrap();
        assert!(g.is_blocked(ids[1], false));
        assert!(!g.is_blocked(ids[1], true));
        g.set_locked(ids[1], true).unwrap();
        assert!(g.is_blocked(ids[1], true));
    }

    #[test]
    fn unknown_node_is_an_error() {
        let (mut g, _) = super::helpers::grid3();
        assert!(g.set_locked(NodeId(99), true).is_err());
    }
}

// ── Distances ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod distance {
    #[test]
    fn shortest_distance_on_grid() {
        let (g, ids) = super::helpers::grid3();
        assert_eq!(g.shortest_distance(ids[0], ids[8], false).unwrap(), Some(4.0));
        assert_eq!(g.shortest_distance(ids[3], ids[3], false).unwrap(), Some(0.0));
        assert!((g.euclidean_distance(ids[0], ids[8]) - 8f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn detours_around_locked_nodes() {
        let (mut g, ids) = super::helpers::grid3();
        // Wall off the middle column except the top row.
        g.set_locked(ids[1], true).unwrap();
        g.set_locked(ids[4], true).unwrap();
        assert_eq!(g.shortest_distance(ids[0], ids[2], false).unwrap(), Some(6.0));
    }

    #[test]
    fn locked_target_is_still_reachable() {
        let (mut g, ids) = super::helpers::grid3();
        g.set_locked(ids[2], true).unwrap();
        assert_eq!(g.shortest_distance(ids[0], ids[2], false).unwrap(), Some(2.0));
    }

    #[test]
    fn unreachable_is_none() {
        let (mut g, ids) = super::helpers::grid3();
        g.set_locked(ids[1], true).unwrap();
        g.set_locked(ids[3], true).unwrap();
        assert_eq!(g.shortest_distance(ids[0], ids[8], false).unwrap(), None);
    }
}
