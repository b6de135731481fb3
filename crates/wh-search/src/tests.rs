//! Unit tests for wh-search.
//!
//! Timings use a unit robot (1 m/s, 1 m/s², 90°/s) so expected values are
//! easy to derive by hand: a 1 m hop takes 2 s, 2 m take 3 s, 3 m take 4 s,
//! and a quarter turn takes 1 s.

#[cfg(test)]
mod fixtures {
    use wh_core::{Angle, KinematicProfile, NodeId, Physics, Point2, Seconds, TierId};
    use wh_graph::{Graph, GraphBuilder};

    use crate::Plan;

    pub fn unit_physics() -> Physics {
        Physics::new(KinematicProfile {
            max_speed:    1.0,
            acceleration: 1.0,
            deceleration: 1.0,
            turn_speed:   std::f64::consts::FRAC_PI_2,
        })
        .unwrap()
    }

    /// 3×3 grid, 1 m spacing, ids row-major from the bottom-left corner.
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
        let ids: Vec<NodeId> = (0..9)
            .map(|i| b.add_node(Point2::new((i % 3) as f64, (i / 3) as f64), TierId(0)))
            .collect();
        for i in 0..9 {
            if i % 3 < 2 {
                b.add_edge(ids[i], ids[i + 1]);
            }
            if i < 6 {
                b.add_edge(ids[i], ids[i + 3]);
            }
        }
        (b.build().unwrap(), ids)
    }

    /// Straight east-west corridor of `n` nodes.
    pub fn corridor(n: usize) -> (Graph, Vec<NodeId>) {
        let mut b = GraphBuilder::new();
        let ids: Vec<NodeId> = (0..n).map(|i| b.add_node(Point2::new(i as f64, 0.0), TierId(0))).collect();
        for w in ids.windows(2) {
            b.add_edge(w[0], w[1]);
        }
        (b.build().unwrap(), ids)
    }

    /// Crossing with a shared centre.
    ///
    /// ```text
    ///       3
    ///       |
    ///   0 - 1 - 2
    ///       |
    ///       4
    /// ```
    pub fn plus() -> (Graph, Vec<NodeId>) {
        let mut b = GraphBuilder::new();
        let pos = [(-1.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];
        let ids: Vec<NodeId> = pos.iter().map(|&(x, y)| b.add_node(Point2::new(x, y), TierId(0))).collect();
        b.add_edge(ids[0], ids[1]);
        b.add_edge(ids[1], ids[2]);
        b.add_edge(ids[3], ids[1]);
        b.add_edge(ids[1], ids[4]);
        (b.build().unwrap(), ids)
    }

    /// Drive `plan.path` through the timing model from `start`.  Returns the
    /// arrival time at every path entry and the time the path ends.
    pub fn replay(
        graph: &Graph,
        physics: &Physics,
        plan: &Plan,
        start: NodeId,
        orientation: Angle,
    ) -> (Vec<(NodeId, Seconds)>, Seconds) {
        let mut t = plan.start_time;
        let mut at = start;
        let mut heading = orientation;
        let mut hop: Vec<NodeId> = Vec::new();
        let mut arrivals = Vec::new();

        for stop in &plan.path.stops {
            if stop.node == at && stop.is_stop && hop.is_empty() {
                t += stop.wait;
                continue;
            }
            hop.push(stop.node);
            if !stop.is_stop {
                continue;
            }
            let first = graph.edge_between(at, hop[0]).unwrap();
            let angle = graph.edge_angle[first.index()];
            t += physics.time_to_turn(heading, angle);

            let mut prev = at;
            let mut covered = 0.0;
            let mut cumulative = Vec::new();
            for &n in &hop {
                let e = graph.edge_between(prev, n).unwrap();
                covered += graph.edge_distance[e.index()];
                cumulative.push(covered);
                prev = n;
            }
            let rel = physics.checkpoint_times(0.0, &cumulative);
            for (&n, dt) in hop.iter().zip(&rel) {
                arrivals.push((n, t + dt));
            }
            t += rel.last().copied().unwrap_or(0.0);
            heading = angle;
            at = stop.node;
            hop.clear();
            t += stop.wait;
        }
        (arrivals, t)
    }
}

// ── Open set ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod open_set {
    use crate::OpenSet;

    #[test]
    fn decrease_key_supersedes_old_entry() {
        let mut open = OpenSet::new();
        open.push('a', 5.0, 0.0);
        open.push('b', 3.0, 0.0);
        open.push('a', 1.0, 0.0);
        assert_eq!(open.len(), 2);
        assert_eq!(open.pop(), Some(('a', 1.0)));
        assert_eq!(open.pop(), Some(('b', 3.0)));
        assert_eq!(open.pop(), None);
        assert!(open.is_empty());
    }

    #[test]
    fn peek_skips_stale_entries() {
        let mut open = OpenSet::new();
        open.push('a', 1.0, 0.0);
        open.push('b', 3.0, 0.0);
        open.push('a', 4.0, 0.0);
        assert_eq!(open.peek_f(), Some(3.0));
        assert_eq!(open.pop(), Some(('b', 3.0)));
        assert_eq!(open.peek_f(), Some(4.0));
        open.pop();
        assert_eq!(open.peek_f(), None);
    }

    #[test]
    fn ties_prefer_lower_h_then_insertion_order() {
        let mut open = OpenSet::new();
        open.push(1u32, 2.0, 1.0);
        open.push(2u32, 2.0, 0.5);
        open.push(3u32, 2.0, 0.5);
        assert_eq!(open.pop().map(|(n, _)| n), Some(2));
        assert_eq!(open.pop().map(|(n, _)| n), Some(3));
        assert_eq!(open.pop().map(|(n, _)| n), Some(1));
    }
}

// ── Best-first skeleton ───────────────────────────────────────────────────────

#[cfg(test)]
mod best_first {
    use crate::{BestFirst, SearchProblem, SearchStatus};

    /// Unit-cost walk along `0..len`.
    struct Line {
        len:  u32,
        goal: u32,
        g:    Vec<f64>,
    }

    impl Line {
        fn new(len: u32, goal: u32) -> Self {
            let mut g = vec![f64::INFINITY; len as usize];
            g[0] = 0.0;
            Self { len, goal, g }
        }
    }

    impl SearchProblem for Line {
        type Node = u32;

        fn h(&mut self, _node: u32) -> f64 {
            0.0
        }

        fn g(&self, node: u32) -> f64 {
            self.g[node as usize]
        }

        fn g_prime(&mut self, parent: u32, _node: u32) -> f64 {
            self.g[parent as usize] + 1.0
        }

        fn successors(&mut self, node: u32, out: &mut Vec<u32>) {
            if node > 0 {
                out.push(node - 1);
            }
            if node + 1 < self.len {
                out.push(node + 1);
            }
        }

        fn set_backpointer(&mut self, _parent: u32, node: u32, g: f64, _h: f64) {
            self.g[node as usize] = g;
        }

        fn stop_condition(&mut self, node: u32) -> bool {
            node == self.goal
        }
    }

    #[test]
    fn finds_goal_with_exact_cost() {
        let mut line = Line::new(10, 6);
        let mut search = BestFirst::new();
        search.seed(&mut line, 0);
        assert_eq!(search.run(&mut line, None), SearchStatus::Found(6));
        assert_eq!(line.g[6], 6.0);
        assert!(search.is_closed(6));
    }

    #[test]
    fn unreachable_goal_exhausts() {
        let mut line = Line::new(4, 9);
        let mut search = BestFirst::new();
        search.seed(&mut line, 0);
        assert_eq!(search.run(&mut line, None), SearchStatus::Exhausted);
        assert_eq!(search.expansions(), 4);
    }

    #[test]
    fn budget_pauses_and_run_resumes() {
        let mut line = Line::new(10, 6);
        let mut search = BestFirst::new();
        search.seed(&mut line, 0);
        assert_eq!(search.run(&mut line, Some(3)), SearchStatus::LimitReached);
        assert_eq!(search.expansions(), 3);
        assert_eq!(search.run(&mut line, None), SearchStatus::Found(6));
        assert_eq!(line.g[6], 6.0);
    }
}

// ── Reverse resumable A* ──────────────────────────────────────────────────────

#[cfg(test)]
mod rra {
    use rustc_hash::{FxHashMap, FxHashSet};
    use wh_core::{Angle, KinematicProfile, NodeId, Physics, Point2, TierId};
    use wh_graph::{Graph, GraphBuilder};

    use super::fixtures::{corridor, grid3, unit_physics};
    use crate::{ReverseResumable, shortest_route};

    #[test]
    fn straight_run_is_one_hop() {
        let (g, ids) = corridor(4);
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[3], ids[0], false, FxHashSet::default()).unwrap();
        assert!((rra.distance(&g, ids[0]) - 4.0).abs() < 1e-9);
        assert!((rra.distance(&g, ids[2]) - 2.0).abs() < 1e-9);
        assert_eq!(rra.distance(&g, ids[3]), 0.0);
    }

    #[test]
    fn corner_route_charges_one_turn() {
        let (g, ids) = grid3();
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[8], ids[0], false, FxHashSet::default()).unwrap();
        // 2 m (3 s) + quarter turn (1 s) + 2 m (3 s).
        assert!((rra.distance(&g, ids[0]) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn resumed_answers_match_fresh_search() {
        let (g, ids) = grid3();
        let mut warm = ReverseResumable::new(&g, unit_physics(), ids[8], ids[0], false, FxHashSet::default()).unwrap();
        let near = warm.distance(&g, ids[5]);
        let far = warm.distance(&g, ids[0]);

        let mut cold = ReverseResumable::new(&g, unit_physics(), ids[8], ids[0], false, FxHashSet::default()).unwrap();
        assert_eq!(cold.distance(&g, ids[0]), far);
        assert_eq!(cold.distance(&g, ids[5]), near);

        let before = warm.expansions();
        assert_eq!(warm.distance(&g, ids[0]), far);
        assert_eq!(warm.expansions(), before);
    }

    #[test]
    fn locked_and_custom_blocked_nodes_cut_routes() {
        let (mut g, ids) = corridor(4);
        let mut blocked = FxHashSet::default();
        blocked.insert(ids[1]);
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[3], ids[0], false, blocked).unwrap();
        assert_eq!(rra.distance(&g, ids[0]), f64::INFINITY);
        assert!(rra.distance(&g, ids[2]).is_finite());

        g.set_locked(ids[2], true).unwrap();
        assert!(rra.is_stale(&g));
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[3], ids[0], false, FxHashSet::default()).unwrap();
        assert_eq!(rra.distance(&g, ids[0]), f64::INFINITY);
        assert!(!rra.is_stale(&g));
    }

    #[test]
    fn locked_destination_is_still_a_target() {
        let (mut g, ids) = corridor(3);
        g.set_locked(ids[2], true).unwrap();
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[2], ids[0], false, FxHashSet::default()).unwrap();
        assert!((rra.distance(&g, ids[0]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn obstacles_need_permission() {
        let (mut g, ids) = corridor(3);
        g.set_obstacle(ids[1], true).unwrap();
        let mut ground = ReverseResumable::new(&g, unit_physics(), ids[2], ids[0], false, FxHashSet::default()).unwrap();
        assert_eq!(ground.distance(&g, ids[0]), f64::INFINITY);
        let mut under = ReverseResumable::new(&g, unit_physics(), ids[2], ids[0], true, FxHashSet::default()).unwrap();
        assert!(under.distance(&g, ids[0]).is_finite());
    }

    #[test]
    fn route_queries_follow_the_best_route() {
        let (g, ids) = grid3();
        // Without 3 the corner route along the bottom edge is the only 7 s one.
        let blocked = FxHashSet::from_iter([ids[3]]);
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[8], ids[0], false, blocked).unwrap();
        assert_eq!(rra.route_from(&g, ids[0]).unwrap(), vec![ids[0], ids[1], ids[2], ids[5], ids[8]]);
        assert!(rra.path_contains(&g, ids[2]));
        assert!(!rra.path_contains(&g, ids[6]));
        assert_eq!(rra.next_nodes_until_turn(&g, ids[0]), vec![ids[1], ids[2]]);
        assert_eq!(rra.next_nodes_until_turn(&g, ids[2]), vec![ids[5], ids[8]]);
        assert!(rra.next_nodes_until_turn(&g, ids[8]).is_empty());
    }

    #[test]
    fn heuristic_adds_turn_and_bias() {
        let (g, ids) = grid3();
        let mut rra = ReverseResumable::new(&g, unit_physics(), ids[8], ids[0], false, FxHashSet::default()).unwrap();
        // Both first hops out of 0 lead to a 7 s route; only facing away
        // from both costs a turn.
        assert!((rra.heuristic(&g, ids[0], Angle::EAST) - 7.0).abs() < 1e-9);
        assert!((rra.heuristic(&g, ids[0], Angle::NORTH) - 7.0).abs() < 1e-9);
        assert!((rra.heuristic(&g, ids[0], Angle::WEST) - 8.0).abs() < 1e-9);
        assert!((rra.heuristic(&g, ids[0], Angle::SOUTH) - 8.0).abs() < 1e-9);
        let mut bias = FxHashMap::default();
        bias.insert(ids[0], 2.0);
        rra.set_bias(bias);
        assert!((rra.heuristic(&g, ids[0], Angle::EAST) - 9.0).abs() < 1e-9);
        assert!((rra.distance(&g, ids[0]) - 7.0).abs() < 1e-9);
    }

    /// A feeder `P` joins a long straight run at `X`.  From rest at `X` the
    /// diagonal is the faster way to `D`; a robot arriving from `P` at speed
    /// is better off driving straight through.
    ///
    /// ```text
    ///          + - + - ... - + - D
    ///         /                  |
    ///   P - X - + - + - ... - + - +
    /// ```
    fn through_route() -> (Graph, NodeId, NodeId, NodeId) {
        let mut b = GraphBuilder::new();
        let p = b.add_node(Point2::new(-1.0, 0.0), TierId(0));
        let x = b.add_node(Point2::new(0.0, 0.0), TierId(0));
        b.add_directed_edge(p, x);
        let mut low = x;
        for i in 1..=10 {
            let n = b.add_node(Point2::new(i as f64, 0.0), TierId(0));
            b.add_directed_edge(low, n);
            low = n;
        }
        let mut high = x;
        for i in 1..=10 {
            let n = b.add_node(Point2::new(i as f64, 1.0), TierId(0));
            b.add_directed_edge(high, n);
            high = n;
        }
        b.add_directed_edge(low, high);
        (b.build().unwrap(), p, x, high)
    }

    #[test]
    fn straight_through_beats_the_best_route_from_rest() {
        let (g, p, x, d) = through_route();
        let physics = Physics::new(KinematicProfile::default()).unwrap();
        let mut rra = ReverseResumable::new(&g, physics, d, p, false, FxHashSet::default()).unwrap();

        let from_p = shortest_route(&g, &physics, p, d, None, false).unwrap().unwrap();
        let via_x = rra.distance(&g, x);
        let via_p = rra.distance(&g, p);
        assert!(via_p <= from_p.total_time + 1e-9, "{via_p} > {}", from_p.total_time);
        assert!((via_p - from_p.total_time).abs() < 1e-9);
        // 11 m straight, a quarter turn, 1 m north.
        assert!((via_p - 14.412).abs() < 1e-3);
        // Stopping at X to take the diagonal costs more than not stopping.
        let stop_at_x = physics.time_to_move(0.0, 1.0) + physics.time_to_turn(Angle::EAST, Angle::from_degrees(45.0));
        assert!(via_p < stop_at_x + via_x);

        let route = rra.route_from(&g, p).unwrap();
        assert_eq!(route.len(), 13);
        assert_eq!(route, from_p.nodes);
        assert!((rra.heuristic(&g, p, Angle::EAST) - via_p).abs() < 1e-9);
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let (g, ids) = corridor(2);
        let bad = wh_core::NodeId(40);
        assert!(ReverseResumable::new(&g, unit_physics(), bad, ids[0], false, FxHashSet::default()).is_err());
    }
}

// ── Unconstrained A* ──────────────────────────────────────────────────────────

#[cfg(test)]
mod astar {
    use wh_core::Angle;

    use super::fixtures::{corridor, grid3, unit_physics};
    use crate::shortest_route;

    #[test]
    fn corner_route_costs_and_stops() {
        let (g, ids) = grid3();
        let route = shortest_route(&g, &unit_physics(), ids[0], ids[8], None, false).unwrap().unwrap();
        assert!((route.total_time - 7.0).abs() < 1e-9);
        assert_eq!(route.nodes.len(), 5);
        let flags: Vec<bool> = route.path.stops.iter().map(|s| s.is_stop).collect();
        assert_eq!(flags, vec![false, true, false, true]);
    }

    #[test]
    fn initial_heading_is_charged() {
        let (g, ids) = grid3();
        let p = unit_physics();
        let east = shortest_route(&g, &p, ids[0], ids[8], Some(Angle::EAST), false).unwrap().unwrap();
        assert!((east.total_time - 7.0).abs() < 1e-9);
        // Facing west the cheaper first turn is a quarter turn north.
        let west = shortest_route(&g, &p, ids[0], ids[8], Some(Angle::WEST), false).unwrap().unwrap();
        assert!((west.total_time - 8.0).abs() < 1e-9);
        assert_eq!(west.nodes[1], ids[3]);
    }

    #[test]
    fn trivial_and_unreachable() {
        let (mut g, ids) = corridor(3);
        let p = unit_physics();
        let same = shortest_route(&g, &p, ids[1], ids[1], None, false).unwrap().unwrap();
        assert_eq!(same.total_time, 0.0);
        assert!(same.path.is_empty());

        g.set_locked(ids[1], true).unwrap();
        assert!(shortest_route(&g, &p, ids[0], ids[2], None, false).unwrap().is_none());
        // A locked goal is still a valid target.
        assert!(shortest_route(&g, &p, ids[0], ids[1], None, false).unwrap().is_some());
    }

    #[test]
    fn reverse_distance_matches_forward_route() {
        let (g, ids) = grid3();
        let p = unit_physics();
        let mut rra = crate::ReverseResumable::new(&g, p, ids[8], ids[0], false, Default::default()).unwrap();
        let forward = shortest_route(&g, &p, ids[0], ids[8], None, false).unwrap().unwrap();
        assert!(rra.distance(&g, ids[0]) <= forward.total_time + 1e-9);
    }
}

// ── Elevators ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod elevator {
    use wh_core::{ElevatorId, NodeId, Point2, TierId};
    use wh_graph::{Graph, GraphBuilder};

    use super::fixtures::unit_physics;
    use crate::{ElevatorLeg, elevator_route};

    /// Two 3-node corridors stacked on tiers 0 and 1.  A fast elevator joins
    /// their east ends, a slow one their west ends.
    fn two_tiers() -> (Graph, Vec<NodeId>, Vec<NodeId>) {
        let mut b = GraphBuilder::new();
        let low: Vec<NodeId> = (0..3).map(|i| b.add_node(Point2::new(i as f64, 0.0), TierId(0))).collect();
        let high: Vec<NodeId> = (0..3).map(|i| b.add_node(Point2::new(i as f64, 0.0), TierId(1))).collect();
        for tier in [&low, &high] {
            b.add_edge(tier[0], tier[1]);
            b.add_edge(tier[1], tier[2]);
        }
        b.add_elevator_edge(low[2], high[2], 8.0, ElevatorId(7));
        b.add_elevator_edge(high[2], low[2], 8.0, ElevatorId(7));
        b.add_elevator_edge(low[0], high[0], 20.0, ElevatorId(9));
        b.add_elevator_edge(high[0], low[0], 20.0, ElevatorId(9));
        (b.build().unwrap(), low, high)
    }

    #[test]
    fn picks_fast_elevator_and_adds_ride_time() {
        let (g, low, high) = two_tiers();
        let route = elevator_route(&g, &unit_physics(), low[0], high[0], false).unwrap().unwrap();
        // 2 m (3 s) + ride (8 s) + 2 m back (3 s).
        assert!((route.total_time - 14.0).abs() < 1e-9);
        assert_eq!(route.legs, vec![ElevatorLeg { elevator: ElevatorId(7), from: low[2], to: high[2] }]);
        assert_eq!(route.nodes, vec![low[0], low[1], low[2], high[2], high[1], high[0]]);
        assert_eq!(route.first_boarding(), Some(low[2]));
    }

    #[test]
    fn same_tier_needs_no_legs() {
        let (g, low, _) = two_tiers();
        let route = elevator_route(&g, &unit_physics(), low[0], low[2], false).unwrap().unwrap();
        assert!(route.legs.is_empty());
        assert!((route.total_time - 3.0).abs() < 1e-9);
    }

    #[test]
    fn slow_elevator_used_when_fast_one_is_locked() {
        let (mut g, low, high) = two_tiers();
        g.set_locked(high[2], true).unwrap();
        let route = elevator_route(&g, &unit_physics(), low[1], high[1], false).unwrap().unwrap();
        assert_eq!(route.legs.len(), 1);
        assert_eq!(route.legs[0].elevator, ElevatorId(9));
        // 1 m (2 s) + 20 s + 1 m (2 s).
        assert!((route.total_time - 24.0).abs() < 1e-9);
    }
}

// ── Windowed cooperative search ───────────────────────────────────────────────

#[cfg(test)]
mod whca {
    use rustc_hash::FxHashSet;
    use wh_core::{AgentId, Angle, NodeId, Physics, Point2, TierId};
    use wh_graph::{Graph, GraphBuilder};
    use wh_reserve::{Interval, ReservationTable};

    use super::fixtures::{corridor, grid3, plus, replay, unit_physics};
    use crate::{PathStop, PlanOutcome, Query, ReverseResumable, SearchError, WhcaConfig, WindowedSearch};

    fn query(agent: u32, start: NodeId, orientation: Angle, destination: NodeId) -> Query {
        Query {
            agent: AgentId(agent),
            start,
            start_time: 0.0,
            orientation,
            destination,
            can_pass_obstacles: false,
        }
    }

    fn run(
        graph: &Graph,
        physics: &Physics,
        table: &ReservationTable,
        config: WhcaConfig,
        q: &Query,
    ) -> (PlanOutcome, usize) {
        let mut rra = ReverseResumable::new(
            graph,
            *physics,
            q.destination,
            q.start,
            q.can_pass_obstacles,
            FxHashSet::default(),
        )
        .unwrap();
        let mut search = WindowedSearch::new(config).unwrap();
        let outcome = search.plan(graph, physics, table, &mut rra, q).unwrap();
        (outcome, search.last_expansions())
    }

    #[test]
    fn trivial_route_is_empty() {
        let (g, ids) = corridor(3);
        let p = unit_physics();
        let table = ReservationTable::new();
        let (outcome, expansions) = run(&g, &p, &table, WhcaConfig::default(), &query(0, ids[1], Angle::EAST, ids[1]));
        let PlanOutcome::Found(plan) = outcome else { panic!("expected Found") };
        assert!(plan.path.is_empty());
        assert!(plan.intervals.is_empty());
        assert_eq!(plan.duration(), 0.0);
        assert_eq!(expansions, 0);
    }

    #[test]
    fn zero_window_only_waits() {
        let (g, ids) = corridor(4);
        let p = unit_physics();
        let table = ReservationTable::new();
        let config = WhcaConfig { window: 0.0, ..WhcaConfig::default() };
        let (outcome, expansions) = run(&g, &p, &table, config, &query(0, ids[0], Angle::EAST, ids[3]));
        let PlanOutcome::WindowExceeded(plan) = outcome else { panic!("expected WindowExceeded") };
        assert_eq!(plan.path.stops, vec![PathStop { node: ids[0], is_stop: true, wait: 0.5 }]);
        assert_eq!(plan.end_node, ids[0]);
        assert_eq!(expansions, 2);
        assert_eq!(plan.intervals.len(), 1);
        assert!(plan.intervals[0].is_permanent());
        assert_eq!(plan.intervals[0].start, 0.0);
    }

    #[test]
    fn corner_route_on_empty_floor() {
        let (g, ids) = grid3();
        let p = unit_physics();
        let table = ReservationTable::new();
        let q = query(0, ids[0], Angle::EAST, ids[8]);
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &q);
        let PlanOutcome::Found(plan) = outcome else { panic!("expected Found") };
        assert!((plan.end_time - 7.0).abs() < 1e-9);
        let nodes: Vec<NodeId> = plan.path.nodes().collect();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[3], ids[8]);
        let flags: Vec<bool> = plan.path.stops.iter().map(|s| s.is_stop).collect();
        assert_eq!(flags, vec![false, true, false, true]);
        assert!(plan.intervals.last().unwrap().is_permanent());

        let mut committed = ReservationTable::new();
        committed.try_commit(q.agent, &plan.intervals).unwrap();
        committed.validate().unwrap();
    }

    #[test]
    fn reverse_heuristic_never_exceeds_realised_time() {
        let (g, ids) = grid3();
        let p = unit_physics();
        let table = ReservationTable::new();
        for start in [0usize, 1, 3, 4, 6] {
            let q = query(0, ids[start], Angle::EAST, ids[8]);
            let mut rra = ReverseResumable::new(&g, p, ids[8], ids[start], false, FxHashSet::default()).unwrap();
            let bound = rra.distance(&g, ids[start]);
            let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &q);
            let plan = outcome.into_plan().unwrap();
            assert!(bound <= plan.end_time + 1e-9, "start {start}: {bound} > {}", plan.end_time);
        }
    }

    #[test]
    fn replay_reproduces_claim_boundaries() {
        let (g, ids) = grid3();
        let p = unit_physics();
        let table = ReservationTable::new();
        let q = query(0, ids[0], Angle::NORTH, ids[8]);
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &q);
        let plan = outcome.into_plan().unwrap();

        let (arrivals, end) = replay(&g, &p, &plan, q.start, q.orientation);
        assert!((end - plan.end_time).abs() < 1e-9);
        for (node, t) in arrivals {
            assert!(
                plan.intervals.iter().any(|iv| iv.node == node && iv.start <= t + 1e-9 && t <= iv.end + 1e-9),
                "arrival at {node} at {t} not covered"
            );
        }
        // The last claim opens exactly when the robot leaves the node before
        // the destination.
        let last = plan.intervals.last().unwrap();
        assert_eq!(last.node, ids[8]);
    }

    #[test]
    fn crossing_agent_waits_for_the_first() {
        let (g, ids) = plus();
        let p = unit_physics();
        let mut table = ReservationTable::new();

        let first = query(0, ids[0], Angle::EAST, ids[2]);
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &first);
        let PlanOutcome::Found(plan_a) = outcome else { panic!("first agent blocked") };
        assert!((plan_a.end_time - 3.0).abs() < 1e-9);
        table.commit(first.agent, &plan_a.intervals);

        let second = query(1, ids[3], Angle::SOUTH, ids[4]);
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &second);
        let PlanOutcome::Found(plan_b) = outcome else { panic!("second agent blocked") };
        let opening = plan_b.path.stops[0];
        assert_eq!(opening.node, ids[3]);
        assert!(opening.is_stop);
        assert!((opening.wait - 3.0).abs() < 1e-9);
        assert!((plan_b.end_time - 6.0).abs() < 1e-9);

        table.try_commit(second.agent, &plan_b.intervals).unwrap();
        table.validate().unwrap();

        let (_, end) = replay(&g, &p, &plan_b, second.start, second.orientation);
        assert!((end - plan_b.end_time).abs() < 1e-9);
    }

    /// Two equal-length detours into `X`, and a dock `D` held until 20 s.
    ///
    /// ```text
    ///       A
    ///     /   \
    ///   S       X - D
    ///     \   /
    ///       B
    /// ```
    fn diamond() -> (Graph, Vec<NodeId>) {
        let mut b = GraphBuilder::new();
        let pos = [(0.0, 0.0), (1.0, 1.0), (1.0, -1.0), (2.0, 0.0), (3.0, 0.0)];
        let ids: Vec<NodeId> = pos.iter().map(|&(x, y)| b.add_node(Point2::new(x, y), TierId(0))).collect();
        b.add_directed_edge(ids[0], ids[1]);
        b.add_directed_edge(ids[0], ids[2]);
        b.add_directed_edge(ids[1], ids[3]);
        b.add_directed_edge(ids[2], ids[3]);
        b.add_directed_edge(ids[3], ids[4]);
        (b.build().unwrap(), ids)
    }

    #[test]
    fn tie_breaking_drops_arrivals_that_are_not_later() {
        let (g, ids) = diamond();
        let p = unit_physics();
        let mut table = ReservationTable::new();
        table.commit(AgentId(9), &[Interval::new(ids[4], 0.0, 20.0)]);
        let q = query(0, ids[0], Angle::EAST, ids[4]);

        let mut rra = ReverseResumable::new(&g, p, ids[4], ids[0], false, FxHashSet::default()).unwrap();
        let mut search = WindowedSearch::new(WhcaConfig::default()).unwrap();
        let outcome = search.plan(&g, &p, &table, &mut rra, &q).unwrap();
        let PlanOutcome::Found(plan) = outcome else { panic!("expected Found") };
        // Both detours reach X at the same instant; the second is dropped.
        assert!(search.last_pruned() >= 1);
        assert!(plan.end_time >= 20.0);
        let pruned_states = search.last_state_count();

        search.set_config(WhcaConfig { tie_breaking: false, ..WhcaConfig::default() }).unwrap();
        let outcome = search.plan(&g, &p, &table, &mut rra, &q).unwrap();
        assert!(outcome.is_found());
        assert_eq!(search.last_pruned(), 0);
        assert!(search.last_state_count() > pruned_states);

        table.try_commit(q.agent, &plan.intervals).unwrap();
        table.validate().unwrap();
    }

    #[test]
    fn repeated_runs_are_identical() {
        let (g, ids) = plus();
        let p = unit_physics();
        let mut table = ReservationTable::new();
        let first = query(0, ids[0], Angle::EAST, ids[2]);
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &first);
        table.commit(first.agent, &outcome.into_plan().unwrap().intervals);

        let second = query(1, ids[3], Angle::SOUTH, ids[4]);
        let (a, _) = run(&g, &p, &table, WhcaConfig::default(), &second);
        let (b, _) = run(&g, &p, &table, WhcaConfig::default(), &second);
        assert_eq!(a, b);
    }

    #[test]
    fn locked_nodes_are_never_entered() {
        let (mut g, ids) = grid3();
        g.set_locked(ids[4], true).unwrap();
        g.set_locked(ids[5], true).unwrap();
        let p = unit_physics();
        let table = ReservationTable::new();
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &query(0, ids[3], Angle::EAST, ids[5]));
        let PlanOutcome::Found(plan) = outcome else { panic!("expected Found") };
        assert_eq!(plan.end_node, ids[5]);
        assert!(plan.path.nodes().all(|n| n != ids[4]));
        assert!(plan.intervals.iter().all(|iv| iv.node != ids[4]));
    }

    #[test]
    fn obstacle_passing_follows_permission() {
        let (mut g, ids) = corridor(3);
        g.set_obstacle(ids[1], true).unwrap();
        let p = unit_physics();
        let table = ReservationTable::new();

        let ground = query(0, ids[0], Angle::EAST, ids[2]);
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &ground);
        assert_eq!(outcome, PlanOutcome::Infeasible);

        let under = Query { can_pass_obstacles: true, ..ground };
        let (outcome, _) = run(&g, &p, &table, WhcaConfig::default(), &under);
        assert!(outcome.is_found());
    }

    #[test]
    fn expansion_budget_reports_infeasible() {
        let (g, ids) = grid3();
        let p = unit_physics();
        let table = ReservationTable::new();
        let config = WhcaConfig { max_expansions: 1, ..WhcaConfig::default() };
        let (outcome, expansions) = run(&g, &p, &table, config, &query(0, ids[0], Angle::EAST, ids[8]));
        assert_eq!(outcome, PlanOutcome::Infeasible);
        assert_eq!(expansions, 1);
    }

    #[test]
    fn mismatched_heuristic_is_an_error() {
        let (g, ids) = corridor(4);
        let p = unit_physics();
        let table = ReservationTable::new();
        let mut rra = ReverseResumable::new(&g, p, ids[2], ids[0], false, FxHashSet::default()).unwrap();
        let mut search = WindowedSearch::new(WhcaConfig::default()).unwrap();
        let err = search.plan(&g, &p, &table, &mut rra, &query(0, ids[0], Angle::EAST, ids[3])).unwrap_err();
        assert!(matches!(err, SearchError::HeuristicMismatch { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(WindowedSearch::new(WhcaConfig { wait_step: 0.0, ..WhcaConfig::default() }).is_err());
        assert!(WindowedSearch::new(WhcaConfig { window: -1.0, ..WhcaConfig::default() }).is_err());
    }
}
