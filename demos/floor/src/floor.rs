//! The demo floor: two identical tiers of shelving joined by two elevators.
//!
//! ```text
//!   tier 0 and tier 1, 8 × 6 nodes, 1.2 m apart
//!
//!   E1 S S S S S S S      E = elevator, S = shelf slot,
//!   |  S S S S S S |      D = dock (tier 0 only),
//!   A- - - A - - - A      A = cross aisle, | = lift aisle
//!   |  S S S S S S |
//!   A- - - A - - - A
//!   A  D D D D D D E0
//! ```
//!
//! Rows are fully connected east-west; north-south travel is only possible
//! in columns 0, 4 and 7.  Some slots in columns 2, 5 and 6 hold low shelves
//! (graph obstacles).

use anyhow::Result;
use rand::Rng;
use rand::rngs::SmallRng;

use wh_core::{ElevatorId, NodeId, Point2, TierId};
use wh_graph::{Graph, GraphBuilder};

pub const WIDTH:   usize = 8;
pub const HEIGHT:  usize = 6;
pub const TIERS:   u16   = 2;
const SPACING:     f64   = 1.2;
const LIFT_COLUMNS: [usize; 3] = [0, 4, 7];
const RIDE_SECS:   f64   = 12.0;
/// Share of candidate slots holding a low shelf that only under-ride robots
/// can drive beneath.
const LOW_SHELF_RATE: f64 = 0.25;
/// Slots that may hold a low shelf.  Every other slot touches a lift aisle,
/// so each slot stays reachable for every robot.
const LOW_SHELF_COLUMNS: [usize; 3] = [2, 5, 6];

pub struct Floor {
    pub graph:   Graph,
    pub docks:   Vec<NodeId>,
    pub shelves: Vec<NodeId>,
}

fn index(tier: u16, x: usize, y: usize) -> usize {
    tier as usize * WIDTH * HEIGHT + y * WIDTH + x
}

pub fn build_floor(rng: &mut SmallRng) -> Result<Floor> {
    let mut b = GraphBuilder::new();
    let mut ids = Vec::with_capacity(TIERS as usize * WIDTH * HEIGHT);
    for tier in 0..TIERS {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let pos = Point2::new(x as f64 * SPACING, y as f64 * SPACING);
                ids.push(b.add_node(pos, TierId(tier)));
            }
        }
    }

    let mut shelves = Vec::new();
    for tier in 0..TIERS {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let here = ids[index(tier, x, y)];
                if x + 1 < WIDTH {
                    b.add_edge(here, ids[index(tier, x + 1, y)]);
                }
                if y + 1 < HEIGHT && LIFT_COLUMNS.contains(&x) {
                    b.add_edge(here, ids[index(tier, x, y + 1)]);
                }
                if y >= 2 && !LIFT_COLUMNS.contains(&x) {
                    shelves.push(here);
                    if LOW_SHELF_COLUMNS.contains(&x) && rng.gen_bool(LOW_SHELF_RATE) {
                        b.mark_obstacle(here);
                    }
                }
            }
        }
    }

    let lifts = [
        (ElevatorId(0), index(0, WIDTH - 1, 0), index(1, WIDTH - 1, 0)),
        (ElevatorId(1), index(0, 0, HEIGHT - 1), index(1, 0, HEIGHT - 1)),
    ];
    for (elevator, low, high) in lifts {
        b.add_elevator_edge(ids[low], ids[high], RIDE_SECS, elevator);
        b.add_elevator_edge(ids[high], ids[low], RIDE_SECS, elevator);
    }

    let docks = (1..WIDTH - 1).map(|x| ids[index(0, x, 0)]).collect();
    Ok(Floor { graph: b.build()?, docks, shelves })
}
