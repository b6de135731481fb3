//! Occupancy intervals and their construction from timed node sequences.

use std::fmt;

use rustc_hash::FxHashMap;

use wh_core::{COALESCE_GAP, NodeId, Seconds, TIME_EPSILON};

use crate::{ReservationError, ReservationResult};

/// An exclusive claim on `node` for `[start, end]`.
///
/// `end == f64::INFINITY` is a permanent rest claim.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub node:  NodeId,
    pub start: Seconds,
    pub end:   Seconds,
}

impl Interval {
    #[inline]
    pub fn new(node: NodeId, start: Seconds, end: Seconds) -> Self {
        Self { node, start, end }
    }

    /// A claim on `node` from `start` onwards, never released by time.
    #[inline]
    pub fn permanent(node: NodeId, start: Seconds) -> Self {
        Self { node, start, end: f64::INFINITY }
    }

    #[inline]
    pub fn is_permanent(&self) -> bool {
        self.end.is_infinite()
    }

    #[inline]
    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }

    /// Same node and a common stretch longer than [`TIME_EPSILON`].
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.node == other.node && spans_overlap(self.start, self.end, other.start, other.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_permanent() {
            write!(f, "{} [{:.3}, ∞)", self.node, self.start)
        } else {
            write!(f, "{} [{:.3}, {:.3}]", self.node, self.start, self.end)
        }
    }
}

/// Time spans overlap iff each starts before the other ends, with slack.
#[inline]
pub(crate) fn spans_overlap(s1: Seconds, e1: Seconds, s2: Seconds, e2: Seconds) -> bool {
    s1 < e2 - TIME_EPSILON && s2 < e1 - TIME_EPSILON
}

/// Turn a timed node sequence into the claims it needs.
///
/// `nodes[0]` is where the move starts and `times[0]` is the departure time
/// from it; `times[i]` is the arrival time at `nodes[i]`.  `start_time` is the
/// moment the robot begins occupying `nodes[0]` for this action (it may be
/// earlier than `times[0]` when a turn precedes the move).
///
/// A robot occupies a node from the moment it leaves the previous node until
/// it reaches the next one, so
///
/// ```text
/// nodes[0]   → [start_time, times[1]]
/// nodes[i]   → [times[i-1], times[i+1]]
/// nodes[k]   → [times[k-1], times[k]]     ([times[k-1], ∞) if `is_final`)
/// ```
///
/// A single-node sequence is a stay: `[start_time, times[0]]`.  The result is
/// passed through [`coalesce`].
pub fn build_intervals(
    start_time: Seconds,
    nodes: &[NodeId],
    times: &[Seconds],
    is_final: bool,
) -> ReservationResult<Vec<Interval>> {
    if nodes.len() != times.len() {
        return Err(ReservationError::LengthMismatch { nodes: nodes.len(), times: times.len() });
    }
    let Some(k) = nodes.len().checked_sub(1) else {
        return Ok(Vec::new());
    };
    let last_end = |t: Seconds| if is_final { f64::INFINITY } else { t };

    let mut out = Vec::with_capacity(nodes.len());
    if k == 0 {
        out.push(Interval::new(nodes[0], start_time, last_end(times[0])));
        return Ok(out);
    }

    out.push(Interval::new(nodes[0], start_time, times[1]));
    for i in 1..k {
        out.push(Interval::new(nodes[i], times[i - 1], times[i + 1]));
    }
    out.push(Interval::new(nodes[k], times[k - 1], last_end(times[k])));

    coalesce(&mut out);
    Ok(out)
}

/// Merge same-node intervals whose gap is below [`COALESCE_GAP`].
///
/// `intervals` must be in chronological order of the actions that produced
/// them.  A later interval is folded into the most recent earlier one on the
/// same node when it starts no later than one millisecond after that one
/// ends; rounding noise between consecutive actions (turn → move, arrive →
/// wait) therefore never leaves a sliver unclaimed.
pub fn coalesce(intervals: &mut Vec<Interval>) {
    let mut last_on_node: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());

    for iv in intervals.drain(..) {
        if let Some(&idx) = last_on_node.get(&iv.node) {
            let prev = &mut merged[idx];
            if iv.start <= prev.end + COALESCE_GAP {
                prev.start = prev.start.min(iv.start);
                prev.end = prev.end.max(iv.end);
                continue;
            }
        }
        last_on_node.insert(iv.node, merged.len());
        merged.push(iv);
    }
    *intervals = merged;
}
