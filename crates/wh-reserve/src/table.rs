//! The process-wide reservation table.
//!
//! # Layout
//!
//! Claims are stored per node in a `BTreeMap` keyed by start time.  Because
//! committed claims on one node never overlap, sorting by start also sorts by
//! end, so a conflict query only has to look at the claims that start just
//! before the queried window closes: O(log C) for C claims on the node.
//!
//! A secondary per-agent index records which `(node, start)` keys each agent
//! owns, so an agent's future claims can be released before it replans
//! without scanning the whole table.
//!
//! # Write discipline
//!
//! [`ReservationTable::commit`] trusts its caller: the planner proves every
//! claim free while searching, and the table only re-checks in debug builds.
//! [`ReservationTable::try_commit`] performs the query and the insert inside
//! one `&mut self` call for callers that cannot make that promise.  A planner
//! that shares the table across threads must wrap the whole
//! search-then-commit sequence in one exclusive section.

use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use wh_core::{AgentId, NodeId, Seconds, TIME_EPSILON};

use crate::interval::spans_overlap;
use crate::{Interval, ReservationError, ReservationResult};

type TimeKey = OrderedFloat<Seconds>;

/// A committed claim as stored under its start key.
#[derive(Copy, Clone, Debug)]
struct Claim {
    end:   Seconds,
    owner: AgentId,
}

/// Per-node interval store; see the module docs.
#[derive(Default)]
pub struct ReservationTable {
    claims: FxHashMap<NodeId, BTreeMap<TimeKey, Claim>>,
    owned:  FxHashMap<AgentId, BTreeSet<(NodeId, TimeKey)>>,
    count:  usize,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed intervals.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop every claim.
    pub fn clear(&mut self) {
        self.claims.clear();
        self.owned.clear();
        self.count = 0;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` if no committed claim on `node` overlaps `[start, end]`.
    #[inline]
    pub fn is_free(&self, node: NodeId, start: Seconds, end: Seconds) -> bool {
        self.conflict(node, start, end).is_none()
    }

    /// `true` if `node` can be held from `start` onwards forever.
    #[inline]
    pub fn is_free_forever(&self, node: NodeId, start: Seconds) -> bool {
        self.is_free(node, start, f64::INFINITY)
    }

    /// The first committed claim on `node` overlapping `[start, end]`, with
    /// its owner.
    pub fn conflict(&self, node: NodeId, start: Seconds, end: Seconds) -> Option<(Interval, AgentId)> {
        let per_node = self.claims.get(&node)?;
        // Claims starting at or after `end - ε` cannot overlap.  Among the rest,
        // ends grow with starts, so the latest two suffice (the second only
        // matters when a pair touches within ε).
        per_node
            .range(..OrderedFloat(end - TIME_EPSILON))
            .rev()
            .take(2)
            .find(|(s, c)| spans_overlap(s.0, c.end, start, end))
            .map(|(s, c)| (Interval::new(node, s.0, c.end), c.owner))
    }

    /// All claims on `node` in start order, with owners.
    pub fn intervals_at(&self, node: NodeId) -> impl Iterator<Item = (Interval, AgentId)> + '_ {
        self.claims
            .get(&node)
            .into_iter()
            .flat_map(move |m| m.iter().map(move |(s, c)| (Interval::new(node, s.0, c.end), c.owner)))
    }

    /// All claims owned by `owner`, ordered by node then start.
    pub fn owned_by(&self, owner: AgentId) -> Vec<Interval> {
        let Some(keys) = self.owned.get(&owner) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|&(node, start)| {
                let claim = self.claims.get(&node)?.get(&start)?;
                Some(Interval::new(node, start.0, claim.end))
            })
            .collect()
    }

    /// Convenience wrapper around [`crate::build_intervals`].
    pub fn build_intervals(
        &self,
        start_time: Seconds,
        nodes: &[NodeId],
        times: &[Seconds],
        is_final: bool,
    ) -> ReservationResult<Vec<Interval>> {
        crate::build_intervals(start_time, nodes, times, is_final)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Insert claims the caller has already proven free.
    ///
    /// Overlap with an existing claim is a broken planner invariant and
    /// aborts debug builds.
    pub fn commit(&mut self, owner: AgentId, intervals: &[Interval]) {
        for iv in intervals {
            debug_assert!(
                self.is_free(iv.node, iv.start, iv.end),
                "overlapping commit by {owner}: {iv} conflicts with {:?}",
                self.conflict(iv.node, iv.start, iv.end),
            );
            self.insert(owner, *iv);
        }
        trace!(%owner, claims = intervals.len(), total = self.count, "committed");
    }

    /// Check every claim, then insert all of them; nothing is inserted if any
    /// one conflicts.
    pub fn try_commit(&mut self, owner: AgentId, intervals: &[Interval]) -> ReservationResult<()> {
        for iv in intervals {
            if let Some((held, holder)) = self.conflict(iv.node, iv.start, iv.end) {
                return Err(ReservationError::Overlap {
                    node:       iv.node,
                    start:      iv.start,
                    end:        iv.end,
                    held_start: held.start,
                    held_end:   held.end,
                    holder,
                });
            }
        }
        for iv in intervals {
            self.insert(owner, *iv);
        }
        Ok(())
    }

    /// Give up everything `owner` holds after `time`.
    ///
    /// Claims starting at or after `time` are removed; a claim straddling
    /// `time` is cut back to end there.  Used before an agent replans from
    /// its state at `time`.
    pub fn release_after(&mut self, owner: AgentId, time: Seconds) -> usize {
        let Some(keys) = self.owned.get_mut(&owner) else {
            return 0;
        };
        let mut removed = 0;
        keys.retain(|&(node, start)| {
            let Some(per_node) = self.claims.get_mut(&node) else {
                return false;
            };
            if start.0 >= time - TIME_EPSILON {
                per_node.remove(&start);
                removed += 1;
                return false;
            }
            if let Some(claim) = per_node.get_mut(&start) {
                if claim.end > time {
                    claim.end = time;
                }
            }
            true
        });
        if keys.is_empty() {
            self.owned.remove(&owner);
        }
        self.count -= removed;
        removed
    }

    /// Remove every claim of `owner`.
    pub fn release_all(&mut self, owner: AgentId) -> usize {
        let Some(keys) = self.owned.remove(&owner) else {
            return 0;
        };
        for &(node, start) in &keys {
            if let Some(per_node) = self.claims.get_mut(&node) {
                per_node.remove(&start);
            }
        }
        self.count -= keys.len();
        keys.len()
    }

    /// Drop finished claims that ended before `time`.  Keeps the per-node
    /// maps short during long runs.
    pub fn prune_before(&mut self, time: Seconds) -> usize {
        let mut pruned = 0;
        for (node, per_node) in self.claims.iter_mut() {
            per_node.retain(|start, claim| {
                if claim.end < time {
                    if let Some(keys) = self.owned.get_mut(&claim.owner) {
                        keys.remove(&(*node, *start));
                    }
                    pruned += 1;
                    false
                } else {
                    true
                }
            });
        }
        self.owned.retain(|_, keys| !keys.is_empty());
        self.count -= pruned;
        pruned
    }

    /// Verify the non-overlap invariant over the whole table.
    pub fn validate(&self) -> ReservationResult<()> {
        for (&node, per_node) in &self.claims {
            let mut prev: Option<(Seconds, Claim)> = None;
            for (start, claim) in per_node {
                if let Some((ps, pc)) = prev {
                    if spans_overlap(ps, pc.end, start.0, claim.end) {
                        return Err(ReservationError::Overlap {
                            node,
                            start:      start.0,
                            end:        claim.end,
                            held_start: ps,
                            held_end:   pc.end,
                            holder:     pc.owner,
                        });
                    }
                }
                prev = Some((start.0, *claim));
            }
        }
        Ok(())
    }

    /// Store one claim.  Two claims can share a start key when one of them
    /// is zero-length; the longer one is kept.
    fn insert(&mut self, owner: AgentId, iv: Interval) {
        let key = OrderedFloat(iv.start);
        let per_node = self.claims.entry(iv.node).or_default();
        match per_node.get_mut(&key) {
            Some(held) => {
                if held.owner != owner && spans_overlap(iv.start, held.end, iv.start, iv.end) {
                    warn!(
                        node = %iv.node,
                        start = iv.start,
                        %owner,
                        holder = %held.owner,
                        "overlapping claims share a start time"
                    );
                }
                if iv.end <= held.end {
                    return;
                }
                let old = std::mem::replace(held, Claim { end: iv.end, owner });
                if old.owner != owner {
                    if let Some(keys) = self.owned.get_mut(&old.owner) {
                        keys.remove(&(iv.node, key));
                    }
                }
            }
            None => {
                per_node.insert(key, Claim { end: iv.end, owner });
                self.count += 1;
            }
        }
        self.owned.entry(owner).or_default().insert((iv.node, key));
    }
}
