//! The control loop shared by every search in this crate.
//!
//! A search variant describes its state space through [`SearchProblem`]; the
//! [`BestFirst`] driver owns the open and closed sets and runs the loop:
//!
//! 1. pop the open node with the lowest `f = g + h`,
//! 2. close it,
//! 3. for each successor not yet closed, ask `g_prime(parent, succ)`; if it
//!    beats the successor's current `g`, record the backpointer and insert or
//!    decrease-key the successor,
//! 4. stop once `stop_condition` fires for the node just expanded.
//!
//! The node is expanded *before* the stop check so a [`BestFirst`] can be
//! resumed after it returns: the reverse heuristic search relies on this to
//! answer one query after another from the same frontier.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashSet;

use wh_core::TIME_EPSILON;

use crate::open_set::OpenSet;

/// Problem-specific half of a best-first search.
pub trait SearchProblem {
    type Node: Copy + Eq + Hash + Ord + Debug;

    /// Heuristic estimate of the remaining cost.  `f64::INFINITY` prunes the
    /// node.
    fn h(&mut self, node: Self::Node) -> f64;

    /// Best known cost to `node`, `f64::INFINITY` if none.
    fn g(&self, node: Self::Node) -> f64;

    /// Cost of `node` if it were reached through `parent`, without recording
    /// anything.
    fn g_prime(&mut self, parent: Self::Node, node: Self::Node) -> f64;

    /// Push the successors of `node` into `out`.
    fn successors(&mut self, node: Self::Node, out: &mut Vec<Self::Node>);

    /// Make `parent` the backpointer of `node` with the given costs.
    fn set_backpointer(&mut self, parent: Self::Node, node: Self::Node, g: f64, h: f64);

    /// `true` if the search is done once `node` has been expanded.
    fn stop_condition(&mut self, _node: Self::Node) -> bool {
        false
    }
}

/// How a call to [`BestFirst::run`] ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchStatus<N> {
    /// `stop_condition` fired for this node.
    Found(N),
    /// The open set ran dry.
    Exhausted,
    /// The expansion budget was spent.
    LimitReached,
}

/// Open/closed bookkeeping and the search loop.
pub struct BestFirst<N> {
    open:       OpenSet<N>,
    closed:     FxHashSet<N>,
    expansions: usize,
    scratch:    Vec<N>,
}

impl<N: Copy + Eq + Hash + Ord + Debug> BestFirst<N> {
    pub fn new() -> Self {
        Self {
            open:       OpenSet::new(),
            closed:     FxHashSet::default(),
            expansions: 0,
            scratch:    Vec::new(),
        }
    }

    /// Queue a root node.  Its `g` must already be recorded by the problem.
    pub fn seed<P>(&mut self, problem: &mut P, node: N)
    where
        P: SearchProblem<Node = N>,
    {
        let h = problem.h(node);
        self.open.push(node, problem.g(node) + h, h);
    }

    #[inline]
    pub fn is_closed(&self, node: N) -> bool {
        self.closed.contains(&node)
    }

    #[inline]
    pub fn is_open(&self, node: N) -> bool {
        self.open.contains(node)
    }

    /// Total expansions since construction or the last [`clear`](Self::clear).
    #[inline]
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Lowest `f` still queued: a lower bound on `f` of anything not yet
    /// expanded when the heuristic is consistent.
    pub fn min_f(&mut self) -> Option<f64> {
        self.open.peek_f()
    }

    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    pub fn clear(&mut self) {
        self.open.clear();
        self.closed.clear();
        self.expansions = 0;
    }

    /// Run until a stop, exhaustion, or `limit` further expansions.
    pub fn run<P>(&mut self, problem: &mut P, limit: Option<usize>) -> SearchStatus<N>
    where
        P: SearchProblem<Node = N>,
    {
        let budget_end = limit.map(|l| self.expansions.saturating_add(l));
        let mut succ = std::mem::take(&mut self.scratch);

        let status = loop {
            if budget_end.is_some_and(|end| self.expansions >= end) {
                break SearchStatus::LimitReached;
            }
            let Some((node, _)) = self.open.pop() else {
                break SearchStatus::Exhausted;
            };
            if !self.closed.insert(node) {
                continue;
            }
            self.expansions += 1;

            succ.clear();
            problem.successors(node, &mut succ);
            for &next in &succ {
                if self.closed.contains(&next) {
                    continue;
                }
                let g = problem.g_prime(node, next);
                if g < problem.g(next) - TIME_EPSILON {
                    let h = problem.h(next);
                    if !h.is_finite() {
                        continue;
                    }
                    problem.set_backpointer(node, next, g, h);
                    self.open.push(next, g + h, h);
                }
            }

            if problem.stop_condition(node) {
                break SearchStatus::Found(node);
            }
        };

        self.scratch = succ;
        status
    }
}

impl<N: Copy + Eq + Hash + Ord + Debug> Default for BestFirst<N> {
    fn default() -> Self {
        Self::new()
    }
}
