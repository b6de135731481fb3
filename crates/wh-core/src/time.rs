//! Continuous simulation time.
//!
//! Robot motion is timed by the kinematic model in [`crate::physics`], so
//! times are real-valued seconds rather than integer ticks.  Two tolerances
//! govern every comparison between times produced by separate computations:
//!
//! - [`TIME_EPSILON`]: intervals that merely touch within this slack do not
//!   conflict.
//! - [`COALESCE_GAP`]: same-node intervals separated by less than this gap are
//!   merged into one claim when a plan is extracted.

/// Simulation time or duration in seconds.
pub type Seconds = f64;

/// Slack under which two time instants are considered equal.
pub const TIME_EPSILON: Seconds = 1e-6;

/// Gap (one millisecond) under which adjacent same-node claims are merged.
pub const COALESCE_GAP: Seconds = 1e-3;

/// `true` if `a` and `b` differ by at most [`TIME_EPSILON`].
#[inline]
pub fn approx_eq(a: Seconds, b: Seconds) -> bool {
    (a - b).abs() <= TIME_EPSILON
}
