//! Kinematic timing model: bounded-acceleration straight moves and constant-rate
//! turns.
//!
//! # Movement profile
//!
//! A straight move over distance `D` starting at speed `v0` is modelled as
//! three phases:
//!
//! ```text
//!  speed
//!    ^      ____________
//!  vp|     /            \
//!    |    /              \
//!  v0|___/                \
//!    +---------------------+--> position
//!      s1      s2       s3
//! ```
//!
//! 1. accelerate at `acceleration` from `v0` to the peak speed `vp`,
//! 2. cruise at `vp`,
//! 3. decelerate at `deceleration` to rest exactly at `D`.
//!
//! `vp = max_speed` when the distance is long enough, otherwise the cruise
//! phase vanishes and `vp` is the highest speed from which the robot can still
//! stop in time.  Every query is O(1) (or O(checkpoints)) and side-effect free;
//! the searches call these functions in their innermost loops.

use crate::{Angle, CoreError, CoreResult, Seconds};

// ── KinematicProfile ──────────────────────────────────────────────────────────

/// Per-robot kinematic limits.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KinematicProfile {
    /// Top straight-line speed, m/s.
    pub max_speed: f64,
    /// Speed-up rate, m/s².
    pub acceleration: f64,
    /// Braking rate, m/s².
    pub deceleration: f64,
    /// Rotation rate on the spot, rad/s.
    pub turn_speed: f64,
}

impl Default for KinematicProfile {
    /// Roughly a Kiva-class drive unit.
    fn default() -> Self {
        Self {
            max_speed:    1.5,
            acceleration: 0.5,
            deceleration: 0.5,
            turn_speed:   std::f64::consts::PI / 2.5,
        }
    }
}

impl KinematicProfile {
    /// Reject zero, negative or non-finite limits.
    pub fn validate(&self) -> CoreResult<()> {
        let fields = [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
            ("turn_speed", self.turn_speed),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidProfile { field, value });
            }
        }
        Ok(())
    }
}

// ── Physics ───────────────────────────────────────────────────────────────────

/// Timing functions bound to one kinematic profile.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Physics {
    pub profile: KinematicProfile,
}

/// Phase boundaries of one straight move.
struct SpeedProfile {
    v0:    f64,
    vp:    f64,
    accel: f64,
    decel: f64,
    s1:    f64,
    s2:    f64,
    total_distance: f64,
    t1:    Seconds,
    total_time: Seconds,
}

impl Physics {
    /// Build a timing model.  Fails if any limit is not strictly positive.
    pub fn new(profile: KinematicProfile) -> CoreResult<Self> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// Duration of a straight move of `distance` metres starting at
    /// `initial_speed` and ending at rest.
    pub fn time_to_move(&self, initial_speed: f64, distance: f64) -> Seconds {
        if distance <= 0.0 {
            return 0.0;
        }
        self.speed_profile(initial_speed, distance).total_time
    }

    /// Arrival times (relative to the start of the move) at each checkpoint
    /// of a hop.
    ///
    /// `cumulative` holds the distance from the hop start to every checkpoint
    /// in ascending order; the last entry is the hop length, where the robot
    /// comes to rest.  The last returned time therefore equals
    /// `time_to_move(initial_speed, cumulative.last())`.
    pub fn checkpoint_times(&self, initial_speed: f64, cumulative: &[f64]) -> Vec<Seconds> {
        let Some(&total) = cumulative.last() else {
            return Vec::new();
        };
        if total <= 0.0 {
            return vec![0.0; cumulative.len()];
        }
        let sp = self.speed_profile(initial_speed, total);
        cumulative.iter().map(|&x| sp.time_at(x)).collect()
    }

    /// Duration of an on-the-spot rotation between two compass directions.
    #[inline]
    pub fn time_to_turn(&self, from: Angle, to: Angle) -> Seconds {
        from.delta_radians(to) / self.profile.turn_speed
    }

    /// Lower bound on the time needed to cover `distance` metres.  Used as an
    /// admissible straight-line heuristic.
    #[inline]
    pub fn min_travel_time(&self, distance: f64) -> Seconds {
        distance.max(0.0) / self.profile.max_speed
    }

    fn speed_profile(&self, initial_speed: f64, distance: f64) -> SpeedProfile {
        let p = &self.profile;
        let v0 = initial_speed.clamp(0.0, p.max_speed);
        let (a, mut d) = (p.acceleration, p.deceleration);

        // Moving too fast to stop within `distance`: brake uniformly instead.
        if v0 > 0.0 && v0 * v0 / (2.0 * d) >= distance {
            d = v0 * v0 / (2.0 * distance);
            return SpeedProfile {
                v0,
                vp: v0,
                accel: a,
                decel: d,
                s1: 0.0,
                s2: 0.0,
                total_distance: distance,
                t1: 0.0,
                total_time: v0 / d,
            };
        }

        let s_acc = (p.max_speed * p.max_speed - v0 * v0) / (2.0 * a);
        let s_dec = p.max_speed * p.max_speed / (2.0 * d);
        let vp = if s_acc + s_dec <= distance {
            p.max_speed
        } else {
            ((2.0 * a * d * distance + d * v0 * v0) / (a + d)).sqrt()
        };

        let s1 = (vp * vp - v0 * v0) / (2.0 * a);
        let s3 = vp * vp / (2.0 * d);
        let s2 = (distance - s1 - s3).max(0.0);
        let t1 = (vp - v0) / a;
        let t2 = if s2 > 0.0 { s2 / vp } else { 0.0 };
        let t3 = vp / d;

        SpeedProfile {
            v0,
            vp,
            accel: a,
            decel: d,
            s1,
            s2,
            total_distance: distance,
            t1,
            total_time: t1 + t2 + t3,
        }
    }
}

impl SpeedProfile {
    /// Invert position → time along the profile.
    fn time_at(&self, x: f64) -> Seconds {
        let x = x.clamp(0.0, self.total_distance);
        if x <= self.s1 {
            // v0·t + a·t²/2 = x
            ((self.v0 * self.v0 + 2.0 * self.accel * x).sqrt() - self.v0) / self.accel
        } else if x <= self.s1 + self.s2 {
            self.t1 + (x - self.s1) / self.vp
        } else {
            let remaining = self.total_distance - x;
            self.total_time - (2.0 * remaining / self.decel).sqrt()
        }
    }
}
