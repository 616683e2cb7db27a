//! Direction decision engine.
//!
//! Consumes an angular distance profile and produces a single steering
//! decision: keep going, steer to a new heading, or stop and wait.
//! Angles are sensor-frame degrees with 90 pointing straight ahead;
//! index 359 is adjacent to index 0.

use crate::core::types::{angular_diff_deg, normalize_deg};
use crate::sensing::RangeProfile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

/// Outcome of one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteerDecision {
    /// No obstacle clusters; keep the current heading.
    Clear,

    /// Turn to `heading_deg` (sensor frame); `opposite_deg` is the
    /// fallback heading 180° away.
    Steer { heading_deg: f32, opposite_deg: f32 },

    /// Too much of the field is blocked; stop and resume after cooldown.
    Stop { resume_after: Duration },
}

/// An obstacle cluster: a maximal circular run of blocked ray indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cluster {
    /// First blocked index of the run.
    start: usize,
    /// Run length in rays (≥ 1).
    len: usize,
}

impl Cluster {
    fn end(&self, ray_count: usize) -> usize {
        (self.start + self.len - 1) % ray_count
    }
}

/// A clear gap: a circular run of unblocked indices.
#[derive(Debug, Clone, Copy)]
struct Gap {
    start: usize,
    len: usize,
}

impl Gap {
    fn midpoint(&self, ray_count: usize) -> f32 {
        ((self.start + self.len / 2) % ray_count) as f32
    }
}

/// Configuration for the decision engine.
#[derive(Debug, Clone)]
pub struct SteeringEngineConfig {
    /// Minimum clear angular window required to steer through (degrees).
    /// Also the clearance margin applied past a cluster edge.
    pub clear_angle_deg: f32,

    /// Blocked fraction at which a full stop is signalled.
    pub stop_fraction: f32,

    /// Automatic resume delay after a stop.
    pub stop_cooldown: Duration,

    /// Weight of wide-angle side rays relative to front-arc rays when
    /// comparing left vs right blocked totals. Must be < 1.
    pub side_weight: f32,

    /// Half-width of the front arc used by the side weighting (degrees).
    pub front_arc_deg: f32,

    /// Default heading in the sensor frame (degrees).
    pub default_heading_deg: f32,

    /// RNG seed for tie-breaks (0 = nondeterministic).
    pub seed: u64,
}

impl Default for SteeringEngineConfig {
    fn default() -> Self {
        Self {
            clear_angle_deg: 20.0,
            stop_fraction: 0.6,
            stop_cooldown: Duration::from_secs(3),
            side_weight: 0.5,
            front_arc_deg: 60.0,
            default_heading_deg: 90.0,
            seed: 0,
        }
    }
}

/// Converts a [`RangeProfile`] into a steering decision.
///
/// Holds the currently commanded heading; the caller resets it to the
/// default once the robot has completed the commanded turn, so the next
/// detection cycle re-evaluates from straight ahead.
pub struct SteeringEngine {
    config: SteeringEngineConfig,
    heading_deg: f32,
    rng: StdRng,
}

impl SteeringEngine {
    pub fn new(config: SteeringEngineConfig) -> Self {
        let rng = if config.seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(config.seed)
        };
        let heading_deg = config.default_heading_deg;
        Self {
            config,
            heading_deg,
            rng,
        }
    }

    /// Current commanded heading (sensor frame, degrees).
    pub fn heading(&self) -> f32 {
        self.heading_deg
    }

    /// Reset the heading to the default after a completed turn.
    pub fn reset_heading(&mut self) {
        self.heading_deg = self.config.default_heading_deg;
    }

    /// Decide a steering action for one profile.
    pub fn decide(&mut self, profile: &RangeProfile) -> SteerDecision {
        let n = profile.len();
        if n == 0 {
            return SteerDecision::Clear;
        }

        if profile.blocked_fraction() >= self.config.stop_fraction {
            debug!(
                blocked = profile.blocked_count(),
                rays = n,
                "field mostly blocked, stopping"
            );
            return SteerDecision::Stop {
                resume_after: self.config.stop_cooldown,
            };
        }

        let clusters = find_clusters(profile);
        match clusters.len() {
            0 => SteerDecision::Clear,
            1 => self.steer_around_span(clusters[0], n),
            2 => self.steer_between(clusters[0], clusters[1], n),
            _ => self.steer_into_clear_run(profile, n),
        }
    }

    /// Single obstacle cluster: escape around whichever far edge has the
    /// shorter arc back to the opposite of the current heading.
    fn steer_around_span(&mut self, span: Cluster, n: usize) -> SteerDecision {
        let margin = self.config.clear_angle_deg.round() as usize;
        let lo = span.start;
        let hi = span.end(n);

        // Escape candidates: first clear index past each edge, pushed a
        // further clearance margin into the arc.
        let ccw_candidate = ((hi + 1 + margin) % n) as f32;
        let cw_candidate = ((lo + n - 1 - margin) % n) as f32;

        let opposite = normalize_deg(self.heading_deg + 180.0) as usize % n;

        // Arc lengths from each first-clear edge around to the opposite heading
        let ccw_arc = (opposite + n - (hi + 1) % n) % n;
        let cw_arc = ((lo + n - 1) % n + n - opposite) % n;

        let go_ccw = match ccw_arc.cmp(&cw_arc) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.rng.gen_bool(0.5),
        };

        let heading = if go_ccw { ccw_candidate } else { cw_candidate };
        self.heading_deg = heading;
        SteerDecision::Steer {
            heading_deg: heading,
            opposite_deg: normalize_deg(heading + 180.0),
        }
    }

    /// Two clusters: pass through a qualifying gap between them, or treat
    /// them as one virtual span when both gaps are too narrow.
    fn steer_between(&mut self, a: Cluster, b: Cluster, n: usize) -> SteerDecision {
        let min_gap = self.config.clear_angle_deg.round() as usize;

        let gap_ab = gap_between(a, b, n);
        let gap_ba = gap_between(b, a, n);

        let qualifying: Vec<Gap> = [gap_ab, gap_ba]
            .into_iter()
            .filter(|g| g.len >= min_gap)
            .collect();

        if let Some(best) = qualifying.into_iter().min_by(|x, y| {
            let dx = angular_diff_deg(x.midpoint(n), self.heading_deg);
            let dy = angular_diff_deg(y.midpoint(n), self.heading_deg);
            dx.partial_cmp(&dy).unwrap_or(std::cmp::Ordering::Equal)
        }) {
            let heading = best.midpoint(n);
            self.heading_deg = heading;
            return SteerDecision::Steer {
                heading_deg: heading,
                opposite_deg: normalize_deg(heading + 180.0),
            };
        }

        // No gap wide enough: merge into a virtual span across the
        // narrower gap and fall back to single-cluster arc selection.
        let merged = if gap_ab.len <= gap_ba.len {
            Cluster {
                start: a.start,
                len: a.len + gap_ab.len + b.len,
            }
        } else {
            Cluster {
                start: b.start,
                len: b.len + gap_ba.len + a.len,
            }
        };
        self.steer_around_span(merged, n)
    }

    /// Three or more clusters: head for the midpoint of a clear run at
    /// least the minimum clear angle wide; stop when none exists.
    fn steer_into_clear_run(&mut self, profile: &RangeProfile, n: usize) -> SteerDecision {
        let min_run = self.config.clear_angle_deg.round() as usize;

        let runs = find_clear_runs(profile);
        let best = runs
            .into_iter()
            .filter(|g| g.len >= min_run)
            .min_by(|x, y| {
                let dx = angular_diff_deg(x.midpoint(n), self.heading_deg);
                let dy = angular_diff_deg(y.midpoint(n), self.heading_deg);
                dx.partial_cmp(&dy).unwrap_or(std::cmp::Ordering::Equal)
            });

        match best {
            Some(gap) => {
                let heading = gap.midpoint(n);
                self.heading_deg = heading;
                SteerDecision::Steer {
                    heading_deg: heading,
                    opposite_deg: normalize_deg(heading + 180.0),
                }
            }
            None => SteerDecision::Stop {
                resume_after: self.config.stop_cooldown,
            },
        }
    }

    /// Weighted blocked-ray totals for the left (high-index) and right
    /// (low-index) halves of the field. Rays inside the front arc count
    /// fully; wide-angle side rays count at `side_weight`.
    pub fn weighted_side_counts(&self, profile: &RangeProfile) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;
        let center = self.config.default_heading_deg;
        let half_front = self.config.front_arc_deg / 2.0;

        for i in 0..profile.len() {
            if !profile.is_blocked(i) {
                continue;
            }
            let angle = profile.sample(i).angle_deg as f32;
            let weight = if angular_diff_deg(angle, center) <= half_front {
                1.0
            } else {
                self.config.side_weight
            };

            // Sensor frame: angles in (90, 270) are the robot's left
            if angle > center && angle < center + 180.0 {
                left += weight;
            } else {
                right += weight;
            }
        }
        (left, right)
    }
}

/// Partition blocked indices into maximal circular runs.
fn find_clusters(profile: &RangeProfile) -> Vec<Cluster> {
    let n = profile.len();
    if n == 0 {
        return Vec::new();
    }
    if profile.blocked_count() == n {
        return vec![Cluster { start: 0, len: n }];
    }

    let mut clusters = Vec::new();
    for i in 0..n {
        let prev = (i + n - 1) % n;
        if profile.is_blocked(i) && !profile.is_blocked(prev) {
            // Run starts here; walk it forward
            let mut len = 1;
            while profile.is_blocked((i + len) % n) {
                len += 1;
            }
            clusters.push(Cluster { start: i, len });
        }
    }
    clusters
}

/// Partition clear indices into maximal circular runs.
fn find_clear_runs(profile: &RangeProfile) -> Vec<Gap> {
    let n = profile.len();
    if n == 0 {
        return Vec::new();
    }
    if profile.blocked_count() == 0 {
        return vec![Gap { start: 0, len: n }];
    }

    let mut runs = Vec::new();
    for i in 0..n {
        let prev = (i + n - 1) % n;
        if !profile.is_blocked(i) && profile.is_blocked(prev) {
            let mut len = 1;
            while !profile.is_blocked((i + len) % n) {
                len += 1;
            }
            runs.push(Gap { start: i, len });
        }
    }
    runs
}

/// The clear gap running forward (increasing index) from the end of
/// cluster `a` to the start of cluster `b`.
fn gap_between(a: Cluster, b: Cluster, n: usize) -> Gap {
    let start = (a.end(n) + 1) % n;
    let len = (b.start + n - start) % n;
    Gap { start, len }
}
