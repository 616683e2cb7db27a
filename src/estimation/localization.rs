//! Robot pose estimation.
//!
//! Fuses odometry-predicted motion with weighted landmark trilateration,
//! then smooths each floor axis through an independent [`ScalarFilter`].
//! Runs once per control cycle.

use crate::core::{LandmarkId, Point3};
use crate::estimation::ScalarFilter;
use crate::world::sensors::EntityHandle;
use crate::world::store::WarehouseStore;
use crate::world::SensorSuite;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// Configuration for the localizer.
#[derive(Debug, Clone)]
pub struct LocalizerConfig {
    /// Landmark detection range (meters).
    pub sensor_range: f32,

    /// Magnitude of the symmetric uniform noise added to the odometry
    /// delta each prediction (meters). Models encoder slip.
    pub noise_magnitude: f32,

    /// Normalizer for the trilateration blend factor:
    /// blend = clamp(total_weight / normalizer, 0, 1).
    pub weight_normalizer: f32,

    /// Minimum distinct landmarks required before a correction is applied.
    pub min_landmarks: usize,

    /// Distance softening term in the inverse-square weights.
    pub epsilon: f32,

    /// Process noise Q of the per-axis smoothing filters.
    pub process_noise: f32,

    /// Measurement noise R of the per-axis smoothing filters.
    pub measurement_noise: f32,

    /// RNG seed for the prediction noise (0 = nondeterministic).
    pub seed: u64,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            sensor_range: 6.0,
            noise_magnitude: 0.02,
            weight_normalizer: 4.0,
            min_landmarks: 3,
            epsilon: 0.1,
            process_noise: 0.01,
            measurement_noise: 0.1,
            seed: 0,
        }
    }
}

/// Recursive pose estimator for one robot.
///
/// One instance per robot; the x and z channels each own a filter and are
/// never cross-fed.
#[derive(Debug)]
pub struct Localizer {
    config: LocalizerConfig,
    estimate: Point3,
    prev_odometry: Point3,
    filter_x: ScalarFilter,
    filter_z: ScalarFilter,
    rng: StdRng,
}

impl Localizer {
    /// Create a localizer seeded at the robot's known starting pose.
    pub fn new(config: LocalizerConfig, initial_pose: Point3) -> Self {
        let rng = if config.seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(config.seed)
        };

        let filter_x = ScalarFilter::new(
            initial_pose.x,
            1.0,
            config.process_noise,
            config.measurement_noise,
        );
        let filter_z = ScalarFilter::new(
            initial_pose.z,
            1.0,
            config.process_noise,
            config.measurement_noise,
        );

        Self {
            config,
            estimate: initial_pose,
            prev_odometry: initial_pose,
            filter_x,
            filter_z,
            rng,
        }
    }

    /// Current best pose estimate.
    pub fn estimate(&self) -> Point3 {
        self.estimate
    }

    /// Run one localization cycle and return the updated estimate.
    pub fn tick(
        &mut self,
        odometry: Point3,
        sensors: &dyn SensorSuite,
        store: &dyn WarehouseStore,
    ) -> Point3 {
        // 1. Predict: previous estimate plus odometry delta plus noise
        let delta = odometry - self.prev_odometry;
        self.prev_odometry = odometry;

        let m = self.config.noise_magnitude;
        let (nx, nz) = if m > 0.0 {
            (self.rng.gen_range(-m..=m), self.rng.gen_range(-m..=m))
        } else {
            (0.0, 0.0)
        };

        let mut predicted = Point3::new(
            self.estimate.x + delta.x + nx,
            odometry.y,
            self.estimate.z + delta.z + nz,
        );

        // 2. Sense: proximity hits confirmed by line of sight, deduplicated
        let seen = self.visible_landmarks(predicted, sensors);

        // 3. Correct: weighted centroid blend, only with enough landmarks
        if seen.len() >= self.config.min_landmarks {
            predicted = self.correct(predicted, &seen, store);
        }

        // 4. Smooth each axis independently
        let x = self.filter_x.update(predicted.x);
        let z = self.filter_z.update(predicted.z);
        self.estimate = Point3::new(x, odometry.y, z);
        self.estimate
    }

    /// Landmarks in range whose line of sight reports them as first hit.
    fn visible_landmarks(&self, origin: Point3, sensors: &dyn SensorSuite) -> Vec<LandmarkId> {
        let mut seen: Vec<LandmarkId> = Vec::new();

        for (handle, sensed_pos) in sensors.proximity(origin, self.config.sensor_range) {
            let EntityHandle::Landmark(id) = handle else {
                continue;
            };
            if seen.contains(&id) {
                continue;
            }
            if sensors.line_of_sight(origin, sensed_pos) == Some(EntityHandle::Landmark(id)) {
                seen.push(id);
            }
        }

        seen
    }

    /// Blend the prediction toward the inverse-square-weighted landmark
    /// centroid. A failed position lookup drops that landmark only.
    fn correct(
        &mut self,
        predicted: Point3,
        landmarks: &[LandmarkId],
        store: &dyn WarehouseStore,
    ) -> Point3 {
        let eps = self.config.epsilon;
        let mut total_weight = 0.0f32;
        let mut cx = 0.0f32;
        let mut cz = 0.0f32;

        for &id in landmarks {
            let position = match store.landmark_position(id) {
                Ok(p) => p,
                Err(e) => {
                    warn!(landmark = id, error = %e, "landmark lookup failed, skipping");
                    continue;
                }
            };

            let d = predicted.distance_xz(&position);
            let w = 1.0 / ((d + eps) * (d + eps));
            total_weight += w;
            cx += position.x * w;
            cz += position.z * w;
        }

        if total_weight <= 0.0 {
            return predicted;
        }

        let centroid = Point3::new(cx / total_weight, predicted.y, cz / total_weight);
        let blend = (total_weight / self.config.weight_normalizer).clamp(0.0, 1.0);
        predicted.lerp(&centroid, blend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::sim::Arena;
    use crate::world::store::MemoryStore;

    fn quiet_config() -> LocalizerConfig {
        LocalizerConfig {
            noise_magnitude: 0.0,
            // Near-total trust in the corrected measurement
            process_noise: 1.0,
            measurement_noise: 0.0001,
            seed: 42,
            ..Default::default()
        }
    }

    fn triangle_world() -> (Arena, MemoryStore) {
        let mut arena = Arena::default();
        let mut store = MemoryStore::new();
        for (id, x, z) in [(1u32, 2.0f32, 0.0f32), (2, -2.0, 2.0), (3, -2.0, -2.0)] {
            arena.add_landmark(id, Point3::new(x, 0.0, z));
            store.add_landmark(id, Point3::new(x, 0.0, z));
        }
        (arena, store)
    }

    #[test]
    fn test_prediction_follows_odometry_delta() {
        let arena = Arena::default(); // no landmarks at all
        let store = MemoryStore::new();
        let mut localizer = Localizer::new(quiet_config(), Point3::ZERO);

        let est = localizer.tick(Point3::new(1.0, 0.0, 0.5), &arena, &store);
        assert!((est.x - 1.0).abs() < 0.01);
        assert!((est.z - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_correction_pulls_toward_landmark_centroid() {
        let (arena, store) = triangle_world();

        // Start the estimate badly off while odometry stands still: only
        // the landmark correction can pull it back toward the origin area.
        let mut localizer = Localizer::new(quiet_config(), Point3::new(1.5, 0.0, 1.5));
        let start_error = localizer.estimate().distance_xz(&Point3::ZERO);

        let mut est = localizer.estimate();
        for _ in 0..30 {
            est = localizer.tick(Point3::new(1.5, 0.0, 1.5), &arena, &store);
        }

        assert!(est.distance_xz(&Point3::ZERO) < start_error);
    }

    #[test]
    fn test_no_correction_below_three_landmarks() {
        let mut arena = Arena::default();
        let mut store = MemoryStore::new();
        for (id, x, z) in [(1u32, 2.0f32, 0.0f32), (2, -2.0, 2.0)] {
            arena.add_landmark(id, Point3::new(x, 0.0, z));
            store.add_landmark(id, Point3::new(x, 0.0, z));
        }

        let mut localizer = Localizer::new(quiet_config(), Point3::new(1.5, 0.0, 1.5));

        // With two visible landmarks the estimate must track prediction
        // only, i.e. stay at the (stationary) odometry-propagated pose.
        let mut est = localizer.estimate();
        for _ in 0..10 {
            est = localizer.tick(Point3::new(1.5, 0.0, 1.5), &arena, &store);
        }
        assert!((est.x - 1.5).abs() < 0.01);
        assert!((est.z - 1.5).abs() < 0.01);
    }

    #[test]
    fn test_occluded_landmark_not_counted() {
        let (mut arena, _store) = triangle_world();
        // Wall between the robot area and landmark 1
        arena.add_obstacle(100, Point3::new(1.0, 0.0, 0.0), 0.4);

        let localizer = Localizer::new(quiet_config(), Point3::ZERO);
        let seen = localizer.visible_landmarks(Point3::ZERO, &arena);

        assert!(!seen.contains(&1));
        assert!(seen.contains(&2));
        assert!(seen.contains(&3));
    }

    #[test]
    fn test_landmark_lookup_failure_degrades_gracefully() {
        let (arena, _) = triangle_world();
        // Store only knows two of the three visible landmarks
        let mut store = MemoryStore::new();
        store.add_landmark(2, Point3::new(-2.0, 0.0, 2.0));
        store.add_landmark(3, Point3::new(-2.0, 0.0, -2.0));

        let mut localizer = Localizer::new(quiet_config(), Point3::new(0.5, 0.0, 0.5));

        // Must not panic; correction uses the two resolvable landmarks
        let est = localizer.tick(Point3::ZERO, &arena, &store);
        assert!(est.x.is_finite() && est.z.is_finite());
    }
}
