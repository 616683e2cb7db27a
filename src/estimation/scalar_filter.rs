//! 1-D recursive Bayesian filter.
//!
//! Smooths a stream of noisy scalar measurements (a distance along one ray,
//! one position axis). Each instance tracks exactly one channel; channels
//! are never shared.

/// Recursive scalar estimator (1-D Kalman filter).
#[derive(Debug, Clone)]
pub struct ScalarFilter {
    /// Current best estimate.
    estimate: f32,
    /// Current estimate variance.
    variance: f32,
    /// Process noise Q, added to the variance each prediction.
    process_noise: f32,
    /// Measurement noise R.
    measurement_noise: f32,
}

impl ScalarFilter {
    /// Create a filter with an initial estimate and variance.
    pub fn new(
        initial_estimate: f32,
        initial_variance: f32,
        process_noise: f32,
        measurement_noise: f32,
    ) -> Self {
        Self {
            estimate: initial_estimate,
            variance: initial_variance,
            process_noise,
            measurement_noise,
        }
    }

    /// Fold one measurement into the estimate and return the new estimate.
    ///
    /// Predict, gain, correct, then shrink the variance. With R = 0 the
    /// gain saturates at 1 and the filter tracks the raw measurement
    /// without dividing by zero (prior variance is positive for Q > 0).
    pub fn update(&mut self, measurement: f32) -> f32 {
        let prior_variance = self.variance + self.process_noise;

        let denom = prior_variance + self.measurement_noise;
        let gain = if denom > f32::EPSILON {
            prior_variance / denom
        } else {
            1.0
        };

        self.estimate += gain * (measurement - self.estimate);
        self.variance = (1.0 - gain) * prior_variance;
        self.estimate
    }

    /// Current estimate without folding a new measurement.
    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    /// Current variance.
    pub fn variance(&self) -> f32 {
        self.variance
    }

    /// Re-seed the filter at a new estimate, keeping the noise model.
    pub fn reset(&mut self, estimate: f32, variance: f32) {
        self.estimate = estimate;
        self.variance = variance;
    }
}
