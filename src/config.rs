//! Configuration loading for the fleet controller.

use crate::error::{GodamError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Fleet orchestration parameters
#[derive(Clone, Debug, Deserialize)]
pub struct OrchestratorConfig {
    /// Distance below which two robots are in proximity conflict (meters)
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: f32,

    /// How long a conflicted robot waits before resuming (seconds)
    #[serde(default = "default_wait_duration")]
    pub wait_duration_secs: f32,

    /// Orchestrator poll interval in ticks (pending retry + store poll)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ticks: u32,

    /// Distance from home beyond which the battery drains (meters)
    #[serde(default = "default_home_tolerance")]
    pub home_tolerance: f32,
}

/// Battery and recharge parameters
#[derive(Clone, Debug, Deserialize)]
pub struct BatteryConfig {
    /// Battery level below which a recharge is forced (0-100)
    #[serde(default = "default_critical_level")]
    pub critical_level: f32,

    /// Battery drain per second while away from home
    #[serde(default = "default_drain_per_sec")]
    pub drain_per_sec: f32,

    /// Duration of a full 0-100 charge (seconds)
    #[serde(default = "default_charge_duration")]
    pub charge_duration_secs: f32,
}

/// Local obstacle avoidance parameters
#[derive(Clone, Debug, Deserialize)]
pub struct SteeringConfig {
    /// Number of rays in a full sweep (one per degree by default)
    #[serde(default = "default_ray_count")]
    pub ray_count: usize,

    /// Maximum sensor range; measurements are capped here (meters)
    #[serde(default = "default_max_range")]
    pub max_range: f32,

    /// Distance below which a ray is classified as an obstacle (meters)
    #[serde(default = "default_obstacle_threshold")]
    pub obstacle_threshold: f32,

    /// Minimum clear angular window required to steer through (degrees)
    #[serde(default = "default_clear_angle")]
    pub clear_angle_deg: f32,

    /// Blocked-ray fraction at which a full stop is signalled
    #[serde(default = "default_stop_fraction")]
    pub stop_fraction: f32,

    /// Automatic resume delay after a full stop (seconds)
    #[serde(default = "default_stop_cooldown")]
    pub stop_cooldown_secs: f32,

    /// Weight of wide-angle side rays relative to front-arc rays
    #[serde(default = "default_side_weight")]
    pub side_weight: f32,

    /// Default heading in the sensor frame (degrees, 90 = straight ahead)
    #[serde(default = "default_heading")]
    pub default_heading_deg: f32,

    /// Seed for steering tie-breaks (0 = nondeterministic)
    #[serde(default)]
    pub seed: u64,
}

/// Path planning parameters
#[derive(Clone, Debug, Deserialize)]
pub struct PlanningConfig {
    /// Grid cell size (meters)
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,

    /// Movement penalty added near shelving (unitless, per cell)
    #[serde(default = "default_shelf_penalty")]
    pub shelf_penalty: u32,
}

/// Localization parameters
#[derive(Clone, Debug, Deserialize)]
pub struct LocalizationConfig {
    /// Landmark detection range (meters)
    #[serde(default = "default_sensor_range")]
    pub sensor_range: f32,

    /// Magnitude of symmetric uniform odometry noise (meters)
    #[serde(default = "default_noise_magnitude")]
    pub noise_magnitude: f32,

    /// Normalizer for the trilateration blend weight
    #[serde(default = "default_weight_normalizer")]
    pub weight_normalizer: f32,

    /// Minimum distinct landmarks required for a correction
    #[serde(default = "default_min_landmarks")]
    pub min_landmarks: usize,

    /// Process noise Q of the per-axis smoothing filters
    #[serde(default = "default_process_noise")]
    pub process_noise: f32,

    /// Measurement noise R of the per-axis smoothing filters
    #[serde(default = "default_measurement_noise")]
    pub measurement_noise: f32,

    /// Seed for odometry noise (0 = nondeterministic)
    #[serde(default)]
    pub seed: u64,
}

/// Simulation run parameters
#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    /// Fixed tick duration (seconds)
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// Tick limit before the run is abandoned
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

// Default value functions
fn default_proximity_threshold() -> f32 {
    1.2
}
fn default_wait_duration() -> f32 {
    2.0
}
fn default_poll_interval() -> u32 {
    10
}
fn default_home_tolerance() -> f32 {
    0.5
}
fn default_critical_level() -> f32 {
    15.0
}
fn default_drain_per_sec() -> f32 {
    0.25
}
fn default_charge_duration() -> f32 {
    30.0
}
fn default_ray_count() -> usize {
    360
}
fn default_max_range() -> f32 {
    4.0
}
fn default_obstacle_threshold() -> f32 {
    1.0
}
fn default_clear_angle() -> f32 {
    20.0
}
fn default_stop_fraction() -> f32 {
    0.6
}
fn default_stop_cooldown() -> f32 {
    3.0
}
fn default_side_weight() -> f32 {
    0.5
}
fn default_heading() -> f32 {
    90.0
}
fn default_cell_size() -> f32 {
    0.5
}
fn default_shelf_penalty() -> u32 {
    3
}
fn default_sensor_range() -> f32 {
    6.0
}
fn default_noise_magnitude() -> f32 {
    0.02
}
fn default_weight_normalizer() -> f32 {
    4.0
}
fn default_min_landmarks() -> usize {
    3
}
fn default_process_noise() -> f32 {
    0.01
}
fn default_measurement_noise() -> f32 {
    0.1
}
fn default_dt() -> f32 {
    0.05
}
fn default_max_ticks() -> u64 {
    200_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: default_proximity_threshold(),
            wait_duration_secs: default_wait_duration(),
            poll_interval_ticks: default_poll_interval(),
            home_tolerance: default_home_tolerance(),
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            critical_level: default_critical_level(),
            drain_per_sec: default_drain_per_sec(),
            charge_duration_secs: default_charge_duration(),
        }
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            ray_count: default_ray_count(),
            max_range: default_max_range(),
            obstacle_threshold: default_obstacle_threshold(),
            clear_angle_deg: default_clear_angle(),
            stop_fraction: default_stop_fraction(),
            stop_cooldown_secs: default_stop_cooldown(),
            side_weight: default_side_weight(),
            default_heading_deg: default_heading(),
            seed: 0,
        }
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            shelf_penalty: default_shelf_penalty(),
        }
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            sensor_range: default_sensor_range(),
            noise_magnitude: default_noise_magnitude(),
            weight_normalizer: default_weight_normalizer(),
            min_landmarks: default_min_landmarks(),
            process_noise: default_process_noise(),
            measurement_noise: default_measurement_noise(),
            seed: 0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl FleetConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GodamError::Config(format!("Failed to read config file: {}", e)))?;
        let mut config: FleetConfig = toml::from_str(&content)?;
        // The orchestrator polls on tick % interval; zero is not a rate
        config.orchestrator.poll_interval_ticks = config.orchestrator.poll_interval_ticks.max(1);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FleetConfig::default();
        assert_eq!(config.steering.ray_count, 360);
        assert!((config.steering.stop_fraction - 0.6).abs() < 1e-6);
        assert_eq!(config.localization.min_landmarks, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[battery]\ncritical_level = 20.0").unwrap();

        let config = FleetConfig::load(file.path()).unwrap();
        assert!((config.battery.critical_level - 20.0).abs() < 1e-6);
        // Untouched sections keep defaults
        assert!((config.battery.charge_duration_secs - 30.0).abs() < 1e-6);
        assert!((config.orchestrator.proximity_threshold - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_zero_poll_interval_clamped_to_one() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[orchestrator]\npoll_interval_ticks = 0").unwrap();

        let config = FleetConfig::load(file.path()).unwrap();
        assert_eq!(config.orchestrator.poll_interval_ticks, 1);
    }
}
