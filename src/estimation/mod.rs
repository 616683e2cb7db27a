//! Recursive state estimation.
//!
//! - [`ScalarFilter`]: 1-D recursive Bayesian filter, one instance per
//!   scalar channel (axis or ray index).
//! - [`Localizer`]: odometry prediction + weighted landmark trilateration,
//!   smoothed per-axis through scalar filters.

pub mod localization;
pub mod scalar_filter;

pub use localization::{Localizer, LocalizerConfig};
pub use scalar_filter::ScalarFilter;
