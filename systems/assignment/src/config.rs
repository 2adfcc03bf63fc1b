use serde::{Deserialize, Serialize};

/// Tuning of the assignment engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Ticks between two job searches of the same unit.
    pub search_interval_ticks: f32,
    /// Distance in tiles a competitor must beat the current holder by, on top
    /// of being closer, before it may take the job.
    pub incumbency_bonus: f32,
    /// Offset added to the weighted distance of kinds with non-positive preference.
    pub last_resort_penalty: f32,
    /// Maximum number of waypoints kept per planned path.
    pub max_path_depth: usize,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            search_interval_ticks: 10.0,
            incumbency_bonus: 0.5,
            last_resort_penalty: 1.0e6,
            max_path_depth: 4096,
        }
    }
}
