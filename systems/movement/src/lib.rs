#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks units along their routes.
//!
//! Routes are planned by the [`Navigator`], which wraps the grid pathfinder,
//! and followed along a Catmull-Rom spline so corners of the grid path are
//! smoothed out. Every tick the system advances each unit with a route and
//! publishes the new position through [`Command::AdvanceUnit`].

mod follower;
mod navigation;
mod spline;

use serde::{Deserialize, Serialize};
use warren_core::{Command, Event, TileMap, UnitView};

pub use follower::{advance_position, Advance, LengthMode};
pub use navigation::{bracket, NavigationError, Navigator, PlannedPath};

/// Tuning of the path follower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Simulation ticks per second.
    pub tick_rate: f32,
    /// How route segment lengths are estimated.
    pub length_mode: LengthMode,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            length_mode: LengthMode::Straight,
        }
    }
}

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement {
    config: MovementConfig,
}

impl Movement {
    /// Creates a movement system using the provided configuration.
    #[must_use]
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Consumes world events and the unit view to emit movement commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        units: &UnitView,
        map: &dyn TileMap,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }
        if self.config.tick_rate <= 0.0 || map.tile_size() <= 0.0 {
            return;
        }

        for unit in units.iter() {
            let Some(route) = unit.route.as_ref() else {
                continue;
            };
            let step = unit.profile.speed / map.tile_size() / self.config.tick_rate;
            let advance = advance_position(
                &route.waypoints,
                route.progress,
                unit.position,
                step,
                self.config.length_mode,
            );
            out.push(match advance {
                Advance::Moving { position, progress } => Command::AdvanceUnit {
                    unit: unit.id,
                    position,
                    progress,
                    finished: false,
                },
                Advance::Arrived { position } => Command::AdvanceUnit {
                    unit: unit.id,
                    position,
                    progress: route.progress,
                    finished: true,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_straight_segments() {
        let config = MovementConfig::default();
        assert_eq!(config.length_mode, LengthMode::Straight);
        assert!(config.tick_rate > 0.0);
    }
}
