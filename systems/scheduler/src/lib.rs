#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed per-tick ordering of the warren systems.
//!
//! One tick advances the clock, then runs saturation, assignment with job
//! execution, and movement. Each stage reads fresh views of the world and its
//! commands are applied before the next stage starts.

use serde::{Deserialize, Serialize};
use tracing::trace;
use warren_core::{Command, Event, JobScripts, TileMap};
use warren_system_assignment::{Assignment, AssignmentConfig, AssignmentView};
use warren_system_movement::{Movement, MovementConfig, Navigator};
use warren_system_pathfinding::SearchGrid;
use warren_system_saturation::Saturation;
use warren_world::{self as world, query, World};

/// Tuning shared by every system of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Search grid cells along one tile edge.
    pub granularity: u32,
    /// Assignment engine tuning.
    pub assignment: AssignmentConfig,
    /// Path follower tuning.
    pub movement: MovementConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            granularity: SearchGrid::DEFAULT_GRANULARITY,
            assignment: AssignmentConfig::default(),
            movement: MovementConfig::default(),
        }
    }
}

/// Owns the systems of one simulation and steps them in order.
#[derive(Debug)]
pub struct Scheduler {
    saturation: Saturation,
    assignment: Assignment,
    movement: Movement,
    navigator: Navigator,
}

impl Scheduler {
    /// Builds the systems described by `config`.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            saturation: Saturation::new(),
            assignment: Assignment::new(config.assignment),
            movement: Movement::new(config.movement),
            navigator: Navigator::new(config.granularity, config.assignment.max_path_depth),
        }
    }

    /// Simulates one tick and returns every event the world emitted.
    pub fn step(
        &mut self,
        world: &mut World,
        map: &dyn TileMap,
        scripts: &mut dyn JobScripts,
    ) -> Vec<Event> {
        let mut log = Vec::new();
        world::apply(world, Command::Tick, &mut log);
        let tick_events = log.clone();
        let mut commands = Vec::new();

        self.saturation
            .handle(&tick_events, &query::unit_view(world), &mut commands);
        flush(world, &mut commands, &mut log);

        let units = query::unit_view(world);
        let jobs = query::job_view(world);
        let kinds = query::job_kinds(world);
        self.assignment.handle(
            &tick_events,
            AssignmentView {
                units: &units,
                jobs: &jobs,
                kinds: &kinds,
                map,
            },
            &mut self.navigator,
            scripts,
            &mut commands,
        );
        flush(world, &mut commands, &mut log);

        self.movement
            .handle(&tick_events, &query::unit_view(world), map, &mut commands);
        flush(world, &mut commands, &mut log);

        trace!(tick = query::tick(world), events = log.len(), "tick simulated");
        log
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

fn flush(world: &mut World, commands: &mut Vec<Command>, log: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_system_movement::LengthMode;
    use warren_world::BlockMap;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            granularity = 3

            [movement]
            length_mode = { mode = "interpolated", samples = 8 }
            "#,
        )
        .expect("config parses");

        assert_eq!(config.granularity, 3);
        assert_eq!(config.assignment, AssignmentConfig::default());
        assert_eq!(config.movement.tick_rate, 20.0);
        assert_eq!(
            config.movement.length_mode,
            LengthMode::Interpolated { samples: 8 }
        );
    }

    #[test]
    fn step_advances_the_clock_once() {
        let mut world = World::new();
        let map = BlockMap::open(4, 1.0);
        let mut scheduler = Scheduler::default();
        let mut scripts = NoScripts;

        let events = scheduler.step(&mut world, &map, &mut scripts);

        assert_eq!(events, vec![Event::TimeAdvanced { tick: 1 }]);
        assert_eq!(query::tick(&world), 1);
    }

    struct NoScripts;

    impl JobScripts for NoScripts {
        fn evaluate(
            &mut self,
            _unit: &warren_core::UnitSnapshot,
            _job: &warren_core::JobSnapshot,
        ) -> Result<Option<warren_core::BehaviorVerdict>, warren_core::ScriptError> {
            Ok(None)
        }

        fn preference(
            &mut self,
            _unit: &warren_core::UnitSnapshot,
            _kind: warren_core::JobKindId,
        ) -> Result<f32, warren_core::ScriptError> {
            Ok(0.0)
        }
    }
}
