//! TOML scenarios describing the map, job kinds, units and starting jobs.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, info};
use warren_core::{
    Command, Event, FactionId, JobAffinity, JobKindDescriptor, JobKindId, JobTarget,
    MovementMask, TileCell, UnitProfile, Waypoint,
};
use warren_system_scheduler::SimulationConfig;
use warren_world::{self as world, BlockMap, World, DEFAULT_FACTION};

use crate::scripts::ScriptConfig;

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Complete description of a simulation run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub(crate) simulation: SimulationConfig,
    #[serde(default)]
    pub(crate) script: ScriptConfig,
    map: MapSection,
    kinds: Vec<KindEntry>,
    units: Vec<UnitEntry>,
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapSection {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    rows: Vec<String>,
}

fn default_tile_size() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KindEntry {
    id: u32,
    name: String,
    #[serde(default = "default_behavior")]
    behavior: bool,
    #[serde(default)]
    dynamic_preference: bool,
}

fn default_behavior() -> bool {
    true
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Terrain {
    Walk,
    Wade,
    Lava,
    Door,
}

impl Terrain {
    fn mask(self) -> MovementMask {
        match self {
            Self::Walk => MovementMask::WALK,
            Self::Wade => MovementMask::WADE,
            Self::Lava => MovementMask::LAVA,
            Self::Door => MovementMask::DOOR,
        }
    }
}

fn default_movement() -> Vec<Terrain> {
    vec![Terrain::Walk, Terrain::Door]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitEntry {
    #[serde(default)]
    owner: u32,
    position: [f32; 2],
    speed: f32,
    #[serde(default = "default_movement")]
    movement: Vec<Terrain>,
    affinities: BTreeMap<String, JobAffinity>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobEntry {
    #[serde(default)]
    owner: u32,
    kind: String,
    tile: [u32; 2],
    #[serde(default)]
    offset: [f32; 2],
}

impl Scenario {
    /// Reads the scenario at `path`, or the built-in one when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::parse(DEFAULT_SCENARIO).context("built-in scenario is invalid");
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Creates the world and map described by the scenario.
    pub(crate) fn build(&self) -> Result<(World, BlockMap)> {
        let map = BlockMap::from_ascii(&self.map.rows, self.map.tile_size)
            .context("invalid map rows")?;
        let mut world = World::new();
        let mut names = BTreeMap::new();

        for kind in &self.kinds {
            let id = JobKindId::new(kind.id);
            if names.insert(kind.name.as_str(), id).is_some() {
                bail!("job kind `{}` is declared twice", kind.name);
            }
            submit(
                &mut world,
                Command::RegisterJobKind {
                    descriptor: JobKindDescriptor {
                        id,
                        name: kind.name.clone(),
                        has_behavior: kind.behavior,
                        has_dynamic_preference: kind.dynamic_preference,
                    },
                },
            )
            .with_context(|| format!("cannot register job kind `{}`", kind.name))?;
        }

        for (index, unit) in self.units.iter().enumerate() {
            let mut affinities = BTreeMap::new();
            for (name, affinity) in &unit.affinities {
                let kind = resolve(&names, name)
                    .with_context(|| format!("unit #{index} has an affinity for `{name}`"))?;
                let _ = affinities.insert(kind, *affinity);
            }
            let movement_mask = unit
                .movement
                .iter()
                .fold(MovementMask::NONE, |mask, terrain| mask.union(terrain.mask()));
            submit(
                &mut world,
                Command::SpawnUnit {
                    owner: FactionId::new(unit.owner),
                    position: Waypoint::new(unit.position[0], unit.position[1]),
                    profile: UnitProfile {
                        movement_mask,
                        speed: unit.speed,
                        affinities,
                    },
                },
            )
            .with_context(|| format!("cannot spawn unit #{index}"))?;
        }

        for (index, job) in self.jobs.iter().enumerate() {
            let kind = resolve(&names, &job.kind)
                .with_context(|| format!("job #{index} has an unknown kind"))?;
            submit(
                &mut world,
                Command::CreateJob {
                    owner: FactionId::new(job.owner),
                    kind,
                    target: JobTarget::Block(TileCell::new(job.tile[0], job.tile[1])),
                    offset: Waypoint::new(job.offset[0], job.offset[1]),
                },
            )
            .with_context(|| format!("cannot create job #{index}"))?;
        }

        info!(
            kinds = self.kinds.len(),
            units = self.units.len(),
            jobs = self.jobs.len(),
            map_size = self.map.rows.len(),
            "scenario loaded"
        );
        Ok((world, map))
    }

    /// Kinds that extra jobs may be scattered as.
    pub(crate) fn scatter_kinds(&self) -> Vec<JobKindId> {
        self.kinds
            .iter()
            .filter(|kind| kind.behavior)
            .map(|kind| JobKindId::new(kind.id))
            .collect()
    }
}

fn resolve(names: &BTreeMap<&str, JobKindId>, name: &str) -> Result<JobKindId> {
    names
        .get(name)
        .copied()
        .with_context(|| format!("job kind `{name}` is not declared"))
}

fn submit(world: &mut World, command: Command) -> Result<()> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    match events.iter().find_map(|event| match event {
        Event::CommandRejected { reason } => Some(*reason),
        _ => None,
    }) {
        Some(reason) => bail!("command rejected: {reason:?}"),
        None => Ok(()),
    }
}

/// Creates `count` extra jobs of the default faction on random walkable tiles.
pub(crate) fn scatter_jobs(
    world: &mut World,
    map: &BlockMap,
    kinds: &[JobKindId],
    count: usize,
    seed: u64,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let tiles: Vec<TileCell> = map.passable_tiles(MovementMask::WALK).collect();
    if tiles.is_empty() || kinds.is_empty() {
        bail!("no walkable tile or job kind to scatter jobs over");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..count {
        let (Some(tile), Some(kind)) = (tiles.choose(&mut rng), kinds.choose(&mut rng)) else {
            break;
        };
        debug!(column = tile.column(), row = tile.row(), kind = kind.get(), "scattering job");
        submit(
            world,
            Command::CreateJob {
                owner: DEFAULT_FACTION,
                kind: *kind,
                target: JobTarget::Block(*tile),
                offset: Waypoint::default(),
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::TileMap;
    use warren_world::query;

    #[test]
    fn built_in_scenario_builds() {
        let scenario = Scenario::load(None).expect("built-in scenario parses");
        let (world, map) = scenario.build().expect("built-in scenario builds");

        assert_eq!(map.map_size(), 16);
        assert_eq!(query::unit_view(&world).len(), 4);
        assert_eq!(query::job_view(&world).len(), 6);
        assert_eq!(query::job_kinds(&world).len(), 3);
        assert_eq!(scenario.simulation.granularity, 2);
    }

    #[test]
    fn unknown_affinity_kind_is_reported() {
        let scenario = Scenario::parse(
            r#"
            [map]
            rows = ["..", ".."]

            [[kinds]]
            id = 1
            name = "dig"

            [[units]]
            position = [0.5, 0.5]
            speed = 1.0
            [units.affinities.fish]
            "#,
        )
        .expect("scenario parses");

        let error = scenario.build().expect_err("fish is not a kind");
        assert!(format!("{error:#}").contains("`fish` is not declared"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Scenario::parse(
            r#"
            kinds = []
            units = []
            colour = "red"

            [map]
            rows = ["."]
            "#,
        )
        .expect_err("colour is not a scenario field");
        assert!(error.to_string().contains("colour"));
    }

    #[test]
    fn scattering_is_reproducible() {
        let scenario = Scenario::load(None).expect("built-in scenario parses");
        let kinds = scenario.scatter_kinds();
        let positions = |seed| {
            let (mut world, map) = scenario.build().expect("scenario builds");
            scatter_jobs(&mut world, &map, &kinds, 12, seed).expect("jobs scattered");
            query::job_view(&world)
                .iter()
                .map(|job| job.target)
                .collect::<Vec<_>>()
        };

        assert_eq!(positions(3), positions(3));
        assert_eq!(positions(3).len(), 18);
    }
}
