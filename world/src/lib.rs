#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Warren.
//!
//! The world owns units, the job marketplace and the job kind catalogue. It is
//! only mutated through [`apply`], and the relation between a unit and the job
//! it holds can only be cleared by the world's internal release routine, which
//! always updates both sides together.

mod jobs;
mod kinds;
mod map;
mod units;

use tracing::debug;
use warren_core::{
    clamp_saturation, Command, Event, FactionId, JobId, JobTarget, RejectionReason,
    ReleaseReason, UnitId, Waypoint,
};

use jobs::{JobRecord, JobRegistry};
use kinds::KindCatalogue;
use units::Unit;

pub use map::{BlockMap, MapParseError};

/// Represents the authoritative Warren world state.
#[derive(Debug)]
pub struct World {
    kinds: KindCatalogue,
    jobs: JobRegistry,
    units: Vec<Unit>,
    next_unit_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates an empty world with no job kinds, units or jobs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: KindCatalogue::new(),
            jobs: JobRegistry::new(),
            units: Vec::new(),
            next_unit_id: 0,
            tick_index: 0,
        }
    }

    fn unit(&self, unit_id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }

    fn unit_mut(&mut self, unit_id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == unit_id)
    }

    /// Clears the relation between a unit and its job on both sides.
    fn release_unit(&mut self, unit_id: UnitId, reason: ReleaseReason, out_events: &mut Vec<Event>) {
        let Some(unit) = self.unit_mut(unit_id) else {
            return;
        };
        let Some((job_id, _)) = unit.ai.forget_job() else {
            return;
        };
        if let Some(record) = self.jobs.get_mut(job_id) {
            if record.worker == Some(unit_id) {
                record.worker = None;
            }
        }
        debug!(unit = unit_id.get(), job = job_id.get(), ?reason, "job released");
        out_events.push(Event::JobReleased {
            job: job_id,
            unit: unit_id,
            reason,
        });
    }

    fn delete_job(&mut self, job_id: JobId, out_events: &mut Vec<Event>) {
        let worker = self.jobs.get(job_id).and_then(|record| record.worker);
        if let Some(worker) = worker {
            self.release_unit(worker, ReleaseReason::JobDeleted, out_events);
        }
        if let Some(record) = self.jobs.remove(job_id) {
            out_events.push(Event::JobDeleted {
                job: record.id,
                owner: record.owner,
                kind: record.kind,
            });
        }
    }

    fn assign_job(&mut self, unit_id: UnitId, job_id: JobId, out_events: &mut Vec<Event>) {
        let Some(unit) = self.unit(unit_id) else {
            reject(out_events, RejectionReason::UnknownUnit(unit_id));
            return;
        };
        let Some(record) = self.jobs.get(job_id) else {
            reject(out_events, RejectionReason::UnknownJob(job_id));
            return;
        };
        if record.owner != unit.owner {
            reject(
                out_events,
                RejectionReason::ForeignOwner {
                    unit: unit_id,
                    job: job_id,
                },
            );
            return;
        }
        if !unit.can_perform(record.kind) {
            reject(
                out_events,
                RejectionReason::IncapableUnit {
                    unit: unit_id,
                    kind: record.kind,
                },
            );
            return;
        }
        if unit.ai.job.map(|(held, _)| held) == Some(job_id) {
            return;
        }

        let kind = record.kind;
        let holder = record.worker;
        self.release_unit(unit_id, ReleaseReason::Reassigned, out_events);
        if let Some(holder) = holder {
            debug!(job = job_id.get(), holder = holder.get(), by = unit_id.get(), "job preempted");
            self.release_unit(holder, ReleaseReason::Preempted { by: unit_id }, out_events);
        }

        if let Some(record) = self.jobs.get_mut(job_id) {
            record.worker = Some(unit_id);
        }
        if let Some(unit) = self.unit_mut(unit_id) {
            unit.ai.job = Some((job_id, kind));
            unit.ai.active = false;
            unit.ai.execution_cooldown = 0.0;
        }
        debug!(unit = unit_id.get(), job = job_id.get(), "job assigned");
        out_events.push(Event::JobAssigned {
            job: job_id,
            unit: unit_id,
        });
    }

    fn job_position(&self, record: &JobRecord) -> Option<Waypoint> {
        let anchor = match record.target {
            JobTarget::Block(tile) => tile.center(),
            JobTarget::Room { anchor, .. } => anchor,
            JobTarget::Unit(unit_id) => self.unit(unit_id)?.position,
        };
        Some(anchor.offset_by(record.offset))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn reject(out_events: &mut Vec<Event>, reason: RejectionReason) {
    debug!(?reason, "command rejected");
    out_events.push(Event::CommandRejected { reason });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RegisterJobKind { descriptor } => {
            let kind = descriptor.id;
            if world.kinds.register(descriptor) {
                out_events.push(Event::JobKindRegistered { kind });
            } else {
                reject(out_events, RejectionReason::DuplicateJobKind(kind));
            }
        }
        Command::SpawnUnit {
            owner,
            position,
            profile,
        } => {
            let unit = UnitId::new(world.next_unit_id);
            world.next_unit_id = world.next_unit_id.wrapping_add(1);
            world.units.push(Unit::spawn(unit, owner, position, profile));
            out_events.push(Event::UnitSpawned { unit, owner });
        }
        Command::CreateJob {
            owner,
            kind,
            target,
            offset,
        } => {
            if !world.kinds.contains(kind) {
                reject(out_events, RejectionReason::UnknownJobKind(kind));
                return;
            }
            let job = world.jobs.create(owner, kind, target, offset);
            out_events.push(Event::JobCreated { job, owner, kind });
        }
        Command::DeleteJob { owner, job } => {
            let owned = world
                .jobs
                .get(job)
                .is_some_and(|record| record.owner == owner);
            if !owned {
                reject(out_events, RejectionReason::UnknownJob(job));
                return;
            }
            world.delete_job(job, out_events);
        }
        Command::DeleteJobsTargeting {
            owner,
            kind,
            target,
        } => {
            for job in world.jobs.targeting(owner, kind, &target) {
                world.delete_job(job, out_events);
            }
        }
        Command::AssignJob { unit, job } => world.assign_job(unit, job, out_events),
        Command::StopJob { unit, reason } => {
            if world.unit(unit).is_none() {
                reject(out_events, RejectionReason::UnknownUnit(unit));
                return;
            }
            world.release_unit(unit, reason, out_events);
        }
        Command::RecordActivity {
            unit,
            active,
            delay_ticks,
        } => {
            let Some(state) = world.unit_mut(unit) else {
                reject(out_events, RejectionReason::UnknownUnit(unit));
                return;
            };
            if state.ai.job.is_none() {
                return;
            }
            state.ai.execution_cooldown = delay_ticks.max(0.0);
            if state.ai.active != active {
                state.ai.active = active;
                out_events.push(Event::ActivityChanged { unit, active });
            }
        }
        Command::ScheduleSearch { unit, delay_ticks } => match world.unit_mut(unit) {
            Some(state) => state.ai.search_cooldown = delay_ticks.max(0.0),
            None => reject(out_events, RejectionReason::UnknownUnit(unit)),
        },
        Command::AdjustSaturation { unit, kind, delta } => {
            let Some(state) = world.unit_mut(unit) else {
                reject(out_events, RejectionReason::UnknownUnit(unit));
                return;
            };
            let Some(value) = state.ai.saturation.get_mut(&kind) else {
                reject(out_events, RejectionReason::IncapableUnit { unit, kind });
                return;
            };
            *value = clamp_saturation(*value + delta);
        }
        Command::DisableScriptHook { kind, hook } => match world.kinds.disable(kind, hook) {
            Some(true) => out_events.push(Event::ScriptHookDisabled { kind, hook }),
            Some(false) => {}
            None => reject(out_events, RejectionReason::UnknownJobKind(kind)),
        },
        Command::SetRoute { unit, route } => {
            let Some(state) = world.unit_mut(unit) else {
                reject(out_events, RejectionReason::UnknownUnit(unit));
                return;
            };
            let Some(destination) = route.destination() else {
                reject(out_events, RejectionReason::InvalidRoute(unit));
                return;
            };
            state.route = Some(route);
            out_events.push(Event::RouteAssigned { unit, destination });
        }
        Command::AdvanceUnit {
            unit,
            position,
            progress,
            finished,
        } => {
            let Some(state) = world.unit_mut(unit) else {
                reject(out_events, RejectionReason::UnknownUnit(unit));
                return;
            };
            state.position = position;
            if finished {
                state.route = None;
                debug!(unit = unit.get(), x = position.x, y = position.y, "route completed");
                out_events.push(Event::RouteCompleted { unit, position });
            } else if let Some(route) = state.route.as_mut() {
                route.progress = progress;
            }
        }
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            for unit in &mut world.units {
                unit.ai.tick_cooldowns();
            }
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use warren_core::{
        FactionId, JobId, JobKindId, JobKindSnapshot, JobSnapshot, JobView, UnitId,
        UnitSnapshot, UnitView,
    };

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every unit, ordered by owner then identifier.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Captures a single unit.
    #[must_use]
    pub fn unit(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world.unit(unit).map(|unit| unit.snapshot())
    }

    /// Lists the jobs of one owner and kind in registry order.
    #[must_use]
    pub fn jobs(world: &World, owner: FactionId, kind: JobKindId) -> Vec<JobSnapshot> {
        world
            .jobs
            .lane(owner, kind)
            .iter()
            .map(|record| super::job_snapshot(world, record))
            .collect()
    }

    /// Captures every job, grouped by owner then kind.
    #[must_use]
    pub fn job_view(world: &World) -> JobView {
        JobView::from_snapshots(
            world
                .jobs
                .iter()
                .map(|record| super::job_snapshot(world, record))
                .collect(),
        )
    }

    /// Captures a single job.
    #[must_use]
    pub fn job(world: &World, job: JobId) -> Option<JobSnapshot> {
        world
            .jobs
            .get(job)
            .map(|record| super::job_snapshot(world, record))
    }

    /// Lists registered job kinds ordered by identifier.
    #[must_use]
    pub fn job_kinds(world: &World) -> Vec<JobKindSnapshot> {
        world.kinds.snapshots()
    }
}

fn job_snapshot(world: &World, record: &JobRecord) -> warren_core::JobSnapshot {
    warren_core::JobSnapshot {
        id: record.id,
        owner: record.owner,
        kind: record.kind,
        worker: record.worker,
        target: record.target,
        offset: record.offset,
        position: world.job_position(record),
    }
}

/// Faction used by adapters that only simulate a single keeper.
pub const DEFAULT_FACTION: FactionId = FactionId::new(0);
