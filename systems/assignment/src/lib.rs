#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Assignment engine that hands jobs to units and drives job behaviors.
//!
//! Every tick runs two passes over the units in owner-then-id order. The
//! assignment pass abandons unmotivated jobs and, for units whose search
//! cooldown elapsed, picks the job with the smallest desire-weighted path
//! distance, possibly evicting a farther holder. Kinds a unit would abandon
//! on the spot are never picked, so an unmotivated unit stays idle until an
//! urgent kind has work or its saturation settles. The execution pass then
//! evaluates the behavior script of every job whose execution cooldown
//! elapsed and turns the verdict into activity and route commands.

mod config;
mod ledger;
mod weighting;

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};
use warren_core::{
    Command, Event, HookState, JobAffinity, JobKindId, JobKindSnapshot, JobScripts,
    JobSnapshot, JobView, ReleaseReason, Route, ScriptHook, TileMap, UnitSnapshot, UnitView,
    Waypoint,
};
use warren_system_movement::{NavigationError, Navigator};

use ledger::TickLedger;

pub use config::AssignmentConfig;
pub use weighting::{desire_bias, should_abandon, weighted_distance};

/// Distance below which a unit counts as standing on its destination.
const ARRIVAL_TOLERANCE: f32 = 1.0e-3;

/// Read-only state the engine consults during one tick.
#[derive(Clone, Copy)]
pub struct AssignmentView<'a> {
    /// Units in evaluation order.
    pub units: &'a UnitView,
    /// Jobs of every owner and kind.
    pub jobs: &'a JobView,
    /// Registered job kinds and the state of their hooks.
    pub kinds: &'a [JobKindSnapshot],
    /// Map used for path distances and route planning.
    pub map: &'a dyn TileMap,
}

impl AssignmentView<'_> {
    fn kind(&self, id: JobKindId) -> Option<&JobKindSnapshot> {
        self.kinds.iter().find(|kind| kind.id == id)
    }
}

/// Pure system that assigns jobs and evaluates their behaviors.
#[derive(Debug)]
pub struct Assignment {
    config: AssignmentConfig,
    ledger: TickLedger,
}

impl Assignment {
    /// Creates an engine using the provided tuning.
    #[must_use]
    pub fn new(config: AssignmentConfig) -> Self {
        Self {
            config,
            ledger: TickLedger::default(),
        }
    }

    /// Tuning the engine runs with.
    #[must_use]
    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Runs the assignment and execution passes when time advanced.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: AssignmentView<'_>,
        navigator: &mut Navigator,
        scripts: &mut dyn JobScripts,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        self.ledger.clear();
        for unit in view.units.iter() {
            self.reconsider(unit, &view, navigator, scripts, out);
        }
        for unit in view.units.iter() {
            self.execute(unit, &view, navigator, scripts, out);
        }
    }

    fn reconsider(
        &mut self,
        unit: &UnitSnapshot,
        view: &AssignmentView<'_>,
        navigator: &mut Navigator,
        scripts: &mut dyn JobScripts,
        out: &mut Vec<Command>,
    ) {
        let mut abandoned = false;
        if let (Some(job), Some(kind)) = (self.ledger.job_of(unit), unit.job_kind) {
            if should_abandon(unit, kind) {
                debug!(
                    unit = unit.id.get(),
                    job = job.get(),
                    "abandoning job for a more urgent desire"
                );
                out.push(Command::StopJob {
                    unit: unit.id,
                    reason: ReleaseReason::Unmotivated,
                });
                self.ledger.release(unit);
                abandoned = true;
            }
        }

        if !abandoned && unit.search_cooldown > 0.0 {
            return;
        }

        if let Some(job) = self.best_job(unit, view, navigator, scripts, out) {
            if self.ledger.job_of(unit) != Some(job.id) {
                debug!(
                    unit = unit.id.get(),
                    job = job.id.get(),
                    evicted = ?self.ledger.worker_of(job).map(|holder| holder.get()),
                    "job assigned"
                );
                out.push(Command::AssignJob {
                    unit: unit.id,
                    job: job.id,
                });
                self.ledger.claim(unit, job);
            }
        }

        out.push(Command::ScheduleSearch {
            unit: unit.id,
            delay_ticks: self.config.search_interval_ticks,
        });
    }

    /// Job with the smallest weighted distance for `unit`, starting from the
    /// unit's current job as the bar to beat.
    ///
    /// Kinds the unit would immediately abandon are not considered.
    fn best_job<'v>(
        &mut self,
        unit: &UnitSnapshot,
        view: &AssignmentView<'v>,
        navigator: &mut Navigator,
        scripts: &mut dyn JobScripts,
        out: &mut Vec<Command>,
    ) -> Option<&'v JobSnapshot> {
        let penalty = self.config.last_resort_penalty;
        let current = self.ledger.job_of(unit);
        let mut preferences: BTreeMap<JobKindId, f32> = BTreeMap::new();
        let mut best: Option<(&'v JobSnapshot, f32)> = None;
        let mut path_queries = 0_usize;

        if let Some(job) = current.and_then(|id| view.jobs.get(id)) {
            if let (Some(affinity), Some(position)) =
                (unit.profile.affinities.get(&job.kind), job.position)
            {
                let preference = self.preference(unit, job.kind, affinity, view, scripts, out);
                let _ = preferences.insert(job.kind, preference);
                path_queries += 1;
                if let Some(distance) = path_distance(navigator, view.map, unit, position) {
                    let saturation = unit.saturation_for(job.kind);
                    let weighted =
                        weighted_distance(distance, preference, affinity, saturation, penalty);
                    best = Some((job, weighted));
                }
            }
        }

        for (kind, affinity) in &unit.profile.affinities {
            if view.kind(*kind).is_none() || should_abandon(unit, *kind) {
                continue;
            }
            let preference = match preferences.get(kind) {
                Some(preference) => *preference,
                None => {
                    let preference = self.preference(unit, *kind, affinity, view, scripts, out);
                    let _ = preferences.insert(*kind, preference);
                    preference
                }
            };
            let saturation = unit.saturation_for(*kind);
            let weigh = |distance: f32| {
                weighted_distance(distance, preference, affinity, saturation, penalty)
            };

            for job in view.jobs.lane(unit.owner, *kind) {
                if Some(job.id) == current {
                    continue;
                }
                let Some(position) = job.position else {
                    continue;
                };
                let straight = unit.position.distance(position);
                if best.is_some_and(|(_, bar)| weigh(straight) >= bar) {
                    continue;
                }

                let holder = self
                    .ledger
                    .worker_of(job)
                    .filter(|holder| *holder != unit.id)
                    .and_then(|holder| view.units.get(holder));

                path_queries += 1;
                let Some(distance) = path_distance(navigator, view.map, unit, position) else {
                    continue;
                };
                if let Some(holder) = holder {
                    let holder_distance = holder.position.distance(position);
                    if distance + self.config.incumbency_bonus >= holder_distance {
                        continue;
                    }
                }

                let weighted = weigh(distance);
                if best.map_or(true, |(_, bar)| weighted < bar) {
                    best = Some((job, weighted));
                }
            }
        }

        trace!(
            unit = unit.id.get(),
            path_queries,
            found = best.is_some(),
            "job search finished"
        );
        best.map(|(job, _)| job)
    }

    fn preference(
        &mut self,
        unit: &UnitSnapshot,
        kind: JobKindId,
        affinity: &JobAffinity,
        view: &AssignmentView<'_>,
        scripts: &mut dyn JobScripts,
        out: &mut Vec<Command>,
    ) -> f32 {
        let dynamic = view
            .kind(kind)
            .is_some_and(|snapshot| snapshot.preference.is_enabled())
            && !self.ledger.is_disabled(kind, ScriptHook::Preference);
        if !dynamic {
            return affinity.preference;
        }
        match scripts.preference(unit, kind) {
            Ok(preference) => preference,
            Err(error) => {
                warn!(%error, unit = unit.id.get(), "disabling preference script");
                self.disable_hook(kind, ScriptHook::Preference, out);
                affinity.preference
            }
        }
    }

    fn execute(
        &mut self,
        unit: &UnitSnapshot,
        view: &AssignmentView<'_>,
        navigator: &mut Navigator,
        scripts: &mut dyn JobScripts,
        out: &mut Vec<Command>,
    ) {
        let Some(job) = self.ledger.job_of(unit).and_then(|id| view.jobs.get(id)) else {
            return;
        };
        let newly_assigned = unit.job != Some(job.id);
        if !newly_assigned && unit.execution_cooldown > 0.0 {
            return;
        }

        let behavior = view
            .kind(job.kind)
            .map_or(HookState::Absent, |kind| kind.behavior);
        if !behavior.is_enabled() || self.ledger.is_disabled(job.kind, ScriptHook::Behavior) {
            out.push(Command::RecordActivity {
                unit: unit.id,
                active: false,
                delay_ticks: self.config.search_interval_ticks,
            });
            return;
        }

        let mut worker = unit.clone();
        worker.job = Some(job.id);
        worker.job_kind = Some(job.kind);
        if newly_assigned {
            worker.active = false;
            worker.execution_cooldown = 0.0;
        }

        match scripts.evaluate(&worker, job) {
            Ok(Some(verdict)) => {
                out.push(Command::RecordActivity {
                    unit: unit.id,
                    active: verdict.active,
                    delay_ticks: verdict.next_delay_ticks,
                });
                if let Some(destination) = verdict.destination {
                    self.steer(&worker, destination, view.map, navigator, out);
                }
            }
            Ok(None) => {
                debug!(unit = unit.id.get(), job = job.id.get(), "behavior rejected unit");
                self.stop(unit, ReleaseReason::BehaviorRejected, out);
            }
            Err(error) => {
                warn!(%error, unit = unit.id.get(), "disabling behavior script");
                self.disable_hook(job.kind, ScriptHook::Behavior, out);
                self.stop(unit, ReleaseReason::BehaviorFailed, out);
            }
        }
    }

    /// Plans a route to `destination` unless the unit is already there or headed there.
    fn steer(
        &mut self,
        unit: &UnitSnapshot,
        destination: Waypoint,
        map: &dyn TileMap,
        navigator: &mut Navigator,
        out: &mut Vec<Command>,
    ) {
        let end = unit
            .route
            .as_ref()
            .and_then(Route::destination)
            .unwrap_or(unit.position);
        if end.distance(destination) <= ARRIVAL_TOLERANCE {
            return;
        }

        match navigator.move_to(map, unit, destination) {
            Ok((route, _)) => out.push(Command::SetRoute {
                unit: unit.id,
                route,
            }),
            Err(NavigationError::Search(error)) => {
                warn!(%error, unit = unit.id.get(), "route search aborted");
            }
            Err(error) => {
                debug!(%error, unit = unit.id.get(), "job destination unreachable");
                self.stop(unit, ReleaseReason::BehaviorRejected, out);
            }
        }
    }

    fn stop(&mut self, unit: &UnitSnapshot, reason: ReleaseReason, out: &mut Vec<Command>) {
        out.push(Command::StopJob {
            unit: unit.id,
            reason,
        });
        self.ledger.release(unit);
    }

    fn disable_hook(&mut self, kind: JobKindId, hook: ScriptHook, out: &mut Vec<Command>) {
        if self.ledger.disable(kind, hook) {
            out.push(Command::DisableScriptHook { kind, hook });
        }
    }
}

impl Default for Assignment {
    fn default() -> Self {
        Self::new(AssignmentConfig::default())
    }
}

fn path_distance(
    navigator: &mut Navigator,
    map: &dyn TileMap,
    unit: &UnitSnapshot,
    to: Waypoint,
) -> Option<f32> {
    match navigator.distance(map, unit.profile.movement_mask, unit.position, to) {
        Ok(distance) => distance,
        Err(error) => {
            warn!(%error, unit = unit.id.get(), "path search aborted");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::{
        BehaviorVerdict, FactionId, JobId, JobTarget, MovementMask, ScriptError, TileCell,
        UnitId, UnitProfile,
    };

    struct OpenMap;

    impl TileMap for OpenMap {
        fn is_passable(&self, tile: TileCell, _mask: MovementMask) -> bool {
            tile.column() < 8 && tile.row() < 8
        }

        fn tile_size(&self) -> f32 {
            1.0
        }

        fn map_size(&self) -> u32 {
            8
        }
    }

    struct Idle;

    impl JobScripts for Idle {
        fn evaluate(
            &mut self,
            _unit: &UnitSnapshot,
            _job: &JobSnapshot,
        ) -> Result<Option<BehaviorVerdict>, ScriptError> {
            Ok(Some(BehaviorVerdict {
                active: true,
                next_delay_ticks: 1.0,
                destination: None,
            }))
        }

        fn preference(&mut self, _unit: &UnitSnapshot, _kind: JobKindId) -> Result<f32, ScriptError> {
            Ok(1.0)
        }
    }

    fn unit(search_cooldown: f32) -> UnitSnapshot {
        let mut affinities = BTreeMap::new();
        let _ = affinities.insert(JobKindId::new(0), JobAffinity::default());
        UnitSnapshot {
            id: UnitId::new(0),
            owner: FactionId::new(0),
            position: Waypoint::new(1.5, 1.5),
            profile: UnitProfile {
                movement_mask: MovementMask::WALK,
                speed: 1.0,
                affinities,
            },
            job: None,
            job_kind: None,
            active: false,
            search_cooldown,
            execution_cooldown: 0.0,
            saturation: BTreeMap::new(),
            route: None,
        }
    }

    fn job() -> JobSnapshot {
        JobSnapshot {
            id: JobId::new(0),
            owner: FactionId::new(0),
            kind: JobKindId::new(0),
            worker: None,
            target: JobTarget::Block(TileCell::new(4, 4)),
            offset: Waypoint::default(),
            position: Some(Waypoint::new(4.5, 4.5)),
        }
    }

    fn kinds() -> Vec<JobKindSnapshot> {
        vec![JobKindSnapshot {
            id: JobKindId::new(0),
            name: "dig".to_owned(),
            behavior: HookState::Enabled,
            preference: HookState::Absent,
        }]
    }

    fn run(units: UnitView, jobs: JobView) -> Vec<Command> {
        let kinds = kinds();
        let view = AssignmentView {
            units: &units,
            jobs: &jobs,
            kinds: &kinds,
            map: &OpenMap,
        };
        let mut out = Vec::new();
        Assignment::default().handle(
            &[Event::TimeAdvanced { tick: 1 }],
            view,
            &mut Navigator::new(2, 256),
            &mut Idle,
            &mut out,
        );
        out
    }

    #[test]
    fn idle_unit_claims_the_free_job_and_starts_working() {
        let commands = run(
            UnitView::from_snapshots(vec![unit(0.0)]),
            JobView::from_snapshots(vec![job()]),
        );
        assert_eq!(
            commands,
            vec![
                Command::AssignJob {
                    unit: UnitId::new(0),
                    job: JobId::new(0),
                },
                Command::ScheduleSearch {
                    unit: UnitId::new(0),
                    delay_ticks: 10.0,
                },
                Command::RecordActivity {
                    unit: UnitId::new(0),
                    active: true,
                    delay_ticks: 1.0,
                },
            ]
        );
    }

    #[test]
    fn cooling_down_unit_does_not_search() {
        let commands = run(
            UnitView::from_snapshots(vec![unit(3.0)]),
            JobView::from_snapshots(vec![job()]),
        );
        assert!(commands.is_empty());
    }
}
