//! Built-in job behaviors used when no scripting runtime is attached.

use std::collections::BTreeMap;

use serde::Deserialize;
use warren_core::{
    BehaviorVerdict, JobId, JobKindId, JobScripts, JobSnapshot, ScriptError, ScriptHook,
    UnitSnapshot,
};

/// Tuning of the built-in behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScriptConfig {
    /// Distance in tiles within which a unit works its job.
    pub(crate) reach: f32,
    /// Ticks between two evaluations while working.
    pub(crate) work_delay_ticks: f32,
    /// Ticks between two evaluations while walking.
    pub(crate) walk_delay_ticks: f32,
    /// Working evaluations after which a job is done.
    pub(crate) effort_per_job: u32,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            reach: 0.1,
            work_delay_ticks: 4.0,
            walk_delay_ticks: 2.0,
            effort_per_job: 6,
        }
    }
}

/// Walks units to their job, works it in place and reports finished jobs.
#[derive(Debug)]
pub(crate) struct ScenarioScripts {
    config: ScriptConfig,
    effort: BTreeMap<JobId, u32>,
    finished: Vec<JobId>,
}

impl ScenarioScripts {
    pub(crate) fn new(config: ScriptConfig) -> Self {
        Self {
            config,
            effort: BTreeMap::new(),
            finished: Vec::new(),
        }
    }

    /// Jobs completed since the last call.
    pub(crate) fn take_finished(&mut self) -> Vec<JobId> {
        for job in &self.finished {
            let _ = self.effort.remove(job);
        }
        std::mem::take(&mut self.finished)
    }
}

impl JobScripts for ScenarioScripts {
    fn evaluate(
        &mut self,
        unit: &UnitSnapshot,
        job: &JobSnapshot,
    ) -> Result<Option<BehaviorVerdict>, ScriptError> {
        let Some(position) = job.position else {
            return Ok(None);
        };
        if self.finished.contains(&job.id) {
            return Ok(None);
        }
        if unit.position.distance(position) > self.config.reach {
            return Ok(Some(BehaviorVerdict {
                active: false,
                next_delay_ticks: self.config.walk_delay_ticks,
                destination: Some(position),
            }));
        }

        let effort = self.effort.entry(job.id).or_insert(0);
        *effort += 1;
        if *effort >= self.config.effort_per_job {
            self.finished.push(job.id);
        }
        Ok(Some(BehaviorVerdict {
            active: true,
            next_delay_ticks: self.config.work_delay_ticks,
            destination: None,
        }))
    }

    fn preference(&mut self, unit: &UnitSnapshot, kind: JobKindId) -> Result<f32, ScriptError> {
        let Some(affinity) = unit.profile.affinities.get(&kind) else {
            return Err(ScriptError {
                kind,
                hook: ScriptHook::Preference,
                message: format!("unit {} cannot perform this kind", unit.id.get()),
            });
        };
        Ok(affinity.preference * (1.5 - unit.saturation_for(kind)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use warren_core::{
        FactionId, JobAffinity, JobTarget, MovementMask, TileCell, UnitId, UnitProfile, Waypoint,
    };

    fn unit(position: Waypoint) -> UnitSnapshot {
        let mut affinities = BTreeMap::new();
        let _ = affinities.insert(JobKindId::new(1), JobAffinity::default());
        UnitSnapshot {
            id: UnitId::new(0),
            owner: FactionId::new(0),
            position,
            profile: UnitProfile {
                movement_mask: MovementMask::WALK,
                speed: 1.0,
                affinities,
            },
            job: Some(JobId::new(4)),
            job_kind: Some(JobKindId::new(1)),
            active: false,
            search_cooldown: 0.0,
            execution_cooldown: 0.0,
            saturation: BTreeMap::new(),
            route: None,
        }
    }

    fn job() -> JobSnapshot {
        JobSnapshot {
            id: JobId::new(4),
            owner: FactionId::new(0),
            kind: JobKindId::new(1),
            worker: Some(UnitId::new(0)),
            target: JobTarget::Block(TileCell::new(3, 3)),
            offset: Waypoint::default(),
            position: Some(Waypoint::new(3.5, 3.5)),
        }
    }

    #[test]
    fn distant_unit_is_sent_to_the_job() {
        let mut scripts = ScenarioScripts::new(ScriptConfig::default());
        let verdict = scripts
            .evaluate(&unit(Waypoint::new(0.5, 0.5)), &job())
            .expect("script succeeds")
            .expect("unit accepted");

        assert!(!verdict.active);
        assert_eq!(verdict.destination, Some(Waypoint::new(3.5, 3.5)));
    }

    #[test]
    fn job_finishes_after_enough_effort() {
        let mut scripts = ScenarioScripts::new(ScriptConfig {
            effort_per_job: 2,
            ..ScriptConfig::default()
        });
        let worker = unit(Waypoint::new(3.5, 3.5));

        for _ in 0..2 {
            let verdict = scripts.evaluate(&worker, &job()).expect("script succeeds");
            assert!(verdict.is_some_and(|verdict| verdict.active));
        }
        assert_eq!(scripts.evaluate(&worker, &job()), Ok(None));
        assert_eq!(scripts.take_finished(), vec![JobId::new(4)]);
        assert!(scripts.take_finished().is_empty());
    }

    #[test]
    fn preference_grows_as_saturation_drops() {
        let mut scripts = ScenarioScripts::new(ScriptConfig::default());
        let mut hungry = unit(Waypoint::default());
        let _ = hungry.saturation.insert(JobKindId::new(1), 0.1);
        let mut fed = unit(Waypoint::default());
        let _ = fed.saturation.insert(JobKindId::new(1), 0.9);

        let hungry = scripts.preference(&hungry, JobKindId::new(1)).expect("known kind");
        let fed = scripts.preference(&fed, JobKindId::new(1)).expect("known kind");
        assert!(hungry > fed);
        assert!(scripts.preference(&unit(Waypoint::default()), JobKindId::new(9)).is_err());
    }
}
