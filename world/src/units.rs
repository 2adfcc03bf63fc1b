//! Unit state owned by the world.

use std::collections::BTreeMap;

use warren_core::{
    clamp_saturation, FactionId, JobId, JobKindId, Route, UnitId, UnitProfile, UnitSnapshot,
    Waypoint,
};

/// Per-unit job state tracked by the assignment pipeline.
#[derive(Clone, Debug)]
pub(crate) struct AiState {
    /// Job currently held, together with its kind.
    pub(crate) job: Option<(JobId, JobKindId)>,
    pub(crate) active: bool,
    pub(crate) search_cooldown: f32,
    pub(crate) execution_cooldown: f32,
    pub(crate) saturation: BTreeMap<JobKindId, f32>,
}

impl AiState {
    fn from_profile(profile: &UnitProfile) -> Self {
        let saturation = profile
            .affinities
            .iter()
            .map(|(kind, affinity)| (*kind, clamp_saturation(affinity.initial)))
            .collect();
        Self {
            job: None,
            active: false,
            search_cooldown: 0.0,
            execution_cooldown: 0.0,
            saturation,
        }
    }

    /// Clears the job side of the relation. Only the world's release routine calls this.
    pub(crate) fn forget_job(&mut self) -> Option<(JobId, JobKindId)> {
        self.active = false;
        self.search_cooldown = 0.0;
        self.execution_cooldown = 0.0;
        self.job.take()
    }

    pub(crate) fn tick_cooldowns(&mut self) {
        self.search_cooldown = (self.search_cooldown - 1.0).max(0.0);
        self.execution_cooldown = (self.execution_cooldown - 1.0).max(0.0);
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) owner: FactionId,
    pub(crate) position: Waypoint,
    pub(crate) profile: UnitProfile,
    pub(crate) ai: AiState,
    pub(crate) route: Option<Route>,
}

impl Unit {
    pub(crate) fn spawn(
        id: UnitId,
        owner: FactionId,
        position: Waypoint,
        profile: UnitProfile,
    ) -> Self {
        let ai = AiState::from_profile(&profile);
        Self {
            id,
            owner,
            position,
            profile,
            ai,
            route: None,
        }
    }

    pub(crate) fn can_perform(&self, kind: JobKindId) -> bool {
        self.profile.affinities.contains_key(&kind)
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            owner: self.owner,
            position: self.position,
            profile: self.profile.clone(),
            job: self.ai.job.map(|(job, _)| job),
            job_kind: self.ai.job.map(|(_, kind)| kind),
            active: self.ai.active,
            search_cooldown: self.ai.search_cooldown,
            execution_cooldown: self.ai.execution_cooldown,
            saturation: self.ai.saturation.clone(),
            route: self.route.clone(),
        }
    }
}
