//! Job marketplace owned by the world.
//!
//! Jobs are partitioned by owner, then by kind, into dense arrays. Removal
//! shifts the remaining records so iteration order is always creation order.

use std::collections::BTreeMap;

use warren_core::{FactionId, JobId, JobKindId, JobTarget, UnitId, Waypoint};

/// Mutable job record stored inside a lane.
#[derive(Clone, Debug)]
pub(crate) struct JobRecord {
    pub(crate) id: JobId,
    pub(crate) owner: FactionId,
    pub(crate) kind: JobKindId,
    pub(crate) worker: Option<UnitId>,
    pub(crate) target: JobTarget,
    pub(crate) offset: Waypoint,
}

type LaneKey = (FactionId, JobKindId);

#[derive(Debug, Default)]
pub(crate) struct JobRegistry {
    lanes: BTreeMap<LaneKey, Vec<JobRecord>>,
    index: BTreeMap<JobId, LaneKey>,
    next_job_id: u32,
}

impl JobRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(
        &mut self,
        owner: FactionId,
        kind: JobKindId,
        target: JobTarget,
        offset: Waypoint,
    ) -> JobId {
        let id = JobId::new(self.next_job_id);
        self.next_job_id = self.next_job_id.wrapping_add(1);
        self.lanes.entry((owner, kind)).or_default().push(JobRecord {
            id,
            owner,
            kind,
            worker: None,
            target,
            offset,
        });
        let _ = self.index.insert(id, (owner, kind));
        id
    }

    pub(crate) fn get(&self, id: JobId) -> Option<&JobRecord> {
        let key = self.index.get(&id)?;
        self.lanes.get(key)?.iter().find(|record| record.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: JobId) -> Option<&mut JobRecord> {
        let key = self.index.get(&id)?;
        self.lanes
            .get_mut(key)?
            .iter_mut()
            .find(|record| record.id == id)
    }

    /// Removes a job. The caller must have released its worker first.
    pub(crate) fn remove(&mut self, id: JobId) -> Option<JobRecord> {
        let key = self.index.remove(&id)?;
        let lane = self.lanes.get_mut(&key)?;
        let position = lane.iter().position(|record| record.id == id)?;
        debug_assert!(lane[position].worker.is_none());
        let record = lane.remove(position);
        if lane.is_empty() {
            let _ = self.lanes.remove(&key);
        }
        Some(record)
    }

    /// Identifiers of a lane's jobs targeting `target`, back to front.
    pub(crate) fn targeting(
        &self,
        owner: FactionId,
        kind: JobKindId,
        target: &JobTarget,
    ) -> Vec<JobId> {
        let Some(lane) = self.lanes.get(&(owner, kind)) else {
            return Vec::new();
        };
        lane.iter()
            .rev()
            .filter(|record| record.target == *target)
            .map(|record| record.id)
            .collect()
    }

    pub(crate) fn lane(&self, owner: FactionId, kind: JobKindId) -> &[JobRecord] {
        self.lanes
            .get(&(owner, kind))
            .map_or(&[], |lane| lane.as_slice())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.lanes.values().flat_map(|lane| lane.iter())
    }
}
