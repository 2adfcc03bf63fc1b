//! Claims and evictions made during one assignment pass.
//!
//! The world applies the pass's commands only after the pass ends, so units
//! evaluated later read earlier decisions from this ledger instead of the
//! snapshots.

use std::collections::{BTreeMap, BTreeSet};

use warren_core::{JobId, JobKindId, JobSnapshot, ScriptHook, UnitId, UnitSnapshot};

#[derive(Debug, Default)]
pub(crate) struct TickLedger {
    job_of: BTreeMap<UnitId, Option<JobId>>,
    worker_of: BTreeMap<JobId, Option<UnitId>>,
    disabled: BTreeSet<(JobKindId, ScriptHook)>,
}

impl TickLedger {
    pub(crate) fn clear(&mut self) {
        self.job_of.clear();
        self.worker_of.clear();
        self.disabled.clear();
    }

    pub(crate) fn job_of(&self, unit: &UnitSnapshot) -> Option<JobId> {
        self.job_of.get(&unit.id).copied().unwrap_or(unit.job)
    }

    pub(crate) fn worker_of(&self, job: &JobSnapshot) -> Option<UnitId> {
        self.worker_of.get(&job.id).copied().unwrap_or(job.worker)
    }

    /// Records `unit` taking `job`, releasing the unit's previous job and
    /// evicting the job's previous holder.
    pub(crate) fn claim(&mut self, unit: &UnitSnapshot, job: &JobSnapshot) {
        if let Some(previous) = self.job_of(unit) {
            let _ = self.worker_of.insert(previous, None);
        }
        if let Some(holder) = self.worker_of(job) {
            let _ = self.job_of.insert(holder, None);
        }
        let _ = self.job_of.insert(unit.id, Some(job.id));
        let _ = self.worker_of.insert(job.id, Some(unit.id));
    }

    pub(crate) fn release(&mut self, unit: &UnitSnapshot) {
        if let Some(previous) = self.job_of(unit) {
            let _ = self.worker_of.insert(previous, None);
        }
        let _ = self.job_of.insert(unit.id, None);
    }

    /// Marks a hook as disabled; returns `false` if it already was this pass.
    pub(crate) fn disable(&mut self, kind: JobKindId, hook: ScriptHook) -> bool {
        self.disabled.insert((kind, hook))
    }

    pub(crate) fn is_disabled(&self, kind: JobKindId, hook: ScriptHook) -> bool {
        self.disabled.contains(&(kind, hook))
    }
}
