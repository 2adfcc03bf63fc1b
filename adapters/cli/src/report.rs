//! Running totals printed at the end of a headless run.

use std::fmt;

use warren_core::{Event, ReleaseReason};

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RunReport {
    ticks: u64,
    assignments: u64,
    preemptions: u64,
    abandonments: u64,
    behavior_releases: u64,
    routes_completed: u64,
    jobs_completed: u64,
    hooks_disabled: u64,
    rejected_commands: u64,
}

impl RunReport {
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { tick } => self.ticks = *tick,
                Event::JobAssigned { .. } => self.assignments += 1,
                Event::JobReleased { reason, .. } => match reason {
                    ReleaseReason::Preempted { .. } => self.preemptions += 1,
                    ReleaseReason::Unmotivated => self.abandonments += 1,
                    ReleaseReason::BehaviorRejected | ReleaseReason::BehaviorFailed => {
                        self.behavior_releases += 1;
                    }
                    ReleaseReason::Reassigned | ReleaseReason::JobDeleted => {}
                },
                Event::RouteCompleted { .. } => self.routes_completed += 1,
                Event::ScriptHookDisabled { .. } => self.hooks_disabled += 1,
                Event::CommandRejected { .. } => self.rejected_commands += 1,
                _ => {}
            }
        }
    }

    pub(crate) fn job_completed(&mut self) {
        self.jobs_completed += 1;
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks simulated:   {}", self.ticks)?;
        writeln!(f, "jobs assigned:     {}", self.assignments)?;
        writeln!(f, "jobs preempted:    {}", self.preemptions)?;
        writeln!(f, "jobs abandoned:    {}", self.abandonments)?;
        writeln!(f, "behavior releases: {}", self.behavior_releases)?;
        writeln!(f, "routes completed:  {}", self.routes_completed)?;
        writeln!(f, "jobs completed:    {}", self.jobs_completed)?;
        writeln!(f, "hooks disabled:    {}", self.hooks_disabled)?;
        write!(f, "commands rejected: {}", self.rejected_commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::{JobId, UnitId};

    #[test]
    fn releases_are_counted_by_reason() {
        let mut report = RunReport::default();
        let release = |reason| Event::JobReleased {
            job: JobId::new(0),
            unit: UnitId::new(1),
            reason,
        };

        report.record(&[
            Event::TimeAdvanced { tick: 7 },
            release(ReleaseReason::Preempted { by: UnitId::new(2) }),
            release(ReleaseReason::Unmotivated),
            release(ReleaseReason::BehaviorFailed),
            release(ReleaseReason::JobDeleted),
        ]);
        report.job_completed();

        let text = report.to_string();
        assert!(text.contains("ticks simulated:   7"));
        assert!(text.contains("jobs preempted:    1"));
        assert!(text.contains("jobs abandoned:    1"));
        assert!(text.contains("behavior releases: 1"));
        assert!(text.contains("jobs completed:    1"));
    }
}
