#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Saturation model that tracks how much each unit still wants every job kind.
//!
//! Saturation rises or falls every tick depending on whether the unit is
//! actively performing a kind. Adjustments never push a value out of `[0, 1]`.

use warren_core::{clamp_saturation, Command, Event, JobAffinity, JobKindId, UnitSnapshot, UnitView};

/// Pure system that emits one saturation adjustment per unit and kind each tick.
#[derive(Debug, Default)]
pub struct Saturation;

impl Saturation {
    /// Creates a new saturation system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Consumes world events and the unit view to emit saturation adjustments.
    pub fn handle(&mut self, events: &[Event], units: &UnitView, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for unit in units.iter() {
            for (kind, affinity) in &unit.profile.affinities {
                let current = unit.saturation_for(*kind);
                let delta =
                    next_saturation(current, affinity, is_performing(unit, *kind)) - current;
                if delta != 0.0 {
                    out.push(Command::AdjustSaturation {
                        unit: unit.id,
                        kind: *kind,
                        delta,
                    });
                }
            }
        }
    }
}

/// Reports whether the unit actively works a job of `kind`.
#[must_use]
pub fn is_performing(unit: &UnitSnapshot, kind: JobKindId) -> bool {
    unit.active && unit.job_kind == Some(kind)
}

fn tick_delta(affinity: &JobAffinity, performing: bool) -> f32 {
    if performing {
        affinity.performing_delta
    } else {
        affinity.not_performing_delta
    }
}

/// Saturation after one tick, clamped to `[0, 1]`.
#[must_use]
pub fn next_saturation(current: f32, affinity: &JobAffinity, performing: bool) -> f32 {
    clamp_saturation(current + tick_delta(affinity, performing))
}
