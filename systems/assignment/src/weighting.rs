//! Desire-weighted distances used to rank candidate jobs.

use warren_core::{JobAffinity, JobKindId, UnitSnapshot};

/// Distance bonus granted by a unit's desire for a kind.
///
/// The bonus is the full preference while the unit is unsatisfied and fades
/// linearly to zero as saturation reaches the satisfied threshold.
#[must_use]
pub fn desire_bias(preference: f32, affinity: &JobAffinity, saturation: f32) -> f32 {
    let span = affinity.satisfied - affinity.unsatisfied;
    if span == 0.0 {
        return preference;
    }
    let scale = ((affinity.satisfied - saturation) / span).clamp(0.0, 1.0);
    preference * scale
}

/// Distance used to compare candidate jobs; smaller is better.
#[must_use]
pub fn weighted_distance(
    distance: f32,
    preference: f32,
    affinity: &JobAffinity,
    saturation: f32,
    last_resort_penalty: f32,
) -> f32 {
    let mut weighted = distance - desire_bias(preference, affinity, saturation);
    if preference <= 0.0 {
        weighted += last_resort_penalty;
    }
    weighted
}

/// Reports whether a unit should drop its job of `current` kind for a more urgent desire.
#[must_use]
pub fn should_abandon(unit: &UnitSnapshot, current: JobKindId) -> bool {
    let Some(affinity) = unit.profile.affinities.get(&current) else {
        return false;
    };
    if unit.saturation_for(current) <= affinity.unsatisfied {
        return false;
    }
    unit.profile
        .affinities
        .iter()
        .filter(|(kind, _)| **kind != current)
        .any(|(kind, other)| unit.saturation_for(*kind) < other.unsatisfied)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use warren_core::{FactionId, MovementMask, UnitId, UnitProfile, Waypoint};

    fn affinity() -> JobAffinity {
        JobAffinity {
            preference: 2.0,
            satisfied: 0.8,
            unsatisfied: 0.2,
            ..JobAffinity::default()
        }
    }

    #[test]
    fn bias_fades_between_thresholds() {
        let affinity = affinity();
        assert!((desire_bias(2.0, &affinity, 0.1) - 2.0).abs() < 1e-6);
        assert!((desire_bias(2.0, &affinity, 0.5) - 1.0).abs() < 1e-6);
        assert!(desire_bias(2.0, &affinity, 0.9).abs() < 1e-6);
    }

    #[test]
    fn equal_thresholds_use_the_raw_preference() {
        let affinity = JobAffinity {
            satisfied: 0.5,
            unsatisfied: 0.5,
            ..affinity()
        };
        assert_eq!(desire_bias(3.0, &affinity, 0.7), 3.0);
    }

    #[test]
    fn last_resort_kinds_rank_behind_everything_but_keep_their_order() {
        let affinity = affinity();
        let preferred_far = weighted_distance(500.0, 1.0, &affinity, 0.5, 1.0e6);
        let last_resort_near = weighted_distance(1.0, 0.0, &affinity, 0.5, 1.0e6);
        let last_resort_nearer = weighted_distance(0.5, -1.0, &affinity, 0.9, 1.0e6);
        assert!(preferred_far < last_resort_near);
        assert!(last_resort_nearer < last_resort_near);
    }

    fn unit_with(saturation: [(u32, f32); 2]) -> UnitSnapshot {
        let mut affinities = BTreeMap::new();
        let mut values = BTreeMap::new();
        for (kind, value) in saturation {
            let _ = affinities.insert(JobKindId::new(kind), affinity());
            let _ = values.insert(JobKindId::new(kind), value);
        }
        UnitSnapshot {
            id: UnitId::new(0),
            owner: FactionId::new(0),
            position: Waypoint::default(),
            profile: UnitProfile {
                movement_mask: MovementMask::WALK,
                speed: 1.0,
                affinities,
            },
            job: None,
            job_kind: Some(JobKindId::new(0)),
            active: true,
            search_cooldown: 0.0,
            execution_cooldown: 0.0,
            saturation: values,
            route: None,
        }
    }

    #[test]
    fn abandons_only_for_a_more_urgent_kind() {
        let current = JobKindId::new(0);
        assert!(should_abandon(&unit_with([(0, 0.6), (1, 0.1)]), current));
        assert!(!should_abandon(&unit_with([(0, 0.6), (1, 0.3)]), current));
        assert!(!should_abandon(&unit_with([(0, 0.15), (1, 0.1)]), current));
    }
}
