//! Advances a unit along a bracketed route.

use serde::{Deserialize, Serialize};
use warren_core::{RouteProgress, Waypoint};

use crate::spline::{arc_length, catmull_rom, to_vec, to_waypoint};

/// How the length of a route segment is estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LengthMode {
    /// Straight-line distance between the segment's waypoints.
    #[default]
    Straight,
    /// Summed chords of the spline sampled at evenly spaced parameters.
    Interpolated {
        /// Number of chords per segment.
        samples: u32,
    },
}

/// Outcome of a single follower step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    /// The unit is still travelling.
    Moving {
        /// Position after the step.
        position: Waypoint,
        /// Progress after the step.
        progress: RouteProgress,
    },
    /// The unit traversed the final segment and snapped to the destination.
    Arrived {
        /// Final real waypoint of the route.
        position: Waypoint,
    },
}

fn segment_length(waypoints: &[Waypoint], segment: usize, mode: LengthMode) -> f32 {
    let (p1, p2) = (waypoints[segment], waypoints[segment + 1]);
    match mode {
        LengthMode::Straight => p1.distance(p2),
        LengthMode::Interpolated { samples } => arc_length(
            to_vec(waypoints[segment - 1]),
            to_vec(p1),
            to_vec(p2),
            to_vec(waypoints[segment + 2]),
            samples,
        ),
    }
}

/// Moves `step` tiles further along `waypoints`.
///
/// `waypoints` carries an extension point at both ends, so segments run from
/// index `1` to `len - 3`. Progress on segment `0` means the route has not
/// been started. The position is always taken from the spline; a segment with
/// non-positive length holds the `current` position for the tick.
#[must_use]
pub fn advance_position(
    waypoints: &[Waypoint],
    progress: RouteProgress,
    current: Waypoint,
    step: f32,
    mode: LengthMode,
) -> Advance {
    let len = waypoints.len();
    if len < 4 {
        let position = len
            .checked_sub(2)
            .and_then(|index| waypoints.get(index).copied())
            .unwrap_or(current);
        return Advance::Arrived { position };
    }
    let last_segment = len - 3;
    let destination = waypoints[len - 2];

    let mut progress = progress;
    if progress.segment == 0 || progress.segment > last_segment {
        progress = RouteProgress {
            segment: 1,
            traveled: 0.0,
            distance: segment_length(waypoints, 1, mode),
        };
    }

    progress.traveled += step.max(0.0);
    while progress.traveled > progress.distance {
        if progress.segment >= last_segment {
            return Advance::Arrived {
                position: destination,
            };
        }
        progress.traveled -= progress.distance.max(0.0);
        progress.segment += 1;
        progress.distance = segment_length(waypoints, progress.segment, mode);
    }

    if progress.distance <= 0.0 {
        return Advance::Moving {
            position: current,
            progress,
        };
    }

    let segment = progress.segment;
    let position = catmull_rom(
        to_vec(waypoints[segment - 1]),
        to_vec(waypoints[segment]),
        to_vec(waypoints[segment + 1]),
        to_vec(waypoints[segment + 2]),
        progress.traveled / progress.distance,
    );
    Advance::Moving {
        position: to_waypoint(position),
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_route() -> Vec<Waypoint> {
        vec![
            Waypoint::new(-1.0, 0.0),
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 0.0),
            Waypoint::new(3.0, 0.0),
            Waypoint::new(5.0, 0.0),
        ]
    }

    #[test]
    fn first_step_starts_the_first_segment() {
        let evenly_spaced: Vec<Waypoint> = (-1..4).map(|x| Waypoint::new(x as f32, 0.0)).collect();
        let Advance::Moving { position, progress } = advance_position(
            &evenly_spaced,
            RouteProgress::default(),
            Waypoint::new(0.0, 0.0),
            0.5,
            LengthMode::Straight,
        ) else {
            panic!("expected movement");
        };
        assert_eq!(progress.segment, 1);
        assert!((progress.distance - 1.0).abs() < 1e-6);
        assert!((position.x - 0.5).abs() < 1e-5);
        assert!(position.y.abs() < 1e-6);
    }

    #[test]
    fn long_steps_skip_whole_segments() {
        let Advance::Moving { progress, .. } = advance_position(
            &straight_route(),
            RouteProgress::default(),
            Waypoint::new(0.0, 0.0),
            1.5,
            LengthMode::Straight,
        ) else {
            panic!("expected movement");
        };
        assert_eq!(progress.segment, 2);
        assert!((progress.traveled - 0.5).abs() < 1e-6);
        assert!((progress.distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn finishing_snaps_to_the_destination() {
        let advance = advance_position(
            &straight_route(),
            RouteProgress::default(),
            Waypoint::new(0.0, 0.0),
            10.0,
            LengthMode::Straight,
        );
        assert_eq!(
            advance,
            Advance::Arrived {
                position: Waypoint::new(3.0, 0.0)
            }
        );
    }

    #[test]
    fn degenerate_segments_hold_position() {
        let waypoints = vec![
            Waypoint::new(2.0, 2.0),
            Waypoint::new(2.0, 2.0),
            Waypoint::new(2.0, 2.0),
            Waypoint::new(2.0, 2.0),
            Waypoint::new(2.0, 2.0),
        ];
        let current = Waypoint::new(1.9, 2.1);
        let advance = advance_position(
            &waypoints,
            RouteProgress::default(),
            current,
            0.0,
            LengthMode::Straight,
        );
        assert!(matches!(advance, Advance::Moving { position, .. } if position == current));
    }

    #[test]
    fn interpolated_lengths_follow_the_curve() {
        let waypoints = vec![
            Waypoint::new(0.0, -1.0),
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 1.0),
            Waypoint::new(2.0, 0.0),
            Waypoint::new(3.0, -1.0),
        ];
        let Advance::Moving { progress, .. } = advance_position(
            &waypoints,
            RouteProgress::default(),
            Waypoint::new(0.0, 0.0),
            0.1,
            LengthMode::Interpolated { samples: 12 },
        ) else {
            panic!("expected movement");
        };
        assert!(progress.distance > std::f32::consts::SQRT_2);
    }

    #[test]
    fn short_routes_arrive_immediately() {
        let waypoints = vec![
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 1.0),
            Waypoint::new(2.0, 2.0),
        ];
        assert_eq!(
            advance_position(
                &waypoints,
                RouteProgress::default(),
                Waypoint::default(),
                0.1,
                LengthMode::Straight
            ),
            Advance::Arrived {
                position: Waypoint::new(1.0, 1.0)
            }
        );
    }
}
