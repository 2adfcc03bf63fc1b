//! Route planning on top of the grid pathfinder.

use thiserror::Error;
use tracing::debug;
use warren_core::{MovementMask, Route, RouteProgress, TileMap, UnitId, UnitSnapshot, Waypoint};
use warren_system_pathfinding::{
    passable_for, PathRequest, Pathfinder, PathfindingError, SearchGrid,
};

/// Failures of [`Navigator::move_to`].
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The unit cannot move at all.
    #[error("unit {} has no movement speed", .0.get())]
    Immobile(UnitId),
    /// No passable path joins the unit and the target.
    #[error("no path from ({}, {}) to ({}, {})", .from.x, .from.y, .to.x, .to.y)]
    Unreachable {
        /// Position of the unit.
        from: Waypoint,
        /// Requested destination.
        to: Waypoint,
    },
    /// The search could not run to completion.
    #[error(transparent)]
    Search(#[from] PathfindingError),
}

/// Path found by [`Navigator::request_path`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedPath {
    /// Waypoints bracketed by the two spline extension points.
    pub waypoints: Vec<Waypoint>,
    /// Length of the real waypoints in tiles.
    pub length: f32,
}

/// Owns the search buffers shared by every route request of a simulation.
#[derive(Debug)]
pub struct Navigator {
    pathfinder: Pathfinder,
    granularity: u32,
    max_depth: usize,
}

impl Navigator {
    /// Creates a navigator searching at `granularity` cells per tile edge and
    /// keeping at most `max_depth` waypoints per path.
    #[must_use]
    pub fn new(granularity: u32, max_depth: usize) -> Self {
        Self {
            pathfinder: Pathfinder::new(),
            granularity,
            max_depth,
        }
    }

    /// Finds a path for a unit moving with `mask`.
    ///
    /// Returns `Ok(None)` when no path exists or an endpoint is impassable.
    pub fn request_path(
        &mut self,
        map: &dyn TileMap,
        mask: MovementMask,
        from: Waypoint,
        to: Waypoint,
    ) -> Result<Option<PlannedPath>, PathfindingError> {
        let grid = SearchGrid::for_map(map, self.granularity);
        let passable = passable_for(map, mask);
        let request = PathRequest {
            start: from,
            goal: to,
            max_depth: self.max_depth,
        };
        let Some(found) = self.pathfinder.find_path(&grid, request, &passable)? else {
            return Ok(None);
        };
        let mut points = found.waypoints;
        if points.len() == 1 {
            points.insert(0, from);
        }
        Ok(Some(PlannedPath {
            waypoints: bracket(&points),
            length: found.length,
        }))
    }

    /// Path length between two points, if they are connected.
    pub fn distance(
        &mut self,
        map: &dyn TileMap,
        mask: MovementMask,
        from: Waypoint,
        to: Waypoint,
    ) -> Result<Option<f32>, PathfindingError> {
        Ok(self
            .request_path(map, mask, from, to)?
            .map(|path| path.length))
    }

    /// Plans a route for `unit` to `target` and estimates the travel time in seconds.
    pub fn move_to(
        &mut self,
        map: &dyn TileMap,
        unit: &UnitSnapshot,
        target: Waypoint,
    ) -> Result<(Route, f32), NavigationError> {
        let speed = unit.profile.speed;
        if speed <= 0.0 {
            return Err(NavigationError::Immobile(unit.id));
        }
        let path = self
            .request_path(map, unit.profile.movement_mask, unit.position, target)?
            .ok_or(NavigationError::Unreachable {
                from: unit.position,
                to: target,
            })?;
        let seconds = path.length * map.tile_size() / speed;
        debug!(unit = unit.id.get(), length = path.length, seconds, "route planned");
        Ok((
            Route {
                waypoints: path.waypoints,
                progress: RouteProgress::default(),
            },
            seconds,
        ))
    }
}

/// Adds the extension points `2·p0 − p1` and `2·pn − pn−1` around `points`.
#[must_use]
pub fn bracket(points: &[Waypoint]) -> Vec<Waypoint> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let second = points.get(1).unwrap_or(first);
    let before_last = points.len().checked_sub(2).and_then(|i| points.get(i)).unwrap_or(last);

    let mut bracketed = Vec::with_capacity(points.len() + 2);
    bracketed.push(Waypoint::new(
        2.0 * first.x - second.x,
        2.0 * first.y - second.y,
    ));
    bracketed.extend_from_slice(points);
    bracketed.push(Waypoint::new(
        2.0 * last.x - before_last.x,
        2.0 * last.y - before_last.y,
    ));
    bracketed
}
