use std::f32::consts::SQRT_2;

use warren_core::{CellCoord, MovementMask, TileCell, TileMap, Waypoint};
use warren_system_pathfinding::{
    passable_for, FoundPath, PathRequest, Pathfinder, SearchGrid, HEURISTIC_INFLATION,
};
use warren_world::BlockMap;

const GRANULARITY: u32 = 2;

fn request(start: (f32, f32), goal: (f32, f32)) -> PathRequest {
    PathRequest {
        start: Waypoint::new(start.0, start.1),
        goal: Waypoint::new(goal.0, goal.1),
        max_depth: 4096,
    }
}

fn wall_with_gap(gap_row: Option<usize>) -> BlockMap {
    let rows: Vec<String> = (0..10)
        .map(|row| {
            (0..10)
                .map(|column| {
                    if column == 5 && Some(row) != gap_row {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect();
    BlockMap::from_ascii(&rows, 1.0).expect("valid map")
}

fn search(map: &BlockMap, request: PathRequest) -> Option<FoundPath> {
    let grid = SearchGrid::for_map(map, GRANULARITY);
    let passable = passable_for(map, MovementMask::WALK);
    Pathfinder::new()
        .find_path(&grid, request, &passable)
        .expect("search storage grows")
}

/// Tiles visited along the polyline, sampled densely, with grid-snapped endpoints.
fn visited_tiles(map: &BlockMap, path: &FoundPath, request: PathRequest) -> Vec<TileCell> {
    let grid = SearchGrid::for_map(map, GRANULARITY);
    let mut points = path.waypoints.clone();
    if let Some(first) = points.first_mut() {
        if *first == request.start {
            *first = grid.center_of(grid.cell_at(request.start).expect("start on grid"));
        }
    }
    if let Some(last) = points.last_mut() {
        *last = grid.center_of(grid.cell_at(request.goal).expect("goal on grid"));
    }

    let mut tiles = Vec::new();
    for pair in points.windows(2) {
        for step in 0..=64 {
            let t = step as f32 / 64.0;
            let point = Waypoint::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            );
            let tile = point.tile().expect("point on map");
            if tiles.last() != Some(&tile) {
                tiles.push(tile);
            }
        }
    }
    tiles
}

#[test]
fn open_diagonal_matches_straight_line() {
    let map = BlockMap::open(10, 1.0);
    let path = search(&map, request((0.5, 0.5), (9.5, 9.5))).expect("path exists");

    assert!((path.length - 9.0 * SQRT_2).abs() < 1e-3);
    assert_eq!(path.waypoints.first(), Some(&Waypoint::new(0.5, 0.5)));
    assert_eq!(path.waypoints.last(), Some(&Waypoint::new(9.5, 9.5)));
}

#[test]
fn gap_on_the_diagonal_costs_only_the_corner_turns() {
    let map = wall_with_gap(Some(5));
    let req = request((0.5, 0.5), (9.5, 9.5));
    let path = search(&map, req).expect("path exists");

    // Entering and leaving the gap needs two straight steps each way at half-tile resolution.
    let expected = 2.0 + 8.0 * SQRT_2;
    assert!(
        (path.length - expected).abs() < 0.02,
        "length {} expected {}",
        path.length,
        expected
    );

    let tiles = visited_tiles(&map, &path, req);
    let gap_visits = tiles
        .iter()
        .filter(|tile| **tile == TileCell::new(5, 5))
        .count();
    assert_eq!(gap_visits, 1);
    assert!(tiles.iter().all(|tile| map.is_passable(*tile, MovementMask::WALK)));
}

#[test]
fn gap_at_the_edge_forces_a_longer_detour() {
    let map = wall_with_gap(Some(0));
    let diagonal = search(&wall_with_gap(Some(5)), request((0.5, 0.5), (9.5, 9.5)))
        .expect("path exists");
    let detour = search(&map, request((0.5, 0.5), (9.5, 9.5))).expect("path exists");

    assert!(detour.length > diagonal.length + 1.0);
    let tiles = visited_tiles(&map, &detour, request((0.5, 0.5), (9.5, 9.5)));
    assert!(tiles.contains(&TileCell::new(5, 0)));
}

#[test]
fn sealed_wall_writes_nothing() {
    let map = wall_with_gap(None);
    let grid = SearchGrid::for_map(&map, GRANULARITY);
    let passable = passable_for(&map, MovementMask::WALK);
    let sentinel = Waypoint::new(-7.0, -7.0);
    let mut out = [sentinel; 32];

    let result = Pathfinder::new()
        .find_path_into(&grid, request((0.5, 0.5), (9.5, 9.5)), &passable, &mut out)
        .expect("search storage grows");

    assert!(result.is_none());
    assert!(out.iter().all(|waypoint| *waypoint == sentinel));
}

#[test]
fn impassable_endpoints_are_not_found() {
    let map = wall_with_gap(Some(5));
    assert!(search(&map, request((0.5, 0.5), (5.5, 2.5))).is_none());
    assert!(search(&map, request((5.5, 2.5), (0.5, 0.5))).is_none());
    assert!(search(&map, request((0.5, 0.5), (12.0, 0.5))).is_none());
}

#[test]
fn water_is_only_crossed_by_waders() {
    let map = BlockMap::from_ascii(&[".~.", ".~.", ".~."], 1.0).expect("valid map");
    let grid = SearchGrid::for_map(&map, GRANULARITY);
    let req = request((0.5, 1.5), (2.5, 1.5));

    let walker = passable_for(&map, MovementMask::WALK);
    let wader = passable_for(&map, MovementMask::WALK.union(MovementMask::WADE));
    let mut pathfinder = Pathfinder::new();

    assert!(pathfinder
        .find_path(&grid, req, &walker)
        .expect("search storage grows")
        .is_none());
    let path = pathfinder
        .find_path(&grid, req, &wader)
        .expect("search storage grows")
        .expect("wader crosses");
    assert!((path.length - 2.0).abs() < 1e-3);
}

#[test]
fn truncated_paths_keep_the_goal_end() {
    let map = wall_with_gap(Some(0));
    let grid = SearchGrid::for_map(&map, GRANULARITY);
    let passable = passable_for(&map, MovementMask::WALK);
    let req = request((0.5, 9.5), (9.5, 9.5));
    let mut pathfinder = Pathfinder::new();

    let full = pathfinder
        .find_path(&grid, req, &passable)
        .expect("search storage grows")
        .expect("path exists");
    assert!(full.waypoints.len() >= 3);

    let mut out = [Waypoint::default(); 2];
    let summary = pathfinder
        .find_path_into(&grid, req, &passable, &mut out)
        .expect("search storage grows")
        .expect("path exists");

    assert_eq!(summary.depth, 2);
    assert_eq!(out[1], req.goal);
    assert_eq!(out[0], full.waypoints[full.waypoints.len() - 2]);
    let goal_center = grid.center_of(grid.cell_at(req.goal).expect("goal on grid"));
    assert!((summary.length - out[0].distance(goal_center)).abs() < 1e-3);
    assert!(summary.length < full.length);
}

#[test]
fn untruncated_depth_reports_waypoints_written() {
    let map = wall_with_gap(Some(0));
    let grid = SearchGrid::for_map(&map, GRANULARITY);
    let passable = passable_for(&map, MovementMask::WALK);
    let req = request((0.5, 9.5), (9.5, 9.5));
    let mut pathfinder = Pathfinder::new();
    let full = pathfinder
        .find_path(&grid, req, &passable)
        .expect("search storage grows")
        .expect("path exists");

    let mut out = [Waypoint::default(); 64];
    let summary = pathfinder
        .find_path_into(&grid, req, &passable, &mut out)
        .expect("search storage grows")
        .expect("path exists");

    assert_eq!(summary.depth, full.waypoints.len());
    assert_eq!(&out[..summary.depth], full.waypoints.as_slice());
    assert!((summary.length - full.length).abs() < 1e-5);
}

/// Lays pseudo-random rock over a square map, keeping the corners open.
fn scattered_map(seed: u64, size: usize) -> BlockMap {
    let mut state = seed;
    let rows: Vec<String> = (0..size)
        .map(|row| {
            (0..size)
                .map(|column| {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    let corner = (row == 0 && column == 0) || (row + 1 == size && column + 1 == size);
                    if !corner && (state >> 33) % 100 < 28 {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect();
    BlockMap::from_ascii(&rows, 1.0).expect("valid map")
}

/// Exhaustive shortest path over the same eight-connected, corner-safe grid.
fn reference_length(map: &BlockMap, start: CellCoord, goal: CellCoord) -> Option<f32> {
    let grid = SearchGrid::for_map(map, GRANULARITY);
    let open = |x: i64, y: i64| {
        u32::try_from(x).ok().zip(u32::try_from(y).ok()).is_some_and(|(x, y)| {
            grid.is_passable(CellCoord::new(x, y), &passable_for(map, MovementMask::WALK))
        })
    };
    let edge = grid.cells_per_edge() as i64;
    let count = grid.cell_count();
    let mut dist = vec![f32::INFINITY; count];
    let mut done = vec![false; count];
    let start_index = grid.index(start)?;
    dist[start_index] = 0.0;

    loop {
        let next = (0..count)
            .filter(|index| !done[*index] && dist[*index].is_finite())
            .min_by(|a, b| dist[*a].total_cmp(&dist[*b]))?;
        done[next] = true;
        let (x, y) = ((next as i64) % edge, (next as i64) / edge);
        if CellCoord::new(x as u32, y as u32) == goal {
            return Some(dist[next] / GRANULARITY as f32);
        }
        for dx in -1..=1_i64 {
            for dy in -1..=1_i64 {
                if (dx, dy) == (0, 0) || !open(x + dx, y + dy) {
                    continue;
                }
                if dx != 0 && dy != 0 && !(open(x + dx, y) && open(x, y + dy)) {
                    continue;
                }
                let neighbour = ((y + dy) * edge + x + dx) as usize;
                let cost = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                if dist[next] + cost < dist[neighbour] {
                    dist[neighbour] = dist[next] + cost;
                }
            }
        }
    }
}

#[test]
fn lengths_stay_within_inflation_of_the_optimum() {
    for seed in 1..=24 {
        let map = scattered_map(seed, 12);
        let grid = SearchGrid::for_map(&map, GRANULARITY);
        let req = request((0.3, 0.6), (11.4, 11.8));
        let start = grid.cell_at(req.start).expect("start on grid");
        let goal = grid.cell_at(req.goal).expect("goal on grid");

        let found = search(&map, req);
        match reference_length(&map, start, goal) {
            None => assert!(found.is_none(), "seed {seed} found a path through rock"),
            Some(optimum) => {
                let path = found.unwrap_or_else(|| panic!("seed {seed} missed a path"));
                assert!(
                    path.length >= optimum - 1e-3,
                    "seed {seed}: {} shorter than optimum {optimum}",
                    path.length
                );
                assert!(
                    path.length <= optimum * HEURISTIC_INFLATION + 1e-3,
                    "seed {seed}: {} exceeds optimum {optimum}",
                    path.length
                );
                let tiles = visited_tiles(&map, &path, req);
                assert!(
                    tiles.iter().all(|tile| map.is_passable(*tile, MovementMask::WALK)),
                    "seed {seed} crossed rock"
                );
            }
        }
    }
}
