#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warren simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots such as [`UnitView`] and [`JobView`], and respond
//! exclusively with new command batches.
//!
//! The map and the scripting runtime are external collaborators. They are
//! reached through the [`TileMap`] and [`JobScripts`] traits so the simulation
//! never depends on a concrete renderer, mesh, or interpreter.

use std::{collections::BTreeMap, fmt, ops::Range};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a job kind descriptor. Kinds are registered once at load time.
    RegisterJobKind {
        /// Descriptor of the kind being registered.
        descriptor: JobKindDescriptor,
    },
    /// Spawns a unit owned by the provided faction.
    SpawnUnit {
        /// Faction that owns the unit.
        owner: FactionId,
        /// Initial position of the unit in tile space.
        position: Waypoint,
        /// Type definition that drives the unit's movement and job desires.
        profile: UnitProfile,
    },
    /// Opens a new job in the owner's marketplace.
    CreateJob {
        /// Faction that owns the job.
        owner: FactionId,
        /// Kind of work requested.
        kind: JobKindId,
        /// Entity the job is about.
        target: JobTarget,
        /// Offset added to the target's position to locate the work spot.
        offset: Waypoint,
    },
    /// Deletes a single job after releasing its worker.
    DeleteJob {
        /// Faction that owns the job.
        owner: FactionId,
        /// Identifier of the job to delete.
        job: JobId,
    },
    /// Deletes every job of a kind that targets the provided entity.
    DeleteJobsTargeting {
        /// Faction that owns the jobs.
        owner: FactionId,
        /// Kind of the jobs to delete.
        kind: JobKindId,
        /// Target shared by the jobs to delete.
        target: JobTarget,
    },
    /// Hands a job to a unit, evicting the job's current worker if any.
    AssignJob {
        /// Unit that takes the job.
        unit: UnitId,
        /// Job being taken.
        job: JobId,
    },
    /// Clears a unit's job through the world's single release routine.
    StopJob {
        /// Unit that stops working.
        unit: UnitId,
        /// Reason reported alongside the release.
        reason: ReleaseReason,
    },
    /// Records the outcome of a behavior evaluation for the unit's job.
    RecordActivity {
        /// Unit whose job was evaluated.
        unit: UnitId,
        /// Whether the unit actively worked this tick.
        active: bool,
        /// Ticks to wait before the behavior is evaluated again.
        delay_ticks: f32,
    },
    /// Resets the unit's job search cooldown.
    ScheduleSearch {
        /// Unit whose cooldown is reset.
        unit: UnitId,
        /// Ticks to wait before the next search.
        delay_ticks: f32,
    },
    /// Adds a delta to a unit's saturation for a job kind. The world clamps the result.
    AdjustSaturation {
        /// Unit whose desire changes.
        unit: UnitId,
        /// Job kind whose saturation changes.
        kind: JobKindId,
        /// Signed amount added to the saturation.
        delta: f32,
    },
    /// Permanently disables a scripted hook of a job kind.
    DisableScriptHook {
        /// Job kind owning the hook.
        kind: JobKindId,
        /// Hook to disable.
        hook: ScriptHook,
    },
    /// Replaces the unit's active route.
    SetRoute {
        /// Unit that follows the route.
        unit: UnitId,
        /// Route to follow.
        route: Route,
    },
    /// Publishes a path-following step for a unit.
    AdvanceUnit {
        /// Unit that moved.
        unit: UnitId,
        /// Position reached after the step.
        position: Waypoint,
        /// Progress along the route after the step.
        progress: RouteProgress,
        /// Indicates that the route was fully traversed.
        finished: bool,
    },
    /// Advances the simulation clock by a single tick.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just started.
        tick: u64,
    },
    /// Confirms that a job kind became available.
    JobKindRegistered {
        /// Identifier of the registered kind.
        kind: JobKindId,
    },
    /// Confirms that a unit entered the simulation.
    UnitSpawned {
        /// Identifier allocated to the unit.
        unit: UnitId,
        /// Faction that owns the unit.
        owner: FactionId,
    },
    /// Confirms that a job opening was registered.
    JobCreated {
        /// Identifier allocated to the job.
        job: JobId,
        /// Faction that owns the job.
        owner: FactionId,
        /// Kind of work requested.
        kind: JobKindId,
    },
    /// Confirms that a job was removed from the registry.
    JobDeleted {
        /// Identifier of the deleted job.
        job: JobId,
        /// Faction that owned the job.
        owner: FactionId,
        /// Kind of the deleted job.
        kind: JobKindId,
    },
    /// Confirms that a unit now holds a job.
    JobAssigned {
        /// Job that changed hands.
        job: JobId,
        /// Unit that holds the job.
        unit: UnitId,
    },
    /// Reports that a unit no longer holds a job.
    JobReleased {
        /// Job that became free.
        job: JobId,
        /// Unit that released the job.
        unit: UnitId,
        /// Why the unit released the job.
        reason: ReleaseReason,
    },
    /// Reports that a unit started or stopped actively working its job.
    ActivityChanged {
        /// Unit whose activity changed.
        unit: UnitId,
        /// Whether the unit is now actively working.
        active: bool,
    },
    /// Reports that a scripted hook was disabled for the rest of the session.
    ScriptHookDisabled {
        /// Job kind owning the hook.
        kind: JobKindId,
        /// Hook that was disabled.
        hook: ScriptHook,
    },
    /// Confirms that a unit started following a route.
    RouteAssigned {
        /// Unit following the route.
        unit: UnitId,
        /// Final waypoint of the route.
        destination: Waypoint,
    },
    /// Confirms that a unit reached the end of its route.
    RouteCompleted {
        /// Unit that arrived.
        unit: UnitId,
        /// Position the unit snapped to.
        position: Waypoint,
    },
    /// Reports that a command could not be applied.
    CommandRejected {
        /// Specific reason the command failed.
        reason: RejectionReason,
    },
}

/// Reasons a unit releases its job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseReason {
    /// A demonstrably closer unit took the job.
    Preempted {
        /// Unit that took the job.
        by: UnitId,
    },
    /// The unit switched to a better job.
    Reassigned,
    /// The job was deleted from the registry.
    JobDeleted,
    /// The job's behavior no longer accepts the unit.
    BehaviorRejected,
    /// The job's behavior hook failed and was disabled.
    BehaviorFailed,
    /// The unit's desires make another kind more urgent.
    Unmotivated,
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// No unit with the provided identifier exists.
    UnknownUnit(UnitId),
    /// No job with the provided identifier exists for the owner.
    UnknownJob(JobId),
    /// No job kind with the provided identifier was registered.
    UnknownJobKind(JobKindId),
    /// A job kind with the provided identifier is already registered.
    DuplicateJobKind(JobKindId),
    /// The unit and the job belong to different factions.
    ForeignOwner {
        /// Unit that attempted to take the job.
        unit: UnitId,
        /// Job owned by another faction.
        job: JobId,
    },
    /// The unit's profile cannot perform the job's kind.
    IncapableUnit {
        /// Unit that attempted to take the job.
        unit: UnitId,
        /// Kind the unit cannot perform.
        kind: JobKindId,
    },
    /// The route does not carry both spline extension points and a real waypoint.
    InvalidRoute(UnitId),
}

/// Scripted callbacks a job kind may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScriptHook {
    /// Per-tick behavior evaluation of a unit working the job.
    Behavior,
    /// Dynamic preference query used while weighing candidate jobs.
    Preference,
}

impl fmt::Display for ScriptHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Behavior => f.write_str("behavior"),
            Self::Preference => f.write_str("preference"),
        }
    }
}

/// Lifecycle of a scripted hook attached to a job kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookState {
    /// The kind carries no script for this hook.
    Absent,
    /// The hook is called normally.
    Enabled,
    /// The hook failed once and stays off for the rest of the session.
    Disabled,
}

impl HookState {
    /// Creates the initial hook state from whether a script was provided.
    #[must_use]
    pub const fn from_presence(present: bool) -> Self {
        if present {
            Self::Enabled
        } else {
            Self::Absent
        }
    }

    /// Reports whether the hook should be invoked.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Unique identifier assigned to a faction owning units and jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(u32);

impl FactionId {
    /// Creates a new faction identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a job record. Identifiers are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(u32);

impl JobId {
    /// Creates a new job identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a job kind descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKindId(u32);

impl JobKindId {
    /// Creates a new job kind identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a room owned by the excluded map collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(u32);

impl RoomId {
    /// Creates a new room identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCell {
    column: u32,
    row: u32,
}

impl TileCell {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Centre of the tile in tile space.
    #[must_use]
    pub fn center(&self) -> Waypoint {
        Waypoint::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Location of a single search-grid cell. Cells subdivide tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// A point in tile space. One unit equals the edge of one map tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Horizontal coordinate measured in tiles.
    pub x: f32,
    /// Vertical coordinate measured in tiles.
    pub y: f32,
}

impl Waypoint {
    /// Creates a new point from tile-space coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Waypoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Component-wise sum of two points.
    #[must_use]
    pub fn offset_by(self, offset: Waypoint) -> Waypoint {
        Waypoint::new(self.x + offset.x, self.y + offset.y)
    }

    /// Tile containing the point, if the point lies in the non-negative quadrant.
    #[must_use]
    pub fn tile(self) -> Option<TileCell> {
        if !(self.x >= 0.0 && self.y >= 0.0) || !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        Some(TileCell::new(self.x.floor() as u32, self.y.floor() as u32))
    }
}

/// Bitmask describing which terrain a unit may traverse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementMask(u32);

impl MovementMask {
    /// Mask that traverses nothing.
    pub const NONE: Self = Self(0);
    /// Walking over open floor.
    pub const WALK: Self = Self(1);
    /// Crossing shallow water.
    pub const WADE: Self = Self(1 << 1);
    /// Crossing lava.
    pub const LAVA: Self = Self(1 << 2);
    /// Passing through doors of the owning faction.
    pub const DOOR: Self = Self(1 << 3);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Union of two masks.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Reports whether both masks share at least one capability.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// Entity a job is about. Exactly one target is always present.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobTarget {
    /// A map block, such as a tile to dig or claim.
    Block(TileCell),
    /// A room, located through an anchor point supplied by the map collaborator.
    Room {
        /// Identifier of the room.
        room: RoomId,
        /// Point inside the room where work happens.
        anchor: Waypoint,
    },
    /// Another unit, such as a prisoner to carry.
    Unit(UnitId),
}

/// Immutable descriptor of a job kind registered at load time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobKindDescriptor {
    /// Identifier of the kind.
    pub id: JobKindId,
    /// Human readable name.
    pub name: String,
    /// Whether the scripting runtime provides a behavior for the kind.
    pub has_behavior: bool,
    /// Whether the scripting runtime provides a dynamic preference for the kind.
    pub has_dynamic_preference: bool,
}

/// How strongly a unit type wants one job kind, and how that desire evolves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobAffinity {
    /// Static preference. Values at or below zero mark the kind as a last resort.
    pub preference: f32,
    /// Saturation assigned when the unit spawns.
    pub initial: f32,
    /// Saturation at or above which the desire is fully met.
    pub satisfied: f32,
    /// Saturation below which the desire is urgent.
    pub unsatisfied: f32,
    /// Saturation change per tick while performing the kind.
    pub performing_delta: f32,
    /// Saturation change per tick while not performing the kind.
    pub not_performing_delta: f32,
}

impl Default for JobAffinity {
    fn default() -> Self {
        Self {
            preference: 1.0,
            initial: 0.5,
            satisfied: 0.8,
            unsatisfied: 0.2,
            performing_delta: 0.0,
            not_performing_delta: 0.0,
        }
    }
}

/// Clamps a saturation value into the permitted `[0, 1]` range.
#[must_use]
pub fn clamp_saturation(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Type definition shared by units of the same species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    /// Terrain the unit may traverse.
    pub movement_mask: MovementMask,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Job kinds the unit can perform, with their desire configuration.
    pub affinities: BTreeMap<JobKindId, JobAffinity>,
}

/// Ordered waypoints plus the follower's progress along them.
///
/// The first and last waypoints are synthetic extension points that give the
/// spline a tangent at both real endpoints. Segment `i` joins `waypoints[i]`
/// and `waypoints[i + 1]`, so valid segments run from `1` to `len - 3`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Bracketed waypoint sequence.
    pub waypoints: Vec<Waypoint>,
    /// Progress of the follower along the waypoints.
    pub progress: RouteProgress,
}

impl Route {
    /// Final real waypoint, skipping the trailing extension point.
    #[must_use]
    pub fn destination(&self) -> Option<Waypoint> {
        let len = self.waypoints.len();
        if len < 3 {
            return None;
        }
        self.waypoints.get(len - 2).copied()
    }
}

/// Position of a follower within a [`Route`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    /// Index of the segment currently traversed.
    pub segment: usize,
    /// Distance already covered on the current segment.
    pub traveled: f32,
    /// Estimated length of the current segment.
    pub distance: f32,
}

/// Result of a successful behavior evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BehaviorVerdict {
    /// Whether the unit actively works the job this tick.
    pub active: bool,
    /// Ticks to wait before the behavior is evaluated again.
    pub next_delay_ticks: f32,
    /// Point the unit should walk to, if any.
    pub destination: Option<Waypoint>,
}

/// Failure raised by a scripted callback.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{hook} script for job kind {} failed: {message}", kind.get())]
pub struct ScriptError {
    /// Job kind whose script failed.
    pub kind: JobKindId,
    /// Hook that failed.
    pub hook: ScriptHook,
    /// Message reported by the scripting runtime.
    pub message: String,
}

/// Map and block collaborator consumed by the simulation.
pub trait TileMap {
    /// Reports whether a tile can be crossed by a unit with the provided mask.
    ///
    /// Tiles outside the map must report `false`.
    fn is_passable(&self, tile: TileCell, mask: MovementMask) -> bool;

    /// Edge length of a tile expressed in world units.
    fn tile_size(&self) -> f32;

    /// Number of tiles along each edge of the square map.
    fn map_size(&self) -> u32;
}

/// Scripting collaborator that defines job behavior.
pub trait JobScripts {
    /// Evaluates the behavior of `job` for `unit`.
    ///
    /// Returns `Ok(None)` when the behavior no longer accepts the unit.
    fn evaluate(
        &mut self,
        unit: &UnitSnapshot,
        job: &JobSnapshot,
    ) -> Result<Option<BehaviorVerdict>, ScriptError>;

    /// Queries the unit's current preference for a job kind.
    fn preference(&mut self, unit: &UnitSnapshot, kind: JobKindId) -> Result<f32, ScriptError>;
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Faction that owns the unit.
    pub owner: FactionId,
    /// Current position in tile space.
    pub position: Waypoint,
    /// Type definition of the unit.
    pub profile: UnitProfile,
    /// Job currently held, if any.
    pub job: Option<JobId>,
    /// Kind of the job currently held, if any.
    pub job_kind: Option<JobKindId>,
    /// Whether the unit actively worked its job on the last evaluation.
    pub active: bool,
    /// Ticks remaining before the unit searches for jobs again.
    pub search_cooldown: f32,
    /// Ticks remaining before the job behavior is evaluated again.
    pub execution_cooldown: f32,
    /// Saturation per job kind, always within `[0, 1]`.
    pub saturation: BTreeMap<JobKindId, f32>,
    /// Route currently followed, if any.
    pub route: Option<Route>,
}

impl UnitSnapshot {
    /// Saturation for a kind, falling back to the affinity's initial value.
    #[must_use]
    pub fn saturation_for(&self, kind: JobKindId) -> f32 {
        self.saturation
            .get(&kind)
            .copied()
            .or_else(|| self.profile.affinities.get(&kind).map(|a| a.initial))
            .map_or(0.0, clamp_saturation)
    }
}

/// Read-only snapshot describing all units, ordered by owner then identifier.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.owner, snapshot.id));
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single job record.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSnapshot {
    /// Identifier of the job.
    pub id: JobId,
    /// Faction that owns the job.
    pub owner: FactionId,
    /// Kind of work requested.
    pub kind: JobKindId,
    /// Unit currently holding the job, if any.
    pub worker: Option<UnitId>,
    /// Entity the job is about.
    pub target: JobTarget,
    /// Offset from the target's position to the work spot.
    pub offset: Waypoint,
    /// Resolved work spot, absent when the target can no longer be located.
    pub position: Option<Waypoint>,
}

/// Read-only snapshot of the job registry.
///
/// Jobs are grouped by owner, then kind, and keep registry order inside each
/// group. Lanes and identifiers are indexed once when the view is built.
#[derive(Clone, Debug, Default)]
pub struct JobView {
    snapshots: Vec<JobSnapshot>,
    lanes: BTreeMap<(FactionId, JobKindId), Range<usize>>,
    by_id: BTreeMap<JobId, usize>,
}

impl JobView {
    /// Creates a job view from snapshots in registry order.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<JobSnapshot>) -> Self {
        snapshots.sort_by_key(|job| (job.owner, job.kind));

        let mut lanes: BTreeMap<(FactionId, JobKindId), Range<usize>> = BTreeMap::new();
        let mut by_id = BTreeMap::new();
        for (index, job) in snapshots.iter().enumerate() {
            let _ = by_id.insert(job.id, index);
            let _ = lanes
                .entry((job.owner, job.kind))
                .and_modify(|lane| lane.end = index + 1)
                .or_insert(index..index + 1);
        }
        Self {
            snapshots,
            lanes,
            by_id,
        }
    }

    /// Iterator over all captured jobs.
    pub fn iter(&self) -> impl Iterator<Item = &JobSnapshot> {
        self.snapshots.iter()
    }

    /// Jobs of one owner and kind, in registry order.
    #[must_use]
    pub fn lane(&self, owner: FactionId, kind: JobKindId) -> &[JobSnapshot] {
        match self.lanes.get(&(owner, kind)) {
            Some(lane) => &self.snapshots[lane.clone()],
            None => &[],
        }
    }

    /// Looks up a job by identifier.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<&JobSnapshot> {
        self.by_id.get(&id).map(|index| &self.snapshots[*index])
    }

    /// Number of captured jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a registered job kind.
#[derive(Clone, Debug, PartialEq)]
pub struct JobKindSnapshot {
    /// Identifier of the kind.
    pub id: JobKindId,
    /// Human readable name.
    pub name: String,
    /// State of the behavior hook.
    pub behavior: HookState,
    /// State of the dynamic preference hook.
    pub preference: HookState,
}
