//! Per-NPC pathfinding scratch state owned by the town AI system.
//!
//! The authoritative NPC record holds only gameplay state; everything the
//! planner caches between ticks lives here, with explicit invalidation so a
//! cleared plan always drops its paired debug copy as well.

use hamlet_core::TilePoint;
use hamlet_pathfinding::Path;

/// Cached waypoint sequence bound to the goal it was computed for.
///
/// Any goal change invalidates the plan. Steps include both the tile the
/// plan was computed from and the goal; a single remaining step means the
/// NPC already stands on the goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Plan {
    pub(crate) goal: TilePoint,
    pub(crate) steps: Path,
}

impl Plan {
    pub(crate) fn new(goal: TilePoint, steps: Path) -> Self {
        Self { goal, steps }
    }

    /// Drops waypoints until the plan starts at the provided tile.
    ///
    /// Returns `false` when the tile does not appear in the plan at all, in
    /// which case the plan is stale and must be discarded — it is never
    /// followed from a mismatched offset.
    pub(crate) fn resync_to(&mut self, current: TilePoint) -> bool {
        match self.steps.iter().position(|step| *step == current) {
            Some(offset) => {
                if offset > 0 {
                    let _ = self.steps.drain(..offset);
                }
                true
            }
            None => false,
        }
    }

    /// Next tile the plan wants the NPC to enter, if any remain.
    pub(crate) fn next_step(&self) -> Option<TilePoint> {
        self.steps.get(1).copied()
    }

    /// Advances past the head waypoint after a committed step.
    pub(crate) fn advance(&mut self) {
        if !self.steps.is_empty() {
            let _ = self.steps.remove(0);
        }
    }
}

/// Home-routing cache with wait tracking and replan backoff.
#[derive(Clone, Debug, Default)]
pub(crate) struct HomeRoute {
    pub(crate) plan: Option<Plan>,
    /// Consecutive ticks spent blocked while following the plan.
    pub(crate) wait: u8,
    /// Ticks remaining before another home replan may be attempted.
    pub(crate) cooldown: u8,
}

/// Debug waypoint copies populated for renderer overlays.
#[derive(Clone, Debug, Default)]
pub(crate) struct DebugPaths {
    pub(crate) path: Option<Path>,
    pub(crate) home_path: Option<Path>,
    pub(crate) route_path: Option<Path>,
}

/// All planner scratch attached to one NPC.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathState {
    pub(crate) plan: Option<Plan>,
    pub(crate) home: HomeRoute,
    /// Memoized building entrance, discovered once per NPC.
    pub(crate) home_door: Option<TilePoint>,
    pub(crate) stride: u8,
    pub(crate) stride_offset: u8,
    /// Personal minute-of-day at which the NPC heads home.
    pub(crate) depart_minute: Option<u32>,
    pub(crate) depart_assigned: bool,
    pub(crate) debug: DebugPaths,
}

impl PathState {
    pub(crate) fn new(stride: u8, stride_offset: u8) -> Self {
        Self {
            stride,
            stride_offset,
            ..Self::default()
        }
    }

    /// Discards the generic step plan together with its debug copy.
    pub(crate) fn clear_plan(&mut self) {
        self.plan = None;
        self.debug.path = None;
    }

    /// Discards the home-routing plan together with its debug copy.
    pub(crate) fn clear_home_plan(&mut self) {
        self.home.plan = None;
        self.home.wait = 0;
        self.debug.home_path = None;
    }
}
