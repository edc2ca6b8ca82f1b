//! Tick-scoped shared state threaded through the role routines.
//!
//! One [`TickCtx`] is constructed per clock tick and discarded when the
//! population pass completes. It carries the scratch occupancy that makes
//! earlier NPCs' moves visible to NPCs processed later in the same tick,
//! and the path budget that bounds fresh searches.

use hamlet_core::{
    direction_between, BuildingView, Command, NpcId, OccupancyView, TerrainView, TilePoint,
    TownClock,
};
use hamlet_pathfinding::PathBudget;

use crate::DebugConfig;

/// Dense per-tick occupancy scratch: NPC tiles plus the player.
///
/// Captured from the authoritative views at tick start and updated
/// incrementally as steps are committed, so tile contention between NPCs is
/// resolved sequentially within the tick.
#[derive(Clone, Debug)]
pub(crate) struct ScratchOccupancy {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl ScratchOccupancy {
    pub(crate) fn capture(
        occupancy: OccupancyView<'_>,
        player: TilePoint,
        terrain: TerrainView<'_>,
    ) -> Self {
        let (width, height) = terrain.dimensions();
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        let mut scratch = Self {
            width,
            height,
            cells: vec![false; capacity],
        };
        for y in 0..height {
            for x in 0..width {
                let tile = TilePoint::new(x, y);
                if occupancy.occupant(tile).is_some() {
                    scratch.occupy(tile);
                }
            }
        }
        scratch.occupy(player);
        scratch
    }

    pub(crate) fn is_blocked(&self, tile: TilePoint) -> bool {
        self.index(tile)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    pub(crate) fn occupy(&mut self, tile: TilePoint) {
        if let Some(index) = self.index(tile) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = true;
            }
        }
    }

    pub(crate) fn vacate(&mut self, tile: TilePoint) {
        if let Some(index) = self.index(tile) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = false;
            }
        }
    }

    fn index(&self, tile: TilePoint) -> Option<usize> {
        if tile.x() < self.width && tile.y() < self.height {
            let row = usize::try_from(tile.y()).ok()?;
            let column = usize::try_from(tile.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Everything one population pass shares: immutable views, the clock, the
/// scratch occupancy, and the tick's path budget.
#[derive(Debug)]
pub(crate) struct TickCtx<'a> {
    terrain: TerrainView<'a>,
    buildings: &'a BuildingView,
    pub(crate) clock: TownClock,
    pub(crate) debug: DebugConfig,
    pub(crate) occ: ScratchOccupancy,
    pub(crate) budget: PathBudget,
}

impl<'a> TickCtx<'a> {
    pub(crate) fn new(
        terrain: TerrainView<'a>,
        buildings: &'a BuildingView,
        clock: TownClock,
        debug: DebugConfig,
        occ: ScratchOccupancy,
        budget: PathBudget,
    ) -> Self {
        Self {
            terrain,
            buildings,
            clock,
            debug,
            occ,
            budget,
        }
    }

    /// Terrain view, detached from the context borrow.
    pub(crate) fn terrain(&self) -> TerrainView<'a> {
        self.terrain
    }

    /// Building view, detached from the context borrow.
    pub(crate) fn buildings(&self) -> &'a BuildingView {
        self.buildings
    }

    /// A tile an NPC may step onto right now: walkable terrain with no
    /// blocking prop, no NPC, and not the player's tile.
    pub(crate) fn is_free(&self, tile: TilePoint) -> bool {
        self.terrain.is_walkable(tile)
            && !self.terrain.prop_blocks(tile)
            && !self.occ.is_blocked(tile)
    }

    /// As [`Self::is_free`], but the NPC's own tile counts as free.
    pub(crate) fn is_free_for(&self, tile: TilePoint, own_cell: TilePoint) -> bool {
        tile == own_cell || self.is_free(tile)
    }

    /// Commits a single-tile move: updates the scratch occupancy and emits
    /// the step command for the town to validate and apply.
    pub(crate) fn commit_step(
        &mut self,
        npc: NpcId,
        from: TilePoint,
        to: TilePoint,
        out: &mut Vec<Command>,
    ) -> bool {
        let Some(direction) = direction_between(from, to) else {
            return false;
        };
        self.occ.vacate(from);
        self.occ.occupy(to);
        out.push(Command::StepNpc { npc, direction });
        true
    }
}
