//! Declarative town layout used to construct the authoritative state.
//!
//! The map itself is produced by an external generator; this module is the
//! seam through which that generator hands the town its terrain, buildings,
//! props, and landmarks. Building placement paints walls, interior floor,
//! and the door tile so layouts stay consistent by construction, and
//! [`Town::from_layout`](crate::Town::from_layout) validates the result
//! before any simulation runs.

use hamlet_core::{BuildingId, BuildingKind, PropKind, RectSize, TileKind, TilePoint, TileRect};
use thiserror::Error;

/// Declarative description of a town before simulation starts.
#[derive(Clone, Debug)]
pub struct TownLayout {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
    buildings: Vec<BuildingPlan>,
    props: Vec<PropPlan>,
    plaza: Option<TilePoint>,
    player_start: TilePoint,
    clock_start: u32,
}

/// Building recorded within a layout.
#[derive(Clone, Debug)]
pub(crate) struct BuildingPlan {
    pub(crate) rect: TileRect,
    pub(crate) door: TilePoint,
    pub(crate) kind: BuildingKind,
}

/// Prop recorded within a layout.
#[derive(Clone, Debug)]
pub(crate) struct PropPlan {
    pub(crate) kind: PropKind,
    pub(crate) name: Option<String>,
    pub(crate) cell: TilePoint,
}

impl TownLayout {
    /// Creates an empty layout of open floor with the given dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![TileKind::Floor; capacity],
            buildings: Vec::new(),
            props: Vec::new(),
            plaza: None,
            player_start: TilePoint::new(0, 0),
            clock_start: 8 * 60,
        }
    }

    /// Width of the layout in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the layout in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Overwrites the terrain kind of a single tile.
    ///
    /// Out-of-bounds writes are ignored; validation happens when the town is
    /// constructed from the finished layout.
    pub fn set_tile(&mut self, cell: TilePoint, kind: TileKind) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = kind;
            }
        }
    }

    /// Adds a building, painting its walls, interior floor, and door tile.
    ///
    /// Returns the identifier future commands and views use to refer to the
    /// building.
    pub fn add_building(
        &mut self,
        origin: TilePoint,
        size: RectSize,
        door: TilePoint,
        kind: BuildingKind,
    ) -> BuildingId {
        let rect = TileRect::from_origin_and_size(origin, size);

        for y in origin.y()..origin.y() + size.height() {
            for x in origin.x()..origin.x() + size.width() {
                let cell = TilePoint::new(x, y);
                let on_border = x == origin.x()
                    || y == origin.y()
                    || x + 1 == origin.x() + size.width()
                    || y + 1 == origin.y() + size.height();
                let tile = if cell == door {
                    TileKind::Door
                } else if on_border {
                    TileKind::Wall
                } else {
                    TileKind::Floor
                };
                self.set_tile(cell, tile);
            }
        }

        let id = BuildingId::new(u32::try_from(self.buildings.len()).unwrap_or(u32::MAX));
        self.buildings.push(BuildingPlan { rect, door, kind });
        id
    }

    /// Adds a prop to the layout.
    pub fn add_prop(&mut self, kind: PropKind, name: Option<String>, cell: TilePoint) {
        self.props.push(PropPlan { kind, name, cell });
    }

    /// Marks the central plaza tile NPCs gather around.
    pub fn set_plaza(&mut self, cell: TilePoint) {
        self.plaza = Some(cell);
    }

    /// Chooses where the player avatar begins.
    pub fn set_player_start(&mut self, cell: TilePoint) {
        self.player_start = cell;
    }

    /// Chooses the minute of day the clock starts at.
    pub fn set_clock_start(&mut self, minutes_of_day: u32) {
        self.clock_start = minutes_of_day;
    }

    pub(crate) fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    pub(crate) fn buildings(&self) -> &[BuildingPlan] {
        &self.buildings
    }

    pub(crate) fn props(&self) -> &[PropPlan] {
        &self.props
    }

    pub(crate) fn plaza(&self) -> Option<TilePoint> {
        self.plaza
    }

    pub(crate) fn player_start(&self) -> TilePoint {
        self.player_start
    }

    pub(crate) fn clock_start(&self) -> u32 {
        self.clock_start
    }

    pub(crate) fn contains(&self, cell: TilePoint) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }

    fn index(&self, cell: TilePoint) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.y()).ok()?;
            let column = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Reasons a layout may be rejected during town construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout has a zero-sized dimension.
    #[error("layout dimensions {width}x{height} are degenerate")]
    EmptyGrid {
        /// Declared layout width.
        width: u32,
        /// Declared layout height.
        height: u32,
    },
    /// A building extends beyond the layout bounds.
    #[error("building {building:?} does not fit within the layout")]
    BuildingOutOfBounds {
        /// Identifier of the offending building.
        building: BuildingId,
    },
    /// A building is too small to have an interior.
    #[error("building {building:?} has no interior tiles")]
    BuildingTooSmall {
        /// Identifier of the offending building.
        building: BuildingId,
    },
    /// A building door does not sit on the building perimeter.
    #[error("door of building {building:?} is not on its perimeter")]
    DoorNotOnPerimeter {
        /// Identifier of the offending building.
        building: BuildingId,
    },
    /// A shop declares an empty opening window.
    #[error("shop {building:?} opens and closes at the same minute")]
    InvalidShopHours {
        /// Identifier of the offending building.
        building: BuildingId,
    },
    /// A prop lies outside the layout bounds.
    #[error("prop at {x},{y} lies outside the layout")]
    PropOutOfBounds {
        /// X coordinate of the offending prop.
        x: u32,
        /// Y coordinate of the offending prop.
        y: u32,
    },
    /// The plaza tile is missing or not walkable.
    #[error("plaza tile is not walkable")]
    PlazaNotWalkable,
    /// The player start tile is not walkable.
    #[error("player start tile is not walkable")]
    PlayerStartNotWalkable,
}
