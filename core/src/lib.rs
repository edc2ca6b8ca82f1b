#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hamlet town simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative town, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the town executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Hamlet.";

/// Number of simulated minutes contained in one town day.
pub const MINUTES_PER_DAY: u32 = 1_440;

/// Commands that express all permissible town mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the town clock by the provided number of simulated minutes.
    Tick {
        /// Simulated minutes that elapse during the tick.
        minutes: u32,
    },
    /// Requests that a new NPC join the town at the provided tile.
    SpawnNpc {
        /// Display name assigned to the NPC.
        name: String,
        /// Role that governs the NPC's daily routine.
        role: Role,
        /// Tile the NPC should initially occupy.
        cell: TilePoint,
        /// Home assignment resolved for the NPC, if any.
        home: Option<HomeAssignment>,
        /// Errand or duty tile the NPC visits during the day, if any.
        work: Option<TilePoint>,
    },
    /// Requests placement of a prop on the provided tile.
    PlaceProp {
        /// Kind of prop to place.
        kind: PropKind,
        /// Optional label carried by the prop, such as a shop sign text.
        name: Option<String>,
        /// Tile the prop should occupy.
        cell: TilePoint,
    },
    /// Requests that an NPC advance a single tile in the given direction.
    StepNpc {
        /// Identifier of the NPC attempting to move.
        npc: NpcId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Records that an NPC fell asleep or woke up.
    SetNpcSleeping {
        /// Identifier of the NPC whose rest state changes.
        npc: NpcId,
        /// New rest state for the NPC.
        sleeping: bool,
    },
    /// Moves the player avatar to the provided tile.
    PlacePlayer {
        /// Tile the player should occupy.
        cell: TilePoint,
    },
}

/// Events broadcast by the town after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the town clock advanced by one tick.
    ClockAdvanced {
        /// Clock state after the advance.
        clock: TownClock,
    },
    /// Confirms that an NPC joined the town.
    NpcSpawned {
        /// Identifier assigned to the NPC by the town.
        npc: NpcId,
        /// Tile the NPC occupies after spawning.
        cell: TilePoint,
    },
    /// Confirms that an NPC moved between two tiles.
    NpcMoved {
        /// Identifier of the NPC that moved.
        npc: NpcId,
        /// Tile the NPC occupied before moving.
        from: TilePoint,
        /// Tile the NPC occupies after completing the move.
        to: TilePoint,
    },
    /// Announces that an NPC fell asleep.
    NpcFellAsleep {
        /// Identifier of the NPC that fell asleep.
        npc: NpcId,
    },
    /// Announces that an NPC woke up.
    NpcWokeUp {
        /// Identifier of the NPC that woke up.
        npc: NpcId,
    },
    /// Confirms that a prop was placed on a tile.
    PropPlaced {
        /// Kind of the placed prop.
        kind: PropKind,
        /// Tile the prop occupies.
        cell: TilePoint,
    },
    /// Confirms that the player avatar moved.
    PlayerMoved {
        /// Tile the player occupies after the move.
        cell: TilePoint,
    },
}

/// Cardinal movement directions available to NPCs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing y indices.
    North,
    /// Movement toward increasing x indices.
    East,
    /// Movement toward increasing y indices.
    South,
    /// Movement toward decreasing x indices.
    West,
}

impl Direction {
    /// All four cardinal directions in fixed evaluation order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Unique identifier assigned to an NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NpcId(u32);

impl NpcId {
    /// Creates a new NPC identifier with the provided numeric value.
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

/// Unique identifier assigned to a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
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

/// Location of a single tile expressed as x and y coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePoint {
    x: u32,
    y: u32,
}

impl TilePoint {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: TilePoint) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Tile reached by moving one step in the provided direction.
    ///
    /// Returns `None` when the step would leave the non-negative coordinate
    /// space; upper bounds are the caller's responsibility.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<TilePoint> {
        match direction {
            Direction::North => self.y.checked_sub(1).map(|y| TilePoint::new(self.x, y)),
            Direction::East => self.x.checked_add(1).map(|x| TilePoint::new(x, self.y)),
            Direction::South => self.y.checked_add(1).map(|y| TilePoint::new(self.x, y)),
            Direction::West => self.x.checked_sub(1).map(|x| TilePoint::new(x, self.y)),
        }
    }
}

/// Direction that leads from one tile to an adjacent tile, if any.
#[must_use]
pub fn direction_between(from: TilePoint, to: TilePoint) -> Option<Direction> {
    let x_diff = from.x().abs_diff(to.x());
    let y_diff = from.y().abs_diff(to.y());
    if x_diff + y_diff != 1 {
        return None;
    }

    if x_diff == 1 {
        if to.x() > from.x() {
            Some(Direction::East)
        } else {
            Some(Direction::West)
        }
    } else if to.y() > from.y() {
        Some(Direction::South)
    } else {
        Some(Direction::North)
    }
}

/// Size of a [`TileRect`] measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RectSize {
    width: u32,
    height: u32,
}

impl RectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Axis-aligned rectangle expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    origin: TilePoint,
    size: RectSize,
}

impl TileRect {
    /// Constructs a rectangle from an origin tile and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: TilePoint, size: RectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left tile that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> TilePoint {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole tiles.
    #[must_use]
    pub const fn size(&self) -> RectSize {
        self.size
    }

    /// Number of tiles covered by the rectangle, border included.
    #[must_use]
    pub const fn area(&self) -> u32 {
        self.size.width() * self.size.height()
    }

    /// Reports whether the tile lies within the rectangle, border included.
    #[must_use]
    pub fn contains(&self, tile: TilePoint) -> bool {
        tile.x() >= self.origin.x()
            && tile.y() >= self.origin.y()
            && tile.x() < self.origin.x() + self.size.width()
            && tile.y() < self.origin.y() + self.size.height()
    }

    /// Reports whether the tile lies strictly inside the rectangle border.
    #[must_use]
    pub fn interior_contains(&self, tile: TilePoint) -> bool {
        self.size.width() > 2
            && self.size.height() > 2
            && tile.x() > self.origin.x()
            && tile.y() > self.origin.y()
            && tile.x() + 1 < self.origin.x() + self.size.width()
            && tile.y() + 1 < self.origin.y() + self.size.height()
    }

    /// Iterates over the tiles strictly inside the rectangle border.
    pub fn interior_tiles(&self) -> impl Iterator<Item = TilePoint> {
        let x_start = self.origin.x() + 1;
        let y_start = self.origin.y() + 1;
        let x_end = (self.origin.x() + self.size.width()).saturating_sub(1);
        let y_end = (self.origin.y() + self.size.height()).saturating_sub(1);
        (y_start..y_end).flat_map(move |y| (x_start..x_end).map(move |x| TilePoint::new(x, y)))
    }
}

/// Kinds of terrain tiles that compose the town map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Open ground that NPCs and the player may traverse.
    Floor,
    /// Building entrance tile, traversable like floor.
    Door,
    /// Impassable terrain such as building walls.
    Wall,
}

impl TileKind {
    /// Reports whether NPCs may stand on this tile kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Door)
    }
}

/// Kinds of props that decorate the town.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    /// Shop sign; purely decorative and traversable.
    Sign,
    /// Floor rug; purely decorative and traversable.
    Rug,
    /// Storage chest.
    Chest,
    /// Public bench, an errand destination for residents.
    Bench,
    /// Bed that residents sleep in at night.
    Bed,
    /// Storage barrel.
    Barrel,
    /// Table.
    Table,
}

impl PropKind {
    /// Reports whether the prop blocks movement through its tile.
    ///
    /// Every prop blocks except signs and rugs.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        !matches!(self, PropKind::Sign | PropKind::Rug)
    }
}

/// Kinds of pets that roam the town.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PetKind {
    /// A town cat.
    Cat,
    /// A town dog.
    Dog,
}

/// Role that determines an NPC's daily routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Keeps a shop open during its business hours.
    Shopkeeper {
        /// Building that houses the shop the NPC keeps.
        shop: BuildingId,
    },
    /// Ordinary townsperson with a home, errands, and a bedtime.
    Resident,
    /// Free-roaming animal that never uses pathfinding.
    Pet {
        /// Species of the pet.
        kind: PetKind,
    },
    /// Fallback routine for NPCs without a specialised role.
    Generic,
}

impl Role {
    /// Reports whether the role describes a pet.
    #[must_use]
    pub const fn is_pet(&self) -> bool {
        matches!(self, Role::Pet { .. })
    }
}

/// Function a building serves within the town.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Residential building.
    House,
    /// Commercial building with business hours.
    Shop {
        /// Minute-of-day the shop opens.
        open_min: u32,
        /// Minute-of-day the shop closes.
        close_min: u32,
    },
    /// Shared shelter NPCs fall back to late at night.
    Tavern,
}

impl BuildingKind {
    /// Reports whether the building is a shop.
    #[must_use]
    pub const fn is_shop(&self) -> bool {
        matches!(self, BuildingKind::Shop { .. })
    }

    /// Reports whether the building is the town tavern.
    #[must_use]
    pub const fn is_tavern(&self) -> bool {
        matches!(self, BuildingKind::Tavern)
    }
}

/// Home resolved for an NPC during population seeding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HomeAssignment {
    /// Building the NPC lives in.
    pub building: BuildingId,
    /// Interior tile the NPC heads for when going home.
    pub target: TilePoint,
    /// Bed tile assigned to the NPC, if the building has one.
    pub bed: Option<TilePoint>,
}

/// Coarse segment of the town day derived from the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DayPhase {
    /// Early hours when residents wake and head out, 06:00 to 10:00.
    Morning,
    /// Working hours, 10:00 to 18:00.
    Day,
    /// Wind-down hours when NPCs drift homeward, 18:00 to 22:00.
    Evening,
    /// Sleeping hours, 22:00 to 06:00.
    Night,
}

impl DayPhase {
    /// Derives the phase active at the provided minute of day.
    #[must_use]
    pub const fn from_minutes(minutes_of_day: u32) -> Self {
        let m = minutes_of_day % MINUTES_PER_DAY;
        if m >= 360 && m < 600 {
            DayPhase::Morning
        } else if m >= 600 && m < 1_080 {
            DayPhase::Day
        } else if m >= 1_080 && m < 1_320 {
            DayPhase::Evening
        } else {
            DayPhase::Night
        }
    }
}

/// Simulation clock tracking the time of day and the tick counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TownClock {
    minutes_of_day: u32,
    turn_counter: u64,
}

impl TownClock {
    /// Creates a clock starting at the provided minute of day.
    #[must_use]
    pub const fn starting_at(minutes_of_day: u32) -> Self {
        Self {
            minutes_of_day: minutes_of_day % MINUTES_PER_DAY,
            turn_counter: 0,
        }
    }

    /// Clock state after one tick advancing the provided number of minutes.
    #[must_use]
    pub const fn advanced_by(self, minutes: u32) -> Self {
        Self {
            minutes_of_day: (self.minutes_of_day + minutes) % MINUTES_PER_DAY,
            turn_counter: self.turn_counter + 1,
        }
    }

    /// Minute of day in `[0, 1440)`.
    #[must_use]
    pub const fn minutes_of_day(&self) -> u32 {
        self.minutes_of_day
    }

    /// Hour component of the clock in `[0, 24)`.
    #[must_use]
    pub const fn hours(&self) -> u32 {
        self.minutes_of_day / 60
    }

    /// Minute component within the current hour in `[0, 60)`.
    #[must_use]
    pub const fn minute_of_hour(&self) -> u32 {
        self.minutes_of_day % 60
    }

    /// Number of ticks processed since the simulation began.
    #[must_use]
    pub const fn turn_counter(&self) -> u64 {
        self.turn_counter
    }

    /// Day phase active at the current clock reading.
    #[must_use]
    pub const fn phase(&self) -> DayPhase {
        DayPhase::from_minutes(self.minutes_of_day)
    }
}

/// Immutable representation of a single NPC's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpcSnapshot {
    /// Unique identifier assigned to the NPC.
    pub id: NpcId,
    /// Display name of the NPC.
    pub name: String,
    /// Role that governs the NPC's daily routine.
    pub role: Role,
    /// Tile currently occupied by the NPC.
    pub cell: TilePoint,
    /// Home resolved for the NPC, if any.
    pub home: Option<HomeAssignment>,
    /// Errand or duty tile the NPC visits during the day, if any.
    pub work: Option<TilePoint>,
    /// Indicates whether the NPC is currently asleep.
    pub sleeping: bool,
}

/// Read-only snapshot describing all NPCs within the town.
#[derive(Clone, Debug, Default)]
pub struct NpcView {
    snapshots: Vec<NpcSnapshot>,
}

impl NpcView {
    /// Creates a new NPC view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<NpcSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured NPC snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &NpcSnapshot> {
        self.snapshots.iter()
    }

    /// Number of NPCs captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no NPCs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot of the NPC with the provided identifier, if present.
    #[must_use]
    pub fn get(&self, npc: NpcId) -> Option<&NpcSnapshot> {
        self.snapshots
            .binary_search_by_key(&npc, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<NpcSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense NPC occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<NpcId>],
    width: u32,
    height: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<NpcId>], width: u32, height: u32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the NPC occupying the provided tile, if any.
    #[must_use]
    pub fn occupant(&self, tile: TilePoint) -> Option<NpcId> {
        self.index(tile)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the tile is currently free of NPCs.
    #[must_use]
    pub fn is_free(&self, tile: TilePoint) -> bool {
        self.occupant(tile).is_none()
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
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

/// Read-only view of the static terrain: tiles plus blocking props.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    tiles: &'a [TileKind],
    prop_blocked: &'a [bool],
    width: u32,
    height: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided slices.
    #[must_use]
    pub fn new(tiles: &'a [TileKind], prop_blocked: &'a [bool], width: u32, height: u32) -> Self {
        Self {
            tiles,
            prop_blocked,
            width,
            height,
        }
    }

    /// Kind of the tile at the provided position, if in bounds.
    #[must_use]
    pub fn tile(&self, tile: TilePoint) -> Option<TileKind> {
        self.index(tile)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the tile is in bounds and of a walkable kind.
    #[must_use]
    pub fn is_walkable(&self, tile: TilePoint) -> bool {
        self.tile(tile).is_some_and(TileKind::is_walkable)
    }

    /// Reports whether a blocking prop occupies the tile.
    #[must_use]
    pub fn prop_blocks(&self, tile: TilePoint) -> bool {
        self.index(tile)
            .and_then(|index| self.prop_blocked.get(index).copied())
            .unwrap_or(false)
    }

    /// Provides the dimensions of the terrain grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
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

/// Immutable representation of a single building used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildingSnapshot {
    /// Identifier assigned to the building by the town.
    pub id: BuildingId,
    /// Footprint of the building, border walls included.
    pub rect: TileRect,
    /// Entrance tile on the building perimeter.
    pub door: TilePoint,
    /// Function the building serves.
    pub kind: BuildingKind,
    /// Bed prop tiles inside the building.
    pub beds: Vec<TilePoint>,
}

/// Read-only snapshot describing the town's buildings and landmarks.
#[derive(Clone, Debug, Default)]
pub struct BuildingView {
    snapshots: Vec<BuildingSnapshot>,
    plaza: Option<TilePoint>,
}

impl BuildingView {
    /// Creates a new building view from the provided snapshots and plaza.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BuildingSnapshot>, plaza: Option<TilePoint>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots, plaza }
    }

    /// Iterator over the captured building snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &BuildingSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the building with the provided identifier, if present.
    #[must_use]
    pub fn get(&self, building: BuildingId) -> Option<&BuildingSnapshot> {
        self.snapshots
            .binary_search_by_key(&building, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Iterator over the buildings that operate as shops.
    #[must_use]
    pub fn shops(&self) -> impl Iterator<Item = &BuildingSnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind.is_shop())
    }

    /// The town tavern, if one exists.
    #[must_use]
    pub fn tavern(&self) -> Option<&BuildingSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.kind.is_tavern())
    }

    /// Central plaza tile NPCs gather around, if one exists.
    #[must_use]
    pub fn plaza(&self) -> Option<TilePoint> {
        self.plaza
    }

    /// Number of buildings captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no buildings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TilePoint::new(1, 1);
        let destination = TilePoint::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn step_honors_coordinate_bounds() {
        let corner = TilePoint::new(0, 0);
        assert_eq!(corner.step(Direction::North), None);
        assert_eq!(corner.step(Direction::West), None);
        assert_eq!(corner.step(Direction::East), Some(TilePoint::new(1, 0)));
        assert_eq!(corner.step(Direction::South), Some(TilePoint::new(0, 1)));
    }

    #[test]
    fn direction_between_adjacent_tiles() {
        let origin = TilePoint::new(3, 3);
        assert_eq!(
            direction_between(origin, TilePoint::new(3, 2)),
            Some(Direction::North)
        );
        assert_eq!(
            direction_between(origin, TilePoint::new(4, 3)),
            Some(Direction::East)
        );
        assert_eq!(
            direction_between(origin, TilePoint::new(3, 4)),
            Some(Direction::South)
        );
        assert_eq!(
            direction_between(origin, TilePoint::new(2, 3)),
            Some(Direction::West)
        );
        assert_eq!(direction_between(origin, origin), None);
        assert_eq!(direction_between(origin, TilePoint::new(5, 3)), None);
    }

    #[test]
    fn interior_excludes_rectangle_border() {
        let rect = TileRect::from_origin_and_size(TilePoint::new(2, 2), RectSize::new(4, 3));
        assert!(rect.contains(TilePoint::new(2, 2)));
        assert!(!rect.interior_contains(TilePoint::new(2, 2)));
        assert!(rect.interior_contains(TilePoint::new(3, 3)));
        assert!(rect.interior_contains(TilePoint::new(4, 3)));
        assert!(!rect.interior_contains(TilePoint::new(5, 3)));
        assert!(!rect.contains(TilePoint::new(6, 3)));
    }

    #[test]
    fn interior_tiles_cover_strict_interior() {
        let rect = TileRect::from_origin_and_size(TilePoint::new(0, 0), RectSize::new(4, 4));
        let tiles: Vec<TilePoint> = rect.interior_tiles().collect();
        assert_eq!(
            tiles,
            vec![
                TilePoint::new(1, 1),
                TilePoint::new(2, 1),
                TilePoint::new(1, 2),
                TilePoint::new(2, 2),
            ]
        );
    }

    #[test]
    fn degenerate_rectangles_have_no_interior() {
        let sliver = TileRect::from_origin_and_size(TilePoint::new(0, 0), RectSize::new(2, 5));
        assert_eq!(sliver.interior_tiles().count(), 0);
        assert!(!sliver.interior_contains(TilePoint::new(1, 1)));
    }

    #[test]
    fn prop_blocking_spares_signs_and_rugs() {
        assert!(!PropKind::Sign.blocks_movement());
        assert!(!PropKind::Rug.blocks_movement());
        assert!(PropKind::Chest.blocks_movement());
        assert!(PropKind::Bench.blocks_movement());
        assert!(PropKind::Bed.blocks_movement());
    }

    #[test]
    fn day_phase_band_edges() {
        assert_eq!(DayPhase::from_minutes(359), DayPhase::Night);
        assert_eq!(DayPhase::from_minutes(360), DayPhase::Morning);
        assert_eq!(DayPhase::from_minutes(599), DayPhase::Morning);
        assert_eq!(DayPhase::from_minutes(600), DayPhase::Day);
        assert_eq!(DayPhase::from_minutes(1_079), DayPhase::Day);
        assert_eq!(DayPhase::from_minutes(1_080), DayPhase::Evening);
        assert_eq!(DayPhase::from_minutes(1_319), DayPhase::Evening);
        assert_eq!(DayPhase::from_minutes(1_320), DayPhase::Night);
    }

    #[test]
    fn clock_wraps_at_midnight() {
        let clock = TownClock::starting_at(1_430).advanced_by(15);
        assert_eq!(clock.minutes_of_day(), 5);
        assert_eq!(clock.hours(), 0);
        assert_eq!(clock.minute_of_hour(), 5);
        assert_eq!(clock.turn_counter(), 1);
    }

    #[test]
    fn npc_view_sorts_and_finds_by_id() {
        let view = NpcView::from_snapshots(vec![
            snapshot(NpcId::new(3)),
            snapshot(NpcId::new(1)),
            snapshot(NpcId::new(2)),
        ]);
        let ids: Vec<u32> = view.iter().map(|npc| npc.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(view.get(NpcId::new(2)).is_some());
        assert!(view.get(NpcId::new(9)).is_none());
    }

    #[test]
    fn occupancy_view_reports_occupants() {
        let cells = vec![None, Some(NpcId::new(7)), None, None];
        let view = OccupancyView::new(&cells, 2, 2);
        assert_eq!(view.occupant(TilePoint::new(1, 0)), Some(NpcId::new(7)));
        assert!(view.is_free(TilePoint::new(0, 0)));
        assert!(view.is_free(TilePoint::new(5, 5)));
    }

    #[test]
    fn terrain_view_combines_tiles_and_props() {
        let tiles = vec![
            TileKind::Floor,
            TileKind::Wall,
            TileKind::Door,
            TileKind::Floor,
        ];
        let props = vec![false, false, false, true];
        let view = TerrainView::new(&tiles, &props, 2, 2);
        assert!(view.is_walkable(TilePoint::new(0, 0)));
        assert!(!view.is_walkable(TilePoint::new(1, 0)));
        assert!(view.is_walkable(TilePoint::new(0, 1)));
        assert!(!view.is_walkable(TilePoint::new(0, 2)));
        assert!(view.prop_blocks(TilePoint::new(1, 1)));
        assert!(!view.prop_blocks(TilePoint::new(0, 1)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tile_point_round_trips_through_bincode() {
        assert_round_trip(&TilePoint::new(12, 34));
    }

    #[test]
    fn tile_rect_round_trips_through_bincode() {
        let rect = TileRect::from_origin_and_size(TilePoint::new(5, 7), RectSize::new(2, 3));
        assert_round_trip(&rect);
    }

    #[test]
    fn building_kind_round_trips_through_bincode() {
        assert_round_trip(&BuildingKind::Shop {
            open_min: 480,
            close_min: 1_080,
        });
        assert_round_trip(&BuildingKind::Tavern);
    }

    #[test]
    fn prop_kind_round_trips_through_bincode() {
        assert_round_trip(&PropKind::Bench);
    }

    fn snapshot(id: NpcId) -> NpcSnapshot {
        NpcSnapshot {
            id,
            name: String::from("test"),
            role: Role::Generic,
            cell: TilePoint::new(0, 0),
            home: None,
            work: None,
            sleeping: false,
        }
    }
}
