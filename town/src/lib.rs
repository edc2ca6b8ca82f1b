#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative town state management for Hamlet.
//!
//! The town owns the terrain, buildings, props, the player avatar, and every
//! NPC record. Systems never mutate it directly: they submit [`Command`]
//! values through [`apply`], which validates each mutation against the
//! current state and broadcasts [`Event`] values describing what actually
//! happened. Rejected steps are dropped silently; the worst a misbehaving
//! system can do is waste its own turn.

mod layout;

pub use layout::{LayoutError, TownLayout};

use hamlet_core::{
    BuildingId, BuildingKind, Command, Event, HomeAssignment, NpcId, PropKind, Role, TileKind,
    TilePoint, TileRect, TownClock,
};

/// Represents the authoritative Hamlet town state.
#[derive(Debug)]
pub struct Town {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
    prop_blocked: Vec<bool>,
    props: Vec<Prop>,
    buildings: Vec<Building>,
    plaza: Option<TilePoint>,
    player: TilePoint,
    npcs: Vec<Npc>,
    occupancy: OccupancyGrid,
    clock: TownClock,
    next_npc_id: u32,
}

impl Town {
    /// Constructs a town from a validated layout.
    pub fn from_layout(layout: &TownLayout) -> Result<Self, LayoutError> {
        let width = layout.width();
        let height = layout.height();
        if width == 0 || height == 0 {
            return Err(LayoutError::EmptyGrid { width, height });
        }

        let mut buildings = Vec::with_capacity(layout.buildings().len());
        for (index, plan) in layout.buildings().iter().enumerate() {
            let id = BuildingId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let rect = plan.rect;
            let origin = rect.origin();
            let size = rect.size();

            if origin.x() + size.width() > width || origin.y() + size.height() > height {
                return Err(LayoutError::BuildingOutOfBounds { building: id });
            }
            if size.width() < 3 || size.height() < 3 {
                return Err(LayoutError::BuildingTooSmall { building: id });
            }
            if !rect.contains(plan.door) || rect.interior_contains(plan.door) {
                return Err(LayoutError::DoorNotOnPerimeter { building: id });
            }
            if let BuildingKind::Shop {
                open_min,
                close_min,
            } = plan.kind
            {
                if open_min == close_min {
                    return Err(LayoutError::InvalidShopHours { building: id });
                }
            }

            buildings.push(Building {
                id,
                rect,
                door: plan.door,
                kind: plan.kind,
            });
        }

        let tiles = layout.tiles().to_vec();
        let capacity = tiles.len();
        let mut prop_blocked = vec![false; capacity];
        let mut props = Vec::with_capacity(layout.props().len());
        for plan in layout.props() {
            if !layout.contains(plan.cell) {
                return Err(LayoutError::PropOutOfBounds {
                    x: plan.cell.x(),
                    y: plan.cell.y(),
                });
            }
            if plan.kind.blocks_movement() {
                if let Some(index) = grid_index(width, height, plan.cell) {
                    prop_blocked[index] = true;
                }
            }
            props.push(Prop {
                kind: plan.kind,
                name: plan.name.clone(),
                cell: plan.cell,
            });
        }

        let town = Self {
            width,
            height,
            tiles,
            prop_blocked,
            props,
            buildings,
            plaza: layout.plaza(),
            player: layout.player_start(),
            npcs: Vec::new(),
            occupancy: OccupancyGrid::new(width, height),
            clock: TownClock::starting_at(layout.clock_start()),
            next_npc_id: 0,
        };

        if let Some(plaza) = town.plaza {
            if !town.is_walkable(plaza) {
                return Err(LayoutError::PlazaNotWalkable);
            }
        }
        if !town.is_walkable(town.player) {
            return Err(LayoutError::PlayerStartNotWalkable);
        }

        Ok(town)
    }

    fn is_walkable(&self, cell: TilePoint) -> bool {
        grid_index(self.width, self.height, cell)
            .and_then(|index| self.tiles.get(index).copied())
            .is_some_and(TileKind::is_walkable)
    }

    fn prop_blocks(&self, cell: TilePoint) -> bool {
        grid_index(self.width, self.height, cell)
            .and_then(|index| self.prop_blocked.get(index).copied())
            .unwrap_or(false)
    }

    /// A tile accepts an NPC when it is walkable terrain, clear of blocking
    /// props and other NPCs, and not under the player.
    fn can_enter(&self, cell: TilePoint) -> bool {
        self.is_walkable(cell)
            && !self.prop_blocks(cell)
            && self.occupancy.can_enter(cell)
            && self.player != cell
    }

    fn npc_mut(&mut self, npc: NpcId) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|candidate| candidate.id == npc)
    }
}

/// Applies the provided command to the town, mutating state deterministically.
pub fn apply(town: &mut Town, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { minutes } => {
            town.clock = town.clock.advanced_by(minutes);
            out_events.push(Event::ClockAdvanced { clock: town.clock });
        }
        Command::SpawnNpc {
            name,
            role,
            cell,
            home,
            work,
        } => {
            if !town.can_enter(cell) {
                return;
            }

            let id = NpcId::new(town.next_npc_id);
            town.next_npc_id = town.next_npc_id.saturating_add(1);
            town.npcs.push(Npc {
                id,
                name,
                role,
                cell,
                home,
                work,
                sleeping: false,
            });
            town.occupancy.occupy(id, cell);
            out_events.push(Event::NpcSpawned { npc: id, cell });
        }
        Command::PlaceProp { kind, name, cell } => {
            if grid_index(town.width, town.height, cell).is_none() {
                return;
            }

            if kind.blocks_movement() {
                if let Some(index) = grid_index(town.width, town.height, cell) {
                    if let Some(slot) = town.prop_blocked.get_mut(index) {
                        *slot = true;
                    }
                }
            }
            town.props.push(Prop { kind, name, cell });
            out_events.push(Event::PropPlaced { kind, cell });
        }
        Command::StepNpc { npc, direction } => {
            let Some(record) = town.npcs.iter().find(|candidate| candidate.id == npc) else {
                return;
            };
            let from = record.cell;
            let Some(to) = from.step(direction) else {
                return;
            };
            if !town.can_enter(to) {
                return;
            }

            town.occupancy.vacate(from);
            town.occupancy.occupy(npc, to);
            if let Some(record) = town.npc_mut(npc) {
                record.cell = to;
            }
            out_events.push(Event::NpcMoved { npc, from, to });
        }
        Command::SetNpcSleeping { npc, sleeping } => {
            let Some(record) = town.npc_mut(npc) else {
                return;
            };
            if record.sleeping == sleeping {
                return;
            }

            record.sleeping = sleeping;
            if sleeping {
                out_events.push(Event::NpcFellAsleep { npc });
            } else {
                out_events.push(Event::NpcWokeUp { npc });
            }
        }
        Command::PlacePlayer { cell } => {
            if !town.is_walkable(cell) {
                return;
            }

            town.player = cell;
            out_events.push(Event::PlayerMoved { cell });
        }
    }
}

/// Query functions that provide read-only access to the town state.
pub mod query {
    use super::Town;
    use hamlet_core::{
        BuildingSnapshot, BuildingView, NpcSnapshot, NpcView, OccupancyView, PropKind,
        TerrainView, TilePoint, TownClock,
    };

    /// Captures a read-only view of the NPCs inhabiting the town.
    #[must_use]
    pub fn npc_view(town: &Town) -> NpcView {
        let snapshots: Vec<NpcSnapshot> = town
            .npcs
            .iter()
            .map(|npc| NpcSnapshot {
                id: npc.id,
                name: npc.name.clone(),
                role: npc.role,
                cell: npc.cell,
                home: npc.home,
                work: npc.work,
                sleeping: npc.sleeping,
            })
            .collect();
        NpcView::from_snapshots(snapshots)
    }

    /// Exposes a read-only view of the dense NPC occupancy grid.
    #[must_use]
    pub fn occupancy_view(town: &Town) -> OccupancyView<'_> {
        OccupancyView::new(town.occupancy.cells(), town.width, town.height)
    }

    /// Exposes a read-only view of the terrain and blocking props.
    #[must_use]
    pub fn terrain_view(town: &Town) -> TerrainView<'_> {
        TerrainView::new(&town.tiles, &town.prop_blocked, town.width, town.height)
    }

    /// Captures a read-only view of the buildings, beds, and landmarks.
    #[must_use]
    pub fn building_view(town: &Town) -> BuildingView {
        let snapshots: Vec<BuildingSnapshot> = town
            .buildings
            .iter()
            .map(|building| BuildingSnapshot {
                id: building.id,
                rect: building.rect,
                door: building.door,
                kind: building.kind,
                beds: town
                    .props
                    .iter()
                    .filter(|prop| {
                        prop.kind == PropKind::Bed && building.rect.interior_contains(prop.cell)
                    })
                    .map(|prop| prop.cell)
                    .collect(),
            })
            .collect();
        BuildingView::from_snapshots(snapshots, town.plaza)
    }

    /// Tiles occupied by bench props, in placement order.
    #[must_use]
    pub fn bench_tiles(town: &Town) -> Vec<TilePoint> {
        town.props
            .iter()
            .filter(|prop| prop.kind == PropKind::Bench)
            .map(|prop| prop.cell)
            .collect()
    }

    /// Labelled sign props, pairing each sign tile with its text.
    #[must_use]
    pub fn sign_labels(town: &Town) -> Vec<(TilePoint, String)> {
        town.props
            .iter()
            .filter(|prop| prop.kind == PropKind::Sign)
            .filter_map(|prop| prop.name.clone().map(|name| (prop.cell, name)))
            .collect()
    }

    /// Current reading of the simulation clock.
    #[must_use]
    pub fn clock(town: &Town) -> TownClock {
        town.clock
    }

    /// Tile currently occupied by the player avatar.
    #[must_use]
    pub fn player(town: &Town) -> TilePoint {
        town.player
    }

    /// Dimensions of the town grid in tiles.
    #[must_use]
    pub fn dimensions(town: &Town) -> (u32, u32) {
        (town.width, town.height)
    }

    /// Number of props currently placed in the town.
    #[must_use]
    pub fn prop_count(town: &Town) -> usize {
        town.props.len()
    }
}

#[derive(Clone, Debug)]
struct Npc {
    id: NpcId,
    name: String,
    role: Role,
    cell: TilePoint,
    home: Option<HomeAssignment>,
    work: Option<TilePoint>,
    sleeping: bool,
}

#[derive(Clone, Debug)]
struct Prop {
    kind: PropKind,
    name: Option<String>,
    cell: TilePoint,
}

#[derive(Clone, Debug)]
struct Building {
    id: BuildingId,
    rect: TileRect,
    door: TilePoint,
    kind: BuildingKind,
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<NpcId>>,
}

impl OccupancyGrid {
    fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
        }
    }

    fn can_enter(&self, cell: TilePoint) -> bool {
        grid_index(self.width, self.height, cell).map_or(true, |index| {
            self.cells.get(index).copied().unwrap_or(None).is_none()
        })
    }

    fn occupy(&mut self, npc: NpcId, cell: TilePoint) {
        if let Some(index) = grid_index(self.width, self.height, cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(npc);
            }
        }
    }

    fn vacate(&mut self, cell: TilePoint) {
        if let Some(index) = grid_index(self.width, self.height, cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    fn cells(&self) -> &[Option<NpcId>] {
        &self.cells
    }
}

fn grid_index(width: u32, height: u32, cell: TilePoint) -> Option<usize> {
    if cell.x() < width && cell.y() < height {
        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(width).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}
