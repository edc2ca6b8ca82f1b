#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic population seeder for freshly generated towns.
//!
//! Runs once at town entry: emits spawn commands for one shopkeeper per
//! shop (with a name sign by the door), residents scaled by building area,
//! and a handful of pets. All placement randomness comes from the seeded
//! RNG, so the same layout and seed always produce the same population.

use hamlet_core::{
    BuildingSnapshot, BuildingView, Command, Direction, HomeAssignment, OccupancyView, PetKind,
    PropKind, Role, TerrainView, TileKind, TilePoint,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Attempts allowed when hunting for a random free tile.
const PLACEMENT_ATTEMPTS: u32 = 200;

/// Chance a shopkeeper lives inside their own shop.
const SHOPKEEPER_LIVES_IN_CHANCE: f64 = 0.4;
/// Chance a building houses one resident beyond its area quota.
const EXTRA_RESIDENT_CHANCE: f64 = 0.4;
/// Chance a resident's errand is the plaza bench rather than a shop door.
const BENCH_ERRAND_CHANCE: f64 = 0.5;

/// Cats and dogs placed per town, each.
const PETS_PER_KIND: u32 = 2;

/// Fixed 9-neighborhood search order: self, E, W, S, N, SE, SW, NE, NW.
const NEIGHBORHOOD: [(i32, i32); 9] = [
    (0, 0),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

const RESIDENT_NAMES: [&str; 16] = [
    "Alda", "Bram", "Cedra", "Doran", "Edwyn", "Fenna", "Garet", "Hilde", "Ivo", "Jorunn",
    "Kellan", "Lisbet", "Marrow", "Nessa", "Osric", "Petra",
];

const SHOPKEEPER_NAMES: [&str; 8] = [
    "Tobias", "Ulla", "Viggo", "Wren", "Yara", "Zell", "Quinn", "Rhoda",
];

const CAT_NAMES: [&str; 4] = ["Whiskers", "Soot", "Mouser", "Pip"];
const DOG_NAMES: [&str; 4] = ["Biscuit", "Rufus", "Bell", "Tanner"];

/// Configuration parameters required to construct the seeding system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Seed for the seeder's deterministic RNG.
    pub rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that deterministically emits population spawn commands.
#[derive(Debug)]
pub struct Seeding {
    rng: ChaCha8Rng,
}

impl Seeding {
    /// Creates a new seeding system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes immutable views to emit spawn and sign commands.
    ///
    /// Intended to run once per town; calling it again would seed a second
    /// population.
    pub fn handle(
        &mut self,
        buildings: &BuildingView,
        terrain: TerrainView<'_>,
        occupancy: OccupancyView<'_>,
        player: TilePoint,
        benches: &[TilePoint],
        out: &mut Vec<Command>,
    ) {
        let mut claimed = Claimed::capture(terrain, occupancy, player);

        self.seed_shopkeepers(buildings, terrain, &mut claimed, out);
        self.seed_residents(buildings, benches, &mut claimed, out);
        self.seed_pets(terrain, &mut claimed, out);
    }

    fn seed_shopkeepers(
        &mut self,
        buildings: &BuildingView,
        terrain: TerrainView<'_>,
        claimed: &mut Claimed,
        out: &mut Vec<Command>,
    ) {
        let all: Vec<&BuildingSnapshot> = buildings.iter().collect();
        for shop in buildings.shops() {
            let Some(cell) = scan_neighborhood(shop.door, |candidate| claimed.is_free(candidate))
            else {
                continue;
            };

            let home_building = if all.len() <= 1
                || self.rng.gen::<f64>() < SHOPKEEPER_LIVES_IN_CHANCE
            {
                shop
            } else {
                all[self.rng.gen_range(0..all.len())]
            };
            let target = self
                .random_interior_spot(home_building, claimed)
                .or_else(|| home_building.rect.interior_tiles().next())
                .unwrap_or(home_building.door);
            let bed = self.pick_bed(home_building);

            let name = SHOPKEEPER_NAMES[self.rng.gen_range(0..SHOPKEEPER_NAMES.len())];
            claimed.claim(cell);
            out.push(Command::SpawnNpc {
                name: String::from(name),
                role: Role::Shopkeeper { shop: shop.id },
                cell,
                home: Some(HomeAssignment {
                    building: home_building.id,
                    target,
                    bed,
                }),
                work: Some(shop.door),
            });

            if let Some(sign_cell) = sign_spot(shop, terrain) {
                out.push(Command::PlaceProp {
                    kind: PropKind::Sign,
                    name: Some(format!("{name}'s shop")),
                    cell: sign_cell,
                });
            }
        }
    }

    fn seed_residents(
        &mut self,
        buildings: &BuildingView,
        benches: &[TilePoint],
        claimed: &mut Claimed,
        out: &mut Vec<Command>,
    ) {
        let shop_doors: Vec<TilePoint> = buildings.shops().map(|shop| shop.door).collect();
        let plaza_bench = buildings.plaza().and_then(|plaza| {
            benches
                .iter()
                .copied()
                .min_by_key(|bench| bench.manhattan_distance(plaza))
        });

        for building in buildings.iter() {
            let extra = self.rng.gen::<f64>() < EXTRA_RESIDENT_CHANCE;
            let quota = resident_quota(building.rect.area(), extra);

            let mut placed = 0;
            for _ in 0..quota {
                let Some(cell) = self.random_interior_spot(building, claimed) else {
                    continue;
                };
                self.spawn_resident(building, cell, plaza_bench, &shop_doors, claimed, out);
                placed += 1;
            }

            // Every building keeps at least one resident when any interior
            // tile is still free.
            if placed == 0 {
                if let Some(cell) = building
                    .rect
                    .interior_tiles()
                    .find(|tile| claimed.is_free(*tile))
                {
                    self.spawn_resident(building, cell, plaza_bench, &shop_doors, claimed, out);
                }
            }
        }
    }

    fn spawn_resident(
        &mut self,
        building: &BuildingSnapshot,
        cell: TilePoint,
        plaza_bench: Option<TilePoint>,
        shop_doors: &[TilePoint],
        claimed: &mut Claimed,
        out: &mut Vec<Command>,
    ) {
        let bed = self.pick_bed(building);
        let errand = if self.rng.gen::<f64>() < BENCH_ERRAND_CHANCE {
            plaza_bench.or_else(|| self.pick_shop_door(shop_doors))
        } else {
            self.pick_shop_door(shop_doors).or(plaza_bench)
        };

        let name = RESIDENT_NAMES[self.rng.gen_range(0..RESIDENT_NAMES.len())];
        claimed.claim(cell);
        out.push(Command::SpawnNpc {
            name: String::from(name),
            role: Role::Resident,
            cell,
            home: Some(HomeAssignment {
                building: building.id,
                target: cell,
                bed,
            }),
            work: errand,
        });
    }

    fn seed_pets(&mut self, terrain: TerrainView<'_>, claimed: &mut Claimed, out: &mut Vec<Command>) {
        let litters = [
            (PetKind::Cat, CAT_NAMES),
            (PetKind::Dog, DOG_NAMES),
        ];
        for (kind, names) in litters {
            for _ in 0..PETS_PER_KIND {
                let Some(cell) = self.random_floor_spot(terrain, claimed) else {
                    // No free floor left anywhere; later pets will not fare
                    // better.
                    return;
                };
                let name = names[self.rng.gen_range(0..names.len())];
                claimed.claim(cell);
                out.push(Command::SpawnNpc {
                    name: String::from(name),
                    role: Role::Pet { kind },
                    cell,
                    home: None,
                    work: None,
                });
            }
        }
    }

    fn pick_bed(&mut self, building: &BuildingSnapshot) -> Option<TilePoint> {
        if building.beds.is_empty() {
            None
        } else {
            Some(building.beds[self.rng.gen_range(0..building.beds.len())])
        }
    }

    fn pick_shop_door(&mut self, shop_doors: &[TilePoint]) -> Option<TilePoint> {
        if shop_doors.is_empty() {
            None
        } else {
            Some(shop_doors[self.rng.gen_range(0..shop_doors.len())])
        }
    }

    fn random_interior_spot(
        &mut self,
        building: &BuildingSnapshot,
        claimed: &Claimed,
    ) -> Option<TilePoint> {
        let origin = building.rect.origin();
        let size = building.rect.size();
        if size.width() < 3 || size.height() < 3 {
            return None;
        }

        for _ in 0..PLACEMENT_ATTEMPTS {
            let x = origin.x() + 1 + self.rng.gen_range(0..size.width() - 2);
            let y = origin.y() + 1 + self.rng.gen_range(0..size.height() - 2);
            let candidate = TilePoint::new(x, y);
            if claimed.is_free(candidate) {
                return Some(candidate);
            }
        }

        building
            .rect
            .interior_tiles()
            .find(|tile| claimed.is_free(*tile))
    }

    fn random_floor_spot(
        &mut self,
        terrain: TerrainView<'_>,
        claimed: &Claimed,
    ) -> Option<TilePoint> {
        let (width, height) = terrain.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        for _ in 0..PLACEMENT_ATTEMPTS {
            let candidate = TilePoint::new(
                self.rng.gen_range(0..width),
                self.rng.gen_range(0..height),
            );
            if terrain.tile(candidate) == Some(TileKind::Floor) && claimed.is_free(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Resident head-count for a building: one per thirty tiles of footprint,
/// clamped to `[1, 3]`, plus the occasional extra.
fn resident_quota(area: u32, extra: bool) -> u32 {
    let base = (area / 30).clamp(1, 3);
    base + u32::from(extra)
}

/// Free tile adjacent to the shop door, outside the building, for the sign.
fn sign_spot(shop: &BuildingSnapshot, terrain: TerrainView<'_>) -> Option<TilePoint> {
    for direction in Direction::ALL {
        let Some(candidate) = shop.door.step(direction) else {
            continue;
        };
        if !shop.rect.contains(candidate) && terrain.is_walkable(candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Searches the fixed 9-neighborhood of `anchor` for an acceptable tile,
/// checking the anchor itself first.
fn scan_neighborhood<P>(anchor: TilePoint, mut accept: P) -> Option<TilePoint>
where
    P: FnMut(TilePoint) -> bool,
{
    for (dx, dy) in NEIGHBORHOOD {
        let x = i64::from(anchor.x()) + i64::from(dx);
        let y = i64::from(anchor.y()) + i64::from(dy);
        if x < 0 || y < 0 {
            continue;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            continue;
        };
        let candidate = TilePoint::new(x, y);
        if accept(candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Tiles already spoken for during the seeding pass: terrain obstacles,
/// existing NPCs, the player, and spawns emitted earlier in the same batch.
#[derive(Debug)]
struct Claimed {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Claimed {
    fn capture(
        terrain: TerrainView<'_>,
        occupancy: OccupancyView<'_>,
        player: TilePoint,
    ) -> Self {
        let (width, height) = terrain.dimensions();
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        let mut claimed = Self {
            width,
            height,
            cells: vec![false; capacity],
        };
        for y in 0..height {
            for x in 0..width {
                let tile = TilePoint::new(x, y);
                if !terrain.is_walkable(tile)
                    || terrain.prop_blocks(tile)
                    || occupancy.occupant(tile).is_some()
                {
                    claimed.claim(tile);
                }
            }
        }
        claimed.claim(player);
        claimed
    }

    fn is_free(&self, tile: TilePoint) -> bool {
        self.index(tile)
            .map(|index| !self.cells[index])
            .unwrap_or(false)
    }

    fn claim(&mut self, tile: TilePoint) {
        if let Some(index) = self.index(tile) {
            self.cells[index] = true;
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
