#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic town AI system: daily routines, budgeted pathfinding, and
//! sequential conflict resolution over a shared occupancy grid.
//!
//! The system reacts to [`Event::ClockAdvanced`] by running one population
//! pass: it rebuilds the tick-scoped scratch occupancy, initializes the path
//! budget, shuffles the processing order, and dispatches every NPC to its
//! role routine. Movement decisions come back as [`Command::StepNpc`] values
//! for the town to validate and apply; the scratch occupancy is updated as
//! commands are emitted so NPCs processed later in the same tick observe
//! earlier moves and two NPCs can never agree on one tile.

mod ctx;
mod path_state;
mod roles;
mod router;
mod schedule;
mod step;

use std::collections::BTreeMap;

use hamlet_core::{
    BuildingView, Command, DayPhase, Event, NpcId, NpcView, OccupancyView, Role, TerrainView,
    TilePoint, TownClock,
};
use hamlet_pathfinding::PathBudget;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ctx::{ScratchOccupancy, TickCtx};
use path_state::PathState;

/// Tick-skipping cadence for pets.
const PET_STRIDE: u8 = 3;
/// Tick-skipping cadence for everyone else.
const DEFAULT_STRIDE: u8 = 2;

/// Debug overlay toggles injected at construction time.
///
/// When a toggle is off the corresponding debug copies are never populated,
/// so production runs pay nothing for the hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugConfig {
    /// Populate step-executor and router path copies.
    pub town_paths: bool,
    /// Populate home-routing path copies.
    pub home_paths: bool,
}

/// Configuration parameters required to construct the town AI system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Seed for the system's deterministic RNG.
    pub rng_seed: u64,
    /// Fixed per-tick path budget; `None` scales with the population.
    pub path_budget: Option<u32>,
    /// Debug overlay toggles.
    pub debug: DebugConfig,
}

impl Config {
    /// Creates a configuration with the provided RNG seed and defaults.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            path_budget: None,
            debug: DebugConfig {
                town_paths: false,
                home_paths: false,
            },
        }
    }
}

/// Pure system that reacts to clock events and emits movement commands.
#[derive(Debug)]
pub struct TownAi {
    config: Config,
    rng: ChaCha8Rng,
    states: BTreeMap<NpcId, PathState>,
    paths_computed_last_tick: u32,
}

impl TownAi {
    /// Creates a new town AI system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            states: BTreeMap::new(),
            paths_computed_last_tick: 0,
        }
    }

    /// Consumes events and immutable views to emit movement commands.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        &mut self,
        events: &[Event],
        npc_view: &NpcView,
        occupancy_view: OccupancyView<'_>,
        terrain_view: TerrainView<'_>,
        buildings: &BuildingView,
        player: TilePoint,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::ClockAdvanced { clock } = event {
                self.run_tick(
                    *clock,
                    npc_view,
                    occupancy_view,
                    terrain_view,
                    buildings,
                    player,
                    out,
                );
            }
        }
    }

    /// Number of fresh A* searches performed during the last tick.
    #[must_use]
    pub const fn paths_computed_last_tick(&self) -> u32 {
        self.paths_computed_last_tick
    }

    /// Debug copy of the NPC's current step-executor plan, when enabled.
    #[must_use]
    pub fn debug_path(&self, npc: NpcId) -> Option<&[TilePoint]> {
        self.states
            .get(&npc)
            .and_then(|state| state.debug.path.as_deref())
    }

    /// Debug copy of the NPC's current home-routing plan, when enabled.
    #[must_use]
    pub fn home_debug_path(&self, npc: NpcId) -> Option<&[TilePoint]> {
        self.states
            .get(&npc)
            .and_then(|state| state.debug.home_path.as_deref())
    }

    /// Debug copy of the NPC's current building route, when enabled.
    #[must_use]
    pub fn route_debug_path(&self, npc: NpcId) -> Option<&[TilePoint]> {
        self.states
            .get(&npc)
            .and_then(|state| state.debug.route_path.as_deref())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_tick(
        &mut self,
        clock: TownClock,
        npc_view: &NpcView,
        occupancy_view: OccupancyView<'_>,
        terrain_view: TerrainView<'_>,
        buildings: &BuildingView,
        player: TilePoint,
        out: &mut Vec<Command>,
    ) {
        let budget = PathBudget::for_population(npc_view.len(), self.config.path_budget);
        let initial_budget = budget.remaining();
        let mut tick = TickCtx::new(
            terrain_view,
            buildings,
            clock,
            self.config.debug,
            ScratchOccupancy::capture(occupancy_view, player, terrain_view),
            budget,
        );

        // Scratch state follows the population: new NPCs get a cadence slot,
        // departed NPCs are forgotten.
        for npc in npc_view.iter() {
            let stride = if npc.role.is_pet() {
                PET_STRIDE
            } else {
                DEFAULT_STRIDE
            };
            let offset = (npc.id.get() % u32::from(stride)) as u8;
            let _ = self
                .states
                .entry(npc.id)
                .or_insert_with(|| PathState::new(stride, offset));
        }
        self.states.retain(|id, _| npc_view.get(*id).is_some());

        // Randomized processing order: no NPC holds positional priority
        // across ticks.
        let mut order: Vec<NpcId> = npc_view.iter().map(|npc| npc.id).collect();
        order.shuffle(&mut self.rng);

        let minute = clock.minutes_of_day();
        for id in order {
            let Some(snapshot) = npc_view.get(id) else {
                continue;
            };
            let Some(state) = self.states.get_mut(&id) else {
                continue;
            };

            // Daily departure stagger, reassigned every morning.
            if !snapshot.role.is_pet() {
                if minute < schedule::DEPART_RESET_BEFORE {
                    state.depart_assigned = false;
                }
                if state.depart_minute.is_none()
                    || (clock.phase() == DayPhase::Morning && !state.depart_assigned)
                {
                    state.depart_minute = Some(
                        self.rng
                            .gen_range(schedule::DEPART_WINDOW_START..schedule::DEPART_WINDOW_END),
                    );
                    state.depart_assigned = true;
                }
            }

            if should_skip_this_tick(state, clock.turn_counter()) {
                continue;
            }

            match snapshot.role {
                Role::Shopkeeper { shop } => {
                    roles::tick_shopkeeper(snapshot, shop, state, &mut tick, &mut self.rng, out);
                }
                Role::Resident => {
                    roles::tick_resident(snapshot, state, &mut tick, &mut self.rng, out);
                }
                Role::Pet { .. } => {
                    roles::tick_pet(snapshot, &mut tick, &mut self.rng, out);
                }
                Role::Generic => {
                    roles::tick_generic(snapshot, state, &mut tick, &mut self.rng, out);
                }
            }
        }

        self.paths_computed_last_tick = initial_budget - tick.budget.remaining();
    }
}

/// Fixed-cadence tick gating: each NPC acts only on the ticks matching its
/// stride offset, spreading the population's cost without randomness.
fn should_skip_this_tick(state: &PathState, turn_counter: u64) -> bool {
    let stride = u64::from(state.stride.max(1));
    turn_counter % stride != u64::from(state.stride_offset)
}
