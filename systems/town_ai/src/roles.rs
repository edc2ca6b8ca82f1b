//! Per-role daily routines: shopkeepers, residents, pets, and the generic
//! fallback.
//!
//! Each routine reads the clock, decides the NPC's current destination, and
//! asks the step executor or router for at most one tile of movement. All
//! randomness is drawn from the system RNG so a seeded run replays exactly.

use hamlet_core::{
    BuildingId, BuildingKind, BuildingSnapshot, Command, DayPhase, Direction, NpcSnapshot,
    TilePoint,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::ctx::TickCtx;
use crate::path_state::PathState;
use crate::router::{home_route_step, inside_building, route_into_building};
use crate::schedule;
use crate::step::{step_towards, StepOutcome};

/// Chance an idle NPC skips movement entirely when already lingering.
const IDLE_SKIP_CHANCE: f64 = 0.9;
/// Chance a pet skips its turn.
const PET_SKIP_CHANCE: f64 = 0.6;
/// Chance a generic NPC skips its turn.
const GENERIC_SKIP_CHANCE: f64 = 0.25;

pub(crate) fn tick_shopkeeper(
    npc: &NpcSnapshot,
    shop_id: BuildingId,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    let minute = ctx.clock.minutes_of_day();
    let Some(shop) = ctx.buildings().get(shop_id) else {
        return;
    };
    let BuildingKind::Shop {
        open_min,
        close_min,
    } = shop.kind
    else {
        return;
    };

    if schedule::within_work_window(open_min, close_min, minute) {
        if schedule::shop_open(open_min, close_min, minute) {
            let duty = near_door_interior(shop);
            let _ = route_into_building(npc.id, npc.cell, shop, duty, state, ctx, out);
        } else if npc.cell != shop.door {
            // Pre-open buffer: wait by the door without entering.
            let _ = step_towards(npc.id, npc.cell, shop.door, state, ctx, out);
        }
        return;
    }

    if schedule::in_late_night_band(minute) && !at_home(npc, ctx) {
        if try_shelter_at_tavern(npc, state, ctx, out).is_some() {
            return;
        }
    }

    let depart = state
        .depart_minute
        .unwrap_or(schedule::DEPART_WINDOW_START);
    if minute < depart {
        linger(npc, shop, state, ctx, rng, out);
        return;
    }

    let _ = go_home(npc, state, ctx, out);
}

pub(crate) fn tick_resident(
    npc: &NpcSnapshot,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    if npc.sleeping {
        if ctx.clock.phase() == DayPhase::Morning {
            out.push(Command::SetNpcSleeping {
                npc: npc.id,
                sleeping: false,
            });
        }
        return;
    }

    let minute = ctx.clock.minutes_of_day();
    let phase = ctx.clock.phase();

    if schedule::in_late_night_band(minute) && !at_home(npc, ctx) {
        if let Some(outcome) = try_shelter_at_tavern(npc, state, ctx, out) {
            let position = outcome.position_after(npc.cell);
            if let Some(tavern) = ctx.buildings().tavern() {
                if tavern
                    .beds
                    .iter()
                    .any(|bed| position.manhattan_distance(*bed) <= 1)
                {
                    out.push(Command::SetNpcSleeping {
                        npc: npc.id,
                        sleeping: true,
                    });
                }
            }
            return;
        }
    }

    let depart = state
        .depart_minute
        .unwrap_or(schedule::DEPART_WINDOW_START);
    let homeward = match phase {
        DayPhase::Evening => minute >= depart,
        DayPhase::Night => true,
        DayPhase::Morning | DayPhase::Day => {
            minute >= schedule::HOMEWARD_MINUTES && minute >= depart
        }
    };

    if homeward && npc.home.is_some() {
        let outcome = go_home(npc, state, ctx, out);
        bedtime_check(npc, outcome.position_after(npc.cell), out);
        return;
    }

    match phase {
        DayPhase::Morning => {
            // Out of bed and toward the home's outer tile; errands start with
            // the day phase.
            let anchor = npc
                .home
                .and_then(|home| ctx.buildings().get(home.building))
                .map(|building| building.door)
                .or_else(|| ctx.buildings().plaza());
            if let Some(anchor) = anchor {
                if npc.cell.manhattan_distance(anchor) > 1 {
                    let _ = step_towards(npc.id, npc.cell, anchor, state, ctx, out);
                }
            }
        }
        _ => {
            let Some(target) = npc.work.or_else(|| ctx.buildings().plaza()) else {
                return;
            };
            if npc.cell.manhattan_distance(target) <= 1 {
                if rng.gen::<f64>() < IDLE_SKIP_CHANCE {
                    return;
                }
                idle_jiggle(npc, ctx, rng, out);
            } else {
                let _ = step_towards(npc.id, npc.cell, target, state, ctx, out);
            }
        }
    }
}

pub(crate) fn tick_pet(
    npc: &NpcSnapshot,
    ctx: &mut TickCtx<'_>,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    if rng.gen::<f64>() < PET_SKIP_CHANCE {
        return;
    }
    let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    if let Some(candidate) = npc.cell.step(direction) {
        if ctx.is_free(candidate) {
            let _ = ctx.commit_step(npc.id, npc.cell, candidate, out);
        }
    }
}

pub(crate) fn tick_generic(
    npc: &NpcSnapshot,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    if rng.gen::<f64>() < GENERIC_SKIP_CHANCE {
        return;
    }

    let minute = ctx.clock.minutes_of_day();
    if schedule::in_late_night_band(minute) && !at_home(npc, ctx) {
        if try_shelter_at_tavern(npc, state, ctx, out).is_some() {
            return;
        }
    }

    match ctx.clock.phase() {
        DayPhase::Morning => {
            if let Some(home) = npc.home {
                if let Some(building) = ctx.buildings().get(home.building) {
                    let _ = route_into_building(
                        npc.id,
                        npc.cell,
                        building,
                        home.target,
                        state,
                        ctx,
                        out,
                    );
                    return;
                }
            }
            if let Some(plaza) = ctx.buildings().plaza() {
                if npc.cell.manhattan_distance(plaza) > 1 {
                    let _ = step_towards(npc.id, npc.cell, plaza, state, ctx, out);
                }
            }
        }
        DayPhase::Day => {
            let Some(target) = npc.work.or_else(|| ctx.buildings().plaza()) else {
                return;
            };
            if npc.cell.manhattan_distance(target) > 1 {
                let _ = step_towards(npc.id, npc.cell, target, state, ctx, out);
            }
        }
        DayPhase::Evening | DayPhase::Night => {
            if try_shelter_at_tavern(npc, state, ctx, out).is_some() {
                return;
            }
            let _ = go_home(npc, state, ctx, out);
        }
    }
}

/// Reports whether the NPC currently stands within its home building's
/// footprint, door and walls included.
fn at_home(npc: &NpcSnapshot, ctx: &TickCtx<'_>) -> bool {
    npc.home
        .and_then(|home| ctx.buildings().get(home.building))
        .is_some_and(|building| building.rect.contains(npc.cell))
}

/// Strict home routing with a fallback to the plain building router when no
/// home plan could be obtained.
fn go_home(
    npc: &NpcSnapshot,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    out: &mut Vec<Command>,
) -> StepOutcome {
    let Some(home) = npc.home else {
        return StepOutcome::Blocked;
    };
    let Some(building) = ctx.buildings().get(home.building) else {
        return StepOutcome::Blocked;
    };
    let interior = home.bed.unwrap_or(home.target);
    let outcome = home_route_step(npc.id, npc.cell, building, interior, state, ctx, out);
    if outcome == StepOutcome::Blocked && state.home.plan.is_none() {
        return route_into_building(npc.id, npc.cell, building, home.target, state, ctx, out);
    }
    outcome
}

/// Routes the NPC into the tavern, aiming for a bed when the tavern has one
/// and a spot near the door otherwise. Returns `None` when the town has no
/// tavern to shelter in.
fn try_shelter_at_tavern(
    npc: &NpcSnapshot,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    out: &mut Vec<Command>,
) -> Option<StepOutcome> {
    let tavern = ctx.buildings().tavern()?;
    let target = tavern
        .beds
        .first()
        .copied()
        .unwrap_or_else(|| near_door_interior(tavern));
    Some(route_into_building(
        npc.id, npc.cell, tavern, target, state, ctx, out,
    ))
}

/// Interior tile just inside the building entrance; falls back to the first
/// interior tile, then the door itself for degenerate buildings.
fn near_door_interior(building: &BuildingSnapshot) -> TilePoint {
    for direction in Direction::ALL {
        if let Some(candidate) = building.door.step(direction) {
            if inside_building(building, candidate) {
                return candidate;
            }
        }
    }
    building
        .rect
        .interior_tiles()
        .next()
        .unwrap_or(building.door)
}

/// Off-duty loitering near the shop door or plaza with an occasional jiggle.
fn linger(
    npc: &NpcSnapshot,
    shop: &BuildingSnapshot,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    let anchor = npc
        .work
        .or_else(|| ctx.buildings().plaza())
        .unwrap_or(shop.door);
    if npc.cell.manhattan_distance(anchor) <= 1 {
        if rng.gen::<f64>() < IDLE_SKIP_CHANCE {
            return;
        }
        idle_jiggle(npc, ctx, rng, out);
    } else {
        let _ = step_towards(npc.id, npc.cell, anchor, state, ctx, out);
    }
}

/// One random cardinal step, taken only when the tile is free.
fn idle_jiggle(
    npc: &NpcSnapshot,
    ctx: &mut TickCtx<'_>,
    rng: &mut ChaCha8Rng,
    out: &mut Vec<Command>,
) {
    let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    if let Some(candidate) = npc.cell.step(direction) {
        if ctx.is_free(candidate) {
            let _ = ctx.commit_step(npc.id, npc.cell, candidate, out);
        }
    }
}

/// Falling asleep on arrival: next to the assigned bed, or on the home
/// target tile itself.
fn bedtime_check(npc: &NpcSnapshot, position: TilePoint, out: &mut Vec<Command>) {
    let Some(home) = npc.home else {
        return;
    };
    let near_bed = home
        .bed
        .is_some_and(|bed| position.manhattan_distance(bed) <= 1);
    let at_rest = near_bed || position == home.target;
    if at_rest {
        out.push(Command::SetNpcSleeping {
            npc: npc.id,
            sleeping: true,
        });
    }
}
