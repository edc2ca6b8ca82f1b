//! Single-step plan executor.
//!
//! Moves an NPC one tile closer to a target, consuming a cached plan when
//! one is valid, replanning through the budgeted pathfinder when it is not,
//! and falling back to a greedy nudge when no plan is affordable.

use hamlet_core::{Command, Direction, NpcId, TilePoint};
use hamlet_pathfinding::compute_path_budgeted;

use crate::ctx::TickCtx;
use crate::path_state::{PathState, Plan};

/// Result of asking the executor for one step of movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// The NPC committed a step onto the contained tile.
    Moved(TilePoint),
    /// The NPC already stands on the target; no movement was needed.
    AtGoal,
    /// No movement was possible this tick.
    Blocked,
}

impl StepOutcome {
    /// Tile the NPC occupies after the outcome, given where it started.
    pub(crate) fn position_after(self, start: TilePoint) -> TilePoint {
        match self {
            StepOutcome::Moved(tile) => tile,
            StepOutcome::AtGoal | StepOutcome::Blocked => start,
        }
    }
}

/// Moves the NPC one tile toward `target`, maintaining its cached plan.
pub(crate) fn step_towards(
    npc: NpcId,
    current: TilePoint,
    target: TilePoint,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    out: &mut Vec<Command>,
) -> StepOutcome {
    if current == target {
        return StepOutcome::AtGoal;
    }

    // Reuse the cached plan if it still aims at this target and contains the
    // NPC's current tile; anything else is stale and discarded outright.
    if let Some(plan) = state.plan.as_mut() {
        if plan.goal != target || !plan.resync_to(current) {
            state.clear_plan();
        }
    }

    if let Some(plan) = state.plan.as_mut() {
        match plan.next_step() {
            None => return StepOutcome::AtGoal,
            Some(next) => {
                if ctx.is_free(next) {
                    plan.advance();
                    if ctx.commit_step(npc, current, next, out) {
                        return StepOutcome::Moved(next);
                    }
                    state.clear_plan();
                } else {
                    state.clear_plan();
                }
            }
        }
    }

    // Replan through the budgeted pathfinder.
    let terrain = ctx.terrain();
    let occ = &ctx.occ;
    let steps = compute_path_budgeted(
        &mut ctx.budget,
        current,
        target,
        |tile| terrain.is_walkable(tile),
        |tile| terrain.prop_blocks(tile) || occ.is_blocked(tile),
    );

    if let Some(steps) = steps {
        if steps.len() >= 2 {
            let mut plan = Plan::new(target, steps);
            if ctx.debug.town_paths {
                state.debug.path = Some(plan.steps.clone());
            }
            let next = plan.next_step();
            if let Some(next) = next {
                if ctx.is_free(next) {
                    plan.advance();
                    state.plan = Some(plan);
                    if ctx.commit_step(npc, current, next, out) {
                        return StepOutcome::Moved(next);
                    }
                }
            }
            // First waypoint contested already; drop the plan and nudge.
            state.clear_plan();
        } else {
            return StepOutcome::AtGoal;
        }
    }

    // Greedy fallback: the cardinal neighbor that gets strictly closer.
    let here = current.manhattan_distance(target);
    let mut best: Option<(u32, TilePoint)> = None;
    for direction in Direction::ALL {
        let Some(candidate) = current.step(direction) else {
            continue;
        };
        if !ctx.is_free(candidate) {
            continue;
        }
        let distance = candidate.manhattan_distance(target);
        if distance >= here {
            continue;
        }
        if best.map_or(true, |(recorded, _)| distance < recorded) {
            best = Some((distance, candidate));
        }
    }

    if let Some((_, next)) = best {
        state.clear_plan();
        if ctx.commit_step(npc, current, next, out) {
            return StepOutcome::Moved(next);
        }
    }

    state.clear_plan();
    StepOutcome::Blocked
}
