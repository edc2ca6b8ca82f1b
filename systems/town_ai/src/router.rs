//! Multi-stage routing into buildings: exterior, door, then interior.
//!
//! The strict home variant keeps its own cached plan with replan backoff so
//! a crowd of homeward NPCs cannot thrash the pathfinder, and memoizes each
//! NPC's entrance tile once discovered.

use hamlet_core::{
    BuildingSnapshot, Command, Direction, NpcId, TilePoint,
};
use hamlet_pathfinding::compute_path_budgeted;

use crate::ctx::TickCtx;
use crate::path_state::{PathState, Plan};
use crate::step::{step_towards, StepOutcome};

/// Ticks to wait after a successful home-plan computation.
const HOME_REPLAN_COOLDOWN_OK: u8 = 5;
/// Ticks to wait after a failed home-plan computation.
const HOME_REPLAN_COOLDOWN_FAIL: u8 = 8;
/// Consecutive blocked ticks tolerated before the home plan is dropped.
const HOME_WAIT_LIMIT: u8 = 3;

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

/// Reports whether the tile lies strictly inside the building walls.
pub(crate) fn inside_building(building: &BuildingSnapshot, tile: TilePoint) -> bool {
    building.rect.interior_contains(tile)
}

fn offset_tile(tile: TilePoint, dx: i32, dy: i32) -> Option<TilePoint> {
    let x = i64::from(tile.x()) + i64::from(dx);
    let y = i64::from(tile.y()) + i64::from(dy);
    if x < 0 || y < 0 {
        return None;
    }
    Some(TilePoint::new(
        u32::try_from(x).ok()?,
        u32::try_from(y).ok()?,
    ))
}

/// Searches the fixed 9-neighborhood of `anchor` for a tile satisfying the
/// predicate, checking the anchor itself first.
pub(crate) fn scan_neighborhood<P>(anchor: TilePoint, mut accept: P) -> Option<TilePoint>
where
    P: FnMut(TilePoint) -> bool,
{
    for (dx, dy) in NEIGHBORHOOD {
        if let Some(candidate) = offset_tile(anchor, dx, dy) {
            if accept(candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Substitutes an occupied or out-of-building interior target with the
/// nearest free interior tile in its 9-neighborhood.
///
/// The NPC's own tile counts as free so an NPC already standing on its
/// target is not diverted. When no substitute exists the original target is
/// returned unchanged and the caller's movement simply stalls.
pub(crate) fn adjust_interior_target(
    ctx: &TickCtx<'_>,
    building: &BuildingSnapshot,
    target: TilePoint,
    own_cell: TilePoint,
) -> TilePoint {
    if inside_building(building, target) && ctx.is_free_for(target, own_cell) {
        return target;
    }
    scan_neighborhood(target, |candidate| {
        inside_building(building, candidate) && ctx.is_free_for(candidate, own_cell)
    })
    .unwrap_or(target)
}

/// Tile an NPC should aim for to enter the building.
///
/// Normally the door; when the door tile is not walkable the nearest free
/// tile around the midpoint of the building's north edge stands in.
pub(crate) fn entry_tile(ctx: &TickCtx<'_>, building: &BuildingSnapshot) -> TilePoint {
    let door = building.door;
    if ctx.terrain().is_walkable(door) {
        return door;
    }
    let origin = building.rect.origin();
    let midpoint = TilePoint::new(origin.x() + building.rect.size().width() / 2, origin.y());
    scan_neighborhood(midpoint, |candidate| ctx.is_free(candidate)).unwrap_or(door)
}

/// Steps an NPC toward, through, and within a building.
///
/// Outside the walls the NPC heads for the entrance; standing on the door it
/// crosses into the first free interior tile; inside it walks to the
/// (occupancy-adjusted) interior target.
pub(crate) fn route_into_building(
    npc: NpcId,
    current: TilePoint,
    building: &BuildingSnapshot,
    target_inside: TilePoint,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    out: &mut Vec<Command>,
) -> StepOutcome {
    let outcome = if inside_building(building, current) {
        let target = adjust_interior_target(ctx, building, target_inside, current);
        if target == current {
            StepOutcome::AtGoal
        } else {
            step_towards(npc, current, target, state, ctx, out)
        }
    } else {
        let entry = entry_tile(ctx, building);
        if current == entry {
            cross_threshold(npc, current, building, ctx, out)
        } else {
            step_towards(npc, current, entry, state, ctx, out)
        }
    };

    if ctx.debug.town_paths {
        state.debug.route_path = state.plan.as_ref().map(|plan| plan.steps.clone());
    }
    outcome
}

/// Steps from the door onto the first free interior tile adjacent to it.
fn cross_threshold(
    npc: NpcId,
    door: TilePoint,
    building: &BuildingSnapshot,
    ctx: &mut TickCtx<'_>,
    out: &mut Vec<Command>,
) -> StepOutcome {
    for direction in Direction::ALL {
        let Some(candidate) = door.step(direction) else {
            continue;
        };
        if inside_building(building, candidate) && ctx.is_free(candidate) {
            if ctx.commit_step(npc, door, candidate, out) {
                return StepOutcome::Moved(candidate);
            }
        }
    }
    StepOutcome::Blocked
}

/// Strict, cooldown-backed variant of going home, used for end-of-day and
/// shelter flows. Maintains its own cached plan (`home` route state) in two
/// stages: first the building entrance, then the interior target.
pub(crate) fn home_route_step(
    npc: NpcId,
    current: TilePoint,
    building: &BuildingSnapshot,
    interior_target: TilePoint,
    state: &mut PathState,
    ctx: &mut TickCtx<'_>,
    out: &mut Vec<Command>,
) -> StepOutcome {
    let door = match state.home_door {
        Some(door) => door,
        None => {
            let door = entry_tile(ctx, building);
            state.home_door = Some(door);
            door
        }
    };

    // Stage goal: entrance while outside, interior target once through.
    let goal = if inside_building(building, current) {
        let adjusted = adjust_interior_target(ctx, building, interior_target, current);
        if adjusted == current {
            state.clear_home_plan();
            return StepOutcome::AtGoal;
        }
        adjusted
    } else if current == door {
        match cross_threshold(npc, current, building, ctx, out) {
            StepOutcome::Blocked => {
                state.home.wait = state.home.wait.saturating_add(1);
                if state.home.wait >= HOME_WAIT_LIMIT {
                    state.clear_home_plan();
                }
                return StepOutcome::Blocked;
            }
            outcome => {
                state.home.wait = 0;
                return outcome;
            }
        }
    } else {
        door
    };

    if let Some(plan) = state.home.plan.as_mut() {
        if plan.goal != goal || !plan.resync_to(current) {
            state.clear_home_plan();
        }
    }

    if let Some(plan) = state.home.plan.as_mut() {
        match plan.next_step() {
            None => {
                state.clear_home_plan();
                return StepOutcome::AtGoal;
            }
            Some(next) => {
                if ctx.is_free(next) {
                    plan.advance();
                    state.home.wait = 0;
                    if ctx.commit_step(npc, current, next, out) {
                        return StepOutcome::Moved(next);
                    }
                }
                state.home.wait = state.home.wait.saturating_add(1);
                if state.home.wait >= HOME_WAIT_LIMIT {
                    state.clear_home_plan();
                }
                return StepOutcome::Blocked;
            }
        }
    }

    // No plan cached: replans are cooldown-gated to stop thrashing.
    if state.home.cooldown > 0 {
        state.home.cooldown -= 1;
        return StepOutcome::Blocked;
    }

    let terrain = ctx.terrain();
    let occ = &ctx.occ;
    let steps = compute_path_budgeted(
        &mut ctx.budget,
        current,
        goal,
        |tile| terrain.is_walkable(tile),
        |tile| terrain.prop_blocks(tile) || occ.is_blocked(tile),
    );

    match steps {
        Some(steps) if steps.len() >= 2 => {
            state.home.cooldown = HOME_REPLAN_COOLDOWN_OK;
            let mut plan = Plan::new(goal, steps);
            if ctx.debug.home_paths {
                state.debug.home_path = Some(plan.steps.clone());
            }
            let next = plan.next_step();
            if let Some(next) = next {
                if ctx.is_free(next) {
                    plan.advance();
                    state.home.plan = Some(plan);
                    state.home.wait = 0;
                    if ctx.commit_step(npc, current, next, out) {
                        return StepOutcome::Moved(next);
                    }
                    return StepOutcome::Blocked;
                }
            }
            // Keep the plan; the first tile is merely contested right now.
            state.home.plan = Some(plan);
            state.home.wait = 1;
            StepOutcome::Blocked
        }
        Some(_) => {
            state.clear_home_plan();
            StepOutcome::AtGoal
        }
        None => {
            state.home.cooldown = HOME_REPLAN_COOLDOWN_FAIL;
            StepOutcome::Blocked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::ScratchOccupancy;
    use crate::DebugConfig;
    use hamlet_core::{
        BuildingId, BuildingKind, BuildingView, NpcId, OccupancyView, RectSize, TerrainView,
        TileKind, TilePoint, TileRect, TownClock,
    };
    use hamlet_pathfinding::PathBudget;

    struct Fixture {
        tiles: Vec<TileKind>,
        props: Vec<bool>,
        width: u32,
        height: u32,
        buildings: BuildingView,
    }

    impl Fixture {
        /// 10x8 open field holding one 5x4 house at (2,2) with a south door.
        fn with_house() -> Self {
            let width = 10;
            let height = 8;
            let mut tiles = vec![TileKind::Floor; (width * height) as usize];
            let rect = TileRect::from_origin_and_size(TilePoint::new(2, 2), RectSize::new(5, 4));
            let door = TilePoint::new(4, 5);
            for y in 2..6u32 {
                for x in 2..7u32 {
                    let cell = TilePoint::new(x, y);
                    let border = x == 2 || y == 2 || x == 6 || y == 5;
                    let kind = if cell == door {
                        TileKind::Door
                    } else if border {
                        TileKind::Wall
                    } else {
                        TileKind::Floor
                    };
                    tiles[(y * width + x) as usize] = kind;
                }
            }
            let buildings = BuildingView::from_snapshots(
                vec![hamlet_core::BuildingSnapshot {
                    id: BuildingId::new(0),
                    rect,
                    door,
                    kind: BuildingKind::House,
                    beds: Vec::new(),
                }],
                None,
            );
            Self {
                tiles,
                props: vec![false; (width * height) as usize],
                width,
                height,
                buildings,
            }
        }

        fn ctx(&self, budget: u32, player: TilePoint, npcs: &[TilePoint]) -> TickCtx<'_> {
            let terrain = TerrainView::new(&self.tiles, &self.props, self.width, self.height);
            let mut cells = vec![None; (self.width * self.height) as usize];
            for (index, npc) in npcs.iter().enumerate() {
                cells[(npc.y() * self.width + npc.x()) as usize] = Some(NpcId::new(index as u32));
            }
            let occupancy = OccupancyView::new(&cells, self.width, self.height);
            let occ = ScratchOccupancy::capture(occupancy, player, terrain);
            TickCtx::new(
                terrain,
                &self.buildings,
                TownClock::starting_at(600),
                DebugConfig::default(),
                occ,
                PathBudget::for_population(0, Some(budget)),
            )
        }

        fn house(&self) -> &hamlet_core::BuildingSnapshot {
            self.buildings.get(BuildingId::new(0)).expect("house")
        }
    }

    #[test]
    fn interior_target_adjustment_prefers_self_then_fixed_order() {
        let fixture = Fixture::with_house();
        let ctx = fixture.ctx(4, TilePoint::new(0, 0), &[]);
        let house = fixture.house();

        // A free interior target is returned unchanged.
        let target = TilePoint::new(4, 3);
        assert_eq!(
            adjust_interior_target(&ctx, house, target, TilePoint::new(0, 0)),
            target
        );

        // An occupied target diverts to its east neighbor first.
        let mut ctx = fixture.ctx(4, TilePoint::new(0, 0), &[target]);
        assert_eq!(
            adjust_interior_target(&mut ctx, house, target, TilePoint::new(0, 0)),
            TilePoint::new(5, 3)
        );

        // A target on the wall diverts into the interior.
        let ctx = fixture.ctx(4, TilePoint::new(0, 0), &[]);
        let walled = TilePoint::new(2, 3);
        assert_eq!(
            adjust_interior_target(&ctx, house, walled, TilePoint::new(0, 0)),
            TilePoint::new(3, 3)
        );
    }

    #[test]
    fn npc_standing_on_target_is_not_diverted() {
        let fixture = Fixture::with_house();
        let target = TilePoint::new(4, 3);
        let ctx = fixture.ctx(4, TilePoint::new(0, 0), &[target]);
        assert_eq!(
            adjust_interior_target(&ctx, fixture.house(), target, target),
            target
        );
    }

    #[test]
    fn routing_stages_exterior_door_interior() {
        let fixture = Fixture::with_house();
        let house = fixture.house().clone();
        let target = TilePoint::new(3, 3);
        let mut state = PathState::default();
        let mut out = Vec::new();

        // Outside: aims for the door.
        let start = TilePoint::new(4, 7);
        let mut ctx = fixture.ctx(8, TilePoint::new(0, 0), &[start]);
        let outcome = route_into_building(
            NpcId::new(0),
            start,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        assert_eq!(outcome, StepOutcome::Moved(TilePoint::new(4, 6)));

        // On the door: crosses to a free interior tile.
        let mut ctx = fixture.ctx(8, TilePoint::new(0, 0), &[house.door]);
        let outcome = route_into_building(
            NpcId::new(0),
            house.door,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        let StepOutcome::Moved(inside) = outcome else {
            panic!("expected to cross the threshold");
        };
        assert!(inside_building(&house, inside));

        // Inside: walks to the interior target.
        let mut ctx = fixture.ctx(8, TilePoint::new(0, 0), &[inside]);
        let outcome = route_into_building(
            NpcId::new(0),
            inside,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        assert!(matches!(
            outcome,
            StepOutcome::Moved(_) | StepOutcome::AtGoal
        ));
    }

    #[test]
    fn home_route_memoizes_the_door_and_backs_off_on_failure() {
        let fixture = Fixture::with_house();
        let house = fixture.house().clone();
        let target = TilePoint::new(3, 3);
        let mut state = PathState::default();
        let mut out = Vec::new();

        // Budget of zero: the plan attempt fails and starts the long cooldown.
        let start = TilePoint::new(8, 7);
        let mut ctx = fixture.ctx(0, TilePoint::new(0, 0), &[start]);
        let outcome = home_route_step(
            NpcId::new(0),
            start,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        assert_eq!(outcome, StepOutcome::Blocked);
        assert_eq!(state.home.cooldown, HOME_REPLAN_COOLDOWN_FAIL);
        assert_eq!(state.home_door, Some(house.door));

        // While cooling down no search is attempted even with budget.
        let mut ctx = fixture.ctx(4, TilePoint::new(0, 0), &[start]);
        let outcome = home_route_step(
            NpcId::new(0),
            start,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        assert_eq!(outcome, StepOutcome::Blocked);
        assert_eq!(ctx.budget.remaining(), 4);
        assert_eq!(state.home.cooldown, HOME_REPLAN_COOLDOWN_FAIL - 1);
    }

    #[test]
    fn home_route_plans_and_sets_short_cooldown_on_success() {
        let fixture = Fixture::with_house();
        let house = fixture.house().clone();
        let target = TilePoint::new(3, 3);
        let mut state = PathState::default();
        let mut out = Vec::new();

        let start = TilePoint::new(4, 7);
        let mut ctx = fixture.ctx(4, TilePoint::new(0, 0), &[start]);
        let outcome = home_route_step(
            NpcId::new(0),
            start,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        assert_eq!(outcome, StepOutcome::Moved(TilePoint::new(4, 6)));
        assert_eq!(state.home.cooldown, HOME_REPLAN_COOLDOWN_OK);
        assert!(state.home.plan.is_some());
    }

    #[test]
    fn repeated_blocked_waits_drop_the_home_plan() {
        let fixture = Fixture::with_house();
        let house = fixture.house().clone();
        let target = TilePoint::new(3, 3);
        let mut state = PathState::default();
        let mut out = Vec::new();

        // Another NPC camps on the door itself: the goal stays enterable at
        // plan time, so a plan is granted and the NPC advances to the
        // threshold, where it is blocked tick after tick.
        let start = TilePoint::new(4, 7);
        let mut ctx = fixture.ctx(8, TilePoint::new(0, 0), &[start, house.door]);

        let first = home_route_step(
            NpcId::new(0),
            start,
            &house,
            target,
            &mut state,
            &mut ctx,
            &mut out,
        );
        assert_eq!(first, StepOutcome::Moved(TilePoint::new(4, 6)));
        assert!(state.home.plan.is_some());

        let threshold = TilePoint::new(4, 6);
        for _ in 0..HOME_WAIT_LIMIT {
            let outcome = home_route_step(
                NpcId::new(0),
                threshold,
                &house,
                target,
                &mut state,
                &mut ctx,
                &mut out,
            );
            assert_eq!(outcome, StepOutcome::Blocked);
        }
        assert!(
            state.home.plan.is_none(),
            "persistent blockage drops the plan"
        );
    }
}
