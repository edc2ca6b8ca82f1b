#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded A* grid search and the per-tick path budget governor.
//!
//! Pathfinding is the dominant CPU cost of the town simulation, so both axes
//! are capped: each search abandons after a fixed number of node expansions,
//! and the number of fresh searches allowed per tick is limited by
//! [`PathBudget`]. Callers treat an exhausted cap or budget exactly like an
//! unreachable goal.

use std::collections::{HashMap, HashSet};

use hamlet_core::{Direction, TilePoint};

/// Maximum number of node expansions a single search may perform.
///
/// Exceeding the cap yields "no path", not an error; it stands in for a
/// wall-clock timeout on dense or unreachable graphs.
const VISITED_CAP: usize = 6_000;

/// Open-list size beyond which the list is sorted instead of scanned.
const SORT_THRESHOLD: usize = 24;

/// Ordered tile sequence from a start to a goal, both inclusive.
///
/// A plan of length 1 means the start already coincides with the goal.
pub type Path = Vec<TilePoint>;

/// Computes a 4-directional A* path between two tiles.
///
/// `is_walkable` answers whether a tile is traversable terrain and
/// `is_occupied` whether something currently stands on it. The goal tile is
/// always enterable even when occupied: final-tile contention is resolved by
/// the step executor at movement time, not at planning time. All other
/// occupied tiles are pruned.
///
/// Returns the path from `start` to `goal` inclusive, or `None` when the
/// goal is unreachable or the expansion cap was exceeded.
#[must_use]
pub fn compute_path<W, O>(start: TilePoint, goal: TilePoint, is_walkable: W, is_occupied: O) -> Option<Path>
where
    W: Fn(TilePoint) -> bool,
    O: Fn(TilePoint) -> bool,
{
    if start == goal {
        return Some(vec![start]);
    }

    let mut open = vec![OpenNode {
        f: start.manhattan_distance(goal),
        h: start.manhattan_distance(goal),
        g: 0,
        tile: start,
    }];
    let mut came_from: HashMap<TilePoint, TilePoint> = HashMap::new();
    let mut best_g: HashMap<TilePoint, u32> = HashMap::new();
    let _ = best_g.insert(start, 0);
    let mut closed: HashSet<TilePoint> = HashSet::new();
    let mut visited = 0usize;

    while let Some(current) = pop_best(&mut open) {
        if current.tile == goal {
            return Some(reconstruct(&came_from, start, goal));
        }

        if !closed.insert(current.tile) {
            continue;
        }

        visited += 1;
        if visited > VISITED_CAP {
            return None;
        }

        for direction in Direction::ALL {
            let Some(neighbor) = current.tile.step(direction) else {
                continue;
            };

            if !is_walkable(neighbor) {
                continue;
            }

            if neighbor != goal && is_occupied(neighbor) {
                continue;
            }

            if closed.contains(&neighbor) {
                continue;
            }

            let tentative_g = current.g + 1;
            let known = best_g.get(&neighbor).copied();
            if known.is_some_and(|g| g <= tentative_g) {
                continue;
            }

            let _ = best_g.insert(neighbor, tentative_g);
            let _ = came_from.insert(neighbor, current.tile);
            let h = neighbor.manhattan_distance(goal);
            open.push(OpenNode {
                f: tentative_g + h,
                h,
                g: tentative_g,
                tile: neighbor,
            });
        }
    }

    None
}

/// Per-tick quota of fresh A* searches.
///
/// The allowance is re-initialized from scratch every tick and never carries
/// over; following an already cached plan costs nothing.
#[derive(Clone, Copy, Debug)]
pub struct PathBudget {
    remaining: u32,
}

impl PathBudget {
    /// Creates a budget for a population of the provided size.
    ///
    /// Uses the configured override when present, otherwise one fifth of the
    /// population rounded down, with a floor of one search.
    #[must_use]
    pub fn for_population(npc_count: usize, configured: Option<u32>) -> Self {
        let remaining = match configured {
            Some(value) => value,
            None => {
                let scaled = npc_count / 5;
                let scaled = u32::try_from(scaled).unwrap_or(u32::MAX);
                scaled.max(1)
            }
        };
        Self { remaining }
    }

    /// Number of fresh searches still allowed this tick.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consumes one search from the allowance if any remains.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Budget-gated variant of [`compute_path`].
///
/// Returns `None` immediately, performing no search, when the budget is
/// exhausted; otherwise consumes one unit and delegates.
#[must_use]
pub fn compute_path_budgeted<W, O>(
    budget: &mut PathBudget,
    start: TilePoint,
    goal: TilePoint,
    is_walkable: W,
    is_occupied: O,
) -> Option<Path>
where
    W: Fn(TilePoint) -> bool,
    O: Fn(TilePoint) -> bool,
{
    if !budget.try_consume() {
        return None;
    }
    compute_path(start, goal, is_walkable, is_occupied)
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f: u32,
    h: u32,
    g: u32,
    tile: TilePoint,
}

impl OpenNode {
    fn rank(&self) -> (u32, u32, u32, u32) {
        (self.f, self.h, self.tile.y(), self.tile.x())
    }
}

/// Removes and returns the most promising open node.
///
/// Small lists are scanned linearly; once the list outgrows the threshold it
/// is sorted worst-first so the best candidate pops from the tail. Ties
/// favour lower `f`, then lower `h`, then tile order, keeping expansion
/// deterministic for identical inputs.
fn pop_best(open: &mut Vec<OpenNode>) -> Option<OpenNode> {
    if open.is_empty() {
        return None;
    }

    if open.len() <= SORT_THRESHOLD {
        let mut best = 0;
        for index in 1..open.len() {
            if open[index].rank() < open[best].rank() {
                best = index;
            }
        }
        return Some(open.swap_remove(best));
    }

    open.sort_unstable_by(|a, b| b.rank().cmp(&a.rank()));
    open.pop()
}

fn reconstruct(came_from: &HashMap<TilePoint, TilePoint>, start: TilePoint, goal: TilePoint) -> Path {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(&previous) = came_from.get(&current) else {
            break;
        };
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_field(width: u32, height: u32) -> impl Fn(TilePoint) -> bool {
        move |tile| tile.x() < width && tile.y() < height
    }

    #[test]
    fn trivial_path_when_start_equals_goal() {
        let origin = TilePoint::new(0, 0);
        let path = compute_path(origin, origin, open_field(4, 4), |_| false);
        assert_eq!(path, Some(vec![origin]));
    }

    #[test]
    fn straight_corridor_path_is_inclusive() {
        let start = TilePoint::new(0, 0);
        let goal = TilePoint::new(3, 0);
        let path = compute_path(start, goal, open_field(4, 1), |_| false).expect("path");
        assert_eq!(
            path,
            vec![
                TilePoint::new(0, 0),
                TilePoint::new(1, 0),
                TilePoint::new(2, 0),
                TilePoint::new(3, 0),
            ]
        );
    }

    #[test]
    fn routes_around_walls() {
        // 3x3 field with the centre column walled except the bottom row.
        let blocked = [TilePoint::new(1, 0), TilePoint::new(1, 1)];
        let walkable = move |tile: TilePoint| {
            tile.x() < 3 && tile.y() < 3 && !blocked.contains(&tile)
        };
        let path = compute_path(TilePoint::new(0, 0), TilePoint::new(2, 0), walkable, |_| false)
            .expect("path around the wall");
        assert_eq!(path.first(), Some(&TilePoint::new(0, 0)));
        assert_eq!(path.last(), Some(&TilePoint::new(2, 0)));
        assert_eq!(path.len(), 7);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn occupied_tiles_are_pruned_but_goal_is_enterable() {
        let occupied = TilePoint::new(1, 0);
        let path = compute_path(
            TilePoint::new(0, 0),
            TilePoint::new(2, 0),
            open_field(3, 2),
            move |tile| tile == occupied,
        )
        .expect("detour around occupied tile");
        assert!(!path.contains(&occupied));

        // The same tile as a goal is always enterable.
        let to_goal = compute_path(
            TilePoint::new(0, 0),
            occupied,
            open_field(3, 2),
            move |tile| tile == occupied,
        )
        .expect("occupied goal still reachable");
        assert_eq!(to_goal.last(), Some(&occupied));
    }

    #[test]
    fn unreachable_goal_yields_none() {
        // Goal sealed behind walls.
        let walkable = |tile: TilePoint| {
            (tile.x() < 3 && tile.y() < 3 && tile != TilePoint::new(1, 1)) || tile == TilePoint::new(5, 5)
        };
        assert_eq!(
            compute_path(TilePoint::new(0, 0), TilePoint::new(5, 5), walkable, |_| false),
            None
        );
    }

    #[test]
    fn expansion_cap_bounds_hopeless_searches() {
        // A 100x100 open field holds 10_000 walkable tiles, more than the
        // expansion cap, and the goal lies outside it.
        let walkable = open_field(100, 100);
        let result = compute_path(
            TilePoint::new(0, 0),
            TilePoint::new(500, 500),
            move |tile| walkable(tile) || tile == TilePoint::new(500, 500),
            |_| false,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn budget_scales_with_population() {
        assert_eq!(PathBudget::for_population(0, None).remaining(), 1);
        assert_eq!(PathBudget::for_population(4, None).remaining(), 1);
        assert_eq!(PathBudget::for_population(10, None).remaining(), 2);
        assert_eq!(PathBudget::for_population(37, None).remaining(), 7);
        assert_eq!(PathBudget::for_population(10, Some(5)).remaining(), 5);
        assert_eq!(PathBudget::for_population(10, Some(0)).remaining(), 0);
    }

    #[test]
    fn budget_consumes_down_to_zero() {
        let mut budget = PathBudget::for_population(10, None);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn budgeted_search_skips_work_when_exhausted() {
        let mut budget = PathBudget::for_population(10, Some(0));
        let result = compute_path_budgeted(
            &mut budget,
            TilePoint::new(0, 0),
            TilePoint::new(1, 0),
            |_| panic!("no search may run on an exhausted budget"),
            |_| false,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn budgeted_search_decrements_once_per_call() {
        let mut budget = PathBudget::for_population(10, Some(2));
        let path = compute_path_budgeted(
            &mut budget,
            TilePoint::new(0, 0),
            TilePoint::new(2, 0),
            open_field(3, 1),
            |_| false,
        );
        assert!(path.is_some());
        assert_eq!(budget.remaining(), 1);

        // Failed searches still consume budget.
        let blocked = compute_path_budgeted(
            &mut budget,
            TilePoint::new(0, 0),
            TilePoint::new(2, 0),
            |tile: TilePoint| tile.y() == 0 && tile.x() == 0,
            |_| false,
        );
        assert_eq!(blocked, None);
        assert_eq!(budget.remaining(), 0);
    }
}
