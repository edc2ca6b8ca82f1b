#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Standalone reachability audit of every NPC's route home.
//!
//! Smoke tests and the CLI use this to answer "could everyone get home if
//! the streets were empty?": paths are computed against terrain geometry
//! alone, ignoring NPCs, the player, and props, and without touching the
//! per-tick path budget. The audit never mutates anything; broken NPC
//! records become report entries instead of failures.

use hamlet_core::{BuildingView, HomeAssignment, NpcView, Role, TerrainView, TilePoint};
use hamlet_pathfinding::compute_path;
use serde::{Deserialize, Serialize};

/// Late-night band used for the resident distribution snapshot.
const LATE_NIGHT_START: u32 = 120;
const LATE_NIGHT_END: u32 = 300;

/// Options controlling audit output.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuditOptions {
    /// Caps the number of per-NPC issues captured in the report.
    pub detail_limit: Option<usize>,
}

/// Reasons an NPC fails the home-route audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteIssueReason {
    /// The NPC has no home assignment at all.
    NoHome,
    /// The NPC's home assignment points at a building the town does not know.
    MissingBuilding,
    /// Geometry alone offers no path from the NPC to its home target.
    NoPath,
}

/// Per-NPC audit failure detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteIssue {
    /// Numeric identifier of the NPC.
    pub npc: u32,
    /// Display name of the NPC.
    pub name: String,
    /// Why the audit failed for this NPC.
    pub reason: RouteIssueReason,
}

/// Where the town's residents currently are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentDistribution {
    /// Residents inside their own home's footprint.
    pub at_home: u32,
    /// Residents inside the tavern.
    pub at_tavern: u32,
    /// Residents caught outside during the late-night band.
    pub away_late: u32,
}

/// Aggregate result of a home-route audit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeRouteReport {
    /// NPCs whose home target is reachable over bare geometry.
    pub reachable: u32,
    /// NPCs without a usable route home.
    pub unreachable: u32,
    /// NPCs exempt from the audit, such as pets.
    pub skipped: u32,
    /// Failure details, capped by [`AuditOptions::detail_limit`].
    pub issues: Vec<RouteIssue>,
    /// Snapshot of where residents currently are.
    pub residents: ResidentDistribution,
}

/// Audits every non-pet NPC's theoretical route home.
///
/// `minutes_of_day` feeds the `away_late` column of the resident snapshot;
/// pass the current clock reading.
#[must_use]
pub fn audit_home_routes(
    npc_view: &NpcView,
    terrain: TerrainView<'_>,
    buildings: &BuildingView,
    minutes_of_day: u32,
    options: AuditOptions,
) -> HomeRouteReport {
    let mut report = HomeRouteReport::default();
    let late_night = minutes_of_day >= LATE_NIGHT_START && minutes_of_day < LATE_NIGHT_END;

    for npc in npc_view.iter() {
        if npc.role.is_pet() {
            report.skipped += 1;
            continue;
        }

        if npc.role == Role::Resident {
            tally_resident(npc.cell, npc.home, buildings, late_night, &mut report.residents);
        }

        let Some(home) = npc.home else {
            report.unreachable += 1;
            push_issue(&mut report, options, npc.id.get(), &npc.name, RouteIssueReason::NoHome);
            continue;
        };

        if buildings.get(home.building).is_none() {
            report.unreachable += 1;
            push_issue(
                &mut report,
                options,
                npc.id.get(),
                &npc.name,
                RouteIssueReason::MissingBuilding,
            );
            continue;
        }

        // Geometry only: empty occupancy isolates map reachability from
        // transient crowding.
        let path = compute_path(
            npc.cell,
            home.target,
            |tile: TilePoint| terrain.is_walkable(tile),
            |_| false,
        );
        if path.is_some() {
            report.reachable += 1;
        } else {
            report.unreachable += 1;
            push_issue(&mut report, options, npc.id.get(), &npc.name, RouteIssueReason::NoPath);
        }
    }

    report
}

fn tally_resident(
    cell: TilePoint,
    home: Option<HomeAssignment>,
    buildings: &BuildingView,
    late_night: bool,
    residents: &mut ResidentDistribution,
) {
    let at_home = home
        .and_then(|home| buildings.get(home.building))
        .is_some_and(|building| building.rect.contains(cell));
    let at_tavern = buildings
        .tavern()
        .is_some_and(|tavern| tavern.rect.contains(cell));

    if at_home {
        residents.at_home += 1;
    } else if at_tavern {
        residents.at_tavern += 1;
    } else if late_night {
        residents.away_late += 1;
    }
}

fn push_issue(
    report: &mut HomeRouteReport,
    options: AuditOptions,
    npc: u32,
    name: &str,
    reason: RouteIssueReason,
) {
    if let Some(limit) = options.detail_limit {
        if report.issues.len() >= limit {
            return;
        }
    }
    report.issues.push(RouteIssue {
        npc,
        name: String::from(name),
        reason,
    });
}
