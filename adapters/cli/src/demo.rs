//! Bundled demonstration town used for smoke runs.
//!
//! A 36x24 hamlet: three houses with beds, two shops with different trading
//! hours, a bedded tavern for late-night shelter, and a bench-lined plaza.

use hamlet_core::{BuildingKind, PropKind, RectSize, TilePoint};

use crate::town_transfer::{SnapshotBuilding, SnapshotProp, TownLayoutSnapshot};

/// Declarative snapshot of the demo town.
pub(crate) fn demo_snapshot() -> TownLayoutSnapshot {
    let buildings = vec![
        SnapshotBuilding {
            origin: TilePoint::new(2, 2),
            size: RectSize::new(6, 5),
            door: TilePoint::new(5, 6),
            kind: BuildingKind::House,
        },
        SnapshotBuilding {
            origin: TilePoint::new(12, 2),
            size: RectSize::new(7, 6),
            door: TilePoint::new(15, 7),
            kind: BuildingKind::House,
        },
        SnapshotBuilding {
            origin: TilePoint::new(2, 14),
            size: RectSize::new(6, 6),
            door: TilePoint::new(5, 14),
            kind: BuildingKind::House,
        },
        SnapshotBuilding {
            origin: TilePoint::new(24, 3),
            size: RectSize::new(7, 6),
            door: TilePoint::new(27, 8),
            kind: BuildingKind::Shop {
                open_min: 480,
                close_min: 1_080,
            },
        },
        SnapshotBuilding {
            origin: TilePoint::new(26, 14),
            size: RectSize::new(6, 5),
            door: TilePoint::new(28, 14),
            kind: BuildingKind::Shop {
                open_min: 600,
                close_min: 1_200,
            },
        },
        SnapshotBuilding {
            origin: TilePoint::new(10, 16),
            size: RectSize::new(9, 7),
            door: TilePoint::new(14, 16),
            kind: BuildingKind::Tavern,
        },
    ];

    let beds = [
        TilePoint::new(3, 3),
        TilePoint::new(4, 3),
        TilePoint::new(13, 3),
        TilePoint::new(14, 3),
        TilePoint::new(17, 3),
        TilePoint::new(3, 15),
        TilePoint::new(4, 15),
        TilePoint::new(11, 18),
        TilePoint::new(12, 18),
    ];
    let benches = [TilePoint::new(16, 12), TilePoint::new(20, 12)];

    let mut props: Vec<SnapshotProp> = beds
        .into_iter()
        .map(|cell| SnapshotProp {
            kind: PropKind::Bed,
            name: None,
            cell,
        })
        .collect();
    props.extend(benches.into_iter().map(|cell| SnapshotProp {
        kind: PropKind::Bench,
        name: None,
        cell,
    }));

    TownLayoutSnapshot {
        width: 36,
        height: 24,
        clock_start: 420,
        player_start: TilePoint::new(18, 13),
        plaza: Some(TilePoint::new(18, 12)),
        buildings,
        props,
    }
}
