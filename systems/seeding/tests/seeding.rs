use hamlet_core::{
    BuildingKind, Command, PropKind, RectSize, Role, TileKind, TilePoint,
};
use hamlet_system_seeding::{Config, Seeding};
use hamlet_town::{self as town, query, Town, TownLayout};

/// 28x18 town: two bedded houses, two shops, a tavern, benches and a plaza.
fn seeded_town(seed: u64) -> Town {
    let mut layout = TownLayout::new(28, 18);
    let _ = layout.add_building(
        TilePoint::new(1, 1),
        RectSize::new(6, 5),
        TilePoint::new(4, 5),
        BuildingKind::House,
    );
    let _ = layout.add_building(
        TilePoint::new(9, 1),
        RectSize::new(7, 6),
        TilePoint::new(12, 6),
        BuildingKind::House,
    );
    let _ = layout.add_building(
        TilePoint::new(19, 1),
        RectSize::new(6, 5),
        TilePoint::new(21, 5),
        BuildingKind::Shop {
            open_min: 480,
            close_min: 1_080,
        },
    );
    let _ = layout.add_building(
        TilePoint::new(20, 9),
        RectSize::new(6, 5),
        TilePoint::new(22, 9),
        BuildingKind::Shop {
            open_min: 600,
            close_min: 1_200,
        },
    );
    let _ = layout.add_building(
        TilePoint::new(2, 10),
        RectSize::new(8, 6),
        TilePoint::new(5, 10),
        BuildingKind::Tavern,
    );
    layout.add_prop(PropKind::Bed, None, TilePoint::new(2, 2));
    layout.add_prop(PropKind::Bed, None, TilePoint::new(3, 2));
    layout.add_prop(PropKind::Bed, None, TilePoint::new(10, 2));
    layout.add_prop(PropKind::Bed, None, TilePoint::new(3, 12));
    layout.add_prop(PropKind::Bench, None, TilePoint::new(14, 12));
    layout.add_prop(PropKind::Bench, None, TilePoint::new(16, 14));
    layout.set_plaza(TilePoint::new(15, 13));
    layout.set_player_start(TilePoint::new(26, 16));
    layout.set_clock_start(480);

    let mut town = Town::from_layout(&layout).expect("layout");
    populate(&mut town, seed);
    town
}

fn populate(town: &mut Town, seed: u64) {
    let mut commands = Vec::new();
    {
        let buildings = query::building_view(town);
        let terrain = query::terrain_view(town);
        let occupancy = query::occupancy_view(town);
        let benches = query::bench_tiles(town);
        let player = query::player(town);
        let mut seeding = Seeding::new(Config::new(seed));
        seeding.handle(
            &buildings,
            terrain,
            occupancy,
            player,
            &benches,
            &mut commands,
        );
    }
    let mut events = Vec::new();
    for command in commands {
        town::apply(town, command, &mut events);
    }
}

#[test]
fn one_shopkeeper_per_shop_with_a_sign_by_the_door() {
    let town = seeded_town(7);
    let buildings = query::building_view(&town);
    let view = query::npc_view(&town);

    for shop in buildings.shops() {
        let keepers: Vec<_> = view
            .iter()
            .filter(|npc| npc.role == Role::Shopkeeper { shop: shop.id })
            .collect();
        assert_eq!(keepers.len(), 1, "shop {:?} needs exactly one keeper", shop.id);

        let keeper = keepers[0];
        assert!(
            keeper.cell.manhattan_distance(shop.door) <= 2,
            "keeper spawns near the shop door"
        );
        assert_eq!(keeper.work, Some(shop.door));
        assert!(keeper.home.is_some(), "keepers always get a home");
    }

    let signs = query::sign_labels(&town);
    assert_eq!(signs.len(), buildings.shops().count());
    for (cell, label) in signs {
        assert!(label.ends_with("'s shop"));
        assert!(
            buildings
                .shops()
                .any(|shop| cell.manhattan_distance(shop.door) == 1),
            "sign should sit next to a shop door"
        );
    }
}

#[test]
fn every_building_houses_at_least_one_resident() {
    let town = seeded_town(11);
    let buildings = query::building_view(&town);
    let view = query::npc_view(&town);

    for building in buildings.iter() {
        let residents = view
            .iter()
            .filter(|npc| npc.role == Role::Resident)
            .filter(|npc| npc.home.is_some_and(|home| home.building == building.id))
            .count();
        assert!(
            residents >= 1,
            "building {:?} was left empty",
            building.id
        );
    }

    // Residents spawn inside their own home, on their home target.
    for npc in view.iter().filter(|npc| npc.role == Role::Resident) {
        let home = npc.home.expect("residents always have homes");
        let building = buildings.get(home.building).expect("home building exists");
        assert!(building.rect.interior_contains(npc.cell));
        assert_eq!(npc.cell, home.target);
        if let Some(bed) = home.bed {
            assert!(building.beds.contains(&bed));
        }
        assert!(npc.work.is_some(), "residents get an errand in this town");
    }
}

#[test]
fn pets_are_capped_and_spawn_on_open_floor() {
    let town = seeded_town(13);
    let terrain = query::terrain_view(&town);
    let view = query::npc_view(&town);

    let pets: Vec<_> = view.iter().filter(|npc| npc.role.is_pet()).collect();
    assert!(pets.len() <= 4);
    assert!(!pets.is_empty(), "the demo-sized town has room for pets");
    for pet in pets {
        assert_eq!(terrain.tile(pet.cell), Some(TileKind::Floor));
        assert!(pet.home.is_none());
        assert!(pet.work.is_none());
    }
}

#[test]
fn seeding_is_deterministic_per_seed() {
    let first = seeded_town(99);
    let second = seeded_town(99);
    let other = seeded_town(100);

    let snapshot = |town: &Town| -> Vec<(u32, TilePoint, String)> {
        query::npc_view(town)
            .iter()
            .map(|npc| (npc.id.get(), npc.cell, npc.name.clone()))
            .collect()
    };

    assert_eq!(snapshot(&first), snapshot(&second));
    assert_ne!(snapshot(&first), snapshot(&other));
}

#[test]
fn seeding_emits_commands_not_mutations() {
    // The system itself only emits commands; an empty application leaves the
    // town untouched.
    let mut layout = TownLayout::new(10, 8);
    let _ = layout.add_building(
        TilePoint::new(1, 1),
        RectSize::new(5, 4),
        TilePoint::new(3, 4),
        BuildingKind::House,
    );
    let town = Town::from_layout(&layout).expect("layout");

    let mut commands = Vec::new();
    let buildings = query::building_view(&town);
    let terrain = query::terrain_view(&town);
    let occupancy = query::occupancy_view(&town);
    let benches = query::bench_tiles(&town);
    let player = query::player(&town);
    let mut seeding = Seeding::new(Config::new(3));
    seeding.handle(
        &buildings,
        terrain,
        occupancy,
        player,
        &benches,
        &mut commands,
    );

    assert!(!commands.is_empty());
    assert!(commands
        .iter()
        .all(|command| matches!(command, Command::SpawnNpc { .. } | Command::PlaceProp { .. })));
    assert!(query::npc_view(&town).is_empty(), "no commands were applied");
}
