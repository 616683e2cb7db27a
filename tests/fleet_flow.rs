//! End-to-end fleet run over the kinematic simulation: inbound parcels
//! are shelved and an ordered parcel reaches the conveyor, with the
//! whole loop driven exactly as the binary drives it.

use godam_fleet::core::Point3;
use godam_fleet::fleet::{Orchestrator, RobotState};
use godam_fleet::planning::{GridPlanner, NavGrid, PathRequestQueue};
use godam_fleet::world::sim::SimWorld;
use godam_fleet::world::store::MemoryStore;
use godam_fleet::world::FleetWorld;
use godam_fleet::FleetConfig;

fn test_config() -> FleetConfig {
    let mut config = FleetConfig::default();
    config.localization.seed = 42;
    config.steering.seed = 7;
    // Thin landmark posts along the lanes must not read as obstacles
    config.steering.obstacle_threshold = 0.4;
    config
}

fn build_world() -> (SimWorld, MemoryStore, PathRequestQueue<GridPlanner>) {
    let mut world = SimWorld::new();
    let mut store = MemoryStore::new();

    world.add_robot(Point3::new(-2.0, 0.0, -8.0));
    world.add_robot(Point3::new(2.0, 0.0, -8.0));

    // Landmarks at the floor corners, clear of the travel lanes
    for (id, x, z) in [
        (1u32, -9.0f32, -9.0f32),
        (2, 9.0, -9.0),
        (3, -9.0, 9.0),
        (4, 9.0, 9.0),
    ] {
        world.arena.add_landmark(id, Point3::new(x, 0.0, z));
        store.add_landmark(id, Point3::new(x, 0.0, z));
    }

    // Inbound parcels and their shelf slots
    store.add_parcel(10, Point3::new(-1.0, 0.2, 6.0), "food", "rice");
    store.add_parcel(11, Point3::new(1.0, 0.2, 6.0), "electronics", "router");
    store.add_slot(1, Point3::new(-6.0, 1.0, 2.0), "food");
    store.add_slot(2, Point3::new(6.0, 1.0, 2.0), "electronics");

    // A pre-stored parcel with an open shipping order
    store.add_slot(3, Point3::new(-6.0, 1.0, -2.0), "food");
    store.add_parcel(12, Point3::new(-6.0, 1.0, -2.0), "food", "flour");
    store.preload_slot(12, 3);
    store.add_order(3);

    let grid = NavGrid::new(48, 48, 0.5, Point3::new(-12.0, 0.0, -12.0));
    let paths = PathRequestQueue::new(GridPlanner::new(grid));
    (world, store, paths)
}

#[test]
fn test_fleet_stores_and_ships_everything() {
    let config = test_config();
    let (mut world, mut store, mut paths) = build_world();

    let drops = vec![Point3::new(10.0, 0.3, -4.0), Point3::new(10.0, 0.3, 4.0)];
    let mut orchestrator = Orchestrator::new(config.clone(), &world, drops);

    let dt = config.run.dt;
    let mut done = false;
    for _ in 0..60_000 {
        orchestrator.tick(&mut world, &mut store, &mut paths, dt);
        paths.pump();
        world.step(dt);

        if orchestrator.is_quiescent()
            && store.unstored_count() == 0
            && store.open_order_count() == 0
        {
            done = true;
            break;
        }
    }

    assert!(done, "fleet never finished its work");
    assert_eq!(store.unstored_count(), 0);
    assert_eq!(store.open_order_count(), 0);
    assert_eq!(store.shipped_count(), 1);
    assert!(store.slot(1).unwrap().occupied);
    assert!(store.slot(2).unwrap().occupied);
    assert!(!store.slot(3).unwrap().occupied);

    // Every robot wound down to idle at its dock
    for id in 0..world.robot_count() as u32 {
        assert_eq!(orchestrator.robot(id).state, RobotState::Idle);
        let home = world.home_pose(id);
        assert!(world.rig(id).position().distance_xz(&home) < 1.0);
        assert!(world.rig(id).carrying().is_none());
    }
}

#[test]
fn test_telemetry_is_persisted_during_run() {
    let config = test_config();
    let (mut world, mut store, mut paths) = build_world();

    let drops = vec![Point3::new(10.0, 0.3, -4.0)];
    let mut orchestrator = Orchestrator::new(config.clone(), &world, drops);

    let dt = config.run.dt;
    for _ in 0..50 {
        orchestrator.tick(&mut world, &mut store, &mut paths, dt);
        paths.pump();
        world.step(dt);
    }

    for id in 0..world.robot_count() as u32 {
        let telemetry = store.telemetry(id).expect("telemetry written");
        assert!(telemetry.battery > 0.0);
        assert!(!telemetry.state.is_empty());
    }
}
