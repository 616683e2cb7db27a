//! Godam fleet simulation runner.
//!
//! Builds a demonstration warehouse (three robots, category shelves, a
//! landmark grid, inbound parcels and shipping orders), then drives the
//! cooperative tick loop until all work is done: one orchestrator tick,
//! one path-queue pump, one simulation step per cycle.

use godam_fleet::core::Point3;
use godam_fleet::fleet::Orchestrator;
use godam_fleet::planning::{GridPlanner, NavGrid, PathRequestQueue};
use godam_fleet::world::sim::SimWorld;
use godam_fleet::world::store::MemoryStore;
use godam_fleet::world::FleetWorld;
use godam_fleet::{FleetConfig, Result};
use std::path::Path;
use tracing::info;

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("godam-fleet - warehouse robot fleet simulation");
    println!();
    println!("USAGE:");
    println!("    godam-fleet [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: godam.toml)");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - [orchestrator] proximity_threshold, poll_interval_ticks");
    println!("    - [battery] critical_level, drain_per_sec, charge_duration_secs");
    println!("    - [steering] ray_count, clear_angle_deg, stop_fraction");
    println!("    - [planning] cell_size, shelf_penalty");
    println!("    - [localization] sensor_range, min_landmarks");
    println!("    - [run] dt, max_ticks");
}

fn load_config(args: &Args) -> Result<FleetConfig> {
    match &args.config_path {
        Some(path) => FleetConfig::load(Path::new(path)),
        None => {
            if Path::new("godam.toml").exists() {
                info!("Loading configuration from godam.toml");
                FleetConfig::load(Path::new("godam.toml"))
            } else {
                info!("Using default configuration");
                Ok(FleetConfig::default())
            }
        }
    }
}

/// A shelf row on the demo floor: slots face an aisle, the shelf body
/// blocks the grid behind them.
struct ShelfRow {
    category: &'static str,
    x: f32,
    first_slot: u32,
}

fn build_scenario(
    config: &FleetConfig,
) -> (SimWorld, MemoryStore, PathRequestQueue<GridPlanner>, Vec<Point3>) {
    let mut world = SimWorld::new();
    let mut store = MemoryStore::new();

    // Floor is 24x24 meters centered on the origin
    let cells = (24.0 / config.planning.cell_size) as usize;
    let origin = Point3::new(-12.0, 0.0, -12.0);
    let mut grid = NavGrid::new(cells, cells, config.planning.cell_size, origin);

    // Robots dock along the south edge
    for x in [-3.0f32, 0.0, 3.0] {
        world.add_robot(Point3::new(x, 0.0, -10.0));
    }

    // Landmark posts on a coarse lattice for localization
    let mut landmark_id = 1;
    for gx in -1..=1 {
        for gz in -1..=1 {
            let position = Point3::new(gx as f32 * 8.0, 0.0, gz as f32 * 8.0 + 2.0);
            world.arena.add_landmark(landmark_id, position);
            store.add_landmark(landmark_id, position);
            landmark_id += 1;
        }
    }

    // Two shelf rows with four slots each
    let rows = [
        ShelfRow {
            category: "food",
            x: -6.0,
            first_slot: 1,
        },
        ShelfRow {
            category: "electronics",
            x: 6.0,
            first_slot: 5,
        },
    ];
    for row in &rows {
        for i in 0..4u32 {
            let position = Point3::new(row.x, 1.0, 1.0 + i as f32 * 2.0);
            store.add_slot(row.first_slot + i, position, row.category);
            grid.add_penalty_circle(position, 1.0, config.planning.shelf_penalty);
        }
        // Shelf back wall is solid
        let wall = Point3::new(row.x + row.x.signum() * 1.5, 0.0, 4.0);
        world.arena.add_obstacle(100 + row.first_slot, wall, 1.0);
        grid.block_circle(wall, 1.0);
    }

    // Inbound parcels at the receiving bay
    store.add_parcel(10, Point3::new(-1.5, 0.2, 9.0), "food", "rice");
    store.add_parcel(11, Point3::new(0.0, 0.2, 9.0), "electronics", "router");
    store.add_parcel(12, Point3::new(1.5, 0.2, 9.0), "food", "beans");

    // One pre-stored parcel already ordered for shipping
    store.add_slot(9, Point3::new(-6.0, 1.0, -3.0), "food");
    store.add_parcel(13, Point3::new(-6.0, 1.0, -3.0), "food", "flour");
    store.preload_slot(13, 9);
    store.add_order(9);

    // Conveyor drop points along the east edge
    let drops = vec![Point3::new(10.0, 0.3, -2.0), Point3::new(10.0, 0.3, 2.0)];

    let paths = PathRequestQueue::new(GridPlanner::new(grid));
    (world, store, paths, drops)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("godam_fleet=info".parse().unwrap()),
        )
        .init();

    let args = parse_args();
    let config = load_config(&args)?;

    info!("godam-fleet v{}", env!("CARGO_PKG_VERSION"));

    let (mut world, mut store, mut paths, drops) = build_scenario(&config);
    let mut orchestrator = Orchestrator::new(config.clone(), &world, drops);

    let dt = config.run.dt;
    let mut ticks = 0u64;
    while ticks < config.run.max_ticks {
        orchestrator.tick(&mut world, &mut store, &mut paths, dt);
        paths.pump();
        world.step(dt);
        ticks += 1;

        if orchestrator.is_quiescent() && store.unstored_count() == 0 && store.open_order_count() == 0
        {
            break;
        }
    }

    info!(
        ticks,
        sim_seconds = ticks as f32 * dt,
        stored = store.unstored_count() == 0,
        shipped = store.shipped_count(),
        open_orders = store.open_order_count(),
        "run finished"
    );

    Ok(())
}
