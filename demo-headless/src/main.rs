use clap::Parser;
use cloud_sim_core::{Simulation, SimulationConfig, SourceSpec, Vec3};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Cloud simulation demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "cloud-sim-demo")]
#[command(about = "Headless moist-atmosphere cloud simulation", long_about = None)]
struct Args {
    /// JSON configuration file (overrides the grid and atmosphere flags)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a 3D grid instead of a 2D slice
    #[arg(long)]
    three_d: bool,

    /// Horizontal resolution in cells
    #[arg(long, default_value_t = 128)]
    nx: usize,

    /// Vertical resolution in cells
    #[arg(long, default_value_t = 128)]
    ny: usize,

    /// Depth resolution in cells (3D only)
    #[arg(long, default_value_t = 32)]
    nz: usize,

    /// Ground temperature in K
    #[arg(short, long, default_value_t = 295.0)]
    temperature: f32,

    /// Relative humidity of the resting state in %
    #[arg(long, default_value_t = 70.0)]
    humidity: f32,

    /// Wind speed at the domain top in m/s
    #[arg(short, long, default_value_t = 0.0)]
    wind_speed: f32,

    /// Wind direction in degrees from +x toward +z
    #[arg(long, default_value_t = 0.0)]
    wind_direction: f32,

    /// Number of random ground sources
    #[arg(long, default_value_t = 3)]
    sources: usize,

    /// Seed for source placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Add a constant heat/moisture source at the bottom center
    #[arg(long)]
    center_source: bool,

    /// Number of steps to run
    #[arg(short = 'n', long, default_value_t = 600)]
    steps: u64,

    /// Timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Report every N steps
    #[arg(short, long, default_value_t = 60)]
    report_interval: u64,

    /// Print reports as JSON lines
    #[arg(long)]
    json: bool,

    /// Write the effective configuration to this file
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<SimulationConfig, cloud_sim_core::ConfigError> {
    if let Some(path) = &args.config {
        info!("Loading configuration from {}", path.display());
        return SimulationConfig::load(path);
    }

    let mut config = if args.three_d {
        SimulationConfig::new_3d(
            args.nx,
            args.ny,
            args.nz,
            Vec3::new(4000.0, 2000.0, 4000.0 * args.nz as f32 / args.nx.max(1) as f32),
        )
    } else {
        SimulationConfig::new_2d(args.nx, args.ny, 4000.0, 2000.0)
    };
    config.atmosphere.ground_temperature = args.temperature;
    config.atmosphere.relative_humidity = args.humidity / 100.0;
    config.wind.speed = args.wind_speed;
    config.wind.direction_degrees = args.wind_direction;
    config.sources.count = args.sources;
    config.sources.seed = args.seed;
    config.validate()?;
    Ok(config)
}

fn report(sim: &Simulation, json: bool) {
    let stats = sim.stats();
    if json {
        match serde_json::to_string(&stats) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("Failed to serialize stats: {e}"),
        }
    } else {
        println!("{stats} ({:.2}ms/step)", sim.last_frame_time_ms());
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.dump_config {
        if let Err(e) = config.save(path) {
            error!("Failed to write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!("Configuration written to {}", path.display());
    }

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            error!("Failed to create simulation: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.center_source {
        let grid = *sim.grid();
        let position = Vec3::new(grid.center().x, 2.0, grid.center().z);
        sim.add_source(SourceSpec::new(position, 6.0, 0.0002, 0.15).with_phase(0.0));
    }

    let grid = *sim.grid();
    println!("=== Cloud Simulation Demo ===\n");
    println!(
        "Grid {}x{}x{} ({}D), {} sources, {} steps at dt={:.4}s\n",
        grid.nx,
        grid.ny,
        grid.nz,
        grid.dimensions(),
        sim.sources().len(),
        args.steps,
        args.dt
    );

    let interval = args.report_interval.max(1);
    for step in 1..=args.steps {
        sim.step(args.dt);
        if step % interval == 0 || step == args.steps {
            report(&sim, args.json);
        }
    }

    let stats = sim.stats();
    if !stats.is_finite() {
        error!("Simulation produced non-finite values");
        return ExitCode::FAILURE;
    }

    println!(
        "\nFinished: {:.1}s simulated, {} cloudy cells, {:.5} total cloud water",
        stats.time, stats.cloud_cells, stats.total_cloud
    );
    ExitCode::SUCCESS
}
