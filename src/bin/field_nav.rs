//! field_nav - sonar mapping and potential-field navigation demo
//!
//! Drives the simulated sonar robot with the mapping, field and control threads,
//! then saves the occupancy grid and renders the occupancy and field heatmaps.
//!
//! ```bash
//! cargo run --release -- --config field_nav.toml --steps 4000 --output out
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use field_nav::common::{ControlInput, NavResult, Pose2D};
use field_nav::config::NavConfig;
use field_nav::threads::NavigationRuntime;
use field_nav::utils::{grid_heatmap, Room, SonarSimulator};

/// Simulated seconds per wall-clock second
const SIM_TIME_SCALE: f64 = 20.0;
/// Sonar range cap in simulator units
const SONAR_MAX_RANGE: f64 = 5.0;
const SONAR_NOISE_STD: f64 = 0.05;

struct Args {
    config_path: Option<String>,
    load_path: Option<String>,
    output_dir: String,
    steps: usize,
    seed: u64,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args {
        config_path: None,
        load_path: None,
        output_dir: ".".to_string(),
        steps: 2000,
        seed: 7,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match (args[i].as_str(), value) {
            ("--config" | "-c", Some(v)) => result.config_path = Some(v),
            ("--load" | "-l", Some(v)) => result.load_path = Some(v),
            ("--output" | "-o", Some(v)) => result.output_dir = v,
            ("--steps" | "-n", Some(v)) => match v.parse() {
                Ok(n) => result.steps = n,
                Err(_) => exit_with_help(&format!("Invalid step count: {}", v)),
            },
            ("--seed", Some(v)) => match v.parse() {
                Ok(s) => result.seed = s,
                Err(_) => exit_with_help(&format!("Invalid seed: {}", v)),
            },
            ("--help" | "-h", _) => {
                print_help();
                std::process::exit(0);
            }
            (other, _) => exit_with_help(&format!("Unknown argument: {}", other)),
        }
        i += 2;
    }

    result
}

fn exit_with_help(message: &str) -> ! {
    eprintln!("{}", message);
    print_help();
    std::process::exit(1);
}

fn print_help() {
    println!("field_nav - sonar occupancy mapping with potential-field navigation");
    println!();
    println!("USAGE:");
    println!("    field_nav [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: field_nav.toml if present)");
    println!("    -l, --load <FILE>       Start from a saved occupancy grid");
    println!("    -o, --output <DIR>      Directory for matrix.txt and plots (default: .)");
    println!("    -n, --steps <N>         Control periods to simulate (default: 2000)");
    println!("        --seed <N>          Sonar noise seed (default: 7)");
    println!("    -h, --help              Print help information");
}

fn load_config(args: &Args) -> NavResult<NavConfig> {
    match &args.config_path {
        Some(path) => NavConfig::load(path),
        None if Path::new("field_nav.toml").exists() => NavConfig::load("field_nav.toml"),
        None => {
            log::info!("No config file, using defaults");
            Ok(NavConfig::default())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {} - {}", record.level(), record.target(), record.args()))
        .init();

    let args = parse_args();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    }) {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }

    if let Err(e) = run(&args, running) {
        log::error!("field_nav failed: {}", e);
        std::process::exit(1);
    }

    log::info!("field_nav finished");
}

fn run(args: &Args, running: Arc<AtomicBool>) -> NavResult<()> {
    let config = load_config(args)?;
    log::info!(
        "Grid {}x{}, {:?} mapping, {:?} PID",
        config.grid.size(),
        config.grid.size(),
        config.mapping.algorithm,
        config.control.heading.mode
    );

    let mut sim = SonarSimulator::new(
        Room::demo(),
        &config.sensors,
        SONAR_MAX_RANGE,
        SONAR_NOISE_STD,
        args.seed,
        Pose2D::new(-20.0, -20.0, std::f64::consts::FRAC_PI_2),
    )?;

    let runtime = NavigationRuntime::start(&config)?;
    let store = Arc::clone(runtime.store());
    if let Some(path) = &args.load_path {
        store.load_occupancy(path)?;
    }

    let period = Duration::from_millis(config.control.period_ms);
    let sim_dt = period.as_secs_f64() * SIM_TIME_SCALE;
    let mut command = ControlInput::zero();
    let mut trajectory = Vec::with_capacity(args.steps);

    for step in 0..args.steps {
        if !running.load(Ordering::Relaxed) {
            log::info!("Stopping early at step {}", step);
            break;
        }

        runtime.submit(sim.sample())?;
        thread::sleep(period);

        if let Some(latest) = runtime.latest_command() {
            command = latest;
        }
        if !sim.step(command, sim_dt) {
            log::debug!("Step {}: blocked by a wall", step);
        }
        trajectory.push(config.frame.to_grid_pose(&sim.pose()));

        if step % 200 == 0 {
            let pose = sim.pose();
            log::info!(
                "Step {}: pose ({:.2}, {:.2}, {:.2}), cmd v={:.2} omega={:.3}",
                step,
                pose.x,
                pose.y,
                pose.yaw,
                command.v,
                command.omega
            );
        }
    }

    runtime.shutdown()?;

    let output = PathBuf::from(&args.output_dir);
    std::fs::create_dir_all(&output)?;
    store.save_occupancy(output.join("matrix.txt"))?;

    let occupancy = store.occupancy_snapshot();
    let field = store.field_snapshot();
    log::info!("{} of {} cells observed", occupancy.known_count(), occupancy.certainty.len());

    for (grid, title, file) in [
        (&occupancy.certainty, "Occupancy", "occupancy.svg"),
        (&*field, "Navigation field", "field.svg"),
    ] {
        let path = output.join(file);
        let mut vis = grid_heatmap(grid, store.spec(), title, &trajectory);
        if let Err(e) = vis.save_svg(&path.to_string_lossy(), 800, 800) {
            log::warn!("Could not render {}: {}", path.display(), e);
        }
    }

    Ok(())
}
