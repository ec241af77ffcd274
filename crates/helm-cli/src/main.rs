//! `helm-cli` – runs the autopilot against a simulated ship.
//!
//! ```text
//! helm [--schema] [--write-config] [SCENARIO.json]
//! ```
//!
//! 1. Loads `~/.helm/config.toml` (defaults when absent) and applies
//!    `HELM_*` overrides.
//! 2. Loads the scenario snapshot (argument, `HELM_SCENARIO`, or the config)
//!    or falls back to a built-in demo ship.
//! 3. Ticks the [`ModeDispatcher`] against an in-process [`SimShip`] at the
//!    configured cadence, printing every command issued.
//! 4. Stops after `max_ticks`, or cleanly on **Ctrl-C**.

mod config;
mod scenario;

use clap::Parser;
use colored::Colorize;
use helm_hal::{CommandSink, SimShip};
use helm_runtime::{Mode, ModeDispatcher};
use helm_types::{Command, FtlDrive, HelmError, ShipSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Runs the power-management autopilot against a simulated ship.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "helm", version)]
#[command(about = "Power-management autopilot running against a simulated ship")]
struct Args {
    /// Print the snapshot JSON Schema and exit
    #[arg(long)]
    schema: bool,

    /// Save the effective config to ~/.helm/config.toml
    #[arg(long)]
    write_config: bool,

    /// Starting snapshot (default: built-in demo ship)
    #[arg(value_name = "SCENARIO.json")]
    scenario: Option<PathBuf>,
}

fn main() {
    let _guard = helm_runtime::init_tracing("helm");

    let args = Args::parse();
    if args.schema {
        match print_schema() {
            Ok(()) => return,
            Err(e) => {
                eprintln!("{}: {e}", "Schema error".red());
                std::process::exit(1);
            }
        }
    }

    print_banner();

    // ── Config and scenario ───────────────────────────────────────────────
    let mut cfg = match config::load() {
        Ok(cfg) => {
            println!(
                "  Config: {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {e}", "Config error".red());
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    if args.write_config {
        match config::save(&cfg) {
            Ok(()) => println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                config::config_path().display().to_string().bold()
            ),
            Err(e) => println!("{}: {e}", "Error saving config".red()),
        }
    }
    if args.scenario.is_some() {
        cfg.scenario_path = args.scenario;
    }

    let ship = match &cfg.scenario_path {
        Some(path) => match scenario::load(path) {
            Ok(ship) => {
                println!("  Scenario: {}", path.display().to_string().bold());
                ship
            }
            Err(e) => {
                eprintln!("{}: {e}", "Scenario error".red().bold());
                std::process::exit(1);
            }
        },
        None => {
            println!("  Scenario: {}", "built-in demo ship".dimmed());
            scenario::demo_ship()
        }
    };
    println!(
        "  Tick interval: {} ms{}\n",
        cfg.tick_interval_ms,
        cfg.max_ticks
            .map(|n| format!(", stopping after {n} ticks"))
            .unwrap_or_default()
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this tick …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will exit immediately");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to start runtime".red().bold());
            std::process::exit(1);
        }
    };
    let ticks = runtime.block_on(run(&cfg, ship, shutdown));
    println!("\n  {} Autopilot stopped after {ticks} ticks.", "✓".green().bold());
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick loop
// ─────────────────────────────────────────────────────────────────────────────

/// Drive the dispatcher against a simulated ship until told to stop.
/// Returns the number of ticks run.
async fn run(cfg: &config::Config, ship: ShipSnapshot, shutdown: Arc<AtomicBool>) -> u64 {
    let mut sim = SimShip::new(ship);
    let mut dispatcher = ModeDispatcher::new(cfg.autopilot.clone());
    let period = Duration::from_millis(cfg.tick_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0;
    let mut mode = dispatcher.mode();
    while !shutdown.load(Ordering::SeqCst) {
        if cfg.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        interval.tick().await;

        let snapshot = sim.snapshot().clone();
        let mut console = ConsoleSink::new(&mut sim);
        dispatcher.tick(&snapshot, &mut console);
        let issued = console.issued;

        if dispatcher.mode() != mode {
            mode = dispatcher.mode();
            print_mode(snapshot.tick, mode);
        }
        for (command, rejection) in &issued {
            print_command(snapshot.tick, command, rejection.as_deref());
        }

        if sim.snapshot().ftl.menu_open {
            info!(tick = snapshot.tick, "jump menu open; jumping to next beacon");
            println!(
                "{} {}",
                timestamp(),
                "⇢ Jumped to the next beacon.".bold().cyan()
            );
            let next = sim.snapshot_mut();
            next.ftl = FtlDrive::default();
            next.target = None;
        }

        sim.advance(period.as_secs_f32());
        ticks += 1;
    }
    ticks
}

// ─────────────────────────────────────────────────────────────────────────────
// Console output
// ─────────────────────────────────────────────────────────────────────────────

/// Forwards commands to the simulated ship and remembers what happened to
/// each one for the console.
struct ConsoleSink<'a> {
    sim: &'a mut SimShip,
    /// Each command with the sink's rejection, if any.
    issued: Vec<(Command, Option<String>)>,
}

impl<'a> ConsoleSink<'a> {
    fn new(sim: &'a mut SimShip) -> Self {
        Self {
            sim,
            issued: Vec::new(),
        }
    }
}

impl CommandSink for ConsoleSink<'_> {
    fn send(&mut self, command: Command) -> Result<(), HelmError> {
        let result = self.sim.send(command.clone());
        let rejection = result.as_ref().err().map(ToString::to_string);
        self.issued.push((command, rejection));
        result
    }
}

fn timestamp() -> String {
    chrono::Local::now()
        .format("%H:%M:%S%.3f")
        .to_string()
        .dimmed()
        .to_string()
}

fn print_mode(tick: u64, mode: Mode) {
    let label = match mode {
        Mode::Idle => "IDLE".green().bold(),
        Mode::Battle => "BATTLE".red().bold(),
    };
    println!("{} tick {tick:>5}  mode → {label}", timestamp());
}

fn print_command(tick: u64, command: &Command, rejection: Option<&str>) {
    let text = match command {
        Command::ChangePower { system, amount } => {
            format!("power {system:?} → {amount}")
        }
        Command::RequestBatteryBoost => "engage battery".to_string(),
        Command::OpenJumpMenu => "open jump menu".to_string(),
    };
    match rejection {
        None => println!("{} tick {tick:>5}  {}", timestamp(), text.bold()),
        Some(e) => println!(
            "{} tick {tick:>5}  {}  {}",
            timestamp(),
            text.bold(),
            format!("rejected: {e}").yellow()
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schema and banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schemars::schema_for!(ShipSnapshot);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_banner() {
    println!();
    println!("{}", r#"   __  __     __"#.bold().cyan());
    println!("{}", r#"  / / / /__  / /___ ___"#.bold().cyan());
    println!("{}", r#" / /_/ / _ \/ / __ `__ \"#.bold().cyan());
    println!("{}", r#"/ __  /  __/ / / / / / /"#.bold().cyan());
    println!("{}", r#"/_/ /_/\___/_/_/ /_/ /_/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Helm".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Power-management autopilot");
    println!();
}
