//! lab-runner: headless driver for the Temporal Lab.
//!
//! Usage:
//!   lab-runner --db lab.db --profile alice
//!   lab-runner --autoplay --seed 7 --cycles 5
//!   lab-runner --db lab.db --profile alice --ipc-mode

use anyhow::Result;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use timelab_core::{
    catalog::LabCatalog,
    clock::SystemClock,
    command::LabCommand,
    config::LabConfig,
    production::{OfflineProgress, PrestigePreview},
    session::LabSession,
    simulator::{run_autoplay, AutoplayConfig, AutoplayReport},
    store::LabStore,
    types::new_profile_id,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick,
    Command { command: LabCommand },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    profile_id: String,
    /// Set on command responses: whether the engine accepted it.
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted: Option<bool>,
    temporal_energy: f64,
    total_energy_produced: f64,
    production_per_second: f64,
    temporal_shards: u64,
    timeline_stability: f64,
    prestige_count: u32,
    permanent_multiplier: f64,
    prestige: PrestigePreview,
    pending_offline: Option<OfflineProgress>,
    artifacts: Vec<ArtifactView>,
    upgrades: Vec<UpgradeView>,
    anomalies: Vec<AnomalyView>,
}

#[derive(serde::Serialize)]
struct ArtifactView {
    id: String,
    name: String,
    level: u32,
    production: f64,
}

#[derive(serde::Serialize)]
struct UpgradeView {
    id: String,
    name: String,
    artifact_id: String,
    level: u32,
    max_level: u32,
    next_cost: Option<f64>,
}

#[derive(serde::Serialize)]
struct AnomalyView {
    id: String,
    name: String,
    cost: f64,
    stability_gain: f64,
    repaired: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let autoplay = args.iter().any(|a| a == "--autoplay");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir");

    let (catalog, config) = load_content(data_dir)?;

    if autoplay {
        let defaults = AutoplayConfig::default();
        let autoplay = AutoplayConfig {
            seed: parse_arg(&args, "--seed", defaults.seed),
            cycles: parse_arg(&args, "--cycles", defaults.cycles),
            ..defaults
        };
        println!("Temporal Lab: autoplay");
        println!("  seed:      {}", autoplay.seed);
        println!("  cycles:    {}", autoplay.cycles);
        println!();
        let report = run_autoplay(&catalog, &config, &autoplay)?;
        print_autoplay(&report);
        return Ok(());
    }

    let profile_id = flag_value(&args, "--profile")
        .map(str::to_string)
        .unwrap_or_else(new_profile_id);

    if !ipc_mode {
        println!("Temporal Lab: lab-runner");
        println!("  profile:   {profile_id}");
        println!("  db:        {db}");
        println!("  data_dir:  {}", data_dir.unwrap_or("(builtin)"));
        println!();
    }

    let store = if db == ":memory:" {
        LabStore::in_memory()?
    } else {
        LabStore::open(db)?
    };
    let mut session = LabSession::open(store, profile_id, catalog, config, Box::new(SystemClock))?;

    if ipc_mode {
        run_ipc_loop(&mut session)?;
        session.close();
    } else {
        print_summary(&session);
        let store = session.close();
        println!("  profiles:  {}", store.profiles()?.join(", "));
    }

    Ok(())
}

/// Builtin content, overridden by whatever files `data_dir` provides.
fn load_content(data_dir: Option<&str>) -> Result<(LabCatalog, LabConfig)> {
    let Some(dir) = data_dir else {
        return Ok((LabCatalog::builtin()?, LabConfig::default()));
    };
    let dir = Path::new(dir);

    let catalog_path = dir.join("catalog.json");
    let catalog = if catalog_path.exists() {
        LabCatalog::load(&catalog_path.to_string_lossy())?
    } else {
        log::info!("no catalog in {}, using builtin", dir.display());
        LabCatalog::builtin()?
    };

    let config_path = dir.join("lab_config.json");
    let config = if config_path.exists() {
        LabConfig::load(&config_path.to_string_lossy())?
    } else {
        LabConfig::default()
    };
    Ok((catalog, config))
}

fn run_ipc_loop(session: &mut LabSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let state = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => build_ui_state(session, None),
            IpcCommand::Tick => {
                session.tick();
                build_ui_state(session, None)
            }
            IpcCommand::Command { command } => {
                let accepted = session.apply(&command);
                build_ui_state(session, Some(accepted))
            }
            IpcCommand::Save => {
                if let Err(e) = session.save() {
                    let err_json = serde_json::json!({ "error": e.to_string() });
                    writeln!(stdout, "{}", err_json)?;
                    stdout.flush()?;
                    continue;
                }
                build_ui_state(session, None)
            }
        };
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(session: &LabSession, accepted: Option<bool>) -> UiState {
    let engine = session.engine();
    let state = engine.state();
    let catalog = engine.catalog();

    let artifacts = catalog
        .artifacts()
        .iter()
        .map(|a| ArtifactView {
            id: a.id.clone(),
            name: a.name.clone(),
            level: state.artifact_level(&a.id),
            production: engine.artifact_production(&a.id),
        })
        .collect();

    let upgrades = catalog
        .upgrades()
        .iter()
        .map(|u| {
            let level = state.upgrade_level(&u.id);
            UpgradeView {
                id: u.id.clone(),
                name: u.name.clone(),
                artifact_id: u.artifact_id.clone(),
                level,
                max_level: u.max_level,
                next_cost: (level < u.max_level).then(|| u.cost_at(level)),
            }
        })
        .collect();

    let anomalies = catalog
        .anomalies()
        .iter()
        .map(|a| AnomalyView {
            id: a.id.clone(),
            name: a.name.clone(),
            cost: a.cost,
            stability_gain: a.stability_gain,
            repaired: state.is_repaired(&a.id),
        })
        .collect();

    UiState {
        profile_id: session.profile_id().to_string(),
        accepted,
        temporal_energy: state.temporal_energy,
        total_energy_produced: state.total_energy_produced,
        production_per_second: engine.total_production(),
        temporal_shards: state.temporal_shards,
        timeline_stability: state.timeline_stability,
        prestige_count: state.prestige_count,
        permanent_multiplier: state.permanent_multiplier,
        prestige: engine.prestige_preview(),
        pending_offline: session.pending_offline().copied(),
        artifacts,
        upgrades,
        anomalies,
    }
}

fn print_summary(session: &LabSession) {
    let engine = session.engine();
    let state = engine.state();

    println!("=== LAB SUMMARY ===");
    println!("  energy:         {:.2}", state.temporal_energy);
    println!("  produced:       {:.2}", state.total_energy_produced);
    println!("  per second:     {:.2}", engine.total_production());
    println!("  stability:      {:.1}", state.timeline_stability);
    println!("  shards:         {}", state.temporal_shards);
    println!("  prestiges:      {}", state.prestige_count);
    println!("  multiplier:     {:.2}", state.permanent_multiplier);

    if let Some(offline) = session.last_offline() {
        println!();
        println!("=== WHILE YOU WERE AWAY ===");
        println!(
            "  away {:.0}s, credited {:.0}s{}",
            offline.elapsed_seconds,
            offline.credited_seconds,
            if offline.was_capped() { " (capped)" } else { "" }
        );
        println!("  energy:         {:.2}", offline.energy);
    }

    let unlocked: Vec<_> = state
        .artifact_levels
        .iter()
        .filter(|(_, level)| **level > 0)
        .collect();
    println!();
    println!("=== ARTIFACTS ===");
    if unlocked.is_empty() {
        println!("  (none unlocked yet)");
    }
    for (id, level) in unlocked {
        println!(
            "  {id:<14} lvl {level:>3} | {:.2}/s",
            engine.artifact_production(id)
        );
    }
}

fn print_autoplay(report: &AutoplayReport) {
    println!("=== AUTOPLAY ===");
    for c in &report.cycles {
        println!(
            "  cycle {:>2} | {:>10.0}s | +{} shards | x{:.2} | {} upgrades | {} repairs | {} story",
            c.cycle,
            c.seconds,
            c.shards_earned,
            c.permanent_multiplier,
            c.upgrades_bought,
            c.anomalies_repaired,
            c.story_events
        );
    }
    println!();
    println!("  completed:    {}", report.completed);
    println!("  accelerating: {}", report.is_accelerating());
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
