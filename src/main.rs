use anyhow::{Context, Result};
use dicebox::cli::{CliOverrides, USAGE};
use dicebox::config::AppConfig;
use dicebox::logging::init_logging;
use dicebox::DiceApp;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/dicebox.json";

#[derive(Serialize)]
struct RollReport<'a> {
    roll: u32,
    body: &'a str,
    outcome: u32,
    face_up: Option<u32>,
    steps: u32,
}

fn main() {
    if let Err(err) = init_logging() {
        eprintln!("[logging] {err:?}");
    }
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(%err, "invalid command line");
            std::process::exit(2);
        }
    };
    if cli.help {
        println!("{USAGE}");
        return;
    }
    if let Err(err) = run(cli) {
        tracing::error!(err = ?err, "application error");
        std::process::exit(1);
    }
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::load_or_default(DEFAULT_CONFIG_PATH),
        None => AppConfig::default(),
    };
    let dump_dir = cli.dump_textures.clone();
    let overrides = cli.into_config_overrides();
    if !overrides.is_empty() {
        tracing::info!(fields = ?overrides.applied_fields(), "applied CLI overrides");
    }
    config.apply_overrides(&overrides);

    let mut app = DiceApp::new(&config)?;
    if let Some(dir) = dump_dir {
        let written = app.scene().dump_textures(&dir)?;
        tracing::info!(count = written, dir = %dir.display(), "dumped face textures");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &app.scene().summary()).context("writing scene summary")?;
    writeln!(out)?;

    let settle_steps = app.run_until_rest(config.run.steps_per_roll);
    tracing::info!(steps = settle_steps, "initial drop finished");
    log_events(&mut app);

    for roll in 1..=config.run.rolls {
        let mut outcomes = Vec::new();
        for id in app.dice() {
            outcomes.push((id, app.click(id)?));
        }
        let steps = app.run_until_rest(config.run.steps_per_roll);
        log_events(&mut app);
        for (id, outcome) in outcomes {
            let name = app.definition(id).map(|def| def.name.as_str()).unwrap_or("?");
            let report = RollReport { roll, body: name, outcome, face_up: app.face_up(id), steps };
            serde_json::to_writer(&mut out, &report).context("writing roll report")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn log_events(app: &mut DiceApp) {
    for event in app.drain_events() {
        tracing::debug!("{event}");
    }
}
