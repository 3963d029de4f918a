mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use scrollreel_core::{
    FrameOutput, InputEvent, Orchestrator, OrchestratorConfig, PagePhase, PageSpec, load_config,
};
use scrollreel_protocol::Viewport;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "scrollreel.log";
const FRAME_MS: f64 = 16.0;

struct Args {
    config: Option<PathBuf>,
    page: Option<PathBuf>,
    headless: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        page: None,
        headless: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--page" => args.page = Some(iter.next().context("--page needs a path")?.into()),
            "--headless" => args.headless = true,
            "-h" | "--help" => {
                eprintln!("Usage: scrollreel [--config <config.toml>] [--page <page.toml|page.json>] [--headless]");
                std::process::exit(0);
            }
            other => bail!("unknown argument `{other}`"),
        }
    }
    Ok(args)
}

/// Log to a file; the alternate screen owns the terminal.
fn init_logging(level: &str) -> Result<()> {
    let file = File::create(LOG_FILE).with_context(|| format!("creating {LOG_FILE}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_page(path: &Path) -> Result<PageSpec> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let spec = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => PageSpec::from_json(&contents)?,
        _ => PageSpec::from_toml(&contents)?,
    };
    Ok(spec)
}

fn step(page: &mut Orchestrator, ts: &mut f64) -> FrameOutput {
    let out = page.frame(*ts);
    *ts += FRAME_MS;
    out
}

/// Scroll through the whole page without a terminal and print each
/// section change.
fn run_headless(mut page: Orchestrator) -> Result<()> {
    let mut ts = 0.0;
    let mut current = None;
    while page.phase() == PagePhase::Loading {
        step(&mut page, &mut ts);
    }
    let limit = page.scroll_limit();
    while page.scroll_state().smoothed_offset < limit {
        page.handle_input(InputEvent::Wheel { delta_y: 120.0 })?;
        for _ in 0..4 {
            let out = step(&mut page, &mut ts);
            if out.active.current_section != current {
                current.clone_from(&out.active.current_section);
                eprintln!(
                    "{:>8.1}px  {}",
                    out.scroll.smoothed_offset,
                    current.as_deref().unwrap_or("-")
                );
            }
        }
    }
    info!(frames = ts / FRAME_MS, "Headless run finished");
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => load_config(path),
        None => OrchestratorConfig::default(),
    };
    init_logging(&config.log_level)?;

    let spec = match &args.page {
        Some(path) => load_page(path)?,
        None => PageSpec::portfolio(),
    };
    info!(sections = spec.sections.len(), "Starting page");

    if args.headless {
        let page = Orchestrator::new(config, spec, Viewport::new(1280.0, 800.0))?;
        return run_headless(page);
    }
    renderer::run_tui(config, spec)
}
