//! CLI surface: `watch` runs the batcher against the intake directory,
//! `route` processes one file on demand, `ocr-check` probes tool
//! availability. Shape follows the teacher's `clap` derive CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::events::TracingSink;
use crate::models::IntakeFile;
use crate::ocr::{OcrBackend, Rasterizer, TesseractBackend};
use crate::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "intake-router", about = "Financial-onboarding document intake & routing pipeline")]
pub struct Cli {
    /// Root directory containing `incoming-scan/` and the output buckets.
    #[arg(long, env = "INTAKE_ROUTER_ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the intake directory and route files as they arrive.
    Watch,
    /// Process a single file immediately, outside the watch loop.
    Route {
        /// Path to the file to route.
        path: PathBuf,
    },
    /// Probe OCR and rasterizer tool availability and exit.
    OcrCheck,
}

pub fn is_verbose() -> bool {
    std::env::args().any(|a| a == "-v" || a == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    config.ensure_directories()?;

    let backend = TesseractBackend::new(&config.language, config.ocr_binary.as_deref());
    let rasterizer = Rasterizer::new(config.rasterizer_binary.as_deref());
    let sink = TracingSink;

    match cli.command {
        Commands::Watch => run_watch(&config, &backend, &rasterizer, &sink).await,
        Commands::Route { path } => run_route(&config, &backend, &rasterizer, &sink, &path),
        Commands::OcrCheck => run_ocr_check(&backend, &rasterizer),
    }
}

async fn run_watch(
    config: &Config,
    backend: &dyn OcrBackend,
    rasterizer: &Rasterizer,
    sink: &TracingSink,
) -> anyhow::Result<()> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let _watcher = crate::watcher::spawn_watcher(&config.intake_path(), tx)?;

    tracing::info!(intake = %config.intake_path().display(), "watching for intake files");
    crate::watcher::process_batch(config, backend, rasterizer, sink).await;
    crate::watcher::run_watch_loop(rx, config, backend, rasterizer, sink).await;
    Ok(())
}

fn run_route(
    config: &Config,
    backend: &dyn OcrBackend,
    rasterizer: &Rasterizer,
    sink: &TracingSink,
    path: &std::path::Path,
) -> anyhow::Result<()> {
    let intake = IntakeFile::from_path(path)
        .ok_or_else(|| anyhow::anyhow!("{} is not an accepted intake file", path.display()))?;
    let pipeline = Pipeline::new(config, backend, rasterizer, sink);
    let outcome = pipeline.process_one(&intake);
    println!("{}", outcome.destination.display());
    Ok(())
}

fn run_ocr_check(backend: &dyn OcrBackend, rasterizer: &Rasterizer) -> anyhow::Result<()> {
    let ocr_ok = backend.is_available();
    println!("ocr backend available: {ocr_ok}");
    match rasterizer.page_count(std::path::Path::new("/dev/null")) {
        Ok(_) => println!("rasterizer reachable"),
        Err(e) => println!("rasterizer probe: {e}"),
    }
    Ok(())
}
