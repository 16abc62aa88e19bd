use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use flare_engine::{Indexer, SearchEngine, watch};
use tracing_subscriber::EnvFilter;
use zbus::connection;

mod config;
mod executor;
mod orchestrator;
mod plugins;
mod service;

use config::Config;
use executor::DesktopExecutor;
use orchestrator::Orchestrator;
use plugins::PluginManager;
use service::{BUS_NAME, Engine, OBJECT_PATH};

#[derive(Parser, Debug)]
#[command(version, about = "flare search daemon", long_about = None)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/flare/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("FLARE_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() -> Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load(args.config.as_deref())?;
    let indexer = Arc::new(Indexer::new(config.indexer_config()));
    let engine = SearchEngine::new(Arc::clone(&indexer)).with_max_results(config.max_results());

    let mut manager = PluginManager::new(config.plugin_dir());
    unsafe {
        manager.load_all_plugins();
    }
    if manager.plugins().is_empty() {
        tracing::info!("no plugins loaded");
    }

    let orchestrator = Arc::new(Orchestrator::new(engine, manager, Box::new(DesktopExecutor::new())));
    orchestrator.startup();

    tracing::info!("starting initial indexing in background");
    indexer.index_all_async();
    let _watcher = if config.watch_applications() {
        watch::watch_applications(Arc::clone(&indexer))
    } else {
        None
    };

    let _conn = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, Engine::new(Arc::clone(&orchestrator)))?
        .build()
        .await?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "flare daemon is running");
    shutdown_signal().await?;

    tracing::info!("shutting down");
    orchestrator.shutdown();
    Ok(())
}
