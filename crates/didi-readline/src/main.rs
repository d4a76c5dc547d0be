use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use didi_application::{DispatcherCapabilities, run_didi};
use didi_core::prompt::Prompter;
use didi_infrastructure::{ConfigService, DidiPaths, LocalRuntimeFactory};

mod logging;
mod terminal;

use terminal::TerminalPrompter;

#[derive(Parser)]
#[command(name = "didi")]
#[command(about = "DIDI - interactive holder agent for DID / verifiable credential networks", long_about = None)]
struct Args {
    /// Configuration file (defaults to ~/.config/didi/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory holding wallets and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. `info` or `didi_application=debug` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not answer vote ballots
    #[arg(long)]
    disable_voting: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigService::new(args.config).load()?;
    if args.data_dir.is_some() {
        config.storage.data_dir = args.data_dir;
    }
    let paths = DidiPaths::new(config.storage.data_dir.as_deref());
    let _log_guard = logging::init(&paths.logs_dir()?, args.log_level.as_deref())?;
    tracing::info!("[Bootstrap] Starting didi {}", env!("CARGO_PKG_VERSION"));

    let factory = LocalRuntimeFactory::new(paths);
    let prompter: Arc<dyn Prompter> = Arc::new(TerminalPrompter::new());
    let capabilities = DispatcherCapabilities {
        voting: !args.disable_voting,
        ..Default::default()
    };

    if let Err(e) = run_didi(&factory, prompter, &config, capabilities).await {
        tracing::error!("[Bootstrap] {}", e);
        return Err(e.into());
    }

    tracing::info!("[Bootstrap] Exited");
    Ok(())
}
