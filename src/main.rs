use clap::Parser;
use tokio::runtime::Runtime;

use pa_sniper::{Cli, run_app};

fn main() -> anyhow::Result<()> {
    // A. Init Logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    // C. Replay events on the runtime
    let rt = Runtime::new()?;
    let summary = rt.block_on(run_app(&args))?;

    if summary.signals == 0 {
        log::info!("No signals emitted");
    }
    Ok(())
}
