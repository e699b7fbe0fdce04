#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod models;
pub mod utils;

// The engine
pub mod engine;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{EngineConfig, MarketConfigs, SignalConfig};
pub use data::{CandleCache, validate_candle};
pub use domain::{Candle, Direction, PairInterval, Side};
pub use engine::{CandleClosed, Evaluation, Rejection, SignalEngine};
pub use models::{Setup, Signal, Zone};
pub use utils::app_time;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use engine::{JsonLinesSignalStore, LogNotifier, MemorySignalStore, SignalStore};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Engine settings (JSON). Built-in defaults when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-instrument overrides (JSON with an optional `_defaults` entry)
    #[arg(long)]
    pub markets: Option<PathBuf>,

    /// Newline-delimited candle-close events. Reads stdin when omitted.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Append accepted signals to this JSON-lines file instead of keeping them in memory
    #[arg(long)]
    pub signals_out: Option<PathBuf>,

    /// Log the rejection reason of every evaluation
    #[arg(long, default_value_t = false)]
    pub diagnostic: bool,
}

/// Counters from one pass over an event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub skipped: usize,
    pub signals: usize,
}

pub async fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            EngineConfig::from_json(&text)?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

pub async fn load_market_configs(path: Option<&Path>, global: &SignalConfig) -> Result<MarketConfigs> {
    let markets = match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read market configs {}", path.display()))?;
            MarketConfigs::from_json(&text)?
        }
        None => MarketConfigs::default(),
    };
    markets.validate(global)?;
    log::info!(
        "Loaded market configs for {} instruments",
        markets.markets.len()
    );
    Ok(markets)
}

/// Feed every well-formed, valid event to the engine in order. Bad lines are
/// logged and skipped.
pub async fn replay_events<R>(engine: &mut SignalEngine, reader: R) -> Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read event stream")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        summary.events += 1;

        let event: CandleClosed = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Line {line_no}: unreadable event: {e}");
                summary.skipped += 1;
                continue;
            }
        };
        if let Err(e) = validate_candle(&event.candle) {
            log::warn!("Line {line_no}: invalid candle for {}: {e}", event.instrument);
            summary.skipped += 1;
            continue;
        }

        match engine
            .on_candle_closed(&event.instrument, &event.timeframe, event.candle)
            .await
        {
            Ok(Evaluation::Signal(_)) => summary.signals += 1,
            Ok(Evaluation::Rejected(_)) => {}
            Err(e) => {
                log::warn!("Line {line_no}: {e:#}");
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

/// Load configuration, build the engine and replay the event stream.
pub async fn run_app(args: &Cli) -> Result<ReplaySummary> {
    let mut config = load_engine_config(args.config.as_deref()).await?;
    config.diagnostic_mode |= args.diagnostic;
    let markets = load_market_configs(args.markets.as_deref(), &config.signal).await?;

    let memory_store = Arc::new(MemorySignalStore::new());
    let store: Arc<dyn SignalStore> = match &args.signals_out {
        Some(path) => Arc::new(JsonLinesSignalStore::new(path)),
        None => memory_store.clone(),
    };
    let mut engine = SignalEngine::new(config, markets, Arc::new(LogNotifier), store);

    let summary = match &args.events {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open events {}", path.display()))?;
            replay_events(&mut engine, BufReader::new(file)).await?
        }
        None => replay_events(&mut engine, BufReader::new(tokio::io::stdin())).await?,
    };

    log::info!(
        "Replay finished: {} events, {} skipped, {} signals ({} kept in memory)",
        summary.events,
        summary.skipped,
        summary.signals,
        memory_store.len()
    );
    Ok(summary)
}
