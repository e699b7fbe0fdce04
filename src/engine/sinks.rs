//! Delivery and persistence collaborators the engine hands accepted signals to.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::models::signal::{Signal, SignalRecord};

#[async_trait]
pub trait SignalNotifier: Send + Sync {
    /// True when the signal reached its destination. A false return keeps the
    /// signal unsaved and the cooldown untouched.
    async fn send_signal(&self, signal: &Signal) -> bool;

    fn signature(&self) -> &'static str;
}

#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn save_signal(&self, signal: &Signal) -> Result<()>;
}

/// Writes each signal to the log and always reports success.
pub struct LogNotifier;

#[async_trait]
impl SignalNotifier for LogNotifier {
    async fn send_signal(&self, signal: &Signal) -> bool {
        log::info!("🎯 SIGNAL {}", signal.summary());
        if let Some(reason) = &signal.bypass_reason {
            log::info!("   cooldown bypassed: {}", reason);
        }
        true
    }

    fn signature(&self) -> &'static str {
        "Log"
    }
}

#[derive(Default)]
pub struct MemorySignalStore {
    records: Mutex<Vec<SignalRecord>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SignalRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn save_signal(&self, signal: &Signal) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow!("Signal store lock poisoned"))?;
        records.push(SignalRecord::from(signal));
        Ok(())
    }
}

/// Appends one JSON record per line.
pub struct JsonLinesSignalStore {
    pub path: PathBuf,
}

impl JsonLinesSignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SignalStore for JsonLinesSignalStore {
    async fn save_signal(&self, signal: &Signal) -> Result<()> {
        let mut line = serde_json::to_string(&SignalRecord::from(signal))
            .context("Failed to serialise signal record")?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        Ok(())
    }
}
