use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::info;

use crate::models::{KpiEngineError, Result, TierAssignment};

/// Receives classified customers for persistence, e.g. a tier table sync.
#[async_trait]
pub trait TierSink: Send + Sync {
    /// Persist the assignments, returning how many were written
    async fn sync_tiers(&self, assignments: &[TierAssignment]) -> Result<usize>;
}

/// Writes assignments as a pretty-printed JSON array, replacing the file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TierSink for JsonFileSink {
    async fn sync_tiers(&self, assignments: &[TierAssignment]) -> Result<usize> {
        let body = serde_json::to_string_pretty(assignments)?;
        tokio::fs::write(&self.path, body).await?;
        info!("Wrote {} tier assignments to {}", assignments.len(), self.path.display());
        Ok(assignments.len())
    }
}

/// Keeps the most recent sync in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    stored: RwLock<Vec<TierAssignment>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<TierAssignment> {
        match self.stored.read() {
            Ok(stored) => stored.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl TierSink for MemorySink {
    async fn sync_tiers(&self, assignments: &[TierAssignment]) -> Result<usize> {
        let mut stored = self
            .stored
            .write()
            .map_err(|e| KpiEngineError::Persistence(format!("memory sink lock poisoned: {}", e)))?;
        *stored = assignments.to_vec();
        Ok(assignments.len())
    }
}
