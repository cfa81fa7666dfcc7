use crate::common::error::Result;
use crate::common::types::{DateWindow, NormalizedLog, RawEvent};
use async_trait::async_trait;
use serde::Serialize;

/// Source of raw notification events for a date window.
#[async_trait]
pub trait EventSourcePort: Send + Sync {
    async fn fetch_events(&self, window: &DateWindow) -> Result<Vec<RawEvent>>;
}

/// Destination that accepts a whole batch of normalized logs.
///
/// Implementations own batching, retries and validation.
#[async_trait]
pub trait LogSinkPort: Send + Sync {
    async fn ingest(&self, logs: &[NormalizedLog]) -> Result<IngestReceipt>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReceipt {
    pub batches: usize,
    pub entries: usize,
}
