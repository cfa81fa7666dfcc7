//! Google Chronicle unstructured log ingestion.
//!
//! Logs are serialized one entry per record, packed into size-limited
//! batches and POSTed to `unstructuredlogentries:batchCreate` on the
//! regional backend. Each batch is retried on transport errors and 5xx
//! responses; 4xx responses fail straight away.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::app::ports::{IngestReceipt, LogSinkPort};
use crate::common::constants::{
    CHRONICLE_BATCH_CREATE_PATH, CHRONICLE_MAX_BATCH_BYTES, CHRONICLE_MAX_BATCH_ENTRIES,
    CHRONICLE_SEND_ATTEMPTS,
};
use crate::common::error::{BridgeError, Result};
use crate::common::types::NormalizedLog;
use crate::config::{ChronicleConfig, ENV_CHRONICLE_API_KEY};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub log_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_rfc3339: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchCreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<&'a str>,
    log_type: &'a str,
    entries: &'a [LogEntry],
}

impl<'a> BatchCreateRequest<'a> {
    /// Serialized size of the request with no entries.
    fn envelope_bytes(customer_id: Option<&'a str>, log_type: &'a str) -> Result<usize> {
        let empty = BatchCreateRequest {
            customer_id,
            log_type,
            entries: &[],
        };
        Ok(serde_json::to_vec(&empty)?.len())
    }
}

/// Batch sizing and retry policy.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub max_entries: usize,
    pub max_bytes: usize,
    pub send_attempts: u32,
    /// Delay before retry `n` is `retry_delay * n`.
    pub retry_delay: Duration,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_entries: CHRONICLE_MAX_BATCH_ENTRIES,
            max_bytes: CHRONICLE_MAX_BATCH_BYTES,
            send_attempts: CHRONICLE_SEND_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

pub struct ChronicleClient {
    client: reqwest::Client,
    config: ChronicleConfig,
    limits: BatchLimits,
}

impl ChronicleClient {
    pub fn new(client: reqwest::Client, config: ChronicleConfig) -> Self {
        Self {
            client,
            config,
            limits: BatchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn batch_create_url(&self) -> String {
        format!("{}{}", self.config.base_url(), CHRONICLE_BATCH_CREATE_PATH)
    }

    fn validate(&self) -> Result<&str> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| BridgeError::Ingest(format!("{ENV_CHRONICLE_API_KEY} is not set")))?;
        if self.config.log_type.trim().is_empty() {
            return Err(BridgeError::Ingest("log type must not be empty".into()));
        }
        Ok(api_key)
    }

    async fn send_batch(&self, api_key: &str, entries: &[LogEntry]) -> Result<()> {
        let url = self.batch_create_url();
        let body = BatchCreateRequest {
            customer_id: self.config.customer_id.as_deref(),
            log_type: &self.config.log_type,
            entries,
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            let resp = self
                .client
                .post(&url)
                .query(&[("key", api_key)])
                .json(&body)
                .send()
                .await;

            let err = match resp {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    let err = BridgeError::Api {
                        status: status.as_u16(),
                        message: text,
                    };
                    if status.is_client_error() {
                        error!("Chronicle rejected batch with {}, not retrying", status);
                        return Err(err);
                    }
                    err
                }
                Err(e) => BridgeError::Http(e),
            };

            if attempts >= self.limits.send_attempts {
                error!("Batch failed after {} attempts: {}", attempts, err);
                return Err(err);
            }
            warn!("Batch attempt {} failed, retrying: {}", attempts, err);
            tokio::time::sleep(self.limits.retry_delay * attempts).await;
        }
    }
}

#[async_trait]
impl LogSinkPort for ChronicleClient {
    #[instrument(skip(self, logs), fields(count = logs.len()))]
    async fn ingest(&self, logs: &[NormalizedLog]) -> Result<IngestReceipt> {
        let api_key = self.validate()?;

        if logs.is_empty() {
            debug!("Nothing to ingest");
            return Ok(IngestReceipt::default());
        }

        let entries = build_entries(logs)?;
        let envelope_bytes = BatchCreateRequest::envelope_bytes(
            self.config.customer_id.as_deref(),
            &self.config.log_type,
        )?;
        let batches = pack_batches(
            entries,
            self.limits.max_entries,
            self.limits.max_bytes,
            envelope_bytes,
        )?;
        let total = batches.len();

        let mut receipt = IngestReceipt::default();
        for (i, batch) in batches.iter().enumerate() {
            self.send_batch(api_key, batch).await.map_err(|e| {
                BridgeError::Ingest(format!(
                    "batch {} of {} failed ({} entries already delivered): {}",
                    i + 1,
                    total,
                    receipt.entries,
                    e
                ))
            })?;
            receipt.batches += 1;
            receipt.entries += batch.len();
            debug!("Delivered batch {}/{} ({} entries)", i + 1, total, batch.len());
        }

        info!(
            "Ingested {} entries in {} batches",
            receipt.entries, receipt.batches
        );
        Ok(receipt)
    }
}

/// One entry per log. `ts_rfc3339` is only set when the event timestamp is valid RFC 3339.
pub fn build_entries(logs: &[NormalizedLog]) -> Result<Vec<LogEntry>> {
    logs.iter()
        .map(|log| -> Result<LogEntry> {
            let ts_rfc3339 = log
                .metadata
                .event_timestamp
                .as_deref()
                .filter(|ts| DateTime::parse_from_rfc3339(ts).is_ok())
                .map(str::to_string);
            Ok(LogEntry {
                log_text: serde_json::to_string(log)?,
                ts_rfc3339,
            })
        })
        .collect()
}

/// Greedy packing in input order.
///
/// `max_bytes` bounds the whole request body: `envelope_bytes` for the
/// surrounding object plus every serialized entry and its separator. A
/// single entry that cannot fit on its own is an error.
pub fn pack_batches(
    entries: Vec<LogEntry>,
    max_entries: usize,
    max_bytes: usize,
    envelope_bytes: usize,
) -> Result<Vec<Vec<LogEntry>>> {
    let max_entries = max_entries.max(1);
    let budget = max_bytes.saturating_sub(envelope_bytes);
    let mut batches = Vec::new();
    let mut current: Vec<LogEntry> = Vec::new();
    let mut current_bytes = 0usize;

    for (index, entry) in entries.into_iter().enumerate() {
        // Counting a comma for every entry over-reserves one byte per batch.
        let size = serde_json::to_vec(&entry)?.len() + 1;
        if size > budget {
            return Err(BridgeError::Ingest(format!(
                "entry {index} serializes to {size} bytes, above the {max_bytes} byte request limit"
            )));
        }
        if !current.is_empty() && (current.len() >= max_entries || current_bytes + size > budget)
        {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += size;
        current.push(entry);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}
