use std::io::Write;

use tracing::{debug, error, info, instrument};

use crate::app::ports::{EventSourcePort, IngestReceipt, LogSinkPort};
use crate::common::error::Result;
use crate::common::types::{DateWindow, NormalizedLog};
use crate::pipeline::transform_events;

/// What happened to the transformed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Dry run: the batch was printed instead of forwarded.
    Skipped,
    Delivered(IngestReceipt),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub window: DateWindow,
    pub fetched: usize,
    pub delivery: DeliveryOutcome,
}

/// Fetch, transform and forward one window of events.
pub struct SyncUseCase {
    source: Box<dyn EventSourcePort>,
    sink: Box<dyn LogSinkPort>,
}

impl SyncUseCase {
    pub fn new(source: Box<dyn EventSourcePort>, sink: Box<dyn LogSinkPort>) -> Self {
        Self { source, sink }
    }

    /// Runs once for `window`.
    ///
    /// Fetch errors abort the run and are returned. Forwarding errors are
    /// logged and reported through `RunSummary::delivery` instead.
    #[instrument(skip(self, window, out), fields(window = %window))]
    pub async fn run<W: Write>(
        &self,
        window: DateWindow,
        dry_run: bool,
        out: &mut W,
    ) -> Result<RunSummary> {
        let events = self.source.fetch_events(&window).await?;
        let logs = transform_events(&events);
        debug!("Transformed {} events", logs.len());

        let delivery = if dry_run {
            write_dry_run(out, &logs)?;
            DeliveryOutcome::Skipped
        } else {
            match forward(self.sink.as_ref(), &logs).await {
                Ok(receipt) => DeliveryOutcome::Delivered(receipt),
                Err(e) => DeliveryOutcome::Failed(e.to_string()),
            }
        };

        Ok(RunSummary {
            window,
            fetched: events.len(),
            delivery,
        })
    }
}

/// Hands the batch to the sink, logging the outcome either way.
pub async fn forward(sink: &dyn LogSinkPort, logs: &[NormalizedLog]) -> Result<IngestReceipt> {
    match sink.ingest(logs).await {
        Ok(receipt) => {
            info!("Successfully sent {} events to Chronicle", logs.len());
            debug!("Response: {:?}", receipt);
            Ok(receipt)
        }
        Err(e) => {
            error!("Failed to send events to Chronicle: {}", e);
            Err(e)
        }
    }
}

/// Pretty-prints the batch as a JSON array, two-space indented.
pub fn write_dry_run<W: Write>(out: &mut W, logs: &[NormalizedLog]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, logs)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
