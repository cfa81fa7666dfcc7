use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

use lightspeed_to_chronicle::app::sync_use_case::{DeliveryOutcome, SyncUseCase};
use lightspeed_to_chronicle::common::types::DateWindow;
use lightspeed_to_chronicle::config::Config;
use lightspeed_to_chronicle::infra::chronicle_client::ChronicleClient;
use lightspeed_to_chronicle::infra::http_client::build_client;
use lightspeed_to_chronicle::infra::insights_client::InsightsClient;
use lightspeed_to_chronicle::logging;

#[derive(Parser)]
#[command(name = "lightspeed_to_chronicle")]
#[command(about = "Ingest Red Hat Insights events into Google Chronicle.")]
#[command(version)]
struct Cli {
    /// Print transformed events instead of sending to Chronicle.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    let _guard = logging::init_logging(logging::LOG_DIR);

    let config = Config::from_env().context("failed to load configuration")?;
    if !cli.dry_run && config.chronicle.api_key.is_none() {
        warn!("CHRONICLE_API_KEY is not set; forwarding will fail");
    }

    let http = build_client()?;
    let source = InsightsClient::new(http.clone(), config.insights.clone());
    let sink = ChronicleClient::new(http, config.chronicle.clone());
    let use_case = SyncUseCase::new(Box::new(source), Box::new(sink));

    // Always the previous UTC day.
    let window = DateWindow::yesterday(Utc::now());
    info!("Syncing Insights events for {}", window);

    let mut stdout = std::io::stdout().lock();
    let summary = match use_case.run(window, cli.dry_run, &mut stdout).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run aborted: {}", e);
            return Err(e).context(format!("sync failed for {window}"));
        }
    };

    match summary.delivery {
        DeliveryOutcome::Skipped => {
            info!("Dry run: printed {} events", summary.fetched);
        }
        DeliveryOutcome::Delivered(receipt) => {
            info!(
                "Forwarded {} events in {} batches",
                receipt.entries, receipt.batches
            );
        }
        DeliveryOutcome::Failed(reason) => {
            warn!(
                "{} events were not forwarded: {}",
                summary.fetched, reason
            );
        }
    }
    Ok(())
}
