use anyhow::Result;
use tracing::{info, Level};

use dropwatch::config::Config;
use dropwatch::diff;
use dropwatch::report::Report;
use dropwatch::scrape::Collector;
use dropwatch::stats::SummaryStats;
use dropwatch::store;
use dropwatch::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let config = Config::from_env()?;

    info!("Starting airdrop scrape run");

    let previous = store::load(&config.snapshot_path).await?;

    let collector = Collector::new()?;
    let current = collector.collect().await?;
    info!(total = current.total_count, "scrape complete");

    let changes = diff::detect_changes(previous.as_ref(), &current);
    let report = Report::from_changes(&changes);
    println!("{}", report);

    store::save(&config.snapshot_path, &current).await?;

    println!("{}", SummaryStats::from_snapshot(&current));

    if report.grand_total > 0 {
        if changes.is_first_run {
            info!("first run, announcing every airdrop");
        } else {
            info!(changes = report.grand_total, "changes detected, sending to Telegram");
        }
        let telegram = TelegramClient::new(&config)?;
        telegram.deliver(&changes).await?;
        info!("Telegram notifications sent");
    } else {
        info!("no changes detected, skipping Telegram notifications");
    }

    Ok(())
}
