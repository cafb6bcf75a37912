//! Print aggregate statistics for the persisted snapshot without scraping.

use anyhow::{bail, Result};

use dropwatch::stats::SummaryStats;
use dropwatch::store;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let path: std::path::PathBuf = dotenv::var("SNAPSHOT_PATH")
        .unwrap_or_else(|_| "airdrops.json".to_string())
        .into();

    let Some(snapshot) = store::load(&path).await? else {
        bail!("{} not found, run the scraper first", path.display());
    };

    println!("{}", SummaryStats::from_snapshot(&snapshot));
    Ok(())
}
