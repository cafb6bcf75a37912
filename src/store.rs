//! Snapshot persistence: one pretty-printed JSON file, overwritten per run.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::model::Snapshot;

/// Load the previous run's snapshot. A missing file means this is the
/// first run and yields `None`; any other failure is an error.
pub async fn load(path: &Path) -> Result<Option<Snapshot>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no previous snapshot, first run");
            return Ok(None);
        }
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };

    let snapshot: Snapshot = serde_json::from_slice(&data)
        .with_context(|| format!("parse snapshot {}", path.display()))?;
    debug!(
        path = %path.display(),
        total = snapshot.total_count,
        scraped_at = %snapshot.scraped_at,
        "previous snapshot loaded"
    );
    Ok(Some(snapshot))
}

/// Write the current snapshot, replacing whatever was there.
pub async fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot).context("serialize snapshot")?;
    tokio::fs::write(path, &json)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    info!(
        path = %path.display(),
        total = snapshot.total_count,
        "snapshot saved"
    );
    Ok(())
}
