use crate::commands::Out;
use crate::sync::{self, SyncReport};
use crate::{Config, Result};
use tracing::warn;

/// Syncs the workbook's records to the dashboard page.
pub async fn export(config: Config) -> Result<Out<SyncReport>> {
    let store = config.store();
    let report = sync::export(&config, &store).await?;
    Ok(out(report))
}

/// Syncs the dashboard page's records to the workbook.
pub async fn import(config: Config) -> Result<Out<SyncReport>> {
    let store = config.store();
    let report = sync::import(&config, &store).await?;
    Ok(out(report))
}

/// Syncs both ways: page to workbook first, then workbook back to page.
pub async fn sync_both(config: Config) -> Result<Out<SyncReport>> {
    let store = config.store();
    let report = sync::both(&config, &store).await?;
    Ok(out(report))
}

/// Logs each warning and wraps the report with its one-line summary.
fn out(report: SyncReport) -> Out<SyncReport> {
    for warning in report.warnings() {
        warn!("{warning}");
    }
    let message = report.summary();
    Out::new(message, report)
}
