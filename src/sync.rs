//! The sync orchestrator: composes the backup guard, workbook IO, page IO and the
//! side-state store into the three sync directions.
//!
//! Every direction follows the same shape: take a workbook snapshot, move the dataset from
//! source to destination, then record the result in the store. Structural failures (missing
//! source, unparseable page) abort before anything is written; recoverable problems are
//! collected as [`Warning`]s and returned in the [`SyncReport`].

use crate::config::BackupMode;
use crate::model::{Category, Dataset, Warning};
use crate::store::DataStore;
use crate::workbook::{read_dataset, save_book, write_dataset, Book};
use crate::{page, utils, Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// The direction of a sync operation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Workbook to page.
    #[default]
    Export,
    /// Page to workbook.
    Import,
    /// Page to workbook, then workbook back to page.
    Both,
}

serde_plain::derive_display_from_serialize!(Direction);
serde_plain::derive_fromstr_from_deserialize!(Direction);

/// The outcome of a completed sync operation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    direction: Direction,
    /// The snapshot taken before the operation, absent when there was no workbook to copy.
    backup: Option<PathBuf>,
    /// Records moved, per category.
    counts: BTreeMap<Category, usize>,
    /// Recoverable problems observed along the way.
    warnings: Vec<Warning>,
}

impl SyncReport {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn backup(&self) -> Option<&PathBuf> {
        self.backup.as_ref()
    }

    pub fn counts(&self) -> &BTreeMap<Category, usize> {
        &self.counts
    }

    pub fn total_records(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// A one-line human summary, e.g. `Synced 3 records from the workbook to the page`.
    pub fn summary(&self) -> String {
        let direction = match self.direction {
            Direction::Export => "from the workbook to the page",
            Direction::Import => "from the page to the workbook",
            Direction::Both => "from the page to the workbook and back",
        };
        let mut message = match self.total_records() {
            1 => format!("Synced 1 record {direction}"),
            n => format!("Synced {n} records {direction}"),
        };
        match self.warnings.len() {
            0 => {}
            1 => message.push_str(" with 1 warning"),
            n => message.push_str(&format!(" with {n} warnings")),
        }
        message
    }
}

/// Syncs the workbook to the page: reads every category sheet, rewrites the page's
/// `financeData` literal with the result, and saves the dataset to the store. The page is
/// left untouched when the workbook cannot be opened.
pub async fn export(config: &Config, store: &dyn DataStore) -> Result<SyncReport> {
    info!("Syncing workbook to page");
    let mut warnings = Vec::new();
    let backup = take_backup(config, &mut warnings).await?;
    let dataset = export_inner(config, store, &mut warnings).await?;

    Ok(SyncReport {
        direction: Direction::Export,
        backup,
        counts: dataset.counts(),
        warnings,
    })
}

/// Syncs the page to the workbook: extracts the `financeData` literal, rewrites every
/// category sheet's data rows, and saves the dataset to the store. The workbook is left
/// untouched when the page is missing or its literal cannot be parsed.
pub async fn import(config: &Config, store: &dyn DataStore) -> Result<SyncReport> {
    info!("Syncing page to workbook");
    let mut warnings = Vec::new();
    let backup = take_backup(config, &mut warnings).await?;
    let dataset = import_inner(config, store, &mut warnings).await?;

    Ok(SyncReport {
        direction: Direction::Import,
        backup,
        counts: dataset.counts(),
        warnings,
    })
}

/// Runs both directions under a single snapshot: page to workbook first, then workbook
/// back to page. A coarse reconciliation with no conflict detection; the page's records
/// land in the workbook and then flow back, so the page side wins entirely.
pub async fn both(config: &Config, store: &dyn DataStore) -> Result<SyncReport> {
    info!("Syncing page to workbook, then workbook to page");
    let mut warnings = Vec::new();
    let backup = take_backup(config, &mut warnings).await?;
    import_inner(config, store, &mut warnings).await?;
    let dataset = export_inner(config, store, &mut warnings).await?;

    Ok(SyncReport {
        direction: Direction::Both,
        backup,
        counts: dataset.counts(),
        warnings,
    })
}

async fn export_inner(
    config: &Config,
    store: &dyn DataStore,
    warnings: &mut Vec<Warning>,
) -> Result<Dataset> {
    let workbook_path = config.workbook_path();
    let book = Book::load(&workbook_path)?;
    let (dataset, mut read_warnings) = read_dataset(&book);
    warnings.append(&mut read_warnings);
    debug!(
        "Read {} records from {}",
        dataset.total_records(),
        workbook_path.display()
    );

    let page_path = config.page_path();
    let text = utils::read(&page_path).await?;
    let updated = page::replace(&text, &dataset)?;
    utils::write(&page_path, &updated).await?;
    debug!("Rewrote the financeData literal in {}", page_path.display());

    store.save(&dataset).await?;
    Ok(dataset)
}

async fn import_inner(
    config: &Config,
    store: &dyn DataStore,
    warnings: &mut Vec<Warning>,
) -> Result<Dataset> {
    let page_path = config.page_path();
    let text = utils::read(&page_path).await?;
    let (dataset, mut page_warnings) = page::extract(&text)?;
    warnings.append(&mut page_warnings);
    debug!(
        "Extracted {} records from {}",
        dataset.total_records(),
        page_path.display()
    );

    let workbook_path = config.workbook_path();
    let mut book = Book::load(&workbook_path)?;
    let mut write_warnings = write_dataset(&mut book, &dataset);
    warnings.append(&mut write_warnings);
    save_book(&book, &workbook_path)?;
    debug!("Rewrote the data rows in {}", workbook_path.display());

    store.save(&dataset).await?;
    Ok(dataset)
}

/// Takes the pre-sync workbook snapshot. In lenient mode a failed copy becomes a
/// [`Warning::BackupFailure`] and the sync continues; in strict mode it aborts the sync.
async fn take_backup(config: &Config, warnings: &mut Vec<Warning>) -> Result<Option<PathBuf>> {
    match config.backup().snapshot().await {
        Ok(Some(path)) => {
            debug!("Workbook backed up to {}", path.display());
            Ok(Some(path))
        }
        Ok(None) => {
            debug!("No workbook to back up yet");
            Ok(None)
        }
        Err(e) => match config.backup_mode() {
            BackupMode::Strict => {
                Err(e).context("Unable to back up the workbook before syncing")
            }
            BackupMode::Lenient => {
                warn!("Continuing without a backup: {e:#}");
                warnings.push(Warning::BackupFailure {
                    message: format!("{e:#}"),
                });
                Ok(None)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::store::MemoryStore;
    use crate::test::{deposit_record, sample_dataset, TestEnv};
    use crate::workbook::scaffold;

    /// Sets up the home directory with a scaffolded workbook holding `dataset` and a starter
    /// page, the state `finsync init` plus some workbook edits would leave behind.
    async fn populate(config: &Config, dataset: &Dataset) {
        scaffold::create_workbook(&config.workbook_path()).unwrap();
        let mut book = Book::load(&config.workbook_path()).unwrap();
        let dropped = write_dataset(&mut book, dataset);
        assert!(dropped.is_empty());
        save_book(&book, &config.workbook_path()).unwrap();
        utils::write(config.page_path(), page::STARTER_PAGE).await.unwrap();
    }

    async fn page_dataset(config: &Config) -> Dataset {
        let text = utils::read(&config.page_path()).await.unwrap();
        let (dataset, warnings) = page::extract(&text).unwrap();
        assert!(warnings.is_empty());
        dataset
    }

    fn workbook_dataset(config: &Config) -> Dataset {
        let book = Book::load(&config.workbook_path()).unwrap();
        let (dataset, warnings) = read_dataset(&book);
        assert!(warnings.is_empty());
        dataset
    }

    #[tokio::test]
    async fn test_export_moves_workbook_records_to_the_page() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &sample_dataset()).await;
        let store = MemoryStore::new();

        let report = export(&config, &store).await.unwrap();

        assert_eq!(report.direction(), Direction::Export);
        assert!(report.backup().is_some());
        assert_eq!(report.counts()[&Category::Deposit], 2);
        assert_eq!(report.counts()[&Category::Expense], 1);
        assert_eq!(report.total_records(), 3);
        assert_eq!(report.warnings(), &[]);

        assert_eq!(page_dataset(&config).await, sample_dataset());
        assert_eq!(store.load().await.unwrap(), Some(sample_dataset()));
    }

    #[tokio::test]
    async fn test_export_twice_produces_identical_page_bytes() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &sample_dataset()).await;
        let store = MemoryStore::new();

        export(&config, &store).await.unwrap();
        let first = utils::read(&config.page_path()).await.unwrap();
        export(&config, &store).await.unwrap();
        let second = utils::read(&config.page_path()).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_import_moves_page_records_to_the_workbook() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &Dataset::new()).await;
        let starter = utils::read(&config.page_path()).await.unwrap();
        let edited = page::replace(&starter, &sample_dataset()).unwrap();
        utils::write(config.page_path(), &edited).await.unwrap();
        let store = MemoryStore::new();

        let report = import(&config, &store).await.unwrap();

        assert_eq!(report.direction(), Direction::Import);
        assert_eq!(report.total_records(), 3);
        assert_eq!(report.warnings(), &[]);
        assert_eq!(workbook_dataset(&config), sample_dataset());
        assert_eq!(store.load().await.unwrap(), Some(sample_dataset()));
    }

    #[tokio::test]
    async fn test_both_lets_the_page_win() {
        let env = TestEnv::new().await;
        let config = env.config();

        let mut workbook_data = Dataset::new();
        workbook_data.push(Category::Deposit, deposit_record("2024-03-01", "stale", 1.0));
        populate(&config, &workbook_data).await;

        let mut page_data = Dataset::new();
        page_data.push(Category::Deposit, deposit_record("2024-04-01", "fresh", 2.0));
        page_data.push(Category::Deposit, deposit_record("2024-05-01", "fresh", 3.0));
        let starter = utils::read(&config.page_path()).await.unwrap();
        let edited = page::replace(&starter, &page_data).unwrap();
        utils::write(config.page_path(), &edited).await.unwrap();

        let store = MemoryStore::new();
        let report = both(&config, &store).await.unwrap();

        assert_eq!(report.direction(), Direction::Both);
        assert_eq!(report.counts()[&Category::Deposit], 2);
        assert_eq!(workbook_dataset(&config), page_data);
        assert_eq!(page_dataset(&config).await, page_data);
        assert_eq!(store.load().await.unwrap(), Some(page_data));
    }

    #[tokio::test]
    async fn test_export_with_missing_workbook_leaves_the_page_alone() {
        let env = TestEnv::new().await;
        let config = env.config();
        utils::write(config.page_path(), page::STARTER_PAGE).await.unwrap();
        let store = MemoryStore::new();

        assert!(export(&config, &store).await.is_err());

        let text = utils::read(&config.page_path()).await.unwrap();
        assert_eq!(text, page::STARTER_PAGE);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_import_with_unparseable_page_leaves_the_workbook_alone() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &sample_dataset()).await;
        utils::write(config.page_path(), "<html><body>no literal here</body></html>")
            .await
            .unwrap();
        let store = MemoryStore::new();

        assert!(import(&config, &store).await.is_err());

        assert_eq!(workbook_dataset(&config), sample_dataset());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_export_records_coercion_warnings() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &Dataset::new()).await;

        // Hand-edit the workbook: a deposit row whose Amount is text.
        let mut book = Book::load(&config.workbook_path()).unwrap();
        let sheet = book.sheet_mut(Category::Deposit.sheet_title()).unwrap();
        sheet.set_cell(3, 0, crate::workbook::Cell::value(Value::text("2024-06-01")));
        sheet.set_cell(3, 3, crate::workbook::Cell::value(Value::text("lots")));
        save_book(&book, &config.workbook_path()).unwrap();

        let store = MemoryStore::new();
        let report = export(&config, &store).await.unwrap();

        assert_eq!(report.counts()[&Category::Deposit], 1);
        assert_eq!(
            report.warnings(),
            &[Warning::CoercionFallback {
                category: Category::Deposit,
                attr: "amount".to_string(),
                raw: "lots".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_lenient_mode_syncs_through_a_backup_failure() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &sample_dataset()).await;

        // Replace the backups directory with a file so the snapshot copy cannot happen.
        std::fs::remove_dir_all(config.backups()).unwrap();
        std::fs::write(config.backups(), "not a directory").unwrap();

        let store = MemoryStore::new();
        let report = export(&config, &store).await.unwrap();

        assert_eq!(report.backup(), None);
        assert!(matches!(
            report.warnings(),
            [Warning::BackupFailure { .. }]
        ));
        assert_eq!(page_dataset(&config).await, sample_dataset());
    }

    #[tokio::test]
    async fn test_strict_mode_aborts_on_a_backup_failure() {
        let env = TestEnv::new().await;
        let config = env.config();
        populate(&config, &sample_dataset()).await;

        // Flip the config to strict and sabotage the backups directory.
        let config_json = config.root().join("config.json");
        let text = std::fs::read_to_string(&config_json).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["backup_mode"] = serde_json::json!("strict");
        std::fs::write(&config_json, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        let config = Config::load(config.root()).await.unwrap();
        assert_eq!(config.backup_mode(), BackupMode::Strict);

        std::fs::remove_dir_all(config.backups()).unwrap();
        std::fs::write(config.backups(), "not a directory").unwrap();

        let store = MemoryStore::new();
        let result = export(&config, &store).await;

        assert!(result.is_err());
        let page_text = utils::read(&config.page_path()).await.unwrap();
        assert_eq!(page_text, page::STARTER_PAGE);
    }

    #[test]
    fn test_direction_string_forms() {
        use std::str::FromStr;
        assert_eq!(Direction::Export.to_string(), "export");
        assert_eq!(Direction::from_str("both").unwrap(), Direction::Both);
        assert!(Direction::from_str("sideways").is_err());
    }
}
