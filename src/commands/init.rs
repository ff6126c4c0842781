use crate::commands::Out;
use crate::model::Dataset;
use crate::store::DataStore;
use crate::workbook::scaffold;
use crate::{page, utils, Config, Result};
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

/// Creates the finsync home directory and everything a fresh installation needs:
/// - A `config.json` holding the workbook, page and side-state paths.
/// - The scaffolded workbook with its Dashboard and six category sheets.
/// - The starter dashboard page with an empty `financeData` object.
/// - An empty side-state file.
///
/// # Arguments
/// - `home` - The directory that will be the root of the finsync installation, e.g.
///   `$HOME/finsync`.
/// - `workbook` - Where to create the workbook; relative paths resolve against `home`.
///   `None` means the default location inside `home`.
/// - `page` - Where to create the dashboard page; same resolution rules as `workbook`.
/// - `force` - Re-initialize even when the home, workbook or page already exist.
///
/// # Errors
/// - Returns an error if the home is already initialized (unless `force`), or if any file
///   operation fails.
pub async fn init(
    home: &Path,
    workbook: Option<PathBuf>,
    page_path: Option<PathBuf>,
    force: bool,
) -> Result<Out<()>> {
    if !force && Config::load(home).await.is_ok() {
        bail!(
            "finsync is already initialized at {}, pass --force to re-initialize",
            home.display()
        );
    }

    let config = Config::create(home, workbook, page_path)
        .await
        .context("Unable to create the finsync home directory and config")?;

    let workbook_path = config.workbook_path();
    if workbook_path.exists() && !force {
        bail!(
            "A workbook already exists at {}, pass --force to overwrite it",
            workbook_path.display()
        );
    }
    let page_path = config.page_path();
    if page_path.exists() && !force {
        bail!(
            "A page already exists at {}, pass --force to overwrite it",
            page_path.display()
        );
    }

    if let Some(parent) = workbook_path.parent() {
        utils::make_dir(parent).await?;
    }
    if let Some(parent) = page_path.parent() {
        utils::make_dir(parent).await?;
    }

    scaffold::create_workbook(&workbook_path)?;
    utils::write(&page_path, page::STARTER_PAGE).await?;
    config.store().save(&Dataset::new()).await?;

    Ok(Out::new_message(format!(
        "Created the finsync home at {} with a scaffolded workbook and dashboard page",
        config.root().display()
    )))
}
