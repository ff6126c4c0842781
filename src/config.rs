//! Configuration file handling for finsync.
//!
//! The configuration file is stored at `$FINSYNC_HOME/config.json` and contains the paths
//! of the three synced artifacts (workbook, page, side-state data file) plus the backup
//! mode. Relative paths are resolved against the home directory.

use crate::backup::Backup;
use crate::store::JsonStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "finsync";
const CONFIG_VERSION: u8 = 1;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const WORKBOOK_XLSX: &str = "family-finance.xlsx";
const PAGE_HTML: &str = "dashboard.html";
const DATA_JSON: &str = "finance-data.json";

/// Whether a failed backup blocks the sync that asked for it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// Log the failure and proceed with the write (the original best-effort behavior).
    #[default]
    Lenient,
    /// Abort the sync before anything is written.
    Strict,
}

serde_plain::derive_display_from_serialize!(BackupMode);
serde_plain::derive_fromstr_from_deserialize!(BackupMode);

/// The `Config` object represents the configuration of the app. You instantiate it by
/// providing the path to `$FINSYNC_HOME` and from there it loads
/// `$FINSYNC_HOME/config.json`. It provides paths to the synced artifacts, which are
/// either configured explicitly or expected at default locations within the home
/// directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, the backups subdirectory, and an initial
    /// `config.json`. `workbook` and `page` override the default artifact locations when
    /// given; they are stored as configured, so relative overrides stay relative to the
    /// home directory.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        workbook: Option<PathBuf>,
        page: Option<PathBuf>,
    ) -> Result<Self> {
        // Create the directory if it does not exist
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finsync home directory")?;

        // Canonicalize the directory path
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups_dir = root.join(BACKUPS);
        utils::make_dir(&backups_dir).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            workbook_path: workbook,
            page_path: page,
            data_path: None,
            backup_mode: BackupMode::default(),
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups: backups_dir,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the finsync home exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - return the loaded configuration object
    pub async fn load(finsync_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = finsync_home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        // Validate that the home directory exists.
        let _ = utils::read_dir(&root)
            .await
            .context("finsync home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    /// The workbook path, resolved against the home directory if relative.
    pub fn workbook_path(&self) -> PathBuf {
        self.resolve(self.config_file.workbook_path())
    }

    /// The page path, resolved against the home directory if relative.
    pub fn page_path(&self) -> PathBuf {
        self.resolve(self.config_file.page_path())
    }

    /// The side-state data file path, resolved against the home directory if relative.
    pub fn data_path(&self) -> PathBuf {
        self.resolve(self.config_file.data_path())
    }

    pub fn backup_mode(&self) -> BackupMode {
        self.config_file.backup_mode
    }

    /// Creates a new `Backup` instance for taking workbook snapshots.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Creates the JSON-file store over the configured data path.
    pub fn store(&self) -> JsonStore {
        JsonStore::new(self.data_path())
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged if it is
    /// absolute.
    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finsync",
///   "config_version": 1,
///   "workbook_path": "family-finance.xlsx",
///   "page_path": "dashboard.html",
///   "backup_mode": "lenient"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finsync"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the xlsx workbook (optional, relative to the home directory or absolute).
    /// Defaults to $FINSYNC_HOME/family-finance.xlsx if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    workbook_path: Option<PathBuf>,

    /// Path to the HTML page (optional, relative to the home directory or absolute).
    /// Defaults to $FINSYNC_HOME/dashboard.html if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    page_path: Option<PathBuf>,

    /// Path to the side-state data file (optional, relative to the home directory or
    /// absolute). Defaults to $FINSYNC_HOME/finance-data.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    data_path: Option<PathBuf>,

    /// Whether a failed workbook backup aborts the sync
    #[serde(default)]
    backup_mode: BackupMode,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            workbook_path: None,
            page_path: None,
            data_path: None,
            backup_mode: BackupMode::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        // Validate app_name
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    #[cfg(test)]
    /// Creates a new ConfigFile with the specified settings.
    pub fn new(
        workbook_path: Option<PathBuf>,
        page_path: Option<PathBuf>,
        data_path: Option<PathBuf>,
        backup_mode: BackupMode,
    ) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            workbook_path,
            page_path,
            data_path,
            backup_mode,
        }
    }

    /// Gets the workbook path, defaulting to `family-finance.xlsx`.
    pub fn workbook_path(&self) -> PathBuf {
        self.workbook_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(WORKBOOK_XLSX))
    }

    /// Gets the page path, defaulting to `dashboard.html`.
    pub fn page_path(&self) -> PathBuf {
        self.page_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(PAGE_HTML))
    }

    /// Gets the data file path, defaulting to `finance-data.json`.
    pub fn data_path(&self) -> PathBuf {
        self.data_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DATA_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("finsync_home");

        // Run the function under test:
        let config = Config::create(&home_dir, None, None).await.unwrap();

        assert!(config.backups().is_dir());
        assert_eq!(config.workbook_path(), config.root().join(WORKBOOK_XLSX));
        assert_eq!(config.page_path(), config.root().join(PAGE_HTML));
        assert_eq!(config.data_path(), config.root().join(DATA_JSON));
        assert_eq!(config.backup_mode(), BackupMode::Lenient);
        assert!(config.config_path().is_file());
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("finsync_home");
        let created = Config::create(&home_dir, Some(PathBuf::from("books/fin.xlsx")), None)
            .await
            .unwrap();

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.workbook_path(), created.root().join("books/fin.xlsx"));
        assert_eq!(loaded.page_path(), created.root().join(PAGE_HTML));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_absolute_paths_pass_through() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("finsync_home");
        let absolute = dir.path().join("elsewhere").join("book.xlsx");
        let config = Config::create(&home_dir, Some(absolute.clone()), None)
            .await
            .unwrap();
        assert_eq!(config.workbook_path(), absolute);
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.workbook_path(), PathBuf::from(WORKBOOK_XLSX));
        assert_eq!(config.page_path(), PathBuf::from(PAGE_HTML));
        assert_eq!(config.data_path(), PathBuf::from(DATA_JSON));
        assert_eq!(config.backup_mode, BackupMode::Lenient);
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = ConfigFile::new(
            Some(PathBuf::from("custom/book.xlsx")),
            Some(PathBuf::from("custom/page.html")),
            None,
            BackupMode::Strict,
        );

        // Save the config
        original_config.save(&config_path).await.unwrap();

        // Load it back
        let loaded_config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "finsync",
            "config_version": 1
        }"#;

        let mut file = tokio::fs::File::create(&config_path).await.unwrap();
        file.write_all(json.as_bytes()).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(config.workbook_path(), PathBuf::from(WORKBOOK_XLSX));
        assert_eq!(config.backup_mode, BackupMode::Lenient);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1
        }"#;

        let mut file = tokio::fs::File::create(&config_path).await.unwrap();
        file.write_all(json.as_bytes()).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile::new(None, None, None, BackupMode::Lenient);

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("workbook_path"));
        assert!(!json.contains("page_path"));
        assert!(!json.contains("data_path"));
    }

    #[test]
    fn test_backup_mode_parsing() {
        assert_eq!("lenient".parse::<BackupMode>().unwrap(), BackupMode::Lenient);
        assert_eq!("strict".parse::<BackupMode>().unwrap(), BackupMode::Strict);
        assert_eq!(BackupMode::Strict.to_string(), "strict");
        assert!("yolo".parse::<BackupMode>().is_err());
    }
}
