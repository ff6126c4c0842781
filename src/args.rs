//! These structs provide the CLI interface for the finsync CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finsync: keep a family finance workbook and its dashboard page in sync.
///
/// The workbook is an xlsx file with one sheet per record category; the dashboard is a
/// single HTML page that carries the same records in an embedded `financeData` object.
/// finsync moves records between the two in either direction, snapshotting the workbook
/// before every sync.
///
/// Run `finsync init` once to scaffold the configuration, the workbook and the page. After
/// that, `finsync export` pushes workbook edits to the page, `finsync import` pushes page
/// edits to the workbook, and `finsync sync` runs both. `finsync serve` hosts the page on
/// the local network so the dashboard can be edited from a browser.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the finsync home directory and scaffold the workbook, page and config files.
    ///
    /// This is the first command you should run. By default everything lands under
    /// $HOME/finsync; pass --home (or set FINSYNC_HOME) to put it somewhere else, and
    /// --workbook/--page to point at files outside the home directory.
    Init(InitArgs),
    /// Sync the workbook's records to the dashboard page.
    Export,
    /// Sync the dashboard page's records to the workbook.
    Import,
    /// Sync both ways: page to workbook first, then workbook back to page.
    Sync,
    /// Serve the dashboard page over HTTP for editing in a browser.
    Serve(ServeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for
    /// instructions.
    #[arg(long, env = "FINSYNC_LOG_LEVEL", default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where finsync data and configuration is held. Defaults to ~/finsync
    #[arg(long, env = "FINSYNC_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `finsync init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where to create the workbook. Relative paths are resolved against the finsync home.
    /// Defaults to family-finance.xlsx in the home directory.
    #[arg(long)]
    workbook: Option<PathBuf>,

    /// Where to create the dashboard page. Relative paths are resolved against the finsync
    /// home. Defaults to dashboard.html in the home directory.
    #[arg(long)]
    page: Option<PathBuf>,

    /// Overwrite the workbook and page if they already exist.
    #[arg(long)]
    force: bool,
}

impl InitArgs {
    pub fn workbook(&self) -> Option<&PathBuf> {
        self.workbook.as_ref()
    }

    pub fn page(&self) -> Option<&PathBuf> {
        self.page.as_ref()
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

/// Args for the `finsync serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// The port to listen on.
    #[arg(long, env = "FINSYNC_PORT", default_value_t = 5000)]
    port: u16,
}

impl ServeArgs {
    pub fn port(&self) -> u16 {
        self.port
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finsync"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or FINSYNC_HOME instead of relying on the default \
                finsync home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("finsync")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
