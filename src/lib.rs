pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
mod model;
mod page;
mod server;
mod store;
mod sync;
mod utils;
mod workbook;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use model::{Category, Warning};
pub use sync::{Direction, SyncReport};
