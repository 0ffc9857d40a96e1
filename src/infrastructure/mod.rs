//! Infrastructure layer providing external service integrations.
//!
//! This module contains the store backends (JSON file, remote spreadsheet,
//! memory), configuration loading and CSV export.

pub mod config;
pub mod export;
pub mod memory;
pub mod persistence;
pub mod sheets;

pub use config::*;
pub use export::*;
pub use memory::*;
pub use persistence::*;
pub use sheets::*;

use crate::domain::AppointmentStore;
use anyhow::{Context, Result, bail};
use tracing::info;

/// Opens the backend selected by `config`.
///
/// The spreadsheet backend reads its bearer token from the environment
/// variable named in the config.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn AppointmentStore>> {
    match config.backend {
        BackendKind::File => {
            info!(path = %config.file.path.display(), "using file store");
            Ok(Box::new(JsonFileStore::new(config.file.path.clone())))
        }
        BackendKind::Sheets => {
            let sheets = &config.sheets;
            if sheets.spreadsheet_id.is_empty() {
                bail!("store.sheets.spreadsheet_id must be set for the sheets backend");
            }
            let token = std::env::var(&sheets.token_env)
                .with_context(|| format!("{} is not set", sheets.token_env))?;
            let transport = HttpSheetTransport::new(sheets, token).map_err(anyhow::Error::msg)?;
            info!(spreadsheet = %sheets.spreadsheet_id, sheet = %sheets.sheet_name, "using sheets store");
            Ok(Box::new(SheetsStore::new(transport)))
        }
        BackendKind::Memory => {
            info!("using memory store");
            Ok(Box::new(MemoryStore::default()))
        }
    }
}
