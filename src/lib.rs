pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{FileSource, MemoryStore, SpreadsheetSource, SqliteStore};
pub use api::{router, AppState};
pub use config::AppConfig;
pub use core::{BankRepository, BankService, ImportEngine, ImportOptions, ImportPipeline};
pub use domain::{BankDetails, BankEntity, Branch, CountryCode, Deadline, Headquarter, SwiftCode};
pub use utils::error::{BankError, Result};
