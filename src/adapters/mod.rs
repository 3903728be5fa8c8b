// Adapters layer: concrete implementations of the domain ports (document stores, CSV sources).

pub mod memory_store;
pub mod parser;
pub mod spreadsheet;
pub mod sqlite_store;

pub use memory_store::MemoryStore;
pub use parser::parse_bank_records;
pub use spreadsheet::{FileSource, SpreadsheetSource};
pub use sqlite_store::SqliteStore;
