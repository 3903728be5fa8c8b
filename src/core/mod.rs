pub mod importer;
pub mod repository;
pub mod service;
pub mod transformer;

pub use crate::domain::ports::{BankSource, Deadline, DocumentStore, Pipeline};
pub use crate::utils::error::Result;
pub use importer::{ImportEngine, ImportOptions, ImportPipeline, ImportSummary};
pub use repository::BankRepository;
pub use service::{BankKind, BankService};
pub use transformer::{transform, TransformOutcome};
