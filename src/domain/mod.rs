// Domain layer: value types, entity shapes and ports. No I/O lives here.

pub mod model;
pub mod ports;
pub mod swift_code;

pub use model::{BankDetails, BankEntity, BankRecord, Branch, Headquarter, ImportRecord};
pub use ports::{
    BankSource, Deadline, DocumentStore, Filter, Pipeline, Projection, Update, UpdateResult,
};
pub use swift_code::{CountryCode, SwiftCode, HEADQUARTER_SUFFIX};
