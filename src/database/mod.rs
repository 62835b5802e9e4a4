pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use store::{Record, RecordStore, StoreError, StoreErrorKind, StoreResult, Table};
