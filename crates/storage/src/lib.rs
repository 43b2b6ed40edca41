pub mod backend;
pub mod encode;
pub mod error;
pub mod log;
pub mod store;
pub mod table_name;

pub use backend::{LocalBackend, S3Backend, WarehouseBackend};
pub use encode::{ColumnSpec, ColumnType};
pub use error::StorageError;
pub use log::CommitEntry;
pub use store::TableStore;
pub use table_name::TableName;
