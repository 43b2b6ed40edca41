//! XML row-tag ingestion: read a feed, stamp audit columns, append to a table.

pub mod audit;
pub mod task;
pub mod xml;

pub use audit::tag_records;
pub use task::{IngestReport, IngestTask};
pub use xml::{parse_records, XmlFileSource};
