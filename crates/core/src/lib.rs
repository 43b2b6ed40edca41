pub mod config;
pub mod error;
pub mod params;
pub mod record;
pub mod traits;

pub use config::Config;
pub use error::*;
pub use params::*;
pub use record::*;
pub use traits::*;
