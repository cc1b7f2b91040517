pub mod config;
pub mod error;

pub use config::{BACKUP_ROOT_NAME, BatchRequest, Destination, PRIMARY_DIMENSION};
pub use error::{BackupError, ConfigError, NbtError, RecordError, Result};
