pub mod backup;
pub mod engine;
pub mod overwrite;
pub mod selector;

pub use backup::{BackupSet, TIMESTAMP_FORMAT, folder_name};
pub use engine::{LocalStore, RecordStore};
pub use overwrite::replace_file;
pub use selector::{RECORD_EXTENSION, is_record_file_name, select_record_files};
