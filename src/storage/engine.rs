use super::overwrite::replace_file;
use std::fs;
use std::io;
use std::path::Path;

/// Record store trait - where the batch reads originals and writes results
pub trait RecordStore {
    /// Read the full contents of a record file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace a record file with new contents
    fn replace(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Files on the local filesystem, replaced atomically
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl RecordStore for LocalStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn replace(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        replace_file(path, bytes)
    }
}
