use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems with a run's configuration, raised before any file is read
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least one target dimension is required")]
    NoTargetDimensions,

    #[error("Player data folder \"{}\" does not exist", .0.display())]
    SourceMissing(PathBuf),

    #[error("Player data path \"{}\" is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error(
        "Destination dimension {0} is also a target dimension. \
         Pass the override flag to relocate players already in it"
    )]
    DestinationInTargets(i32),

    #[error("Failed to list player data folder '{}': {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid coordinate {0}: must be a finite number")]
    InvalidCoordinate(f64),
}

/// Codec failures of the tagged record format
#[derive(Error, Debug)]
pub enum NbtError {
    #[error("Input is empty")]
    Empty,

    #[error("Unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("Unknown tag id {id} at offset {offset}")]
    UnknownTag { id: u8, offset: usize },

    #[error("Negative length {len} at offset {offset}")]
    NegativeLength { len: i32, offset: usize },

    #[error("Nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("List declares END elements but has length {0}")]
    InvalidEndList(usize),

    #[error("Root tag must be a compound, found {0}")]
    RootNotCompound(&'static str),

    #[error("Duplicate entry '{name}' at offset {offset}")]
    DuplicateEntry { name: String, offset: usize },

    #[error("{len} unexpected bytes after the root tag at offset {offset}")]
    TrailingData { offset: usize, len: usize },

    #[error("Value too large to encode: {0}")]
    TooLarge(String),

    #[error("Compression I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decodable record that lacks the fields relocation needs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Field '{field}' has type {found}, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field '{field}' has {found} elements, expected {expected}")]
    WrongArity {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to create backup directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup directory '{}' was not created", .0.display())]
    DirUnavailable(PathBuf),

    #[error("Source '{}' has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("Backup '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to write backup of '{}' to '{}': {source}", .from.display(), .to.display())]
    Write {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
