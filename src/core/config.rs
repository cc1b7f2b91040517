use super::error::{ConfigError, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::warn;

/// Dimension id players are sent to when none is given (the overworld)
pub const PRIMARY_DIMENSION: i32 = 0;

/// Folder created next to the player data folder to hold run backups
pub const BACKUP_ROOT_NAME: &str = "teleporter_backups";

/// Where relocated players end up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub dimension: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Destination {
    /// Coordinates in the primary dimension
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            dimension: PRIMARY_DIMENSION,
            x,
            y,
            z,
        }
    }

    pub fn in_dimension(mut self, dimension: i32) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Immutable configuration of one batch run
///
/// Built with chained setters; nothing touches the filesystem until
/// [`BatchRequest::validate`] is called.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Folder holding `<uuid>.dat` files
    pub source_dir: PathBuf,

    /// Dimensions whose players get relocated
    pub targets: BTreeSet<i32>,

    pub destination: Destination,

    /// Report what would change without writing anything
    pub dry_run: bool,

    /// Permit the destination dimension to be one of the targets
    pub allow_destination_in_targets: bool,
}

impl BatchRequest {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        targets: impl IntoIterator<Item = i32>,
        destination: Destination,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            targets: targets.into_iter().collect(),
            destination,
            dry_run: false,
            allow_destination_in_targets: false,
        }
    }

    /// Set the destination dimension
    pub fn destination_dimension(mut self, dimension: i32) -> Self {
        self.destination.dimension = dimension;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn allow_destination_in_targets(mut self, allow: bool) -> Self {
        self.allow_destination_in_targets = allow;
        self
    }

    pub fn is_target(&self, dimension: i32) -> bool {
        self.targets.contains(&dimension)
    }

    /// Checks the request before any file is read
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargetDimensions);
        }

        for coord in self.destination.coords() {
            if !coord.is_finite() {
                return Err(ConfigError::InvalidCoordinate(coord));
            }
        }

        if !self.source_dir.exists() {
            return Err(ConfigError::SourceMissing(self.source_dir.clone()));
        }
        if !self.source_dir.is_dir() {
            return Err(ConfigError::SourceNotDirectory(self.source_dir.clone()));
        }

        if self.is_target(self.destination.dimension) {
            if !self.allow_destination_in_targets {
                return Err(ConfigError::DestinationInTargets(
                    self.destination.dimension,
                ));
            }
            warn!(
                dimension = self.destination.dimension,
                "Relocating every player already in the destination dimension"
            );
        }

        Ok(())
    }

    /// Folder all backup sets of this source live under
    pub fn backup_root(&self) -> PathBuf {
        let base = self
            .source_dir
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(self.source_dir.as_path());
        base.join(BACKUP_ROOT_NAME)
    }
}
