use anyhow::{Context, Result, anyhow};
use clap::Parser;
use playerdata_relocator::{BatchRequest, BatchResult, Destination, PRIMARY_DIMENSION, run_batch};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playerdata-relocator")]
#[command(about = "Move players out of reset dimensions in an offline world's playerdata folder")]
#[command(
    override_usage = "playerdata-relocator -f <PLAYER_DATA_FOLDER> -c <X> <Y> <Z> -d <TARGET_DIMENSIONS>..."
)]
pub struct Cli {
    /// Player data folder location. Typically world/playerdata
    #[arg(short = 'f', long, value_name = "DIR")]
    pub player_data_folder: PathBuf,

    /// Destination block coordinates
    #[arg(
        short = 'c',
        long,
        num_args = 3,
        required = true,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true
    )]
    pub coords: Vec<i32>,

    /// The dimension(s) players are moved out of
    #[arg(
        short = 'd',
        long,
        num_args = 1..,
        value_delimiter = ',',
        required = true,
        allow_negative_numbers = true
    )]
    pub target_dimensions: Vec<i32>,

    /// The spawn dimension id players are moved into. Default is 0 (Overworld)
    #[arg(long, default_value_t = PRIMARY_DIMENSION, allow_negative_numbers = true)]
    pub spawn_dimension: i32,

    /// Run without editing player data
    #[arg(long)]
    pub dry_run: bool,

    /// Allow the spawn dimension to also be a target dimension
    #[arg(long)]
    pub yes_teleport_players_in_spawn_dimension: bool,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn request(&self) -> Result<BatchRequest> {
        let [x, y, z] = <[i32; 3]>::try_from(self.coords.as_slice())
            .map_err(|_| anyhow!("Expected 3 coordinates, got {}", self.coords.len()))?
            .map(f64::from);
        Ok(BatchRequest::new(
            &self.player_data_folder,
            self.target_dimensions.iter().copied(),
            Destination::new(x, y, z).in_dimension(self.spawn_dimension),
        )
        .dry_run(self.dry_run)
        .allow_destination_in_targets(self.yes_teleport_players_in_spawn_dimension))
    }
}

pub struct App {
    cli: Cli,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn from_args() -> Self {
        Self::new(Cli::parse())
    }

    pub fn run(&self) -> Result<()> {
        let request = self.cli.request()?;
        let result = run_batch(&request).context("Relocation did not start")?;

        if self.cli.json {
            let json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize relocation result")?;
            println!("{}", json);
        } else {
            print_summary(&result);
        }
        Ok(())
    }
}

fn print_summary(result: &BatchResult) {
    let verb = if result.dry_run { "Would relocate" } else { "Relocated" };
    println!("Player data files found: {}", result.discovered);
    println!("{}: {}", verb, result.relocated);
    println!("Not in a target dimension: {}", result.ineligible);

    if let Some(dir) = &result.backup_dir {
        println!("Backups: {}", dir.display());
    }

    if result.failures.is_empty() {
        return;
    }

    println!("Failures: {}", result.failed());
    for failure in &result.failures {
        println!(
            "- {} ({}) -> {}",
            failure.file_name(),
            failure.kind.label(),
            failure.reason
        );
    }

    let manual: Vec<_> = result.needs_manual_recovery().collect();
    if !manual.is_empty() {
        println!("Needs manual recovery from backup:");
        for failure in manual {
            match &failure.backup {
                Some(backup) => println!("- {} <- {}", failure.path.display(), backup.display()),
                None => println!("- {}", failure.path.display()),
            }
        }
    }
}
