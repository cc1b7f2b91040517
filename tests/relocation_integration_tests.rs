//! End-to-end batch runs against a temporary player data folder

use chrono::{NaiveDate, NaiveDateTime};
use playerdata_relocator::core::ConfigError;
use playerdata_relocator::nbt::{Compound, Compression, Document, List, NbtString, Tag, codec};
use playerdata_relocator::storage::{LocalStore, RecordStore};
use playerdata_relocator::{
    BatchRequest, BatchRunner, Destination, FailureKind, FileOutcome, PlayerRecord, run_batch,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ALICE: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";
const BOB: &str = "853c80ef-3c37-49fd-aa49-938b674adae6";
const CAROL: &str = "61699b2e-d327-4a01-9f1e-0ea8c3f06bc6";

struct World {
    _temp: TempDir,
    playerdata: PathBuf,
}

impl World {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let playerdata = temp.path().join("world").join("playerdata");
        fs::create_dir_all(&playerdata).unwrap();
        Self {
            _temp: temp,
            playerdata,
        }
    }

    fn add_player(&self, uuid: &str, dimension: i32) -> PathBuf {
        let path = self.file(uuid);
        fs::write(&path, player_bytes(dimension)).unwrap();
        path
    }

    fn file(&self, uuid: &str) -> PathBuf {
        self.playerdata.join(format!("{}.dat", uuid))
    }

    fn backup_root(&self) -> PathBuf {
        self.playerdata.parent().unwrap().join("teleporter_backups")
    }
}

fn started() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn doubles(values: [f64; 3]) -> Tag {
    Tag::List(List::from_tags(values.into_iter().map(Tag::Double).collect()).unwrap())
}

fn player_root(dimension: i32) -> Compound {
    let mut inventory = List::new(playerdata_relocator::nbt::TagKind::Compound);
    let mut slot = Compound::new();
    slot.insert("id", Tag::String(NbtString::from("minecraft:diamond_sword")));
    slot.insert("Slot", Tag::Byte(0));
    inventory.push(Tag::Compound(slot));

    let mut root = Compound::new();
    root.insert("DataVersion", Tag::Int(1343));
    root.insert("Dimension", Tag::Int(dimension));
    root.insert("Pos", doubles([512.5, 12.0, -933.75]));
    root.insert("Motion", doubles([0.1, -0.9, 0.0]));
    root.insert("FallDistance", Tag::Float(42.0));
    root.insert("Health", Tag::Float(14.5));
    root.insert("Inventory", Tag::List(inventory));
    root.insert("UUIDMost", Tag::Long(-6_322_552_268_536_499_432));
    root
}

fn player_bytes(dimension: i32) -> Vec<u8> {
    codec::encode(&Document::new(player_root(dimension), Compression::Gzip)).unwrap()
}

fn read_player(path: &Path) -> PlayerRecord {
    PlayerRecord::decode(&fs::read(path).unwrap()).unwrap()
}

/// Encoded root without the four relocated fields
fn untouched_fields(record: &PlayerRecord) -> Vec<u8> {
    let mut rest = record.document().root.clone();
    for field in ["Dimension", "Pos", "Motion", "FallDistance"] {
        rest.remove(field);
    }
    codec::encode_uncompressed(&NbtString::default(), &rest).unwrap()
}

fn request(world: &World, targets: &[i32]) -> BatchRequest {
    BatchRequest::new(
        &world.playerdata,
        targets.iter().copied(),
        Destination::new(100.0, 64.0, 100.0),
    )
}

#[test]
fn test_relocates_only_target_dimensions() {
    let world = World::new();
    let nether = world.add_player(ALICE, 1);
    let end = world.add_player(BOB, 2);
    let overworld = world.add_player(CAROL, 0);
    let originals: Vec<Vec<u8>> = [&nether, &end, &overworld]
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();

    let req = request(&world, &[1, 2]);
    req.validate().unwrap();
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.discovered, 3);
    assert_eq!(result.relocated, 2);
    assert_eq!(result.ineligible, 1);
    assert_eq!(result.skipped(), 1);
    assert!(result.failures.is_empty());

    let backup_dir = world.backup_root().join("2024-06-01-12-00-00");
    assert_eq!(result.backup_dir.as_deref(), Some(backup_dir.as_path()));
    assert_eq!(fs::read_dir(&backup_dir).unwrap().count(), 2);

    for (path, original) in [(&nether, &originals[0]), (&end, &originals[1])] {
        let backup = backup_dir.join(path.file_name().unwrap());
        assert_eq!(&fs::read(backup).unwrap(), original);

        let before = PlayerRecord::decode(original).unwrap();
        let after = read_player(path);
        assert_eq!(after.dimension().unwrap(), 0);
        assert_eq!(after.position().unwrap(), [100.0, 64.0, 100.0]);
        assert_eq!(after.motion().unwrap(), [0.0, 0.0, 0.0]);
        assert_eq!(after.fall_distance(), Some(0.0));
        assert_eq!(untouched_fields(&before), untouched_fields(&after));
        assert_eq!(after.document().compression, Compression::Gzip);
    }

    assert_eq!(fs::read(&overworld).unwrap(), originals[2]);
}

#[test]
fn test_stray_files_are_never_selected() {
    let world = World::new();
    world.add_player(ALICE, 1);
    fs::write(world.playerdata.join("notes.txt"), b"remember to reset the end").unwrap();
    fs::write(world.playerdata.join(format!("{}.dat_old", BOB)), player_bytes(1)).unwrap();
    let simple = world.playerdata.join(format!("{}.dat", BOB.replace('-', "")));
    let braced = world.playerdata.join(format!("{{{}}}.dat", CAROL));
    fs::write(&simple, player_bytes(1)).unwrap();
    fs::write(&braced, player_bytes(1)).unwrap();

    let req = request(&world, &[1]);
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.discovered, 1);
    assert_eq!(result.relocated, 1);
    assert!(result.failures.iter().all(|f| !f.path.ends_with("notes.txt")));
    assert_eq!(
        fs::read(world.playerdata.join(format!("{}.dat_old", BOB))).unwrap(),
        player_bytes(1)
    );
    assert_eq!(fs::read(&simple).unwrap(), player_bytes(1));
    assert_eq!(fs::read(&braced).unwrap(), player_bytes(1));
}

#[test]
fn test_destination_in_targets_is_a_config_error() {
    let world = World::new();
    let path = world.add_player(ALICE, 0);
    let original = fs::read(&path).unwrap();

    let req = request(&world, &[0, 1]);
    let err = run_batch(&req).unwrap_err();

    assert!(matches!(err, ConfigError::DestinationInTargets(0)));
    assert_eq!(fs::read(&path).unwrap(), original);
    assert!(!world.backup_root().exists());
}

#[test]
fn test_override_allows_destination_in_targets() {
    let world = World::new();
    let path = world.add_player(ALICE, 0);

    let req = request(&world, &[0]).allow_destination_in_targets(true);
    req.validate().unwrap();
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.relocated, 1);
    assert_eq!(read_player(&path).position().unwrap(), [100.0, 64.0, 100.0]);
}

#[test]
fn test_missing_source_is_a_config_error() {
    let world = World::new();
    let req = BatchRequest::new(
        world.playerdata.join("missing"),
        [1],
        Destination::new(0.0, 64.0, 0.0),
    );
    assert!(matches!(run_batch(&req), Err(ConfigError::SourceMissing(_))));
}

#[test]
fn test_second_run_is_a_no_op() {
    let world = World::new();
    let path = world.add_player(ALICE, -1);
    let req = request(&world, &[-1]);

    let first = run_batch(&req).unwrap();
    assert_eq!(first.relocated, 1);
    let after_first = fs::read(&path).unwrap();

    let second = run_batch(&req).unwrap();
    assert_eq!(second.relocated, 0);
    assert_eq!(second.ineligible, 1);
    assert!(second.backup_dir.is_none());
    assert_eq!(fs::read(&path).unwrap(), after_first);
}

#[test]
fn test_dry_run_changes_nothing() {
    let world = World::new();
    let paths = [
        world.add_player(ALICE, 1),
        world.add_player(BOB, 2),
        world.add_player(CAROL, 0),
    ];
    let originals: Vec<Vec<u8>> = paths.iter().map(|p| fs::read(p).unwrap()).collect();

    let dry = request(&world, &[1, 2]).dry_run(true);
    let result = run_batch(&dry).unwrap();

    assert!(result.dry_run);
    assert_eq!(result.relocated, 2);
    assert!(result.backup_dir.is_none());
    assert!(!world.backup_root().exists());
    for (path, original) in paths.iter().zip(&originals) {
        assert_eq!(&fs::read(path).unwrap(), original);
    }

    let real = run_batch(&request(&world, &[1, 2])).unwrap();
    assert_eq!(real.relocated, result.relocated);
}

#[test]
fn test_undecodable_file_does_not_stop_the_batch() {
    let world = World::new();
    let broken = world.file(ALICE);
    fs::write(&broken, b"\x1f\x8bdefinitely not gzip").unwrap();
    let empty = world.file(CAROL);
    fs::write(&empty, b"").unwrap();
    let good = world.add_player(BOB, 1);

    let req = request(&world, &[1]);
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.discovered, 3);
    assert_eq!(result.relocated, 1);
    assert_eq!(result.failed(), 2);
    assert!(result.failures.iter().all(|f| f.kind == FailureKind::Unreadable));
    assert!(result.failures.iter().all(|f| f.backup.is_none()));
    assert_eq!(fs::read(&broken).unwrap(), b"\x1f\x8bdefinitely not gzip");
    assert_eq!(read_player(&good).dimension().unwrap(), 0);
}

#[test]
fn test_records_the_codec_cannot_reproduce_are_left_untouched() {
    let world = World::new();

    // Eligible record whose root repeats "Health"
    let mut repeated = codec::encode_uncompressed(&NbtString::default(), &player_root(1)).unwrap();
    repeated.pop();
    repeated.extend_from_slice(&[5, 0, 6]);
    repeated.extend_from_slice(b"Health");
    repeated.extend_from_slice(&1.0f32.to_bits().to_be_bytes());
    repeated.push(0);
    let duplicate = world.file(ALICE);
    fs::write(&duplicate, &repeated).unwrap();

    let mut padded = codec::encode(&Document::new(player_root(1), Compression::None)).unwrap();
    padded.extend_from_slice(&[0, 0, 0]);
    let trailing = world.file(BOB);
    fs::write(&trailing, &padded).unwrap();

    let req = request(&world, &[1]);
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.relocated, 0);
    assert_eq!(result.failed(), 2);
    assert!(result.failures.iter().all(|f| f.kind == FailureKind::Unreadable));
    assert_eq!(fs::read(&duplicate).unwrap(), repeated);
    assert_eq!(fs::read(&trailing).unwrap(), padded);
    assert!(!world.backup_root().exists());
}

#[test]
fn test_malformed_record_is_left_untouched() {
    let world = World::new();
    let path = world.file(ALICE);
    let mut root = Compound::new();
    root.insert("Dimension", Tag::Int(1));
    root.insert("Pos", doubles([1.0, 2.0, 3.0]));
    let bytes = codec::encode(&Document::new(root, Compression::Gzip)).unwrap();
    fs::write(&path, &bytes).unwrap();

    let req = request(&world, &[1]);
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.relocated, 0);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].kind, FailureKind::Unreadable);
    assert!(result.failures[0].reason.contains("Motion"));
    assert_eq!(fs::read(&path).unwrap(), bytes);
    assert!(result.backup_dir.is_none());
}

#[test]
fn test_backup_failure_leaves_original_untouched() {
    let world = World::new();
    let path = world.add_player(ALICE, 1);
    let original = fs::read(&path).unwrap();
    // A plain file where the backup folder must go
    fs::write(world.backup_root(), b"in the way").unwrap();

    let req = request(&world, &[1]);
    let result = BatchRunner::new(&req, started()).run().unwrap();

    assert_eq!(result.relocated, 0);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].kind, FailureKind::BackupFailed);
    assert!(!result.failures[0].kind.needs_manual_recovery());
    assert_eq!(fs::read(&path).unwrap(), original);
}

/// Reads from disk but refuses every write
struct ReadOnlyStore;

impl RecordStore for ReadOnlyStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        LocalStore.read(path)
    }

    fn replace(&self, _path: &Path, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

#[test]
fn test_write_failure_is_flagged_for_manual_recovery() {
    let world = World::new();
    let path = world.add_player(ALICE, 1);
    let original = fs::read(&path).unwrap();
    world.add_player(BOB, 0);

    let req = request(&world, &[1]);
    let result = BatchRunner::with_store(&req, started(), ReadOnlyStore)
        .run()
        .unwrap();

    assert_eq!(result.relocated, 0);
    assert_eq!(result.ineligible, 1);
    let manual: Vec<_> = result.needs_manual_recovery().collect();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].kind, FailureKind::WriteFailed);
    assert!(manual[0].reason.contains("disk full"));

    let backup = manual[0].backup.clone().unwrap();
    assert_eq!(fs::read(backup).unwrap(), original);
}

#[test]
fn test_process_file_reports_each_outcome() {
    let world = World::new();
    let eligible = world.add_player(ALICE, 1);
    let other = world.add_player(BOB, 5);

    let req = request(&world, &[1]);
    let mut runner = BatchRunner::new(&req, started());

    assert_eq!(
        runner.process_file(&other),
        FileOutcome::Ineligible { dimension: 5 }
    );
    assert!(!runner.backups().is_created());

    match runner.process_file(&eligible) {
        FileOutcome::Relocated { backup } => {
            assert_eq!(backup, runner.backups().dir().join(format!("{}.dat", ALICE)));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_result_serializes_to_json() {
    let world = World::new();
    world.add_player(ALICE, 1);
    fs::write(world.file(BOB), b"junk").unwrap();

    let req = request(&world, &[1]);
    let result = BatchRunner::new(&req, started()).run().unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["discovered"], 2);
    assert_eq!(json["relocated"], 1);
    assert_eq!(json["failures"][0]["kind"], "unreadable");
    assert_eq!(json["dry_run"], false);
}
