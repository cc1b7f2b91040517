//! Player record view and the relocation transform

use crate::core::{BatchRequest, Destination, NbtError, RecordError};
use crate::nbt::{self, Compound, Document, List, Tag, TagKind};

pub const DIMENSION: &str = "Dimension";
pub const POSITION: &str = "Pos";
pub const MOTION: &str = "Motion";
pub const FALL_DISTANCE: &str = "FallDistance";

type Result<T> = std::result::Result<T, RecordError>;

/// One decoded `<uuid>.dat` file
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    document: Document,
}

impl PlayerRecord {
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, NbtError> {
        nbt::decode(bytes).map(Self::from_document)
    }

    pub fn encode(&self) -> std::result::Result<Vec<u8>, NbtError> {
        nbt::encode(&self.document)
    }

    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn root(&self) -> &Compound {
        &self.document.root
    }

    pub fn dimension(&self) -> Result<i32> {
        match self.root().get(DIMENSION) {
            Some(Tag::Int(dimension)) => Ok(*dimension),
            Some(other) => Err(RecordError::WrongType {
                field: DIMENSION,
                expected: TagKind::Int.type_name(),
                found: other.type_name(),
            }),
            None => Err(RecordError::MissingField(DIMENSION)),
        }
    }

    pub fn position(&self) -> Result<[f64; 3]> {
        read_triple(triple(self.root(), POSITION, &[TagKind::Double])?)
    }

    pub fn motion(&self) -> Result<[f64; 3]> {
        read_triple(triple(self.root(), MOTION, FLOATING)?)
    }

    pub fn fall_distance(&self) -> Option<f64> {
        self.root().get(FALL_DISTANCE).and_then(Tag::as_f64)
    }
}

const FLOATING: &[TagKind] = &[TagKind::Double, TagKind::Float];

/// Looks up a three-element list whose elements are one of `allowed`
fn triple<'a>(root: &'a Compound, field: &'static str, allowed: &[TagKind]) -> Result<&'a List> {
    let tag = root.get(field).ok_or(RecordError::MissingField(field))?;
    let list = tag.as_list().ok_or(RecordError::WrongType {
        field,
        expected: TagKind::List.type_name(),
        found: tag.type_name(),
    })?;
    if list.len() != 3 {
        return Err(RecordError::WrongArity {
            field,
            expected: 3,
            found: list.len(),
        });
    }
    if !allowed.contains(&list.element_kind()) {
        return Err(RecordError::WrongType {
            field,
            expected: allowed[0].type_name(),
            found: list.element_kind().type_name(),
        });
    }
    Ok(list)
}

fn read_triple(list: &List) -> Result<[f64; 3]> {
    let mut out = [0.0; 3];
    for (slot, tag) in out.iter_mut().zip(list.iter()) {
        *slot = tag.as_f64().unwrap_or_default();
    }
    Ok(out)
}

fn floating(kind: TagKind, value: f64) -> Tag {
    match kind {
        TagKind::Float => Tag::Float(value as f32),
        _ => Tag::Double(value),
    }
}

fn write_triple(root: &mut Compound, field: &'static str, values: [f64; 3]) -> Result<()> {
    let list = root
        .get_list_mut(field)
        .ok_or(RecordError::MissingField(field))?;
    let kind = list.element_kind();
    for (index, value) in values.into_iter().enumerate() {
        list.set(index, floating(kind, value));
    }
    Ok(())
}

/// Result of weighing one record against a request
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Not in a target dimension; the record must not be written back
    Ineligible { dimension: i32 },
    /// Relocated in memory and ready to be backed up and written
    Relocate(PlayerRecord),
    /// Would be relocated, but the run is a dry run
    DryRun(PlayerRecord),
}

pub fn is_eligible(record: &PlayerRecord, request: &BatchRequest) -> Result<bool> {
    Ok(request.is_target(record.dimension()?))
}

/// Moves the record to `destination`, zeroing fall distance and motion.
///
/// Every touched field is checked before the first write, so an error leaves
/// nothing half-applied. Fields other than the four above are not read.
pub fn relocate(record: PlayerRecord, destination: &Destination) -> Result<PlayerRecord> {
    record.dimension()?;
    triple(record.root(), POSITION, &[TagKind::Double])?;
    triple(record.root(), MOTION, FLOATING)?;
    let fall_kind = match record.root().get(FALL_DISTANCE) {
        None | Some(Tag::Float(_)) => TagKind::Float,
        Some(Tag::Double(_)) => TagKind::Double,
        Some(other) => {
            return Err(RecordError::WrongType {
                field: FALL_DISTANCE,
                expected: TagKind::Float.type_name(),
                found: other.type_name(),
            });
        }
    };

    let mut document = record.into_document();
    let root = &mut document.root;
    root.insert(DIMENSION, Tag::Int(destination.dimension));
    write_triple(root, POSITION, destination.coords())?;
    root.insert(FALL_DISTANCE, floating(fall_kind, 0.0));
    write_triple(root, MOTION, [0.0; 3])?;

    Ok(PlayerRecord::from_document(document))
}

/// Decides what the batch does with `record`; pure in (record, request)
pub fn decide(record: PlayerRecord, request: &BatchRequest) -> Result<Decision> {
    let dimension = record.dimension()?;
    if !request.is_target(dimension) {
        return Ok(Decision::Ineligible { dimension });
    }

    let relocated = relocate(record, &request.destination)?;
    if request.dry_run {
        Ok(Decision::DryRun(relocated))
    } else {
        Ok(Decision::Relocate(relocated))
    }
}
