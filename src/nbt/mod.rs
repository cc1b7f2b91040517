//! Tagged binary tree format used by per-player save files

pub mod codec;
pub mod tag;

pub use codec::{Compression, Document, MAX_DEPTH, decode, encode};
pub use tag::{Compound, List, NbtString, Tag, TagKind};
