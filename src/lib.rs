//! Columnar document archive: an ingest model that decomposes JSON-shaped
//! documents into typed column buckets, a byte-aligned archive format for
//! those buckets, and a visitor-driven reader that walks the archive back
//! into decoded documents without ever materializing the whole thing in
//! memory at once.

/// Errors raised across the ingest, archive, and visitor layers.
pub mod error;
/// The closed set of primitive field types and their null sentinels.
pub mod field_type;
/// Object and string identifiers.
pub mod ids;
/// The (out-of-scope) parsed input tree and string dictionary seams.
pub mod json;
/// Visit mask bits controlling which property groups a traversal observes.
pub mod mask;
/// Positioned, byte-oriented reads over an owned/borrowed byte block.
pub mod memfile;

/// The columnar intermediate model: ingest, inference, and read-optimized
/// sorting.
pub mod cim;
/// The byte-aligned archive format: object headers, value vectors, and the
/// object-array collection iterator chain.
pub mod archive;
/// The visitor-driven traversal layer: callback trait, path stack, driver.
pub mod visitor;
/// Rematerializes decoded documents by driving a visitor over an archive.
pub mod converter;

pub use crate::archive::Archive;
pub use crate::converter::{convert_to_document, DecodedDocument, DecodedObject, DecodedValue};
pub use crate::error::{Error, Result};
pub use crate::ids::{ObjectId, StringId};
pub use crate::mask::PropertyMask;
