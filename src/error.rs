//! Error taxonomy: one leaf enum per subsystem, manually implementing
//! `Display`/`Error` the way `llvm-bitcode`'s `bits::Error` and
//! `read::Error` do, plus one `thiserror`-derived umbrella at the crate's
//! public seams.

use std::{error, fmt};

/// Errors raised while walking a byte-oriented [`crate::memfile::Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemfileError {
    BufferOverflow,
    SeekFailed,
    SkipFailed,
    Unaligned,
}

impl fmt::Display for MemfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BufferOverflow => "buffer overflow",
            Self::SeekFailed => "seek past end of buffer",
            Self::SkipFailed => "skip past end of buffer",
            Self::Unaligned => "unaligned read",
        })
    }
}

impl error::Error for MemfileError {}

/// Errors raised while building or sorting the columnar intermediate model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CimError {
    /// A JSON construct with no representable field type was encountered.
    NoType,
    /// An array mixed two or more incompatible non-null JSON types.
    MixedArrayTypes,
    /// An array contained a nested array, which is not representable.
    MixedArrayOrArrayOfArrays,
    /// The document root was neither an object nor an array of objects.
    JsonTypeUnsupportedAtRoot,
    /// The input tree ended where a token was still expected.
    NoJsonToken,
}

impl fmt::Display for CimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoType => "unsupported JSON construct has no field type",
            Self::MixedArrayTypes => "array mixes incompatible non-null element types",
            Self::MixedArrayOrArrayOfArrays => "array of arrays is not representable",
            Self::JsonTypeUnsupportedAtRoot => "document root must be an object or array of objects",
            Self::NoJsonToken => "unexpected end of input tree",
        })
    }
}

impl error::Error for CimError {}

/// Errors raised while reading or traversing a serialized archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    CorruptedHeader,
    MarkerMismatch { expected: u8, found: u8 },
    NoSuchType(u8),
    InternalInvariant(&'static str),
    OutOfBounds { index: u32, len: u32 },
    TypeMismatch,
    IteratorNotInObjectMode,
    ValueIteratorOpenFailed,
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptedHeader => write!(f, "corrupted object header"),
            Self::MarkerMismatch { expected, found } => {
                write!(f, "marker mismatch: expected 0x{expected:02x}, found 0x{found:02x}")
            }
            Self::NoSuchType(tag) => write!(f, "no such field type tag `{tag}`"),
            Self::InternalInvariant(what) => write!(f, "internal invariant violated: {what}"),
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::TypeMismatch => write!(f, "accessor type does not match property group type"),
            Self::IteratorNotInObjectMode => write!(f, "iterator is in collection mode, not object mode"),
            Self::ValueIteratorOpenFailed => write!(f, "failed to open value iterator for property group"),
        }
    }
}

impl error::Error for ArchiveError {}

impl From<MemfileError> for ArchiveError {
    fn from(err: MemfileError) -> Self {
        match err {
            MemfileError::BufferOverflow => ArchiveError::CorruptedHeader,
            MemfileError::SeekFailed | MemfileError::SkipFailed => ArchiveError::CorruptedHeader,
            MemfileError::Unaligned => ArchiveError::InternalInvariant("unaligned archive read"),
        }
    }
}

/// Crate-wide umbrella error used at public entry points
/// (`Archive::open`, `convert_to_document`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Memfile(#[from] MemfileError),
    #[error(transparent)]
    Cim(#[from] CimError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
