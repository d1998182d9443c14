//! The columnar intermediate model: ingest of a parsed JSON tree into
//! per-type key/value buckets, plus the read-optimized sort discipline.

pub mod builder;
pub mod model;
pub mod sort;

pub use builder::{ingest_document, IngestOptions};
pub use model::{ArrayBucket, ArrayValues, CimObject, Column, ColumnGroup, ColumnValues, Entry, PrimitiveBucket, PrimitiveValues, ScalarValue};
