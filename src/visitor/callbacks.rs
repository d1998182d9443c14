//! The visitor capability bundle.
//!
//! Grounded on `original_source/src/include/core/carbon/archive_visitor.h`'s
//! `struct archive_visitor` callback table. The original generates one
//! scalar-visit and one five-callback array bracket per primitive type via
//! `DEFINE_VISIT_BASIC_TYPE_PAIRS`/`DEFINE_VISIT_ARRAY_TYPE_PAIRS` macros;
//! here the scalar and array families collapse into one generic method
//! each, dispatching on [`crate::field_type::FieldType`] rather than one
//! method per type. Every method defaults to a no-op / `Include`, matching
//! the original's capability-bundle design: each callback is optional,
//! and its absence is a no-op.

use crate::field_type::FieldType;
use crate::ids::{ObjectId, StringId};

use super::path::Path;

/// Controls whether the driver descends into the subtree a callback
/// guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitPolicy {
    Include,
    Exclude,
}

/// A primitive scalar property group's keys + values, one entry per key.
/// `Null` carries no per-key payload beyond the key itself.
///
/// Owns its payload rather than borrowing from the archive block: every
/// value vector accessor already decodes into a fresh `Vec` (this crate
/// has no reinterpret-cast dependency to borrow typed slices directly out
/// of little-endian bytes), so a callback-scoped borrow would only be
/// borrowing from a temporary anyway.
#[derive(Debug, Clone)]
pub enum ScalarColumn {
    Null,
    Bool(Vec<bool>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    StringId(Vec<StringId>),
}

/// One primitive array property group's `i`-th entry.
#[derive(Debug, Clone)]
pub enum ArrayEntry {
    Null(u32),
    Bool(Vec<bool>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    StringId(Vec<StringId>),
}

/// Capability bundle invoked by [`super::driver::VisitorDriver`] while
/// walking an archive. Every method defaults to a no-op (or `Include`),
/// so implementors override only the callbacks they care about.
#[allow(unused_variables)]
pub trait VisitorCallbacks {
    fn before_visit_starts(&mut self) {}
    fn after_visit_ends(&mut self) {}

    fn visit_root_object(&mut self, object_id: ObjectId) {}

    fn before_object_visit(&mut self, path: &Path, object_id: ObjectId) -> VisitPolicy {
        VisitPolicy::Include
    }
    fn after_object_visit(&mut self, path: &Path, object_id: ObjectId) {}

    fn first_prop_type_group(&mut self, path: &Path, object_id: ObjectId, field_type: FieldType, is_array: bool) {}
    fn next_prop_type_group(&mut self, path: &Path, object_id: ObjectId, field_type: FieldType, is_array: bool) {}

    /// One scalar property group: `keys[i]` paired with `values[i]`.
    fn visit_scalar_pairs(&mut self, path: &Path, object_id: ObjectId, keys: &[StringId], values: ScalarColumn) {}

    /// A nested-object primitive property: `key` on `parent_id` refers to
    /// `child_id`.
    fn visit_object_property(&mut self, path: &Path, parent_id: ObjectId, key: StringId, child_id: ObjectId) {}

    fn enter_array_pairs(&mut self, path: &Path, object_id: ObjectId, field_type: FieldType, keys: &[StringId]) {}
    fn visit_array_pair(&mut self, path: &Path, object_id: ObjectId, key: StringId, index: usize, entry: ArrayEntry) {}
    fn leave_array_pairs(&mut self, path: &Path, object_id: ObjectId, field_type: FieldType) {}

    /// `before_visit_object_array → Exclude` skips the whole column group.
    fn before_visit_object_array(&mut self, path: &Path, object_id: ObjectId, key: StringId) -> VisitPolicy {
        VisitPolicy::Include
    }

    /// Receives a skip mask sized to `object_ids.len()`; marking an entry
    /// `true` suppresses that group-local object's column entries.
    fn before_visit_object_array_objects(
        &mut self,
        path: &Path,
        object_id: ObjectId,
        key: StringId,
        object_ids: &[ObjectId],
        skip_mask: &mut [bool],
    ) {
    }

    fn before_visit_object_array_object_property(
        &mut self,
        path: &Path,
        object_id: ObjectId,
        key: StringId,
        nested_key: StringId,
        field_type: FieldType,
    ) -> VisitPolicy {
        VisitPolicy::Include
    }

    /// Called once per nested object reached through an `object`-typed
    /// column entry's chain, before descending into it. `group_key` is
    /// the object-array property's own name; `position` is the
    /// group-local row this object belongs to.
    fn before_object_array_object_property_object(
        &mut self,
        path: &Path,
        group_object_id: ObjectId,
        group_key: StringId,
        nested_key: StringId,
        position: u32,
        child_id: ObjectId,
    ) {
    }

    /// Returning `false` aborts the entry loop for the current column.
    fn get_column_entry_count(&mut self, path: &Path, object_id: ObjectId, nested_key: StringId, count: usize) -> bool {
        true
    }

    /// One non-object column entry contributed by group-local object
    /// `contributor_index`.
    fn visit_object_array_prop(
        &mut self,
        path: &Path,
        object_id: ObjectId,
        key: StringId,
        nested_key: StringId,
        contributor_index: u32,
        entry: ArrayEntry,
    ) {
    }
}
