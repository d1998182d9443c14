//! The visitor driver: walks an archive from object offset 0, maintaining
//! a path stack and honoring each callback's [`VisitPolicy`] before
//! descending.
//!
//! Grounded on `original_source/src/include/core/carbon/archive_visitor.h`'s
//! driving loop (implied by the callback table's shape, not present in the
//! retrieved header itself) plus `archive_iter.h`'s traversal primitives.
//! The source's path-stack bracketing around object-array drill-down is
//! asymmetric in places; this driver instead pushes exactly once per
//! descended level and relies on [`super::path::PathGuard`] to pop it on
//! every exit path.

use crate::archive::{open_object, ArchiveObject, Payload, PropIterState};
use crate::error::ArchiveError;
use crate::field_type::FieldType;
use crate::ids::ObjectId;
use crate::mask::PropertyMask;

use super::callbacks::{ArrayEntry, ScalarColumn, VisitPolicy, VisitorCallbacks};
use super::path::Path;

/// Runs `callbacks` over the archive in `buffer`, starting at the root
/// object (record-table offset 0), observing only groups passing `mask`.
pub fn drive<V: VisitorCallbacks>(buffer: &[u8], mask: PropertyMask, callbacks: &mut V) -> Result<(), ArchiveError> {
    let path = Path::new();
    callbacks.before_visit_starts();
    let root = open_object(buffer, 0)?;
    callbacks.visit_root_object(root.object_id);
    walk_object(buffer, mask, &root, &path, callbacks)?;
    callbacks.after_visit_ends();
    Ok(())
}

/// Visits one object's property groups. The caller is responsible for the
/// `before_object_visit`/`after_object_visit` gating around non-root
/// objects; this function assumes that gate already passed.
fn walk_object<V: VisitorCallbacks>(
    buffer: &[u8],
    mask: PropertyMask,
    object: &ArchiveObject,
    path: &Path,
    callbacks: &mut V,
) -> Result<(), ArchiveError> {
    let mut iter = crate::archive::PropIter::new(buffer, *object, mask);

    let mut first = true;
    while let Some(step) = iter.next() {
        let (state, payload) = step?;
        let (field_type, is_array) = match state {
            PropIterState::Object(t) => (t, false),
            PropIterState::Array(t) => (t, true),
            PropIterState::ObjectArrays => (FieldType::Object, true),
            PropIterState::Init | PropIterState::Done => unreachable!("iterator never yields these"),
        };
        if first {
            callbacks.first_prop_type_group(path, object.object_id, field_type, is_array);
            first = false;
        } else {
            callbacks.next_prop_type_group(path, object.object_id, field_type, is_array);
        }

        match payload {
            Payload::Object(vector) if !vector.is_array() && vector.base_type() == FieldType::Object => {
                visit_object_scalars(buffer, mask, &vector, path, callbacks)?;
            }
            Payload::Object(vector) if !vector.is_array() => {
                visit_scalar_group(&vector, path, callbacks)?;
            }
            Payload::Object(vector) => {
                visit_array_group(&vector, path, callbacks)?;
            }
            Payload::Collection(collection) => {
                visit_object_arrays(buffer, mask, object.object_id, collection, path, callbacks)?;
            }
        }
    }
    Ok(())
}

fn visit_object_scalars<V: VisitorCallbacks>(
    buffer: &[u8],
    mask: PropertyMask,
    vector: &crate::archive::ValueVector<'_>,
    path: &Path,
    callbacks: &mut V,
) -> Result<(), ArchiveError> {
    let keys = vector.keys();
    for (i, key) in keys.iter().enumerate() {
        let child = vector.object_at(i)?;
        let guard = path.push(*key, None);
        callbacks.visit_object_property(path, vector.object_id(), *key, child.object_id);
        if callbacks.before_object_visit(path, child.object_id) == VisitPolicy::Include {
            walk_object(buffer, mask, &child, path, callbacks)?;
            callbacks.after_object_visit(path, child.object_id);
        }
        drop(guard);
    }
    Ok(())
}

fn visit_scalar_group<V: VisitorCallbacks>(
    vector: &crate::archive::ValueVector<'_>,
    path: &Path,
    callbacks: &mut V,
) -> Result<(), ArchiveError> {
    let keys = vector.keys();
    let column = match vector.base_type() {
        FieldType::Null => ScalarColumn::Null,
        FieldType::Bool => ScalarColumn::Bool(vector.as_primitives_bool()?),
        FieldType::I8 => ScalarColumn::I8(vector.as_primitives_i8()?),
        FieldType::I16 => ScalarColumn::I16(vector.as_primitives_i16()?),
        FieldType::I32 => ScalarColumn::I32(vector.as_primitives_i32()?),
        FieldType::I64 => ScalarColumn::I64(vector.as_primitives_i64()?),
        FieldType::U8 => ScalarColumn::U8(vector.as_primitives_u8()?),
        FieldType::U16 => ScalarColumn::U16(vector.as_primitives_u16()?),
        FieldType::U32 => ScalarColumn::U32(vector.as_primitives_u32()?),
        FieldType::U64 => ScalarColumn::U64(vector.as_primitives_u64()?),
        FieldType::F32 => ScalarColumn::F32(vector.as_primitives_f32()?),
        FieldType::String => ScalarColumn::StringId(vector.as_primitives_string_id()?),
        FieldType::Object => unreachable!("handled by visit_object_scalars"),
    };
    callbacks.visit_scalar_pairs(path, vector.object_id(), &keys, column);
    Ok(())
}

fn visit_array_group<V: VisitorCallbacks>(
    vector: &crate::archive::ValueVector<'_>,
    path: &Path,
    callbacks: &mut V,
) -> Result<(), ArchiveError> {
    let keys = vector.keys();
    let field_type = vector.base_type();
    callbacks.enter_array_pairs(path, vector.object_id(), field_type, &keys);
    for (i, key) in keys.iter().enumerate() {
        let guard = path.push(*key, None);
        let entry = read_array_entry(vector, field_type, i)?;
        callbacks.visit_array_pair(path, vector.object_id(), *key, i, entry);
        drop(guard);
    }
    callbacks.leave_array_pairs(path, vector.object_id(), field_type);
    Ok(())
}

fn read_array_entry(
    vector: &crate::archive::ValueVector<'_>,
    field_type: FieldType,
    i: usize,
) -> Result<ArrayEntry, ArchiveError> {
    Ok(match field_type {
        FieldType::Null => ArrayEntry::Null(vector.null_array_counts()?[i]),
        FieldType::Bool => ArrayEntry::Bool(vector.array_at_bool(i)?),
        FieldType::I8 => ArrayEntry::I8(vector.array_at_i8(i)?),
        FieldType::I16 => ArrayEntry::I16(vector.array_at_i16(i)?),
        FieldType::I32 => ArrayEntry::I32(vector.array_at_i32(i)?),
        FieldType::I64 => ArrayEntry::I64(vector.array_at_i64(i)?),
        FieldType::U8 => ArrayEntry::U8(vector.array_at_u8(i)?),
        FieldType::U16 => ArrayEntry::U16(vector.array_at_u16(i)?),
        FieldType::U32 => ArrayEntry::U32(vector.array_at_u32(i)?),
        FieldType::U64 => ArrayEntry::U64(vector.array_at_u64(i)?),
        FieldType::F32 => ArrayEntry::F32(vector.array_at_f32(i)?),
        FieldType::String => ArrayEntry::StringId(vector.array_at_string_id(i)?),
        FieldType::Object => unreachable!("object has no array bucket of its own"),
    })
}

fn visit_object_arrays<V: VisitorCallbacks>(
    buffer: &[u8],
    mask: PropertyMask,
    object_id: ObjectId,
    mut collection: crate::archive::CollectionIter<'_>,
    path: &Path,
    callbacks: &mut V,
) -> Result<(), ArchiveError> {
    while let Some(group) = collection.next_group() {
        let mut group = group?;
        let key = group.key();
        if callbacks.before_visit_object_array(path, object_id, key) == VisitPolicy::Exclude {
            continue;
        }
        let object_ids = group.object_ids().to_vec();
        let mut skip_mask = vec![false; object_ids.len()];
        callbacks.before_visit_object_array_objects(path, object_id, key, &object_ids, &mut skip_mask);

        let guard = path.push(key, None);
        while let Some(column) = group.next_column() {
            let mut column = column?;
            let (nested_key, field_type) = column.name_and_type();
            if callbacks.before_visit_object_array_object_property(path, object_id, key, nested_key, field_type)
                == VisitPolicy::Exclude
            {
                continue;
            }
            if !callbacks.get_column_entry_count(path, object_id, nested_key, column.len()) {
                continue;
            }
            let positions = column.entry_positions().to_vec();
            for &position in &positions {
                let Some(entry) = column.next_entry() else { break };
                let entry = entry?;
                if skip_mask.get(position as usize).copied().unwrap_or(false) {
                    continue;
                }
                if field_type == FieldType::Object {
                    for child in entry.object_iter()? {
                        let child = child?;
                        callbacks.before_object_array_object_property_object(
                            path,
                            object_id,
                            key,
                            nested_key,
                            position,
                            child.object_id,
                        );
                        if callbacks.before_object_visit(path, child.object_id) == VisitPolicy::Include {
                            walk_object(buffer, mask, &child, path, callbacks)?;
                            callbacks.after_object_visit(path, child.object_id);
                        }
                    }
                } else {
                    let array_entry = entry_to_array_entry(&entry)?;
                    callbacks.visit_object_array_prop(path, object_id, key, nested_key, position, array_entry);
                }
            }
        }
        drop(guard);
    }
    Ok(())
}

fn entry_to_array_entry(entry: &crate::archive::EntryIter<'_>) -> Result<ArrayEntry, ArchiveError> {
    Ok(match entry.field_type() {
        FieldType::Null => ArrayEntry::Null(entry.as_null_count()?),
        FieldType::Bool => ArrayEntry::Bool(entry.as_bool()?.1),
        FieldType::I8 => ArrayEntry::I8(entry.as_i8()?.1),
        FieldType::I16 => ArrayEntry::I16(entry.as_i16()?.1),
        FieldType::I32 => ArrayEntry::I32(entry.as_i32()?.1),
        FieldType::I64 => ArrayEntry::I64(entry.as_i64()?.1),
        FieldType::U8 => ArrayEntry::U8(entry.as_u8()?.1),
        FieldType::U16 => ArrayEntry::U16(entry.as_u16()?.1),
        FieldType::U32 => ArrayEntry::U32(entry.as_u32()?.1),
        FieldType::U64 => ArrayEntry::U64(entry.as_u64()?.1),
        FieldType::F32 => ArrayEntry::F32(entry.as_f32()?.1),
        FieldType::String => ArrayEntry::StringId(entry.as_string_id()?.1),
        FieldType::Object => unreachable!("handled by the object-chain branch"),
    })
}
