//! Builds a small archive buffer by hand (no encoder exists in this
//! crate) exercising every traversal branch the converter needs: a scalar
//! primitive, a primitive array, a nested object, and an object-array
//! column group with more than one row.

use carchive::archive::collection::{COLUMN, COLUMN_GROUP, OBJECT_ARRAYS_GROUP};
use carchive::archive::object::OBJECT_BEGIN;
use carchive::archive::value_vector::{ARRAY_GROUP, FIXED_GROUP};
use carchive::field_type::{FieldType, PROPERTY_SLOT_COUNT};
use carchive::ids::ObjectId;
use carchive::visitor::path::Path;
use carchive::visitor::{drive, VisitPolicy, VisitorCallbacks};
use carchive::{convert_to_document, DecodedValue, PropertyMask};

const NAME_KEY: u64 = 101;
const SCORES_KEY: u64 = 102;
const META_KEY: u64 = 103;
const ENABLED_KEY: u64 = 104;
const ITEMS_KEY: u64 = 105;
const QTY_KEY: u64 = 106;
const NAME_STRING_ID: u64 = 900;

fn header_len() -> usize {
    1 + 8 + 4 + PROPERTY_SLOT_COUNT * 8 + 8
}

fn slot_of(field_type: FieldType, is_array: bool) -> usize {
    let idx = FieldType::ALL.iter().position(|t| *t == field_type).unwrap();
    if is_array {
        FieldType::ALL.len() + idx
    } else {
        idx
    }
}

fn encode_header(object_id: u64, offsets: &[u64; PROPERTY_SLOT_COUNT], next_obj_off: u64) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.push(OBJECT_BEGIN);
    bytes.extend_from_slice(&object_id.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    for offset in offsets {
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    bytes.extend_from_slice(&next_obj_off.to_le_bytes());
    bytes
}

fn encode_fixed_group(keys: &[u64], values: &[u8]) -> Vec<u8> {
    let mut bytes = vec![FIXED_GROUP];
    bytes.extend_from_slice(&(keys.len() as u32).to_le_bytes());
    for k in keys {
        bytes.extend_from_slice(&k.to_le_bytes());
    }
    bytes.extend_from_slice(values);
    bytes
}

fn encode_u32_array_group(key: u64, elements: &[u32]) -> Vec<u8> {
    let mut bytes = vec![ARRAY_GROUP];
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&key.to_le_bytes());
    bytes.extend_from_slice(&(elements.len() as u32).to_le_bytes());
    for e in elements {
        bytes.extend_from_slice(&e.to_le_bytes());
    }
    bytes
}

fn encode_u32_entry(values: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[test]
fn walks_scalars_arrays_nested_objects_and_object_array_columns() {
    let mut buffer = vec![0u8; header_len()];

    // name: scalar string property.
    let name_off = buffer.len() as u64;
    buffer.extend(encode_fixed_group(&[NAME_KEY], &NAME_STRING_ID.to_le_bytes()));

    // scores: array-of-u32 property with one key, 3 elements.
    let scores_off = buffer.len() as u64;
    buffer.extend(encode_u32_array_group(SCORES_KEY, &[10, 20, 30]));

    // meta: nested object with its own bool property.
    let meta_child_off = buffer.len() as u64;
    let enabled_off = meta_child_off + header_len() as u64;
    let mut meta_offsets = [0u64; PROPERTY_SLOT_COUNT];
    meta_offsets[slot_of(FieldType::Bool, false)] = enabled_off;
    buffer.extend(encode_header(2, &meta_offsets, 0));
    buffer.extend(encode_fixed_group(&[ENABLED_KEY], &[1u8]));

    let meta_off = buffer.len() as u64;
    buffer.extend(encode_fixed_group(&[META_KEY], &meta_child_off.to_le_bytes()));

    // items: one object-array column group, two contributing objects, one
    // u32 column with a 1-element and a 2-element entry.
    let entry0_off = {
        let placeholder = buffer.len() as u64;
        buffer.extend(encode_u32_entry(&[100]));
        placeholder
    };
    let entry1_off = {
        let placeholder = buffer.len() as u64;
        buffer.extend(encode_u32_entry(&[200, 201]));
        placeholder
    };
    let column_off = buffer.len() as u64;
    {
        let mut bytes = vec![COLUMN];
        bytes.extend_from_slice(&QTY_KEY.to_le_bytes());
        bytes.push(FieldType::U32 as u8);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&entry0_off.to_le_bytes());
        bytes.extend_from_slice(&entry1_off.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        buffer.extend(bytes);
    }
    let column_group_off = buffer.len() as u64;
    {
        let mut bytes = vec![COLUMN_GROUP];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&10u64.to_le_bytes());
        bytes.extend_from_slice(&11u64.to_le_bytes());
        bytes.extend_from_slice(&column_off.to_le_bytes());
        buffer.extend(bytes);
    }
    let items_off = buffer.len() as u64;
    {
        let mut bytes = vec![OBJECT_ARRAYS_GROUP];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&ITEMS_KEY.to_le_bytes());
        bytes.extend_from_slice(&column_group_off.to_le_bytes());
        buffer.extend(bytes);
    }

    let mut offsets = [0u64; PROPERTY_SLOT_COUNT];
    offsets[slot_of(FieldType::String, false)] = name_off;
    offsets[slot_of(FieldType::U32, true)] = scores_off;
    offsets[slot_of(FieldType::Object, false)] = meta_off;
    offsets[25] = items_off;
    let header = encode_header(1, &offsets, 0);
    buffer[..header.len()].copy_from_slice(&header);

    let document = convert_to_document(&buffer, PropertyMask::ANY).expect("well-formed archive");
    let root = document.root.expect("root visited");
    assert_eq!(root, ObjectId(1));

    let root_obj = document.get(root).unwrap();
    let find = |k: u64| {
        root_obj.properties.iter().find(|(key, _)| key.id() == k).map(|(_, v)| v.clone())
    };

    assert_eq!(find(NAME_KEY), Some(DecodedValue::String(carchive::StringId(NAME_STRING_ID))));
    assert_eq!(find(SCORES_KEY), Some(DecodedValue::Array(vec![
        DecodedValue::U32(10),
        DecodedValue::U32(20),
        DecodedValue::U32(30),
    ])));
    assert_eq!(find(META_KEY), Some(DecodedValue::ObjectRef(ObjectId(2))));

    let meta_obj = document.get(ObjectId(2)).expect("nested object visited");
    assert_eq!(meta_obj.properties, vec![(carchive::StringId(ENABLED_KEY), DecodedValue::Bool(true))]);

    match find(ITEMS_KEY) {
        Some(DecodedValue::Array(rows)) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0], DecodedValue::Row(vec![(carchive::StringId(QTY_KEY), DecodedValue::U32(100))]));
            assert_eq!(
                rows[1],
                DecodedValue::Row(vec![(
                    carchive::StringId(QTY_KEY),
                    DecodedValue::Array(vec![DecodedValue::U32(200), DecodedValue::U32(201)])
                )])
            );
        }
        other => panic!("expected object-array rows, got {other:?}"),
    }
}

#[test]
fn rejects_wrong_root_marker() {
    let bytes = vec![0xFFu8; 8];
    assert!(carchive::Archive::open(bytes).is_err());
}

/// Callback bundle that excludes every non-root object, recording which
/// object ids actually got walked and whether any child property group was
/// ever visited.
#[derive(Default)]
struct ExcludeChildren {
    visited: Vec<ObjectId>,
    scalar_visits: u32,
}

impl VisitorCallbacks for ExcludeChildren {
    fn visit_root_object(&mut self, object_id: ObjectId) {
        self.visited.push(object_id);
    }

    fn before_object_visit(&mut self, _path: &Path, object_id: ObjectId) -> VisitPolicy {
        if object_id == ObjectId(1) {
            VisitPolicy::Include
        } else {
            VisitPolicy::Exclude
        }
    }

    fn visit_scalar_pairs(
        &mut self,
        _path: &Path,
        _object_id: ObjectId,
        _keys: &[carchive::StringId],
        _values: carchive::visitor::ScalarColumn,
    ) {
        self.scalar_visits += 1;
    }
}

#[test]
fn excluding_every_non_root_object_stops_the_walk_at_the_root() {
    let mut buffer = vec![0u8; header_len()];

    let meta_child_off = buffer.len() as u64;
    let enabled_off = meta_child_off + header_len() as u64;
    let mut meta_offsets = [0u64; PROPERTY_SLOT_COUNT];
    meta_offsets[slot_of(FieldType::Bool, false)] = enabled_off;
    buffer.extend(encode_header(2, &meta_offsets, 0));
    buffer.extend(encode_fixed_group(&[ENABLED_KEY], &[1u8]));

    let meta_off = buffer.len() as u64;
    buffer.extend(encode_fixed_group(&[META_KEY], &meta_child_off.to_le_bytes()));

    let mut offsets = [0u64; PROPERTY_SLOT_COUNT];
    offsets[slot_of(FieldType::Object, false)] = meta_off;
    let header = encode_header(1, &offsets, 0);
    buffer[..header.len()].copy_from_slice(&header);

    let mut callbacks = ExcludeChildren::default();
    drive(&buffer, PropertyMask::ANY, &mut callbacks).expect("well-formed archive");

    assert_eq!(callbacks.visited, vec![ObjectId(1)]);
    assert_eq!(callbacks.scalar_visits, 0, "excluded child's scalar group must never be visited");
}
