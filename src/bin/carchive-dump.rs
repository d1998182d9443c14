//! Demo: hand-builds a tiny archive buffer, opens it, and dumps the
//! decoded document tree. There is no on-disk writer in this crate (the
//! producing side is out of scope), so the buffer below plays the role a
//! real encoder's output would.

use carchive::archive::object::OBJECT_BEGIN;
use carchive::archive::value_vector::FIXED_GROUP;
use carchive::field_type::{FieldType, PROPERTY_SLOT_COUNT};
use carchive::json::{MemoryStringDict, StringInterner, StringLookup};
use carchive::{convert_to_document, DecodedValue, PropertyMask};

fn encode_header(object_id: u64, prop_offsets: &[u64; PROPERTY_SLOT_COUNT]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.push(OBJECT_BEGIN);
    bytes.extend_from_slice(&object_id.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    for offset in prop_offsets {
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes
}

fn encode_fixed_group(keys: &[u64], values: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.push(FIXED_GROUP);
    bytes.extend_from_slice(&(keys.len() as u32).to_le_bytes());
    for k in keys {
        bytes.extend_from_slice(&k.to_le_bytes());
    }
    bytes.extend_from_slice(values);
    bytes
}

fn main() {
    let mut dict = MemoryStringDict::new();
    let key_active = dict.intern("active").id();
    let key_count = dict.intern("count").id();

    let header_len = 1 + 8 + 4 + PROPERTY_SLOT_COUNT * 8 + 8;
    let bool_slot = FieldType::ALL.iter().position(|t| *t == FieldType::Bool).unwrap();
    let u32_slot = FieldType::ALL.iter().position(|t| *t == FieldType::U32).unwrap();

    let mut offsets = [0u64; PROPERTY_SLOT_COUNT];
    let bool_off = header_len as u64;
    offsets[bool_slot] = bool_off;
    let bool_group = encode_fixed_group(&[key_active], &[1u8]);

    let u32_off = bool_off + bool_group.len() as u64;
    offsets[u32_slot] = u32_off;
    let u32_group = encode_fixed_group(&[key_count], &7u32.to_le_bytes());

    let mut buffer = encode_header(1, &offsets);
    buffer.extend_from_slice(&bool_group);
    buffer.extend_from_slice(&u32_group);

    let document = convert_to_document(&buffer, PropertyMask::ANY).expect("well-formed demo archive");

    let Some(root) = document.root else {
        eprintln!("document had no root object");
        return;
    };
    let object = document.get(root).expect("root object was visited");
    for (key, value) in &object.properties {
        let name = dict.resolve(*key).unwrap_or("<unknown>");
        println!("{name} = {}", describe(value));
    }
}

fn describe(value: &DecodedValue) -> String {
    match value {
        DecodedValue::Null => "null".to_owned(),
        DecodedValue::Bool(b) => b.to_string(),
        DecodedValue::I8(v) => v.to_string(),
        DecodedValue::I16(v) => v.to_string(),
        DecodedValue::I32(v) => v.to_string(),
        DecodedValue::I64(v) => v.to_string(),
        DecodedValue::U8(v) => v.to_string(),
        DecodedValue::U16(v) => v.to_string(),
        DecodedValue::U32(v) => v.to_string(),
        DecodedValue::U64(v) => v.to_string(),
        DecodedValue::F32(v) => v.to_string(),
        DecodedValue::String(id) => format!("sid#{}", id.id()),
        DecodedValue::Array(values) => {
            format!("[{}]", values.iter().map(describe).collect::<Vec<_>>().join(", "))
        }
        DecodedValue::ObjectRef(id) => format!("-> {id}"),
        DecodedValue::Row(fields) => {
            format!(
                "{{{}}}",
                fields.iter().map(|(k, v)| format!("{}: {}", k.id(), describe(v))).collect::<Vec<_>>().join(", ")
            )
        }
    }
}
