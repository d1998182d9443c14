//! Ingests a [`JsonValue`] tree into a [`CimObject`], inferring each
//! array's element field type via a number-widening lattice.

use crate::cim::model::{CimObject, ScalarValue};
use crate::error::CimError;
use crate::field_type::FieldType;
use crate::json::{JsonNumber, JsonValue, StringInterner, StringLookup};

/// Controls whether the resulting model is sorted for read-optimized
/// access (see [`crate::cim::sort`]) or left in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub read_optimized: bool,
}

/// Ingests one document. The root must be a JSON object, or an array of
/// JSON objects, which ingests as a single synthetic root object array
/// under a reserved key; anything else is
/// [`CimError::JsonTypeUnsupportedAtRoot`].
///
/// `dict` both interns new strings during ingest and, afterward, resolves
/// them back for the read-optimized sorter, which orders buckets by
/// decoded value/key content rather than raw `StringId`s.
pub fn ingest_document<D: StringInterner + StringLookup>(
    root: &JsonValue,
    dict: &mut D,
    options: &IngestOptions,
) -> Result<CimObject, CimError> {
    let mut object = CimObject::new();
    match root {
        JsonValue::Object(fields) => ingest_object(&mut object, fields, &mut *dict)?,
        JsonValue::Array(items) => {
            if !items.iter().all(|item| matches!(item, JsonValue::Object(_))) {
                return Err(CimError::JsonTypeUnsupportedAtRoot);
            }
            ingest_root_array(&mut object, items, &mut *dict)?;
        }
        _ => return Err(CimError::JsonTypeUnsupportedAtRoot),
    }
    if options.read_optimized {
        crate::cim::sort::sort_read_optimized(&mut object, &*dict);
    }
    Ok(object)
}

fn ingest_object(
    node: &mut CimObject,
    fields: &[(String, JsonValue)],
    interner: &mut dyn StringInterner,
) -> Result<(), CimError> {
    for (key, value) in fields {
        ingest_field(node, key, value, interner)?;
    }
    Ok(())
}

fn ingest_field(
    node: &mut CimObject,
    key: &str,
    value: &JsonValue,
    interner: &mut dyn StringInterner,
) -> Result<(), CimError> {
    match value {
        JsonValue::Null => {
            let key_id = interner.intern(key);
            let entry = node.add_key(FieldType::Null, false, key_id);
            node.push_primitive(entry, ScalarValue::Null);
        }
        JsonValue::Bool(b) => {
            let key_id = interner.intern(key);
            let entry = node.add_key(FieldType::Bool, false, key_id);
            node.push_primitive(entry, ScalarValue::Bool(*b));
        }
        JsonValue::Number(n) => {
            let (field_type, scalar) = infer_scalar_number(*n);
            let key_id = interner.intern(key);
            let entry = node.add_key(field_type, false, key_id);
            node.push_primitive(entry, scalar);
        }
        JsonValue::String(s) => {
            let string_id = interner.intern(s);
            let key_id = interner.intern(key);
            let entry = node.add_key(FieldType::String, false, key_id);
            node.push_primitive(entry, ScalarValue::StringId(string_id));
        }
        JsonValue::Object(fields) => {
            let key_id = interner.intern(key);
            let entry = node.add_key(FieldType::Object, false, key_id);
            let nested = node.push_object(entry);
            ingest_object(nested, fields, interner)?;
        }
        JsonValue::Array(items) => ingest_array_field(node, key, items, interner)?,
    }
    Ok(())
}

fn ingest_array_field(
    node: &mut CimObject,
    key: &str,
    items: &[JsonValue],
    interner: &mut dyn StringInterner,
) -> Result<(), CimError> {
    if items.iter().any(|item| matches!(item, JsonValue::Object(_))) {
        if !items.iter().all(|item| matches!(item, JsonValue::Object(_) | JsonValue::Null)) {
            return Err(CimError::MixedArrayTypes);
        }
        ingest_object_array_field(node, key, items, interner)?;
        return Ok(());
    }

    let field_type = infer_array_type(items)?;
    let key_id = interner.intern(key);
    let entry = node.add_key(field_type, true, key_id);
    let mut scalars = Vec::with_capacity(items.len());
    for item in items {
        scalars.push(coerce_scalar(item, field_type, interner)?);
    }
    node.push_array(entry, scalars);
    Ok(())
}

fn ingest_object_array_field(
    node: &mut CimObject,
    key: &str,
    items: &[JsonValue],
    interner: &mut dyn StringInterner,
) -> Result<(), CimError> {
    let key_id = interner.intern(key);
    let mut group_idx = node.object_arrays.iter().position(|g| g.key == key_id);
    if group_idx.is_none() {
        node.object_arrays.push(crate::cim::model::ColumnGroup::new(key_id));
        group_idx = Some(node.object_arrays.len() - 1);
    }
    let group = &mut node.object_arrays[group_idx.unwrap()];

    for (position, item) in items.iter().enumerate() {
        let fields = match item {
            JsonValue::Object(fields) => fields.as_slice(),
            JsonValue::Null => &[],
            _ => unreachable!("checked by caller"),
        };
        for (nested_key, nested_value) in fields {
            ingest_column_entry(group, nested_key, nested_value, position as u32, interner)?;
        }
    }
    Ok(())
}

fn ingest_column_entry(
    group: &mut crate::cim::model::ColumnGroup,
    nested_key: &str,
    value: &JsonValue,
    position: u32,
    interner: &mut dyn StringInterner,
) -> Result<(), CimError> {
    let nested_key_id = interner.intern(nested_key);
    match value {
        JsonValue::Object(fields) => {
            let column = group.column_mut(nested_key_id, FieldType::Object);
            let nested = column.push_nested_entry(position);
            ingest_object(nested, fields, interner)
        }
        JsonValue::Null => {
            let column = group.column_mut(nested_key_id, FieldType::Null);
            column.push_entry(position, vec![]);
            Ok(())
        }
        JsonValue::Array(items) => {
            if items.iter().any(|item| matches!(item, JsonValue::Object(_))) {
                return Err(CimError::MixedArrayOrArrayOfArrays);
            }
            let field_type = infer_array_type(items)?;
            let column = group.column_mut(nested_key_id, field_type);
            let mut scalars = Vec::with_capacity(items.len());
            for item in items {
                scalars.push(coerce_scalar(item, field_type, interner)?);
            }
            column.push_entry(position, scalars);
            Ok(())
        }
        scalar => {
            let (field_type, value) = match scalar {
                JsonValue::Bool(b) => (FieldType::Bool, ScalarValue::Bool(*b)),
                JsonValue::Number(n) => infer_scalar_number(*n),
                JsonValue::String(s) => (FieldType::String, ScalarValue::StringId(interner.intern(s))),
                _ => unreachable!("Null/Array/Object handled above"),
            };
            let column = group.column_mut(nested_key_id, field_type);
            column.push_entry(position, vec![value]);
            Ok(())
        }
    }
}

/// Ingests a top-level JSON array of objects as a single synthetic root
/// object-array under [`ROOT_ARRAY_KEY`].
pub const ROOT_ARRAY_KEY: &str = "$root";

fn ingest_root_array(
    node: &mut CimObject,
    items: &[JsonValue],
    interner: &mut dyn StringInterner,
) -> Result<(), CimError> {
    ingest_object_array_field(node, ROOT_ARRAY_KEY, items, interner)
}

/// Widens a bare (non-array) JSON number to its narrowest representable
/// field type: the smallest signed/unsigned width that holds it, or `F32`
/// for any non-integral value.
fn infer_scalar_number(n: JsonNumber) -> (FieldType, ScalarValue) {
    match n {
        JsonNumber::Float(f) => (FieldType::F32, ScalarValue::F32(f as f32)),
        JsonNumber::Int(v) if v >= 0 => narrow_unsigned(v as u64),
        JsonNumber::Int(v) => narrow_signed(v),
        JsonNumber::UInt(v) => narrow_unsigned(v),
    }
}

fn narrow_signed(v: i64) -> (FieldType, ScalarValue) {
    if let Ok(v) = i8::try_from(v) {
        (FieldType::I8, ScalarValue::I8(v))
    } else if let Ok(v) = i16::try_from(v) {
        (FieldType::I16, ScalarValue::I16(v))
    } else if let Ok(v) = i32::try_from(v) {
        (FieldType::I32, ScalarValue::I32(v))
    } else {
        (FieldType::I64, ScalarValue::I64(v))
    }
}

fn narrow_unsigned(v: u64) -> (FieldType, ScalarValue) {
    if let Ok(v) = u8::try_from(v) {
        (FieldType::U8, ScalarValue::U8(v))
    } else if let Ok(v) = u16::try_from(v) {
        (FieldType::U16, ScalarValue::U16(v))
    } else if let Ok(v) = u32::try_from(v) {
        (FieldType::U32, ScalarValue::U32(v))
    } else {
        (FieldType::U64, ScalarValue::U64(v))
    }
}

/// Infers one array's shared element field type.
///
/// Sign family is decided over *all* non-null elements, not just the
/// first: `[1, -2, 300000, null]` infers as signed `i32` even though its
/// first element is non-negative, because any negative element anywhere
/// forces the signed lattice. Any non-integral element forces `F32`
/// regardless of sign. A fully-null or empty array infers as `Null` (a
/// count-only record).
fn infer_array_type(items: &[JsonValue]) -> Result<FieldType, CimError> {
    let mut saw_negative = false;
    let mut saw_float = false;
    let mut saw_number = false;
    let mut saw_bool = false;
    let mut saw_string = false;
    let mut max_magnitude: u64 = 0;

    for item in items {
        match item {
            JsonValue::Null => {}
            JsonValue::Bool(_) => saw_bool = true,
            JsonValue::String(_) => saw_string = true,
            JsonValue::Number(n) => {
                saw_number = true;
                saw_negative |= n.is_negative();
                saw_float |= !n.is_integral();
                let magnitude = if n.is_negative() { n.as_f64().abs() as u64 } else { n.as_f64() as u64 };
                max_magnitude = max_magnitude.max(magnitude);
            }
            JsonValue::Array(_) | JsonValue::Object(_) => return Err(CimError::MixedArrayOrArrayOfArrays),
        }
    }

    let kinds = [saw_number, saw_bool, saw_string].iter().filter(|k| **k).count();
    if kinds > 1 {
        return Err(CimError::MixedArrayTypes);
    }
    if saw_bool {
        return Ok(FieldType::Bool);
    }
    if saw_string {
        return Ok(FieldType::String);
    }
    if !saw_number {
        return Ok(FieldType::Null);
    }
    if saw_float {
        return Ok(FieldType::F32);
    }
    Ok(if saw_negative { narrow_signed_width(max_magnitude) } else { narrow_unsigned_width(max_magnitude) })
}

fn narrow_signed_width(max_magnitude: u64) -> FieldType {
    if max_magnitude <= i8::MAX as u64 {
        FieldType::I8
    } else if max_magnitude <= i16::MAX as u64 {
        FieldType::I16
    } else if max_magnitude <= i32::MAX as u64 {
        FieldType::I32
    } else {
        FieldType::I64
    }
}

fn narrow_unsigned_width(max_magnitude: u64) -> FieldType {
    if max_magnitude <= u8::MAX as u64 {
        FieldType::U8
    } else if max_magnitude <= u16::MAX as u64 {
        FieldType::U16
    } else if max_magnitude <= u32::MAX as u64 {
        FieldType::U32
    } else {
        FieldType::U64
    }
}

fn coerce_scalar(
    item: &JsonValue,
    field_type: FieldType,
    interner: &mut dyn StringInterner,
) -> Result<ScalarValue, CimError> {
    Ok(match item {
        JsonValue::Null => ScalarValue::Null,
        JsonValue::Bool(b) => ScalarValue::Bool(*b),
        JsonValue::String(s) => ScalarValue::StringId(interner.intern(s)),
        JsonValue::Number(n) => coerce_number(*n, field_type),
        JsonValue::Array(_) | JsonValue::Object(_) => return Err(CimError::NoType),
    })
}

fn coerce_number(n: JsonNumber, field_type: FieldType) -> ScalarValue {
    match field_type {
        FieldType::I8 => ScalarValue::I8(n.as_f64() as i8),
        FieldType::I16 => ScalarValue::I16(n.as_f64() as i16),
        FieldType::I32 => ScalarValue::I32(n.as_f64() as i32),
        FieldType::I64 => ScalarValue::I64(n.as_f64() as i64),
        FieldType::U8 => ScalarValue::U8(n.as_f64() as u8),
        FieldType::U16 => ScalarValue::U16(n.as_f64() as u16),
        FieldType::U32 => ScalarValue::U32(n.as_f64() as u32),
        FieldType::U64 => ScalarValue::U64(n.as_f64() as u64),
        FieldType::F32 => ScalarValue::F32(n.as_f64() as f32),
        _ => unreachable!("infer_array_type only returns numeric types for numeric elements"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::MemoryStringDict;

    fn obj(fields: Vec<(&str, JsonValue)>) -> JsonValue {
        JsonValue::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn negative_anywhere_forces_signed_lattice() {
        let doc = obj(vec![(
            "xs",
            JsonValue::Array(vec![
                JsonValue::Number(JsonNumber::Int(1)),
                JsonValue::Number(JsonNumber::Int(-2)),
                JsonValue::Number(JsonNumber::Int(300_000)),
                JsonValue::Null,
            ]),
        )]);
        let mut dict = MemoryStringDict::new();
        let object = ingest_document(&doc, &mut dict, &IngestOptions::default()).unwrap();
        let bucket = object.arrays.get(&FieldType::I32).expect("widened to i32");
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn root_must_be_object_or_object_array() {
        let mut dict = MemoryStringDict::new();
        let err = ingest_document(&JsonValue::Number(JsonNumber::Int(1)), &mut dict, &IngestOptions::default())
            .unwrap_err();
        assert_eq!(err, CimError::JsonTypeUnsupportedAtRoot);
    }

    #[test]
    fn mixed_scalar_and_string_array_is_rejected() {
        let doc = obj(vec![(
            "xs",
            JsonValue::Array(vec![JsonValue::Number(JsonNumber::Int(1)), JsonValue::String("a".into())]),
        )]);
        let mut dict = MemoryStringDict::new();
        let err = ingest_document(&doc, &mut dict, &IngestOptions::default()).unwrap_err();
        assert_eq!(err, CimError::MixedArrayTypes);
    }

    #[test]
    fn object_array_decomposes_into_column_groups() {
        let doc = obj(vec![(
            "items",
            JsonValue::Array(vec![
                obj(vec![("id", JsonValue::Number(JsonNumber::Int(1)))]),
                obj(vec![("id", JsonValue::Number(JsonNumber::Int(2))), ("name", JsonValue::String("b".into()))]),
            ]),
        )]);
        let mut dict = MemoryStringDict::new();
        let object = ingest_document(&doc, &mut dict, &IngestOptions::default()).unwrap();
        assert_eq!(object.object_arrays.len(), 1);
        let group = &object.object_arrays[0];
        assert_eq!(group.columns.len(), 2);
        let id_column = group.columns.iter().find(|c| c.field_type == FieldType::U8).unwrap();
        assert_eq!(id_column.len(), 2);
    }

    #[test]
    fn empty_array_infers_as_null_count_record() {
        let doc = obj(vec![("xs", JsonValue::Array(vec![]))]);
        let mut dict = MemoryStringDict::new();
        let object = ingest_document(&doc, &mut dict, &IngestOptions::default()).unwrap();
        let bucket = object.arrays.get(&FieldType::Null).expect("empty array is a null record");
        assert_eq!(bucket.len(), 1);
    }
}
