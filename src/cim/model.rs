//! The columnar intermediate model (CIM): per-type key/value buckets for
//! one object, plus object-array column groups.
//!
//! Grounded on `original_source/src/include/json/columndoc.h`'s
//! `columndoc_obj`/`columndoc_group`/`columndoc_column`: rather than one
//! hand-named field per `(type, array?)` pair (26 fields, as the C struct
//! has), buckets are keyed by [`FieldType`] in a `BTreeMap`. Iteration order
//! over a `BTreeMap<FieldType, _>` follows `FieldType`'s declaration order,
//! which already matches the property iterator's fixed walk order.

use std::collections::BTreeMap;

use crate::field_type::FieldType;
use crate::ids::StringId;

/// One decoded scalar value, tagged by its field type. Produced by the
/// ingest path from a [`crate::json::JsonValue`] and consumed by
/// [`PrimitiveValues::push`] / [`ArrayValues::push`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    StringId(StringId),
}

impl ScalarValue {
    #[must_use]
    pub fn field_type(self) -> FieldType {
        match self {
            ScalarValue::Null => FieldType::Null,
            ScalarValue::Bool(_) => FieldType::Bool,
            ScalarValue::I8(_) => FieldType::I8,
            ScalarValue::I16(_) => FieldType::I16,
            ScalarValue::I32(_) => FieldType::I32,
            ScalarValue::I64(_) => FieldType::I64,
            ScalarValue::U8(_) => FieldType::U8,
            ScalarValue::U16(_) => FieldType::U16,
            ScalarValue::U32(_) => FieldType::U32,
            ScalarValue::U64(_) => FieldType::U64,
            ScalarValue::F32(_) => FieldType::F32,
            ScalarValue::StringId(_) => FieldType::String,
        }
    }
}

/// One object's decomposition into per-type columns.
///
/// A key may appear in more than one bucket simultaneously: this is how a
/// field that takes on different JSON types across documents (or across
/// rows of an object array) maps down to typed storage.
#[derive(Debug, Clone, Default)]
pub struct CimObject {
    pub primitives: BTreeMap<FieldType, PrimitiveBucket>,
    pub arrays: BTreeMap<FieldType, ArrayBucket>,
    pub object_arrays: Vec<ColumnGroup>,
}

/// A handle returned by [`CimObject::add_key`], redeemed by exactly one of
/// [`CimObject::push_primitive`], [`CimObject::push_array`], or
/// [`CimObject::push_object`].
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub(crate) field_type: FieldType,
    pub(crate) is_array: bool,
    pub(crate) index: usize,
}

impl CimObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an entry for `key` under the given `(field_type, is_array)`
    /// bucket, creating the bucket on first use. A second `add_key` with
    /// the same name but a different type opens a distinct entry in a
    /// different bucket rather than colliding with the first.
    pub fn add_key(&mut self, field_type: FieldType, is_array: bool, key: StringId) -> Entry {
        if is_array {
            let bucket = self.arrays.entry(field_type).or_insert_with(|| ArrayBucket::new(field_type));
            bucket.keys.push(key);
            Entry { field_type, is_array: true, index: bucket.keys.len() - 1 }
        } else {
            let bucket = self.primitives.entry(field_type).or_insert_with(|| PrimitiveBucket::new(field_type));
            bucket.keys.push(key);
            Entry { field_type, is_array: false, index: bucket.keys.len() - 1 }
        }
    }

    /// Writes the scalar value for a non-array entry opened via
    /// [`Self::add_key`].
    pub fn push_primitive(&mut self, entry: Entry, value: ScalarValue) {
        debug_assert!(!entry.is_array, "push_primitive called on an array entry");
        let bucket = self.primitives.get_mut(&entry.field_type).expect("entry came from add_key");
        debug_assert_eq!(bucket.values.len(), entry.index, "entries must be filled in add_key order");
        bucket.values.push(value);
    }

    /// Writes the array payload for an array entry opened via
    /// [`Self::add_key`]. Null elements inside a typed array are
    /// materialized as that type's sentinel; an entry whose field type is
    /// `Null` stores only the element count.
    pub fn push_array(&mut self, entry: Entry, values: Vec<ScalarValue>) {
        debug_assert!(entry.is_array, "push_array called on a non-array entry");
        let bucket = self.arrays.get_mut(&entry.field_type).expect("entry came from add_key");
        debug_assert_eq!(bucket.values.len(), entry.index, "entries must be filled in add_key order");
        bucket.values.push(values);
    }

    /// Returns a freshly inserted nested node for a `Object`-typed entry
    /// opened via [`Self::add_key`], for the caller to recursively ingest
    /// into.
    pub fn push_object(&mut self, entry: Entry) -> &mut CimObject {
        debug_assert!(!entry.is_array && entry.field_type == FieldType::Object);
        let bucket = self.primitives.get_mut(&FieldType::Object).expect("entry came from add_key");
        bucket.values.push_nested();
        bucket.values.last_nested_mut().expect("just pushed")
    }
}

/// Keys + values for one `(field_type, is_array = false)` bucket.
#[derive(Debug, Clone)]
pub struct PrimitiveBucket {
    pub field_type: FieldType,
    pub keys: Vec<StringId>,
    pub values: PrimitiveValues,
}

impl PrimitiveBucket {
    fn new(field_type: FieldType) -> Self {
        Self { field_type, keys: Vec::new(), values: PrimitiveValues::new(field_type) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A per-type scalar value vector. `Null` carries no payload: its length
/// is tracked only by the owning bucket's key vector.
#[derive(Debug, Clone)]
pub enum PrimitiveValues {
    Null(usize),
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
    Object(Vec<CimObject>),
}

macro_rules! primitive_values_push {
    ($self:expr, $value:expr, $( $variant:ident ),+ $(,)?) => {
        match ($self, $value) {
            (PrimitiveValues::Null(count), ScalarValue::Null) => *count += 1,
            $(
                (PrimitiveValues::$variant(values), ScalarValue::$variant(v)) => values.push(v),
            )+
            (bucket, value) => panic!(
                "scalar value of type {:?} does not match bucket variant {}",
                value.field_type(),
                bucket_name(bucket),
            ),
        }
    };
}

fn bucket_name(values: &PrimitiveValues) -> &'static str {
    match values {
        PrimitiveValues::Null(_) => "Null",
        PrimitiveValues::Bool(_) => "Bool",
        PrimitiveValues::I8(_) => "I8",
        PrimitiveValues::I16(_) => "I16",
        PrimitiveValues::I32(_) => "I32",
        PrimitiveValues::I64(_) => "I64",
        PrimitiveValues::U8(_) => "U8",
        PrimitiveValues::U16(_) => "U16",
        PrimitiveValues::U32(_) => "U32",
        PrimitiveValues::U64(_) => "U64",
        PrimitiveValues::F32(_) => "F32",
        PrimitiveValues::StringId(_) => "StringId",
        PrimitiveValues::Object(_) => "Object",
    }
}

impl PrimitiveValues {
    fn new(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Null => PrimitiveValues::Null(0),
            FieldType::Bool => PrimitiveValues::Bool(Vec::new()),
            FieldType::I8 => PrimitiveValues::I8(Vec::new()),
            FieldType::I16 => PrimitiveValues::I16(Vec::new()),
            FieldType::I32 => PrimitiveValues::I32(Vec::new()),
            FieldType::I64 => PrimitiveValues::I64(Vec::new()),
            FieldType::U8 => PrimitiveValues::U8(Vec::new()),
            FieldType::U16 => PrimitiveValues::U16(Vec::new()),
            FieldType::U32 => PrimitiveValues::U32(Vec::new()),
            FieldType::U64 => PrimitiveValues::U64(Vec::new()),
            FieldType::F32 => PrimitiveValues::F32(Vec::new()),
            FieldType::String => PrimitiveValues::StringId(Vec::new()),
            FieldType::Object => PrimitiveValues::Object(Vec::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            PrimitiveValues::Null(n) => *n,
            PrimitiveValues::Bool(v) => v.len(),
            PrimitiveValues::I8(v) => v.len(),
            PrimitiveValues::I16(v) => v.len(),
            PrimitiveValues::I32(v) => v.len(),
            PrimitiveValues::I64(v) => v.len(),
            PrimitiveValues::U8(v) => v.len(),
            PrimitiveValues::U16(v) => v.len(),
            PrimitiveValues::U32(v) => v.len(),
            PrimitiveValues::U64(v) => v.len(),
            PrimitiveValues::F32(v) => v.len(),
            PrimitiveValues::StringId(v) => v.len(),
            PrimitiveValues::Object(v) => v.len(),
        }
    }

    fn push(&mut self, value: ScalarValue) {
        primitive_values_push!(self, value, Bool, I8, I16, I32, I64, U8, U16, U32, U64, F32, StringId);
    }

    fn push_nested(&mut self) {
        if let PrimitiveValues::Object(nodes) = self {
            nodes.push(CimObject::new());
        } else {
            panic!("push_nested called on a non-object bucket");
        }
    }

    fn last_nested_mut(&mut self) -> Option<&mut CimObject> {
        match self {
            PrimitiveValues::Object(nodes) => nodes.last_mut(),
            _ => None,
        }
    }
}

/// Keys + values for one `(field_type, is_array = true)` bucket.
#[derive(Debug, Clone)]
pub struct ArrayBucket {
    pub field_type: FieldType,
    pub keys: Vec<StringId>,
    pub values: ArrayValues,
}

impl ArrayBucket {
    fn new(field_type: FieldType) -> Self {
        debug_assert!(field_type.admits_array_bucket());
        Self { field_type, keys: Vec::new(), values: ArrayValues::new(field_type) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Per-type vector-of-vectors. `Null` arrays store only an element count
/// per entry, since an all-null array carries no other payload.
#[derive(Debug, Clone)]
pub enum ArrayValues {
    Null(Vec<u32>),
    Bool(Vec<Vec<bool>>),
    I8(Vec<Vec<i8>>),
    I16(Vec<Vec<i16>>),
    I32(Vec<Vec<i32>>),
    I64(Vec<Vec<i64>>),
    U8(Vec<Vec<u8>>),
    U16(Vec<Vec<u16>>),
    U32(Vec<Vec<u32>>),
    U64(Vec<Vec<u64>>),
    F32(Vec<Vec<f32>>),
    StringId(Vec<Vec<StringId>>),
}

impl ArrayValues {
    fn new(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Null => ArrayValues::Null(Vec::new()),
            FieldType::Bool => ArrayValues::Bool(Vec::new()),
            FieldType::I8 => ArrayValues::I8(Vec::new()),
            FieldType::I16 => ArrayValues::I16(Vec::new()),
            FieldType::I32 => ArrayValues::I32(Vec::new()),
            FieldType::I64 => ArrayValues::I64(Vec::new()),
            FieldType::U8 => ArrayValues::U8(Vec::new()),
            FieldType::U16 => ArrayValues::U16(Vec::new()),
            FieldType::U32 => ArrayValues::U32(Vec::new()),
            FieldType::U64 => ArrayValues::U64(Vec::new()),
            FieldType::F32 => ArrayValues::F32(Vec::new()),
            FieldType::String => ArrayValues::StringId(Vec::new()),
            FieldType::Object => panic!("object arrays are not stored as plain array buckets"),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Null(v) => v.len(),
            ArrayValues::Bool(v) => v.len(),
            ArrayValues::I8(v) => v.len(),
            ArrayValues::I16(v) => v.len(),
            ArrayValues::I32(v) => v.len(),
            ArrayValues::I64(v) => v.len(),
            ArrayValues::U8(v) => v.len(),
            ArrayValues::U16(v) => v.len(),
            ArrayValues::U32(v) => v.len(),
            ArrayValues::U64(v) => v.len(),
            ArrayValues::F32(v) => v.len(),
            ArrayValues::StringId(v) => v.len(),
        }
    }

    fn push(&mut self, values: Vec<ScalarValue>) {
        match self {
            ArrayValues::Null(counts) => counts.push(values.len() as u32),
            ArrayValues::Bool(vv) => vv.push(values.iter().map(|v| extract_bool(*v)).collect()),
            ArrayValues::I8(vv) => vv.push(values.iter().map(|v| extract_i8(*v)).collect()),
            ArrayValues::I16(vv) => vv.push(values.iter().map(|v| extract_i16(*v)).collect()),
            ArrayValues::I32(vv) => vv.push(values.iter().map(|v| extract_i32(*v)).collect()),
            ArrayValues::I64(vv) => vv.push(values.iter().map(|v| extract_i64(*v)).collect()),
            ArrayValues::U8(vv) => vv.push(values.iter().map(|v| extract_u8(*v)).collect()),
            ArrayValues::U16(vv) => vv.push(values.iter().map(|v| extract_u16(*v)).collect()),
            ArrayValues::U32(vv) => vv.push(values.iter().map(|v| extract_u32(*v)).collect()),
            ArrayValues::U64(vv) => vv.push(values.iter().map(|v| extract_u64(*v)).collect()),
            ArrayValues::F32(vv) => vv.push(values.iter().map(|v| extract_f32(*v)).collect()),
            ArrayValues::StringId(vv) => vv.push(values.iter().map(|v| extract_string(*v)).collect()),
        }
    }
}

// A `ScalarValue::Null` inside a typed array degrades to that type's
// sentinel; every other variant must already match.
fn extract_bool(v: ScalarValue) -> bool {
    match v {
        ScalarValue::Bool(b) => b,
        ScalarValue::Null => false, // sentinel is carried out-of-band at encode time (0xFF byte), not representable in `bool`
        other => panic!("expected bool, found {:?}", other.field_type()),
    }
}
fn extract_i8(v: ScalarValue) -> i8 {
    match v {
        ScalarValue::I8(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::I8,
        other => panic!("expected i8, found {:?}", other.field_type()),
    }
}
fn extract_i16(v: ScalarValue) -> i16 {
    match v {
        ScalarValue::I16(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::I16,
        other => panic!("expected i16, found {:?}", other.field_type()),
    }
}
fn extract_i32(v: ScalarValue) -> i32 {
    match v {
        ScalarValue::I32(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::I32,
        other => panic!("expected i32, found {:?}", other.field_type()),
    }
}
fn extract_i64(v: ScalarValue) -> i64 {
    match v {
        ScalarValue::I64(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::I64,
        other => panic!("expected i64, found {:?}", other.field_type()),
    }
}
fn extract_u8(v: ScalarValue) -> u8 {
    match v {
        ScalarValue::U8(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::U8,
        other => panic!("expected u8, found {:?}", other.field_type()),
    }
}
fn extract_u16(v: ScalarValue) -> u16 {
    match v {
        ScalarValue::U16(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::U16,
        other => panic!("expected u16, found {:?}", other.field_type()),
    }
}
fn extract_u32(v: ScalarValue) -> u32 {
    match v {
        ScalarValue::U32(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::U32,
        other => panic!("expected u32, found {:?}", other.field_type()),
    }
}
fn extract_u64(v: ScalarValue) -> u64 {
    match v {
        ScalarValue::U64(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::U64,
        other => panic!("expected u64, found {:?}", other.field_type()),
    }
}
fn extract_f32(v: ScalarValue) -> f32 {
    match v {
        ScalarValue::F32(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::f32_null(),
        other => panic!("expected f32, found {:?}", other.field_type()),
    }
}
fn extract_string(v: ScalarValue) -> StringId {
    match v {
        ScalarValue::StringId(x) => x,
        ScalarValue::Null => crate::field_type::sentinel::string_id_null(),
        other => panic!("expected string id, found {:?}", other.field_type()),
    }
}

/// One object-array property: a field name plus the columns decomposed
/// from the objects in that JSON array.
#[derive(Debug, Clone)]
pub struct ColumnGroup {
    pub key: StringId,
    pub columns: Vec<Column>,
}

impl ColumnGroup {
    #[must_use]
    pub fn new(key: StringId) -> Self {
        Self { key, columns: Vec::new() }
    }

    /// Finds or creates the column for `(nested_key, field_type)`.
    pub fn column_mut(&mut self, nested_key: StringId, field_type: FieldType) -> &mut Column {
        if let Some(idx) = self.columns.iter().position(|c| c.key == nested_key && c.field_type == field_type) {
            &mut self.columns[idx]
        } else {
            self.columns.push(Column::new(nested_key, field_type));
            self.columns.last_mut().unwrap()
        }
    }
}

/// One `(nested-key, nested-type)` column inside an object-array group.
/// `positions[i]` is the group-local object index that contributed
/// `values`'s `i`-th entry.
#[derive(Debug, Clone)]
pub struct Column {
    pub key: StringId,
    pub field_type: FieldType,
    pub positions: Vec<u32>,
    pub values: ColumnValues,
}

impl Column {
    fn new(key: StringId, field_type: FieldType) -> Self {
        Self { key, field_type, positions: Vec::new(), values: ColumnValues::new(field_type) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends one entry contributed by `position`. Every entry is
    /// array-shaped — `{array_length, array_bytes…}` — even for a scalar
    /// JSON value, which is represented as a length-1 entry.
    pub fn push_entry(&mut self, position: u32, values: Vec<ScalarValue>) {
        self.positions.push(position);
        self.values.push(values);
    }

    pub fn push_nested_entry(&mut self, position: u32) -> &mut CimObject {
        self.positions.push(position);
        self.values.push_nested()
    }
}

/// Per-type parallel value storage for one [`Column`]. Every non-null,
/// non-object variant stores one `Vec<T>` per entry (length 1 for a scalar
/// JSON value, length N for a nested JSON array value at that key).
#[derive(Debug, Clone)]
pub enum ColumnValues {
    Null(Vec<u32>),
    Bool(Vec<Vec<bool>>),
    I8(Vec<Vec<i8>>),
    I16(Vec<Vec<i16>>),
    I32(Vec<Vec<i32>>),
    I64(Vec<Vec<i64>>),
    U8(Vec<Vec<u8>>),
    U16(Vec<Vec<u16>>),
    U32(Vec<Vec<u32>>),
    U64(Vec<Vec<u64>>),
    F32(Vec<Vec<f32>>),
    StringId(Vec<Vec<StringId>>),
    Object(Vec<CimObject>),
}

impl ColumnValues {
    fn new(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Null => ColumnValues::Null(Vec::new()),
            FieldType::Bool => ColumnValues::Bool(Vec::new()),
            FieldType::I8 => ColumnValues::I8(Vec::new()),
            FieldType::I16 => ColumnValues::I16(Vec::new()),
            FieldType::I32 => ColumnValues::I32(Vec::new()),
            FieldType::I64 => ColumnValues::I64(Vec::new()),
            FieldType::U8 => ColumnValues::U8(Vec::new()),
            FieldType::U16 => ColumnValues::U16(Vec::new()),
            FieldType::U32 => ColumnValues::U32(Vec::new()),
            FieldType::U64 => ColumnValues::U64(Vec::new()),
            FieldType::F32 => ColumnValues::F32(Vec::new()),
            FieldType::String => ColumnValues::StringId(Vec::new()),
            FieldType::Object => ColumnValues::Object(Vec::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Null(v) => v.len(),
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::I8(v) => v.len(),
            ColumnValues::I16(v) => v.len(),
            ColumnValues::I32(v) => v.len(),
            ColumnValues::I64(v) => v.len(),
            ColumnValues::U8(v) => v.len(),
            ColumnValues::U16(v) => v.len(),
            ColumnValues::U32(v) => v.len(),
            ColumnValues::U64(v) => v.len(),
            ColumnValues::F32(v) => v.len(),
            ColumnValues::StringId(v) => v.len(),
            ColumnValues::Object(v) => v.len(),
        }
    }

    fn push(&mut self, values: Vec<ScalarValue>) {
        match self {
            ColumnValues::Null(counts) => counts.push(values.len() as u32),
            ColumnValues::Bool(vv) => vv.push(values.into_iter().map(extract_bool).collect()),
            ColumnValues::I8(vv) => vv.push(values.into_iter().map(extract_i8).collect()),
            ColumnValues::I16(vv) => vv.push(values.into_iter().map(extract_i16).collect()),
            ColumnValues::I32(vv) => vv.push(values.into_iter().map(extract_i32).collect()),
            ColumnValues::I64(vv) => vv.push(values.into_iter().map(extract_i64).collect()),
            ColumnValues::U8(vv) => vv.push(values.into_iter().map(extract_u8).collect()),
            ColumnValues::U16(vv) => vv.push(values.into_iter().map(extract_u16).collect()),
            ColumnValues::U32(vv) => vv.push(values.into_iter().map(extract_u32).collect()),
            ColumnValues::U64(vv) => vv.push(values.into_iter().map(extract_u64).collect()),
            ColumnValues::F32(vv) => vv.push(values.into_iter().map(extract_f32).collect()),
            ColumnValues::StringId(vv) => vv.push(values.into_iter().map(extract_string).collect()),
            ColumnValues::Object(_) => panic!("use push_nested for object columns"),
        }
    }

    fn push_nested(&mut self) -> &mut CimObject {
        match self {
            ColumnValues::Object(nodes) => {
                nodes.push(CimObject::new());
                nodes.last_mut().unwrap()
            }
            _ => panic!("push_nested called on a non-object column"),
        }
    }
}
