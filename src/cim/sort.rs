//! Read-optimized sort discipline: co-sort each bucket's keys and values by
//! decoded *value* order, sort column groups and their columns by decoded
//! *key* name, and recurse into nested objects.
//!
//! Grounded on `original_source/src/include/json/columndoc.h`'s
//! `read_optimized` flag on `columndoc`, which the original keeps sorted
//! the same way for faster binary-search lookup at query time.

use std::cmp::Ordering;

use crate::cim::model::{ArrayValues, CimObject, ColumnValues, PrimitiveValues};
use crate::ids::StringId;
use crate::json::StringLookup;

/// Sorts `object` and every object nested within it (including object-array
/// row objects) for read-optimized access, in place. `lookup` decodes
/// `StringId`s back to their bytes wherever the sort discipline compares
/// decoded content rather than raw ids.
pub fn sort_read_optimized(object: &mut CimObject, lookup: &dyn StringLookup) {
    for bucket in object.primitives.values_mut() {
        sort_primitive_bucket(bucket, lookup);
    }
    for bucket in object.arrays.values_mut() {
        sort_array_bucket(bucket, lookup);
    }
    object.object_arrays.sort_by(|a, b| compare_key_names(a.key, b.key, lookup));
    for group in &mut object.object_arrays {
        group.columns.sort_by(|a, b| compare_key_names(a.key, b.key, lookup).then(a.field_type.cmp(&b.field_type)));
        for column in &mut group.columns {
            sort_column(column, lookup);
        }
    }
}

fn compare_key_names(a: StringId, b: StringId, lookup: &dyn StringLookup) -> Ordering {
    lookup.resolve(a).unwrap_or("").cmp(lookup.resolve(b).unwrap_or(""))
}

/// Element-wise comparison of two same-typed slices: the first index where
/// they differ decides, matching the co-sort rule `A <= B iff A[i] <= B[i]`
/// for `i < min(|A|, |B|)`; equal on every compared position is a tie
/// regardless of length, since the discipline names no length tie-break.
fn compare_elementwise<T: PartialOrd>(a: &[T], b: &[T]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y) {
            Some(Ordering::Equal) | None => continue,
            Some(ord) => return ord,
        }
    }
    Ordering::Equal
}

/// Same rule as [`compare_elementwise`], but comparing decoded string
/// content position by position instead of raw `StringId`s.
fn compare_elementwise_strings(a: &[StringId], b: &[StringId], lookup: &dyn StringLookup) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match lookup.resolve(*x).unwrap_or("").cmp(lookup.resolve(*y).unwrap_or("")) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Builds the permutation that would stable-sort `0..len` by `cmp`, without
/// mutating any input — callers apply it in lockstep to keys and parallel
/// value storage.
fn sort_permutation(len: usize, mut cmp: impl FnMut(usize, usize) -> Ordering) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| cmp(a, b));
    order
}

fn apply_permutation<T: Clone>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| values[i].clone()).collect()
}

/// Scalar value order for one primitive bucket: `Null` carries no per-entry
/// payload (every null is equal, so the sort is a no-op there); `Object`
/// has no scalar content to order by, so its entries keep insertion order
/// and only recurse.
fn primitive_sort_order(values: &PrimitiveValues, lookup: &dyn StringLookup) -> Vec<usize> {
    let len = values.len();
    match values {
        PrimitiveValues::Null(_) | PrimitiveValues::Object(_) => (0..len).collect(),
        PrimitiveValues::Bool(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::I8(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::I16(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::I32(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::I64(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::U8(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::U16(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::U32(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::U64(v) => sort_permutation(len, |a, b| v[a].cmp(&v[b])),
        PrimitiveValues::F32(v) => sort_permutation(len, |a, b| v[a].partial_cmp(&v[b]).unwrap_or(Ordering::Equal)),
        PrimitiveValues::StringId(v) => {
            sort_permutation(len, |a, b| lookup.resolve(v[a]).unwrap_or("").cmp(lookup.resolve(v[b]).unwrap_or("")))
        }
    }
}

fn sort_primitive_bucket(bucket: &mut crate::cim::model::PrimitiveBucket, lookup: &dyn StringLookup) {
    let order = primitive_sort_order(&bucket.values, lookup);
    bucket.keys = apply_permutation(&bucket.keys, &order);
    bucket.values = match &bucket.values {
        PrimitiveValues::Null(n) => PrimitiveValues::Null(*n),
        PrimitiveValues::Bool(v) => PrimitiveValues::Bool(apply_permutation(v, &order)),
        PrimitiveValues::I8(v) => PrimitiveValues::I8(apply_permutation(v, &order)),
        PrimitiveValues::I16(v) => PrimitiveValues::I16(apply_permutation(v, &order)),
        PrimitiveValues::I32(v) => PrimitiveValues::I32(apply_permutation(v, &order)),
        PrimitiveValues::I64(v) => PrimitiveValues::I64(apply_permutation(v, &order)),
        PrimitiveValues::U8(v) => PrimitiveValues::U8(apply_permutation(v, &order)),
        PrimitiveValues::U16(v) => PrimitiveValues::U16(apply_permutation(v, &order)),
        PrimitiveValues::U32(v) => PrimitiveValues::U32(apply_permutation(v, &order)),
        PrimitiveValues::U64(v) => PrimitiveValues::U64(apply_permutation(v, &order)),
        PrimitiveValues::F32(v) => PrimitiveValues::F32(apply_permutation(v, &order)),
        PrimitiveValues::StringId(v) => PrimitiveValues::StringId(apply_permutation(v, &order)),
        PrimitiveValues::Object(v) => PrimitiveValues::Object(apply_permutation(v, &order)),
    };
    if let PrimitiveValues::Object(nodes) = &mut bucket.values {
        for node in nodes {
            sort_read_optimized(node, lookup);
        }
    }
}

/// Array-value order for one array bucket: arrays compare element-wise
/// (decoded string content for `StringId`), per the co-sort rule.
fn array_sort_order(values: &ArrayValues, lookup: &dyn StringLookup) -> Vec<usize> {
    let len = values.len();
    match values {
        // An all-null array carries only a count, no comparable elements:
        // every entry is vacuously equal under the element-wise rule.
        ArrayValues::Null(_) => (0..len).collect(),
        ArrayValues::Bool(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::I8(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::I16(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::I32(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::I64(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::U8(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::U16(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::U32(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::U64(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::F32(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ArrayValues::StringId(v) => sort_permutation(len, |a, b| compare_elementwise_strings(&v[a], &v[b], lookup)),
    }
}

fn sort_array_bucket(bucket: &mut crate::cim::model::ArrayBucket, lookup: &dyn StringLookup) {
    let order = array_sort_order(&bucket.values, lookup);
    bucket.keys = apply_permutation(&bucket.keys, &order);
    bucket.values = match &bucket.values {
        ArrayValues::Null(v) => ArrayValues::Null(apply_permutation(v, &order)),
        ArrayValues::Bool(v) => ArrayValues::Bool(apply_permutation(v, &order)),
        ArrayValues::I8(v) => ArrayValues::I8(apply_permutation(v, &order)),
        ArrayValues::I16(v) => ArrayValues::I16(apply_permutation(v, &order)),
        ArrayValues::I32(v) => ArrayValues::I32(apply_permutation(v, &order)),
        ArrayValues::I64(v) => ArrayValues::I64(apply_permutation(v, &order)),
        ArrayValues::U8(v) => ArrayValues::U8(apply_permutation(v, &order)),
        ArrayValues::U16(v) => ArrayValues::U16(apply_permutation(v, &order)),
        ArrayValues::U32(v) => ArrayValues::U32(apply_permutation(v, &order)),
        ArrayValues::U64(v) => ArrayValues::U64(apply_permutation(v, &order)),
        ArrayValues::F32(v) => ArrayValues::F32(apply_permutation(v, &order)),
        ArrayValues::StringId(v) => ArrayValues::StringId(apply_permutation(v, &order)),
    };
}

/// Entry-value order for one column: every entry is array-shaped (length 1
/// for a scalar JSON value), so this reuses the same element-wise rule as
/// [`array_sort_order`]. `Object` columns have no scalar content to order
/// by and keep insertion order, recursing instead.
fn column_sort_order(values: &ColumnValues, lookup: &dyn StringLookup) -> Vec<usize> {
    let len = values.len();
    match values {
        ColumnValues::Null(_) | ColumnValues::Object(_) => (0..len).collect(),
        ColumnValues::Bool(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::I8(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::I16(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::I32(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::I64(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::U8(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::U16(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::U32(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::U64(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::F32(v) => sort_permutation(len, |a, b| compare_elementwise(&v[a], &v[b])),
        ColumnValues::StringId(v) => sort_permutation(len, |a, b| compare_elementwise_strings(&v[a], &v[b], lookup)),
    }
}

fn sort_column(column: &mut crate::cim::model::Column, lookup: &dyn StringLookup) {
    let order = column_sort_order(&column.values, lookup);
    column.positions = apply_permutation(&column.positions, &order);
    column.values = match &column.values {
        ColumnValues::Null(v) => ColumnValues::Null(apply_permutation(v, &order)),
        ColumnValues::Bool(v) => ColumnValues::Bool(apply_permutation(v, &order)),
        ColumnValues::I8(v) => ColumnValues::I8(apply_permutation(v, &order)),
        ColumnValues::I16(v) => ColumnValues::I16(apply_permutation(v, &order)),
        ColumnValues::I32(v) => ColumnValues::I32(apply_permutation(v, &order)),
        ColumnValues::I64(v) => ColumnValues::I64(apply_permutation(v, &order)),
        ColumnValues::U8(v) => ColumnValues::U8(apply_permutation(v, &order)),
        ColumnValues::U16(v) => ColumnValues::U16(apply_permutation(v, &order)),
        ColumnValues::U32(v) => ColumnValues::U32(apply_permutation(v, &order)),
        ColumnValues::U64(v) => ColumnValues::U64(apply_permutation(v, &order)),
        ColumnValues::F32(v) => ColumnValues::F32(apply_permutation(v, &order)),
        ColumnValues::StringId(v) => ColumnValues::StringId(apply_permutation(v, &order)),
        ColumnValues::Object(v) => ColumnValues::Object(apply_permutation(v, &order)),
    };
    if let ColumnValues::Object(nodes) = &mut column.values {
        for node in nodes {
            sort_read_optimized(node, lookup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cim::builder::{ingest_document, IngestOptions};
    use crate::json::{JsonValue, MemoryStringDict};

    #[test]
    fn sorting_orders_by_decoded_value_not_key_id() {
        // "b" interns before "a", so a by-key sort would leave values
        // `[2, 1]`; the sort discipline orders by value, giving `[1, 2]`.
        let doc = JsonValue::Object(vec![
            ("b".into(), JsonValue::Number(crate::json::JsonNumber::Int(2))),
            ("a".into(), JsonValue::Number(crate::json::JsonNumber::Int(1))),
        ]);
        let mut dict = MemoryStringDict::new();
        let object = ingest_document(&doc, &mut dict, &IngestOptions { read_optimized: true }).unwrap();
        let bucket = object.primitives.get(&crate::field_type::FieldType::U8).unwrap();
        let PrimitiveValues::U8(values) = &bucket.values else { panic!("u8 bucket") };
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "values must be non-decreasing: {values:?}");
        assert_eq!(values, &[1, 2]);
    }

    #[test]
    fn string_bucket_sorts_by_decoded_content() {
        let doc = JsonValue::Object(vec![
            ("k1".into(), JsonValue::String("zeta".into())),
            ("k2".into(), JsonValue::String("alpha".into())),
        ]);
        let mut dict = MemoryStringDict::new();
        let object = ingest_document(&doc, &mut dict, &IngestOptions { read_optimized: true }).unwrap();
        let bucket = object.primitives.get(&crate::field_type::FieldType::String).unwrap();
        let PrimitiveValues::StringId(values) = &bucket.values else { panic!("string bucket") };
        let decoded: Vec<&str> = values.iter().map(|id| dict.resolve(*id).unwrap()).collect();
        assert_eq!(decoded, vec!["alpha", "zeta"]);
    }

    #[test]
    fn object_array_groups_sort_by_decoded_key_name() {
        let doc = JsonValue::Object(vec![
            ("zetas".into(), JsonValue::Array(vec![JsonValue::Object(vec![("n".into(), JsonValue::Bool(true))])])),
            ("alphas".into(), JsonValue::Array(vec![JsonValue::Object(vec![("n".into(), JsonValue::Bool(false))])])),
        ]);
        let mut dict = MemoryStringDict::new();
        let object = ingest_document(&doc, &mut dict, &IngestOptions { read_optimized: true }).unwrap();
        let names: Vec<&str> =
            object.object_arrays.iter().map(|g| dict.resolve(g.key).unwrap()).collect();
        assert_eq!(names, vec!["alphas", "zetas"]);
    }
}
