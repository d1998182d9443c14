//! Visitor-driven rematerialization of decoded documents.
//!
//! Grounded on `original_source/src/include/core/carbon/archive_visitor.h`'s
//! callback table, consumed the way `llvm-bitcode`'s `CollectingVisitor`
//! consumes `BitStreamVisitor`: a concrete struct implementing every
//! callback it needs and ignoring the rest via the trait's defaults.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::field_type::sentinel;
use crate::ids::{ObjectId, StringId};
use crate::mask::PropertyMask;

use crate::visitor::callbacks::{ArrayEntry, ScalarColumn};
use crate::visitor::driver::drive;
use crate::visitor::path::Path;
use crate::visitor::{VisitPolicy, VisitorCallbacks};

/// One decoded property value. `Array` elements are always scalar
/// variants — arrays of arrays are not representable anywhere in the
/// model. `Row` is a synthetic object standing in for one object-array
/// entry that was never assigned its own persisted object id (every
/// column entry for a non-`object` nested type).
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
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
    String(StringId),
    Array(Vec<DecodedValue>),
    ObjectRef(ObjectId),
    Row(Vec<(StringId, DecodedValue)>),
}

/// One decoded object: its properties in visit order.
#[derive(Debug, Clone, Default)]
pub struct DecodedObject {
    pub properties: Vec<(StringId, DecodedValue)>,
}

/// The converter's output: every object reached during the walk, keyed by
/// object id, independent of the archive bytes once built.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    pub objects: BTreeMap<ObjectId, DecodedObject>,
    pub root: Option<ObjectId>,
}

impl DecodedDocument {
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&DecodedObject> {
        self.objects.get(&id)
    }
}

/// Converts an archive's byte block into a [`DecodedDocument`] by driving
/// a [`DocumentBuilder`] over it.
pub fn convert_to_document(buffer: &[u8], mask: PropertyMask) -> Result<DecodedDocument, Error> {
    let mut builder = DocumentBuilder::default();
    drive(buffer, mask, &mut builder)?;
    Ok(builder.finish())
}

/// Rows contributed to one object-array property, indexed by group-local
/// position until the whole traversal finishes and they can be sorted and
/// attached as a single array property.
type PendingRows = BTreeMap<(ObjectId, StringId), BTreeMap<u32, Vec<(StringId, DecodedValue)>>>;

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: DecodedDocument,
    pending_rows: PendingRows,
}

impl DocumentBuilder {
    #[must_use]
    pub fn finish(mut self) -> DecodedDocument {
        for ((owner, key), rows) in std::mem::take(&mut self.pending_rows) {
            let row_values =
                rows.into_values().map(DecodedValue::Row).collect::<Vec<_>>();
            self.ensure_object(owner).properties.push((key, DecodedValue::Array(row_values)));
        }
        self.document
    }

    fn ensure_object(&mut self, id: ObjectId) -> &mut DecodedObject {
        self.document.objects.entry(id).or_default()
    }
}

fn scalar_column_value(values: &ScalarColumn, i: usize) -> DecodedValue {
    match values {
        ScalarColumn::Null => DecodedValue::Null,
        ScalarColumn::Bool(v) => DecodedValue::Bool(v[i]),
        ScalarColumn::I8(v) => DecodedValue::I8(v[i]),
        ScalarColumn::I16(v) => DecodedValue::I16(v[i]),
        ScalarColumn::I32(v) => DecodedValue::I32(v[i]),
        ScalarColumn::I64(v) => DecodedValue::I64(v[i]),
        ScalarColumn::U8(v) => DecodedValue::U8(v[i]),
        ScalarColumn::U16(v) => DecodedValue::U16(v[i]),
        ScalarColumn::U32(v) => DecodedValue::U32(v[i]),
        ScalarColumn::U64(v) => DecodedValue::U64(v[i]),
        ScalarColumn::F32(v) => DecodedValue::F32(v[i]),
        ScalarColumn::StringId(v) => DecodedValue::String(v[i]),
    }
}

/// Replaces a typed sentinel with `DecodedValue::Null`: a JSON null
/// inside a typed array round-trips to a JSON null, not the sentinel
/// numeric.
fn array_entry_to_decoded(entry: &ArrayEntry) -> DecodedValue {
    fn squash<T: Copy, F: Fn(T) -> DecodedValue>(values: &[T], to_value: F) -> DecodedValue {
        if values.len() == 1 {
            to_value(values[0])
        } else {
            DecodedValue::Array(values.iter().copied().map(to_value).collect())
        }
    }

    match entry {
        ArrayEntry::Null(count) => {
            if *count == 1 {
                DecodedValue::Null
            } else {
                DecodedValue::Array(vec![DecodedValue::Null; *count as usize])
            }
        }
        ArrayEntry::Bool(v) => squash(v, |x| if x { DecodedValue::Bool(true) } else { DecodedValue::Bool(false) }),
        ArrayEntry::I8(v) => squash(v, |x| if x == sentinel::I8 { DecodedValue::Null } else { DecodedValue::I8(x) }),
        ArrayEntry::I16(v) => squash(v, |x| if x == sentinel::I16 { DecodedValue::Null } else { DecodedValue::I16(x) }),
        ArrayEntry::I32(v) => squash(v, |x| if x == sentinel::I32 { DecodedValue::Null } else { DecodedValue::I32(x) }),
        ArrayEntry::I64(v) => squash(v, |x| if x == sentinel::I64 { DecodedValue::Null } else { DecodedValue::I64(x) }),
        ArrayEntry::U8(v) => squash(v, |x| if x == sentinel::U8 { DecodedValue::Null } else { DecodedValue::U8(x) }),
        ArrayEntry::U16(v) => squash(v, |x| if x == sentinel::U16 { DecodedValue::Null } else { DecodedValue::U16(x) }),
        ArrayEntry::U32(v) => squash(v, |x| if x == sentinel::U32 { DecodedValue::Null } else { DecodedValue::U32(x) }),
        ArrayEntry::U64(v) => squash(v, |x| if x == sentinel::U64 { DecodedValue::Null } else { DecodedValue::U64(x) }),
        ArrayEntry::F32(v) => squash(v, |x| if sentinel::f32_is_null(x) { DecodedValue::Null } else { DecodedValue::F32(x) }),
        ArrayEntry::StringId(v) => {
            squash(v, |x| if x == sentinel::string_id_null() { DecodedValue::Null } else { DecodedValue::String(x) })
        }
    }
}

impl VisitorCallbacks for DocumentBuilder {
    fn visit_root_object(&mut self, object_id: ObjectId) {
        self.document.root = Some(object_id);
        self.ensure_object(object_id);
    }

    fn before_object_visit(&mut self, _path: &Path, object_id: ObjectId) -> VisitPolicy {
        self.ensure_object(object_id);
        VisitPolicy::Include
    }

    fn visit_object_property(&mut self, _path: &Path, parent_id: ObjectId, key: StringId, child_id: ObjectId) {
        self.ensure_object(child_id);
        self.ensure_object(parent_id).properties.push((key, DecodedValue::ObjectRef(child_id)));
    }

    fn visit_scalar_pairs(&mut self, _path: &Path, object_id: ObjectId, keys: &[StringId], values: ScalarColumn) {
        let decoded: Vec<_> = (0..keys.len()).map(|i| scalar_column_value(&values, i)).collect();
        let object = self.ensure_object(object_id);
        for (key, value) in keys.iter().copied().zip(decoded) {
            object.properties.push((key, value));
        }
    }

    fn visit_array_pair(&mut self, _path: &Path, object_id: ObjectId, key: StringId, _index: usize, entry: ArrayEntry) {
        let value = DecodedValue::Array(match array_entry_to_decoded(&entry) {
            DecodedValue::Array(values) => values,
            scalar => vec![scalar],
        });
        self.ensure_object(object_id).properties.push((key, value));
    }

    fn before_object_array_object_property_object(
        &mut self,
        _path: &Path,
        group_object_id: ObjectId,
        group_key: StringId,
        nested_key: StringId,
        position: u32,
        child_id: ObjectId,
    ) {
        self.ensure_object(child_id);
        self.pending_rows
            .entry((group_object_id, group_key))
            .or_default()
            .entry(position)
            .or_default()
            .push((nested_key, DecodedValue::ObjectRef(child_id)));
    }

    fn visit_object_array_prop(
        &mut self,
        _path: &Path,
        object_id: ObjectId,
        key: StringId,
        nested_key: StringId,
        contributor_index: u32,
        entry: ArrayEntry,
    ) {
        let value = array_entry_to_decoded(&entry);
        self.pending_rows
            .entry((object_id, key))
            .or_default()
            .entry(contributor_index)
            .or_default()
            .push((nested_key, value));
    }
}
