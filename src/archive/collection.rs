//! Four-layer collection iterator chain for object-array property groups:
//! collection → column-group → column → entry.
//!
//! Grounded on `original_source/src/include/core/carbon/archive_iter.h`'s
//! `collection_iter_state` (a single struct nesting all four levels);
//! split here into one small owned-state struct per layer, each borrowing
//! from the same root byte block instead of holding raw pointers.

use crate::error::ArchiveError;
use crate::field_type::FieldType;
use crate::ids::{ObjectId, StringId};
use crate::memfile::Cursor;

pub const OBJECT_ARRAYS_GROUP: u8 = 0xC0;
pub const COLUMN_GROUP: u8 = 0xC1;
pub const COLUMN: u8 = 0xC2;

/// Layer 1: the object-arrays property group itself — one entry per
/// distinct object-array field name on the owning object.
#[derive(Debug, Clone)]
pub struct CollectionIter<'input> {
    buffer: &'input [u8],
    group_keys: Vec<StringId>,
    group_offsets: Vec<u64>,
    position: usize,
}

impl<'input> CollectionIter<'input> {
    pub(crate) fn open(buffer: &'input [u8], offset: u64) -> Result<Self, ArchiveError> {
        let mut cursor = Cursor::at(buffer, offset as usize);
        let marker = cursor.read_u8()?;
        if marker != OBJECT_ARRAYS_GROUP {
            return Err(ArchiveError::MarkerMismatch { expected: OBJECT_ARRAYS_GROUP, found: marker });
        }
        let num_column_groups = cursor.read_u32()? as usize;
        let group_keys = cursor.read_u64_list(num_column_groups)?.into_iter().map(StringId).collect();
        let group_offsets = cursor.read_u64_list(num_column_groups)?;
        Ok(Self { buffer, group_keys, group_offsets, position: 0 })
    }

    #[must_use]
    pub fn keys(&self) -> &[StringId] {
        &self.group_keys
    }

    /// Opens the next column group, in table order.
    pub fn next_group(&mut self) -> Option<Result<ColumnGroupIter<'input>, ArchiveError>> {
        if self.position >= self.group_offsets.len() {
            return None;
        }
        let key = self.group_keys[self.position];
        let offset = self.group_offsets[self.position];
        self.position += 1;
        Some(ColumnGroupIter::open(self.buffer, key, offset))
    }
}

/// Layer 2: one object-array field's decomposition into columns, plus the
/// group-local object ids its `entry_positions` index into.
#[derive(Debug, Clone)]
pub struct ColumnGroupIter<'input> {
    buffer: &'input [u8],
    key: StringId,
    object_ids: Vec<ObjectId>,
    column_offsets: Vec<u64>,
    position: usize,
}

impl<'input> ColumnGroupIter<'input> {
    fn open(buffer: &'input [u8], key: StringId, offset: u64) -> Result<Self, ArchiveError> {
        let mut cursor = Cursor::at(buffer, offset as usize);
        let marker = cursor.read_u8()?;
        if marker != COLUMN_GROUP {
            return Err(ArchiveError::MarkerMismatch { expected: COLUMN_GROUP, found: marker });
        }
        let num_columns = cursor.read_u32()? as usize;
        let num_objects = cursor.read_u32()? as usize;
        let object_ids = cursor.read_u64_list(num_objects)?.into_iter().map(ObjectId).collect();
        let column_offsets = cursor.read_u64_list(num_columns)?;
        Ok(Self { buffer, key, object_ids, column_offsets, position: 0 })
    }

    #[must_use]
    pub fn key(&self) -> StringId {
        self.key
    }

    #[must_use]
    pub fn object_ids(&self) -> &[ObjectId] {
        &self.object_ids
    }

    pub fn next_column(&mut self) -> Option<Result<ColumnIter<'input>, ArchiveError>> {
        if self.position >= self.column_offsets.len() {
            return None;
        }
        let offset = self.column_offsets[self.position];
        self.position += 1;
        Some(ColumnIter::open(self.buffer, offset))
    }
}

/// Layer 3: one `(nested-key, nested-type)` column.
#[derive(Debug, Clone)]
pub struct ColumnIter<'input> {
    buffer: &'input [u8],
    name: StringId,
    field_type: FieldType,
    entry_offsets: Vec<u64>,
    entry_positions: Vec<u32>,
    position: usize,
}

impl<'input> ColumnIter<'input> {
    fn open(buffer: &'input [u8], offset: u64) -> Result<Self, ArchiveError> {
        let mut cursor = Cursor::at(buffer, offset as usize);
        let marker = cursor.read_u8()?;
        if marker != COLUMN {
            return Err(ArchiveError::MarkerMismatch { expected: COLUMN, found: marker });
        }
        let name = StringId(cursor.read_u64()?);
        let type_tag = cursor.read_u8()?;
        let field_type = FieldType::try_from(type_tag).map_err(|_| ArchiveError::NoSuchType(type_tag))?;
        let num_entries = cursor.read_u32()? as usize;
        let entry_offsets = cursor.read_u64_list(num_entries)?;
        let entry_positions = cursor.read_u32_list(num_entries)?;
        Ok(Self { buffer, name, field_type, entry_offsets, entry_positions, position: 0 })
    }

    #[must_use]
    pub fn name_and_type(&self) -> (StringId, FieldType) {
        (self.name, self.field_type)
    }

    /// `entry_positions()[i]` is the group-local object index (into the
    /// owning [`ColumnGroupIter::object_ids`]) that contributed entry `i`.
    #[must_use]
    pub fn entry_positions(&self) -> &[u32] {
        &self.entry_positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entry_offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_offsets.is_empty()
    }

    pub fn next_entry(&mut self) -> Option<Result<EntryIter<'input>, ArchiveError>> {
        if self.position >= self.entry_offsets.len() {
            return None;
        }
        let offset = self.entry_offsets[self.position];
        self.position += 1;
        Some(Ok(EntryIter { buffer: self.buffer, field_type: self.field_type, offset }))
    }
}

/// Layer 4: one column entry. Every entry begins with a 4-byte
/// `array_length`; for `object`-typed columns that length is followed by
/// a chain of nested object headers rather than raw scalar bytes.
#[derive(Debug, Clone, Copy)]
pub struct EntryIter<'input> {
    buffer: &'input [u8],
    field_type: FieldType,
    offset: u64,
}

impl<'input> EntryIter<'input> {
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn read_array<T>(
        &self,
        expected: FieldType,
        decode: impl Fn(&mut Cursor<'input>) -> Result<T, crate::error::MemfileError>,
    ) -> Result<(u32, Vec<T>), ArchiveError> {
        if self.field_type != expected {
            return Err(ArchiveError::TypeMismatch);
        }
        let mut cursor = Cursor::at(self.buffer, self.offset as usize);
        let len = cursor.read_u32()?;
        let values = (0..len).map(|_| decode(&mut cursor).map_err(ArchiveError::from)).collect::<Result<Vec<_>, _>>()?;
        Ok((len, values))
    }

    pub fn as_bool(&self) -> Result<(u32, Vec<bool>), ArchiveError> {
        let (len, raw) = self.read_array(FieldType::Bool, Cursor::read_u8)?;
        Ok((len, raw.into_iter().map(|b| b != 0).collect()))
    }
    pub fn as_i8(&self) -> Result<(u32, Vec<i8>), ArchiveError> {
        self.read_array(FieldType::I8, Cursor::read_i8)
    }
    pub fn as_i16(&self) -> Result<(u32, Vec<i16>), ArchiveError> {
        self.read_array(FieldType::I16, Cursor::read_i16)
    }
    pub fn as_i32(&self) -> Result<(u32, Vec<i32>), ArchiveError> {
        self.read_array(FieldType::I32, Cursor::read_i32)
    }
    pub fn as_i64(&self) -> Result<(u32, Vec<i64>), ArchiveError> {
        self.read_array(FieldType::I64, Cursor::read_i64)
    }
    pub fn as_u8(&self) -> Result<(u32, Vec<u8>), ArchiveError> {
        self.read_array(FieldType::U8, Cursor::read_u8)
    }
    pub fn as_u16(&self) -> Result<(u32, Vec<u16>), ArchiveError> {
        self.read_array(FieldType::U16, Cursor::read_u16)
    }
    pub fn as_u32(&self) -> Result<(u32, Vec<u32>), ArchiveError> {
        self.read_array(FieldType::U32, Cursor::read_u32)
    }
    pub fn as_u64(&self) -> Result<(u32, Vec<u64>), ArchiveError> {
        self.read_array(FieldType::U64, Cursor::read_u64)
    }
    pub fn as_f32(&self) -> Result<(u32, Vec<f32>), ArchiveError> {
        self.read_array(FieldType::F32, Cursor::read_f32)
    }
    pub fn as_string_id(&self) -> Result<(u32, Vec<StringId>), ArchiveError> {
        let (len, raw) = self.read_array(FieldType::String, Cursor::read_u64)?;
        Ok((len, raw.into_iter().map(StringId).collect()))
    }

    /// For a `null`-typed column entry: just the count, with no payload.
    pub fn as_null_count(&self) -> Result<u32, ArchiveError> {
        if self.field_type != FieldType::Null {
            return Err(ArchiveError::TypeMismatch);
        }
        let mut cursor = Cursor::at(self.buffer, self.offset as usize);
        Ok(cursor.read_u32()?)
    }

    /// For an `object`-typed column: a sequential view over the linked
    /// list of nested object headers, starting 4 bytes past this entry's
    /// offset.
    pub fn object_iter(&self) -> Result<ObjectChainIter<'input>, ArchiveError> {
        if self.field_type != FieldType::Object {
            return Err(ArchiveError::TypeMismatch);
        }
        Ok(ObjectChainIter { buffer: self.buffer, next_offset: Some(self.offset + 4) })
    }
}

/// Walks a singly-linked list of nested archive objects via
/// `next_obj_off`, terminated by an offset of 0.
#[derive(Debug, Clone)]
pub struct ObjectChainIter<'input> {
    buffer: &'input [u8],
    next_offset: Option<u64>,
}

impl Iterator for ObjectChainIter<'_> {
    type Item = Result<super::object::ArchiveObject, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next_offset?;
        match super::object::open_object(self.buffer, offset as usize) {
            Ok(object) => {
                self.next_offset = if object.has_next() { Some(object.next_obj_off) } else { None };
                Some(Ok(object))
            }
            Err(err) => {
                self.next_offset = None;
                Some(Err(err))
            }
        }
    }
}
