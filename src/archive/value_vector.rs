//! Typed view over one property group.
//!
//! Each accessor decodes little-endian scalars out of the borrowed byte
//! block on demand, the same way `memfile::Cursor`'s typed reads do —
//! this crate has no `bytemuck`-style reinterpret-cast dependency, so
//! "zero-copy" here means "no region of the block is ever copied into an
//! owned buffer ahead of time", not a raw pointer cast.

use crate::error::ArchiveError;
use crate::field_type::FieldType;
use crate::ids::{ObjectId, StringId};
use crate::memfile::Cursor;

pub const FIXED_GROUP: u8 = 0xB0;
pub const ARRAY_GROUP: u8 = 0xB1;
pub const NULL_ARRAY_GROUP: u8 = 0xB2;

/// The group's on-disk shape, determined by its marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupShape {
    Fixed,
    Array,
    NullArray,
}

/// A zero-copy-in-spirit view over one primitive or array property group.
#[derive(Debug, Clone)]
pub struct ValueVector<'input> {
    buffer: &'input [u8],
    object_id: ObjectId,
    field_type: FieldType,
    is_array: bool,
    shape: GroupShape,
    num_entries: usize,
    keys_offset: usize,
    /// For `Array` shape: start of the `lengths` region. For `Fixed`/`NullArray`: start of the payload/counts region.
    secondary_offset: usize,
    payload_offset: usize,
}

impl<'input> ValueVector<'input> {
    pub(crate) fn open(
        buffer: &'input [u8],
        object_id: ObjectId,
        field_type: FieldType,
        is_array: bool,
        group_offset: u64,
    ) -> Result<Self, ArchiveError> {
        let mut cursor = Cursor::at(buffer, group_offset as usize);
        let marker = cursor.read_u8()?;
        let shape = match marker {
            FIXED_GROUP => GroupShape::Fixed,
            ARRAY_GROUP => GroupShape::Array,
            NULL_ARRAY_GROUP => GroupShape::NullArray,
            other => return Err(ArchiveError::MarkerMismatch { expected: FIXED_GROUP, found: other }),
        };
        let num_entries = cursor.read_u32()? as usize;
        let keys_offset = cursor.position();
        cursor.skip(num_entries * 8)?;
        let secondary_offset = cursor.position();
        let payload_offset = match shape {
            GroupShape::Fixed => secondary_offset,
            GroupShape::Array => {
                cursor.skip(num_entries * 4)?;
                cursor.position()
            }
            GroupShape::NullArray => secondary_offset,
        };
        Ok(Self {
            buffer,
            object_id,
            field_type,
            is_array,
            shape,
            num_entries,
            keys_offset,
            secondary_offset,
            payload_offset,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.num_entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    #[must_use]
    pub fn base_type(&self) -> FieldType {
        self.field_type
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.is_array
    }

    #[must_use]
    pub fn keys(&self) -> Vec<StringId> {
        let mut cursor = Cursor::at(self.buffer, self.keys_offset);
        cursor.read_u64_list(self.num_entries).expect("bounds validated at open").into_iter().map(StringId).collect()
    }

    fn require_primitive(&self) -> Result<(), ArchiveError> {
        if self.is_array || self.shape != GroupShape::Fixed {
            return Err(ArchiveError::TypeMismatch);
        }
        Ok(())
    }

    fn require_type(&self, expected: FieldType) -> Result<(), ArchiveError> {
        if self.field_type != expected {
            return Err(ArchiveError::TypeMismatch);
        }
        Ok(())
    }

    /// Reads a contiguous run of fixed-width scalars starting at
    /// `self.payload_offset`, for non-array groups.
    fn read_primitive_column<T>(
        &self,
        expected: FieldType,
        decode: impl Fn(&mut Cursor<'input>) -> Result<T, crate::error::MemfileError>,
    ) -> Result<Vec<T>, ArchiveError> {
        self.require_primitive()?;
        self.require_type(expected)?;
        let mut cursor = Cursor::at(self.buffer, self.payload_offset);
        (0..self.num_entries).map(|_| decode(&mut cursor).map_err(ArchiveError::from)).collect()
    }

    pub fn as_primitives_bool(&self) -> Result<Vec<bool>, ArchiveError> {
        Ok(self
            .read_primitive_column(FieldType::Bool, Cursor::read_u8)?
            .into_iter()
            .map(|b| b != 0)
            .collect())
    }
    pub fn as_primitives_i8(&self) -> Result<Vec<i8>, ArchiveError> {
        self.read_primitive_column(FieldType::I8, Cursor::read_i8)
    }
    pub fn as_primitives_i16(&self) -> Result<Vec<i16>, ArchiveError> {
        self.read_primitive_column(FieldType::I16, Cursor::read_i16)
    }
    pub fn as_primitives_i32(&self) -> Result<Vec<i32>, ArchiveError> {
        self.read_primitive_column(FieldType::I32, Cursor::read_i32)
    }
    pub fn as_primitives_i64(&self) -> Result<Vec<i64>, ArchiveError> {
        self.read_primitive_column(FieldType::I64, Cursor::read_i64)
    }
    pub fn as_primitives_u8(&self) -> Result<Vec<u8>, ArchiveError> {
        self.read_primitive_column(FieldType::U8, Cursor::read_u8)
    }
    pub fn as_primitives_u16(&self) -> Result<Vec<u16>, ArchiveError> {
        self.read_primitive_column(FieldType::U16, Cursor::read_u16)
    }
    pub fn as_primitives_u32(&self) -> Result<Vec<u32>, ArchiveError> {
        self.read_primitive_column(FieldType::U32, Cursor::read_u32)
    }
    pub fn as_primitives_u64(&self) -> Result<Vec<u64>, ArchiveError> {
        self.read_primitive_column(FieldType::U64, Cursor::read_u64)
    }
    pub fn as_primitives_f32(&self) -> Result<Vec<f32>, ArchiveError> {
        self.read_primitive_column(FieldType::F32, Cursor::read_f32)
    }
    pub fn as_primitives_string_id(&self) -> Result<Vec<StringId>, ArchiveError> {
        Ok(self.read_primitive_column(FieldType::String, Cursor::read_u64)?.into_iter().map(StringId).collect())
    }

    /// Valid only for array-of-null groups (`null_array_counts`).
    pub fn null_array_counts(&self) -> Result<Vec<u32>, ArchiveError> {
        if !self.is_array || self.shape != GroupShape::NullArray {
            return Err(ArchiveError::TypeMismatch);
        }
        let mut cursor = Cursor::at(self.buffer, self.secondary_offset);
        Ok(cursor.read_u32_list(self.num_entries)?)
    }

    /// Per-entry element counts for a non-null array group.
    pub fn array_lengths(&self) -> Result<Vec<u32>, ArchiveError> {
        if !self.is_array || self.shape != GroupShape::Array {
            return Err(ArchiveError::TypeMismatch);
        }
        let mut cursor = Cursor::at(self.buffer, self.secondary_offset);
        Ok(cursor.read_u32_list(self.num_entries)?)
    }

    /// `O(i)`: sums `array_lengths[0..i]` to find entry `i`'s start.
    fn array_entry_offset(&self, i: usize, element_width: usize) -> Result<usize, ArchiveError> {
        if i >= self.num_entries {
            return Err(ArchiveError::OutOfBounds { index: i as u32, len: self.num_entries as u32 });
        }
        let lengths = self.array_lengths()?;
        let preceding: u64 = lengths[..i].iter().map(|&l| l as u64).sum();
        Ok(self.payload_offset + preceding as usize * element_width)
    }

    fn read_array_entry<T>(
        &self,
        i: usize,
        expected: FieldType,
        element_width: usize,
        decode: impl Fn(&mut Cursor<'input>) -> Result<T, crate::error::MemfileError>,
    ) -> Result<Vec<T>, ArchiveError> {
        if !self.is_array || self.shape != GroupShape::Array {
            return Err(ArchiveError::TypeMismatch);
        }
        self.require_type(expected)?;
        let lengths = self.array_lengths()?;
        let start = self.array_entry_offset(i, element_width)?;
        let mut cursor = Cursor::at(self.buffer, start);
        (0..lengths[i] as usize).map(|_| decode(&mut cursor).map_err(ArchiveError::from)).collect()
    }

    pub fn array_at_bool(&self, i: usize) -> Result<Vec<bool>, ArchiveError> {
        Ok(self.read_array_entry(i, FieldType::Bool, 1, Cursor::read_u8)?.into_iter().map(|b| b != 0).collect())
    }
    pub fn array_at_i8(&self, i: usize) -> Result<Vec<i8>, ArchiveError> {
        self.read_array_entry(i, FieldType::I8, 1, Cursor::read_i8)
    }
    pub fn array_at_i16(&self, i: usize) -> Result<Vec<i16>, ArchiveError> {
        self.read_array_entry(i, FieldType::I16, 2, Cursor::read_i16)
    }
    pub fn array_at_i32(&self, i: usize) -> Result<Vec<i32>, ArchiveError> {
        self.read_array_entry(i, FieldType::I32, 4, Cursor::read_i32)
    }
    pub fn array_at_i64(&self, i: usize) -> Result<Vec<i64>, ArchiveError> {
        self.read_array_entry(i, FieldType::I64, 8, Cursor::read_i64)
    }
    pub fn array_at_u8(&self, i: usize) -> Result<Vec<u8>, ArchiveError> {
        self.read_array_entry(i, FieldType::U8, 1, Cursor::read_u8)
    }
    pub fn array_at_u16(&self, i: usize) -> Result<Vec<u16>, ArchiveError> {
        self.read_array_entry(i, FieldType::U16, 2, Cursor::read_u16)
    }
    pub fn array_at_u32(&self, i: usize) -> Result<Vec<u32>, ArchiveError> {
        self.read_array_entry(i, FieldType::U32, 4, Cursor::read_u32)
    }
    pub fn array_at_u64(&self, i: usize) -> Result<Vec<u64>, ArchiveError> {
        self.read_array_entry(i, FieldType::U64, 8, Cursor::read_u64)
    }
    pub fn array_at_f32(&self, i: usize) -> Result<Vec<f32>, ArchiveError> {
        self.read_array_entry(i, FieldType::F32, 4, Cursor::read_f32)
    }
    pub fn array_at_string_id(&self, i: usize) -> Result<Vec<StringId>, ArchiveError> {
        Ok(self.read_array_entry(i, FieldType::String, 8, Cursor::read_u64)?.into_iter().map(StringId).collect())
    }

    /// Reads the nested object at this primitive `object` group's `i`-th
    /// offset.
    pub fn object_at(&self, i: usize) -> Result<super::object::ArchiveObject, ArchiveError> {
        self.require_primitive()?;
        self.require_type(FieldType::Object)?;
        let offsets = self.read_primitive_column(FieldType::Object, Cursor::read_u64)?;
        let offset = *offsets.get(i).ok_or(ArchiveError::OutOfBounds { index: i as u32, len: self.num_entries as u32 })?;
        super::object::open_object(self.buffer, offset as usize)
    }
}
