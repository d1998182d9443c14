//! The closed set of primitive field types and their null sentinels.
//!
//! Mirrors the per-type families `llvm-bitcode`'s `schema::enums` module
//! generates for LLVM's closed tag spaces, but dispatches through one
//! `#[repr(u8)]` enum instead of exploding into 26 hand-written structs.

use num_enum::TryFromPrimitive;

use crate::ids::StringId;

/// One of the 13 primitive type tags. The 14th "tag" the governing
/// specification counts is the array/non-array modifier, which is carried
/// alongside a `FieldType` rather than folded into it (see
/// [`PropertySlot`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum FieldType {
    Null = 0,
    Bool = 1,
    I8 = 2,
    I16 = 3,
    I32 = 4,
    I64 = 5,
    U8 = 6,
    U16 = 7,
    U32 = 8,
    U64 = 9,
    F32 = 10,
    String = 11,
    Object = 12,
}

impl FieldType {
    /// All 13 tags, in the fixed order the property iterator state machine
    /// walks them.
    pub const ALL: [FieldType; 13] = [
        FieldType::Null,
        FieldType::Bool,
        FieldType::I8,
        FieldType::I16,
        FieldType::I32,
        FieldType::I64,
        FieldType::U8,
        FieldType::U16,
        FieldType::U32,
        FieldType::U64,
        FieldType::F32,
        FieldType::String,
        FieldType::Object,
    ];

    /// Byte width of one fixed-size scalar of this type, as stored in a
    /// non-array property group payload. `Null` carries no payload.
    #[must_use]
    pub fn fixed_width(self) -> usize {
        match self {
            FieldType::Null => 0,
            FieldType::Bool | FieldType::I8 | FieldType::U8 => 1,
            FieldType::I16 | FieldType::U16 => 2,
            FieldType::I32 | FieldType::U32 | FieldType::F32 => 4,
            FieldType::I64 | FieldType::U64 | FieldType::String | FieldType::Object => 8,
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(self, FieldType::Null | FieldType::Bool | FieldType::String | FieldType::Object)
    }

    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(self, FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64)
    }

    #[must_use]
    pub fn is_unsigned(self) -> bool {
        matches!(self, FieldType::U8 | FieldType::U16 | FieldType::U32 | FieldType::U64)
    }

    /// Whether this type can stand in for `object`-typed arrays. Arrays
    /// whose elements are objects are never stored as a plain array
    /// bucket; they become object-array column groups instead.
    #[must_use]
    pub fn admits_array_bucket(self) -> bool {
        !matches!(self, FieldType::Object)
    }
}

/// `(type, is_array)` pair identifying one of the 26 property-offset slots
/// in an archive object header, plus the distinguished object-arrays slot.
///
/// `13 object-mode states + 12 array-mode states (every type except the
/// object-array's own dedicated slot) + 1 object-arrays slot = 26`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertySlot {
    pub field_type: FieldType,
    pub is_array: bool,
}

impl PropertySlot {
    #[must_use]
    pub fn new(field_type: FieldType, is_array: bool) -> Self {
        Self { field_type, is_array }
    }

    /// Index into the 26-slot property-offset table. `Object` has no array
    /// slot of its own (arrays of objects are the distinguished 26th,
    /// object-arrays, slot).
    #[must_use]
    pub fn index(self) -> usize {
        let type_idx = FieldType::ALL.iter().position(|t| *t == self.field_type).unwrap();
        if !self.is_array {
            type_idx
        } else {
            debug_assert!(self.field_type != FieldType::Object, "use OBJECT_ARRAYS_SLOT");
            FieldType::ALL.len() + type_idx
        }
    }
}

/// Number of non-object-array slots: 13 object-mode + 12 array-mode.
pub const NON_COLLECTION_SLOT_COUNT: usize = FieldType::ALL.len() + (FieldType::ALL.len() - 1);

/// The distinguished 26th slot: object-array column groups.
pub const OBJECT_ARRAYS_SLOT: usize = NON_COLLECTION_SLOT_COUNT;

/// Total property-offset slots in an archive object header.
pub const PROPERTY_SLOT_COUNT: usize = NON_COLLECTION_SLOT_COUNT + 1;

const _: () = assert!(PROPERTY_SLOT_COUNT == 26);

/// Null sentinel bit patterns substituted for a JSON `null` inside a
/// typed array, one per field type.
pub mod sentinel {
    use super::StringId;

    pub const BOOL: u8 = 0xFF;
    pub const I8: i8 = i8::MIN;
    pub const I16: i16 = i16::MIN;
    pub const I32: i32 = i32::MIN;
    pub const I64: i64 = i64::MIN;
    pub const U8: u8 = u8::MAX;
    pub const U16: u16 = u16::MAX;
    pub const U32: u32 = u32::MAX;
    pub const U64: u64 = u64::MAX;

    #[must_use]
    pub fn f32_is_null(v: f32) -> bool {
        v.is_nan()
    }

    #[must_use]
    pub fn f32_null() -> f32 {
        f32::NAN
    }

    #[must_use]
    pub fn string_id_null() -> StringId {
        StringId::RESERVED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_count_matches_spec() {
        assert_eq!(PROPERTY_SLOT_COUNT, 26);
        assert_eq!(OBJECT_ARRAYS_SLOT, 25);
    }

    #[test]
    fn object_has_no_array_slot_of_its_own() {
        // Object's "array" slot would otherwise collide with a real type's
        // array slot; it must sit past every other array slot instead.
        let object_scalar = PropertySlot::new(FieldType::Object, false).index();
        assert_eq!(object_scalar, 12);
        for t in FieldType::ALL.iter().filter(|t| t.admits_array_bucket()) {
            let idx = PropertySlot::new(*t, true).index();
            assert!(idx < OBJECT_ARRAYS_SLOT);
        }
    }

    #[test]
    fn fixed_widths_match_spec_table() {
        assert_eq!(FieldType::I8.fixed_width(), 1);
        assert_eq!(FieldType::U64.fixed_width(), 8);
        assert_eq!(FieldType::String.fixed_width(), 8);
        assert_eq!(FieldType::Null.fixed_width(), 0);
    }
}
