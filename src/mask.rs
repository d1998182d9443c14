//! Visit mask bits, backed by `bitflags` — a dependency that `llvm-bitcode`
//! lists but whose retrieved source slice never calls it; this is the seam
//! where this crate actually uses it.

use bitflags::bitflags;

use crate::field_type::FieldType;

bitflags! {
    /// Selects which property groups a [`crate::archive::iter::PropIter`]
    /// or visitor observes. A group passes the mask iff its
    /// primitive-or-array bit is set *and* its type bit is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyMask: u32 {
        const PRIMITIVES = 1 << 0;
        const ARRAYS     = 1 << 1;

        const NULL   = 1 << 2;
        const BOOL   = 1 << 3;
        const I8     = 1 << 4;
        const I16    = 1 << 5;
        const I32    = 1 << 6;
        const I64    = 1 << 7;
        const U8     = 1 << 8;
        const U16    = 1 << 9;
        const U32    = 1 << 10;
        const U64    = 1 << 11;
        const NUMBER = 1 << 12;
        const STRING = 1 << 13;
        const OBJECT = 1 << 14;

        const ANY = Self::PRIMITIVES.bits()
            | Self::ARRAYS.bits()
            | Self::NULL.bits()
            | Self::BOOL.bits()
            | Self::I8.bits()
            | Self::I16.bits()
            | Self::I32.bits()
            | Self::I64.bits()
            | Self::U8.bits()
            | Self::U16.bits()
            | Self::U32.bits()
            | Self::U64.bits()
            | Self::NUMBER.bits()
            | Self::STRING.bits()
            | Self::OBJECT.bits();
    }
}

impl PropertyMask {
    fn type_bit(field_type: FieldType) -> PropertyMask {
        match field_type {
            FieldType::Null => PropertyMask::NULL,
            FieldType::Bool => PropertyMask::BOOL,
            FieldType::I8 => PropertyMask::I8,
            FieldType::I16 => PropertyMask::I16,
            FieldType::I32 => PropertyMask::I32,
            FieldType::I64 => PropertyMask::I64,
            FieldType::U8 => PropertyMask::U8,
            FieldType::U16 => PropertyMask::U16,
            FieldType::U32 => PropertyMask::U32,
            FieldType::U64 => PropertyMask::U64,
            FieldType::F32 => PropertyMask::NUMBER,
            FieldType::String => PropertyMask::STRING,
            FieldType::Object => PropertyMask::OBJECT,
        }
    }

    fn array_or_prim_bit(is_array: bool) -> PropertyMask {
        if is_array { PropertyMask::ARRAYS } else { PropertyMask::PRIMITIVES }
    }

    /// Whether a property group of this `(type, is_array)` passes the mask.
    #[must_use]
    pub fn passes(self, field_type: FieldType, is_array: bool) -> bool {
        self.contains(Self::array_or_prim_bit(is_array)) && self.contains(Self::type_bit(field_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_passes_every_group() {
        let mask = PropertyMask::ANY;
        for t in FieldType::ALL {
            assert!(mask.passes(t, false));
            if t.admits_array_bucket() {
                assert!(mask.passes(t, true));
            }
        }
    }

    #[test]
    fn narrow_mask_filters_by_type_and_shape() {
        let mask = PropertyMask::PRIMITIVES | PropertyMask::I32;
        assert!(mask.passes(FieldType::I32, false));
        assert!(!mask.passes(FieldType::I32, true));
        assert!(!mask.passes(FieldType::I64, false));
    }
}
