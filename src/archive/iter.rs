//! Property iterator state machine.
//!
//! Grounded on `original_source/src/include/core/carbon/archive_iter.h`'s
//! `prop_iter_state` enum and its fixed 28-state walk order; restructured
//! here as a small lookup table instead of the original's giant switch.

use crate::error::ArchiveError;
use crate::field_type::{FieldType, OBJECT_ARRAYS_SLOT};
use crate::ids::ObjectId;
use crate::mask::PropertyMask;

use super::collection::CollectionIter;
use super::object::ArchiveObject;
use super::value_vector::ValueVector;

/// One step in the fixed 28-state walk: `Init`, 13 primitive-group states,
/// 13 array-group states (the last standing in for object-arrays), `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropIterState {
    Init,
    Object(FieldType),
    Array(FieldType),
    /// The distinguished 26th slot; puts the iterator into collection mode.
    ObjectArrays,
    Done,
}

/// Whether the payload of the group the iterator is positioned on is a
/// [`ValueVector`] (ordinary property group) or a [`CollectionIter`]
/// (the object-arrays group).
pub enum Payload<'input> {
    Object(ValueVector<'input>),
    Collection(CollectionIter<'input>),
}

/// Walks one archive object's property groups in fixed type order,
/// yielding only the groups that pass the caller's [`PropertyMask`].
pub struct PropIter<'input> {
    buffer: &'input [u8],
    object: ArchiveObject,
    mask: PropertyMask,
    cursor: usize,
}

/// `(slot_index, state)` for every state between `Init` and `Done`, in
/// fixed order: 13 object-mode slots then 13 array-mode slots (index 25,
/// `object`'s array slot, is `ObjectArrays`).
fn walk_order() -> [(usize, PropIterState); 26] {
    let mut order = [(0usize, PropIterState::Init); 26];
    for (i, t) in FieldType::ALL.iter().enumerate() {
        order[i] = (i, PropIterState::Object(*t));
    }
    for (i, t) in FieldType::ALL.iter().enumerate() {
        let slot = FieldType::ALL.len() + i;
        let state = if *t == FieldType::Object { PropIterState::ObjectArrays } else { PropIterState::Array(*t) };
        order[slot] = (slot, state);
    }
    debug_assert_eq!(order[OBJECT_ARRAYS_SLOT].1, PropIterState::ObjectArrays);
    order
}

fn passes_mask(mask: PropertyMask, state: PropIterState) -> bool {
    match state {
        PropIterState::Init | PropIterState::Done => false,
        PropIterState::Object(t) => mask.passes(t, false),
        PropIterState::Array(t) => mask.passes(t, true),
        PropIterState::ObjectArrays => mask.passes(FieldType::Object, true),
    }
}

impl<'input> PropIter<'input> {
    #[must_use]
    pub fn new(buffer: &'input [u8], object: ArchiveObject, mask: PropertyMask) -> Self {
        Self { buffer, object, mask, cursor: 0 }
    }

    #[must_use]
    pub fn state(&self) -> PropIterState {
        if self.cursor == 0 {
            PropIterState::Init
        } else if self.cursor > 26 {
            PropIterState::Done
        } else {
            walk_order()[self.cursor - 1].1
        }
    }

    /// Advances to the next state whose property-offset slot is non-zero
    /// and which passes the mask, then returns that group's payload.
    /// Advancing past `Done` yields `None` and is idempotent.
    pub fn next(&mut self) -> Option<Result<(PropIterState, Payload<'input>), ArchiveError>> {
        let order = walk_order();
        while self.cursor < 26 {
            let (slot, state) = order[self.cursor];
            self.cursor += 1;
            let Some(offset) = self.object.slot_offset(slot) else { continue };
            if !passes_mask(self.mask, state) {
                continue;
            }
            return Some(self.open_payload(state, offset));
        }
        self.cursor = 27;
        None
    }

    fn open_payload(&self, state: PropIterState, offset: u64) -> Result<(PropIterState, Payload<'input>), ArchiveError> {
        match state {
            PropIterState::Object(t) => {
                let vector = ValueVector::open(self.buffer, self.object.object_id, t, false, offset)?;
                Ok((state, Payload::Object(vector)))
            }
            PropIterState::Array(t) => {
                let vector = ValueVector::open(self.buffer, self.object.object_id, t, true, offset)?;
                Ok((state, Payload::Object(vector)))
            }
            PropIterState::ObjectArrays => {
                let collection = CollectionIter::open(self.buffer, offset)?;
                Ok((state, Payload::Collection(collection)))
            }
            PropIterState::Init | PropIterState::Done => {
                Err(ArchiveError::InternalInvariant("open_payload called on a non-group state"))
            }
        }
    }

    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object.object_id
    }
}

/// Reads the object header at offset 0 and opens a property iterator over
/// it. Convenience used by the visitor driver, whose walk always starts
/// at the record table's root.
pub fn iter_root(buffer: &[u8], mask: PropertyMask) -> Result<PropIter<'_>, ArchiveError> {
    let object = super::object::open_object(buffer, 0)?;
    Ok(PropIter::new(buffer, object, mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::object::{open_object, OBJECT_BEGIN};
    use crate::archive::value_vector::FIXED_GROUP;
    use crate::field_type::PROPERTY_SLOT_COUNT;

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

    fn encode_u8_group(keys: &[u64], values: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.push(FIXED_GROUP);
        bytes.extend_from_slice(&(keys.len() as u32).to_le_bytes());
        for k in keys {
            bytes.extend_from_slice(&k.to_le_bytes());
        }
        bytes.extend_from_slice(values);
        bytes
    }

    #[test]
    fn walk_visits_object_mode_states_in_fixed_order() {
        let header_len = 1 + 8 + 4 + PROPERTY_SLOT_COUNT * 8 + 8;
        let u8_slot_idx = FieldType::ALL.iter().position(|t| *t == FieldType::U8).unwrap();
        let bool_slot_idx = FieldType::ALL.iter().position(|t| *t == FieldType::Bool).unwrap();

        let mut offsets = [0u64; PROPERTY_SLOT_COUNT];
        let bool_group_off = header_len as u64;
        offsets[bool_slot_idx] = bool_group_off;

        let bool_group = encode_u8_group(&[7], &[1u8]);
        let u8_group_off = bool_group_off + bool_group.len() as u64;
        offsets[u8_slot_idx] = u8_group_off;
        let u8_group = encode_u8_group(&[9], &[42u8]);

        let mut bytes = encode_header(1, &offsets);
        bytes.extend_from_slice(&bool_group);
        bytes.extend_from_slice(&u8_group);

        let object = open_object(&bytes, 0).unwrap();
        let mut iter = PropIter::new(&bytes, object, PropertyMask::ANY);

        let (state1, payload1) = iter.next().unwrap().unwrap();
        assert_eq!(state1, PropIterState::Object(FieldType::Bool));
        match payload1 {
            Payload::Object(v) => assert_eq!(v.as_primitives_bool().unwrap(), vec![true]),
            Payload::Collection(_) => panic!("expected object payload"),
        }

        let (state2, payload2) = iter.next().unwrap().unwrap();
        assert_eq!(state2, PropIterState::Object(FieldType::U8));
        match payload2 {
            Payload::Object(v) => assert_eq!(v.as_primitives_u8().unwrap(), vec![42]),
            Payload::Collection(_) => panic!("expected object payload"),
        }

        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn mask_filters_groups_by_type() {
        let header_len = 1 + 8 + 4 + PROPERTY_SLOT_COUNT * 8 + 8;
        let u8_slot_idx = FieldType::ALL.iter().position(|t| *t == FieldType::U8).unwrap();
        let mut offsets = [0u64; PROPERTY_SLOT_COUNT];
        offsets[u8_slot_idx] = header_len as u64;
        let mut bytes = encode_header(1, &offsets);
        bytes.extend_from_slice(&encode_u8_group(&[9], &[42u8]));

        let object = open_object(&bytes, 0).unwrap();
        let mut iter = PropIter::new(&bytes, object, PropertyMask::PRIMITIVES | PropertyMask::BOOL);
        assert!(iter.next().is_none());
    }
}
