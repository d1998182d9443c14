//! Archive object header parsing.
//!
//! Grounded on `llvm-bitcode`'s `read::BlockIter`: a thin header-parse step
//! producing a value that shares the same borrowed byte block, rather than
//! copying anything out of it.

use crate::error::ArchiveError;
use crate::field_type::PROPERTY_SLOT_COUNT;
use crate::ids::ObjectId;
use crate::memfile::Cursor;

/// Marker byte preceding an object header in the record table.
pub const OBJECT_BEGIN: u8 = 0xA0;

/// A parsed object header: its id, the 26 property-group offsets, and the
/// offset of the next sibling in its singly-linked list (0 = none).
///
/// Borrows from the same byte block as the [`Cursor`] it was opened from;
/// it never copies the block, only scalar header fields out of it.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveObject {
    pub offset: usize,
    pub object_id: ObjectId,
    pub flags: u32,
    pub prop_offsets: [u64; PROPERTY_SLOT_COUNT],
    pub next_obj_off: u64,
}

impl ArchiveObject {
    /// Property-group offset for slot `index`, or `None` if that slot is
    /// empty: a slot value of zero means no property group of that type
    /// is present on this object.
    #[must_use]
    pub fn slot_offset(&self, index: usize) -> Option<u64> {
        match self.prop_offsets[index] {
            0 => None,
            offset => Some(offset),
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_obj_off != 0
    }
}

/// Reads the object header at `offset` in `buffer`. Fails with
/// `CorruptedHeader` if the marker byte does not match, or if the header
/// runs past the end of the buffer.
pub fn open_object(buffer: &[u8], offset: usize) -> Result<ArchiveObject, ArchiveError> {
    let mut cursor = Cursor::at(buffer, offset);
    let marker = cursor.read_u8()?;
    if marker != OBJECT_BEGIN {
        return Err(ArchiveError::MarkerMismatch { expected: OBJECT_BEGIN, found: marker });
    }
    let object_id = ObjectId(cursor.read_u64()?);
    let flags = cursor.read_u32()?;
    let offsets = cursor.read_u64_list(PROPERTY_SLOT_COUNT)?;
    let mut prop_offsets = [0u64; PROPERTY_SLOT_COUNT];
    prop_offsets.copy_from_slice(&offsets);
    let next_obj_off = cursor.read_u64()?;
    Ok(ArchiveObject { offset, object_id, flags, prop_offsets, next_obj_off })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_header(object_id: u64, prop_offsets: &[u64; PROPERTY_SLOT_COUNT], next: u64) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.push(OBJECT_BEGIN);
        bytes.extend_from_slice(&object_id.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        for offset in prop_offsets {
            bytes.extend_from_slice(&offset.to_le_bytes());
        }
        bytes.extend_from_slice(&next.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_header_fields() {
        let mut offsets = [0u64; PROPERTY_SLOT_COUNT];
        offsets[3] = 128;
        let bytes = encode_header(42, &offsets, 512);
        let object = open_object(&bytes, 0).unwrap();
        assert_eq!(object.object_id, ObjectId(42));
        assert_eq!(object.slot_offset(3), Some(128));
        assert_eq!(object.slot_offset(0), None);
        assert_eq!(object.next_obj_off, 512);
        assert!(object.has_next());
    }

    #[test]
    fn wrong_marker_is_corrupted_header() {
        let mut bytes = encode_header(1, &[0u64; PROPERTY_SLOT_COUNT], 0);
        bytes[0] = 0xFF;
        let err = open_object(&bytes, 0).unwrap_err();
        assert_eq!(err, ArchiveError::MarkerMismatch { expected: OBJECT_BEGIN, found: 0xFF });
    }

    #[test]
    fn truncated_header_is_corrupted() {
        let bytes = vec![OBJECT_BEGIN, 0, 0];
        assert!(open_object(&bytes, 0).is_err());
    }
}
