//! Positioned, byte-oriented reads over an owned/borrowed byte block.
//!
//! Adapted from `llvm-bitcode`'s `bits::Cursor`: a borrowed slice plus an
//! internal offset, with typed read methods and a truncating `Debug` impl.
//! The unit changes from bits (bitcode is bit-packed) to bytes (archive
//! records are byte-aligned little-endian); the shape — borrowed slice,
//! no copying, `O(1)` positioned reads — is unchanged.

use std::fmt;

pub use crate::error::MemfileError as Error;

/// A read-only, non-owning cursor over one archive's byte block.
///
/// Cheap to clone (`Clone` just copies the slice reference and offset);
/// every [`crate::archive`] iterator layer creates its own cursor instance
/// rather than sharing mutable state.
#[derive(Clone)]
pub struct Cursor<'input> {
    buffer: &'input [u8],
    offset: usize,
}

impl<'input> Cursor<'input> {
    #[must_use]
    pub fn new(buffer: &'input [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    #[must_use]
    pub fn at(buffer: &'input [u8], offset: usize) -> Self {
        Self { buffer, offset }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    pub fn seek(&mut self, offset: usize) -> Result<(), Error> {
        if offset > self.buffer.len() {
            return Err(Error::SeekFailed);
        }
        self.offset = offset;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), Error> {
        let end = self.offset.checked_add(count).ok_or(Error::SkipFailed)?;
        if end > self.buffer.len() {
            return Err(Error::SkipFailed);
        }
        self.offset = end;
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'input [u8], Error> {
        let end = self.offset.checked_add(len).ok_or(Error::BufferOverflow)?;
        let bytes = self.buffer.get(self.offset..end).ok_or(Error::BufferOverflow)?;
        self.offset = end;
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'input [u8], Error> {
        self.take(len)
    }

    pub fn peek_bytes(&self, len: usize) -> Result<&'input [u8], Error> {
        self.buffer.get(self.offset..self.offset + len).ok_or(Error::BufferOverflow)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read `count` contiguous little-endian `u64`s without materializing
    /// an intermediate byte copy per element.
    pub fn read_u64_list(&mut self, count: usize) -> Result<Vec<u64>, Error> {
        let bytes = self.take(count * 8)?;
        Ok(bytes.chunks_exact(8).map(|c| u64::from_le_bytes(c.try_into().unwrap())).collect())
    }

    pub fn read_u32_list(&mut self, count: usize) -> Result<Vec<u32>, Error> {
        let bytes = self.take(count * 4)?;
        Ok(bytes.chunks_exact(4).map(|c| u32::from_le_bytes(c.try_into().unwrap())).collect())
    }
}

struct DebugBytes<'a>(&'a [u8]);

impl fmt::Debug for DebugBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[0x")?;
        for b in self.0.iter().take(64) {
            write!(f, "{b:02x}")?;
        }
        if self.0.len() > 64 {
            f.write_str("...")?;
        }
        write!(f, "; {}]", self.0.len())
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.offset)
            .field("remaining", &DebugBytes(&self.buffer[self.offset.min(self.buffer.len())..]))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_scalars() {
        let mut c = Cursor::new(&[0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0xFF]);
        assert_eq!(c.read_u16().unwrap(), 1);
        assert_eq!(c.read_u32().unwrap(), 2);
        assert_eq!(c.read_u8().unwrap(), 0xFF);
        assert!(c.is_at_end());
    }

    #[test]
    fn out_of_bounds_reads_fail() {
        let mut c = Cursor::new(&[0x01]);
        assert!(c.read_u32().is_err());
    }

    #[test]
    fn list_reads_match_scalar_reads() {
        let bytes = [1u64, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        let mut c = Cursor::new(&bytes);
        assert_eq!(c.read_u64_list(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn seek_and_skip_respect_bounds() {
        let mut c = Cursor::new(&[0u8; 8]);
        c.seek(4).unwrap();
        assert_eq!(c.position(), 4);
        assert!(c.seek(9).is_err());
        c.skip(4).unwrap();
        assert!(c.is_at_end());
        assert!(c.skip(1).is_err());
    }
}
