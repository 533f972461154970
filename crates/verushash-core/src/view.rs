// Consensus-critical. Changes require vector updates + tests.
//! Bounds-checked access to a serialized header + solution buffer.
//!
//! Every read and write validates `offset + len` against the real buffer
//! length first. Nothing is truncated or wrapped.

use crate::types::{CoreError, Hash32};
use byteorder::{ByteOrder, LittleEndian};

/// View over a byte buffer. Reads need `AsRef<[u8]>`, writes `AsMut<[u8]>`.
#[derive(Debug)]
pub struct BinaryView<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> BinaryView<B> {
    /// Wrap a buffer.
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    /// Length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate that `[offset, offset + len)` lies inside the buffer.
    pub fn check(&self, offset: usize, len: usize) -> Result<(), CoreError> {
        let buf_len = self.len();
        match offset.checked_add(len) {
            Some(end) if end <= buf_len => Ok(()),
            _ => Err(CoreError::OutOfRange {
                offset,
                len,
                buf_len,
            }),
        }
    }

    /// Borrow `len` bytes at `offset`.
    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8], CoreError> {
        self.check(offset, len)?;
        Ok(&self.buf.as_ref()[offset..offset + len])
    }

    /// Copy `N` bytes at `offset` into an array.
    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], CoreError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(offset, N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&self, offset: usize) -> Result<u8, CoreError> {
        Ok(self.read_bytes(offset, 1)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn read_u16_le(&self, offset: usize) -> Result<u16, CoreError> {
        Ok(LittleEndian::read_u16(self.read_bytes(offset, 2)?))
    }

    /// Read a little-endian `u32`.
    pub fn read_u32_le(&self, offset: usize) -> Result<u32, CoreError> {
        Ok(LittleEndian::read_u32(self.read_bytes(offset, 4)?))
    }

    /// Read a 32-byte hash.
    pub fn read_hash(&self, offset: usize) -> Result<Hash32, CoreError> {
        self.read_array(offset).map(Hash32)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BinaryView<B> {
    /// Overwrite `len` bytes at `offset` with zeros.
    pub fn write_zeros(&mut self, offset: usize, len: usize) -> Result<(), CoreError> {
        self.check(offset, len)?;
        self.buf.as_mut()[offset..offset + len].fill(0);
        Ok(())
    }
}
