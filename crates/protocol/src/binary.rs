//! Binary reading and writing utilities for the sync protocol.
//!
//! All values are little-endian. Reads are bounds-checked and return
//! [`ProtocolError::UnexpectedEof`] instead of panicking on short input.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// A reader for parsing binary protocol messages.
#[derive(Debug)]
pub struct BinaryReader {
    buf: Bytes,
}

impl BinaryReader {
    /// Create a new reader from raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { buf: data.into() }
    }

    /// Returns remaining bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    #[inline]
    fn need(&self, n: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() >= n {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedEof)
        }
    }

    #[inline]
    pub fn get_u8(&mut self) -> Result<u8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    #[inline]
    pub fn get_u32(&mut self) -> Result<u32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    #[inline]
    pub fn get_u64(&mut self) -> Result<u64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Read an `f32`, rejecting NaN and infinities.
    #[inline]
    pub fn get_f32(&mut self, field: &'static str) -> Result<f32, ProtocolError> {
        self.need(4)?;
        let v = self.buf.get_f32_le();
        if v.is_finite() {
            Ok(v)
        } else {
            Err(ProtocolError::NonFinite(field))
        }
    }

    /// Read a collection length prefix and check it against `limit`.
    pub fn get_len(&mut self, limit: u32) -> Result<usize, ProtocolError> {
        let len = self.get_u32()?;
        if len > limit {
            return Err(ProtocolError::TooManyItems(len, limit));
        }
        Ok(len as usize)
    }

    /// Read a null-terminated UTF-8 string.
    pub fn get_string_utf8(&mut self) -> Result<String, ProtocolError> {
        let mut bytes = Vec::new();
        loop {
            let b = self.get_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Fail if anything is left unread.
    pub fn finish(&self) -> Result<(), ProtocolError> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }
}

/// A writer for building binary protocol messages.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    /// Create a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the current length.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    #[inline]
    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    #[inline]
    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    #[inline]
    pub fn put_f32(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    /// Write a collection length prefix, refusing anything a reader with
    /// the same `limit` would reject.
    pub fn put_len(&mut self, len: usize, limit: u32) -> Result<(), ProtocolError> {
        if len > limit as usize {
            let reported = u32::try_from(len).unwrap_or(u32::MAX);
            return Err(ProtocolError::TooManyItems(reported, limit));
        }
        self.buf.put_u32_le(len as u32);
        Ok(())
    }

    /// Write a null-terminated UTF-8 string. Interior NULs are dropped.
    pub fn put_string_utf8(&mut self, s: &str) {
        for b in s.bytes().filter(|&b| b != 0) {
            self.buf.put_u8(b);
        }
        self.buf.put_u8(0);
    }

    /// Consume the writer and return the built buffer.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Get current buffer as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_u64() {
        let mut w = BinaryWriter::new();
        w.put_u64(0xDEAD_BEEF_0000_0007);
        let mut r = BinaryReader::new(w.finish());
        assert_eq!(r.get_u64(), Ok(0xDEAD_BEEF_0000_0007));
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_string_utf8_strips_interior_nul() {
        let mut w = BinaryWriter::new();
        w.put_string_utf8("he\0llo");
        let mut r = BinaryReader::new(w.finish());
        assert_eq!(r.get_string_utf8().as_deref(), Ok("hello"));
    }

    #[test]
    fn test_short_read_is_an_error() {
        let mut r = BinaryReader::new(vec![1u8, 2]);
        assert_eq!(r.get_u32(), Err(ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let mut r = BinaryReader::new(b"abc".to_vec());
        assert_eq!(r.get_string_utf8(), Err(ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_nan_rejected() {
        let mut w = BinaryWriter::new();
        w.put_f32(f32::NAN);
        let mut r = BinaryReader::new(w.finish());
        assert_eq!(r.get_f32("x"), Err(ProtocolError::NonFinite("x")));
    }

    #[test]
    fn test_length_limit() {
        let mut w = BinaryWriter::new();
        w.put_len(10, 16).unwrap();
        let mut r = BinaryReader::new(w.finish());
        assert_eq!(r.get_len(4), Err(ProtocolError::TooManyItems(10, 4)));
    }

    #[test]
    fn test_oversized_length_is_not_written() {
        let mut w = BinaryWriter::new();
        assert_eq!(w.put_len(17, 16), Err(ProtocolError::TooManyItems(17, 16)));
        assert_eq!(
            w.put_len(usize::MAX, 16),
            Err(ProtocolError::TooManyItems(u32::MAX, 16))
        );
        assert!(w.is_empty());
    }
}
