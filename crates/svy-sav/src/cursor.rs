//! Byte-level access to an in-memory SAV file.
//!
//! SAV records are variable-length, so the dictionary is walked with a
//! cursor rather than fixed-size record reads. All multi-byte integers and
//! floats are decoded with the endianness detected from the file header.

use crate::error::{Result, SavError};

/// Byte order of the file, detected from the header layout code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Decode an `i32` from the first four bytes of `bytes`.
    pub fn i32_from(self, bytes: &[u8]) -> i32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[..4]);
        match self {
            Endian::Little => i32::from_le_bytes(buf),
            Endian::Big => i32::from_be_bytes(buf),
        }
    }

    /// Decode an `f64` from the first eight bytes of `bytes`.
    pub fn f64_from(self, bytes: &[u8]) -> f64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        match self {
            Endian::Little => f64::from_le_bytes(buf),
            Endian::Big => f64::from_be_bytes(buf),
        }
    }
}

/// Forward-only cursor over the raw file bytes.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], pos: usize, endian: Endian) -> Self {
        Self { data, pos, endian }
    }

    /// Current offset from the start of the file.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the file.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Take `len` bytes, advancing the cursor.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(SavError::UnexpectedEof { offset: self.pos })?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(SavError::UnexpectedEof { offset: self.pos })?;
        self.pos = end;
        Ok(slice)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Read a 4-byte integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(self.endian.i32_from(bytes))
    }

    /// Read an 8-byte float.
    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        Ok(self.endian.f64_from(bytes))
    }

    /// Read one 8-byte data element.
    pub fn read_element(&mut self) -> Result<[u8; 8]> {
        let bytes = self.take(8)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endian_decoding() {
        assert_eq!(Endian::Little.i32_from(&2i32.to_le_bytes()), 2);
        assert_eq!(Endian::Big.i32_from(&2i32.to_be_bytes()), 2);
        assert_eq!(Endian::Little.f64_from(&100.0f64.to_le_bytes()), 100.0);
        assert_eq!(Endian::Big.f64_from(&100.0f64.to_be_bytes()), 100.0);
    }

    #[test]
    fn test_cursor_take_and_eof() {
        let data = [1u8, 2, 3, 4];
        let mut cursor = ByteCursor::new(&data, 0, Endian::Little);
        assert_eq!(cursor.take(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 2);
        assert!(matches!(
            cursor.take(3),
            Err(SavError::UnexpectedEof { offset: 2 })
        ));
    }

    #[test]
    fn test_cursor_read_i32() {
        let data = 7i32.to_le_bytes();
        let mut cursor = ByteCursor::new(&data, 0, Endian::Little);
        assert_eq!(cursor.read_i32().unwrap(), 7);
    }
}
