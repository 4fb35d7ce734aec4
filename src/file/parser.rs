//! Cursor over a snapshot buffer.
//!
//! [`Parser`] tracks a position within a borrowed byte slice and decodes the
//! primitives of the snapshot format from it. Every read is bounds-checked; a
//! short buffer yields [`crate::Error::OutOfBounds`] and undecodable content yields
//! [`crate::Error::Malformed`].

use crate::{
    file::io::{read_le_at, ByteIO},
    Error::OutOfBounds,
    Result,
};

/// A bounds-checked reader over a byte slice.
///
/// # Examples
///
/// ```rust
/// use edgeloom::file::parser::Parser;
///
/// let data = [0x2A, 0x00, 5, b'H', b'e', b'l', b'l', b'o'];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_le::<u16>()?, 42);
/// assert_eq!(parser.read_prefixed_string_utf8()?, "Hello");
/// assert!(!parser.has_more_data());
/// # Ok::<(), edgeloom::Error>(())
/// ```
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` while unread bytes remain.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the current position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Reads a little-endian `T` and advances past it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
    pub fn read_le<T: ByteIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Reads a byte that must be `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for any other byte value.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_le::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(malformed_error!(
                "invalid boolean {} at offset {}",
                other,
                self.position - 1
            )),
        }
    }

    /// Reads an unsigned integer stored 7 bits per byte.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] on truncation and
    /// [`crate::Error::Malformed`] if the value does not fit a `u32`.
    pub fn read_7bit_encoded_int(&mut self) -> Result<u32> {
        let mut value = 0u32;
        let mut shift = 0;

        loop {
            if self.position >= self.data.len() {
                return Err(OutOfBounds);
            }

            let byte = self.data[self.position];
            self.position += 1;

            if shift == 28 && byte > 0x0F {
                return Err(malformed_error!(
                    "7-bit encoded integer overflow at offset {}",
                    self.position - 1
                ));
            }
            value |= u32::from(byte & 0x7F) << shift;
            shift += 7;

            if (byte & 0x80) == 0 {
                break;
            }
        }

        Ok(value)
    }

    /// Reads a 7-bit encoded count or position as `usize`.
    ///
    /// # Errors
    ///
    /// As [`read_7bit_encoded_int`](Self::read_7bit_encoded_int).
    pub fn read_count(&mut self) -> Result<usize> {
        let value = self.read_7bit_encoded_int()?;
        usize::try_from(value).map_err(|_| malformed_error!("count {} exceeds usize", value))
    }

    /// Reads `length` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.position.checked_add(length).ok_or(OutOfBounds)?;
        if end > self.data.len() {
            return Err(OutOfBounds);
        }
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Reads a 7-bit length prefix followed by that many raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let length = self.read_count()?;
        self.read_bytes(length)
    }

    /// Reads a 7-bit length prefix followed by that many UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is too short and
    /// [`crate::Error::Malformed`] for invalid UTF-8.
    pub fn read_prefixed_string_utf8(&mut self) -> Result<String> {
        let start = self.position;
        let bytes = self.read_prefixed_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| malformed_error!("invalid UTF-8 string at offset {}: {}", start, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::io::write_7bit_encoded_int;

    #[test]
    fn test_read_7bit_encoded_int() {
        let cases: [(&[u8], u32); 4] = [
            (&[0x00], 0),
            (&[0x7F], 127),
            (&[0x80, 0x01], 128),
            (&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], u32::MAX),
        ];
        for (data, expected) in cases {
            let mut parser = Parser::new(data);
            assert_eq!(parser.read_7bit_encoded_int().unwrap(), expected);
            assert!(!parser.has_more_data());
        }
    }

    #[test]
    fn test_read_7bit_encoded_int_truncated() {
        let mut parser = Parser::new(&[0x80, 0x80]);
        assert!(matches!(parser.read_7bit_encoded_int(), Err(OutOfBounds)));
    }

    #[test]
    fn test_read_7bit_encoded_int_overflow() {
        let mut parser = Parser::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x10]);
        assert!(parser.read_7bit_encoded_int().unwrap_err().is_io_error());
    }

    #[test]
    fn test_7bit_agrees_with_writer() {
        let mut buffer = Vec::new();
        for value in [1u32, 300, 70_000, 1 << 30] {
            write_7bit_encoded_int(&mut buffer, value);
        }
        let mut parser = Parser::new(&buffer);
        for value in [1u32, 300, 70_000, 1 << 30] {
            assert_eq!(parser.read_7bit_encoded_int().unwrap(), value);
        }
    }

    #[test]
    fn test_read_bool() {
        let mut parser = Parser::new(&[0, 1, 2]);
        assert!(!parser.read_bool().unwrap());
        assert!(parser.read_bool().unwrap());
        assert!(parser.read_bool().is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut parser = Parser::new(&[2, 0xC3, 0x28]);
        assert!(matches!(
            parser.read_prefixed_string_utf8(),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_failed_read_keeps_position() {
        let mut parser = Parser::new(&[0x01, 0x02, 0x03]);
        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0201);
        assert_eq!(parser.pos(), 2);

        assert!(parser.read_le::<u32>().is_err());
        assert_eq!(parser.pos(), 2);
        assert_eq!(parser.remaining(), 1);
    }
}
