//! Little-endian primitive encoding used by the snapshot format.
//!
//! Reading is bounds-checked against a byte slice and advances a caller-held
//! offset; [`crate::file::parser::Parser`] wraps this into a cursor. Writing
//! appends to a growable buffer so that the whole snapshot can be digested before
//! it reaches the output stream.
//!
//! # Key Components
//!
//! - [`ByteIO`] - fixed-size primitives convertible to and from little-endian bytes
//! - [`read_le`] / [`read_le_at`] - bounds-checked reads
//! - [`write_le`] - appends a primitive
//! - [`write_7bit_encoded_int`] / [`write_prefixed_string_utf8`] - variable-length encodings
//!
//! # Examples
//!
//! ```rust
//! use edgeloom::file::io::{read_le_at, write_le};
//!
//! let mut buffer = Vec::new();
//! write_le(&mut buffer, 1u16);
//! write_le(&mut buffer, -2i32);
//!
//! let mut offset = 0;
//! assert_eq!(read_le_at::<u16>(&buffer, &mut offset)?, 1);
//! assert_eq!(read_le_at::<i32>(&buffer, &mut offset)?, -2);
//! assert_eq!(offset, 6);
//! # Ok::<(), edgeloom::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// A primitive with a fixed-size little-endian representation.
pub trait ByteIO: Sized {
    /// The byte array holding one encoded value, e.g. `[u8; 4]` for `u32`.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decodes a value from little-endian bytes.
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Encodes the value as little-endian bytes.
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_byte_io {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ByteIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )+
    };
}

impl_byte_io!(u8, u16, u32, u64, i32, i64, f64);

/// Reads a `T` from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if `data` is too short.
pub fn read_le<T: ByteIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a `T` at `offset` and advances `offset` past it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: ByteIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = offset.checked_add(type_len).ok_or(OutOfBounds)?;
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Appends `value` to `buffer` in little-endian order.
pub fn write_le<T: ByteIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}

/// Appends `value` using 7 bits per byte, low groups first, with the high bit
/// marking continuation.
pub fn write_7bit_encoded_int(buffer: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        buffer.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
}

/// Appends a 7-bit length prefix followed by the UTF-8 bytes of `value`.
///
/// # Errors
///
/// Returns [`crate::Error::IllegalArgument`] if the string is longer than `u32::MAX` bytes.
pub fn write_prefixed_string_utf8(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    write_prefixed_bytes(buffer, value.as_bytes())
}

/// Appends a 7-bit length prefix followed by `value`.
///
/// # Errors
///
/// Returns [`crate::Error::IllegalArgument`] if `value` is longer than `u32::MAX` bytes.
pub fn write_prefixed_bytes(buffer: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    let length = u32::try_from(value.len())
        .map_err(|_| argument_error!("{} bytes exceed the length prefix", value.len()))?;
    write_7bit_encoded_int(buffer, length);
    buffer.extend_from_slice(value);
    Ok(())
}
