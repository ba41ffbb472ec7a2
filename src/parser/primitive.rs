//! Primitive wire data type parsing utilities.
//!
//! All multibyte values travel in big-endian (network) byte order.

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};
use num_traits::{FromPrimitive, ToPrimitive};

use super::{Error, Result};

/// Parses a `u32` from the `Read` source.
pub fn u32(src: &mut impl Read) -> Result<u32> {
    src.read_u32::<BigEndian>().map_err(Error::IO)
}

/// Parses a `u64` from the `Read` source.
pub fn u64(src: &mut impl Read) -> Result<u64> {
    src.read_u64::<BigEndian>().map_err(Error::IO)
}

/// Parses an `i32` from the `Read` source.
pub fn i32(src: &mut impl Read) -> Result<i32> {
    src.read_i32::<BigEndian>().map_err(Error::IO)
}

/// Parses an `i64` from the `Read` source.
pub fn i64(src: &mut impl Read) -> Result<i64> {
    src.read_i64::<BigEndian>().map_err(Error::IO)
}

/// Parses a boolean encoded as a single `u32` discriminant.
pub fn bool(src: &mut impl Read) -> Result<bool> {
    match u32(src)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(Error::EnumDiscMismatch),
    }
}

/// Parses an optional value: a boolean discriminator preceding the payload.
pub fn option<T, S: Read>(
    src: &mut S,
    cont: impl FnOnce(&mut S) -> Result<T>,
) -> Result<Option<T>> {
    match bool(src)? {
        true => Ok(Some(cont(src)?)),
        false => Ok(None),
    }
}

/// Parses a variable-length byte vector: a `u32` length followed by the data.
pub fn vector(src: &mut impl Read) -> Result<Vec<u8>> {
    let size = u32_as_usize(src)?;
    let mut vec = vec![0u8; size];
    src.read_exact(vec.as_mut_slice()).map_err(Error::IO)?;
    Ok(vec)
}

/// Parses a variable-length byte vector with a maximum allowed size.
pub fn vec_max_size(src: &mut impl Read, max_size: usize) -> Result<Vec<u8>> {
    let size = u32_as_usize(src)?;
    if size > max_size {
        return Err(Error::MaxElemLimit);
    }
    let mut vec = vec![0u8; size];
    src.read_exact(vec.as_mut_slice()).map_err(Error::IO)?;
    Ok(vec)
}

/// Parses a UTF-8 string with a maximum allowed size.
pub fn string_max_size(src: &mut impl Read, max_size: usize) -> Result<String> {
    let vec = vec_max_size(src, max_size)?;
    String::from_utf8(vec).map_err(Error::IncorrectString)
}

/// Parses an enum variant encoded as a `u32` discriminant.
pub fn variant<T: FromPrimitive>(src: &mut impl Read) -> Result<T> {
    FromPrimitive::from_u32(u32(src)?).ok_or(Error::EnumDiscMismatch)
}

/// Parses a `u32` and converts it to `usize`.
pub fn u32_as_usize(src: &mut impl Read) -> Result<usize> {
    u32(src)?.to_usize().ok_or(Error::ImpossibleTypeCast)
}
