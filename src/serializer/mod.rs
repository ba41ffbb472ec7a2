//! Encoding of WatFS message structures into wire frames.
//!
//! The serializers mirror the parsers exactly: big-endian multibyte values,
//! `u32`-counted byte vectors, enum discriminants as `u32`.

pub mod args;
pub mod attr;
pub mod reply;

use std::io::{self, Error, ErrorKind, Write};

use byteorder::{BigEndian, WriteBytesExt};
use num_traits::ToPrimitive;

/// Serializes a `u32` in big-endian order.
pub fn u32(dest: &mut dyn Write, n: u32) -> io::Result<()> {
    dest.write_u32::<BigEndian>(n)
}

/// Serializes a `u64` in big-endian order.
pub fn u64(dest: &mut dyn Write, n: u64) -> io::Result<()> {
    dest.write_u64::<BigEndian>(n)
}

/// Serializes an `i32` in big-endian order.
pub fn i32(dest: &mut dyn Write, n: i32) -> io::Result<()> {
    dest.write_i32::<BigEndian>(n)
}

/// Serializes an `i64` in big-endian order.
pub fn i64(dest: &mut dyn Write, n: i64) -> io::Result<()> {
    dest.write_i64::<BigEndian>(n)
}

/// Serializes a boolean as a `0`/`1` discriminant.
pub fn bool(dest: &mut dyn Write, b: bool) -> io::Result<()> {
    match b {
        true => dest.write_u32::<BigEndian>(1),
        false => dest.write_u32::<BigEndian>(0),
    }
}

/// Serializes an optional value as a boolean discriminator followed by the
/// payload (if present).
pub fn option<T, S: Write>(
    dest: &mut S,
    opt: Option<T>,
    cont: impl FnOnce(T, &mut S) -> io::Result<()>,
) -> io::Result<()> {
    match opt {
        Some(val) => bool(dest, true).and_then(|_| cont(val, dest)),
        None => bool(dest, false),
    }
}

/// Serializes a variable-length byte vector: length word plus bytes.
pub fn vector(dest: &mut dyn Write, vec: &[u8]) -> io::Result<()> {
    let len = vec
        .len()
        .try_into()
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "vector length exceeds u32"))?;
    dest.write_u32::<BigEndian>(len).and_then(|_| dest.write_all(vec))
}

/// Serializes a variable-length byte vector with an explicit maximum length.
pub fn vec_max_size(dest: &mut dyn Write, vec: &[u8], max_size: usize) -> io::Result<()> {
    if vec.len() > max_size {
        return Err(Error::new(ErrorKind::InvalidInput, "vector out of bounds"));
    }
    vector(dest, vec)
}

/// Serializes a bounded UTF-8 string as a counted byte vector.
pub fn string_max_size(dest: &mut dyn Write, string: &str, max_size: usize) -> io::Result<()> {
    vec_max_size(dest, string.as_bytes(), max_size)
}

/// Serializes an enum variant as a `u32` discriminant.
pub fn variant<T: ToPrimitive>(dest: &mut dyn Write, val: T) -> io::Result<()> {
    dest.write_u32::<BigEndian>(
        ToPrimitive::to_u32(&val)
            .ok_or(Error::new(ErrorKind::InvalidInput, "cannot convert to u32"))?,
    )
}
