//! Decoding of WatFS wire frames into message structures.

pub mod args;
pub mod attr;
pub mod primitive;
pub mod reply;

use std::io::Read;
use std::string::FromUtf8Error;

use num_traits::FromPrimitive;

use crate::wire::{Command, Procedure};

/// Result of parsing operations with error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Decode failure. Any of these is a protocol violation, fatal to the call.
#[derive(Debug)]
pub enum Error {
    /// The source ended early or failed.
    IO(std::io::Error),
    /// An enum discriminant outside the defined range.
    EnumDiscMismatch,
    /// A string field was not valid UTF-8.
    IncorrectString(FromUtf8Error),
    /// A variable-length field exceeded its bound.
    MaxElemLimit,
    /// A length did not fit the platform's `usize`.
    ImpossibleTypeCast,
    /// The call header named a procedure this service does not define.
    UnknownProcedure(u32),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IO(err) => write!(f, "short or failed read: {err}"),
            Error::EnumDiscMismatch => write!(f, "enum discriminant out of range"),
            Error::IncorrectString(err) => write!(f, "invalid string field: {err}"),
            Error::MaxElemLimit => write!(f, "field exceeds protocol bound"),
            Error::ImpossibleTypeCast => write!(f, "length does not fit usize"),
            Error::UnknownProcedure(num) => write!(f, "unknown procedure {num}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Error> for crate::vfs::WatError {
    fn from(_: Error) -> Self {
        crate::vfs::WatError::Protocol
    }
}

/// Parses a whole call frame: transaction id plus the command body.
pub fn call(src: &mut impl Read) -> Result<(u32, Command)> {
    let xid = primitive::u32(src)?;
    Ok((xid, body(src)?))
}

/// Parses the procedure number and its arguments, the part of a call frame
/// after the transaction id.
pub fn body(src: &mut impl Read) -> Result<Command> {
    let num = primitive::u32(src)?;
    let procedure = Procedure::from_u32(num).ok_or(Error::UnknownProcedure(num))?;
    match procedure {
        Procedure::Null => Ok(Command::Null(args::null(src)?)),
        Procedure::GetAttr => Ok(Command::GetAttr(args::path(src)?)),
        Procedure::Lookup => Ok(Command::Lookup(args::path(src)?)),
        Procedure::Read => Ok(Command::Read(args::read(src)?)),
        Procedure::Write => Ok(Command::Write(args::write_chunk(src)?)),
        Procedure::Truncate => Ok(Command::Truncate(args::truncate(src)?)),
        Procedure::Readdir => Ok(Command::Readdir(args::path(src)?)),
        Procedure::Mknod => Ok(Command::Mknod(args::mknod(src)?)),
        Procedure::Unlink => Ok(Command::Unlink(args::path(src)?)),
        Procedure::Rename => Ok(Command::Rename(args::rename(src)?)),
        Procedure::Mkdir => Ok(Command::Mkdir(args::mkdir(src)?)),
        Procedure::Rmdir => Ok(Command::Rmdir(args::path(src)?)),
        Procedure::Utimens => Ok(Command::Utimens(args::utimens(src)?)),
        Procedure::Commit => Ok(Command::Commit(args::commit(src)?)),
    }
}
