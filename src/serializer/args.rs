//! Serialization of complete call bodies (the client's send side).
//!
//! Every function emits the call header (transaction id, procedure number)
//! followed by the procedure's arguments, producing one frame body.

use std::io::{self, Write};

use crate::serializer::attr::file_time;
use crate::serializer::{bool, string_max_size, u32, u64, variant, vec_max_size};
use crate::vfs::{FileTime, MAX_PATH_LEN};
use crate::wire::{Procedure, MSG};

/// Serializes the call header shared by every procedure.
pub fn header(dest: &mut dyn Write, xid: u32, procedure: Procedure) -> io::Result<()> {
    u32(dest, xid).and_then(|_| variant(dest, procedure))
}

pub fn null(dest: &mut dyn Write, xid: u32, probe: u64) -> io::Result<()> {
    header(dest, xid, Procedure::Null)?;
    u64(dest, probe)
}

/// Serializes a call for any procedure whose only argument is a path
/// (GetAttr, Lookup, Readdir, Unlink, Rmdir).
pub fn path_call(dest: &mut dyn Write, xid: u32, procedure: Procedure, path: &str) -> io::Result<()> {
    header(dest, xid, procedure)?;
    string_max_size(dest, path, MAX_PATH_LEN)
}

pub fn read(dest: &mut dyn Write, xid: u32, handle: &str, offset: u64, count: u32) -> io::Result<()> {
    header(dest, xid, Procedure::Read)?;
    string_max_size(dest, handle, MAX_PATH_LEN)?;
    u64(dest, offset)?;
    u32(dest, count)
}

/// Serializes one chunk of a Write stream. `path`, `offset` and
/// `total_size` are repeated in every chunk of the stream.
#[allow(clippy::too_many_arguments)]
pub fn write_chunk(
    dest: &mut dyn Write,
    xid: u32,
    path: &str,
    offset: u64,
    total_size: u64,
    last: bool,
    data: &[u8],
) -> io::Result<()> {
    header(dest, xid, Procedure::Write)?;
    string_max_size(dest, path, MAX_PATH_LEN)?;
    u64(dest, offset)?;
    u32(
        dest,
        data.len()
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "chunk exceeds u32"))?,
    )?;
    u64(dest, total_size)?;
    bool(dest, last)?;
    vec_max_size(dest, data, MSG)
}

pub fn truncate(dest: &mut dyn Write, xid: u32, path: &str, size: u64) -> io::Result<()> {
    header(dest, xid, Procedure::Truncate)?;
    string_max_size(dest, path, MAX_PATH_LEN)?;
    u64(dest, size)
}

pub fn mknod(dest: &mut dyn Write, xid: u32, path: &str, mode: u32, rdev: u64) -> io::Result<()> {
    header(dest, xid, Procedure::Mknod)?;
    string_max_size(dest, path, MAX_PATH_LEN)?;
    u32(dest, mode)?;
    u64(dest, rdev)
}

pub fn rename(dest: &mut dyn Write, xid: u32, source: &str, dest_path: &str) -> io::Result<()> {
    header(dest, xid, Procedure::Rename)?;
    string_max_size(dest, source, MAX_PATH_LEN)?;
    string_max_size(dest, dest_path, MAX_PATH_LEN)
}

pub fn mkdir(dest: &mut dyn Write, xid: u32, path: &str, mode: u32) -> io::Result<()> {
    header(dest, xid, Procedure::Mkdir)?;
    string_max_size(dest, path, MAX_PATH_LEN)?;
    u32(dest, mode)
}

pub fn utimens(
    dest: &mut dyn Write,
    xid: u32,
    path: &str,
    atime: FileTime,
    mtime: FileTime,
) -> io::Result<()> {
    header(dest, xid, Procedure::Utimens)?;
    string_max_size(dest, path, MAX_PATH_LEN)?;
    file_time(dest, atime)?;
    file_time(dest, mtime)
}

pub fn commit(dest: &mut dyn Write, xid: u32, verf: u64) -> io::Result<()> {
    header(dest, xid, Procedure::Commit)?;
    u64(dest, verf)
}
