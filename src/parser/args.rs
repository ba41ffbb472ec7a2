//! Parsing of per-procedure call arguments (the server's receive side).

use std::io::Read;

use crate::parser::attr::file_time;
use crate::parser::primitive::{bool, string_max_size, u32, u64, vec_max_size};
use crate::parser::Result;
use crate::vfs::MAX_PATH_LEN;
use crate::wire::{
    CommitArgs, MknodArgs, MkdirArgs, NullArgs, PathArgs, ReadArgs, RenameArgs, TruncateArgs,
    UtimensArgs, WriteChunk, MSG,
};

pub fn null(src: &mut impl Read) -> Result<NullArgs> {
    Ok(NullArgs { probe: u64(src)? })
}

pub fn path(src: &mut impl Read) -> Result<PathArgs> {
    Ok(PathArgs { path: string_max_size(src, MAX_PATH_LEN)? })
}

pub fn read(src: &mut impl Read) -> Result<ReadArgs> {
    Ok(ReadArgs {
        handle: string_max_size(src, MAX_PATH_LEN)?,
        offset: u64(src)?,
        count: u32(src)?,
    })
}

pub fn write_chunk(src: &mut impl Read) -> Result<WriteChunk> {
    Ok(WriteChunk {
        path: string_max_size(src, MAX_PATH_LEN)?,
        offset: u64(src)?,
        size: u32(src)?,
        total_size: u64(src)?,
        last: bool(src)?,
        data: vec_max_size(src, MSG)?,
    })
}

pub fn truncate(src: &mut impl Read) -> Result<TruncateArgs> {
    Ok(TruncateArgs { path: string_max_size(src, MAX_PATH_LEN)?, size: u64(src)? })
}

pub fn mknod(src: &mut impl Read) -> Result<MknodArgs> {
    Ok(MknodArgs { path: string_max_size(src, MAX_PATH_LEN)?, mode: u32(src)?, rdev: u64(src)? })
}

pub fn rename(src: &mut impl Read) -> Result<RenameArgs> {
    Ok(RenameArgs {
        source: string_max_size(src, MAX_PATH_LEN)?,
        dest: string_max_size(src, MAX_PATH_LEN)?,
    })
}

pub fn mkdir(src: &mut impl Read) -> Result<MkdirArgs> {
    Ok(MkdirArgs { path: string_max_size(src, MAX_PATH_LEN)?, mode: u32(src)? })
}

pub fn utimens(src: &mut impl Read) -> Result<UtimensArgs> {
    Ok(UtimensArgs {
        path: string_max_size(src, MAX_PATH_LEN)?,
        atime: file_time(src)?,
        mtime: file_time(src)?,
    })
}

pub fn commit(src: &mut impl Read) -> Result<CommitArgs> {
    Ok(CommitArgs { verf: u64(src)? })
}
