//! Parsing of per-procedure replies (the client's receive side).

use std::io::Read;

use crate::parser::attr::{dir_entry, file_attr};
use crate::parser::primitive::{bool, i32, i64, option, u32, u64, vec_max_size};
use crate::parser::Result;
use crate::wire::{
    GetAttrReply, ReadChunk, ReaddirEntry, StatusReply, VerfReply, WriteReply, MSG,
};

pub fn verf(src: &mut impl Read) -> Result<VerfReply> {
    Ok(VerfReply { verf: u64(src)? })
}

pub fn status(src: &mut impl Read) -> Result<StatusReply> {
    Ok(StatusReply { err: u32(src)? })
}

pub fn get_attr(src: &mut impl Read) -> Result<GetAttrReply> {
    Ok(GetAttrReply { err: u32(src)?, attr: option(src, file_attr)? })
}

pub fn read_chunk(src: &mut impl Read) -> Result<ReadChunk> {
    Ok(ReadChunk {
        err: u32(src)?,
        count: i32(src)?,
        eof: bool(src)?,
        data: vec_max_size(src, MSG)?,
    })
}

pub fn write(src: &mut impl Read) -> Result<WriteReply> {
    Ok(WriteReply { err: u32(src)?, size: i64(src)? })
}

pub fn readdir_entry(src: &mut impl Read) -> Result<ReaddirEntry> {
    Ok(ReaddirEntry {
        err: u32(src)?,
        last: bool(src)?,
        entry: option(src, |src| Ok((dir_entry(src)?, file_attr(src)?)))?,
    })
}
