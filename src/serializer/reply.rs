//! Serialization of complete reply bodies (the server's send side).
//!
//! Every reply frame starts with the transaction id of the call it answers.

use std::io::{self, Write};

use crate::serializer::attr::{dir_entry, file_attr};
use crate::serializer::{bool, i32, i64, option, u32, u64, vec_max_size};
use crate::wire::{
    GetAttrReply, ReadChunk, ReaddirEntry, StatusReply, VerfReply, WriteReply, MSG,
};

pub fn verf(dest: &mut dyn Write, xid: u32, reply: VerfReply) -> io::Result<()> {
    u32(dest, xid)?;
    u64(dest, reply.verf)
}

pub fn status(dest: &mut dyn Write, xid: u32, reply: StatusReply) -> io::Result<()> {
    u32(dest, xid)?;
    u32(dest, reply.err)
}

pub fn get_attr(dest: &mut impl Write, xid: u32, reply: &GetAttrReply) -> io::Result<()> {
    u32(dest, xid)?;
    u32(dest, reply.err)?;
    option(dest, reply.attr.as_ref(), |attr, dest| file_attr(dest, attr))
}

pub fn read_chunk(dest: &mut dyn Write, xid: u32, chunk: &ReadChunk) -> io::Result<()> {
    u32(dest, xid)?;
    u32(dest, chunk.err)?;
    i32(dest, chunk.count)?;
    bool(dest, chunk.eof)?;
    vec_max_size(dest, &chunk.data, MSG)
}

pub fn write(dest: &mut dyn Write, xid: u32, reply: WriteReply) -> io::Result<()> {
    u32(dest, xid)?;
    u32(dest, reply.err)?;
    i64(dest, reply.size)
}

pub fn readdir_entry(dest: &mut impl Write, xid: u32, frame: &ReaddirEntry) -> io::Result<()> {
    u32(dest, xid)?;
    u32(dest, frame.err)?;
    bool(dest, frame.last)?;
    option(dest, frame.entry.as_ref(), |(entry, attr), dest| {
        dir_entry(dest, entry).and_then(|_| file_attr(dest, attr))
    })
}
