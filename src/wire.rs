//! The WatFS RPC contract: procedure numbers and message schemas.
//!
//! Every call body starts with a transaction id and a [`Procedure`]
//! discriminant, followed by the procedure-specific arguments. Replies echo
//! the transaction id. Streaming procedures (Read, Write, Readdir) carry a
//! sequence of frames under a single transaction id.

use crate::vfs::{DirEntry, FileAttr, FileTime};

/// Maximum per-chunk payload for the streaming Read and Write procedures.
pub const MSG: usize = 8192;

/// Upper bound on a single frame body. Generously above `MSG` plus headers;
/// anything larger is a framing violation.
pub const MAX_FRAME: usize = 64 * 1024;

/// Procedure numbers of the WatFS service.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive,
)]
pub enum Procedure {
    Null = 0,
    GetAttr = 1,
    Lookup = 2,
    Read = 3,
    Write = 4,
    Truncate = 5,
    Readdir = 6,
    Mknod = 7,
    Unlink = 8,
    Rename = 9,
    Mkdir = 10,
    Rmdir = 11,
    Utimens = 12,
    Commit = 13,
}

/// Arguments shared by every procedure that takes a bare path
/// (GetAttr, Lookup, Readdir, Unlink, Rmdir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathArgs {
    pub path: String,
}

/// Null carries the client's verifier probe; the reply carries the server's.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NullArgs {
    pub probe: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VerfReply {
    pub verf: u64,
}

/// Reply of every procedure whose only result is an error code.
/// `err` is `0` on success, otherwise the errno captured on the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusReply {
    pub err: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAttrReply {
    pub err: u32,
    /// Present exactly when `err` is zero.
    pub attr: Option<FileAttr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadArgs {
    pub handle: String,
    pub offset: u64,
    pub count: u32,
}

/// One frame of a Read reply stream.
///
/// `count` is the number of payload bytes in this chunk, or `-1` when a
/// server-side I/O error terminated the stream (`err` is then set). `eof`
/// marks the final chunk when the file ended before the requested count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadChunk {
    pub err: u32,
    pub count: i32,
    pub eof: bool,
    pub data: Vec<u8>,
}

/// One frame of a Write request stream.
///
/// `path`, `offset` and `total_size` are repeated in every chunk; the server
/// takes them from the last chunk received. The stream ends when the chunk
/// flagged `last` arrives and the accumulated payload reaches `total_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteChunk {
    pub path: String,
    pub offset: u64,
    pub size: u32,
    pub total_size: u64,
    pub last: bool,
    pub data: Vec<u8>,
}

/// Reply to a Write stream: total bytes written, or `-1` with `err` set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WriteReply {
    pub err: u32,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateArgs {
    pub path: String,
    pub size: u64,
}

/// One frame of a Readdir reply stream. The terminator frame has `last`
/// set and no entry; an error stream is a single frame with `err` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaddirEntry {
    pub err: u32,
    pub last: bool,
    pub entry: Option<(DirEntry, FileAttr)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MknodArgs {
    pub path: String,
    pub mode: u32,
    pub rdev: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameArgs {
    pub source: String,
    pub dest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkdirArgs {
    pub path: String,
    pub mode: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtimensArgs {
    pub path: String,
    pub atime: FileTime,
    pub mtime: FileTime,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommitArgs {
    pub verf: u64,
}

/// A fully parsed call as it travels from the connection reader to the
/// filesystem task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Null(NullArgs),
    GetAttr(PathArgs),
    Lookup(PathArgs),
    Read(ReadArgs),
    Write(WriteChunk),
    Truncate(TruncateArgs),
    Readdir(PathArgs),
    Mknod(MknodArgs),
    Unlink(PathArgs),
    Rename(RenameArgs),
    Mkdir(MkdirArgs),
    Rmdir(PathArgs),
    Utimens(UtimensArgs),
    Commit(CommitArgs),
}
