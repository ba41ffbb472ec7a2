//! Per-connection executor: runs parsed calls against the export.

use std::sync::Arc;

use crate::export::Export;
use crate::message_types::{Call, CallReceiver, ReplyBody, ReplySender};
use crate::wire::{
    Command, GetAttrReply, ReadChunk, ReaddirEntry, StatusReply, VerfReply, WriteChunk,
    WriteReply, MSG,
};

/// A Write stream being accumulated. `path`, `offset` and `total_size`
/// are refreshed from every chunk; the last values win.
struct PendingWrite {
    path: String,
    offset: u64,
    total_size: u64,
    buf: Vec<u8>,
}

/// Executes calls against the [`Export`] and streams replies to the writer.
pub struct FsTask {
    export: Arc<Export>,
    calls: CallReceiver,
    replies: ReplySender,
    pending_write: Option<PendingWrite>,
}

impl FsTask {
    pub fn new(export: Arc<Export>, calls: CallReceiver, replies: ReplySender) -> Self {
        Self { export, calls, replies, pending_write: None }
    }

    pub async fn run(mut self) {
        while let Some(call) = self.calls.recv().await {
            if self.handle(call).await.is_err() {
                // the writer is gone; the connection is coming down
                break;
            }
        }
    }

    async fn handle(&mut self, call: Call) -> Result<(), ()> {
        let xid = call.xid;
        match call.args {
            Command::Null(_) => {
                self.send(xid, ReplyBody::Verf(VerfReply { verf: self.export.verifier() })).await
            }
            Command::Commit(_) => {
                self.send(xid, ReplyBody::Verf(VerfReply { verf: self.export.verifier() })).await
            }
            Command::GetAttr(args) => {
                let reply = match self.export.get_attr(&args.path).await {
                    Ok(attr) => GetAttrReply { err: 0, attr: Some(attr) },
                    Err(errno) => GetAttrReply { err: errno as u32, attr: None },
                };
                self.send(xid, ReplyBody::GetAttr(reply)).await
            }
            Command::Lookup(args) => {
                let result = self.export.lookup(&args.path).await;
                self.send_status(xid, result).await
            }
            Command::Read(args) => self.stream_read(xid, &args.handle, args.offset, args.count).await,
            Command::Write(chunk) => self.accumulate_write(xid, chunk).await,
            Command::Truncate(args) => {
                let result = self.export.truncate(&args.path, args.size).await;
                self.send_status(xid, result).await
            }
            Command::Readdir(args) => self.stream_dir(xid, &args.path).await,
            Command::Mknod(args) => {
                let result = self.export.mk_node(&args.path, args.mode, args.rdev).await;
                self.send_status(xid, result).await
            }
            Command::Unlink(args) => {
                let result = self.export.unlink(&args.path).await;
                self.send_status(xid, result).await
            }
            Command::Rename(args) => {
                let result = self.export.rename(&args.source, &args.dest).await;
                self.send_status(xid, result).await
            }
            Command::Mkdir(args) => {
                let result = self.export.mk_dir(&args.path, args.mode).await;
                self.send_status(xid, result).await
            }
            Command::Rmdir(args) => {
                let result = self.export.rm_dir(&args.path).await;
                self.send_status(xid, result).await
            }
            Command::Utimens(args) => {
                let result = self.export.utimens(&args.path, args.atime, args.mtime).await;
                self.send_status(xid, result).await
            }
        }
    }

    async fn stream_read(&self, xid: u32, handle: &str, offset: u64, count: u32) -> Result<(), ()> {
        let (data, eof) = match self.export.read(handle, offset, count).await {
            Ok(read) => read,
            Err(errno) => {
                let chunk =
                    ReadChunk { err: errno as u32, count: -1, eof: true, data: Vec::new() };
                return self.send(xid, ReplyBody::Read(chunk)).await;
            }
        };

        if data.is_empty() {
            let chunk = ReadChunk { err: 0, count: 0, eof: true, data: Vec::new() };
            return self.send(xid, ReplyBody::Read(chunk)).await;
        }

        let pieces = data.chunks(MSG).count();
        for (index, piece) in data.chunks(MSG).enumerate() {
            let chunk = ReadChunk {
                err: 0,
                count: piece.len() as i32,
                eof: eof && index + 1 == pieces,
                data: piece.to_vec(),
            };
            self.send(xid, ReplyBody::Read(chunk)).await?;
        }
        Ok(())
    }

    async fn stream_dir(&self, xid: u32, handle: &str) -> Result<(), ()> {
        let entries = match self.export.read_dir(handle).await {
            Ok(entries) => entries,
            Err(errno) => {
                let frame = ReaddirEntry { err: errno as u32, last: true, entry: None };
                return self.send(xid, ReplyBody::Dir(frame)).await;
            }
        };

        for entry in entries {
            let frame = ReaddirEntry { err: 0, last: false, entry: Some(entry) };
            self.send(xid, ReplyBody::Dir(frame)).await?;
        }
        self.send(xid, ReplyBody::Dir(ReaddirEntry { err: 0, last: true, entry: None })).await
    }

    async fn accumulate_write(&mut self, xid: u32, chunk: WriteChunk) -> Result<(), ()> {
        let mut pending = self.pending_write.take().unwrap_or(PendingWrite {
            path: String::new(),
            offset: 0,
            total_size: 0,
            buf: Vec::new(),
        });
        pending.path = chunk.path;
        pending.offset = chunk.offset;
        pending.total_size = chunk.total_size;
        pending.buf.extend_from_slice(&chunk.data);

        if !chunk.last && (pending.buf.len() as u64) < pending.total_size {
            self.pending_write = Some(pending);
            return Ok(());
        }

        let reply = match self.export.write(&pending.path, pending.offset, &pending.buf).await {
            Ok(written) => WriteReply { err: 0, size: written as i64 },
            Err(errno) => WriteReply { err: errno as u32, size: -1 },
        };
        self.send(xid, ReplyBody::Write(reply)).await
    }

    async fn send_status(&self, xid: u32, result: Result<(), i32>) -> Result<(), ()> {
        let err = match result {
            Ok(()) => 0,
            Err(errno) => errno as u32,
        };
        self.send(xid, ReplyBody::Status(StatusReply { err })).await
    }

    async fn send(&self, xid: u32, body: ReplyBody) -> Result<(), ()> {
        self.replies.send(xid, body).await.map_err(|_| ())
    }
}
