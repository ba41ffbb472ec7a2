//! Per-connection writer: serializes reply frames onto the socket.

use std::io;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::Receiver;

use crate::frame;
use crate::message_types::{EarlyReply, Reply, ReplyBody};
use crate::serializer;
use crate::wire::StatusReply;

/// Drains the reply channels and writes each reply as one frame. Early
/// error replies bypass the filesystem task and are encoded as plain
/// status replies.
pub struct StreamWriter {
    writehalf: OwnedWriteHalf,
    replies: Receiver<Reply>,
    early: Receiver<EarlyReply>,
}

impl StreamWriter {
    pub fn new(
        writehalf: OwnedWriteHalf,
        replies: Receiver<Reply>,
        early: Receiver<EarlyReply>,
    ) -> Self {
        Self { writehalf, replies, early }
    }

    pub async fn run(mut self) {
        loop {
            let body = tokio::select! {
                Some(early) = self.early.recv() => {
                    encode_status(early.xid, early.err)
                }
                Some(reply) = self.replies.recv() => {
                    encode(reply)
                }
                else => break,
            };

            let body = match body {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(%err, "failed to encode reply; dropping connection");
                    break;
                }
            };
            if let Err(err) = frame::write_frame(&mut self.writehalf, &body).await {
                tracing::debug!(%err, "connection write failed");
                break;
            }
        }
    }
}

fn encode(reply: Reply) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match &reply.body {
        ReplyBody::Verf(body) => serializer::reply::verf(&mut buf, reply.xid, *body)?,
        ReplyBody::Status(body) => serializer::reply::status(&mut buf, reply.xid, *body)?,
        ReplyBody::GetAttr(body) => serializer::reply::get_attr(&mut buf, reply.xid, body)?,
        ReplyBody::Read(body) => serializer::reply::read_chunk(&mut buf, reply.xid, body)?,
        ReplyBody::Write(body) => serializer::reply::write(&mut buf, reply.xid, *body)?,
        ReplyBody::Dir(body) => serializer::reply::readdir_entry(&mut buf, reply.xid, body)?,
    }
    Ok(buf)
}

fn encode_status(xid: u32, err: u32) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    serializer::reply::status(&mut buf, xid, StatusReply { err })?;
    Ok(buf)
}
