//! Per-connection reader: frames off the socket, parsed calls out.

use std::io::Cursor;

use tokio::net::tcp::OwnedReadHalf;

use crate::frame;
use crate::message_types::{CallSender, EarlyReplySender};
use crate::parser::{self, primitive};

/// Reads call frames from a connection, parses them, and forwards them to
/// the filesystem task. A frame whose arguments fail to parse is answered
/// with an early `EBADMSG` reply; a broken frame drops the connection.
pub struct ReadTask {
    readhalf: OwnedReadHalf,
    calls: CallSender,
    early: EarlyReplySender,
}

impl ReadTask {
    pub fn new(readhalf: OwnedReadHalf, calls: CallSender, early: EarlyReplySender) -> Self {
        Self { readhalf, calls, early }
    }

    pub async fn run(mut self) {
        loop {
            let body = match frame::read_frame(&mut self.readhalf).await {
                Ok(Some(body)) => body,
                Ok(None) => break,
                Err(err) => {
                    tracing::debug!(%err, "dropping connection on framing error");
                    break;
                }
            };

            let mut src = Cursor::new(body.as_slice());
            let xid = match primitive::u32(&mut src) {
                Ok(xid) => xid,
                // not even a transaction id; nothing sensible to answer
                Err(_) => break,
            };

            match parser::body(&mut src) {
                Ok(args) => {
                    if self.calls.send(xid, args).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::debug!(xid, %err, "unparseable call");
                    if self.early.send(xid, libc::EBADMSG as u32).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
