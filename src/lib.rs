//! WatFS - a network filesystem with a stateless server and a
//! write-buffering client.
//!
//! The server mirrors a local directory tree over a framed RPC protocol;
//! the client forwards filesystem callbacks to it, buffering writes until
//! an explicit commit confirms the server kept its verifier (and therefore
//! its state) since the writes were acknowledged.

pub mod client;
pub mod config;
pub mod export;
pub mod frame;
mod fs_task;
mod message_types;
pub mod parser;
mod read_task;
pub mod serializer;
mod stream_writer;
pub mod vfs;
pub mod wire;

use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::export::Export;
use crate::fs_task::FsTask;
use crate::message_types::{call_channel, early_reply_channel, reply_channel};
use crate::read_task::ReadTask;
use crate::stream_writer::StreamWriter;

const CHANNEL_DEPTH: usize = 32;

/// Accepts WatFS connections and serves them until the listener fails.
///
/// Each connection runs its own reader/executor/writer pipeline; dropping
/// the returned future tears every connection down with it.
pub async fn serve(listener: TcpListener, export: Arc<Export>) -> io::Result<()> {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                socket.set_nodelay(true)?;
                tracing::debug!(%peer, "client connected");
                connections.spawn(process_socket(socket, Arc::clone(&export)));
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

async fn process_socket(socket: TcpStream, export: Arc<Export>) {
    let (readhalf, writehalf) = socket.into_split();

    let (call_send, call_recv) = call_channel(CHANNEL_DEPTH);
    let (reply_send, reply_recv) = reply_channel(CHANNEL_DEPTH);
    let (early_send, early_recv) = early_reply_channel(CHANNEL_DEPTH);

    tokio::join!(
        ReadTask::new(readhalf, call_send, early_send).run(),
        FsTask::new(export, call_recv, reply_send).run(),
        StreamWriter::new(writehalf, reply_recv, early_recv).run(),
    );
}
