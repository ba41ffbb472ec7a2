//! Typed channel plumbing between the per-connection tasks.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::Receiver;

use crate::wire::{
    Command, GetAttrReply, ReadChunk, ReaddirEntry, StatusReply, VerfReply, WriteReply,
};

/// A parsed call with its transaction id, on its way to the filesystem task.
pub struct Call {
    pub xid: u32,
    pub args: Command,
}

/// A reply frame with the transaction id it answers.
pub struct Reply {
    pub xid: u32,
    pub body: ReplyBody,
}

/// The per-procedure reply payloads.
pub enum ReplyBody {
    Verf(VerfReply),
    Status(StatusReply),
    GetAttr(GetAttrReply),
    Read(ReadChunk),
    Write(WriteReply),
    Dir(ReaddirEntry),
}

/// Error reply emitted by the reader before the call reaches the
/// filesystem task (the frame's arguments failed to parse).
pub struct EarlyReply {
    pub xid: u32,
    pub err: u32,
}

/// Sender for parsed procedure calls.
pub struct CallSender {
    sender: mpsc::Sender<Call>,
}

impl CallSender {
    pub async fn send(&self, xid: u32, args: Command) -> Result<(), SendError<Call>> {
        self.sender.send(Call { xid, args }).await
    }
}

/// Receiver for parsed procedure calls.
pub struct CallReceiver {
    recv: Receiver<Call>,
}

impl CallReceiver {
    pub async fn recv(&mut self) -> Option<Call> {
        self.recv.recv().await
    }
}

/// Sender for procedure replies.
pub struct ReplySender {
    sender: mpsc::Sender<Reply>,
}

impl ReplySender {
    pub async fn send(&self, xid: u32, body: ReplyBody) -> Result<(), SendError<Reply>> {
        self.sender.send(Reply { xid, body }).await
    }
}

/// Sender for early error replies.
pub struct EarlyReplySender {
    sender: mpsc::Sender<EarlyReply>,
}

impl EarlyReplySender {
    pub async fn send(&self, xid: u32, err: u32) -> Result<(), SendError<EarlyReply>> {
        self.sender.send(EarlyReply { xid, err }).await
    }
}

/// Creates the channel carrying parsed calls.
pub fn call_channel(size: usize) -> (CallSender, CallReceiver) {
    let (sender, recv) = mpsc::channel::<Call>(size);
    (CallSender { sender }, CallReceiver { recv })
}

/// Creates the channel carrying procedure replies.
pub fn reply_channel(size: usize) -> (ReplySender, Receiver<Reply>) {
    let (sender, recv) = mpsc::channel::<Reply>(size);
    (ReplySender { sender }, recv)
}

/// Creates the channel carrying early error replies.
pub fn early_reply_channel(size: usize) -> (EarlyReplySender, Receiver<EarlyReply>) {
    let (sender, recv) = mpsc::channel::<EarlyReply>(size);
    (EarlyReplySender { sender }, recv)
}
