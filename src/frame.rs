//! Length-prefixed record framing over a byte stream.
//!
//! Every wire message is one frame: a big-endian `u32` body length followed
//! by the body. The length word never exceeds [`MAX_FRAME`].

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::wire::MAX_FRAME;

/// Reads one frame body. Returns `None` on a clean end of stream (the peer
/// closed the connection between frames).
pub async fn read_frame<R>(src: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match src.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "frame exceeds MAX_FRAME"));
    }

    let mut body = vec![0u8; len];
    src.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Writes one frame and flushes it to the transport.
pub async fn write_frame<W>(dst: &mut W, body: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if body.len() > MAX_FRAME {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "frame exceeds MAX_FRAME"));
    }
    dst.write_all(&(body.len() as u32).to_be_bytes()).await?;
    dst.write_all(body).await?;
    dst.flush().await
}
