//! Native-messaging framing: a little-endian `u32` byte length followed by a
//! UTF-8 JSON document of that length.

use crate::relay::error::FrameError;
use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const HEADER_LEN: usize = 4;

/// Host-to-client limit used by browsers for native messaging.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

pub fn encode_frame(message: &Value) -> Result<Bytes, FrameError> {
    let body = serde_json::to_vec(message)?;
    let len = u32::try_from(body.len()).map_err(|_| FrameError::TooLarge {
        len: body.len(),
        max: u32::MAX as usize,
    })?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + body.len());
    buf.put_u32_le(len);
    buf.put_slice(&body);
    Ok(buf.freeze())
}

/// Reads one frame. `Ok(None)` means the stream ended on a frame boundary.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<Value>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return if filled == 0 { Ok(None) } else { Err(FrameError::Truncated) };
        }
        filled += n;
    }

    let len = u32::from_le_bytes(header) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }

    let mut body = vec![0u8; len];
    match reader.read_exact(&mut body).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(FrameError::Truncated),
        Err(e) => return Err(e.into()),
    }

    Ok(Some(serde_json::from_slice(&body)?))
}
