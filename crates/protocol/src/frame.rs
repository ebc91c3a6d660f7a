//! Wire framing: length-prefixed JSON envelopes
//!
//! Each frame is a u32 big-endian payload length followed by the JSON bytes
//! of one `Envelope`. The channel is message-oriented, order-preserving and
//! reliable; framing only needs to delimit messages and bound their size.
//!
//! `Internal` envelopes are server-side values and must never be framed;
//! `write_frame` rejects them.

use crate::envelope::{Envelope, EnvelopeKind};
use parkwell_core::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on one frame's payload, in bytes
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Write one envelope as a frame.
///
/// # Errors
///
/// Returns `CodecError` for an `Internal` envelope or an oversized payload,
/// `IoError` if the write fails.
pub async fn write_frame<W>(writer: &mut W, envelope: &Envelope) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if envelope.kind == EnvelopeKind::Internal {
        return Err(Error::CodecError(
            "internal envelopes never cross the wire".into(),
        ));
    }
    let payload = serde_json::to_vec(envelope).map_err(|e| Error::CodecError(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(Error::CodecError(format!(
            "frame payload too large: {} bytes",
            payload.len()
        )));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one envelope frame.
///
/// Returns `Ok(None)` on clean end-of-stream (EOF before the first length
/// byte).
///
/// # Errors
///
/// Returns `CodecError` for an oversized or undecodable payload, `IoError`
/// for a truncated frame or failed read.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Envelope>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::CodecError(format!(
            "frame length {len} exceeds limit"
        )));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    let envelope =
        serde_json::from_slice(&payload).map_err(|e| Error::CodecError(e.to_string()))?;
    Ok(Some(envelope))
}
