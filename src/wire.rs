//! Length-prefixed JSON framing for out-of-process capture providers.
//!
//! Native messaging hosts frame each JSON message with a little-endian u32
//! length prefix. This module provides the async codec plus a
//! [`CaptureProvider`] implementation over any `AsyncRead + AsyncWrite`
//! transport (a child process pipe, a Unix socket, a duplex test stream).

use crate::provider::{CaptureProvider, CaptureReply, CaptureRequest, ChannelCaptureProvider};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Upper bound on a single framed message
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Write one framed JSON message
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_vec(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    let len = (json.len() as u32).to_le_bytes();
    writer.write_all(&len).await?;
    writer.write_all(&json).await?;
    writer.flush().await?;

    Ok(())
}

/// Read one framed JSON message
pub async fn read_frame<R, T>(reader: &mut R) -> io::Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "Frame too large"));
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer).await?;

    serde_json::from_slice(&buffer)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Capture provider backed by a framed byte transport
///
/// Exchanges run serially on a pump task that owns the transport. Frames are
/// always written and read to completion on that task, so a caller-side
/// timeout can never abandon the stream mid-frame; a reply whose requester
/// already gave up is consumed and discarded, keeping later exchanges
/// aligned with their own replies.
///
/// Must be constructed inside a tokio runtime.
pub struct IoCaptureProvider {
    inner: ChannelCaptureProvider,
    pump: JoinHandle<()>,
}

impl IoCaptureProvider {
    pub fn new<S>(provider_id: impl Into<String>, transport: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let provider_id = provider_id.into();
        let (inner, mut exchange_rx) = ChannelCaptureProvider::new(provider_id.clone());

        let pump = tokio::spawn(async move {
            let mut transport = transport;
            while let Some(exchange) = exchange_rx.recv().await {
                if let Err(e) = write_frame(&mut transport, &exchange.request).await {
                    warn!("Capture provider {} write failed: {}", provider_id, e);
                    break;
                }
                trace!("Sent capture request to {}", provider_id);

                match read_frame::<_, CaptureReply>(&mut transport).await {
                    // The requester may have timed out; the send failing
                    // then just discards the reply
                    Ok(reply) => {
                        let _ = exchange.reply_tx.send(reply);
                    }
                    Err(e) => {
                        // EOF or a broken pipe both mean the helper is gone
                        warn!("Capture provider {} read failed: {}", provider_id, e);
                        break;
                    }
                }
            }
            // Dropping exchange_rx answers pending and future requests
            // with "no reply"
        });

        Self { inner, pump }
    }
}

impl Drop for IoCaptureProvider {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[async_trait]
impl CaptureProvider for IoCaptureProvider {
    async fn request_capture(&self, request: &CaptureRequest) -> Option<CaptureReply> {
        self.inner.request_capture(request).await
    }
}
