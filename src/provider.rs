//! Capture provider boundary.
//!
//! The capture provider is an out-of-process component (typically a browser
//! extension or a native helper) that arbitrates OS-level screen/window
//! capture. It is reachable only through an asynchronous request/response
//! exchange and answers with an opaque stream id that the media acquisition
//! call consumes.

use crate::types::CaptureSourceKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Reply type value the provider uses for a granted request
pub const REPLY_SUCCESS: &str = "success";

/// Capture request sent to the provider, once per share attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Source kinds offered to the user in the provider's picker
    pub sources: Vec<CaptureSourceKind>,
}

impl CaptureRequest {
    pub fn new(sources: Vec<CaptureSourceKind>) -> Self {
        Self { sources }
    }
}

/// Reply from the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReply {
    #[serde(rename = "type")]
    pub reply_type: String,

    #[serde(rename = "streamId", default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
}

impl CaptureReply {
    pub fn success(stream_id: impl Into<String>) -> Self {
        Self {
            reply_type: REPLY_SUCCESS.to_string(),
            stream_id: Some(stream_id.into()),
        }
    }

    pub fn failure(reply_type: impl Into<String>) -> Self {
        Self {
            reply_type: reply_type.into(),
            stream_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.reply_type == REPLY_SUCCESS
    }
}

/// Asynchronous request/response capability for screen capture arbitration
///
/// `None` means the provider never answered (absent or not installed); the
/// session surfaces that as an installation prompt. A reply with a
/// non-success type means the provider answered but could not grant a
/// stream.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    async fn request_capture(&self, request: &CaptureRequest) -> Option<CaptureReply>;
}

/// One pending exchange flowing through a [`ChannelCaptureProvider`]
#[derive(Debug)]
pub struct ProviderExchange {
    /// Provider id the request was addressed to
    pub provider_id: String,
    pub request: CaptureRequest,
    /// Sender the far end answers on; dropping it counts as no reply
    pub reply_tx: oneshot::Sender<CaptureReply>,
}

/// Channel-backed capture provider for in-process bridging
///
/// Requests are forwarded over an mpsc channel to whatever transport the
/// host application bridges to the real provider; each request carries a
/// oneshot sender for the reply.
pub struct ChannelCaptureProvider {
    provider_id: String,
    exchange_tx: mpsc::Sender<ProviderExchange>,
}

impl ChannelCaptureProvider {
    /// Create a provider addressed to `provider_id`, returning the receiver
    /// the bridging side consumes exchanges from
    pub fn new(provider_id: impl Into<String>) -> (Self, mpsc::Receiver<ProviderExchange>) {
        let (tx, rx) = mpsc::channel(16);
        (
            Self {
                provider_id: provider_id.into(),
                exchange_tx: tx,
            },
            rx,
        )
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }
}

#[async_trait]
impl CaptureProvider for ChannelCaptureProvider {
    async fn request_capture(&self, request: &CaptureRequest) -> Option<CaptureReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let exchange = ProviderExchange {
            provider_id: self.provider_id.clone(),
            request: request.clone(),
            reply_tx,
        };

        if self.exchange_tx.send(exchange).await.is_err() {
            warn!("Capture provider {} is not reachable", self.provider_id);
            return None;
        }

        match reply_rx.await {
            Ok(reply) => {
                debug!(
                    "Capture provider {} replied: {}",
                    self.provider_id, reply.reply_type
                );
                Some(reply)
            }
            Err(_) => {
                // Far end dropped the sender without answering
                warn!("Capture provider {} closed without replying", self.provider_id);
                None
            }
        }
    }
}
