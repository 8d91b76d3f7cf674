//! Core types for the screen share session.
//!
//! This module defines the session phase state machine and the error
//! taxonomy shared across the capture, acquisition, and publish stages.

use crate::media::AcquireError;
use crate::room::RoomError;
use serde::{Deserialize, Serialize};

/// Phase of the screen share session
///
/// A share attempt moves `Idle → Requesting → Acquiring → Publishing →
/// Sharing`, with an early return to `Idle` from any failure branch and a
/// `Sharing → Idle` transition on stop or on the track's ended signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePhase {
    /// Not sharing, no attempt in flight
    Idle,
    /// Capture request sent, waiting for the provider reply
    Requesting,
    /// Provider granted a stream id, acquiring user media
    Acquiring,
    /// Track acquired, waiting for publish acknowledgment
    Publishing,
    /// Track published, share active
    Sharing,
}

impl SharePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePhase::Idle => "idle",
            SharePhase::Requesting => "requesting",
            SharePhase::Acquiring => "acquiring",
            SharePhase::Publishing => "publishing",
            SharePhase::Sharing => "sharing",
        }
    }

    /// Whether an attempt is in flight (started but not yet sharing)
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SharePhase::Requesting | SharePhase::Acquiring | SharePhase::Publishing
        )
    }
}

/// Kind of capture source requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSourceKind {
    /// A single application window
    Window,
    /// An entire screen/display
    Screen,
}

impl CaptureSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureSourceKind::Window => "window",
            CaptureSourceKind::Screen => "screen",
        }
    }
}

/// Errors that can terminate a share attempt
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// The provider replied, but with a failure type or no stream id
    #[error("capture provider failed: {0}")]
    Provider(String),

    /// User media acquisition failed for a reason other than user cancel
    #[error("media acquisition failed: {0}")]
    Acquire(#[from] AcquireError),

    /// The call room rejected the track publish
    #[error("track publish failed: {0}")]
    Publish(#[from] RoomError),
}
