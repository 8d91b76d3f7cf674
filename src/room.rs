//! Call room client boundary.
//!
//! The room client is the video-conferencing SDK abstraction that carries
//! published tracks to remote participants. The session only needs three
//! operations from it: publish, unpublish, and a track-unpublished event
//! emission kept for consumers that still listen for that event.

use crate::media::MediaTrack;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Priority a track is published with
///
/// Screen tracks go out at `Low`; the subscriber raises the priority when
/// the track is actually rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackPriority {
    #[default]
    Low,
    Standard,
    High,
}

impl TrackPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackPriority::Low => "low",
            TrackPriority::Standard => "standard",
            TrackPriority::High => "high",
        }
    }
}

/// Metadata a track is published under
#[derive(Debug, Clone)]
pub struct TrackPublishOptions {
    /// Name the track can be found under later
    pub name: String,
    pub priority: TrackPriority,
}

impl TrackPublishOptions {
    pub fn new(name: impl Into<String>, priority: TrackPriority) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

/// Acknowledgment of a successful publish
#[derive(Debug, Clone)]
pub struct Publication {
    /// Room-assigned identifier for the publication
    pub sid: String,
    /// Name the track was published under
    pub track_name: String,
}

impl Publication {
    pub fn new(sid: impl Into<String>, track_name: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            track_name: track_name.into(),
        }
    }
}

/// Failure acknowledging a publish
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RoomError(pub String);

impl RoomError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Track publication surface of the call room
#[async_trait]
pub trait RoomClient: Send + Sync {
    /// Publish a track, returning the room's acknowledgment
    async fn publish_track(
        &self,
        track: &MediaTrack,
        options: &TrackPublishOptions,
    ) -> Result<Publication, RoomError>;

    /// Withdraw a previously published track
    fn unpublish_track(&self, track: &MediaTrack);

    /// Emit the track-unpublished event for consumers expecting it
    fn emit_track_unpublished(&self, publication: &Publication);
}
