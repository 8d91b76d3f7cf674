//! Screen Share Session - toggleable capture-to-publish pipeline
//!
//! This crate manages a single screen share for a call room client:
//!
//! - **Capture Provider**: an out-of-process component (browser extension or
//!   native helper) arbitrates capture and answers with an opaque stream id
//! - **Media Source**: turns the stream id into a media stream under
//!   frame-rate constraints
//! - **Room Client**: carries the published track to remote participants
//!
//! # Architecture
//!
//! [`ShareSession`] owns the toggle state machine
//! (`Idle → Requesting → Acquiring → Publishing → Sharing`) and the stop
//! handle that reverses a successful share. All three collaborators are
//! traits injected by the host application; the session only sequences the
//! pipeline and enforces that at most one attempt is in flight.

pub mod config;
pub mod media;
pub mod provider;
pub mod room;
pub mod session;
pub mod types;
pub mod wire;

// Re-export commonly used types
pub use config::{MediaConfig, ProviderConfig, ShareConfig, TrackConfig};
pub use media::{AcquireError, MediaConstraints, MediaSource, MediaStream, MediaTrack};
pub use provider::{
    CaptureProvider, CaptureReply, CaptureRequest, ChannelCaptureProvider, ProviderExchange,
};
pub use room::{Publication, RoomClient, RoomError, TrackPriority, TrackPublishOptions};
pub use session::{SessionHooks, ShareSession};
pub use types::{CaptureSourceKind, ShareError, SharePhase};
pub use wire::IoCaptureProvider;
