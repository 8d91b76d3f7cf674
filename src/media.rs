//! User media acquisition boundary.
//!
//! Given the opaque stream id granted by the capture provider, a
//! [`MediaSource`] turns it into a [`MediaStream`] whose first track is
//! published to the room. Acquisition errors carry a `name` discriminator;
//! `AbortError` and `NotAllowedError` mean the user backed out of the
//! capture dialog and are treated as silent cancellations.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Error name for a user-aborted capture dialog
pub const ABORT_ERROR: &str = "AbortError";
/// Error name for a denied capture permission
pub const NOT_ALLOWED_ERROR: &str = "NotAllowedError";

/// Constraints for a desktop capture acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Opaque stream id from the provider reply, meaningful only to the
    /// acquisition call that immediately follows
    pub desktop_source_id: String,
    /// Frame rate cap for the video track
    pub max_frame_rate: u32,
    /// Whether audio is requested
    pub audio: bool,
}

impl MediaConstraints {
    /// Video-only desktop constraints
    pub fn desktop(desktop_source_id: impl Into<String>, max_frame_rate: u32) -> Self {
        Self {
            desktop_source_id: desktop_source_id.into(),
            max_frame_rate,
            audio: false,
        }
    }
}

/// Acquisition failure with a `name` discriminator
#[derive(Debug, Clone, thiserror::Error)]
#[error("{name}: {message}")]
pub struct AcquireError {
    pub name: String,
    pub message: String,
}

impl AcquireError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        Self::new(ABORT_ERROR, "capture dialog closed")
    }

    pub fn not_allowed() -> Self {
        Self::new(NOT_ALLOWED_ERROR, "capture permission denied")
    }

    /// Whether this failure is expected user behavior rather than an error
    pub fn is_user_cancel(&self) -> bool {
        self.name == ABORT_ERROR || self.name == NOT_ALLOWED_ERROR
    }
}

type EndedHandler = Box<dyn Fn() + Send + Sync>;

struct TrackInner {
    id: String,
    stopped: AtomicBool,
    on_ended: Mutex<Option<EndedHandler>>,
}

/// A single media track, shared between the session and the room client
///
/// The session keeps stop authority: `stop` halts the underlying capture and
/// is idempotent. `signal_ended` models the out-of-band end of the track
/// (e.g. the browser's native sharing indicator) and fires the registered
/// ended handler at most once.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: id.into(),
                stopped: AtomicBool::new(false),
                on_ended: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Stop the underlying capture. Safe to call more than once.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    /// Register the handler invoked when the track ends out-of-band
    pub fn set_on_ended(&self, handler: impl Fn() + Send + Sync + 'static) {
        let mut slot = self.inner.on_ended.lock().unwrap();
        *slot = Some(Box::new(handler));
    }

    /// Signal that the track ended outside the session's control
    ///
    /// Marks the track stopped and fires the ended handler. A second signal,
    /// or a signal after `stop`, does nothing.
    pub fn signal_ended(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let handler = self.inner.on_ended.lock().unwrap().take();
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Stream returned by an acquisition
#[derive(Debug, Clone)]
pub struct MediaStream {
    pub tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    /// Take the first track, consuming the stream
    pub fn into_first_track(mut self) -> Option<MediaTrack> {
        if self.tracks.is_empty() {
            None
        } else {
            Some(self.tracks.remove(0))
        }
    }
}

/// User media acquisition capability
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaStream, AcquireError>;
}
