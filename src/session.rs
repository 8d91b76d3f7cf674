//! Screen share session manager.
//!
//! Owns the toggle state and the capture-to-publish pipeline: request a
//! stream id from the capture provider, acquire user media for it, publish
//! the resulting track to the room, and hold the stop handle that reverses
//! all of it. The pipeline is a single sequential chain; the phase field
//! doubles as the in-flight guard so a second toggle cannot start a
//! concurrent attempt.

use crate::config::ShareConfig;
use crate::media::{AcquireError, MediaConstraints, MediaSource, MediaTrack};
use crate::provider::{CaptureProvider, CaptureRequest};
use crate::room::{Publication, RoomClient, TrackPublishOptions};
use crate::types::{ShareError, SharePhase};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

type ErrorSink = Box<dyn Fn(ShareError) + Send + Sync>;
type InstallPrompt = Box<dyn Fn(&str) + Send + Sync>;
type AttemptHook = Box<dyn Fn() + Send + Sync>;

/// Callbacks the surrounding application injects into the session
pub struct SessionHooks {
    /// Sink for failures that are not user cancellations
    error_sink: ErrorSink,
    /// Invoked with the installation instructions when the provider never
    /// answers
    install_prompt: InstallPrompt,
    /// Fire-and-forget hook invoked at the start of every attempt (the
    /// host application's informational window, if it has one)
    on_attempt: Option<AttemptHook>,
}

impl SessionHooks {
    pub fn new() -> Self {
        Self {
            error_sink: Box::new(|err| warn!("Share error: {}", err)),
            install_prompt: Box::new(|instructions| info!("{}", instructions)),
            on_attempt: None,
        }
    }

    pub fn with_error_sink(mut self, sink: impl Fn(ShareError) + Send + Sync + 'static) -> Self {
        self.error_sink = Box::new(sink);
        self
    }

    pub fn with_install_prompt(
        mut self,
        prompt: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.install_prompt = Box::new(prompt);
        self
    }

    pub fn with_attempt_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_attempt = Some(Box::new(hook));
        self
    }
}

impl Default for SessionHooks {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything needed to cleanly reverse a successful share, invocable at
/// most once
#[derive(Clone)]
struct StopHandle {
    inner: Arc<StopInner>,
}

struct StopInner {
    done: AtomicBool,
    stop: Box<dyn Fn() + Send + Sync>,
}

impl StopHandle {
    fn new(stop: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(StopInner {
                done: AtomicBool::new(false),
                stop: Box::new(stop),
            }),
        }
    }

    fn invoke(&self) {
        if !self.inner.done.swap(true, Ordering::SeqCst) {
            (self.inner.stop)();
        }
    }
}

/// Session state behind the lock
///
/// Invariant: `stop` is `Some` iff `phase` is `Sharing`.
struct SessionState {
    phase: SharePhase,
    stop: Option<StopHandle>,
}

/// Releases the in-flight guard if the pipeline future is dropped before it
/// resolves the phase
///
/// Every completed pipeline run leaves the phase at `Idle` or `Sharing`, so
/// on a normal return this is a no-op. If the caller's future is dropped at
/// an await point, the phase would otherwise stay stuck at an in-flight
/// value and block every later toggle.
struct AttemptGuard {
    state: Arc<Mutex<SessionState>>,
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.phase.is_in_flight() {
            warn!("Share attempt dropped mid-pipeline, releasing in-flight guard");
            state.phase = SharePhase::Idle;
        }
    }
}

/// What a toggle resolved to under the state lock
enum ToggleAction {
    Start,
    Stop,
    Ignore,
}

/// Screen share session manager
pub struct ShareSession {
    config: ShareConfig,
    provider: Arc<dyn CaptureProvider>,
    media: Arc<dyn MediaSource>,
    room: Arc<dyn RoomClient>,
    hooks: SessionHooks,
    state: Arc<Mutex<SessionState>>,
}

impl ShareSession {
    pub fn new(
        config: ShareConfig,
        provider: Arc<dyn CaptureProvider>,
        media: Arc<dyn MediaSource>,
        room: Arc<dyn RoomClient>,
        hooks: SessionHooks,
    ) -> Self {
        Self {
            config,
            provider,
            media,
            room,
            hooks,
            state: Arc::new(Mutex::new(SessionState {
                phase: SharePhase::Idle,
                stop: None,
            })),
        }
    }

    pub fn phase(&self) -> SharePhase {
        self.state.lock().unwrap().phase
    }

    pub fn is_sharing(&self) -> bool {
        self.phase() == SharePhase::Sharing
    }

    /// Start a share if idle, stop it if sharing
    ///
    /// A toggle while an attempt is in flight is rejected rather than
    /// queued, so a stale user intent cannot fire after an arbitrary delay.
    pub async fn toggle(&self) {
        let action = {
            let mut state = self.state.lock().unwrap();
            match state.phase {
                SharePhase::Idle => {
                    state.phase = SharePhase::Requesting;
                    ToggleAction::Start
                }
                SharePhase::Sharing => ToggleAction::Stop,
                _ => ToggleAction::Ignore,
            }
        };

        match action {
            ToggleAction::Start => {
                let _guard = AttemptGuard {
                    state: Arc::clone(&self.state),
                };
                self.start_share().await;
            }
            ToggleAction::Stop => self.stop(),
            ToggleAction::Ignore => {
                warn!("Share attempt already in flight, ignoring toggle");
            }
        }
    }

    /// Stop the active share, if any. Safe to call more than once.
    pub fn stop(&self) {
        let handle = self.state.lock().unwrap().stop.clone();
        match handle {
            Some(handle) => handle.invoke(),
            None => debug!("Stop requested with no active share"),
        }
    }

    /// Run the capture-to-publish pipeline. Phase is already `Requesting`.
    async fn start_share(&self) {
        let attempt_id = Uuid::new_v4();
        info!("Starting share attempt {}", attempt_id);

        if let Some(hook) = &self.hooks.on_attempt {
            hook();
        }

        let request = CaptureRequest::new(self.config.provider.sources.clone());
        let exchange = self.provider.request_capture(&request);

        let reply = match timeout(self.config.provider.response_timeout(), exchange).await {
            Ok(Some(reply)) => reply,
            Ok(None) | Err(_) => {
                warn!("Capture provider did not respond for attempt {}", attempt_id);
                self.reset_to_idle();
                (self.hooks.install_prompt)(&self.config.provider.install_instructions);
                return;
            }
        };

        if !reply.is_success() {
            self.fail(ShareError::Provider(format!(
                "provider replied with type \"{}\"",
                reply.reply_type
            )));
            return;
        }

        let stream_id = match reply.stream_id {
            Some(id) => id,
            None => {
                self.fail(ShareError::Provider(
                    "success reply carried no stream id".to_string(),
                ));
                return;
            }
        };

        debug!("Provider granted stream {} for attempt {}", stream_id, attempt_id);
        self.set_phase(SharePhase::Acquiring);

        let mut constraints =
            MediaConstraints::desktop(stream_id, self.config.media.max_frame_rate);
        constraints.audio = self.config.media.audio;

        let stream = match self.media.acquire(&constraints).await {
            Ok(stream) => stream,
            Err(e) if e.is_user_cancel() => {
                // User closed the capture dialog; not an error
                debug!("Capture dialog dismissed ({}), attempt {} cancelled", e.name, attempt_id);
                self.reset_to_idle();
                return;
            }
            Err(e) => {
                self.fail(ShareError::Acquire(e));
                return;
            }
        };

        let track = match stream.into_first_track() {
            Some(track) => track,
            None => {
                self.fail(ShareError::Acquire(AcquireError::new(
                    "EmptyStream",
                    "acquired stream has no tracks",
                )));
                return;
            }
        };

        self.set_phase(SharePhase::Publishing);

        let options =
            TrackPublishOptions::new(self.config.track.name.clone(), self.config.track.priority);

        let publication = match self.room.publish_track(&track, &options).await {
            Ok(publication) => publication,
            Err(e) => {
                // No partial state may outlive a failed attempt
                track.stop();
                self.fail(ShareError::Publish(e));
                return;
            }
        };

        info!(
            "Published track {} as \"{}\" (publication {})",
            track.id(),
            publication.track_name,
            publication.sid
        );

        let stop = self.make_stop_handle(track.clone(), publication);

        {
            let mut state = self.state.lock().unwrap();
            state.phase = SharePhase::Sharing;
            state.stop = Some(stop.clone());
        }

        // Covers the browser's native sharing indicator ending the track
        // out-of-band. Registered only after the handle is stored, so an
        // early signal cannot spend the once-guard before the session
        // holds it.
        let ended = stop.clone();
        track.set_on_ended(move || ended.invoke());

        // The track may already have ended while the publish
        // acknowledgment was in flight, before any handler was registered.
        // The handle is idempotent, so this never double-stops.
        if track.is_stopped() {
            stop.invoke();
        }
    }

    fn make_stop_handle(&self, track: MediaTrack, publication: Publication) -> StopHandle {
        let room = Arc::clone(&self.room);
        let state = Arc::clone(&self.state);

        StopHandle::new(move || {
            info!("Stopping screen share (publication {})", publication.sid);
            room.unpublish_track(&track);
            room.emit_track_unpublished(&publication);
            track.stop();

            let mut state = state.lock().unwrap();
            state.phase = SharePhase::Idle;
            state.stop = None;
        })
    }

    fn set_phase(&self, phase: SharePhase) {
        self.state.lock().unwrap().phase = phase;
    }

    fn reset_to_idle(&self) {
        self.set_phase(SharePhase::Idle);
    }

    /// Terminate the attempt and surface the error
    fn fail(&self, err: ShareError) {
        warn!("Share attempt failed: {}", err);
        self.reset_to_idle();
        (self.hooks.error_sink)(err);
    }
}
