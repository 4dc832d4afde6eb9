//! Playback Controller.
//!
//! Per-card poster -> trailer state machine.
//!
//! ```text
//! Idle --request (focused)--> ResolvingTrailer --found--> Playing
//!  ^                               |   absent/cancel          |
//!  +-------------------------------+  failure --> Error       |
//!  +------------ stop / toggle off / focus lost --------------+
//! ```
//!
//! A controller owns at most one cancellation token. It is allocated when a
//! play attempt starts, stays live while the trailer resolves and plays,
//! and is cancelled on every exit back to `Idle`.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use reelfeed_model::{ItemId, TrailerRef};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::trailer::{Resolution, TrailerCache};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Poster shown.
    #[default]
    Idle,
    ResolvingTrailer,
    Playing(TrailerRef),
    /// The lookup failed; the card shows "no trailer available".
    Error,
}

impl PlaybackState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PlaybackState::ResolvingTrailer | PlaybackState::Playing(_)
        )
    }

    pub fn trailer(&self) -> Option<&TrailerRef> {
        match self {
            PlaybackState::Playing(trailer) => Some(trailer),
            _ => None,
        }
    }
}

struct ControllerState {
    state: PlaybackState,
    focused: bool,
    token: Option<CancellationToken>,
    attempt: u64,
}

impl ControllerState {
    fn cancel_token(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    fn go_idle(&mut self) {
        self.cancel_token();
        self.state = PlaybackState::Idle;
    }
}

impl Drop for ControllerState {
    fn drop(&mut self) {
        self.cancel_token();
    }
}

/// Cloneable handle to one card's playback state. Clones share the state;
/// the live token is cancelled when the last clone goes away.
#[derive(Clone)]
pub struct PlaybackController {
    item: ItemId,
    cache: TrailerCache,
    shared: Arc<Mutex<ControllerState>>,
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        f.debug_struct("PlaybackController")
            .field("item", &self.item)
            .field("state", &guard.state)
            .field("focused", &guard.focused)
            .field("token_live", &guard.token.is_some())
            .field("attempt", &guard.attempt)
            .finish()
    }
}

impl PlaybackController {
    pub fn new(item: ItemId, cache: TrailerCache) -> Self {
        Self {
            item,
            cache,
            shared: Arc::new(Mutex::new(ControllerState {
                state: PlaybackState::Idle,
                focused: false,
                token: None,
                attempt: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        // State is plain data; a panic elsewhere cannot leave it torn.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state.clone()
    }

    pub fn is_focused(&self) -> bool {
        self.lock().focused
    }

    /// Token for the current attempt, if one is live. The render layer can
    /// watch it to tear down the embed.
    pub fn session_token(&self) -> Option<CancellationToken> {
        self.lock().token.clone()
    }

    pub fn has_live_token(&self) -> bool {
        self.lock()
            .token
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    pub fn ptr_eq(&self, other: &PlaybackController) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Visibility edge from the tracker. Losing focus forces `Idle` from
    /// any state; gaining focus never starts playback by itself.
    pub fn on_focus_changed(&self, focused: bool) -> PlaybackState {
        let mut guard = self.lock();
        guard.focused = focused;
        if !focused && guard.state != PlaybackState::Idle {
            trace!("{} lost focus while {:?}", self.item, guard.state);
            guard.go_idle();
        }
        guard.state.clone()
    }

    /// Explicit user request to play. Ignored unless the card is focused
    /// and idle (or in `Error`, which retries).
    pub async fn request_playback(&self) -> PlaybackState {
        let (token, attempt) = {
            let mut guard = self.lock();
            if guard.state.is_active() {
                return guard.state.clone();
            }
            if !guard.focused {
                debug!("ignoring playback request for unfocused {}", self.item);
                return guard.state.clone();
            }

            guard.cancel_token();
            let token = CancellationToken::new();
            guard.token = Some(token.clone());
            guard.attempt += 1;

            if let Some(cached) = self.cache.peek(self.item) {
                // Resolved earlier: no request, straight to the outcome.
                match cached {
                    Some(trailer) => guard.state = PlaybackState::Playing(trailer),
                    None => guard.go_idle(),
                }
                return guard.state.clone();
            }

            guard.state = PlaybackState::ResolvingTrailer;
            (token, guard.attempt)
        };

        let outcome = self.cache.resolve_outcome(self.item, &token).await;

        let mut guard = self.lock();
        if token.is_cancelled() || guard.attempt != attempt {
            // Superseded by a stop, a focus loss or a newer attempt.
            return guard.state.clone();
        }

        match outcome {
            Resolution::Found(trailer) => {
                debug!("{} playing trailer {}", self.item, trailer.key);
                guard.state = PlaybackState::Playing(trailer);
            }
            Resolution::Absent | Resolution::Cancelled => guard.go_idle(),
            Resolution::Unavailable => {
                guard.cancel_token();
                guard.state = PlaybackState::Error;
            }
        }
        guard.state.clone()
    }

    /// Explicit stop. Always ends in `Idle`.
    pub fn stop_playback(&self) -> PlaybackState {
        let mut guard = self.lock();
        guard.go_idle();
        guard.state.clone()
    }

    /// Play/pause button: stops an active attempt, otherwise requests one.
    pub async fn toggle(&self) -> PlaybackState {
        if self.lock().state.is_active() {
            return self.stop_playback();
        }
        self.request_playback().await
    }
}
