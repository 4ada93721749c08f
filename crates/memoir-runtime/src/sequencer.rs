//! [`FlyoverSequencer`] – the flyover playback state machine.
//!
//! Given a selected year, the sequencer filters the catalog and runs an
//! endless cycle over the matching memories:
//!
//! 1. fly the camera to the memory with a random heading,
//! 2. replace the popup with this memory's photo and caption,
//! 3. advance the cursor (wrapping to the first memory),
//! 4. schedule the next tick one dwell interval later.
//!
//! # State machine
//!
//! ```text
//!            start(y), y has memories
//!   Idle ────────────────────────────▶ Playing ◀──┐ tick
//!    ▲                                  │  ▲  ────┘
//!    │ start(y), y empty        pause() │  │ resume(y)
//!    └──────────── any ◀────────────────▼  │
//!                                      Paused
//! ```
//!
//! `start` is the only way to leave a session: it drops the current
//! [`PlaybackSession`] and with it the session's single pending deadline, so
//! a superseded session can never tick again.  The new session's first tick
//! is armed one start delay later rather than run inline, so a `start` that
//! is replaced before that deadline never reaches the map.  `pause` clears
//! the deadline; `resume` leaves the paused memory on screen for a full
//! dwell interval before the cycle continues from the cursor.
//!
//! The sequencer is synchronous and takes the current [`Instant`] as an
//! argument.  [`crate::driver`] owns one and feeds it commands and
//! deadlines from a single task.
//!
//! # Side-channel interactions
//!
//! Activating the visible popup ([`FlyoverSequencer::activate_overlay`])
//! pauses playback and opens the photo fullscreen.  Dismissing it
//! ([`FlyoverSequencer::dismiss_fullscreen`]) resumes the year the photo
//! belongs to.

use std::sync::Arc;
use std::time::Duration;

use memoir_catalog::Catalog;
use memoir_map::{Camera, FlyTo, OverlayHandle, OverlaySurface};
use memoir_middleware::{EventBus, Topic};
use memoir_types::{Event, EventPayload, FlyoverError, MemoryRecord, PlaybackState, Year};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::overlay::OverlayManager;

const EVENT_SOURCE: &str = "memoir-runtime::sequencer";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Camera profile and timing for the flyover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyoverConfig {
    /// Seconds each memory stays on screen before the next flight.
    pub dwell_secs: u64,
    /// Seconds between selecting a year and the first flight.  May be zero.
    pub start_delay_secs: u64,
    pub zoom: f64,
    pub pitch: f64,
    pub speed: f64,
    pub curve: f64,
}

impl Default for FlyoverConfig {
    fn default() -> Self {
        Self {
            dwell_secs: 8,
            start_delay_secs: 2,
            zoom: 14.0,
            pitch: 60.0,
            speed: 0.6,
            curve: 1.4,
        }
    }
}

impl FlyoverConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.dwell_secs)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_secs)
    }

    /// Reject values the camera primitive cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::Config`] naming the first bad field.
    pub fn validate(&self) -> Result<(), FlyoverError> {
        if self.dwell_secs == 0 {
            return Err(FlyoverError::Config("dwell_secs must be at least 1".to_string()));
        }
        if !(0.0..=22.0).contains(&self.zoom) {
            return Err(FlyoverError::Config(format!(
                "zoom {} is outside 0..=22",
                self.zoom
            )));
        }
        if !(0.0..=85.0).contains(&self.pitch) {
            return Err(FlyoverError::Config(format!(
                "pitch {} is outside 0..=85",
                self.pitch
            )));
        }
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return Err(FlyoverError::Config("speed must be positive".to_string()));
        }
        if !(self.curve > 0.0 && self.curve.is_finite()) {
            return Err(FlyoverError::Config("curve must be positive".to_string()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Live state of one flyover run for a single year.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: u64,
    year: Year,
    sequence: Vec<MemoryRecord>,
    cursor: usize,
    paused: bool,
    /// The one pending tick.  `None` while paused or idle.
    next_tick: Option<Instant>,
}

impl PlaybackSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn year(&self) -> Year {
        self.year
    }

    /// The catalog records for this year, in catalog order.
    pub fn sequence(&self) -> &[MemoryRecord] {
        &self.sequence
    }

    /// Index of the memory the next tick will show.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn state(&self) -> PlaybackState {
        if self.sequence.is_empty() {
            PlaybackState::Idle
        } else if self.paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }
}

/// Point-in-time view of the flyover for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub year: Option<Year>,
    pub cursor: usize,
    pub len: usize,
    /// Memory whose popup is on screen.
    pub current: Option<MemoryRecord>,
    /// Handle of that popup, for activation.
    pub overlay: Option<OverlayHandle>,
    /// Memory shown fullscreen, if any.
    pub fullscreen: Option<MemoryRecord>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            year: None,
            cursor: 0,
            len: 0,
            current: None,
            overlay: None,
            fullscreen: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FlyoverSequencer
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the single live [`PlaybackSession`] and every effect it produces.
pub struct FlyoverSequencer {
    catalog: Arc<Catalog>,
    camera: Box<dyn Camera>,
    overlays: OverlayManager,
    config: FlyoverConfig,
    bus: EventBus,
    session: Option<PlaybackSession>,
    sessions_started: u64,
}

impl FlyoverSequencer {
    pub fn new(
        catalog: Arc<Catalog>,
        camera: Box<dyn Camera>,
        surface: Box<dyn OverlaySurface>,
        config: FlyoverConfig,
    ) -> Self {
        Self {
            catalog,
            camera,
            overlays: OverlayManager::new(surface),
            config,
            bus: EventBus::default(),
            session: None,
            sessions_started: 0,
        }
    }

    /// Publish playback events on `bus` instead of a private one.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Return a clone of the [`EventBus`] so callers can subscribe.
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn config(&self) -> &FlyoverConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map_or(PlaybackState::Idle, PlaybackSession::state)
    }

    /// When the pending tick is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(|s| s.next_tick)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Begin a new session for `year`, superseding any current one.
    ///
    /// The popup of the superseded session is removed at once.  Nothing of
    /// the new year is shown until its first tick, one start delay after
    /// `now`.  A year with no memories leaves the flyover idle: no flight,
    /// no popup, no deadline.
    pub fn start(&mut self, year: Year, now: Instant) {
        if let Some(old) = self.session.take() {
            debug!(session = old.id, year = old.year, "session superseded");
            self.publish(Topic::Playback, EventPayload::SessionSuperseded { year: old.year });
        }
        if let Some(record) = self.overlays.close_fullscreen() {
            debug!(photo = %record.photo, "fullscreen closed by new session");
            self.publish(
                Topic::Interaction,
                EventPayload::FullscreenClosed {
                    photo: record.photo,
                },
            );
        }

        self.overlays.destroy_all();

        let sequence = self.catalog.for_year(year);
        self.sessions_started += 1;
        let memories = sequence.len();
        let next_tick = (!sequence.is_empty()).then(|| now + self.config.start_delay());
        self.session = Some(PlaybackSession {
            id: self.sessions_started,
            year,
            sequence,
            cursor: 0,
            paused: false,
            next_tick,
        });
        self.publish(Topic::Playback, EventPayload::SessionStarted { year, memories });

        if next_tick.is_none() {
            info!(year, "no memories for year; flyover idle");
        } else {
            info!(year, memories, "flyover started");
        }
    }

    /// Freeze playback on the current memory.  Idempotent.
    ///
    /// Returns `true` if this call changed the state.
    pub fn pause(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.paused || session.sequence.is_empty() {
            return false;
        }
        session.paused = true;
        session.next_tick = None;
        let (year, cursor) = (session.year, session.cursor);
        info!(year, cursor, "flyover paused");
        self.publish(Topic::Playback, EventPayload::PlaybackPaused { year, cursor });
        true
    }

    /// Continue a paused session for `year` from its current cursor.
    ///
    /// The memory on screen stays for one more dwell interval; the next
    /// tick shows the memory at the cursor.  Ignored when the session is not
    /// paused or belongs to another year (a resume left over from a
    /// superseded session).  Returns `true` if playback resumed.
    pub fn resume(&mut self, year: Year, now: Instant) -> bool {
        let Some(session) = self.session.as_mut() else {
            debug!(year, "resume without a session ignored");
            return false;
        };
        if session.year != year {
            debug!(year, current = session.year, "stale resume ignored");
            return false;
        }
        if !session.paused {
            return false;
        }
        session.paused = false;
        session.next_tick = Some(now + self.config.dwell());
        let cursor = session.cursor;
        info!(year, cursor, "flyover resumed");
        self.publish(Topic::Playback, EventPayload::PlaybackResumed { year, cursor });
        true
    }

    /// Run one cycle: fly, replace the popup, advance, re-arm.
    ///
    /// Does nothing while paused, idle or without a session.
    pub fn tick(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.paused || session.sequence.is_empty() {
            return;
        }
        let index = session.cursor;
        let record = session.sequence[index].clone();
        session.cursor = (index + 1) % session.sequence.len();
        session.next_tick = Some(now + self.config.dwell());
        let year = session.year;

        let flight = FlyTo {
            center: record.coordinates,
            zoom: self.config.zoom,
            pitch: self.config.pitch,
            bearing: rand::rng().random_range(0.0..360.0),
            speed: self.config.speed,
            curve: self.config.curve,
            essential: true,
        };
        if let Err(e) = self.camera.fly_to(&flight) {
            warn!(year, index, error = %e, "camera flight failed");
        }

        self.overlays.destroy_all();
        if let Err(e) = self.overlays.show(&record) {
            warn!(year, index, error = %e, "failed to show popup");
        }

        debug!(year, index, place = record.label(), "memory shown");
        self.publish(
            Topic::Playback,
            EventPayload::MemoryShown {
                year,
                index,
                caption: record.caption,
                coordinates: record.coordinates,
            },
        );
    }

    /// The viewer activated a popup: pause and open its photo fullscreen.
    ///
    /// Only the visible popup can be activated; a handle for a popup that
    /// has already been replaced is ignored.  If the fullscreen presentation
    /// cannot be opened, a pause made by this call is undone; a pause the
    /// viewer made earlier stands.  Returns `true` if the photo is now
    /// fullscreen.
    pub fn activate_overlay(&mut self, handle: OverlayHandle, now: Instant) -> bool {
        let record = match self.overlays.visible() {
            Some(active) if active.handle == handle => active.record.clone(),
            _ => {
                debug!(%handle, "activation of a popup that is no longer visible ignored");
                return false;
            }
        };
        let paused_here = self.pause();
        match self.overlays.open_fullscreen(&record) {
            Ok(()) => {
                self.publish(
                    Topic::Interaction,
                    EventPayload::FullscreenOpened {
                        photo: record.photo,
                    },
                );
                true
            }
            Err(e) => {
                warn!(error = %e, photo = %record.photo, "fullscreen unavailable");
                if paused_here {
                    self.resume(record.year, now);
                }
                false
            }
        }
    }

    /// The viewer dismissed the fullscreen photo: close it and resume the
    /// photo's year.  Returns `true` if something was open.
    pub fn dismiss_fullscreen(&mut self, now: Instant) -> bool {
        let Some(record) = self.overlays.close_fullscreen() else {
            return false;
        };
        let year = record.year;
        self.publish(
            Topic::Interaction,
            EventPayload::FullscreenClosed {
                photo: record.photo,
            },
        );
        self.resume(year, now);
        true
    }

    /// Tear everything down: cancel the session and clear the map.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session = session.id, year = session.year, "flyover stopped");
        }
        self.overlays.destroy_all();
        self.overlays.close_fullscreen();
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let visible = self.overlays.visible();
        PlaybackSnapshot {
            state: self.state(),
            year: self.session.as_ref().map(|s| s.year),
            cursor: self.session.as_ref().map_or(0, |s| s.cursor),
            len: self.session.as_ref().map_or(0, |s| s.sequence.len()),
            current: visible.map(|o| o.record.clone()),
            overlay: visible.map(|o| o.handle),
            fullscreen: self.overlays.fullscreen().cloned(),
        }
    }

    // Best-effort: no subscribers is not an error.
    fn publish(&self, topic: Topic, payload: EventPayload) {
        let _ = self.bus.publish_to(topic, Event::new(EVENT_SOURCE, payload));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
