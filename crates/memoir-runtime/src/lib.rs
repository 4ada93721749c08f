//! `memoir-runtime` – the flyover engine.
//!
//! Turns a year selection into an endless, paced tour of that year's
//! memories: camera flights, one photo popup at a time, and a fullscreen
//! view on demand.
//!
//! # Modules
//!
//! - [`sequencer`] – [`FlyoverSequencer`][sequencer::FlyoverSequencer]:
//!   the synchronous playback state machine.  Owns the single live
//!   [`PlaybackSession`][sequencer::PlaybackSession] and its one pending
//!   deadline, so a superseded session can never fire.
//! - [`driver`] – [`spawn_flyover`][driver::spawn_flyover]: runs a sequencer
//!   on one tokio task, multiplexing viewer commands with the session
//!   deadline.  [`FlyoverHandle`][driver::FlyoverHandle] is the cloneable,
//!   non-blocking front door.
//! - [`overlay`] – [`OverlayManager`][overlay::OverlayManager]: popup and
//!   fullscreen lifecycle on top of an
//!   [`OverlaySurface`][memoir_map::OverlaySurface].
//! - [`selection`] – [`SelectionController`][selection::SelectionController]:
//!   one control per catalog year, with a single selected indicator.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with optional OTLP export.

pub mod driver;
pub mod overlay;
pub mod selection;
pub mod sequencer;
pub mod telemetry;

pub use driver::{Command, FlyoverControl, FlyoverHandle, spawn_flyover};
pub use overlay::{ActiveOverlay, OverlayManager, render_popup_html};
pub use selection::{SelectionControl, SelectionController};
pub use sequencer::{FlyoverConfig, FlyoverSequencer, PlaybackSession, PlaybackSnapshot};
pub use telemetry::{TracerProviderGuard, init_tracing};
