//! `memoir-middleware` – event routing for the flyover.
//!
//! Carries playback and interaction events from the sequencer to whoever is
//! presenting them (the CLI narrator, tests, a future web front-end) without
//! either side knowing about the other.
//!
//! # Modules
//!
//! - [`bus`] – typed, topic-based publish/subscribe event bus built on Tokio
//!   broadcast channels.

pub mod bus;

pub use bus::{EventBus, Topic, TopicReceiver};
