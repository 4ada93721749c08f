//! Typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels so that every subscriber receives
//! every message without any single subscriber blocking the others.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Playback`] | Session started/superseded, memory shown, paused, resumed |
//! | [`Topic::Interaction`] | Fullscreen presentation opened/closed |
//!
//! Every event published to a topic is also mirrored onto the global channel
//! returned by [`EventBus::subscribe`], so a single narrator can follow the
//! whole flyover.

use memoir_types::{Event, FlyoverError};
use tokio::sync::broadcast;
use tracing::trace;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Sequencer lifecycle: sessions, ticks, pause and resume.
    Playback,
    /// Viewer interactions with the popup and fullscreen presentation.
    Interaction,
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    global: broadcast::Sender<Event>,
    playback: broadcast::Sender<Event>,
    interaction: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every channel independently.
    pub fn new(capacity: usize) -> Self {
        let (global, _) = broadcast::channel(capacity);
        let (playback, _) = broadcast::channel(capacity);
        let (interaction, _) = broadcast::channel(capacity);
        Self {
            global,
            playback,
            interaction,
        }
    }

    /// Publish `event` to the given [`Topic`] and mirror it to the global
    /// channel.
    ///
    /// Returns the total number of receivers that were handed the event.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::Channel`] when nobody is listening on either
    /// the topic or the global channel.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, FlyoverError> {
        let on_topic = self.topic_sender(topic).send(event.clone()).unwrap_or(0);
        let on_global = self.global.send(event).unwrap_or(0);
        match on_topic + on_global {
            0 => Err(FlyoverError::Channel(format!(
                "no subscribers for topic {topic:?}"
            ))),
            n => {
                trace!(?topic, receivers = n, "event published");
                Ok(n)
            }
        }
    }

    /// Subscribe to a single [`Topic`].
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Subscribe to every event regardless of topic.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.global.subscribe()
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Playback => &self.playback,
            Topic::Interaction => &self.interaction,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(RecvError::Lagged(n))` – the subscriber fell behind and `n`
    ///   messages were dropped.
    /// * `Err(RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking receive, for draining between ticks.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}
