use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Calendar year a memory belongs to.  Unsigned, so never negative.
pub type Year = u32;

/// A geographic position as `(longitude, latitude)` in degrees.
///
/// Serializes as a two-element array `[lng, lat]`, the order the mapping
/// engine expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat(pub f64, pub f64);

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self(lng, lat)
    }

    pub fn lng(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    /// `true` when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite()
            && self.1.is_finite()
            && (-180.0..=180.0).contains(&self.0)
            && (-90.0..=90.0).contains(&self.1)
    }
}

impl std::fmt::Display for LngLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.0, self.1)
    }
}

/// One geotagged photo memory.
///
/// Records are plain values: they are cloned into playback sessions and never
/// mutated after the catalog is loaded.  The same `photo` may appear on
/// several records at different coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub coordinates: LngLat,
    /// Opaque image reference (file name or URL).  Never validated here.
    pub photo: String,
    pub caption: String,
    pub year: Year,
    /// Human-readable place name, used only for narration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

impl MemoryRecord {
    pub fn new(
        coordinates: LngLat,
        photo: impl Into<String>,
        caption: impl Into<String>,
        year: Year,
    ) -> Self {
        Self {
            coordinates,
            photo: photo.into(),
            caption: caption.into(),
            year,
            place: None,
        }
    }

    /// Builder-style setter for [`place`][Self::place].
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Place name if present, otherwise the caption.
    pub fn label(&self) -> &str {
        self.place.as_deref().unwrap_or(&self.caption)
    }
}

/// Coarse playback state of the flyover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No session, or the selected year has no memories.
    Idle,
    Playing,
    Paused,
}

/// Unified event wrapper for the flyover event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"memoir-runtime::sequencer"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` with a fresh id and the current UTC timestamp.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Everything the flyover announces while it plays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum EventPayload {
    SessionStarted {
        year: Year,
        memories: usize,
    },
    /// A previous session was replaced before it ended.
    SessionSuperseded {
        year: Year,
    },
    MemoryShown {
        year: Year,
        index: usize,
        caption: String,
        coordinates: LngLat,
    },
    PlaybackPaused {
        year: Year,
        cursor: usize,
    },
    PlaybackResumed {
        year: Year,
        cursor: usize,
    },
    FullscreenOpened {
        photo: String,
    },
    FullscreenClosed {
        photo: String,
    },
}

/// Error type shared by the catalog, runtime and CLI crates.
#[derive(Error, Debug)]
pub enum FlyoverError {
    #[error("no memories are indexed for year {0}")]
    UnknownYear(Year),

    #[error("invalid memory record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("channel error: {0}")]
    Channel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lnglat_serializes_as_array() {
        let json = serde_json::to_string(&LngLat::new(35.235, 31.776)).unwrap();
        assert_eq!(json, "[35.235,31.776]");
    }

    #[test]
    fn lnglat_range_checks() {
        assert!(LngLat::new(-0.1276, 51.5072).is_valid());
        assert!(LngLat::new(180.0, -90.0).is_valid());
        assert!(!LngLat::new(181.0, 0.0).is_valid());
        assert!(!LngLat::new(0.0, 90.5).is_valid());
        assert!(!LngLat::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn record_label_prefers_place() {
        let rec = MemoryRecord::new(LngLat::new(0.0, 0.0), "a.jpg", "A caption", 2023);
        assert_eq!(rec.label(), "A caption");
        let rec = rec.with_place("London");
        assert_eq!(rec.label(), "London");
    }

    #[test]
    fn record_without_place_omits_field() {
        let rec = MemoryRecord::new(LngLat::new(1.0, 2.0), "a.jpg", "cap", 2022);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(!json.contains("place"));
        let back: MemoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn event_payload_is_tagged() {
        let event = Event::new(
            "memoir-runtime::sequencer",
            EventPayload::PlaybackPaused { year: 2022, cursor: 1 },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"PlaybackPaused""#));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
    }

    #[test]
    fn playback_state_lowercase() {
        let json = serde_json::to_string(&PlaybackState::Paused).unwrap();
        assert_eq!(json, r#""paused""#);
    }

    #[test]
    fn flyover_error_display() {
        let err = FlyoverError::UnknownYear(1999);
        assert!(err.to_string().contains("1999"));

        let err = FlyoverError::InvalidRecord {
            index: 3,
            reason: "latitude out of range".to_string(),
        };
        assert!(err.to_string().contains("#3"));
    }
}
