//! Calendar events as seen by the reflow engine.
//!
//! Only `start` and `end` are ever interpreted. Everything else is opaque
//! metadata that must survive every transformation untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ReflowError, Result};

/// One scheduled item on a day's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Assigned by the remote calendar. `None` until the event is created.
    pub id: Option<String>,
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Remote color id (e.g. `"11"`), passed through as-is.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attendees: Option<serde_json::Value>,
    /// RRULE/EXDATE lines
    #[serde(default)]
    pub recurrence: Option<Vec<String>>,
    #[serde(default)]
    pub reminders: Option<serde_json::Value>,
    /// Remote fields this crate does not model (conference data, visibility,
    /// `start.timeZone`, ...), written back unchanged.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    /// Create a not-yet-persisted event with no metadata.
    pub fn new(
        summary: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: None,
            summary: summary.into(),
            start,
            end,
            color: None,
            location: None,
            description: None,
            attendees: None,
            recurrence: None,
            reminders: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_color(mut self, color: ColorTag) -> Self {
        self.color = Some(color.id().to_string());
        self
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Copy of this event moved to new boundaries, metadata untouched.
    pub fn with_bounds(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }

    /// Identifier for logs and error messages: the id if known, else the summary.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.summary)
    }

    /// Reject zero and negative durations.
    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(ReflowError::invalid_event(
                self.label(),
                format!(
                    "end ({}) must be after start ({})",
                    self.end.to_rfc3339(),
                    self.start.to_rfc3339()
                ),
            ));
        }
        Ok(())
    }
}

/// The eleven event colors of the remote calendar palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorTag {
    #[default]
    Lavender,
    Sage,
    Grape,
    Flamingo,
    Banana,
    Tangerine,
    Peacock,
    Graphite,
    Blueberry,
    Basil,
    Tomato,
}

impl ColorTag {
    pub const ALL: [ColorTag; 11] = [
        ColorTag::Lavender,
        ColorTag::Sage,
        ColorTag::Grape,
        ColorTag::Flamingo,
        ColorTag::Banana,
        ColorTag::Tangerine,
        ColorTag::Peacock,
        ColorTag::Graphite,
        ColorTag::Blueberry,
        ColorTag::Basil,
        ColorTag::Tomato,
    ];

    /// Remote color id ("1".."11").
    pub fn id(&self) -> &'static str {
        match self {
            ColorTag::Lavender => "1",
            ColorTag::Sage => "2",
            ColorTag::Grape => "3",
            ColorTag::Flamingo => "4",
            ColorTag::Banana => "5",
            ColorTag::Tangerine => "6",
            ColorTag::Peacock => "7",
            ColorTag::Graphite => "8",
            ColorTag::Blueberry => "9",
            ColorTag::Basil => "10",
            ColorTag::Tomato => "11",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorTag::Lavender => "Lavender",
            ColorTag::Sage => "Sage",
            ColorTag::Grape => "Grape",
            ColorTag::Flamingo => "Flamingo",
            ColorTag::Banana => "Banana",
            ColorTag::Tangerine => "Tangerine",
            ColorTag::Peacock => "Peacock",
            ColorTag::Graphite => "Graphite",
            ColorTag::Blueberry => "Blueberry",
            ColorTag::Basil => "Basil",
            ColorTag::Tomato => "Tomato",
        }
    }

    /// Pick a palette color at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL.choose(rng).copied().unwrap_or_default()
    }

    /// Resolve a user choice: an id, a name, or `"random"`.
    ///
    /// Anything unrecognized falls back to Lavender.
    pub fn from_choice<R: Rng + ?Sized>(choice: &str, rng: &mut R) -> Self {
        let choice = choice.trim();
        if choice.eq_ignore_ascii_case("random") {
            return Self::random(rng);
        }
        match choice.parse() {
            Ok(color) => color,
            Err(_) => {
                tracing::warn!(choice, "unknown color choice, defaulting to Lavender");
                ColorTag::Lavender
            }
        }
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

impl FromStr for ColorTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .find(|c| c.id() == s || c.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown color: {s}"))
    }
}

impl TryFrom<String> for ColorTag {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColorTag> for String {
    fn from(color: ColorTag) -> Self {
        color.id().to_string()
    }
}
