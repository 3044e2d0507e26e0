//! Activity model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for an activity.
///
/// Client-generated, globally unique. New ids use UUID v7 (time-sortable),
/// but arbitrary non-empty strings from the remote store are accepted so a
/// peer running a different id scheme cannot break deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(String);

impl ActivityId {
    /// Create a new unique activity ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActivityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Category of a tracked activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    /// Weight training
    Strength,
    /// Running, cycling, rowing, etc.
    Cardio,
    /// Stretching and mobility work
    Flexibility,
    /// Team or racket sports
    Sport,
    /// Anything else
    Other,
}

impl Default for ActivityType {
    fn default() -> Self {
        Self::Other
    }
}

/// A single set within an activity (reps, weight, time, distance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    /// Repetition count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    /// Weight in the user's display unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
    /// Distance in the user's display unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Whether this set was completed
    #[serde(default)]
    pub completed: bool,
}

/// Which set fields are active for an activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingFields {
    #[serde(default)]
    pub reps: bool,
    #[serde(default)]
    pub weight: bool,
    #[serde(default)]
    pub time: bool,
    #[serde(default)]
    pub distance: bool,
}

/// How often a recurring activity repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// Recurrence descriptor for repeating activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    /// Repeat cadence
    pub frequency: RecurrenceFrequency,
    /// Every N days/weeks/months
    pub interval: u32,
}

/// A workout activity - the synchronized unit
///
/// Edits replace the whole record; there is no internal history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Unique identifier
    pub id: ActivityId,
    /// Calendar date the activity is scheduled for
    pub date: NaiveDate,
    /// Activity category
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Display name (e.g. "Squat")
    pub name: String,
    /// Display emoji
    #[serde(default)]
    pub emoji: String,
    /// Whether the activity as a whole is done
    #[serde(default)]
    pub completed: bool,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ordered sets
    #[serde(default)]
    pub sets: Vec<SetRecord>,
    /// Which set fields are active
    #[serde(default)]
    pub tracking_fields: TrackingFields,
    /// Optional recurrence descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurrence>,
}

impl Activity {
    /// Create a new activity for the given date
    #[must_use]
    pub fn new(name: impl Into<String>, date: NaiveDate, activity_type: ActivityType) -> Self {
        Self {
            id: ActivityId::new(),
            date,
            activity_type,
            name: name.into(),
            emoji: String::new(),
            completed: false,
            notes: None,
            sets: Vec::new(),
            tracking_fields: TrackingFields::default(),
            recurring: None,
        }
    }
}
