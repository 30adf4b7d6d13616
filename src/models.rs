use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;

pub const DIMENSION_COUNT: usize = 12;
pub const METRIC_COUNT: usize = 3;

/// Declared schema of every row, in column order.
pub const DIMENSION_NAMES: [&str; DIMENSION_COUNT] = [
    "page",
    "language",
    "user",
    "unpatrolled",
    "newPage",
    "robot",
    "anonymous",
    "namespace",
    "continent",
    "country",
    "region",
    "city",
];

pub const METRIC_NAMES: [&str; METRIC_COUNT] = ["delta", "added", "deleted"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Page,
    Language,
    User,
    Unpatrolled,
    NewPage,
    Robot,
    Anonymous,
    Namespace,
    Continent,
    Country,
    Region,
    City,
}

impl Dimension {
    pub const ALL: [Dimension; DIMENSION_COUNT] = [
        Dimension::Page,
        Dimension::Language,
        Dimension::User,
        Dimension::Unpatrolled,
        Dimension::NewPage,
        Dimension::Robot,
        Dimension::Anonymous,
        Dimension::Namespace,
        Dimension::Continent,
        Dimension::Country,
        Dimension::Region,
        Dimension::City,
    ];

    pub fn name(self) -> &'static str {
        DIMENSION_NAMES[self as usize]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        DIMENSION_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Delta,
    Added,
    Deleted,
}

impl Metric {
    pub const ALL: [Metric; METRIC_COUNT] = [Metric::Delta, Metric::Added, Metric::Deleted];

    pub fn name(self) -> &'static str {
        METRIC_NAMES[self as usize]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        METRIC_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }
}

/// Dimension values being collected for a row. Unset slots stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimensions([Option<String>; DIMENSION_COUNT]);

impl Dimensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, dimension: Dimension, value: impl Into<String>) {
        self.0[dimension as usize] = Some(value.into());
    }

    pub fn set_flag(&mut self, dimension: Dimension, value: bool) {
        self.set(dimension, if value { "true" } else { "false" });
    }

    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.0[dimension as usize].as_deref()
    }
}

/// One decoded edit event. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    timestamp: DateTime<Utc>,
    dimensions: Dimensions,
    metrics: [f32; METRIC_COUNT],
}

impl Row {
    /// Builds a row, deriving `added`/`deleted` from the signed delta.
    pub fn new(timestamp: DateTime<Utc>, dimensions: Dimensions, delta: f32) -> Self {
        Self {
            timestamp,
            dimensions,
            metrics: [delta, delta.max(0.0), delta.min(0.0)],
        }
    }

    pub fn dimension_names(&self) -> &'static [&'static str] {
        &DIMENSION_NAMES
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        self.dimensions.get(dimension)
    }

    /// Returns `None` both for unset dimensions and for names outside the schema.
    pub fn dimension_by_name(&self, name: &str) -> Option<&str> {
        Dimension::from_name(name).and_then(|d| self.dimension(d))
    }

    pub fn metric(&self, metric: Metric) -> f32 {
        self.metrics[metric as usize]
    }

    pub fn metric_by_name(&self, name: &str) -> Option<f32> {
        Metric::from_name(name).map(|m| self.metric(m))
    }
}

/// Flat JSON object: timestamp in epoch millis, every dimension (null when unset), metrics.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + DIMENSION_COUNT + METRIC_COUNT))?;
        map.serialize_entry("timestamp", &self.timestamp_millis())?;
        for dimension in Dimension::ALL {
            map.serialize_entry(dimension.name(), &self.dimension(dimension))?;
        }
        for metric in Metric::ALL {
            map.serialize_entry(metric.name(), &self.metric(metric))?;
        }
        map.end()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WikipediaRow{{timestamp={}", self.timestamp.to_rfc3339())?;
        for dimension in Dimension::ALL {
            if let Some(value) = self.dimension(dimension) {
                write!(f, ", {}={}", dimension.name(), value)?;
            }
        }
        for metric in Metric::ALL {
            write!(f, ", {}={}", metric.name(), self.metric(metric))?;
        }
        write!(f, "}}")
    }
}

/// A feed line as captured off the wire, used for JSON-lines replay.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMessage {
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub text: String,
}
