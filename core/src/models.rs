use std::fmt;

use anyhow::{Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Lowest user ID handed out by the synthetic seed.
pub const MIN_USER_ID: i64 = 1;
/// Highest user ID handed out by the synthetic seed.
pub const MAX_USER_ID: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    NonVegetarian,
}

impl DietaryPreference {
    pub const ALL: [Self; 3] = [Self::Vegetarian, Self::Vegan, Self::NonVegetarian];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
            Self::NonVegetarian => "non-vegetarian",
        }
    }

    /// Case-insensitive match against the three known diets.
    ///
    /// Returns `None` for anything else; callers decide how to fall back.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|d| d.as_str() == lower)
    }
}

impl fmt::Display for DietaryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalLimitation {
    None,
    Mobility,
    Swallowing,
}

impl PhysicalLimitation {
    pub const ALL: [Self; 3] = [Self::None, Self::Mobility, Self::Swallowing];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mobility => "mobility",
            Self::Swallowing => "swallowing",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Mobility => "Mobility Issues",
            Self::Swallowing => "Swallowing Difficulties",
        }
    }

    /// Accepts both the stored form (`mobility`) and the display label
    /// (`Mobility Issues`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == lower || l.label().to_lowercase() == lower)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub dietary_preference: DietaryPreference,
    pub medical_conditions: Vec<String>,
    pub physical_limitations: PhysicalLimitation,
}

impl UserProfile {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Conditions as a single comma-separated line, `None` when empty.
    #[must_use]
    pub fn conditions_display(&self) -> String {
        if self.medical_conditions.is_empty() {
            "None".to_string()
        } else {
            self.medical_conditions.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Mood,
    Cgm,
    Food,
}

pub const LOG_TYPES: &[&str] = &["mood", "cgm", "food"];

impl LogType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mood => "mood",
            Self::Cgm => "cgm",
            Self::Food => "food",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_log_type(log_type: &str) -> Result<LogType> {
    match log_type.trim().to_lowercase().as_str() {
        "mood" => Ok(LogType::Mood),
        "cgm" => Ok(LogType::Cgm),
        "food" => Ok(LogType::Food),
        _ => bail!(
            "Invalid log type '{log_type}'. Must be one of: {}",
            LOG_TYPES.join(", ")
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub log_id: i64,
    pub user_id: i64,
    pub timestamp: String,
    pub log_type: LogType,
    pub value: String,
}

impl LogEntry {
    /// The reading in mg/dL, for `cgm` entries whose value parses as a number.
    #[must_use]
    pub fn glucose(&self) -> Option<i64> {
        if self.log_type != LogType::Cgm {
            return None;
        }
        parse_glucose(&self.value)
    }
}

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub user_id: i64,
    pub log_type: LogType,
    pub value: String,
    /// Defaults to the time of insertion.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewLogEntry {
    #[must_use]
    pub fn now(user_id: i64, log_type: LogType, value: impl Into<String>) -> Self {
        Self {
            user_id,
            log_type,
            value: value.into(),
            timestamp: None,
        }
    }
}

/// Fixed-width UTC timestamp, so lexical order in SQLite equals time order.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored glucose value. Integer strings are taken as-is, decimal
/// strings are rounded to the nearest mg/dL.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn parse_glucose(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    let v: f64 = value.parse().ok()?;
    if !v.is_finite() || v.abs() > i64::MAX as f64 {
        return None;
    }
    Some(v.round() as i64)
}
