//! Glucose range checks and the health-state classifier used by the meal planner.
//!
//! Thresholds are illustrative, not medically validated.

use serde::Serialize;

/// Lower bound of the safe band, inclusive.
pub const SAFE_MIN_MG_DL: i64 = 80;
/// Upper bound of the safe band, inclusive.
pub const SAFE_MAX_MG_DL: i64 = 300;
/// Readings below this are `LOW_GLUCOSE`.
pub const LOW_BELOW: i64 = 80;
/// Readings above this (and not above [`HIGH_ABOVE`]) are `ELEVATED_GLUCOSE`.
pub const ELEVATED_ABOVE: i64 = 150;
/// Readings above this are `HIGH_GLUCOSE`.
pub const HIGH_ABOVE: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GlucoseStatus {
    Stable,
    Alert,
}

impl GlucoseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Alert => "alert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeCheck {
    pub reading: i64,
    pub status: GlucoseStatus,
    pub message: String,
}

/// Classify a reading against the safe band. Any integer is accepted;
/// out-of-band values are only annotated.
#[must_use]
pub fn check_range(reading: i64) -> RangeCheck {
    let (status, message) = if (SAFE_MIN_MG_DL..=SAFE_MAX_MG_DL).contains(&reading) {
        (
            GlucoseStatus::Stable,
            format!("Glucose reading {reading} mg/dL is stable."),
        )
    } else {
        (
            GlucoseStatus::Alert,
            format!(
                "ALERT: Glucose reading of {reading} mg/dL is outside the safe range ({SAFE_MIN_MG_DL}-{SAFE_MAX_MG_DL})."
            ),
        )
    };
    RangeCheck {
        reading,
        status,
        message,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    LowGlucose,
    ElevatedGlucose,
    HighGlucose,
    NormalGlucose,
    Balanced,
}

impl Strategy {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::LowGlucose => "LOW_GLUCOSE",
            Self::ElevatedGlucose => "ELEVATED_GLUCOSE",
            Self::HighGlucose => "HIGH_GLUCOSE",
            Self::NormalGlucose => "NORMAL_GLUCOSE",
            Self::Balanced => "BALANCED",
        }
    }

    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::LowGlucose => {
                "Focus on balanced meals with complex carbs to raise blood sugar gradually"
            }
            Self::ElevatedGlucose => {
                "Focus on moderate-carb meals with fiber to stabilize blood sugar"
            }
            Self::HighGlucose => "Focus on low-carb, high-protein meals to lower blood sugar",
            Self::NormalGlucose => "Maintain balanced nutrition with regular meal timing",
            Self::Balanced => "Provide general healthy meal plan",
        }
    }

    /// `TAG - guidance`, as shown in the plan header.
    #[must_use]
    pub fn label(self) -> String {
        format!("{} - {}", self.tag(), self.guidance())
    }
}

/// Map the latest reading to a strategy. Checks run in order, first match wins:
/// absent, below 80, above 200, above 150, otherwise normal.
#[must_use]
pub fn classify_state(glucose: Option<i64>) -> Strategy {
    match glucose {
        None => Strategy::Balanced,
        Some(g) if g < LOW_BELOW => Strategy::LowGlucose,
        Some(g) if g > HIGH_ABOVE => Strategy::HighGlucose,
        Some(g) if g > ELEVATED_ABOVE => Strategy::ElevatedGlucose,
        Some(_) => Strategy::NormalGlucose,
    }
}
