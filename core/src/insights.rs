use serde::Serialize;

use crate::glucose::{GlucoseStatus, check_range};
use crate::models::{LogEntry, LogType};
use crate::mood::mood_score;

/// Number of most recent entries of each type that feed the summaries.
pub const INSIGHT_WINDOW: usize = 7;
/// Minimum change in mg/dL across the window to call a trend.
pub const TREND_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

impl Trend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Steady => "steady",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodInsight {
    pub latest: Option<String>,
    pub rolling_average: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucoseInsight {
    pub latest: Option<i64>,
    pub average: Option<f64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Readings in the window outside the safe band. Recomputed on every read.
    pub alerts: usize,
    pub trend: Option<Trend>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub user_id: i64,
    pub mood: MoodInsight,
    pub glucose: GlucoseInsight,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Direction from the oldest to the newest reading. `readings` is newest first.
#[must_use]
pub fn glucose_trend(readings: &[i64]) -> Option<Trend> {
    let (&newest, &oldest) = (readings.first()?, readings.last()?);
    if readings.len() < 2 {
        return None;
    }
    // Readings span the whole i64 range, so the difference may not fit in one.
    let delta = i128::from(newest) - i128::from(oldest);
    let threshold = i128::from(TREND_THRESHOLD);
    Some(if delta > threshold {
        Trend::Rising
    } else if delta < -threshold {
        Trend::Falling
    } else {
        Trend::Steady
    })
}

/// Summarize a user's log, given newest first.
#[must_use]
pub fn summarize(user_id: i64, entries: &[LogEntry]) -> Insights {
    let moods: Vec<&str> = entries
        .iter()
        .filter(|e| e.log_type == LogType::Mood)
        .take(INSIGHT_WINDOW)
        .map(|e| e.value.as_str())
        .collect();

    let readings: Vec<i64> = entries
        .iter()
        .filter_map(LogEntry::glucose)
        .take(INSIGHT_WINDOW)
        .collect();

    let mood = MoodInsight {
        latest: moods.first().map(|m| (*m).to_string()),
        rolling_average: mean(moods.iter().map(|m| f64::from(mood_score(m)))),
        samples: moods.len(),
    };

    #[allow(clippy::cast_precision_loss)]
    let glucose = GlucoseInsight {
        latest: readings.first().copied(),
        average: mean(readings.iter().map(|&g| g as f64)),
        min: readings.iter().min().copied(),
        max: readings.iter().max().copied(),
        alerts: readings
            .iter()
            .filter(|&&g| check_range(g).status == GlucoseStatus::Alert)
            .count(),
        trend: glucose_trend(&readings),
        samples: readings.len(),
    };

    Insights {
        user_id,
        mood,
        glucose,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(log_id: i64, log_type: LogType, value: &str) -> LogEntry {
        LogEntry {
            log_id,
            user_id: 7,
            timestamp: format!("2024-06-15T10:00:{log_id:02}.000000Z"),
            log_type,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_empty_log() {
        let insights = summarize(7, &[]);
        assert_eq!(insights.user_id, 7);
        assert_eq!(insights.mood.samples, 0);
        assert!(insights.mood.latest.is_none());
        assert!(insights.mood.rolling_average.is_none());
        assert_eq!(insights.glucose.samples, 0);
        assert!(insights.glucose.average.is_none());
        assert!(insights.glucose.trend.is_none());
        assert_eq!(insights.glucose.alerts, 0);
    }

    #[test]
    fn test_mood_rolling_average() {
        // Newest first: happy (8), sad (2), unknown (5)
        let entries = vec![
            entry(3, LogType::Mood, "Happy"),
            entry(2, LogType::Food, "toast"),
            entry(1, LogType::Mood, "sad"),
            entry(0, LogType::Mood, "meh"),
        ];
        let insights = summarize(7, &entries);
        assert_eq!(insights.mood.latest.as_deref(), Some("Happy"));
        assert_eq!(insights.mood.samples, 3);
        assert!((insights.mood.rolling_average.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_mood_window_is_bounded() {
        let entries: Vec<LogEntry> = (0..10)
            .rev()
            .map(|i| entry(i, LogType::Mood, if i >= 3 { "excited" } else { "sad" }))
            .collect();
        let insights = summarize(7, &entries);
        assert_eq!(insights.mood.samples, INSIGHT_WINDOW);
        assert!((insights.mood.rolling_average.unwrap() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_glucose_summary() {
        let entries = vec![
            entry(4, LogType::Cgm, "320"),
            entry(3, LogType::Cgm, "not a number"),
            entry(2, LogType::Cgm, "140"),
            entry(1, LogType::Mood, "tired"),
            entry(0, LogType::Cgm, "70"),
        ];
        let g = summarize(7, &entries).glucose;
        assert_eq!(g.samples, 3);
        assert_eq!(g.latest, Some(320));
        assert_eq!(g.min, Some(70));
        assert_eq!(g.max, Some(320));
        assert_eq!(g.alerts, 2);
        assert!((g.average.unwrap() - 176.666_666).abs() < 1e-3);
        assert_eq!(g.trend, Some(Trend::Rising));
    }

    #[test]
    fn test_glucose_trend() {
        assert_eq!(glucose_trend(&[]), None);
        assert_eq!(glucose_trend(&[120]), None);
        assert_eq!(glucose_trend(&[130, 125, 120]), Some(Trend::Steady));
        assert_eq!(glucose_trend(&[100, 140, 160]), Some(Trend::Falling));
        assert_eq!(glucose_trend(&[200, 150]), Some(Trend::Rising));
    }

    #[test]
    fn test_glucose_trend_extreme_readings() {
        assert_eq!(glucose_trend(&[i64::MAX, -5]), Some(Trend::Rising));
        assert_eq!(glucose_trend(&[i64::MIN, i64::MAX]), Some(Trend::Falling));
        assert_eq!(glucose_trend(&[i64::MAX, i64::MAX]), Some(Trend::Steady));

        let entries = vec![
            entry(1, LogType::Cgm, "-5"),
            entry(0, LogType::Cgm, "9223372036854775807"),
        ];
        let g = summarize(1, &entries).glucose;
        assert_eq!(g.trend, Some(Trend::Falling));
        assert_eq!(g.alerts, 2);
        assert_eq!(g.max, Some(i64::MAX));
    }
}
