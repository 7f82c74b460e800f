use serde::Serialize;

/// Advisory attached to a meal plan, chosen from the user's latest mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodAdvice {
    Energizing,
    Calming,
    Positive,
}

// Checked in order; the first group with a hit wins.
const KEYWORD_GROUPS: [(&[&str], MoodAdvice); 3] = [
    (&["tired", "fatigue"], MoodAdvice::Energizing),
    (&["stressed", "anxious"], MoodAdvice::Calming),
    (&["happy", "energetic"], MoodAdvice::Positive),
];

impl MoodAdvice {
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Energizing => "Include energizing foods rich in iron and B vitamins.",
            Self::Calming => "Include calming foods like magnesium-rich options and omega-3s.",
            Self::Positive => "Maintain the positive energy with balanced, nutritious meals.",
        }
    }
}

/// Case-insensitive substring match of `mood` against the keyword groups.
#[must_use]
pub fn classify_mood(mood: Option<&str>) -> Option<MoodAdvice> {
    let lower = mood?.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|&(_, advice)| advice)
}

/// Advisory text for `mood`, empty when nothing matches.
#[must_use]
pub fn mood_adjustment(mood: Option<&str>) -> &'static str {
    classify_mood(mood).map_or("", MoodAdvice::text)
}

/// Mood scores out of 10, used for rolling averages.
const MOOD_SCORES: &[(&str, u8)] = &[
    ("happy", 8),
    ("excited", 9),
    ("energetic", 8),
    ("content", 7),
    ("calm", 6),
    ("tired", 4),
    ("sad", 2),
    ("anxious", 3),
    ("stressed", 3),
];

/// Score for labels missing from the table.
pub const NEUTRAL_MOOD_SCORE: u8 = 5;

#[must_use]
pub fn mood_score(label: &str) -> u8 {
    let lower = label.trim().to_lowercase();
    MOOD_SCORES
        .iter()
        .find(|(name, _)| *name == lower)
        .map_or(NEUTRAL_MOOD_SCORE, |&(_, score)| score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_adjustment_groups() {
        assert_eq!(mood_adjustment(Some("tired")), MoodAdvice::Energizing.text());
        assert_eq!(
            mood_adjustment(Some("battling fatigue")),
            MoodAdvice::Energizing.text()
        );
        assert_eq!(mood_adjustment(Some("anxious")), MoodAdvice::Calming.text());
        assert_eq!(mood_adjustment(Some("so happy")), MoodAdvice::Positive.text());
        assert_eq!(mood_adjustment(Some("sad")), "");
        assert_eq!(mood_adjustment(None), "");
    }

    #[test]
    fn test_mood_adjustment_case_insensitive() {
        assert_eq!(mood_adjustment(Some("TIRED")), mood_adjustment(Some("tired")));
        assert_eq!(
            classify_mood(Some("StReSsEd")),
            Some(MoodAdvice::Calming)
        );
    }

    #[test]
    fn test_first_group_wins() {
        // Matches both the energizing and positive groups.
        assert_eq!(
            classify_mood(Some("happy but tired")),
            Some(MoodAdvice::Energizing)
        );
        assert_eq!(
            classify_mood(Some("energetic yet anxious")),
            Some(MoodAdvice::Calming)
        );
    }

    #[test]
    fn test_mood_score() {
        assert_eq!(mood_score("Happy"), 8);
        assert_eq!(mood_score("excited"), 9);
        assert_eq!(mood_score("sad"), 2);
        assert_eq!(mood_score("bewildered"), NEUTRAL_MOOD_SCORE);
        assert_eq!(mood_score(""), NEUTRAL_MOOD_SCORE);
    }
}
