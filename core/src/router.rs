//! Intents a chat message can be routed to, and a rule-based classifier.
//!
//! The dispatcher in [`crate::service`] only ever sees an [`Intent`]; how the
//! intent was recognized (these rules or a language model) is up to the caller.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    ValidateUser,
    LogMood {
        label: String,
    },
    LogCgm {
        reading: i64,
    },
    LogFood {
        description: String,
        timestamp: Option<String>,
    },
    /// Unset fields fall back to the latest logs and the user's profile.
    PlanMeals {
        latest_cgm: Option<i64>,
        latest_mood: Option<String>,
        dietary_preference: Option<String>,
        medical_conditions: Option<String>,
    },
    General {
        reply: Option<String>,
    },
}

impl Intent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ValidateUser => "validate_user",
            Self::LogMood { .. } => "log_mood",
            Self::LogCgm { .. } => "log_cgm",
            Self::LogFood { .. } => "log_food",
            Self::PlanMeals { .. } => "plan_meals",
            Self::General { .. } => "general",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedMessage {
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub intent: Intent,
}

static USER_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:user\s+id|user|id)\s*(?:is|:|#|=|number)?\s*#?\s*(\d{1,9})\b")
        .expect("valid user id regex")
});

// Only linking words may sit between the keyword and the number.
static GLUCOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:glucose|blood\s+sugar|sugar|cgm|bg)(?:\s+(?:levels?|readings?))?\s*(?:(?:is|was|of|at|now|reads|about|around|:|=)\s*)*(-?\d{1,6})\b",
    )
    .expect("valid glucose regex")
});

static PLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:meal\s*plan|diet\s+plan|plan\s+(?:my|the|a)?\s*meals?|what\s+should\s+i\s+eat)\b",
    )
    .expect("valid plan regex")
});

static FOOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ate|eaten|eating|had|having)\s+(?:some\s+)?(.+)")
        .expect("valid food regex")
});

// "had a rough day", "having a stressful week": time spans, not meals.
static NOT_FOOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:a|an|the|such\s+a|some|really|very|so|pretty)\s+)*(?:\w+\s+)?(?:day|days|week|weekend|night|morning|afternoon|evening|time|moment|month|year)(?:$|[,.;!]|\s+(?:and|but|so|at|with|of|in|for)\b)",
    )
    .expect("valid not-food regex")
});

static MEAL_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+(?:breakfast|lunch|dinner|a\s+snack|snack)\b")
        .expect("valid meal word regex")
});

static FEELING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:feeling|feel|mood\s+is|mood:)\s+(?:so\s+|very\s+|really\s+|quite\s+|a\s+bit\s+|kind\s+of\s+)?([a-z]+)",
    )
    .expect("valid feeling regex")
});

const MOOD_WORDS: &[&str] = &[
    "happy",
    "sad",
    "excited",
    "tired",
    "fatigued",
    "stressed",
    "anxious",
    "energetic",
    "content",
    "calm",
    "relaxed",
    "exhausted",
    "sleepy",
    "nervous",
    "worried",
    "upset",
    "angry",
    "frustrated",
    "depressed",
    "lonely",
    "cheerful",
    "great",
];

fn find_user_id(message: &str) -> Option<i64> {
    USER_ID_RE
        .captures(message)
        .and_then(|c| c[1].parse().ok())
}

fn find_feeling(message: &str) -> Option<String> {
    FEELING_RE.captures(message).map(|c| c[1].to_lowercase())
}

fn find_mood_word(message: &str) -> Option<String> {
    message
        .split(|c: char| !c.is_alphabetic())
        .map(str::to_lowercase)
        .find(|w| MOOD_WORDS.contains(&w.as_str()))
}

fn clean_description(s: &str) -> String {
    s.trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_string()
}

fn find_food(message: &str) -> Option<String> {
    if let Some(c) = FOOD_RE.captures(message) {
        let description = clean_description(&c[1]);
        if !description.is_empty() && !NOT_FOOD_RE.is_match(&description) {
            return Some(description);
        }
    }
    MEAL_WORD_RE
        .is_match(message)
        .then(|| clean_description(message))
}

/// Route a message with plain keyword rules.
///
/// `context_user_id` is the ID the caller already knows (request context);
/// an ID named in the message takes precedence.
#[must_use]
pub fn classify(message: &str, context_user_id: Option<i64>) -> RoutedMessage {
    let named_id = find_user_id(message);
    let user_id = named_id.or(context_user_id);

    // The ID itself must not be read back as a glucose value or a meal.
    let rest = USER_ID_RE.replace_all(message, " ");

    let intent = if PLAN_RE.is_match(&rest) {
        Intent::PlanMeals {
            latest_cgm: None,
            latest_mood: None,
            dietary_preference: None,
            medical_conditions: None,
        }
    } else if let Some(reading) = GLUCOSE_RE
        .captures(&rest)
        .and_then(|c| c[1].parse().ok())
    {
        Intent::LogCgm { reading }
    } else if let Some(label) = find_feeling(&rest) {
        Intent::LogMood { label }
    } else if let Some(description) = find_food(&rest) {
        Intent::LogFood {
            description,
            timestamp: None,
        }
    } else if let Some(label) = find_mood_word(&rest) {
        Intent::LogMood { label }
    } else if named_id.is_some() {
        Intent::ValidateUser
    } else {
        Intent::General { reply: None }
    };

    RoutedMessage { user_id, intent }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_from_id_statement() {
        for msg in ["I am id 35", "my id is 35", "User ID: 35", "hi, user 35 here"] {
            let routed = classify(msg, None);
            assert_eq!(routed.user_id, Some(35), "{msg}");
            assert_eq!(routed.intent, Intent::ValidateUser, "{msg}");
        }
    }

    #[test]
    fn test_named_id_overrides_context() {
        let routed = classify("my id is 12", Some(40));
        assert_eq!(routed.user_id, Some(12));
    }

    #[test]
    fn test_context_id_used_when_message_has_none() {
        let routed = classify("I am tired", Some(40));
        assert_eq!(routed.user_id, Some(40));
        assert_eq!(
            routed.intent,
            Intent::LogMood {
                label: "tired".to_string()
            }
        );
    }

    #[test]
    fn test_glucose_reading() {
        let routed = classify("My glucose is 140", Some(3));
        assert_eq!(routed.intent, Intent::LogCgm { reading: 140 });

        let routed = classify("blood sugar reading of 320 mg/dL", Some(3));
        assert_eq!(routed.intent, Intent::LogCgm { reading: 320 });

        let routed = classify("CGM: -5", Some(3));
        assert_eq!(routed.intent, Intent::LogCgm { reading: -5 });
    }

    #[test]
    fn test_id_not_mistaken_for_glucose() {
        let routed = classify("I am id 35 and my glucose is 180", None);
        assert_eq!(routed.user_id, Some(35));
        assert_eq!(routed.intent, Intent::LogCgm { reading: 180 });
    }

    #[test]
    fn test_food() {
        let routed = classify("I ate oatmeal with blueberries.", Some(1));
        assert_eq!(
            routed.intent,
            Intent::LogFood {
                description: "oatmeal with blueberries".to_string(),
                timestamp: None,
            }
        );

        let routed = classify("Pasta for lunch", Some(1));
        assert_eq!(
            routed.intent,
            Intent::LogFood {
                description: "Pasta for lunch".to_string(),
                timestamp: None,
            }
        );
    }

    #[test]
    fn test_meal_plan() {
        for msg in [
            "Can you make me a meal plan?",
            "plan my meals for today",
            "What should I eat today?",
        ] {
            let routed = classify(msg, Some(1));
            assert_eq!(
                routed.intent,
                Intent::PlanMeals {
                    latest_cgm: None,
                    latest_mood: None,
                    dietary_preference: None,
                    medical_conditions: None,
                },
                "{msg}"
            );
        }
    }

    #[test]
    fn test_mood_phrasings() {
        let routed = classify("Feeling really anxious today", Some(1));
        assert_eq!(
            routed.intent,
            Intent::LogMood {
                label: "anxious".to_string()
            }
        );
        let routed = classify("I'm so HAPPY", Some(1));
        assert_eq!(
            routed.intent,
            Intent::LogMood {
                label: "happy".to_string()
            }
        );
    }

    #[test]
    fn test_feeling_beats_loose_food_phrase() {
        for (msg, label) in [
            ("I had a rough day and I'm feeling stressed", "stressed"),
            ("I'm having a stressful week, feeling anxious", "anxious"),
        ] {
            let routed = classify(msg, Some(1));
            assert_eq!(
                routed.intent,
                Intent::LogMood {
                    label: label.to_string()
                },
                "{msg}"
            );
        }
    }

    #[test]
    fn test_time_span_is_not_a_meal() {
        let routed = classify("I had a long day at work", Some(1));
        assert_eq!(routed.intent, Intent::General { reply: None });

        let routed = classify("having a great weekend", Some(1));
        assert!(!matches!(routed.intent, Intent::LogFood { .. }));

        let routed = classify("I had the morning smoothie", Some(1));
        assert_eq!(
            routed.intent,
            Intent::LogFood {
                description: "the morning smoothie".to_string(),
                timestamp: None,
            }
        );
    }

    #[test]
    fn test_glucose_needs_linked_number() {
        let routed = classify("my blood sugar is fine, I ate 2 eggs", Some(1));
        assert_eq!(
            routed.intent,
            Intent::LogFood {
                description: "2 eggs".to_string(),
                timestamp: None,
            }
        );

        let routed = classify("glucose reading of 132", Some(1));
        assert_eq!(routed.intent, Intent::LogCgm { reading: 132 });

        let routed = classify("sugar levels at 95 this morning", Some(1));
        assert_eq!(routed.intent, Intent::LogCgm { reading: 95 });
    }

    #[test]
    fn test_general_question() {
        let routed = classify("What is the capital of France?", None);
        assert_eq!(routed.user_id, None);
        assert_eq!(routed.intent, Intent::General { reply: None });
    }

    #[test]
    fn test_word_containing_id_is_not_an_id() {
        let routed = classify("I want to avoid 3 snacks", None);
        assert_eq!(routed.user_id, None);
    }

    #[test]
    fn test_intent_serializes_with_tag() {
        let routed = classify("my glucose is 99", Some(2));
        let json = serde_json::to_value(&routed).unwrap();
        assert_eq!(json["intent"], "log_cgm");
        assert_eq!(json["reading"], 99);
        assert_eq!(json["user_id"], 2);
    }
}
