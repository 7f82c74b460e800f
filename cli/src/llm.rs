//! Intent classification through an OpenAI-compatible chat completion API
//! (Groq by default).

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use carechat_core::models::parse_glucose;
use carechat_core::router::{Intent, RoutedMessage};

use crate::classifier::IntentClassifier;
use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str = r#"You route messages for a healthcare assistant that helps users log their mood, glucose (CGM) readings and meals, and plan meals.
Reply with a single JSON object and nothing else, using these keys:
  "intent": one of "validate_user", "log_mood", "log_cgm", "log_food", "plan_meals", "general"
  "user_id": the numeric user ID named in the message, or null
  "glucose": the glucose reading in mg/dL for log_cgm, or null
  "mood": a one or two word mood label for log_mood, or null
  "meal": the description of what was eaten for log_food, or null
  "timestamp": an ISO-8601 time the meal was eaten if the user gave one, or null
  "diet": for plan_meals, a diet the user asked for in this message (e.g. "vegan"), or null
  "conditions": for plan_meals, medical conditions the user named in this message, or null
  "answer": for "general", a short helpful answer to the user's question, otherwise null
Use "validate_user" when the user only introduces themselves with an ID.
Use "plan_meals" when the user asks for a meal plan or what to eat.
Never give medical diagnoses."#;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// The JSON object the model is asked to produce.
#[derive(Debug, Deserialize)]
struct RawIntent {
    intent: String,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    glucose: Option<Value>,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    meal: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    diet: Option<String>,
    #[serde(default)]
    conditions: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

fn number(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|f| parse_glucose(&f.to_string()))),
        Value::String(s) => parse_glucose(s),
        _ => None,
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Strip a Markdown code fence some models wrap around JSON.
fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Convert the model's reply into a routed message. An ID the model found in
/// the message overrides `context_user_id`.
pub(crate) fn parse_reply(content: &str, context_user_id: Option<i64>) -> Result<RoutedMessage> {
    let raw: RawIntent = serde_json::from_str(strip_fence(content))
        .with_context(|| format!("model returned malformed JSON: {content}"))?;

    let named_id = number(raw.user_id.as_ref());
    let intent = match raw.intent.trim().to_lowercase().as_str() {
        "validate_user" => {
            if named_id.is_none() && context_user_id.is_none() {
                bail!("model chose validate_user without a user_id");
            }
            Intent::ValidateUser
        }
        "log_mood" => Intent::LogMood {
            label: non_empty(raw.mood).context("model chose log_mood without a mood")?,
        },
        "log_cgm" => Intent::LogCgm {
            reading: number(raw.glucose.as_ref())
                .context("model chose log_cgm without a numeric glucose value")?,
        },
        "log_food" => Intent::LogFood {
            description: non_empty(raw.meal).context("model chose log_food without a meal")?,
            timestamp: non_empty(raw.timestamp),
        },
        "plan_meals" => Intent::PlanMeals {
            latest_cgm: number(raw.glucose.as_ref()),
            latest_mood: non_empty(raw.mood),
            dietary_preference: non_empty(raw.diet),
            medical_conditions: non_empty(raw.conditions),
        },
        "general" => Intent::General {
            reply: non_empty(raw.answer),
        },
        other => bail!("model returned unknown intent '{other}'"),
    };

    Ok(RoutedMessage {
        user_id: named_id.or(context_user_id),
        intent,
    })
}

pub struct LlmClassifier {
    client: Client,
    config: LlmConfig,
}

impl LlmClassifier {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        tracing::info!(
            model = %config.model,
            base_url = %config.base_url,
            "language-model classifier ready"
        );
        Ok(Self { client, config })
    }

    async fn complete(&self, message: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("language-model request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "language-model API error");
            bail!("language-model API error {status}: {body}");
        }

        let resp: ChatResponse = response
            .json()
            .await
            .context("failed to decode language-model response")?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("language-model response had no content")
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn classify(&self, message: &str, user_id: Option<i64>) -> Result<RoutedMessage> {
        let content = self.complete(message).await?;
        debug!(%content, "model routing reply");
        parse_reply(&content, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cgm() {
        let routed = parse_reply(
            r#"{"intent":"log_cgm","user_id":null,"glucose":182,"mood":null}"#,
            Some(9),
        )
        .unwrap();
        assert_eq!(routed.user_id, Some(9));
        assert_eq!(routed.intent, Intent::LogCgm { reading: 182 });
    }

    #[test]
    fn test_parse_glucose_as_string() {
        let routed = parse_reply(r#"{"intent":"log_cgm","glucose":"140.4"}"#, Some(1)).unwrap();
        assert_eq!(routed.intent, Intent::LogCgm { reading: 140 });
    }

    #[test]
    fn test_named_id_overrides_context() {
        let routed =
            parse_reply(r#"{"intent":"validate_user","user_id":"35"}"#, Some(2)).unwrap();
        assert_eq!(routed.user_id, Some(35));
        assert_eq!(routed.intent, Intent::ValidateUser);
    }

    #[test]
    fn test_parse_food_with_fence() {
        let content = "```json\n{\"intent\":\"log_food\",\"meal\":\" oatmeal \",\"timestamp\":\"2024-06-15T08:00:00\"}\n```";
        let routed = parse_reply(content, Some(3)).unwrap();
        assert_eq!(
            routed.intent,
            Intent::LogFood {
                description: "oatmeal".to_string(),
                timestamp: Some("2024-06-15T08:00:00".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_general_answer() {
        let routed = parse_reply(
            r#"{"intent":"general","answer":"Paris is the capital of France."}"#,
            None,
        )
        .unwrap();
        assert_eq!(
            routed.intent,
            Intent::General {
                reply: Some("Paris is the capital of France.".to_string())
            }
        );
    }

    #[test]
    fn test_parse_plan_carries_readings() {
        let routed = parse_reply(
            r#"{"intent":"plan_meals","glucose":210,"mood":"stressed"}"#,
            Some(1),
        )
        .unwrap();
        assert_eq!(
            routed.intent,
            Intent::PlanMeals {
                latest_cgm: Some(210),
                latest_mood: Some("stressed".to_string()),
                dietary_preference: None,
                medical_conditions: None,
            }
        );
    }

    #[test]
    fn test_parse_plan_carries_diet_and_conditions() {
        let routed = parse_reply(
            r#"{"intent":"plan_meals","diet":"pescatarian","conditions":"Hypertension","mood":""}"#,
            Some(4),
        )
        .unwrap();
        assert_eq!(routed.user_id, Some(4));
        assert_eq!(
            routed.intent,
            Intent::PlanMeals {
                latest_cgm: None,
                latest_mood: None,
                dietary_preference: Some("pescatarian".to_string()),
                medical_conditions: Some("Hypertension".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_failures() {
        assert!(parse_reply("not json", None).is_err());
        assert!(parse_reply(r#"{"intent":"dance"}"#, None).is_err());
        assert!(parse_reply(r#"{"intent":"log_cgm","glucose":"high"}"#, Some(1)).is_err());
        assert!(parse_reply(r#"{"intent":"log_mood","mood":"  "}"#, Some(1)).is_err());
        assert!(parse_reply(r#"{"intent":"validate_user"}"#, None).is_err());
    }

    #[tokio::test]
    #[ignore = "requires GROQ_API_KEY and network access"]
    async fn live_classification() {
        let classifier = LlmClassifier::new(LlmConfig::from_env().unwrap()).unwrap();
        let routed = classifier
            .classify("my blood sugar is 150", Some(1))
            .await
            .unwrap();
        assert_eq!(routed.intent, Intent::LogCgm { reading: 150 });
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let mut config = LlmConfig::new("k");
        config.base_url = "http://127.0.0.1:9".to_string();
        config.timeout = std::time::Duration::from_secs(2);
        let classifier = LlmClassifier::new(config).unwrap();
        assert!(classifier.classify("hello", None).await.is_err());
    }
}
