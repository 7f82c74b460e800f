use anyhow::Result;
use async_trait::async_trait;

use carechat_core::router::{self, RoutedMessage};

/// Turns a free-text chat message into a [`RoutedMessage`].
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(&self, message: &str, user_id: Option<i64>) -> Result<RoutedMessage>;
}

/// Keyword rules only; never fails and needs no network.
pub struct RuleClassifier;

#[async_trait]
impl IntentClassifier for RuleClassifier {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn classify(&self, message: &str, user_id: Option<i64>) -> Result<RoutedMessage> {
        Ok(router::classify(message, user_id))
    }
}
