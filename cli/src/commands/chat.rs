use anyhow::Result;

use carechat_core::service::HealthService;

use super::helpers::print_json;
use crate::classifier::IntentClassifier;

pub(crate) async fn cmd_chat(
    service: &HealthService,
    classifier: &dyn IntentClassifier,
    message: &str,
    user_id: Option<i64>,
    json: bool,
) -> Result<()> {
    let routed = classifier.classify(message, user_id).await?;
    let reply = service.dispatch(&routed)?;

    if json {
        print_json(&reply)
    } else {
        println!("{}", reply.text);
        Ok(())
    }
}
