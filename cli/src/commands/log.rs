use anyhow::{Result, bail};
use serde_json::json;

use carechat_core::models::{LogType, validate_log_type};
use carechat_core::service::HealthService;

use super::helpers::{print_json, print_log_table, require_user};

pub(crate) fn cmd_cgm(service: &HealthService, user_id: i64, reading: i64, json: bool) -> Result<()> {
    require_user(service, user_id)?;
    let check = service.log_cgm_reading(user_id, reading)?;

    if json {
        print_json(&check)
    } else {
        println!("{}", check.message);
        Ok(())
    }
}

pub(crate) fn cmd_mood(service: &HealthService, user_id: i64, label: &str, json: bool) -> Result<()> {
    let label = label.trim();
    if label.is_empty() {
        bail!("Mood must not be empty");
    }
    require_user(service, user_id)?;
    let message = service.log_user_mood(user_id, label)?;

    if json {
        print_json(&json!({ "user_id": user_id, "mood": label, "message": message }))
    } else {
        println!("{message}");
        Ok(())
    }
}

pub(crate) fn cmd_food(
    service: &HealthService,
    user_id: i64,
    description: &str,
    at: Option<&str>,
    json: bool,
) -> Result<()> {
    let description = description.trim();
    if description.is_empty() {
        bail!("Meal description must not be empty");
    }
    require_user(service, user_id)?;
    let message = service.record_food(user_id, description, at)?;

    if json {
        print_json(&json!({ "user_id": user_id, "meal": description, "message": message }))
    } else {
        println!("{message}");
        Ok(())
    }
}

pub(crate) fn cmd_logs(
    service: &HealthService,
    user_id: i64,
    log_type: Option<&str>,
    limit: Option<u32>,
    json: bool,
) -> Result<()> {
    let log_type: Option<LogType> = log_type.map(validate_log_type).transpose()?;
    let entries = service.get_logs(user_id, log_type, limit.map(i64::from))?;

    if json {
        print_json(&entries)
    } else if entries.is_empty() {
        eprintln!("No log entries for user {user_id}.");
        Ok(())
    } else {
        print_log_table(&entries);
        Ok(())
    }
}
