use anyhow::{Result, bail};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use carechat_core::glucose::check_range;
use carechat_core::models::{LogEntry, UserProfile};
use carechat_core::service::HealthService;

/// Fetch a profile, failing with a readable error for unknown IDs.
pub(crate) fn require_user(service: &HealthService, user_id: i64) -> Result<UserProfile> {
    match service.get_profile(user_id)? {
        Some(p) => Ok(p),
        None => bail!("User {user_id} not found"),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_log_table(entries: &[LogEntry]) {
    #[derive(Tabled)]
    struct LogRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Time (UTC)")]
        timestamp: String,
        #[tabled(rename = "Type")]
        log_type: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<LogRow> = entries
        .iter()
        .map(|e| LogRow {
            id: e.log_id,
            timestamp: short_timestamp(&e.timestamp),
            log_type: e.log_type.to_string(),
            value: truncate(&e.value, 50),
            status: e
                .glucose()
                .map(|g| check_range(g).status.as_str().to_string())
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// `2024-06-15T09:05:00.123456Z` -> `2024-06-15 09:05:00`.
pub(crate) fn short_timestamp(ts: &str) -> String {
    ts.get(..19).map_or_else(|| ts.to_string(), |s| s.replacen('T', " ", 1))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
