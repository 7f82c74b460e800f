use anyhow::Result;
use serde_json::json;
use tabled::{Table, Tabled, settings::Style};

use carechat_core::insights::Trend;
use carechat_core::router::{Intent, RoutedMessage};
use carechat_core::service::HealthService;

use super::helpers::{print_json, require_user};

/// Overrides for `carechat plan`; unset fields come from the latest logs
/// and the profile.
pub(crate) struct PlanArgs {
    pub cgm: Option<i64>,
    pub mood: Option<String>,
    pub diet: Option<String>,
    pub conditions: Option<String>,
}

pub(crate) fn cmd_plan(
    service: &HealthService,
    user_id: i64,
    args: PlanArgs,
    json: bool,
) -> Result<()> {
    require_user(service, user_id)?;
    let reply = service.dispatch(&RoutedMessage {
        user_id: Some(user_id),
        intent: Intent::PlanMeals {
            latest_cgm: args.cgm,
            latest_mood: args.mood,
            dietary_preference: args.diet,
            medical_conditions: args.conditions,
        },
    })?;

    if json {
        print_json(&json!({ "user_id": user_id, "plan": reply.text }))
    } else {
        println!("{}", reply.text);
        Ok(())
    }
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn or_dash<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub(crate) fn cmd_insights(service: &HealthService, user_id: i64, json: bool) -> Result<()> {
    require_user(service, user_id)?;
    let insights = service.insights(user_id)?;

    if json {
        return print_json(&insights);
    }

    let g = &insights.glucose;
    let m = &insights.mood;
    let rows = [
        Row {
            metric: "Latest glucose (mg/dL)",
            value: or_dash(g.latest),
        },
        Row {
            metric: "Average glucose",
            value: or_dash(g.average.map(|a| format!("{a:.1}"))),
        },
        Row {
            metric: "Range",
            value: match (g.min, g.max) {
                (Some(lo), Some(hi)) => format!("{lo}-{hi}"),
                _ => "-".to_string(),
            },
        },
        Row {
            metric: "Out-of-range readings",
            value: format!("{} of {}", g.alerts, g.samples),
        },
        Row {
            metric: "Trend",
            value: or_dash(g.trend.map(Trend::as_str)),
        },
        Row {
            metric: "Latest mood",
            value: or_dash(m.latest.clone()),
        },
        Row {
            metric: "Mood score (avg)",
            value: or_dash(m.rolling_average.map(|a| format!("{a:.1}/10"))),
        },
    ];

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
