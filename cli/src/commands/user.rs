use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use carechat_core::service::HealthService;

use super::helpers::{print_json, require_user};

#[derive(Tabled)]
struct Field {
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub(crate) fn cmd_user(service: &HealthService, user_id: i64, json: bool) -> Result<()> {
    let profile = require_user(service, user_id)?;

    if json {
        return print_json(&profile);
    }

    let rows = [
        Field {
            name: "User ID",
            value: profile.user_id.to_string(),
        },
        Field {
            name: "Name",
            value: profile.full_name(),
        },
        Field {
            name: "City",
            value: profile.city.clone(),
        },
        Field {
            name: "Diet",
            value: profile.dietary_preference.to_string(),
        },
        Field {
            name: "Conditions",
            value: profile.conditions_display(),
        },
        Field {
            name: "Limitations",
            value: profile.physical_limitations.label().to_string(),
        },
    ];

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
