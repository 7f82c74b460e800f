mod classifier;
mod commands;
mod config;
mod llm;
mod server;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::classifier::{IntentClassifier, RuleClassifier};
use crate::commands::{
    PlanArgs, cmd_cgm, cmd_chat, cmd_food, cmd_insights, cmd_logs, cmd_mood, cmd_plan, cmd_user,
};
use crate::config::{Config, LlmConfig, resolve_port};
use crate::llm::LlmClassifier;
use carechat_core::service::HealthService;

#[derive(Parser)]
#[command(
    name = "carechat",
    version,
    about = "Health logging and meal planning chat service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (default: $PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Route chat messages with keyword rules instead of the language model
        #[arg(long)]
        offline: bool,
    },
    /// Show a user profile
    User {
        /// User ID (1-100)
        user_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a glucose (CGM) reading in mg/dL
    Cgm {
        /// User ID (1-100)
        user_id: i64,
        /// Reading in mg/dL
        #[arg(allow_negative_numbers = true)]
        reading: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a mood
    Mood {
        /// User ID (1-100)
        user_id: i64,
        /// Mood label (e.g. "happy", "tired")
        label: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a meal
    Food {
        /// User ID (1-100)
        user_id: i64,
        /// What was eaten
        description: String,
        /// When it was eaten (ISO-8601, default: now)
        #[arg(long)]
        at: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a user's log entries, most recent first
    Logs {
        /// User ID (1-100)
        user_id: i64,
        /// Only entries of this type: mood, cgm, food
        #[arg(short = 't', long = "type")]
        log_type: Option<String>,
        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a meal plan (readings default to the latest logged, diet and
    /// conditions to the profile)
    Plan {
        /// User ID (1-100)
        user_id: i64,
        /// Glucose reading to plan for
        #[arg(long, allow_negative_numbers = true)]
        cgm: Option<i64>,
        /// Mood to plan for
        #[arg(long)]
        mood: Option<String>,
        /// Diet to plan for: vegetarian, vegan, non-vegetarian
        #[arg(long)]
        diet: Option<String>,
        /// Medical conditions to show on the plan
        #[arg(long)]
        conditions: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize recent mood and glucose logs
    Insights {
        /// User ID (1-100)
        user_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one chat message through the router
    Chat {
        /// The message
        message: String,
        /// User ID to use when the message does not name one
        #[arg(short, long)]
        user: Option<i64>,
        /// Use keyword rules instead of the language model
        #[arg(long)]
        offline: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "carechat=info,carechat_core=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_classifier(offline: bool) -> Result<Arc<dyn IntentClassifier>> {
    if offline {
        info!("using rule-based intent classifier");
        return Ok(Arc::new(RuleClassifier));
    }
    Ok(Arc::new(LlmClassifier::new(LlmConfig::from_env()?)?))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let service = HealthService::new(&config.db_path)?;

    match cli.command {
        Commands::Serve {
            port,
            bind,
            offline,
        } => {
            let classifier = build_classifier(offline)?;
            let port = resolve_port(port)?;
            server::start_server(service, classifier, port, &bind).await
        }
        Commands::User { user_id, json } => cmd_user(&service, user_id, json),
        Commands::Cgm {
            user_id,
            reading,
            json,
        } => cmd_cgm(&service, user_id, reading, json),
        Commands::Mood {
            user_id,
            label,
            json,
        } => cmd_mood(&service, user_id, &label, json),
        Commands::Food {
            user_id,
            description,
            at,
            json,
        } => cmd_food(&service, user_id, &description, at.as_deref(), json),
        Commands::Logs {
            user_id,
            log_type,
            limit,
            json,
        } => cmd_logs(&service, user_id, log_type.as_deref(), limit, json),
        Commands::Plan {
            user_id,
            cgm,
            mood,
            diet,
            conditions,
            json,
        } => cmd_plan(
            &service,
            user_id,
            PlanArgs {
                cgm,
                mood,
                diet,
                conditions,
            },
            json,
        ),
        Commands::Insights { user_id, json } => cmd_insights(&service, user_id, json),
        Commands::Chat {
            message,
            user,
            offline,
            json,
        } => {
            let classifier = build_classifier(offline)?;
            cmd_chat(&service, classifier.as_ref(), &message, user, json).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_reading() {
        let cli = Cli::try_parse_from(["carechat", "cgm", "3", "-20"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cgm {
                user_id: 3,
                reading: -20,
                json: false
            }
        ));
    }

    #[test]
    fn parses_logs_filters() {
        let cli =
            Cli::try_parse_from(["carechat", "logs", "7", "--type", "cgm", "--limit", "5"]).unwrap();
        let Commands::Logs {
            user_id,
            log_type,
            limit,
            ..
        } = cli.command
        else {
            panic!("expected logs command");
        };
        assert_eq!(user_id, 7);
        assert_eq!(log_type.as_deref(), Some("cgm"));
        assert_eq!(limit, Some(5));
    }

    #[test]
    fn parses_plan_overrides() {
        let cli = Cli::try_parse_from([
            "carechat", "plan", "2", "--cgm", "-5", "--diet", "pescatarian",
        ])
        .unwrap();
        let Commands::Plan {
            cgm,
            diet,
            conditions,
            ..
        } = cli.command
        else {
            panic!("expected plan command");
        };
        assert_eq!(cgm, Some(-5));
        assert_eq!(diet.as_deref(), Some("pescatarian"));
        assert_eq!(conditions, None);
    }

    #[test]
    fn offline_classifier_needs_no_key() {
        let classifier = build_classifier(true).unwrap();
        assert_eq!(classifier.name(), "rules");
    }
}
