use std::path::Path;

use anyhow::Result;
use chrono::{Local, SecondsFormat};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::Database;
use crate::glucose::{RangeCheck, check_range};
use crate::insights::{Insights, summarize};
use crate::models::{LogEntry, LogType, NewLogEntry, UserProfile};
use crate::planner::{PlanRequest, build_plan};
use crate::router::{Intent, RoutedMessage};
use crate::seed;

/// Text returned when the caller has not identified themselves yet.
pub const ASK_FOR_USER_ID: &str = "Please share your user ID (1-100) first so I can look up your profile.";

const HELP_TEXT: &str = "I can validate your user ID, log your mood, glucose readings and meals, \
and build a meal plan from your latest readings. Try \"my id is 12\", \"I'm feeling tired\", \
\"my glucose is 140\", \"I ate oatmeal for breakfast\" or \"make me a meal plan\".";

/// Chat reply produced by [`HealthService::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub intent: &'static str,
    pub user_id: Option<i64>,
}

pub struct HealthService {
    db: Database,
}

impl HealthService {
    /// Open the database at `db_path`, seeding synthetic users on first use.
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        seed::ensure_seeded(&db, &mut rand::rng())?;
        Ok(Self { db })
    }

    /// Empty in-memory store without seeded users.
    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Profile store / event log ---

    pub fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        self.db.get_user(user_id)
    }

    pub fn insert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.db.insert_user(profile)
    }

    pub fn append_log(&self, entry: &NewLogEntry) -> Result<LogEntry> {
        let logged = self.db.insert_log(entry)?;
        debug!(
            user_id = logged.user_id,
            log_type = %logged.log_type,
            log_id = logged.log_id,
            "appended log entry"
        );
        Ok(logged)
    }

    pub fn get_logs(
        &self,
        user_id: i64,
        log_type: Option<LogType>,
        limit: Option<i64>,
    ) -> Result<Vec<LogEntry>> {
        self.db.get_logs(user_id, log_type, limit)
    }

    /// Most recent `cgm` entry that holds a numeric reading.
    pub fn latest_glucose(&self, user_id: i64) -> Result<Option<i64>> {
        Ok(self
            .db
            .get_logs(user_id, Some(LogType::Cgm), None)?
            .iter()
            .find_map(LogEntry::glucose))
    }

    pub fn latest_mood(&self, user_id: i64) -> Result<Option<String>> {
        Ok(self
            .db
            .latest_log(user_id, LogType::Mood)?
            .map(|e| e.value))
    }

    pub fn insights(&self, user_id: i64) -> Result<Insights> {
        let entries = self.db.get_logs(user_id, None, None)?;
        Ok(summarize(user_id, &entries))
    }

    // --- Tools ---

    pub fn validate_user_id(&self, user_id: i64) -> Result<String> {
        Ok(match self.db.get_user(user_id)? {
            Some(p) => format!(
                "User {user_id} validated successfully. Name: {}, City: {}, Diet: {}, Conditions: {}",
                p.full_name(),
                p.city,
                p.dietary_preference,
                p.conditions_display()
            ),
            None => not_found(user_id),
        })
    }

    /// Check the reading and log it whatever the outcome.
    pub fn log_cgm_reading(&self, user_id: i64, reading: i64) -> Result<RangeCheck> {
        let check = check_range(reading);
        self.append_log(&NewLogEntry::now(user_id, LogType::Cgm, reading.to_string()))?;
        Ok(check)
    }

    /// Log a meal as `"{timestamp}: {description}"`; the timestamp defaults to now.
    pub fn record_food(
        &self,
        user_id: i64,
        description: &str,
        timestamp: Option<&str>,
    ) -> Result<String> {
        let timestamp = timestamp.map_or_else(
            || Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            str::to_string,
        );
        self.append_log(&NewLogEntry::now(
            user_id,
            LogType::Food,
            format!("{timestamp}: {description}"),
        ))?;
        Ok(format!(
            "Meal '{description}' logged successfully at {timestamp}. Ready for macro estimation."
        ))
    }

    pub fn log_user_mood(&self, user_id: i64, label: &str) -> Result<String> {
        self.append_log(&NewLogEntry::now(user_id, LogType::Mood, label))?;
        Ok(format!("Mood '{label}' logged for user {user_id}."))
    }

    /// Render a meal plan for `user_id`. Unknown users get an explanatory
    /// message and nothing is written.
    pub fn generate_meal_plan(
        &self,
        user_id: i64,
        dietary_preference: &str,
        medical_conditions: &str,
        latest_cgm: Option<i64>,
        latest_mood: Option<&str>,
    ) -> Result<String> {
        let Some(profile) = self.db.get_user(user_id)? else {
            return Ok(format!(
                "User {user_id} not found. Please validate your user ID first."
            ));
        };
        Ok(build_plan(
            &profile,
            &PlanRequest {
                dietary_preference,
                medical_conditions,
                latest_cgm,
                latest_mood,
            },
        ))
    }

    // --- Dispatch ---

    /// Run the tool an intent maps to.
    ///
    /// Every intent other than `General` needs a known user: without one the
    /// reply asks for an ID (or reports it unknown), the log is untouched and
    /// the reply carries no user ID.
    pub fn dispatch(&self, routed: &RoutedMessage) -> Result<Reply> {
        let intent = routed.intent.name();
        let (text, user_id) = match (&routed.intent, routed.user_id) {
            (Intent::General { reply }, user_id) => (general_reply(reply.as_deref()), user_id),
            (_, None) => (ASK_FOR_USER_ID.to_string(), None),
            (_, Some(user_id)) => match self.db.get_user(user_id)? {
                Some(profile) => (self.run_tool(&profile, &routed.intent)?, Some(user_id)),
                None => {
                    info!(user_id, intent, "rejected intent for unknown user");
                    (not_found(user_id), None)
                }
            },
        };
        Ok(Reply {
            text,
            intent,
            user_id,
        })
    }

    fn run_tool(&self, profile: &UserProfile, intent: &Intent) -> Result<String> {
        let user_id = profile.user_id;
        Ok(match intent {
            Intent::ValidateUser => self.validate_user_id(user_id)?,
            Intent::LogMood { label } => self.log_user_mood(user_id, label)?,
            Intent::LogCgm { reading } => self.log_cgm_reading(user_id, *reading)?.message,
            Intent::LogFood {
                description,
                timestamp,
            } => self.record_food(user_id, description, timestamp.as_deref())?,
            Intent::PlanMeals {
                latest_cgm,
                latest_mood,
                dietary_preference,
                medical_conditions,
            } => {
                let cgm = match latest_cgm {
                    Some(g) => Some(*g),
                    None => self.latest_glucose(user_id)?,
                };
                let mood = match latest_mood {
                    Some(m) => Some(m.clone()),
                    None => self.latest_mood(user_id)?,
                };
                let diet = dietary_preference
                    .as_deref()
                    .unwrap_or(profile.dietary_preference.as_str());
                let conditions = medical_conditions
                    .clone()
                    .unwrap_or_else(|| profile.conditions_display());
                self.generate_meal_plan(user_id, diet, &conditions, cgm, mood.as_deref())?
            }
            Intent::General { reply } => general_reply(reply.as_deref()),
        })
    }
}

fn general_reply(answer: Option<&str>) -> String {
    answer.map_or_else(|| HELP_TEXT.to_string(), str::to_string)
}

fn not_found(user_id: i64) -> String {
    format!("User ID {user_id} not found. Please check your user ID and try again.")
}
