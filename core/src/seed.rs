//! Synthetic user profiles for a fresh database.

use anyhow::Result;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

use crate::db::Database;
use crate::models::{DietaryPreference, MAX_USER_ID, MIN_USER_ID, PhysicalLimitation, UserProfile};

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Carlos", "Karen", "Daniel", "Lisa", "Matthew", "Nancy", "Anthony", "Priya", "Wei", "Aisha",
    "Kenji", "Sofia",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Patel", "Chen",
    "Nguyen", "Kim", "Okafor",
];

const CITIES: &[&str] = &["New York", "Los Angeles", "Chicago", "Houston", "Phoenix"];

const DIABETES: &str = "Type 2 Diabetes";
const NO_CONDITION: &str = "None";
const CONDITIONS: &[&str] = &[DIABETES, "Hypertension", "Arthritis", "Asthma", NO_CONDITION];

/// Chance of adding diabetes to a profile that did not draw it.
const EXTRA_DIABETES_CHANCE: f64 = 0.2;

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &[&str]) -> String {
    items.choose(rng).copied().unwrap_or_default().to_string()
}

fn conditions<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    let count = rng.random_range(1..=3);
    let mut drawn: Vec<&str> = CONDITIONS.choose_multiple(rng, count).copied().collect();
    if !drawn.contains(&DIABETES) && rng.random_bool(EXTRA_DIABETES_CHANCE) {
        drawn.push(DIABETES);
    }
    if drawn.len() > 1 {
        drawn.retain(|c| *c != NO_CONDITION);
    }
    if drawn.contains(&NO_CONDITION) {
        return Vec::new();
    }
    drawn.into_iter().map(str::to_string).collect()
}

/// Generate `count` profiles with IDs starting at [`MIN_USER_ID`].
pub fn generate_users<R: Rng + ?Sized>(rng: &mut R, count: i64) -> Vec<UserProfile> {
    (MIN_USER_ID..MIN_USER_ID + count)
        .map(|user_id| UserProfile {
            user_id,
            first_name: pick(rng, FIRST_NAMES),
            last_name: pick(rng, LAST_NAMES),
            city: pick(rng, CITIES),
            dietary_preference: *DietaryPreference::ALL
                .choose(rng)
                .unwrap_or(&DietaryPreference::NonVegetarian),
            medical_conditions: conditions(rng),
            physical_limitations: *PhysicalLimitation::ALL
                .choose(rng)
                .unwrap_or(&PhysicalLimitation::None),
        })
        .collect()
}

/// Populate the `users` table when it is empty. Returns the number of users
/// inserted, zero when the table already had rows.
pub fn ensure_seeded<R: Rng + ?Sized>(db: &Database, rng: &mut R) -> Result<usize> {
    let existing = db.count_users()?;
    if existing > 0 {
        info!("Database already has {existing} users, skipping seed");
        return Ok(0);
    }
    let users = generate_users(rng, MAX_USER_ID - MIN_USER_ID + 1);
    let inserted = db.insert_users(&users)?;
    info!("Seeded database with {inserted} synthetic users");
    Ok(inserted)
}
