//! Template-based daily meal plans.
//!
//! A plan is a pure function of the profile, the requested diet and the latest
//! glucose and mood readings: identical inputs render byte-identical text.

use std::fmt::Write;

use tracing::warn;

use crate::glucose::{Strategy, classify_state};
use crate::models::{DietaryPreference, UserProfile};
use crate::mood::mood_adjustment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meal {
    pub dish: &'static str,
    pub carbs_g: u16,
    pub protein_g: u16,
    pub fat_g: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealTemplate {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
}

const VEGETARIAN: MealTemplate = MealTemplate {
    breakfast: Meal {
        dish: "Oats with almond milk + berries + nuts",
        carbs_g: 35,
        protein_g: 12,
        fat_g: 8,
    },
    lunch: Meal {
        dish: "Brown rice + dal + mixed vegetables + yogurt",
        carbs_g: 45,
        protein_g: 18,
        fat_g: 6,
    },
    dinner: Meal {
        dish: "Ragi dosa + sambar + coconut chutney",
        carbs_g: 30,
        protein_g: 15,
        fat_g: 10,
    },
};

const VEGAN: MealTemplate = MealTemplate {
    breakfast: Meal {
        dish: "Quinoa porridge with coconut milk + fruits",
        carbs_g: 40,
        protein_g: 10,
        fat_g: 12,
    },
    lunch: Meal {
        dish: "Buddha bowl with chickpeas + quinoa + vegetables",
        carbs_g: 50,
        protein_g: 20,
        fat_g: 8,
    },
    dinner: Meal {
        dish: "Lentil curry + brown rice + steamed vegetables",
        carbs_g: 35,
        protein_g: 18,
        fat_g: 6,
    },
};

const NON_VEGETARIAN: MealTemplate = MealTemplate {
    breakfast: Meal {
        dish: "Scrambled eggs + whole grain toast + avocado",
        carbs_g: 25,
        protein_g: 20,
        fat_g: 15,
    },
    lunch: Meal {
        dish: "Grilled chicken + quinoa + roasted vegetables",
        carbs_g: 30,
        protein_g: 35,
        fat_g: 12,
    },
    dinner: Meal {
        dish: "Baked fish + sweet potato + green salad",
        carbs_g: 25,
        protein_g: 30,
        fat_g: 10,
    },
};

/// Diet used when the requested one is not recognized.
pub const FALLBACK_DIET: DietaryPreference = DietaryPreference::NonVegetarian;

#[must_use]
pub fn template_for(diet: DietaryPreference) -> &'static MealTemplate {
    match diet {
        DietaryPreference::Vegetarian => &VEGETARIAN,
        DietaryPreference::Vegan => &VEGAN,
        DietaryPreference::NonVegetarian => &NON_VEGETARIAN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietChoice {
    Matched(DietaryPreference),
    /// The requested diet is unknown; [`FALLBACK_DIET`] is used instead.
    Fallback,
}

impl DietChoice {
    #[must_use]
    pub fn select(requested: &str) -> Self {
        DietaryPreference::parse(requested).map_or(Self::Fallback, Self::Matched)
    }

    #[must_use]
    pub fn diet(self) -> DietaryPreference {
        match self {
            Self::Matched(d) => d,
            Self::Fallback => FALLBACK_DIET,
        }
    }
}

const HIGH_GLUCOSE_TIPS: &[&str] = &[
    "Focus on low-carb, high-fiber foods",
    "Include protein with every meal",
    "Stay hydrated with water",
];

const LOW_GLUCOSE_TIPS: &[&str] = &[
    "Include complex carbohydrates",
    "Eat regular meals and snacks",
    "Monitor glucose levels closely",
];

/// Tip block for a strategy. Driven by the tag so it always agrees with the
/// header: elevated and high readings (above 150) share the high block.
#[must_use]
pub fn glucose_tips(strategy: Strategy) -> Option<&'static [&'static str]> {
    match strategy {
        Strategy::HighGlucose | Strategy::ElevatedGlucose => Some(HIGH_GLUCOSE_TIPS),
        Strategy::LowGlucose => Some(LOW_GLUCOSE_TIPS),
        Strategy::NormalGlucose | Strategy::Balanced => None,
    }
}

const SNACKS: &[&str] = &[
    "Nuts and seeds (10-15 pieces)",
    "Greek yogurt with berries",
    "Vegetable sticks with hummus",
];

const TIMING: &[&str] = &[
    "Eat every 3-4 hours",
    "Don't skip meals",
    "Finish dinner 2-3 hours before bedtime",
];

#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub dietary_preference: &'a str,
    pub medical_conditions: &'a str,
    pub latest_cgm: Option<i64>,
    pub latest_mood: Option<&'a str>,
}

fn write_meal(out: &mut String, heading: &str, meal: &Meal) {
    let _ = writeln!(out, "{heading}:");
    let _ = writeln!(out, "• {}", meal.dish);
    let _ = writeln!(
        out,
        "• Carbs: {}g | Protein: {}g | Fat: {}g",
        meal.carbs_g, meal.protein_g, meal.fat_g
    );
    out.push('\n');
}

fn write_bullets(out: &mut String, heading: &str, items: &[&str]) {
    let _ = writeln!(out, "{heading}");
    for item in items {
        let _ = writeln!(out, "• {item}");
    }
}

#[must_use]
pub fn build_plan(profile: &UserProfile, req: &PlanRequest<'_>) -> String {
    let strategy = classify_state(req.latest_cgm);
    let advice = mood_adjustment(req.latest_mood);
    let choice = DietChoice::select(req.dietary_preference);
    let template = template_for(choice.diet());

    let glucose = req
        .latest_cgm
        .map_or_else(|| "Not available".to_string(), |g| g.to_string());
    let mood = req.latest_mood.unwrap_or("Not available");

    let mut out = String::new();
    let _ = writeln!(out, "🍽️ PERSONALIZED MEAL PLAN for {}", profile.first_name);
    out.push('\n');
    let _ = writeln!(out, "📊 Health Status: {}", strategy.label());
    let _ = writeln!(out, "🥗 Diet: {}", req.dietary_preference);
    let _ = writeln!(out, "🩺 Conditions: {}", req.medical_conditions);
    let _ = writeln!(out, "📈 Latest Glucose: {glucose} mg/dL");
    let _ = writeln!(out, "😊 Current Mood: {mood}");
    out.push('\n');

    if choice == DietChoice::Fallback {
        warn!(
            user_id = profile.user_id,
            diet = req.dietary_preference,
            "unrecognized diet, using {FALLBACK_DIET} template"
        );
        let _ = writeln!(
            out,
            "ℹ️ Diet '{}' is not recognized; showing the {FALLBACK_DIET} plan.",
            req.dietary_preference
        );
        out.push('\n');
    }

    write_meal(&mut out, "🌅 BREAKFAST (7-8 AM)", &template.breakfast);
    write_meal(&mut out, "🌞 LUNCH (12-1 PM)", &template.lunch);
    write_meal(&mut out, "🌙 DINNER (7-8 PM)", &template.dinner);

    if !advice.is_empty() {
        let _ = writeln!(out, "💡 Mood-Based Adjustments: {advice}");
        out.push('\n');
    }

    if let Some(tips) = glucose_tips(strategy) {
        write_bullets(&mut out, "🩸 GLUCOSE MANAGEMENT TIPS:", tips);
        out.push('\n');
    }

    write_bullets(&mut out, "🥜 SNACK SUGGESTIONS:", SNACKS);
    out.push('\n');
    write_bullets(&mut out, "⏰ TIMING RECOMMENDATIONS:", TIMING);

    // No trailing newline after the last bullet.
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhysicalLimitation;
    use crate::mood::MoodAdvice;

    fn profile(diet: DietaryPreference) -> UserProfile {
        UserProfile {
            user_id: 1,
            first_name: "Maya".to_string(),
            last_name: "Chen".to_string(),
            city: "Phoenix".to_string(),
            dietary_preference: diet,
            medical_conditions: vec!["Type 2 Diabetes".to_string()],
            physical_limitations: PhysicalLimitation::None,
        }
    }

    fn request<'a>(diet: &'a str, cgm: Option<i64>, mood: Option<&'a str>) -> PlanRequest<'a> {
        PlanRequest {
            dietary_preference: diet,
            medical_conditions: "None",
            latest_cgm: cgm,
            latest_mood: mood,
        }
    }

    #[test]
    fn test_vegan_high_glucose_stressed() {
        let plan = build_plan(
            &profile(DietaryPreference::Vegan),
            &request("vegan", Some(210), Some("stressed")),
        );

        assert!(plan.starts_with("🍽️ PERSONALIZED MEAL PLAN for Maya"));
        assert!(plan.contains("HIGH_GLUCOSE"));
        assert!(plan.contains("• Quinoa porridge with coconut milk + fruits"));
        assert!(plan.contains("• Buddha bowl with chickpeas + quinoa + vegetables"));
        assert!(plan.contains("• Lentil curry + brown rice + steamed vegetables"));
        assert!(plan.contains(MoodAdvice::Calming.text()));
        assert!(plan.contains("• Focus on low-carb, high-fiber foods"));
        assert!(plan.contains("📈 Latest Glucose: 210 mg/dL"));

        let dinner = plan.find("🌙 DINNER").unwrap();
        let mood = plan.find("💡 Mood-Based Adjustments").unwrap();
        let tips = plan.find("🩸 GLUCOSE MANAGEMENT TIPS").unwrap();
        let snacks = plan.find("🥜 SNACK SUGGESTIONS").unwrap();
        let timing = plan.find("⏰ TIMING RECOMMENDATIONS").unwrap();
        assert!(dinner < mood && mood < tips && tips < snacks && snacks < timing);
        assert!(plan.ends_with("• Finish dinner 2-3 hours before bedtime"));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let p = profile(DietaryPreference::Vegetarian);
        let req = request("vegetarian", Some(95), Some("tired"));
        assert_eq!(build_plan(&p, &req), build_plan(&p, &req));
    }

    #[test]
    fn test_balanced_without_readings() {
        let plan = build_plan(
            &profile(DietaryPreference::Vegetarian),
            &request("Vegetarian", None, None),
        );
        assert!(plan.contains("📊 Health Status: BALANCED - Provide general healthy meal plan"));
        assert!(plan.contains("📈 Latest Glucose: Not available mg/dL"));
        assert!(plan.contains("😊 Current Mood: Not available"));
        assert!(plan.contains("• Ragi dosa + sambar + coconut chutney"));
        assert!(!plan.contains("Mood-Based Adjustments"));
        assert!(!plan.contains("GLUCOSE MANAGEMENT TIPS"));
    }

    #[test]
    fn test_low_glucose_tips() {
        let plan = build_plan(
            &profile(DietaryPreference::NonVegetarian),
            &request("non-vegetarian", Some(65), None),
        );
        assert!(plan.contains("LOW_GLUCOSE"));
        assert!(plan.contains("• Include complex carbohydrates"));
        assert!(!plan.contains("• Focus on low-carb, high-fiber foods"));
    }

    #[test]
    fn test_elevated_glucose_gets_high_tips() {
        let plan = build_plan(
            &profile(DietaryPreference::Vegan),
            &request("vegan", Some(160), None),
        );
        assert!(plan.contains("ELEVATED_GLUCOSE"));
        assert!(plan.contains("• Stay hydrated with water"));
    }

    #[test]
    fn test_normal_glucose_has_no_tips() {
        for g in [80, 120, 150] {
            let plan = build_plan(
                &profile(DietaryPreference::Vegan),
                &request("vegan", Some(g), None),
            );
            assert!(plan.contains("NORMAL_GLUCOSE"));
            assert!(!plan.contains("GLUCOSE MANAGEMENT TIPS"), "reading {g}");
        }
    }

    #[test]
    fn test_unknown_diet_falls_back_explicitly() {
        let plan = build_plan(
            &profile(DietaryPreference::Vegan),
            &request("pescatarian", None, None),
        );
        assert!(plan.contains("Diet 'pescatarian' is not recognized"));
        assert!(plan.contains("• Scrambled eggs + whole grain toast + avocado"));
        assert_eq!(DietChoice::select("pescatarian"), DietChoice::Fallback);
        assert_eq!(DietChoice::select("pescatarian").diet(), FALLBACK_DIET);
    }

    #[test]
    fn test_tips_follow_strategy() {
        assert_eq!(glucose_tips(Strategy::HighGlucose), Some(HIGH_GLUCOSE_TIPS));
        assert_eq!(glucose_tips(Strategy::ElevatedGlucose), Some(HIGH_GLUCOSE_TIPS));
        assert_eq!(glucose_tips(Strategy::LowGlucose), Some(LOW_GLUCOSE_TIPS));
        assert_eq!(glucose_tips(Strategy::NormalGlucose), None);
        assert_eq!(glucose_tips(Strategy::Balanced), None);
    }
}
