use tracing::warn;

use crate::auth::repo::User;
use crate::nutrition::{meal_target, ActivityLevel, BodyProfile, NutritionTarget, Sex};
use crate::profile::dto::UpdateProfileRequest;

const NO_DIET: &str = "None";

/// Stored metrics as calculator input. Unknown category strings fall back
/// to the neutral sex and the sedentary tier.
pub fn body_profile(user: &User) -> BodyProfile {
    BodyProfile {
        weight_kg: user.weight_kg,
        height_cm: user.height_cm,
        age_years: f64::from(user.age),
        sex: user.gender.parse().unwrap_or(Sex::Other),
        activity: user
            .activity_level
            .parse()
            .unwrap_or(ActivityLevel::Sedentary),
    }
}

/// Meal target for the user, or the default profile's target when the stored
/// metrics are unusable.
pub fn target_or_default(user: &User) -> NutritionTarget {
    match meal_target(&body_profile(user)) {
        Ok(target) => target,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "using default body profile");
            meal_target(&BodyProfile::DEFAULT).unwrap_or(NutritionTarget {
                calories_kcal: 0,
                protein_g: 0,
            })
        }
    }
}

pub fn normalize_allergies(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for a in raw {
        let a = a.trim().to_lowercase();
        if !a.is_empty() && !out.contains(&a) {
            out.push(a);
        }
    }
    out
}

pub fn normalize_diet(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DIET)
        .to_string()
}

/// `None` when the user has no dietary restriction.
pub fn diet_filter(user: &User) -> Option<String> {
    let diet = user.dietary_preference.trim();
    if diet.is_empty() || diet.eq_ignore_ascii_case(NO_DIET) {
        None
    } else {
        Some(diet.to_lowercase())
    }
}

/// Full replacement row for the profile columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub age: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: &'static str,
    pub workout_days: i32,
    pub activity_level: &'static str,
    pub allergies: Vec<String>,
    pub dietary_preference: String,
}

/// Merge a partial update onto the stored profile, re-deriving the activity
/// level from the workout days.
pub fn merge_update(user: &User, req: &UpdateProfileRequest) -> Result<ProfileUpdate, &'static str> {
    let age = req.age.unwrap_or(user.age);
    let height_cm = req.height.unwrap_or(user.height_cm);
    let weight_kg = req.weight.unwrap_or(user.weight_kg);
    if age <= 0 || !(height_cm.is_finite() && height_cm > 0.0) || !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err("Age, height and weight must be positive");
    }

    let gender = req
        .gender
        .unwrap_or_else(|| user.gender.parse().unwrap_or(Sex::Other));
    let workout_days = req
        .workout_days
        .unwrap_or(user.workout_days.max(0) as u32)
        .min(7);

    Ok(ProfileUpdate {
        age,
        height_cm,
        weight_kg,
        gender: gender.as_str(),
        workout_days: workout_days as i32,
        activity_level: ActivityLevel::from_workout_days(workout_days).as_str(),
        allergies: match &req.allergies {
            Some(list) => normalize_allergies(list),
            None => user.allergies.clone(),
        },
        dietary_preference: match &req.dietary_preference {
            Some(d) => normalize_diet(Some(d)),
            None => user.dietary_preference.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::services::test_support::user;

    #[test]
    fn body_profile_reads_stored_categories() {
        let mut u = user(None);
        u.gender = "female".into();
        u.activity_level = "moderate".into();
        let p = body_profile(&u);
        assert_eq!(p.sex, Sex::Female);
        assert_eq!(p.activity, ActivityLevel::Moderate);
        assert_eq!(p.age_years, 25.0);

        u.gender = "unknown".into();
        u.activity_level = "".into();
        let p = body_profile(&u);
        assert_eq!(p.sex, Sex::Other);
        assert_eq!(p.activity, ActivityLevel::Sedentary);
    }

    #[test]
    fn broken_profile_falls_back_to_default_target() {
        let mut u = user(None);
        u.weight_kg = 0.0;
        let expected = meal_target(&BodyProfile::DEFAULT).unwrap();
        assert_eq!(target_or_default(&u), expected);
    }

    #[test]
    fn stored_profile_drives_the_target() {
        // 70 kg, 175 cm, 25 y, male, sedentary
        let t = target_or_default(&user(None));
        assert_eq!(t.calories_kcal, 703);
        assert_eq!(t.protein_g, 19);
    }

    #[test]
    fn allergies_are_trimmed_lowercased_and_deduplicated() {
        let raw = vec![" Peanut ".to_string(), "peanut".into(), "".into(), "Gluten".into()];
        assert_eq!(normalize_allergies(&raw), vec!["peanut", "gluten"]);
    }

    #[test]
    fn diet_filter_skips_the_none_marker() {
        let mut u = user(None);
        assert_eq!(diet_filter(&u), None);
        u.dietary_preference = "Vegetarian".into();
        assert_eq!(diet_filter(&u).as_deref(), Some("vegetarian"));
        assert_eq!(normalize_diet(Some("  ")), "None");
    }

    #[test]
    fn workout_days_re_derive_activity() {
        let u = user(None);
        let req = UpdateProfileRequest {
            workout_days: Some(4),
            weight: Some(82.5),
            ..Default::default()
        };
        let update = merge_update(&u, &req).unwrap();
        assert_eq!(update.activity_level, "moderate");
        assert_eq!(update.workout_days, 4);
        assert_eq!(update.weight_kg, 82.5);
        assert_eq!(update.age, u.age);
        assert_eq!(update.gender, "male");

        let req = UpdateProfileRequest {
            workout_days: Some(12),
            ..Default::default()
        };
        let update = merge_update(&u, &req).unwrap();
        assert_eq!(update.workout_days, 7);
        assert_eq!(update.activity_level, "active");
    }

    #[test]
    fn rejects_non_positive_metrics() {
        let u = user(None);
        let req = UpdateProfileRequest {
            height: Some(-1.0),
            ..Default::default()
        };
        assert!(merge_update(&u, &req).is_err());
        let req = UpdateProfileRequest {
            age: Some(0),
            ..Default::default()
        };
        assert!(merge_update(&u, &req).is_err());
    }
}
