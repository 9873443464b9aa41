use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::auth::repo::User;
use crate::inventory::repo::InventoryItem;
use crate::nutrition::NutritionTarget;
use crate::profile::services::diet_filter;

use super::client::{RecipeCandidate, RecipeQuery, RecipeSearch, RecipeSearchError};
use super::dto::{RecipeSuggestion, Strategy};
use super::reconcile::{reconcile, PantryStock};

/// Health strategy protein band, as multiples of the per-meal target.
const PROTEIN_FLOOR: f64 = 0.75;
const PROTEIN_CEILING: f64 = 1.5;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("pantry is empty")]
    EmptyPantry,
    #[error("no recipe matched the pantry")]
    NoRecipes,
    #[error(transparent)]
    Search(#[from] RecipeSearchError),
}

impl From<&InventoryItem> for PantryStock {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
        }
    }
}

pub fn build_query(
    strategy: Strategy,
    target: NutritionTarget,
    user: &User,
    pantry: &[PantryStock],
) -> RecipeQuery {
    let mut ingredients: Vec<String> = Vec::with_capacity(pantry.len());
    for stock in pantry {
        let name = stock.name.trim().to_lowercase();
        if !name.is_empty() && !ingredients.contains(&name) {
            ingredients.push(name);
        }
    }

    let mut query = RecipeQuery {
        ingredients,
        strategy,
        diet: diet_filter(user),
        intolerances: user.allergies.clone(),
        ..Default::default()
    };
    if strategy == Strategy::Health {
        let protein = f64::from(target.protein_g);
        query.max_calories = Some(target.calories_kcal);
        query.min_protein = Some((protein * PROTEIN_FLOOR).round() as u32);
        query.max_protein = Some((protein * PROTEIN_CEILING).round() as u32);
    }
    query
}

/// Reconcile one search result against the pantry.
pub fn assemble(
    candidate: RecipeCandidate,
    strategy: Strategy,
    target: NutritionTarget,
    pantry: &[PantryStock],
) -> RecipeSuggestion {
    let r = reconcile(&candidate.used_ingredients, &candidate.missed_ingredients, pantry);
    RecipeSuggestion {
        id: candidate.id,
        title: candidate.title,
        image: candidate.image,
        ready_in_minutes: candidate.ready_in_minutes,
        strategy,
        target,
        nutrition: candidate.nutrition,
        instructions: candidate.instructions,
        used: r.used,
        missing: r.missing,
        used_count: r.used_count,
        missing_count: r.missing_count,
    }
}

/// Search with the pantry and the user's targets, then pick one result at
/// random so that asking again gives a different recipe.
#[instrument(skip_all, fields(user_id = %user.id, strategy = ?strategy))]
pub async fn suggest(
    search: &dyn RecipeSearch,
    user: &User,
    strategy: Strategy,
    target: NutritionTarget,
    pantry: &[InventoryItem],
) -> Result<RecipeSuggestion, SuggestError> {
    if pantry.is_empty() {
        return Err(SuggestError::EmptyPantry);
    }
    let stock: Vec<PantryStock> = pantry.iter().map(PantryStock::from).collect();
    let query = build_query(strategy, target, user, &stock);

    let mut candidates = search.search(&query).await.map_err(|e| {
        warn!(error = %e, "recipe search failed");
        e
    })?;
    if candidates.is_empty() {
        return Err(SuggestError::NoRecipes);
    }
    let pick = rand::thread_rng().gen_range(0..candidates.len());
    debug!(candidates = candidates.len(), pick, "recipe picked");
    let candidate = candidates.swap_remove(pick);

    Ok(assemble(candidate, strategy, target, &stock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::services::test_support::user;
    use crate::recipes::dto::{Ingredient, NutritionFacts};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    const TARGET: NutritionTarget = NutritionTarget {
        calories_kcal: 703,
        protein_g: 19,
    };

    fn item(name: &str, quantity: f64, unit: &str) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            household_id: None,
            name: name.into(),
            quantity,
            unit: unit.into(),
            category: "Other".into(),
            expiry_date: date!(2026 - 12 - 31),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn ingredient(name: &str, amount: f64, unit: &str) -> Ingredient {
        Ingredient {
            name: name.into(),
            amount,
            unit: unit.into(),
            image: None,
        }
    }

    fn candidate(id: i64) -> RecipeCandidate {
        RecipeCandidate {
            id,
            title: format!("Recipe {id}"),
            image: None,
            ready_in_minutes: Some(30),
            nutrition: NutritionFacts::default(),
            instructions: vec!["Cook.".into()],
            used_ingredients: vec![ingredient("rice", 1.0, "cup")],
            missed_ingredients: vec![
                ingredient("chicken", 1.0, "lb"),
                ingredient("broccoli", 1.0, "head"),
            ],
        }
    }

    enum Answer {
        Recipes(Vec<RecipeCandidate>),
        Unavailable,
    }

    struct FakeSearch {
        answer: Answer,
        seen: Mutex<Vec<RecipeQuery>>,
    }

    impl FakeSearch {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecipeSearch for FakeSearch {
        async fn search(&self, query: &RecipeQuery) -> Result<Vec<RecipeCandidate>, RecipeSearchError> {
            self.seen.lock().unwrap().push(query.clone());
            match &self.answer {
                Answer::Recipes(r) => Ok(r.clone()),
                Answer::Unavailable => Err(RecipeSearchError::Status(503)),
            }
        }
    }

    #[test]
    fn health_query_bands_protein_around_the_target() {
        let mut u = user(None);
        u.allergies = vec!["peanut".into()];
        u.dietary_preference = "Vegan".into();
        let pantry = vec![
            PantryStock { name: "Tofu".into(), quantity: 1.0, unit: "pcs".into() },
            PantryStock { name: "tofu ".into(), quantity: 2.0, unit: "pcs".into() },
        ];

        let q = build_query(Strategy::Health, TARGET, &u, &pantry);

        assert_eq!(q.ingredients, vec!["tofu"]);
        assert_eq!(q.max_calories, Some(703));
        assert_eq!(q.min_protein, Some(14));
        assert_eq!(q.max_protein, Some(29));
        assert_eq!(q.diet.as_deref(), Some("vegan"));
        assert_eq!(q.intolerances, vec!["peanut"]);
    }

    #[test]
    fn waste_query_has_no_nutrition_bias() {
        let pantry = vec![PantryStock { name: "rice".into(), quantity: 1.0, unit: "kg".into() }];
        let q = build_query(Strategy::Waste, TARGET, &user(None), &pantry);
        assert_eq!(q.max_calories, None);
        assert_eq!(q.min_protein, None);
        assert_eq!(q.max_protein, None);
        assert_eq!(q.diet, None);
    }

    #[tokio::test]
    async fn empty_pantry_never_reaches_the_search() {
        let search = FakeSearch::new(Answer::Recipes(vec![candidate(1)]));
        let err = suggest(&search, &user(None), Strategy::Waste, TARGET, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestError::EmptyPantry));
        assert!(search.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn suggestion_is_reconciled_against_the_pantry() {
        let search = FakeSearch::new(Answer::Recipes(vec![candidate(7)]));
        let pantry = vec![item("chicken breast", 2.0, "pcs"), item("rice", 1.0, "kg")];

        let s = suggest(&search, &user(None), Strategy::Health, TARGET, &pantry)
            .await
            .unwrap();

        assert_eq!(s.id, 7);
        assert_eq!(s.target, TARGET);
        assert_eq!(s.used_count, 2);
        assert_eq!(s.missing_count, 1);
        assert_eq!(s.missing[0].name, "broccoli");
        assert_eq!(
            s.used[1].pantry_note.as_deref(),
            Some("chicken (You have: 2 pcs)")
        );
        let seen = search.seen.lock().unwrap();
        assert_eq!(seen[0].ingredients, vec!["chicken breast", "rice"]);
    }

    #[tokio::test]
    async fn picks_one_of_the_candidates() {
        let search = FakeSearch::new(Answer::Recipes(vec![candidate(1), candidate(2), candidate(3)]));
        let pantry = vec![item("rice", 1.0, "kg")];
        for _ in 0..10 {
            let s = suggest(&search, &user(None), Strategy::Waste, TARGET, &pantry)
                .await
                .unwrap();
            assert!((1..=3).contains(&s.id));
        }
    }

    #[tokio::test]
    async fn empty_and_failed_searches_are_distinguished() {
        let pantry = vec![item("rice", 1.0, "kg")];

        let none = FakeSearch::new(Answer::Recipes(vec![]));
        let err = suggest(&none, &user(None), Strategy::Waste, TARGET, &pantry)
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestError::NoRecipes));

        let down = FakeSearch::new(Answer::Unavailable);
        let err = suggest(&down, &user(None), Strategy::Waste, TARGET, &pantry)
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestError::Search(RecipeSearchError::Status(503))));
    }
}
