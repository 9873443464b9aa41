use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::dto::{Ingredient, NutritionFacts, Strategy};
use crate::config::RecipeApiConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeQuery {
    pub ingredients: Vec<String>,
    pub strategy: Strategy,
    pub max_calories: Option<u32>,
    pub min_protein: Option<u32>,
    pub max_protein: Option<u32>,
    pub diet: Option<String>,
    pub intolerances: Vec<String>,
}

/// A recipe as reported by the search API. Its used/missing split is the
/// API's own opinion and gets re-partitioned against the pantry.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCandidate {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub nutrition: NutritionFacts,
    pub instructions: Vec<String>,
    pub used_ingredients: Vec<Ingredient>,
    pub missed_ingredients: Vec<Ingredient>,
}

#[derive(Debug, Error)]
pub enum RecipeSearchError {
    #[error("recipe api key is not configured")]
    NotConfigured,
    /// Built through `From`, which drops the request URL from the error.
    #[error("recipe api request failed: {0}")]
    Transport(reqwest::Error),
    #[error("recipe api returned status {0}")]
    Status(u16),
    #[error("recipe api response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RecipeSearchError {
    fn from(e: reqwest::Error) -> Self {
        RecipeSearchError::Transport(e.without_url())
    }
}

#[async_trait]
pub trait RecipeSearch: Send + Sync {
    async fn search(&self, query: &RecipeQuery) -> Result<Vec<RecipeCandidate>, RecipeSearchError>;
}

/// Spoonacular `complexSearch` client.
#[derive(Clone)]
pub struct SpoonacularClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    results: u32,
}

impl SpoonacularClient {
    pub fn new(config: &RecipeApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            results: config.results,
        })
    }

    fn query_params(&self, q: &RecipeQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("includeIngredients", q.ingredients.join(",")),
            ("fillIngredients", "true".into()),
            ("addRecipeInformation", "true".into()),
            ("addRecipeNutrition", "true".into()),
            ("ignorePantry", "true".into()),
            ("number", self.results.to_string()),
        ];
        let sort = match q.strategy {
            Strategy::Waste => "max-used-ingredients",
            Strategy::Health => "healthiness",
        };
        params.push(("sort", sort.into()));
        if let Some(v) = q.max_calories {
            params.push(("maxCalories", v.to_string()));
        }
        if let Some(v) = q.min_protein {
            params.push(("minProtein", v.to_string()));
        }
        if let Some(v) = q.max_protein {
            params.push(("maxProtein", v.to_string()));
        }
        if let Some(diet) = &q.diet {
            params.push(("diet", diet.clone()));
        }
        if !q.intolerances.is_empty() {
            params.push(("intolerances", q.intolerances.join(",")));
        }
        params
    }
}

#[async_trait]
impl RecipeSearch for SpoonacularClient {
    async fn search(&self, query: &RecipeQuery) -> Result<Vec<RecipeCandidate>, RecipeSearchError> {
        let api_key = self.api_key.as_deref().ok_or(RecipeSearchError::NotConfigured)?;
        let url = format!("{}/recipes/complexSearch", self.base_url);

        let res = self
            .http
            .get(&url)
            .header("x-api-key", api_key)
            .query(&self.query_params(query))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, "recipe api error status");
            return Err(RecipeSearchError::Status(status.as_u16()));
        }

        let body: SearchResponse = res
            .json()
            .await
            .map_err(|e| RecipeSearchError::Decode(e.without_url().to_string()))?;
        debug!(results = body.results.len(), "recipe api answered");
        Ok(body.results.into_iter().map(RecipeCandidate::from).collect())
    }
}

// ---- wire format ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<WireRecipe>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecipe {
    id: i64,
    title: String,
    image: Option<String>,
    ready_in_minutes: Option<u32>,
    #[serde(default)]
    used_ingredients: Vec<WireIngredient>,
    #[serde(default)]
    missed_ingredients: Vec<WireIngredient>,
    nutrition: Option<WireNutrition>,
    #[serde(default)]
    analyzed_instructions: Vec<WireInstructions>,
}

#[derive(Debug, Deserialize)]
struct WireIngredient {
    name: String,
    #[serde(default)]
    amount: f64,
    #[serde(default)]
    unit: String,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireNutrition {
    #[serde(default)]
    nutrients: Vec<WireNutrient>,
}

#[derive(Debug, Deserialize)]
struct WireNutrient {
    name: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct WireInstructions {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    step: String,
}

impl From<WireIngredient> for Ingredient {
    fn from(w: WireIngredient) -> Self {
        Self {
            name: w.name,
            amount: w.amount,
            unit: w.unit,
            image: w.image,
        }
    }
}

impl From<WireRecipe> for RecipeCandidate {
    fn from(w: WireRecipe) -> Self {
        let nutrients = w.nutrition.map(|n| n.nutrients).unwrap_or_default();
        let nutrient = |name: &str| {
            nutrients
                .iter()
                .find(|n| n.name.eq_ignore_ascii_case(name))
                .map(|n| n.amount)
        };
        let nutrition = NutritionFacts {
            calories_kcal: nutrient("Calories"),
            protein_g: nutrient("Protein"),
            fat_g: nutrient("Fat"),
            carbs_g: nutrient("Carbohydrates"),
        };

        Self {
            id: w.id,
            title: w.title,
            image: w.image,
            ready_in_minutes: w.ready_in_minutes,
            nutrition,
            instructions: w
                .analyzed_instructions
                .into_iter()
                .flat_map(|i| i.steps)
                .map(|s| s.step)
                .collect(),
            used_ingredients: w.used_ingredients.into_iter().map(Into::into).collect(),
            missed_ingredients: w.missed_ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> SpoonacularClient {
        SpoonacularClient::new(&RecipeApiConfig {
            base_url: "http://127.0.0.1:9/".into(),
            api_key: api_key.map(Into::into),
            timeout_secs: 1,
            results: 5,
        })
        .expect("client builds")
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn waste_query_has_no_nutrition_filters() {
        let q = RecipeQuery {
            ingredients: vec!["rice".into(), "eggs".into()],
            strategy: Strategy::Waste,
            intolerances: vec!["peanut".into()],
            ..Default::default()
        };
        let params = client(Some("k")).query_params(&q);

        assert_eq!(param(&params, "includeIngredients"), Some("rice,eggs"));
        assert_eq!(param(&params, "sort"), Some("max-used-ingredients"));
        assert_eq!(param(&params, "intolerances"), Some("peanut"));
        assert_eq!(param(&params, "number"), Some("5"));
        assert_eq!(param(&params, "maxCalories"), None);
        assert_eq!(param(&params, "diet"), None);
    }

    #[test]
    fn health_query_carries_targets() {
        let q = RecipeQuery {
            ingredients: vec!["tofu".into()],
            strategy: Strategy::Health,
            max_calories: Some(703),
            min_protein: Some(14),
            max_protein: Some(29),
            diet: Some("vegetarian".into()),
            intolerances: vec![],
        };
        let params = client(Some("k")).query_params(&q);

        assert_eq!(param(&params, "sort"), Some("healthiness"));
        assert_eq!(param(&params, "maxCalories"), Some("703"));
        assert_eq!(param(&params, "minProtein"), Some("14"));
        assert_eq!(param(&params, "maxProtein"), Some("29"));
        assert_eq!(param(&params, "diet"), Some("vegetarian"));
        assert_eq!(param(&params, "intolerances"), None);
    }

    #[tokio::test]
    async fn missing_api_key_is_reported() {
        let err = client(None).search(&RecipeQuery::default()).await.unwrap_err();
        assert!(matches!(err, RecipeSearchError::NotConfigured));
    }

    #[tokio::test]
    async fn transport_errors_do_not_carry_the_api_key() {
        let err = client(Some("SUPERSECRETKEY"))
            .search(&RecipeQuery {
                ingredients: vec!["rice".into()],
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RecipeSearchError::Transport(_)));
        let text = err.to_string();
        assert!(!text.contains("SUPERSECRETKEY"), "{text}");
        assert!(!text.contains("complexSearch"), "{text}");
    }

    #[test]
    fn api_key_is_not_a_query_parameter() {
        let params = client(Some("SUPERSECRETKEY")).query_params(&RecipeQuery::default());
        assert!(params.iter().all(|(k, v)| *k != "apiKey" && !v.contains("SUPERSECRETKEY")));
    }

    #[test]
    fn decodes_complex_search_payload() {
        let body = r#"{
            "results": [{
                "id": 715538,
                "title": "Chicken and Broccoli Bowl",
                "image": "https://img.example/715538.jpg",
                "readyInMinutes": 35,
                "usedIngredients": [
                    {"name": "rice", "amount": 1.0, "unit": "cup", "image": "rice.png"}
                ],
                "missedIngredients": [
                    {"name": "chicken", "amount": 1.0, "unit": "lb"},
                    {"name": "broccoli", "amount": 1.0, "unit": "head"}
                ],
                "nutrition": {"nutrients": [
                    {"name": "Calories", "amount": 612.4, "unit": "kcal"},
                    {"name": "Protein", "amount": 41.0, "unit": "g"},
                    {"name": "Fat", "amount": 12.5, "unit": "g"}
                ]},
                "analyzedInstructions": [
                    {"name": "", "steps": [
                        {"number": 1, "step": "Cook the rice."},
                        {"number": 2, "step": "Stir-fry the chicken."}
                    ]}
                ]
            }],
            "totalResults": 1
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let recipes: Vec<RecipeCandidate> =
            parsed.results.into_iter().map(RecipeCandidate::from).collect();

        assert_eq!(recipes.len(), 1);
        let r = &recipes[0];
        assert_eq!(r.id, 715538);
        assert_eq!(r.ready_in_minutes, Some(35));
        assert_eq!(r.used_ingredients[0].image.as_deref(), Some("rice.png"));
        assert_eq!(r.missed_ingredients.len(), 2);
        assert_eq!(r.missed_ingredients[0].unit, "lb");
        assert_eq!(r.nutrition.calories_kcal, Some(612.4));
        assert_eq!(r.nutrition.protein_g, Some(41.0));
        assert_eq!(r.nutrition.carbs_g, None);
        assert_eq!(r.instructions, vec!["Cook the rice.", "Stir-fry the chicken."]);
    }

    #[test]
    fn tolerates_sparse_results() {
        let parsed: SearchResponse =
            serde_json::from_str(r#"{"results":[{"id":1,"title":"Toast"}]}"#).unwrap();
        let r = RecipeCandidate::from(parsed.results.into_iter().next().unwrap());
        assert!(r.instructions.is_empty());
        assert!(r.missed_ingredients.is_empty());
        assert_eq!(r.nutrition, NutritionFacts::default());
    }
}
