//! Re-partitions a recipe's ingredients into "already in the pantry" and
//! "still to buy" using local inventory instead of the search API's own
//! matching, which is strict about names and units ("2 lb chicken breast"
//! vs. a pantry "chicken").

use serde::Serialize;

use super::dto::Ingredient;

/// What the pantry holds of one product, as seen by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct PantryStock {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsedIngredient {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    /// Set when the ingredient was recovered from the pantry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pantry_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub used: Vec<UsedIngredient>,
    pub missing: Vec<Ingredient>,
    pub used_count: usize,
    pub missing_count: usize,
}

/// Decides whether a pantry product satisfies a recipe ingredient.
pub trait IngredientMatcher {
    fn matches(&self, ingredient: &str, stock: &str) -> bool;
}

/// Case-insensitive containment in either direction. Blank names never
/// match, since the empty string is contained in everything.
///
/// Known limitation: short names over-match ("egg" is satisfied by
/// "eggplant").
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainmentMatcher;

impl IngredientMatcher for ContainmentMatcher {
    fn matches(&self, ingredient: &str, stock: &str) -> bool {
        let ingredient = ingredient.trim().to_lowercase();
        let stock = stock.trim().to_lowercase();
        if ingredient.is_empty() || stock.is_empty() {
            return false;
        }
        stock.contains(&ingredient) || ingredient.contains(&stock)
    }
}

pub fn reconcile(
    used: &[Ingredient],
    missing: &[Ingredient],
    pantry: &[PantryStock],
) -> Reconciliation {
    reconcile_with(&ContainmentMatcher, used, missing, pantry)
}

/// The first pantry entry (in pantry order) accepted by `matcher` moves a
/// missing ingredient to `used`. Previously used ingredients keep their
/// position ahead of recovered ones.
pub fn reconcile_with<M>(
    matcher: &M,
    used: &[Ingredient],
    missing: &[Ingredient],
    pantry: &[PantryStock],
) -> Reconciliation
where
    M: IngredientMatcher + ?Sized,
{
    let mut out_used: Vec<UsedIngredient> = used
        .iter()
        .cloned()
        .map(|ingredient| UsedIngredient {
            ingredient,
            pantry_note: None,
        })
        .collect();
    let mut out_missing = Vec::new();

    for ingredient in missing {
        match pantry
            .iter()
            .find(|stock| matcher.matches(&ingredient.name, &stock.name))
        {
            Some(stock) => out_used.push(UsedIngredient {
                pantry_note: Some(format!(
                    "{} (You have: {} {})",
                    ingredient.name, stock.quantity, stock.unit
                )),
                ingredient: ingredient.clone(),
            }),
            None => out_missing.push(ingredient.clone()),
        }
    }

    Reconciliation {
        used_count: out_used.len(),
        missing_count: out_missing.len(),
        used: out_used,
        missing: out_missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(name: &str, amount: f64, unit: &str) -> Ingredient {
        Ingredient {
            name: name.into(),
            amount,
            unit: unit.into(),
            image: None,
        }
    }

    fn stock(name: &str, quantity: f64, unit: &str) -> PantryStock {
        PantryStock {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    #[test]
    fn recovers_ingredients_already_in_pantry() {
        let pantry = vec![stock("chicken breast", 2.0, "pcs")];
        let missing = vec![
            ingredient("chicken", 1.0, "lb"),
            ingredient("broccoli", 1.0, "head"),
        ];
        let used = vec![ingredient("salt", 1.0, "tsp")];

        let out = reconcile(&used, &missing, &pantry);

        assert_eq!(out.used_count, 2);
        assert_eq!(out.missing_count, 1);
        assert_eq!(out.used[0].ingredient.name, "salt");
        assert_eq!(out.used[0].pantry_note, None);
        assert_eq!(out.used[1].ingredient.name, "chicken");
        let note = out.used[1].pantry_note.as_deref().unwrap();
        assert!(note.contains("chicken"));
        assert!(note.contains("2 pcs"));
        assert_eq!(out.missing, vec![ingredient("broccoli", 1.0, "head")]);
    }

    #[test]
    fn matching_is_case_insensitive_and_bidirectional() {
        let pantry = vec![stock("Milk", 1.0, "L"), stock("parmesan cheese", 200.0, "g")];
        let missing = vec![
            ingredient("whole milk", 1.0, "cup"),
            ingredient("Parmesan", 50.0, "g"),
        ];

        let out = reconcile(&[], &missing, &pantry);

        assert_eq!(out.used_count, 2);
        assert!(out.missing.is_empty());
    }

    #[test]
    fn first_pantry_match_wins() {
        let pantry = vec![stock("red onion", 3.0, "pcs"), stock("onion", 1.0, "kg")];
        let out = reconcile(&[], &[ingredient("onion", 1.0, "")], &pantry);
        assert_eq!(
            out.used[0].pantry_note.as_deref(),
            Some("onion (You have: 3 pcs)")
        );
    }

    #[test]
    fn empty_pantry_leaves_everything_missing() {
        let missing = vec![ingredient("rice", 200.0, "g"), ingredient("beans", 1.0, "can")];
        let out = reconcile(&[], &missing, &[]);
        assert_eq!(out.used_count, 0);
        assert_eq!(out.missing, missing);
    }

    #[test]
    fn counts_cover_every_missing_ingredient_and_rerun_is_stable() {
        let pantry = vec![stock("eggs", 6.0, "pcs"), stock("flour", 1.0, "kg")];
        let missing = vec![
            ingredient("egg", 2.0, ""),
            ingredient("sugar", 100.0, "g"),
            ingredient("all-purpose flour", 2.0, "cups"),
        ];

        let first = reconcile(&[], &missing, &pantry);
        let second = reconcile(&[], &missing, &pantry);

        assert_eq!(first, second);
        assert_eq!(first.used_count + first.missing_count, missing.len());
    }

    #[test]
    fn short_names_over_match() {
        let pantry = vec![stock("eggplant", 1.0, "pcs")];
        let out = reconcile(&[], &[ingredient("egg", 2.0, "")], &pantry);
        assert_eq!(out.used_count, 1);
    }

    #[test]
    fn blank_names_match_nothing() {
        let pantry = vec![stock("rice", 1.0, "kg"), stock("  ", 1.0, "pcs")];
        let missing = vec![ingredient("", 1.0, ""), ingredient("saffron", 1.0, "g")];

        let out = reconcile(&[], &missing, &pantry);

        assert_eq!(out.used_count, 0);
        assert_eq!(out.missing, missing);
    }

    struct ExactMatcher;

    impl IngredientMatcher for ExactMatcher {
        fn matches(&self, ingredient: &str, stock: &str) -> bool {
            ingredient.eq_ignore_ascii_case(stock)
        }
    }

    #[test]
    fn matcher_can_be_swapped() {
        let pantry = vec![stock("eggplant", 1.0, "pcs")];
        let out = reconcile_with(&ExactMatcher, &[], &[ingredient("egg", 2.0, "")], &pantry);
        assert_eq!(out.missing_count, 1);
    }
}
