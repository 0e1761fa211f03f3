//! Presentation scores attached to each planned recipe.

use crate::domain::recipe::Recipe;

/// Weighted combination of ingredient variety (capped at 10 ingredients,
/// 60%) and seasonal fraction (40%), scaled to 0-100.
pub fn health_score(recipe: &Recipe, month: u32) -> u32 {
    let total = recipe.ingredients.len();
    let seasonal = recipe.ingredients.iter().filter(|i| i.in_season(month)).count();

    let variety = (total as f64 / 10.0).min(1.0);
    let seasonal_fraction = seasonal as f64 / total.max(1) as f64;

    ((variety * 0.6 + seasonal_fraction * 0.4) * 100.0).round() as u32
}

/// Fraction of the recipe's ingredients already on the user's checked
/// shopping list (case-insensitive name match), scaled to 0-100. Neutral
/// 50 when the user has no checked items.
pub fn ingredient_efficiency_score(recipe: &Recipe, checked_ingredients: &[String]) -> u32 {
    if checked_ingredients.is_empty() {
        return 50;
    }

    let matching = recipe
        .ingredients
        .iter()
        .filter(|i| checked_ingredients.iter().any(|c| c.eq_ignore_ascii_case(&i.name)))
        .count();

    (matching as f64 / recipe.ingredients.len().max(1) as f64 * 100.0).round() as u32
}

/// Human-readable justification: seasonal count, already-have count, and
/// starred flag, with a generic variety clause when none apply.
pub fn reasoning(recipe: &Recipe, checked_ingredients: &[String], month: u32) -> String {
    let mut reasons = Vec::new();

    let seasonal = recipe.ingredients.iter().filter(|i| i.in_season(month)).count();
    if seasonal > 0 {
        reasons.push(format!("Uses {seasonal} seasonal ingredients"));
    }

    let matching = recipe
        .ingredients
        .iter()
        .filter(|i| checked_ingredients.iter().any(|c| c.eq_ignore_ascii_case(&i.name)))
        .count();
    if matching > 0 {
        reasons.push(format!("Uses {matching} ingredients you already have"));
    }

    if recipe.starred {
        reasons.push("One of your starred recipes".to_string());
    }

    if reasons.is_empty() {
        reasons.push("Good variety and nutritional balance".to_string());
    }

    reasons.join(", ")
}
