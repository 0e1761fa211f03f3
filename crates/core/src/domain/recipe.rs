use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeId(pub i64);

impl std::fmt::Display for RecipeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ingredient line of a recipe, carrying the months (1..=12) in which
/// the ingredient is in season.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub english_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub season_months: BTreeSet<u32>,
}

impl RecipeIngredient {
    pub fn in_season(&self, month: u32) -> bool {
        self.season_months.contains(&month)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    pub starred: bool,
    pub ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    /// Fraction of ingredients in season in `month`. An ingredient-less
    /// recipe scores 0.0 rather than dividing by zero.
    pub fn seasonal_score(&self, month: u32) -> f64 {
        let seasonal = self.ingredients.iter().filter(|i| i.in_season(month)).count();
        seasonal as f64 / self.ingredients.len().max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(name: &str, months: &[u32]) -> RecipeIngredient {
        RecipeIngredient {
            name: name.to_string(),
            english_name: None,
            quantity: 1.0,
            unit: "unit".to_string(),
            season_months: months.iter().copied().collect(),
        }
    }

    #[test]
    fn seasonal_score_counts_in_season_fraction() {
        let recipe = Recipe {
            id: RecipeId(1),
            title: "Ratatouille".to_string(),
            description: String::new(),
            url: "https://example.test/r/1".to_string(),
            image: None,
            starred: false,
            ingredients: vec![
                ingredient("tomate", &[7, 8, 9]),
                ingredient("aubergine", &[7, 8]),
                ingredient("oignon", &[]),
                ingredient("courgette", &[6, 7]),
            ],
        };

        assert!((recipe.seasonal_score(7) - 0.75).abs() < f64::EPSILON);
        assert!((recipe.seasonal_score(1) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn seasonal_score_is_zero_for_empty_ingredient_list() {
        let recipe = Recipe {
            id: RecipeId(2),
            title: "Untitled Recipe".to_string(),
            description: String::new(),
            url: String::new(),
            image: None,
            starred: false,
            ingredients: Vec::new(),
        };

        assert_eq!(recipe.seasonal_score(3), 0.0);
    }
}
