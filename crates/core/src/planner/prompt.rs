//! Prompt construction for the ranking oracle. Pure text building; the
//! engine decides when (and whether) to call the oracle.

use serde::Serialize;

use super::candidates::RecipeCandidate;
use crate::domain::recipe::Recipe;

pub fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// Compact weekly-plan prompt: one line per candidate, bounded checked-item
/// list, and an instruction to answer with a bracketed id list only.
pub fn build_plan_prompt(
    candidates: &[RecipeCandidate],
    checked_ingredients: &[String],
    checked_limit: usize,
    month: u32,
    plan_size: usize,
) -> String {
    let checked = if checked_ingredients.is_empty() {
        "None".to_string()
    } else {
        checked_ingredients
            .iter()
            .take(checked_limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let lines = candidates
        .iter()
        .map(|candidate| {
            format!(
                "ID: {} | {} | Weight: {} | Seasonal: {:.0}% | Starred: {}",
                candidate.id,
                candidate.title,
                candidate.weight,
                candidate.seasonal_score * 100.0,
                if candidate.starred { "Yes" } else { "No" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a French cuisine expert. Select exactly {plan_size} recipes from these {count} \
         options for a weekly meal plan.\n\n\
         Current month: {month} ({month_name})\n\
         Checked ingredients: {checked}\n\n\
         Top recipes by weight:\n{lines}\n\n\
         Return ONLY a JSON array with exactly {plan_size} recipe IDs: [123, 456, 789, 101, 112]",
        count = candidates.len(),
        month_name = month_name(month),
    )
}

/// Candidate payload serialized into the alternatives prompt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativePromptRecipe {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starred: bool,
    pub ingredients: Vec<AlternativePromptIngredient>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativePromptIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub seasons: Vec<u32>,
}

impl AlternativePromptRecipe {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.0,
            title: super::candidates::display_title(&recipe.title),
            description: recipe.description.clone(),
            starred: recipe.starred,
            ingredients: recipe
                .ingredients
                .iter()
                .map(|ingredient| AlternativePromptIngredient {
                    name: ingredient.name.clone(),
                    quantity: ingredient.quantity,
                    unit: ingredient.unit.clone(),
                    seasons: ingredient.season_months.iter().copied().collect(),
                })
                .collect(),
        }
    }
}

/// Multi-criteria alternatives prompt: health > seasonality >
/// ingredient-sharing > variety > starred preference, answered as a JSON
/// object with exactly `count` scored selections.
pub fn build_alternatives_prompt(
    available: &[AlternativePromptRecipe],
    rejected_recipe_id: i64,
    month: u32,
    count: usize,
) -> String {
    let recipe_json = serde_json::to_string_pretty(available).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a culinary expert and nutritionist specializing in French seasonal cooking. \
         A user has rejected a recipe from their weekly meal plan and needs {count} alternative \
         options.\n\n\
         Current month: {month} (France seasonal context)\n\
         Rejected recipe ID: {rejected_recipe_id}\n\n\
         CRITERIA (in order of importance):\n\
         1. HEALTH: Prioritize recipes with vegetables, lean proteins, whole grains, and balanced nutrition\n\
         2. SEASONALITY: Favor recipes with ingredients currently in season in France (month {month})\n\
         3. INGREDIENT EFFICIENCY: Select recipes that share ingredients with the current weekly plan to minimize waste\n\
         4. VARIETY: Ensure diverse flavors, cooking methods, and cuisine types\n\
         5. USER PREFERENCES: Slightly favor starred/favorite recipes (marked as starred: true)\n\n\
         AVAILABLE RECIPES:\n{recipe_json}\n\n\
         TASK:\n\
         Analyze all available recipes and select exactly {count} that best meet the criteria above. \
         For each selected recipe, provide:\n\
         - A brief reasoning (2-3 sentences) explaining why it was chosen as an alternative\n\
         - Seasonal score (0-10): how many seasonal ingredients it contains\n\
         - Health score (0-10): nutritional balance assessment\n\
         - Ingredient efficiency score (0-10): potential for ingredient sharing\n\n\
         Return ONLY a JSON object with this structure:\n\
         {{\n\
           \"alternativeRecipes\": [\n\
             {{\n\
               \"recipeId\": number,\n\
               \"reasoning\": \"string\",\n\
               \"seasonalScore\": number,\n\
               \"healthScore\": number,\n\
               \"ingredientEfficiencyScore\": number\n\
             }}\n\
           ]\n\
         }}\n\n\
         Focus on providing diverse, healthy, and practical alternatives that complement the \
         existing weekly plan."
    )
}
