//! Parsers for oracle free text. Each returns a typed result so the engine
//! can decide separately what to do when the oracle did not answer sanely
//! (fallback for the weekly plan, hard failure for alternatives).

use serde::Deserialize;

use crate::domain::recipe::RecipeId;

/// Grammar: one or more comma-separated integers inside square brackets,
/// optional whitespace. The first bracketed group that yields at least one
/// integer wins; unparsable entries inside it are dropped, order and first
/// occurrence preserved, at most `max_ids` returned.
pub fn parse_recipe_id_list(text: &str, max_ids: usize) -> Result<Vec<RecipeId>, String> {
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            break;
        };

        let body = &after_open[..close];
        let mut ids: Vec<RecipeId> = Vec::new();
        for entry in body.split(',') {
            if let Ok(id) = entry.trim().parse::<i64>() {
                let id = RecipeId(id);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        if !ids.is_empty() {
            ids.truncate(max_ids);
            return Ok(ids);
        }

        rest = &after_open[close + 1..];
    }

    Err("no bracketed recipe id list found".to_string())
}

/// One selection from the alternatives oracle response.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeSelection {
    pub recipe_id: i64,
    pub reasoning: String,
    pub seasonal_score: f64,
    pub health_score: f64,
    pub ingredient_efficiency_score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlternativesEnvelope {
    alternative_recipes: Vec<AlternativeSelection>,
}

/// Extract the first JSON object in the text (first `{` to last `}`) and
/// require exactly `expected_count` selections.
pub fn parse_alternative_selections(
    text: &str,
    expected_count: usize,
) -> Result<Vec<AlternativeSelection>, String> {
    let start = text.find('{').ok_or_else(|| "no JSON object in response".to_string())?;
    let end = text.rfind('}').ok_or_else(|| "no JSON object in response".to_string())?;
    if end < start {
        return Err("no JSON object in response".to_string());
    }

    let envelope: AlternativesEnvelope = serde_json::from_str(&text[start..=end])
        .map_err(|error| format!("malformed alternatives JSON: {error}"))?;

    if envelope.alternative_recipes.len() != expected_count {
        return Err(format!(
            "expected exactly {expected_count} alternatives, got {}",
            envelope.alternative_recipes.len()
        ));
    }

    Ok(envelope.alternative_recipes)
}
