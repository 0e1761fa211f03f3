//! History-driven recipe weighting. Pure, no I/O: the same inputs always
//! produce the same ranked output.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::PlannerWeights;
use crate::domain::history::{DecisionStatus, HistoryRecord};
use crate::domain::recipe::RecipeId;

/// Derived ranking weight for one recipe, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipeWeight {
    pub recipe_id: RecipeId,
    pub weight: i32,
    pub reason: String,
}

/// Compute one weight per recipe id from the (already time-windowed)
/// history and the starred set.
///
/// `history` must arrive newest-first; within each recipe only the latest
/// record contributes. Recipes with no history get the never-used bonus,
/// and starred recipes get a fixed bonus on top of either branch. Output
/// is sorted by weight descending with recipe id ascending as the
/// deterministic tie-break.
pub fn calculate_recipe_weights(
    recipe_ids: &[RecipeId],
    history: &[HistoryRecord],
    starred: &HashSet<RecipeId>,
    weights: &PlannerWeights,
) -> Vec<RecipeWeight> {
    let mut latest_by_recipe: HashMap<RecipeId, &HistoryRecord> = HashMap::new();
    for record in history {
        latest_by_recipe.entry(record.recipe_id).or_insert(record);
    }

    let mut results: Vec<RecipeWeight> = recipe_ids
        .iter()
        .map(|&recipe_id| {
            let mut weight = 0;
            let mut reasons = Vec::new();

            match latest_by_recipe.get(&recipe_id) {
                Some(record) => match record.status {
                    DecisionStatus::Accepted => {
                        weight += weights.recently_accepted;
                        reasons.push("Recently accepted");
                    }
                    DecisionStatus::Rejected => {
                        weight += weights.recently_rejected;
                        reasons.push("Recently rejected");
                    }
                    DecisionStatus::Suggested => {
                        weight += weights.recently_suggested;
                        reasons.push("Recently suggested");
                    }
                },
                None => {
                    weight += weights.never_used;
                    reasons.push("Never used in weekly plans");
                }
            }

            if starred.contains(&recipe_id) {
                weight += weights.starred_bonus;
                reasons.push("Starred recipe");
            }

            RecipeWeight { recipe_id, weight, reason: reasons.join(", ") }
        })
        .collect();

    results.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.recipe_id.cmp(&b.recipe_id)));
    results
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn record(recipe: i64, status: DecisionStatus, days_ago: i64) -> HistoryRecord {
        HistoryRecord {
            recipe_id: RecipeId(recipe),
            status,
            plan_date: Utc::now() - Duration::days(days_ago),
        }
    }

    fn weights_for(ids: &[i64], history: &[HistoryRecord], starred: &[i64]) -> Vec<RecipeWeight> {
        let ids: Vec<RecipeId> = ids.iter().map(|&id| RecipeId(id)).collect();
        let starred: HashSet<RecipeId> = starred.iter().map(|&id| RecipeId(id)).collect();
        calculate_recipe_weights(&ids, history, &starred, &PlannerWeights::default())
    }

    fn weight_of(results: &[RecipeWeight], recipe: i64) -> i32 {
        results.iter().find(|w| w.recipe_id == RecipeId(recipe)).expect("weight present").weight
    }

    #[test]
    fn never_used_ranks_above_accepted() {
        let history = vec![record(1, DecisionStatus::Accepted, 3)];
        let results = weights_for(&[1, 2], &history, &[]);

        assert_eq!(results[0].recipe_id, RecipeId(2));
        assert!(weight_of(&results, 2) > weight_of(&results, 1));
        assert_eq!(results[0].reason, "Never used in weekly plans");
    }

    #[test]
    fn accepted_penalized_harder_than_rejected_and_suggested() {
        let history = vec![
            record(1, DecisionStatus::Accepted, 3),
            record(2, DecisionStatus::Rejected, 3),
            record(3, DecisionStatus::Suggested, 3),
        ];
        let results = weights_for(&[1, 2, 3], &history, &[]);

        assert!(weight_of(&results, 3) > weight_of(&results, 2));
        assert!(weight_of(&results, 2) > weight_of(&results, 1));
    }

    #[test]
    fn latest_record_wins_regardless_of_insertion_order() {
        // Newest-first input ordering determines the latest record; the
        // older accepted event must not affect the weight.
        let history = vec![
            record(1, DecisionStatus::Rejected, 2),
            record(1, DecisionStatus::Accepted, 20),
        ];
        let results = weights_for(&[1], &history, &[]);

        assert_eq!(weight_of(&results, 1), PlannerWeights::default().recently_rejected);
    }

    #[test]
    fn starred_bonus_applies_on_top_of_either_branch() {
        let history = vec![record(1, DecisionStatus::Suggested, 3)];
        let plain = weights_for(&[1, 2], &history, &[]);
        let starred = weights_for(&[1, 2], &history, &[1, 2]);

        let defaults = PlannerWeights::default();
        assert_eq!(
            weight_of(&starred, 1),
            weight_of(&plain, 1) + defaults.starred_bonus
        );
        assert_eq!(
            weight_of(&starred, 2),
            weight_of(&plain, 2) + defaults.starred_bonus
        );
        let starred_one = starred.iter().find(|w| w.recipe_id == RecipeId(1)).unwrap();
        assert_eq!(starred_one.reason, "Recently suggested, Starred recipe");
    }

    #[test]
    fn equal_weights_tie_break_by_recipe_id_ascending() {
        let results = weights_for(&[9, 4, 7], &[], &[]);

        let ids: Vec<i64> = results.iter().map(|w| w.recipe_id.0).collect();
        assert_eq!(ids, vec![4, 7, 9]);
    }

    #[test]
    fn output_covers_every_requested_id_exactly_once() {
        let history = vec![record(2, DecisionStatus::Accepted, 1)];
        let results = weights_for(&[1, 2, 3], &history, &[3]);

        assert_eq!(results.len(), 3);
        let mut ids: Vec<i64> = results.iter().map(|w| w.recipe_id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
