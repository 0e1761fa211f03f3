use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::recipe::RecipeId;

/// Outcome of one planning decision for one recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Accepted,
    Rejected,
    Suggested,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Suggested => "suggested",
        }
    }
}

impl std::str::FromStr for DecisionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "suggested" => Ok(Self::Suggested),
            other => Err(format!(
                "unknown decision status `{other}` (expected accepted|rejected|suggested)"
            )),
        }
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable decision event. Records are only ever inserted or purged;
/// the most recent record per recipe wins during weighting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub recipe_id: RecipeId,
    pub status: DecisionStatus,
    pub plan_date: DateTime<Utc>,
}

/// One row of the "recipes used in weekly plans" listing. A recipe planned
/// three times appears three times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsedRecipe {
    pub id: RecipeId,
    pub title: String,
    pub image: Option<String>,
    pub url: String,
    pub status: DecisionStatus,
    pub plan_date: DateTime<Utc>,
}
