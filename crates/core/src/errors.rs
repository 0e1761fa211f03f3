use thiserror::Error;

use crate::domain::recipe::RecipeId;

/// Typed failure modes of the planning flows. No stage is allowed to
/// surface an opaque error: storage, oracle, and parsing failures each map
/// into one of these variants at the engine boundary.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlannerError {
    #[error("no recipes found for user")]
    NoRecipes,
    #[error("no alternative recipes available")]
    NoAlternatives,
    #[error("ranking oracle timed out")]
    OracleTimeout,
    #[error("ranking oracle transport failure: {0}")]
    OracleTransport(String),
    #[error("could not parse oracle response: {0}")]
    Parse(String),
    #[error("recipe {0} is not among the available candidates")]
    NotFound(RecipeId),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("request deadline exceeded")]
    RequestTimeout,
}

impl PlannerError {
    /// User-safe message for the HTTP layer; never leaks internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoRecipes => "No recipes found. Add some recipes first.",
            Self::NoAlternatives => "No alternative recipes available.",
            Self::OracleTimeout | Self::OracleTransport(_) => {
                "The recommendation service is temporarily unavailable. Please retry shortly."
            }
            Self::Parse(_) | Self::NotFound(_) => "Failed to analyze recipes.",
            Self::Persistence(_) => "Failed to generate weekly plan.",
            Self::RequestTimeout => "Request timed out. Please try again.",
        }
    }

    /// Whether retrying the same request without user action can succeed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::OracleTimeout
                | Self::OracleTransport(_)
                | Self::Persistence(_)
                | Self::RequestTimeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_errors_are_not_retryable() {
        assert!(!PlannerError::NoRecipes.retryable());
        assert!(!PlannerError::NoAlternatives.retryable());
        assert!(!PlannerError::NotFound(RecipeId(7)).retryable());
    }

    #[test]
    fn timeout_is_retryable_with_distinct_message() {
        assert!(PlannerError::RequestTimeout.retryable());
        assert_eq!(
            PlannerError::RequestTimeout.user_message(),
            "Request timed out. Please try again."
        );
    }
}
