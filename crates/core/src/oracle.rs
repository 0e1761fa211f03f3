//! Ranking-oracle seam.
//!
//! The oracle is an opaque, unreliable text-completion capability: it may
//! time out, return malformed text, or hallucinate recipe ids. The engine
//! treats all three cases explicitly; implementations only distinguish
//! timeout from other transport failures.

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::PlannerError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle request timed out")]
    Timeout,
    #[error("oracle transport failure: {0}")]
    Transport(String),
}

impl From<OracleError> for PlannerError {
    fn from(value: OracleError) -> Self {
        match value {
            OracleError::Timeout => PlannerError::OracleTimeout,
            OracleError::Transport(message) => PlannerError::OracleTransport(message),
        }
    }
}

#[async_trait]
pub trait RankingOracle: Send + Sync {
    /// Submit `prompt` and return the oracle's free text. Implementations
    /// enforce their own per-call timeout independent of the caller's
    /// overall deadline.
    async fn rank(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, OracleError>;
}
