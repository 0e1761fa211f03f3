use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use mealweek_core::{OracleError, RankingOracle};

/// Replays a fixed script of responses, then repeats the last one. Used
/// by server tests and offline demo runs where no API key is available.
pub struct CannedOracle {
    script: Mutex<VecDeque<Result<String, OracleError>>>,
    fallback: Result<String, OracleError>,
}

impl CannedOracle {
    pub fn replying(script: Vec<Result<String, OracleError>>) -> Self {
        let fallback = script
            .last()
            .cloned()
            .unwrap_or_else(|| Err(OracleError::Transport("empty script".to_string())));
        Self { script: Mutex::new(script.into()), fallback }
    }

    /// Always answers with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::replying(vec![Ok(text.into())])
    }

    /// Always times out.
    pub fn unavailable() -> Self {
        Self::replying(vec![Err(OracleError::Timeout)])
    }
}

#[async_trait]
impl RankingOracle for CannedOracle {
    async fn rank(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, OracleError> {
        let mut script = self.script.lock().unwrap_or_else(|err| err.into_inner());
        script.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}
