//! Oracle implementations for the weekly-plan engine.
//!
//! [`AnthropicOracle`] speaks the Anthropic messages API over reqwest;
//! [`CannedOracle`] replays scripted responses for tests and offline runs.

pub mod anthropic;
pub mod canned;

pub use anthropic::AnthropicOracle;
pub use canned::CannedOracle;
