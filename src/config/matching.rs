//! Matching configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::reconciliation::{MatchingOptions, ScoreWeights};

/// Weights and thresholds of the auto-matching pass.
///
/// The defaults are tuned heuristics, not derived values; the weights
/// need not sum to 1.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct MatchingConfig {
    #[serde(default = "default_text_weight")]
    pub text_weight: f64,

    #[serde(default = "default_context_weight")]
    pub context_weight: f64,

    #[serde(default = "default_type_weight")]
    pub type_weight: f64,

    /// Minimum composite score for a pair to match at all
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Minimum composite score for an exact, pre-confirmed match
    #[serde(default = "default_auto_confirm_threshold")]
    pub auto_confirm_threshold: f64,
}

impl MatchingConfig {
    pub fn options(&self) -> MatchingOptions {
        MatchingOptions {
            weights: ScoreWeights {
                text: self.text_weight,
                context: self.context_weight,
                kind: self.type_weight,
            },
            match_threshold: self.match_threshold,
            auto_confirm_threshold: self.auto_confirm_threshold,
        }
    }

    /// Validate matching configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.options()
            .validate()
            .map_err(|e| ValidationError::InvalidMatching(e.to_string()))
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            text_weight: default_text_weight(),
            context_weight: default_context_weight(),
            type_weight: default_type_weight(),
            match_threshold: default_match_threshold(),
            auto_confirm_threshold: default_auto_confirm_threshold(),
        }
    }
}

fn default_text_weight() -> f64 {
    0.6
}

fn default_context_weight() -> f64 {
    0.3
}

fn default_type_weight() -> f64 {
    0.1
}

fn default_match_threshold() -> f64 {
    0.5
}

fn default_auto_confirm_threshold() -> f64 {
    0.9
}
