//! Similarity scoring between an old and a new position.
//!
//! All functions are pure and deterministic. The composite score is a
//! weighted sum of three components:
//!
//! | Component | Input | Default weight |
//! |-----------|-------|----------------|
//! | text | position names | 0.6 |
//! | context | position numbers | 0.3 |
//! | type | position kinds | 0.1 |

use serde::{Deserialize, Serialize};

use crate::domain::tender::{Position, PositionKind};

/// Characters compared when looking for a shared leading phrase.
const PREFIX_WINDOW: usize = 30;

/// Minimum length of the shared leading phrase to earn the prefix floor.
const MIN_SHARED_PREFIX: usize = 10;

const PREFIX_FLOOR: f64 = 0.7;
const CONTAINMENT_SCORE: f64 = 0.8;
const UNKNOWN_CONTEXT_SCORE: f64 = 0.3;
const UNKNOWN_KIND_SCORE: f64 = 0.5;

/// Relative weights of the score components.
///
/// The weights need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub text: f64,
    pub context: f64,
    pub kind: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            text: 0.6,
            context: 0.3,
            kind: 0.1,
        }
    }
}

/// Composite confidence plus the components it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Weighted composite, clamped to [0, 1].
    pub confidence: f64,
    pub text: f64,
    pub context: f64,
    pub kind: f64,
}

impl MatchScore {
    /// Score of a correspondence with no supporting evidence.
    pub fn zero() -> Self {
        Self {
            confidence: 0.0,
            text: 0.0,
            context: 0.0,
            kind: 0.0,
        }
    }

    /// Score of a correspondence asserted by a person.
    pub fn certain() -> Self {
        Self {
            confidence: 1.0,
            text: 1.0,
            context: 1.0,
            kind: 1.0,
        }
    }

    /// Human-readable breakdown, e.g. `text 100%; context 85%; type 50%`.
    pub fn explain(&self) -> String {
        format!(
            "text {:.0}%; context {:.0}%; type {:.0}%",
            self.text * 100.0,
            self.context * 100.0,
            self.kind * 100.0
        )
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, counted in characters.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(a, b) as f64 / longest as f64
}

/// Similarity of two position names in [0, 1].
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let prefix_a: String = a.chars().take(PREFIX_WINDOW).collect();
    let prefix_b: String = b.chars().take(PREFIX_WINDOW).collect();
    if prefix_a == prefix_b && prefix_a.chars().count() >= MIN_SHARED_PREFIX {
        return edit_similarity(&a, &b).max(PREFIX_FLOOR);
    }

    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return CONTAINMENT_SCORE;
    }

    edit_similarity(&a, &b)
}

/// Similarity of two position numbers ("3", "2.3.1") in [0, 1].
pub fn context_similarity(a: Option<&str>, b: Option<&str>) -> f64 {
    fn present(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    let (a, b) = match (present(a), present(b)) {
        (Some(a), Some(b)) => (a, b),
        _ => return UNKNOWN_CONTEXT_SCORE,
    };

    if a == b {
        return 1.0;
    }

    if a.contains('.') && b.contains('.') {
        let parts_a: Vec<&str> = a.split('.').collect();
        let parts_b: Vec<&str> = b.split('.').collect();
        if parts_a.len() == parts_b.len() {
            let matching = parts_a
                .iter()
                .zip(&parts_b)
                .filter(|(x, y)| x == y)
                .count();
            return matching as f64 / parts_a.len() as f64;
        }
    }

    if let (Ok(x), Ok(y)) = (a.parse::<i64>(), b.parse::<i64>()) {
        return match x.abs_diff(y) {
            0 => 1.0,
            1 => 0.85,
            2 => 0.7,
            3..=5 => 0.5,
            _ => 0.3,
        };
    }

    UNKNOWN_CONTEXT_SCORE
}

/// Similarity of two position kinds: equal 1.0, one unknown 0.5, else 0.0.
pub fn type_similarity(a: Option<PositionKind>, b: Option<PositionKind>) -> f64 {
    if a == b {
        return 1.0;
    }
    match (a, b) {
        (Some(_), Some(_)) => 0.0,
        _ => UNKNOWN_KIND_SCORE,
    }
}

/// Weighted composite score of two positions.
pub fn composite(a: &Position, b: &Position, weights: &ScoreWeights) -> MatchScore {
    let text = text_similarity(&a.name, &b.name);
    let context = context_similarity(a.number.as_deref(), b.number.as_deref());
    let kind = type_similarity(a.kind, b.kind);
    let confidence = weights.text * text + weights.context * context + weights.kind * kind;

    MatchScore {
        confidence: confidence.clamp(0.0, 1.0),
        text,
        context,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PositionId, TenderId};
    use crate::domain::tender::PositionDraft;
    use proptest::prelude::*;

    fn position(number: &str, name: &str) -> Position {
        Position::from_draft(PositionId::new(), TenderId::new(), PositionDraft::new(number, name))
    }

    #[test]
    fn identical_names_score_one() {
        assert_eq!(text_similarity("Монтаж окон", "Монтаж окон"), 1.0);
    }

    #[test]
    fn comparison_ignores_case_and_surrounding_whitespace() {
        assert_eq!(text_similarity("  Монтаж ОКОН ", "монтаж окон"), 1.0);
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(text_similarity("abc", "xyz") < 0.5);
    }

    #[test]
    fn shared_long_prefix_gets_floor() {
        let a = "Устройство монолитных железобетонных перекрытий толщиной 200 мм";
        let b = "Устройство монолитных железобетонных стен";
        let score = text_similarity(a, b);
        assert!(score >= 0.7, "score was {}", score);
    }

    #[test]
    fn containment_scores_point_eight() {
        assert_eq!(text_similarity("Кладка", "Кладка кирпичная"), 0.8);
    }

    #[test]
    fn empty_name_against_non_empty_scores_zero() {
        assert_eq!(text_similarity("", "Кладка"), 0.0);
    }

    #[test]
    fn edit_similarity_counts_characters_not_bytes() {
        // one substitution in a five-letter Cyrillic word
        assert!((edit_similarity("стена", "стены") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn equal_numbers_score_one() {
        assert_eq!(context_similarity(Some("1.2"), Some("1.2")), 1.0);
    }

    #[test]
    fn adjacent_integers_score_high() {
        assert_eq!(context_similarity(Some("5"), Some("6")), 0.85);
        assert_eq!(context_similarity(Some("5"), Some("7")), 0.7);
        assert_eq!(context_similarity(Some("5"), Some("8")), 0.5);
        assert_eq!(context_similarity(Some("5"), Some("10")), 0.5);
        assert_eq!(context_similarity(Some("5"), Some("11")), 0.3);
    }

    #[test]
    fn dotted_numbers_score_by_matching_parts() {
        assert_eq!(context_similarity(Some("2.3"), Some("2.4")), 0.5);
        assert_eq!(context_similarity(Some("1.2.3"), Some("1.2.4")), 2.0 / 3.0);
    }

    #[test]
    fn dotted_numbers_of_different_depth_fall_back() {
        assert_eq!(context_similarity(Some("2.3"), Some("2.3.1")), 0.3);
    }

    #[test]
    fn missing_number_scores_low() {
        assert_eq!(context_similarity(None, Some("1")), 0.3);
        assert_eq!(context_similarity(Some("  "), Some("1")), 0.3);
    }

    #[test]
    fn numbers_are_compared_trimmed() {
        assert_eq!(context_similarity(Some(" 4 "), Some("4")), 1.0);
        assert_eq!(context_similarity(Some("2.3 "), Some(" 2.4")), 0.5);
    }

    #[test]
    fn type_similarity_cases() {
        use PositionKind::*;
        assert_eq!(type_similarity(Some(Executable), Some(Executable)), 1.0);
        assert_eq!(type_similarity(Some(Executable), None), 0.5);
        assert_eq!(type_similarity(Some(Executable), Some(Structural)), 0.0);
    }

    #[test]
    fn composite_uses_weights() {
        let a = position("1", "Фундамент");
        let b = position("1", "Фундамент");
        let score = composite(&a, &b, &ScoreWeights::default());
        assert!(score.confidence > 0.99);
        assert_eq!(score.text, 1.0);
        assert_eq!(score.context, 1.0);

        let text_only = ScoreWeights {
            text: 1.0,
            context: 0.0,
            kind: 0.0,
        };
        let c = position("9", "Фундамент");
        assert_eq!(composite(&a, &c, &text_only).confidence, 1.0);
    }

    #[test]
    fn composite_is_clamped_when_weights_exceed_one() {
        let heavy = ScoreWeights {
            text: 2.0,
            context: 2.0,
            kind: 2.0,
        };
        let a = position("1", "Кровля");
        assert_eq!(composite(&a, &a.clone(), &heavy).confidence, 1.0);
    }

    #[test]
    fn explain_lists_components() {
        let score = MatchScore {
            confidence: 0.5,
            text: 1.0,
            context: 0.85,
            kind: 0.5,
        };
        assert_eq!(score.explain(), "text 100%; context 85%; type 50%");
    }

    proptest! {
        #[test]
        fn text_similarity_is_bounded_and_symmetric(a in "\\PC{0,40}", b in "\\PC{0,40}") {
            let ab = text_similarity(&a, &b);
            let ba = text_similarity(&b, &a);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - ba).abs() < 1e-12);
        }

        #[test]
        fn context_similarity_is_bounded(a in "[0-9.]{0,8}", b in "[0-9.]{0,8}") {
            let score = context_similarity(Some(&a), Some(&b));
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
