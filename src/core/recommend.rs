use crate::models::{Comparator, FeatureRecord, Purpose, RecommendationRule};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("condition '{0}' has no comparison operator")]
    MissingOperator(String),

    #[error("condition '{0}' has a non-numeric threshold")]
    InvalidThreshold(String),
}

/// A parsed rule condition such as `"< 1000"` or `">= 3"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub comparator: Comparator,
    pub threshold: f64,
}

// Two-character operators first so "<=" is not read as "<"
const OPERATORS: [(&str, Comparator); 7] = [
    ("<=", Comparator::Le),
    (">=", Comparator::Ge),
    ("!=", Comparator::Ne),
    ("==", Comparator::Eq),
    ("<", Comparator::Lt),
    (">", Comparator::Gt),
    ("=", Comparator::Eq),
];

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (comparator, rest) = OPERATORS
            .iter()
            .find_map(|(op, cmp)| trimmed.strip_prefix(op).map(|rest| (*cmp, rest)))
            .ok_or_else(|| ConditionError::MissingOperator(s.to_string()))?;

        let threshold = rest
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| ConditionError::InvalidThreshold(s.to_string()))?;

        Ok(Self { comparator, threshold })
    }
}

impl Condition {
    #[inline]
    pub fn matches(&self, value: f64) -> bool {
        self.comparator.holds(value, self.threshold)
    }
}

/// Evaluate one rule against a record.
///
/// Returns `None` when the rule cannot be evaluated: the feature is not
/// numeric (e.g. `zipcode`) or the stored condition does not parse.
pub fn evaluate_rule(rule: &RecommendationRule, features: &FeatureRecord) -> Option<bool> {
    let Some(value) = features.numeric_value(&rule.feature) else {
        tracing::debug!("Skipping rule {}: '{}' is not a numeric feature", rule.id, rule.feature);
        return None;
    };

    match rule.condition.parse::<Condition>() {
        Ok(condition) => Some(condition.matches(value)),
        Err(e) => {
            tracing::warn!("Skipping rule {}: {}", rule.id, e);
            None
        }
    }
}

/// Collect the suggestions of every rule for `purpose` that matches.
///
/// Rules are visited in the given (storage) order and all matches are kept.
pub fn recommend(purpose: Purpose, features: &FeatureRecord, rules: &[RecommendationRule]) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.purpose == purpose)
        .filter(|rule| evaluate_rule(rule, features) == Some(true))
        .map(|rule| rule.suggestion.clone())
        .collect()
}
