use chrono::{DateTime, SubsecRound, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why the user is asking for an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Buy,
    Sell,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Buy => "buy",
            Purpose::Sell => "sell",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown purpose '{0}', expected 'buy' or 'sell'")]
pub struct ParsePurposeError(pub String);

impl FromStr for Purpose {
    type Err = ParsePurposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Purpose::Buy),
            "sell" => Ok(Purpose::Sell),
            _ => Err(ParsePurposeError(s.to_string())),
        }
    }
}

// Same case-insensitive parsing for JSON, forms and stored rows
impl<'de> Deserialize<'de> for Purpose {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// House attributes submitted for an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub sqft_living: f64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub sqft_lot: f64,
    pub floors: u32,
    pub house_age: u32,
    pub zipcode: String,
    pub purpose: Purpose,
}

impl FeatureRecord {
    /// Look up a numeric feature by name.
    ///
    /// Accepts both the short names and the `no_of_*` form field names.
    /// Returns `None` for `zipcode` (categorical) and for unknown names.
    pub fn numeric_value(&self, name: &str) -> Option<f64> {
        match name.trim() {
            "sqft_living" => Some(self.sqft_living),
            "bedrooms" | "no_of_bedrooms" => Some(f64::from(self.bedrooms)),
            "bathrooms" | "no_of_bathrooms" => Some(self.bathrooms),
            "sqft_lot" | "lot" => Some(self.sqft_lot),
            "floors" | "no_of_floors" => Some(f64::from(self.floors)),
            "house_age" | "age" => Some(f64::from(self.house_age)),
            _ => None,
        }
    }
}

/// Price estimate with its confidence band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub price: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
}

impl PredictionResult {
    pub fn interval(&self) -> [f64; 2] {
        [self.confidence_low, self.confidence_high]
    }
}

/// Comparison operator used in recommendation conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl Comparator {
    #[inline]
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Eq => value == threshold,
            Comparator::Ne => value != threshold,
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
        }
    }
}

/// A stored recommendation rule.
///
/// `condition` is kept as the raw stored text (e.g. `"< 1000"`) and parsed
/// when the rule is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub id: i64,
    pub purpose: Purpose,
    pub feature: String,
    pub condition: String,
    pub suggestion: String,
}

/// One logged prediction, before it has been assigned a row id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub features: FeatureRecord,
    pub predicted_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl QueryLogEntry {
    /// Build an entry stamped with the current time, truncated to the second
    pub fn now(features: FeatureRecord, predicted_price: f64) -> Self {
        Self::at(features, predicted_price, Utc::now())
    }

    pub fn at(features: FeatureRecord, predicted_price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            features,
            predicted_price,
            timestamp: timestamp.trunc_subsecs(0),
        }
    }

    pub fn purpose(&self) -> Purpose {
        self.features.purpose
    }
}

/// A query log row as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuery {
    pub id: i64,
    pub sqft_living: f64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub sqft_lot: f64,
    pub floors: u32,
    pub house_age: u32,
    pub zipcode: String,
    pub purpose: Purpose,
    pub predicted_price: f64,
    pub timestamp: DateTime<Utc>,
}
