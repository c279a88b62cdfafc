use crate::models::domain::{FeatureRecord, Purpose};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

/// Request for a price estimate.
///
/// Accepted as JSON or as an urlencoded form. Field names follow the form
/// (`no_of_bedrooms`, ...); missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(range(min = 1.0, max = 100000.0, message = "sqft_living must be between 1 and 100,000"))]
    #[serde(default = "default_sqft_living")]
    pub sqft_living: f64,
    #[validate(range(max = 50, message = "no_of_bedrooms cannot exceed 50"))]
    #[serde(default = "default_bedrooms")]
    pub no_of_bedrooms: u32,
    #[validate(range(min = 0.0, max = 50.0, message = "no_of_bathrooms must be between 0 and 50"))]
    #[serde(default = "default_bathrooms")]
    pub no_of_bathrooms: f64,
    #[validate(range(min = 0.0, max = 2000000.0, message = "sqft_lot must be between 0 and 2,000,000"))]
    #[serde(default = "default_sqft_lot")]
    pub sqft_lot: f64,
    #[validate(range(max = 20, message = "no_of_floors cannot exceed 20"))]
    #[serde(default = "default_floors")]
    pub no_of_floors: u32,
    #[validate(range(max = 500, message = "house_age cannot exceed 500"))]
    #[serde(default = "default_house_age")]
    pub house_age: u32,
    #[validate(length(min = 1, message = "zipcode is required"))]
    #[serde(default = "default_zipcode", deserialize_with = "string_or_number")]
    pub zipcode: String,
    #[serde(default = "default_purpose")]
    pub purpose: Purpose,
}

fn default_sqft_living() -> f64 { 1500.0 }
fn default_bedrooms() -> u32 { 3 }
fn default_bathrooms() -> f64 { 2.0 }
fn default_sqft_lot() -> f64 { 5000.0 }
fn default_floors() -> u32 { 1 }
fn default_house_age() -> u32 { 20 }
fn default_zipcode() -> String { "98001".to_string() }
fn default_purpose() -> Purpose { Purpose::Buy }

/// Rejections raised while turning a request into a feature record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Please enter valid numerical values for all fields ({0} is not a number).")]
    NonFinite(&'static str),

    #[error("Invalid zipcode. It should be between {min} and {max}.")]
    ZipcodeOutOfRange { min: u32, max: u32 },
}

impl PredictRequest {
    /// Check the fields `validator` cannot express and build a feature record.
    ///
    /// `zip_range` is inclusive on both ends.
    pub fn into_features(self, zip_range: (u32, u32)) -> Result<FeatureRecord, RequestError> {
        for (name, value) in [
            ("sqft_living", self.sqft_living),
            ("no_of_bathrooms", self.no_of_bathrooms),
            ("sqft_lot", self.sqft_lot),
        ] {
            if !value.is_finite() {
                return Err(RequestError::NonFinite(name));
            }
        }

        let (min, max) = zip_range;
        // Stored and encoded in canonical five-digit form, so "+98052" and
        // "098052" become "98052"
        let zipcode = match self.zipcode.trim().parse::<u32>() {
            Ok(zip) if (min..=max).contains(&zip) => format!("{:05}", zip),
            _ => return Err(RequestError::ZipcodeOutOfRange { min, max }),
        };

        Ok(FeatureRecord {
            sqft_living: self.sqft_living,
            bedrooms: self.no_of_bedrooms,
            bathrooms: self.no_of_bathrooms,
            sqft_lot: self.sqft_lot,
            floors: self.no_of_floors,
            house_age: self.house_age,
            zipcode,
            purpose: self.purpose,
        })
    }
}

/// ZIP codes arrive as strings from forms and often as integers from JSON
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct ZipVisitor;

    impl<'de> de::Visitor<'de> for ZipVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a zipcode as a string or an integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(ZipVisitor)
}
