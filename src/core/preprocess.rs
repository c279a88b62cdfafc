use crate::core::artifacts::{ArtifactError, EncoderArtifact, HandleUnknown, PolynomialArtifact};
use crate::models::FeatureRecord;
use std::collections::HashMap;
use thiserror::Error;

/// Numeric input columns, in the order the inference form produces them
pub const NUMERIC_FEATURES: [&str; 6] = [
    "sqft_living",
    "no_of_bedrooms",
    "no_of_bathrooms",
    "sqft_lot",
    "no_of_floors",
    "house_age",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessError {
    #[error("unknown category '{value}' for feature '{feature}'")]
    UnknownCategory { feature: String, value: String },
}

/// One-hot encoder over a fixed list of categories
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    feature: String,
    categories: Vec<String>,
    index: HashMap<String, usize>,
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new(feature: impl Into<String>, categories: Vec<String>, handle_unknown: HandleUnknown) -> Self {
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.trim().to_string(), i))
            .collect();

        Self {
            feature: feature.into(),
            categories,
            index,
            handle_unknown,
        }
    }

    pub fn from_artifact(artifact: EncoderArtifact) -> Self {
        Self::new(artifact.feature, artifact.categories, artifact.handle_unknown)
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Output column names, `<feature>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.feature, c.trim()))
            .collect()
    }

    /// Position of the hot column for `value`.
    ///
    /// `Ok(None)` means the category is unknown and the encoder ignores
    /// unknowns, so every indicator stays zero.
    pub fn hot_index(&self, value: &str) -> Result<Option<usize>, PreprocessError> {
        match self.index.get(value.trim()) {
            Some(&i) => Ok(Some(i)),
            None => match self.handle_unknown {
                HandleUnknown::Ignore => Ok(None),
                HandleUnknown::Error => Err(PreprocessError::UnknownCategory {
                    feature: self.feature.clone(),
                    value: value.to_string(),
                }),
            },
        }
    }

    /// Indicator vector for `value`
    pub fn encode(&self, value: &str) -> Result<Vec<f64>, PreprocessError> {
        let mut out = vec![0.0; self.width()];
        if let Some(i) = self.hot_index(value)? {
            out[i] = 1.0;
        }
        Ok(out)
    }
}

/// Polynomial feature expansion in scikit-learn column order.
///
/// Terms are grouped by degree (bias first when enabled); within a degree the
/// index combinations are enumerated in lexicographic order, with replacement
/// unless `interaction_only` is set. For inputs `[a, b]` at degree 2 this
/// yields `[1, a, b, a², ab, b²]`.
#[derive(Debug, Clone)]
pub struct PolynomialFeatures {
    n_features_in: usize,
    terms: Vec<Vec<usize>>,
}

impl PolynomialFeatures {
    pub fn new(n_features_in: usize, degree: u32, interaction_only: bool, include_bias: bool) -> Self {
        let start = if include_bias { 0 } else { 1 };
        let mut terms = Vec::new();
        for d in start..=degree as usize {
            combinations(n_features_in, d, !interaction_only, &mut terms);
        }

        Self { n_features_in, terms }
    }

    pub fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    pub fn n_output_features(&self) -> usize {
        self.terms.len()
    }

    /// Expand one row. `row.len()` must equal `n_features_in`.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        debug_assert_eq!(row.len(), self.n_features_in, "row width mismatch");
        self.terms
            .iter()
            .map(|term| term.iter().map(|&i| row[i]).product())
            .collect()
    }
}

fn combinations(n: usize, k: usize, with_replacement: bool, out: &mut Vec<Vec<usize>>) {
    fn recurse(
        start: usize,
        n: usize,
        k: usize,
        with_replacement: bool,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            let next = if with_replacement { i } else { i + 1 };
            recurse(next, n, k, with_replacement, current, out);
            current.pop();
        }
    }

    let mut current = Vec::with_capacity(k);
    recurse(0, n, k, with_replacement, &mut current, out);
}

/// Source of one transformer input column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Numeric(usize),
    OneHot(usize),
}

/// Maps a [`FeatureRecord`] to the exact vector the model was trained on.
///
/// The column layout is taken from the transformer's recorded input feature
/// names, so the numeric columns and one-hot block are arranged exactly as
/// they were at training time.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    encoder: OneHotEncoder,
    poly: PolynomialFeatures,
    columns: Vec<Column>,
}

impl Preprocessor {
    pub fn new(encoder: OneHotEncoder, poly: PolynomialFeatures, input_features: &[String]) -> Result<Self, ArtifactError> {
        if input_features.len() != poly.n_features_in() {
            return Err(ArtifactError::Shape(format!(
                "transformer expects {} inputs but lists {} feature names",
                poly.n_features_in(),
                input_features.len()
            )));
        }

        let one_hot_names = encoder.feature_names();
        let mut columns = Vec::with_capacity(input_features.len());
        for name in input_features {
            let name = name.trim();
            let column = if let Some(i) = NUMERIC_FEATURES.iter().position(|f| *f == name) {
                Column::Numeric(i)
            } else if let Some(i) = one_hot_names.iter().position(|f| f == name) {
                Column::OneHot(i)
            } else {
                return Err(ArtifactError::Shape(format!(
                    "transformer input '{}' is neither a numeric feature nor a known {} category",
                    name,
                    encoder.feature()
                )));
            };

            if columns.contains(&column) {
                return Err(ArtifactError::Shape(format!("transformer input '{}' listed twice", name)));
            }
            columns.push(column);
        }

        // Every numeric feature and every known category must feed the transformer
        if let Some(missing) = NUMERIC_FEATURES
            .iter()
            .enumerate()
            .find(|(i, _)| !columns.contains(&Column::Numeric(*i)))
            .map(|(_, name)| name.to_string())
            .or_else(|| {
                (0..encoder.width())
                    .find(|i| !columns.contains(&Column::OneHot(*i)))
                    .map(|i| one_hot_names[i].clone())
            })
        {
            return Err(ArtifactError::Shape(format!("transformer inputs are missing '{}'", missing)));
        }

        Ok(Self { encoder, poly, columns })
    }

    pub fn from_artifacts(encoder: EncoderArtifact, poly: PolynomialArtifact) -> Result<Self, ArtifactError> {
        if poly.degree == 0 {
            return Err(ArtifactError::Shape("polynomial degree must be at least 1".to_string()));
        }

        let transformer = PolynomialFeatures::new(
            poly.input_features.len(),
            poly.degree,
            poly.interaction_only,
            poly.include_bias,
        );

        Self::new(OneHotEncoder::from_artifact(encoder), transformer, &poly.input_features)
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn polynomial(&self) -> &PolynomialFeatures {
        &self.poly
    }

    pub fn output_width(&self) -> usize {
        self.poly.n_output_features()
    }

    /// Transformer input row, before polynomial expansion
    pub fn base_row(&self, record: &FeatureRecord) -> Result<Vec<f64>, PreprocessError> {
        let numeric = [
            record.sqft_living,
            f64::from(record.bedrooms),
            record.bathrooms,
            record.sqft_lot,
            f64::from(record.floors),
            f64::from(record.house_age),
        ];
        let hot = self.encoder.hot_index(&record.zipcode)?;

        let row = self
            .columns
            .iter()
            .map(|column| match *column {
                Column::Numeric(i) => numeric[i],
                Column::OneHot(i) if hot == Some(i) => 1.0,
                Column::OneHot(_) => 0.0,
            })
            .collect();

        Ok(row)
    }

    /// Full model input: base row followed by polynomial expansion
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, PreprocessError> {
        let row = self.base_row(record)?;
        Ok(self.poly.transform(&row))
    }
}
