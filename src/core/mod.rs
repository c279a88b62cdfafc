// Core pipeline exports
pub mod artifacts;
pub mod model;
pub mod predictor;
pub mod preprocess;
pub mod recommend;
pub mod search;

pub use artifacts::{ArtifactError, ArtifactPaths, HandleUnknown, TargetTransform};
pub use model::{LinearRegression, ModelError, Regressor};
pub use predictor::{IntervalPolicy, Predictor, Z_95};
pub use preprocess::{OneHotEncoder, PolynomialFeatures, Preprocessor, PreprocessError, NUMERIC_FEATURES};
pub use recommend::{recommend, evaluate_rule, Condition, ConditionError};
pub use search::listings_search_url;
