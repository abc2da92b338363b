//! Tabular learning primitives
//!
//! Small, serializable implementations of the estimators the crop models
//! need: a standard scaler, CART trees, a bagged forest, seeded splits and
//! evaluation metrics.

pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod split;
pub mod tree;

pub use forest::{ForestParams, RandomForestRegressor};
pub use metrics::{accuracy, r2_score};
pub use scaler::StandardScaler;
pub use split::{stratified_split, train_test_split, SplitIndices};
pub use tree::{DecisionTreeClassifier, DecisionTreeRegressor, TreeParams};

use ndarray::ArrayView1;

/// Point estimate plus dispersion of independent sub-estimates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub estimates: usize,
}

impl Spread {
    pub fn from_estimates(estimates: &[f64]) -> Option<Self> {
        if estimates.is_empty() {
            return None;
        }
        Some(Self {
            mean: metrics::mean(estimates),
            std_dev: metrics::std_dev(estimates),
            estimates: estimates.len(),
        })
    }
}

/// Models whose prediction aggregates several independent sub-models
///
/// Any implementor can back a disagreement-based confidence score; models
/// that cannot expose their members return `None`.
pub trait SubEstimates {
    fn sub_estimates(&self, row: ArrayView1<f64>) -> Option<Vec<f64>>;

    fn spread(&self, row: ArrayView1<f64>) -> Option<Spread> {
        self.sub_estimates(row)
            .and_then(|estimates| Spread::from_estimates(&estimates))
    }
}
