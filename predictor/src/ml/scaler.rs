//! Per-column standardisation

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};

/// Centres each column on its training mean and scales it to unit variance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learn column statistics from training rows only
    pub fn fit(x: ArrayView2<f64>) -> PredictorResult<Self> {
        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            PredictorError::InvalidInput("Cannot fit a scaler on zero rows".to_string())
        })?;
        // Constant columns keep their spread so transform never divides by zero
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> ArrayView1<f64> {
        self.mean.view()
    }

    pub fn scale(&self) -> ArrayView1<f64> {
        self.scale.view()
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> PredictorResult<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PredictorError::InvalidInput(format!(
                "Scaler was fitted on {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok((&x - &self.mean) / &self.scale)
    }
}
