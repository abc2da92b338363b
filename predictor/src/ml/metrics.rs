//! Evaluation metrics

use crate::error::{PredictorError, PredictorResult};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of determination
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> PredictorResult<f64> {
    check_lengths(y_true.len(), y_pred.len())?;

    let m = mean(y_true);
    let ss_tot: f64 = y_true.iter().map(|y| (y - m).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Fraction of exactly matching labels
pub fn accuracy<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> PredictorResult<f64> {
    check_lengths(y_true.len(), y_pred.len())?;
    let hits = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    Ok(hits as f64 / y_true.len() as f64)
}

fn check_lengths(truth: usize, predicted: usize) -> PredictorResult<()> {
    if truth == 0 {
        return Err(PredictorError::InvalidInput(
            "Cannot score an empty sample".to_string(),
        ));
    }
    if truth != predicted {
        return Err(PredictorError::InvalidInput(format!(
            "Expected {} predictions, got {}",
            truth, predicted
        )));
    }
    Ok(())
}
