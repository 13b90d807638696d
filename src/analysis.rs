//! Price series math for the prediction screen
//!
//! Rolling means, the train/test split, min-max scaling and model windows.
//! Everything here is pure and works on plain `f64` slices.

use crate::error::{DashboardError, Result};

/// Mean of the trailing `window` points, `None` until the window fills
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Split at `floor(len * ratio)`; the first part trains, the rest tests
pub fn train_test_split(values: &[f64], ratio: f64) -> (&[f64], &[f64]) {
    let cut = ((values.len() as f64) * ratio).floor() as usize;
    values.split_at(cut.min(values.len()))
}

/// Test input for the model: the last `lookback` training points followed by
/// the whole test slice
pub fn model_input(train: &[f64], test: &[f64], lookback: usize) -> Vec<f64> {
    let tail = &train[train.len().saturating_sub(lookback)..];
    tail.iter().chain(test).copied().collect()
}

/// Min-max scaler onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    /// Fit to the observed extremes; a flat series scales by 1
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(DashboardError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max - min > 0.0 { max - min } else { 1.0 };
        Ok(Self { min, range })
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| (v - self.min) / self.range).collect()
    }

    pub fn inverse(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| v * self.range + self.min).collect()
    }
}

/// Model samples: each window holds `size` consecutive points, the target is
/// the point right after it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Windows {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Windows {
    pub fn build(values: &[f64], size: usize) -> Result<Self> {
        if size == 0 || values.len() <= size {
            return Err(DashboardError::InsufficientHistory {
                required: size,
                available: values.len(),
            });
        }
        let mut windows = Self::default();
        for i in size..values.len() {
            windows.inputs.push(values[i - size..i].to_vec());
            windows.targets.push(values[i]);
        }
        Ok(windows)
    }
}
