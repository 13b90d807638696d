//! Price prediction model
//!
//! The trained network is served over HTTP using the TensorFlow Serving REST
//! contract:
//!
//! ```text
//! POST {MODEL_URL}
//! {"instances": [[[0.12], [0.13], ...], ...]}   one window per instance
//! -> {"predictions": [[0.14], ...]}             one scaled price per window
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Anything that turns scaled windows into scaled next-step prices
#[allow(async_fn_in_trait)] // Workers futures are !Send
pub trait PricePredictor {
    async fn predict(&self, windows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Remote model behind a TF-Serving style `:predict` endpoint
pub struct RemoteModel {
    url: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    /// Each window is `[timesteps][features]` with a single feature
    instances: Vec<Vec<[f64; 1]>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

/// Models exported with a trailing `Dense(1)` answer `[y]`, others plain `y`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Prediction {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Prediction {
    fn value(&self) -> Option<f64> {
        match self {
            Prediction::Scalar(v) => Some(*v),
            Prediction::Vector(v) => v.first().copied(),
        }
    }
}

impl RemoteModel {
    /// Fails when no model endpoint is configured
    pub fn new(url: Option<&str>) -> Result<Self> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DashboardError::Model("MODEL_URL is not configured".into()))?;
        Ok(Self {
            url: url.to_string(),
        })
    }
}

impl PricePredictor for RemoteModel {
    async fn predict(&self, windows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let request = encode_request(windows);

        let response = reqwest::Client::new()
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(DashboardError::Model(format!("HTTP {status}: {error_text}")));
        }

        let body: PredictResponse = response.json().await?;
        decode_response(body, windows.len())
    }
}

fn encode_request(windows: &[Vec<f64>]) -> PredictRequest {
    PredictRequest {
        instances: windows
            .iter()
            .map(|w| w.iter().map(|v| [*v]).collect())
            .collect(),
    }
}

fn decode_response(body: PredictResponse, expected: usize) -> Result<Vec<f64>> {
    if body.predictions.len() != expected {
        return Err(DashboardError::Model(format!(
            "expected {expected} predictions, got {}",
            body.predictions.len()
        )));
    }
    body.predictions
        .iter()
        .map(|p| {
            p.value()
                .ok_or_else(|| DashboardError::Model("empty prediction".into()))
        })
        .collect()
}
