//! Prediction screen pipeline
//!
//! Coordinates the market data source, the series math and the model, and
//! produces everything the page needs in one report. Any failure aborts the
//! whole report; the caller renders a failure indicator instead.

use crate::analysis::{self, MinMaxScaler, Windows};
use crate::chart::{BLUE, GREEN, LineChart, RED, Series};
use crate::client::MarketData;
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::model::PricePredictor;
use crate::types::PriceSeries;

/// Rolling mean windows drawn on the price charts
pub const MA_SHORT: usize = 50;
pub const MA_MEDIUM: usize = 100;
pub const MA_LONG: usize = 200;

/// Everything rendered on the prediction screen
#[derive(Debug, Clone)]
pub struct PredictionReport {
    pub series: PriceSeries,
    pub charts: Vec<LineChart>,
    /// Model output and targets back in price units
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
}

impl PredictionReport {
    /// Mean absolute error of the model over the test slice
    pub fn mean_absolute_error(&self) -> Option<f64> {
        if self.predicted.is_empty() {
            return None;
        }
        let total: f64 = self
            .predicted
            .iter()
            .zip(&self.actual)
            .map(|(p, a)| (p - a).abs())
            .sum();
        Some(total / self.predicted.len() as f64)
    }
}

/// Prediction screen engine
pub struct PredictionEngine<M, P> {
    market: M,
    model: P,
    config: Config,
}

impl<M: MarketData, P: PricePredictor> PredictionEngine<M, P> {
    /// Create new engine
    pub fn new(market: M, model: P, config: Config) -> Self {
        Self {
            market,
            model,
            config,
        }
    }

    /// Fetch, chart and predict one ticker
    pub async fn run(&self, ticker: &str) -> Result<PredictionReport> {
        let series = self
            .market
            .daily_bars(ticker, self.config.history_start, self.config.history_end)
            .await?;
        let closes = series.closes();

        let mut charts = moving_average_charts(&closes);

        let (train, test) = analysis::train_test_split(&closes, self.config.train_split);
        let input = analysis::model_input(train, test, self.config.window_size);
        let scaler = MinMaxScaler::fit(&input)?;
        let windows = Windows::build(&scaler.transform(&input), self.config.window_size)?;

        let scaled_predictions = self.model.predict(&windows.inputs).await?;
        if scaled_predictions.len() != windows.targets.len() {
            return Err(DashboardError::Model(format!(
                "expected {} predictions, got {}",
                windows.targets.len(),
                scaled_predictions.len()
            )));
        }
        let predicted = scaler.inverse(&scaled_predictions);
        let actual = scaler.inverse(&windows.targets);

        charts.push(
            LineChart::new(
                "Original Price vs Predicted Price",
                vec![
                    Series::dense("Original Price", GREEN, &actual),
                    Series::dense("Predicted Price", RED, &predicted),
                ],
            )
            .with_axes("Time", "Price"),
        );

        Ok(PredictionReport {
            series,
            charts,
            predicted,
            actual,
        })
    }
}

/// Price vs MA50, Price vs MA50 vs MA100, Price vs MA100 vs MA200
pub fn moving_average_charts(closes: &[f64]) -> Vec<LineChart> {
    let ma_short = analysis::rolling_mean(closes, MA_SHORT);
    let ma_medium = analysis::rolling_mean(closes, MA_MEDIUM);
    let ma_long = analysis::rolling_mean(closes, MA_LONG);
    let price = || Series::dense("Close", GREEN, closes);

    vec![
        LineChart::new(
            "Price vs MA50",
            vec![Series::new("MA50", RED, ma_short.clone()), price()],
        ),
        LineChart::new(
            "Price vs MA50 vs MA100",
            vec![
                Series::new("MA50", RED, ma_short),
                Series::new("MA100", BLUE, ma_medium.clone()),
                price(),
            ],
        ),
        LineChart::new(
            "Price vs MA100 vs MA200",
            vec![
                Series::new("MA100", RED, ma_medium),
                Series::new("MA200", BLUE, ma_long),
                price(),
            ],
        ),
    ]
}
