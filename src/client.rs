//! Market data client
//!
//! Daily OHLC bars from the Yahoo Finance v8 chart API:
//! `GET {base}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d`
//!
//! The prediction screen only sees the `MarketData` trait, so the provider
//! can be swapped (or faked in tests) without touching the pipeline.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::error::{DashboardError, Result};
use crate::types::{Bar, PriceSeries};

/// Source of daily bars for a ticker
#[allow(async_fn_in_trait)] // Workers futures are !Send
pub trait MarketData {
    /// Bars from `start` (inclusive) to `end` (exclusive), oldest first
    async fn daily_bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

/// Yahoo Finance chart API client
pub struct YahooClient {
    base_url: String,
}

/// Top-level chart response
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Vec<Quote>,
}

/// Column-oriented OHLC values; holidays and halts come back as `null`
#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn chart_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            unix_midnight(start),
            unix_midnight(end),
        )
    }

    /// Handle API response, checking for errors
    async fn handle_response(ticker: &str, response: reqwest::Response) -> Result<ChartResponse> {
        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("a few")
                .to_string();
            return Err(DashboardError::MarketData(format!(
                "rate limited, retry after {retry_after} seconds"
            )));
        }

        // Unknown symbols come back as 404 with a chart.error body
        let text = response.text().await?;
        match serde_json::from_str::<ChartResponse>(&text) {
            Ok(chart) => Ok(chart),
            Err(_) if !status.is_success() => Err(DashboardError::MarketData(format!(
                "HTTP {status} for {ticker}: {text}"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl MarketData for YahooClient {
    async fn daily_bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        validate_ticker(ticker)?;
        let url = self.chart_url(ticker, start, end);

        let response = reqwest::Client::new()
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", concat!("stock-sage/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let chart = Self::handle_response(ticker, response).await?;
        parse_chart(ticker, chart)
    }
}

/// Reject symbols that could not be a ticker before hitting the network
pub fn validate_ticker(ticker: &str) -> Result<()> {
    let well_formed = !ticker.is_empty()
        && ticker.len() <= 12
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if well_formed {
        Ok(())
    } else {
        Err(DashboardError::MarketData(format!("malformed ticker: {ticker:?}")))
    }
}

/// Turn a chart response into bars, dropping rows with any missing value
pub fn parse_chart(ticker: &str, response: ChartResponse) -> Result<PriceSeries> {
    if let Some(error) = response.chart.error {
        return Err(DashboardError::MarketData(format!(
            "{ticker}: {} ({})",
            error.description, error.code
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DashboardError::MarketData(format!("no data for {ticker}")))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
        });
    }

    if bars.is_empty() {
        return Err(DashboardError::MarketData(format!(
            "no price data for {ticker}, symbol may be delisted"
        )));
    }

    Ok(PriceSeries {
        ticker: ticker.to_string(),
        bars,
    })
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_OK: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "GOOG", "currency": "USD"},
                "timestamp": [1672756200, 1672842600, 1672929000],
                "indicators": {"quote": [{
                    "open":  [89.83, 91.01, null],
                    "high":  [91.55, 91.24, 90.00],
                    "low":   [89.02, 87.80, 86.50],
                    "close": [89.70, 88.71, 86.77],
                    "volume": [20738500, 27046500, 23000000]
                }]}
            }],
            "error": null
        }
    }"#;

    const CHART_NOT_FOUND: &str = r#"{
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    }"#;

    #[test]
    fn test_parse_chart_skips_incomplete_rows() {
        let response: ChartResponse = serde_json::from_str(CHART_OK).expect("fixture should parse");
        let series = parse_chart("GOOG", response).expect("series should build");

        assert_eq!(series.ticker, "GOOG");
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[0].date, NaiveDate::from_ymd_opt(2023, 1, 3).expect("valid date"));
        assert!((series.bars[1].close - 88.71).abs() < 1e-9);
    }

    #[test]
    fn test_parse_chart_unknown_symbol() {
        let response: ChartResponse =
            serde_json::from_str(CHART_NOT_FOUND).expect("fixture should parse");
        let err = parse_chart("NOPE", response).unwrap_err();
        assert!(matches!(err, DashboardError::MarketData(ref m) if m.contains("delisted")));
    }

    #[test]
    fn test_validate_ticker() {
        for ok in ["GOOG", "BRK-B", "^GSPC", "EURUSD=X", "RELIANCE.NS"] {
            assert!(validate_ticker(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", "GO OG", "<script>", "A/B", "THIS-IS-FAR-TOO-LONG"] {
            assert!(validate_ticker(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_chart_url() {
        let client = YahooClient::new("https://query1.finance.yahoo.com");
        let url = client.chart_url(
            "GOOG",
            NaiveDate::from_ymd_opt(2012, 1, 1).expect("valid date"),
            NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date"),
        );
        assert!(url.starts_with("https://query1.finance.yahoo.com/v8/finance/chart/GOOG?"));
        assert!(url.contains("period1=1325376000"));
        assert!(url.contains("period2=1703980800"));
        assert!(url.contains("interval=1d"));
    }
}
