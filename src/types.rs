//! Common types for the dashboard
//!
//! All shared data structures used across modules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A blog post, either submitted by a user or predefined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub link: String,
}

/// One daily OHLC bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Ordered daily bars for one ticker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// API response for the session endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub logged_in: bool,
    pub user: Option<String>,
    pub menu: Vec<String>,
    pub blog_posts: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub timestamp: String,
}
