//! Configuration management for the dashboard

use chrono::NaiveDate;
use worker::Env;

use crate::error::{DashboardError, Result};

const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_BACKGROUND_IMAGE_URL: &str = "https://st4.depositphotos.com/12659858/23908/i/450/depositphotos_239087274-stock-photo-rendering-stock-indexes-virtual-space.jpg";

/// KV refuses expirations shorter than a minute
const MIN_SESSION_TTL_SECONDS: u64 = 60;

/// Who shares a login table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// Every browser session owns its own table, seeded on first visit
    PerSession,
    /// One table for every visitor of the deployment
    Global,
}

impl SessionScope {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "session" | "per-session" | "per_session" => Some(SessionScope::PerSession),
            "global" | "shared" => Some(SessionScope::Global),
            _ => None,
        }
    }
}

/// Log verbosity for the Workers console
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment (production, staging, development)
    pub environment: String,

    /// Log level
    pub log_level: LogLevel,

    /// Session handling
    pub session_scope: SessionScope,
    pub session_ttl_seconds: u64,

    /// Collaborators
    pub market_data_url: String,
    pub model_url: Option<String>,

    /// Prediction screen
    pub default_ticker: String,
    pub history_start: NaiveDate,
    pub history_end: NaiveDate,
    pub train_split: f64,
    pub window_size: usize,

    /// Shown behind the login and register screens
    pub background_image_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from Cloudflare environment variables
    pub fn from_env(env: &Env) -> Result<Self> {
        let config = Self::from_lookup(|key| {
            env.var(key)
                .map(|v| v.to_string())
                .or_else(|_| env.secret(key).map(|v| v.to_string()))
                .ok()
        });
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let history_start = lookup("HISTORY_START")
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
            .unwrap_or_else(|| ymd(2012, 1, 1));
        let history_end = lookup("HISTORY_END")
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
            .unwrap_or_else(|| ymd(2023, 12, 31));

        Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "production".to_string()),

            log_level: lookup("LOG_LEVEL")
                .map(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),

            session_scope: lookup("SESSION_SCOPE")
                .and_then(|v| SessionScope::parse(&v))
                .unwrap_or(SessionScope::PerSession),

            session_ttl_seconds: lookup("SESSION_TTL_SECONDS")
                .map(|v| v.trim().parse().unwrap_or(86_400))
                .unwrap_or(86_400)
                .max(MIN_SESSION_TTL_SECONDS),

            market_data_url: lookup("MARKET_DATA_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_MARKET_DATA_URL.to_string()),

            model_url: lookup("MODEL_URL").filter(|v| !v.trim().is_empty()),

            default_ticker: lookup("DEFAULT_TICKER")
                .map(|v| v.trim().to_uppercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "GOOG".to_string()),

            history_start,
            history_end,

            train_split: lookup("TRAIN_SPLIT")
                .map(|v| v.trim().parse().unwrap_or(0.80))
                .unwrap_or(0.80),

            window_size: lookup("WINDOW_SIZE")
                .map(|v| v.trim().parse().unwrap_or(100))
                .unwrap_or(100),

            background_image_url: lookup("BACKGROUND_IMAGE_URL")
                .unwrap_or_else(|| DEFAULT_BACKGROUND_IMAGE_URL.to_string()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_start >= self.history_end {
            return Err(DashboardError::Config("HISTORY_START must be before HISTORY_END".into()));
        }
        if !(self.train_split > 0.0 && self.train_split < 1.0) {
            return Err(DashboardError::Config("TRAIN_SPLIT must be between 0 and 1".into()));
        }
        if self.window_size == 0 {
            return Err(DashboardError::Config("WINDOW_SIZE must be positive".into()));
        }
        if !self.market_data_url.starts_with("http") {
            return Err(DashboardError::Config("MARKET_DATA_URL must be an http(s) URL".into()));
        }
        Ok(())
    }

    /// Whether messages at `level` should reach the console
    pub fn logs(&self, level: LogLevel) -> bool {
        level >= self.log_level
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
