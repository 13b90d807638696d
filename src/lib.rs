//! Stock Sage Worker - stock prediction dashboard for Cloudflare Workers
//!
//! Server-rendered dashboard: log in, view price history with moving averages
//! and model predictions, write short blog posts.
//!
//! # Architecture
//! - Main entry point maps HTTP requests onto dashboard actions
//! - KV storage for per-visitor sessions (and the shared user table in global scope)
//! - Yahoo chart API for daily bars, remote model endpoint for predictions
//!
//! # Features
//! - Login / register with salted password hashes
//! - Price table, MA50/MA100/MA200 charts, predicted vs actual chart
//! - Blog feed: user posts followed by predefined posts

// Clippy configuration
#![allow(clippy::cast_precision_loss)] // Float casts OK for display
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)] // Page templates
#![allow(clippy::doc_markdown)] // Doc style flexibility
#![allow(clippy::needless_pass_by_value)] // Worker framework patterns
#![allow(clippy::map_unwrap_or)] // Explicit error handling preference

mod analysis;
mod app;
mod auth;
mod blog;
mod chart;
mod client;
mod config;
mod dashboard;
mod error;
mod model;
mod prediction;
mod router;
mod session;
mod store;
mod types;

use worker::{
    Context, Env, FormData, FormEntry, Request, Response, Router, console_error, console_log,
    console_warn, event,
};

pub use client::{MarketData, YahooClient};
pub use config::{Config, LogLevel, SessionScope};
pub use error::DashboardError;
pub use model::{PricePredictor, RemoteModel};
pub use prediction::{PredictionEngine, PredictionReport};
pub use router::{Action, MenuItem, Page};
pub use session::{KvBackend, MemoryBackend, SessionBackend};
pub use types::*;

/// Result type alias for worker operations
type WResult<T> = std::result::Result<T, worker::Error>;

const SESSIONS_BINDING: &str = "SESSIONS";

/// Main Worker entry point
#[event(fetch)]
async fn fetch(req: Request, env: Env, _ctx: Context) -> WResult<Response> {
    console_error_panic_hook::set_once();

    let router = Router::new();

    router
        // Health check
        .get_async("/health", |_req, ctx| async move {
            let config = match Config::from_env(&ctx.env) {
                Ok(c) => c,
                Err(e) => return Response::error(format!("Config error: {e}"), 500),
            };

            Response::from_json(&HealthResponse {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment: config.environment,
                timestamp: chrono::Utc::now().to_rfc3339(),
            })
        })
        // Dashboard UI
        .get_async("/", |req, ctx| async move {
            let action = query_action(&req)?;
            respond(&req, &ctx.env, action).await
        })
        .get_async("/dashboard", |req, ctx| async move {
            let action = query_action(&req)?;
            respond(&req, &ctx.env, action).await
        })
        // Form posts
        .post_async("/login", |mut req, ctx| async move {
            let form = req.form_data().await?;
            let action = Action::Login {
                username: field(&form, "username"),
                password: field(&form, "password"),
            };
            respond(&req, &ctx.env, action).await
        })
        .post_async("/register", |mut req, ctx| async move {
            let form = req.form_data().await?;
            let action = Action::Register {
                username: field(&form, "username"),
                password: field(&form, "password"),
            };
            respond(&req, &ctx.env, action).await
        })
        .post_async("/blog", |mut req, ctx| async move {
            let form = req.form_data().await?;
            let action = Action::SubmitBlog {
                title: field(&form, "title"),
                content: field(&form, "content"),
                image_url: field(&form, "image_url"),
                link: field(&form, "link"),
            };
            respond(&req, &ctx.env, action).await
        })
        .post_async("/logout", |req, ctx| async move {
            respond(&req, &ctx.env, Action::Logout).await
        })
        // Session summary (raw data)
        .get_async("/api/session", |req, ctx| async move {
            let config = match Config::from_env(&ctx.env) {
                Ok(c) => c,
                Err(e) => return Response::error(format!("Config error: {e}"), 500),
            };
            let backend = KvBackend::new(ctx.env.kv(SESSIONS_BINDING)?, config.session_ttl_seconds);
            let session_id = cookie_session_id(&req)?;

            match app::summary(&backend, session_id.as_deref()).await {
                Ok(summary) => Response::from_json(&summary),
                Err(e) => Response::from_json(&serde_json::json!({
                    "error": format!("{e}")
                })),
            }
        })
        // Fallback
        .run(req, env)
        .await
}

/// Run one dashboard action and render the page
async fn respond(req: &Request, env: &Env, action: Action) -> WResult<Response> {
    let config = match Config::from_env(env) {
        Ok(c) => c,
        Err(e) => return Response::error(format!("Config error: {e}"), 500),
    };

    let backend = KvBackend::new(env.kv(SESSIONS_BINDING)?, config.session_ttl_seconds);
    let session_id = cookie_session_id(req)?;
    let kind = action.kind();

    let engine = RemoteModel::new(config.model_url.as_deref()).map(|model| {
        PredictionEngine::new(
            YahooClient::new(config.market_data_url.clone()),
            model,
            config.clone(),
        )
    });

    let rendered = match app::handle(&backend, &config, session_id, action, engine).await {
        Ok(r) => r,
        Err(e) => {
            if config.logs(LogLevel::Error) {
                console_error!("Request failed ({}): {}", kind, e);
            }
            return Response::error(e.user_message(), 500);
        }
    };

    if config.logs(LogLevel::Debug) {
        console_log!(
            "{} -> {:?} (new session: {})",
            kind,
            rendered.outcome.page.menu_item(),
            rendered.new_session
        );
    }
    if let Some(router::Notice::Error(msg)) = &rendered.outcome.notice {
        if config.logs(LogLevel::Info) {
            console_log!("{} rejected: {}", kind, msg);
        }
    }
    if let Some(e) = &rendered.prediction_error {
        if config.logs(LogLevel::Warn) {
            console_warn!("Prediction failed: {}", e);
        }
    }

    let secure = req.url()?.scheme() == "https";
    let mut response = Response::from_html(rendered.html)?;
    let headers = response.headers_mut();
    headers.set("Cache-Control", "no-store")?;
    if rendered.new_session {
        headers.set(
            "Set-Cookie",
            &session::session_cookie(&rendered.session_id, secure),
        )?;
    }
    Ok(response)
}

/// Action for a plain GET of the dashboard
fn query_action(req: &Request) -> WResult<Action> {
    let url = req.url()?;
    let mut page = None;
    let mut ticker = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "page" => page = Some(value.into_owned()),
            "ticker" => ticker = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(app::action_from_query(page.as_deref(), ticker.as_deref()))
}

fn cookie_session_id(req: &Request) -> WResult<Option<String>> {
    Ok(req
        .headers()
        .get("Cookie")?
        .as_deref()
        .and_then(session::session_id_from_cookie))
}

/// Text field from a submitted form; missing fields read as empty
fn field(form: &FormData, name: &str) -> String {
    match form.get(name) {
        Some(FormEntry::Field(value)) => value,
        _ => String::new(),
    }
}
