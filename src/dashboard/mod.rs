//! Dashboard module - server-rendered pages
//!
//! Every request renders one complete HTML page: sidebar menu, the active
//! screen, and (when logged in) the blog feed.
//!
//! # Architecture
//! - `html.rs`: screen fragments (forms, report, feed)
//! - `css.rs`: styling with CSS custom properties
//! - `js.rs`: sidebar auto-submit and submit-button feedback

mod css;
mod html;
mod js;

use crate::config::Config;
use crate::error::DashboardError;
use crate::prediction::PredictionReport;
use crate::router::{AuthState, Outcome, Page};
use crate::store::SessionState;

/// What the prediction screen produced, if it ran
pub enum PredictionView<'a> {
    Report(&'a PredictionReport),
    Failed(&'a DashboardError),
}

/// Generate the complete dashboard HTML page
pub fn render_page(
    session: &SessionState,
    outcome: &Outcome,
    prediction: Option<PredictionView<'_>>,
    config: &Config,
) -> String {
    let state = AuthState::of(session);

    let screen = match &outcome.page {
        Page::Login => html::login_form(outcome.notice.as_ref()),
        Page::Register => html::register_form(outcome.notice.as_ref()),
        Page::StockPrediction { ticker } => html::prediction_screen(ticker, prediction),
        Page::WriteBlog => html::blog_form(outcome.notice.as_ref()),
    };

    let feed = if state == AuthState::Authenticated {
        html::blog_feed(&session.blog_posts)
    } else {
        String::new()
    };

    let background = if state == AuthState::Anonymous {
        format!(
            ".app {{ background: url({url}); background-size: cover; }}",
            url = escape_html(&config.background_image_url)
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Stock Sage</title>
    <style>
{css}
{background}
    </style>
</head>
<body>
<div class="app">
{sidebar}
    <main class="container">
{screen}
{feed}
    </main>
</div>
    <script>
{js}
    </script>
</body>
</html>"#,
        css = css::STYLES,
        sidebar = html::sidebar(state, outcome.page.menu_item(), session.current_user.as_deref()),
        js = js::SCRIPT
    )
}

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
