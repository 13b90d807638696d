//! Dashboard HTML fragments
//!
//! Contains the building blocks of each page:
//! - Sidebar with the page menu
//! - Login, register and write-blog forms
//! - Prediction screen with data table and charts
//! - Blog feed (user posts, then predefined posts)

use std::fmt::Write;

use super::PredictionView;
use super::escape_html as esc;
use crate::blog::{self, Origin};
use crate::router::{AuthState, MenuItem, Notice};
use crate::types::BlogPost;

pub fn sidebar(state: AuthState, selected: MenuItem, user: Option<&str>) -> String {
    let options: String = state
        .menu()
        .iter()
        .map(|item| {
            let marker = if *item == selected { " selected" } else { "" };
            format!(
                r#"<option value="{slug}"{marker}>{label}</option>"#,
                slug = item.slug(),
                label = item.label()
            )
        })
        .collect();

    let who = user
        .map(|u| format!(r#"<div class="who">Signed in as <strong>{}</strong></div>"#, esc(u)))
        .unwrap_or_default();

    format!(
        r#"
    <aside class="sidebar">
        <div class="brand">📈 Stock Sage</div>
        {who}
        <form method="get" action="/" id="menuForm">
            <label for="page">Choose a page</label>
            <select name="page" id="page">{options}</select>
            <noscript><button type="submit" class="btn btn-secondary">Go</button></noscript>
        </form>
    </aside>"#
    )
}

fn notice(notice: Option<&Notice>) -> String {
    match notice {
        Some(Notice::Success(msg)) => format!(r#"<div class="notice success">{}</div>"#, esc(msg)),
        Some(Notice::Error(msg)) => format!(r#"<div class="notice error">{}</div>"#, esc(msg)),
        None => String::new(),
    }
}

pub fn login_form(note: Option<&Notice>) -> String {
    format!(
        r#"
        <section class="card narrow">
            <h1>Login</h1>
            <form method="post" action="/login">
                <label for="username">Username</label>
                <input type="text" id="username" name="username" autocomplete="username">
                <label for="password">Password</label>
                <input type="password" id="password" name="password" autocomplete="current-password">
                <button type="submit" class="btn btn-primary">Login</button>
            </form>
            {notice}
        </section>"#,
        notice = notice(note)
    )
}

pub fn register_form(note: Option<&Notice>) -> String {
    format!(
        r#"
        <section class="card narrow">
            <h1>Register</h1>
            <form method="post" action="/register">
                <label for="new_username">New Username</label>
                <input type="text" id="new_username" name="username" autocomplete="username">
                <label for="new_password">New Password</label>
                <input type="password" id="new_password" name="password" autocomplete="new-password">
                <button type="submit" class="btn btn-primary">Register</button>
            </form>
            {notice}
        </section>"#,
        notice = notice(note)
    )
}

pub fn blog_form(note: Option<&Notice>) -> String {
    format!(
        r#"
        <section class="card">
            <h1>Write a Blog</h1>
            <form method="post" action="/blog">
                <label for="title">Title:</label>
                <input type="text" id="title" name="title">
                <label for="content">Content:</label>
                <textarea id="content" name="content" rows="8"></textarea>
                <label for="image_url">Image URL:</label>
                <input type="url" id="image_url" name="image_url">
                <label for="link">Link:</label>
                <input type="url" id="link" name="link">
                <button type="submit" class="btn btn-primary">Submit</button>
            </form>
            {notice}
        </section>"#,
        notice = notice(note)
    )
}

pub fn prediction_screen(ticker: &str, prediction: Option<PredictionView<'_>>) -> String {
    let body = match prediction {
        Some(PredictionView::Report(report)) => {
            let mut out = String::new();
            out.push_str(r#"<h2>Stock Data</h2><div class="table-scroll"><table class="data-table">"#);
            out.push_str("<thead><tr><th>Date</th><th>Open</th><th>High</th><th>Low</th><th>Close</th></tr></thead><tbody>");
            for bar in &report.series.bars {
                let _ = write!(
                    out,
                    "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>",
                    bar.date, bar.open, bar.high, bar.low, bar.close
                );
            }
            out.push_str("</tbody></table></div>");

            for chart in &report.charts {
                let _ = write!(
                    out,
                    r#"<div class="chart-card"><h2>{}</h2>{}</div>"#,
                    esc(&chart.title),
                    chart.to_svg()
                );
            }

            if let Some(mae) = report.mean_absolute_error() {
                let _ = write!(
                    out,
                    r#"<div class="metric"><span class="metric-label">Mean absolute error</span><span class="metric-value">${mae:.2}</span></div>"#
                );
            }
            out
        }
        Some(PredictionView::Failed(e)) => format!(
            r#"<div class="failure" data-kind="{}">⚠️ This screen could not be built. Check the symbol or try again later.</div>"#,
            e.kind()
        ),
        None => String::new(),
    };

    format!(
        r#"
        <section class="card">
            <h1>Stock Sage</h1>
            <h2>Stock Market Predictor</h2>
            <form method="get" action="/" class="inline-form">
                <input type="hidden" name="page" value="prediction">
                <label for="ticker">Enter Stock Symbol</label>
                <input type="text" id="ticker" name="ticker" value="{ticker}">
                <button type="submit" class="btn btn-primary">Predict</button>
            </form>
            {body}
            <form method="post" action="/logout">
                <button type="submit" class="btn btn-danger">Logout</button>
            </form>
        </section>"#,
        ticker = esc(ticker)
    )
}

pub fn blog_feed(posts: &[BlogPost]) -> String {
    let mut out = String::new();
    let mut current: Option<Origin> = None;

    for item in blog::feed(posts) {
        if current != Some(item.origin) {
            if current.is_some() {
                out.push_str("</section>");
            }
            let heading = match item.origin {
                Origin::User => "User Blogs",
                Origin::Predefined => "Predefined Blogs",
            };
            let _ = write!(out, r#"<section class="feed"><h2>{heading}</h2>"#);
            current = Some(item.origin);
        }
        let _ = write!(
            out,
            r#"<article class="post"><h3>{title}</h3><p>{content}</p><img src="{image}" alt="{title}" loading="lazy"><p class="read-more"><a href="{link}" rel="noopener noreferrer" target="_blank">Read more</a></p></article>"#,
            title = esc(item.title),
            content = esc(item.content),
            image = esc(safe_url(item.image_url)),
            link = esc(safe_url(item.link))
        );
    }
    if current.is_some() {
        out.push_str("</section>");
    }
    out
}

/// Only http(s) URLs make it into `href`/`src`
fn safe_url(url: &str) -> &str {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        trimmed
    } else {
        "#"
    }
}
