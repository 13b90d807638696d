//! Request flow
//!
//! One user interaction = one call to `handle`:
//! 1. load the session (unknown ids get a fresh one)
//! 2. apply the action through the router
//! 3. move to a new id if the login state changed, then save
//! 4. run the prediction pipeline if that screen was selected
//! 5. render the page
//!
//! Nothing here touches the Workers runtime directly, so the whole flow runs
//! in tests over `MemoryBackend` with fake collaborators.

use crate::client::MarketData;
use crate::config::Config;
use crate::dashboard::{self, PredictionView};
use crate::error::{DashboardError, Result};
use crate::model::PricePredictor;
use crate::prediction::PredictionEngine;
use crate::router::{self, Action, AuthState, MenuItem, Outcome, Page};
use crate::session::{self, SessionBackend};
use crate::types::SessionSummary;

/// Rendered response plus what the entry point needs for headers and logs
#[derive(Debug)]
pub struct Rendered {
    pub session_id: String,
    /// True when the id was minted here and needs a `Set-Cookie`
    pub new_session: bool,
    pub outcome: Outcome,
    pub html: String,
    pub prediction_error: Option<DashboardError>,
}

/// Map `?page=` and `?ticker=` onto an action
pub fn action_from_query(page: Option<&str>, ticker: Option<&str>) -> Action {
    match (page.and_then(MenuItem::from_slug), ticker) {
        (Some(MenuItem::StockPrediction), Some(ticker)) => Action::ViewPrediction {
            ticker: ticker.to_string(),
        },
        (Some(item), _) => Action::Select(item),
        (None, _) => Action::Show,
    }
}

/// Apply one action for one session and render the resulting page
///
/// `engine` is an error when the prediction collaborators could not be set
/// up; that only matters if the prediction screen is selected.
pub async fn handle<B, M, P>(
    backend: &B,
    config: &Config,
    session_id: Option<String>,
    action: Action,
    engine: Result<PredictionEngine<M, P>>,
) -> Result<Rendered>
where
    B: SessionBackend,
    M: MarketData,
    P: PricePredictor,
{
    let scope = config.session_scope;
    let mut session = session::open(backend, session_id.as_deref(), scope).await?;

    let before = AuthState::of(&session.record.state);
    let access = router::user_access(before, &action);
    let default_ticker = config.default_ticker.as_str();
    let outcome = session::with_users(backend, &mut session.record, scope, access, |state, users| {
        router::apply(state, users, action, default_ticker)
    })
    .await?;

    if AuthState::of(&session.record.state) != before {
        session::rotate(backend, &mut session).await?;
    }
    backend.save_session(&session.id, &session.record).await?;

    let report = match &outcome.page {
        Page::StockPrediction { ticker } => Some(match engine {
            Ok(engine) => engine.run(ticker).await,
            Err(e) => Err(e),
        }),
        _ => None,
    };

    let view = match &report {
        Some(Ok(report)) => Some(PredictionView::Report(report)),
        Some(Err(e)) => Some(PredictionView::Failed(e)),
        None => None,
    };
    let html = dashboard::render_page(&session.record.state, &outcome, view, config);

    Ok(Rendered {
        session_id: session.id,
        new_session: session.fresh,
        outcome,
        html,
        prediction_error: report.and_then(Result::err),
    })
}

/// Read-only view of a session for the JSON endpoint
pub async fn summary<B: SessionBackend>(backend: &B, session_id: Option<&str>) -> Result<SessionSummary> {
    let state = match session_id.filter(|id| session::is_valid_session_id(id)) {
        Some(id) => backend
            .load_session(id)
            .await?
            .map(|record| record.state)
            .unwrap_or_default(),
        None => Default::default(),
    };
    let auth = AuthState::of(&state);
    Ok(SessionSummary {
        logged_in: state.logged_in,
        user: state.current_user,
        menu: auth.menu().iter().map(|item| item.label().to_string()).collect(),
        blog_posts: state.blog_posts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionScope;
    use crate::model::RemoteModel;
    use crate::prediction::tests::{EchoModel, FakeMarket};
    use crate::router::Notice;
    use crate::session::{MemoryBackend, SessionRecord};
    use crate::store::UserTable;
    use std::cell::Cell;

    type Engine = PredictionEngine<FakeMarket, EchoModel>;

    fn engine(config: &Config) -> Result<Engine> {
        Ok(PredictionEngine::new(FakeMarket { days: 400 }, EchoModel::default(), config.clone()))
    }

    fn login(username: &str, password: &str) -> Action {
        Action::Login {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn register(username: &str, password: &str) -> Action {
        Action::Register {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn global() -> Config {
        Config {
            session_scope: SessionScope::Global,
            ..Config::default()
        }
    }

    async fn step<B: SessionBackend>(backend: &B, config: &Config, id: Option<&str>, action: Action) -> Rendered {
        handle(backend, config, id.map(str::to_string), action, engine(config))
            .await
            .expect("request should render")
    }

    /// Memory backend that counts global-table traffic
    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryBackend,
        table_reads: Cell<usize>,
        table_writes: Cell<usize>,
    }

    impl SessionBackend for CountingBackend {
        async fn load_session(&self, id: &str) -> Result<Option<SessionRecord>> {
            self.inner.load_session(id).await
        }

        async fn save_session(&self, id: &str, record: &SessionRecord) -> Result<()> {
            self.inner.save_session(id, record).await
        }

        async fn delete_session(&self, id: &str) -> Result<()> {
            self.inner.delete_session(id).await
        }

        async fn load_users(&self) -> Result<Option<UserTable>> {
            self.table_reads.set(self.table_reads.get() + 1);
            self.inner.load_users().await
        }

        async fn update_users<R, F>(&self, f: F) -> Result<R>
        where
            F: FnOnce(&mut UserTable) -> (R, bool),
        {
            self.table_reads.set(self.table_reads.get() + 1);
            self.inner
                .update_users(|users| {
                    let (result, changed) = f(users);
                    if changed {
                        self.table_writes.set(self.table_writes.get() + 1);
                    }
                    (result, changed)
                })
                .await
        }
    }

    #[tokio::test]
    async fn test_first_visit_mints_session() {
        let backend = MemoryBackend::new();
        let config = Config::default();

        let first = step(&backend, &config, None, Action::Show).await;
        assert!(first.new_session);
        assert_eq!(first.outcome.page, Page::Login);
        assert_eq!(backend.session_count(), 1);

        let second = step(&backend, &config, Some(&first.session_id), Action::Show).await;
        assert!(!second.new_session);
        assert_eq!(second.session_id, first.session_id);

        let forged = step(&backend, &config, Some("not-a-session"), Action::Show).await;
        assert!(forged.new_session);
        assert_ne!(forged.session_id, "not-a-session");
    }

    #[tokio::test]
    async fn test_unissued_session_id_is_not_adopted() {
        let backend = MemoryBackend::new();
        let planted = "0123456789abcdef0123456789abcdef";

        let rendered = step(&backend, &Config::default(), Some(planted), Action::Show).await;
        assert!(rendered.new_session);
        assert_ne!(rendered.session_id, planted);
        assert!(backend.load_session(planted).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_login_and_logout_rotate_session_id() {
        let backend = MemoryBackend::new();
        let config = Config::default();
        let anonymous = step(&backend, &config, None, Action::Show).await.session_id;

        let failed = step(&backend, &config, Some(&anonymous), login("user1", "wrong")).await;
        assert_eq!(failed.session_id, anonymous);
        assert!(!failed.new_session);

        let signed_in = step(&backend, &config, Some(&anonymous), login("user1", "password1")).await;
        assert!(signed_in.new_session);
        assert_ne!(signed_in.session_id, anonymous);

        let stale = summary(&backend, Some(&anonymous)).await.expect("summary");
        assert!(!stale.logged_in);
        let current = summary(&backend, Some(&signed_in.session_id)).await.expect("summary");
        assert!(current.logged_in);
        assert_eq!(current.user.as_deref(), Some("user1"));

        let signed_out = step(&backend, &config, Some(&signed_in.session_id), Action::Logout).await;
        assert!(signed_out.new_session);
        assert_ne!(signed_out.session_id, signed_in.session_id);
        assert!(
            backend
                .load_session(&signed_in.session_id)
                .await
                .expect("load")
                .is_none()
        );
        assert_eq!(backend.session_count(), 1);
    }

    #[tokio::test]
    async fn test_login_predict_blog_logout() {
        let backend = MemoryBackend::new();
        let config = Config::default();
        let id = step(&backend, &config, None, Action::Show).await.session_id;

        let bad = step(&backend, &config, Some(&id), login("user1", "wrong")).await;
        assert_eq!(bad.outcome.page, Page::Login);
        assert!(bad.html.contains("Invalid username or password"));

        let ok = step(&backend, &config, Some(&id), login("user1", "password1")).await;
        assert!(matches!(ok.outcome.page, Page::StockPrediction { .. }));
        assert!(ok.prediction_error.is_none());
        assert_eq!(ok.html.matches("<svg").count(), 4);
        assert!(ok.html.contains("Predefined Blogs"));
        let id = ok.session_id;

        let posted = step(
            &backend,
            &config,
            Some(&id),
            Action::SubmitBlog {
                title: "Earnings week".into(),
                content: "Notes".into(),
                image_url: "https://img.example.com/e.png".into(),
                link: "https://example.com/e".into(),
            },
        )
        .await;
        assert!(matches!(posted.outcome.notice, Some(Notice::Success(_))));
        assert!(posted.html.contains("User Blogs"));
        assert!(posted.html.contains("Earnings week"));
        assert_eq!(posted.session_id, id);

        let out = step(&backend, &config, Some(&id), Action::Logout).await;
        assert_eq!(out.outcome.page, Page::Login);

        let summary = summary(&backend, Some(&out.session_id)).await.expect("summary");
        assert!(!summary.logged_in);
        assert_eq!(summary.blog_posts, 1);
        assert_eq!(summary.menu, vec!["Login", "Register"]);
    }

    #[tokio::test]
    async fn test_prediction_failure_keeps_page() {
        let backend = MemoryBackend::new();
        let config = Config::default();
        let id = step(&backend, &config, None, login("user2", "password2")).await.session_id;

        let failed = step(
            &backend,
            &config,
            Some(&id),
            Action::ViewPrediction { ticker: "nope".into() },
        )
        .await;
        assert!(matches!(failed.prediction_error, Some(DashboardError::MarketData(_))));
        assert!(failed.html.contains(r#"data-kind="market_data""#));
        assert!(failed.html.contains(r#"action="/logout""#));

        let no_model: Result<PredictionEngine<FakeMarket, RemoteModel>> =
            RemoteModel::new(None).map(|m| PredictionEngine::new(FakeMarket { days: 400 }, m, config.clone()));
        let rendered = handle(&backend, &config, Some(id.clone()), Action::Show, no_model)
            .await
            .expect("request should render");
        assert!(matches!(rendered.prediction_error, Some(DashboardError::Model(_))));
        assert!(rendered.html.contains(r#"data-kind="model""#));
    }

    #[tokio::test]
    async fn test_per_session_scope_isolates_registrations() {
        let backend = MemoryBackend::new();
        let config = Config::default();

        let a = step(&backend, &config, None, register("alice", "pw1")).await;
        assert!(matches!(a.outcome.notice, Some(Notice::Success(_))));

        let same = step(&backend, &config, Some(&a.session_id), login("alice", "pw1")).await;
        assert!(matches!(same.outcome.page, Page::StockPrediction { .. }));

        let other = step(&backend, &config, None, login("alice", "pw1")).await;
        assert_eq!(other.outcome.page, Page::Login);
    }

    #[tokio::test]
    async fn test_global_scope_shares_registrations() {
        let backend = MemoryBackend::new();
        let config = global();

        step(&backend, &config, None, register("alice", "pw1")).await;

        let other = step(&backend, &config, None, login("alice", "pw1")).await;
        assert!(matches!(other.outcome.page, Page::StockPrediction { .. }));

        let taken = step(&backend, &config, None, register("alice", "pw1")).await;
        assert!(matches!(taken.outcome.notice, Some(Notice::Error(_))));
    }

    #[tokio::test]
    async fn test_global_table_written_only_by_registration() {
        let backend = CountingBackend::default();
        let config = global();

        let id = step(&backend, &config, None, Action::Show).await.session_id;
        step(&backend, &config, Some(&id), Action::Show).await;
        step(&backend, &config, Some(&id), Action::Select(MenuItem::Register)).await;
        assert_eq!(backend.table_reads.get(), 0);
        assert_eq!(backend.table_writes.get(), 0);

        let signed_in = step(&backend, &config, Some(&id), login("user1", "password1")).await;
        assert_eq!(backend.table_reads.get(), 1);
        assert_eq!(backend.table_writes.get(), 0);

        let id = signed_in.session_id;
        step(&backend, &config, Some(&id), Action::ViewPrediction { ticker: "AAPL".into() }).await;
        step(&backend, &config, Some(&id), Action::Select(MenuItem::WriteBlog)).await;
        let out = step(&backend, &config, Some(&id), Action::Logout).await;
        assert_eq!(backend.table_reads.get(), 1);
        assert_eq!(backend.table_writes.get(), 0);

        step(&backend, &config, Some(&out.session_id), register("alice", "pw1")).await;
        assert_eq!(backend.table_writes.get(), 1);

        step(&backend, &config, Some(&out.session_id), register("alice", "other")).await;
        step(&backend, &config, Some(&out.session_id), register("", "")).await;
        assert_eq!(backend.table_writes.get(), 1);
    }

    #[test]
    fn test_action_from_query() {
        assert_eq!(action_from_query(None, None), Action::Show);
        assert_eq!(action_from_query(Some("bogus"), None), Action::Show);
        assert_eq!(
            action_from_query(Some("register"), None),
            Action::Select(MenuItem::Register)
        );
        assert_eq!(
            action_from_query(Some("prediction"), Some("AAPL")),
            Action::ViewPrediction {
                ticker: "AAPL".into()
            }
        );
        assert_eq!(
            action_from_query(Some("prediction"), None),
            Action::Select(MenuItem::StockPrediction)
        );
        assert_eq!(
            action_from_query(Some("logout"), Some("AAPL")),
            Action::Select(MenuItem::Logout)
        );
    }
}
