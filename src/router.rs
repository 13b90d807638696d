//! Page router
//!
//! A two-state machine over the session:
//! - `Anonymous` offers Login and Register
//! - `Authenticated` offers Stock Prediction, Write Blog and Logout
//!
//! `apply` is the only way state changes. It takes one user action and
//! returns the page to render plus an optional inline notice.

use crate::store::{SessionState, UserTable};

/// Login state derived from the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

impl AuthState {
    pub fn of(session: &SessionState) -> Self {
        if session.logged_in {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    /// Sidebar entries, first one is the default selection
    pub fn menu(self) -> &'static [MenuItem] {
        match self {
            AuthState::Anonymous => &[MenuItem::Login, MenuItem::Register],
            AuthState::Authenticated => {
                &[MenuItem::StockPrediction, MenuItem::WriteBlog, MenuItem::Logout]
            }
        }
    }

    pub fn offers(self, item: MenuItem) -> bool {
        self.menu().contains(&item)
    }
}

/// Sidebar menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Login,
    Register,
    StockPrediction,
    WriteBlog,
    Logout,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Login => "Login",
            MenuItem::Register => "Register",
            MenuItem::StockPrediction => "Stock Prediction",
            MenuItem::WriteBlog => "Write Blog",
            MenuItem::Logout => "Logout",
        }
    }

    /// Value used in `?page=`
    pub fn slug(self) -> &'static str {
        match self {
            MenuItem::Login => "login",
            MenuItem::Register => "register",
            MenuItem::StockPrediction => "prediction",
            MenuItem::WriteBlog => "blog",
            MenuItem::Logout => "logout",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim().to_lowercase().as_str() {
            "login" => Some(MenuItem::Login),
            "register" => Some(MenuItem::Register),
            "prediction" | "stock-prediction" => Some(MenuItem::StockPrediction),
            "blog" | "write-blog" => Some(MenuItem::WriteBlog),
            "logout" => Some(MenuItem::Logout),
            _ => None,
        }
    }
}

/// One user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Plain page load with no menu choice
    Show,
    Select(MenuItem),
    Login { username: String, password: String },
    Register { username: String, password: String },
    ViewPrediction { ticker: String },
    SubmitBlog {
        title: String,
        content: String,
        image_url: String,
        link: String,
    },
    Logout,
}

impl Action {
    /// Name safe for logs; never includes form values
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Show => "show",
            Action::Select(item) => item.slug(),
            Action::Login { .. } => "login",
            Action::Register { .. } => "register",
            Action::ViewPrediction { .. } => "view_prediction",
            Action::SubmitBlog { .. } => "submit_blog",
            Action::Logout => "logout",
        }
    }
}

/// Screen to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    StockPrediction { ticker: String },
    WriteBlog,
}

impl Page {
    pub fn menu_item(&self) -> MenuItem {
        match self {
            Page::Login => MenuItem::Login,
            Page::Register => MenuItem::Register,
            Page::StockPrediction { .. } => MenuItem::StockPrediction,
            Page::WriteBlog => MenuItem::WriteBlog,
        }
    }
}

/// Inline message under the active form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Result of applying an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub page: Page,
    pub notice: Option<Notice>,
}

impl Outcome {
    fn page(page: Page) -> Self {
        Self { page, notice: None }
    }

    fn with(page: Page, notice: Notice) -> Self {
        Self {
            page,
            notice: Some(notice),
        }
    }
}

/// How much of the login table an action needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAccess {
    None,
    Read,
    Write,
}

/// Table access `apply` will make for `action` in `state`; registration is
/// the only write
pub fn user_access(state: AuthState, action: &Action) -> UserAccess {
    match (state, action) {
        (AuthState::Anonymous, Action::Register { .. }) => UserAccess::Write,
        (AuthState::Anonymous, Action::Login { .. }) => UserAccess::Read,
        _ => UserAccess::None,
    }
}

/// Apply one action to the session and pick the page to render
///
/// Actions the current state does not offer change nothing and fall back to
/// the state's default page.
pub fn apply(
    session: &mut SessionState,
    users: &mut UserTable,
    action: Action,
    default_ticker: &str,
) -> Outcome {
    let state = AuthState::of(session);
    let prediction = |ticker: &str| Page::StockPrediction {
        ticker: normalize_ticker(ticker, default_ticker),
    };

    match (state, action) {
        (AuthState::Anonymous, Action::Login { username, password }) => {
            match session.authenticate(users, &username, &password) {
                Ok(()) => Outcome::page(prediction(default_ticker)),
                Err(e) => Outcome::with(Page::Login, Notice::Error(e.user_message())),
            }
        }
        (AuthState::Anonymous, Action::Register { username, password }) => {
            match users.register(&username, &password) {
                Ok(()) => Outcome::with(
                    Page::Register,
                    Notice::Success("Registration successful! You can now log in.".to_string()),
                ),
                Err(e) => Outcome::with(Page::Register, Notice::Error(e.user_message())),
            }
        }
        (AuthState::Authenticated, Action::ViewPrediction { ticker }) => {
            Outcome::page(prediction(&ticker))
        }
        (AuthState::Authenticated, Action::SubmitBlog { title, content, image_url, link }) => {
            match session.submit_post(&title, &content, &image_url, &link) {
                Ok(()) => Outcome::with(
                    Page::WriteBlog,
                    Notice::Success("Blog submitted successfully!".to_string()),
                ),
                Err(e) => Outcome::with(Page::WriteBlog, Notice::Error(e.user_message())),
            }
        }
        (AuthState::Authenticated, Action::Logout | Action::Select(MenuItem::Logout)) => {
            session.logout();
            Outcome::page(Page::Login)
        }
        (state, Action::Select(item)) if state.offers(item) => Outcome::page(match item {
            MenuItem::Register => Page::Register,
            MenuItem::StockPrediction => prediction(default_ticker),
            MenuItem::WriteBlog => Page::WriteBlog,
            MenuItem::Login | MenuItem::Logout => Page::Login,
        }),
        (state, _) => Outcome::page(default_page(state, default_ticker)),
    }
}

/// First menu entry of a state
pub fn default_page(state: AuthState, default_ticker: &str) -> Page {
    match state {
        AuthState::Anonymous => Page::Login,
        AuthState::Authenticated => Page::StockPrediction {
            ticker: default_ticker.to_string(),
        },
    }
}

/// Trim and upper-case a ticker; blank input falls back to the default
pub fn normalize_ticker(raw: &str, default_ticker: &str) -> String {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        default_ticker.to_string()
    } else {
        ticker
    }
}
