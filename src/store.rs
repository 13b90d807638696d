//! Session store
//!
//! Holds the login table and the per-session state. Both are plain values:
//! the request path loads them, applies one action, and writes them back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::PasswordHash;
use crate::blog;
use crate::error::{DashboardError, Result};
use crate::types::BlogPost;

/// Accounts every fresh login table starts with
pub const SEED_USERS: [(&str, &str); 2] = [("user1", "password1"), ("user2", "password2")];

/// Username -> credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTable {
    users: BTreeMap<String, PasswordHash>,
}

impl UserTable {
    /// Table with no accounts at all
    pub fn empty() -> Self {
        Self {
            users: BTreeMap::new(),
        }
    }

    /// Table holding the seed accounts
    pub fn seeded() -> Result<Self> {
        let mut table = Self::empty();
        for (username, password) in SEED_USERS {
            table
                .users
                .insert(username.to_string(), PasswordHash::new(password)?);
        }
        Ok(table)
    }

    /// Insert a new account if the name is free
    pub fn register(&mut self, username: &str, password: &str) -> Result<()> {
        if self.contains(username) {
            return Err(DashboardError::UsernameTaken(username.to_string()));
        }
        if username.is_empty() {
            return Err(DashboardError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(DashboardError::MissingField("password"));
        }
        let hash = PasswordHash::new(password)?;
        self.users.insert(username.to_string(), hash);
        Ok(())
    }

    /// Check a claimed credential
    pub fn verify(&self, username: &str, password: &str) -> Result<()> {
        match self.users.get(username) {
            Some(hash) if hash.verify(password) => Ok(()),
            _ => Err(DashboardError::InvalidCredentials),
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

/// Transient state of one browser session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user: Option<String>,
    #[serde(default)]
    pub blog_posts: Vec<BlogPost>,
}

impl SessionState {
    /// Log in against `users`; state is untouched on failure
    pub fn authenticate(&mut self, users: &UserTable, username: &str, password: &str) -> Result<()> {
        users.verify(username, password)?;
        self.logged_in = true;
        self.current_user = Some(username.to_string());
        Ok(())
    }

    /// Clear the login; submitted posts stay with the session
    pub fn logout(&mut self) {
        self.logged_in = false;
        self.current_user = None;
    }

    /// Append a post after validating every field
    pub fn submit_post(&mut self, title: &str, content: &str, image_url: &str, link: &str) -> Result<()> {
        let post = blog::compose(title, content, image_url, link)?;
        self.blog_posts.push(post);
        Ok(())
    }
}
