//! Session persistence
//!
//! A session is identified by an opaque random id carried in the
//! `sage_session` cookie. Its record is loaded at the start of a request and
//! written back at the end. Only ids this server stored are honoured; the id
//! is replaced whenever the login state changes.
//!
//! # Scopes
//! - `PerSession`: the login table travels inside the session record
//! - `Global`: one login table under a fixed key, shared by every visitor
//!
//! In global scope the table is only written by `SessionBackend::update_users`,
//! and only when the callback reports a change. Reads go through
//! `load_users` and never write.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use worker::kv::KvStore;

use crate::config::SessionScope;
use crate::error::{DashboardError, Result};
use crate::router::UserAccess;
use crate::store::{SessionState, UserTable};

pub const COOKIE_NAME: &str = "sage_session";

const SESSION_PREFIX: &str = "session:";
const GLOBAL_USERS_KEY: &str = "users:global";

/// Persisted unit per session id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    pub state: SessionState,
    /// Present only in per-session scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<UserTable>,
}

/// Where session records and login tables live
#[allow(async_fn_in_trait)] // Workers futures are !Send
pub trait SessionBackend {
    async fn load_session(&self, id: &str) -> Result<Option<SessionRecord>>;

    async fn save_session(&self, id: &str, record: &SessionRecord) -> Result<()>;

    async fn delete_session(&self, id: &str) -> Result<()>;

    /// Current global login table, if one was ever stored
    async fn load_users(&self) -> Result<Option<UserTable>>;

    /// Load the global login table (seeded when absent) and apply `f`. The
    /// table is stored back only when `f` returns `true` alongside its result.
    async fn update_users<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UserTable) -> (R, bool);
}

/// A loaded (or freshly created) session
#[derive(Debug)]
pub struct OpenSession {
    pub id: String,
    pub record: SessionRecord,
    /// Id minted during this request; the client needs a `Set-Cookie`
    pub fresh: bool,
}

/// Fresh random session id
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Pull our session id out of a `Cookie` header
pub fn session_id_from_cookie(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| is_valid_session_id(value))
}

/// Ids are 32 lowercase hex chars; anything else is treated as absent
pub fn is_valid_session_id(id: &str) -> bool {
    id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

/// `Set-Cookie` value; no Max-Age so it ends with the browser session
pub fn session_cookie(id: &str, secure: bool) -> String {
    let mut cookie = format!("{COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn session_key(id: &str) -> String {
    format!("{SESSION_PREFIX}{id}")
}

/// Load the session behind `id`; unknown or malformed ids get a new one
pub async fn open<B: SessionBackend>(
    backend: &B,
    id: Option<&str>,
    scope: SessionScope,
) -> Result<OpenSession> {
    let existing = match id.filter(|id| is_valid_session_id(id)) {
        Some(id) => backend
            .load_session(id)
            .await?
            .map(|record| (id.to_string(), record)),
        None => None,
    };

    let mut session = match existing {
        Some((id, record)) => OpenSession {
            id,
            record,
            fresh: false,
        },
        None => OpenSession {
            id: new_session_id(),
            record: SessionRecord::default(),
            fresh: true,
        },
    };
    if scope == SessionScope::PerSession && session.record.users.is_none() {
        session.record.users = Some(UserTable::seeded()?);
    }
    Ok(session)
}

/// Move the session to a new id and drop the stored record under the old one
pub async fn rotate<B: SessionBackend>(backend: &B, session: &mut OpenSession) -> Result<()> {
    if !session.fresh {
        backend.delete_session(&session.id).await?;
    }
    session.id = new_session_id();
    session.fresh = true;
    Ok(())
}

/// Run `f` against the session and whichever login table the scope selects
///
/// In global scope `access` decides what touches the shared table: `Write`
/// goes through `update_users`, `Read` loads it without storing, `None`
/// hands `f` an empty table.
pub async fn with_users<B, R, F>(
    backend: &B,
    record: &mut SessionRecord,
    scope: SessionScope,
    access: UserAccess,
    f: F,
) -> Result<R>
where
    B: SessionBackend,
    F: FnOnce(&mut SessionState, &mut UserTable) -> R,
{
    match (scope, access) {
        (SessionScope::PerSession, _) => {
            let mut users = match record.users.take() {
                Some(users) => users,
                None => UserTable::seeded()?,
            };
            let result = f(&mut record.state, &mut users);
            record.users = Some(users);
            Ok(result)
        }
        (SessionScope::Global, UserAccess::Write) => {
            let state = &mut record.state;
            backend
                .update_users(|users| {
                    // The table only grows, so a size change is a change
                    let before = users.len();
                    let result = f(state, users);
                    let changed = users.len() != before;
                    (result, changed)
                })
                .await
        }
        (SessionScope::Global, UserAccess::Read) => {
            let mut users = match backend.load_users().await? {
                Some(users) => users,
                None => UserTable::seeded()?,
            };
            Ok(f(&mut record.state, &mut users))
        }
        (SessionScope::Global, UserAccess::None) => Ok(f(&mut record.state, &mut UserTable::empty())),
    }
}

/// Process-local backend
#[derive(Default)]
pub struct MemoryBackend {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    users: Mutex<Option<UserTable>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> DashboardError {
    DashboardError::Storage("session lock poisoned".into())
}

impl SessionBackend for MemoryBackend {
    async fn load_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let sessions = self.sessions.lock().map_err(poisoned)?;
        Ok(sessions.get(&session_key(id)).cloned())
    }

    async fn save_session(&self, id: &str, record: &SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        sessions.insert(session_key(id), record.clone());
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        sessions.remove(&session_key(id));
        Ok(())
    }

    async fn load_users(&self) -> Result<Option<UserTable>> {
        Ok(self.users.lock().map_err(poisoned)?.clone())
    }

    async fn update_users<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UserTable) -> (R, bool),
    {
        let mut guard = self.users.lock().map_err(poisoned)?;
        let (mut users, stored) = match guard.take() {
            Some(users) => (users, true),
            None => (UserTable::seeded()?, false),
        };
        let (result, changed) = f(&mut users);
        if stored || changed {
            *guard = Some(users);
        }
        Ok(result)
    }
}

/// Workers KV backend
///
/// KV has no transactions: registration is read-modify-write and the last
/// writer wins. Nothing else writes the global table.
pub struct KvBackend {
    kv: KvStore,
    ttl_seconds: u64,
}

impl KvBackend {
    pub fn new(kv: KvStore, ttl_seconds: u64) -> Self {
        Self { kv, ttl_seconds }
    }
}

impl SessionBackend for KvBackend {
    async fn load_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.kv.get(&session_key(id)).json::<SessionRecord>().await?)
    }

    async fn save_session(&self, id: &str, record: &SessionRecord) -> Result<()> {
        self.kv
            .put(&session_key(id), record)?
            .expiration_ttl(self.ttl_seconds)
            .execute()
            .await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        self.kv.delete(&session_key(id)).await?;
        Ok(())
    }

    async fn load_users(&self) -> Result<Option<UserTable>> {
        Ok(self.kv.get(GLOBAL_USERS_KEY).json::<UserTable>().await?)
    }

    async fn update_users<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UserTable) -> (R, bool),
    {
        let mut users = match self.load_users().await? {
            Some(users) => users,
            None => UserTable::seeded()?,
        };
        let (result, changed) = f(&mut users);
        if changed {
            self.kv.put(GLOBAL_USERS_KEY, &users)?.execute().await?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_fresh(backend: &MemoryBackend, scope: SessionScope) -> OpenSession {
        open(backend, None, scope).await.expect("open should succeed")
    }

    #[test]
    fn test_cookie_roundtrip() {
        let id = new_session_id();
        assert!(is_valid_session_id(&id));

        let set = session_cookie(&id, true);
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Secure"));
        assert!(!set.contains("Max-Age"));

        let header = format!("theme=dark; {COOKIE_NAME}={id}; other=1");
        assert_eq!(session_id_from_cookie(&header), Some(id));
    }

    #[test]
    fn test_cookie_rejects_garbage() {
        assert_eq!(session_id_from_cookie(""), None);
        assert_eq!(session_id_from_cookie("sage_session=../../etc"), None);
        assert_eq!(session_id_from_cookie("other_session=0123456789abcdef0123456789abcdef"), None);
        assert_eq!(
            session_id_from_cookie("sage_session=0123456789ABCDEF0123456789ABCDEF"),
            None
        );
    }

    #[tokio::test]
    async fn test_open_creates_fresh_anonymous_session() {
        let backend = MemoryBackend::new();
        let session = open_fresh(&backend, SessionScope::PerSession).await;
        assert!(session.fresh);
        assert!(is_valid_session_id(&session.id));
        assert!(!session.record.state.logged_in);
        assert_eq!(session.record.users.as_ref().map(UserTable::len), Some(2));

        let global = open_fresh(&backend, SessionScope::Global).await;
        assert!(global.record.users.is_none());
    }

    #[tokio::test]
    async fn test_unissued_id_is_replaced() {
        let backend = MemoryBackend::new();
        let planted = "0123456789abcdef0123456789abcdef";
        let session = open(&backend, Some(planted), SessionScope::PerSession)
            .await
            .expect("open should succeed");
        assert!(session.fresh);
        assert_ne!(session.id, planted);
    }

    #[tokio::test]
    async fn test_rotate_drops_old_record() {
        let backend = MemoryBackend::new();
        let first = open_fresh(&backend, SessionScope::PerSession).await;
        backend.save_session(&first.id, &first.record).await.expect("save");

        let mut session = open(&backend, Some(first.id.as_str()), SessionScope::PerSession)
            .await
            .expect("open should succeed");
        assert!(!session.fresh);

        rotate(&backend, &mut session).await.expect("rotate");
        assert!(session.fresh);
        assert_ne!(session.id, first.id);
        assert!(backend.load_session(&first.id).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_per_session_tables_are_isolated() {
        let backend = MemoryBackend::new();

        let mut first = open_fresh(&backend, SessionScope::PerSession).await;
        with_users(
            &backend,
            &mut first.record,
            SessionScope::PerSession,
            UserAccess::Write,
            |_, users| users.register("alice", "pw1"),
        )
        .await
        .expect("backend ok")
        .expect("alice should register");
        backend.save_session(&first.id, &first.record).await.expect("save");

        let reloaded = open(&backend, Some(first.id.as_str()), SessionScope::PerSession)
            .await
            .expect("open");
        assert!(reloaded.record.users.as_ref().is_some_and(|u| u.contains("alice")));

        let second = open_fresh(&backend, SessionScope::PerSession).await;
        assert!(second.record.users.as_ref().is_some_and(|u| !u.contains("alice")));
        assert_eq!(backend.session_count(), 1);
    }

    #[tokio::test]
    async fn test_global_table_is_shared() {
        let backend = MemoryBackend::new();
        let mut first = open_fresh(&backend, SessionScope::Global).await;
        with_users(
            &backend,
            &mut first.record,
            SessionScope::Global,
            UserAccess::Write,
            |_, users| users.register("alice", "pw1"),
        )
        .await
        .expect("backend ok")
        .expect("alice should register");

        let mut second = open_fresh(&backend, SessionScope::Global).await;
        let login = with_users(
            &backend,
            &mut second.record,
            SessionScope::Global,
            UserAccess::Read,
            |state, users| state.authenticate(users, "alice", "pw1"),
        )
        .await
        .expect("backend ok");
        assert!(login.is_ok());
        assert!(second.record.state.logged_in);
        assert!(!first.record.state.logged_in);
    }

    #[tokio::test]
    async fn test_global_reads_do_not_store_a_table() {
        let backend = MemoryBackend::new();
        let mut session = open_fresh(&backend, SessionScope::Global).await;

        let login = with_users(
            &backend,
            &mut session.record,
            SessionScope::Global,
            UserAccess::Read,
            |state, users| state.authenticate(users, "user1", "password1"),
        )
        .await
        .expect("backend ok");
        assert!(login.is_ok());
        assert!(backend.load_users().await.expect("load").is_none());

        let seen = with_users(
            &backend,
            &mut session.record,
            SessionScope::Global,
            UserAccess::None,
            |_, users| users.len(),
        )
        .await
        .expect("backend ok");
        assert_eq!(seen, 0);
        assert!(backend.load_users().await.expect("load").is_none());
    }
}
