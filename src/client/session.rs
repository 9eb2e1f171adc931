use crate::client::error::ClientError;
use crate::models::account::{AccountResponse, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Authenticated state persisted between client runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub account: AccountResponse,
    pub role: Role,
    pub active_role: Role,
}

impl Session {
    /// Starts a session from a login or registration response; the server's active role wins over the registered one.
    pub fn new(token: String, account: AccountResponse) -> Self {
        let role = account.role;
        let active_role = account.active_role.unwrap_or(role);
        Self {
            token,
            account,
            role,
            active_role,
        }
    }
}

/// On-disk shape, lenient so a half-written or older file reads as "no session".
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: Option<String>,
    account: Option<AccountResponse>,
    role: Option<Role>,
    #[serde(alias = "currentRole")]
    active_role: Option<Role>,
}

impl StoredSession {
    fn into_session(self) -> Option<Session> {
        let token = self.token.filter(|t| !t.is_empty())?;
        let account = self.account?;
        let role = self.role.unwrap_or(account.role);
        let active_role = self.active_role.unwrap_or(role);
        Some(Session {
            token,
            account,
            role,
            active_role,
        })
    }
}

pub trait SessionStore: Send + Sync {
    fn save(&self, session: &Session) -> Result<(), ClientError>;

    /// Returns `None` unless a complete session (token and account) is stored.
    fn load(&self) -> Option<Session>;

    fn clear(&self) -> Result<(), ClientError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        self.slot().clone()
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Stores the session as one JSON document, replaced atomically on save.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "session".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let staging = self.staging_path();
        fs::write(&staging, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return None;
            }
        };
        match serde_json::from_str::<StoredSession>(&contents) {
            Ok(stored) => stored.into_session(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Shared handle on the session store, cloned into every client component.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").field("authenticated", &self.is_authenticated()).finish()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn current(&self) -> Option<Session> {
        self.store.load()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        self.store.save(session)
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        self.store.clear()
    }

    pub fn set_active_role(&self, active_role: Role) -> Result<(), ClientError> {
        let mut session = self.current().ok_or_else(|| ClientError::Session("No active session".to_string()))?;
        session.active_role = active_role;
        session.account.active_role = Some(active_role);
        self.save(&session)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn is_driver(&self) -> bool {
        self.current().is_some_and(|s| s.role == Role::Driver)
    }

    pub fn is_passenger(&self) -> bool {
        self.current().is_some_and(|s| s.role == Role::Passenger)
    }

    pub fn is_in_driver_mode(&self) -> bool {
        self.current().is_some_and(|s| s.active_role == Role::Driver)
    }

    pub fn is_in_passenger_mode(&self) -> bool {
        self.current().is_some_and(|s| s.active_role == Role::Passenger)
    }
}
