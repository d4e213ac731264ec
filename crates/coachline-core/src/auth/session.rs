use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

/// The credential and role claims as one value.
///
/// Only `SessionState::establish` and `SessionState::clear` produce
/// snapshots, so roles are never present without a credential.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    credential: Option<String>,
    roles: Vec<String>,
}

impl SessionSnapshot {
    fn authenticated(credential: String, roles: Vec<String>) -> Self {
        Self {
            credential: Some(credential),
            roles,
        }
    }

    /// Bearer token, if signed in
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True when at least one of `required` is among the granted roles.
    pub fn has_any_role(&self, required: &[String]) -> bool {
        required.iter().any(|role| self.has_role(role))
    }
}

// The token must never end up in logs
impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("roles", &self.roles)
            .finish()
    }
}

/// Read-only access to the session.
///
/// The request pipeline and the access guard depend on this trait rather than
/// on `SessionState`, so neither can change who is signed in, and tests can
/// hand them a fake.
pub trait SessionView: Send + Sync {
    /// Both fields, read together.
    fn snapshot(&self) -> SessionSnapshot;

    fn current_credential(&self) -> Option<String> {
        self.snapshot().credential
    }

    fn current_roles(&self) -> Vec<String> {
        self.snapshot().roles
    }
}

/// Process-wide authentication state.
///
/// Clone is cheap and every clone refers to the same state. Updates replace
/// the whole snapshot at once, so a reader on another thread sees either the
/// old or the new credential/roles pair in full.
#[derive(Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionState {
    /// Create an unauthenticated session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Replace the credential and roles, then notify subscribers.
    ///
    /// A blank credential signs the session out instead.
    pub fn establish(&self, credential: impl Into<String>, roles: Vec<String>) {
        let credential = credential.into();
        if credential.trim().is_empty() {
            warn!("Ignoring blank credential, clearing session instead");
            self.clear();
            return;
        }

        debug!(role_count = roles.len(), "Session established");
        self.tx
            .send_replace(SessionSnapshot::authenticated(credential, roles));
    }

    /// Forget the credential and roles, then notify subscribers.
    pub fn clear(&self) {
        debug!("Session cleared");
        self.tx.send_replace(SessionSnapshot::default());
    }

    /// Register for change notifications.
    ///
    /// The receiver is woken after every `establish` or `clear`.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// A read-only handle onto this session.
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.tx.borrow().has_role(role)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionView for SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }
}

/// Read-only handle returned by `SessionState::reader`.
#[derive(Clone)]
pub struct SessionReader {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionView for SessionReader {
    fn snapshot(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }
}
