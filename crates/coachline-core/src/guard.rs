//! Access guard for protected regions.
//!
//! The guard reads the session synchronously each time it is asked and
//! either lets navigation proceed or sends the user to the login entry point.
//! Nothing is cached between evaluations.

use std::sync::Arc;

use tracing::debug;

use crate::auth::SessionView;

/// Where unauthenticated users are sent
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Outcome of one guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccessDecision {
    Allow,
    Redirect { target: String },
}

impl RouteAccessDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, RouteAccessDecision::Allow)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            RouteAccessDecision::Allow => None,
            RouteAccessDecision::Redirect { target } => Some(target),
        }
    }
}

/// Result of trying to enter a protected region
#[derive(Debug, PartialEq, Eq)]
pub enum Navigation<V> {
    Entered(V),
    Redirected(String),
}

impl<V> Navigation<V> {
    pub fn entered(self) -> Option<V> {
        match self {
            Navigation::Entered(view) => Some(view),
            Navigation::Redirected(_) => None,
        }
    }
}

/// Pre-navigation check for a protected region.
///
/// A plain guard only requires a credential. A role-scoped guard
/// additionally requires at least one of its roles.
#[derive(Clone)]
pub struct AccessGuard {
    session: Arc<dyn SessionView>,
    required_roles: Vec<String>,
    login_path: String,
}

impl AccessGuard {
    pub fn new(session: Arc<dyn SessionView>) -> Self {
        Self {
            session,
            required_roles: Vec::new(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// A guard that also requires one of `roles`
    pub fn with_roles<I, S>(session: Arc<dyn SessionView>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_roles: roles.into_iter().map(Into::into).collect(),
            ..Self::new(session)
        }
    }

    /// Redirect somewhere other than `/login`
    pub fn redirect_to(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn evaluate(&self) -> RouteAccessDecision {
        let snapshot = self.session.snapshot();

        if !snapshot.is_authenticated() {
            debug!(target_path = %self.login_path, "No credential, redirecting");
            return self.redirect();
        }

        if !self.required_roles.is_empty() && !snapshot.has_any_role(&self.required_roles) {
            debug!(
                required = ?self.required_roles,
                granted = ?snapshot.roles(),
                "Missing required role, redirecting"
            );
            return self.redirect();
        }

        RouteAccessDecision::Allow
    }

    /// Evaluate, and build the view only if access is allowed.
    ///
    /// On a redirect `build` is never called.
    pub fn enter<V, F>(&self, build: F) -> Navigation<V>
    where
        F: FnOnce() -> V,
    {
        match self.evaluate() {
            RouteAccessDecision::Allow => Navigation::Entered(build()),
            RouteAccessDecision::Redirect { target } => Navigation::Redirected(target),
        }
    }

    fn redirect(&self) -> RouteAccessDecision {
        RouteAccessDecision::Redirect {
            target: self.login_path.clone(),
        }
    }
}
