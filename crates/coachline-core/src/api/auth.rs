//! Login, identity and logout.
//!
//! These are the only calls that write to the session: `login` establishes
//! it and `logout` clears it.

use serde_json::Value;
use tracing::{info, warn};

use crate::auth::SessionState;
use crate::models::{LoginRequest, LoginResponse, Me};

use super::{ApiResult, OutboundRequest, RequestPipeline};

#[derive(Clone)]
pub struct AuthApi {
    pipeline: RequestPipeline,
    session: SessionState,
}

impl AuthApi {
    pub fn new(pipeline: RequestPipeline, session: SessionState) -> Self {
        Self { pipeline, session }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Authenticate and establish the session.
    ///
    /// The token is stored first so `/auth/me` can be called with it, then
    /// the session is re-established with the returned roles. If the identity
    /// cannot be loaded the session is cleared again and the error returned.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Me> {
        let request = OutboundRequest::post("/auth/login").json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let token: LoginResponse = self.pipeline.send(request).await?;

        self.session.establish(token.access_token.clone(), Vec::new());

        match self.me().await {
            Ok(me) => {
                self.session.establish(token.access_token, me.roles.clone());
                info!(email = %me.email, roles = ?me.roles, "Login successful");
                Ok(me)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load identity after login");
                self.session.clear();
                Err(e)
            }
        }
    }

    /// Identity behind the current credential
    pub async fn me(&self) -> ApiResult<Me> {
        self.pipeline.send(OutboundRequest::get("/auth/me")).await
    }

    /// End the session on the service, then locally.
    ///
    /// Local state is cleared even when the service call fails; the failure
    /// is still returned.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .pipeline
            .send::<Value>(OutboundRequest::post("/auth/logout"))
            .await;
        self.session.clear();

        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed, local session cleared anyway");
                Err(e)
            }
        }
    }
}
