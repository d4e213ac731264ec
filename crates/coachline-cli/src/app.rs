//! Application state shared by one-shot runs and the shell.
//!
//! Owns the single `SessionState` for the process and the two guarded
//! regions: the dashboard (any signed-in user) and the admin area (role
//! `admin`). Commands of a guarded region are only built once the guard has
//! allowed entry.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use coachline_core::api::{AdminApi, AuthApi, SessionsApi};
use coachline_core::config::{ENV_EMAIL, ENV_PASSWORD};
use coachline_core::models::{Me, NewSession, PageRequest};
use coachline_core::{AccessGuard, ApiError, Config, Navigation, RequestPipeline, SessionState};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::{AdminCommand, Command, Region, SessionsCommand};
use crate::views;

/// Role required for the admin area
pub const ADMIN_ROLE: &str = "admin";

/// What running a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Rendered(String),
    Redirected(String),
    Exit,
}

pub struct App {
    config: Config,
    persist_config: bool,
    session: SessionState,
    identity: Option<Me>,
    auth: AuthApi,
    sessions: SessionsApi,
    admin: AdminApi,
    dashboard: AccessGuard,
    admin_area: AccessGuard,
    editor: Option<DefaultEditor>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let session = SessionState::new();
        let pipeline = RequestPipeline::from_config(&config, Arc::new(session.reader()))
            .context("Failed to create HTTP client")?;

        let dashboard =
            AccessGuard::new(Arc::new(session.reader())).redirect_to(config.login_path.clone());
        let admin_area = AccessGuard::with_roles(Arc::new(session.reader()), [ADMIN_ROLE])
            .redirect_to(config.login_path.clone());

        Ok(Self {
            auth: AuthApi::new(pipeline.clone(), session.clone()),
            sessions: SessionsApi::new(pipeline.clone()),
            admin: AdminApi::new(pipeline),
            persist_config: true,
            identity: None,
            dashboard,
            admin_area,
            editor: None,
            session,
            config,
        })
    }

    /// Never write the config file (used by tests)
    pub fn without_persistence(mut self) -> Self {
        self.persist_config = false;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shell prompt reflecting who is signed in
    pub fn prompt(&self) -> String {
        match (&self.identity, self.session.is_authenticated()) {
            (Some(me), true) if me.roles.is_empty() => format!("{}> ", me.email),
            (Some(me), true) => format!("{} [{}]> ", me.email, me.roles.join(",")),
            (_, true) => "signed-in> ".to_string(),
            _ => "coachline> ".to_string(),
        }
    }

    /// Read one line at the shell prompt
    pub fn read_line(&mut self) -> Result<String, ReadlineError> {
        let prompt = self.prompt();
        self.editor()?.readline(&prompt)
    }

    /// Add a line to the shell history
    pub fn remember(&mut self, line: &str) {
        if let Some(editor) = self.editor.as_mut() {
            let _ = editor.add_history_entry(line.trim());
        }
    }

    /// The line editor is created on first use so one-shot runs never touch the terminal
    fn editor(&mut self) -> Result<&mut DefaultEditor, ReadlineError> {
        let editor = match self.editor.take() {
            Some(editor) => editor,
            None => DefaultEditor::new()?,
        };
        Ok(self.editor.insert(editor))
    }

    fn prompt_email(&mut self) -> Result<String> {
        let label = match self.config.last_email.as_deref() {
            Some(last) => format!("Email [{}]: ", last),
            None => "Email: ".to_string(),
        };
        let entered = self
            .editor()
            .and_then(|editor| editor.readline(&label))
            .context("Failed to read email")?;
        choose_email(&entered, self.config.last_email.as_deref())
    }

    pub async fn run(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "Running command");
        match command.region() {
            Region::Public => self.run_public(command).await,
            Region::Dashboard => {
                match self.dashboard.enter(|| self.run_dashboard(command)) {
                    Navigation::Entered(view) => view.await.map(Outcome::Rendered),
                    Navigation::Redirected(target) => Ok(Outcome::Redirected(target)),
                }
            }
            Region::Admin => {
                let Command::Admin(admin) = command else {
                    bail!("not an admin command");
                };
                match self.admin_area.enter(|| self.run_admin(admin)) {
                    Navigation::Entered(view) => view.await.map(Outcome::Rendered),
                    Navigation::Redirected(target) => Ok(Outcome::Redirected(target)),
                }
            }
        }
    }

    /// Sign in and remember the email for next time
    pub async fn login_with(&mut self, email: &str, password: &str) -> Result<Me> {
        let me = self.auth.login(email, password).await?;
        info!(email = %me.email, "Signed in");

        if self.config.last_email.as_deref() != Some(email) {
            self.config.last_email = Some(email.to_string());
            if self.persist_config {
                if let Err(e) = self.config.save() {
                    warn!("Failed to save config: {}", e);
                }
            }
        }

        self.identity = Some(me.clone());
        Ok(me)
    }

    /// Sign in from `COACHLINE_EMAIL`/`COACHLINE_PASSWORD` when both are set
    pub async fn login_from_env(&mut self) -> Result<Option<Me>> {
        match (env_value(ENV_EMAIL), env_value(ENV_PASSWORD)) {
            (Some(email), Some(password)) => self.login_with(&email, &password).await.map(Some),
            _ => Ok(None),
        }
    }

    async fn run_public(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Login { email } => {
                let email = match email.or_else(|| env_value(ENV_EMAIL)) {
                    Some(email) => email,
                    None => self.prompt_email()?,
                };
                let password = match env_value(ENV_PASSWORD) {
                    Some(password) => password,
                    None => rpassword::prompt_password("Password: ")
                        .context("Failed to read password")?,
                };
                let me = self.login_with(&email, &password).await?;
                Ok(Outcome::Rendered(views::render_me(&me)))
            }
            Command::Logout => {
                let result = self.auth.logout().await;
                self.identity = None;
                match result {
                    Ok(()) => Ok(Outcome::Rendered("Signed out.".to_string())),
                    Err(e) => {
                        warn!("Logout request failed: {}", e);
                        Ok(Outcome::Rendered(format!(
                            "Signed out locally; the service reported: {}",
                            e.message()
                        )))
                    }
                }
            }
            Command::Shell => Ok(Outcome::Rendered("Already in the shell.".to_string())),
            Command::Exit => Ok(Outcome::Exit),
            other => bail!("{:?} is not a public command", other),
        }
    }

    async fn run_dashboard(&self, command: Command) -> Result<String> {
        match command {
            Command::Whoami => {
                let me = self.auth.me().await?;
                Ok(views::render_me(&me))
            }
            Command::Sessions(SessionsCommand::List) => {
                let page = self.sessions.list().await?;
                Ok(views::render_sessions(&page))
            }
            Command::Sessions(SessionsCommand::Show { id }) => {
                let session = self.sessions.get(&id).await?;
                Ok(views::render_session(&session))
            }
            Command::Sessions(SessionsCommand::Create {
                title,
                starts_at,
                ends_at,
                max_participants,
                price_cents,
                currency,
            }) => {
                let mut new_session = NewSession::new(title, starts_at, ends_at);
                new_session.max_participants = max_participants;
                new_session.price_cents = price_cents;
                new_session.currency = currency;
                if let Err(reason) = new_session.validate() {
                    bail!("Invalid session: {}", reason);
                }
                let created = self.sessions.create(&new_session).await?;
                Ok(views::render_session(&created))
            }
            Command::Sessions(SessionsCommand::Cancel { id }) => {
                let result = self.sessions.cancel(&id).await?;
                Ok(views::render_value(&result))
            }
            other => bail!("{:?} is not a dashboard command", other),
        }
    }

    async fn run_admin(&self, command: AdminCommand) -> Result<String> {
        let result = match command {
            AdminCommand::Users { limit, offset } => {
                let page = self.admin.list_users(PageRequest { limit, offset }).await?;
                return Ok(views::render_users(&page));
            }
            AdminCommand::Grant { user_id, role } => self.admin.grant_role(&user_id, &role).await?,
            AdminCommand::Revoke { user_id, role } => {
                self.admin.revoke_role(&user_id, &role).await?
            }
            AdminCommand::Disable { user_id, reason } => {
                self.admin.disable_user(&user_id, &reason).await?
            }
            AdminCommand::Reenable { user_id } => self.admin.reenable_user(&user_id).await?,
        };
        Ok(views::render_value(&result))
    }
}

/// Log every session change until the session is dropped
pub fn watch_session(session: &SessionState) -> JoinHandle<()> {
    let mut changes = session.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let snapshot = changes.borrow_and_update().clone();
            if snapshot.is_authenticated() {
                info!(roles = ?snapshot.roles(), "Session established");
            } else {
                info!("Session cleared");
            }
        }
    })
}

/// User-facing text for a failed command
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.is_unauthorized() => {
            format!("{} (run `login` to sign in)", api.message())
        }
        Some(api) => api.message(),
        None => format!("{:#}", err),
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Blank input falls back to the remembered email
fn choose_email(entered: &str, last: Option<&str>) -> Result<String> {
    match (entered.trim(), last) {
        ("", Some(last)) => Ok(last.to_string()),
        ("", None) => bail!("An email address is required"),
        (entered, _) => Ok(entered.to_string()),
    }
}
