//! Command tree shared by one-shot invocations and the interactive shell.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use coachline_core::Config;

#[derive(Parser, Debug)]
#[command(name = "coachline", version, about = "Terminal client for the coaching session service")]
pub struct Cli {
    /// Base URL of the service, e.g. https://api.example.com
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Flags win over the config file and environment
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.base_url {
            config.api_base_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = secs;
        }
    }
}

/// One line typed into the shell
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in (prompts for anything not given)
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
    /// Coaching sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// User administration (admin role required)
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Start the interactive shell
    Shell,
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SessionsCommand {
    /// List sessions
    List,
    /// Show one session
    Show { id: String },
    /// Create a session
    Create {
        #[arg(long)]
        title: String,
        /// RFC 3339 timestamp, e.g. 2026-03-01T10:00:00Z
        #[arg(long)]
        starts_at: DateTime<Utc>,
        #[arg(long)]
        ends_at: DateTime<Utc>,
        #[arg(long)]
        max_participants: Option<u32>,
        #[arg(long)]
        price_cents: Option<i64>,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Cancel a session
    Cancel { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AdminCommand {
    /// List users
    Users {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Grant a role to a user
    Grant { user_id: String, role: String },
    /// Revoke a role from a user
    Revoke { user_id: String, role: String },
    /// Disable a user
    Disable {
        user_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Re-enable a disabled user
    Reenable { user_id: String },
}

/// Which part of the application a command belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Public,
    Dashboard,
    Admin,
}

impl Command {
    pub fn region(&self) -> Region {
        match self {
            Command::Login { .. } | Command::Logout | Command::Shell | Command::Exit => Region::Public,
            Command::Whoami | Command::Sessions(_) => Region::Dashboard,
            Command::Admin(_) => Region::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(words: &[&str]) -> Result<Command, clap::Error> {
        ShellLine::try_parse_from(words).map(|line| line.command)
    }

    #[test]
    fn test_no_command_means_shell() {
        let cli = Cli::try_parse_from(["coachline"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["coachline", "--base-url", "https://api.example.com", "--timeout", "5", "whoami"])
            .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(cli.command, Some(Command::Whoami));
    }

    #[test]
    fn test_shell_lines_parse() {
        assert_eq!(
            shell(&["sessions", "show", "s1"]).unwrap(),
            Command::Sessions(SessionsCommand::Show { id: "s1".to_string() })
        );
        assert_eq!(
            shell(&["admin", "users"]).unwrap(),
            Command::Admin(AdminCommand::Users { limit: 20, offset: 0 })
        );
        assert_eq!(
            shell(&["admin", "disable", "u1", "--reason", "spam account"]).unwrap(),
            Command::Admin(AdminCommand::Disable {
                user_id: "u1".to_string(),
                reason: "spam account".to_string(),
            })
        );
        assert_eq!(shell(&["quit"]).unwrap(), Command::Exit);
    }

    #[test]
    fn test_create_parses_timestamps() {
        let command = shell(&[
            "sessions",
            "create",
            "--title",
            "Footwork",
            "--starts-at",
            "2026-03-01T10:00:00Z",
            "--ends-at",
            "2026-03-01T11:00:00Z",
        ])
        .unwrap();
        match command {
            Command::Sessions(SessionsCommand::Create { starts_at, ends_at, .. }) => {
                assert_eq!((ends_at - starts_at).num_minutes(), 60);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(shell(&["sessions", "create", "--title", "x", "--starts-at", "tomorrow", "--ends-at", "later"]).is_err());
    }

    #[test]
    fn test_regions() {
        assert_eq!(Command::Login { email: None }.region(), Region::Public);
        assert_eq!(Command::Logout.region(), Region::Public);
        assert_eq!(Command::Whoami.region(), Region::Dashboard);
        assert_eq!(Command::Sessions(SessionsCommand::List).region(), Region::Dashboard);
        assert_eq!(
            Command::Admin(AdminCommand::Reenable { user_id: "u1".to_string() }).region(),
            Region::Admin
        );
    }
}
