//! Line-oriented interactive console.
//!
//! Drives a [`Portal`] from any async line reader and writer, so the same
//! loop serves stdin/stdout and in-memory buffers in tests.

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::auth::validation;
use crate::db::Role;
use crate::portal::Portal;
use crate::Result;

const RULE_WIDTH: usize = 50;

/// What the main loop should do after a menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive console over a reader/writer pair.
pub struct Console<R, W> {
    portal: Portal,
    reader: R,
    writer: W,
    logged_in_as: Option<String>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a console.
    pub fn new(portal: Portal, reader: R, writer: W) -> Self {
        Self {
            portal,
            reader,
            writer,
            logged_in_as: None,
        }
    }

    /// Consume the console, returning the portal and writer.
    pub fn into_parts(self) -> (Portal, W) {
        (self.portal, self.writer)
    }

    async fn send(&mut self, data: &str) -> Result<()> {
        self.writer.write_all(data.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn send_line(&mut self, data: &str) -> Result<()> {
        self.send(&format!("{data}\n")).await
    }

    /// Read one line without its line ending. `None` at end of input.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Show `label` and read the answer.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        self.send(label).await?;
        self.read_line().await
    }

    async fn show_menu(&mut self) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        self.send_line("").await?;
        self.send_line(&rule).await?;
        self.send_line("  MULTI-DOMAIN INTELLIGENCE PLATFORM").await?;
        self.send_line("  Secure Authentication System").await?;
        self.send_line(&rule).await?;
        self.send_line("").await?;
        self.send_line("[1] Register a new user").await?;
        self.send_line("[2] Login").await?;
        self.send_line("[3] Logout").await?;
        self.send_line("[4] Exit").await?;
        self.send_line(&"-".repeat(RULE_WIDTH)).await
    }

    /// Run the menu loop until the user exits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.check_expiry().await?;
            self.show_menu().await?;

            let Some(choice) = self.prompt("\nPlease select an option (1-4): ").await? else {
                debug!("Console input closed");
                break;
            };

            let flow = match choice.trim() {
                "1" => self.register().await?,
                "2" => self.login().await?,
                "3" => self.logout().await?,
                "4" => Flow::Exit,
                other => {
                    self.send_line(&format!("Error: '{other}' is not a valid option."))
                        .await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.send_line("\nGoodbye!").await?;
        info!("Console session closed");
        Ok(())
    }

    /// Report a login that expired since the last menu.
    async fn check_expiry(&mut self) -> Result<()> {
        let active = self.portal.current_session(Utc::now()).is_some();
        if !active {
            if let Some(username) = self.logged_in_as.take() {
                self.send_line(&format!(
                    "\nSession for '{username}' has expired. Please log in again."
                ))
                .await?;
            }
        }
        Ok(())
    }

    async fn register(&mut self) -> Result<Flow> {
        self.send_line("\n--- USER REGISTRATION ---").await?;

        let Some(username) = self.prompt("Enter a username: ").await? else {
            return Ok(Flow::Exit);
        };
        let username = username.trim().to_string();
        if let Err(e) = validation::validate_username(&username) {
            self.send_line(&format!("Error: {e}")).await?;
            return Ok(Flow::Continue);
        }

        let Some(password) = self.prompt("Enter a password: ").await? else {
            return Ok(Flow::Exit);
        };
        match validation::validate_password(&password) {
            Ok(strength) => {
                self.send_line(&format!("PASSWORD RATING: {}", strength.message()))
                    .await?;
            }
            Err(e) => {
                self.send_line(&format!("Error: {e}")).await?;
                return Ok(Flow::Continue);
            }
        }

        let Some(confirm) = self.prompt("Confirm password: ").await? else {
            return Ok(Flow::Exit);
        };
        if confirm != password {
            self.send_line("Error: Passwords do not match.").await?;
            return Ok(Flow::Continue);
        }

        self.send_line("USER ROLES:").await?;
        for (index, role) in Role::ALL.iter().enumerate() {
            self.send_line(&format!("\t[{}]\t{}", index + 1, role)).await?;
        }
        let Some(choice) = self.prompt("Select a role (1-3): ").await? else {
            return Ok(Flow::Exit);
        };
        let role = match choice.trim().parse::<usize>() {
            Ok(n) if (1..=Role::ALL.len()).contains(&n) => Role::ALL[n - 1],
            _ => {
                self.send_line("Error: Role chosen is invalid").await?;
                return Ok(Flow::Continue);
            }
        };

        let reply = self
            .portal
            .register(&username, &password, role.as_str())
            .await;
        if reply.success {
            self.send_line(&reply.message).await?;
        } else {
            self.send_line(&format!("Error: {}", reply.message)).await?;
        }
        Ok(Flow::Continue)
    }

    async fn login(&mut self) -> Result<Flow> {
        self.send_line("\n--- USER LOGIN ---").await?;

        if let Some(username) = self.logged_in_as.clone() {
            self.send_line(&format!(
                "Already logged in as '{username}'. Log out first."
            ))
            .await?;
            return Ok(Flow::Continue);
        }

        let Some(username) = self.prompt("Enter your username: ").await? else {
            return Ok(Flow::Exit);
        };
        let username = username.trim().to_string();
        let Some(password) = self.prompt("Enter your password: ").await? else {
            return Ok(Flow::Exit);
        };

        let now = Utc::now();
        let session = match self.portal.try_login_at(&username, &password, now).await {
            Ok(session) => session.clone(),
            Err(e) => {
                self.send_line(&format!("Error: {}", e.public_message()))
                    .await?;
                return Ok(Flow::Continue);
            }
        };

        let minutes = (session.expires_at - session.created_at).num_minutes();
        self.send_line("\nYou are logged-in as:").await?;
        self.send_line(&format!("\tUSER: {}", session.username)).await?;
        self.send_line(&format!("\tROLE: {}", session.role)).await?;
        self.send_line("\nSession Info").await?;
        self.send_line(&format!(
            "\tCreated: {}",
            session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
        .await?;
        self.send_line(&format!(
            "\tExpires: {} ({minutes} minute(s))",
            session.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
        .await?;

        self.logged_in_as = Some(session.username);
        Ok(Flow::Continue)
    }

    async fn logout(&mut self) -> Result<Flow> {
        let reply = self.portal.logout();
        self.logged_in_as = None;
        if reply.success {
            self.send_line(&reply.message).await?;
        } else {
            self.send_line("You are not logged in.").await?;
        }
        Ok(Flow::Continue)
    }
}

/// Run the console on the process's stdin and stdout.
pub async fn run_stdio(portal: Portal) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    Console::new(portal, stdin, stdout).run().await
}
