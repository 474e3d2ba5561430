//! Command handlers: each one drives a single `SessionManager` operation and
//! prints what a screen would show.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use asfalis_core::{
    ApiClient, Config, LoginForm, SessionError, SessionManager, SessionState, SessionStore,
};

const ENV_USERNAME: &str = "ASFALIS_USERNAME";
const ENV_PASSWORD: &str = "ASFALIS_PASSWORD";

pub struct Shell {
    config: Config,
    manager: SessionManager<Arc<dyn SessionStore>, ApiClient>,
}

impl Shell {
    pub fn new(config: Config) -> Result<Self> {
        let store = config.open_store()?;
        let api = ApiClient::new(&config.client_options()?)?;
        debug!(base_url = %api.base_url(), store = ?config.store, "Shell configured");

        Ok(Self {
            manager: SessionManager::new(store, api),
            config,
        })
    }

    pub async fn login(mut self, name: Option<String>) -> Result<()> {
        let name = match name
            .or_else(|| std::env::var(ENV_USERNAME).ok())
            .or_else(|| self.config.last_username.clone())
        {
            Some(name) => name,
            None => prompt_line("Username: ")?,
        };
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) => password,
            Err(_) => rpassword::prompt_password("Password: ")?,
        };

        println!("Authenticating...");
        let form = LoginForm::new(name.clone(), password);
        let identity = match self.manager.login_with_credentials(&form).await {
            Ok(identity) => identity,
            Err(SessionError::Validation(e)) => {
                anyhow::bail!("{} - {}", e.field(), e.field_message())
            }
            Err(e) => return Err(e.into()),
        };

        self.config.last_username = Some(name.trim().to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Logged in. Welcome, {}!", identity.username);
        Ok(())
    }

    pub async fn resume(self) -> Result<()> {
        let resumption = self.manager.resume()?;
        if let Some(ref username) = resumption.remembered_username {
            println!("Remembered user: {}", username);
        }

        if resumption.state == SessionState::LoggedOut {
            println!("Not signed in. Run `asfalis login` to sign in.");
            return Ok(());
        }

        match self.manager.revalidate().await {
            Ok(SessionState::LoggedIn) => {
                let username = self
                    .manager
                    .identity()?
                    .map(|identity| identity.username)
                    .unwrap_or_default();
                println!("Session restored. Welcome back, {}!", username);
            }
            Ok(_) => {
                println!("Stored token is still valid, but no session is active.");
                if resumption.offer_biometric {
                    println!("Biometric re-entry is offered on devices with a biometric sensor.");
                }
                println!("Run `asfalis login` to sign in.");
            }
            Err(SessionError::Unauthorized(message)) => {
                println!("{}", message);
                println!("Stored session cleared. Run `asfalis login` to sign in.");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub async fn scan(self, code: &str) -> Result<()> {
        match self.manager.resolve_code(code).await {
            Ok(payload) => {
                println!("Scan result: {}", payload);
                Ok(())
            }
            Err(SessionError::SignInRequired) => {
                anyhow::bail!("No saved session. Run `asfalis login` first.")
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn sign_out(self) -> Result<()> {
        self.manager.sign_out()?;
        println!("Signed out.");
        Ok(())
    }

    pub fn status(self) -> Result<()> {
        let session = self
            .manager
            .store()
            .load()
            .context("Failed to read stored session")?;

        if !session.has_token() {
            println!("No stored session.");
            return Ok(());
        }

        println!("User:      {} (id {})", session.username, session.user_id);
        println!("Email:     {}", session.email);
        println!("Logged in: {}", if session.is_logged_in { "yes" } else { "no" });
        println!("Token:     stored");
        Ok(())
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
