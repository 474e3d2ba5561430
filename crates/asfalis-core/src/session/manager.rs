//! Login-session lifecycle.
//!
//! `SessionManager` owns the transitions between `LoggedOut`,
//! `AwaitingRevalidation` and `LoggedIn`. It re-reads the store on every
//! operation and never caches the record.
//!
//! Every rejection, sign-out, resume or new login advances the session
//! epoch. A biometric prompt that is still pending when the epoch moves is
//! cancelled, and any result computed under an older epoch is discarded.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, AuthApi};
use crate::auth::{Identity, Session, SessionStore, StoreResult};
use crate::forms::{validate_code, LoginForm};

use super::biometric::{BiometricAvailability, BiometricOutcome, BiometricPrompt};
use super::error::SessionError;
use super::state::{Resumption, SessionState};

/// Shown when a login is refused without a server message.
const LOGIN_REJECTED_FALLBACK: &str = "Invalid username or password";

/// Shown when a stored token is refused without a server message.
const TOKEN_REJECTED_FALLBACK: &str = "Your session has expired, please sign in again";

/// Outcomes of the full resume flow.
#[derive(Debug)]
pub struct ResumeReport {
    pub resumption: Resumption,
    /// `None` when there was no stored token to check.
    pub revalidation: Option<Result<SessionState, SessionError>>,
    /// `None` when biometric re-entry was not attempted.
    pub biometric: Option<Result<SessionState, SessionError>>,
    pub state: SessionState,
}

pub struct SessionManager<S, A> {
    store: S,
    api: A,
    state: Mutex<SessionState>,
    epoch: watch::Sender<u64>,
}

impl<S, A> SessionManager<S, A>
where
    S: SessionStore,
    A: AuthApi,
{
    pub fn new(store: S, api: A) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            store,
            api,
            state: Mutex::new(SessionState::LoggedOut),
            epoch,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_cell()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Identity of the active session, if there is one.
    pub fn identity(&self) -> Result<Option<Identity>, SessionError> {
        Ok(storage(self.store.load())?.identity())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// App start or resume. Always drops the persisted login flag first so a
    /// crash mid-session cannot leave it set.
    pub fn resume(&self) -> Result<Resumption, SessionError> {
        let session = storage(self.store.load())?;
        let resume_session = session.is_logged_in;
        storage(self.store.set_logged_in(false))?;
        self.advance_epoch();

        let has_token = session.has_token();
        let state = if has_token {
            SessionState::AwaitingRevalidation { resume_session }
        } else {
            SessionState::LoggedOut
        };
        self.set_state(state);
        info!(?state, "Session resumed");

        let remembered_username = Some(session.username).filter(|u| !u.is_empty());
        let offer_biometric = has_token && remembered_username.is_some();

        Ok(Resumption {
            state,
            remembered_username,
            offer_biometric,
        })
    }

    /// Check the stored token with the server.
    ///
    /// Logs in only when the current state carries the session flag; a
    /// remembered token alone is kept but never logs in by itself.
    pub async fn revalidate(&self) -> Result<SessionState, SessionError> {
        let resume_session = self.state().resumes_session();
        self.revalidate_with(resume_session).await
    }

    async fn revalidate_with(&self, resume_session: bool) -> Result<SessionState, SessionError> {
        let token = storage(self.store.auth_token())?;
        if token.is_empty() {
            debug!("No stored token, nothing to revalidate");
            self.set_state(SessionState::LoggedOut);
            return Ok(SessionState::LoggedOut);
        }

        let started = self.current_epoch();
        debug!(resume_session, token_len = token.len(), "Revalidating stored token");

        match self.api.validate_token(&token).await {
            Ok(validation) => {
                if self.current_epoch() != started {
                    debug!("Session changed during revalidation, discarding result");
                    return Err(SessionError::Superseded);
                }

                if resume_session {
                    // Flag and refreshed token go out in one write.
                    let mut session = storage(self.store.load())?;
                    session.is_logged_in = true;
                    if let Some(refreshed) = validation.refreshed_token {
                        debug!(token_len = refreshed.len(), "Storing refreshed token");
                        session.auth_token = refreshed;
                    }
                    storage(self.store.save(&session))?;
                    self.set_state(SessionState::LoggedIn);
                    info!("Session revalidated, logged in");
                    return Ok(SessionState::LoggedIn);
                }

                // Token stays for biometric re-entry. A concurrent unlock may
                // already have logged in; that is not undone here.
                let mut state = self.state_cell();
                if !state.is_logged_in() {
                    *state = SessionState::LoggedOut;
                }
                info!(state = ?*state, "Stored token still valid, no active session");
                Ok(*state)
            }
            Err(ApiError::Unauthorized(message)) => {
                warn!(%message, "Stored token rejected");
                if storage(self.store.auth_token())? != token {
                    // A newer login replaced the token we were checking.
                    return Err(SessionError::Superseded);
                }
                storage(self.store.clear())?;
                self.advance_epoch();
                self.set_state(SessionState::LoggedOut);
                Err(SessionError::from_api(
                    ApiError::Unauthorized(message),
                    TOKEN_REJECTED_FALLBACK,
                ))
            }
            Err(err) => {
                Self::log_remote_failure("Token revalidation", &err);
                Err(SessionError::from_api(err, TOKEN_REJECTED_FALLBACK))
            }
        }
    }

    /// Credential login. The form is validated locally before any request.
    pub async fn login_with_credentials(&self, form: &LoginForm) -> Result<Identity, SessionError> {
        let credentials = form.validate()?;
        debug!(name = %credentials.name, "Attempting credential login");

        match self.api.login(&credentials.name, &credentials.password).await {
            Ok(grant) => {
                let session = Session::logged_in(grant.user_id, grant.username, grant.email, grant.token);
                storage(self.store.save(&session))?;
                self.advance_epoch();
                self.set_state(SessionState::LoggedIn);
                info!(user_id = session.user_id, "Login successful");

                Ok(Identity {
                    user_id: session.user_id,
                    username: session.username,
                    email: session.email,
                })
            }
            Err(err) => {
                Self::log_remote_failure("Login", &err);
                Err(SessionError::from_api(err, LOGIN_REJECTED_FALLBACK))
            }
        }
    }

    /// Re-enter with the stored token after a platform biometric success.
    pub async fn biometric_unlock<P>(&self, prompt: &P) -> Result<SessionState, SessionError>
    where
        P: BiometricPrompt + ?Sized,
    {
        if storage(self.store.auth_token())?.is_empty() {
            debug!("Biometric unlock refused, no stored token");
            return Err(SessionError::NoStoredToken);
        }

        let availability = prompt.availability();
        if availability != BiometricAvailability::Available {
            debug!(%availability, "Biometric unlock refused");
            return Err(SessionError::BiometricUnavailable(availability));
        }

        let started = self.current_epoch();
        let mut epoch_rx = self.epoch.subscribe();

        let outcome = tokio::select! {
            biased;
            _ = epoch_rx.changed() => {
                prompt.cancel();
                info!("Biometric prompt cancelled, session changed");
                return Err(SessionError::Superseded);
            }
            outcome = prompt.authenticate() => outcome,
        };

        match outcome {
            BiometricOutcome::Succeeded => {
                if self.current_epoch() != started {
                    debug!("Discarding biometric success from an older session");
                    return Err(SessionError::Superseded);
                }
                info!("Biometric verification succeeded");
                storage(self.store.set_logged_in(true))?;
                self.revalidate_with(true).await
            }
            BiometricOutcome::Failed => {
                debug!("Biometric not recognized");
                Err(SessionError::BiometricNotRecognized)
            }
            BiometricOutcome::Error(message) => {
                warn!(%message, "Biometric prompt error");
                Err(SessionError::BiometricError(message))
            }
        }
    }

    /// Full resume flow: reset, then revalidate while offering biometric
    /// re-entry when only a remembered token exists.
    pub async fn resume_with_biometric<P>(&self, prompt: &P) -> Result<ResumeReport, SessionError>
    where
        P: BiometricPrompt + ?Sized,
    {
        let resumption = self.resume()?;

        let (revalidation, biometric) = match resumption.state {
            SessionState::LoggedOut => (None, None),
            SessionState::AwaitingRevalidation { resume_session: false }
                if resumption.offer_biometric
                    && prompt.availability() == BiometricAvailability::Available =>
            {
                let (revalidation, biometric) =
                    futures::join!(self.revalidate(), self.biometric_unlock(prompt));
                (Some(revalidation), Some(biometric))
            }
            _ => (Some(self.revalidate().await), None),
        };

        Ok(ResumeReport {
            resumption,
            revalidation,
            biometric,
            state: self.state(),
        })
    }

    /// Sign out. The token is kept so biometric re-entry is offered next time.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        storage(self.store.set_logged_in(false))?;
        self.advance_epoch();
        self.set_state(SessionState::LoggedOut);
        info!("Signed out");
        Ok(())
    }

    // =========================================================================
    // QR codes
    // =========================================================================

    /// Resolve a scanned code. A rejection here does not end the session.
    pub async fn resolve_code(&self, code: &str) -> Result<String, SessionError> {
        let code = validate_code(code)?;
        let session = storage(self.store.load())?;

        if !session.has_token() {
            info!("No stored token for code resolution, signing out");
            storage(self.store.set_logged_in(false))?;
            self.advance_epoch();
            self.set_state(SessionState::LoggedOut);
            return Err(SessionError::SignInRequired);
        }

        match self
            .api
            .resolve_code(session.user_id, code, &session.auth_token)
            .await
        {
            Ok(payload) => {
                debug!(bytes = payload.len(), "Code resolved");
                Ok(payload)
            }
            Err(ApiError::Unauthorized(message)) => {
                warn!(%message, user_id = session.user_id, "Code resolution not authorized");
                Err(SessionError::NotAuthorized)
            }
            Err(err) => {
                Self::log_remote_failure("Code resolution", &err);
                Err(SessionError::from_api(err, ""))
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn state_cell(&self) -> MutexGuard<'_, SessionState> {
        // SessionState is Copy and always valid, so a poisoned lock is usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        *self.state_cell() = state;
    }

    fn current_epoch(&self) -> u64 {
        *self.epoch.borrow()
    }

    fn advance_epoch(&self) {
        self.epoch.send_modify(|epoch| *epoch += 1);
    }

    fn log_remote_failure(operation: &str, err: &ApiError) {
        match err {
            ApiError::NetworkFailure(detail) => error!(error = %detail, "{} failed: network", operation),
            _ => warn!(error = %err, "{} failed", operation),
        }
    }
}

/// Log a storage failure at the session boundary before handing it on.
fn storage<T>(result: StoreResult<T>) -> Result<T, SessionError> {
    result.map_err(|err| {
        error!(error = %err, "Session storage failed");
        SessionError::Storage(err)
    })
}

// ============================================================================
// Tests
// ============================================================================
