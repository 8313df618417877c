//! Session manager

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use super::transitions::{SessionTransition, TransitionError};
use super::types::{Session, SessionEvent, SessionStatus};
use crate::credentials::CredentialStore;
use crate::error::ServiceError;
use crate::models::{
    AuthResponse, ChangePasswordPayload, LoginPayload, ProfileUpdate, RegisterPayload,
    UserProfile,
};
use crate::notify::{Notice, Notifier};
use crate::remote::TaskService;

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    service: Arc<dyn TaskService>,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    session: RwLock<Session>,
    event_tx: broadcast::Sender<SessionEvent>,
}

enum AuthRequest {
    Login(LoginPayload),
    Register(RegisterPayload),
}

impl AuthRequest {
    fn operation(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Self::Login(_) => "Login successful!",
            Self::Register(_) => "Registration successful!",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Self::Login(_) => "Login failed",
            Self::Register(_) => "Registration failed",
        }
    }
}

impl SessionManager {
    pub fn new(
        service: Arc<dyn TaskService>,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        let inner = SessionManagerInner {
            service,
            credentials,
            notifier,
            session: RwLock::new(Session::Uninitialized),
            event_tx,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.session.read().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.session.read().await.status()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.session.read().await.user().cloned()
    }

    /// Bearer token for a protected call.
    ///
    /// Fails with `Unauthenticated` unless the session is `Authenticated`;
    /// callers must not touch the network in that case.
    pub async fn require_token(&self) -> Result<String, ServiceError> {
        self.inner
            .session
            .read()
            .await
            .token()
            .map(str::to_string)
            .ok_or(ServiceError::Unauthenticated)
    }

    async fn commit(&self, next: Session) -> Result<SessionStatus, TransitionError> {
        let mut session = self.inner.session.write().await;
        let from = session.status();
        SessionTransition::validate(from, next.status())?;
        *session = next;
        Ok(from)
    }

    fn clear_credentials(&self, stage: &'static str) {
        if let Err(err) = self.inner.credentials.clear() {
            tracing::warn!(
                target: "taskdeck.session",
                stage = stage,
                error = %err,
                "failed to clear stored token"
            );
        }
    }

    fn notify_failure(&self, err: &ServiceError, fallback: &str) -> ServiceError {
        self.inner.notifier.notify(Notice::error(err.reason_or(fallback)));
        err.clone()
    }

    /// Startup resolution of stored credentials.
    ///
    /// Never fails: an expired, invalid or unreachable token is cleared and
    /// the session settles as `Anonymous`. Calling it again after startup is
    /// a no-op that returns the current status.
    pub async fn resolve(&self) -> SessionStatus {
        let current = self.status().await;
        if current != SessionStatus::Uninitialized {
            tracing::debug!(
                target: "taskdeck.session",
                stage = "session.resolve.skip",
                status = ?current
            );
            return current;
        }

        let stored = self
            .inner
            .credentials
            .get()
            .filter(|token| !token.trim().is_empty());

        let Some(token) = stored else {
            return self.settle_anonymous("session.resolve.no_token").await;
        };

        if let Err(err) = self.commit(Session::Resolving).await {
            tracing::warn!(target: "taskdeck.session", stage = "session.resolve.race", error = %err);
            return self.status().await;
        }

        tracing::debug!(target: "taskdeck.session", stage = "session.resolve.in");
        match self.inner.service.me(&token).await {
            Ok(user) => {
                let user_id = user.id.clone();
                match self.commit(Session::Authenticated { user, token }).await {
                    Ok(_) => {
                        tracing::info!(
                            target: "taskdeck.session",
                            stage = "session.resolve.out",
                            user_id = %user_id,
                            status = "authenticated"
                        );
                        self.emit(SessionEvent::Resolved {
                            status: SessionStatus::Authenticated,
                            timestamp: Utc::now(),
                        });
                        SessionStatus::Authenticated
                    }
                    Err(err) => {
                        tracing::warn!(target: "taskdeck.session", stage = "session.resolve.race", error = %err);
                        self.status().await
                    }
                }
            }
            Err(err) => {
                tracing::info!(
                    target: "taskdeck.session",
                    stage = "session.resolve.rejected",
                    error = %err,
                    "stored token rejected, continuing anonymously"
                );
                self.clear_credentials("session.resolve.clear");
                self.settle_anonymous("session.resolve.out").await
            }
        }
    }

    async fn settle_anonymous(&self, stage: &'static str) -> SessionStatus {
        match self.commit(Session::Anonymous).await {
            Ok(_) => {
                tracing::debug!(target: "taskdeck.session", stage = stage, status = "anonymous");
                self.emit(SessionEvent::Resolved {
                    status: SessionStatus::Anonymous,
                    timestamp: Utc::now(),
                });
                SessionStatus::Anonymous
            }
            Err(err) => {
                tracing::warn!(target: "taskdeck.session", stage = stage, error = %err);
                self.status().await
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ServiceError> {
        self.authenticate(AuthRequest::Login(LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        }))
        .await
    }

    /// Same contract as [`login`](Self::login); success is an implicit login.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ServiceError> {
        self.authenticate(AuthRequest::Register(RegisterPayload {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }))
        .await
    }

    async fn authenticate(&self, request: AuthRequest) -> Result<UserProfile, ServiceError> {
        let operation = request.operation();
        let success_message = request.success_message();
        let failure_message = request.failure_message();

        let current = self.status().await;
        if let Err(err) =
            SessionTransition::require(operation, current, SessionStatus::Anonymous)
        {
            return Err(self.notify_failure(&err.into(), failure_message));
        }

        tracing::debug!(target: "taskdeck.session", stage = "session.auth.in", operation = operation);
        let registered = matches!(request, AuthRequest::Register(_));
        let result = match request {
            AuthRequest::Login(payload) => self.inner.service.login(payload).await,
            AuthRequest::Register(payload) => self.inner.service.register(payload).await,
        };

        let AuthResponse { token, user } = match result {
            Ok(resp) => resp,
            Err(err) => {
                tracing::info!(
                    target: "taskdeck.session",
                    stage = "session.auth.rejected",
                    operation = operation,
                    code = err.code().as_u16()
                );
                return Err(self.notify_failure(&err, failure_message));
            }
        };

        if let Err(err) = self.inner.credentials.set(&token) {
            let err = ServiceError::Credentials(err.to_string());
            return Err(self.notify_failure(&err, failure_message));
        }

        if let Err(err) = self
            .commit(Session::Authenticated {
                user: user.clone(),
                token,
            })
            .await
        {
            return Err(self.notify_failure(&err.into(), failure_message));
        }

        tracing::info!(
            target: "taskdeck.session",
            stage = "session.auth.out",
            operation = operation,
            user_id = %user.id
        );
        self.emit(SessionEvent::LoggedIn {
            user_id: user.id.clone(),
            registered,
            timestamp: Utc::now(),
        });
        self.inner.notifier.notify(Notice::success(success_message));
        Ok(user)
    }

    /// Local-only logout. Always succeeds.
    pub async fn logout(&self) {
        let was_authenticated = {
            let mut session = self.inner.session.write().await;
            self.clear_credentials("session.logout.clear");
            if session.is_authenticated() {
                *session = Session::Anonymous;
                true
            } else {
                false
            }
        };

        if was_authenticated {
            tracing::info!(target: "taskdeck.session", stage = "session.logout.out");
            self.emit(SessionEvent::LoggedOut {
                timestamp: Utc::now(),
            });
        }
        self.inner
            .notifier
            .notify(Notice::success("Logged out successfully"));
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, ServiceError> {
        let token = match self.require_token().await {
            Ok(token) => token,
            Err(err) => return Err(self.notify_failure(&err, "Profile update failed")),
        };

        let user = match self.inner.service.update_profile(&token, update).await {
            Ok(user) => user,
            Err(err) => return Err(self.notify_failure(&err, "Profile update failed")),
        };

        // The session may have been logged out while the request was in flight.
        let replaced = {
            let mut session = self.inner.session.write().await;
            match &mut *session {
                Session::Authenticated {
                    user: current,
                    token: current_token,
                } if *current_token == token => {
                    *current = user.clone();
                    true
                }
                _ => false,
            }
        };
        if !replaced {
            return Err(self.notify_failure(&ServiceError::Unauthenticated, "Profile update failed"));
        }

        tracing::info!(target: "taskdeck.session", stage = "session.profile.out", user_id = %user.id);
        self.emit(SessionEvent::ProfileUpdated {
            user_id: user.id.clone(),
            timestamp: Utc::now(),
        });
        self.inner
            .notifier
            .notify(Notice::success("Profile updated successfully"));
        Ok(user)
    }

    /// Changes the password; a token returned by the server replaces the stored one.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let token = match self.require_token().await {
            Ok(token) => token,
            Err(err) => return Err(self.notify_failure(&err, "Password change failed")),
        };

        let payload = ChangePasswordPayload {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let resp = match self.inner.service.change_password(&token, payload).await {
            Ok(resp) => resp,
            Err(err) => return Err(self.notify_failure(&err, "Password change failed")),
        };

        // The stored token is only replaced while the session that asked for
        // the change is still the current one.
        let rotated = {
            let mut session = self.inner.session.write().await;
            let current_token = match &mut *session {
                Session::Authenticated { token: current, .. } if *current == token => current,
                _ => {
                    return Err(self.notify_failure(
                        &ServiceError::Unauthenticated,
                        "Password change failed",
                    ))
                }
            };
            match resp.token.filter(|t| !t.trim().is_empty()) {
                Some(rotated) => {
                    if let Err(err) = self.inner.credentials.set(&rotated) {
                        let err = ServiceError::Credentials(err.to_string());
                        return Err(self.notify_failure(&err, "Password change failed"));
                    }
                    *current_token = rotated;
                    true
                }
                None => false,
            }
        };

        if rotated {
            tracing::debug!(target: "taskdeck.session", stage = "session.password.token_rotated");
            self.emit(SessionEvent::TokenRotated {
                timestamp: Utc::now(),
            });
        }

        tracing::info!(target: "taskdeck.session", stage = "session.password.out");
        self.inner
            .notifier
            .notify(Notice::success("Password changed successfully"));
        Ok(())
    }
}
