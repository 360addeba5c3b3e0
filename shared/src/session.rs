//! Session state shared by every screen.
//!
//! The session is only ever changed through [`Session::apply`]. Each action
//! is one atomic step on the model, and any persistence it requires comes
//! back as a [`SessionEffect`] for the app to run.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{AppError, ErrorKind};
use crate::model::LatLon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
    /// An API call reported an authorization failure. The token is already
    /// gone; the phase settles to `Unauthenticated` once that is persisted.
    Invalidated,
}

impl SessionPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
            Self::Invalidated => "invalidated",
        }
    }

    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Whether the login screen should be shown.
    #[must_use]
    pub const fn needs_login(self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Invalidated)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    Start,
    TokenLoaded(Option<String>),
    Login { token: String },
    Logout,
    SetLocation(LatLon),
    /// Location permission was withdrawn; the last fix is no longer usable.
    ClearLocation,
    Invalidate,
    PersistSettled,
}

impl SessionAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TokenLoaded(_) => "token_loaded",
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::SetLocation(_) => "set_location",
            Self::ClearLocation => "clear_location",
            Self::Invalidate => "invalidate",
            Self::PersistSettled => "persist_settled",
        }
    }
}

/// Work the app must carry out after an action has been applied.
#[derive(Debug, Clone)]
pub enum SessionEffect {
    LoadToken,
    /// `None` removes the stored token.
    PersistToken(Option<SecretString>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("token cannot be empty")]
    EmptyToken,
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let kind = match e {
            SessionError::EmptyToken => ErrorKind::Validation,
            SessionError::InvalidTransition { .. } => ErrorKind::InvalidState,
        };
        AppError::new(kind, e.to_string())
    }
}

#[derive(Debug, Default)]
pub struct Session {
    phase: SessionPhase,
    token: Option<SecretString>,
    location: Option<LatLon>,
}

impl Session {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn location(&self) -> Option<LatLon> {
        self.location
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// True while the persisted token is being read.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SessionPhase::Uninitialized | SessionPhase::Loading)
    }

    /// Borrowed for the duration of one request build.
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_str())
    }

    pub fn apply(&mut self, action: SessionAction) -> Result<Vec<SessionEffect>, SessionError> {
        let from = self.phase;
        let name = action.name();

        let effects = match action {
            SessionAction::Start => match self.phase {
                SessionPhase::Uninitialized => {
                    self.phase = SessionPhase::Loading;
                    vec![SessionEffect::LoadToken]
                }
                phase => {
                    return Err(SessionError::InvalidTransition {
                        action: name,
                        phase,
                    })
                }
            },
            SessionAction::TokenLoaded(token) => match self.phase {
                SessionPhase::Loading => {
                    match token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
                        Some(token) => {
                            self.token = Some(SecretString::new(token));
                            self.phase = SessionPhase::Authenticated;
                        }
                        None => {
                            self.token = None;
                            self.phase = SessionPhase::Unauthenticated;
                        }
                    }
                    vec![]
                }
                phase => {
                    return Err(SessionError::InvalidTransition {
                        action: name,
                        phase,
                    })
                }
            },
            SessionAction::Login { token } => {
                let token = token.trim();
                if token.is_empty() {
                    return Err(SessionError::EmptyToken);
                }
                match self.phase {
                    SessionPhase::Unauthenticated
                    | SessionPhase::Invalidated
                    | SessionPhase::Authenticated => {
                        let secret = SecretString::new(token.to_string());
                        self.token = Some(secret.clone());
                        self.phase = SessionPhase::Authenticated;
                        vec![SessionEffect::PersistToken(Some(secret))]
                    }
                    phase => {
                        return Err(SessionError::InvalidTransition {
                            action: name,
                            phase,
                        })
                    }
                }
            }
            SessionAction::Logout => {
                self.token = None;
                self.phase = SessionPhase::Unauthenticated;
                vec![SessionEffect::PersistToken(None)]
            }
            SessionAction::SetLocation(location) => {
                self.location = Some(location);
                vec![]
            }
            SessionAction::ClearLocation => {
                self.location = None;
                vec![]
            }
            SessionAction::Invalidate => match self.phase {
                SessionPhase::Authenticated => {
                    self.token = None;
                    self.phase = SessionPhase::Invalidated;
                    vec![SessionEffect::PersistToken(None)]
                }
                phase => {
                    debug!(phase = %phase, "ignoring repeated session invalidation");
                    vec![]
                }
            },
            SessionAction::PersistSettled => {
                if self.phase == SessionPhase::Invalidated {
                    self.phase = SessionPhase::Unauthenticated;
                }
                vec![]
            }
        };

        if from != self.phase {
            info!(action = name, from = %from, to = %self.phase, "session transition");
        }
        Ok(effects)
    }

    /// Applies `action`, logging a refused transition instead of returning it.
    pub fn apply_logged(&mut self, action: SessionAction) -> Vec<SessionEffect> {
        let name = action.name();
        self.apply(action).unwrap_or_else(|e| {
            warn!(action = name, error = %e, "session action refused");
            Vec::new()
        })
    }
}
