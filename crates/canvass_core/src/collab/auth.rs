//! Sign-in guard for protected views.
//!
//! The core only needs to know whether someone is signed in; the actual
//! sign-in flow lives with the identity provider.

/// Session state as last reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Provider has not reported yet.
    Pending,
    SignedIn { user_id: String },
    SignedOut,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

/// What a protected view should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a loading placeholder until the provider reports.
    Loading,
    Render,
    RedirectToLogin,
}

/// Anything that can report the current session.
pub trait AuthProvider: Send + Sync {
    fn auth_state(&self) -> AuthState;

    fn is_authenticated(&self) -> bool {
        self.auth_state().is_authenticated()
    }
}

/// Decides between rendering protected content and redirecting to login.
pub fn guard(state: &AuthState) -> GuardDecision {
    match state {
        AuthState::Pending => GuardDecision::Loading,
        AuthState::SignedIn { .. } => GuardDecision::Render,
        AuthState::SignedOut => GuardDecision::RedirectToLogin,
    }
}
