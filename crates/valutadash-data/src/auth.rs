//! Authentication collaborator.
//!
//! The dashboard only consumes a current-user presence signal; the real
//! identity provider sits behind [`AuthService`]. The mock implementation
//! stands in for it until the Firebase-backed one ships.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password was empty or malformed.
    #[error("invalid credentials for '{email}'")]
    InvalidCredentials {
        /// Email the attempt was made with.
        email: String,
    },

    /// No user is signed in.
    #[error("no user is signed in")]
    NotSignedIn,
}

/// A signed-in user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable user identifier.
    pub uid: String,
    /// Email address, if known.
    pub email: Option<String>,
    /// Human-readable display name, if set.
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Build a user identity from an email address.
    ///
    /// The uid and display name are derived from the local part, matching
    /// what the provisional provider hands out.
    #[must_use]
    pub fn from_email(email: &str) -> Self {
        let local = email.split('@').next().unwrap_or(email);
        Self {
            uid: format!("user-{local}"),
            email: Some(email.to_string()),
            display_name: Some(local.to_string()),
        }
    }
}

/// Authentication operations the dashboard relies on.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when either field is empty
    /// or the email is malformed.
    async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on malformed input.
    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Sign the current user out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotSignedIn`] when nobody is signed in.
    async fn logout(&self) -> Result<(), AuthError>;
}

/// In-process stand-in for the real identity provider.
#[derive(Debug, Default)]
pub struct MockAuthService {
    current: Mutex<Option<AuthUser>>,
}

impl MockAuthService {
    /// Create a service with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service pre-seeded with a signed-in user.
    #[must_use]
    pub fn with_user(user: AuthUser) -> Self {
        Self {
            current: Mutex::new(Some(user)),
        }
    }

    /// The test identity the minimal deployment boots with.
    #[must_use]
    pub fn test_user() -> AuthUser {
        AuthUser {
            uid: "test-user-id".to_string(),
            email: Some("test@example.com".to_string()),
            display_name: Some("Utilizator Test".to_string()),
        }
    }

    fn validate(email: &str, password: &str) -> Result<(), AuthError> {
        if email.is_empty() || password.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidCredentials {
                email: email.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().ok().and_then(|u| u.clone())
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        Self::validate(email, password)?;
        let user = AuthUser::from_email(email);
        debug!(uid = %user.uid, "mock login");
        if let Ok(mut current) = self.current.lock() {
            *current = Some(user.clone());
        }
        Ok(user)
    }

    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        // Registration behaves like login until the real provider lands.
        self.login(email, password).await
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let mut current = self.current.lock().map_err(|_| AuthError::NotSignedIn)?;
        if current.is_none() {
            return Err(AuthError::NotSignedIn);
        }
        *current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_sets_current_user() {
        let auth = MockAuthService::new();
        assert!(auth.current_user().is_none());

        let user = auth.login("ana@example.com", "secret").await.unwrap();
        assert_eq!(user.uid, "user-ana");
        assert_eq!(user.display_name.as_deref(), Some("ana"));
        assert_eq!(auth.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_login_rejects_empty_password() {
        let auth = MockAuthService::new();
        let result = auth.login("ana@example.com", "").await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidCredentials { .. })
        ));
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_email() {
        let auth = MockAuthService::new();
        assert!(auth.login("not-an-email", "secret").await.is_err());
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let auth = MockAuthService::new();
        auth.register("ion@example.com", "parola").await.unwrap();
        assert!(auth.current_user().is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_user() {
        let auth = MockAuthService::with_user(MockAuthService::test_user());
        auth.logout().await.unwrap();
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_without_user_errors() {
        let auth = MockAuthService::new();
        assert!(matches!(auth.logout().await, Err(AuthError::NotSignedIn)));
    }

    #[test]
    fn test_seeded_user_is_present() {
        let auth = MockAuthService::with_user(MockAuthService::test_user());
        let user = auth.current_user().unwrap();
        assert_eq!(user.uid, "test-user-id");
    }
}
