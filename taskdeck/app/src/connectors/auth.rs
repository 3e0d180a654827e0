use async_trait::async_trait;
use futures::stream::BoxStream;
use taskdeck_core::Identity;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Every sign-in and sign-out, starting with the state at subscribe time.
pub type AuthChanges = BoxStream<'static, Option<Identity>>;

/// Errors reported by the auth provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("The email or password is incorrect.")]
    InvalidCredentials,
    #[error("The email address is already in use by another account.")]
    EmailInUse,
    #[error("The password must be at least {0} characters long.")]
    WeakPassword(usize),
    #[error("A network error occurred: {0}")]
    Network(String),
}

/// Email/password authentication.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Subscribes to the signed-in identity, `None` meaning signed out.
    fn auth_state_changes(&self) -> AuthChanges;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Creates the account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}
