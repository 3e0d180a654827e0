use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Input rejected before any request leaves the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationError {
    #[error("Please enter a task title")]
    MissingTitle,
    #[error("Please enter both email and password.")]
    MissingCredentials,
    #[error("Unknown task status '{0}'")]
    UnknownStatus(String),
}

/// Checks that both credentials were entered. Values are not trimmed.
pub fn require_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}
