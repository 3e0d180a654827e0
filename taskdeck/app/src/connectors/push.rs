use crate::connectors::documents::BackendError;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Answer to the notification permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPermission {
    Granted,
    Denied,
    Provisional,
}

impl PushPermission {
    /// Provisional permission still delivers, quietly.
    pub fn allows_delivery(self) -> bool {
        matches!(self, PushPermission::Granted | PushPermission::Provisional)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PushMessaging: Send + Sync {
    async fn request_permission(&self) -> Result<PushPermission, BackendError>;

    /// The device token push messages are addressed to.
    async fn get_token(&self) -> Result<String, BackendError>;
}
