use crate::connectors::documents::{BackendError, DocumentStore};
use async_trait::async_trait;
use std::sync::Arc;
use taskdeck_core::Role;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Looks up the authorization role of a user.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// The user's role, `Role::User` if none is recorded.
    async fn user_role(&self, user_id: &str) -> Result<Role, BackendError>;
}

/// Reads the `role` field of the user's document in the users collection.
pub struct DocumentRoleStore {
    documents: Arc<dyn DocumentStore>,
    users_collection: String,
}

impl DocumentRoleStore {
    pub fn new(documents: Arc<dyn DocumentStore>, users_collection: impl Into<String>) -> Self {
        Self {
            documents,
            users_collection: users_collection.into(),
        }
    }
}

#[async_trait]
impl RoleStore for DocumentRoleStore {
    async fn user_role(&self, user_id: &str) -> Result<Role, BackendError> {
        let record = self
            .documents
            .get_record(&self.users_collection, user_id)
            .await?;
        let role = Role::from_role_str(record.as_ref().and_then(|r| r.str_field("role")));
        debug!(user_id, %role, found = record.is_some(), "Fetched user role");
        Ok(role)
    }
}
