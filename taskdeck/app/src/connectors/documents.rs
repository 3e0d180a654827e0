use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Failure talking to the document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("The service is currently unavailable: {0}")]
    Unavailable(String),
    #[error("Missing or insufficient permissions: {0}")]
    PermissionDenied(String),
    #[error("No document '{id}' in '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("Document '{id}' could not be read: {reason}")]
    Malformed { id: String, reason: String },
}

/// One full read of a collection per item, re-sent on every change.
pub type Snapshots = BoxStream<'static, Result<Vec<Record>, BackendError>>;

/// A realtime document database.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribes to `collection`. The first item is the current contents.
    fn subscribe_collection(&self, collection: &str, order_by: OrderBy) -> Snapshots;

    /// Stores a new document and returns the id generated for it.
    async fn add_record(&self, collection: &str, fields: Fields) -> Result<String, BackendError>;

    /// Creates or overwrites the document with `id`.
    async fn set_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), BackendError>;

    /// Merges `fields` into an existing document.
    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), BackendError>;

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), BackendError>;

    async fn get_record(&self, collection: &str, id: &str) -> Result<Option<Record>, BackendError>;
}
