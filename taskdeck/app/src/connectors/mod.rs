//! Boundaries to the managed backend and to the device.
//!
//! Each collaborator the app depends on is a trait here, so the services can
//! be driven by the hosted backend, by the in-memory backend in [`memory`],
//! or by mocks in tests:
//! - [`auth::AuthProvider`]: email/password accounts and the auth-state stream
//! - [`documents::DocumentStore`]: the realtime document database
//! - [`roles::RoleStore`]: the authorization record of a user
//! - [`push::PushMessaging`]: push permission and device token
//! - [`storage::KeyValueStore`]: durable key-value storage on the device

pub mod auth;
pub mod documents;
pub mod memory;
pub mod push;
pub mod roles;
pub mod storage;

pub use auth::{AuthChanges, AuthError, AuthProvider};
pub use documents::{BackendError, DocumentStore, Fields, OrderBy, Record, Snapshots};
pub use memory::InMemoryBackend;
pub use push::{PushMessaging, PushPermission};
pub use roles::{DocumentRoleStore, RoleStore};
pub use storage::{JsonFileStore, KeyValueStore, MemoryKeyValueStore, StorageError};
