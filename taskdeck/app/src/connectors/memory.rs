//! A backend held entirely in process memory.
//!
//! Implements every backend connector with the same observable behaviour as
//! the hosted service: generated ids, full-snapshot subscriptions re-sent on
//! every write, and an auth-state stream that starts with the current user.
//! Used by the `demo` command and by tests.

use crate::connectors::auth::{AuthChanges, AuthError, AuthProvider};
use crate::connectors::documents::{BackendError, DocumentStore, Fields, OrderBy, Record, Snapshots};
use crate::connectors::push::{PushMessaging, PushPermission};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use taskdeck_core::Identity;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::debug;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user_id: String,
    password: String,
}

struct Inner {
    accounts: Mutex<HashMap<String, Account>>,
    current_user: watch::Sender<Option<Identity>>,
    collections: Mutex<HashMap<String, Vec<Record>>>,
    changes: broadcast::Sender<String>,
    push_permission: Mutex<PushPermission>,
    offline: AtomicBool,
}

impl Inner {
    fn check_online(&self) -> Result<(), BackendError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Unavailable("backend is offline".to_string()));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str, order_by: &OrderBy) -> Result<Vec<Record>, BackendError> {
        self.check_online()?;
        let mut records = self
            .collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| {
            let ordering = compare_values(
                a.fields.get(&order_by.field),
                b.fields.get(&order_by.field),
            );
            if order_by.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(records)
    }

    fn notify(&self, collection: &str) {
        // No subscribers is fine.
        let _ = self.changes.send(collection.to_string());
    }
}

/// Orders missing values first, then strings and numbers by value.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (current_user, _) = watch::channel(None);
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                accounts: Mutex::new(HashMap::new()),
                current_user,
                collections: Mutex::new(HashMap::new()),
                changes,
                push_permission: Mutex::new(PushPermission::Granted),
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Sets the answer the next permission prompt will give.
    pub fn set_push_permission(&self, permission: PushPermission) {
        *self.inner.push_permission.lock() = permission;
    }

    /// While offline every document operation and subscription fails.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Documents currently stored in `collection`, in insertion order.
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.inner
            .collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.inner.current_user.borrow().clone()
    }

    fn write_collection<R>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Vec<Record>) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        self.inner.check_online()?;
        let result = {
            let mut collections = self.inner.collections.lock();
            f(collections.entry(collection.to_string()).or_default())?
        };
        self.inner.notify(collection);
        Ok(result)
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    fn auth_state_changes(&self) -> AuthChanges {
        let receiver = self.inner.current_user.subscribe();
        stream::unfold((receiver, true), |(mut receiver, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let current = receiver.borrow_and_update().clone();
            Some((current, (receiver, false)))
        })
        .boxed()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = {
            let accounts = self.inner.accounts.lock();
            match accounts.get(email) {
                Some(account) if account.password == password => {
                    Identity::new(account.user_id.clone(), email)
                }
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        self.inner.current_user.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }
        let identity = {
            let mut accounts = self.inner.accounts.lock();
            if accounts.contains_key(email) {
                return Err(AuthError::EmailInUse);
            }
            let user_id = Uuid::new_v4().simple().to_string();
            accounts.insert(
                email.to_string(),
                Account {
                    user_id: user_id.clone(),
                    password: password.to_string(),
                },
            );
            Identity::new(user_id, email)
        };
        debug!(user_id = %identity.user_id, "Created account");
        self.inner.current_user.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.current_user.send_replace(None);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryBackend {
    fn subscribe_collection(&self, collection: &str, order_by: OrderBy) -> Snapshots {
        let cursor = SnapshotCursor {
            inner: Arc::clone(&self.inner),
            changes: self.inner.changes.subscribe(),
            collection: collection.to_string(),
            order_by,
            started: false,
        };
        stream::unfold(cursor, |mut cursor| async move {
            let snapshot = cursor.next_snapshot().await?;
            Some((snapshot, cursor))
        })
        .boxed()
    }

    async fn add_record(&self, collection: &str, fields: Fields) -> Result<String, BackendError> {
        let id = Uuid::new_v4().simple().to_string();
        self.write_collection(collection, |records| {
            records.push(Record::new(id.clone(), fields));
            Ok(())
        })?;
        Ok(id)
    }

    async fn set_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), BackendError> {
        self.write_collection(collection, |records| {
            match records.iter_mut().find(|r| r.id == id) {
                Some(existing) => existing.fields = fields,
                None => records.push(Record::new(id, fields)),
            }
            Ok(())
        })
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), BackendError> {
        self.write_collection(collection, |records| {
            let existing = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| BackendError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            existing.fields.extend(fields);
            Ok(())
        })
    }

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        // Deleting a missing document succeeds, as it does on the hosted store.
        self.write_collection(collection, |records| {
            records.retain(|r| r.id != id);
            Ok(())
        })
    }

    async fn get_record(&self, collection: &str, id: &str) -> Result<Option<Record>, BackendError> {
        self.inner.check_online()?;
        Ok(self
            .inner
            .collections
            .lock()
            .get(collection)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned()))
    }
}

struct SnapshotCursor {
    inner: Arc<Inner>,
    changes: broadcast::Receiver<String>,
    collection: String,
    order_by: OrderBy,
    started: bool,
}

impl SnapshotCursor {
    async fn next_snapshot(&mut self) -> Option<Result<Vec<Record>, BackendError>> {
        if self.started {
            loop {
                match self.changes.recv().await {
                    Ok(changed) if changed == self.collection => break,
                    Ok(_) => continue,
                    // Missed notifications only mean the next snapshot is due now.
                    Err(RecvError::Lagged(_)) => break,
                    Err(RecvError::Closed) => return None,
                }
            }
        }
        self.started = true;
        Some(self.inner.snapshot(&self.collection, &self.order_by))
    }
}

#[async_trait]
impl PushMessaging for InMemoryBackend {
    async fn request_permission(&self) -> Result<PushPermission, BackendError> {
        Ok(*self.inner.push_permission.lock())
    }

    async fn get_token(&self) -> Result<String, BackendError> {
        self.inner.check_online()?;
        Ok(format!("push-{}", Uuid::new_v4().simple()))
    }
}
