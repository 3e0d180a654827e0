//! Application state shared between the background feeds and the screens.
//!
//! Each piece of state sits behind a `watch` channel: writers apply changes in
//! place and readers always see a complete value, and can await the next one.

use std::sync::Arc;
use taskdeck_core::{Identity, Role, SessionState, Task, TaskId, TaskStore, ViewQuery};
use tokio::sync::watch;

/// The local task mirror.
#[derive(Debug, Clone)]
pub struct TaskMirror {
    tx: Arc<watch::Sender<TaskStore>>,
}

impl Default for TaskMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskMirror {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TaskStore::new());
        Self { tx: Arc::new(tx) }
    }

    /// Runs `f` against the store; subscribers are woken only if it returns true.
    pub fn apply(&self, f: impl FnOnce(&mut TaskStore) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tx.borrow().get(id).cloned()
    }

    pub fn snapshot(&self) -> TaskStore {
        self.tx.borrow().clone()
    }

    /// The tasks `query` selects, in render order.
    pub fn visible(&self, query: &ViewQuery) -> Vec<Task> {
        self.tx.borrow().view(query).into_iter().cloned().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskStore> {
        self.tx.subscribe()
    }
}

/// The current session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Applies an auth-state event and returns the user whose role needs looking up.
    pub fn apply_auth_change(&self, identity: Option<Identity>) -> Option<String> {
        let mut lookup = None;
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            lookup = state.apply_auth_change(identity);
            *state != before
        });
        lookup
    }

    pub fn resolve_role(&self, user_id: &str, role: Role) -> bool {
        self.tx.send_if_modified(|state| state.resolve_role(user_id, role))
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

/// Everything the screens read, owned by one [`crate::app::App`].
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub tasks: TaskMirror,
    pub session: SessionHandle,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
