use crate::config::Config;
use crate::connectors::{
    AuthProvider, DocumentRoleStore, DocumentStore, InMemoryBackend, KeyValueStore, PushMessaging,
};
use crate::feed::TaskFeed;
use crate::services::{AuthService, TaskService};
use crate::session::SessionController;
use crate::state::AppState;
use crate::subscription::Subscription;
use std::sync::Arc;
use tracing::info;

/// The outside world the app talks to.
#[derive(Clone)]
pub struct Connectors {
    pub auth: Arc<dyn AuthProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub push: Arc<dyn PushMessaging>,
    pub cache: Arc<dyn KeyValueStore>,
}

impl Connectors {
    /// Every backend connector served by `backend`.
    pub fn in_memory(backend: &InMemoryBackend, cache: Arc<dyn KeyValueStore>) -> Self {
        Self {
            auth: Arc::new(backend.clone()),
            documents: Arc::new(backend.clone()),
            push: Arc::new(backend.clone()),
            cache,
        }
    }
}

/// Owns the application state and the listeners feeding it.
pub struct App {
    connectors: Connectors,
    config: Config,
    state: AppState,
    auth: AuthService,
    tasks: TaskService,
    auth_listener: Option<Subscription>,
}

impl App {
    pub fn new(connectors: Connectors, config: Config) -> Self {
        let state = AppState::new();
        let auth = AuthService::new(
            Arc::clone(&connectors.auth),
            Arc::clone(&connectors.documents),
            Arc::clone(&connectors.push),
            Arc::clone(&connectors.cache),
            config.users_collection.clone(),
        );
        let tasks = TaskService::new(
            Arc::clone(&connectors.documents),
            state.tasks.clone(),
            config.tasks_collection.clone(),
        );
        Self {
            connectors,
            config,
            state,
            auth,
            tasks,
            auth_listener: None,
        }
    }

    /// Starts following the auth state. Calling it again restarts the listener.
    pub fn start(&mut self) {
        let roles = DocumentRoleStore::new(
            Arc::clone(&self.connectors.documents),
            self.config.users_collection.clone(),
        );
        let listener = SessionController::start(
            self.connectors.auth.as_ref(),
            Arc::new(roles),
            self.state.session.clone(),
            self.config.role_lookup_policy(),
        );
        self.auth_listener = Some(listener);
        info!("App started");
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts mirroring the task collection for as long as the dashboard holds the handle.
    pub fn open_dashboard(&self) -> Subscription {
        TaskFeed::start(
            self.connectors.documents.as_ref(),
            &self.config.tasks_collection,
            self.state.tasks.clone(),
        )
    }

    /// Stops the auth listener. The state keeps its last value.
    pub async fn shutdown(&mut self) {
        if let Some(listener) = self.auth_listener.take() {
            listener.cancel().await;
        }
        info!("App stopped");
    }
}
