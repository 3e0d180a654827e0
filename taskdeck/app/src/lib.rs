//! The task app around [`taskdeck_core`]: connectors to the backend and the
//! device, the services behind each screen action, and the listeners that keep
//! the shared state current.

pub mod app;
pub mod config;
pub mod connectors;
pub mod error;
pub mod feed;
pub mod services;
pub mod session;
pub mod state;
pub mod subscription;
pub mod wire;

pub use app::{App, Connectors};
pub use config::Config;
pub use error::{Action, Alert, AppError};
pub use state::{AppState, SessionHandle, TaskMirror};
pub use subscription::Subscription;
