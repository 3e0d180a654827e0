//! Core domain model for Taskdeck.
//!
//! Everything in here is synchronous and free of I/O: the task record, the
//! local task mirror, the derived task view and the session state machine.
pub mod session;
pub mod store;
pub mod task;
pub mod validation;
pub mod view;

pub use session::{Identity, Role, RoleStatus, Screen, ScreenSet, Session, SessionState};
pub use store::TaskStore;
pub use task::{Task, TaskDraft, TaskId, TaskStatus};
pub use validation::ValidationError;
pub use view::{ParseSortModeError, SortKey, SortMode, ViewQuery, visible_tasks};
