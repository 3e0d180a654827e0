use crate::connectors::{AuthError, BackendError};
use taskdeck_core::ValidationError;
use thiserror::Error;

/// Why a user action did not go through.
///
/// None of these is fatal. The state in place before the action is kept and
/// the error is shown to the user as an [`Alert`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The same action is still waiting on the backend.
    #[error("Please wait for the previous request to finish")]
    Busy,
}

/// A user action that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SignIn,
    SignUp,
    SignOut,
    CreateTask,
    UpdateTask,
    DeleteTask,
}

impl Action {
    /// The confirmation shown when the action succeeds, if any.
    pub fn success_alert(self) -> Option<Alert> {
        let message = match self {
            Action::SignUp => "Account created successfully!",
            Action::CreateTask => "Task created successfully!",
            Action::UpdateTask => "Task updated successfully!",
            Action::DeleteTask => "Task deleted successfully!",
            Action::SignIn | Action::SignOut => return None,
        };
        let title = if self == Action::DeleteTask {
            "Deleted"
        } else {
            "Success"
        };
        Some(Alert::new(title, message))
    }
}

/// A dismissible message box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl AppError {
    /// What to tell the user when `action` failed with this error.
    pub fn alert(&self, action: Action) -> Alert {
        match self {
            AppError::Validation(e) => Alert::new("Validation", e.to_string()),
            AppError::Busy => Alert::new("Please wait", self.to_string()),
            AppError::Auth(e) => match action {
                Action::SignUp => Alert::new("Signup Failed", e.to_string()),
                _ => Alert::new("Login Failed", e.to_string()),
            },
            AppError::Backend(e) => match action {
                Action::SignIn => Alert::new("Login Failed", e.to_string()),
                Action::SignUp => Alert::new("Signup Failed", e.to_string()),
                Action::SignOut => Alert::new("Error", e.to_string()),
                Action::CreateTask => Alert::new("Error", "Failed to add task"),
                Action::UpdateTask => Alert::new("Error", "Failed to update task"),
                Action::DeleteTask => Alert::new("Error", "Failed to delete task"),
            },
        }
    }
}
