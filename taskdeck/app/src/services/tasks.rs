use crate::connectors::DocumentStore;
use crate::error::AppError;
use crate::services::{InFlight, InFlightKeys};
use crate::state::TaskMirror;
use crate::wire;
use chrono::Utc;
use std::sync::Arc;
use taskdeck_core::{Task, TaskDraft, TaskId};
use tracing::info;

/// Create, edit and delete tasks.
///
/// Each call writes to the backend first and patches the local mirror only
/// once the write succeeded. A failed write leaves the mirror untouched.
pub struct TaskService {
    documents: Arc<dyn DocumentStore>,
    tasks: TaskMirror,
    collection: String,
    creating: InFlight,
    pending: InFlightKeys<TaskId>,
}

impl TaskService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        tasks: TaskMirror,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            tasks,
            collection: collection.into(),
            creating: InFlight::default(),
            pending: InFlightKeys::default(),
        }
    }

    #[tracing::instrument(skip_all, fields(title = %draft.title))]
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, AppError> {
        let draft = draft.validated()?;
        let _guard = self.creating.begin()?;
        let created_at = Utc::now();
        let id = self
            .documents
            .add_record(&self.collection, wire::new_task_fields(&draft, created_at))
            .await?;
        let task = Task::from_draft(id, draft, created_at);
        self.tasks.apply(|store| store.insert_local(task.clone()));
        info!(id = %task.id, "Task created");
        Ok(task)
    }

    #[tracing::instrument(skip_all, fields(id = %task.id))]
    pub async fn update(&self, task: Task) -> Result<Task, AppError> {
        task.validate()?;
        let _guard = self.pending.begin(&task.id)?;
        let previous = self.tasks.get(&task.id);
        let fields = wire::changed_fields(previous.as_ref(), &task);
        self.documents
            .update_record(&self.collection, task.id.as_str(), fields)
            .await?;
        self.tasks.apply(|store| store.update_local(task.clone()));
        info!("Task updated");
        Ok(task)
    }

    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &TaskId) -> Result<(), AppError> {
        let _guard = self.pending.begin(id)?;
        self.documents.delete_record(&self.collection, id.as_str()).await?;
        self.tasks.apply(|store| store.remove_local(id));
        info!("Task deleted");
        Ok(())
    }
}
