//! Keeps the task mirror in step with the remote task collection.

use crate::connectors::{DocumentStore, OrderBy, Record, Snapshots};
use crate::state::TaskMirror;
use crate::subscription::Subscription;
use crate::wire;
use futures::StreamExt;
use taskdeck_core::Task;
use tracing::{error, info, warn};

pub struct TaskFeed;

impl TaskFeed {
    /// Subscribes to `collection`, newest first, and mirrors every snapshot into `tasks`.
    pub fn start(
        documents: &dyn DocumentStore,
        collection: &str,
        tasks: TaskMirror,
    ) -> Subscription {
        info!(collection, "Subscribing to tasks");
        let snapshots = documents.subscribe_collection(collection, OrderBy::desc(wire::CREATED_AT));
        Subscription::spawn("task-feed", run(snapshots, tasks))
    }
}

async fn run(mut snapshots: Snapshots, tasks: TaskMirror) {
    while let Some(next) = snapshots.next().await {
        match next {
            Ok(records) => {
                let count = records.len();
                let mirrored = tasks_from_snapshot(&records);
                let changed = tasks.apply(|store| store.replace_all(mirrored));
                info!(count, changed, "Received task snapshot");
            }
            // The mirror keeps its last good snapshot.
            Err(e) => error!(error = %e, "Error fetching tasks"),
        }
    }
}

/// Converts a snapshot, skipping documents that are not valid tasks.
pub fn tasks_from_snapshot(records: &[Record]) -> Vec<Task> {
    records
        .iter()
        .filter_map(|record| match wire::task_from_record(record) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(error = %e, "Skipping task document");
                None
            }
        })
        .collect()
}
