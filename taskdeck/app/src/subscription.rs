use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a background listener.
///
/// The listener stops when [`Subscription::cancel`] is awaited or the handle
/// is dropped; after either it makes no further state changes.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Runs `work` on the runtime until it finishes or is cancelled.
    pub fn spawn<F>(name: &'static str, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel, cancelled) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled => debug!(subscription = name, "Unsubscribed"),
                _ = work => debug!(subscription = name, "Source ended"),
            }
        });
        Self {
            name,
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True once the listener has stopped, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Stops the listener and waits until it has let go of its state.
    pub async fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
