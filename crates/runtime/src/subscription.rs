use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

/// Scoped event subscription backed by a spawned listener task.
///
/// Dropping the subscription aborts the listener, so re-initializing a
/// component never leaves a second handler attached to the same source.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawns `listener` on the current tokio runtime.
    pub fn spawn<F>(name: &'static str, listener: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(subscription = name, "subscribed");
        Self {
            name,
            handle: Some(tokio::spawn(listener)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// False once the listener has returned or been cancelled.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(subscription = self.name, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
