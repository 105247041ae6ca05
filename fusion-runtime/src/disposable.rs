//! LIFO teardown of resources transport executors register at construction.

use std::sync::Arc;

use tokio::sync::Mutex;
use tower::BoxError;
use tracing::warn;

use crate::executor::Disposable;

/// An append-only (during normal operation) stack of disposers, drained
/// last-in-first-out at shutdown.
///
/// Disposing while requests are still in flight is not safe: the caller is
/// responsible for quiescing new requests before calling [`Self::dispose_all`].
#[derive(Default)]
pub struct DisposableStack {
    entries: Mutex<Vec<Arc<dyn Disposable>>>,
}

impl DisposableStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, disposable: Arc<dyn Disposable>) {
        self.entries.lock().await.push(disposable);
    }

    /// Disposes every registered entry in LIFO order. Collects every error
    /// rather than stopping at the first, since later entries may hold
    /// resources that would otherwise leak.
    pub async fn dispose_all(&self) -> Result<(), BoxError> {
        let mut entries = self.entries.lock().await;
        let mut errors = Vec::new();
        while let Some(disposable) = entries.pop() {
            if let Err(err) = disposable.dispose().await {
                warn!(error = %err, "error disposing subgraph executor resource");
                errors.push(err);
            }
        }
        if let Some(first) = errors.into_iter().next() {
            return Err(first);
        }
        Ok(())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
