//! Store calls from async code.
//!
//! Every adapter method is synchronous and may hold the connection lock for
//! the length of a statement. Async callers go through [`on_blocking_pool`]
//! so a long prune or aggregate never parks a runtime worker.

use crate::error::{StoreError, StoreResult};
use std::sync::Arc;

/// Run `op` against `store` on tokio's blocking pool.
pub async fn on_blocking_pool<S, T, F>(store: &Arc<S>, op: F) -> StoreResult<T>
where
    S: ?Sized + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> StoreResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}
