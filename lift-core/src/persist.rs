//! Fire-and-forget write-through persistence
//!
//! Every store mutation serializes a snapshot of the full store state and
//! hands it to the storage adapter on the ambient tokio runtime without
//! awaiting the result. In-memory state stays authoritative for the process
//! lifetime; a failed or lost write only risks dropping the most recent
//! mutation on restart. Writes are unordered between each other; `flush()`
//! on a store is the authoritative save.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use lift_storage::StorageAdapter;

/// Serialize `state` and spawn a best-effort write under `key`
///
/// Skipped with a log line when called outside a tokio runtime.
pub(crate) fn write_through<S: Serialize>(
    storage: &Arc<dyn StorageAdapter>,
    key: &'static str,
    state: &S,
) {
    let payload = match serde_json::to_string(state) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("failed to serialize state for {key}: {e}");
            return;
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let storage = Arc::clone(storage);
            handle.spawn(async move {
                if let Err(e) = storage.set(key, &payload).await {
                    warn!("failed to persist {key}: {e}");
                }
            });
        }
        Err(_) => debug!("no async runtime, skipping write-through for {key}"),
    }
}
