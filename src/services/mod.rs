mod dispatcher;
mod snapshot_store;

pub use dispatcher::{DispatchError, LifecycleDispatcher, failure_message, success_message};
pub use snapshot_store::{REFRESH_FAILED, REFRESH_SUCCEEDED, SnapshotStore, assemble};
