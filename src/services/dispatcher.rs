use super::SnapshotStore;
use crate::domain::{
    ActionResult, ContainerGateway, ContainerState, GatewayError, LifecycleAction, Notifier,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Cannot {action} container {id}: it is {state}")]
    InvalidTransition {
        id: String,
        action: LifecycleAction,
        state: ContainerState,
    },
    #[error("Container {0} is not in the current snapshot")]
    ContainerNotFound(String),
    #[error("An action for container {0} is already in progress")]
    ActionInFlight(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl DispatchError {
    /// Rejections raised locally, before the gateway is contacted
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Gateway(_))
    }
}

/// Message for a failed command: the backend's own text when it sent one
pub fn failure_message(err: &GatewayError, action: LifecycleAction) -> String {
    match err.detail() {
        Some(detail) if !detail.trim().is_empty() => detail.to_string(),
        _ => format!("Failed to {action} container"),
    }
}

pub fn success_message(action: LifecycleAction) -> String {
    format!("Container {} successfully", action.past_tense())
}

/// Marks a container id as busy until dropped
struct InFlight<'a> {
    ids: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Validates and sends lifecycle commands, then resynchronizes the snapshot.
///
/// Local state is never patched: every visible change comes from the refresh
/// that follows each command, successful or not.
#[derive(Debug)]
pub struct LifecycleDispatcher {
    gateway: Arc<dyn ContainerGateway>,
    store: Arc<SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    in_flight: Mutex<HashSet<String>>,
}

impl LifecycleDispatcher {
    pub fn new(
        gateway: Arc<dyn ContainerGateway>,
        store: Arc<SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Legal actions for `id` in the current snapshot, `None` if it is not there
    pub fn allowed_actions(&self, id: &str) -> Option<Vec<LifecycleAction>> {
        self.store
            .current_snapshot()
            .get(id)
            .map(|record| record.state.allowed_actions())
    }

    fn try_mark(&self, id: &str) -> Option<InFlight<'_>> {
        let mut ids = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id.to_string()) {
            return None;
        }
        Some(InFlight {
            ids: &self.in_flight,
            id: id.to_string(),
        })
    }

    fn reject(&self, err: DispatchError) -> DispatchError {
        warn!("{err}");
        self.notifier.notify_failure(&err.to_string());
        err
    }

    pub async fn dispatch(
        &self,
        id: &str,
        action: LifecycleAction,
    ) -> Result<ActionResult, DispatchError> {
        let Some(_mark) = self.try_mark(id) else {
            return Err(self.reject(DispatchError::ActionInFlight(id.to_string())));
        };

        let state = {
            let snapshot = self.store.current_snapshot();
            match snapshot.get(id) {
                Some(record) => record.state.clone(),
                None => return Err(self.reject(DispatchError::ContainerNotFound(id.to_string()))),
            }
        };

        if !state.allows(action) {
            return Err(self.reject(DispatchError::InvalidTransition {
                id: id.to_string(),
                action,
                state,
            }));
        }

        info!("Requesting {action} for container {id} (currently {state})");
        let outcome = self.gateway.perform(action, id).await;

        match &outcome {
            Ok(_) => self.notifier.notify_success(&success_message(action)),
            Err(e) => {
                error!("{action} for container {id} failed: {e}");
                self.notifier.notify_failure(&failure_message(e, action));
            }
        }

        // the remote side is the authority, so resync whatever happened
        if let Err(e) = self.store.refresh().await {
            warn!("Refresh after {action} of {id} failed: {e}");
        }

        outcome.map_err(DispatchError::from)
    }
}
