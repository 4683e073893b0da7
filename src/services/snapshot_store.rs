use crate::domain::{ContainerGateway, ContainerRecord, GatewayError, Notifier, Snapshot};
use crate::infra::config::DEFAULT_RESERVED_NAMES;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

pub const REFRESH_SUCCEEDED: &str = "Containers loaded successfully";
pub const REFRESH_FAILED: &str = "Failed to load containers";

#[derive(Debug)]
struct Current {
    ticket: u64,
    snapshot: Arc<Snapshot>,
}

/// Holds the last fetched view of the fleet.
///
/// Every refresh replaces the whole snapshot. Readers get an `Arc<Snapshot>`
/// and never observe a half-applied update.
#[derive(Debug)]
pub struct SnapshotStore {
    gateway: Arc<dyn ContainerGateway>,
    notifier: Arc<dyn Notifier>,
    reserved_names: Vec<String>,
    next_ticket: AtomicU64,
    current: RwLock<Current>,
}

impl SnapshotStore {
    pub fn new(gateway: Arc<dyn ContainerGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            reserved_names: DEFAULT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
            next_ticket: AtomicU64::new(0),
            current: RwLock::new(Current {
                ticket: 0,
                snapshot: Arc::new(Snapshot::default()),
            }),
        }
    }

    pub fn with_reserved_names(mut self, names: Vec<String>) -> Self {
        self.reserved_names = names;
        self
    }

    pub fn reserved_names(&self) -> &[String] {
        &self.reserved_names
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Fetches the fleet and replaces the current snapshot.
    ///
    /// On failure the previous snapshot stays in place. A refresh that finishes
    /// after a newer one has already been applied is dropped.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, GatewayError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let raw = match self.gateway.list().await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Refresh #{ticket} failed: {e}");
                self.notifier.notify_failure(REFRESH_FAILED);
                return Err(e);
            }
        };

        let fetched = raw.len();
        let snapshot = Arc::new(assemble(raw, &self.reserved_names));

        let applied = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if ticket < current.ticket {
                debug!(
                    "Discarding refresh #{ticket}, #{} already applied",
                    current.ticket
                );
                return Ok(current.snapshot.clone());
            }
            current.ticket = ticket;
            current.snapshot = snapshot.clone();
            snapshot
        };

        info!(
            "Loaded {} container(s) ({} fetched)",
            applied.len(),
            fetched
        );
        self.notifier.notify_success(REFRESH_SUCCEEDED);
        Ok(applied)
    }
}

/// Filters reserved and malformed records, then sorts by display name (id breaks ties)
pub fn assemble(raw: Vec<ContainerRecord>, reserved_names: &[String]) -> Snapshot {
    let mut seen = HashSet::new();

    let mut records: Vec<ContainerRecord> = raw
        .into_iter()
        .filter(|record| {
            if record.names.is_empty() {
                warn!("Ignoring container {} without names", record.id);
                return false;
            }
            if reserved_names.iter().any(|name| record.has_name(name)) {
                debug!("Hiding reserved container {}", record.display_name());
                return false;
            }
            if !seen.insert(record.id.clone()) {
                warn!("Ignoring duplicate container id {}", record.id);
                return false;
            }
            true
        })
        .collect();

    records.sort_by(|a, b| {
        a.display_name()
            .cmp(b.display_name())
            .then_with(|| a.id.cmp(&b.id))
    });

    Snapshot::new(records)
}
