use crate::domain::{ContainerGateway, ContainerRecord, LifecycleAction, Notifier, Snapshot};
use crate::services::{LifecycleDispatcher, SnapshotStore};
use anyhow::{Result, anyhow};
use std::io::Write;
use std::sync::Arc;

/// Terminal front end over the snapshot store and the dispatcher
pub struct Dashboard {
    store: Arc<SnapshotStore>,
    dispatcher: LifecycleDispatcher,
}

impl Dashboard {
    pub fn new(
        gateway: Arc<dyn ContainerGateway>,
        notifier: Arc<dyn Notifier>,
        reserved_names: Vec<String>,
    ) -> Self {
        let store = Arc::new(
            SnapshotStore::new(gateway.clone(), notifier.clone())
                .with_reserved_names(reserved_names),
        );
        let dispatcher = LifecycleDispatcher::new(gateway, store.clone(), notifier);
        Self { store, dispatcher }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub async fn list(&self, out: &mut impl Write) -> Result<()> {
        let snapshot = self.store.refresh().await?;
        render_snapshot(&snapshot, out)?;
        Ok(())
    }

    /// Resolves `key` (id, id prefix or name) in a fresh snapshot and runs `action` on it
    pub async fn act(&self, key: &str, action: LifecycleAction, out: &mut impl Write) -> Result<()> {
        let snapshot = self.store.refresh().await?;
        let id = snapshot
            .find(key)
            .map(|record| record.id.clone())
            .ok_or_else(|| anyhow!("No container matches '{key}'"))?;

        let result = self.dispatcher.dispatch(&id, action).await;

        // the dispatcher has already refreshed, show what the remote side reports now
        match self.store.current_snapshot().get(&id) {
            Some(record) => render_row(record, out)?,
            None => writeln!(out, "{id} is no longer listed")?,
        }

        result?;
        Ok(())
    }
}

fn actions_label(record: &ContainerRecord) -> String {
    let actions: Vec<&str> = record
        .state
        .allowed_actions()
        .into_iter()
        .map(LifecycleAction::as_str)
        .collect();
    if actions.is_empty() {
        "-".to_string()
    } else {
        actions.join(",")
    }
}

pub fn render_row(record: &ContainerRecord, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<24} {:<11} {:<28} {:<28} {:<12} {}",
        record.display_name(),
        record.state.as_str(),
        record.status,
        record.image,
        record.short_id(),
        actions_label(record)
    )
}

pub fn render_snapshot(snapshot: &Snapshot, out: &mut impl Write) -> std::io::Result<()> {
    if snapshot.is_empty() {
        writeln!(out, "No containers found")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<24} {:<11} {:<28} {:<28} {:<12} {}",
        "NAME", "STATE", "STATUS", "IMAGE", "ID", "ACTIONS"
    )?;
    for record in snapshot.iter() {
        render_row(record, out)?;
    }
    writeln!(out, "\n{} container(s)", snapshot.len())
}
