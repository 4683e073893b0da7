use crate::domain::{
    ActionResult, ContainerGateway, ContainerRecord, ContainerState, GatewayError,
    LifecycleAction, Notifier,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Notify;

/// In-memory fleet that behaves like a well-mannered container API.
///
/// Every call is recorded (`list`, `start:<id>`, ...) so tests can assert on
/// what reached the gateway.
#[derive(Debug, Default)]
pub struct MockGateway {
    containers: RwLock<Vec<ContainerRecord>>,
    commands: RwLock<Vec<String>>,
    fail_on: RwLock<Option<(String, Option<String>)>>,
    gate: RwLock<Option<Arc<Notify>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_container(&self, id: &str, name: &str, state: ContainerState) {
        let mut record = ContainerRecord::new(id, format!("/{name}"), state);
        record.image = format!("{name}:latest");
        record.status = "mock".to_string();
        self.push_record(record);
    }

    pub fn push_record(&self, record: ContainerRecord) {
        self.containers.write().unwrap().push(record);
    }

    pub fn remove_container(&self, id: &str) {
        self.containers.write().unwrap().retain(|r| r.id != id);
    }

    /// Simulates a change made on the remote side
    pub fn set_state(&self, id: &str, state: ContainerState) {
        if let Some(record) = self.containers.write().unwrap().iter_mut().find(|r| r.id == id) {
            record.state = state;
        }
    }

    pub fn get_state(&self, id: &str) -> Option<ContainerState> {
        self.containers
            .read()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.state.clone())
    }

    /// Makes `operation` (`list`, `start`, `stop`, ...) fail with a 500 and no detail
    pub fn set_fail_on(&self, operation: &str) {
        *self.fail_on.write().unwrap() = Some((operation.to_string(), None));
    }

    pub fn set_fail_on_with_detail(&self, operation: &str, detail: &str) {
        *self.fail_on.write().unwrap() = Some((operation.to_string(), Some(detail.to_string())));
    }

    pub fn clear_failure(&self) {
        *self.fail_on.write().unwrap() = None;
    }

    pub fn get_commands(&self) -> Vec<String> {
        self.commands.read().unwrap().clone()
    }

    /// Lifecycle calls block until the returned handle is notified
    pub fn hold_actions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.write().unwrap() = Some(gate.clone());
        gate
    }

    pub fn release_actions(&self) {
        *self.gate.write().unwrap() = None;
    }

    fn record_command(&self, cmd: &str) {
        self.commands.write().unwrap().push(cmd.to_string());
    }

    fn check_fail(&self, operation: &str) -> Result<(), GatewayError> {
        if let Some((fail_on, detail)) = self.fail_on.read().unwrap().as_ref() {
            if fail_on == operation {
                return Err(GatewayError::Api {
                    status: 500,
                    detail: detail.clone(),
                });
            }
        }
        Ok(())
    }

    async fn apply(
        &self,
        action: LifecycleAction,
        id: &str,
    ) -> Result<ActionResult, GatewayError> {
        self.record_command(&format!("{action}:{id}"));

        let gate = self.gate.read().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.check_fail(action.as_str())?;

        let next = match action {
            LifecycleAction::Start | LifecycleAction::Restart | LifecycleAction::Resume => {
                ContainerState::Running
            }
            LifecycleAction::Stop => ContainerState::Exited,
            LifecycleAction::Pause => ContainerState::Paused,
        };

        let mut containers = self.containers.write().unwrap();
        let Some(record) = containers.iter_mut().find(|r| r.id == id) else {
            return Err(GatewayError::Api {
                status: 404,
                detail: Some(format!("No such container: {id}")),
            });
        };
        record.state = next;

        Ok(ActionResult::new(action, id))
    }
}

#[async_trait]
impl ContainerGateway for MockGateway {
    async fn list(&self) -> Result<Vec<ContainerRecord>, GatewayError> {
        self.record_command("list");
        self.check_fail("list")?;
        Ok(self.containers.read().unwrap().clone())
    }

    async fn start(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.apply(LifecycleAction::Start, id).await
    }

    async fn stop(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.apply(LifecycleAction::Stop, id).await
    }

    async fn restart(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.apply(LifecycleAction::Restart, id).await
    }

    async fn pause(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.apply(LifecycleAction::Pause, id).await
    }

    async fn resume(&self, id: &str) -> Result<ActionResult, GatewayError> {
        self.apply(LifecycleAction::Resume, id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

/// Notifier that keeps every message for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.messages.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Success(m) => Some(m),
                Notification::Failure(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Failure(m) => Some(m),
                Notification::Success(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(Notification::Success(message.to_string()));
    }

    fn notify_failure(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(Notification::Failure(message.to_string()));
    }
}
