use super::{ActionResult, ContainerRecord, LifecycleAction};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Human readable message supplied by the backend, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) => None,
        }
    }
}

/// Remote container API consumed by the snapshot store and the dispatcher
#[async_trait]
pub trait ContainerGateway: Send + Sync + Debug {
    /// Fetch every container known to the remote runtime
    async fn list(&self) -> Result<Vec<ContainerRecord>, GatewayError>;

    async fn start(&self, id: &str) -> Result<ActionResult, GatewayError>;

    async fn stop(&self, id: &str) -> Result<ActionResult, GatewayError>;

    async fn restart(&self, id: &str) -> Result<ActionResult, GatewayError>;

    async fn pause(&self, id: &str) -> Result<ActionResult, GatewayError>;

    async fn resume(&self, id: &str) -> Result<ActionResult, GatewayError>;

    /// Route `action` to the matching operation
    async fn perform(
        &self,
        action: LifecycleAction,
        id: &str,
    ) -> Result<ActionResult, GatewayError> {
        match action {
            LifecycleAction::Start => self.start(id).await,
            LifecycleAction::Stop => self.stop(id).await,
            LifecycleAction::Restart => self.restart(id).await,
            LifecycleAction::Pause => self.pause(id).await,
            LifecycleAction::Resume => self.resume(id).await,
        }
    }
}

/// Sink for user-facing outcome messages. Must never fail.
pub trait Notifier: Send + Sync + Debug {
    fn notify_success(&self, message: &str);

    fn notify_failure(&self, message: &str);
}
