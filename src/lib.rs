pub mod cli;
pub mod domain;
pub mod infra;
pub mod server;
pub mod services;

// Make test_support available for integration tests
pub mod test_support;

pub use domain::{
    ActionResult, ContainerGateway, ContainerRecord, ContainerState, GatewayError,
    LifecycleAction, Notifier, Snapshot,
};
pub use infra::{HttpGateway, PortainerGateway, TracingNotifier};
pub use services::{DispatchError, LifecycleDispatcher, SnapshotStore};
