pub mod config;
pub mod http_gateway;
pub mod notifier;
pub mod portainer;

pub use http_gateway::HttpGateway;
pub use notifier::TracingNotifier;
pub use portainer::{PortainerGateway, PortainerSettings};
