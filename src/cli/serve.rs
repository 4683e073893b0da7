use crate::infra::PortainerGateway;
use crate::infra::config::AppConfig;
use crate::server;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Runs the dashboard API in front of the configured Portainer endpoint
pub async fn run(config: &AppConfig, bind: Option<SocketAddr>) -> Result<()> {
    let settings = config.portainer_settings()?;
    let addr = match bind {
        Some(addr) => addr,
        None => config.bind_addr()?,
    };

    info!(
        "Proxying Portainer {} (endpoint {})",
        settings.url, settings.endpoint_id
    );
    let gateway =
        PortainerGateway::new(settings, config.timeout()).context("building Portainer client")?;

    server::serve(addr, Arc::new(gateway)).await
}
