pub mod dashboard;
pub mod serve;
pub mod setup;

pub use dashboard::{Dashboard, render_row, render_snapshot};

use crate::domain::ContainerGateway;
use crate::infra::config::AppConfig;
use crate::infra::{HttpGateway, PortainerGateway};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Picks the gateway the dashboard talks to.
///
/// `direct` skips the dashboard API and goes straight to Portainer with the
/// configured credentials. Otherwise `api_override` (from `--api` or
/// `PORTDECK_API_URL`) wins over `[dashboard] base_url`.
pub fn build_gateway(
    config: &AppConfig,
    api_override: Option<&str>,
    direct: bool,
) -> Result<Arc<dyn ContainerGateway>> {
    if direct {
        let settings = config.portainer_settings()?;
        debug!("Using Portainer directly at {}", settings.url);
        let gateway = PortainerGateway::new(settings, config.timeout())
            .context("building Portainer client")?;
        return Ok(Arc::new(gateway));
    }

    let base_url = api_override.unwrap_or_else(|| config.api_url());
    debug!("Using dashboard API at {base_url}");
    let gateway =
        HttpGateway::new(base_url, config.timeout()).context("building dashboard API client")?;
    Ok(Arc::new(gateway))
}
