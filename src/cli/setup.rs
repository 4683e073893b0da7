use crate::infra::config::{CONFIG_FILE_NAME, install_default_config};
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub fn install(config_dir: &Path) -> Result<()> {
    info!("Preparing config in {:?}", config_dir);

    if install_default_config(config_dir)? {
        info!(
            "Wrote {:?}. Fill in [portainer] or point [dashboard] base_url at your API.",
            config_dir.join(CONFIG_FILE_NAME)
        );
    } else {
        info!(
            "{:?} already exists, leaving it untouched",
            config_dir.join(CONFIG_FILE_NAME)
        );
    }

    Ok(())
}
