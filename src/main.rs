use anyhow::Result;
use clap::{Parser, Subcommand};
use portdeck::cli::{self, Dashboard};
use portdeck::domain::LifecycleAction;
use portdeck::infra::TracingNotifier;
use portdeck::infra::config::{default_config_dir, load_config};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portdeck", version, about = "Watch and drive the containers behind a Portainer endpoint")]
struct Cli {
    /// Config directory (default: ~/.config/portdeck)
    #[arg(long, env = "PORTDECK_CONFIG_DIR", value_parser = expand_path)]
    config_dir: Option<PathBuf>,

    /// Dashboard API base URL, overrides [dashboard] base_url
    #[arg(long, global = true, env = "PORTDECK_API_URL")]
    api: Option<String>,

    /// Talk to Portainer directly instead of the dashboard API
    #[arg(long, global = true)]
    direct: bool,

    /// Debug logging (RUST_LOG wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List containers with their state and the actions they accept
    Ls,
    /// Start a stopped container
    Start { container: String },
    /// Stop a running or paused container
    Stop { container: String },
    /// Restart a container
    Restart { container: String },
    /// Pause a running container
    Pause { container: String },
    /// Resume a paused container
    #[command(alias = "unpause")]
    Resume { container: String },
    /// Serve the dashboard API in front of Portainer
    Serve {
        /// Listen address, overrides [server] bind
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Write a default portdeck.toml into the config directory
    Init,
}

fn expand_path(raw: &str) -> Result<PathBuf, String> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_dir = cli.config_dir.unwrap_or_else(default_config_dir);

    let target = match cli.command {
        Commands::Init => return cli::setup::install(&config_dir),
        Commands::Serve { bind } => {
            let config = load_config(&config_dir, &std::env::current_dir()?)?;
            return cli::serve::run(&config, bind).await;
        }
        Commands::Ls => None,
        Commands::Start { container } => Some((container, LifecycleAction::Start)),
        Commands::Stop { container } => Some((container, LifecycleAction::Stop)),
        Commands::Restart { container } => Some((container, LifecycleAction::Restart)),
        Commands::Pause { container } => Some((container, LifecycleAction::Pause)),
        Commands::Resume { container } => Some((container, LifecycleAction::Resume)),
    };

    let config = load_config(&config_dir, &std::env::current_dir()?)?;
    let gateway = cli::build_gateway(&config, cli.api.as_deref(), cli.direct)?;
    let dashboard = Dashboard::new(gateway, Arc::new(TracingNotifier), config.reserved_names());

    let mut out = std::io::stdout().lock();
    match target {
        Some((container, action)) => dashboard.act(&container, action, &mut out).await,
        None => dashboard.list(&mut out).await,
    }
}
