use crate::domain::Notifier;
use tracing::{error, info};

/// Delivers notifications as log events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        info!(target: "portdeck::notify", "{message}");
    }

    fn notify_failure(&self, message: &str) {
        error!(target: "portdeck::notify", "{message}");
    }
}
