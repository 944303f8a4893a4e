//! Pluggable progress logging.
//!
//! The crate never prints on its own. Callers that want progress messages
//! pass an [`InfoLogger`], a shared callback receiving one line per message.

use std::sync::Arc;
use std::time::Instant;

/// Callback receiving informational messages.
pub type InfoLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Logger that writes every message to stdout.
pub fn stdout_logger() -> InfoLogger {
    Arc::new(|msg: &str| println!("{msg}"))
}

/// Measures wall-clock time since creation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timer {
    start: Instant,
}

impl Timer {
    pub(crate) fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub(crate) fn elapsed_millis(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}
