//! Process-wide log output.
//!
//! The hub only emits `tracing` events; installing a subscriber is left to
//! the application. [`init`] installs a formatting subscriber for
//! applications that don't bring their own.

use crate::config::HubConfig;
use crate::error::{HubError, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a formatting subscriber as the global default.
///
/// Fails when a global subscriber has already been set.
pub fn init(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).map_err(HubError::logging)
}

/// Like [`init`], at `INFO` when the configuration asks for request logging
/// and `WARN` otherwise.
pub fn init_from_config(config: &HubConfig) -> Result<()> {
    init(if config.log { Level::INFO } else { Level::WARN })
}

#[cfg(test)]
mod tests {
    use super::init;
    use tracing::Level;

    #[test]
    fn test_second_init_fails() {
        // the first call may lose against another test in this binary
        let _ = init(Level::DEBUG);
        assert!(init(Level::DEBUG).is_err());
    }
}
