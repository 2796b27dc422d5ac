use crate::config::LoggingConfig;
use crate::core::ConfigError;

/// Installs a `tracing` fmt subscriber at the configured level.
///
/// Returns `Ok(false)` when a global subscriber was already installed, in
/// which case the existing one is kept.
pub fn init(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let level = config.level()?;
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok();
    Ok(installed)
}
