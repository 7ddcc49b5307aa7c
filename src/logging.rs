//! Log output to stderr via tracing-subscriber.
//!
//! Filter precedence: `CLAIMBOOK_LOG` env var, then `--verbose` (debug), then
//! the config file's `log_level`, then warn.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{Error, Result};

pub const ENV_VAR: &str = "CLAIMBOOK_LOG";

static INIT_ONCE: Once = Once::new();

pub fn filter_directive(config: &Config) -> String {
    if config.verbose {
        return "claimbook=debug".to_string();
    }
    match &config.log_level {
        Some(level) => format!("claimbook={level}"),
        None => "claimbook=warn".to_string(),
    }
}

/// Filter for `config`. A malformed `log_level` is a config error rather
/// than a filter that silently drops every event.
pub fn filter(config: &Config) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_VAR) {
        return Ok(filter);
    }
    let directive = filter_directive(config);
    EnvFilter::try_new(&directive)
        .map_err(|e| Error::Config(format!("invalid log_level in '{directive}': {e}")))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &Config) -> Result<()> {
    let filter = filter(config)?;
    INIT_ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
    Ok(())
}
