//! Environment variable based runtime configuration.
//!
//! ## Environment Variables
//!
//! ### `SENDERO_DISPATCH_MODE`
//!
//! Selects how the pipeline finalizes unmatched requests:
//!
//! - `standalone` (default): the dispatcher is the sole handler and answers
//!   unmatched requests with the fixed 404 template.
//! - `composed`: the dispatcher is embedded in an outer handler chain and
//!   reports unmatched requests as not consumed without writing a body.
//!
//! ```bash
//! export SENDERO_DISPATCH_MODE=composed
//! ```

use crate::dispatcher::DispatchMode;
use std::env;
use tracing::warn;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Deployment mode for the dispatch pipeline (default: standalone)
    pub dispatch_mode: DispatchMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::Standalone,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults on unset or unrecognized values.
    #[must_use]
    pub fn from_env() -> Self {
        let dispatch_mode = match env::var("SENDERO_DISPATCH_MODE") {
            Ok(val) => match val.to_ascii_lowercase().as_str() {
                "composed" => DispatchMode::Composed,
                "standalone" => DispatchMode::Standalone,
                other => {
                    warn!(
                        value = other,
                        "unrecognized SENDERO_DISPATCH_MODE, using standalone"
                    );
                    DispatchMode::Standalone
                }
            },
            Err(_) => DispatchMode::Standalone,
        };
        RuntimeConfig { dispatch_mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_standalone() {
        assert_eq!(
            RuntimeConfig::default().dispatch_mode,
            DispatchMode::Standalone
        );
    }
}
