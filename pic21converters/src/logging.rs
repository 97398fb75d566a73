//!
//! # Logging Setup
//!

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Filters by `RUST_LOG` if set, defaulting to `info`.
/// `verbose` raises the level to `debug` regardless.
pub fn init_logging(verbose: bool) {
    let filter = match verbose {
        true => EnvFilter::new("debug"),
        false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    if let Err(e) = installed {
        tracing::debug!("Keeping the existing subscriber: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice() {
        init_logging(true);
        init_logging(false);
        tracing::debug!("still logging");
    }
}
