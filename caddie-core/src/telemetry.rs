//! Tracing subscriber setup for hosts that don't install their own.

use tracing_subscriber::EnvFilter;

use crate::config::GeneralConfig;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `config.log_level`.
///
/// Returns `false` if a global subscriber was already installed (the host's
/// wins; this call is then a no-op).
pub fn init_tracing(config: &GeneralConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_noop() {
        let config = GeneralConfig::default();
        let _first = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
