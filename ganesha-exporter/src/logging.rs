// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogLevel;

const OWN_CRATES: &[&str] = &["nfs_ganesha_exporter", "ganesha_dbus"];

/// Filter used when `RUST_LOG` is not set: `level` for our crates, `warn` elsewhere.
pub fn default_filter(level: LogLevel) -> EnvFilter {
    let directives = std::iter::once("warn".to_string())
        .chain(
            OWN_CRATES
                .iter()
                .map(|krate| format!("{krate}={}", level.as_directive())),
        )
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(directives)
}

pub fn init(level: LogLevel) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_scopes_level_to_own_crates() {
        let filter = default_filter(LogLevel::Debug).to_string();
        assert!(filter.contains("nfs_ganesha_exporter=debug"));
        assert!(filter.contains("ganesha_dbus=debug"));
        assert!(filter.contains("warn"));
    }
}
