//! Observer configuration, from the command line or built in code.

use clap::Parser;
use level_net::connection::{DEFAULT_NATS_URL, NATS_URL_ENV};

/// Command-line arguments of the standalone observer.
#[derive(Debug, Clone, Parser)]
#[command(name = "level_observer", about = "Mirrors a level's actor placements from a level server")]
pub struct ObserverArgs {
    /// NATS server URL
    #[arg(short, long, env = NATS_URL_ENV, default_value = DEFAULT_NATS_URL)]
    pub nats_url: String,

    /// Keep mirroring after the level ends instead of exiting
    #[arg(long)]
    pub keep_running: bool,
}

impl ObserverArgs {
    #[must_use]
    pub fn config(&self) -> ObserverConfig {
        ObserverConfig {
            nats_url: self.nats_url.clone(),
            exit_on_level_end: !self.keep_running,
        }
    }
}

/// Configuration for an observer process.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub nats_url: String,
    /// Stop when the server ends the level instead of waiting for the next.
    pub exit_on_level_end: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            nats_url: DEFAULT_NATS_URL.to_string(),
            exit_on_level_end: true,
        }
    }
}

impl ObserverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the NATS URL for this observer.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = url.into();
        self
    }

    /// Keep running across levels.
    #[must_use]
    pub fn keep_running(mut self) -> Self {
        self.exit_on_level_end = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ObserverConfig::new()
            .with_nats_url("nats://example:4222")
            .keep_running();
        assert_eq!(config.nats_url, "nats://example:4222");
        assert!(!config.exit_on_level_end);
        assert!(ObserverConfig::default().exit_on_level_end);
        assert_eq!(ObserverConfig::default().nats_url, DEFAULT_NATS_URL);
    }

    #[test]
    fn test_args_to_config() {
        let args = ObserverArgs::try_parse_from([
            "level_observer",
            "--nats-url",
            "nats://test:4222",
            "--keep-running",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.nats_url, "nats://test:4222");
        assert!(!config.exit_on_level_end);
    }

    #[test]
    fn test_args_exit_on_level_end_by_default() {
        let args = ObserverArgs::try_parse_from(["level_observer", "-n", "nats://test:4222"]).unwrap();
        assert!(args.config().exit_on_level_end);
    }
}
