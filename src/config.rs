//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

use crate::error::{InactivityError, Result};

/// Countdown length used when none is configured
pub const DEFAULT_TIME_FOR_INACTIVITY: Duration = Duration::from_millis(10_000);

/// Per-region configuration fixed at mount (except `duration`, which the
/// control handle can change)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactivityConfig {
    /// Time without activity before the region is considered inactive
    pub duration: Duration,
    /// State assumed at mount; never announced
    pub initial_active: bool,
    /// Ignore keyboard show/hide transitions
    pub suppress_keyboard_reset: bool,
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_TIME_FOR_INACTIVITY,
            initial_active: true,
            suppress_keyboard_reset: false,
        }
    }
}

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "user-inactivity")]
#[command(about = "Serve an inactivity-tracked region whose activity is reported over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Time without activity before the region turns inactive, in milliseconds
    #[arg(short, long = "timer-ms", default_value = "10000")]
    pub timer_ms: u64,

    /// Start the region as inactive
    #[arg(long)]
    pub initial_inactive: bool,

    /// Do not reset the timer on keyboard show/hide
    #[arg(long)]
    pub skip_keyboard: bool,

    /// Run countdowns on a dedicated thread instead of the async runtime
    #[arg(long)]
    pub background_timer: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Build the region configuration, rejecting a zero timer
    pub fn inactivity(&self) -> Result<InactivityConfig> {
        Ok(InactivityConfig {
            duration: parse_duration_ms(self.timer_ms)?,
            initial_active: !self.initial_inactive,
            suppress_keyboard_reset: self.skip_keyboard,
        })
    }
}

/// Convert a host-supplied millisecond count into a countdown length
pub fn parse_duration_ms(ms: u64) -> Result<Duration> {
    if ms == 0 {
        return Err(InactivityError::InvalidDuration(ms));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_defaults() {
        let config = InactivityConfig::default();
        assert_eq!(config.duration, Duration::from_secs(10));
        assert!(config.initial_active);
        assert!(!config.suppress_keyboard_reset);
    }

    #[test]
    fn cli_flags_map_onto_region_config() {
        let cli = Config::try_parse_from([
            "user-inactivity",
            "--timer-ms",
            "2500",
            "--initial-inactive",
            "--skip-keyboard",
        ])
        .unwrap();

        let config = cli.inactivity().unwrap();
        assert_eq!(config.duration, Duration::from_millis(2500));
        assert!(!config.initial_active);
        assert!(config.suppress_keyboard_reset);
        assert_eq!(cli.address(), "127.0.0.1:20554");
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn zero_timer_is_rejected() {
        let cli = Config::try_parse_from(["user-inactivity", "-t", "0"]).unwrap();
        assert!(matches!(cli.inactivity(), Err(InactivityError::InvalidDuration(0))));
    }
}
