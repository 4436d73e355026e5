//! Config for the evaluator behaviors
//!
//! This module provides configuration options for controlling the behavior of the evaluator.
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive, set them to `"true"` to enable them.
//!
//! - `TOURNAMENT_VERBOSE`: print match progress to stdout (default: `true`)
//! - `TOURNAMENT_LOG`: enable logging to a file (default: `false`)
//! - `TOURNAMENT_SEED`: seed of the bracket shuffle and draw coin flips (default: none, random)
//! - `TOURNAMENT_ACTION_TIMEOUT_MS`: time a process agent gets per action (default: `1000`)
//! - `TOURNAMENT_MAX_TURNS`: turns after which a match is scored as it stands (default: `1000`)
//! - `TOURNAMENT_RECORD_TRACES`: keep move traces in match records (default: `false`)
//! - `TOURNAMENT_PERSIST_RETRIES`: extra attempts per failed result write (default: `2`)
//! - `TOURNAMENT_DEBUG_AGENT_STDERR`: print agent stderr for debugging (default: `false`)

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::adapter::DEFAULT_MAX_TURNS;

/// Configuration for evaluator behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) seed: Option<u64>,
    pub(crate) action_timeout: Duration,
    pub(crate) max_turns: u32,
    pub(crate) record_traces: bool,
    pub(crate) persist_retries: u32,
    pub(crate) debug_agent_stderr: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - The evaluator will print match progress to stdout.
    /// - Logging to file is disabled.
    /// - The random generator is seeded from entropy.
    /// - Process agents get one second per action.
    /// - Matches are capped at 1000 turns.
    /// - Move traces are not kept.
    /// - Failed result writes are retried twice.
    /// - Agent stderr output is disabled
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            seed: None,
            action_timeout: Duration::from_millis(1000),
            max_turns: DEFAULT_MAX_TURNS,
            record_traces: false,
            persist_retries: 2,
            debug_agent_stderr: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the [module documentation](self) for the recognized variables. Unset variables keep
    /// their default value, as do numbers that do not parse (with a warning).
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_number<T: FromStr>(var: &str) -> Option<T> {
            let val = std::env::var(var).ok()?;
            let parsed = val.trim().parse().ok();
            if parsed.is_none() {
                warn!("ignoring {var}={val:?}: not a number");
            }
            parsed
        }

        let defaults = Self::new();
        Self {
            verbose: get_env_flag("TOURNAMENT_VERBOSE", defaults.verbose),
            log: get_env_flag("TOURNAMENT_LOG", defaults.log),
            seed: get_env_number("TOURNAMENT_SEED"),
            action_timeout: get_env_number("TOURNAMENT_ACTION_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.action_timeout),
            max_turns: get_env_number("TOURNAMENT_MAX_TURNS").unwrap_or(defaults.max_turns),
            record_traces: get_env_flag("TOURNAMENT_RECORD_TRACES", defaults.record_traces),
            persist_retries: get_env_number("TOURNAMENT_PERSIST_RETRIES")
                .unwrap_or(defaults.persist_retries),
            debug_agent_stderr: get_env_flag(
                "TOURNAMENT_DEBUG_AGENT_STDERR",
                defaults.debug_agent_stderr,
            ),
        }
    }

    /// Enable or disable silent mode.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Fix the seed of the random generator, for reproducible brackets.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Time a process agent gets to answer each state.
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Number of turns after which a match is scored as it stands.
    pub fn with_max_turns(mut self, value: u32) -> Self {
        self.max_turns = value;
        self
    }

    /// Keep the move-by-move trace in every match record.
    pub fn with_record_traces(mut self, value: bool) -> Self {
        self.record_traces = value;
        self
    }

    /// Extra attempts after a failed write to the result store.
    pub fn with_persist_retries(mut self, value: u32) -> Self {
        self.persist_retries = value;
        self
    }

    /// Enable or disable agent stderr output (debug purposes only).
    pub fn with_debug_agent_stderr(mut self, value: bool) -> Self {
        self.debug_agent_stderr = value;
        self
    }

    /// Seed of the random generator, if fixed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Time a process agent gets per action
    pub fn action_timeout(&self) -> Duration {
        self.action_timeout
    }

    /// Turn cap of a match
    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = Configuration::new()
            .with_verbose(false)
            .with_seed(Some(42))
            .with_max_turns(10)
            .with_action_timeout(Duration::from_millis(50));
        assert!(!config.verbose);
        assert_eq!(config.seed(), Some(42));
        assert_eq!(config.max_turns(), 10);
        assert_eq!(config.action_timeout(), Duration::from_millis(50));
        assert_eq!(config.persist_retries, 2);
    }

    #[test]
    fn from_env() {
        // only variables no other test reads
        std::env::set_var("TOURNAMENT_SEED", "7");
        std::env::set_var("TOURNAMENT_MAX_TURNS", "not a number");
        std::env::set_var("TOURNAMENT_RECORD_TRACES", "TRUE");
        let config = Configuration::from_env();
        assert_eq!(config.seed(), Some(7));
        assert_eq!(config.max_turns(), DEFAULT_MAX_TURNS);
        assert!(config.record_traces);
        std::env::remove_var("TOURNAMENT_SEED");
        std::env::remove_var("TOURNAMENT_MAX_TURNS");
        std::env::remove_var("TOURNAMENT_RECORD_TRACES");
    }
}
