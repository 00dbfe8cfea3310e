//! Server configuration.
//!
//! There is no configuration file; the listening endpoint comes from the CLI
//! and everything else defaults to the protocol constants. The durations are
//! still plain fields so tests can shrink them.

use std::time::Duration;

/// Turn clock per move.
pub const DEFAULT_TURN_TIME_LIMIT: Duration = Duration::from_secs(60);
/// Window during which a disconnected seat may reconnect.
pub const DEFAULT_RECONNECT_GRACE: Duration = Duration::from_secs(180);
/// Reconnections allowed per seat per game.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 2;
/// Cadence of the forfeit monitor sweep.
pub const DEFAULT_FORFEIT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
/// Advisory timeout advertised with rematch requests (not enforced).
pub const DEFAULT_REMATCH_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// Outbound messages buffered per connection before drops kick in.
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;
/// Longest accepted wire line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Tunables for room and session management.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Seconds a player has to place a stone before the turn is swapped
    pub turn_time_limit: Duration,
    /// Grace period for mid-game reconnection
    pub reconnect_grace: Duration,
    /// Maximum reconnections per seat
    pub max_reconnect_attempts: u32,
    /// Interval between forfeit-monitor sweeps
    pub forfeit_sweep_interval: Duration,
    /// Advisory rematch-response timeout advertised to clients
    pub rematch_response_timeout: Duration,
    /// Per-connection outbound queue depth
    pub outbound_queue_capacity: usize,
    /// Maximum accepted line length on the wire
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            turn_time_limit: DEFAULT_TURN_TIME_LIMIT,
            reconnect_grace: DEFAULT_RECONNECT_GRACE,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            forfeit_sweep_interval: DEFAULT_FORFEIT_SWEEP_INTERVAL,
            rematch_response_timeout: DEFAULT_REMATCH_RESPONSE_TIMEOUT,
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration, assembled from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Level directive; falls back to `RUST_LOG`, then `"info"`
    pub level: Option<String>,
    pub format: LogFormat,
    /// When set, also write daily-rotated log files into this directory
    pub dir: Option<String>,
}
