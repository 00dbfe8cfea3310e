#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Gomoku Server
//!
//! A multi-room Gomoku (five-in-a-row) game server speaking a line-delimited
//! JSON protocol over TCP.
//!
//! All state is in memory — no database, no persistence across restarts.
//! Just run the binary and connect.

/// Server configuration and defaults
pub mod config;

/// Board rule engine (pure, deterministic)
pub mod game;

/// Structured logging configuration
pub mod logging;

/// TCP transport and per-connection plumbing
pub mod net;

/// Wire message protocol definitions
pub mod protocol;

/// Room directory
pub mod registry;

/// Per-room session state machines
pub mod room;

/// Message dispatch and background services
pub mod server;
