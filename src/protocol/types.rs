use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Board side length. The grid is `BOARD_SIZE` × `BOARD_SIZE` cells.
pub const BOARD_SIZE: usize = 15;

/// Unique identifier for client connections
pub type ConnectionId = Uuid;
/// Unique identifier for rooms (`room_<N>`, allocated by the registry)
pub type RoomId = String;

/// Stone color. Black always moves first in a fresh game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StoneColor {
    Black,
    White,
}

impl StoneColor {
    /// The opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl fmt::Display for StoneColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Seats filling up, or waiting for both players to ready up
    Waiting,
    /// A game is in progress (possibly paused by a disconnection)
    Playing,
    /// The last game ended; a rematch may restart it
    Finished,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a connection participates in a room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Spectator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Spectator => f.write_str("spectator"),
        }
    }
}

/// Serialized board grid: 15×15 cells, each `null`, `"black"` or `"white"`.
pub type BoardGrid = [[Option<StoneColor>; BOARD_SIZE]; BOARD_SIZE];

/// Per-player ready flags, keyed by display name.
pub type ReadyStatus = BTreeMap<String, bool>;

/// Name and color of a seated player, as listed in `GAME_START`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub color: StoneColor,
}

/// Immutable room summary returned by `LIST_ROOMS`.
///
/// Counts cover live connections only; a seat whose player is disconnected
/// mid-game does not show up in `player_count` or `players`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub player_count: usize,
    pub spectator_count: usize,
    pub players: Vec<String>,
    pub current_turn: StoneColor,
}
