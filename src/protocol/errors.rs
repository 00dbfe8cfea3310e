use thiserror::Error;

use super::messages::ServerMessage;

/// Error kinds surfaced to clients as `ERROR` envelopes.
///
/// Each variant's `Display` string is the human-readable message placed on
/// the wire. Rule and access errors go to the originating connection only;
/// they never mutate other participants' views.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ErrorKind {
    // Access errors
    #[error("You are not in a room")]
    NotInRoom,
    #[error("You are not a player in this game")]
    NotSeated,
    #[error("Only spectators can use spectator chat")]
    NotSpectator,
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,

    // Game-rule errors
    #[error("Invalid position: ({x}, {y})")]
    InvalidPosition { x: i32, y: i32 },
    #[error("Position already occupied: ({x}, {y})")]
    Occupied { x: i32, y: i32 },
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Game is not in progress")]
    NotPlaying,
    #[error("Cannot request rematch: game not finished")]
    NotFinished,

    // Session errors
    #[error("No reconnectable session found")]
    NoReconnectSession,
    #[error("Reconnection window expired (3 minutes)")]
    ReconnectTimedOut,
    #[error("Maximum reconnection attempts ({0}) exceeded")]
    ReconnectAttemptsExceeded(u32),
}

impl ErrorKind {
    /// Wrap this error in the wire-level `ERROR` message.
    pub fn into_message(self) -> ServerMessage {
        ServerMessage::Error {
            message: self.to_string(),
        }
    }
}
