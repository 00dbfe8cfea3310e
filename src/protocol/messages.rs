use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{
    BoardGrid, PlayerSummary, ReadyStatus, Role, RoomId, RoomInfo, RoomStatus, StoneColor,
};

/// Message types sent from client to server.
///
/// Variant names map onto the wire `type` strings verbatim
/// (`CreateRoom` → `CREATE_ROOM`). Every variant uses struct syntax so that
/// the `data` object of the envelope is always a JSON map, matching clients
/// that send `"data": {}` for parameterless requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Create a fresh room and take the first (black) seat
    CreateRoom { player_name: String },
    /// Take the second seat of an existing room
    JoinRoom { room_id: RoomId, player_name: String },
    /// Join a room as a read-only observer
    SpectateRoom {
        room_id: RoomId,
        spectator_name: String,
    },
    /// Request the current room directory
    ListRooms {},
    /// Leave the current room (graceful)
    LeaveRoom {},
    /// Toggle this seat's ready flag
    Ready {},
    /// Place a stone at zero-based (x, y)
    PlaceStone { x: i32, y: i32 },
    /// Chat to everyone in the room
    ChatMessage { message: String },
    /// Chat visible to spectators only
    SpectatorChat { message: String },
    /// Concede the current game
    Surrender {},
    /// Ask the opponent for a rematch
    Rematch {},
    /// Answer an outstanding rematch request
    RematchResponse { accepted: bool },
    /// Resume a seat lost to a mid-game disconnection
    Reconnect { player_name: String },
}

/// Context attached to `SUCCESS` acknowledgements.
///
/// Only `message` is always present; the remaining fields appear when the
/// acknowledged operation carries room state (join, spectate, reconnect).
/// Boxed in `ServerMessage` to keep the enum small.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuccessPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_color: Option<StoneColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Box<BoardGrid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<StoneColor>,
    /// Room status, on spectate acknowledgements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    /// Room status, on reconnect acknowledgements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_status: Option<RoomStatus>,
    /// Seconds left on the turn clock, on reconnect into a live game
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u64>,
    /// Set when a rematch acceptance is still waiting on the opponent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rematch_accepted: Option<bool>,
}

impl SuccessPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Message types sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Direct acknowledgement of a successful request
    Success(Box<SuccessPayload>),
    /// Direct rejection of a request
    Error { message: String },
    /// Room directory snapshot
    RoomList { rooms: Vec<RoomInfo> },
    /// Someone joined the room (player or spectator)
    UserJoined {
        user_name: String,
        role: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<StoneColor>,
    },
    /// Someone left the room gracefully
    UserLeft { user_name: String, role: Role },
    /// The room was reset to waiting after a player left mid-lobby
    RoomUpdate {
        status: RoomStatus,
        message: String,
        board: Box<BoardGrid>,
    },
    /// Ready flags changed
    ReadyStatus { ready_status: ReadyStatus },
    /// Both seats readied up (or a rematch began); play starts
    GameStart {
        current_turn: StoneColor,
        players: Vec<PlayerSummary>,
        #[serde(skip_serializing_if = "Option::is_none")]
        board: Option<Box<BoardGrid>>,
    },
    /// A stone was placed, or the board was reset (`x == -1`)
    BoardUpdate {
        x: i32,
        y: i32,
        color: Option<StoneColor>,
        board: Box<BoardGrid>,
    },
    /// The turn passed to the other color
    TurnChange { current_turn: StoneColor },
    /// Once-per-second turn clock tick
    TimerUpdate { remaining_time: u64 },
    /// The current player ran out of time; the turn passes without a stone
    TimeUp { player: StoneColor },
    /// The game ended. `winner` is absent on a draw.
    GameEnd {
        winner: Option<StoneColor>,
        winner_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A seated player's connection dropped mid-game
    PlayerDisconnected { player_name: String },
    /// A disconnected player resumed their seat
    PlayerReconnected { player_name: String },
    /// Play is suspended until the disconnected player returns
    GamePaused { reason: String },
    /// All players are back; the turn clock restarts
    GameResumed {},
    /// A disconnected player overstayed the grace period
    Forfeit {
        winner: StoneColor,
        winner_name: Option<String>,
        player_name: String,
        reason: String,
    },
    /// A player asked for a rematch; `timeout` is advisory for the client UI
    Rematch {
        requesting_player: String,
        message: String,
        timeout: u64,
    },
    /// The rematch request was declined
    RematchDeclined { message: String, declined_by: String },
    /// Room-wide chat line
    ChatMessage {
        sender: String,
        role: Role,
        message: String,
    },
    /// Spectator-only chat line
    SpectatorChat { sender: String, message: String },
}

/// Wire envelope: `{"type": ..., "data": ..., "timestamp": ...}`.
///
/// The tagged message flattens into the envelope, contributing the `type`
/// and `data` keys. Timestamps are informational; inbound values are
/// accepted in any format (clients send naive ISO-8601).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<M> {
    #[serde(flatten)]
    pub message: M,
    #[serde(default)]
    pub timestamp: String,
}

impl<M> Envelope<M> {
    pub fn new(message: M) -> Self {
        Self {
            message,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Serialize an outbound message into one wire line (no trailing newline).
pub fn encode(message: &ServerMessage) -> String {
    match serde_json::to_string(&Envelope::new(message)) {
        Ok(line) => line,
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize server message");
            format!(
                "{{\"type\":\"ERROR\",\"data\":{{\"message\":\"Internal error\"}},\"timestamp\":\"{}\"}}",
                Utc::now().to_rfc3339()
            )
        }
    }
}

/// Parse one inbound wire line into a client message.
pub fn decode(line: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str::<Envelope<ClientMessage>>(line).map(|envelope| envelope.message)
}
