// Protocol module: wire message types, error kinds, and shared identifiers

pub mod errors;
pub mod messages;
pub mod types;

pub use errors::ErrorKind;
pub use messages::{decode, encode, ClientMessage, Envelope, ServerMessage, SuccessPayload};
pub use types::{
    BoardGrid, ConnectionId, PlayerSummary, ReadyStatus, Role, RoomId, RoomInfo, RoomStatus,
    StoneColor, BOARD_SIZE,
};
