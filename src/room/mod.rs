//! Room: the per-session state machine.
//!
//! A room owns its board, its two player seats, its spectator set, and its
//! turn timer. Every mutating operation takes the state mutex once, computes
//! the transition, and snapshots the recipients for any broadcasts into an
//! [`Outbox`] that the caller dispatches *after* the lock is released. No
//! socket I/O ever happens under the lock.

pub mod outbox;
mod timer;

pub use outbox::{Notification, Outbox, Recipients};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Instant;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::game::Board;
use crate::net::ConnectionHandle;
use crate::protocol::{
    BoardGrid, ConnectionId, ErrorKind, PlayerSummary, ReadyStatus, Role, RoomId, RoomInfo,
    RoomStatus, ServerMessage, StoneColor,
};

use timer::{TimerTick, TurnTimer};

/// One of the two player slots, bound to a display name and a color.
///
/// The connection handle is `None` while the player is disconnected mid-game;
/// the seat itself is retained so the player can reclaim it.
#[derive(Debug)]
pub struct PlayerSeat {
    pub name: String,
    pub color: StoneColor,
    pub ready: bool,
    pub conn: Option<ConnectionHandle>,
}

#[derive(Debug)]
struct SpectatorEntry {
    name: String,
    conn: ConnectionHandle,
}

/// Bookkeeping for a seat whose connection was lost mid-game.
#[derive(Debug)]
struct DisconnectRecord {
    since: Instant,
    color: StoneColor,
}

#[derive(Debug)]
struct RoomState {
    status: RoomStatus,
    board: Board,
    current_turn: StoneColor,
    players: Vec<PlayerSeat>,
    spectators: Vec<SpectatorEntry>,
    paused: bool,
    turn_deadline: Option<Instant>,
    disconnected: HashMap<String, DisconnectRecord>,
    reconnect_attempts: HashMap<String, u32>,
    rematch_requests: HashSet<String>,
}

impl RoomState {
    fn new() -> Self {
        Self {
            status: RoomStatus::Waiting,
            board: Board::new(),
            current_turn: StoneColor::Black,
            players: Vec::new(),
            spectators: Vec::new(),
            paused: false,
            turn_deadline: None,
            disconnected: HashMap::new(),
            reconnect_attempts: HashMap::new(),
            rematch_requests: HashSet::new(),
        }
    }

    fn seat_index_by_conn(&self, conn_id: ConnectionId) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.conn.as_ref().is_some_and(|c| c.id() == conn_id))
    }

    fn seat_index_by_name(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name)
    }

    fn seat_by_color(&self, color: StoneColor) -> Option<&PlayerSeat> {
        self.players.iter().find(|p| p.color == color)
    }

    fn spectator_index_by_conn(&self, conn_id: ConnectionId) -> Option<usize> {
        self.spectators
            .iter()
            .position(|s| s.conn.id() == conn_id)
    }

    /// Live connections of everyone in the room, captured under the lock.
    fn recipients_all(&self) -> Recipients {
        self.players
            .iter()
            .filter_map(|p| p.conn.clone())
            .chain(self.spectators.iter().map(|s| s.conn.clone()))
            .collect()
    }

    fn recipients_spectators(&self) -> Recipients {
        self.spectators.iter().map(|s| s.conn.clone()).collect()
    }

    fn ready_status(&self) -> ReadyStatus {
        self.players
            .iter()
            .map(|p| (p.name.clone(), p.ready))
            .collect()
    }

    fn player_summaries(&self) -> Vec<PlayerSummary> {
        self.players
            .iter()
            .map(|p| PlayerSummary {
                name: p.name.clone(),
                color: p.color,
            })
            .collect()
    }

    fn board_snapshot(&self) -> Box<BoardGrid> {
        Box::new(self.board.snapshot())
    }
}

/// Seat assignment handed back to the dispatcher on a successful join.
#[derive(Debug)]
pub struct JoinedSeat {
    pub color: StoneColor,
    pub board: Box<BoardGrid>,
    pub current_turn: StoneColor,
}

/// Room snapshot handed back on a successful spectate.
#[derive(Debug)]
pub struct SpectateSnapshot {
    pub board: Box<BoardGrid>,
    pub current_turn: StoneColor,
    pub status: RoomStatus,
}

/// Full room snapshot for a reconnecting player.
#[derive(Debug)]
pub struct ReconnectSnapshot {
    pub color: StoneColor,
    pub board: Box<BoardGrid>,
    pub current_turn: StoneColor,
    pub status: RoomStatus,
    /// Seconds on the restarted turn clock, when play resumed.
    pub remaining_time: Option<u64>,
}

/// Outcome of a `REMATCH_RESPONSE`.
#[derive(Debug, PartialEq, Eq)]
pub enum RematchOutcome {
    /// Both seats agreed; a new game started with swapped colors.
    Started,
    /// Agreement recorded; the other seat has not answered yet.
    AwaitingOpponent,
    /// The request was declined and all rematch state cleared.
    Declined,
}

pub struct Room {
    id: RoomId,
    config: Arc<ServerConfig>,
    state: Mutex<RoomState>,
    pub(crate) timer: TurnTimer,
    weak_self: Weak<Room>,
}

impl Room {
    pub fn new(id: RoomId, config: Arc<ServerConfig>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            id,
            config,
            state: Mutex::new(RoomState::new()),
            timer: TurnTimer::default(),
            weak_self: weak.clone(),
        })
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Seat a player. The first seat is black, the second white.
    pub async fn add_player(
        &self,
        name: &str,
        conn: &ConnectionHandle,
    ) -> Result<(JoinedSeat, Outbox), ErrorKind> {
        let mut state = self.state.lock().await;
        if state.players.len() >= 2 {
            return Err(ErrorKind::RoomFull);
        }
        if state
            .players
            .iter()
            .any(|p| p.name == name && p.conn.is_some())
        {
            // The name is taken by a live seat; a dead seat of the same name
            // is reclaimed through the reconnect path instead.
            return Err(ErrorKind::RoomFull);
        }

        // First seat is black; a second seat takes whichever color is left,
        // so the pair is always {black, white} even after a leave-and-refill.
        let color = match state.players.first() {
            None => StoneColor::Black,
            Some(seat) => seat.color.opponent(),
        };
        state.players.push(PlayerSeat {
            name: name.to_string(),
            color,
            ready: false,
            conn: Some(conn.clone()),
        });

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::UserJoined {
                user_name: name.to_string(),
                role: Role::Player,
                color: Some(color),
            },
        );
        if state.players.len() == 2 {
            outbox.push(
                state.recipients_all(),
                ServerMessage::ReadyStatus {
                    ready_status: state.ready_status(),
                },
            );
        }

        let joined = JoinedSeat {
            color,
            board: state.board_snapshot(),
            current_turn: state.current_turn,
        };
        Ok((joined, outbox))
    }

    /// Append a spectator; never fails and never affects game state.
    pub async fn add_spectator(
        &self,
        name: &str,
        conn: &ConnectionHandle,
    ) -> (SpectateSnapshot, Outbox) {
        let mut state = self.state.lock().await;
        state.spectators.push(SpectatorEntry {
            name: name.to_string(),
            conn: conn.clone(),
        });

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::UserJoined {
                user_name: name.to_string(),
                role: Role::Spectator,
                color: None,
            },
        );

        let snapshot = SpectateSnapshot {
            board: state.board_snapshot(),
            current_turn: state.current_turn,
            status: state.status,
        };
        (snapshot, outbox)
    }

    /// Toggle the seat's ready flag; when both seats are ready and connected
    /// the game starts. Toggles outside the waiting state are ignored.
    pub async fn set_ready(&self, conn_id: ConnectionId) -> Result<Outbox, ErrorKind> {
        let mut state = self.state.lock().await;
        let idx = state
            .seat_index_by_conn(conn_id)
            .ok_or(ErrorKind::NotSeated)?;
        if state.status != RoomStatus::Waiting {
            return Ok(Outbox::new());
        }

        state.players[idx].ready = !state.players[idx].ready;

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::ReadyStatus {
                ready_status: state.ready_status(),
            },
        );

        let all_ready = state.players.len() == 2
            && state.players.iter().all(|p| p.ready && p.conn.is_some());
        if all_ready {
            self.start_game(&mut state, &mut outbox);
        }
        Ok(outbox)
    }

    /// Place a stone for the seat bound to `conn_id`.
    pub async fn place_stone(
        &self,
        conn_id: ConnectionId,
        x: i32,
        y: i32,
    ) -> Result<Outbox, ErrorKind> {
        let mut state = self.state.lock().await;
        let idx = state
            .seat_index_by_conn(conn_id)
            .ok_or(ErrorKind::NotSeated)?;
        if state.status != RoomStatus::Playing || state.paused {
            return Err(ErrorKind::NotPlaying);
        }
        let (color, name) = {
            let seat = &state.players[idx];
            (seat.color, seat.name.clone())
        };
        if color != state.current_turn {
            return Err(ErrorKind::NotYourTurn);
        }

        state.board.place(x, y, color)?;

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::BoardUpdate {
                x,
                y,
                color: Some(color),
                board: state.board_snapshot(),
            },
        );

        if let Some(winner) = state.board.check_winner(x, y) {
            self.finish_game(&mut state, &mut outbox, Some(winner), Some(name), None);
        } else if state.board.is_full() {
            // Open question resolved: a full board with no five is a draw.
            self.finish_game(&mut state, &mut outbox, None, None, Some("draw".to_string()));
        } else {
            state.current_turn = state.current_turn.opponent();
            outbox.push(
                state.recipients_all(),
                ServerMessage::TurnChange {
                    current_turn: state.current_turn,
                },
            );
            self.arm_timer(&mut state, &mut outbox);
        }
        Ok(outbox)
    }

    /// Room-wide chat from a player or spectator.
    pub async fn chat(&self, conn_id: ConnectionId, text: &str) -> Result<Outbox, ErrorKind> {
        let state = self.state.lock().await;
        let (sender, role) = if let Some(idx) = state.seat_index_by_conn(conn_id) {
            (state.players[idx].name.clone(), Role::Player)
        } else if let Some(idx) = state.spectator_index_by_conn(conn_id) {
            (state.spectators[idx].name.clone(), Role::Spectator)
        } else {
            return Err(ErrorKind::NotInRoom);
        };

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::ChatMessage {
                sender,
                role,
                message: text.to_string(),
            },
        );
        Ok(outbox)
    }

    /// Spectator-only chat; players never see it.
    pub async fn spectator_chat(
        &self,
        conn_id: ConnectionId,
        text: &str,
    ) -> Result<Outbox, ErrorKind> {
        let state = self.state.lock().await;
        let idx = state
            .spectator_index_by_conn(conn_id)
            .ok_or(ErrorKind::NotSpectator)?;
        let sender = state.spectators[idx].name.clone();

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_spectators(),
            ServerMessage::SpectatorChat {
                sender,
                message: text.to_string(),
            },
        );
        Ok(outbox)
    }

    /// Graceful leave. Removes the seat or spectator entry; dropping to one
    /// player resets the room to waiting.
    pub async fn leave(&self, conn_id: ConnectionId) -> (Option<(String, Role)>, Outbox) {
        let mut state = self.state.lock().await;
        let mut outbox = Outbox::new();

        if let Some(idx) = state.seat_index_by_conn(conn_id) {
            let seat = state.players.remove(idx);
            state.rematch_requests.clear();
            state.reconnect_attempts.remove(&seat.name);
            state.disconnected.remove(&seat.name);

            if state.players.len() == 1 {
                self.reset_to_waiting(&mut state);
                outbox.push(
                    state.recipients_all(),
                    ServerMessage::RoomUpdate {
                        status: RoomStatus::Waiting,
                        message: "Waiting for another player to join".to_string(),
                        board: state.board_snapshot(),
                    },
                );
            } else if state.players.is_empty() {
                self.reset_to_waiting(&mut state);
            }

            outbox.push(
                state.recipients_all(),
                ServerMessage::UserLeft {
                    user_name: seat.name.clone(),
                    role: Role::Player,
                },
            );
            return (Some((seat.name, Role::Player)), outbox);
        }

        if let Some(idx) = state.spectator_index_by_conn(conn_id) {
            let spectator = state.spectators.remove(idx);
            outbox.push(
                state.recipients_all(),
                ServerMessage::UserLeft {
                    user_name: spectator.name.clone(),
                    role: Role::Spectator,
                },
            );
            return (Some((spectator.name, Role::Spectator)), outbox);
        }

        (None, outbox)
    }

    /// Socket loss. Mid-game the seat is retained and the game pauses; a
    /// seat already at the reconnect-attempt cap forfeits immediately.
    /// Outside of play this behaves like a silent leave.
    pub async fn handle_disconnect(&self, conn_id: ConnectionId) -> (Option<(String, Role)>, Outbox) {
        let mut state = self.state.lock().await;
        let mut outbox = Outbox::new();

        if let Some(idx) = state.seat_index_by_conn(conn_id) {
            if state.status == RoomStatus::Playing {
                let (name, color) = {
                    let seat = &mut state.players[idx];
                    seat.conn = None;
                    (seat.name.clone(), seat.color)
                };
                outbox.push(
                    state.recipients_all(),
                    ServerMessage::PlayerDisconnected {
                        player_name: name.clone(),
                    },
                );

                let attempts = state.reconnect_attempts.get(&name).copied().unwrap_or(0);
                if attempts >= self.config.max_reconnect_attempts {
                    self.forfeit_seat(&mut state, &mut outbox, &name, color);
                } else {
                    state.disconnected.insert(
                        name.clone(),
                        DisconnectRecord {
                            since: Instant::now(),
                            color,
                        },
                    );
                    state.paused = true;
                    self.cancel_timer(&mut state);
                    outbox.push(
                        state.recipients_all(),
                        ServerMessage::GamePaused {
                            reason: format!(
                                "Player {name} disconnected. Waiting for reconnection..."
                            ),
                        },
                    );
                }
                return (Some((name, Role::Player)), outbox);
            }

            // Not mid-game: drop the seat without a USER_LEFT broadcast.
            let seat = state.players.remove(idx);
            state.rematch_requests.clear();
            state.reconnect_attempts.remove(&seat.name);
            state.disconnected.remove(&seat.name);
            if state.players.len() <= 1 {
                self.reset_to_waiting(&mut state);
            }
            return (Some((seat.name, Role::Player)), outbox);
        }

        if let Some(idx) = state.spectator_index_by_conn(conn_id) {
            let spectator = state.spectators.remove(idx);
            return (Some((spectator.name, Role::Spectator)), outbox);
        }

        (None, outbox)
    }

    /// Whether `name` holds a disconnection record that is still redeemable.
    pub async fn can_reconnect(&self, name: &str) -> bool {
        let state = self.state.lock().await;
        let Some(record) = state.disconnected.get(name) else {
            return false;
        };
        let attempts = state.reconnect_attempts.get(name).copied().unwrap_or(0);
        attempts < self.config.max_reconnect_attempts
            && record.since.elapsed() <= self.config.reconnect_grace
    }

    /// Whether this room holds any reconnect bookkeeping for `name`, live or
    /// expired. Used to pick the room that can explain a failed reconnect.
    pub async fn has_reconnect_state(&self, name: &str) -> bool {
        let state = self.state.lock().await;
        state.disconnected.contains_key(name) || state.reconnect_attempts.contains_key(name)
    }

    /// Rebind a disconnected seat to a new connection.
    pub async fn reconnect(
        &self,
        name: &str,
        conn: &ConnectionHandle,
    ) -> Result<(ReconnectSnapshot, Outbox), ErrorKind> {
        let mut state = self.state.lock().await;
        let attempts = state.reconnect_attempts.get(name).copied().unwrap_or(0);

        if !state.disconnected.contains_key(name) {
            if attempts >= self.config.max_reconnect_attempts {
                return Err(ErrorKind::ReconnectAttemptsExceeded(
                    self.config.max_reconnect_attempts,
                ));
            }
            return Err(ErrorKind::NoReconnectSession);
        }
        if attempts >= self.config.max_reconnect_attempts {
            return Err(ErrorKind::ReconnectAttemptsExceeded(
                self.config.max_reconnect_attempts,
            ));
        }
        let record = &state.disconnected[name];
        if record.since.elapsed() > self.config.reconnect_grace {
            return Err(ErrorKind::ReconnectTimedOut);
        }

        let idx = state
            .seat_index_by_name(name)
            .ok_or(ErrorKind::NoReconnectSession)?;
        *state.reconnect_attempts.entry(name.to_string()).or_insert(0) += 1;
        state.disconnected.remove(name);
        let color = {
            let seat = &mut state.players[idx];
            seat.conn = Some(conn.clone());
            seat.color
        };

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::PlayerReconnected {
                player_name: name.to_string(),
            },
        );

        if state.disconnected.is_empty() {
            state.paused = false;
            if state.status == RoomStatus::Playing {
                outbox.push(state.recipients_all(), ServerMessage::GameResumed {});
                // The turn clock restarts at the full limit for the current
                // turn; the paused remainder is intentionally not preserved.
                self.arm_timer(&mut state, &mut outbox);
            }
        }

        let remaining_time = (state.status == RoomStatus::Playing && !state.paused)
            .then(|| self.config.turn_time_limit.as_secs());
        let snapshot = ReconnectSnapshot {
            color,
            board: state.board_snapshot(),
            current_turn: state.current_turn,
            status: state.status,
            remaining_time,
        };
        Ok((snapshot, outbox))
    }

    /// Concede: the opponent's color wins immediately.
    pub async fn surrender(&self, conn_id: ConnectionId) -> Result<Outbox, ErrorKind> {
        let mut state = self.state.lock().await;
        let idx = state
            .seat_index_by_conn(conn_id)
            .ok_or(ErrorKind::NotSeated)?;
        if state.status != RoomStatus::Playing {
            return Err(ErrorKind::NotPlaying);
        }
        let (name, color) = {
            let seat = &state.players[idx];
            (seat.name.clone(), seat.color)
        };
        let winner = color.opponent();
        let winner_name = state.seat_by_color(winner).map(|p| p.name.clone());

        let mut outbox = Outbox::new();
        self.finish_game(
            &mut state,
            &mut outbox,
            Some(winner),
            winner_name,
            Some(format!("{name} surrendered")),
        );
        Ok(outbox)
    }

    /// Record a rematch request; on mutual agreement the game restarts with
    /// swapped colors.
    pub async fn request_rematch(&self, conn_id: ConnectionId) -> Result<Outbox, ErrorKind> {
        let mut state = self.state.lock().await;
        let idx = state
            .seat_index_by_conn(conn_id)
            .ok_or(ErrorKind::NotSeated)?;
        if state.status != RoomStatus::Finished {
            return Err(ErrorKind::NotFinished);
        }
        let name = state.players[idx].name.clone();
        state.rematch_requests.insert(name.clone());

        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::Rematch {
                requesting_player: name.clone(),
                message: format!("{name} wants a rematch"),
                timeout: self.config.rematch_response_timeout.as_secs(),
            },
        );

        if self.rematch_agreed(&state) {
            self.start_rematch(&mut state, &mut outbox);
        }
        Ok(outbox)
    }

    /// Answer an outstanding rematch request. Accepting is equivalent to
    /// requesting; declining wipes all rematch agreements.
    pub async fn respond_rematch(
        &self,
        conn_id: ConnectionId,
        accepted: bool,
    ) -> Result<(RematchOutcome, Outbox), ErrorKind> {
        let mut state = self.state.lock().await;
        let idx = state
            .seat_index_by_conn(conn_id)
            .ok_or(ErrorKind::NotSeated)?;
        let name = state.players[idx].name.clone();
        let mut outbox = Outbox::new();

        if !accepted {
            state.rematch_requests.clear();
            outbox.push(
                state.recipients_all(),
                ServerMessage::RematchDeclined {
                    message: format!("{name} declined the rematch request"),
                    declined_by: name,
                },
            );
            return Ok((RematchOutcome::Declined, outbox));
        }

        if state.status != RoomStatus::Finished {
            return Err(ErrorKind::NotFinished);
        }
        state.rematch_requests.insert(name);
        if self.rematch_agreed(&state) {
            self.start_rematch(&mut state, &mut outbox);
            Ok((RematchOutcome::Started, outbox))
        } else {
            Ok((RematchOutcome::AwaitingOpponent, outbox))
        }
    }

    /// Expire disconnection records older than the grace period. Called by
    /// the forfeit monitor; each expired record in a live game ends it with
    /// the opponent as winner.
    pub async fn expire_overdue(&self) -> Outbox {
        let mut state = self.state.lock().await;
        let mut outbox = Outbox::new();
        let overdue: Vec<(String, StoneColor)> = state
            .disconnected
            .iter()
            .filter(|(_, record)| record.since.elapsed() > self.config.reconnect_grace)
            .map(|(name, record)| (name.clone(), record.color))
            .collect();

        for (name, color) in overdue {
            if state.status == RoomStatus::Playing {
                tracing::info!(room_id = %self.id, player_name = %name, "Reconnect grace expired, forfeiting");
                self.forfeit_seat(&mut state, &mut outbox, &name, color);
            } else {
                // The game already ended (or reset); just drop the stale
                // record and its abandoned seat.
                state.disconnected.remove(&name);
                if let Some(idx) = state
                    .seat_index_by_name(&name)
                    .filter(|&i| state.players[i].conn.is_none())
                {
                    state.players.remove(idx);
                }
            }
        }
        outbox
    }

    /// Immutable summary for `LIST_ROOMS`; counts live connections only.
    pub async fn info(&self) -> RoomInfo {
        let state = self.state.lock().await;
        let live_players: Vec<String> = state
            .players
            .iter()
            .filter(|p| p.conn.is_some())
            .map(|p| p.name.clone())
            .collect();
        RoomInfo {
            room_id: self.id.clone(),
            status: state.status,
            player_count: live_players.len(),
            spectator_count: state.spectators.len(),
            players: live_players,
            current_turn: state.current_turn,
        }
    }

    /// Whether the room has no live connections at all (purge criterion).
    pub async fn is_empty(&self) -> bool {
        let state = self.state.lock().await;
        state.players.iter().all(|p| p.conn.is_none()) && state.spectators.is_empty()
    }

    /// Resolve a live connection to its role in this room.
    pub async fn role_of(&self, conn_id: ConnectionId) -> Option<Role> {
        let state = self.state.lock().await;
        if state.seat_index_by_conn(conn_id).is_some() {
            Some(Role::Player)
        } else if state.spectator_index_by_conn(conn_id).is_some() {
            Some(Role::Spectator)
        } else {
            None
        }
    }

    // -- timer integration --------------------------------------------------

    /// One timer wake. Re-checks the generation under the lock so a swap can
    /// never interleave with a stone placement or a cancellation.
    pub(crate) async fn timer_tick(&self, generation: u64) -> TimerTick {
        let mut state = self.state.lock().await;
        if !self.timer.is_current(generation) {
            return TimerTick::Stale;
        }
        if state.status != RoomStatus::Playing || state.paused {
            return TimerTick::Stale;
        }
        let Some(deadline) = state.turn_deadline else {
            return TimerTick::Stale;
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            let mut outbox = Outbox::new();
            outbox.push(
                state.recipients_all(),
                ServerMessage::TimerUpdate {
                    remaining_time: remaining.as_secs_f64().round() as u64,
                },
            );
            return TimerTick::Continue(outbox);
        }

        // Time up: the turn passes without a stone; the game continues.
        let mut outbox = Outbox::new();
        outbox.push(
            state.recipients_all(),
            ServerMessage::TimeUp {
                player: state.current_turn,
            },
        );
        state.current_turn = state.current_turn.opponent();
        outbox.push(
            state.recipients_all(),
            ServerMessage::TurnChange {
                current_turn: state.current_turn,
            },
        );
        self.arm_timer(&mut state, &mut outbox);
        TimerTick::Expired(outbox)
    }

    // -- internal transitions (caller holds the state lock) -----------------

    fn start_game(&self, state: &mut RoomState, outbox: &mut Outbox) {
        state.status = RoomStatus::Playing;
        state.board.reset();
        state.current_turn = StoneColor::Black;
        state.rematch_requests.clear();
        outbox.push(
            state.recipients_all(),
            ServerMessage::GameStart {
                current_turn: state.current_turn,
                players: state.player_summaries(),
                board: None,
            },
        );
        self.arm_timer(state, outbox);
    }

    fn start_rematch(&self, state: &mut RoomState, outbox: &mut Outbox) {
        state.board.reset();
        state.current_turn = StoneColor::Black;
        state.status = RoomStatus::Playing;
        state.rematch_requests.clear();
        for seat in &mut state.players {
            seat.color = seat.color.opponent();
            seat.ready = true;
        }
        // Reset marker first so clients clear their boards before GAME_START.
        outbox.push(
            state.recipients_all(),
            ServerMessage::BoardUpdate {
                x: -1,
                y: -1,
                color: None,
                board: state.board_snapshot(),
            },
        );
        outbox.push(
            state.recipients_all(),
            ServerMessage::GameStart {
                current_turn: state.current_turn,
                players: state.player_summaries(),
                board: Some(state.board_snapshot()),
            },
        );
        self.arm_timer(state, outbox);
    }

    fn finish_game(
        &self,
        state: &mut RoomState,
        outbox: &mut Outbox,
        winner: Option<StoneColor>,
        winner_name: Option<String>,
        reason: Option<String>,
    ) {
        state.status = RoomStatus::Finished;
        state.paused = false;
        self.cancel_timer(state);
        outbox.push(
            state.recipients_all(),
            ServerMessage::GameEnd {
                winner,
                winner_name,
                reason,
            },
        );
    }

    fn forfeit_seat(
        &self,
        state: &mut RoomState,
        outbox: &mut Outbox,
        name: &str,
        color: StoneColor,
    ) {
        state.disconnected.remove(name);
        let winner = color.opponent();
        let winner_name = state.seat_by_color(winner).map(|p| p.name.clone());
        if let Some(idx) = state.seat_index_by_name(name) {
            state.players.remove(idx);
        }
        state.rematch_requests.clear();
        outbox.push(
            state.recipients_all(),
            ServerMessage::Forfeit {
                winner,
                winner_name: winner_name.clone(),
                player_name: name.to_string(),
                reason: "Disconnection timeout (3 minutes)".to_string(),
            },
        );
        self.finish_game(
            state,
            outbox,
            Some(winner),
            winner_name,
            Some(format!("{name} forfeited")),
        );
    }

    fn reset_to_waiting(&self, state: &mut RoomState) {
        state.status = RoomStatus::Waiting;
        state.board.reset();
        state.current_turn = StoneColor::Black;
        state.paused = false;
        state.rematch_requests.clear();
        self.cancel_timer(state);
        for seat in &mut state.players {
            seat.ready = false;
        }
    }

    /// Stamp a new timer generation, set the deadline, and spawn the task.
    /// The `TIMER_UPDATE` carrying the full limit rides in the outbox so it
    /// is ordered after the transition that armed the clock.
    fn arm_timer(&self, state: &mut RoomState, outbox: &mut Outbox) {
        let generation = self.timer.advance();
        state.turn_deadline = Some(Instant::now() + self.config.turn_time_limit);
        if let Some(room) = self.weak_self.upgrade() {
            timer::spawn(room, generation);
        }
        outbox.push(
            state.recipients_all(),
            ServerMessage::TimerUpdate {
                remaining_time: self.config.turn_time_limit.as_secs(),
            },
        );
    }

    fn cancel_timer(&self, state: &mut RoomState) {
        self.timer.advance();
        state.turn_deadline = None;
    }

    fn rematch_agreed(&self, state: &RoomState) -> bool {
        state.players.len() == 2
            && state
                .players
                .iter()
                .all(|p| state.rematch_requests.contains(&p.name))
    }
}
