use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::ServerConfig;
use crate::net::ConnectionHandle;
use crate::protocol::{ClientMessage, RoomId, ServerMessage, StoneColor};
use crate::server::GameServer;

fn test_server() -> Arc<GameServer> {
    GameServer::new(ServerConfig::default())
}

fn test_conn() -> (ConnectionHandle, mpsc::Receiver<Arc<ServerMessage>>) {
    let (tx, rx) = mpsc::channel(256);
    (ConnectionHandle::new(tx), rx)
}

async fn recv_matching<F>(
    rx: &mut mpsc::Receiver<Arc<ServerMessage>>,
    mut predicate: F,
) -> Arc<ServerMessage>
where
    F: FnMut(&ServerMessage) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            let message = rx.recv().await.expect("channel open");
            if predicate(&message) {
                return message;
            }
        }
    })
    .await
    .expect("expected message within timeout")
}

/// Start a game and finish it immediately: alice surrenders, bob wins.
async fn finished_game(
    server: &Arc<GameServer>,
) -> (
    ConnectionHandle,
    mpsc::Receiver<Arc<ServerMessage>>,
    ConnectionHandle,
    mpsc::Receiver<Arc<ServerMessage>>,
    RoomId,
) {
    let (alice, mut alice_rx) = test_conn();
    let (bob, mut bob_rx) = test_conn();

    server
        .dispatch(
            &alice,
            ClientMessage::CreateRoom {
                player_name: "alice".to_string(),
            },
        )
        .await;
    let success = recv_matching(&mut alice_rx, |m| matches!(m, ServerMessage::Success(_))).await;
    let room_id = match &*success {
        ServerMessage::Success(payload) => payload.room_id.clone().expect("room id in ack"),
        _ => unreachable!(),
    };

    server
        .dispatch(
            &bob,
            ClientMessage::JoinRoom {
                room_id: room_id.clone(),
                player_name: "bob".to_string(),
            },
        )
        .await;
    server.dispatch(&alice, ClientMessage::Ready {}).await;
    server.dispatch(&bob, ClientMessage::Ready {}).await;
    server.dispatch(&alice, ClientMessage::Surrender {}).await;
    recv_matching(&mut alice_rx, |m| matches!(m, ServerMessage::GameEnd { .. })).await;
    recv_matching(&mut bob_rx, |m| matches!(m, ServerMessage::GameEnd { .. })).await;

    (alice, alice_rx, bob, bob_rx, room_id)
}

#[tokio::test]
async fn rematch_during_a_live_game_is_rejected() {
    let server = test_server();
    let (alice, mut alice_rx) = test_conn();
    let (bob, _bob_rx) = test_conn();

    server
        .dispatch(
            &alice,
            ClientMessage::CreateRoom {
                player_name: "alice".to_string(),
            },
        )
        .await;
    server
        .dispatch(
            &bob,
            ClientMessage::JoinRoom {
                room_id: "room_1".to_string(),
                player_name: "bob".to_string(),
            },
        )
        .await;
    server.dispatch(&alice, ClientMessage::Ready {}).await;
    server.dispatch(&bob, ClientMessage::Ready {}).await;

    server.dispatch(&alice, ClientMessage::Rematch {}).await;
    match &*recv_matching(&mut alice_rx, |m| matches!(m, ServerMessage::Error { .. })).await {
        ServerMessage::Error { message } => {
            assert_eq!(message, "Cannot request rematch: game not finished");
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn request_notifies_the_room_with_the_advisory_timeout() {
    let server = test_server();
    let (alice, _alice_rx, _bob, mut bob_rx, _room_id) = finished_game(&server).await;

    server.dispatch(&alice, ClientMessage::Rematch {}).await;

    let message = recv_matching(&mut bob_rx, |m| matches!(m, ServerMessage::Rematch { .. })).await;
    match &*message {
        ServerMessage::Rematch {
            requesting_player,
            message,
            timeout,
        } => {
            assert_eq!(requesting_player, "alice");
            assert_eq!(message, "alice wants a rematch");
            assert_eq!(*timeout, 30);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn mutual_agreement_restarts_with_swapped_colors() {
    let server = test_server();
    let (alice, mut alice_rx, bob, mut bob_rx, _room_id) = finished_game(&server).await;

    server.dispatch(&alice, ClientMessage::Rematch {}).await;
    server
        .dispatch(&bob, ClientMessage::RematchResponse { accepted: true })
        .await;

    // Board flush precedes the new GAME_START.
    let message = recv_matching(&mut alice_rx, |m| {
        matches!(m, ServerMessage::BoardUpdate { .. })
    })
    .await;
    match &*message {
        ServerMessage::BoardUpdate { x, y, color, board } => {
            assert_eq!((*x, *y), (-1, -1));
            assert!(color.is_none());
            assert!(board.iter().flatten().all(Option::is_none));
        }
        _ => unreachable!(),
    }

    let message = recv_matching(&mut alice_rx, |m| {
        matches!(m, ServerMessage::GameStart { .. })
    })
    .await;
    match &*message {
        ServerMessage::GameStart {
            current_turn,
            players,
            board,
        } => {
            assert_eq!(*current_turn, StoneColor::Black);
            assert!(board.is_some(), "rematch GAME_START carries the empty board");
            assert!(players
                .iter()
                .any(|p| p.name == "alice" && p.color == StoneColor::White));
            assert!(players
                .iter()
                .any(|p| p.name == "bob" && p.color == StoneColor::Black));
        }
        _ => unreachable!(),
    }

    // Bob holds black now and opens the rematch.
    server
        .dispatch(&bob, ClientMessage::PlaceStone { x: 7, y: 7 })
        .await;
    let message = recv_matching(&mut bob_rx, |m| {
        matches!(m, ServerMessage::BoardUpdate { color: Some(_), .. })
    })
    .await;
    assert!(matches!(
        &*message,
        ServerMessage::BoardUpdate { color: Some(StoneColor::Black), .. }
    ));
}

#[tokio::test]
async fn lone_acceptance_waits_for_the_opponent() {
    let server = test_server();
    let (_alice, _alice_rx, bob, mut bob_rx, _room_id) = finished_game(&server).await;

    server
        .dispatch(&bob, ClientMessage::RematchResponse { accepted: true })
        .await;

    match &*recv_matching(&mut bob_rx, |m| matches!(m, ServerMessage::Success(_))).await {
        ServerMessage::Success(payload) => {
            assert_eq!(payload.message, "Waiting for other player's response...");
            assert_eq!(payload.rematch_accepted, Some(true));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn decline_broadcasts_and_clears_the_agreement() {
    let server = test_server();
    let (alice, mut alice_rx, bob, _bob_rx, _room_id) = finished_game(&server).await;

    server.dispatch(&alice, ClientMessage::Rematch {}).await;
    server
        .dispatch(&bob, ClientMessage::RematchResponse { accepted: false })
        .await;

    let message = recv_matching(&mut alice_rx, |m| {
        matches!(m, ServerMessage::RematchDeclined { .. })
    })
    .await;
    match &*message {
        ServerMessage::RematchDeclined {
            message,
            declined_by,
        } => {
            assert_eq!(declined_by, "bob");
            assert_eq!(message, "bob declined the rematch request");
        }
        _ => unreachable!(),
    }

    // Alice's earlier request was wiped with the decline: a later acceptance
    // from bob alone does not start a game.
    server
        .dispatch(&bob, ClientMessage::RematchResponse { accepted: true })
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        !alice_rx
            .try_recv()
            .is_ok_and(|m| matches!(*m, ServerMessage::GameStart { .. })),
        "no game may start from a single agreement"
    );
}
