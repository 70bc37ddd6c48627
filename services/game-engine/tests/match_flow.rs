//! End-to-end flow through the engine and broker: create, join, trade
//! shots, sink the fleet, and observe the events subscribers receive.

use std::sync::Arc;

use event_broker::{BrokerConfig, EventBroker, EventKind, Frame};
use game_engine::stats::NullStats;
use game_engine::{MatchEngine, MatchView, MemoryStore};
use types::board::Board;
use types::errors::GameError;
use types::game::MatchState;
use types::ids::PlayerId;

fn drain_events(rx: &mut tokio::sync::mpsc::Receiver<Frame>) -> Vec<EventKind> {
    let mut kinds = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Frame::Event(env) = frame {
            kinds.push(env.event);
        }
    }
    kinds
}

fn empty_cell(board: &Board) -> (u8, u8) {
    for row in 0..types::board::BOARD_SIZE {
        for col in 0..types::board::BOARD_SIZE {
            if !board.ships.iter().any(|s| s.occupies(row, col)) {
                return (row, col);
            }
        }
    }
    unreachable!("a valid board has empty cells")
}

#[tokio::test]
async fn full_match_flow_with_spectator_events() {
    let broker = Arc::new(EventBroker::new(BrokerConfig::default()));
    let engine = MatchEngine::new(Arc::new(MemoryStore::new()), broker.clone(), Arc::new(NullStats));

    let alice = PlayerId::new();
    let bob = PlayerId::new();

    // Create: Open, 17 ship cells on the creator board
    let game = engine.create_match(alice).await.unwrap();
    assert_eq!(game.state, MatchState::Open);
    assert_eq!(game.creator_board.ship_cell_count(), types::board::FLEET_CELLS);

    // A spectator subscribes before the join
    let (client_id, mut rx) = broker.register();
    assert!(broker.subscribe(client_id, game.id));

    // Join: Active, creator moves first, both boards fresh
    let game = engine.join_match(game.id, bob).await.unwrap();
    assert_eq!(game.state, MatchState::Active);
    assert_eq!(game.turn_holder, Some(alice));
    assert_eq!(game.joiner_board.ship_cell_count(), types::board::FLEET_CELLS);

    // Alice misses; the turn flips to Bob
    let (row, col) = empty_cell(&game.joiner_board);
    let outcome = engine.apply_shot(game.id, alice, row, col).await.unwrap();
    assert!(!outcome.hit);
    assert!(!outcome.game_over);
    assert_eq!(outcome.next_turn, Some(bob));

    // Bob hits and keeps shooting until Alice's last ship goes down
    let targets: Vec<(u8, u8)> = game
        .creator_board
        .ships
        .iter()
        .flat_map(|s| s.positions.iter().map(|c| (c.row, c.col)))
        .collect();

    let mut final_outcome = None;
    for (trow, tcol) in targets {
        let outcome = engine.apply_shot(game.id, bob, trow, tcol).await.unwrap();
        assert!(outcome.hit);
        if !outcome.game_over {
            assert_eq!(outcome.next_turn, Some(bob), "a hit keeps the turn");
        }
        final_outcome = Some(outcome);
    }

    let outcome = final_outcome.unwrap();
    assert!(outcome.game_over);
    assert_eq!(outcome.winner, Some(bob));
    assert_eq!(outcome.next_turn, None);

    // The aggregate reached Completed and rejects further shots
    let MatchView::Full(after) = engine.get_match(game.id, Some(alice)).await.unwrap() else {
        panic!("expected full view");
    };
    assert_eq!(after.state, MatchState::Completed);
    assert_eq!(after.winner, Some(bob));
    let err = engine.apply_shot(game.id, alice, 0, 0).await.unwrap_err();
    assert!(matches!(err, GameError::State { .. }));

    // The spectator saw every state change in publish order
    let events = drain_events(&mut rx);
    assert_eq!(events[0], EventKind::Connected);
    assert_eq!(events[1], EventKind::Subscribed);
    assert_eq!(events[2], EventKind::PlayerJoined);
    assert_eq!(events[3], EventKind::Miss);
    assert!(events[4..].iter().all(|k| *k == EventKind::Hit));
    assert_eq!(events.len(), 4 + types::board::FLEET_CELLS);
}
