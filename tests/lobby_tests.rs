//! Matchmaking integration tests.

use serde_json::json;

use pairsync::channel::{DocPath, MemoryStore, SharedChannel};
use pairsync::core::{GameRng, GridSize, MatchConfig, Seat};
use pairsync::session::{session_root, Lobby, LobbyOutcome, Phase, SessionDocument};
use pairsync::{LayoutError, SessionError};

fn config() -> MatchConfig {
    MatchConfig::default().with_grid(GridSize::Small)
}

fn waiting_id(outcome: LobbyOutcome) -> String {
    assert_eq!(outcome.phase(), Phase::Forming);
    match outcome {
        LobbyOutcome::Waiting { session_id } => session_id,
        other => panic!("expected to wait, got {other:?}"),
    }
}

// =============================================================================
// Create / join
// =============================================================================

/// An empty table makes the first peer create a session.
#[test]
fn test_first_peer_creates() {
    let store = MemoryStore::new();
    let config = config();
    let mut ann = store.connect();
    let mut rng = GameRng::new(1);

    let id = waiting_id(Lobby::new(&mut ann, &config).find_or_create("ann", &mut rng).unwrap());
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let doc = store.get(&session_root(&config.table_root, &id)).unwrap();
    assert_eq!(doc["player1"]["nickname"], json!("ann"));
    assert_eq!(doc["cardFlip"]["location"], json!(-1));
    assert_eq!(doc["timeBarReset"], json!(-1));
    assert_eq!(doc["player1"]["ready"], json!(false));
    assert_eq!(doc["player2"]["ready"], json!(false));

    let parsed = SessionDocument::validate(Some(&doc)).unwrap();
    let seeds = parsed.seeds().unwrap();
    assert_eq!(seeds.layout.len(), 20);
    assert_eq!(seeds.content.len(), 10);
}

/// The second peer joins the open session and both see the same seeds.
#[test]
fn test_second_peer_joins() {
    let store = MemoryStore::new();
    let config = config();
    let mut ann = store.connect();
    let mut bob = store.connect();
    let mut rng = GameRng::new(2);

    let id = waiting_id(Lobby::new(&mut ann, &config).find_or_create("ann", &mut rng).unwrap());
    assert_eq!(Lobby::new(&mut ann, &config).check_opponent(&id).unwrap(), None);

    let outcome = Lobby::new(&mut bob, &config).find_or_create("bob", &mut rng).unwrap();
    assert_eq!(outcome.phase(), Phase::Joining);
    let bob_seat = match outcome {
        LobbyOutcome::Seated(seating) => seating,
        other => panic!("expected a seat, got {other:?}"),
    };
    assert_eq!(bob_seat.session_id, id);
    assert_eq!(bob_seat.seat, Seat::Player2);
    assert_eq!(bob_seat.opponent(), Some("ann"));

    let ann_seat = Lobby::new(&mut ann, &config).check_opponent(&id).unwrap().unwrap();
    assert_eq!(ann_seat.seat, Seat::Player1);
    assert_eq!(ann_seat.opponent(), Some("bob"));
    assert_eq!(ann_seat.seeds, bob_seat.seeds);
}

/// Coming back with the same nickname resumes rather than duplicating.
#[test]
fn test_creator_resumes_own_session() {
    let store = MemoryStore::new();
    let config = config();
    let mut ann = store.connect();
    let mut rng = GameRng::new(3);

    let first = waiting_id(Lobby::new(&mut ann, &config).find_or_create("ann", &mut rng).unwrap());
    let again = waiting_id(Lobby::new(&mut ann, &config).find_or_create("ann", &mut rng).unwrap());
    assert_eq!(first, again);

    let mut bob = store.connect();
    Lobby::new(&mut bob, &config).join(&first, "bob").unwrap();
    match Lobby::new(&mut ann, &config).find_or_create("ann", &mut rng).unwrap() {
        LobbyOutcome::Seated(seating) => {
            assert_eq!(seating.session_id, first);
            assert_eq!(seating.seat, Seat::Player1);
        }
        other => panic!("expected a seat, got {other:?}"),
    }
}

/// Full sessions are skipped; a third peer starts a new one.
#[test]
fn test_full_session_is_skipped() {
    let store = MemoryStore::new();
    let config = config();
    let (mut ann, mut bob, mut cid) = (store.connect(), store.connect(), store.connect());
    let mut rng = GameRng::new(4);

    let id = waiting_id(Lobby::new(&mut ann, &config).find_or_create("ann", &mut rng).unwrap());
    Lobby::new(&mut bob, &config).find_or_create("bob", &mut rng).unwrap();

    let other = waiting_id(Lobby::new(&mut cid, &config).find_or_create("cid", &mut rng).unwrap());
    assert_ne!(other, id);
}

/// Distinct sessions get distinct deals.
#[test]
fn test_sessions_get_fresh_seeds() {
    let store = MemoryStore::new();
    let config = config();
    let mut ann = store.connect();
    let mut rng = GameRng::new(5);

    let mut lobby = Lobby::new(&mut ann, &config);
    let a = lobby.create("ann", &mut rng).unwrap();
    let b = lobby.create("amy", &mut rng).unwrap();
    assert_ne!(a, b);

    let read = |id: &str| store.get(&session_root(&config.table_root, id)).unwrap();
    assert_ne!(read(&a)["layoutSeed"], read(&b)["layoutSeed"]);
}

// =============================================================================
// Failures
// =============================================================================

/// Joining a document with missing fields fails with MalformedSession.
#[test]
fn test_join_malformed_session() {
    let store = MemoryStore::new();
    let config = config();
    let mut admin = store.connect();
    let root = session_root(&config.table_root, "broken");
    admin
        .write(&root, json!({"player1": {"nickname": "ann"}, "turn": "player1"}))
        .unwrap();

    let mut bob = store.connect();
    match Lobby::new(&mut bob, &config).find_or_create("bob", &mut GameRng::new(6)) {
        Err(SessionError::MalformedSession { missing }) => {
            assert!(missing.contains(&"exit".to_string()));
            assert!(missing.contains(&"layoutSeed".to_string()));
            assert!(!missing.contains(&"turn".to_string()));
        }
        other => panic!("expected MalformedSession, got {other:?}"),
    }
}

/// Corrupt seeds surface as a seed error, not a panic.
#[test]
fn test_join_with_bad_seed() {
    let store = MemoryStore::new();
    let config = config();
    let mut ann = store.connect();
    let id = Lobby::new(&mut ann, &config)
        .create("ann", &mut GameRng::new(7))
        .unwrap();
    ann.write(
        &session_root(&config.table_root, &id).child("layoutSeed"),
        json!("1;x;3"),
    )
    .unwrap();

    let mut bob = store.connect();
    assert!(matches!(
        Lobby::new(&mut bob, &config).join(&id, "bob"),
        Err(SessionError::Seed(_))
    ));
}

/// A catalog smaller than the board's pair count cannot deal a session.
#[test]
fn test_create_with_small_catalog() {
    let store = MemoryStore::new();
    let config = config().with_symbols(["cat", "dog"]);
    let mut ann = store.connect();

    let result = Lobby::new(&mut ann, &config).find_or_create("ann", &mut GameRng::new(9));
    assert_eq!(
        result,
        Err(SessionError::Layout(LayoutError::CatalogTooSmall { pairs: 10, catalog: 2 }))
    );
    assert_eq!(store.get(&DocPath::new(&config.table_root)), None);
}

/// Abandoning removes the session, leaving the table empty.
#[test]
fn test_abandon_removes_session() {
    let store = MemoryStore::new();
    let config = config();
    let mut ann = store.connect();
    let mut lobby = Lobby::new(&mut ann, &config);
    let id = lobby.create("ann", &mut GameRng::new(8)).unwrap();
    lobby.abandon(&id).unwrap();
    lobby.abandon(&id).unwrap();

    assert_eq!(store.get(&DocPath::new(&config.table_root)), None);
}
