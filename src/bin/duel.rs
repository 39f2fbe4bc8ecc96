//! Two bots playing a networked match over an in-memory store.
//!
//! Usage: `duel [seed]`. Set `RUST_LOG=debug` to watch the protocol.

use std::time::Duration;

use rustc_hash::FxHashMap;

use pairsync::{
    GameRng, GridSize, Lobby, LobbyOutcome, MatchConfig, MatchEvent, MatchSession, MemoryChannel,
    MemoryStore, Phase, Seat, SymbolId,
};

const STEP: Duration = Duration::from_millis(500);
const MAX_STEPS: usize = 10_000;

fn init_logging() {
    const LOG_ENV: &str = "RUST_LOG";
    use std::str::FromStr;
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var(LOG_ENV)
        .map(|env| {
            EnvFilter::from_str(env.to_uppercase().as_str())
                .unwrap_or_else(|err| panic!("invalid `{}` environment variable {}", LOG_ENV, err))
        })
        .unwrap_or(EnvFilter::default().add_directive(Level::INFO.into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Remembers every card it has seen face-up.
struct Bot {
    name: &'static str,
    rng: GameRng,
    seen: FxHashMap<usize, SymbolId>,
}

impl Bot {
    fn new(name: &'static str, rng: GameRng) -> Self {
        Self {
            name,
            rng,
            seen: FxHashMap::default(),
        }
    }

    fn remember(&mut self, session: &MatchSession<MemoryChannel>, events: &[MatchEvent]) {
        for event in events {
            if let MatchEvent::CardRevealed { cell, .. } = event {
                if let Some(card) = session.board().cell(*cell) {
                    self.seen.insert(*cell, card.symbol);
                }
            }
        }
    }

    fn choose(&mut self, session: &MatchSession<MemoryChannel>) -> Option<usize> {
        let board = session.board();
        let hidden: Vec<usize> = (0..board.len())
            .filter(|&i| board.check_reveal(i).is_ok())
            .collect();
        if hidden.is_empty() {
            return None;
        }

        let known = |cell: usize| self.seen.get(&cell).copied();
        match board.revealed() {
            [first] => {
                let symbol = board.cell(*first).map(|c| c.symbol);
                if let Some(partner) = hidden.iter().find(|c| known(**c) == symbol) {
                    return Some(*partner);
                }
            }
            _ => {
                for &a in &hidden {
                    let pair = known(a).is_some()
                        && hidden.iter().any(|&b| b != a && known(b) == known(a));
                    if pair {
                        return Some(a);
                    }
                }
            }
        }
        let unknown: Vec<usize> = hidden.iter().copied().filter(|&c| known(c).is_none()).collect();
        let pool = if unknown.is_empty() { &hidden } else { &unknown };
        Some(pool[self.rng.gen_range_usize(0..pool.len())])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let seed = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()?
        .unwrap_or(7);
    let config = MatchConfig::default().with_grid(GridSize::Small);
    let store = MemoryStore::new();

    let mut ann_channel = store.connect();
    let mut bob_channel = store.connect();
    let mut rng = GameRng::new(seed);

    let session_id = match Lobby::new(&mut ann_channel, &config).find_or_create("ann", &mut rng)? {
        LobbyOutcome::Waiting { session_id } => session_id,
        LobbyOutcome::Seated(_) => return Err("empty table already had an opponent".into()),
    };
    let bob_seating = match Lobby::new(&mut bob_channel, &config).find_or_create("bob", &mut rng)? {
        LobbyOutcome::Seated(seating) => seating,
        LobbyOutcome::Waiting { .. } => return Err("bob did not find ann's session".into()),
    };
    let ann_seating = Lobby::new(&mut ann_channel, &config)
        .check_opponent(&session_id)?
        .ok_or("ann does not see bob")?;

    let mut ann = MatchSession::new(ann_channel, config.clone(), ann_seating)?;
    let mut bob = MatchSession::new(bob_channel, config, bob_seating)?;
    let mut bots = [
        Bot::new("ann", rng.for_context("ann")),
        Bot::new("bob", rng.for_context("bob")),
    ];

    ann.request_ready()?;
    bob.request_ready()?;

    for step in 0..MAX_STEPS {
        for (session, bot) in [&mut ann, &mut bob].into_iter().zip(bots.iter_mut()) {
            session.pump();
            session.tick(STEP);
            let events = session.drain_events();
            bot.remember(session, &events);
            for event in &events {
                match event {
                    MatchEvent::PairResolved { .. }
                    | MatchEvent::TierChanged(_)
                    | MatchEvent::SessionEnded { .. } => {
                        tracing::info!(bot = bot.name, ?event);
                    }
                    _ => tracing::debug!(bot = bot.name, ?event),
                }
            }

            if session.can_flip() {
                if let Some(cell) = bot.choose(session) {
                    session.request_flip(cell)?;
                }
            }
        }

        if ann.phase() == Phase::Ended && bob.phase() == Phase::Ended {
            tracing::info!(
                steps = step,
                ann = ann.scores()[Seat::Player1],
                bob = ann.scores()[Seat::Player2],
                "match over"
            );
            return Ok(());
        }
    }

    Err(format!("match did not finish within {MAX_STEPS} steps").into())
}
