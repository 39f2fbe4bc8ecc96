//! Matchmaking over the shared table.
//!
//! Three steps, first hit wins:
//!
//! 1. Resume: a session whose `player1` carries our nickname. If it already
//!    has a `player2` we are seated; otherwise we keep waiting on it.
//! 2. Join: the first session with a `player1` and no `player2`. We write
//!    our nickname into `player2`, re-read the document and validate it.
//! 3. Create: write a fresh document with new seeds and wait.
//!
//! Sessions are visited in key order, so two peers scanning the same table
//! see the same candidates in the same order.

use serde_json::Value;

use crate::board::Seeds;
use crate::channel::{DocPath, SharedChannel};
use crate::core::{GameRng, MatchConfig, Seat, SeatMap};
use crate::error::SessionError;
use crate::session::document::{session_root, Field, SessionDocument};
use crate::session::Phase;

/// Everything a peer needs to start a `MatchSession`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seating {
    pub session_id: String,
    pub seat: Seat,
    pub nicknames: SeatMap<Option<String>>,
    pub seeds: Seeds,
}

impl Seating {
    /// Seat `seat` at a validated document.
    pub fn from_document(
        session_id: impl Into<String>,
        seat: Seat,
        document: &SessionDocument,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            session_id: session_id.into(),
            seat,
            nicknames: SeatMap::new(|s| document.player(s).nickname.clone()),
            seeds: document.seeds()?,
        })
    }

    /// Opponent's nickname, if known.
    #[must_use]
    pub fn opponent(&self) -> Option<&str> {
        self.nicknames.get(self.seat.other()).as_deref()
    }
}

/// Result of one matchmaking pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LobbyOutcome {
    /// We own this session and nobody has joined yet. Poll
    /// `Lobby::check_opponent` until it returns a seating.
    Waiting { session_id: String },
    /// Both seats are taken.
    Seated(Seating),
}

impl LobbyOutcome {
    /// Lifecycle phase this outcome leaves the peer in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            LobbyOutcome::Waiting { .. } => Phase::Forming,
            LobbyOutcome::Seated(_) => Phase::Joining,
        }
    }
}

/// Matchmaking front end borrowing a peer's channel.
pub struct Lobby<'a, C: SharedChannel> {
    channel: &'a mut C,
    config: &'a MatchConfig,
}

impl<'a, C: SharedChannel> Lobby<'a, C> {
    pub fn new(channel: &'a mut C, config: &'a MatchConfig) -> Self {
        Self { channel, config }
    }

    fn table(&self) -> DocPath {
        DocPath::new(&self.config.table_root)
    }

    fn root(&self, session_id: &str) -> DocPath {
        session_root(&self.config.table_root, session_id)
    }

    /// Resume, join or create, in that order.
    pub fn find_or_create(
        &mut self,
        nickname: &str,
        rng: &mut GameRng,
    ) -> Result<LobbyOutcome, SessionError> {
        let table = self.channel.read(&self.table())?;
        let sessions = table.as_ref().and_then(Value::as_object);

        if let Some(sessions) = sessions {
            for (id, session) in sessions {
                if nickname_at(session, Seat::Player1) == Some(nickname) {
                    tracing::info!(session = %id, "resuming own session");
                    return Ok(match nickname_at(session, Seat::Player2) {
                        Some(_) => {
                            let document = SessionDocument::validate(Some(session))?;
                            LobbyOutcome::Seated(Seating::from_document(
                                id.clone(),
                                Seat::Player1,
                                &document,
                            )?)
                        }
                        None => LobbyOutcome::Waiting {
                            session_id: id.clone(),
                        },
                    });
                }
            }

            let open = sessions.iter().find(|(_, session)| {
                nickname_at(session, Seat::Player1).is_some()
                    && nickname_at(session, Seat::Player2).is_none()
            });
            if let Some((id, _)) = open {
                let id = id.clone();
                return self.join(&id, nickname).map(LobbyOutcome::Seated);
            }
        }

        let session_id = self.create(nickname, rng)?;
        Ok(LobbyOutcome::Waiting { session_id })
    }

    /// Write a fresh session document as `player1`. Returns its id.
    pub fn create(&mut self, nickname: &str, rng: &mut GameRng) -> Result<String, SessionError> {
        let session_id = uuid::Builder::from_random_bytes(rng.bytes16())
            .into_uuid()
            .to_string();
        let deal = rng.for_context(&session_id);
        let seeds = Seeds::generate(&deal, self.config.grid, self.config.symbols.len())?;
        let document = SessionDocument::initial(nickname, &seeds);

        let root = self.root(&session_id);
        self.channel.write(&root, document.to_value()?)?;
        tracing::info!(session = %session_id, grid = ?self.config.grid, "created session");
        Ok(session_id)
    }

    /// Take the `player2` seat of `session_id`.
    ///
    /// Fails with `MalformedSession` if the document is missing any field
    /// after the join; the caller should start matchmaking over.
    pub fn join(&mut self, session_id: &str, nickname: &str) -> Result<Seating, SessionError> {
        let root = self.root(session_id);
        self.channel.write(
            &Field::Nickname(Seat::Player2).path(&root),
            Value::String(nickname.to_string()),
        )?;

        let value = self.channel.read(&root)?;
        let document = SessionDocument::validate(value.as_ref()).map_err(|err| {
            tracing::warn!(session = %session_id, error = %err, "joined a malformed session");
            err
        })?;
        tracing::info!(session = %session_id, "joined as player2");
        Seating::from_document(session_id, Seat::Player2, &document)
    }

    /// For the creator: seat us once someone has taken `player2`.
    pub fn check_opponent(&mut self, session_id: &str) -> Result<Option<Seating>, SessionError> {
        let value = self.channel.read(&self.root(session_id))?;
        let joined = value
            .as_ref()
            .and_then(|session| nickname_at(session, Seat::Player2))
            .is_some();
        if !joined {
            return Ok(None);
        }
        let document = SessionDocument::validate(value.as_ref())?;
        Seating::from_document(session_id, Seat::Player1, &document).map(Some)
    }

    /// Give up on a session we are waiting on.
    pub fn abandon(&mut self, session_id: &str) -> Result<(), SessionError> {
        let root = self.root(session_id);
        self.channel.remove(&root)?;
        tracing::info!(session = %session_id, "left the lobby");
        Ok(())
    }
}

fn nickname_at(session: &Value, seat: Seat) -> Option<&str> {
    session.get(seat.key())?.get("nickname")?.as_str()
}
