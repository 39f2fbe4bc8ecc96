//! Shared session document schema.
//!
//! One session lives under `<table_root>/<session_id>`:
//!
//! ```text
//! turn            "player1" | "player2"
//! player1         { nickname, score, ready }
//! player2         { nickname?, score, ready }
//! cardFlip        { location, by }      location -1 = no flip yet
//! paused          bool
//! timeBarReset    integer               -1 = pre-session
//! exit            bool
//! layoutSeed      "3;0;12;..."
//! contentSeed     "7;41;2;..."
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::Seeds;
use crate::channel::DocPath;
use crate::core::{seeds, Seat};
use crate::error::{ChannelError, SessionError};
use crate::timer::COUNTER_SENTINEL;

/// `cardFlip.location` before any flip was dispatched.
pub const NO_FLIP: i64 = -1;

/// Fields that must exist after a join, as dotted paths.
pub const REQUIRED_FIELDS: [&str; 15] = [
    "turn",
    "player1",
    "player1.score",
    "player1.ready",
    "player2",
    "player2.score",
    "player2.ready",
    "cardFlip",
    "cardFlip.location",
    "cardFlip.by",
    "paused",
    "timeBarReset",
    "exit",
    "layoutSeed",
    "contentSeed",
];

/// One seat's subtree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub score: u32,
    pub ready: bool,
}

/// Last dispatched flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFlip {
    pub location: i64,
    pub by: Seat,
}

impl CardFlip {
    /// The "no flip yet" sentinel.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            location: NO_FLIP,
            by: Seat::Player1,
        }
    }

    #[must_use]
    pub fn new(cell: usize, by: Seat) -> Self {
        Self {
            location: cell as i64,
            by,
        }
    }

    /// Cell index, or `None` for the sentinel.
    #[must_use]
    pub fn cell(&self) -> Option<usize> {
        usize::try_from(self.location).ok()
    }
}

/// Whole session document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub turn: Seat,
    pub player1: PlayerEntry,
    pub player2: PlayerEntry,
    pub card_flip: CardFlip,
    pub paused: bool,
    pub time_bar_reset: i64,
    pub exit: bool,
    pub layout_seed: String,
    pub content_seed: String,
}

impl SessionDocument {
    /// Document written by the initiator: sentinels everywhere, nobody
    /// ready, only `player1` named.
    #[must_use]
    pub fn initial(nickname: impl Into<String>, seeds: &Seeds) -> Self {
        Self {
            turn: Seat::Player1,
            player1: PlayerEntry {
                nickname: Some(nickname.into()),
                score: 0,
                ready: false,
            },
            player2: PlayerEntry::default(),
            card_flip: CardFlip::none(),
            paused: false,
            time_bar_reset: COUNTER_SENTINEL,
            exit: false,
            layout_seed: seeds::serialize(&seeds.layout),
            content_seed: seeds::serialize(&seeds.content),
        }
    }

    #[must_use]
    pub fn player(&self, seat: Seat) -> &PlayerEntry {
        match seat {
            Seat::Player1 => &self.player1,
            Seat::Player2 => &self.player2,
        }
    }

    /// Decode both seeds.
    pub fn seeds(&self) -> Result<Seeds, SessionError> {
        Ok(Seeds {
            layout: seeds::parse_serialized_array(&self.layout_seed)?,
            content: seeds::parse_serialized_array(&self.content_seed)?,
        })
    }

    pub fn to_value(&self) -> Result<Value, ChannelError> {
        serde_json::to_value(self).map_err(|err| ChannelError::Decode {
            path: "session".to_string(),
            reason: err.to_string(),
        })
    }

    /// Check that every required field is present, then decode.
    ///
    /// A missing document reports every field as missing.
    pub fn validate(value: Option<&Value>) -> Result<Self, SessionError> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| value.and_then(|v| lookup_dotted(v, field)).is_none())
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SessionError::MalformedSession { missing });
        }

        let value = value.cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|err| {
            SessionError::Channel(ChannelError::Decode {
                path: "session".to_string(),
                reason: err.to_string(),
            })
        })
    }
}

fn lookup_dotted<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |node, key| node.as_object()?.get(key))
        .filter(|v| !v.is_null())
}

/// Individually observable/writable field of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Turn,
    Nickname(Seat),
    Score(Seat),
    Ready(Seat),
    CardFlip,
    Paused,
    TimeBarReset,
    Exit,
    LayoutSeed,
    ContentSeed,
}

impl Field {
    /// Path relative to the session root.
    #[must_use]
    pub fn relative(self) -> String {
        match self {
            Field::Turn => "turn".to_string(),
            Field::Nickname(seat) => format!("{}/nickname", seat.key()),
            Field::Score(seat) => format!("{}/score", seat.key()),
            Field::Ready(seat) => format!("{}/ready", seat.key()),
            Field::CardFlip => "cardFlip".to_string(),
            Field::Paused => "paused".to_string(),
            Field::TimeBarReset => "timeBarReset".to_string(),
            Field::Exit => "exit".to_string(),
            Field::LayoutSeed => "layoutSeed".to_string(),
            Field::ContentSeed => "contentSeed".to_string(),
        }
    }

    /// Absolute path under `session_root`.
    #[must_use]
    pub fn path(self, session_root: &DocPath) -> DocPath {
        session_root.child(self.relative())
    }
}

/// Root of one session's subtree.
#[must_use]
pub fn session_root(table_root: &str, session_id: &str) -> DocPath {
    DocPath::new(table_root).child(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeds() -> Seeds {
        Seeds {
            layout: vec![1, 0, 3, 2],
            content: vec![5, 9],
        }
    }

    #[test]
    fn test_initial_document_shape() {
        let doc = SessionDocument::initial("ann", &seeds());
        let value = doc.to_value().unwrap();

        assert_eq!(value["turn"], json!("player1"));
        assert_eq!(value["player1"], json!({"nickname": "ann", "score": 0, "ready": false}));
        assert_eq!(value["player2"], json!({"score": 0, "ready": false}));
        assert_eq!(value["cardFlip"], json!({"location": -1, "by": "player1"}));
        assert_eq!(value["timeBarReset"], json!(-1));
        assert_eq!(value["paused"], json!(false));
        assert_eq!(value["exit"], json!(false));
        assert_eq!(value["layoutSeed"], json!("1;0;3;2"));
        assert_eq!(value["contentSeed"], json!("5;9"));
    }

    #[test]
    fn test_validate_round_trip() {
        let doc = SessionDocument::initial("ann", &seeds());
        let value = doc.to_value().unwrap();
        assert_eq!(SessionDocument::validate(Some(&value)).unwrap(), doc);
        assert_eq!(doc.seeds().unwrap(), seeds());
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let mut value = SessionDocument::initial("ann", &seeds()).to_value().unwrap();
        let map = value.as_object_mut().unwrap();
        map.remove("exit");
        map.remove("cardFlip");

        let err = SessionDocument::validate(Some(&value)).unwrap_err();
        assert_eq!(
            err,
            SessionError::MalformedSession {
                missing: vec![
                    "cardFlip".to_string(),
                    "cardFlip.location".to_string(),
                    "cardFlip.by".to_string(),
                    "exit".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_validate_missing_document() {
        match SessionDocument::validate(None) {
            Err(SessionError::MalformedSession { missing }) => {
                assert_eq!(missing.len(), REQUIRED_FIELDS.len());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validate_type_mismatch_is_decode_error() {
        let mut value = SessionDocument::initial("ann", &seeds()).to_value().unwrap();
        value["turn"] = json!("player3");
        assert!(matches!(
            SessionDocument::validate(Some(&value)),
            Err(SessionError::Channel(ChannelError::Decode { .. }))
        ));
    }

    #[test]
    fn test_card_flip_sentinel() {
        assert_eq!(CardFlip::none().cell(), None);
        assert_eq!(CardFlip::new(17, Seat::Player2).cell(), Some(17));
    }

    #[test]
    fn test_field_paths() {
        let root = session_root("game/table", "abc");
        assert_eq!(Field::Turn.path(&root).as_str(), "game/table/abc/turn");
        assert_eq!(
            Field::Score(Seat::Player2).path(&root).as_str(),
            "game/table/abc/player2/score"
        );
        assert_eq!(Field::TimeBarReset.relative(), "timeBarReset");
        assert_eq!(Field::Ready(Seat::Player1).relative(), "player1/ready");
    }
}
