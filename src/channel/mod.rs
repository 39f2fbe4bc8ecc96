//! Shared document channel.
//!
//! The only communication path between peers: a path-addressed, observable
//! JSON document with no transactions, no compare-and-swap, and no ordering
//! guarantee across clients. Observation is message-passing: `observe`
//! returns a handle, and changes are pulled from the endpoint with `poll`.
//!
//! ## Contract
//!
//! - `write`: fire-and-forget from the caller's point of view; may fail,
//!   and a failure is never retried here.
//! - `observe`: delivers the current value immediately, then once per
//!   subsequent mutation touching the path. Consumers must tolerate the
//!   redundant first delivery.
//! - `unobserve`: idempotent, including on unknown handles.
//! - `remove`: removing a missing path is a no-op.
//!
//! Any field written by more than one role is a protocol bug that the
//! channel cannot detect.

mod memory;

pub use memory::{MemoryChannel, MemoryStore};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChannelError;

/// Slash-separated document path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocPath(String);

impl DocPath {
    /// Build a path, ignoring empty segments.
    ///
    /// ```
    /// use pairsync::channel::DocPath;
    ///
    /// let path = DocPath::new("/game//table/");
    /// assert_eq!(path.as_str(), "game/table");
    /// assert_eq!(path.child("abc").child("turn").as_str(), "game/table/abc/turn");
    /// ```
    pub fn new(path: impl AsRef<str>) -> Self {
        let joined = path
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// The document root.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Extend with one or more segments.
    #[must_use]
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let tail = DocPath::new(segment);
        if self.0.is_empty() {
            return tail;
        }
        if tail.0.is_empty() {
            return self.clone();
        }
        Self(format!("{}/{}", self.0, tail.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, or `None` at the root.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments().last()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` equals `other` or contains it.
    #[must_use]
    pub fn contains(&self, other: &DocPath) -> bool {
        let mut mine = self.segments();
        let mut theirs = other.segments();
        loop {
            match (mine.next(), theirs.next()) {
                (None, _) => return true,
                (Some(_), None) => return false,
                (Some(a), Some(b)) if a != b => return false,
                _ => {}
            }
        }
    }

    /// Whether a mutation at one path can change the value at the other.
    #[must_use]
    pub fn overlaps(&self, other: &DocPath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// Handle returned by `observe`; pass it to `unobserve` to cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// A delivered observation: the value at the subscribed path after a
/// mutation, or `None` if nothing is stored there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub subscription: SubscriptionId,
    pub path: DocPath,
    pub value: Option<Value>,
}

/// Observable key-value document.
pub trait SharedChannel {
    /// Store `value` at `path`, replacing whatever was there. Writing
    /// `Value::Null` is equivalent to `remove`.
    fn write(&mut self, path: &DocPath, value: Value) -> Result<(), ChannelError>;

    /// Delete the value at `path`. A missing path is a no-op.
    fn remove(&mut self, path: &DocPath) -> Result<(), ChannelError>;

    /// One-shot read of the current value.
    fn read(&self, path: &DocPath) -> Result<Option<Value>, ChannelError>;

    /// Subscribe to `path`. The current value is delivered first.
    fn observe(&mut self, path: &DocPath) -> Result<SubscriptionId, ChannelError>;

    /// Cancel a subscription. Safe to call repeatedly.
    fn unobserve(&mut self, subscription: SubscriptionId);

    /// Take the next delivery for this endpoint, in delivery order.
    fn poll(&mut self) -> Option<Change>;
}
