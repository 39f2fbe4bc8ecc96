//! In-memory shared document.
//!
//! `MemoryStore` holds one JSON document shared by any number of
//! `MemoryChannel` endpoints. Each endpoint has its own FIFO inbox, filled
//! at mutation time, so every endpoint sees mutations in store order while
//! the test (or embedding loop) decides when each endpoint processes them.
//! That is enough to exercise interleavings where one peer lags behind the
//! other.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use super::{Change, DocPath, SharedChannel, SubscriptionId};
use crate::error::ChannelError;

#[derive(Debug)]
struct Subscription {
    endpoint: u32,
    path: DocPath,
}

#[derive(Debug)]
struct StoreInner {
    doc: Value,
    subscriptions: FxHashMap<SubscriptionId, Subscription>,
    inboxes: FxHashMap<u32, VecDeque<Change>>,
    next_subscription: u64,
    next_endpoint: u32,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            doc: Value::Object(Map::new()),
            subscriptions: FxHashMap::default(),
            inboxes: FxHashMap::default(),
            next_subscription: 0,
            next_endpoint: 0,
        }
    }
}

impl StoreInner {
    fn get(&self, path: &DocPath) -> Option<&Value> {
        let mut node = &self.doc;
        for segment in path.segments() {
            node = node.as_object()?.get(segment)?;
        }
        (!node.is_null()).then_some(node)
    }

    fn set(&mut self, path: &DocPath, value: Value) {
        let segments: Vec<&str> = path.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            self.doc = match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            };
            return;
        };

        let mut node = &mut self.doc;
        for segment in parents {
            node = ensure_object(node)
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(node).insert(last.to_string(), value);
    }

    fn delete(&mut self, path: &DocPath) {
        let segments: Vec<&str> = path.segments().collect();
        if segments.is_empty() {
            self.doc = Value::Object(Map::new());
            return;
        }
        remove_and_prune(&mut self.doc, &segments);
    }

    /// Queue the post-mutation value for every subscription overlapping
    /// `path`, in subscription order.
    fn notify(&mut self, path: &DocPath) {
        let mut affected: Vec<(&SubscriptionId, &Subscription)> = self
            .subscriptions
            .iter()
            .filter(|(_, sub)| sub.path.overlaps(path))
            .collect();
        affected.sort_by_key(|(id, _)| **id);

        let changes: Vec<(u32, Change)> = affected
            .into_iter()
            .map(|(id, sub)| {
                (
                    sub.endpoint,
                    Change {
                        subscription: *id,
                        path: sub.path.clone(),
                        value: self.get(&sub.path).cloned(),
                    },
                )
            })
            .collect();

        for (endpoint, change) in changes {
            self.inboxes.entry(endpoint).or_default().push_back(change);
        }
    }
}

/// Replace a non-object node with an empty object and borrow it as a map.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Remove the value at `segments` and any object left empty on the way up.
/// Returns true if `node` itself became empty.
fn remove_and_prune(node: &mut Value, segments: &[&str]) -> bool {
    let Value::Object(map) = node else {
        return false;
    };
    match segments {
        [] => false,
        [last] => {
            map.remove(*last);
            map.is_empty()
        }
        [first, rest @ ..] => {
            let emptied = map
                .get_mut(*first)
                .is_some_and(|child| remove_and_prune(child, rest));
            if emptied {
                map.remove(*first);
            }
            map.is_empty()
        }
    }
}

/// Shared document backing any number of endpoints.
///
/// ```
/// use pairsync::channel::{DocPath, MemoryStore, SharedChannel};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// let mut alice = store.connect();
/// let mut bob = store.connect();
///
/// let turn = DocPath::new("game/table/s1/turn");
/// let sub = bob.observe(&turn).unwrap();
/// assert_eq!(bob.poll().unwrap().value, None);
///
/// alice.write(&turn, json!("player2")).unwrap();
/// let change = bob.poll().unwrap();
/// assert_eq!(change.subscription, sub);
/// assert_eq!(change.value, Some(json!("player2")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new endpoint with its own inbox.
    #[must_use]
    pub fn connect(&self) -> MemoryChannel {
        let mut inner = self.inner.borrow_mut();
        let endpoint = inner.next_endpoint;
        inner.next_endpoint += 1;
        inner.inboxes.insert(endpoint, VecDeque::new());

        MemoryChannel {
            endpoint,
            store: Rc::clone(&self.inner),
            failing_writes: 0,
        }
    }

    /// Copy of the whole document.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.inner.borrow().doc.clone()
    }

    /// Current value at `path`.
    #[must_use]
    pub fn get(&self, path: &DocPath) -> Option<Value> {
        self.inner.borrow().get(path).cloned()
    }

    /// Live subscriptions across all endpoints.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }
}

/// One client's connection to a `MemoryStore`.
#[derive(Debug)]
pub struct MemoryChannel {
    endpoint: u32,
    store: Rc<RefCell<StoreInner>>,
    failing_writes: u32,
}

impl MemoryChannel {
    /// Make the next `count` writes or removes from this endpoint fail
    /// without touching the document.
    pub fn fail_writes(&mut self, count: u32) {
        self.failing_writes = count;
    }

    /// Deliveries waiting in this endpoint's inbox.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.store
            .borrow()
            .inboxes
            .get(&self.endpoint)
            .map_or(0, VecDeque::len)
    }

    /// Live subscriptions held by this endpoint.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.store
            .borrow()
            .subscriptions
            .values()
            .filter(|sub| sub.endpoint == self.endpoint)
            .count()
    }

    fn take_failure(&mut self, path: &DocPath) -> Result<(), ChannelError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(ChannelError::WriteFailed {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

impl SharedChannel for MemoryChannel {
    fn write(&mut self, path: &DocPath, value: Value) -> Result<(), ChannelError> {
        self.take_failure(path)?;
        tracing::trace!(endpoint = self.endpoint, %path, %value, "write");

        let mut store = self.store.borrow_mut();
        if value.is_null() {
            store.delete(path);
        } else {
            store.set(path, value);
        }
        store.notify(path);
        Ok(())
    }

    fn remove(&mut self, path: &DocPath) -> Result<(), ChannelError> {
        self.take_failure(path)?;
        tracing::trace!(endpoint = self.endpoint, %path, "remove");

        let mut store = self.store.borrow_mut();
        store.delete(path);
        store.notify(path);
        Ok(())
    }

    fn read(&self, path: &DocPath) -> Result<Option<Value>, ChannelError> {
        Ok(self.store.borrow().get(path).cloned())
    }

    fn observe(&mut self, path: &DocPath) -> Result<SubscriptionId, ChannelError> {
        let mut store = self.store.borrow_mut();
        let id = SubscriptionId(store.next_subscription);
        store.next_subscription += 1;
        store.subscriptions.insert(
            id,
            Subscription {
                endpoint: self.endpoint,
                path: path.clone(),
            },
        );

        let replay = Change {
            subscription: id,
            path: path.clone(),
            value: store.get(path).cloned(),
        };
        store.inboxes.entry(self.endpoint).or_default().push_back(replay);
        Ok(id)
    }

    fn unobserve(&mut self, subscription: SubscriptionId) {
        let mut store = self.store.borrow_mut();
        if store.subscriptions.remove(&subscription).is_none() {
            return;
        }
        if let Some(inbox) = store.inboxes.get_mut(&self.endpoint) {
            inbox.retain(|change| change.subscription != subscription);
        }
    }

    fn poll(&mut self) -> Option<Change> {
        self.store
            .borrow_mut()
            .inboxes
            .get_mut(&self.endpoint)?
            .pop_front()
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        if let Ok(mut store) = self.store.try_borrow_mut() {
            let endpoint = self.endpoint;
            store.subscriptions.retain(|_, sub| sub.endpoint != endpoint);
            store.inboxes.remove(&endpoint);
        }
    }
}
