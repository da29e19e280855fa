//! Web Push subscriptions. Only storage lives here; delivering notifications
//! is left to whatever reads the store.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser's `PushSubscription` as posted by the service worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

impl PushSubscription {
    pub fn is_valid(&self) -> bool {
        self.endpoint.starts_with("https://")
            && !self.keys.p256dh.is_empty()
            && !self.keys.auth.is_empty()
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("subscription store is full ({capacity} entries)")]
pub struct StoreFull {
    pub capacity: usize,
}

pub trait SubscriptionStore: Send + Sync {
    /// Stores the subscription. Returns false if the endpoint was already
    /// known, in which case its keys are replaced. New endpoints are refused
    /// once the store is at capacity.
    fn add(&self, subscription: PushSubscription) -> Result<bool, StoreFull>;

    /// Returns true if a subscription was removed.
    fn remove(&self, endpoint: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store holding at most `capacity` endpoints. Starts empty
/// and is lost on restart.
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<String, PushSubscription>>,
    capacity: usize,
}

impl InMemorySubscriptionStore {
    pub fn new(capacity: usize) -> Self {
        InMemorySubscriptionStore {
            subscriptions: RwLock::new(HashMap::new()),
            capacity,
        }
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn add(&self, subscription: PushSubscription) -> Result<bool, StoreFull> {
        let mut subscriptions = self.subscriptions.write();
        if !subscriptions.contains_key(&subscription.endpoint) && subscriptions.len() >= self.capacity
        {
            return Err(StoreFull {
                capacity: self.capacity,
            });
        }
        Ok(subscriptions
            .insert(subscription.endpoint.clone(), subscription)
            .is_none())
    }

    fn remove(&self, endpoint: &str) -> bool {
        self.subscriptions.write().remove(endpoint).is_some()
    }

    fn len(&self) -> usize {
        self.subscriptions.read().len()
    }
}
