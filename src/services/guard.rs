//! Re-entrancy guard for mutating actions
//!
//! A second click on the same action while the first request is still in
//! flight is suppressed. This is a UI-level flag, not a lock: it only stops
//! duplicate submissions from this client.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Mutating actions keyed by the id they act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingAction {
    GrantLoan(i64),
    ConfirmPickup(i64),
    ReturnLoan(i64),
    PayFine(i64),
    Reserve(i64),
    DeleteBook(i64),
}

/// Result of an action that went through the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// Same action already in flight; no request was sent
    Suppressed,
}

pub struct SubmitGuard<K: Eq + Hash> {
    in_flight: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Clone for SubmitGuard<K> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<K: Eq + Hash> Default for SubmitGuard<K> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> SubmitGuard<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight. `None` when it already is.
    pub fn try_begin(&self, key: K) -> Option<SubmitTicket<K>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.clone()) {
            return None;
        }
        Some(SubmitTicket {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases its key when dropped, whatever the outcome of the request
pub struct SubmitTicket<K: Eq + Hash> {
    key: K,
    in_flight: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Drop for SubmitTicket<K> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
