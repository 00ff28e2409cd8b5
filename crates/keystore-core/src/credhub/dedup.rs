//! Keyed single-flight execution
//!
//! Concurrent callers that share a key observe exactly one execution of the
//! work and all receive its result. Different keys never wait on each other.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;

/// Outcome of `SingleFlight::run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight<T> {
    pub value: T,
    /// True when the value was produced by another caller's execution
    pub shared: bool,
}

/// Table of in-flight executions keyed by string
///
/// Only keys with a running execution are tracked; nothing is cached once
/// the execution finishes.
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
}

enum Role<T> {
    Leader(watch::Sender<Option<T>>),
    Follower(watch::Receiver<Option<T>>),
}

/// Removes the leader's entry even if its future is dropped mid-flight.
struct FlightGuard<'a, T> {
    calls: &'a Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
    key: &'a str,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(self.key);
    }
}

impl<T: Clone + Send + Sync> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` unless an execution for `key` is already in flight, in
    /// which case wait for that execution and return a clone of its value
    ///
    /// Waiting callers cannot abandon the wait early; they return when the
    /// running execution finishes or is dropped.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Flight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        loop {
            match self.join(key) {
                Role::Leader(tx) => {
                    let _guard = FlightGuard {
                        calls: &self.calls,
                        key,
                    };
                    let value = work().await;
                    tx.send_replace(Some(value.clone()));
                    return Flight { value, shared: false };
                }
                Role::Follower(mut rx) => {
                    // Err means the leader was dropped before finishing; race to lead again.
                    let done = rx.wait_for(Option::is_some).await.ok().and_then(|v| (*v).clone());
                    if let Some(value) = done {
                        return Flight { value, shared: true };
                    }
                }
            }
        }
    }

    /// Number of keys with an execution in flight
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn join(&self, key: &str) -> Role<T> {
        let mut calls = self.calls.lock();
        if let Some(rx) = calls.get(key) {
            return Role::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        calls.insert(key.to_string(), rx);
        Role::Leader(tx)
    }
}

impl<T: Clone + Send + Sync> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}
