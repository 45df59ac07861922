//! In-process [`KeyValueStore`].
//!
//! Backs the `memory` store backend for demos, and doubles as the test store:
//! it counts calls and can be told to fail.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{KeyValueStore, StoreError, PONG};

#[derive(Default)]
struct State {
    strings: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
    closed: bool,
    failure: Option<String>,
    /// Writes left before every further write fails with `failure`.
    writes_before_failure: Option<usize>,
}

pub struct MemoryStore {
    state: Mutex<State>,
    ping_reply: String,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_ping_reply(PONG)
    }

    /// A store whose `ping` answers `reply` instead of `PONG`.
    pub fn with_ping_reply(reply: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            ping_reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent operation fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        let mut state = self.state.lock();
        state.failure = Some(message.into());
        state.writes_before_failure = None;
    }

    /// Let `writes` more `set`/`sadd` calls succeed, then fail every write
    /// with `message`. Reads keep working.
    pub fn fail_after_writes(&self, writes: usize, message: impl Into<String>) {
        let mut state = self.state.lock();
        state.failure = Some(message.into());
        state.writes_before_failure = Some(writes);
    }

    /// Number of trait operations issued so far (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sorted members of the set at `set_key`; empty when absent.
    pub fn members(&self, set_key: &str) -> Vec<String> {
        self.state
            .lock()
            .sets
            .get(set_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of string keys held.
    pub fn len(&self) -> usize {
        self.state.lock().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_read(&self, state: &State) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if state.closed {
            return Err(StoreError::new("memory store has been closed"));
        }
        match (&state.failure, state.writes_before_failure) {
            (Some(message), None) => Err(StoreError::new(message.clone())),
            _ => Ok(()),
        }
    }

    fn check_write(&self, state: &mut State) -> Result<(), StoreError> {
        self.check_read(state)?;
        match state.writes_before_failure.as_mut() {
            Some(0) => Err(StoreError::new(
                state.failure.clone().unwrap_or_default(),
            )),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> Result<String, StoreError> {
        let state = self.state.lock();
        self.check_read(&state)?;
        Ok(self.ping_reply.clone())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = self.state.lock();
        self.check_read(&state)?;
        Ok(state.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<String, StoreError> {
        let mut state = self.state.lock();
        self.check_write(&mut state)?;
        state.strings.insert(key.to_string(), value.to_string());
        Ok("OK".to_string())
    }

    async fn sadd(&self, set_key: &str, member: &str) -> Result<i64, StoreError> {
        let mut state = self.state.lock();
        self.check_write(&mut state)?;
        let added = state
            .sets
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(i64::from(added))
    }

    async fn disconnect(&self) -> Result<(), StoreError> {
        self.state.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.set("a", "1").await.unwrap(), "OK");
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn missing_key_is_none_and_empty_value_is_not() {
        let store = MemoryStore::new();
        assert_eq!(store.get("never-written").await.unwrap(), None);

        store.set("blank", "").await.unwrap();
        assert_eq!(store.get("blank").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn sadd_is_idempotent() {
        let store = MemoryStore::new();
        assert_eq!(store.sadd("books:all", "b1").await.unwrap(), 1);
        assert_eq!(store.sadd("books:all", "b1").await.unwrap(), 0);
        assert_eq!(store.members("books:all"), vec!["b1".to_string()]);
    }

    #[tokio::test]
    async fn counts_every_call() {
        let store = MemoryStore::new();
        store.ping().await.unwrap();
        store.get("x").await.unwrap();
        store.set("x", "y").await.unwrap();
        store.sadd("s", "m").await.unwrap();
        assert_eq!(store.calls(), 4);
    }

    #[tokio::test]
    async fn fail_with_fails_reads_and_writes() {
        let store = MemoryStore::new();
        store.fail_with("connection reset");
        assert_eq!(
            store.ping().await.unwrap_err().message(),
            "connection reset"
        );
        assert!(store.set("k", "v").await.is_err());
    }

    #[tokio::test]
    async fn fail_after_writes_lets_some_writes_through() {
        let store = MemoryStore::new();
        store.fail_after_writes(2, "broken pipe");
        store.set("a", "1").await.unwrap();
        store.sadd("s", "a").await.unwrap();
        assert_eq!(store.set("b", "2").await.unwrap_err().message(), "broken pipe");
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn custom_ping_reply() {
        let store = MemoryStore::with_ping_reply("LOADING");
        assert_eq!(store.ping().await.unwrap(), "LOADING");
    }

    #[tokio::test]
    async fn disconnect_twice_then_operations_fail() {
        let store = MemoryStore::new();
        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
        assert!(store.get("a").await.is_err());
    }
}
