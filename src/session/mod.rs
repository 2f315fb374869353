//! Client session: login flag, current user and their persisted copy.
//!
//! [`SessionStore`] owns a [`SessionState`] and a [`DurableStorage`]. Every
//! mutation runs in two steps: the pure transition in [`SessionState::apply`],
//! then the storage effects it returns. Both finish before the method returns,
//! so storage never lags memory across calls. On a multi-threaded host share
//! the store as `Arc<Mutex<SessionStore<_>>>`; the lock then serializes access
//! to the token and user keys.

mod state;
mod taxonomy;

pub use state::{Effect, Mutation, SessionState, UserRecord};
pub use taxonomy::{Taxonomy, ALL_TYPES};

use crate::storage::{DurableStorage, StorageError, TOKEN_KEY, USER_KEY};

pub struct SessionStore<S: DurableStorage> {
    storage: S,
    state: SessionState,
}

impl<S: DurableStorage> SessionStore<S> {
    /// Build the store from whatever the storage currently holds.
    ///
    /// Never fails: unreadable storage degrades to a logged-out session.
    pub fn initialize(storage: S) -> Self {
        let token = read_key(&storage, TOKEN_KEY);
        let user = if token.is_some() { read_key(&storage, USER_KEY) } else { None };
        let state = SessionState::restore(token.as_deref(), user.as_deref());

        tracing::debug!(
            "Session initialized (logged_in: {}, user fields: {})",
            state.is_logged_in,
            state.current_user.len()
        );

        Self { storage, state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in
    }

    pub fn current_user(&self) -> &UserRecord {
        &self.state.current_user
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Token as currently persisted, if any. Read failures count as absent.
    pub fn token(&self) -> Option<String> {
        read_key(&self.storage, TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_user(&mut self, user: UserRecord) {
        self.commit(Mutation::SetUser(user));
    }

    /// `false` logs out: drops token and user from storage and empties the
    /// in-memory user. `true` only flips the flag; storing the token is the
    /// login flow's job.
    pub fn set_login_state(&mut self, is_login: bool) {
        self.commit(Mutation::SetLoginState(is_login));
        if !is_login {
            tracing::info!("Session logged out");
        }
    }

    pub fn set_counter(&mut self, value: i64) {
        self.commit(Mutation::SetCounter(value));
    }

    pub fn commit(&mut self, mutation: Mutation) {
        let effects = self.state.apply(mutation);
        for effect in effects {
            if let Err(e) = self.run_effect(&effect) {
                self.recover(&effect, e);
            }
        }
    }

    // Memory stays authoritative for this process. A token left behind would
    // log the next process back in, so that one gets a second attempt.
    fn recover(&self, effect: &Effect, err: StorageError) {
        if *effect != Effect::RemoveToken {
            tracing::warn!("Session storage effect {:?} failed: {}", effect, err);
            return;
        }

        tracing::warn!("Removing '{}' from session storage failed, retrying: {}", TOKEN_KEY, err);
        if let Err(e) = self.run_effect(effect) {
            tracing::error!(
                "Logged out but '{}' is still in session storage; the next start will restore it: {}",
                TOKEN_KEY,
                e
            );
        }
    }

    fn run_effect(&self, effect: &Effect) -> Result<(), StorageError> {
        match effect {
            Effect::PersistUser(raw) => self.storage.set(USER_KEY, raw),
            Effect::RemoveToken => self.storage.remove(TOKEN_KEY),
            Effect::RemoveUser => self.storage.remove(USER_KEY),
        }
    }
}

fn read_key<S: DurableStorage>(storage: &S, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to read '{}' from session storage: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user(value: Value) -> UserRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn initialize_reflects_token_presence() {
        let store = SessionStore::initialize(MemoryStorage::new());
        assert!(!store.is_logged_in());

        let store = SessionStore::initialize(MemoryStorage::with_entries([(TOKEN_KEY, "abc")]));
        assert!(store.is_logged_in());
        assert!(store.current_user().is_empty());
    }

    #[test]
    fn initialize_survives_malformed_user() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "abc"), (USER_KEY, "{oops")]);
        let store = SessionStore::initialize(storage);
        assert!(store.is_logged_in());
        assert!(store.current_user().is_empty());
    }

    #[test]
    fn set_user_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::initialize(storage.clone());
        let record = user(json!({"user_id": 7, "username": "neo", "tags": ["a", "b"]}));

        store.set_user(record.clone());

        assert_eq!(store.current_user(), &record);
        let raw = storage.get(USER_KEY).unwrap().unwrap();
        let persisted: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, Value::Object(record));
        assert!(!store.is_logged_in());
    }

    #[test]
    fn logout_clears_everything() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "abc"), (USER_KEY, r#"{"username":"neo"}"#)]);
        let mut store = SessionStore::initialize(storage.clone());
        assert_eq!(store.current_user()["username"], "neo");

        store.set_login_state(false);

        assert!(!store.is_logged_in());
        assert!(store.current_user().is_empty());
        assert!(!storage.contains(TOKEN_KEY));
        assert!(!storage.contains(USER_KEY));
        assert_eq!(store.token(), None);
    }

    #[test]
    fn logout_from_logged_out_state_is_harmless() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::initialize(storage.clone());
        store.set_login_state(false);
        assert!(!store.is_logged_in());
        assert!(storage.is_empty());
    }

    #[test]
    fn login_state_true_leaves_storage_alone() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::initialize(storage.clone());
        store.set_user(user(json!({"username": "neo"})));
        let before = storage.get(USER_KEY).unwrap();

        store.set_login_state(true);

        assert!(store.is_logged_in());
        assert_eq!(store.current_user()["username"], "neo");
        assert_eq!(storage.get(USER_KEY).unwrap(), before);
        assert!(!storage.contains(TOKEN_KEY));
    }

    #[test]
    fn counter_does_not_touch_session() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "abc")]);
        let mut store = SessionStore::initialize(storage.clone());
        store.set_counter(3);
        assert_eq!(store.state().session_counter, 3);
        assert!(store.is_logged_in());
        assert_eq!(storage.len(), 1);
    }

    /// Fails the first `failures` removals of the token key.
    struct FlakyStorage {
        inner: MemoryStorage,
        failures: AtomicUsize,
    }

    impl DurableStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            let left = self.failures.load(Ordering::SeqCst);
            if key == TOKEN_KEY && left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StorageError::Unavailable("disk busy".to_string()));
            }
            self.inner.remove(key)
        }
    }

    fn flaky(failures: usize) -> (MemoryStorage, FlakyStorage) {
        let inner = MemoryStorage::with_entries([(TOKEN_KEY, "abc"), (USER_KEY, r#"{"username":"neo"}"#)]);
        let storage = FlakyStorage {
            inner: inner.clone(),
            failures: AtomicUsize::new(failures),
        };
        (inner, storage)
    }

    #[test]
    fn logout_retries_a_failed_token_removal() {
        let (inner, storage) = flaky(1);
        let mut store = SessionStore::initialize(storage);

        store.set_login_state(false);

        assert!(!store.is_logged_in());
        assert!(!inner.contains(TOKEN_KEY));
        assert!(!inner.contains(USER_KEY));
        assert!(!SessionStore::initialize(inner).is_logged_in());
    }

    #[test]
    fn persistent_token_removal_failure_still_clears_user() {
        let (inner, storage) = flaky(2);
        let mut store = SessionStore::initialize(storage);

        store.set_login_state(false);

        assert!(!store.is_logged_in());
        assert!(store.current_user().is_empty());
        assert!(inner.contains(TOKEN_KEY));
        assert!(!inner.contains(USER_KEY));
    }
}
