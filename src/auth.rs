// Client session — the authorization token, the signed-in user id and their profile.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::{PROFILE_KEY, TOKEN_KEY, USER_ID_KEY};
use crate::storage::{KeyValueStore, StorageError};

/// Holds the single live authorization token.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    /// Replace the stored token. Persistence failures are logged; the call
    /// that delivered the token still succeeds.
    pub fn set_token(&self, token: &str) {
        if self.token().as_deref() == Some(token) {
            return;
        }
        debug!("storing new authorization token");
        if let Err(e) = self.store.set(TOKEN_KEY, token) {
            warn!("failed storing token: {}", e);
        }
    }

    pub fn clear_token(&self) {
        if self.token().is_none() {
            return;
        }
        debug!("clearing authorization token");
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!("failed clearing token: {}", e);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user_id: Option<u64>,
    pub profile: Option<Profile>,
}

/// Signed-in user state, persisted and published to subscribers.
pub struct AuthSession {
    store: Arc<dyn KeyValueStore>,
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let initial = AuthSnapshot {
            user_id: read_user_id(store.as_ref()),
            profile: read_profile(store.as_ref()),
        };
        let (tx, _) = watch::channel(initial);
        Self { store, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<u64> {
        read_user_id(self.store.as_ref())
    }

    pub fn profile(&self) -> Option<Profile> {
        read_profile(self.store.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile().is_some()
    }

    pub fn set_profile(&self, profile: Profile) -> Result<(), StorageError> {
        self.store.set(PROFILE_KEY, &serde_json::to_string(&profile)?)?;
        self.tx.send_modify(|s| s.profile = Some(profile));
        Ok(())
    }

    /// Record the signed-in user. A different id drops the stored profile;
    /// id 0 signs out. Recording the id that is already stored keeps the
    /// profile.
    pub fn set_user_id(&self, user_id: u64) -> Result<(), StorageError> {
        let changed = self.user_id() != Some(user_id).filter(|id| *id != 0);
        if changed {
            self.store.remove(PROFILE_KEY)?;
        }
        if user_id == 0 {
            self.store.remove(USER_ID_KEY)?;
        } else {
            self.store.set(USER_ID_KEY, &user_id.to_string())?;
        }
        self.tx.send_modify(|s| {
            if changed {
                s.profile = None;
            }
            s.user_id = Some(user_id).filter(|id| *id != 0);
        });
        Ok(())
    }

    pub fn clear_user_id(&self) -> Result<(), StorageError> {
        self.set_user_id(0)
    }
}

fn read_user_id(store: &dyn KeyValueStore) -> Option<u64> {
    let raw = store.get(USER_ID_KEY)?;
    match raw.trim().parse() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("ignoring stored user id {:?}: {}", raw, e);
            None
        }
    }
}

fn read_profile(store: &dyn KeyValueStore) -> Option<Profile> {
    let raw = store.get(PROFILE_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("ignoring stored profile: {}", e);
            None
        }
    }
}
