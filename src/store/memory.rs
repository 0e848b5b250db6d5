//! In-memory session and ledger store with JSON fixture persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::auth::session::{SessionRecord, SessionStore};
use crate::auth::user::{UserDirectory, UserId, UserIdentity};
use crate::error::StoreError;
use crate::points::ledger::{LedgerEntry, LedgerStore};

/// Session row: the user is joined at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: u64,
}

/// On-disk snapshot of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreFixture {
    pub users: Vec<UserIdentity>,
    pub sessions: Vec<StoredSession>,
    pub ledger: Vec<LedgerEntry>,
}

/// A thread-safe store for users, sessions and ledger entries.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, UserIdentity>,
    sessions: DashMap<String, StoredSession>,
    /// Per-user entries, in append order.
    ledger: DashMap<UserId, Vec<LedgerEntry>>,
    persistence_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from a fixture file if it exists; otherwise start empty.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let fixture: StoreFixture = serde_json::from_reader(reader)?;
            store.apply_fixture(fixture);
            tracing::info!(
                users = store.users.len(),
                sessions = store.session_count(),
                "Loaded store fixture"
            );
        }
        Ok(store)
    }

    /// Seed the store from a fixture.
    pub fn apply_fixture(&self, fixture: StoreFixture) {
        for user in fixture.users {
            self.insert_user(user);
        }
        for session in fixture.sessions {
            self.sessions.insert(session.token.clone(), session);
        }
        for entry in fixture.ledger {
            self.ledger.entry(entry.user_id.clone()).or_default().push(entry);
        }
    }

    /// Snapshot current contents.
    pub fn snapshot(&self) -> StoreFixture {
        let mut users: Vec<_> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        let mut sessions: Vec<_> = self.sessions.iter().map(|r| r.value().clone()).collect();
        sessions.sort_by(|a, b| a.token.cmp(&b.token));
        let mut ledger_users: Vec<_> = self.ledger.iter().map(|r| r.key().clone()).collect();
        ledger_users.sort();
        let ledger = ledger_users.iter().flat_map(|id| self.entries_for(id)).collect();
        StoreFixture { users, sessions, ledger }
    }

    /// Save to the persistence path, if one was configured.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            let fixture = self.snapshot();
            serde_json::to_writer_pretty(writer, &fixture)?;
            tracing::info!(path = ?path, ledger_entries = fixture.ledger.len(), "Saved store fixture");
        }
        Ok(())
    }

    pub fn insert_user(&self, user: UserIdentity) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn user(&self, id: &UserId) -> Option<UserIdentity> {
        self.users.get(id).map(|r| r.value().clone())
    }

    pub fn insert_session(&self, token: impl Into<String>, user_id: &UserId, expires_at: u64) {
        let token = token.into();
        self.sessions.insert(
            token.clone(),
            StoredSession {
                token,
                user_id: user_id.clone(),
                expires_at,
            },
        );
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Ledger entries for one user, oldest first.
    pub fn entries_for(&self, user_id: &UserId) -> Vec<LedgerEntry> {
        self.ledger.get(user_id).map(|r| r.value().clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn lookup_session_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let Some(session) = self.sessions.get(token).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        Ok(self.user(&session.user_id).map(|user| SessionRecord {
            user,
            expires_at: session.expires_at,
        }))
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.remove(token);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserIdentity>, StoreError> {
        Ok(self.user(id))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn sum_deltas_for_user(&self, user_id: &UserId) -> Result<i64, StoreError> {
        // Exact in i128, clamped once so the result does not depend on entry order.
        let total: i128 = self
            .ledger
            .get(user_id)
            .map(|r| r.value().iter().map(|e| i128::from(e.delta)).sum())
            .unwrap_or(0);
        Ok(i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX }))
    }

    async fn append(&self, entry: LedgerEntry) -> Result<(), StoreError> {
        self.ledger.entry(entry.user_id.clone()).or_default().push(entry);
        Ok(())
    }
}
