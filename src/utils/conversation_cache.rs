use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::conversation::Turn;

/// Conversation history per logged-in employee.
///
/// Entries expire after `ttl` without access, the way a chat session would.
/// Writers that read, compute and store a history hold the employee's
/// [`lock`](Self::lock) across all three steps.
#[derive(Clone)]
pub struct ConversationStore {
    cache: Cache<String, Vec<Turn>>,
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl ConversationStore {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(ttl)
                .build(),
            locks: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(ttl)
                .build(),
        }
    }

    /// Serialises history writers for one employee until the guard drops.
    pub async fn lock(&self, employee_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(employee_id.to_string(), async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }

    /// Stored history, empty when there is none.
    pub async fn load(&self, employee_id: &str) -> Vec<Turn> {
        self.cache.get(employee_id).await.unwrap_or_default()
    }

    pub async fn save(&self, employee_id: &str, history: Vec<Turn>) {
        self.cache.insert(employee_id.to_string(), history).await;
    }

    /// Seeds the greeting of a new session; an existing session is kept.
    pub async fn start_session(&self, employee_id: &str, greeting: String) -> Vec<Turn> {
        let entry = self
            .cache
            .entry(employee_id.to_string())
            .or_insert_with(async { vec![Turn::assistant(greeting)] })
            .await;
        entry.into_value()
    }

    /// Appends `turns` to the session, starting it with `greeting` if needed.
    pub async fn append(&self, employee_id: &str, greeting: String, turns: Vec<Turn>) {
        let _guard = self.lock(employee_id).await;
        let mut history = self.start_session(employee_id, greeting).await;
        history.extend(turns);
        self.save(employee_id, history).await;
    }

    pub async fn clear(&self, employee_id: &str) {
        self.cache.invalidate(employee_id).await;
    }
}
