//! Persistent client store
//!
//! A flat key/value namespace that survives restarts. Only identity, the
//! active course, study mode, daily goal, bearer token and the last daily-goal
//! celebration live here; the study session itself is never persisted.

pub mod file;
pub mod keys;

pub use file::JsonFileStore;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreResult;
use crate::model::{CourseId, StudyMode, UserIdentity};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct CelebrationMark {
    date: NaiveDate,
    count: u32,
}

/// Typed view over a [`KeyValueStore`]. Cheap to clone; all clones share the
/// same backing store.
#[derive(Clone)]
pub struct ClientStore {
    inner: Arc<dyn KeyValueStore>,
}

impl ClientStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn user(&self) -> Option<UserIdentity> {
        let raw = self.inner.get(keys::USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "stored user identity is unreadable");
                None
            }
        }
    }

    pub fn set_user(&self, user: &UserIdentity) -> StoreResult<()> {
        let raw = serde_json::to_string(user)?;
        self.inner.set(keys::USER, &raw)
    }

    pub fn token(&self) -> Option<String> {
        self.inner.get(keys::TOKEN).filter(|token| !token.is_empty())
    }

    pub fn set_token(&self, token: &str) -> StoreResult<()> {
        self.inner.set(keys::TOKEN, token)
    }

    /// Drops identity and token; course, mode and goal survive a logout.
    pub fn clear_identity(&self) -> StoreResult<()> {
        self.inner.remove(keys::USER)?;
        self.inner.remove(keys::TOKEN)
    }

    pub fn course_id(&self) -> Option<CourseId> {
        self.inner
            .get(keys::COURSE_ID)
            .and_then(|raw| raw.trim().parse().ok())
    }

    pub fn set_course_id(&self, course_id: CourseId) -> StoreResult<()> {
        self.inner.set(keys::COURSE_ID, &course_id.to_string())
    }

    pub fn study_mode(&self) -> StudyMode {
        self.inner
            .get(keys::STUDY_MODE)
            .and_then(|raw| StudyMode::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set_study_mode(&self, mode: StudyMode) -> StoreResult<()> {
        self.inner.set(keys::STUDY_MODE, mode.as_str())
    }

    pub fn daily_goal(&self) -> u32 {
        self.inner
            .get(keys::DAILY_GOAL)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(keys::DEFAULT_DAILY_GOAL)
    }

    pub fn set_daily_goal(&self, goal: u32) -> StoreResult<()> {
        self.inner.set(keys::DAILY_GOAL, &goal.to_string())
    }

    /// Count celebrated on `today`. A mark left from an earlier day reads as 0
    /// because the backend's daily counter starts over.
    pub fn last_celebrated_count(&self, today: NaiveDate) -> u32 {
        self.inner
            .get(keys::LAST_CELEBRATED)
            .and_then(|raw| serde_json::from_str::<CelebrationMark>(&raw).ok())
            .filter(|mark| mark.date == today)
            .map(|mark| mark.count)
            .unwrap_or(0)
    }

    pub fn set_last_celebrated_count(&self, count: u32, today: NaiveDate) -> StoreResult<()> {
        let raw = serde_json::to_string(&CelebrationMark { date: today, count })?;
        self.inner.set(keys::LAST_CELEBRATED, &raw)
    }
}
