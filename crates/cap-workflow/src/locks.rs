//! Keyed async mutexes guarding check-then-act sequences.
//!
//! Every operation names the records it validates and writes as [`LockKey`]s.
//! Keys are acquired in their total order (groups, then students, then
//! teachers, each by id), so two operations can never wait on each other in a
//! cycle. An operation that learns more keys after its first acquisition may
//! acquire again, as long as the new keys all sort after the ones it holds.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;

use crate::WorkflowError;

/// Prune idle slots once the table grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Group(String),
    Student(String),
    Teacher(String),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "grp:{id}"),
            Self::Student(id) => write!(f, "stu:{id}"),
            Self::Teacher(id) => write!(f, "tch:{id}"),
        }
    }
}

/// Guards held for the duration of one operation. Released on drop.
#[derive(Debug)]
pub struct LockSet {
    keys: Vec<LockKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    #[must_use]
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

#[derive(Debug, Default)]
pub struct LockTable {
    slots: Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &LockKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() > PRUNE_THRESHOLD {
            slots.retain(|_, m| Arc::strong_count(m) > 1);
        }
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Acquire every key in `keys`, sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Busy` if the keys are not all held within
    /// `timeout`. Keys acquired so far are released.
    pub async fn acquire(
        &self,
        keys: impl IntoIterator<Item = LockKey>,
        timeout: Duration,
    ) -> Result<LockSet, WorkflowError> {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let acquire_all = async {
            let mut guards = Vec::with_capacity(keys.len());
            for key in &keys {
                guards.push(self.slot(key).lock_owned().await);
            }
            guards
        };

        let acquired = tokio::time::timeout(timeout, acquire_all).await;
        match acquired {
            Ok(guards) => {
                tracing::trace!(keys = ?keys, "locks acquired");
                Ok(LockSet {
                    keys,
                    _guards: guards,
                })
            }
            Err(_) => {
                let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
                Err(WorkflowError::Busy(format!(
                    "could not lock {} within {timeout:?}",
                    names.join(", ")
                )))
            }
        }
    }
}
