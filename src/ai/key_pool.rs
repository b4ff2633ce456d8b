//! Credential Pool
//!
//! Holds the ordered set of upstream API keys and hands them out round-robin.
//! The pool itself is immutable once built; the rotation cursor is the only
//! mutable cell and advances atomically, so concurrent requests each observe a
//! distinct rotation position. Rotation never removes a key: a key that failed
//! stays eligible on the next full cycle.

use std::sync::atomic::{AtomicUsize, Ordering};

use secrecy::SecretString;

use crate::types::{QuizError, Result};

/// One key handed out by the pool, tagged with its rotation position
///
/// The position is what appears in logs and errors; the key itself never does.
pub struct PoolKey<'a> {
    pub index: usize,
    pub secret: &'a SecretString,
}

/// Ordered pool of upstream API keys with an atomic round-robin cursor
pub struct KeyPool {
    keys: Vec<SecretString>,
    cursor: AtomicUsize,
}

impl std::fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPool")
            .field("keys", &format!("[{} redacted]", self.keys.len()))
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}

impl KeyPool {
    /// Build a pool from raw key strings, filtering empty entries
    ///
    /// Constructing with zero usable keys is a fatal configuration error.
    pub fn new(raw_keys: impl IntoIterator<Item = String>) -> Result<Self> {
        let keys: Vec<SecretString> = raw_keys
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
            .collect();

        if keys.is_empty() {
            return Err(QuizError::config("no usable API keys configured"));
        }

        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Hand out the next key, advancing the cursor by one (mod pool size)
    ///
    /// Never fails and wraps around indefinitely. Each call returns a distinct
    /// rotation position even under concurrent invocation.
    pub fn next(&self) -> PoolKey<'_> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        PoolKey {
            index,
            secret: &self.keys[index],
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
