// src/ai/pool.rs
//! Ordered credential slots for the primary provider.
//!
//! The current-slot index is shared by every request using the pool and is
//! only moved on auth/quota failures. It advances cyclically and is never
//! reset, so a request may start on any slot and still reach all of them.
//! Concurrent rotations may race; the worst outcome is one redundant retry.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One API credential. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    slot: usize,
    key: String,
}

impl Credential {
    pub fn new(slot: usize, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("slot", &self.slot)
            .field("key_len", &self.key.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ProviderPool {
    credentials: Vec<Credential>,
    index: AtomicUsize,
}

impl ProviderPool {
    /// Blank keys are skipped; slot numbers follow the kept order.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = keys
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.trim().is_empty())
            .enumerate()
            .map(|(slot, key)| Credential::new(slot, key))
            .collect();
        Self {
            credentials,
            index: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn current_slot(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    pub fn current(&self) -> Option<&Credential> {
        if self.credentials.is_empty() {
            return None;
        }
        self.credentials.get(self.current_slot() % self.credentials.len())
    }

    /// Advance to the next slot, wrapping after the last one. `None` only for
    /// an empty pool.
    pub fn rotate(&self) -> Option<&Credential> {
        let len = self.credentials.len();
        if len == 0 {
            return None;
        }
        let prev = self
            .index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        self.credentials.get((prev + 1) % len)
    }
}
