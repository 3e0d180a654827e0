//! The actions a user can take from the screens.

pub mod auth;
pub mod tasks;

pub use auth::AuthService;
pub use tasks::TaskService;

use crate::error::AppError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};

/// Refuses a second submission while the first is still waiting on the backend.
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

impl InFlight {
    pub(crate) fn begin(&self) -> Result<InFlightGuard<'_>, AppError> {
        if self.0.swap(true, Ordering::AcqRel) {
            return Err(AppError::Busy);
        }
        Ok(InFlightGuard(&self.0))
    }
}

pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// [`InFlight`] per key, so edits to different items do not block each other.
#[derive(Debug)]
pub(crate) struct InFlightKeys<K> {
    keys: Mutex<HashSet<K>>,
}

impl<K> Default for InFlightKeys<K> {
    fn default() -> Self {
        Self {
            keys: Mutex::new(HashSet::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlightKeys<K> {
    pub(crate) fn begin(&self, key: &K) -> Result<InFlightKeyGuard<'_, K>, AppError> {
        if !self.keys.lock().insert(key.clone()) {
            return Err(AppError::Busy);
        }
        Ok(InFlightKeyGuard {
            keys: &self.keys,
            key: key.clone(),
        })
    }
}

pub(crate) struct InFlightKeyGuard<'a, K: Eq + Hash> {
    keys: &'a Mutex<HashSet<K>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightKeyGuard<'_, K> {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_busy_until_guard_drops() {
        let in_flight = InFlight::default();

        let guard = in_flight.begin().unwrap();
        assert_eq!(in_flight.begin().err(), Some(AppError::Busy));

        drop(guard);
        assert!(in_flight.begin().is_ok());
    }

    #[test]
    fn keys_are_guarded_independently() {
        let in_flight = InFlightKeys::default();

        let first = in_flight.begin(&"a").unwrap();
        assert!(in_flight.begin(&"b").is_ok());
        assert_eq!(in_flight.begin(&"a").err(), Some(AppError::Busy));

        drop(first);
        assert!(in_flight.begin(&"a").is_ok());
    }
}
