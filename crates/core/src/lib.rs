mod assets;
#[cfg(test)]
mod test_utils;

pub mod animator;
pub mod config;
pub mod dispatch;
pub mod message;
pub mod mode;
pub mod narrator;
pub mod session;

pub use crate::assets::get_data_dir;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
