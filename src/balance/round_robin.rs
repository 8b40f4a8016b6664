//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::balance::{Backend, Strategy};

/// Rotating selector over the shared pool cursor.
///
/// Each call advances the cursor by one and scans forward (wrapping) for
/// the first alive backend. When the scan had to skip dead backends, the
/// cursor is re-persisted at the winning index so the next call resumes
/// just past a known-good backend instead of re-walking the dead ones.
/// On the all-alive path the cursor is deliberately NOT stored at the
/// winner; the initial increment alone drives the rotation.
#[derive(Debug, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobin {
    fn select(&self, backends: &[Arc<Backend>], cursor: &AtomicUsize) -> Option<usize> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len();
        let candidate = cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % len;

        for offset in 0..len {
            let idx = (candidate + offset) % len;
            if backends[idx].is_alive() {
                if offset != 0 {
                    cursor.store(idx, Ordering::Relaxed);
                }
                return Some(idx);
            }
        }
        None
    }
}
