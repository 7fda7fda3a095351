//! Rate limiting for warnings that can fire on every request.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct Window {
    opened: Instant,
    suppressed: u64,
}

impl Window {
    fn opened_at(now: Instant) -> Self {
        Window {
            opened: now,
            suppressed: 0,
        }
    }
}

/// Lets one event per key through each `interval` and counts the rest.
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<&'static str, Window>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// `Some(n)` when the caller should log, where `n` is how many events
    /// under `key` were dropped since the last one that got through.
    pub fn admit(&self, key: &'static str) -> Option<u64> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        match windows.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Window::opened_at(now));
                Some(0)
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                if now.duration_since(window.opened) < self.interval {
                    window.suppressed += 1;
                    None
                } else {
                    Some(std::mem::replace(window, Window::opened_at(now)).suppressed)
                }
            }
        }
    }
}
