//! Serialisation and spacing of external calls.
//!
//! Every call made through one [`Throttle`] holds its mutex for the duration
//! of the call, so calls never overlap, and starts no sooner than `interval`
//! after the previous call finished.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `call` once the gap since the previous call has elapsed.
    pub fn run<T>(&self, call: impl FnOnce() -> T) -> T {
        // A panicking call leaves nothing half-written behind the lock.
        let mut last = self
            .last_finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }

        let result = call();
        *last = Some(Instant::now());
        result
    }
}
