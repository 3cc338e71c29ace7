// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer tracking for sandboxed code.
//!
//! Sandboxed modules get `setTimeout`/`setInterval` equivalents that
//! delegate to the real scheduler but record every handle here, so a whole
//! generation's timers can be torn down at once when it is discarded.

use std::cell::RefCell;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The timers and intervals registered by one runtime generation.
#[derive(Debug, Default)]
pub struct TimerSet {
    timeouts: RefCell<Vec<JoinHandle<()>>>,
    intervals: RefCell<Vec<JoinHandle<()>>>,
}

impl TimerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once after `delay`.
    ///
    /// Must be called from within a tokio `LocalSet` (callbacks are not
    /// required to be `Send`).
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) {
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        self.timeouts.borrow_mut().push(handle);
    }

    /// Run `callback` every `period`, first firing one period from now.
    ///
    /// Must be called from within a tokio `LocalSet`. `period` must be
    /// non-zero.
    pub fn set_interval(&self, period: Duration, mut callback: impl FnMut() + 'static) {
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                callback();
            }
        });
        self.intervals.borrow_mut().push(handle);
    }

    /// Cancel every tracked timer and interval.
    pub fn shutdown(&self) {
        for handle in self.timeouts.borrow_mut().drain(..) {
            handle.abort();
        }
        for handle in self.intervals.borrow_mut().drain(..) {
            handle.abort();
        }
    }

    /// Number of handles registered so far.
    pub fn len(&self) -> usize {
        self.timeouts.borrow().len() + self.intervals.borrow().len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test(flavor = "current_thread")]
    async fn timers_fire_and_shutdown_cancels() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let timers = TimerSet::new();
                let fired = Rc::new(Cell::new(0u32));

                let count = Rc::clone(&fired);
                timers.set_timeout(Duration::from_millis(10), move || {
                    count.set(count.get() + 1);
                });
                tokio::time::sleep(Duration::from_millis(60)).await;
                assert_eq!(fired.get(), 1);

                let count = Rc::clone(&fired);
                timers.set_timeout(Duration::from_millis(20), move || {
                    count.set(count.get() + 1);
                });
                let count = Rc::clone(&fired);
                timers.set_interval(Duration::from_millis(20), move || {
                    count.set(count.get() + 1);
                });
                assert_eq!(timers.len(), 3);

                timers.shutdown();
                tokio::time::sleep(Duration::from_millis(80)).await;
                assert_eq!(fired.get(), 1);
                assert!(timers.is_empty());
            })
            .await;
    }
}
