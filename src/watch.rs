// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced filesystem change notifications.

use crate::error::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tracing::trace;

/// A stream of settled change paths.
///
/// Raw notifications from the backend are coalesced with a trailing-edge
/// debounce: a burst of events within the window collapses into a single
/// emission carrying the last path seen, sent only after the window
/// passes with no further activity. The watcher stops when the stream is
/// dropped.
pub struct ChangeStream {
    _watcher: RecommendedWatcher,
    rx: UnboundedReceiver<PathBuf>,
}

impl ChangeStream {
    /// Start watching `base` recursively with the given debounce window.
    ///
    /// Must be called from within a tokio runtime; the debounce task is
    /// spawned onto it.
    pub fn watch(base: impl AsRef<Path>, window: Duration) -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let Ok(event) = event else { return };
            if matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                for path in event.paths {
                    let _ = raw_tx.send(path);
                }
            }
        })?;
        watcher.watch(base.as_ref(), RecursiveMode::Recursive)?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(debounce(raw_rx, tx, window));
        Ok(Self { _watcher: watcher, rx })
    }

    /// The next settled change, or `None` once the watcher has stopped.
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}

async fn debounce(
    mut raw: UnboundedReceiver<PathBuf>,
    out: UnboundedSender<PathBuf>,
    window: Duration,
) {
    while let Some(first) = raw.recv().await {
        let mut last = first;
        loop {
            match timeout(window, raw.recv()).await {
                // still in the burst, keep the most recent path
                Ok(Some(path)) => {
                    trace!(path = %path.display(), "coalescing");
                    last = path;
                }
                Ok(None) => {
                    let _ = out.send(last);
                    return;
                }
                Err(_) => break,
            }
        }
        if out.send(last).is_err() {
            return;
        }
    }
}
