use std::sync::Arc;
use std::time::Duration;

use models::FormProgress;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::progress_store::ProgressStore;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Debounced writer into the progress store.
///
/// Each `schedule` cancels the pending write and starts a new timer. The write
/// itself runs on the blocking pool, since storage backends may do file I/O;
/// once started it is no longer cancellable. Outside a tokio runtime the write
/// happens immediately. A pending write is not flushed on drop.
pub struct Autosave {
    store: Arc<ProgressStore>,
    delay: Duration,
    pending: Option<JoinHandle<bool>>,
}

impl Autosave {
    pub fn new(store: Arc<ProgressStore>, delay: Duration) -> Self {
        Self { store, delay, pending: None }
    }

    pub fn schedule(&mut self, snapshot: FormProgress) {
        self.cancel();
        match Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let delay = self.delay;
                self.pending = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    let step = snapshot.step;
                    let saved = tokio::task::spawn_blocking(move || store.save_progress(&snapshot))
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "autosave task failed");
                            false
                        });
                    debug!(saved, %step, "autosave");
                    saved
                }));
            }
            Err(_) => {
                self.store.save_progress(&snapshot);
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// A save is scheduled and has not completed yet.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}
