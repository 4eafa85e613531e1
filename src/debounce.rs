use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet period used for editor updates.
pub const EDITOR_QUIET_PERIOD: Duration = Duration::from_millis(500);

type Commit<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Pending<T> {
    value: Arc<Mutex<Option<T>>>,
    timer: JoinHandle<()>,
}

/// Delays a commit until no new value has arrived for the quiet period.
///
/// Every `push` cancels the armed commit and re-arms it with the latest
/// value. A value is committed at most once.
pub struct Debouncer<T> {
    quiet: Duration,
    commit: Commit<T>,
    pending: Option<Pending<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(quiet: Duration, commit: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            quiet,
            commit: Arc::new(commit),
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.cancel();

        let slot = Arc::new(Mutex::new(Some(value)));
        let timer_slot = Arc::clone(&slot);
        let commit = Arc::clone(&self.commit);
        let quiet = self.quiet;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if let Some(value) = take(&timer_slot) {
                commit(value);
            }
        });

        self.pending = Some(Pending { value: slot, timer });
    }

    /// Commit the pending value now, if there is one.
    pub fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
            if let Some(value) = take(&pending.value) {
                (self.commit)(value);
            }
        }
    }

    /// Drop the pending value without committing it.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
            take(&pending.value);
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
        }
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}
