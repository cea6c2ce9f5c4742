//! Debouncing of rapidly-changing input, such as a search box.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Delays a callback until its input has stopped changing for `delay`.
///
/// Every [`Debouncer::call`] cancels the run scheduled by the previous call and schedules a new one
/// from zero, so at most one run is ever pending and only the value passed last within a window
/// reaches the callback. Dropping the `Debouncer` cancels the pending run.
///
/// Runs are scheduled on the current tokio runtime. A zero delay still goes through the scheduler:
/// the callback runs on the next tick, and a call made before that tick replaces it.
pub struct Debouncer<T> {
    delay: Duration,
    callback: Callback<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            callback: Arc::new(callback),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `callback(value)` after the delay, replacing any run that is still pending.
    pub fn call(&mut self, value: T) {
        self.cancel();
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.pending = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    callback(value);
                }));
            }
            Err(_) => {
                warn!("No async runtime is available to debounce on, running the callback now");
                callback(value);
            }
        }
    }

    /// Cancels the pending run, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                trace!("Cancelling the pending debounced call");
            }
            handle.abort();
        }
    }

    /// Whether a run is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Debug for Debouncer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
