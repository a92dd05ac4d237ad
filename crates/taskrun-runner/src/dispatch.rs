//! Fire-and-forget delivery of completion callbacks

use std::thread;

use tracing::warn;

use crate::types::Callback;

/// Where success and failure callbacks are executed.
///
/// The runner hands the callback over and returns immediately; it never waits
/// for it to finish or observes its outcome. Callers that need to synchronise
/// must do so inside the callback.
#[derive(Debug, Clone, Default)]
pub enum Dispatcher {
    /// Detached, named OS thread per callback.
    #[default]
    Thread,
    /// Blocking task on an existing Tokio runtime.
    Tokio(tokio::runtime::Handle),
}

impl Dispatcher {
    /// Dispatcher bound to the Tokio runtime the caller is running on.
    ///
    /// Falls back to [`Dispatcher::Thread`] outside a runtime.
    #[must_use]
    pub fn current() -> Self {
        tokio::runtime::Handle::try_current().map_or(Self::Thread, Self::Tokio)
    }

    /// Schedule `callback` and return without waiting for it.
    pub fn dispatch(&self, callback: &Callback, label: &'static str) {
        let callback = Callback::clone(callback);
        match self {
            Self::Thread => {
                let spawned = thread::Builder::new()
                    .name(format!("taskrun-{label}"))
                    .spawn({
                        let callback = Callback::clone(&callback);
                        move || callback()
                    });

                if let Err(e) = spawned {
                    // Still deliver exactly once, just not in parallel.
                    warn!(callback = label, error = %e, "Could not spawn callback thread, running inline");
                    callback();
                }
            }
            Self::Tokio(handle) => {
                // Dropping the JoinHandle detaches the task.
                drop(handle.spawn_blocking(move || callback()));
            }
        }
    }
}
