use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::SharedState;

const INTERVAL: Duration = Duration::from_secs(60);

/// Periodically unmount idle browser views and drop expired login windows.
pub fn spawn(state: SharedState, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run(state, shutdown, INTERVAL))
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>, interval: Duration) {
    tracing::debug!("View sweeper started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if *shutdown.borrow() {
            break;
        }

        sweep(&state);
    }

    tracing::debug!("View sweeper stopped");
}

/// One sweep pass. Returns the number of views dropped.
pub fn sweep(state: &SharedState) -> usize {
    let evicted = state.views.evict_idle();
    if evicted > 0 {
        tracing::debug!("Unmounted {evicted} idle views ({} live)", state.views.len());
    }
    let expired = state.login_limiter.cleanup();
    if expired > 0 {
        tracing::debug!("Dropped {expired} expired login windows");
    }
    evicted
}
