//! Repeating background task that purges expired in-memory state.
//!
//! The task owns only what its closure captures and stops on a single-fire
//! signal. `stop` may be called any number of times; only the first call sends.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::{sync::oneshot, time::MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct Sweeper {
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl Sweeper {
    /// Spawn `sweep` every `period` on the current tokio runtime.
    ///
    /// A second call while a task is running is a no-op.
    pub(crate) fn spawn<F>(&self, name: &'static str, period: Duration, sweep: F)
    where
        F: Fn() + Send + 'static,
    {
        let mut slot = self.stop_tx.lock();
        if slot.is_some() {
            return;
        }
        let (tx, mut rx) = oneshot::channel::<()>();
        *slot = Some(tx);
        drop(slot);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the first sweep
            // happens one full period after start.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = &mut rx => {
                        debug!(sweeper = name, "sweeper stopped");
                        break;
                    }
                    _ = interval.tick() => sweep(),
                }
            }
        });
    }

    /// Signal the task to stop. Idempotent.
    pub(crate) fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.stop_tx.lock().is_some()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::Sweeper;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_every_period_until_stopped() {
        let runs = Arc::new(AtomicUsize::new(0));
        let sweeper = Sweeper::default();
        let counter = runs.clone();
        sweeper.spawn("test", Duration::from_secs(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sweeper.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        sweeper.stop();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let sweeper = Sweeper::default();
        sweeper.stop();
        sweeper.spawn("test", Duration::from_secs(1), || {});
        sweeper.stop();
        sweeper.stop();
        assert!(!sweeper.is_running());
    }
}
