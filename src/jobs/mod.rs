//! Background jobs run on a fixed interval until their handle goes away
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

mod refresh_bookings;

pub use refresh_bookings::RefreshBookings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Continue,
    /// The job has nothing left to do and should not be scheduled again
    Finished,
}

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn interval(&self) -> Duration;

    async fn run_job(&self) -> JobOutcome;
}

/// Owns a spawned job. Stopping or dropping it guarantees no further
/// run starts.
pub struct JobHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `job` every `job.interval()`, first run one interval from now.
pub fn spawn_periodic_job(job: impl PeriodicJob) -> JobHandle {
    let (shutdown, mut signal) = watch::channel(false);
    let period = job.interval();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = signal.changed() => {
                    if changed.is_err() || *signal.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {}
            }

            // Re-check right before running in case both fired together
            if *signal.borrow() {
                break;
            }
            if job.run_job().await == JobOutcome::Finished {
                tracing::debug!("Periodic job finished");
                break;
            }
        }
    });

    JobHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        runs: Arc<AtomicUsize>,
        limit: Option<usize>,
    }

    #[async_trait]
    impl PeriodicJob for Counter {
        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        async fn run_job(&self) -> JobOutcome {
            let runs = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            match self.limit {
                Some(limit) if runs >= limit => JobOutcome::Finished,
                _ => JobOutcome::Continue,
            }
        }
    }

    #[tokio::test]
    async fn it_stops_running_after_stop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_periodic_job(Counter {
            runs: Arc::clone(&runs),
            limit: None,
        });
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let seen = runs.load(Ordering::SeqCst);
        assert!(seen > 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn it_ends_when_the_job_finishes() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_periodic_job(Counter {
            runs: Arc::clone(&runs),
            limit: Some(2),
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn it_does_not_run_after_drop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_periodic_job(Counter {
            runs: Arc::clone(&runs),
            limit: None,
        });
        drop(handle);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
