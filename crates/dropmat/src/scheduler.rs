//! Bounded, fail-fast execution of independent jobs.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Holds the first error reported by any worker; later ones are dropped.
#[derive(Debug)]
struct FirstError<E>(Mutex<Option<E>>);

impl<E> FirstError<E> {
    fn new() -> Self { Self(Mutex::new(None)) }

    /// Returns `true` if `err` was the first one recorded.
    fn record(&self, err: E) -> bool {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    fn take(&self) -> Option<E> { self.0.lock().unwrap_or_else(PoisonError::into_inner).take() }
}

/// Runs jobs with at most `concurrency` in flight.
///
/// The first job error cancels the shared token: no further job is started,
/// jobs already running see the token and wind down on their own, and that
/// first error becomes the result of [`Scheduler::run`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency: usize,
    cancel:      CancellationToken,
}

impl Scheduler {
    pub fn new(concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancel,
        }
    }

    pub fn concurrency(&self) -> usize { self.concurrency }

    pub async fn run<T, E, F, Fut>(&self, jobs: impl IntoIterator<Item = T>, work: F) -> Result<(), E>
    where
        T: Send + 'static,
        E: From<JoinError> + Send + 'static,
        F: Fn(T, CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let first_error = Arc::new(FirstError::new());
        let mut tasks = JoinSet::new();
        let mut started = 0usize;

        for job in jobs {
            self.reap(&mut tasks, &first_error);
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            // A freed permit may come from a panicked job.
            self.reap(&mut tasks, &first_error);
            if self.cancel.is_cancelled() {
                break;
            }

            let job = work(job, self.cancel.clone());
            let cancel = self.cancel.clone();
            let first_error = Arc::clone(&first_error);
            tasks.spawn(async move {
                if let Err(err) = job.await
                    && first_error.record(err)
                {
                    cancel.cancel();
                }
                drop(permit);
            });
            started += 1;
        }

        debug!(started, cancelled = self.cancel.is_cancelled(), "all jobs dispatched, draining");

        while let Some(joined) = tasks.join_next().await {
            self.settle(joined, &first_error);
        }

        match first_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Collect jobs that already finished so the set stays bounded by
    /// `concurrency`.
    fn reap<E: From<JoinError>>(&self, tasks: &mut JoinSet<()>, first_error: &FirstError<E>) {
        while let Some(joined) = tasks.try_join_next() {
            self.settle(joined, first_error);
        }
    }

    fn settle<E: From<JoinError>>(&self, joined: Result<(), JoinError>, first_error: &FirstError<E>) {
        if let Err(join_error) = joined
            && first_error.record(E::from(join_error))
        {
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    enum JobError {
        Failed(usize),
        Panicked,
    }

    impl From<JoinError> for JobError {
        fn from(_: JoinError) -> Self { JobError::Panicked }
    }

    #[tokio::test]
    async fn runs_every_job() {
        let done = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(4, CancellationToken::new());

        let counter = Arc::clone(&done);
        let result: Result<(), JobError> = scheduler
            .run(0..20, move |_, _| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(done.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn never_exceeds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(3, CancellationToken::new());

        let (current, high) = (Arc::clone(&in_flight), Arc::clone(&peak));
        let result: Result<(), JobError> = scheduler
            .run(0..30, move |_, _| {
                let (current, high) = (Arc::clone(&current), Arc::clone(&high));
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    high.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn first_failure_stops_dispatch() {
        let started = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::new(1, cancel.clone());

        let counter = Arc::clone(&started);
        let result = scheduler
            .run(0..10, move |i, _| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if i == 2 { Err(JobError::Failed(i)) } else { Ok(()) }
                }
            })
            .await;

        assert_eq!(result, Err(JobError::Failed(2)));
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn in_flight_jobs_observe_cancellation() {
        let observed = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(8, CancellationToken::new());

        let seen = Arc::clone(&observed);
        let result = scheduler
            .run(0..8, move |i, cancel| {
                let seen = Arc::clone(&seen);
                async move {
                    if i == 0 {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        return Err(JobError::Failed(0));
                    }
                    cancel.cancelled().await;
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert_eq!(result, Err(JobError::Failed(0)));
        assert_eq!(observed.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn panicking_job_fails_the_run() {
        let scheduler = Scheduler::new(2, CancellationToken::new());

        let result = scheduler
            .run(0..2, |i, _| async move {
                if i == 1 {
                    panic!("worker bug");
                }
                Ok::<(), JobError>(())
            })
            .await;

        assert_eq!(result, Err(JobError::Panicked));
    }

    #[tokio::test]
    async fn panic_stops_dispatch_before_drain() {
        let started = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::new(1, cancel.clone());

        let counter = Arc::clone(&started);
        let result = scheduler
            .run(0..10, move |i, _| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if i == 0 {
                        panic!("worker bug");
                    }
                    Ok::<(), JobError>(())
                }
            })
            .await;

        assert_eq!(result, Err(JobError::Panicked));
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(cancel.is_cancelled());
    }
}
