use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::warn;

use super::engine::{FinalRatingResult, RatingEngine};
use super::error::RatingError;
use super::signals::{UserId, UserSignals};

/// Cooperative cancellation shared between a caller and a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Called on the worker thread after each user is rated.
pub type ResultObserver = Arc<dyn Fn(&FinalRatingResult) + Send + Sync>;

/// Runs the engine for every candidate on at most `concurrency` threads.
#[derive(Clone)]
pub struct BatchCalculator {
    concurrency: usize,
    cancellation: CancellationFlag,
    observer: Option<ResultObserver>,
}

impl fmt::Debug for BatchCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchCalculator")
            .field("concurrency", &self.concurrency)
            .field("cancellation", &self.cancellation)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl BatchCalculator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancellation: CancellationFlag::default(),
            observer: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_observer(mut self, observer: ResultObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Users missing from `signals` are rated on empty records. Results are
    /// sorted by `final_percentage` descending, then `user_id` ascending.
    pub fn run(
        &self,
        engine: &RatingEngine,
        users: &[UserId],
        signals: &BTreeMap<UserId, UserSignals>,
    ) -> Result<Vec<FinalRatingResult>, RatingError> {
        let empty = UserSignals::default();
        let next = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let workers = self.concurrency.min(users.len()).max(1);

        let mut results: Vec<FinalRatingResult> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut local = Vec::new();
                        loop {
                            // checkpoint between users
                            if self.cancellation.is_cancelled() {
                                break;
                            }
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(user_id) = users.get(index) else {
                                break;
                            };
                            let user_signals = signals.get(user_id).unwrap_or(&empty);
                            let result = engine.rate(*user_id, user_signals);
                            completed.fetch_add(1, Ordering::Relaxed);
                            if let Some(observer) = &self.observer {
                                observer(&result);
                            }
                            local.push(result);
                        }
                        local
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(local) => local,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let completed = completed.into_inner();
        if completed < users.len() {
            warn!(completed, total = users.len(), "rating batch cancelled");
            return Err(RatingError::Cancelled {
                completed,
                total: users.len(),
            });
        }

        sort_results(&mut results);
        Ok(results)
    }
}

pub fn sort_results(results: &mut [FinalRatingResult]) {
    results.sort_by(|a, b| {
        b.final_percentage
            .total_cmp(&a.final_percentage)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}
