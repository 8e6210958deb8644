//! Background execution and typed result delivery.
//!
//! Each client owns one dedicated worker thread. Jobs are queued over an
//! `mpsc` channel, so exchanges for a single client run strictly one at a
//! time in submission order and the dispatching thread never blocks on
//! network I/O. Completions flow back to the consumer through a typed
//! `Delivery` channel carrying `Outcome` values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::error::Error;
use crate::executor::{HttpExecutor, PreparedRequest};
use crate::types::{Outcome, RawResponse};

pub(crate) type OutcomeSender = mpsc::Sender<Outcome>;

/// One queued exchange: the prepared request and the completion that
/// classifies, parses and delivers its result.
pub(crate) struct Job {
    pub request: PreparedRequest,
    pub complete: Box<dyn FnOnce(Result<RawResponse, String>) + Send>,
}

/// Consumer handle for one dispatched exchange.
///
/// The worker sends each delivered outcome into this channel and closes it
/// when the exchange finishes, so `wait` returns every outcome the exchange
/// produced: none under `UpdateCache`, one normally, two for a
/// `CacheThenNetwork` hit. Outcomes arrive in delivery order.
pub struct Delivery {
    rx: mpsc::Receiver<Outcome>,
}

impl Delivery {
    pub(crate) fn channel() -> (OutcomeSender, Delivery) {
        let (tx, rx) = mpsc::channel();
        (tx, Delivery { rx })
    }

    /// Block until the exchange completes and return its delivered outcomes.
    pub fn wait(self) -> Vec<Outcome> {
        self.rx.into_iter().collect()
    }
}

/// Single-worker dispatcher owned by one client instance.
///
/// Cancellation is cooperative: queued jobs are dropped and a job already
/// past its network call has its result discarded instead of delivered.
/// In-socket I/O itself is not interrupted.
pub(crate) struct Dispatcher {
    jobs: mpsc::Sender<Job>,
    cancelled: Arc<AtomicBool>,
}

impl Dispatcher {
    pub(crate) fn spawn(executor: Arc<dyn HttpExecutor>) -> Self {
        let (jobs, queue) = mpsc::channel::<Job>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        // The worker exits when the job sender is dropped. It is not joined:
        // an exchange blocked in socket I/O may outlive the client, and its
        // completion is discarded via the flag.
        thread::spawn(move || {
            for job in queue {
                if flag.load(Ordering::SeqCst) {
                    tracing::debug!(url = %job.request.url, "cancelled; dropping queued exchange");
                    continue;
                }
                let result = executor.execute(&job.request);
                if flag.load(Ordering::SeqCst) {
                    tracing::debug!(url = %job.request.url, "cancelled; discarding completed exchange");
                    continue;
                }
                (job.complete)(result);
            }
        });

        Self { jobs, cancelled }
    }

    pub(crate) fn submit(&self, job: Job) -> Result<(), Error> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Error::Misconfigured("dispatcher is cancelled".to_string()));
        }
        self.jobs
            .send(job)
            .map_err(|_| Error::Misconfigured("dispatcher worker is gone".to_string()))
    }

    /// Stop delivering completions. Queued exchanges are dropped; the
    /// in-flight one (if any) finishes its transport call but its result
    /// never reaches a callback.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
