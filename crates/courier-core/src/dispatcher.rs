use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;

use crate::telemetry;

type BoxedJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct Job {
    name: &'static str,
    work: BoxedJob,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub job_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 1024,
            job_timeout: Duration::from_secs(5),
        }
    }
}

/// Bounded pool for best-effort background work
///
/// `submit` never waits: when the queue is full the job is dropped and
/// counted. Every job runs under the configured timeout. Jobs belong to the
/// pool, so dropping the submitting future does not cancel them.
pub struct Dispatcher {
    sender: mpsc::Sender<Job>,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
    closed: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Releases a job's `in_flight` slot however the job ends
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl Dispatcher {
    /// Start the worker tasks; must be called inside a Tokio runtime
    pub fn new(config: DispatcherConfig) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let idle = Arc::new(Notify::new());

        let workers = (0..config.workers.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let in_flight = Arc::clone(&in_flight);
                let idle = Arc::clone(&idle);
                let timeout = config.job_timeout;

                tokio::spawn(async move {
                    loop {
                        let next = { receiver.lock().await.recv().await };
                        let Some(job) = next else { break };

                        let _slot = InFlightGuard {
                            in_flight: Arc::clone(&in_flight),
                            idle: Arc::clone(&idle),
                        };
                        let name = job.name;

                        // A panicking job only takes down its own task
                        match tokio::spawn(tokio::time::timeout(timeout, job.work)).await {
                            Ok(Ok(())) => {}
                            Ok(Err(_)) => {
                                tracing::warn!(job = name, worker_id, ?timeout, "Background job timed out");
                                metrics::counter!(telemetry::DISPATCH_TIMEOUT_TOTAL, "job" => name)
                                    .increment(1);
                            }
                            Err(e) if e.is_panic() => {
                                tracing::error!(job = name, worker_id, "Background job panicked");
                                metrics::counter!(telemetry::DISPATCH_PANICKED_TOTAL, "job" => name)
                                    .increment(1);
                            }
                            Err(_) => {
                                tracing::debug!(job = name, worker_id, "Background job cancelled");
                            }
                        }
                    }
                })
            })
            .collect();

        Self {
            sender,
            in_flight,
            idle,
            closed: AtomicBool::new(false),
            workers: Mutex::new(workers),
        }
    }

    /// Queue a job without waiting; returns false when it was dropped
    pub fn submit<F>(&self, name: &'static str, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!(job = name, "Dispatcher is shut down, dropping job");
            metrics::counter!(telemetry::DISPATCH_DROPPED_TOTAL, "job" => name).increment(1);
            return false;
        }

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let job = Job {
            name,
            work: Box::pin(work),
        };

        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
                    self.idle.notify_waiters();
                }
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "queue closed",
                };
                tracing::warn!(job = name, reason, "Dropping background job");
                metrics::counter!(telemetry::DISPATCH_DROPPED_TOTAL, "job" => name).increment(1);
                false
            }
        }
    }

    /// Jobs queued or running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Resolve once nothing is queued or running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting jobs, drain the queue, then stop the workers
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.wait_idle().await;

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            handle.abort();
        }
        tracing::info!("Dispatcher stopped");
    }
}
