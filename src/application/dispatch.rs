//! Asynchronous boundary between the engine and its store/notifier.
//!
//! Symbol workers hand finished decisions to a [`DispatchHandle`], which
//! never waits: a full queue drops the effect with a warning. A single
//! dispatcher task applies effects in submission order, retrying failed
//! calls with exponential backoff.

use crate::application::stats::EngineStats;
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::signal_repository::{SignalRepository, SignalUpdate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum Effect {
    CreateSignal(Signal),
    UpdateSignal(SignalUpdate),
    UpdateStopLoss {
        id: String,
        stop_loss: f64,
        timestamp: i64,
    },
    /// Sent to the notifier, then appended to the store's message log.
    Notify(String),
}

impl Effect {
    fn label(&self) -> &'static str {
        match self {
            Effect::CreateSignal(_) => "create_signal",
            Effect::UpdateSignal(_) => "update_signal",
            Effect::UpdateStopLoss { .. } => "update_stop_loss",
            Effect::Notify(_) => "notify",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<Effect>,
    stats: Arc<EngineStats>,
}

impl DispatchHandle {
    pub fn submit(&self, effect: Effect) {
        match self.tx.try_send(effect) {
            Ok(()) => {}
            Err(TrySendError::Full(effect)) => {
                self.stats.effect_dropped();
                warn!(effect = effect.label(), "dispatch queue full, dropping effect");
            }
            Err(TrySendError::Closed(effect)) => {
                self.stats.effect_dropped();
                warn!(effect = effect.label(), "dispatcher stopped, dropping effect");
            }
        }
    }
}

pub struct Dispatcher {
    repo: Arc<dyn SignalRepository>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    stats: Arc<EngineStats>,
}

impl Dispatcher {
    pub fn new(
        repo: Arc<dyn SignalRepository>,
        notifier: Arc<dyn Notifier>,
        retry: RetryPolicy,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            repo,
            notifier,
            retry,
            stats,
        }
    }

    /// Starts the dispatcher task. It exits once every handle is dropped and
    /// the queue is drained.
    pub fn spawn(self, capacity: usize) -> (DispatchHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = DispatchHandle {
            tx,
            stats: Arc::clone(&self.stats),
        };
        let join = tokio::spawn(self.run(rx));
        (handle, join)
    }

    async fn run(self, mut rx: mpsc::Receiver<Effect>) {
        while let Some(effect) = rx.recv().await {
            let label = effect.label();
            match self.apply(effect).await {
                Ok(()) => self.stats.effect_applied(),
                Err(DomainError::Timestamp(ms)) => {
                    self.stats.write_skipped();
                    warn!(effect = label, timestamp = ms, "unconvertible timestamp, write skipped");
                }
                Err(e) => {
                    self.stats.effect_failed();
                    warn!(effect = label, error = %e, "effect failed");
                }
            }
        }
        debug!("dispatcher drained");
    }

    async fn apply(&self, effect: Effect) -> Result<(), DomainError> {
        match effect {
            Effect::CreateSignal(signal) => {
                let id = self.store(move |repo| repo.create_signal(&signal)).await?;
                debug!(%id, "signal stored");
                Ok(())
            }
            Effect::UpdateSignal(update) => self.store(move |repo| repo.update_signal(&update)).await,
            Effect::UpdateStopLoss {
                id,
                stop_loss,
                timestamp,
            } => {
                self.store(move |repo| repo.update_stop_loss(&id, stop_loss, timestamp))
                    .await
            }
            Effect::Notify(text) => {
                let sent = self.notify(&text).await;
                // The audit log keeps the message even when delivery failed.
                self.store(move |repo| repo.append_message(&text)).await?;
                sent
            }
        }
    }

    async fn notify(&self, text: &str) -> Result<(), DomainError> {
        self.with_retry("notify", || {
            let notifier = Arc::clone(&self.notifier);
            let text = text.to_string();
            async move { notifier.send(&text).await }
        })
        .await
    }

    /// Runs a blocking store call off the async runtime, with retries.
    async fn store<T, F>(&self, op: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: Fn(&dyn SignalRepository) -> Result<T, DomainError> + Clone + Send + Sync + 'static,
    {
        self.with_retry("store", || {
            let repo = Arc::clone(&self.repo);
            let op = op.clone();
            async move {
                tokio::task::spawn_blocking(move || op(repo.as_ref()))
                    .await
                    .map_err(|e| DomainError::Channel(format!("store task failed: {e}")))?
            }
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_permanent() || attempt >= self.retry.max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    debug!(what, attempt, ?delay, error = %e, "retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
