pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::book::SymbolBook;
use crate::application::dispatch::{DispatchHandle, Dispatcher, RetryPolicy};
use crate::application::events::EngineEvent;
use crate::application::stats::{EngineStats, EngineSummary};
use crate::application::worker::{SymbolCommand, SymbolWorker};
use crate::config::EngineConfig;
use crate::domain::entities::bar::Bar;
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::scorer::Scorer;
use crate::domain::ports::signal_repository::{SignalFilter, SignalRepository, StoredMessage};
use crate::infrastructure::feeds::{BarFeed, FeedError};
use crate::infrastructure::notifiers::log::LogNotifier;
use crate::infrastructure::notifiers::webhook::WebhookNotifier;
use crate::infrastructure::scorers::fixed::FixedScorer;
use crate::infrastructure::scorers::http::HttpScorer;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::signal_repo::SqliteSignalRepo;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct WorkerSlot {
    tx: mpsc::Sender<SymbolCommand>,
    join: JoinHandle<()>,
}

/// Streaming engine: one task per symbol feeding a single effect dispatcher.
pub struct SwingWatch {
    config: EngineConfig,
    repo: Arc<dyn SignalRepository>,
    scorer: Arc<dyn Scorer>,
    stats: Arc<EngineStats>,
    events: broadcast::Sender<EngineEvent>,
    workers: HashMap<String, WorkerSlot>,
    dispatch: Option<DispatchHandle>,
    dispatcher: Option<JoinHandle<()>>,
}

impl SwingWatch {
    pub fn new(db_path: &str, config: EngineConfig) -> Result<Self, DomainError> {
        let scorer: Arc<dyn Scorer> = match std::env::var("SWINGWATCH_SCORER_URL") {
            Ok(url) if !url.is_empty() => Arc::new(HttpScorer::new(url)),
            _ => Arc::new(FixedScorer::default()),
        };
        let notifier: Arc<dyn Notifier> = match std::env::var("SWINGWATCH_WEBHOOK_URL") {
            Ok(url) if !url.is_empty() => Arc::new(WebhookNotifier::new(url)),
            _ => Arc::new(LogNotifier),
        };

        Self::with_providers(db_path, config, scorer, notifier)
    }

    pub fn with_providers(
        db_path: &str,
        config: EngineConfig,
        scorer: Arc<dyn Scorer>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        if db_path != ":memory:" {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        }
        run_migrations(&conn)?;

        let repo: Arc<dyn SignalRepository> = Arc::new(SqliteSignalRepo::new(conn));
        Self::with_store(repo, config, scorer, notifier)
    }

    /// Must be called inside a tokio runtime; the dispatcher task starts here.
    pub fn with_store(
        repo: Arc<dyn SignalRepository>,
        config: EngineConfig,
        scorer: Arc<dyn Scorer>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let stats = Arc::new(EngineStats::default());
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
        };
        let (dispatch, dispatcher) =
            Dispatcher::new(repo.clone(), notifier, retry, stats.clone()).spawn(config.dispatch_capacity);
        let (events, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            config,
            repo,
            scorer,
            stats,
            events,
            workers: HashMap::new(),
            dispatch: Some(dispatch),
            dispatcher: Some(dispatcher),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads every pending or open signal from the store into its symbol's
    /// ledger. Call before the first bar so resumed signals see every bar.
    pub async fn restore(&mut self) -> Result<usize, DomainError> {
        let signals = self.repo.fetch_non_terminal_signals()?;
        let count = signals.len();
        for signal in signals {
            let symbol = signal.symbol.clone();
            self.send(&symbol, SymbolCommand::Restore(signal)).await?;
        }
        info!(count, "restored non-terminal signals");
        Ok(count)
    }

    /// Waits only when the symbol's own queue is full. Symbol tasks keep
    /// draining their queues while a scorer call is outstanding.
    pub async fn ingest(&mut self, bar: Bar) -> Result<(), DomainError> {
        let symbol = bar.symbol.clone();
        self.send(&symbol, SymbolCommand::Bar(bar)).await
    }

    /// Feeds every bar of `feed` through [`ingest`](Self::ingest).
    /// Malformed records are counted and skipped; a read failure ends the
    /// stream with an error.
    pub async fn consume(&mut self, feed: &mut dyn BarFeed) -> Result<(), DomainError> {
        loop {
            match feed.next_bar().await {
                Ok(Some(bar)) => self.ingest(bar).await?,
                Ok(None) => return Ok(()),
                Err(FeedError::Parse { line, message }) => {
                    self.stats.bar_malformed();
                    warn!(feed = feed.name(), line, %message, "skipping malformed bar");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Queues a trade update for each open signal of `symbol`, priced at the
    /// last bar that symbol has processed.
    pub async fn broadcast_update(&self, symbol: &str) -> Result<(), DomainError> {
        match self.workers.get(symbol) {
            Some(slot) => slot
                .tx
                .send(SymbolCommand::Broadcast)
                .await
                .map_err(|_| DomainError::Channel(format!("worker for {symbol} stopped"))),
            None => Ok(()),
        }
    }

    /// Live ledger of `symbol`, after every bar ingested so far.
    pub async fn snapshot(&self, symbol: &str) -> Result<Vec<Signal>, DomainError> {
        let Some(slot) = self.workers.get(symbol) else {
            return Ok(Vec::new());
        };
        let (reply, rx) = oneshot::channel();
        slot.tx
            .send(SymbolCommand::Snapshot(reply))
            .await
            .map_err(|_| DomainError::Channel(format!("worker for {symbol} stopped")))?;
        rx.await
            .map_err(|_| DomainError::Channel(format!("worker for {symbol} dropped snapshot")))
    }

    pub fn signals(&self, filter: &SignalFilter) -> Result<Vec<Signal>, DomainError> {
        self.repo.list_signals(filter)
    }

    pub fn get_signal(&self, id: &str) -> Result<Signal, DomainError> {
        self.repo
            .get_signal(id)?
            .ok_or_else(|| DomainError::NotFound(format!("signal {id}")))
    }

    pub fn messages(&self, limit: usize) -> Result<Vec<StoredMessage>, DomainError> {
        self.repo.list_messages(limit)
    }

    /// Symbols seen so far, in no particular order.
    pub fn symbols(&self) -> Vec<String> {
        self.workers.keys().cloned().collect()
    }

    pub fn stats(&self) -> EngineSummary {
        self.stats.summary()
    }

    /// Drains every symbol task, then the dispatcher, so all queued store
    /// writes and notifications are applied. Store reads keep working
    /// afterwards; further ingestion fails.
    pub async fn shutdown(&mut self) -> Result<EngineSummary, DomainError> {
        for (symbol, slot) in self.workers.drain() {
            drop(slot.tx);
            if let Err(e) = slot.join.await {
                warn!(%symbol, error = %e, "symbol worker panicked");
            }
        }

        self.dispatch.take();
        if let Some(join) = self.dispatcher.take() {
            join.await
                .map_err(|e| DomainError::Channel(format!("dispatcher failed: {e}")))?;
        }

        let summary = self.stats.summary();
        info!(
            bars = summary.bars_processed,
            signals = summary.signals_created,
            dropped = summary.effects_dropped,
            "engine stopped"
        );
        Ok(summary)
    }

    async fn send(&mut self, symbol: &str, command: SymbolCommand) -> Result<(), DomainError> {
        let tx = self.worker(symbol)?;
        tx.send(command)
            .await
            .map_err(|_| DomainError::Channel(format!("worker for {symbol} stopped")))
    }

    fn worker(&mut self, symbol: &str) -> Result<mpsc::Sender<SymbolCommand>, DomainError> {
        if let Some(slot) = self.workers.get(symbol) {
            return Ok(slot.tx.clone());
        }
        let dispatch = self
            .dispatch
            .clone()
            .ok_or_else(|| DomainError::Channel("engine is shut down".into()))?;
        let book = SymbolBook::new(symbol, &self.config.windows)?;
        let (tx, join) = SymbolWorker::spawn(
            book,
            self.scorer.clone(),
            &self.config,
            dispatch,
            self.events.clone(),
            self.stats.clone(),
        );
        self.workers.insert(symbol.to_string(), WorkerSlot { tx: tx.clone(), join });
        Ok(tx)
    }
}
