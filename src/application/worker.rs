//! One task per symbol. The task owns the symbol's [`SymbolBook`], so no
//! state is shared or locked between symbols.
//!
//! Scoring runs in a spawned task. While a label is outstanding the worker
//! keeps draining its queue but parks every command, then replays them in
//! arrival order once the label is in. A slow scorer therefore delays its
//! own symbol only, and never blocks the producer.

use crate::application::book::{SymbolBook, WindowClose};
use crate::application::dispatch::{DispatchHandle, Effect};
use crate::application::events::EngineEvent;
use crate::application::ledger::LedgerChange;
use crate::application::messages;
use crate::application::stats::EngineStats;
use crate::config::EngineConfig;
use crate::domain::entities::bar::{Bar, CompositeBar};
use crate::domain::entities::signal::{Signal, SignalCandidate, Transition};
use crate::domain::ports::scorer::{BarFeatures, Scorer};
use crate::domain::ports::signal_repository::SignalUpdate;
use crate::domain::values::confidence::{Confidence, ConfidencePolicy};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub enum SymbolCommand {
    Bar(Bar),
    Restore(Signal),
    /// Publish unrealised P/L for every open signal at the last bar's close.
    Broadcast,
    Snapshot(oneshot::Sender<Vec<Signal>>),
}

/// A bar part-way through processing: the window closes not yet handled,
/// and the base window's close if one completed on this bar.
struct BarWork {
    bar: Bar,
    closes: VecDeque<WindowClose>,
    base_close: Option<(f64, i64)>,
}

/// A bar suspended on the scorer.
struct Scoring {
    work: BarWork,
    close: WindowClose,
    candidate: SignalCandidate,
}

pub struct SymbolWorker {
    book: SymbolBook,
    scorer: Arc<dyn Scorer>,
    policy: ConfidencePolicy,
    score_timeout: Duration,
    trade_updates: bool,
    dispatch: DispatchHandle,
    events: broadcast::Sender<EngineEvent>,
    stats: Arc<EngineStats>,
    scoring: Option<Scoring>,
    parked: VecDeque<SymbolCommand>,
    scored_tx: mpsc::Sender<Option<Confidence>>,
}

impl SymbolWorker {
    pub fn spawn(
        book: SymbolBook,
        scorer: Arc<dyn Scorer>,
        config: &EngineConfig,
        dispatch: DispatchHandle,
        events: broadcast::Sender<EngineEvent>,
        stats: Arc<EngineStats>,
    ) -> (mpsc::Sender<SymbolCommand>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.symbol_queue_capacity);
        let (scored_tx, scored_rx) = mpsc::channel(1);
        let worker = Self {
            book,
            scorer,
            policy: config.confidence_policy,
            score_timeout: config.score_timeout(),
            trade_updates: config.trade_updates,
            dispatch,
            events,
            stats,
            scoring: None,
            parked: VecDeque::new(),
            scored_tx,
        };
        let join = tokio::spawn(worker.run(rx, scored_rx));
        (tx, join)
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<SymbolCommand>,
        mut scored_rx: mpsc::Receiver<Option<Confidence>>,
    ) {
        let mut open = true;
        while open || self.scoring.is_some() {
            tokio::select! {
                Some(confidence) = scored_rx.recv(), if self.scoring.is_some() => {
                    self.on_scored(confidence);
                    self.replay_parked();
                }
                command = rx.recv(), if open => match command {
                    Some(command) if self.scoring.is_some() => self.parked.push_back(command),
                    Some(command) => self.handle(command),
                    None => open = false,
                },
                else => break,
            }
        }
        debug!(symbol = self.book.symbol(), "symbol worker stopped");
    }

    fn handle(&mut self, command: SymbolCommand) {
        match command {
            SymbolCommand::Bar(bar) => self.on_bar(bar),
            SymbolCommand::Restore(signal) => {
                let id = signal.id.clone();
                if self.book.restore(signal) {
                    debug!(symbol = self.book.symbol(), %id, "signal restored");
                }
            }
            SymbolCommand::Broadcast => {
                if let Some((price, at)) = self.book.latest_mark() {
                    self.send_trade_updates(price, at);
                }
            }
            SymbolCommand::Snapshot(reply) => {
                let _ = reply.send(self.book.signals().to_vec());
            }
        }
    }

    /// Parked commands run until one of them suspends on the scorer again.
    fn replay_parked(&mut self) {
        while self.scoring.is_none() {
            let Some(command) = self.parked.pop_front() else {
                break;
            };
            self.handle(command);
        }
    }

    fn on_bar(&mut self, bar: Bar) {
        if let Err(e) = self.book.accept(&bar) {
            self.stats.bar_rejected();
            warn!(symbol = %bar.symbol, end_timestamp = bar.end_timestamp, error = %e, "bar rejected");
            self.publish(EngineEvent::BarRejected {
                symbol: bar.symbol,
                end_timestamp: bar.end_timestamp,
                reason: e.to_string(),
            });
            return;
        }
        self.stats.bar_processed();

        let closes = self.book.aggregate(&bar);
        let base = self.book.base_window();
        let base_close = closes
            .iter()
            .find(|c| Some(c.window) == base)
            .map(|c| (c.current.close, c.current.end_timestamp));
        self.resume(BarWork {
            bar,
            closes: closes.into(),
            base_close,
        });
    }

    /// Aggregation and detection first, so a signal born on this bar is
    /// also evaluated against it; then the lifecycle step on the raw bar.
    fn resume(&mut self, mut work: BarWork) {
        while let Some(close) = work.closes.pop_front() {
            self.on_window_close(&close);
            if let Some(candidate) = close.candidate() {
                self.request_score(&close.current);
                self.scoring = Some(Scoring {
                    work,
                    close,
                    candidate,
                });
                return;
            }
        }

        for change in self.book.evaluate(&work.bar) {
            self.on_change(change);
        }
        if self.trade_updates {
            if let Some((price, at)) = work.base_close {
                self.send_trade_updates(price, at);
            }
        }
    }

    fn on_window_close(&self, close: &WindowClose) {
        self.stats.window_closed();
        debug!(
            symbol = %close.current.symbol,
            window = close.window,
            open = close.current.open,
            high = close.current.high,
            low = close.current.low,
            close = close.current.close,
            volume = close.current.volume,
            "composite bar closed"
        );
        self.publish(EngineEvent::WindowClosed {
            symbol: close.current.symbol.clone(),
            window: close.window,
            bar: close.current.clone(),
        });
    }

    fn request_score(&self, bar: &CompositeBar) {
        let scorer = Arc::clone(&self.scorer);
        let features = BarFeatures::from(bar);
        let reply = self.scored_tx.clone();
        let timeout = self.score_timeout;
        let symbol = bar.symbol.clone();
        tokio::spawn(async move {
            let confidence = match tokio::time::timeout(timeout, scorer.score(&features)).await {
                Ok(Ok(label)) => label,
                Ok(Err(e)) => {
                    warn!(%symbol, error = %e, "scorer failed");
                    None
                }
                Err(_) => {
                    warn!(%symbol, ?timeout, "scorer timed out");
                    None
                }
            };
            let _ = reply.send(confidence).await;
        });
    }

    fn on_scored(&mut self, confidence: Option<Confidence>) {
        let Some(Scoring {
            work,
            close,
            candidate,
        }) = self.scoring.take()
        else {
            return;
        };

        match self.book.admit(&close, candidate, confidence, &self.policy) {
            Some(signal) => {
                self.stats.signal_created();
                info!(
                    symbol = %signal.symbol,
                    direction = %signal.direction,
                    entry = signal.entry_point,
                    stop = signal.stop_loss,
                    target = signal.take_profit,
                    "signal created"
                );
                self.dispatch.submit(Effect::CreateSignal(signal.clone()));
                self.dispatch.submit(Effect::Notify(messages::signal_alert(&signal)));
                self.publish(EngineEvent::SignalCreated { signal });
            }
            None => {
                self.stats.candidate_rejected();
                debug!(symbol = %close.current.symbol, ?confidence, policy = %self.policy, "candidate rejected");
            }
        }
        self.resume(work);
    }

    fn on_change(&self, change: LedgerChange) {
        let LedgerChange { signal, transition } = change;
        self.stats.transition(&transition);
        info!(symbol = %signal.symbol, id = %signal.id, ?transition, "signal transition");

        let effect = match transition {
            Transition::Filled { .. } => Effect::UpdateSignal(SignalUpdate::from_signal(&signal, true)),
            Transition::Closed { .. } => Effect::UpdateSignal(SignalUpdate::from_signal(&signal, false)),
            Transition::Breakeven { stop_loss } => Effect::UpdateStopLoss {
                id: signal.id.clone(),
                stop_loss,
                timestamp: signal.updated_at,
            },
        };
        self.dispatch.submit(effect);
        if let Some(text) = messages::transition_message(&signal, &transition, signal.updated_at) {
            self.dispatch.submit(Effect::Notify(text));
        }
        self.publish(EngineEvent::Transition { signal, transition });
    }

    fn send_trade_updates(&self, price: f64, at: i64) {
        for update in self.book.position_updates(price, at) {
            let text = messages::trade_update(&update.signal, update.profit_loss, update.at);
            self.dispatch.submit(Effect::Notify(text));
        }
    }

    fn publish(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
