use crate::application::aggregate::BarAccumulator;
use crate::application::detect::detect_any;
use crate::application::ledger::{LedgerChange, SignalLedger};
use crate::domain::entities::bar::{Bar, CompositeBar};
use crate::domain::entities::signal::{Signal, SignalCandidate};
use crate::domain::error::DomainError;
use crate::domain::values::confidence::{Confidence, ConfidencePolicy};
use std::collections::HashMap;

/// A composite that just completed, with the one before it at the same size.
#[derive(Debug, Clone)]
pub struct WindowClose {
    pub window: usize,
    pub previous: Option<CompositeBar>,
    pub current: CompositeBar,
}

impl WindowClose {
    /// The first composite of a window has nothing to compare against.
    pub fn candidate(&self) -> Option<SignalCandidate> {
        detect_any(self.previous.as_ref()?, &self.current)
    }

    pub fn volume_confirmed(&self) -> bool {
        self.previous
            .as_ref()
            .is_some_and(|p| self.current.volume > p.volume)
    }
}

/// Unrealised P/L of one open signal at the last seen price.
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub signal: Signal,
    pub profit_loss: f64,
    pub at: i64,
}

/// Everything the engine knows about a single symbol: its aggregation
/// buffers, the last composite per window and its live signals.
pub struct SymbolBook {
    symbol: String,
    accumulators: Vec<BarAccumulator>,
    previous: HashMap<usize, CompositeBar>,
    ledger: SignalLedger,
    last_bar: Option<Bar>,
}

impl SymbolBook {
    pub fn new(symbol: impl Into<String>, windows: &[usize]) -> Result<Self, DomainError> {
        let accumulators = windows
            .iter()
            .map(|&w| BarAccumulator::new(w))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            symbol: symbol.into(),
            accumulators,
            previous: HashMap::new(),
            ledger: SignalLedger::new(),
            last_bar: None,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Admits a bar only if it belongs to this symbol and is strictly newer
    /// than the last one. Rejected bars leave the book untouched.
    pub fn accept(&mut self, bar: &Bar) -> Result<(), DomainError> {
        if bar.symbol != self.symbol {
            return Err(DomainError::InvalidInput(format!(
                "bar for {} routed to {}",
                bar.symbol, self.symbol
            )));
        }
        if let Some(last) = &self.last_bar {
            if bar.end_timestamp <= last.end_timestamp {
                return Err(DomainError::InvalidInput(format!(
                    "out-of-order bar for {}: {} <= {}",
                    self.symbol, bar.end_timestamp, last.end_timestamp
                )));
            }
        }
        self.last_bar = Some(bar.clone());
        Ok(())
    }

    pub fn aggregate(&mut self, bar: &Bar) -> Vec<WindowClose> {
        let mut closes = Vec::new();
        for acc in &mut self.accumulators {
            if let Some(current) = acc.ingest(bar) {
                let previous = self.previous.insert(acc.window(), current.clone());
                closes.push(WindowClose {
                    window: acc.window(),
                    previous,
                    current,
                });
            }
        }
        closes
    }

    /// Turns a candidate into a tracked signal if the policy accepts its label.
    pub fn admit(
        &mut self,
        close: &WindowClose,
        candidate: SignalCandidate,
        confidence: Option<Confidence>,
        policy: &ConfidencePolicy,
    ) -> Option<Signal> {
        if !policy.accepts(confidence) {
            return None;
        }
        let signal = Signal::new(candidate, close.window, close.volume_confirmed(), confidence?);
        self.ledger.insert(signal.clone());
        Some(signal)
    }

    pub fn evaluate(&mut self, bar: &Bar) -> Vec<LedgerChange> {
        self.ledger.evaluate(bar)
    }

    /// Re-tracks a signal loaded from the store.
    pub fn restore(&mut self, signal: Signal) -> bool {
        signal.symbol == self.symbol && self.ledger.insert(signal)
    }

    /// Unrealised P/L of every open signal priced at `price`.
    pub fn position_updates(&self, price: f64, at: i64) -> Vec<PositionUpdate> {
        self.ledger
            .open_positions()
            .map(|s| PositionUpdate {
                signal: s.clone(),
                profit_loss: s.unrealized(price),
                at,
            })
            .collect()
    }

    /// Close and timestamp of the last accepted bar.
    pub fn latest_mark(&self) -> Option<(f64, i64)> {
        self.last_bar.as_ref().map(|b| (b.close, b.end_timestamp))
    }

    /// Smallest window this book aggregates.
    pub fn base_window(&self) -> Option<usize> {
        self.accumulators.iter().map(BarAccumulator::window).min()
    }

    pub fn signals(&self) -> &[Signal] {
        self.ledger.signals()
    }
}
