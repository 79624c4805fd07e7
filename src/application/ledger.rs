use crate::domain::entities::bar::Bar;
use crate::domain::entities::signal::{Signal, Transition};
use crate::domain::values::signal_state::SignalState;

/// Live (non-terminal) signals of one symbol.
///
/// Signals are dropped from the ledger the moment they close; the closing
/// snapshot is handed back to the caller so it can be mirrored outward.
#[derive(Debug, Default)]
pub struct SignalLedger {
    signals: Vec<Signal>,
}

/// A transition and the signal as it stood right after it.
#[derive(Debug, Clone)]
pub struct LedgerChange {
    pub signal: Signal,
    pub transition: Transition,
}

impl SignalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signal. Terminal or already-tracked signals are ignored.
    pub fn insert(&mut self, signal: Signal) -> bool {
        if signal.is_terminal() || self.signals.iter().any(|s| s.id == signal.id) {
            return false;
        }
        self.signals.push(signal);
        true
    }

    /// Runs every tracked signal of the bar's symbol through one lifecycle
    /// step and returns the changes in insertion order.
    pub fn evaluate(&mut self, bar: &Bar) -> Vec<LedgerChange> {
        let mut changes = Vec::new();
        for signal in self.signals.iter_mut().filter(|s| s.symbol == bar.symbol) {
            if let Some(transition) = signal.evaluate(bar) {
                changes.push(LedgerChange {
                    signal: signal.clone(),
                    transition,
                });
            }
        }
        self.signals.retain(|s| !s.is_terminal());
        changes
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.state == SignalState::Open)
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
