use crate::domain::entities::signal::Transition;
use crate::domain::values::signal_state::CloseKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the symbol workers and the dispatcher.
#[derive(Debug, Default)]
pub struct EngineStats {
    bars_processed: AtomicU64,
    bars_rejected: AtomicU64,
    bars_malformed: AtomicU64,
    windows_closed: AtomicU64,
    signals_created: AtomicU64,
    candidates_rejected: AtomicU64,
    fills: AtomicU64,
    breakevens: AtomicU64,
    stopped_out: AtomicU64,
    take_profits: AtomicU64,
    invalidated: AtomicU64,
    effects_applied: AtomicU64,
    effects_failed: AtomicU64,
    effects_dropped: AtomicU64,
    writes_skipped: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineSummary {
    pub bars_processed: u64,
    pub bars_rejected: u64,
    pub bars_malformed: u64,
    pub windows_closed: u64,
    pub signals_created: u64,
    pub candidates_rejected: u64,
    pub fills: u64,
    pub breakevens: u64,
    pub stopped_out: u64,
    pub take_profits: u64,
    pub invalidated: u64,
    pub effects_applied: u64,
    pub effects_failed: u64,
    pub effects_dropped: u64,
    pub writes_skipped: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl EngineStats {
    pub fn bar_processed(&self) {
        bump(&self.bars_processed);
    }

    pub fn bar_rejected(&self) {
        bump(&self.bars_rejected);
    }

    pub fn bar_malformed(&self) {
        bump(&self.bars_malformed);
    }

    pub fn window_closed(&self) {
        bump(&self.windows_closed);
    }

    pub fn signal_created(&self) {
        bump(&self.signals_created);
    }

    pub fn candidate_rejected(&self) {
        bump(&self.candidates_rejected);
    }

    pub fn transition(&self, transition: &Transition) {
        match transition {
            Transition::Filled { .. } => bump(&self.fills),
            Transition::Breakeven { .. } => bump(&self.breakevens),
            Transition::Closed { close_kind, .. } => match close_kind {
                CloseKind::StoppedOut => bump(&self.stopped_out),
                CloseKind::TakeProfit => bump(&self.take_profits),
                CloseKind::Invalidated => bump(&self.invalidated),
            },
        }
    }

    pub fn effect_applied(&self) {
        bump(&self.effects_applied);
    }

    pub fn effect_failed(&self) {
        bump(&self.effects_failed);
    }

    pub fn effect_dropped(&self) {
        bump(&self.effects_dropped);
    }

    pub fn write_skipped(&self) {
        bump(&self.writes_skipped);
    }

    pub fn summary(&self) -> EngineSummary {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        EngineSummary {
            bars_processed: load(&self.bars_processed),
            bars_rejected: load(&self.bars_rejected),
            bars_malformed: load(&self.bars_malformed),
            windows_closed: load(&self.windows_closed),
            signals_created: load(&self.signals_created),
            candidates_rejected: load(&self.candidates_rejected),
            fills: load(&self.fills),
            breakevens: load(&self.breakevens),
            stopped_out: load(&self.stopped_out),
            take_profits: load(&self.take_profits),
            invalidated: load(&self.invalidated),
            effects_applied: load(&self.effects_applied),
            effects_failed: load(&self.effects_failed),
            effects_dropped: load(&self.effects_dropped),
            writes_skipped: load(&self.writes_skipped),
        }
    }
}
