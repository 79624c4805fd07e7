use crate::domain::entities::bar::CompositeBar;
use crate::domain::entities::signal::{Signal, Transition};
use serde::Serialize;

/// Observable engine activity, published on a broadcast channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    WindowClosed {
        symbol: String,
        window: usize,
        bar: CompositeBar,
    },
    SignalCreated {
        signal: Signal,
    },
    Transition {
        signal: Signal,
        transition: Transition,
    },
    BarRejected {
        symbol: String,
        end_timestamp: i64,
        reason: String,
    },
}
