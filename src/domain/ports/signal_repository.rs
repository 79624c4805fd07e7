use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::values::signal_state::{CloseKind, SignalState};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct SignalFilter {
    pub limit: Option<usize>,
    pub state: Option<SignalState>,
    pub symbol: Option<String>,
}

/// State change mirrored to the store after a lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalUpdate {
    pub id: String,
    pub total_profit: Option<f64>,
    pub state: SignalState,
    pub close_kind: Option<CloseKind>,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    /// Set only when the signal fills.
    pub entry_point: Option<f64>,
    pub initial_risk: Option<f64>,
}

impl SignalUpdate {
    pub fn from_signal(signal: &Signal, filled: bool) -> Self {
        Self {
            id: signal.id.clone(),
            total_profit: signal.total_profit,
            state: signal.state,
            close_kind: signal.close_kind,
            timestamp: signal.updated_at,
            entry_point: filled.then_some(signal.entry_point),
            initial_risk: if filled { signal.initial_risk } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub message: String,
    pub created_at: String,
}

/// Durable mirror of the signal ledger plus the outgoing message log.
///
/// Timestamps are passed as epoch milliseconds; implementations convert
/// them to calendar time and fail with [`DomainError::Timestamp`] when that
/// is impossible, without writing anything.
pub trait SignalRepository: Send + Sync {
    fn create_signal(&self, signal: &Signal) -> Result<String, DomainError>;
    fn fetch_non_terminal_signals(&self) -> Result<Vec<Signal>, DomainError>;
    fn update_signal(&self, update: &SignalUpdate) -> Result<(), DomainError>;
    fn update_stop_loss(&self, id: &str, stop_loss: f64, timestamp: i64) -> Result<(), DomainError>;
    fn append_message(&self, text: &str) -> Result<(), DomainError>;
    fn get_signal(&self, id: &str) -> Result<Option<Signal>, DomainError>;
    fn list_signals(&self, filter: &SignalFilter) -> Result<Vec<Signal>, DomainError>;
    fn list_messages(&self, limit: usize) -> Result<Vec<StoredMessage>, DomainError>;
}
