use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Pending,
    Open,
    Closed,
}

impl SignalState {
    pub fn is_terminal(self) -> bool {
        self == SignalState::Closed
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalState::Pending => write!(f, "pending"),
            SignalState::Open => write!(f, "open"),
            SignalState::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for SignalState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SignalState::Pending),
            "open" => Ok(SignalState::Open),
            "closed" => Ok(SignalState::Closed),
            _ => Err(format!("Unknown signal state: {s}")),
        }
    }
}

/// How a closed signal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseKind {
    StoppedOut,
    TakeProfit,
    Invalidated,
}

impl fmt::Display for CloseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseKind::StoppedOut => write!(f, "stopped_out"),
            CloseKind::TakeProfit => write!(f, "take_profit"),
            CloseKind::Invalidated => write!(f, "invalidated"),
        }
    }
}

impl FromStr for CloseKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stopped_out" => Ok(CloseKind::StoppedOut),
            "take_profit" => Ok(CloseKind::TakeProfit),
            "invalidated" => Ok(CloseKind::Invalidated),
            _ => Err(format!("Unknown close kind: {s}")),
        }
    }
}
