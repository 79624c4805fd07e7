use crate::domain::entities::bar::Bar;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::direction::Direction;
use crate::domain::values::signal_state::{CloseKind, SignalState};
use serde::{Deserialize, Serialize};

/// Smallest risk distance used when placing the target.
pub const MIN_RISK: f64 = 0.05;

/// Target distance in multiples of risk.
pub const REWARD_MULTIPLE: f64 = 3.0;

/// A trade setup proposed by the pattern detector, before gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCandidate {
    pub symbol: String,
    pub direction: Direction,
    pub entry_point: f64,
    pub stop_loss: f64,
    pub invalidated_price: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    /// Composite size (in base bars) that produced the setup.
    pub window: usize,
    pub entry_point: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub invalidated_price: f64,
    pub state: SignalState,
    pub close_kind: Option<CloseKind>,
    pub total_profit: Option<f64>,
    /// `|fill - stop|` captured when the signal opened.
    pub initial_risk: Option<f64>,
    /// Whether the stop has already been moved to entry.
    pub breakeven: bool,
    pub volume_confirmed: bool,
    pub confidence: Confidence,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A lifecycle step taken by [`Signal::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Filled {
        fill_price: f64,
    },
    Breakeven {
        stop_loss: f64,
    },
    Closed {
        close_kind: CloseKind,
        total_profit: Option<f64>,
    },
}

pub fn take_profit_for(direction: Direction, entry_point: f64, stop_loss: f64) -> f64 {
    let risk = (entry_point - stop_loss).abs().max(MIN_RISK);
    entry_point + direction.sign() * REWARD_MULTIPLE * risk
}

/// Rounds to cents; `+ 0.0` folds `-0.0` into `0.0`.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

impl Signal {
    pub fn new(
        candidate: SignalCandidate,
        window: usize,
        volume_confirmed: bool,
        confidence: Confidence,
    ) -> Self {
        let take_profit =
            take_profit_for(candidate.direction, candidate.entry_point, candidate.stop_loss);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: candidate.symbol,
            direction: candidate.direction,
            window,
            entry_point: candidate.entry_point,
            stop_loss: candidate.stop_loss,
            take_profit,
            invalidated_price: candidate.invalidated_price,
            state: SignalState::Pending,
            close_kind: None,
            total_profit: None,
            initial_risk: None,
            breakeven: false,
            volume_confirmed,
            confidence,
            created_at: candidate.timestamp,
            updated_at: candidate.timestamp,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Profit of an open position if it were closed at `latest_price`.
    pub fn unrealized(&self, latest_price: f64) -> f64 {
        round_cents(self.direction.sign() * (latest_price - self.entry_point))
    }

    /// Re-evaluates the signal against one base bar, applying at most one
    /// transition. Closed signals are never touched.
    pub fn evaluate(&mut self, bar: &Bar) -> Option<Transition> {
        let transition = match self.state {
            SignalState::Closed => return None,
            SignalState::Pending => self.evaluate_pending(bar),
            SignalState::Open => self.evaluate_open(bar),
        }?;
        self.updated_at = bar.end_timestamp;
        Some(transition)
    }

    fn evaluate_pending(&mut self, bar: &Bar) -> Option<Transition> {
        let latest = bar.close;
        let (invalidated, filled) = match self.direction {
            Direction::Long => (
                bar.high >= self.invalidated_price,
                latest >= self.entry_point,
            ),
            Direction::Short => (
                bar.low <= self.invalidated_price,
                latest <= self.entry_point,
            ),
        };

        if invalidated {
            Some(self.close(CloseKind::Invalidated, None))
        } else if filled {
            self.entry_point = latest;
            self.initial_risk = Some((latest - self.stop_loss).abs());
            self.state = SignalState::Open;
            Some(Transition::Filled { fill_price: latest })
        } else {
            None
        }
    }

    fn evaluate_open(&mut self, bar: &Bar) -> Option<Transition> {
        let latest = bar.close;
        let sign = self.direction.sign();
        let risk = self
            .initial_risk
            .unwrap_or_else(|| (self.entry_point - self.stop_loss).abs());
        let stopped = match self.direction {
            Direction::Long => bar.low <= self.stop_loss,
            Direction::Short => bar.high >= self.stop_loss,
        };
        let target_hit = sign * (latest - self.take_profit) >= 0.0;
        let favourable_move = sign * (latest - self.entry_point);

        if stopped {
            let profit = round_cents(sign * (self.stop_loss - self.entry_point));
            Some(self.close(CloseKind::StoppedOut, Some(profit)))
        } else if target_hit {
            let profit = round_cents(sign * (self.take_profit - self.entry_point));
            Some(self.close(CloseKind::TakeProfit, Some(profit)))
        } else if !self.breakeven && favourable_move >= risk {
            self.stop_loss = self.entry_point;
            self.breakeven = true;
            Some(Transition::Breakeven {
                stop_loss: self.stop_loss,
            })
        } else {
            None
        }
    }

    fn close(&mut self, kind: CloseKind, total_profit: Option<f64>) -> Transition {
        self.state = SignalState::Closed;
        self.close_kind = Some(kind);
        self.total_profit = total_profit;
        Transition::Closed {
            close_kind: kind,
            total_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(direction: Direction, entry: f64, stop: f64, invalidated: f64) -> Signal {
        Signal::new(
            SignalCandidate {
                symbol: "SPY".into(),
                direction,
                entry_point: entry,
                stop_loss: stop,
                invalidated_price: invalidated,
                timestamp: 0,
            },
            6,
            false,
            Confidence::default(),
        )
    }

    fn bar(high: f64, low: f64, close: f64, ts: i64) -> Bar {
        Bar::new("SPY", close, high, low, close, 100.0, ts)
    }

    fn open_long() -> Signal {
        let mut s = signal(Direction::Long, 100.0, 98.0, 120.0);
        assert_eq!(
            s.evaluate(&bar(100.5, 99.5, 100.0, 1)),
            Some(Transition::Filled { fill_price: 100.0 })
        );
        s
    }

    #[test]
    fn test_take_profit_is_three_risk() {
        let s = signal(Direction::Long, 100.0, 98.0, 120.0);
        assert_eq!(s.take_profit, 106.0);
        let s = signal(Direction::Short, 108.0, 112.0, 95.0);
        assert_eq!(s.take_profit, 96.0);
    }

    #[test]
    fn test_risk_floor() {
        let s = signal(Direction::Long, 100.0, 99.99, 120.0);
        assert!((s.take_profit - 100.15).abs() < 1e-9);
        let s = signal(Direction::Short, 50.0, 50.0, 40.0);
        assert!((s.take_profit - 49.85).abs() < 1e-9);
    }

    #[test]
    fn test_stop_loss_hit_long() {
        let mut s = open_long();
        let t = s.evaluate(&bar(101.0, 97.0, 99.0, 2));
        assert_eq!(
            t,
            Some(Transition::Closed {
                close_kind: CloseKind::StoppedOut,
                total_profit: Some(-2.0)
            })
        );
        assert_eq!(s.state, SignalState::Closed);
        assert_eq!(s.updated_at, 2);
    }

    #[test]
    fn test_take_profit_hit_long() {
        let mut s = open_long();
        let t = s.evaluate(&bar(106.5, 99.0, 106.0, 2));
        assert_eq!(
            t,
            Some(Transition::Closed {
                close_kind: CloseKind::TakeProfit,
                total_profit: Some(6.0)
            })
        );
    }

    #[test]
    fn test_stop_checked_before_target() {
        let mut s = open_long();
        let t = s.evaluate(&bar(107.0, 97.0, 106.0, 2));
        assert!(matches!(
            t,
            Some(Transition::Closed {
                close_kind: CloseKind::StoppedOut,
                ..
            })
        ));
    }

    #[test]
    fn test_pending_long_invalidation_boundary() {
        let mut s = signal(Direction::Long, 50.0, 48.0, 45.0);
        // Below entry so it cannot fill either.
        assert_eq!(s.evaluate(&bar(44.0, 40.0, 42.0, 1)), None);
        let mut s = signal(Direction::Long, 50.0, 48.0, 47.0);
        assert_eq!(s.evaluate(&bar(46.0, 44.0, 45.0, 1)), None);
        assert_eq!(
            s.evaluate(&bar(47.0, 44.0, 45.0, 2)),
            Some(Transition::Closed {
                close_kind: CloseKind::Invalidated,
                total_profit: None
            })
        );
        assert_eq!(s.total_profit, None);
        assert_eq!(s.close_kind, Some(CloseKind::Invalidated));
    }

    #[test]
    fn test_invalidation_checked_before_fill() {
        let mut s = signal(Direction::Short, 100.0, 104.0, 95.0);
        let t = s.evaluate(&bar(101.0, 94.0, 99.0, 1));
        assert!(matches!(
            t,
            Some(Transition::Closed {
                close_kind: CloseKind::Invalidated,
                ..
            })
        ));
    }

    #[test]
    fn test_fill_overwrites_entry_with_latest_price() {
        let mut s = signal(Direction::Short, 100.0, 104.0, 90.0);
        assert_eq!(
            s.evaluate(&bar(100.5, 98.0, 98.5, 1)),
            Some(Transition::Filled { fill_price: 98.5 })
        );
        assert_eq!(s.state, SignalState::Open);
        assert_eq!(s.entry_point, 98.5);
        assert_eq!(s.initial_risk, Some(5.5));
        // target stays anchored to the proposed entry
        assert_eq!(s.take_profit, 88.0);
    }

    #[test]
    fn test_breakeven_moves_once() {
        let mut s = open_long();
        assert_eq!(
            s.evaluate(&bar(102.5, 101.0, 102.0, 2)),
            Some(Transition::Breakeven { stop_loss: 100.0 })
        );
        assert_eq!(s.stop_loss, s.entry_point);
        assert!(s.breakeven);
        assert_eq!(s.evaluate(&bar(104.5, 103.0, 104.0, 3)), None);
        assert_eq!(s.stop_loss, 100.0);
        // after breakeven a return to entry stops out flat
        assert_eq!(
            s.evaluate(&bar(101.0, 100.0, 100.5, 4)),
            Some(Transition::Closed {
                close_kind: CloseKind::StoppedOut,
                total_profit: Some(0.0)
            })
        );
    }

    #[test]
    fn test_short_mirror() {
        let mut s = signal(Direction::Short, 108.0, 112.0, 95.0);
        s.evaluate(&bar(108.5, 107.0, 108.0, 1));
        assert_eq!(s.state, SignalState::Open);
        assert_eq!(
            s.evaluate(&bar(106.0, 103.5, 104.0, 2)),
            Some(Transition::Breakeven { stop_loss: 108.0 })
        );
        assert_eq!(
            s.evaluate(&bar(100.0, 95.0, 96.0, 3)),
            Some(Transition::Closed {
                close_kind: CloseKind::TakeProfit,
                total_profit: Some(12.0)
            })
        );
    }

    #[test]
    fn test_closed_signal_is_frozen() {
        let mut s = open_long();
        s.evaluate(&bar(101.0, 97.0, 99.0, 2));
        let frozen = s.clone();
        assert_eq!(s.evaluate(&bar(200.0, 0.0, 150.0, 3)), None);
        assert_eq!(s, frozen);
    }

    #[test]
    fn test_unrealized() {
        let s = open_long();
        assert_eq!(s.unrealized(103.25), 3.25);
        let mut short = signal(Direction::Short, 50.0, 52.0, 40.0);
        short.evaluate(&bar(50.0, 49.0, 50.0, 1));
        assert_eq!(short.unrealized(48.5), 1.5);
    }
}
