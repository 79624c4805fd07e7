//! Swing failure pattern detection over two consecutive composite bars.
//!
//! A short setup needs the current bar to sweep the previous high and close
//! back below the previous close while holding the previous low. A long
//! setup is the mirror: sweep the previous low, close above the previous
//! close, hold the previous high.

use crate::domain::entities::bar::CompositeBar;
use crate::domain::entities::signal::SignalCandidate;
use crate::domain::values::direction::Direction;

pub fn detect(
    direction: Direction,
    previous: &CompositeBar,
    current: &CompositeBar,
) -> Option<SignalCandidate> {
    if previous.symbol != current.symbol {
        return None;
    }
    match direction {
        Direction::Short => detect_short(previous, current),
        Direction::Long => detect_long(previous, current),
    }
}

/// First setup found in either direction. The two are mutually exclusive:
/// each is cancelled by the sweep the other one requires.
pub fn detect_any(previous: &CompositeBar, current: &CompositeBar) -> Option<SignalCandidate> {
    Direction::ALL
        .iter()
        .find_map(|&direction| detect(direction, previous, current))
}

fn detect_short(previous: &CompositeBar, current: &CompositeBar) -> Option<SignalCandidate> {
    if current.high <= previous.high {
        return None;
    }
    let entry_point = entry_for(current);
    let fired = current.close < previous.close;
    // A lower low as well means the bar expanded both ways, not a sweep.
    let cancelled = current.low < previous.low;
    if !fired || cancelled {
        return None;
    }
    Some(SignalCandidate {
        symbol: current.symbol.clone(),
        direction: Direction::Short,
        entry_point,
        stop_loss: current.high,
        invalidated_price: previous.low,
        timestamp: current.end_timestamp,
    })
}

fn detect_long(previous: &CompositeBar, current: &CompositeBar) -> Option<SignalCandidate> {
    if current.low >= previous.low {
        return None;
    }
    let entry_point = entry_for(current);
    let fired = current.close > previous.close;
    let cancelled = current.high > previous.high;
    if !fired || cancelled {
        return None;
    }
    Some(SignalCandidate {
        symbol: current.symbol.clone(),
        direction: Direction::Long,
        entry_point,
        stop_loss: current.low,
        invalidated_price: previous.high,
        timestamp: current.end_timestamp,
    })
}

/// Bearish bars enter at their open, all others at their close.
fn entry_for(current: &CompositeBar) -> f64 {
    if current.is_bearish() {
        current.open
    } else {
        current.close
    }
}
