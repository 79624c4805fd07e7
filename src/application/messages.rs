//! Fixed chat templates for signal events.

use crate::domain::entities::signal::{Signal, Transition};
use crate::domain::values::signal_state::CloseKind;
use crate::domain::values::timestamp;

pub fn signal_alert(signal: &Signal) -> String {
    let volume = if signal.volume_confirmed { " [VC]" } else { "" };
    format!(
        "{} Alert: {}, Entry: {}, Stop: {}{} | {}",
        signal.direction,
        signal.symbol,
        signal.entry_point,
        signal.stop_loss,
        volume,
        timestamp::display(signal.created_at)
    )
}

/// Chat line for a lifecycle transition. Breakeven moves are silent.
pub fn transition_message(signal: &Signal, transition: &Transition, at: i64) -> Option<String> {
    let ts = timestamp::display(at);
    let profit = signal.total_profit.unwrap_or_default();
    match transition {
        Transition::Filled { fill_price } => Some(format!(
            "FILLED {} [{}] at {} | {}",
            signal.direction, signal.symbol, fill_price, ts
        )),
        Transition::Breakeven { .. } => None,
        Transition::Closed { close_kind, .. } => Some(match close_kind {
            CloseKind::StoppedOut => format!(
                "STOPLOSS HIT [{}] at {} for total loss of {:.2} | {}",
                signal.symbol, signal.stop_loss, profit, ts
            ),
            CloseKind::TakeProfit => format!(
                "TAKE PROFIT HIT [{}] at {} for a total profit of {:.2} | {}",
                signal.symbol, signal.take_profit, profit, ts
            ),
            CloseKind::Invalidated => format!(
                "INVALIDATED {} [{}] at {} | {}",
                signal.direction, signal.symbol, signal.invalidated_price, ts
            ),
        }),
    }
}

pub fn trade_update(signal: &Signal, profit_loss: f64, at: i64) -> String {
    format!(
        "TRADE UPDATE [{}] {} P/L: {:.2} | {}",
        signal.symbol,
        signal.direction,
        profit_loss,
        timestamp::display(at)
    )
}
