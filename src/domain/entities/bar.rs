use serde::{Deserialize, Serialize};

/// One base bar from the market-data feed.
///
/// Short keys (`sym`, `o`, `h`, `l`, `c`, `v`, `e`) are accepted so that
/// per-minute aggregate messages can be fed in unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(alias = "sym")]
    pub symbol: String,
    #[serde(alias = "o")]
    pub open: f64,
    #[serde(alias = "h")]
    pub high: f64,
    #[serde(alias = "l")]
    pub low: f64,
    #[serde(alias = "c")]
    pub close: f64,
    #[serde(alias = "v")]
    pub volume: f64,
    /// Milliseconds since the Unix epoch.
    #[serde(alias = "e")]
    pub end_timestamp: i64,
}

impl Bar {
    pub fn new(
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        end_timestamp: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            open,
            high,
            low,
            close,
            volume,
            end_timestamp,
        }
    }
}

/// N consecutive bars of one symbol folded into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBar {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub end_timestamp: i64,
}

impl CompositeBar {
    /// Folds `bars` in order. Returns `None` for an empty slice.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;
        Some(Self {
            symbol: first.symbol.clone(),
            open: first.open,
            high: bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            low: bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            close: last.close,
            volume: bars.iter().map(|b| b.volume).sum(),
            end_timestamp: last.end_timestamp,
        })
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
