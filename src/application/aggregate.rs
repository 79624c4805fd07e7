use crate::domain::entities::bar::{Bar, CompositeBar};
use crate::domain::error::DomainError;
use std::collections::HashMap;

/// Folds every `window` consecutive bars of a symbol into one composite.
///
/// Buffers are keyed by symbol and never hold more than `window` bars.
pub struct BarAccumulator {
    window: usize,
    buffers: HashMap<String, Vec<Bar>>,
}

impl BarAccumulator {
    pub fn new(window: usize) -> Result<Self, DomainError> {
        if window == 0 {
            return Err(DomainError::Config("window size must be positive".into()));
        }
        Ok(Self {
            window,
            buffers: HashMap::new(),
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Buffers `bar`; returns the composite when it completes the window.
    pub fn ingest(&mut self, bar: &Bar) -> Option<CompositeBar> {
        let window = self.window;
        let buffer = self
            .buffers
            .entry(bar.symbol.clone())
            .or_insert_with(|| Vec::with_capacity(window));
        buffer.push(bar.clone());
        if buffer.len() < window {
            return None;
        }
        let composite = CompositeBar::from_bars(buffer);
        buffer.clear();
        composite
    }

    /// Bars currently buffered for `symbol`.
    #[cfg(test)]
    pub fn pending(&self, symbol: &str) -> usize {
        self.buffers.get(symbol).map_or(0, Vec::len)
    }
}
