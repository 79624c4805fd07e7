use crate::domain::entities::bar::CompositeBar;
use crate::domain::error::DomainError;
use crate::domain::values::confidence::Confidence;
use serde::Serialize;

/// The five numeric inputs of the confidence classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarFeatures {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&CompositeBar> for BarFeatures {
    fn from(bar: &CompositeBar) -> Self {
        Self {
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Opaque classifier consulted before a candidate becomes a signal.
/// `Ok(None)` means the scorer had no usable label.
#[async_trait::async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, features: &BarFeatures) -> Result<Option<Confidence>, DomainError>;
}
