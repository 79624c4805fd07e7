use crate::domain::error::DomainError;
use crate::domain::ports::scorer::{BarFeatures, Scorer};
use crate::domain::values::confidence::Confidence;

/// Returns the same label for every bar; `None` makes every candidate fail.
pub struct FixedScorer {
    label: Option<Confidence>,
}

impl FixedScorer {
    pub fn new(label: Option<Confidence>) -> Self {
        Self { label }
    }
}

impl Default for FixedScorer {
    fn default() -> Self {
        Self::new(Some(Confidence::default()))
    }
}

#[async_trait::async_trait]
impl Scorer for FixedScorer {
    async fn score(&self, _features: &BarFeatures) -> Result<Option<Confidence>, DomainError> {
        Ok(self.label)
    }
}
