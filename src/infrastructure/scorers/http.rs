use crate::domain::error::DomainError;
use crate::domain::ports::scorer::{BarFeatures, Scorer};
use crate::domain::values::confidence::Confidence;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Scores bars against a model served over HTTP.
///
/// POSTs `{"open":..,"high":..,"low":..,"close":..,"volume":..}` and expects
/// `{"label": <int>}`; a missing or null label means "no opinion".
pub struct HttpScorer {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct ScoreResponse {
    label: Option<i64>,
}

impl HttpScorer {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, features: &BarFeatures) -> Result<Option<Confidence>, DomainError> {
        let resp = self
            .client
            .post(&self.url)
            .json(features)
            .send()
            .await
            .map_err(|e| DomainError::Scorer(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Scorer(format!("{status}: {body}")));
        }

        let result: ScoreResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Scorer(format!("Parse error: {e}")))?;
        Ok(result.label.map(Confidence::new))
    }
}
