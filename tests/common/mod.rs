//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swingwatch::config::EngineConfig;
use swingwatch::domain::entities::bar::Bar;
use swingwatch::domain::error::DomainError;
use swingwatch::domain::ports::notifier::Notifier;
use swingwatch::domain::ports::scorer::{BarFeatures, Scorer};
use swingwatch::domain::values::confidence::Confidence;
use swingwatch::infrastructure::scorers::fixed::FixedScorer;
use swingwatch::SwingWatch;
use tokio::sync::Semaphore;

pub const BASE_TS: i64 = 1_700_000_000_000;

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _text: &str) -> Result<(), DomainError> {
        Err(DomainError::Notifier("webhook down".into()))
    }
}

/// Holds every delivery until the test releases permits.
pub struct GateNotifier {
    pub gate: Semaphore,
    pub sent: Mutex<Vec<String>>,
}

impl GateNotifier {
    pub fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Notifier for GateNotifier {
    async fn send(&self, text: &str) -> Result<(), DomainError> {
        let _permit = self.gate.acquire().await.unwrap();
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Never answers within any realistic timeout.
pub struct HangingScorer;

#[async_trait]
impl Scorer for HangingScorer {
    async fn score(&self, _features: &BarFeatures) -> Result<Option<Confidence>, DomainError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Some(Confidence::new(1)))
    }
}

/// Trade updates are off so message counts only see lifecycle alerts.
pub fn config(windows: Vec<usize>) -> EngineConfig {
    EngineConfig {
        windows,
        max_retries: 1,
        retry_base_delay_ms: 1,
        trade_updates: false,
        ..EngineConfig::default()
    }
}

pub fn setup() -> (SwingWatch, Arc<RecordingNotifier>) {
    setup_at(":memory:", config(vec![2]))
}

pub fn setup_at(db_path: &str, config: EngineConfig) -> (SwingWatch, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = SwingWatch::with_providers(
        db_path,
        config,
        Arc::new(FixedScorer::new(Some(Confidence::new(1)))),
        notifier.clone(),
    )
    .unwrap();
    (engine, notifier)
}

pub fn bar(symbol: &str, minute: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
    Bar::new(symbol, open, high, low, close, volume, BASE_TS + minute * 60_000)
}

/// Four one-minute bars that close two composites of size 2. The second
/// composite sweeps the first's high and closes back below its close, so
/// a SHORT signal is created (entry 108, stop 112, invalidated 95, target
/// 96) and fills on the fourth bar at 102.
pub fn short_setup(symbol: &str) -> Vec<Bar> {
    vec![
        bar(symbol, 1, 100.0, 110.0, 95.0, 99.0, 1000.0),
        bar(symbol, 2, 99.0, 105.0, 97.0, 104.0, 1000.0),
        bar(symbol, 3, 108.0, 112.0, 100.0, 105.0, 1500.0),
        bar(symbol, 4, 105.0, 106.0, 96.0, 102.0, 1500.0),
    ]
}
