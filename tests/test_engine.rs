mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use swingwatch::application::events::EngineEvent;
use swingwatch::domain::ports::signal_repository::SignalFilter;
use swingwatch::domain::values::confidence::{Confidence, ConfidencePolicy};
use swingwatch::domain::values::direction::Direction;
use swingwatch::domain::values::signal_state::{CloseKind, SignalState};
use swingwatch::infrastructure::feeds::json_lines::JsonLinesFeed;
use swingwatch::infrastructure::scorers::fixed::FixedScorer;
use swingwatch::SwingWatch;

#[tokio::test]
async fn test_short_signal_created_filled_and_takes_profit() {
    let (mut engine, notifier) = setup();
    for b in short_setup("SPY") {
        engine.ingest(b).await.unwrap();
    }

    let live = engine.snapshot("SPY").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].direction, Direction::Short);
    assert_eq!(live[0].state, SignalState::Open);
    assert_eq!(live[0].entry_point, 102.0);
    assert_eq!(live[0].take_profit, 96.0);

    engine
        .ingest(bar("SPY", 5, 102.0, 103.0, 97.0, 96.0, 800.0))
        .await
        .unwrap();
    let summary = engine.shutdown().await.unwrap();

    assert_eq!(summary.bars_processed, 5);
    assert_eq!(summary.signals_created, 1);
    assert_eq!(summary.fills, 1);
    assert_eq!(summary.take_profits, 1);
    assert_eq!(summary.effects_dropped, 0);

    let stored = engine.signals(&SignalFilter::default()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].state, SignalState::Closed);
    assert_eq!(stored[0].close_kind, Some(CloseKind::TakeProfit));
    assert_eq!(stored[0].total_profit, Some(6.0));
    assert!(stored[0].volume_confirmed);

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].starts_with("SHORT Alert: SPY, Entry: 108, Stop: 112 [VC] | "));
    assert!(sent[1].starts_with("FILLED SHORT [SPY] at 102 | "));
    assert!(sent[2].starts_with("TAKE PROFIT HIT [SPY] at 96 for a total profit of 6.00 | "));

    let log = engine.messages(10).unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].message, sent[2]);
}

#[tokio::test]
async fn test_out_of_order_bar_rejected() {
    let (mut engine, _) = setup();
    let mut events = engine.subscribe();
    engine.ingest(bar("SPY", 2, 1.0, 2.0, 0.5, 1.5, 10.0)).await.unwrap();
    engine.ingest(bar("SPY", 1, 1.0, 2.0, 0.5, 1.5, 10.0)).await.unwrap();
    engine.ingest(bar("SPY", 2, 1.0, 2.0, 0.5, 1.5, 10.0)).await.unwrap();
    let summary = engine.shutdown().await.unwrap();

    assert_eq!(summary.bars_processed, 1);
    assert_eq!(summary.bars_rejected, 2);

    let mut rejected = 0;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::BarRejected { symbol, .. } = event {
            assert_eq!(symbol, "SPY");
            rejected += 1;
        }
    }
    assert_eq!(rejected, 2);
}

#[tokio::test]
async fn test_symbols_are_independent() {
    let (mut engine, _) = setup();
    let spy = short_setup("SPY");
    let qqq = short_setup("QQQ");
    for (a, b) in spy.into_iter().zip(qqq) {
        engine.ingest(a).await.unwrap();
        engine.ingest(b).await.unwrap();
    }
    assert_eq!(engine.snapshot("SPY").await.unwrap().len(), 1);
    assert_eq!(engine.snapshot("QQQ").await.unwrap().len(), 1);
    assert!(engine.snapshot("IWM").await.unwrap().is_empty());

    let summary = engine.shutdown().await.unwrap();
    assert_eq!(summary.signals_created, 2);
    let spy_only = engine
        .signals(&SignalFilter {
            symbol: Some("SPY".into()),
            ..SignalFilter::default()
        })
        .unwrap();
    assert_eq!(spy_only.len(), 1);
}

#[tokio::test]
async fn test_restored_signal_stops_out_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("signals.db");
    let db = db.to_str().unwrap();

    let (mut first, _) = setup_at(db, config(vec![2]));
    for b in short_setup("SPY") {
        first.ingest(b).await.unwrap();
    }
    first.shutdown().await.unwrap();

    let (mut second, notifier) = setup_at(db, config(vec![2]));
    assert_eq!(second.restore().await.unwrap(), 1);
    second
        .ingest(bar("SPY", 5, 103.0, 113.0, 101.0, 110.0, 900.0))
        .await
        .unwrap();
    let summary = second.shutdown().await.unwrap();
    assert_eq!(summary.stopped_out, 1);

    let stored = second.signals(&SignalFilter::default()).unwrap();
    assert_eq!(stored[0].close_kind, Some(CloseKind::StoppedOut));
    assert_eq!(stored[0].total_profit, Some(-10.0));

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("STOPLOSS HIT [SPY] at 112 for total loss of -10.00 | "));
}

#[tokio::test]
async fn test_notifier_failure_keeps_store_state() {
    let engine = SwingWatch::with_providers(
        ":memory:",
        config(vec![2]),
        Arc::new(FixedScorer::default()),
        Arc::new(FailingNotifier),
    );
    let mut engine = engine.unwrap();
    for b in short_setup("SPY") {
        engine.ingest(b).await.unwrap();
    }
    let summary = engine.shutdown().await.unwrap();

    assert_eq!(summary.effects_failed, 2);
    let stored = engine.signals(&SignalFilter::default()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].state, SignalState::Open);
    assert_eq!(stored[0].entry_point, 102.0);
    assert_eq!(engine.messages(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_required_label_rejects_candidate() {
    let mut cfg = config(vec![2]);
    cfg.confidence_policy = ConfidencePolicy::RequireLabel(2);
    let engine = SwingWatch::with_providers(
        ":memory:",
        cfg,
        Arc::new(FixedScorer::new(Some(Confidence::new(1)))),
        Arc::new(RecordingNotifier::default()),
    );
    let mut engine = engine.unwrap();
    for b in short_setup("SPY") {
        engine.ingest(b).await.unwrap();
    }
    let summary = engine.shutdown().await.unwrap();

    assert_eq!(summary.signals_created, 0);
    assert_eq!(summary.candidates_rejected, 1);
    assert!(engine.signals(&SignalFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn test_trade_update_broadcast_for_open_signal() {
    let (mut engine, notifier) = setup();
    for b in short_setup("SPY") {
        engine.ingest(b).await.unwrap();
    }
    engine.broadcast_update("SPY").await.unwrap();
    engine.broadcast_update("IWM").await.unwrap();
    engine.shutdown().await.unwrap();

    let sent = notifier.sent.lock().unwrap().clone();
    let update = sent.last().unwrap();
    assert!(update.starts_with("TRADE UPDATE [SPY] SHORT P/L: 0.00 | "), "{update}");
}

#[tokio::test]
async fn test_ingest_after_shutdown_fails() {
    let (mut engine, _) = setup();
    engine.shutdown().await.unwrap();
    assert!(engine.ingest(bar("SPY", 1, 1.0, 2.0, 0.5, 1.5, 10.0)).await.is_err());
}

#[tokio::test]
async fn test_trade_updates_priced_at_each_base_window_close() {
    let mut cfg = config(vec![2]);
    cfg.trade_updates = true;
    let (mut engine, notifier) = setup_at(":memory:", cfg);
    for b in short_setup("SPY") {
        engine.ingest(b).await.unwrap();
    }
    engine
        .ingest(bar("SPY", 5, 102.0, 103.0, 99.0, 100.0, 800.0))
        .await
        .unwrap();
    engine
        .ingest(bar("SPY", 6, 100.0, 101.0, 98.0, 99.0, 800.0))
        .await
        .unwrap();
    engine.shutdown().await.unwrap();

    let sent = notifier.sent.lock().unwrap().clone();
    let updates: Vec<_> = sent.iter().filter(|m| m.starts_with("TRADE UPDATE")).collect();
    assert_eq!(updates.len(), 2, "{sent:?}");
    assert!(updates[0].starts_with("TRADE UPDATE [SPY] SHORT P/L: 0.00 | "), "{}", updates[0]);
    assert!(updates[1].starts_with("TRADE UPDATE [SPY] SHORT P/L: 3.00 | "), "{}", updates[1]);
    // Fill is announced before the first update on the same bar.
    assert!(sent[1].starts_with("FILLED SHORT [SPY] at 102 | "));
}

#[tokio::test]
async fn test_stalled_scorer_only_delays_its_own_symbol() {
    let mut cfg = config(vec![2]);
    cfg.symbol_queue_capacity = 1;
    cfg.score_timeout_ms = 3_600_000;
    let engine = SwingWatch::with_providers(
        ":memory:",
        cfg,
        Arc::new(HangingScorer),
        Arc::new(RecordingNotifier::default()),
    );
    let mut engine = engine.unwrap();
    let limit = Duration::from_secs(2);

    let mut spy = short_setup("SPY");
    spy.extend((5..10).map(|m| bar("SPY", m, 102.0, 103.0, 101.0, 102.0, 500.0)));
    for b in spy {
        tokio::time::timeout(limit, engine.ingest(b))
            .await
            .expect("SPY ingest blocked")
            .unwrap();
    }
    for m in 1..=4 {
        tokio::time::timeout(limit, engine.ingest(bar("QQQ", m, 10.0, 11.0, 9.0, 10.5, 100.0)))
            .await
            .expect("QQQ ingest blocked")
            .unwrap();
    }

    let qqq = tokio::time::timeout(limit, engine.snapshot("QQQ")).await;
    assert!(qqq.expect("QQQ snapshot blocked").unwrap().is_empty());
    assert_eq!(engine.stats().bars_processed, 8);

    // SPY is still waiting on its label, so its snapshot is parked.
    let spy = tokio::time::timeout(Duration::from_millis(100), engine.snapshot("SPY")).await;
    assert!(spy.is_err());
}

#[tokio::test]
async fn test_scorer_timeout_rejects_candidate() {
    let mut cfg = config(vec![2]);
    cfg.score_timeout_ms = 50;
    let engine = SwingWatch::with_providers(
        ":memory:",
        cfg,
        Arc::new(HangingScorer),
        Arc::new(RecordingNotifier::default()),
    );
    let mut engine = engine.unwrap();
    for b in short_setup("SPY") {
        engine.ingest(b).await.unwrap();
    }
    assert!(engine.snapshot("SPY").await.unwrap().is_empty());
    let summary = engine.shutdown().await.unwrap();

    assert_eq!(summary.bars_processed, 4);
    assert_eq!(summary.candidates_rejected, 1);
    assert_eq!(summary.signals_created, 0);
}

#[tokio::test]
async fn test_full_dispatch_queue_drops_effects_not_bars() {
    let mut cfg = config(vec![2]);
    cfg.dispatch_capacity = 1;
    let notifier = Arc::new(GateNotifier::closed());
    let engine = SwingWatch::with_providers(
        ":memory:",
        cfg,
        Arc::new(FixedScorer::default()),
        notifier.clone(),
    );
    let mut engine = engine.unwrap();
    for b in short_setup("SPY") {
        tokio::time::timeout(Duration::from_secs(2), engine.ingest(b))
            .await
            .expect("ingest blocked on a full dispatch queue")
            .unwrap();
    }

    let live = engine.snapshot("SPY").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].state, SignalState::Open);
    assert_eq!(live[0].entry_point, 102.0);
    assert!(engine.stats().effects_dropped >= 1);

    notifier.gate.add_permits(100);
    let summary = engine.shutdown().await.unwrap();
    assert_eq!(summary.bars_processed, 4);
    assert_eq!(summary.signals_created, 1);
    assert_eq!(summary.fills, 1);
}

#[tokio::test]
async fn test_consume_skips_malformed_lines() {
    let mut input = String::new();
    for (i, b) in short_setup("SPY").iter().enumerate() {
        input.push_str(&serde_json::to_string(b).unwrap());
        input.push('\n');
        if i == 1 {
            input.push_str("{\"symbol\":\"SPY\",\"open\":\n");
        }
    }
    let mut feed = JsonLinesFeed::new("test", input.as_bytes());

    let (mut engine, _) = setup();
    engine.consume(&mut feed).await.unwrap();
    let summary = engine.shutdown().await.unwrap();

    assert_eq!(summary.bars_malformed, 1);
    assert_eq!(summary.bars_processed, 4);
    assert_eq!(summary.signals_created, 1);
}
