//! Unit tests for the analysis snapshot aggregator.
//!
//! Lines are fed through a real tokio channel, standing in for the drain.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use ucci_analyzer::engine::Snapshot;
use ucci_analyzer::ucci::parser::ParseLimits;

const WINDOW: Duration = Duration::from_millis(50);

fn report(rank: u32, depth: u32, score: i32) -> String {
    format!(
        "info depth {depth} seldepth {depth} multipv {rank} score {score} \
         nodes 4096 nps 20480 time 200 hashfull 1 pv h2e2 h9g7 h0g2 i9h9 b0c2"
    )
}

fn summary(lines: &[ucci_analyzer::Line]) -> Vec<(u32, u32)> {
    lines.iter().map(|l| (l.rank(), l.depth())).collect()
}

// ── Aggregation ──────────────────────────────────────────────────────────────

/// Later reports for a rank replace earlier ones, even at lower depth.
#[tokio::test]
async fn most_recent_report_per_rank_wins() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(2, ParseLimits::default());

    for raw in [
        report(1, 5, 10),
        report(2, 5, -3),
        report(1, 6, 12),
        report(2, 7, -1),
    ] {
        tx.send(raw).await.expect("send");
    }

    let lines = snapshot.poll(&mut rx, WINDOW).await.expect("not stopped");

    assert_eq!(summary(lines), vec![(1, 6), (2, 7)]);
    assert_eq!(lines[0].score(), Some(12.0));
    assert_eq!(lines[1].score(), Some(-1.0));
}

#[tokio::test]
async fn shallower_rerun_replaces_deeper_report() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    tx.send(report(1, 14, 30)).await.expect("send");
    tx.send(report(1, 3, 28)).await.expect("send");

    let lines = snapshot.poll(&mut rx, WINDOW).await.expect("not stopped");

    assert_eq!(summary(lines), vec![(1, 3)]);
}

#[tokio::test]
async fn first_poll_without_data_is_empty_not_stopped() {
    let (_tx, mut rx) = mpsc::channel::<String>(1);
    let mut snapshot = Snapshot::new(3, ParseLimits::default());

    let lines = snapshot.poll(&mut rx, WINDOW).await;

    assert_eq!(lines.map(<[_]>::len), Some(0));
}

/// Once data has been seen, a quiet window returns the same snapshot.
#[tokio::test]
async fn quiet_window_returns_previous_snapshot() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(2, ParseLimits::default());

    tx.send(report(1, 9, 20)).await.expect("send");
    let first = snapshot
        .poll(&mut rx, WINDOW)
        .await
        .expect("not stopped")
        .to_vec();

    let second = snapshot
        .poll(&mut rx, WINDOW)
        .await
        .expect("not stopped")
        .to_vec();

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert!(snapshot.engine_alive(), "sender is still alive");
}

/// Non-analysis chatter in a window does not blank the cached snapshot.
#[tokio::test]
async fn window_with_only_chatter_keeps_snapshot() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    tx.send(report(1, 9, 20)).await.expect("send");
    let first = snapshot.poll(&mut rx, WINDOW).await.expect("open").to_vec();

    tx.send("info nps 900000".to_owned()).await.expect("send");
    tx.send("bestmove h2e2".to_owned()).await.expect("send");
    let second = snapshot.poll(&mut rx, WINDOW).await.expect("open").to_vec();

    assert_eq!(first, second);
}

#[tokio::test]
async fn unfilled_ranks_are_omitted() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(3, ParseLimits::default());

    tx.send(report(3, 8, -40)).await.expect("send");
    tx.send(report(1, 8, 25)).await.expect("send");

    let lines = snapshot.poll(&mut rx, WINDOW).await.expect("not stopped");

    assert_eq!(summary(lines), vec![(1, 8), (3, 8)]);
}

#[tokio::test]
async fn ranks_outside_table_are_ignored() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(2, ParseLimits::default());

    tx.send(report(0, 8, 1)).await.expect("send");
    tx.send(report(3, 8, 2)).await.expect("send");
    tx.send(report(2, 8, 3)).await.expect("send");

    let lines = snapshot.poll(&mut rx, WINDOW).await.expect("not stopped");

    assert_eq!(summary(lines), vec![(2, 8)]);
}

#[tokio::test]
async fn malformed_line_is_dropped_and_processing_continues() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    tx.send(report(1, 4, 10)).await.expect("send");
    tx.send(report(1, 5, 10).replace("depth 5", "depth five"))
        .await
        .expect("send");
    tx.send(report(1, 6, 11)).await.expect("send");

    let lines = snapshot.poll(&mut rx, WINDOW).await.expect("not stopped");

    assert_eq!(summary(lines), vec![(1, 6)]);
}

#[test]
fn absorb_reports_whether_a_slot_changed() {
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    assert!(snapshot.absorb(&report(1, 2, 0)));
    assert!(!snapshot.absorb(&report(2, 2, 0)));
    assert!(!snapshot.absorb("readyok"));
    assert_eq!(snapshot.rank_count(), 1);
}

// ── Stop semantics ───────────────────────────────────────────────────────────

/// After stop, poll signals completion even with unread data in the channel.
#[tokio::test]
async fn stopped_snapshot_ignores_pending_data() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    tx.send(report(1, 9, 20)).await.expect("send");
    snapshot.stop();

    assert!(snapshot.is_stopped());
    assert!(snapshot.poll(&mut rx, WINDOW).await.is_none());
    assert!(snapshot.poll(&mut rx, WINDOW).await.is_none());
    assert!(
        rx.try_recv().is_ok(),
        "a stopped snapshot must not consume channel data"
    );
}

// ── Timing ───────────────────────────────────────────────────────────────────

/// A closed channel ends the window early instead of waiting it out.
#[tokio::test]
async fn closed_channel_ends_window_early() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    tx.send(report(1, 9, 20)).await.expect("send");
    drop(tx);

    let started = Instant::now();
    let lines = snapshot
        .poll(&mut rx, Duration::from_secs(5))
        .await
        .expect("not stopped")
        .to_vec();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(lines.len(), 1, "data sent before close is still delivered");
    assert!(!snapshot.engine_alive());

    let again = snapshot
        .poll(&mut rx, Duration::from_secs(5))
        .await
        .expect("not stopped")
        .to_vec();
    assert_eq!(lines, again, "dead engine yields stale data, not empty");
}

#[tokio::test]
async fn poll_returns_after_window_when_engine_is_silent() {
    let (_tx, mut rx) = mpsc::channel::<String>(1);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    let started = Instant::now();
    let _ = snapshot.poll(&mut rx, Duration::from_millis(100)).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(90), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "returned too late: {elapsed:?}");
}

/// A line that arrives after one window closes is picked up by the next.
#[tokio::test]
async fn late_line_is_delivered_by_next_poll() {
    let (tx, mut rx) = mpsc::channel(1);
    let mut snapshot = Snapshot::new(1, ParseLimits::default());

    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        tx.send(report(1, 11, 7)).await.expect("send");
        tx
    });

    let first = snapshot
        .poll(&mut rx, Duration::from_millis(20))
        .await
        .expect("open")
        .len();
    assert_eq!(first, 0);

    let mut seen = Vec::new();
    for _ in 0..50 {
        let lines = snapshot.poll(&mut rx, Duration::from_millis(20)).await.expect("open");
        if !lines.is_empty() {
            seen = summary(lines);
            break;
        }
    }

    assert_eq!(seen, vec![(1, 11)]);
    drop(producer.await.expect("producer"));
}
