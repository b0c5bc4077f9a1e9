mod common;

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::sync::watch;

use common::{insert_raw, setup_db};
use todo_backend::server::overdue_monitor::OverdueMonitor;

#[tokio::test]
async fn cycle_counts_only_incomplete_live_past_due_items() {
    let db = setup_db().await;
    let yesterday = Utc::now() - ChronoDuration::days(1);
    let tomorrow = Utc::now() + ChronoDuration::days(1);

    insert_raw(&db, "overdue", Some(yesterday), false, false).await;
    insert_raw(&db, "done", Some(yesterday), true, false).await;
    insert_raw(&db, "deleted", Some(yesterday), false, true).await;
    insert_raw(&db, "future", Some(tomorrow), false, false).await;
    insert_raw(&db, "undated", None, false, false).await;

    let monitor = OverdueMonitor::new(db, Duration::from_secs(60));
    assert_eq!(monitor.run_cycle().await.unwrap(), 1);
}

#[tokio::test]
async fn cycle_on_empty_store_reports_zero() {
    let monitor = OverdueMonitor::new(setup_db().await, Duration::from_secs(60));
    assert_eq!(monitor.run_cycle().await.unwrap(), 0);
}

#[tokio::test]
async fn run_stops_on_shutdown_signal() {
    let monitor = OverdueMonitor::new(setup_db().await, Duration::from_secs(3600));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(monitor.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor should stop promptly")
        .unwrap();
}

#[tokio::test]
async fn run_stops_when_sender_is_dropped() {
    let monitor = OverdueMonitor::new(setup_db().await, Duration::from_secs(3600));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(monitor.run(shutdown_rx));

    drop(shutdown_tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor should stop once the sender is gone")
        .unwrap();
}
