//! Integration tests for the build-view flow: resolve, gate, poll.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use slipway_client::fakes::*;
use slipway_client::{
    BuildRef, GateDriver, Outcome, StalenessDetector, StalenessMonitor, StalenessStatus, ToastGate,
};
use slipway_core::{BuildId, ChannelId};

/// Test: "latest" route resolves through the feed and the first resolved id
/// reaches the view ungated.
#[tokio::test]
async fn test_latest_route_reaches_view_ungated() {
    let latest = BuildId::new();
    let feed = StaticLatestBuildFeed::new(Some(latest));
    let resolved = "latest"
        .parse::<BuildRef>()
        .expect("parse")
        .resolve(&feed, ChannelId::new())
        .await
        .expect("resolve")
        .expect("channel has builds");

    let (id_tx, id_rx) = mpsc::channel(4);
    let (_accept_tx, accept_rx) = mpsc::channel::<()>(4);
    let (_handle, mut current_rx, _notice_rx) =
        GateDriver::spawn(ToastGate::new(true), id_rx, accept_rx);

    id_tx.send(resolved).await.expect("send");
    current_rx.changed().await.expect("emit");
    assert_eq!(*current_rx.borrow(), Some(latest));
}

/// Test: the monitor reports fresh, then superseded with the failure link
/// once a newer failed run appears in the window.
#[tokio::test(start_paused = true)]
async fn test_monitor_reports_superseded_with_failure_link() {
    let feed = Arc::new(ScriptedStatusFeed::new());
    feed.push_samples(vec![completed("X", 0, Outcome::Succeeded)]);
    feed.push_samples(vec![
        completed("X", 0, Outcome::Succeeded),
        completed("Y", 60, Outcome::Failed),
        in_progress("Z"),
    ]);

    let detector = StalenessDetector::new(feed, reference("X", 0));
    let (_handle, mut rx) = StalenessMonitor::spawn(detector, Duration::from_secs(300));

    rx.changed().await.expect("first tick");
    assert_eq!(*rx.borrow(), StalenessStatus::Fresh);

    rx.changed().await.expect("second tick");
    let status = rx.borrow().clone();
    match status {
        StalenessStatus::Superseded { failure_link } => {
            assert_eq!(
                failure_link.as_deref(),
                Some("https://dev.azure.com/contoso/tools/_build/results?buildId=Y")
            );
        }
        other => panic!("expected Superseded, got {other:?}"),
    }
}
