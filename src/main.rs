use simulation::simulate_waiters;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{
    ConnectionId, ConnectionKind, ConnectionSnapshot, Diagnostics, ErrorPhase, ResourceState,
    SubResourceStatus,
};
use tether_sdk::{
    ConnectionTracker, MemorySpecStore, RecordingNotifier, TracingUsageRecorder, TrackerConfig,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
pub mod simulation;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,tether=info")))
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    rt.block_on(async_main());
}

fn stamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

fn show(tracker: &ConnectionTracker, notifier: &RecordingNotifier, before: usize) {
    for notification in notifier.notifications().iter().skip(before) {
        let actions: Vec<&str> = notification.actions.iter().map(|a| a.label()).collect();
        println!("  [{}] notify: {} {:?}", stamp(), notification.message, actions);
    }
    println!("  [{}] settled signals so far: {}", stamp(), tracker.settled_count());
}

async fn run_scenarios() {
    let notifier = Arc::new(RecordingNotifier::new());
    let tracker = ConnectionTracker::new(
        TrackerConfig::default(),
        notifier.clone(),
        Arc::new(TracingUsageRecorder),
        Arc::new(MemorySpecStore::new()),
    );

    // Scenario A: direct connection, schema registry fails after both attempt
    println!("\n▸ Direct connection \"c1\"");
    let wait = tracker.spawn_wait(ConnectionId::new("c1"), Duration::from_secs(5));
    let attempting = ConnectionSnapshot::new("c1", ConnectionKind::Direct)
        .with_data_cluster(SubResourceStatus::Attempting)
        .with_schema_catalog(SubResourceStatus::Attempting);
    let settled = ConnectionSnapshot::new("c1", ConnectionKind::Direct)
        .with_data_cluster(SubResourceStatus::Success)
        .with_schema_catalog(ResourceState::failed(
            Diagnostics::new().with(ErrorPhase::SignIn, "bad cert"),
        ));
    for snapshot in [attempting, settled] {
        println!(
            "  [{}] ingest kafka={} schema_registry={}",
            stamp(),
            snapshot.data_cluster.status,
            snapshot.schema_catalog.status
        );
        if let Err(e) = tracker.ingest(snapshot) {
            error!(error = %e, "ingest failed");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let before = notifier.len();
    if let Ok(Some(snapshot)) = wait.join().await {
        for summary in tracker.summarize(&snapshot, SubResourceStatus::Failed).await {
            println!(
                "  [{}] failed: {} ({})",
                stamp(),
                summary.label,
                summary.reason.as_deref().unwrap_or("no reason")
            );
        }
        tracker.report_outcome(&snapshot);
    }
    show(&tracker, &notifier, before);

    // Scenario B: managed cloud auth failure
    println!("\n▸ Managed cloud connection \"ccloud\"");
    let before = notifier.len();
    if let Err(e) = tracker.ingest(
        ConnectionSnapshot::new("ccloud", ConnectionKind::ManagedCloud)
            .with_cloud_auth(SubResourceStatus::Failed),
    ) {
        error!(error = %e, "ingest failed");
    }
    tracker
        .wait_and_report(&"ccloud".into(), Duration::from_secs(5))
        .await;
    show(&tracker, &notifier, before);

    // Scenario C: local failures stay silent
    println!("\n▸ Local connection \"local\"");
    let before = notifier.len();
    if let Err(e) = tracker.ingest(
        ConnectionSnapshot::new("local", ConnectionKind::Local)
            .with_data_cluster(SubResourceStatus::Failed)
            .with_schema_catalog(SubResourceStatus::Failed),
    ) {
        error!(error = %e, "ingest failed");
    }
    tracker
        .wait_and_report(&"local".into(), Duration::from_secs(5))
        .await;
    show(&tracker, &notifier, before);

    // A connection that never reports
    println!("\n▸ Silent connection \"ghost\"");
    let outcome = tracker
        .wait_for_stable_within(&"ghost".into(), Duration::from_millis(100))
        .await;
    println!("  [{}] outcome: {:?}", stamp(), outcome.map(|s| s.id.clone()));
    show(&tracker, &notifier, notifier.len());
}

async fn async_main() {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            READINESS SCENARIOS                             ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    run_scenarios().await;
    info!("scenarios finished, starting simulations");

    let stats = simulate_waiters(10, 4, 5).await;
    stats.print();

    let stats = simulate_waiters(200, 8, 10).await;
    stats.print();

    println!("\n✓ All simulations completed!");
}
