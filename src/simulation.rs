use async_stream::stream;
use futures::stream::Stream;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_core::{
    ConnectionId, ConnectionKind, ConnectionSnapshot, Diagnostics, ErrorPhase, ResourceState,
    SubResourceStatus,
};
use tracing::info;
use tether_sdk::{
    encode_event, ConnectionEvent, ConnectionTracker, EventAction, MemorySpecStore,
    RecordingNotifier, RecordingUsageRecorder, TrackerConfigBuilder,
};

/// Statistics collected during a simulation run
#[derive(Clone, Debug)]
pub struct SimulationStats {
    pub num_connections: usize,
    pub waiters_per_connection: usize,
    pub events_sent: u64,
    pub events_dropped: u64,
    pub resolved: usize,
    pub timed_out: usize,
    pub settled: u64,
    pub notifications: usize,
    pub total_time: Duration,
}

impl SimulationStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Simulation Statistics                         ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Connections:               {:>30} ║", self.num_connections);
        println!("║  Waiters per Connection:    {:>30} ║", self.waiters_per_connection);
        println!("║  Events Sent:               {:>30} ║", self.events_sent);
        println!("║  Events Dropped:            {:>30} ║", self.events_dropped);
        println!("║  Waits Resolved:            {:>30} ║", self.resolved);
        println!("║  Waits Timed Out:           {:>30} ║", self.timed_out);
        println!("║  Settled Signals:           {:>30} ║", self.settled);
        println!("║  Failure Notifications:     {:>30} ║", self.notifications);
        println!("║  Total Time:                {:>29}s ║", format!("{:.3}", self.total_time.as_secs_f64()));
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn random_terminal(rng: &mut StdRng) -> ResourceState {
    match rng.gen_range(0..4) {
        0 => ResourceState::failed(Diagnostics::new().with(ErrorPhase::SignIn, "authentication failed")),
        1 => ResourceState::new(SubResourceStatus::NotApplicable),
        _ => ResourceState::new(SubResourceStatus::Success),
    }
}

/// Per-connection event histories: some transitional snapshots followed by
/// one stable snapshot.
fn connection_histories(rng: &mut StdRng, ids: &[ConnectionId], max_transitions: usize) -> Vec<Vec<String>> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let name = format!("Cluster {}", i);
            let mut history = Vec::new();

            for step in 0..rng.gen_range(1..=max_transitions) {
                let action = if step == 0 { EventAction::Created } else { EventAction::Updated };
                let snapshot = ConnectionSnapshot::new(id.clone(), ConnectionKind::Direct)
                    .with_name(name.clone())
                    .with_data_cluster(SubResourceStatus::Attempting)
                    .with_schema_catalog(if rng.gen_bool(0.5) {
                        SubResourceStatus::None
                    } else {
                        SubResourceStatus::Attempting
                    });
                if let Ok(raw) = encode_event(&ConnectionEvent::new(action, snapshot)) {
                    history.push(raw);
                }
            }

            let stable = ConnectionSnapshot::new(id.clone(), ConnectionKind::Direct)
                .with_name(name)
                .with_data_cluster(random_terminal(rng))
                .with_schema_catalog(random_terminal(rng));
            if let Ok(raw) = encode_event(&ConnectionEvent::new(EventAction::Updated, stable)) {
                history.push(raw);
            }
            history
        })
        .collect()
}

/// Generator that interleaves the histories the way an external process
/// juggling many connections would, keeping per-connection order and
/// sprinkling in undecodable messages.
fn sidecar_stream(mut histories: Vec<Vec<String>>, seed: u64) -> impl Stream<Item = String> {
    stream! {
        let mut rng = StdRng::seed_from_u64(seed);
        for history in histories.iter_mut() {
            history.reverse();
        }
        loop {
            let pending: Vec<usize> = (0..histories.len())
                .filter(|i| !histories[*i].is_empty())
                .collect();
            if pending.is_empty() {
                break;
            }
            let pick = pending[rng.gen_range(0..pending.len())];
            if rng.gen_bool(0.05) {
                yield "{\"action\":\"UPDATED\",\"connection\":".to_string();
            }
            if let Some(raw) = histories[pick].pop() {
                yield raw;
            }
            tokio::time::sleep(Duration::from_micros(rng.gen_range(0..500))).await;
        }
    }
}

/// Many concurrent waiters across many connections, fed by a simulated
/// external process.
pub async fn simulate_waiters(
    num_connections: usize,
    waiters_per_connection: usize,
    max_transitions: usize,
) -> SimulationStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Concurrent Waiter Simulation                        ║");
    println!("║  Connections: {} | Waiters/Connection: {} | Transitions: ≤{} ║",
             num_connections, waiters_per_connection, max_transitions);
    println!("╚════════════════════════════════════════════════════════════╝");

    let start = Instant::now();
    let notifier = Arc::new(RecordingNotifier::new());
    let tracker = Arc::new(ConnectionTracker::new(
        TrackerConfigBuilder::new().default_timeout(10_000).build(),
        notifier.clone(),
        Arc::new(RecordingUsageRecorder::new()),
        Arc::new(MemorySpecStore::new()),
    ));

    let ids: Vec<ConnectionId> = (0..num_connections)
        .map(|_| ConnectionId::generate_direct())
        .collect();

    info!(connections = num_connections, "phase 1/2: starting waiters before any event arrives");
    let mut waits = Vec::with_capacity(num_connections * waiters_per_connection);
    for id in &ids {
        for _ in 0..waiters_per_connection {
            let tracker = tracker.clone();
            let id = id.clone();
            waits.push(tokio::spawn(async move {
                tracker
                    .wait_and_report(&id, tracker.config().default_timeout())
                    .await
            }));
        }
    }

    info!("phase 2/2: streaming connection events");
    let mut rng = StdRng::from_entropy();
    let histories = connection_histories(&mut rng, &ids, max_transitions);
    let dispatch = tracker
        .dispatcher()
        .run_stream(sidecar_stream(histories, rng.gen()))
        .await;

    info!(?dispatch, "event stream drained");

    let mut resolved = 0;
    let mut timed_out = 0;
    for outcome in futures::future::join_all(waits).await {
        match outcome {
            Ok(Some(_)) => resolved += 1,
            _ => timed_out += 1,
        }
    }

    SimulationStats {
        num_connections,
        waiters_per_connection,
        events_sent: dispatch.received,
        events_dropped: dispatch.dropped,
        resolved,
        timed_out,
        settled: tracker.settled_count(),
        notifications: notifier.len(),
        total_time: start.elapsed(),
    }
}
