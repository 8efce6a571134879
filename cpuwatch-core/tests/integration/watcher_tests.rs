//! Scheduler tests against a mock remote session
//!
//! Timing-sensitive tests run with paused tokio time, so sleeps advance
//! deterministically and the assertions are exact up to a small
//! tolerance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpuwatch_core::config::{HostSpec, WatchConfig};
use cpuwatch_core::error::{WatchError, WatchResult};
use cpuwatch_core::event::WatchEvent;
use cpuwatch_core::session::RemoteSession;
use cpuwatch_core::watcher::{poll_once, start_watcher};
use tokio::time::Instant;

/// Scripted behavior for one mock host
#[derive(Debug, Clone)]
struct Behavior {
    /// Output line on success, or an error message on failure
    output: Result<String, String>,
    /// Simulated remote command latency
    delay: Duration,
}

impl Behavior {
    fn ok(line: &str) -> Self {
        Self {
            output: Ok(line.to_string()),
            delay: Duration::ZERO,
        }
    }

    fn unreachable(msg: &str) -> Self {
        Self {
            output: Err(msg.to_string()),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Shared close-count ledger, keyed by host
type CloseCounts = Arc<Mutex<HashMap<String, usize>>>;

struct MockSession {
    host: String,
    behavior: Behavior,
    closes: CloseCounts,
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn connect(&mut self) -> WatchResult<()> {
        Ok(())
    }

    async fn run(&mut self, _command: &str) -> WatchResult<String> {
        tokio::time::sleep(self.behavior.delay).await;
        match &self.behavior.output {
            Ok(line) => Ok(line.clone()),
            Err(msg) => Err(WatchError::Connect(msg.clone())),
        }
    }

    async fn close(&mut self) {
        *self.closes.lock().unwrap().entry(self.host.clone()).or_insert(0) += 1;
    }
}

/// Builds a factory returning scripted sessions per host
fn mock_factory(
    behaviors: HashMap<String, Behavior>,
    closes: CloseCounts,
) -> impl Fn(&HostSpec) -> MockSession {
    move |spec: &HostSpec| MockSession {
        host: spec.host.clone(),
        behavior: behaviors
            .get(&spec.host)
            .cloned()
            .unwrap_or_else(|| Behavior::unreachable("no behavior scripted")),
        closes: Arc::clone(&closes),
    }
}

fn config_for(hosts: &[&str], interval_secs: u64) -> WatchConfig {
    let mut config = WatchConfig::default();
    config.hosts = hosts.iter().map(|h| HostSpec::new(*h)).collect();
    config.settings.interval_secs = interval_secs;
    config
}

/// A sample line computing to 20% usage (12 + 3 + 5)
const LOW_LINE: &str = "   12.0   3.0   80.0   5.0";

/// A sample line computing to 95% usage (62 + 31 + 2)
const HIGH_LINE: &str = " 62.0 31.0 5.0 2.0";

#[tokio::test]
async fn test_empty_host_list_is_fatal_before_loop() {
    let closes: CloseCounts = Arc::default();
    let result = start_watcher(
        WatchConfig::default(),
        mock_factory(HashMap::new(), closes),
    );
    assert!(matches!(result, Err(WatchError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_one_failing_host_never_affects_the_others() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([
        ("h1".to_string(), Behavior::ok(LOW_LINE)),
        ("h2".to_string(), Behavior::ok(HIGH_LINE)),
        ("h3".to_string(), Behavior::unreachable("No route to host")),
    ]);
    let config = config_for(&["h1", "h2", "h3"], 10);
    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    // A full tick emits exactly one event per host
    let mut tick: Vec<WatchEvent> = Vec::new();
    for _ in 0..3 {
        tick.push(events.recv().await.unwrap());
    }
    assert_eq!(tick.iter().filter(|e| e.is_error()).count(), 1);
    assert_eq!(
        tick.iter().find(|e| e.is_error()).unwrap().host(),
        "h3"
    );

    // The loop keeps going: the next tick produces another full set
    for _ in 0..3 {
        assert!(events.recv().await.is_some());
    }

    handle.stop().await;
    while events.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn test_error_events_bypass_emit_only_above() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([
        ("quiet".to_string(), Behavior::ok(LOW_LINE)),
        ("down".to_string(), Behavior::unreachable("timed out")),
    ]);
    let mut config = config_for(&["quiet", "down"], 10);
    config.settings.emit_only_above = true;

    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    // Only the error comes through; the below-threshold sample is
    // suppressed by policy
    let event = events.recv().await.unwrap();
    assert!(event.is_error());
    assert_eq!(event.host(), "down");

    let event = events.recv().await.unwrap();
    assert!(event.is_error());
    assert_eq!(event.host(), "down");

    handle.stop().await;
    while events.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn test_tick_interval_accounts_for_elapsed_time() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([(
        "h1".to_string(),
        Behavior::ok(LOW_LINE).with_delay(Duration::from_secs(3)),
    )]);
    let config = config_for(&["h1"], 10);
    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    let start = Instant::now();
    events.recv().await.unwrap();
    let first = start.elapsed();
    events.recv().await.unwrap();
    let second = start.elapsed();

    // Tick 1 joins at ~3s; the scheduler then sleeps the remaining ~7s
    // so tick 2's event lands at ~13s
    let tolerance = Duration::from_millis(100);
    assert!(first >= Duration::from_secs(3) && first < Duration::from_secs(3) + tolerance);
    assert!(second >= Duration::from_secs(13) && second < Duration::from_secs(13) + tolerance);

    handle.stop().await;
    while events.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn test_overrun_tick_starts_next_immediately() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([(
        "h1".to_string(),
        Behavior::ok(LOW_LINE).with_delay(Duration::from_secs(12)),
    )]);
    let config = config_for(&["h1"], 10);
    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    let start = Instant::now();
    events.recv().await.unwrap();
    let first = start.elapsed();
    events.recv().await.unwrap();
    let second = start.elapsed();

    // 12s join exceeds the 10s interval: zero sleep, no catch-up burst
    let tolerance = Duration::from_millis(100);
    assert!(first >= Duration::from_secs(12) && first < Duration::from_secs(12) + tolerance);
    assert!(second >= Duration::from_secs(24) && second < Duration::from_secs(24) + tolerance);

    handle.stop().await;
    while events.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_every_session_exactly_once() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([
        ("h1".to_string(), Behavior::ok(LOW_LINE)),
        ("h2".to_string(), Behavior::ok(HIGH_LINE)),
    ]);
    let config = config_for(&["h1", "h2"], 10);
    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    for _ in 0..2 {
        events.recv().await.unwrap();
    }
    handle.stop().await;
    handle.stop().await; // a second stop request is harmless

    // Channel closes only after the loop exits and sessions are cleaned up
    while events.recv().await.is_some() {}

    let counts = closes.lock().unwrap();
    assert_eq!(counts.get("h1"), Some(&1));
    assert_eq!(counts.get("h2"), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn test_sample_event_end_to_end() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([("h1".to_string(), Behavior::ok(LOW_LINE))]);
    let config = config_for(&["h1"], 1);
    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    let event = events.recv().await.unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["host"], "h1");
    assert!((json["cpu"]["percent"].as_f64().unwrap() - 20.0).abs() < f64::EPSILON);
    assert_eq!(json["crossed"], false);
    assert_eq!(json["source"], "aix_cpu_watch");

    handle.stop().await;
    while events.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn test_error_event_end_to_end() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([(
        "h1".to_string(),
        Behavior::unreachable("No route to host"),
    )]);
    let config = config_for(&["h1"], 1);
    let (handle, mut events) =
        start_watcher(config, mock_factory(behaviors, Arc::clone(&closes))).unwrap();

    let event = events.recv().await.unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["host"], "h1");
    assert_eq!(json["severity"], "error");
    assert!(json["error"].as_str().unwrap().contains("No route to host"));
    assert!(json.get("cpu").is_none());

    handle.stop().await;
    while events.recv().await.is_some() {}
}

#[tokio::test]
async fn test_poll_once_returns_one_event_per_host_and_closes() {
    let closes: CloseCounts = Arc::default();
    let behaviors = HashMap::from([
        ("h1".to_string(), Behavior::ok(HIGH_LINE)),
        ("h2".to_string(), Behavior::unreachable("refused")),
    ]);
    let config = config_for(&["h1", "h2"], 10);

    let events = poll_once(&config, mock_factory(behaviors, Arc::clone(&closes)))
        .await
        .unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events.iter().filter(|e| e.is_error()).count(), 1);

    let counts = closes.lock().unwrap();
    assert_eq!(counts.get("h1"), Some(&1));
    assert_eq!(counts.get("h2"), Some(&1));
}
