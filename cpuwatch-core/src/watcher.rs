//! Fixed-interval poll scheduler
//!
//! Drives the tick loop: once per interval it fans out one poll task per
//! configured host, runs them concurrently, and fully joins the tick
//! before computing the next sleep. A failure on one host becomes an
//! error event for that host and nothing else; other hosts' tasks and
//! the loop itself are never affected.
//!
//! Stop requests are cooperative and honored at tick boundaries only:
//! remote command execution is short relative to the interval, so there
//! is no mid-tick cancellation. On shutdown every session is closed
//! exactly once and the event channel is dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{HostSpec, WatchConfig, WatchSettings};
use crate::error::WatchResult;
use crate::event::WatchEvent;
use crate::sampler::parse_vmstat;
use crate::session::RemoteSession;
use crate::threshold::evaluate;

/// Event channel capacity. A consumer slower than this may stall a tick
/// on hand-off, which is acceptable; event loss or reordering is not.
const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Handle to request a watcher stop
///
/// The stop is observed between ticks; the current tick always completes
/// its join first.
#[derive(Debug)]
pub struct WatcherHandle {
    stop_tx: mpsc::Sender<()>,
}

impl WatcherHandle {
    /// Signals the watcher to stop after the current tick
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(()).await;
    }
}

/// Starts the poll loop.
///
/// One session per configured host is created up front (not yet
/// connected; the transport is established lazily on first use). The
/// returned receiver yields events until the watcher stops, after which
/// it is closed. `make_session` builds the per-host transport; use
/// [`crate::session::ssh_session_factory`] in production.
///
/// # Errors
///
/// Returns [`crate::error::WatchError::Config`] when the configuration
/// is invalid — an empty host list is fatal here, before the loop starts.
pub fn start_watcher<S, F>(
    config: WatchConfig,
    make_session: F,
) -> WatchResult<(WatcherHandle, mpsc::Receiver<WatchEvent>)>
where
    S: RemoteSession + 'static,
    F: Fn(&HostSpec) -> S,
{
    config.validate()?;

    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(EVENT_CHANNEL_CAPACITY);

    let mut sessions: Vec<(HostSpec, S)> = config
        .hosts
        .iter()
        .map(|spec| (spec.clone(), make_session(spec)))
        .collect();
    let settings = config.settings;
    let interval = Duration::from_secs(settings.interval_secs);

    tokio::spawn(async move {
        loop {
            let tick_start = Instant::now();

            // Fan out one task per host and fully join the tick. This is
            // a join, not a race: a slow host delays the next tick start
            // but never overlaps with its own next cycle.
            let polls = sessions
                .iter_mut()
                .map(|(spec, session)| poll_host(spec, session, &settings, &event_tx));
            futures::future::join_all(polls).await;

            // No catch-up bursts: an overrun tick starts the next one
            // immediately with zero sleep.
            let sleep_for = interval.saturating_sub(tick_start.elapsed());
            tokio::select! {
                _ = stop_rx.recv() => break,
                () = tokio::time::sleep(sleep_for) => {}
            }
        }

        for (spec, session) in &mut sessions {
            session.close().await;
            tracing::debug!(host = %spec.host, "session closed");
        }
        tracing::info!("cpu watch stopped");
    });

    Ok((WatcherHandle { stop_tx }, event_rx))
}

/// Polls every configured host once and returns the emitted events.
///
/// One-shot variant of the tick loop for `check`-style invocations:
/// sessions are created, polled concurrently, and closed before
/// returning.
///
/// # Errors
///
/// Returns [`crate::error::WatchError::Config`] when the configuration
/// is invalid.
pub async fn poll_once<S, F>(config: &WatchConfig, make_session: F) -> WatchResult<Vec<WatchEvent>>
where
    S: RemoteSession,
    F: Fn(&HostSpec) -> S,
{
    config.validate()?;

    // Capacity covers one event per host, so hand-off cannot block
    let (event_tx, mut event_rx) = mpsc::channel::<WatchEvent>(config.hosts.len());
    let mut sessions: Vec<(HostSpec, S)> = config
        .hosts
        .iter()
        .map(|spec| (spec.clone(), make_session(spec)))
        .collect();

    let polls = sessions
        .iter_mut()
        .map(|(spec, session)| poll_host(spec, session, &config.settings, &event_tx));
    futures::future::join_all(polls).await;

    for (_, session) in &mut sessions {
        session.close().await;
    }
    drop(event_tx);

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }
    Ok(events)
}

/// One host's poll cycle for one tick.
///
/// Acquire (or reuse) the session, sample, parse, evaluate, emit. Every
/// failure is converted into exactly one error event here; nothing
/// propagates past this boundary. Error events bypass the
/// `emit_only_above` policy — failures are always visible.
async fn poll_host<S: RemoteSession>(
    spec: &HostSpec,
    session: &mut S,
    settings: &WatchSettings,
    events: &mpsc::Sender<WatchEvent>,
) {
    let outcome = sample_host(spec, session, settings).await;
    let event = match outcome {
        Ok(Some(event)) => event,
        Ok(None) => return,
        Err(err) => {
            tracing::debug!(host = %spec.host, error = %err, "poll failed");
            WatchEvent::error(&spec.host, &err.to_string())
        }
    };
    if events.send(event).await.is_err() {
        tracing::debug!(host = %spec.host, "event receiver dropped");
    }
}

/// Sample → parse → evaluate for one host.
///
/// Returns `Ok(None)` when the emission policy suppresses a below-
/// threshold sample.
async fn sample_host<S: RemoteSession>(
    spec: &HostSpec,
    session: &mut S,
    settings: &WatchSettings,
) -> WatchResult<Option<WatchEvent>> {
    let output = session.run(&settings.sample_cmd).await?;
    let reading = parse_vmstat(&output)?;
    let crossing = evaluate(reading.usage(), settings.threshold, settings.emit_only_above);
    Ok(crossing.should_emit.then(|| {
        WatchEvent::sample(&spec.host, reading, settings.threshold, crossing.crossed)
    }))
}
