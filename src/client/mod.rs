//! Connection controller: owns the lifecycle of one debate connection.
//!
//! [`DebateClient`] is a handle over a background transport loop. `start`
//! opens the connection, sends the encoded start command exactly once, and
//! then processes inbound frames one at a time to completion: decode →
//! apply to the [`Session`] → notify the presentation boundary. The loop
//! task exclusively owns the session; readers get cloned snapshots over a
//! `watch` channel and incremental [`StateDelta`]s over a bounded channel.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start()──▶ Connecting ──transport open──▶ Open
//!                       │                            │
//!                       │ connect error      server close / error / done+close
//!                       ▼                            ▼
//!                    Closed ◀──────── stop() ── Closing
//! ```
//!
//! `stop()` is synchronous and idempotent: safe from any state, including
//! before any connection exists. Frames still in flight after `stop()` are
//! discarded, never applied.

pub mod transport;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::protocol::codec::{self, EncodeError};
use crate::protocol::types::StartCommand;
use crate::session::{ConnectionStatus, Session, StateDelta};

use transport::{Connector, Transport};

/// Capacity of the bounded delta channel. When the consumer lags, deltas
/// are dropped with a warning; snapshots always carry the full state.
const DELTA_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle state of the controller itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControllerState {
    Idle = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
    Closed = 4,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

fn load_state(cell: &AtomicU8) -> ControllerState {
    match cell.load(Ordering::Acquire) {
        0 => ControllerState::Idle,
        1 => ControllerState::Connecting,
        2 => ControllerState::Open,
        3 => ControllerState::Closing,
        _ => ControllerState::Closed,
    }
}

fn store_state(cell: &AtomicU8, state: ControllerState) {
    cell.store(state as u8, Ordering::Release);
}

/// Error starting a session.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Handle over the background transport loop for one debate backend.
///
/// One client runs at most one session at a time; `start` while a session
/// is active is a logged no-op.
pub struct DebateClient<C: Connector> {
    connector: Arc<C>,
    state: Arc<AtomicU8>,
    session_tx: Arc<watch::Sender<Session>>,
    session_rx: watch::Receiver<Session>,
    delta_tx: mpsc::Sender<StateDelta>,
    /// Per-run shutdown signal; consumed by `stop`.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Per-run discard flag; frames seen after `stop` are never applied.
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl<C: Connector> DebateClient<C> {
    /// Create a client and the delta receiver for the presentation layer.
    pub fn new(connector: C) -> (Self, mpsc::Receiver<StateDelta>) {
        let (session_tx, session_rx) = watch::channel(Session::new());
        let (delta_tx, delta_rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);

        let client = Self {
            connector: Arc::new(connector),
            state: Arc::new(AtomicU8::new(ControllerState::Idle as u8)),
            session_tx: Arc::new(session_tx),
            session_rx,
            delta_tx,
            shutdown_tx: None,
            stopped: Arc::new(AtomicBool::new(true)),
            task: None,
        };
        (client, delta_rx)
    }

    /// Start a debate session.
    ///
    /// Valid only from `Idle` or `Closed`; otherwise the call is a logged
    /// no-op, enforcing a single active session. The command is validated
    /// and encoded before any connection is opened.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] when the command fails validation.
    pub fn start(&mut self, command: StartCommand) -> Result<(), ClientError> {
        let state = load_state(&self.state);
        if !matches!(state, ControllerState::Idle | ControllerState::Closed) {
            warn!(%state, "start ignored; a session is already active");
            return Ok(());
        }

        // Fail fast on an invalid command, before touching the transport.
        let frame = codec::encode(&command)?;

        // A prior run's loop may still be winding down after stop; it must
        // not publish over the new session.
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let mut session = Session::new();
        store_state(&self.state, ControllerState::Connecting);
        let delta = session.set_connection(ConnectionStatus::Connecting);
        publish(&self.session_tx, &self.delta_tx, &session, delta);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let stopped = Arc::new(AtomicBool::new(false));
        self.shutdown_tx = Some(shutdown_tx);
        self.stopped = Arc::clone(&stopped);

        let task = tokio::spawn(run_loop(
            Arc::clone(&self.connector),
            frame,
            session,
            Arc::clone(&self.state),
            Arc::clone(&self.session_tx),
            self.delta_tx.clone(),
            stopped,
            shutdown_rx,
        ));
        self.task = Some(task);
        Ok(())
    }

    /// Stop the session. Synchronous and idempotent: safe to call from any
    /// state, including when no connection was ever opened or after a
    /// prior `stop`. Clears the active-turn/speaking presentation state;
    /// the transcript and verdict stay intact for inspection. The
    /// transport close is fire-and-forget.
    pub fn stop(&mut self) {
        let prior = load_state(&self.state);
        debug!(state = %prior, "stop requested");

        self.stopped.store(true, Ordering::SeqCst);
        store_state(&self.state, ControllerState::Closing);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let mut delta = StateDelta::new();
        self.session_tx.send_modify(|session| {
            session.clear_presentation();
            delta = session.set_connection(ConnectionStatus::Closed);
        });
        store_state(&self.state, ControllerState::Closed);

        if !delta.is_empty() {
            let _ = self.delta_tx.try_send(delta);
        }
    }

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        load_state(&self.state)
    }

    /// A cloned snapshot of the session state.
    pub fn snapshot(&self) -> Session {
        self.session_rx.borrow().clone()
    }

    /// Subscribe to session snapshots, updated after every applied frame.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session_tx.subscribe()
    }
}

impl<C: Connector> Drop for DebateClient<C> {
    fn drop(&mut self) {
        // Drop is synchronous; aborting the loop task is the only safe way
        // to release the transport here.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Publish a snapshot and, when non-empty, the delta. Deltas are dropped
/// (with a warning) rather than blocking the frame-processing path.
fn publish(
    session_tx: &watch::Sender<Session>,
    delta_tx: &mpsc::Sender<StateDelta>,
    session: &Session,
    delta: StateDelta,
) {
    session_tx.send_replace(session.clone());
    if delta.is_empty() {
        return;
    }
    match delta_tx.try_send(delta) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("delta channel full; dropping delta");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            trace!("delta receiver dropped");
        }
    }
}

/// Background loop: open, send the start command once, then process frames
/// in arrival order until the transport ends or `stop` is signalled.
#[allow(clippy::too_many_arguments)]
async fn run_loop<C: Connector>(
    connector: Arc<C>,
    start_frame: String,
    mut session: Session,
    state: Arc<AtomicU8>,
    session_tx: Arc<watch::Sender<Session>>,
    delta_tx: mpsc::Sender<StateDelta>,
    stopped: Arc<AtomicBool>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut transport = match connector.connect().await {
        Ok(transport) => transport,
        Err(err) => {
            error!(%err, "failed to open connection");
            close_session(&state, &session_tx, &delta_tx, &mut session, &stopped);
            return;
        }
    };

    // Stop may have landed while the transport was connecting. It already
    // published Closed; the start command must not go out.
    if stopped.load(Ordering::SeqCst) {
        debug!("stopped while connecting; discarding transport");
        transport.close().await;
        return;
    }

    // The start command is sent exactly once, on transport-open.
    if let Err(err) = transport.send(start_frame).await {
        error!(%err, "failed to send start command");
        transport.close().await;
        close_session(&state, &session_tx, &delta_tx, &mut session, &stopped);
        return;
    }

    if stopped.load(Ordering::SeqCst) {
        debug!("stopped during handshake; closing transport");
        transport.close().await;
        return;
    }

    store_state(&state, ControllerState::Open);
    let delta = session.set_connection(ConnectionStatus::Connected);
    publish(&session_tx, &delta_tx, &session, delta);

    loop {
        tokio::select! {
            // User-initiated stop: close the transport; close_session
            // below re-asserts Closed over anything the loop published
            // after stop's own publish.
            _ = &mut shutdown_rx => {
                debug!("stop requested; closing transport");
                transport.close().await;
                break;
            }

            frame = transport.recv() => match frame {
                Some(Ok(text)) => {
                    // In-flight frames after stop are discarded silently.
                    if stopped.load(Ordering::SeqCst) {
                        continue;
                    }
                    match codec::decode(&text) {
                        Ok(event) => {
                            trace!(event_type = %event.event_type(), "applying event");
                            let delta = session.apply(event);
                            publish(&session_tx, &delta_tx, &session, delta);
                        }
                        Err(err) => {
                            warn!(%err, "dropping undecodable frame");
                            let delta = session.note_decode_failure(err.to_string());
                            publish(&session_tx, &delta_tx, &session, delta);
                        }
                    }
                }
                Some(Err(err)) => {
                    error!(%err, "transport error");
                    break;
                }
                None => {
                    debug!("connection closed by server");
                    break;
                }
            }
        }
    }

    // User stop, server-side close, or transport error. Completed turns
    // and verdict stay visible.
    close_session(&state, &session_tx, &delta_tx, &mut session, &stopped);
}

fn close_session(
    state: &AtomicU8,
    session_tx: &watch::Sender<Session>,
    delta_tx: &mpsc::Sender<StateDelta>,
    session: &mut Session,
    stopped: &AtomicBool,
) {
    // After a stop, match its published shape: presentation cleared,
    // transcript and verdict intact. The publish below then re-asserts
    // Closed over any snapshot the loop raced in after stop's own.
    if stopped.load(Ordering::SeqCst) {
        session.clear_presentation();
    }
    store_state(state, ControllerState::Closed);
    let delta = session.set_connection(ConnectionStatus::Closed);
    publish(session_tx, delta_tx, session, delta);
    debug!(status = %session.status_line(), "session closed");
}

#[cfg(test)]
mod tests {
    use super::transport::{Connector, Transport, TransportError};
    use super::*;
    use crate::session::StateChange;

    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Scripted transport: serves queued frames, then any gated frames
    /// (released one per [`Notify`] permit), then either reports a clean
    /// server close or hangs until the controller closes it.
    struct ScriptedTransport {
        frames: VecDeque<String>,
        gated_frames: VecDeque<String>,
        gate: Arc<Notify>,
        hang_when_drained: bool,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&mut self, text: String) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String, TransportError>> {
            if let Some(frame) = self.frames.pop_front() {
                return Some(Ok(frame));
            }
            if !self.gated_frames.is_empty() {
                self.gate.notified().await;
                return self.gated_frames.pop_front().map(Ok);
            }
            if self.hang_when_drained {
                std::future::pending().await
            } else {
                None
            }
        }

        async fn close(&mut self) {}
    }

    struct ScriptedConnector {
        frames: Vec<String>,
        gated_frames: Vec<String>,
        gate: Arc<Notify>,
        hang_when_drained: bool,
        fail_connect: bool,
        connect_delay: Option<Duration>,
        sent: Arc<Mutex<Vec<String>>>,
        connects: AtomicUsize,
    }

    impl ScriptedConnector {
        fn new(frames: &[&str]) -> Self {
            Self {
                frames: frames.iter().map(|s| s.to_string()).collect(),
                gated_frames: Vec::new(),
                gate: Arc::new(Notify::new()),
                hang_when_drained: false,
                fail_connect: false,
                connect_delay: None,
                sent: Arc::new(Mutex::new(Vec::new())),
                connects: AtomicUsize::new(0),
            }
        }

        fn hanging(frames: &[&str]) -> Self {
            let mut connector = Self::new(frames);
            connector.hang_when_drained = true;
            connector
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        type Conn = ScriptedTransport;

        async fn connect(&self) -> Result<ScriptedTransport, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.connect_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_connect {
                return Err(TransportError::InvalidUrl("scripted failure".into()));
            }
            Ok(ScriptedTransport {
                frames: self.frames.iter().cloned().collect(),
                gated_frames: self.gated_frames.iter().cloned().collect(),
                gate: Arc::clone(&self.gate),
                hang_when_drained: self.hang_when_drained,
                sent: Arc::clone(&self.sent),
            })
        }
    }

    fn start_command() -> StartCommand {
        StartCommand {
            row_id: 4,
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            rebuttal_rounds: 1,
            max_tokens: None,
            claim_override: None,
        }
    }

    /// Drain deltas until the connection reports Closed.
    async fn drain_until_closed(deltas: &mut mpsc::Receiver<StateDelta>) -> Vec<StateChange> {
        let mut seen = Vec::new();
        let deadline = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(delta) = deltas.recv().await {
                let closed = delta.iter().any(|change| {
                    matches!(
                        change,
                        StateChange::ConnectionChanged {
                            status: ConnectionStatus::Closed
                        }
                    )
                });
                seen.extend(delta);
                if closed {
                    break;
                }
            }
        });
        deadline.await.expect("session did not close in time");
        seen
    }

    #[tokio::test]
    async fn test_full_scripted_debate() {
        let connector = ScriptedConnector::new(&[
            r#"{"type":"meta","model":"gpt-4o-mini","temperature":0.2,"rebuttal_rounds":1}"#,
            r#"{"type":"phase","name":"Opening statements"}"#,
            r#"{"type":"turn_start","turn_id":"t1","agent":"Advocate"}"#,
            r#"{"type":"turn_delta","turn_id":"t1","agent":"Advocate","delta":"Hello "}"#,
            r#"{"type":"turn_delta","turn_id":"t1","agent":"Advocate","delta":"world"}"#,
            r#"{"type":"turn_end","turn_id":"t1","agent":"Advocate","content":"Hello world"}"#,
            r#"{"type":"verdict","verdict":{"verdict":"FAITHFUL","confidence":0.92,
                "one_sentence_summary":"ok","rationale":["matches"]}}"#,
            r#"{"type":"done"}"#,
        ]);
        let sent = Arc::clone(&connector.sent);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();

        let changes = drain_until_closed(&mut deltas).await;
        assert!(changes.contains(&StateChange::Finished));

        let session = client.snapshot();
        assert_eq!(client.state(), ControllerState::Closed);
        assert_eq!(session.connection, ConnectionStatus::Closed);
        assert!(session.finished);
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0].content, "Hello world");
        assert_eq!(session.verdict.as_ref().unwrap().confidence, 0.92);

        // Exactly one outbound frame: the start command.
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains(r#""action":"start""#));
        assert!(sent[0].contains(r#""row_id":4"#));
    }

    #[tokio::test]
    async fn test_start_while_open_is_noop() {
        let connector =
            ScriptedConnector::hanging(&[r#"{"type":"phase","name":"Opening statements"}"#]);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();

        // Wait until the session is demonstrably open and streaming.
        let phase_seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(delta) = deltas.recv().await {
                if delta
                    .iter()
                    .any(|c| matches!(c, StateChange::PhaseChanged { .. }))
                {
                    break;
                }
            }
        });
        phase_seen.await.expect("phase never arrived");
        assert_eq!(client.state(), ControllerState::Open);

        // Second start is rejected without disturbing the session.
        client.start(start_command()).unwrap();
        assert_eq!(client.state(), ControllerState::Open);
        assert_eq!(client.snapshot().current_phase, "Opening statements");
        assert_eq!(client.connector.connects.load(Ordering::SeqCst), 1);

        client.stop();
        assert_eq!(client.state(), ControllerState::Closed);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_without_connection() {
        let (mut client, _deltas) = DebateClient::new(ScriptedConnector::new(&[]));

        client.stop();
        client.stop();

        assert_eq!(client.state(), ControllerState::Closed);
        assert_eq!(client.snapshot().connection, ConnectionStatus::Closed);
        assert_eq!(client.connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_clears_presentation_mid_turn() {
        let connector = ScriptedConnector::hanging(&[
            r#"{"type":"phase","name":"Opening statements"}"#,
            r#"{"type":"turn_start","turn_id":"t1","agent":"Skeptic"}"#,
            r#"{"type":"turn_delta","turn_id":"t1","agent":"Skeptic","delta":"mid-sentence"}"#,
        ]);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();

        let delta_seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(delta) = deltas.recv().await {
                if delta
                    .iter()
                    .any(|c| matches!(c, StateChange::DeltaApplied { .. }))
                {
                    break;
                }
            }
        });
        delta_seen.await.expect("delta never arrived");

        client.stop();

        let session = client.snapshot();
        assert_eq!(session.connection, ConnectionStatus::Closed);
        assert!(session.active_turn.is_none());
        assert_eq!(session.stage.speaking(), None);
        // Phase survives; only the presentation flags are reset.
        assert_eq!(session.current_phase, "Opening statements");
    }

    #[tokio::test]
    async fn test_stop_during_slow_connect_leaves_closed() {
        let mut connector =
            ScriptedConnector::hanging(&[r#"{"type":"phase","name":"Opening statements"}"#]);
        connector.connect_delay = Some(Duration::from_millis(100));
        let sent = Arc::clone(&connector.sent);

        let (mut client, _deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();
        // Stop lands while the transport is still connecting.
        client.stop();

        // Let the connect finish and the loop observe the stop.
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(client.state(), ControllerState::Closed, "state after stop");
        let session = client.snapshot();
        assert_eq!(session.connection, ConnectionStatus::Closed);
        assert!(session.active_turn.is_none());
        // The start command never went out on the discarded transport.
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frame_released_after_stop_is_discarded() {
        let mut connector =
            ScriptedConnector::hanging(&[r#"{"type":"phase","name":"Opening statements"}"#]);
        connector.gated_frames = vec![r#"{"type":"phase","name":"Verdict"}"#.to_string()];
        let gate = Arc::clone(&connector.gate);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();

        // Wait for the first phase, so the loop is demonstrably streaming.
        let phase_seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(delta) = deltas.recv().await {
                if delta
                    .iter()
                    .any(|c| matches!(c, StateChange::PhaseChanged { .. }))
                {
                    break;
                }
            }
        });
        phase_seen.await.expect("phase never arrived");

        client.stop();
        // Release the held-back frame only now. It must not touch the
        // session, whether it loses to the shutdown signal or is received
        // and discarded.
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(client.state(), ControllerState::Closed);
        let session = client.snapshot();
        assert_eq!(session.connection, ConnectionStatus::Closed);
        assert_eq!(session.current_phase, "Opening statements");
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_dropped_not_fatal() {
        let connector = ScriptedConnector::new(&[
            "not json at all",
            r#"{"type":"phase","name":"Verdict"}"#,
        ]);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();
        drain_until_closed(&mut deltas).await;

        let session = client.snapshot();
        assert_eq!(session.decode_errors, 1);
        assert_eq!(session.current_phase, "Verdict");
    }

    #[tokio::test]
    async fn test_connect_failure_closes_cleanly() {
        let mut connector = ScriptedConnector::new(&[]);
        connector.fail_connect = true;

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();
        drain_until_closed(&mut deltas).await;

        assert_eq!(client.state(), ControllerState::Closed);
        assert_eq!(client.snapshot().connection, ConnectionStatus::Closed);
    }

    #[tokio::test]
    async fn test_restart_after_close_runs_fresh_session() {
        let connector = ScriptedConnector::new(&[
            r#"{"type":"phase","name":"Opening statements"}"#,
            r#"{"type":"turn_start","turn_id":"t1","agent":"Advocate"}"#,
            r#"{"type":"turn_end","turn_id":"t1","agent":"Advocate","content":"first run"}"#,
        ]);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();
        drain_until_closed(&mut deltas).await;
        assert_eq!(client.snapshot().transcript.len(), 1);

        // A new run from Closed starts with a clean session.
        client.start(start_command()).unwrap();
        drain_until_closed(&mut deltas).await;

        let session = client.snapshot();
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0].content, "first run");
        assert_eq!(client.connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_restart_immediately_after_stop() {
        let connector =
            ScriptedConnector::hanging(&[r#"{"type":"phase","name":"Opening statements"}"#]);

        let (mut client, mut deltas) = DebateClient::new(connector);
        client.start(start_command()).unwrap();
        client.stop();
        // The stopped run must not publish over the fresh session.
        client.start(start_command()).unwrap();

        let phase_seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(delta) = deltas.recv().await {
                if delta
                    .iter()
                    .any(|c| matches!(c, StateChange::PhaseChanged { .. }))
                {
                    break;
                }
            }
        });
        phase_seen.await.expect("phase never arrived");

        assert_eq!(client.state(), ControllerState::Open);
        let session = client.snapshot();
        assert_eq!(session.connection, ConnectionStatus::Connected);
        assert_eq!(session.current_phase, "Opening statements");

        client.stop();
        assert_eq!(client.state(), ControllerState::Closed);
    }

    #[tokio::test]
    async fn test_invalid_command_rejected_before_connecting() {
        let (mut client, _deltas) = DebateClient::new(ScriptedConnector::new(&[]));
        let mut command = start_command();
        command.temperature = f64::INFINITY;

        let err = client.start(command).unwrap_err();
        assert!(matches!(err, ClientError::Encode(_)));
        assert_eq!(client.state(), ControllerState::Idle);
        assert_eq!(client.connector.connects.load(Ordering::SeqCst), 0);
    }
}
