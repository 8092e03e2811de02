//! Session state machine: all mutable debate state and its transitions.
//!
//! A [`Session`] is the aggregate root for one debate run. Every protocol
//! event is applied through [`Session::apply`], a synchronous transition
//! from (state, event) to (state, observable changes) with no I/O and no
//! timers, so the whole machine is testable without a transport.
//!
//! # Invariants
//!
//! - At most one active turn. A `turn_start` while a turn is active
//!   finalizes the prior turn as abandoned: its delta buffer is dropped and
//!   nothing is appended to the transcript. Overlap is UI staleness, not a
//!   protocol error.
//! - Deltas append in arrival order and only to the matching active turn;
//!   stale or duplicate turn IDs are a no-op.
//! - `turn_end` content is authoritative for the transcript. It is appended
//!   even when the turn no longer matches the active one (already
//!   superseded), because the backend owns finalization.
//! - Verdict confidence is clamped into [0, 1] on application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::agent::AgentRole;
use crate::protocol::types::{clamp_confidence, ServerEvent, VerdictReport};

/// Phase label before the backend announces one.
pub const IDLE_PHASE: &str = "Idle";

/// Connection status as observed by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No connection attempted yet.
    Disconnected,
    /// Transport opening, start command not yet acknowledged.
    Connecting,
    /// Transport open, events flowing.
    Connected,
    /// Transport gone: user stop, server close, or error.
    Closed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Run parameters echoed by the backend's `meta` event. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub model: String,
    pub temperature: f64,
    pub rebuttal_rounds: u32,
    pub max_tokens: Option<u32>,
}

/// The turn currently being streamed. Its `text` buffer is
/// presentation-only and is discarded on finalization or abandonment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTurn {
    pub turn_id: String,
    /// Raw agent identifier from the wire (pre-normalization).
    pub agent: String,
    /// Normalized role, if the identifier matched the closed set.
    pub role: Option<AgentRole>,
    /// Phase that was current when the turn began.
    pub phase: String,
    /// Deltas accumulated in arrival order.
    pub text: String,
}

/// A finalized turn in the transcript. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub agent: String,
    pub role: Option<AgentRole>,
    pub phase: String,
    /// Authoritative content from the `turn_end` event.
    pub content: String,
    pub completed_at: DateTime<Utc>,
}

/// Per-role presentation state: one speech bubble per role plus the
/// at-most-one speaking flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    bubbles: [String; AgentRole::COUNT],
    speaking: Option<AgentRole>,
}

impl Stage {
    /// The bubble text currently shown for a role.
    pub fn bubble(&self, role: AgentRole) -> &str {
        &self.bubbles[role.index()]
    }

    /// The role currently speaking, if any.
    pub fn speaking(&self) -> Option<AgentRole> {
        self.speaking
    }

    fn begin_turn(&mut self, role: Option<AgentRole>) {
        // A new turn silences everyone; only a recognized role gets the
        // speaking flag and a cleared bubble.
        self.speaking = role;
        if let Some(role) = role {
            self.bubbles[role.index()].clear();
        }
    }

    fn append(&mut self, role: Option<AgentRole>, delta: &str) {
        if let Some(role) = role {
            self.bubbles[role.index()].push_str(delta);
        }
    }

    fn end_turn(&mut self, role: Option<AgentRole>) {
        if role.is_some() && self.speaking == role {
            self.speaking = None;
        }
    }

    fn silence(&mut self) {
        self.speaking = None;
    }
}

/// One observable state change produced by applying an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum StateChange {
    ConnectionChanged { status: ConnectionStatus },
    MetaUpdated,
    PhaseChanged { name: String },
    TurnStarted {
        turn_id: String,
        agent: String,
        role: Option<AgentRole>,
    },
    /// A prior active turn was dropped because a new turn superseded it.
    TurnAbandoned { turn_id: String },
    /// Text appended to the active turn.
    DeltaApplied { turn_id: String, delta: String },
    /// A turn was finalized into the transcript at `entry_index`.
    TurnCompleted { agent: String, entry_index: usize },
    VerdictSet,
    /// Backend-reported error surfaced to the user. Non-fatal.
    SessionError { message: String },
    /// A frame failed to decode. The session continues.
    DecodeFailure { detail: String },
    /// Normal terminal signal (`done`).
    Finished,
}

/// The ordered list of observable changes from one applied event.
pub type StateDelta = Vec<StateChange>;

/// All mutable state for one debate run.
///
/// Owned exclusively by the connection controller's event-processing path;
/// the presentation layer reads cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub connection: ConnectionStatus,
    /// Opaque backend phase label, displayed verbatim.
    pub current_phase: String,
    pub meta: Option<SessionMeta>,
    /// At most one, by invariant.
    pub active_turn: Option<ActiveTurn>,
    /// Append-only completed turns.
    pub transcript: Vec<TranscriptEntry>,
    /// Set at most once in practice; a later verdict event replaces it.
    pub verdict: Option<VerdictReport>,
    /// Set by the `done` event. Distinct from connection closure.
    pub finished: bool,
    /// Most recent backend-reported error message.
    pub last_error: Option<String>,
    /// Per-role speech bubbles and speaking flag.
    pub stage: Stage,
    /// Count of `Unknown` events ignored. Diagnostic only.
    pub unknown_events: u64,
    /// Count of frames that failed to decode. Diagnostic only.
    pub decode_errors: u64,
}

impl Session {
    /// A fresh session: disconnected, idle phase, empty transcript.
    pub fn new() -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            current_phase: IDLE_PHASE.to_string(),
            meta: None,
            active_turn: None,
            transcript: Vec::new(),
            verdict: None,
            finished: false,
            last_error: None,
            stage: Stage::default(),
            unknown_events: 0,
            decode_errors: 0,
        }
    }

    /// Apply one decoded event. The only mutator for protocol state.
    pub fn apply(&mut self, event: ServerEvent) -> StateDelta {
        match event {
            ServerEvent::Meta {
                model,
                temperature,
                rebuttal_rounds,
                max_tokens,
            } => {
                self.meta = Some(SessionMeta {
                    model,
                    temperature,
                    rebuttal_rounds,
                    max_tokens,
                });
                vec![StateChange::MetaUpdated]
            }

            ServerEvent::Phase { name } => {
                debug!(phase = %name, "phase changed");
                self.current_phase = name.clone();
                vec![StateChange::PhaseChanged { name }]
            }

            // Reserved for a future claim-override flow.
            ServerEvent::CaseFile { .. } => Vec::new(),

            ServerEvent::TurnStart { turn_id, agent } => self.start_turn(turn_id, agent),

            ServerEvent::TurnDelta {
                turn_id, delta, ..
            } => self.apply_delta(turn_id, delta),

            ServerEvent::TurnEnd {
                turn_id,
                agent,
                content,
            } => self.end_turn(turn_id, agent, content),

            ServerEvent::Verdict { mut verdict } => {
                if self.verdict.is_some() {
                    warn!("verdict replaced by a later verdict event");
                }
                verdict.confidence = clamp_confidence(verdict.confidence);
                self.verdict = Some(verdict);
                vec![StateChange::VerdictSet]
            }

            ServerEvent::Error { message } => {
                warn!(%message, "backend reported an error");
                self.last_error = Some(message.clone());
                vec![StateChange::SessionError { message }]
            }

            ServerEvent::Done => {
                self.finished = true;
                vec![StateChange::Finished]
            }

            ServerEvent::Unknown { event_type } => {
                trace!(%event_type, "ignoring unknown event");
                self.unknown_events += 1;
                Vec::new()
            }
        }
    }

    /// Record a connection status change (controller path, not a protocol
    /// event). No-op if the status is unchanged.
    pub fn set_connection(&mut self, status: ConnectionStatus) -> StateDelta {
        if self.connection == status {
            return Vec::new();
        }
        self.connection = status;
        vec![StateChange::ConnectionChanged { status }]
    }

    /// Record a frame that failed to decode. The frame is dropped and the
    /// session continues.
    pub fn note_decode_failure(&mut self, detail: String) -> StateDelta {
        self.decode_errors += 1;
        vec![StateChange::DecodeFailure { detail }]
    }

    /// Drop the active turn and speaking flag without touching the
    /// transcript or verdict. Used by user-initiated stop, which must not
    /// be blocked by a partially finalized turn.
    pub fn clear_presentation(&mut self) {
        self.active_turn = None;
        self.stage.silence();
    }

    fn start_turn(&mut self, turn_id: String, agent: String) -> StateDelta {
        let mut changes = Vec::with_capacity(2);

        // A new turn always supersedes an unfinished one; the stale buffer
        // is dropped, never appended.
        if let Some(prior) = self.active_turn.take() {
            debug!(
                superseded = %prior.turn_id,
                by = %turn_id,
                "turn superseded before turn_end"
            );
            changes.push(StateChange::TurnAbandoned {
                turn_id: prior.turn_id,
            });
        }

        let role = AgentRole::match_prefix(&agent);
        self.stage.begin_turn(role);
        self.active_turn = Some(ActiveTurn {
            turn_id: turn_id.clone(),
            agent: agent.clone(),
            role,
            phase: self.current_phase.clone(),
            text: String::new(),
        });

        changes.push(StateChange::TurnStarted {
            turn_id,
            agent,
            role,
        });
        changes
    }

    fn apply_delta(&mut self, turn_id: String, delta: String) -> StateDelta {
        match self.active_turn.as_mut() {
            Some(turn) if turn.turn_id == turn_id => {
                turn.text.push_str(&delta);
                self.stage.append(turn.role, &delta);
                vec![StateChange::DeltaApplied { turn_id, delta }]
            }
            _ => {
                // Stale or duplicate delta for a non-active turn.
                trace!(%turn_id, "ignoring delta for non-active turn");
                Vec::new()
            }
        }
    }

    fn end_turn(&mut self, turn_id: String, agent: String, content: String) -> StateDelta {
        let role = AgentRole::match_prefix(&agent);

        // The phase recorded is the turn's start phase when we still track
        // the turn; for an already-superseded turn it falls back to the
        // current phase.
        let matches_active = self
            .active_turn
            .as_ref()
            .is_some_and(|turn| turn.turn_id == turn_id);
        let phase = if matches_active {
            self.active_turn
                .take()
                .map(|turn| turn.phase)
                .unwrap_or_else(|| self.current_phase.clone())
        } else {
            debug!(%turn_id, "turn_end for non-active turn; appending anyway");
            self.current_phase.clone()
        };

        self.stage.end_turn(role);

        // The event's content is authoritative, not the delta buffer.
        self.transcript.push(TranscriptEntry {
            agent: agent.clone(),
            role,
            phase,
            content,
            completed_at: Utc::now(),
        });

        vec![StateChange::TurnCompleted {
            agent,
            entry_index: self.transcript.len() - 1,
        }]
    }

    /// Compact status line for logs.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] phase={} | {} turns | verdict={} | finished={}",
            self.connection,
            self.current_phase,
            self.transcript.len(),
            self.verdict
                .as_ref()
                .map(|v| v.verdict.as_str())
                .unwrap_or("-"),
            self.finished,
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
