//! Typed event vocabulary for the debate stream.
//!
//! Inbound frames carry a required `type` discriminator and decode into
//! [`ServerEvent`]. Unknown discriminators map to [`ServerEvent::Unknown`]
//! so forward-compatible extensions pass through without crashing the
//! session. The single outbound command is [`StartCommand`].

use serde::{Deserialize, Serialize};

/// Maximum rationale bullets shown by default renderers. The underlying
/// data is never truncated.
pub const MAX_RATIONALE_BULLETS: usize = 6;

/// All events the backend can emit during a debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Run parameters echoed back once, before the first phase.
    Meta {
        model: String,
        temperature: f64,
        rebuttal_rounds: u32,
        #[serde(default)]
        max_tokens: Option<u32>,
    },

    /// The debate entered a new stage. The name is an opaque backend
    /// label, displayed verbatim.
    Phase { name: String },

    /// The claim/truth pair under debate. Reserved; currently applied
    /// as a no-op, kept for a future claim-override flow.
    CaseFile {
        row_id: i64,
        truth: String,
        claim: String,
    },

    /// An agent began speaking.
    TurnStart { turn_id: String, agent: String },

    /// An incremental fragment of the active turn's text.
    TurnDelta {
        turn_id: String,
        agent: String,
        delta: String,
    },

    /// An agent finished speaking. `content` is authoritative for the
    /// transcript, independent of the deltas that preceded it.
    TurnEnd {
        turn_id: String,
        agent: String,
        content: String,
    },

    /// The Judge's final classification.
    Verdict { verdict: VerdictReport },

    /// A backend-reported error. Non-fatal; the stream continues.
    Error { message: String },

    /// Normal end of the debate. Distinct from connection closure.
    Done,

    /// An event type this client does not understand. Ignored, counted.
    #[serde(skip)]
    Unknown { event_type: String },
}

impl ServerEvent {
    /// Discriminators this client decodes into typed variants.
    pub const KNOWN_TYPES: [&'static str; 9] = [
        "meta",
        "phase",
        "case_file",
        "turn_start",
        "turn_delta",
        "turn_end",
        "verdict",
        "error",
        "done",
    ];

    /// Whether a wire discriminator maps to a typed variant.
    pub fn is_known_type(event_type: &str) -> bool {
        Self::KNOWN_TYPES.contains(&event_type)
    }

    /// The wire discriminator of this event.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Meta { .. } => "meta",
            Self::Phase { .. } => "phase",
            Self::CaseFile { .. } => "case_file",
            Self::TurnStart { .. } => "turn_start",
            Self::TurnDelta { .. } => "turn_delta",
            Self::TurnEnd { .. } => "turn_end",
            Self::Verdict { .. } => "verdict",
            Self::Error { .. } => "error",
            Self::Done => "done",
            Self::Unknown { event_type } => event_type,
        }
    }

    /// The turn ID if this event is turn-scoped.
    pub fn turn_id(&self) -> Option<&str> {
        match self {
            Self::TurnStart { turn_id, .. }
            | Self::TurnDelta { turn_id, .. }
            | Self::TurnEnd { turn_id, .. } => Some(turn_id),
            _ => None,
        }
    }

    /// The raw agent identifier if this event is turn-scoped.
    pub fn agent(&self) -> Option<&str> {
        match self {
            Self::TurnStart { agent, .. }
            | Self::TurnDelta { agent, .. }
            | Self::TurnEnd { agent, .. } => Some(agent),
            _ => None,
        }
    }
}

/// The outbound command that starts a debate. Sent exactly once per
/// session, immediately after the transport opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartCommand {
    /// Case row to debate, from the case catalog.
    pub row_id: i64,
    /// Model the backend should run the agents on.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Number of rebuttal rounds after the opening statements.
    pub rebuttal_rounds: u32,
    /// Optional per-turn token cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Optional claim text replacing the catalog row's claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_override: Option<String>,
}

/// The Judge's terminal classification of the claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictReport {
    /// Raw label as emitted by the backend, kept verbatim.
    pub verdict: String,
    /// Confidence in [0, 1]. Clamped on application to session state;
    /// use [`clamp_confidence`] when reading a report directly.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub one_sentence_summary: String,
    /// Ordered rationale bullets. Never truncated in the data model.
    #[serde(default)]
    pub rationale: Vec<String>,
    #[serde(default)]
    pub critical_differences: Vec<String>,
    #[serde(default)]
    pub what_would_make_it_faithful: Vec<String>,
}

impl VerdictReport {
    /// Parse the raw label into the closed set.
    pub fn label(&self) -> VerdictLabel {
        VerdictLabel::parse(&self.verdict)
    }

    /// Display tier for the label (unknown labels render neutrally).
    pub fn tier(&self) -> VerdictTier {
        self.label().tier()
    }

    /// Rationale bullets capped for display.
    pub fn display_rationale(&self) -> &[String] {
        let n = self.rationale.len().min(MAX_RATIONALE_BULLETS);
        &self.rationale[..n]
    }
}

/// Clamp a confidence value into [0, 1]. Infinities clamp to the nearest
/// bound; NaN maps to 0.
pub fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

/// The closed set of verdict labels, with a verbatim fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictLabel {
    Faithful,
    PartiallyFaithful,
    Mutated,
    /// A label outside the known set, kept verbatim.
    Other(String),
}

impl VerdictLabel {
    /// Parse a raw wire label.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "FAITHFUL" => Self::Faithful,
            "PARTIALLY_FAITHFUL" => Self::PartiallyFaithful,
            "MUTATED" => Self::Mutated,
            other => Self::Other(other.to_string()),
        }
    }

    /// How the label should be toned in a renderer.
    pub fn tier(&self) -> VerdictTier {
        match self {
            Self::Faithful => VerdictTier::Positive,
            Self::Mutated => VerdictTier::Negative,
            Self::PartiallyFaithful | Self::Other(_) => VerdictTier::Neutral,
        }
    }
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Faithful => write!(f, "FAITHFUL"),
            Self::PartiallyFaithful => write!(f, "PARTIALLY_FAITHFUL"),
            Self::Mutated => write!(f, "MUTATED"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Display tone for a verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictTier {
    Positive,
    Neutral,
    Negative,
}
