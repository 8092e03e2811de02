//! Debate participant roles and wire-name normalization.
//!
//! The backend labels turns with free-form agent identifiers that may carry
//! a round suffix (`"Advocate (rebuttal 2)"`). Rendering keys off the base
//! role, so incoming identifiers are normalized by a stable longest-prefix
//! match against the closed role set. Identifiers that match no role fall
//! back to the raw string: unknown agents are displayable, never an error.

use serde::{Deserialize, Serialize};

/// The closed set of debate participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Argues the claim is faithful to the truth.
    Advocate,
    /// Argues the claim has drifted from the truth.
    Skeptic,
    /// Audits both sides against the source material.
    FactChecker,
    /// Delivers the final verdict.
    Judge,
}

impl AgentRole {
    /// All roles, in stage order.
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Advocate,
        AgentRole::Skeptic,
        AgentRole::FactChecker,
        AgentRole::Judge,
    ];

    /// Number of roles (sizing per-role presentation state).
    pub const COUNT: usize = Self::ALL.len();

    /// The canonical prefix this role uses on the wire.
    pub fn wire_prefix(self) -> &'static str {
        match self {
            Self::Advocate => "Advocate",
            Self::Skeptic => "Skeptic",
            Self::FactChecker => "Fact-Checker",
            Self::Judge => "Judge",
        }
    }

    /// Stable index into per-role arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Advocate => 0,
            Self::Skeptic => 1,
            Self::FactChecker => 2,
            Self::Judge => 3,
        }
    }

    /// Normalize a wire identifier to its base role.
    ///
    /// Longest-prefix match over the closed set, so a role whose prefix
    /// contains another's would still resolve deterministically. Returns
    /// `None` for identifiers that match no role.
    pub fn match_prefix(raw: &str) -> Option<AgentRole> {
        Self::ALL
            .iter()
            .copied()
            .filter(|role| raw.starts_with(role.wire_prefix()))
            .max_by_key(|role| role.wire_prefix().len())
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_prefix())
    }
}

/// Normalize a wire identifier to its base display name.
///
/// Falls back to the raw identifier when no role matches, so unknown
/// agents pass through verbatim.
pub fn base_agent(raw: &str) -> &str {
    match AgentRole::match_prefix(raw) {
        Some(role) => role.wire_prefix(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_names_match() {
        assert_eq!(AgentRole::match_prefix("Advocate"), Some(AgentRole::Advocate));
        assert_eq!(AgentRole::match_prefix("Skeptic"), Some(AgentRole::Skeptic));
        assert_eq!(
            AgentRole::match_prefix("Fact-Checker"),
            Some(AgentRole::FactChecker)
        );
        assert_eq!(AgentRole::match_prefix("Judge"), Some(AgentRole::Judge));
    }

    #[test]
    fn test_round_suffixes_normalize() {
        assert_eq!(
            AgentRole::match_prefix("Advocate (rebuttal 2)"),
            Some(AgentRole::Advocate)
        );
        assert_eq!(
            AgentRole::match_prefix("Skeptic (rebuttal 1)"),
            Some(AgentRole::Skeptic)
        );
    }

    #[test]
    fn test_unknown_agent_falls_back_to_raw() {
        assert_eq!(AgentRole::match_prefix("Moderator"), None);
        assert_eq!(base_agent("Moderator"), "Moderator");
        assert_eq!(base_agent(""), "");
    }

    #[test]
    fn test_base_agent_strips_suffix() {
        assert_eq!(base_agent("Fact-Checker"), "Fact-Checker");
        assert_eq!(base_agent("Advocate (rebuttal 3)"), "Advocate");
    }

    #[test]
    fn test_indices_are_stable_and_dense() {
        for (i, role) in AgentRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }
}
