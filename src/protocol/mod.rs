//! Wire protocol for the debate stream.
//!
//! The backend speaks newline-free JSON frames over a WebSocket: one
//! outbound `start` command per session, then a stream of typed events
//! until `done` or the socket closes. `types` defines the vocabulary,
//! `codec` validates and (de)serializes it.

pub mod codec;
pub mod types;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use types::{
    clamp_confidence, ServerEvent, StartCommand, VerdictLabel, VerdictReport, VerdictTier,
    MAX_RATIONALE_BULLETS,
};
