//! Streaming client for the multi-agent debate arena.
//!
//! Four named agents (Advocate, Skeptic, Fact-Checker, Judge) debate
//! whether a claim is faithful to its source truth. The backend streams
//! the debate as typed events over a WebSocket; this crate reconstructs
//! it incrementally and stays consistent when the connection drops
//! mid-stream.
//!
//! # Architecture
//!
//! ```text
//! WebSocket frame ─▶ protocol::decode ─▶ Session::apply ─▶ StateDelta
//!        ▲                                                      │
//!        │                                                      ▼
//!  DebateClient (connection controller)              presentation layer
//! ```
//!
//! - [`protocol`]: the typed event vocabulary and frame codec.
//! - [`session`]: all mutable debate state; every event is a deterministic
//!   transition applied in arrival order.
//! - [`client`]: connection lifecycle: open, send the start command once,
//!   dispatch frames, idempotent stop.
//! - [`agent`]: role normalization for suffixed wire identifiers.
//! - [`catalog`]: read-only REST boundary (case list, health).

pub mod agent;
pub mod catalog;
pub mod client;
pub mod config;
pub mod protocol;
pub mod session;

pub use agent::{base_agent, AgentRole};
pub use client::transport::{Connector, Transport, TransportError, WsConnector};
pub use client::{ClientError, ControllerState, DebateClient};
pub use config::ArenaConfig;
pub use protocol::{DecodeError, EncodeError, ServerEvent, StartCommand, VerdictReport};
pub use session::{ConnectionStatus, Session, StateChange, StateDelta};
