//! Client configuration from the environment.

/// Top-level arena client configuration.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// HTTP base URL of the backend.
    pub base_url: String,
    /// Model the backend should run the agents on.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Rebuttal rounds after the opening statements.
    pub rebuttal_rounds: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ARENA_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".into()),
            model: std::env::var("ARENA_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            temperature: 0.2,
            rebuttal_rounds: 1,
        }
    }
}
