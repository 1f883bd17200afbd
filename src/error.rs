use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `pagegate`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; the binary continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum GateError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Override sync pipeline ──────────────────────────────────────────
    #[error("sync: {0}")]
    Sync(#[from] SyncError),

    // ── Mutation RPC transport ──────────────────────────────────────────
    #[error("rpc: {0}")]
    Rpc(#[from] RpcError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Sync pipeline errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("override editor for subject {subject_id} has shut down")]
    EditorClosed { subject_id: String },

    #[error("add and remove overlap on: {patterns}")]
    Overlap { patterns: String },
}

// ─── RPC errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GateError>;
