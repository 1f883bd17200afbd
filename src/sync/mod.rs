//! Debounced persistence of subject access overrides.

pub mod consent;
pub mod driver;
pub mod error_codes;
pub mod http;
pub mod machine;
pub mod rpc;

pub use consent::{AlwaysConsent, AutoSaveConsent, PromptConsent};
pub use driver::{OverrideEditor, spawn_override_editor};
pub use error_codes::{MutationError, MutationErrorCode};
pub use http::HttpOverrideClient;
pub use machine::{
    EditOptions, EditorView, FlushOptions, OverrideSync, SaveStatus, SyncEffect, SyncEvent,
    SyncNotice, TimerToken,
};
pub use rpc::{
    OverrideMutationClient, OverrideMutationRequest, OverrideMutationResponse, OverridePayload,
    ProfilePayload,
};
