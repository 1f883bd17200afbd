#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod error;
pub mod overrides;
pub mod security;
pub mod sync;

pub use config::Config;
pub use error::{GateError, Result};
pub use overrides::{DraftEdit, OverrideDraft, OverrideTarget, Subject, SubjectKind, SubjectRef};
pub use security::{AccessContext, DenyReason, PageAccess, Role};
pub use sync::{OverrideEditor, spawn_override_editor};
