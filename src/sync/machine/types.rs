use super::super::error_codes::{MutationError, MutationErrorCode};
use super::super::rpc::{OverrideMutationRequest, ProfilePayload};
use crate::overrides::{DraftEdit, OverrideDraft, SubjectRef};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, Display};

/// Lifecycle of the pipeline for the selected subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Dirty,
    Saving,
    Saved,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOptions {
    /// Flush on the next tick instead of after the debounce window.
    pub immediate: bool,
    pub silent_success: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOptions {
    /// Persist even when nothing is dirty.
    pub force: bool,
    pub silent_success: bool,
}

/// Identifies one scheduled flush; firings for replaced timers are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub(super) u64);

/// Everything that can happen to the pipeline.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Edit {
        edit: DraftEdit,
        options: EditOptions,
    },
    TimerFired {
        timer: TimerToken,
    },
    Flush(FlushOptions),
    SaveSucceeded {
        generation: u64,
        profile: ProfilePayload,
    },
    SaveFailed {
        generation: u64,
        error: MutationError,
    },
    SubjectChanged {
        subject: SubjectRef,
        loaded: OverrideDraft,
    },
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEffect {
    ScheduleFlush {
        timer: TimerToken,
        delay: Duration,
    },
    CancelFlush {
        timer: TimerToken,
    },
    /// Start the mutation call. Report its outcome tagged with `generation`.
    Persist {
        generation: u64,
        subject: SubjectRef,
        request: OverrideMutationRequest,
    },
    Notify(SyncNotice),
}

/// Operator-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    Saved {
        subject: SubjectRef,
    },
    Failed {
        subject: SubjectRef,
        code: MutationErrorCode,
        message: String,
    },
}

/// Read-only projection of the pipeline for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub subject: SubjectRef,
    pub draft: OverrideDraft,
    pub status: SaveStatus,
    pub status_text: String,
    pub dirty: bool,
    pub in_flight: bool,
}
