//! Debounced, single-writer override persistence as an explicit state machine.
//!
//! [`OverrideSync::handle`] is the only transition function. It never sleeps
//! or performs I/O; timers and RPC calls are returned as [`SyncEffect`]s and
//! their outcomes come back as [`SyncEvent`]s. The current time is passed in
//! by the caller so the machine can be driven by a real or a fake clock.

mod types;

pub use types::{
    EditOptions, EditorView, FlushOptions, SaveStatus, SyncEffect, SyncEvent, SyncNotice,
    TimerToken,
};

use super::error_codes::{MutationError, MutationErrorCode};
use super::rpc::{OverrideMutationRequest, OverridePayload, ProfilePayload};
use crate::config::SyncConfig;
use crate::overrides::{DraftEdit, OverrideDraft, SubjectRef};
use crate::security::sanitize::sanitize_tool_map;
use std::time::{Duration, Instant};

const STATUS_TEXT_DIRTY: &str = "Unsaved changes";
const STATUS_TEXT_SAVING: &str = "Saving…";
const STATUS_TEXT_SAVED: &str = "All changes saved";

#[derive(Debug, Clone, Copy)]
struct PendingFlush {
    timer: TimerToken,
    silent_success: bool,
}

#[derive(Debug)]
pub struct OverrideSync {
    settings: SyncConfig,
    subject: SubjectRef,
    /// Bumped on every subject change; results tagged with an older value are dropped.
    generation: u64,
    draft: OverrideDraft,
    dirty: bool,
    in_flight: Option<OverridePayload>,
    in_flight_silent: bool,
    pending_flush: Option<PendingFlush>,
    next_timer: u64,
    status: SaveStatus,
    status_text: String,
    server_snapshot: Option<OverrideDraft>,
    auto_retries: u32,
    last_saved_notice: Option<Instant>,
}

impl OverrideSync {
    pub fn new(settings: SyncConfig, subject: SubjectRef, loaded: OverrideDraft) -> Self {
        Self {
            settings,
            subject,
            generation: 0,
            draft: loaded,
            dirty: false,
            in_flight: None,
            in_flight_silent: false,
            pending_flush: None,
            next_timer: 0,
            status: SaveStatus::Idle,
            status_text: String::new(),
            server_snapshot: None,
            auto_retries: 0,
            last_saved_notice: None,
        }
    }

    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }

    pub fn draft(&self) -> &OverrideDraft {
        &self.draft
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn server_snapshot(&self) -> Option<&OverrideDraft> {
        self.server_snapshot.as_ref()
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            subject: self.subject.clone(),
            draft: self.draft.clone(),
            status: self.status,
            status_text: self.status_text.clone(),
            dirty: self.dirty,
            in_flight: self.is_in_flight(),
        }
    }

    pub fn handle(&mut self, event: SyncEvent, now: Instant) -> Vec<SyncEffect> {
        let mut effects = Vec::new();
        match event {
            SyncEvent::Edit { edit, options } => self.on_edit(&edit, options, &mut effects),
            SyncEvent::TimerFired { timer } => self.on_timer(timer, &mut effects),
            SyncEvent::Flush(options) => {
                self.cancel_pending_flush(&mut effects);
                self.flush_save(options, &mut effects);
            }
            SyncEvent::SaveSucceeded {
                generation,
                profile,
            } => {
                if self.accepts_result(generation) {
                    self.on_saved(&profile, now, &mut effects);
                    self.finish_flight(false, &mut effects);
                }
            }
            SyncEvent::SaveFailed { generation, error } => {
                if self.accepts_result(generation) {
                    let retry = self.on_failed(&error, &mut effects);
                    self.finish_flight(retry, &mut effects);
                }
            }
            SyncEvent::SubjectChanged { subject, loaded } => {
                self.on_subject_changed(subject, loaded, &mut effects);
            }
        }
        effects
    }

    fn on_edit(&mut self, edit: &DraftEdit, options: EditOptions, effects: &mut Vec<SyncEffect>) {
        if !self.draft.apply(edit) {
            tracing::trace!(subject = %self.subject, "edit left draft unchanged");
            return;
        }
        self.auto_retries = 0;
        self.mark_dirty(options, effects);
    }

    /// Flag unsaved changes and restart the debounce window.
    fn mark_dirty(&mut self, options: EditOptions, effects: &mut Vec<SyncEffect>) {
        self.dirty = true;
        self.set_status(SaveStatus::Dirty, STATUS_TEXT_DIRTY);
        self.cancel_pending_flush(effects);
        let delay = if options.immediate {
            Duration::ZERO
        } else {
            self.settings.debounce()
        };
        self.schedule_flush(delay, options.silent_success, effects);
    }

    fn on_timer(&mut self, timer: TimerToken, effects: &mut Vec<SyncEffect>) {
        match self.pending_flush {
            Some(pending) if pending.timer == timer => {
                self.pending_flush = None;
                self.flush_save(
                    FlushOptions {
                        force: false,
                        silent_success: pending.silent_success,
                    },
                    effects,
                );
            }
            _ => tracing::trace!(subject = %self.subject, ?timer, "ignoring replaced flush timer"),
        }
    }

    fn flush_save(&mut self, options: FlushOptions, effects: &mut Vec<SyncEffect>) {
        if !(self.dirty || options.force) {
            return;
        }
        if self.in_flight.is_some() {
            tracing::debug!(subject = %self.subject, "save already in flight; deferring flush");
            return;
        }

        let normalized = self.draft.normalized();
        let overlapping = normalized.overlapping_patterns();
        if !overlapping.is_empty() {
            tracing::warn!(
                subject = %self.subject,
                patterns = %overlapping.join(", "),
                "refusing to save overlapping add/remove overrides"
            );
            self.report_failure(
                &MutationError::with_details(
                    MutationErrorCode::OverlappingPermissions,
                    overlapping.join(", "),
                ),
                effects,
            );
            return;
        }

        let payload = OverridePayload {
            allowed_pages_add: normalized.add,
            allowed_pages_remove: normalized.remove,
            tools_disabled_by_page: sanitize_tool_map(&normalized.tools),
        };

        self.dirty = false;
        self.in_flight_silent = options.silent_success;
        self.set_status(SaveStatus::Saving, STATUS_TEXT_SAVING);
        tracing::debug!(
            subject = %self.subject,
            generation = self.generation,
            adds = payload.allowed_pages_add.len(),
            removes = payload.allowed_pages_remove.len(),
            tool_pages = payload.tools_disabled_by_page.len(),
            "persisting overrides"
        );
        effects.push(SyncEffect::Persist {
            generation: self.generation,
            subject: self.subject.clone(),
            request: OverrideMutationRequest {
                subject_id: self.subject.id.clone(),
                overrides: payload.clone(),
            },
        });
        self.in_flight = Some(payload);
    }

    fn accepts_result(&self, generation: u64) -> bool {
        if generation != self.generation {
            tracing::warn!(
                subject = %self.subject,
                stale_generation = generation,
                generation = self.generation,
                "discarding save result for a previously selected subject"
            );
            return false;
        }
        if self.in_flight.is_none() {
            tracing::warn!(subject = %self.subject, "discarding save result with no request in flight");
            return false;
        }
        true
    }

    fn on_saved(&mut self, profile: &ProfilePayload, now: Instant, effects: &mut Vec<SyncEffect>) {
        let Some(sent) = self.in_flight.as_ref() else {
            return;
        };
        let confirmed = profile.confirmed(sent);

        // Edits made while the request was outstanding stay in the draft for the trailing flush.
        if !self.dirty {
            self.draft = confirmed.clone();
        }
        self.server_snapshot = Some(confirmed);
        self.auto_retries = 0;
        self.set_status(SaveStatus::Saved, STATUS_TEXT_SAVED);
        tracing::info!(subject = %self.subject, generation = self.generation, "overrides saved");

        let recently_notified = self
            .last_saved_notice
            .is_some_and(|at| now.saturating_duration_since(at) < self.settings.notice_dedupe());
        if !self.in_flight_silent && !recently_notified {
            self.last_saved_notice = Some(now);
            effects.push(SyncEffect::Notify(SyncNotice::Saved {
                subject: self.subject.clone(),
            }));
        }
    }

    /// Returns `true` when the caller should retry automatically.
    fn on_failed(&mut self, error: &MutationError, effects: &mut Vec<SyncEffect>) -> bool {
        self.report_failure(error, effects);

        if let Some(snapshot) = self.server_snapshot.clone() {
            tracing::warn!(
                subject = %self.subject,
                code = %error.code,
                "save failed; rolling draft back to last saved overrides"
            );
            self.draft = snapshot;
            self.dirty = false;
            false
        } else {
            tracing::warn!(
                subject = %self.subject,
                code = %error.code,
                "save failed with nothing to roll back to; keeping draft dirty"
            );
            self.dirty = true;
            true
        }
    }

    fn report_failure(&mut self, error: &MutationError, effects: &mut Vec<SyncEffect>) {
        let message = error.user_message().into_owned();
        self.set_status(SaveStatus::Error, &message);
        effects.push(SyncEffect::Notify(SyncNotice::Failed {
            subject: self.subject.clone(),
            code: error.code.clone(),
            message,
        }));
    }

    /// Release the write slot and coalesce anything edited meanwhile into one trailing flush.
    fn finish_flight(&mut self, after_failure: bool, effects: &mut Vec<SyncEffect>) {
        self.in_flight = None;
        self.in_flight_silent = false;
        if !self.dirty {
            return;
        }

        if after_failure {
            if self.auto_retries >= self.settings.max_auto_retries {
                tracing::warn!(
                    subject = %self.subject,
                    attempts = self.auto_retries,
                    "automatic retries exhausted; waiting for the next edit"
                );
                return;
            }
            self.auto_retries += 1;
            self.cancel_pending_flush(effects);
            self.schedule_flush(self.settings.retry_delay(), true, effects);
        } else {
            self.set_status(SaveStatus::Dirty, STATUS_TEXT_DIRTY);
            self.cancel_pending_flush(effects);
            self.schedule_flush(Duration::ZERO, true, effects);
        }
    }

    fn on_subject_changed(
        &mut self,
        subject: SubjectRef,
        loaded: OverrideDraft,
        effects: &mut Vec<SyncEffect>,
    ) {
        self.cancel_pending_flush(effects);
        self.generation += 1;
        tracing::debug!(
            from = %self.subject,
            to = %subject,
            generation = self.generation,
            "selected subject changed; resetting pipeline"
        );
        self.subject = subject;
        self.draft = loaded;
        self.dirty = false;
        self.in_flight = None;
        self.in_flight_silent = false;
        self.server_snapshot = None;
        self.auto_retries = 0;
        self.set_status(SaveStatus::Idle, "");
    }

    fn schedule_flush(&mut self, delay: Duration, silent_success: bool, effects: &mut Vec<SyncEffect>) {
        self.next_timer += 1;
        let timer = TimerToken(self.next_timer);
        self.pending_flush = Some(PendingFlush {
            timer,
            silent_success,
        });
        effects.push(SyncEffect::ScheduleFlush { timer, delay });
    }

    fn cancel_pending_flush(&mut self, effects: &mut Vec<SyncEffect>) {
        if let Some(pending) = self.pending_flush.take() {
            effects.push(SyncEffect::CancelFlush {
                timer: pending.timer,
            });
        }
    }

    fn set_status(&mut self, status: SaveStatus, text: &str) {
        self.status = status;
        text.clone_into(&mut self.status_text);
    }
}
