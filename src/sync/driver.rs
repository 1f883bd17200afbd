use super::consent::AutoSaveConsent;
use super::machine::{
    EditOptions, EditorView, FlushOptions, OverrideSync, SyncEffect, SyncEvent, SyncNotice,
    TimerToken,
};
use super::rpc::OverrideMutationClient;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::overrides::{DraftEdit, OverrideDraft, OverrideTarget, SubjectRef};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug)]
enum EditorCommand {
    Edit(DraftEdit, EditOptions),
    Flush(FlushOptions),
    SelectSubject {
        subject: SubjectRef,
        loaded: OverrideDraft,
    },
}

/// Handle to a running override editor task.
///
/// Dropping every handle flushes pending edits, including ones made while a
/// save was in flight, waits for the last write and stops the task.
#[derive(Clone)]
pub struct OverrideEditor {
    commands: mpsc::Sender<EditorCommand>,
    view: watch::Receiver<EditorView>,
}

impl OverrideEditor {
    pub async fn edit(&self, edit: DraftEdit) -> Result<(), SyncError> {
        self.edit_with(edit, EditOptions::default()).await
    }

    pub async fn edit_with(&self, edit: DraftEdit, options: EditOptions) -> Result<(), SyncError> {
        self.send(EditorCommand::Edit(edit, options)).await
    }

    pub async fn toggle_override(
        &self,
        target: OverrideTarget,
        path: impl Into<String>,
    ) -> Result<(), SyncError> {
        self.edit(DraftEdit::Toggle {
            target,
            path: path.into(),
        })
        .await
    }

    pub async fn flush(&self, options: FlushOptions) -> Result<(), SyncError> {
        self.send(EditorCommand::Flush(options)).await
    }

    pub async fn select_subject(
        &self,
        subject: SubjectRef,
        loaded: OverrideDraft,
    ) -> Result<(), SyncError> {
        self.send(EditorCommand::SelectSubject { subject, loaded })
            .await
    }

    pub fn view(&self) -> EditorView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EditorView> {
        self.view.clone()
    }

    async fn send(&self, command: EditorCommand) -> Result<(), SyncError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SyncError::EditorClosed {
                subject_id: self.view.borrow().subject.id.clone(),
            })
    }
}

/// Start the editor task for `subject`.
///
/// Returns the handle, the notice stream and the task handle.
pub fn spawn_override_editor(
    settings: SyncConfig,
    client: Arc<dyn OverrideMutationClient>,
    consent: Arc<dyn AutoSaveConsent>,
    subject: SubjectRef,
    loaded: OverrideDraft,
) -> (
    OverrideEditor,
    mpsc::UnboundedReceiver<SyncNotice>,
    JoinHandle<()>,
) {
    let machine = OverrideSync::new(settings, subject, loaded);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (view_tx, view_rx) = watch::channel(machine.view());
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = mpsc::unbounded_channel();

    let task = EditorTask {
        machine,
        client,
        consent,
        consented: false,
        timer: None,
        view: view_tx,
        notices: notice_tx,
        results: result_tx,
    };
    let handle = tokio::spawn(task.run(command_rx, result_rx));

    (
        OverrideEditor {
            commands: command_tx,
            view: view_rx,
        },
        notice_rx,
        handle,
    )
}

struct EditorTask {
    machine: OverrideSync,
    client: Arc<dyn OverrideMutationClient>,
    consent: Arc<dyn AutoSaveConsent>,
    /// Set once the operator acknowledged auto-save in this session.
    consented: bool,
    timer: Option<(TimerToken, Instant)>,
    view: watch::Sender<EditorView>,
    notices: mpsc::UnboundedSender<SyncNotice>,
    results: mpsc::UnboundedSender<SyncEvent>,
}

impl EditorTask {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<EditorCommand>,
        mut results: mpsc::UnboundedReceiver<SyncEvent>,
    ) {
        let mut closing = false;
        loop {
            // Trailing flushes and bounded retries still run after the handles are gone.
            if closing && !self.machine.is_in_flight() && self.timer.is_none() {
                break;
            }
            let deadline = self.timer;

            tokio::select! {
                command = commands.recv(), if !closing => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        tracing::debug!(subject = %self.machine.subject(), "editor handles dropped; flushing");
                        closing = true;
                        self.dispatch(SyncEvent::Flush(FlushOptions::default()));
                    }
                },
                Some(event) = results.recv() => self.dispatch(event),
                () = sleep_until(deadline.map_or_else(Instant::now, |(_, at)| at)), if deadline.is_some() => {
                    if let Some((timer, _)) = self.timer.take() {
                        self.dispatch(SyncEvent::TimerFired { timer });
                    }
                }
            }
        }
    }

    async fn on_command(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::Edit(edit, options) => {
                // The loop is parked while the prompt is open; timers and results wait for it.
                if !self.consented && !self.ask_consent().await {
                    tracing::info!(subject = %self.machine.subject(), "auto-save not confirmed; edit dropped");
                    return;
                }
                self.dispatch(SyncEvent::Edit { edit, options });
            }
            EditorCommand::Flush(options) => self.dispatch(SyncEvent::Flush(options)),
            EditorCommand::SelectSubject { subject, loaded } => {
                self.dispatch(SyncEvent::SubjectChanged { subject, loaded });
            }
        }
    }

    async fn ask_consent(&mut self) -> bool {
        let subject = self.machine.subject().clone();
        match self.consent.confirm_auto_save(&subject).await {
            Ok(accepted) => {
                self.consented = accepted;
                accepted
            }
            Err(error) => {
                tracing::warn!(subject = %subject, %error, "auto-save confirmation failed");
                false
            }
        }
    }

    fn dispatch(&mut self, event: SyncEvent) {
        let effects = self.machine.handle(event, Instant::now().into_std());
        // Publish first so a notice is never observed ahead of the state it reports.
        self.view.send_replace(self.machine.view());
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: SyncEffect) {
        match effect {
            SyncEffect::ScheduleFlush { timer, delay } => {
                self.timer = Some((timer, Instant::now() + delay));
            }
            SyncEffect::CancelFlush { timer } => {
                if self.timer.is_some_and(|(pending, _)| pending == timer) {
                    self.timer = None;
                }
            }
            SyncEffect::Persist {
                generation,
                subject,
                request,
            } => {
                let client = Arc::clone(&self.client);
                let results = self.results.clone();
                tokio::spawn(async move {
                    let event = match client.mutate_overrides(&subject, &request).await {
                        Ok(profile) => SyncEvent::SaveSucceeded {
                            generation,
                            profile,
                        },
                        Err(error) => SyncEvent::SaveFailed { generation, error },
                    };
                    // The editor may already be gone; nothing left to reconcile then.
                    let _ = results.send(event);
                });
            }
            SyncEffect::Notify(notice) => {
                let _ = self.notices.send(notice);
            }
        }
    }
}
