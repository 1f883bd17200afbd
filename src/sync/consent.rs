use crate::overrides::SubjectRef;
use anyhow::Context;
use std::future::Future;
use std::pin::Pin;

pub type ConsentFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

/// One-time acknowledgement that override edits save automatically.
pub trait AutoSaveConsent: Send + Sync {
    fn confirm_auto_save<'a>(&'a self, subject: &'a SubjectRef) -> ConsentFuture<'a>;
}

/// Accepts without asking, for non-interactive callers.
pub struct AlwaysConsent;

impl AutoSaveConsent for AlwaysConsent {
    fn confirm_auto_save<'a>(&'a self, _subject: &'a SubjectRef) -> ConsentFuture<'a> {
        Box::pin(async { Ok(true) })
    }
}

/// Asks on the terminal.
pub struct PromptConsent;

impl AutoSaveConsent for PromptConsent {
    fn confirm_auto_save<'a>(&'a self, subject: &'a SubjectRef) -> ConsentFuture<'a> {
        let prompt = format!(
            "Override edits for {subject} are saved automatically, without a Save button. Continue?"
        );
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(true)
                    .interact()
                    .context("failed to read confirmation")
            })
            .await
            .context("confirmation prompt task failed")?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_consent_accepts() {
        let consent = AlwaysConsent;
        let accepted = consent
            .confirm_auto_save(&SubjectRef::user("u-1"))
            .await
            .unwrap();
        assert!(accepted);
    }
}
