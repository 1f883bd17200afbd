mod draft;
mod subject;

pub use draft::{DraftEdit, OverrideDraft, OverrideTarget};
pub use subject::{Subject, SubjectKind, SubjectRef};
