use crate::security::{AccessContext, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubjectKind {
    User,
    Team,
}

/// Identity of the user or team whose overrides are being edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: String,
}

impl SubjectRef {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::User,
            id: id.into(),
        }
    }

    pub fn team(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Team,
            id: id.into(),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A subject as seen by the decision engine.
///
/// `plan_allowed_pages` and `globally_blocked` come from the subscription
/// provider; `None` plan pages means the plan is unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(flatten)]
    pub subject: SubjectRef,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub plan_allowed_pages: Option<Vec<String>>,
    #[serde(default)]
    pub globally_blocked: bool,
}

impl Subject {
    /// Engine input for this subject with already-merged user/team overrides.
    pub fn access_context<'a>(
        &'a self,
        merged_adds: &'a [String],
        merged_removes: &'a [String],
    ) -> AccessContext<'a> {
        AccessContext {
            role: self.role,
            plan_allowed_pages: self.plan_allowed_pages.as_deref(),
            merged_adds,
            merged_removes,
            globally_blocked: self.globally_blocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{DenyReason, compute_deny_reason};

    #[test]
    fn subject_ref_display_includes_kind() {
        assert_eq!(SubjectRef::team("t-1").to_string(), "team:t-1");
        assert_eq!(SubjectRef::user("u-9").to_string(), "user:u-9");
    }

    #[test]
    fn access_context_carries_subject_state() {
        let subject = Subject {
            subject: SubjectRef::user("u-1"),
            role: Some(Role::Member),
            plan_allowed_pages: Some(vec!["/dashboard".into()]),
            globally_blocked: false,
        };
        let adds = Vec::new();
        let removes = Vec::new();
        let ctx = subject.access_context(&adds, &removes);
        assert_eq!(
            compute_deny_reason(&ctx, "/dashboard/sorteios"),
            Some(DenyReason::NotInPlan)
        );
    }

    #[test]
    fn subject_deserializes_from_flat_toml() {
        let subject: Subject = toml::from_str(
            r#"
kind = "team"
id = "team-7"
role = "member"
globally_blocked = true
"#,
        )
        .unwrap();
        assert_eq!(subject.subject, SubjectRef::team("team-7"));
        assert!(subject.globally_blocked);
        assert_eq!(subject.plan_allowed_pages, None);
    }
}
