use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result, bail};
use pagegate::Config;
use pagegate::error::SyncError;
use pagegate::security::{
    ToolDisabledMap, can_use_tool, merge_tool_ids, normalize_page_path, normalize_tool_id_list,
    resolve_page_access,
};
use pagegate::sync::{
    AlwaysConsent, AutoSaveConsent, FlushOptions, HttpOverrideClient, OverrideMutationClient,
    PromptConsent, SyncNotice, spawn_override_editor,
};
use pagegate::{AccessContext, OverrideDraft, PageAccess, Role, SubjectRef};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Overrides for one subject, as stored in a `push` file.
#[derive(Debug, Deserialize)]
struct OverrideFile {
    subject: SubjectRef,
    #[serde(default)]
    overrides: OverrideDraft,
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Decide {
            path,
            role,
            plan_pages,
            empty_plan,
            adds,
            removes,
            blocked,
            disabled_tools,
            tool,
        } => {
            let plan = (empty_plan || !plan_pages.is_empty()).then_some(plan_pages.as_slice());
            let tools = parse_disabled_tools(&disabled_tools)?;
            let ctx = AccessContext {
                role,
                plan_allowed_pages: plan,
                merged_adds: &adds,
                merged_removes: &removes,
                globally_blocked: blocked,
            };
            println!("{}", render_decision(&ctx, &path, &tools, tool.as_deref()));
            Ok(())
        }

        Commands::Sanitize { raw } => {
            for id in normalize_tool_id_list(&raw) {
                println!("{id}");
            }
            Ok(())
        }

        Commands::Push { file, yes } => push(&config, &file, yes).await,
    }
}

fn render_decision(
    ctx: &AccessContext<'_>,
    path: &str,
    tools: &ToolDisabledMap,
    tool: Option<&str>,
) -> String {
    let page = normalize_page_path(path);
    let mut out = match resolve_page_access(ctx, path) {
        PageAccess::Enabled => format!("{page}: enabled"),
        PageAccess::Denied(reason) => format!("{page}: denied ({reason})"),
    };
    if ctx.role == Some(Role::Admin) {
        out.push_str(" [admin]");
    }
    if let Some(tool) = tool {
        let verdict = if can_use_tool(ctx, path, tools, Some(tool)) {
            "allowed"
        } else {
            "blocked"
        };
        out.push_str(&format!("\ntool {tool}: {verdict}"));
    }
    out
}

fn parse_disabled_tools(entries: &[String]) -> Result<ToolDisabledMap> {
    let mut map = ToolDisabledMap::new();
    for entry in entries {
        let Some((page, raw)) = entry.split_once('=') else {
            bail!("--disable-tools expects PAGE=tool1,tool2, got '{entry}'");
        };
        let key = normalize_page_path(page).to_string();
        let merged = merge_tool_ids(map.get(&key).map_or(&[][..], Vec::as_slice), raw);
        map.insert(key, merged);
    }
    Ok(map)
}

fn load_override_file(path: &Path) -> Result<OverrideFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read override file {}", path.display()))?;
    let file: OverrideFile = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse override file {}", path.display()))?;

    let overlapping = file.overrides.normalized().overlapping_patterns();
    if !overlapping.is_empty() {
        return Err(SyncError::Overlap {
            patterns: overlapping.join(", "),
        }
        .into());
    }
    Ok(file)
}

async fn push(config: &Config, path: &Path, yes: bool) -> Result<()> {
    let OverrideFile { subject, overrides } = load_override_file(path)?;

    let consent: Arc<dyn AutoSaveConsent> = if yes {
        Arc::new(AlwaysConsent)
    } else {
        Arc::new(PromptConsent)
    };
    if !consent.confirm_auto_save(&subject).await? {
        bail!("push for {subject} cancelled");
    }

    let client: Arc<dyn OverrideMutationClient> = Arc::new(HttpOverrideClient::new(&config.rpc)?);
    let (editor, mut notices, task) = spawn_override_editor(
        config.sync.clone(),
        client,
        consent,
        subject.clone(),
        overrides,
    );
    editor
        .flush(FlushOptions {
            force: true,
            silent_success: false,
        })
        .await?;
    drop(editor);
    task.await.context("override editor task failed")?;

    let mut failure = None;
    while let Some(notice) = notices.recv().await {
        match notice {
            SyncNotice::Saved { subject } => info!(%subject, "overrides pushed"),
            SyncNotice::Failed { code, message, .. } => failure = Some((code, message)),
        }
    }
    if let Some((code, message)) = failure {
        bail!("push for {subject} failed ({code}): {message}");
    }
    println!("{subject}: overrides saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn disabled_tools_are_merged_per_normalized_page() {
        let map = parse_disabled_tools(&[
            "/dashboard/metas=a, b".to_string(),
            "/dashboard/metas=b,c".to_string(),
        ])
        .unwrap();
        assert_eq!(map["/dashboard/metas"], vec!["a", "b", "c"]);
    }

    #[test]
    fn malformed_disabled_tools_entry_is_rejected() {
        assert!(parse_disabled_tools(&["metas".to_string()]).is_err());
    }

    #[test]
    fn decision_rendering_includes_reason_and_tool() {
        let removes = vec!["/dashboard/agenda".to_string()];
        let ctx = AccessContext {
            role: Some(Role::Member),
            plan_allowed_pages: None,
            merged_adds: &[],
            merged_removes: &removes,
            globally_blocked: false,
        };
        let out = render_decision(&ctx, "/dashboard/agenda", &ToolDisabledMap::new(), Some("x"));
        assert_eq!(
            out,
            "/dashboard/agenda: denied (blocked_by_admin)\ntool x: blocked"
        );
    }

    #[test]
    fn override_file_with_overlap_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("overrides.toml");
        std::fs::write(
            &path,
            r#"
[subject]
kind = "user"
id = "u-1"

[overrides]
add = ["/dashboard/metas"]
remove = ["/dashboard/metas"]
"#,
        )
        .unwrap();
        let err = load_override_file(&path).unwrap_err();
        assert!(err.to_string().contains("/dashboard/metas"));
    }

    #[test]
    fn override_file_parses_tools() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("overrides.toml");
        std::fs::write(
            &path,
            r#"
[subject]
kind = "team"
id = "t-1"

[overrides]
add = ["/dashboard/metas"]

[overrides.tools]
"*" = ["export"]
"#,
        )
        .unwrap();
        let file = load_override_file(&path).unwrap();
        assert_eq!(file.subject, SubjectRef::team("t-1"));
        assert_eq!(file.overrides.tools["*"], vec!["export"]);
    }
}
