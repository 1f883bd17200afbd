use super::constants::{
    MAX_TOOL_ID_CHARS, MAX_TOOL_IDS_PER_PAGE, PAGE_KEY_PREFIX, TOOL_ID_SEPARATORS,
};
use crate::security::policy::WILDCARD;
use serde_json::Value;
use std::collections::BTreeMap;

/// Page key (`"*"` or a dashboard path) to the tool ids disabled on it.
pub type ToolDisabledMap = BTreeMap<String, Vec<String>>;

/// Parse free text into a bounded, deduplicated tool id list.
///
/// Tokens are split on commas and newlines and trimmed. Empty and over-long
/// tokens are dropped, first occurrence wins, and the result is capped.
pub fn normalize_tool_id_list(raw: &str) -> Vec<String> {
    normalize_tool_ids([raw])
}

/// Same as [`normalize_tool_id_list`] over several raw chunks, in order.
pub fn normalize_tool_ids<'a, I>(chunks: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    let tokens = chunks
        .into_iter()
        .flat_map(|chunk| chunk.split(TOOL_ID_SEPARATORS))
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.chars().count() <= MAX_TOOL_ID_CHARS);

    for token in tokens {
        if out.len() >= MAX_TOOL_IDS_PER_PAGE {
            break;
        }
        if !out.iter().any(|existing| existing == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// Append newly parsed ids to an existing list, keeping the same bounds.
pub fn merge_tool_ids(existing: &[String], raw: &str) -> Vec<String> {
    normalize_tool_ids(existing.iter().map(String::as_str).chain([raw]))
}

pub fn is_valid_page_key(key: &str) -> bool {
    key == WILDCARD || key.starts_with(PAGE_KEY_PREFIX)
}

/// Validate a loosely-typed page → tools object.
///
/// Anything that is not a JSON object yields an empty map. Keys outside the
/// dashboard are dropped, values are coerced to strings and normalized, and
/// keys left with no tools are removed.
pub fn normalize_tools_disabled_by_page(raw: &Value) -> ToolDisabledMap {
    let Some(object) = raw.as_object() else {
        return ToolDisabledMap::new();
    };

    let mut out = ToolDisabledMap::new();
    for (key, value) in object {
        if !is_valid_page_key(key) {
            continue;
        }
        let chunks = coerce_to_strings(value);
        let tools = normalize_tool_ids(chunks.iter().map(String::as_str));
        if !tools.is_empty() {
            out.insert(key.clone(), tools);
        }
    }
    out
}

/// Re-validate an already typed map before it leaves the process.
pub fn sanitize_tool_map(map: &ToolDisabledMap) -> ToolDisabledMap {
    map.iter()
        .filter(|(key, _)| is_valid_page_key(key))
        .filter_map(|(key, tools)| {
            let tools = normalize_tool_ids(tools.iter().map(String::as_str));
            (!tools.is_empty()).then(|| (key.clone(), tools))
        })
        .collect()
}

fn coerce_to_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
