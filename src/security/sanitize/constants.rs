pub(super) const MAX_TOOL_ID_CHARS: usize = 128;
pub(super) const MAX_TOOL_IDS_PER_PAGE: usize = 200;

pub(super) const TOOL_ID_SEPARATORS: [char; 3] = [',', '\n', '\r'];

pub(super) const PAGE_KEY_PREFIX: &str = "/dashboard";
