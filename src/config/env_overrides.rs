use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("PAGEGATE_API_TOKEN")
            && !token.is_empty()
        {
            self.rpc.api_token = Some(token);
        }

        if let Ok(base_url) = std::env::var("PAGEGATE_BASE_URL")
            && !base_url.is_empty()
        {
            self.rpc.base_url = base_url;
        }

        if let Ok(debounce_str) = std::env::var("PAGEGATE_DEBOUNCE_MS")
            && let Ok(debounce_ms) = debounce_str.parse::<u64>()
        {
            self.sync.debounce_ms = debounce_ms;
        }

        if let Ok(level) = std::env::var("PAGEGATE_LOG")
            && !level.is_empty()
        {
            self.log.level = level;
        }
    }
}
