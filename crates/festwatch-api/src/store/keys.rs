/// Builds namespaced store keys: `{ns}:watchlist:{userId}`,
/// `{ns}:sync:{CODE}` and `{ns}:ratelimit:{source}`.
#[derive(Debug, Clone)]
pub struct StoreKeys {
    namespace: String,
}

impl StoreKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn watchlist(&self, user_id: &str) -> String {
        format!("{}{user_id}", self.watchlist_prefix())
    }

    pub fn sync_code(&self, code: &str) -> String {
        format!("{}{code}", self.sync_prefix())
    }

    pub fn rate_limit(&self, source: &str) -> String {
        format!("{}{source}", self.rate_limit_prefix())
    }

    pub fn watchlist_prefix(&self) -> String {
        format!("{}:watchlist:", self.namespace)
    }

    pub fn sync_prefix(&self) -> String {
        format!("{}:sync:", self.namespace)
    }

    pub fn rate_limit_prefix(&self) -> String {
        format!("{}:ratelimit:", self.namespace)
    }
}
