use crate::error::Result;
use crate::validate::Lang;

pub const DEFAULT_BASE_URL: &str = "https://api.statbank.dk";
pub const DEFAULT_VERSION: &str = "v1";

pub const ENV_BASE_URL: &str = "STATBANK_API_URL";
pub const ENV_VERSION: &str = "STATBANK_API_VERSION";
pub const ENV_LANG: &str = "STATBANK_LANG";

/// Settings a [`crate::Client`] is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host root, e.g. `https://api.statbank.dk`.
    pub base_url: String,
    /// Version path segment, e.g. `v1`.
    pub version: String,
    /// Default response language.
    pub lang: Lang,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            version: DEFAULT_VERSION.into(),
            lang: Lang::En,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `STATBANK_API_URL`, `STATBANK_API_VERSION` and
    /// `STATBANK_LANG` when set and non-empty. An invalid language fails here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();
        if let Some(url) = get(ENV_BASE_URL) {
            cfg.base_url = url;
        }
        if let Some(version) = get(ENV_VERSION) {
            cfg.version = version;
        }
        if let Some(lang) = get(ENV_LANG) {
            cfg.lang = lang.parse()?;
        }
        Ok(cfg)
    }
}
