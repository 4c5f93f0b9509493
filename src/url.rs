//! URL and query-string construction.
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// Unreserved characters plus `*` (StatBank's "all values" wildcard) stay readable.
const SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'*');

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Value(String),
    /// Serialized comma-joined.
    List(Vec<String>),
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Value(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Value(s)
    }
}

impl From<Vec<String>> for Param {
    fn from(v: Vec<String>) -> Self {
        Param::List(v)
    }
}

impl From<&[&str]> for Param {
    fn from(v: &[&str]) -> Self {
        Param::List(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Ordered query parameters. Absent values are kept but never emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, Option<Param>)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.0.push((key.into(), Some(value.into())));
        self
    }

    pub fn push_opt<P: Into<Param>>(mut self, key: impl Into<String>, value: Option<P>) -> Self {
        self.0.push((key.into(), value.map(Into::into)));
        self
    }

    /// `k=v&k2=a,b`, or an empty string when nothing is present.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .filter_map(|(k, v)| {
                let v = match v.as_ref()? {
                    Param::Value(s) => enc(s),
                    Param::List(items) => items.iter().map(|s| enc(s)).collect::<Vec<_>>().join(","),
                };
                Some(format!("{}={}", enc(k), v))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, SAFE).to_string()
}

/// Join `base/version/resource/subpath` and append `params`.
///
/// Empty segments are skipped and duplicate `/` collapsed. A trailing `/` on the
/// last non-empty segment is kept, so `("…", "v1", "subjects/", "")` yields
/// `…/v1/subjects/`.
pub fn build_url(base: &str, version: &str, resource: &str, subpath: &str, params: &Query) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for seg in [version, resource, subpath] {
        let seg = seg.trim_start_matches('/');
        if seg.is_empty() {
            continue;
        }
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&collapse_slashes(seg));
    }
    let qs = params.to_query_string();
    if !qs.is_empty() {
        url.push('?');
        url.push_str(&qs);
    }
    url
}

fn collapse_slashes(seg: &str) -> String {
    let mut out = String::with_capacity(seg.len());
    for c in seg.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
