//! Synchronous client for the **Statistics Denmark StatBank API (v1)**.
//!
//! Covers the four public endpoints: `subjects`, `tables`, `tableinfo` and
//! `data` (bulk format). Each call performs a blocking GET, checks the status
//! (the server's own error message is surfaced when it sends one) and reshapes
//! the payload into rows.
//!
//! ### Notes
//! - The default language is validated when the client is built; per-call
//!   overrides are validated on each call and never change the client.
//! - `get_data`/`save_data` first read the table's variables to fill in a
//!   default value for every variable the caller did not select.
//! - There is no total request timeout by default since bulk downloads can be
//!   large. Use [`Client::with_timeout`] to set one.
//!
//! Typical usage:
//! ```no_run
//! # use statbank::Client;
//! let client = Client::new("en")?;
//! let subjects = client.list_subjects(None, None)?;
//! let tables = client.list_tables(Some("02".into()), false, None)?;
//! # Ok::<(), statbank::Error>(())
//! ```
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::guard::http_error;
use crate::models::{Subject, SubjectNode, TableSummary, Variable, flatten_subjects};
use crate::url::{Query, build_url};
use crate::validate::{Lang, Selection, SubjectFilter, validate_subject_ids, validate_table_id};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::redirect::Policy;
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    pub version: String,
    lang: Lang,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::from_parts(ClientConfig::default(), None)
            .expect("reqwest client build")
    }
}

impl Client {
    /// Build a client with the given default language (`"en"` or `"da"`).
    pub fn new(lang: &str) -> Result<Self> {
        let lang: Lang = lang.parse()?;
        Self::from_config(ClientConfig {
            lang,
            ..ClientConfig::default()
        })
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        Self::from_parts(cfg, None)
    }

    /// Like [`Client::from_config`] with [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    fn from_parts(cfg: ClientConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = HttpClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("statbank-rs/", env!("CARGO_PKG_VERSION")));
        // blocking clients default to a 30s total timeout; unset it unless asked for
        builder = builder.timeout(timeout);
        Ok(Self {
            base_url: cfg.base_url,
            version: cfg.version,
            lang: cfg.lang,
            timeout,
            http: builder.build()?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Rebuild the transport with a total request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        let cfg = ClientConfig {
            base_url: self.base_url,
            version: self.version,
            lang: self.lang,
        };
        Self::from_parts(cfg, Some(timeout))
    }

    /// Default language of this client.
    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn resolve_lang(&self, lang: Option<&str>) -> Result<Lang> {
        match lang {
            Some(l) => l.parse(),
            None => Ok(self.lang),
        }
    }

    /// Subjects used to classify tables, flattened to their leaf-most nodes.
    ///
    /// With a filter, the sub-subjects of the given subject ids are returned.
    pub fn list_subjects(
        &self,
        subjects: Option<SubjectFilter>,
        lang: Option<&str>,
    ) -> Result<Vec<Subject>> {
        let filter = subjects.unwrap_or_default();
        validate_subject_ids(&filter)?;
        let lang = self.resolve_lang(lang)?;

        let query = Query::new()
            .push("lang", lang.as_str())
            .push("format", "JSON");
        let url = build_url(
            &self.base_url,
            &self.version,
            "subjects/",
            &filter.ids().join(","),
            &query,
        );
        let nodes: Vec<SubjectNode> = self.get_json(&url)?;
        Ok(flatten_subjects(&nodes))
    }

    /// Tables, optionally restricted to subjects. Inactive (discontinued) tables
    /// are only included when `include_inactive` is set.
    pub fn list_tables(
        &self,
        subjects: Option<SubjectFilter>,
        include_inactive: bool,
        lang: Option<&str>,
    ) -> Result<Vec<TableSummary>> {
        let filter = subjects.unwrap_or_default();
        validate_subject_ids(&filter)?;
        let lang = self.resolve_lang(lang)?;

        let ids: Vec<String> = filter.ids().iter().map(|s| s.to_string()).collect();
        let query = Query::new()
            .push("lang", lang.as_str())
            .push_opt("subjects", (!ids.is_empty()).then_some(ids))
            .push_opt("includeInactive", include_inactive.then_some("true"));
        let url = build_url(&self.base_url, &self.version, "tables", "", &query);
        self.get_json(&url)
    }

    /// Variables of a table with their allowed values.
    pub fn get_variables(&self, table_id: &str, lang: Option<&str>) -> Result<Vec<Variable>> {
        let (_, variables) = self.table_info(table_id, lang)?;
        Ok(variables)
    }

    /// Table-info object (description, unit, contacts, documentation…) without
    /// the `variables` array.
    pub fn get_metadata(&self, table_id: &str, lang: Option<&str>) -> Result<Map<String, Value>> {
        let (meta, _) = self.table_info(table_id, lang)?;
        Ok(meta)
    }

    /// Download a table in bulk format and decode it.
    ///
    /// Variables not present in `variables` are requested with their first
    /// allowed value.
    pub fn get_data(
        &self,
        table_id: &str,
        variables: Option<&Selection>,
        lang: Option<&str>,
    ) -> Result<Frame> {
        let resp = self.data_request(table_id, variables, lang)?;
        let body = resp.bytes()?;
        Frame::from_delimited(&body[..], b';')
    }

    /// Like [`Client::get_data`], but streams the raw body to `path`.
    ///
    /// Returns the number of lines written. Fails before any request if the
    /// parent directory of `path` does not exist.
    pub fn save_data<P: AsRef<Path>>(
        &self,
        path: P,
        table_id: &str,
        variables: Option<&Selection>,
        lang: Option<&str>,
    ) -> Result<usize> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(Error::fs(
                    parent,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "directory does not exist"),
                ));
            }
        }

        let resp = self.data_request(table_id, variables, lang)?;

        // stream into a sibling temp file; `path` is only replaced once the body is complete
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::fs(dir, e))?;
        let copied = copy_lines(BufReader::new(resp), BufWriter::new(&mut tmp));
        let lines = match copied {
            Ok(n) => n,
            Err(CopyError::Read(e)) => return Err(body_error(e)),
            Err(CopyError::Write(e)) => return Err(Error::fs(tmp.path(), e)),
        };
        tmp.persist(path).map_err(|e| Error::fs(path, e.error))?;
        log::info!("saved {} line(s) of {} to {}", lines, table_id, path.display());
        Ok(lines)
    }

    fn table_info(
        &self,
        table_id: &str,
        lang: Option<&str>,
    ) -> Result<(Map<String, Value>, Vec<Variable>)> {
        validate_table_id(table_id)?;
        let lang = self.resolve_lang(lang)?;

        let query = Query::new()
            .push("lang", lang.as_str())
            .push("format", "JSON");
        let url = build_url(&self.base_url, &self.version, "tableinfo", table_id, &query);
        let mut info: Map<String, Value> = self.get_json(&url)?;
        let variables = match info.remove("variables") {
            Some(v) => serde_json::from_value(v)?,
            None => vec![],
        };
        Ok((info, variables))
    }

    fn data_request(
        &self,
        table_id: &str,
        variables: Option<&Selection>,
        lang: Option<&str>,
    ) -> Result<Response> {
        validate_table_id(table_id)?;
        let lang = self.resolve_lang(lang)?;
        let table_vars = self.get_variables(table_id, Some(lang.as_str()))?;

        let empty = Selection::new();
        let selection = variables.unwrap_or(&empty);
        let mut query = Query::new()
            .push("lang", lang.as_str())
            .push("delimiter", "Semicolon");
        for (var, values) in resolve_selection(&table_vars, selection)? {
            query = query.push(var, values);
        }
        let url = build_url(
            &self.base_url,
            &self.version,
            "data",
            &format!("{table_id}/BULK"),
            &query,
        );
        self.get(&url)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url)?.bytes()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET `url` and run the status check. Failing bodies are read for the
    /// server's error message; successful responses are returned unread.
    fn get(&self, url: &str) -> Result<Response> {
        log::debug!("GET {url}");
        let resp = self.http.get(url).send()?;
        let status = resp.status();
        log::debug!("GET {url} -> {status}");
        if !status.is_success() {
            let body = resp.bytes().unwrap_or_default();
            return Err(http_error(status, &body, url));
        }
        Ok(resp)
    }
}

/// Pair every table variable with the caller's values, or its first allowed
/// value. Keys naming no table variable are ignored.
pub(crate) fn resolve_selection(
    table_vars: &[Variable],
    selection: &Selection,
) -> Result<Vec<(String, Vec<String>)>> {
    for key in selection.keys() {
        if !table_vars.iter().any(|v| &v.id == key) {
            log::warn!("ignoring selection for unknown variable {key}");
        }
    }
    let mut out = Vec::with_capacity(table_vars.len());
    for var in table_vars {
        match selection.get(&var.id) {
            Some(values) if values.is_empty() => {
                return Err(Error::invalid(format!(
                    "variable {} has no values selected",
                    var.id
                )));
            }
            Some(values) => out.push((var.id.clone(), values.clone())),
            None => {
                if let Some(first) = var.first_value_id() {
                    out.push((var.id.clone(), vec![first.to_string()]));
                }
            }
        }
    }
    Ok(out)
}

/// Which side of a line copy failed.
#[derive(Debug)]
pub(crate) enum CopyError {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Copy `src` to `dst` line by line, terminating every line with `\n`.
pub(crate) fn copy_lines<R: Read, W: Write>(
    mut src: BufReader<R>,
    mut dst: W,
) -> std::result::Result<usize, CopyError> {
    let mut buf = Vec::with_capacity(8 * 1024);
    let mut lines = 0usize;
    loop {
        buf.clear();
        if src.read_until(b'\n', &mut buf).map_err(CopyError::Read)? == 0 {
            break;
        }
        let mut line = &buf[..];
        if let Some(l) = line.strip_suffix(b"\n") {
            line = l;
        }
        if let Some(l) = line.strip_suffix(b"\r") {
            line = l;
        }
        dst.write_all(line).map_err(CopyError::Write)?;
        dst.write_all(b"\n").map_err(CopyError::Write)?;
        lines += 1;
    }
    dst.flush().map_err(CopyError::Write)?;
    Ok(lines)
}

/// Map a failed body read back to the transport error reqwest wrapped in it.
fn body_error(e: std::io::Error) -> Error {
    let kind = e.kind();
    match e.into_inner() {
        Some(inner) => match inner.downcast::<reqwest::Error>() {
            Ok(re) => Error::Transport(*re),
            Err(other) => Error::Download(std::io::Error::new(kind, other)),
        },
        None => Error::Download(kind.into()),
    }
}
