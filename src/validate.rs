//! Input validation for client arguments.
//!
//! Loosely typed inputs (JSON values coming from config files or the CLI) are
//! narrowed here once, so the rest of the crate only sees checked types.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static TABLE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Language codes the API serves.
pub const LANGUAGES: [&str; 2] = ["en", "da"];

/// Fail unless `code` is one of `allowed`. Both must be letter-only strings.
pub fn validate_language(code: &str, allowed: &[&str]) -> Result<()> {
    let mut bad = Vec::new();
    if !LETTERS.is_match(code) {
        bad.push("lang");
    }
    if allowed.iter().any(|l| !LETTERS.is_match(l)) {
        bad.push("valid_langs");
    }
    if !bad.is_empty() {
        return Err(Error::invalid(format!(
            "the following arguments are not provided correctly: {}",
            bad.join(", ")
        )));
    }
    if !allowed.contains(&code) {
        return Err(Error::invalid(format!("{code} is not in {allowed:?}")));
    }
    Ok(())
}

/// Response language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Da,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Da => "da",
        }
    }
}

impl FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_language(s, &LANGUAGES)?;
        match s {
            "en" => Ok(Lang::En),
            _ => Ok(Lang::Da),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which subjects an operation is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectFilter {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl SubjectFilter {
    /// Ids in request order; empty for `All`.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            SubjectFilter::All => vec![],
            SubjectFilter::One(id) => vec![id.as_str()],
            SubjectFilter::Many(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.ids().is_empty()
    }
}

impl From<&str> for SubjectFilter {
    fn from(id: &str) -> Self {
        SubjectFilter::One(id.to_string())
    }
}

impl From<String> for SubjectFilter {
    fn from(id: String) -> Self {
        SubjectFilter::One(id)
    }
}

impl From<Vec<String>> for SubjectFilter {
    fn from(ids: Vec<String>) -> Self {
        SubjectFilter::Many(ids)
    }
}

impl From<&[&str]> for SubjectFilter {
    fn from(ids: &[&str]) -> Self {
        SubjectFilter::Many(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SubjectFilter {
    fn from(ids: [&str; N]) -> Self {
        SubjectFilter::Many(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl TryFrom<&Value> for SubjectFilter {
    type Error = Error;

    /// Accepts `null`, a string, or an array of strings.
    fn try_from(v: &Value) -> Result<Self> {
        let filter = match v {
            Value::Null => SubjectFilter::All,
            Value::String(s) => SubjectFilter::One(s.clone()),
            Value::Array(items) => {
                let ids = items
                    .iter()
                    .map(|i| {
                        i.as_str().map(str::to_string).ok_or_else(|| {
                            Error::invalid(format!("subject ids must be strings, got {i}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                SubjectFilter::Many(ids)
            }
            other => {
                return Err(Error::invalid(format!(
                    "subjects must be a list or a string of subject ids, got {other}"
                )));
            }
        };
        validate_subject_ids(&filter)?;
        Ok(filter)
    }
}

/// Fail if any subject id is not a digit-only string.
pub fn validate_subject_ids(filter: &SubjectFilter) -> Result<()> {
    for id in filter.ids() {
        if !DIGITS.is_match(id) {
            return Err(Error::invalid(format!(
                "subject id {id:?} must consist of digits only"
            )));
        }
    }
    Ok(())
}

/// Table ids are used as a path segment; restrict them to `[A-Za-z0-9_]+`.
pub fn validate_table_id(id: &str) -> Result<()> {
    if TABLE_ID.is_match(id) {
        Ok(())
    } else {
        Err(Error::invalid(format!("table id {id:?} is not alphanumeric")))
    }
}

/// Caller-chosen values per variable id.
pub type Selection = BTreeMap<String, Vec<String>>;

/// Narrow a JSON object of `{"VAR": "value" | ["v1", "v2"]}` into a [`Selection`].
pub fn selection_from_json(v: &Value) -> Result<Selection> {
    let obj = v
        .as_object()
        .ok_or_else(|| Error::invalid(format!("variables must be an object, got {v}")))?;
    let mut out = Selection::new();
    for (key, val) in obj {
        let values = match val {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .map(|i| {
                    i.as_str().map(str::to_string).ok_or_else(|| {
                        Error::invalid(format!("values of variable {key} must be strings"))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(Error::invalid(format!(
                    "variable {key} must map to a string or a list of strings, got {other}"
                )));
            }
        };
        if values.is_empty() {
            return Err(Error::invalid(format!("variable {key} has no values selected")));
        }
        out.insert(key.clone(), values);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn language_membership() {
        assert!(validate_language("da", &["da", "en"]).is_ok());
        assert!(validate_language("da", &["en"]).is_err());
        assert!(validate_language("es", &LANGUAGES).is_err());
        assert!(validate_language("", &LANGUAGES).is_err());
        assert!(validate_language("e1", &LANGUAGES).is_err());
    }

    #[test]
    fn language_allowed_list_must_be_letters() {
        let err = validate_language("da", &["da", "e-n"]).unwrap_err();
        assert!(err.to_string().contains("valid_langs"));
    }

    #[test]
    fn lang_parses_known_codes_unchanged() {
        for code in LANGUAGES {
            let l: Lang = code.parse().unwrap();
            assert_eq!(l.as_str(), code);
        }
        assert!(matches!("de".parse::<Lang>(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn subject_ids_digits_only() {
        assert!(validate_subject_ids(&"02".into()).is_ok());
        assert!(validate_subject_ids(&["02", "05"].into()).is_ok());
        assert!(validate_subject_ids(&SubjectFilter::All).is_ok());
        assert!(validate_subject_ids(&"2a".into()).is_err());
        assert!(validate_subject_ids(&["02", "x"].into()).is_err());
        assert!(validate_subject_ids(&"02,05".into()).is_err());
    }

    #[test]
    fn subject_filter_from_json_rejects_non_strings() {
        for bad in [json!(2), json!(true), json!({"id": "02"}), json!(["02", 5])] {
            assert!(
                matches!(SubjectFilter::try_from(&bad), Err(Error::InvalidArgument(_))),
                "{bad} should be rejected"
            );
        }
        assert_eq!(SubjectFilter::try_from(&json!(null)).unwrap(), SubjectFilter::All);
        assert_eq!(
            SubjectFilter::try_from(&json!(["02", "05"])).unwrap().ids(),
            vec!["02", "05"]
        );
    }

    #[test]
    fn table_ids() {
        assert!(validate_table_id("FOLK1A").is_ok());
        assert!(validate_table_id("").is_err());
        assert!(validate_table_id("../x").is_err());
    }

    #[test]
    fn selection_narrowing() {
        let s = selection_from_json(&json!({"OMRÅDE": "000", "Tid": ["2020K1", "2020K2"]}))
            .unwrap();
        assert_eq!(s["OMRÅDE"], vec!["000"]);
        assert_eq!(s["Tid"], vec!["2020K1", "2020K2"]);

        assert!(selection_from_json(&json!(["Tid"])).is_err());
        assert!(selection_from_json(&json!({"Tid": 2020})).is_err());
        assert!(selection_from_json(&json!({"Tid": []})).is_err());
    }
}
