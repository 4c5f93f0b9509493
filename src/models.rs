use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Subject node as served by the `subjects` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectNode {
    /// The API sends ids as strings ("02"); numbers are accepted and normalized.
    #[serde(deserialize_with = "de_string_from_string_or_number")]
    pub id: String,
    pub description: String,
    pub active: bool,
    pub has_subjects: bool,
    #[serde(default)]
    pub subjects: Vec<SubjectNode>,
}

/// Flat subject row (one per leaf-most node).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub desc: String,
    pub active: bool,
    #[serde(rename = "hasSubjects")]
    pub has_subjects: bool,
}

/// Flatten a subject tree in pre-order.
///
/// Nodes without children become rows; a node with children is replaced by its
/// flattened descendants and never appears itself.
pub fn flatten_subjects(nodes: &[SubjectNode]) -> Vec<Subject> {
    let mut out = Vec::new();
    collect_leaves(nodes, &mut out);
    out
}

fn collect_leaves(nodes: &[SubjectNode], out: &mut Vec<Subject>) {
    for n in nodes {
        if n.subjects.is_empty() {
            out.push(Subject {
                id: n.id.clone(),
                desc: n.description.clone(),
                active: n.active,
                has_subjects: n.has_subjects,
            });
        } else {
            collect_leaves(&n.subjects, out);
        }
    }
}

/// One entry of the `tables` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// `None` when the server sends no (or a null) timestamp.
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub first_period: Option<String>,
    #[serde(default)]
    pub latest_period: Option<String>,
    pub active: bool,
    /// Variable names (texts), not ids.
    #[serde(default, serialize_with = "ser_comma_joined")]
    pub variables: Vec<String>,
}

/// A dimension of a table, from the `tableinfo` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    pub id: String,
    pub text: String,
    /// Whether the variable may be left out of a data request.
    #[serde(default)]
    pub elimination: bool,
    #[serde(default)]
    pub time: bool,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub values: Vec<VariableValue>,
}

impl Variable {
    /// Id of the first allowed value; used when the caller selects nothing.
    pub fn first_value_id(&self) -> Option<&str> {
        self.values.first().map(|v| v.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableValue {
    pub id: String,
    pub text: String,
}

/// Serde helper: accept a JSON string or number and keep it as text.
fn de_string_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer id")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(s.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Serde helper: StatBank timestamps come as naive ISO-8601 (`2024-02-12T08:00:00`),
/// occasionally with an offset. Offsets are normalized to UTC.
/// Null and empty strings read as `None`.
fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_timestamp(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(s).map(|d| d.naive_utc()))
        .map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

fn ser_comma_joined<S>(v: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&v.join(","))
}
