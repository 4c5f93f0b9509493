use crate::error::{Error, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::io::Read;

/// Rows of string cells under named columns, as decoded from bulk CSV.
///
/// Column names come from the response header, so they are only known at
/// runtime (they follow the table's variables plus `INDHOLD`, the value column).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    /// Decode delimited text with a header line. A leading UTF-8 BOM is ignored.
    pub fn from_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);
        let mut columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if let Some(first) = columns.first_mut() {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }
        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(rec.iter().map(str::to_string).collect());
        }
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Numeric view of a column. StatBank marks missing values as `..`; those and
    /// empty cells become `None`. Decimal commas are accepted.
    pub fn column_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let cells = self
            .column(name)
            .ok_or_else(|| Error::invalid(format!("no column named {name}")))?;
        cells
            .into_iter()
            .map(|c| {
                let c = c.trim();
                if c.is_empty() || c.chars().all(|ch| ch == '.') {
                    return Ok(None);
                }
                c.replace(',', ".")
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| Error::invalid(format!("cell {c:?} in {name} is not numeric")))
            })
            .collect()
    }
}
