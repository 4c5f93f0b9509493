//! statbank
//!
//! A lightweight Rust library for browsing and downloading data from the
//! Statistics Denmark StatBank API. Pairs with the `statbank` CLI.
//!
//! ### Features
//! - Browse the subject taxonomy (flattened to leaf-most subjects)
//! - Discover tables by subject, optionally including inactive ones
//! - Read table metadata and variables with their allowed values
//! - Download bulk data into a [`Frame`] or stream it straight to disk
//! - Save rows as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use statbank::{Client, Selection};
//!
//! let client = Client::new("en")?;
//! let tables = client.list_tables(Some(["02"].into()), false, None)?;
//! let mut sel = Selection::new();
//! sel.insert("Tid".into(), vec!["2020K1".into(), "2020K2".into()]);
//! let data = client.get_data("FOLK1A", Some(&sel), None)?;
//! println!("{} tables, {} rows", tables.len(), data.len());
//! client.save_data("folk1a.csv", "FOLK1A", Some(&sel), Some("da"))?;
//! # Ok::<(), statbank::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod frame;
pub mod guard;
pub mod models;
pub mod storage;
pub mod url;
pub mod validate;

pub use api::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use frame::Frame;
pub use models::{Subject, SubjectNode, TableSummary, Variable, VariableValue, flatten_subjects};
pub use validate::{Lang, Selection, SubjectFilter};
