//! Live API tests. Run with: `cargo test --features online -- --nocapture`
#![cfg(feature = "online")]

use statbank::{Client, Selection};

#[test]
fn subjects_top_level() {
    let cli = Client::default();
    let rows = cli.list_subjects(None, None).unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|s| s.id.chars().all(|c| c.is_ascii_digit())));
}

#[test]
fn tables_for_population_subject() {
    let cli = Client::new("da").unwrap();
    let tables = cli.list_tables(Some("02".into()), false, None).unwrap();
    assert!(!tables.is_empty());
    assert!(tables.iter().all(|t| t.active));
}

#[test]
fn folk1a_variables_and_data() {
    let cli = Client::default();
    let vars = cli.get_variables("FOLK1A", None).unwrap();
    assert!(vars.iter().any(|v| v.time));

    let mut sel = Selection::new();
    sel.insert("Tid".into(), vec![vars.iter().find(|v| v.time).unwrap().values[0].id.clone()]);
    let frame = cli.get_data("FOLK1A", Some(&sel), None).unwrap();
    assert_eq!(frame.len(), 1);
    assert!(frame.column("INDHOLD").is_some());
}

#[test]
fn unknown_table_surfaces_server_message() {
    let cli = Client::default();
    let err = cli.get_metadata("NOSUCHTABLE", None).unwrap_err();
    assert!(err.reason().is_some_and(|r| !r.is_empty()));
}
