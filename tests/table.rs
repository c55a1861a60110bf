use std::path::PathBuf;

use gust::error::GustError;
use gust::table::Table;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gust-table-{}-{name}", std::process::id()))
}

#[test]
fn load_parses_header_and_rows() {
    let path = scratch_path("basic.csv");
    std::fs::write(&path, "topic,task\nAI,explain\nRust,compare\n").unwrap();
    let table = Table::load_csv(&path).unwrap();
    assert_eq!(table.columns(), ["topic", "task"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.value(1, "topic"), Some("Rust"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn quoted_fields_keep_commas_quotes_and_newlines() {
    let path = scratch_path("quoted.csv");
    std::fs::write(
        &path,
        "name,note\n\"Praha, hl. m.\",\"said \"\"hi\"\"\nover two lines\"\n",
    )
    .unwrap();
    let table = Table::load_csv(&path).unwrap();
    assert_eq!(table.value(0, "name"), Some("Praha, hl. m."));
    assert_eq!(table.value(0, "note"), Some("said \"hi\"\nover two lines"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_file_and_headerless_file_are_fatal() {
    let err = Table::load_csv(&scratch_path("nope.csv")).unwrap_err();
    assert!(matches!(err, GustError::Configuration(_)));

    let path = scratch_path("header-only.csv");
    std::fs::write(&path, "topic,task\n").unwrap();
    let err = Table::load_csv(&path).unwrap_err();
    assert!(matches!(err, GustError::Configuration(_)));
    std::fs::remove_file(&path).ok();
}

#[test]
fn quoted_empty_value_in_single_column_is_kept() {
    let path = scratch_path("quoted-empty.csv");
    std::fs::write(&path, "topic\nA\n\"\"\nB\n").unwrap();
    let table = Table::load_csv(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.value(0, "topic"), Some("A"));
    assert_eq!(table.value(1, "topic"), Some(""));
    assert_eq!(table.value(2, "topic"), Some("B"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn blank_lines_are_skipped() {
    let path = scratch_path("blank-lines.csv");
    std::fs::write(&path, "a,b\n1,2\n\n3,4\n\n").unwrap();
    let table = Table::load_csv(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.value(1, "a"), Some("3"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn ragged_rows_are_rejected() {
    let path = scratch_path("ragged.csv");
    std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
    let err = Table::load_csv(&path).unwrap_err();
    assert!(matches!(err, GustError::Configuration(_)));
    std::fs::remove_file(&path).ok();
}

#[test]
fn fields_maps_column_names_to_values() {
    let table = Table::new(
        vec!["topic".into(), "task".into()],
        vec![vec!["AI".into(), "explain".into()]],
    )
    .unwrap();
    let fields = table.fields(0);
    assert_eq!(fields["topic"], "AI");
    assert_eq!(fields["task"], "explain");
}

#[test]
fn with_column_appends_and_overwrites_on_collision() {
    let table = Table::new(
        vec!["topic".into(), "resp".into()],
        vec![
            vec!["A".into(), "stale-a".into()],
            vec!["B".into(), "stale-b".into()],
        ],
    )
    .unwrap();
    let table = table
        .with_column("resp", vec!["fresh-a".into(), "fresh-b".into()])
        .unwrap();
    assert_eq!(table.columns(), ["topic", "resp"]);
    assert_eq!(table.value(0, "resp"), Some("fresh-a"));
    assert_eq!(table.value(1, "resp"), Some("fresh-b"));
}

#[test]
fn with_column_rejects_wrong_length() {
    let table = Table::new(vec!["topic".into()], vec![vec!["A".into()]]).unwrap();
    let err = table.with_column("resp", vec![]).unwrap_err();
    assert!(matches!(err, GustError::Configuration(_)));
}

#[test]
fn write_quotes_fields_that_need_it() {
    let path = scratch_path("out.csv");
    let table = Table::new(
        vec!["name".into(), "resp".into()],
        vec![vec!["Brno, město".into(), "plain".into()]],
    )
    .unwrap();
    table.write_csv(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "name,resp\n\"Brno, město\",plain\n");
    let reread = Table::load_csv(&path).unwrap();
    assert_eq!(reread.value(0, "name"), Some("Brno, město"));
    std::fs::remove_file(&path).ok();
}
