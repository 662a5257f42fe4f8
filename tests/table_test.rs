use sheet_editor::error::EditorError;
use sheet_editor::table::Table;
use std::collections::HashMap;

// Helper to build a table from string literals
fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
    Table::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect(),
    )
    .unwrap()
}

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn people() -> Table {
    table(
        &["name", "age", "city"],
        &[
            &["Ann", "30", "Oslo"],
            &["Bob", "41", "Bergen"],
            &["bella", "25", "Oslo"],
            &["Carl", "30", "Tromsø"],
        ],
    )
}

#[test]
fn test_new_rejects_ragged_rows() {
    let result = Table::new(
        vec!["a".to_string(), "b".to_string()],
        vec![vec!["1".to_string()]],
    );
    assert!(matches!(
        result,
        Err(EditorError::Shape {
            expected: 2,
            found: 1
        })
    ));
}

#[test]
fn test_record_and_value() {
    let t = people();
    assert_eq!(t.value(1, "city"), Some("Bergen"));
    assert_eq!(t.value(1, "zip"), None);
    assert_eq!(t.value(9, "city"), None);
    assert_eq!(
        t.record(0).unwrap(),
        vec![("name", "Ann"), ("age", "30"), ("city", "Oslo")]
    );
}

#[test]
fn test_filter_empty_value_is_identity() {
    let t = people();
    let view = t.filter("name", "").unwrap();
    assert!(!view.is_filtered());
    assert_eq!(view.to_table(), t);

    // The column is not consulted for an empty value
    let view = t.filter("no such column", "").unwrap();
    assert_eq!(view.len(), t.row_count());
}

#[test]
fn test_filter_keeps_exactly_matching_rows() {
    let t = people();
    let view = t.filter("city", "Oslo").unwrap();
    let kept: Vec<usize> = view.iter().map(|(i, _)| i).collect();
    assert_eq!(kept, vec![0, 2]);

    for (i, row) in t.rows().iter().enumerate() {
        assert_eq!(row[2].contains("Oslo"), kept.contains(&i));
    }
}

#[test]
fn test_filter_is_case_sensitive() {
    let t = people();
    let view = t.filter("name", "B").unwrap();
    let names: Vec<&str> = view.iter().map(|(_, row)| row[0].as_str()).collect();
    assert_eq!(names, vec!["Bob"]);

    let view = t.filter("name", "b").unwrap();
    let names: Vec<&str> = view.iter().map(|(_, row)| row[0].as_str()).collect();
    assert_eq!(names, vec!["Bob", "bella"]);
}

#[test]
fn test_filter_unknown_column() {
    let t = people();
    assert!(matches!(
        t.filter("zip", "1"),
        Err(EditorError::UnknownColumn(c)) if c == "zip"
    ));
}

#[test]
fn test_filter_does_not_change_table() {
    let t = people();
    let before = t.clone();
    let filtered = t.filter("age", "30").unwrap().to_table();
    assert_eq!(filtered.row_count(), 2);
    assert_eq!(t, before);
}

#[test]
fn test_add_row_appends_with_defaults() {
    let t = people();
    let added = t.add_row(&values(&[("name", "Dina"), ("zip", "9000")]));

    assert_eq!(added.row_count(), t.row_count() + 1);
    assert_eq!(added.row(4).unwrap(), ["Dina", "", ""]);
    assert_eq!(&added.rows()[..4], t.rows());
    assert_eq!(t.row_count(), 4, "source table must stay as it was");
}

#[test]
fn test_delete_row_removes_exactly_one() {
    let t = people();
    let deleted = t.delete_row(1).unwrap();

    assert_eq!(deleted.row_count(), 3);
    let names: Vec<&str> = deleted.rows().iter().map(|r| r[0].as_str()).collect();
    assert_eq!(names, vec!["Ann", "bella", "Carl"]);
}

#[test]
fn test_delete_row_out_of_range() {
    let t = people();
    match t.delete_row(4) {
        Err(EditorError::IndexOutOfRange { index, len }) => {
            assert_eq!(index, 4);
            assert_eq!(len, 4);
        }
        other => panic!("expected IndexOutOfRange, got {:?}", other),
    }
    assert_eq!(t, people());
}

#[test]
fn test_checked_index_rejects_negative_and_past_end() {
    let t = people();
    assert_eq!(t.checked_index(0).unwrap(), 0);
    assert_eq!(t.checked_index(3).unwrap(), 3);
    assert!(matches!(
        t.checked_index(-1),
        Err(EditorError::IndexOutOfRange { index: -1, len: 4 })
    ));
    assert!(t.checked_index(4).is_err());
    assert!(Table::default().checked_index(0).is_err());
}

#[test]
fn test_modify_row_replaces_only_target() {
    let t = people();
    let modified = t
        .modify_row(2, &values(&[("name", "Bella"), ("age", "26"), ("city", "Bodø")]))
        .unwrap();

    assert_eq!(modified.row(2).unwrap(), ["Bella", "26", "Bodø"]);
    for i in [0, 1, 3] {
        assert_eq!(modified.row(i), t.row(i));
    }
}

#[test]
fn test_modify_row_keeps_missing_columns() {
    let t = people();
    let modified = t.modify_row(0, &values(&[("age", "31")])).unwrap();
    assert_eq!(modified.row(0).unwrap(), ["Ann", "31", "Oslo"]);
}

#[test]
fn test_modify_row_out_of_range() {
    let t = people();
    assert!(t.modify_row(10, &values(&[("name", "X")])).is_err());
}

#[test]
fn test_scenario_add_delete_filter() {
    let t = table(&["name", "age"], &[&["Ann", "30"]]);

    let t = t.add_row(&values(&[("name", "Bo"), ("age", "25")]));
    assert_eq!(t.row_count(), 2);
    assert_eq!(t.record(1).unwrap(), vec![("name", "Bo"), ("age", "25")]);
    println!("✓ Row added");

    let t = t.delete_row(0).unwrap();
    assert_eq!(t.row_count(), 1);
    assert_eq!(t.record(0).unwrap(), vec![("name", "Bo"), ("age", "25")]);
    println!("✓ Row deleted");

    let view = t.filter("name", "B").unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.iter().next().unwrap().1[0], "Bo");
    assert!(t.filter("name", "z").unwrap().is_empty());
    println!("✓ Filter matched as expected");
}
