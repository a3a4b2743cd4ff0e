use super::*;

fn sample_row_batches() -> SqlResult {
    SqlResult::RowBatches(vec![
        RowBatch {
            columns: vec!["id".into(), "scheduled_at".into()],
            rows: vec![
                vec![SqlValue::Text("a".into()), SqlValue::Integer(10)],
                vec![SqlValue::Text("b".into()), SqlValue::Integer(20)],
            ],
        },
        RowBatch {
            columns: vec!["id".into(), "scheduled_at".into()],
            rows: vec![vec![SqlValue::Text("c".into()), SqlValue::Integer(30)]],
        },
    ])
}

fn sample_named_results() -> SqlResult {
    SqlResult::NamedResults {
        column_names: vec!["id".into(), "scheduled_at".into()],
        results: vec![
            vec![SqlValue::Text("a".into()), SqlValue::Integer(10)],
            vec![SqlValue::Text("b".into()), SqlValue::Integer(20)],
            vec![SqlValue::Text("c".into()), SqlValue::Integer(30)],
        ],
    }
}

fn sample_cursor() -> SqlResult {
    SqlResult::Cursor(vec![
        Row(vec![("id".into(), SqlValue::Text("a".into())), ("scheduled_at".into(), SqlValue::Integer(10))]),
        Row(vec![("id".into(), SqlValue::Text("b".into())), ("scheduled_at".into(), SqlValue::Integer(20))]),
        Row(vec![("id".into(), SqlValue::Text("c".into())), ("scheduled_at".into(), SqlValue::Integer(30))]),
    ])
}

fn ids(rows: &[Row]) -> Vec<&str> {
    rows.iter().map(|r| r.get_text("id").unwrap_or_default()).collect()
}

#[test]
fn row_batches_flatten_across_batches_in_order() {
    let rows = sample_row_batches().normalize();
    assert_eq!(ids(&rows), vec!["a", "b", "c"]);
    assert_eq!(rows[1].get_i64("scheduled_at"), Some(20));
}

#[test]
fn named_results_and_row_batches_normalize_identically() {
    let from_batches = sample_row_batches().normalize();
    let from_named = sample_named_results().normalize();
    assert_eq!(ids(&from_batches), ids(&from_named));
    for (a, b) in from_batches.iter().zip(from_named.iter()) {
        assert_eq!(a.get_i64("scheduled_at"), b.get_i64("scheduled_at"));
    }
}

#[test]
fn cursor_rows_pass_through_unchanged() {
    let from_batches = sample_row_batches().normalize();
    let from_cursor = sample_cursor().normalize();
    assert_eq!(ids(&from_batches), ids(&from_cursor));
}

#[test]
fn all_three_shapes_agree_on_the_same_logical_result() {
    let shapes = vec![sample_row_batches().normalize(), sample_named_results().normalize(), sample_cursor().normalize()];
    let baseline = ids(&shapes[0]);
    for shape in &shapes[1..] {
        assert_eq!(ids(shape), baseline);
    }
}

#[test]
fn row_get_returns_none_for_missing_column() {
    let row = Row(vec![("id".into(), SqlValue::Text("a".into()))]);
    assert!(row.get("missing").is_none());
    assert_eq!(row.get_i64("id"), None);
}

#[test]
fn sql_value_from_option_none_is_null() {
    let v: SqlValue = Option::<i64>::None.into();
    assert_eq!(v, SqlValue::Null);
    let v: SqlValue = Some(5i64).into();
    assert_eq!(v, SqlValue::Integer(5));
}
