use std::collections::BTreeMap;

use benchhistory::{
    BenchmarkHistory, BenchmarkRecord, BenchmarkResult, DeltaKey, HistoryConfig, HistoryStore,
    RunSnapshot,
    bench_utils::day,
    presentation::{
        DeltaColumn, NO_HISTORY, TitleFormatter, cli_delta_string, history_columns, progress_row_extra,
        result_info_cell,
    },
};
use serde_json::json;

fn snapshot(d: i64, id: Option<&str>, avg: f64) -> RunSnapshot {
    let mut benchmarks = BTreeMap::new();
    benchmarks.insert(
        "bench".to_string(),
        BenchmarkRecord {
            total_ms: avg * 10.0,
            runs_count: 10,
            measured_runs_avg_ms: avg,
            measured_runs_ms: None,
            extras: Some(json!({ "p90": avg + 1.0, "label": "warm" })),
        },
    );
    RunSnapshot {
        date: day(d),
        id: id.map(str::to_string),
        run_extras: None,
        benchmarks,
    }
}

fn store() -> HistoryStore {
    HistoryStore::with_data(
        BenchmarkHistory {
            history: vec![snapshot(0, Some("v1"), 100.0), snapshot(1, None, 100.0)],
        },
        HistoryConfig::new().with_bench_extras(|r| json!({ "p90": r.measured_runs_avg_ms + 1.0 })),
    )
}

fn current(name: &str, avg: f64) -> BenchmarkResult {
    BenchmarkResult {
        name: name.into(),
        total_ms: avg * 10.0,
        runs_count: 10,
        measured_runs_avg_ms: avg,
        measured_runs_ms: vec![avg; 10],
    }
}

#[test]
fn test_cli_delta_string_slower() {
    let text = cli_delta_string(&store(), &current("bench", 110.0)).unwrap();
    assert_eq!(text, " ▲  +10% (10.0000ms)");
}

#[test]
fn test_cli_delta_string_faster() {
    let text = cli_delta_string(&store(), &current("bench", 95.0)).unwrap();
    assert_eq!(text, " ▼   -5% (5.0000ms)");
}

#[test]
fn test_cli_delta_string_no_history() {
    let text = cli_delta_string(&store(), &current("unknown", 1.0)).unwrap();
    assert_eq!(text, NO_HISTORY);
    assert_eq!(text.chars().count(), 19);
}

#[test]
fn test_progress_and_card_wrappers() {
    let store = store();
    let result = current("bench", 110.0);
    assert_eq!(
        progress_row_extra(&store, &result).unwrap(),
        " [ ▲  +10% (10.0000ms)]"
    );
    assert_eq!(
        result_info_cell(&store, &result).unwrap(),
        "   ▲  +10% (10.0000ms)"
    );
}

#[test]
fn test_delta_column_titles() {
    assert_eq!(DeltaColumn::default().title(), "Change in average");
    assert_eq!(
        DeltaColumn::new(Some(DeltaKey::extra("p90"))).title(),
        "Change in p90"
    );
}

#[test]
fn test_delta_column_cells() {
    let store = store();
    let column = DeltaColumn::default();
    assert_eq!(
        column.cell(&store, &current("bench", 110.0)).unwrap(),
        "🔺 \u{2000}+10% (10.0000ms)"
    );
    assert_eq!(
        column.cell(&store, &current("bench", 95.0)).unwrap(),
        "🟢\u{2009} \u{2000}\u{2000}-5% (5.0000ms)"
    );
    assert_eq!(column.cell(&store, &current("missing", 1.0)).unwrap(), "-");
}

#[test]
fn test_delta_column_extra_key() {
    let store = store();
    let column = DeltaColumn::new(Some(DeltaKey::extra("p90")));
    let cell = column.cell(&store, &current("bench", 201.0)).unwrap();
    assert_eq!(cell, "🔺 +100% (101.0000ms)");
}

#[test]
fn test_history_columns_titles_and_cells() {
    let store = store();
    let columns = history_columns(&store, None, None);
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].title, "v1");
    assert_eq!(columns[1].title, "2020-09-02<br/>12:00:00.000");
    assert_eq!(columns[0].cell("bench"), "100.0000");
    assert_eq!(columns[0].cell("other"), "-");
}

#[test]
fn test_history_columns_extra_key_and_formatter() {
    let store = store();
    let formatter: &TitleFormatter =
        &|date, id| format!("{}:{}", date.format("%m-%d"), id.unwrap_or("?"));
    let columns = history_columns(&store, Some(DeltaKey::extra("p90")), Some(formatter));
    assert_eq!(columns[0].title, "09-01:v1");
    assert_eq!(columns[1].title, "09-02:?");
    assert_eq!(columns[0].cell("bench"), "101.0000");

    let labels = history_columns(&store, Some(DeltaKey::extra("label")), None);
    assert_eq!(labels[0].cell("bench"), "warm");
    let missing = history_columns(&store, Some(DeltaKey::extra("nope")), None);
    assert_eq!(missing[0].cell("bench"), "-");
}

#[test]
fn test_history_columns_empty_store() {
    let store = HistoryStore::new(HistoryConfig::new());
    assert!(history_columns(&store, None, None).is_empty());
}
