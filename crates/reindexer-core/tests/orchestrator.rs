//! Orchestrator behavior against in-memory store targets.

use reindexer_core::{
    Orchestrator, QueryWindow, RawRow, RowStream, RunError, SourceKind, Stage, StoreAdapter,
    StoreError, StoreTarget, TargetOutcome,
};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Target serving a fixed set of rows and recording every call.
struct FakeTarget {
    kind: SourceKind,
    rows: Vec<RawRow>,
    fail_connect: bool,
    fail_query: bool,
    connects: Cell<u32>,
    log: Option<Rc<RefCell<Vec<SourceKind>>>>,
}

impl FakeTarget {
    fn new(kind: SourceKind, rows: Vec<RawRow>) -> Self {
        Self {
            kind,
            rows,
            fail_connect: false,
            fail_query: false,
            connects: Cell::new(0),
            log: None,
        }
    }
}

struct FakeAdapter<'a> {
    target: &'a FakeTarget,
}

impl StoreAdapter for FakeAdapter<'_> {
    fn execute(&mut self, _window: &QueryWindow) -> Result<RowStream<'_>, StoreError> {
        if self.target.fail_query {
            return Err(StoreError::query("view not found").with_remediation("emit(ts, version)"));
        }
        Ok(Box::new(self.target.rows.clone().into_iter()))
    }
}

impl StoreTarget for FakeTarget {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn endpoint(&self) -> String {
        format!("fake://{}", self.kind)
    }

    fn connect(&self) -> Result<Box<dyn StoreAdapter + '_>, StoreError> {
        self.connects.set(self.connects.get() + 1);
        if let Some(log) = &self.log {
            log.borrow_mut().push(self.kind);
        }
        if self.fail_connect {
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            return Err(StoreError::connection(self.endpoint(), io));
        }
        Ok(Box::new(FakeAdapter { target: self }))
    }
}

fn view_rows(n: usize) -> Vec<RawRow> {
    ["a", "b", "c", "d", "e", "f", "g"]
        .iter()
        .take(n)
        .map(|id| json!({ "id": format!("HangerInfo::{}", id), "value": format!("SCHEME1:{}:v1", id) }))
        .collect()
}

fn search_rows(ids: &[&str]) -> Vec<RawRow> {
    ids.iter().map(|id| json!({ "id": id })).collect()
}

fn lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn limited_window_emits_only_limit_rows() {
    let target = FakeTarget::new(SourceKind::ViewStore, view_rows(5));
    let window = QueryWindow {
        limit: Some(2),
        skip: 0,
        id_prefix: "mutation".to_string(),
        ..QueryWindow::default()
    };

    let mut out = Vec::new();
    let report = Orchestrator::new(&window)
        .with_target(&target)
        .run(&mut out, &mut |_: &str| true)
        .unwrap();

    assert_eq!(
        lines(&out),
        vec!["mutation:SCHEME1:a:v1", "mutation:SCHEME1:b:v1"]
    );
    assert_eq!(report.targets.len(), 1);
    assert_eq!(report.targets[0].rows_consumed(), 2);
    assert_eq!(report.targets[0].resume().unwrap().next_skip, 2);
    assert!(report.is_success());
}

#[test]
fn predicate_halt_counts_only_consumed_rows() {
    let target = FakeTarget::new(SourceKind::ViewStore, view_rows(5));
    let window = QueryWindow {
        limit: Some(10),
        skip: 40,
        ..QueryWindow::default()
    };

    let mut seen = Vec::new();
    let mut out = Vec::new();
    let report = Orchestrator::new(&window)
        .with_target(&target)
        .run(&mut out, &mut |id: &str| {
            seen.push(id.to_string());
            false
        })
        .unwrap();

    assert_eq!(seen, vec!["SCHEME1:a:v1"]);
    assert_eq!(lines(&out), vec!["SCHEME1:a:v1"]);
    match &report.targets[0].outcome {
        TargetOutcome::Completed {
            rows_consumed,
            halted,
            resume,
        } => {
            assert_eq!(*rows_consumed, 1);
            assert!(*halted);
            assert_eq!(resume.unwrap().next_skip, 41);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn unlimited_window_streams_everything_without_cursor() {
    let target = FakeTarget::new(SourceKind::SearchIndex, search_rows(&["onecms:1", "onecms:2", "onecms:3"]));
    let window = QueryWindow {
        limit: None,
        ..QueryWindow::default()
    };

    let mut out = Vec::new();
    let report = Orchestrator::new(&window)
        .with_target(&target)
        .run(&mut out, &mut |_: &str| true)
        .unwrap();

    assert_eq!(lines(&out), vec!["onecms:1", "onecms:2", "onecms:3"]);
    assert_eq!(report.targets[0].rows_consumed(), 3);
    assert!(report.targets[0].resume().is_none());
}

#[test]
fn view_store_runs_before_search_index() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut search = FakeTarget::new(SourceKind::SearchIndex, search_rows(&["onecms:s"]));
    search.log = Some(Rc::clone(&log));
    let mut view = FakeTarget::new(SourceKind::ViewStore, view_rows(1));
    view.log = Some(Rc::clone(&log));

    let window = QueryWindow::default();
    let mut out = Vec::new();
    let report = Orchestrator::new(&window)
        .with_target(&search)
        .with_target(&view)
        .run(&mut out, &mut |_: &str| true)
        .unwrap();

    assert_eq!(*log.borrow(), vec![SourceKind::ViewStore, SourceKind::SearchIndex]);
    assert_eq!(lines(&out), vec!["SCHEME1:a:v1", "onecms:s"]);
    assert_eq!(report.targets[0].kind, SourceKind::ViewStore);
    assert_eq!(report.targets[1].kind, SourceKind::SearchIndex);
}

#[test]
fn connection_failure_does_not_stop_other_target() {
    let mut view = FakeTarget::new(SourceKind::ViewStore, view_rows(3));
    view.fail_connect = true;
    let search = FakeTarget::new(SourceKind::SearchIndex, search_rows(&["onecms:x"]));

    let window = QueryWindow {
        limit: Some(5),
        ..QueryWindow::default()
    };
    let mut out = Vec::new();
    let report = Orchestrator::new(&window)
        .with_target(&view)
        .with_target(&search)
        .run(&mut out, &mut |_: &str| true)
        .unwrap();

    assert_eq!(lines(&out), vec!["onecms:x"]);
    assert!(!report.is_success());
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, SourceKind::ViewStore);
    assert!(matches!(
        failures[0].outcome,
        TargetOutcome::Failed {
            stage: Stage::Connect,
            error: StoreError::Connection { .. }
        }
    ));
    assert_eq!(search.connects.get(), 1);
}

#[test]
fn query_failure_keeps_remediation_and_emits_nothing() {
    let mut view = FakeTarget::new(SourceKind::ViewStore, view_rows(3));
    view.fail_query = true;

    let window = QueryWindow::default();
    let mut out = Vec::new();
    let report = Orchestrator::new(&window)
        .with_target(&view)
        .run(&mut out, &mut |_: &str| true)
        .unwrap();

    assert!(out.is_empty());
    match &report.targets[0].outcome {
        TargetOutcome::Failed { stage, error } => {
            assert_eq!(*stage, Stage::Query);
            assert_eq!(error.remediation(), Some("emit(ts, version)"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn malformed_row_aborts_the_run() {
    let view = FakeTarget::new(SourceKind::ViewStore, vec![json!({ "id": "no-value" })]);
    let search = FakeTarget::new(SourceKind::SearchIndex, search_rows(&["onecms:x"]));

    let window = QueryWindow::default();
    let mut out = Vec::new();
    let err = Orchestrator::new(&window)
        .with_target(&view)
        .with_target(&search)
        .run(&mut out, &mut |_: &str| true)
        .unwrap_err();

    assert!(matches!(err, RunError::RowShape(_)));
    assert!(out.is_empty());
    assert_eq!(search.connects.get(), 0);
}
