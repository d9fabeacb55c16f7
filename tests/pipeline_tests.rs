//! End-to-end tests for the generation pipeline: row/cell counts, the flat
//! cell-id bijection, partial-publish ordering, completion, cancellation,
//! and the concurrent-run guard.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::cast_precision_loss
)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use tokio::sync::oneshot;

use gridfeed::{
    BufferSink, CancelToken, CellValue, ColumnSchema, EagerYield, GenerateConfig, Generator,
    GridFeedError, JsonRecordSource, NeverYield, Priority, RawRecord, RecordSource, Row, RowSink,
    YieldScheduler,
};

// ============================================================================
// Test doubles
// ============================================================================

/// In-memory source over pre-built raw records.
struct VecSource {
    records: Vec<RawRecord>,
}

impl RecordSource for VecSource {
    async fn fetch(&self) -> gridfeed::Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

/// Source that always rejects.
struct FailSource;

impl RecordSource for FailSource {
    async fn fetch(&self) -> gridfeed::Result<Vec<RawRecord>> {
        Err(GridFeedError::Source("transport rejected".to_string()))
    }
}

/// Sink that records every snapshot it receives.
#[derive(Default)]
struct CollectSink {
    publishes: Vec<(Vec<Row>, bool)>,
}

impl RowSink for CollectSink {
    fn publish(&mut self, rows: &[Row], partial: bool) {
        self.publishes.push((rows.to_vec(), partial));
    }
}

/// Scheduler whose first suspension parks on a oneshot until released.
struct GatedYield {
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl GatedYield {
    fn new(gate: oneshot::Receiver<()>) -> Self {
        Self {
            gate: RefCell::new(Some(gate)),
        }
    }
}

impl YieldScheduler for GatedYield {
    fn should_yield(&self, _priority: Priority) -> bool {
        true
    }

    async fn yield_control(&self, _priority: Priority) {
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

fn synth_record(i: usize) -> RawRecord {
    let f = i as f64;
    RawRecord {
        key: format!("TCK{i}"),
        attrs: json!({
            "company_name": format!("Company {i}"),
            "market_cap": 100.0 + f,
            "enterprise_value": 120.0 + f,
            "valuation": { "pe": 10.0, "pb": 2.0, "ps": 3.0, "ev_s": 3.5, "ev_fcf": 18.0 },
            "margins": {
                "gross_margin": 0.4, "operating_margin": 0.2, "fcf_margin": 0.15,
                "gross_margin_median": 0.38, "operating_margin_median": 0.19,
                "fcf_margin_median": 0.14
            },
            "returns": { "roic": 0.12, "roa": 0.08, "roe": 0.2, "roce": 0.15, "rotce": 0.22 },
            "capital_structure": {
                "assets_to_equity": 2.5, "debt_to_equity": 1.1, "debt_to_assets": 0.4
            },
            "growth_10yr": {
                "revenue_growth": 0.07, "asset_growth": 0.05,
                "eps_growth": 0.1, "fcf_growth": 0.09
            },
            "shareholder_returns": { "dividend_payout_ratio": 30.0, "buybacks": 0.02 }
        }),
    }
}

fn synth_source(n: usize) -> VecSource {
    VecSource {
        records: (0..n).map(synth_record).collect(),
    }
}

// ============================================================================
// Counts and addressing
// ============================================================================

#[tokio::test]
async fn test_final_collection_has_n_rows_of_w_cells() {
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = BufferSink::new();
    let summary = generator
        .run(
            &synth_source(137),
            &NeverYield,
            &mut sink,
            &CancelToken::new(),
            || {},
        )
        .await
        .unwrap();

    assert_eq!(summary.rows, 137);
    assert_eq!(summary.cells, 137 * 29);
    assert_eq!(sink.rows().len(), 137);
    for row in sink.rows() {
        assert_eq!(row.cells.len(), 29);
    }
}

#[tokio::test]
async fn test_cell_ids_form_a_bijection() {
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = BufferSink::new();
    generator
        .run(
            &synth_source(50),
            &NeverYield,
            &mut sink,
            &CancelToken::new(),
            || {},
        )
        .await
        .unwrap();

    let mut seen = std::collections::HashSet::new();
    for (row_idx, row) in sink.rows().iter().enumerate() {
        assert_eq!(row.id, row_idx as u64);
        for (col, cell) in row.cells.iter().enumerate() {
            assert_eq!(cell.id, row_idx as u64 * 29 + col as u64);
            assert!(seen.insert(cell.id), "duplicate cell id {}", cell.id);
        }
    }
    assert_eq!(seen.len(), 50 * 29);
}

#[tokio::test]
async fn test_rows_follow_source_order() {
    let generator = Generator::new(ColumnSchema::stock());
    let source = JsonRecordSource::new(
        r#"{"ZZZ": {"company_name": "Last Alphabetically"},
            "AAA": {"company_name": "First Alphabetically"}}"#,
    );
    let mut sink = BufferSink::new();
    generator
        .run(&source, &NeverYield, &mut sink, &CancelToken::new(), || {})
        .await
        .unwrap();

    assert_eq!(sink.rows()[0].cells[0].v, CellValue::Text("ZZZ".to_string()));
    assert_eq!(sink.rows()[1].cells[0].v, CellValue::Text("AAA".to_string()));
}

// ============================================================================
// Publish ordering
// ============================================================================

#[tokio::test]
async fn test_25k_records_batch_10k_publishes_two_partials_one_final() {
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = CollectSink::default();
    let completions = Cell::new(0_u32);

    let summary = generator
        .run(
            &synth_source(25_000),
            &EagerYield,
            &mut sink,
            &CancelToken::new(),
            || completions.set(completions.get() + 1),
        )
        .await
        .unwrap();

    assert_eq!(summary.rows, 25_000);
    assert_eq!(summary.cells, 25_000 * 29);
    assert_eq!(summary.partial_publishes, 2);
    assert_eq!(completions.get(), 1);

    // Two partials (after rows 10k and 20k), then exactly one final.
    assert_eq!(sink.publishes.len(), 3);
    assert_eq!(sink.publishes[0].0.len(), 10_000);
    assert!(sink.publishes[0].1);
    assert_eq!(sink.publishes[1].0.len(), 20_000);
    assert!(sink.publishes[1].1);
    assert_eq!(sink.publishes[2].0.len(), 25_000);
    assert!(!sink.publishes[2].1);
}

#[tokio::test]
async fn test_partial_publishes_are_strict_prefixes_of_final() {
    let generator = Generator::with_config(
        ColumnSchema::stock(),
        GenerateConfig {
            batch_size: 100,
            priority: Priority::Background,
        },
    );
    let mut sink = CollectSink::default();
    generator
        .run(
            &synth_source(450),
            &EagerYield,
            &mut sink,
            &CancelToken::new(),
            || {},
        )
        .await
        .unwrap();

    let (final_rows, final_partial) = sink.publishes.last().unwrap();
    assert!(!*final_partial);
    for (rows, partial) in &sink.publishes[..sink.publishes.len() - 1] {
        assert!(*partial);
        assert!(rows.len() < final_rows.len());
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row, &final_rows[i]);
        }
    }
}

#[tokio::test]
async fn test_no_yield_means_no_partials() {
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = CollectSink::default();
    generator
        .run(
            &synth_source(25_000),
            &NeverYield,
            &mut sink,
            &CancelToken::new(),
            || {},
        )
        .await
        .unwrap();

    assert_eq!(sink.publishes.len(), 1);
    assert!(!sink.publishes[0].1);
}

#[tokio::test]
async fn test_empty_source_publishes_one_empty_final() {
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = CollectSink::default();
    let summary = generator
        .run(
            &synth_source(0),
            &EagerYield,
            &mut sink,
            &CancelToken::new(),
            || {},
        )
        .await
        .unwrap();

    assert_eq!(summary.rows, 0);
    assert_eq!(sink.publishes.len(), 1);
    assert!(!sink.publishes[0].1);
    assert!(sink.publishes[0].0.is_empty());
}

// ============================================================================
// Failure semantics
// ============================================================================

#[tokio::test]
async fn test_source_failure_propagates_with_zero_publishes() {
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = CollectSink::default();
    let completed = Cell::new(false);

    let err = generator
        .run(
            &FailSource,
            &EagerYield,
            &mut sink,
            &CancelToken::new(),
            || completed.set(true),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GridFeedError::Source(_)));
    assert!(sink.publishes.is_empty());
    assert!(!completed.get());
    assert!(!generator.is_active());
}

#[tokio::test]
async fn test_malformed_numeric_field_yields_sentinel_cell() {
    let generator = Generator::new(ColumnSchema::stock());
    let source = JsonRecordSource::new(
        r#"{"BAD": {"company_name": "Broken Corp",
                    "margins": {"operating_margin": 0.2}}}"#,
    );
    let mut sink = BufferSink::new();
    let summary = generator
        .run(&source, &NeverYield, &mut sink, &CancelToken::new(), || {})
        .await
        .unwrap();

    // The run succeeds; only the affected cells carry the sentinel.
    assert_eq!(summary.rows, 1);
    let row = &sink.rows()[0];
    assert_eq!(row.cells[9].v, CellValue::Text("NaN%".to_string())); // Gross Margin
    assert_eq!(row.cells[10].v, CellValue::Text("20.0%".to_string())); // Operating Margin
    assert_eq!(row.cells[2].v, CellValue::Text("NaN".to_string())); // Market Cap (M)
}

// ============================================================================
// Cancellation and the run guard
// ============================================================================

#[tokio::test]
async fn test_cancellation_at_yield_boundary() {
    let generator = Generator::with_config(
        ColumnSchema::stock(),
        GenerateConfig {
            batch_size: 10,
            priority: Priority::Background,
        },
    );
    let mut sink = CollectSink::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let completed = Cell::new(false);

    let err = generator
        .run(&synth_source(25), &EagerYield, &mut sink, &cancel, || {
            completed.set(true);
        })
        .await
        .unwrap_err();

    // Cancellation wins at the first boundary, before any publish.
    assert!(matches!(err, GridFeedError::Cancelled));
    assert!(sink.publishes.is_empty());
    assert!(!completed.get());
    assert!(!generator.is_active());
}

#[tokio::test]
async fn test_cancellation_honored_when_scheduler_never_yields() {
    // The boundary check must not depend on the host asking for the
    // thread back: a cancelled run must not publish a final snapshot or
    // fire the completion callback even under a scheduler that declines
    // every yield.
    let generator = Generator::with_config(
        ColumnSchema::stock(),
        GenerateConfig {
            batch_size: 10,
            priority: Priority::Background,
        },
    );
    let mut sink = CollectSink::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let completed = Cell::new(false);

    let err = generator
        .run(&synth_source(100), &NeverYield, &mut sink, &cancel, || {
            completed.set(true);
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GridFeedError::Cancelled));
    assert!(sink.publishes.is_empty());
    assert!(!completed.get());
    assert!(!generator.is_active());
}

/// Scheduler that requests cancellation while the task is suspended.
struct CancelDuringSuspension {
    token: CancelToken,
}

impl YieldScheduler for CancelDuringSuspension {
    fn should_yield(&self, _priority: Priority) -> bool {
        true
    }

    async fn yield_control(&self, _priority: Priority) {
        self.token.cancel();
    }
}

#[tokio::test]
async fn test_cancellation_during_suspension_keeps_partial_drops_final() {
    let generator = Generator::with_config(
        ColumnSchema::stock(),
        GenerateConfig {
            batch_size: 10,
            priority: Priority::Background,
        },
    );
    let mut sink = CollectSink::default();
    let cancel = CancelToken::new();
    let scheduler = CancelDuringSuspension {
        token: cancel.clone(),
    };
    let completed = Cell::new(false);

    let err = generator
        .run(&synth_source(25), &scheduler, &mut sink, &cancel, || {
            completed.set(true);
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GridFeedError::Cancelled));
    // The partial published before suspending is allowed; no final follows.
    assert_eq!(sink.publishes.len(), 1);
    assert!(sink.publishes[0].1);
    assert_eq!(sink.publishes[0].0.len(), 10);
    assert!(!completed.get());
    assert!(!generator.is_active());
}

#[tokio::test]
async fn test_second_run_rejected_while_first_is_suspended() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let generator = Rc::new(Generator::with_config(
                ColumnSchema::stock(),
                GenerateConfig {
                    batch_size: 10,
                    priority: Priority::Background,
                },
            ));
            let (release, gate) = oneshot::channel();

            let first = {
                let generator = Rc::clone(&generator);
                tokio::task::spawn_local(async move {
                    let mut sink = BufferSink::new();
                    generator
                        .run(
                            &synth_source(25),
                            &GatedYield::new(gate),
                            &mut sink,
                            &CancelToken::new(),
                            || {},
                        )
                        .await
                })
            };

            // Let the first run reach its suspension point.
            tokio::task::yield_now().await;
            assert!(generator.is_active());

            let mut sink = BufferSink::new();
            let err = generator
                .run(
                    &synth_source(5),
                    &NeverYield,
                    &mut sink,
                    &CancelToken::new(),
                    || {},
                )
                .await
                .unwrap_err();
            assert!(matches!(err, GridFeedError::RunInFlight));
            assert_eq!(sink.final_publishes(), 0);

            release.send(()).unwrap();
            let summary = first.await.unwrap().unwrap();
            assert_eq!(summary.rows, 25);
            assert!(!generator.is_active());
        })
        .await;
}

#[tokio::test]
async fn test_generator_is_reusable_after_a_run_finishes() {
    let generator = Generator::new(ColumnSchema::stock());
    for _ in 0..2 {
        let mut sink = BufferSink::new();
        let summary = generator
            .run(
                &synth_source(3),
                &NeverYield,
                &mut sink,
                &CancelToken::new(),
                || {},
            )
            .await
            .unwrap();
        assert_eq!(summary.rows, 3);
    }
}
