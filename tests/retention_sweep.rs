// tests/retention_sweep.rs

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{make_keyword, t0, MockStore};
use trend_keyword_service::clock::{Clock, ManualClock};
use trend_keyword_service::retention::RetentionSweeper;

fn sweeper_with_rows(rows: Vec<trend_keyword_service::TrendKeyword>) -> (RetentionSweeper, Arc<MockStore>) {
    let store = Arc::new(MockStore::default());
    store.seed(rows);
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(t0()));
    (RetentionSweeper::new(store.clone(), clock), store)
}

#[tokio::test]
async fn sweep_deletes_exactly_the_rows_past_the_cutoff() {
    let (sweeper, store) = sweeper_with_rows(vec![
        make_keyword("design", "ancient", t0() - Duration::days(45)),
        make_keyword("design", "old", t0() - Duration::days(31)),
        make_keyword("design", "recent", t0() - Duration::days(5)),
        make_keyword("portrait", "fresh", t0() - Duration::hours(1)),
    ]);

    let deleted = sweeper.sweep(30).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.row_count(), 2);

    // Nothing further to delete on a repeat run.
    assert_eq!(sweeper.sweep(30).await.unwrap(), 0);
}

#[tokio::test]
async fn non_positive_retention_is_a_no_op() {
    let (sweeper, store) = sweeper_with_rows(vec![make_keyword(
        "design",
        "ancient",
        t0() - Duration::days(400),
    )]);

    assert_eq!(sweeper.sweep(0).await.unwrap(), 0);
    assert_eq!(sweeper.sweep(-3).await.unwrap(), 0);
    assert_eq!(store.row_count(), 1);
}

#[tokio::test]
async fn boundary_row_exactly_at_cutoff_survives() {
    let (sweeper, store) = sweeper_with_rows(vec![make_keyword(
        "design",
        "edge",
        t0() - Duration::days(30),
    )]);

    // delete targets timestamp < cutoff; an exact-cutoff row stays.
    assert_eq!(sweeper.sweep(30).await.unwrap(), 0);
    assert_eq!(store.row_count(), 1);
}
