//! Contract Test: Idempotency
//!
//! Present and CleanUp may be called any number of times with the same
//! request. Only the first successful call may change the provider.
//!
//! Constraints verified:
//! - Present twice → one record, two successes
//! - CleanUp twice → one delete call, two successes
//! - CleanUp before any Present → success, no delete call

mod common;

use common::*;
use dns01_core::Solver;

#[tokio::test]
async fn present_twice_creates_exactly_one_record() {
    let h = Harness::new().await;
    let zone = h.zone("example.com").await;

    h.solver.present(&present("abc123")).await.expect("first present");
    h.solver.present(&present("abc123")).await.expect("second present");

    assert_eq!(h.backend.create_calls(), 1, "second present must not create");
    assert_eq!(h.backend.records(&zone).await.len(), 1);
}

#[tokio::test]
async fn clean_up_twice_deletes_exactly_once() {
    let h = Harness::new().await;
    let zone = h.zone("example.com").await;
    h.txt(&zone, FQDN, "abc123").await;

    h.solver.clean_up(&clean_up("abc123")).await.expect("first cleanup");
    h.solver.clean_up(&clean_up("abc123")).await.expect("second cleanup");

    assert_eq!(h.backend.delete_calls(), 1, "second cleanup must not delete");
    assert!(h.backend.records(&zone).await.is_empty());
}

#[tokio::test]
async fn clean_up_before_present_is_a_no_op() {
    let h = Harness::new().await;
    h.zone("example.com").await;

    h.solver.clean_up(&clean_up("abc123")).await.expect("cleanup");

    assert_eq!(h.backend.mutation_calls(), 0);
}

#[tokio::test]
async fn present_after_clean_up_republishes() {
    let h = Harness::new().await;
    let zone = h.zone("example.com").await;

    h.solver.present(&present("abc123")).await.unwrap();
    h.solver.clean_up(&clean_up("abc123")).await.unwrap();
    h.solver.present(&present("abc123")).await.unwrap();

    let records = h.backend.records(&zone).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "abc123");
    assert_eq!(h.backend.create_calls(), 2);
    assert_eq!(h.backend.delete_calls(), 1);
}

#[tokio::test]
async fn every_call_opens_its_own_session() {
    let h = Harness::new().await;
    h.zone("example.com").await;

    h.solver.present(&present("abc123")).await.unwrap();
    h.solver.present(&present("abc123")).await.unwrap();
    h.solver.clean_up(&clean_up("abc123")).await.unwrap();

    assert_eq!(h.backend.connect_calls(), 3);
    assert_eq!(h.backend.list_zones_calls(), 3);
    assert_eq!(h.backend.list_records_calls(), 3);
}
