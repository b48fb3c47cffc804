use chrono::{TimeZone, Utc};
use repage::{MessageHeaders, PageObservation, PaginationStatus, PaginationSummary, UNKNOWN_TOTAL};

fn page(pagination_id: &str, message_id: &str, page_number: i64, total_elements: i64) -> MessageHeaders {
    MessageHeaders {
        origin: "billing-exporter".to_string(),
        pagination_id: pagination_id.to_string(),
        message_id: message_id.to_string(),
        composite_key: format!("{pagination_id}@{message_id}"),
        topic: "invoices".to_string(),
        offset: 0,
        partition: 0,
        message_time: Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap(),
        total_elements,
        page_size: 100,
        page_number,
        key_size: 2,
        value_size: 10,
        original_key_size: 2,
        original_value_size: 10,
    }
}

#[test]
fn first_page_without_totals_stays_open() {
    let summary = PaginationSummary::first_page(&page("P1", "m1", 1, -1));
    assert_eq!(summary.status, PaginationStatus::Open);
    assert_eq!(summary.total_pages, UNKNOWN_TOTAL);
    assert_eq!(summary.total_elements, UNKNOWN_TOTAL);
    assert_eq!(summary.references, vec!["P1@m1".to_string()]);
    assert_eq!(summary.total_size, 12);
}

#[test]
fn single_page_pagination_completes_immediately() {
    let summary = PaginationSummary::first_page(&page("P1", "m1", 1, 1));
    assert_eq!(summary.status, PaginationStatus::Completed);
    assert_eq!(summary.total_pages, 1);
    assert_eq!(summary.total_elements, 1);
}

#[test]
fn terminal_page_last_completes_the_summary() {
    let mut summary = PaginationSummary::first_page(&page("P1", "m1", 1, -1));
    let observation = summary.observe(&page("P1", "m2", 2, 2));
    assert!(observation.completed_now());
    assert_eq!(summary.status, PaginationStatus::Completed);
    assert_eq!(summary.total_pages, 2);
    assert_eq!(summary.total_size, 24);
}

#[test]
fn terminal_page_first_waits_for_the_rest() {
    let mut summary = PaginationSummary::first_page(&page("P1", "m3", 3, 3));
    assert_eq!(summary.status, PaginationStatus::Open);
    assert!(!summary.observe(&page("P1", "m1", 1, -1)).completed_now());
    assert!(summary.observe(&page("P1", "m2", 2, -1)).completed_now());
    assert_eq!(summary.status, PaginationStatus::Completed);
    assert_eq!(summary.references.len(), 3);
}

#[test]
fn redelivered_page_is_a_duplicate_no_op() {
    let mut summary = PaginationSummary::first_page(&page("P1", "m1", 1, -1));
    assert_eq!(summary.observe(&page("P1", "m1", 1, -1)), PageObservation::Duplicate);
    assert_eq!(summary.references.len(), 1);
    assert_eq!(summary.total_size, 12);
    assert_eq!(summary.status, PaginationStatus::Open);
}

#[test]
fn duplicates_cannot_fake_completion() {
    let mut summary = PaginationSummary::first_page(&page("P1", "m2", 2, 2));
    // The same first page redelivered twice must not count as two pages.
    assert_eq!(summary.observe(&page("P1", "m2", 2, 2)), PageObservation::Duplicate);
    assert_eq!(summary.status, PaginationStatus::Open);
    assert!(summary.observe(&page("P1", "m1", 1, -1)).completed_now());
}

#[test]
fn completion_is_monotone() {
    let mut summary = PaginationSummary::first_page(&page("P1", "m1", 1, 1));
    assert!(summary.is_completed());
    // A stray extra page never reopens a completed summary.
    let observation = summary.observe(&page("P1", "m9", 9, -1));
    assert_eq!(observation, PageObservation::Recorded { completed_now: false });
    assert!(summary.is_completed());
}

#[test]
fn totals_are_fixed_by_the_first_terminal_page() {
    let mut summary = PaginationSummary::first_page(&page("P1", "m1", 1, -1));
    summary.observe(&page("P1", "m3", 3, 3));
    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.total_elements, 3);
}
