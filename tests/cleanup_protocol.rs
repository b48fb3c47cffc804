use repage::headers;
use repage::{
    AckOutcome, AppConfig, JsonCodec, MemorySink, PaginationApp, RawRecord, RecordContext,
    RecordHeaders, RouteConfig, SizeGuard,
};
use std::cell::RefCell;
use std::rc::Rc;

const TS: i64 = 1_700_000_000_000;

fn app() -> PaginationApp<JsonCodec> {
    let config = AppConfig {
        registration_topic: "pagination-consumers".to_string(),
        ack_topic: "pagination-ack".to_string(),
        max_open_ms: 3_600_000,
        routes: vec![RouteConfig {
            input: "invoices".to_string(),
            output: "invoices-completed".to_string(),
            repartitions: 2,
            retention_ms: 600_000,
            window_ms: 60_000,
            retain_duplicates: false,
        }],
    };
    let sink = Rc::new(RefCell::new(MemorySink::new()));
    PaginationApp::new(config, JsonCodec, SizeGuard::new(1024), move |_| {
        Box::new(Rc::clone(&sink))
    })
    .unwrap()
}

fn page(pagination_id: &str, message_id: &str, page_number: i64, total_elements: i64) -> RawRecord {
    let mut bag = RecordHeaders::new();
    bag.add(headers::ORIGIN, "billing-exporter".as_bytes());
    bag.add(headers::PAGINATION_ID, pagination_id.as_bytes());
    bag.add(headers::MESSAGE_ID, message_id.as_bytes());
    bag.add_integer(headers::PAGE_NUMBER, page_number);
    bag.add_integer(headers::PAGE_SIZE, 100);
    if total_elements >= 0 {
        bag.add_integer(headers::TOTAL_ELEMENTS, total_elements);
    }
    RawRecord::new(Some(b"k".to_vec()), Some(b"payload".to_vec()), TS, bag)
}

fn complete_pagination(app: &mut PaginationApp<JsonCodec>, pagination_id: &str) {
    let ctx = RecordContext::new("invoices", 0, 1);
    app.process_record(page(pagination_id, "m1", 1, -1), &ctx, 1_000)
        .unwrap();
    app.process_record(page(pagination_id, "m2", 2, 2), &ctx, 2_000)
        .unwrap();
}

#[test]
fn cleanup_fires_once_every_registered_consumer_acked() {
    let mut app = app();
    complete_pagination(&mut app, "P1");
    app.process_registration(Some("P1"), Some("c1"), 3_000).unwrap();
    app.process_registration(Some("P1"), Some("c2"), 3_100).unwrap();

    let first = app.process_ack(Some("P1"), Some("c1"), 4_000).unwrap();
    assert_eq!(first, vec![AckOutcome::Pending { acked: 1, registered: 2 }]);

    let second = app.process_ack(Some("P1"), Some("c2"), 5_000).unwrap();
    assert_eq!(second, vec![AckOutcome::CleanedUp { references_deleted: 2 }]);

    let unit = app.route("invoices").unwrap().unit_for("P1");
    assert!(unit.pages().is_empty());
    assert!(unit.metadata().is_empty());
    assert!(unit.summaries().is_empty());
    assert!(unit.registrations().is_empty());
    assert!(unit.acks().is_empty());
}

#[test]
fn ack_without_any_registration_is_recorded_but_ignored() {
    let mut app = app();
    complete_pagination(&mut app, "P1");

    let outcomes = app.process_ack(Some("P1"), Some("c1"), 4_000).unwrap();
    assert_eq!(outcomes, vec![AckOutcome::Unregistered]);

    let unit = app.route("invoices").unwrap().unit_for("P1");
    assert!(unit.acks().get("P1").unwrap().contains("c1"));
    assert!(unit.summaries().get("P1").is_some());
    assert!(app
        .diag()
        .lines()
        .any(|line| line.contains("unregistered_ack")));
}

#[test]
fn unregistered_acker_never_blocks_the_consensus() {
    let mut app = app();
    complete_pagination(&mut app, "P1");
    app.process_registration(Some("P1"), Some("c1"), 3_000).unwrap();

    // A consumer that never registered acks first.
    let stray = app.process_ack(Some("P1"), Some("c9"), 4_000).unwrap();
    assert_eq!(stray, vec![AckOutcome::Pending { acked: 0, registered: 1 }]);

    let outcome = app.process_ack(Some("P1"), Some("c1"), 5_000).unwrap();
    assert_eq!(outcome, vec![AckOutcome::CleanedUp { references_deleted: 2 }]);
}

#[test]
fn acks_after_cleanup_find_nothing_and_leave_nothing() {
    let mut app = app();
    complete_pagination(&mut app, "P1");
    app.process_registration(Some("P1"), Some("c1"), 3_000).unwrap();
    app.process_ack(Some("P1"), Some("c1"), 4_000).unwrap();

    // A late redelivered ack arrives after everything was purged.
    let outcome = app.process_ack(Some("P1"), Some("c1"), 6_000).unwrap();
    assert_eq!(outcome, vec![AckOutcome::Unregistered]);
}

#[test]
fn consensus_without_a_summary_clears_the_event_sets() {
    let mut app = app();
    // Register and ack for a pagination whose pages never arrived.
    app.process_registration(Some("P9"), Some("c1"), 1_000).unwrap();
    let outcome = app.process_ack(Some("P9"), Some("c1"), 2_000).unwrap();
    assert_eq!(outcome, vec![AckOutcome::AlreadyClean]);

    let unit = app.route("invoices").unwrap().unit_for("P9");
    assert!(unit.registrations().is_empty());
    assert!(unit.acks().is_empty());
    assert!(app
        .diag()
        .lines()
        .any(|line| line.contains("summary_missing_at_cleanup")));
}

#[test]
fn blank_registration_and_ack_events_are_filtered() {
    let mut app = app();
    app.process_registration(None, Some("c1"), 1_000).unwrap();
    app.process_registration(Some("P1"), Some(""), 1_000).unwrap();
    assert!(app.process_ack(Some(""), Some("c1"), 1_000).unwrap().is_empty());
    assert!(app.process_ack(Some("P1"), None, 1_000).unwrap().is_empty());

    let unit = app.route("invoices").unwrap().unit_for("P1");
    assert!(unit.registrations().is_empty());
    assert!(unit.acks().is_empty());
}

#[test]
fn duplicate_registrations_and_acks_are_idempotent() {
    let mut app = app();
    complete_pagination(&mut app, "P1");
    app.process_registration(Some("P1"), Some("c1"), 3_000).unwrap();
    app.process_registration(Some("P1"), Some("c2"), 3_100).unwrap();
    app.process_registration(Some("P1"), Some("c1"), 3_200).unwrap();

    let repeated = app.process_ack(Some("P1"), Some("c1"), 4_000).unwrap();
    assert_eq!(repeated, vec![AckOutcome::Pending { acked: 1, registered: 2 }]);
    let repeated = app.process_ack(Some("P1"), Some("c1"), 4_100).unwrap();
    assert_eq!(repeated, vec![AckOutcome::Pending { acked: 1, registered: 2 }]);
}
