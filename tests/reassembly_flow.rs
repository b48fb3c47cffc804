use repage::headers;
use repage::{
    AppConfig, JsonCodec, MemorySink, PaginationApp, PaginationStatus, PipelineError, RawRecord,
    RecordContext, RecordHeaders, RouteConfig, SizeGuard,
};
use std::cell::RefCell;
use std::rc::Rc;

const TS: i64 = 1_700_000_000_000;

fn config() -> AppConfig {
    AppConfig {
        registration_topic: "pagination-consumers".to_string(),
        ack_topic: "pagination-ack".to_string(),
        max_open_ms: 3_600_000,
        routes: vec![RouteConfig {
            input: "invoices".to_string(),
            output: "invoices-completed".to_string(),
            repartitions: 4,
            retention_ms: 600_000,
            window_ms: 60_000,
            retain_duplicates: false,
        }],
    }
}

fn app_with_sink() -> (PaginationApp<JsonCodec>, Rc<RefCell<MemorySink>>) {
    let sink = Rc::new(RefCell::new(MemorySink::new()));
    let handle = Rc::clone(&sink);
    let app = PaginationApp::new(config(), JsonCodec, SizeGuard::new(1024), move |_| {
        Box::new(Rc::clone(&handle))
    })
    .unwrap();
    (app, sink)
}

fn page(
    pagination_id: &str,
    message_id: &str,
    page_number: i64,
    total_elements: i64,
    payload: &[u8],
) -> RawRecord {
    let mut bag = RecordHeaders::new();
    bag.add(headers::ORIGIN, "billing-exporter".as_bytes());
    bag.add(headers::PAGINATION_ID, pagination_id.as_bytes());
    bag.add(headers::MESSAGE_ID, message_id.as_bytes());
    bag.add_integer(headers::PAGE_NUMBER, page_number);
    bag.add_integer(headers::PAGE_SIZE, 100);
    if total_elements >= 0 {
        bag.add_integer(headers::TOTAL_ELEMENTS, total_elements);
    }
    RawRecord::new(Some(b"k".to_vec()), Some(payload.to_vec()), TS, bag)
}

fn ctx(offset: i64) -> RecordContext {
    RecordContext::new("invoices", 0, offset)
}

#[test]
fn two_pages_in_order_complete_and_publish_once() {
    let (mut app, sink) = app_with_sink();
    let first = app
        .process_record(page("P1", "m1", 1, -1, b"aaa"), &ctx(1), 1_000)
        .unwrap();
    assert!(first.is_none());
    let second = app
        .process_record(page("P1", "m2", 2, 2, b"bbb"), &ctx(2), 2_000)
        .unwrap()
        .expect("terminal page should complete the pagination");
    assert_eq!(second.status, PaginationStatus::Completed);
    assert_eq!(
        second.references,
        vec!["P1@m1".to_string(), "P1@m2".to_string()]
    );

    let published = sink.borrow().published().to_vec();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "invoices-completed");
    assert_eq!(published[0].pagination_id, "P1");
}

#[test]
fn terminal_page_first_still_completes_exactly_once() {
    let (mut app, sink) = app_with_sink();
    assert!(app
        .process_record(page("P1", "m2", 2, 2, b"bbb"), &ctx(1), 1_000)
        .unwrap()
        .is_none());
    let completed = app
        .process_record(page("P1", "m1", 1, -1, b"aaa"), &ctx(2), 2_000)
        .unwrap()
        .expect("second page should complete the pagination");
    assert_eq!(
        completed.references,
        vec!["P1@m2".to_string(), "P1@m1".to_string()]
    );
    assert_eq!(sink.borrow().published().len(), 1);
}

#[test]
fn redelivery_neither_inflates_references_nor_republishes() {
    let (mut app, sink) = app_with_sink();
    app.process_record(page("P1", "m1", 1, -1, b"aaa"), &ctx(1), 1_000)
        .unwrap();
    app.process_record(page("P1", "m1", 1, -1, b"aaa"), &ctx(1), 1_100)
        .unwrap();
    app.process_record(page("P1", "m2", 2, 2, b"bbb"), &ctx(2), 2_000)
        .unwrap();
    // Redeliver the terminal page after completion.
    app.process_record(page("P1", "m2", 2, 2, b"bbb"), &ctx(2), 2_100)
        .unwrap();

    assert_eq!(sink.borrow().published().len(), 1);
    let route = app.route("invoices").unwrap();
    let unit = route.unit_for("P1");
    let tracked = unit.summaries().get("P1").unwrap();
    assert_eq!(tracked.summary.references.len(), 2);
}

#[test]
fn pages_land_in_page_and_metadata_stores() {
    let (mut app, _sink) = app_with_sink();
    app.process_record(page("P1", "m1", 1, -1, b"aaa"), &ctx(7), 1_000)
        .unwrap();
    let unit = app.route("invoices").unwrap().unit_for("P1");
    assert!(unit.pages().fetch("P1@m1", 1_500).is_some());
    let metadata = unit.metadata().get("P1@m1").unwrap();
    assert_eq!(metadata.message_id, "m1");
    assert_eq!(metadata.offset, 7);
    assert_eq!(metadata.topic, "invoices");
}

#[test]
fn oversized_record_is_dropped_before_any_store() {
    let (mut app, sink) = app_with_sink();
    let big = vec![0u8; 2048];
    assert!(app
        .process_record(page("P1", "m1", 1, 1, &big), &ctx(1), 1_000)
        .unwrap()
        .is_none());
    let unit = app.route("invoices").unwrap().unit_for("P1");
    assert!(unit.pages().is_empty());
    assert!(unit.metadata().is_empty());
    assert!(unit.summaries().is_empty());
    assert!(sink.borrow().published().is_empty());
    assert!(app
        .diag()
        .lines()
        .any(|line| line.contains("oversize_drop")));
}

#[test]
fn record_missing_ids_is_failed_not_fatal() {
    let (mut app, _sink) = app_with_sink();
    let record = RawRecord::new(None, Some(b"x".to_vec()), TS, RecordHeaders::new());
    assert!(app.process_record(record, &ctx(1), 1_000).unwrap().is_none());
    assert!(app
        .diag()
        .lines()
        .any(|line| line.contains("record_failed")));
}

#[test]
fn unknown_input_topic_is_an_error() {
    let (mut app, _sink) = app_with_sink();
    let err = app
        .process_record(
            page("P1", "m1", 1, -1, b"aaa"),
            &RecordContext::new("unknown", 0, 0),
            1_000,
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownInput { .. }));
}
