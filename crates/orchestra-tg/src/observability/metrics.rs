use super::GLOBAL_LABELS;

/// Histogram buckets for durations of requests and queries in seconds
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Starts the Prometheus exporter on `0.0.0.0:2000`
pub fn init_metrics() {
    let mut builder = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], 2000));

    builder = builder
        .set_buckets(DURATION_BUCKETS)
        .expect("BUG: histogram buckets must not be empty");

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    builder
        .install()
        .expect("BUG: failed to initialize the metrics listener");

    describe();
}

fn describe() {
    metrics::describe_counter!("tg_updates_total", "Number of updates received from Telegram");
    metrics::describe_counter!(
        "tg_updates_skipped_total",
        "Number of updates received from Telegram that no handler processed"
    );
    metrics::describe_counter!(
        "reminders_sent_total",
        "Number of reminder messages delivered to chat destinations"
    );
    metrics::describe_counter!(
        "slot_assignments_total",
        "Number of content items assigned to upload slots"
    );
    metrics::describe_histogram!(
        "db_query_duration_seconds",
        metrics::Unit::Seconds,
        "Duration of a single database query"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "Duration of a single outgoing HTTP request"
    );
}
