use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static INVITES_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("faxinar_invites_sent_total", "Invites handed to the mailer")
        .expect("register invites_sent_total")
});

pub static INVITES_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("faxinar_invites_failed_total", "Invite requests that were rejected or failed")
        .expect("register invites_failed_total")
});

pub static BULK_ROWS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("faxinar_bulk_rows_total", "CSV rows processed by bulk invite")
        .expect("register bulk_rows_total")
});

/// Force registration so every counter shows up at 0 before first use.
pub fn init() {
    Lazy::force(&INVITES_SENT_TOTAL);
    Lazy::force(&INVITES_FAILED_TOTAL);
    Lazy::force(&BULK_ROWS_TOTAL);
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
