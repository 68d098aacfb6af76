use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const CONTENT_WRITES_TOTAL: &str = "tavola_content_writes_total";
pub const PLACED_FILES_TOTAL: &str = "tavola_upload_placed_files_total";
pub const UPLOAD_FAILURES_TOTAL: &str = "tavola_upload_failures_total";
pub const UPLOAD_BYTES: &str = "tavola_upload_bytes";
pub const REORDERS_TOTAL: &str = "tavola_collection_reorders_total";
pub const LOGIN_REJECTED_TOTAL: &str = "tavola_login_rejected_total";
pub const ADMIN_WRITES_TOTAL: &str = "tavola_http_admin_writes_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber for the configured format and level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("tracing subscriber already set: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            CONTENT_WRITES_TOTAL,
            Unit::Count,
            "Page documents written to the content store."
        );
        describe_counter!(
            PLACED_FILES_TOTAL,
            Unit::Count,
            "Uploaded files moved from staging to their destination."
        );
        describe_counter!(
            UPLOAD_FAILURES_TOTAL,
            Unit::Count,
            "Upload submissions rejected after parsing."
        );
        describe_histogram!(
            UPLOAD_BYTES,
            Unit::Bytes,
            "Size of each staged upload file."
        );
        describe_counter!(
            REORDERS_TOTAL,
            Unit::Count,
            "Ordered collection reorders accepted."
        );
        describe_counter!(
            LOGIN_REJECTED_TOTAL,
            Unit::Count,
            "Admin login attempts with a wrong password."
        );
        describe_counter!(
            ADMIN_WRITES_TOTAL,
            Unit::Count,
            "Mutating admin requests, labelled by resource and status class."
        );
    });
}
