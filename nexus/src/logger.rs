//! Logger initialization for the gateway binary.
//!
//! A trimmed-down version of the teacher's server logger: no fastrace
//! event bridge, no OTEL exporter, no TUI appender, since none of those
//! are part of this crate's surface. Same `logforth` dispatch-and-filter
//! shape, stderr only.

use logforth::append::Stderr;
use logforth::filter::EnvFilter;
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init(log_filter: &str) {
    let log_filter = log_filter.to_owned();
    INIT.call_once(move || apply_logger(log_filter));
}

fn apply_logger(log_filter: String) {
    logforth::builder()
        .dispatch(move |d| {
            let filter = EnvFilter::from_str(&log_filter).unwrap_or_else(|_| EnvFilter::from_str("info").expect("default filter is valid"));

            d.filter(filter).append(Stderr::default())
        })
        .apply();
}
