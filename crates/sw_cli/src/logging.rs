//! Tracing setup for the `sw` binary.
//!
//! `SW_LOG` (or `RUST_LOG`) selects what is logged, with the usual filter
//! syntax: `SW_LOG=debug`, `SW_LOG=sw_desugar=trace`. `SW_LOG_FORMAT=json`
//! switches to one JSON object per event. Nothing is installed when neither
//! variable is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("SW_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn build_filter() -> Option<EnvFilter> {
    if let Ok(val) = std::env::var("SW_LOG") {
        return Some(EnvFilter::builder().parse_lossy(val));
    }
    std::env::var("RUST_LOG")
        .is_ok()
        .then(EnvFilter::from_default_env)
}

/// Install the global subscriber. Output goes to stderr; stdout carries the
/// transformed code.
pub fn init_tracing() {
    let Some(filter) = build_filter() else {
        return;
    };

    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
