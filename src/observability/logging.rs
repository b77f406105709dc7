//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (console + rotating file)
//! - Pick the log level from `RUST_LOG` or the debug toggle
//! - Render bounded previews of request and response bodies

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::LoggingConfig;
use crate::error::ProxyError;

/// Maximum number of body bytes rendered into a log line.
pub const PREVIEW_LIMIT: usize = 1024;

/// Keeps the file writer alive. Dropping it flushes buffered lines.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("relay_proxy={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<LogGuard, ProxyError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config.debug)));

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(config.file_prefix.clone())
                .filename_suffix("log")
                .max_log_files(config.retention_days)
                .build(directory)
                .map_err(|e| ProxyError::Logging(e.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| ProxyError::Logging(e.to_string()))?;

    Ok(LogGuard { _file: guard })
}

/// Lossy UTF-8 rendering of `body`, cut at [`PREVIEW_LIMIT`] bytes.
pub fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= PREVIEW_LIMIT {
        return text.into_owned();
    }

    let mut end = PREVIEW_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_rendered_whole() {
        assert_eq!(preview(br#"{"key": "value"}"#), r#"{"key": "value"}"#);
        assert_eq!(preview(b""), "");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = vec![b'a'; PREVIEW_LIMIT * 2];
        let rendered = preview(&body);
        assert!(rendered.starts_with(&"a".repeat(PREVIEW_LIMIT)));
        assert!(rendered.ends_with("(2048 bytes total)"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(PREVIEW_LIMIT).into_bytes();
        let rendered = preview(&body);
        assert!(rendered.contains("bytes total"));
    }

    #[test]
    fn debug_toggle_changes_default_level() {
        assert_eq!(default_filter(false), "relay_proxy=info,tower_http=info");
        assert_eq!(default_filter(true), "relay_proxy=debug,tower_http=debug");
    }
}
