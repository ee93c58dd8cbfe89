use std::path::Path;
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "chart_core=info,chart_cli=info";
const TRACE_FILE: &str = "chartool-trace.jsonl";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Without `log_dir`, events go to stderr as text. With it, they are written
/// as JSON lines to `chartool-trace.jsonl` in that directory; the returned
/// guard flushes the file when dropped and must be held until exit.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let mut guard = None;
    INIT.call_once(|| match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, TRACE_FILE);
            let (non_blocking, worker) = tracing_appender::non_blocking(file_appender);
            guard = Some(worker);

            tracing_subscriber::fmt()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
                .with_env_filter(env_filter())
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .without_time()
                .with_env_filter(env_filter())
                .init();
        }
    });
    guard
}
