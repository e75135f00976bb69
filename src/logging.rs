//! Log initialization for the two binaries (`cli`, `webhook`), reading
//! `LOG_LEVEL`/`LOG_FORMAT` per §6. Grounded on the teacher's
//! `tracing_subscriber::fmt::init()` one-liner, generalized to pick a
//! format and honor an explicit level instead of always defaulting to
//! `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// `LOG_FORMAT` values this agent understands; anything else falls back to
/// `simple`.
fn format_is_json() -> bool {
    matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"))
}

fn format_is_detailed() -> bool {
    matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("detailed"))
}

/// Initialize the global tracing subscriber. Safe to call once per process;
/// a second call is a no-op (the underlying `try_init` just fails quietly).
pub fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::try_new("info").unwrap());

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let _ = if format_is_json() {
        subscriber.json().try_init()
    } else if format_is_detailed() {
        subscriber.with_file(true).with_line_number(true).with_target(true).try_init()
    } else {
        subscriber.try_init()
    };
}
