use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};

const LOG_FILE_PREFIX: &str = "gomoku-server.log";

/// Initialize logging: always to the console, plus a daily-rotated file
/// when a log directory is configured.
///
/// Filter precedence: config level, then `RUST_LOG`, then `"info"`.
pub fn init(cfg: &LoggingConfig) {
    let filter = cfg.level.as_deref().map(EnvFilter::new).unwrap_or_else(|| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let mut sinks = vec![format_layer(cfg.format, true, std::io::stdout)];
    if let Some(writer) = file_writer(cfg) {
        sinks.push(format_layer(cfg.format, false, writer));
    }

    let _ = tracing_subscriber::registry()
        .with(sinks)
        .with(filter)
        .try_init();
}

/// One output sink, boxed so console and file variants compose uniformly
/// whatever the configured format. ANSI colors only make sense on a text
/// console; JSON and files always go without.
fn format_layer<W>(
    format: LogFormat,
    ansi: bool,
    writer: W,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer);
    match format {
        LogFormat::Json => layer.json().with_ansi(false).boxed(),
        LogFormat::Text => layer.with_ansi(ansi).boxed(),
    }
}

/// Non-blocking writer into a daily-rotated file under `cfg.dir`, or `None`
/// (with a note on stderr) when the directory is unusable.
fn file_writer(cfg: &LoggingConfig) -> Option<tracing_appender::non_blocking::NonBlocking> {
    let dir = cfg.dir.as_ref()?;
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory '{dir}': {err}; logging to stdout only");
        return None;
    }

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        dir,
        LOG_FILE_PREFIX,
    ));
    // The background writer stops when its guard drops, and this process
    // logs until exit, so the guard must never drop.
    std::mem::forget(guard);
    Some(writer)
}
