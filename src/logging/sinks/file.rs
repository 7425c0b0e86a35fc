use std::{fs, path::Path};

use tracing::Subscriber;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use crate::logging::{config::LogFormat, LoggingError};

/// Файловый слой с ежедневной ротацией и неблокирующей записью.
///
/// Guard нужно держать до завершения процесса, иначе хвост лога теряется.
pub fn layer<S>(
    path: &Path,
    format: LogFormat,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard), LoggingError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let (writer, guard) = non_blocking(daily(dir, file_name));
    let layer = fmt::layer().with_ansi(false).with_writer(writer);

    let layer = match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty | LogFormat::Compact => layer.boxed(),
    };

    Ok((layer, guard))
}
