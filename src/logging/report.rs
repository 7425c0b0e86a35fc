use ftpgate_error::{ErrorExt, LogLevel};

/// Пишет ошибку в лог на уровне, который задаёт её код статуса.
///
/// Поля события совпадают с тегами [`ErrorExt::metrics_tags`]; подробности
/// (`Debug`) идут в поле `detail` и клиенту не показываются.
pub fn log_error<E: ErrorExt>(
    err: &E,
    operation: &str,
) {
    let code = err.status_code();
    let tags = err.metrics_tags();
    let error_type = tag(&tags, "error_type");
    let status = tag(&tags, "status_code");
    let retryable = code.is_retryable();
    let critical = code.is_critical();
    let detail = err.log_message();

    macro_rules! emit {
        ($level:ident) => {
            tracing::$level!(
                operation,
                error_type,
                status,
                retryable,
                critical,
                detail = %detail,
                "{err}"
            )
        };
    }

    match code.log_level() {
        LogLevel::Trace => emit!(trace),
        LogLevel::Debug => emit!(debug),
        LogLevel::Info => emit!(info),
        LogLevel::Warn => emit!(warn),
        LogLevel::Error => emit!(error),
    }
}

fn tag<'a>(
    tags: &'a [(&'static str, String)],
    name: &str,
) -> &'a str {
    tags.iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
        .unwrap_or_default()
}
