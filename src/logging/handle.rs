use tracing_appender::non_blocking::WorkerGuard;

/// Держит фоновые писатели логов живыми.
///
/// Пока handle существует, файловый писатель сбрасывает буфер; при drop
/// оставшиеся строки дописываются на диск.
#[derive(Default)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    /// Пишет ли лог в файл.
    pub fn has_file(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Явное завершение: сбрасывает буферы файлового писателя.
    pub fn shutdown(mut self) {
        if let Some(guard) = self.file_guard.take() {
            tracing::debug!("Flushing file log");
            drop(guard);
        }
    }
}

impl std::fmt::Debug for LoggingHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoggingHandle")
            .field("file", &self.has_file())
            .finish()
    }
}
