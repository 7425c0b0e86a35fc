//! Буферный writer для тестов, проверяющих вывод логов.

use std::sync::{Arc, Mutex};

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

pub(crate) struct VecMakeWriter(pub(crate) Arc<Mutex<Vec<u8>>>);

impl<'a> fmt::MakeWriter<'a> for VecMakeWriter {
    type Writer = VecWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        VecWriterGuard(self.0.clone())
    }
}

pub(crate) struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for VecWriterGuard {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Выполняет `f` под локальным subscriber'ом и возвращает весь вывод.
pub(crate) fn captured(
    filter: &str,
    f: impl FnOnce(),
) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(VecMakeWriter(buffer.clone()))
        .with_filter(EnvFilter::try_new(filter).unwrap());
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, f);

    let out = buffer.lock().unwrap();
    String::from_utf8_lossy(&out).into_owned()
}
