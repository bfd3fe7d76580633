//! Observability utilities.

use std::sync::OnceLock;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::types::{LogFormat, LoggingConfig};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Build a subscriber for `config` writing to `writer`, without installing it.
pub fn subscriber<W>(config: &LoggingConfig, writer: W, ansi: bool) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        LogFormat::Json => Box::new(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_ansi(ansi).with_writer(writer)),
        ),
        LogFormat::Compact => Box::new(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_ansi(ansi).with_writer(writer)),
        ),
    }
}

/// Install the process-wide subscriber once. Later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.get_or_init(|| {
        let subscriber = subscriber(config, std::io::stdout, true);
        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory log sink for tests that scope a subscriber to one thread.
    #[derive(Debug, Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn writer(&self) -> impl Fn() -> CapturedLogs + Send + Sync + 'static {
            let logs = self.clone();
            move || logs.clone()
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
