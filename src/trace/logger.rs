use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use tracing::warn;

use crate::trace::trace::TraceEvent;

type Sink = Mutex<Box<dyn Write + Send>>;

/// Activity log: one JSON object per line.
///
/// A log that cannot be opened or written to only warns; assistant work is
/// never interrupted by it.
pub struct TraceLogger {
    sink: Option<Sink>,
}

impl TraceLogger {
    /// Append to the file at `path`, creating it if needed.
    pub fn new(path: &str) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self::from_writer(file),
            Err(e) => {
                warn!(path, "could not open activity log: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Mutex::new(Box::new(writer))),
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(kind = %event.kind, "unserializable activity event: {}", e);
                return;
            }
        };

        let Ok(mut writer) = sink.lock() else {
            warn!("activity log lock poisoned");
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|()| writer.flush()) {
            warn!("failed to write activity event: {}", e);
        }
    }
}
