use std::io;
use std::sync::{Arc, Mutex};

use super::{LogSink, Stream};

/// Keeps both logs in memory. Clones share the same buffers, so a test can
/// hand one clone to the run and read the text back through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    run: Arc<Mutex<String>>,
    replica: Arc<Mutex<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_log(&self) -> String {
        self.run.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn replica_log(&self) -> String {
        self.replica.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, stream: Stream, text: &str) -> io::Result<()> {
        let buffer = match stream {
            Stream::Run => &self.run,
            Stream::Replica => &self.replica,
        };
        buffer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log buffer poisoned"))?
            .push_str(text);
        Ok(())
    }
}
