//! A shareable in-memory write sink for capturing log tables in tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Cloneable `Write` implementation backed by a shared buffer.
///
/// Hand one clone to the scheme as a log sink and keep another to read
/// the captured output back after the run.
#[derive(Clone, Debug, Default)]
pub struct SharedSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured output as a UTF-8 string.
    pub fn contents(&self) -> String {
        String::from_utf8(self.buffer.lock().expect("sink poisoned").clone())
            .expect("log output is UTF-8")
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().expect("sink poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let sink = SharedSink::new();
        let mut writer = sink.clone();
        writeln!(writer, "TimeWindow  Iterations").unwrap();
        assert_eq!(sink.contents(), "TimeWindow  Iterations\n");
    }
}
