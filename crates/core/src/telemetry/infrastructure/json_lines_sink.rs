use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::telemetry::domain::telemetry_sink::{TelemetryRecord, TelemetrySink};

/// Appends telemetry records to a writer, one JSON object per line.
///
/// A record whose values match the previously written one (timestamps
/// aside) is skipped, which keeps logs of a camera sitting idle short.
/// The writer is flushed when the sink is dropped.
pub struct JsonLinesTelemetrySink<W: Write + Send> {
    out: W,
    last: Option<TelemetryRecord>,
    written: usize,
}

impl JsonLinesTelemetrySink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        log::debug!("Writing telemetry to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesTelemetrySink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            written: 0,
        }
    }

    /// Number of records actually written.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write + Send> TelemetrySink for JsonLinesTelemetrySink<W> {
    fn record(&mut self, record: &TelemetryRecord) -> std::io::Result<()> {
        if self.last.is_some_and(|last| last.same_values(record)) {
            return Ok(());
        }
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.last = Some(*record);
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

impl<W: Write + Send> Drop for JsonLinesTelemetrySink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            log::warn!("Failed to flush telemetry: {e}");
        }
    }
}
