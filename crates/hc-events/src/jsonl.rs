//! JSON-lines event files.
//!
//! One [`Event`] object per line; blank lines are skipped.
//!
//! ```text
//! {"particles":[{"pid":211,"pt":0.5,"eta":3.1,"y":3.0,"is_hadron":true,"is_charged":true}]}
//! {"particles":[],"centrality":{"v0a":12.5,"v0c":12.5,"cl1":16.2}}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use hc_core::{Error, Event, EventSource, Result};

/// Streaming reader over a JSON-lines event file.
pub struct JsonlEventReader<R = BufReader<File>> {
    reader: R,
    origin: String,
    line: String,
    line_no: u64,
}

impl JsonlEventReader {
    /// Open an event file. A missing file is an input-absent error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::InputAbsent(format!("event file {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        tracing::debug!(path = %path.display(), "opened event file");
        Ok(Self::from_reader(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> JsonlEventReader<R> {
    /// Wrap any buffered reader; `origin` labels parse errors.
    pub fn from_reader(reader: R, origin: impl Into<String>) -> Self {
        Self { reader, origin: origin.into(), line: String::new(), line_no: 0 }
    }

    /// Lines consumed so far (blank lines included).
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

impl<R: BufRead> EventSource for JsonlEventReader<R> {
    fn next_event(&mut self, event: &mut Event) -> Result<bool> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                event.clear();
                return Ok(false);
            }
            self.line_no += 1;
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            *event = serde_json::from_str(text).map_err(|e| {
                Error::Validation(format!("{}:{}: invalid event: {e}", self.origin, self.line_no))
            })?;
            return Ok(true);
        }
    }
}

/// Buffered JSON-lines event writer.
pub struct JsonlEventWriter<W: Write = File> {
    out: BufWriter<W>,
    written: u64,
}

impl JsonlEventWriter {
    /// Create (truncate) an event file, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> JsonlEventWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { out: BufWriter::new(inner), written: 0 }
    }

    /// Append one event.
    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Events written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and return the number of events written.
    pub fn finish(mut self) -> Result<u64> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Drain `source` into a JSON-lines file at `path`.
pub fn write_events<S: EventSource>(source: &mut S, path: &Path) -> Result<u64> {
    let mut writer = JsonlEventWriter::create(path)?;
    let mut buf = Event::default();
    while source.next_event(&mut buf)? {
        writer.write_event(&buf)?;
    }
    let n = writer.finish()?;
    tracing::info!(path = %path.display(), events = n, "wrote events");
    Ok(n)
}

/// Read every event of a file into memory.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Event>> {
    let mut reader = JsonlEventReader::open(path)?;
    let mut out = Vec::new();
    let mut buf = Event::default();
    while reader.next_event(&mut buf)? {
        out.push(buf.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc_core::{CentralityEstimators, Particle};
    use std::io::Cursor;

    fn pion(eta: f64) -> Particle {
        Particle { pid: 211, pt: 0.5, eta, y: eta, phi: 0.0, is_hadron: true, is_charged: true }
    }

    #[test]
    fn reads_lines_and_skips_blanks() {
        let text = "{\"particles\":[{\"pid\":211,\"pt\":0.5,\"eta\":3.1,\"y\":3.0,\"is_hadron\":true,\"is_charged\":true}]}\n\n{\"particles\":[],\"weight\":2.0}\n";
        let mut r = JsonlEventReader::from_reader(Cursor::new(text), "mem");
        let mut ev = Event::default();

        assert!(r.next_event(&mut ev).unwrap());
        assert_eq!(ev.len(), 1);
        assert_eq!(ev.particles[0].phi, 0.0);
        assert_eq!(ev.weight, 1.0);

        assert!(r.next_event(&mut ev).unwrap());
        assert!(ev.is_empty());
        assert_eq!(ev.weight, 2.0);

        assert!(!r.next_event(&mut ev).unwrap());
        assert_eq!(r.lines_read(), 3);
    }

    #[test]
    fn parse_error_names_the_line() {
        let text = "{\"particles\":[]}\nnot json\n";
        let mut r = JsonlEventReader::from_reader(Cursor::new(text), "run1.jsonl");
        let mut ev = Event::default();
        assert!(r.next_event(&mut ev).unwrap());
        let err = r.next_event(&mut ev).unwrap_err();
        assert!(err.to_string().contains("run1.jsonl:2"));
    }

    #[test]
    fn writer_output_reads_back() {
        let mut ev = Event::new(vec![pion(0.1), pion(-3.0)]);
        ev.centrality = Some(CentralityEstimators { v0a: 3.5, v0c: 3.5, cl1: 20.0 });

        let mut w = JsonlEventWriter::new(Vec::new());
        w.write_event(&ev).unwrap();
        w.write_event(&Event::default()).unwrap();
        assert_eq!(w.written(), 2);
        let bytes = w.out.into_inner().unwrap();

        let mut r = JsonlEventReader::from_reader(Cursor::new(bytes), "mem");
        let mut back = Event::default();
        assert!(r.next_event(&mut back).unwrap());
        assert_eq!(back, ev);
        assert!(r.next_event(&mut back).unwrap());
        assert_eq!(back, Event::default());
        assert!(!r.next_event(&mut back).unwrap());
    }
}
