//! Multi-file event chains and directory discovery.

use std::path::{Path, PathBuf};

use hc_core::{Error, Event, EventSource, Result};

use crate::jsonl::JsonlEventReader;

/// List regular files in `dir` whose name contains `pattern`, sorted by path.
///
/// An empty `pattern` matches every file. The directory is not walked
/// recursively. A missing directory is an input-absent error.
pub fn discover_files(dir: impl AsRef<Path>, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::InputAbsent(format!("directory {}", dir.display()))
        } else {
            Error::Io(e)
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().contains(pattern) {
            files.push(entry.path());
        }
    }
    files.sort();
    tracing::debug!(dir = %dir.display(), pattern, n_files = files.len(), "discovered event files");
    Ok(files)
}

/// Several JSON-lines event files presented as one stream, in list order.
///
/// Files are opened lazily; a file that is missing when its turn comes is
/// an input-absent error.
pub struct EventChain {
    files: Vec<PathBuf>,
    next_file: usize,
    current: Option<JsonlEventReader>,
    events_in_file: u64,
}

impl EventChain {
    /// Chain the given files.
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files, next_file: 0, current: None, events_in_file: 0 }
    }

    /// Chain every file of `dir` whose name contains `pattern`.
    ///
    /// Finding no file at all is an input-absent error.
    pub fn from_dir(dir: impl AsRef<Path>, pattern: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let files = discover_files(dir, pattern)?;
        if files.is_empty() {
            return Err(Error::InputAbsent(format!(
                "no event files matching '{pattern}' in {}",
                dir.display()
            )));
        }
        Ok(Self::new(files))
    }

    /// Files in chain order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl EventSource for EventChain {
    fn next_event(&mut self, event: &mut Event) -> Result<bool> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                if reader.next_event(event)? {
                    self.events_in_file += 1;
                    return Ok(true);
                }
                tracing::debug!(events = self.events_in_file, "finished event file");
                self.current = None;
            }
            let Some(path) = self.files.get(self.next_file) else {
                event.clear();
                return Ok(false);
            };
            self.current = Some(JsonlEventReader::open(path)?);
            self.next_file += 1;
            self.events_in_file = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonl::JsonlEventWriter;
    use hc_core::Particle;

    fn tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hc_events_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(path: &Path, sizes: &[usize]) {
        let p = Particle {
            pid: 211,
            pt: 1.0,
            eta: 0.0,
            y: 0.0,
            phi: 0.0,
            is_hadron: true,
            is_charged: true,
        };
        let mut w = JsonlEventWriter::create(path).unwrap();
        for &n in sizes {
            w.write_event(&Event::new(vec![p; n])).unwrap();
        }
        w.finish().unwrap();
    }

    #[test]
    fn discovery_filters_and_sorts() {
        let dir = tmp_dir("discover");
        write_file(&dir.join("pythiarun_2.jsonl"), &[1]);
        write_file(&dir.join("pythiarun_1.jsonl"), &[1]);
        write_file(&dir.join("notes.txt"), &[]);
        std::fs::create_dir_all(dir.join("pythiarun_dir")).unwrap();

        let files = discover_files(&dir, "pythiarun").unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["pythiarun_1.jsonl", "pythiarun_2.jsonl"]);

        assert_eq!(discover_files(&dir, "").unwrap().len(), 3);
        assert!(discover_files(dir.join("absent"), "x").unwrap_err().is_input_absent());
    }

    #[test]
    fn chain_reads_files_in_order() {
        let dir = tmp_dir("chain");
        write_file(&dir.join("a.jsonl"), &[1, 2]);
        write_file(&dir.join("b.jsonl"), &[]);
        write_file(&dir.join("c.jsonl"), &[3]);

        let mut chain = EventChain::from_dir(&dir, ".jsonl").unwrap();
        let mut sizes = Vec::new();
        chain
            .for_each_event(|ev| {
                sizes.push(ev.len());
                Ok(())
            })
            .unwrap();
        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[test]
    fn empty_discovery_is_input_absent() {
        let dir = tmp_dir("chain_empty");
        let err = EventChain::from_dir(&dir, "pythiarun").err().unwrap();
        assert!(err.is_input_absent());
    }

    #[test]
    fn missing_member_fails_when_reached() {
        let dir = tmp_dir("chain_missing");
        write_file(&dir.join("a.jsonl"), &[1]);
        let mut chain = EventChain::new(vec![dir.join("a.jsonl"), dir.join("gone.jsonl")]);
        let mut ev = Event::default();
        assert!(chain.next_event(&mut ev).unwrap());
        assert!(chain.next_event(&mut ev).unwrap_err().is_input_absent());
    }
}
