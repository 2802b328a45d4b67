//! Event-source abstraction.
//!
//! Analysis passes never see files: they pull events through [`EventSource`],
//! so generator output, chained files and in-memory samples are
//! interchangeable.

use crate::Result;
use crate::types::Event;

/// Pull iterator over a finite event stream.
///
/// Events are written into a caller-owned buffer which is valid until the
/// next call; implementations must fully overwrite it (including weight and
/// centrality) on every successful step.
pub trait EventSource {
    /// Load the next event into `event`.
    ///
    /// Returns `Ok(false)` once the stream is exhausted; `event` is left
    /// cleared in that case.
    fn next_event(&mut self, event: &mut Event) -> Result<bool>;

    /// Number of events remaining, if cheaply known.
    fn len_hint(&self) -> Option<usize> {
        None
    }

    /// Visit every remaining event with a single reused buffer.
    ///
    /// Returns the number of events visited.
    fn for_each_event<F>(&mut self, mut f: F) -> Result<u64>
    where
        Self: Sized,
        F: FnMut(&Event) -> Result<()>,
    {
        let mut buf = Event::default();
        let mut n = 0u64;
        while self.next_event(&mut buf)? {
            f(&buf)?;
            n += 1;
        }
        Ok(n)
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self, event: &mut Event) -> Result<bool> {
        (**self).next_event(event)
    }

    fn len_hint(&self) -> Option<usize> {
        (**self).len_hint()
    }
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self, event: &mut Event) -> Result<bool> {
        (**self).next_event(event)
    }

    fn len_hint(&self) -> Option<usize> {
        (**self).len_hint()
    }
}

/// In-memory event source over an owned vector.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    events: Vec<Event>,
    cursor: usize,
}

impl VecSource {
    /// Wrap a vector of events.
    pub fn new(events: Vec<Event>) -> Self {
        Self { events, cursor: 0 }
    }

    /// Rewind to the first event.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Borrow the underlying events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self, event: &mut Event) -> Result<bool> {
        event.clear();
        let Some(src) = self.events.get(self.cursor) else {
            return Ok(false);
        };
        event.particles.extend_from_slice(&src.particles);
        event.weight = src.weight;
        event.centrality = src.centrality;
        self.cursor += 1;
        Ok(true)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.events.len() - self.cursor)
    }
}
