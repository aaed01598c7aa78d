use std::time::Duration;

use crate::midi_model::MidiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Event(MidiEvent),
    /// Nothing arrived within the wait. The source is still open.
    Idle,
    /// The source is closed and drained; no further events will arrive.
    Closed,
}

/// A single-consumer stream of events in arrival order.
///
/// `next_event` blocks for at most `wait` before returning `Next::Idle`, so
/// the caller gets a chance to observe a stop request between events.
pub trait EventSource {
    fn next_event(&mut self, wait: Duration) -> Next;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self, wait: Duration) -> Next {
        (**self).next_event(wait)
    }
}

/// Replays a fixed sequence of events, then reports the source closed.
pub struct IterSource<I> {
    events: I,
}

impl<I: Iterator<Item = MidiEvent>> IterSource<I> {
    pub fn new(events: impl IntoIterator<IntoIter = I>) -> IterSource<I> {
        IterSource {
            events: events.into_iter(),
        }
    }
}

impl<I: Iterator<Item = MidiEvent>> EventSource for IterSource<I> {
    fn next_event(&mut self, _wait: Duration) -> Next {
        match self.events.next() {
            Some(event) => Next::Event(event),
            None => Next::Closed,
        }
    }
}
