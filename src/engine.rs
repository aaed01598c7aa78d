use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::event_source::{EventSource, Next};
use crate::filter::KindFilter;
use crate::invocation::{InvocationSpec, InvocationTemplate};
use crate::launcher::{LaunchOutcome, Launcher};
use crate::midi_model::MidiEvent;

// Upper bound on how long a stop request can go unnoticed while the source is quiet.
const IDLE_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub seen: u64,
    pub matched: u64,
    pub launched: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> StopHandle {
        StopHandle::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/*
    Filter, then act. Events are decided strictly one at a time in arrival
    order; the launcher starts each command and returns without waiting, so a
    slow command never holds up the next decision.

    The sequence counter and stats are only ever touched by the thread running
    the engine.
*/
pub struct Engine<L> {
    filter: KindFilter,
    template: InvocationTemplate,
    launcher: L,
    stats: RunStats,
}

impl<L: Launcher> Engine<L> {
    pub fn new(filter: KindFilter, template: InvocationTemplate, launcher: L) -> Engine<L> {
        Engine {
            filter,
            template,
            launcher,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Decides a single event. Pure: no I/O and no state change.
    pub fn process(&self, event: &MidiEvent) -> Option<InvocationSpec> {
        if !self.filter.matches(event) {
            return None;
        }

        Some(self.template.instantiate(event, self.stats.seen))
    }

    pub fn launch(&mut self, spec: &InvocationSpec) -> LaunchOutcome {
        let outcome = self.launcher.launch(spec);

        match &outcome {
            LaunchOutcome::Launched { pid } => {
                self.stats.launched += 1;
                info!("{}: running {} (pid {})", spec.trigger, spec.command_line(), pid);
            }
            LaunchOutcome::LaunchFailed(err) => {
                self.stats.failed += 1;
                error!("{}: launch failed: {}", spec.trigger, err);
            }
        }

        outcome
    }

    /// Processes one event and, if it matched, launches its command.
    pub fn dispatch(&mut self, event: &MidiEvent) -> Option<LaunchOutcome> {
        debug!("#{} {}", self.stats.seen, event);

        let spec = self.process(event);
        self.stats.seen += 1;

        let spec = spec?;
        self.stats.matched += 1;

        Some(self.launch(&spec))
    }

    /// Consumes events until the source closes or `stop` is requested.
    pub fn run<S: EventSource + ?Sized>(&mut self, source: &mut S, stop: &StopHandle) -> RunStats {
        info!(
            "Dispatching {} events to {}",
            self.filter.accepted(),
            self.template.executable().display()
        );

        while !stop.is_stopped() {
            match source.next_event(IDLE_WAIT) {
                Next::Event(event) => {
                    self.dispatch(&event);
                }
                Next::Idle => {}
                Next::Closed => {
                    info!("Event source closed");
                    break;
                }
            }
        }

        let stats = self.stats;
        info!(
            "Stopped after {} events ({} matched, {} launched, {} failed)",
            stats.seen, stats.matched, stats.launched, stats.failed
        );
        stats
    }
}

impl<L: Launcher + Send + 'static> Engine<L> {
    /// Runs the engine on its own ingestion thread.
    pub fn start<S: EventSource + Send + 'static>(self, mut source: S) -> RunningEngine<L> {
        let stop = StopHandle::new();
        let thread_stop = stop.clone();

        let thread = thread::spawn(move || {
            let mut engine = self;
            engine.run(&mut source, &thread_stop);
            engine
        });

        RunningEngine { stop, thread }
    }
}

pub struct RunningEngine<L> {
    stop: StopHandle,
    thread: JoinHandle<Engine<L>>,
}

impl<L> RunningEngine<L> {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Requests a stop and waits for the ingestion thread. Commands that are
    /// still running are left alone.
    pub fn stop(self) -> thread::Result<Engine<L>> {
        self.stop.stop();
        self.join()
    }

    /// Waits for the source to close on its own.
    pub fn join(self) -> thread::Result<Engine<L>> {
        self.thread.join()
    }
}
