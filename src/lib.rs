pub mod config;
pub mod engine;
pub mod event_source;
pub mod filter;
pub mod invocation;
pub mod launcher;
pub mod midi_mapping;
pub mod midi_model;
pub mod midi_reading;
mod midi_translation;

pub use config::{Config, ConfigError};
pub use engine::{Engine, RunStats, RunningEngine, StopHandle};
pub use event_source::{EventSource, IterSource, Next};
pub use filter::{KindFilter, KindSet};
pub use invocation::{InvocationSpec, InvocationTemplate, ProgramNumbering, Trigger};
pub use launcher::{LaunchError, LaunchOutcome, Launcher, ProcessLauncher};
pub use midi_model::{EventKind, MidiEvent};
pub use midi_reading::{MidiError, MidirSource};
