use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use serde::Deserialize;

use crate::midi_model::{EventKind, MidiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramNumbering {
    /// Programs are passed as received, 0-127.
    #[default]
    ZeroBased,
    /// Programs are passed as 1-128, the way most hardware labels patches.
    OneBased,
}

/// What triggered an invocation. Kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub sequence: u64,
    pub kind: EventKind,
    pub channel: u8,
    pub value: u16,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ch={} value={}",
            self.sequence, self.kind, self.channel, self.value
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub executable: Arc<Path>,
    pub args: Vec<String>,
    pub trigger: Trigger,
}

impl InvocationSpec {
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.display().to_string())
            .chain(self.args.iter().cloned())
            .join(" ")
    }
}

/// The fixed part of every invocation: executable, leading arguments and the
/// program numbering. Built once at startup.
#[derive(Debug, Clone)]
pub struct InvocationTemplate {
    executable: Arc<Path>,
    leading_args: Vec<String>,
    numbering: ProgramNumbering,
}

impl InvocationTemplate {
    pub fn new(
        executable: impl Into<PathBuf>,
        leading_args: Vec<String>,
        numbering: ProgramNumbering,
    ) -> InvocationTemplate {
        let executable: PathBuf = executable.into();
        InvocationTemplate {
            executable: Arc::from(executable),
            leading_args,
            numbering,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn argument_for(&self, event: &MidiEvent) -> u16 {
        match (event, self.numbering) {
            (MidiEvent::ProgramChange(pc), ProgramNumbering::OneBased) => pc.program as u16 + 1,
            _ => event.value(),
        }
    }

    // Total: every u16 renders, so construction cannot fail.
    pub fn instantiate(&self, event: &MidiEvent, sequence: u64) -> InvocationSpec {
        let value = self.argument_for(event);

        let mut args = Vec::with_capacity(self.leading_args.len() + 1);
        args.extend(self.leading_args.iter().cloned());
        args.push(value.to_string());

        InvocationSpec {
            executable: self.executable.clone(),
            args,
            trigger: Trigger {
                sequence,
                kind: event.kind(),
                channel: event.channel(),
                value,
            },
        }
    }
}
