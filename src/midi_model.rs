use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::midi_translation::tone_to_oletter;

/*
    Channel voice messages only. System messages (clock, sysex, active sensing)
    never reach the engine; midi_mapping drops them.

    Every variant carries the channel it arrived on, 0-15.
    Data bytes are 0-127, pitch bend is the combined 14-bit value 0-16383.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn(Note),
    NoteOff(Note),
    PolyPressure(PolyPressure),
    ControlChange(ControlChange),
    ProgramChange(ProgramChange),
    ChannelPressure(ChannelPressure),
    PitchBend(PitchBend),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyPressure {
    pub channel: u8,
    pub note: u8,
    pub pressure: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramChange {
    pub channel: u8,
    pub program: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPressure {
    pub channel: u8,
    pub pressure: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchBend {
    pub channel: u8,
    pub value: u16,
}

pub const MAX_CHANNEL: u8 = 15;
pub const MAX_DATA: u8 = 127;
pub const MAX_BEND: u16 = 0x3FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    NoteOn,
    NoteOff,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::NoteOn,
        EventKind::NoteOff,
        EventKind::PolyPressure,
        EventKind::ControlChange,
        EventKind::ProgramChange,
        EventKind::ChannelPressure,
        EventKind::PitchBend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::NoteOn => "note-on",
            EventKind::NoteOff => "note-off",
            EventKind::PolyPressure => "poly-pressure",
            EventKind::ControlChange => "control-change",
            EventKind::ProgramChange => "program-change",
            EventKind::ChannelPressure => "channel-pressure",
            EventKind::PitchBend => "pitch-bend",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event kind '{0}' (expected one of: note-on, note-off, poly-pressure, control-change, program-change, channel-pressure, pitch-bend)")]
pub struct UnknownKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

impl MidiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MidiEvent::NoteOn(_) => EventKind::NoteOn,
            MidiEvent::NoteOff(_) => EventKind::NoteOff,
            MidiEvent::PolyPressure(_) => EventKind::PolyPressure,
            MidiEvent::ControlChange(_) => EventKind::ControlChange,
            MidiEvent::ProgramChange(_) => EventKind::ProgramChange,
            MidiEvent::ChannelPressure(_) => EventKind::ChannelPressure,
            MidiEvent::PitchBend(_) => EventKind::PitchBend,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            MidiEvent::NoteOn(n) | MidiEvent::NoteOff(n) => n.channel,
            MidiEvent::PolyPressure(p) => p.channel,
            MidiEvent::ControlChange(cc) => cc.channel,
            MidiEvent::ProgramChange(pc) => pc.channel,
            MidiEvent::ChannelPressure(p) => p.channel,
            MidiEvent::PitchBend(b) => b.channel,
        }
    }

    /// The payload value handed to the triggered command: the program for a
    /// program change, the note number for note and poly pressure messages,
    /// the controller number for a control change.
    pub fn value(&self) -> u16 {
        match self {
            MidiEvent::NoteOn(n) | MidiEvent::NoteOff(n) => n.note as u16,
            MidiEvent::PolyPressure(p) => p.note as u16,
            MidiEvent::ControlChange(cc) => cc.controller as u16,
            MidiEvent::ProgramChange(pc) => pc.program as u16,
            MidiEvent::ChannelPressure(p) => p.pressure as u16,
            MidiEvent::PitchBend(b) => b.value,
        }
    }

    // False when a field is outside the range its kind allows.
    pub fn is_well_formed(&self) -> bool {
        let data_ok = match self {
            MidiEvent::NoteOn(n) | MidiEvent::NoteOff(n) => {
                n.note <= MAX_DATA && n.velocity <= MAX_DATA
            }
            MidiEvent::PolyPressure(p) => p.note <= MAX_DATA && p.pressure <= MAX_DATA,
            MidiEvent::ControlChange(cc) => cc.controller <= MAX_DATA && cc.value <= MAX_DATA,
            MidiEvent::ProgramChange(pc) => pc.program <= MAX_DATA,
            MidiEvent::ChannelPressure(p) => p.pressure <= MAX_DATA,
            MidiEvent::PitchBend(b) => b.value <= MAX_BEND,
        };

        data_ok && self.channel() <= MAX_CHANNEL
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiEvent::NoteOn(n) => write!(
                f,
                "note-on ch={} note={} ({}) vel={}",
                n.channel,
                n.note,
                tone_to_oletter(n.note),
                n.velocity
            ),
            MidiEvent::NoteOff(n) => write!(
                f,
                "note-off ch={} note={} ({})",
                n.channel,
                n.note,
                tone_to_oletter(n.note)
            ),
            MidiEvent::PolyPressure(p) => write!(
                f,
                "poly-pressure ch={} note={} pressure={}",
                p.channel, p.note, p.pressure
            ),
            MidiEvent::ControlChange(cc) => write!(
                f,
                "control-change ch={} ctrl={} val={}",
                cc.channel, cc.controller, cc.value
            ),
            MidiEvent::ProgramChange(pc) => {
                write!(f, "program-change ch={} program={}", pc.channel, pc.program)
            }
            MidiEvent::ChannelPressure(p) => {
                write!(f, "channel-pressure ch={} pressure={}", p.channel, p.pressure)
            }
            MidiEvent::PitchBend(b) => write!(f, "pitch-bend ch={} val={}", b.channel, b.value),
        }
    }
}
