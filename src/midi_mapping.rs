use crate::midi_model::{
    ChannelPressure, ControlChange, MidiEvent, Note, PitchBend, PolyPressure, ProgramChange,
};

/*
    message structure (channel voice):

    [status | channel, data1, data2?]
        - note off:         0x80, note, velocity
        - note on:          0x90, note, velocity (velocity 0 means note off)
        - poly pressure:    0xA0, note, pressure
        - control change:   0xB0, controller, value
        - program change:   0xC0, program
        - channel pressure: 0xD0, pressure
        - pitch bend:       0xE0, lsb, msb

    Anything else (system common/realtime, sysex, truncated or oversized
    messages, data bytes with the high bit set) maps to None.
*/

fn expected_len(status: u8) -> usize {
    match status {
        0xC0 | 0xD0 => 2,
        _ => 3,
    }
}

pub fn map(event: &[u8]) -> Option<MidiEvent> {

    let (&status_byte, data) = event.split_first()?;

    if status_byte < 0x80 || status_byte >= 0xF0 {
        return None;
    }

    let status = status_byte & 0xF0;
    let channel = status_byte & 0x0F;

    if event.len() != expected_len(status) || data.iter().any(|byte| *byte > 0x7F) {
        return None;
    }

    let event = match status {
        0x80 => MidiEvent::NoteOff(Note {
            channel,
            note: data[0],
            velocity: data[1],
        }),
        0x90 if data[1] == 0 => MidiEvent::NoteOff(Note {
            channel,
            note: data[0],
            velocity: 0,
        }),
        0x90 => MidiEvent::NoteOn(Note {
            channel,
            note: data[0],
            velocity: data[1],
        }),
        0xA0 => MidiEvent::PolyPressure(PolyPressure {
            channel,
            note: data[0],
            pressure: data[1],
        }),
        0xB0 => MidiEvent::ControlChange(ControlChange {
            channel,
            controller: data[0],
            value: data[1],
        }),
        0xC0 => MidiEvent::ProgramChange(ProgramChange {
            channel,
            program: data[0],
        }),
        0xD0 => MidiEvent::ChannelPressure(ChannelPressure {
            channel,
            pressure: data[0],
        }),
        0xE0 => MidiEvent::PitchBend(PitchBend {
            channel,
            value: ((data[1] as u16) << 7) | data[0] as u16,
        }),
        _ => return None,
    };

    Some(event)

}
