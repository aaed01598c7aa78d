use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use itertools::Itertools;
use log::{info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use thiserror::Error;

use crate::event_source::{EventSource, Next};
use crate::midi_mapping::map;
use crate::midi_model::MidiEvent;

// Events decoded in the driver callback wait here until the engine pops them.
const PIPE_CAPACITY: usize = 256;

// Sweetspot between lag and cpu usage while the pipe is empty
const POLL_INTERVAL: Duration = Duration::from_micros(500);

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("could not create MIDI input client: {0}")]
    Init(#[from] midir::InitError),
    #[error("could not read MIDI port info: {0}")]
    PortInfo(#[from] midir::PortInfoError),
    #[error("no MIDI input ports available")]
    NoPorts,
    #[error("no MIDI input port matching '{wanted}' (available: {available})")]
    PortNotFound { wanted: String, available: String },
    #[error("could not connect to MIDI port '{port}': {reason}")]
    Connect { port: String, reason: String },
}

pub fn list_ports(client_name: &str) -> Result<Vec<String>, MidiError> {
    let midi_in = MidiInput::new(client_name)?;

    midi_in
        .ports()
        .iter()
        .map(|port| midi_in.port_name(port).map_err(MidiError::from))
        .collect()
}

// Runs on the driver thread, so it must never block: a full pipe drops the
// event and counts it for the consumer to report.
fn publish(publisher: &mut HeapProd<MidiEvent>, dropped: &AtomicU64, message: &[u8]) {
    if let Some(event) = map(message) {
        if publisher.try_push(event).is_err() {
            dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Live MIDI input. The midir callback decodes each message and publishes
/// it to a ringbuf; `next_event` pops from the other end.
pub struct MidirSource {
    connection: Option<MidiInputConnection<()>>,
    events: HeapCons<MidiEvent>,
    dropped: Arc<AtomicU64>,
    reported_dropped: u64,
    port_name: String,
}

impl MidirSource {
    /// Connects to the first input port whose name contains `port_filter`,
    /// or to the first port at all when no filter is given.
    pub fn open(client_name: &str, port_filter: Option<&str>) -> Result<MidirSource, MidiError> {
        let mut midi_in = MidiInput::new(client_name)?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(MidiError::NoPorts);
        }

        let named = ports
            .iter()
            .map(|port| Ok((port, midi_in.port_name(port)?)))
            .collect::<Result<Vec<_>, MidiError>>()?;

        let (port, port_name) = match port_filter {
            Some(wanted) => named
                .iter()
                .find(|(_, name)| name.contains(wanted))
                .cloned()
                .ok_or_else(|| MidiError::PortNotFound {
                    wanted: wanted.to_string(),
                    available: named.iter().map(|(_, name)| name).join(", "),
                })?,
            None => named[0].clone(),
        };
        let port = port.clone();

        let (mut publisher, events) = HeapRb::<MidiEvent>::new(PIPE_CAPACITY).split();
        let dropped = Arc::new(AtomicU64::new(0));
        let callback_dropped = dropped.clone();

        info!("Opening connection to '{}'", port_name);

        // The connection must be kept alive for as long as events should flow
        let connection = midi_in
            .connect(
                &port,
                client_name,
                move |_stamp, message, _| publish(&mut publisher, &callback_dropped, message),
                (),
            )
            .map_err(|err| MidiError::Connect {
                port: port_name.clone(),
                reason: err.to_string(),
            })?;

        Ok(MidirSource {
            connection: Some(connection),
            events,
            dropped,
            reported_dropped: 0,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Disconnects from the port. Events already queued are still delivered,
    /// after which the source reports `Next::Closed`.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            info!("Closed connection to '{}'", self.port_name);
        }
    }

    fn report_overflow(&mut self) {
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.reported_dropped {
            warn!(
                "event pipe full, dropped {} event(s) from '{}'",
                dropped - self.reported_dropped,
                self.port_name
            );
            self.reported_dropped = dropped;
        }
    }
}

impl EventSource for MidirSource {
    fn next_event(&mut self, wait: Duration) -> Next {
        let deadline = Instant::now() + wait;

        loop {
            self.report_overflow();

            if let Some(event) = self.events.try_pop() {
                return Next::Event(event);
            }

            if self.connection.is_none() {
                return Next::Closed;
            }

            let now = Instant::now();
            if now >= deadline {
                return Next::Idle;
            }

            sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for MidirSource {
    fn drop(&mut self) {
        self.close();
    }
}
