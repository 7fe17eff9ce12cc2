//! MIDI input mapped onto the control surface: CC 0..N-1 drive the knobs,
//! note on/off drives the momentary trigger flag.

use std::error::Error;
use std::sync::{Arc, Mutex};

use log::{info, trace, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};

use super::surface::{ControlSurface, NUM_KNOBS};

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CONTROL_CHANGE: u8 = 0xB0;

#[derive(Clone, Copy, Debug, Default)]
struct MidiState {
    knobs: [Option<f32>; NUM_KNOBS],
    trigger: bool,
}

/// Background MIDI connection writing into shared state that the tick loop
/// applies to the surface once per frame via [`MidiControls::apply_to`].
#[derive(Default)]
pub struct MidiControls {
    port_name: Option<String>,
    state: Arc<Mutex<MidiState>>,
    connection: Option<MidiInputConnection<()>>,
}

impl MidiControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty name falls back to the first available input port.
    pub fn set_port_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.port_name = if name.is_empty() { None } else { Some(name) };
    }

    pub fn is_active(&self) -> bool {
        self.connection.is_some()
    }

    pub fn start(&mut self) -> Result<(), Box<dyn Error>> {
        let mut midi_in = MidiInput::new("strata")?;
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        let in_port = match self.port_name.as_deref() {
            Some(name) => in_ports
                .iter()
                .find(|p| {
                    midi_in.port_name(p).unwrap_or_default() == name
                })
                .ok_or_else(|| {
                    format!("Unable to find input port: {}", name)
                })?
                .clone(),
            None => in_ports
                .first()
                .ok_or("No MIDI input ports available")?
                .clone(),
        };

        let port_name = midi_in.port_name(&in_port).unwrap_or_default();
        let state = self.state.clone();

        let connection = midi_in
            .connect(
                &in_port,
                "strata-control",
                move |stamp, message, _| {
                    trace!("MIDI message: {}, {:?}", stamp, message);
                    handle_message(&state, message);
                },
                (),
            )
            .map_err(|err| format!("Unable to connect: {}", err))?;

        info!("MIDI connected to port: {}", port_name);
        self.connection = Some(connection);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            info!("MIDI connection closed");
        }
    }

    /// Writes the latest MIDI-derived values onto the surface. Knobs that
    /// have never received a CC are left untouched so settings-file defaults
    /// survive until a controller takes over.
    pub fn apply_to(&self, surface: &mut ControlSurface) {
        let state = self.state.lock().unwrap();
        for (index, knob) in state.knobs.iter().enumerate() {
            if let Some(value) = knob {
                surface.set_knob(index, *value);
            }
        }
        surface.set_trigger(state.trigger);
    }
}

fn handle_message(state: &Arc<Mutex<MidiState>>, message: &[u8]) {
    let Some(&status) = message.first() else {
        return;
    };

    let mut state = state.lock().unwrap();

    match status & 0xF0 {
        STATUS_CONTROL_CHANGE if message.len() >= 3 => {
            let cc = message[1] as usize;
            if cc < NUM_KNOBS {
                state.knobs[cc] = Some(message[2] as f32 / 127.0);
            }
        }
        STATUS_NOTE_ON if message.len() >= 3 => {
            // Velocity 0 note-on is a note-off by convention.
            state.trigger = message[2] > 0;
        }
        STATUS_NOTE_OFF => {
            state.trigger = false;
        }
        _ => {}
    }
}

pub fn list_midi_ports() -> Result<Vec<String>, Box<dyn Error>> {
    let midi_in = MidiInput::new("strata")?;
    let mut names = Vec::new();
    for port in midi_in.ports() {
        match midi_in.port_name(&port) {
            Ok(name) => names.push(name),
            Err(err) => warn!("Unable to read MIDI port name: {}", err),
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<Mutex<MidiState>> {
        Arc::new(Mutex::new(MidiState::default()))
    }

    #[test]
    fn control_change_maps_to_unit_range_knobs() {
        let state = state();
        handle_message(&state, &[0xB0, 0, 127]);
        handle_message(&state, &[0xB3, 2, 64]);

        let snapshot = *state.lock().unwrap();
        assert_eq!(snapshot.knobs[0], Some(1.0));
        assert!((snapshot.knobs[2].unwrap() - 64.0 / 127.0).abs() < 1e-6);
        assert_eq!(snapshot.knobs[1], None);
    }

    #[test]
    fn out_of_range_cc_numbers_are_ignored() {
        let state = state();
        handle_message(&state, &[0xB0, NUM_KNOBS as u8, 127]);
        assert!(state.lock().unwrap().knobs.iter().all(Option::is_none));
    }

    #[test]
    fn note_on_and_off_drive_the_trigger() {
        let state = state();
        handle_message(&state, &[0x90, 60, 100]);
        assert!(state.lock().unwrap().trigger);

        handle_message(&state, &[0x80, 60, 0]);
        assert!(!state.lock().unwrap().trigger);

        handle_message(&state, &[0x90, 60, 100]);
        handle_message(&state, &[0x90, 60, 0]);
        assert!(!state.lock().unwrap().trigger);
    }

    #[test]
    fn apply_to_leaves_untouched_knobs_alone() {
        let state = state();
        handle_message(&state, &[0xB0, 1, 127]);

        let controls = MidiControls {
            port_name: None,
            state,
            connection: None,
        };

        let mut surface = ControlSurface::new();
        surface.set_knob(0, 0.5);
        controls.apply_to(&mut surface);

        assert_eq!(surface.knob(0), 0.5);
        assert_eq!(surface.knob(1), 1.0);
    }
}
