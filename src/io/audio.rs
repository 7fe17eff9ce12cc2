//! Live audio input feeding the control surface's sample buffer.
//!
//! A cpal input stream pushes left-channel samples (converted to the signed
//! 16-bit range) into a bounded ring from its own callback thread; the tick
//! loop pulls the most recent block once per frame. Stream errors are logged
//! and never reach the render loop.

use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::{debug, error, info, warn};

/// Upper bound on buffered samples; roughly 170ms at 48kHz.
const RING_CAPACITY: usize = 8192;

#[derive(Default)]
pub struct AudioInput {
    device_name: Option<String>,
    ring: Arc<Mutex<VecDeque<i16>>>,
    stream: Option<Stream>,
    is_active: bool,
}

impl AudioInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty name falls back to the default input device.
    pub fn set_device_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.device_name = if name.is_empty() { None } else { Some(name) };
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn start(&mut self) -> Result<(), Box<dyn Error>> {
        let (device, stream_config) =
            Self::device_and_stream_config(self.device_name.as_deref())?;

        let channels = stream_config.channels as usize;
        if channels < 1 {
            return Err("Device must have at least one channel".into());
        }

        let ring = self.ring.clone();

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _| {
                let mut ring = ring.lock().unwrap();
                for sample in data.iter().step_by(channels) {
                    let scaled = (sample.clamp(-1.0, 1.0)
                        * i16::MAX as f32) as i16;
                    ring.push_back(scaled);
                }
                while ring.len() > RING_CAPACITY {
                    ring.pop_front();
                }
            },
            move |err| error!("Error in audio stream: {}", err),
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);
        self.is_active = true;
        info!(
            "Audio connected to device: {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(_stream) = self.stream.take() {
            self.is_active = false;
            debug!("Audio stream stopped");
        }
    }

    pub fn restart(&mut self) -> Result<(), Box<dyn Error>> {
        self.stop();
        std::thread::sleep(std::time::Duration::from_millis(10));
        self.start()
    }

    /// Copies the most recent `n` samples (fewer when the ring holds less).
    /// The returned buffer is owned by the caller; later stream writes never
    /// touch it.
    pub fn latest_block(&self, n: usize) -> Vec<i16> {
        let ring = self.ring.lock().unwrap();
        let skip = ring.len().saturating_sub(n);
        ring.iter().skip(skip).copied().collect()
    }

    fn device_and_stream_config(
        device_name: Option<&str>,
    ) -> Result<(Device, StreamConfig), Box<dyn Error>> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| {
                    Box::<dyn Error>::from(format!(
                        "Audio device '{}' not found",
                        name
                    ))
                })?,
            None => host.default_input_device().ok_or_else(|| {
                warn!("No default audio input device");
                Box::<dyn Error>::from("No default audio input device")
            })?,
        };

        let stream_config = device.default_input_config()?.into();
        Ok((device, stream_config))
    }
}

pub fn list_audio_devices() -> Result<Vec<String>, Box<dyn Error>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();
    for device in host.input_devices()? {
        devices.push(device.name()?);
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_block_returns_newest_samples() {
        let input = AudioInput::new();
        {
            let mut ring = input.ring.lock().unwrap();
            for i in 0..10 {
                ring.push_back(i);
            }
        }

        assert_eq!(input.latest_block(3), vec![7, 8, 9]);
        assert_eq!(input.latest_block(20).len(), 10);
    }
}
