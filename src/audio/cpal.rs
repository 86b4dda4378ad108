// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::{fmt, sync::mpsc, thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{error, info, span, Level};

use crate::audio::mixer::{ActiveSource, AudioMixer};
use crate::audio::{AudioError, ContextState, OutputContext, PitchShift, SourceHandle};
use crate::config;
use crate::samples::LoadedSample;

/// An output context backed by a cpal device. The stream is created lazily on
/// the first resume and lives on its own thread until the process exits.
pub struct Context {
    /// The name of the device.
    name: String,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The device's output sample rate.
    sample_rate: u32,
    /// The device's output channel count.
    num_channels: u16,
    /// Channel for sending new sources to the output thread.
    source_tx: crossbeam_channel::Sender<ActiveSource>,
    /// Receiver handed to the output thread on resume.
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
    /// Whether the stream is running.
    state: Mutex<ContextState>,
    /// Handle to the output thread (keeps it alive).
    output_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, Rate={})",
            self.name, self.num_channels, self.sample_rate
        )
    }
}

/// Builds a callback that mixes into a scratch buffer and converts to the
/// device's sample type.
fn create_callback<T: cpal::SizedSample + cpal::FromSample<f32>>(
    mut mixer: AudioMixer,
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static {
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        while let Ok(source) = source_rx.try_recv() {
            mixer.add_source(source);
        }

        scratch.resize(data.len(), 0.0);
        mixer.process_into_output(&mut scratch);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: AudioMixer,
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_output_stream(
        config,
        create_callback::<T>(mixer, source_rx),
        |err| error!(err = err.to_string(), "CPAL output stream error"),
        None,
    )
}

impl Context {
    /// Lists the names of cpal output devices on all hosts.
    pub fn list() -> Result<Vec<String>, AudioError> {
        let mut names: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host =
                cpal::host_from_id(host_id).map_err(|e| AudioError::Device(e.to_string()))?;
            let devices = match host.output_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in devices {
                if let Ok(name) = device.name() {
                    names.push(name);
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Gets the configured cpal device. "default" picks the host's default
    /// output device.
    pub fn get(config: &config::Audio) -> Result<Context, AudioError> {
        let name = config.device();
        let host = cpal::default_host();
        let device = if name == "default" {
            host.default_output_device()
        } else {
            host.output_devices()
                .map_err(|e| AudioError::Device(e.to_string()))?
                .find(|device| {
                    device
                        .name()
                        .map(|device_name| device_name.trim() == name)
                        .unwrap_or(false)
                })
        }
        .ok_or_else(|| AudioError::DeviceNotFound(name.to_string()))?;

        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let (source_tx, source_rx) = crossbeam_channel::unbounded();

        let context = Context {
            name: device.name().unwrap_or_else(|_| name.to_string()),
            device,
            sample_rate: config
                .sample_rate()
                .unwrap_or(default_config.sample_rate().0),
            num_channels: default_config.channels(),
            source_tx,
            source_rx,
            state: Mutex::new(ContextState::Suspended),
            output_thread: Mutex::new(None),
        };
        info!(device = %context, "Opened audio device.");
        Ok(context)
    }

    /// Starts the output thread. The stream is created inside the thread and the
    /// result is reported back before this returns.
    fn start_output_thread(&self) -> Result<thread::JoinHandle<()>, AudioError> {
        let device = self.device.clone();
        let sample_format = self
            .device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?
            .sample_format();
        let stream_config = cpal::StreamConfig {
            channels: self.num_channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let mixer = AudioMixer::new(self.num_channels, self.sample_rate);
        let source_rx = self.source_rx.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), AudioError>>();

        let output_thread = thread::spawn(move || {
            let stream_result = match sample_format {
                cpal::SampleFormat::F32 => {
                    build_stream::<f32>(&device, &stream_config, mixer, source_rx)
                }
                cpal::SampleFormat::I16 => {
                    build_stream::<i16>(&device, &stream_config, mixer, source_rx)
                }
                cpal::SampleFormat::I32 => {
                    build_stream::<i32>(&device, &stream_config, mixer, source_rx)
                }
                cpal::SampleFormat::U16 => {
                    build_stream::<u16>(&device, &stream_config, mixer, source_rx)
                }
                other => {
                    let _ = ready_tx.send(Err(AudioError::Stream(format!(
                        "unsupported sample format {}",
                        other
                    ))));
                    return;
                }
            };

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(AudioError::Stream(e.to_string())));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::Stream(e.to_string())));
                return;
            }
            info!("CPAL output stream started successfully");
            let _ = ready_tx.send(Ok(()));

            // Keep the stream alive by waiting
            loop {
                thread::sleep(Duration::from_millis(100));
            }
        });

        ready_rx.recv().map_err(|_| AudioError::Disconnected)??;
        Ok(output_thread)
    }
}

impl OutputContext for Context {
    fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn resume(&self) -> Result<(), AudioError> {
        let span = span!(Level::INFO, "resume (cpal)");
        let _enter = span.enter();

        let mut state = self.state.lock();
        if *state == ContextState::Running {
            return Ok(());
        }

        let output_thread = self.start_output_thread()?;
        *self.output_thread.lock() = Some(output_thread);
        *state = ContextState::Running;
        Ok(())
    }

    fn supports_detune(&self) -> bool {
        true
    }

    fn start_source(
        &self,
        sample: &LoadedSample,
        shift: PitchShift,
    ) -> Result<SourceHandle, AudioError> {
        let source = ActiveSource::new(sample, shift, self.sample_rate);
        let handle = source.handle();
        self.source_tx
            .send(source)
            .map_err(|_| AudioError::Disconnected)?;
        Ok(handle)
    }
}
