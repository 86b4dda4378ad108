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


/// Audio test utilities for generating test signals and validating results
#[cfg(test)]
pub mod audio_test_utils {
    use std::error::Error;
    use std::f32::consts::PI;
    use std::fs::File;
    use std::path::Path;

    use hound::{SampleFormat, WavSpec, WavWriter};

    /// Generate a sine wave scaled to 16 bit samples.
    pub fn generate_sine(
        frequency: f32,
        amplitude: f32,
        sample_rate: u32,
        duration_seconds: f32,
    ) -> Vec<i16> {
        let sample_count = (sample_rate as f32 * duration_seconds) as usize;
        (0..sample_count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (amplitude * (2.0 * PI * frequency * t).sin() * f32::from(i16::MAX)) as i16
            })
            .collect()
    }

    /// Calculate RMS (Root Mean Square) of a signal
    pub fn calculate_rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_squares: f32 = samples.iter().map(|&x| x * x).sum();
        (sum_squares / samples.len() as f32).sqrt()
    }

    /// Writes a 16 bit WAV file with one vector of samples per channel.
    pub fn write_wav(
        path: &Path,
        channels: Vec<Vec<i16>>,
        sample_rate: u32,
    ) -> Result<(), Box<dyn Error>> {
        let num_channels = channels.len();
        assert!(num_channels <= u16::MAX.into(), "Too many channels!");
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);

        let mut writer = WavWriter::new(
            File::create(path)?,
            WavSpec {
                channels: num_channels as u16,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
        )?;

        for frame in 0..frames {
            for channel in &channels {
                writer.write_sample(channel.get(frame).copied().unwrap_or(0))?;
            }
        }
        writer.finalize()?;

        Ok(())
    }
}
