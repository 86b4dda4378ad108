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

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio error: {0}")]
    Audio(#[from] SymphoniaError),

    #[error("unsupported audio: {0}")]
    Unsupported(String),
}

/// A fully decoded audio file as interleaved f32 samples.
#[derive(Debug)]
pub struct Decoded {
    pub samples: Vec<f32>,
    pub channel_count: u16,
    pub sample_rate: u32,
}

/// Reads the next packet. Returns None at the end of the stream.
fn read_next_packet(
    format_reader: &mut dyn FormatReader,
    decoder: &mut dyn Decoder,
) -> Result<Option<Packet>, DecodeError> {
    loop {
        match format_reader.next_packet() {
            Ok(packet) => return Ok(Some(packet)),
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Decodes the whole of the first audio track in the file. Supports every
/// format symphonia does.
pub fn decode_file(path: &Path) -> Result<Decoded, DecodeError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::Unsupported("no audio track found".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut sample_rate = params.sample_rate.unwrap_or(0);
    let mut channel_count = params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let decoder_opts: DecoderOptions = Default::default();
    let mut decoder = get_codecs().make(&params, &decoder_opts)?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buffer: Option<SampleBuffer<f32>> = None;

    while let Some(packet) = read_next_packet(format_reader.as_mut(), decoder.as_mut())? {
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt packets are skipped.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        if channel_count == 0 {
            channel_count = spec.channels.count() as u16;
        }
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }

        let needed = decoded.capacity() * spec.channels.count();
        if sample_buffer
            .as_ref()
            .map_or(true, |buffer| buffer.capacity() < needed)
        {
            sample_buffer = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buffer) = sample_buffer.as_mut() {
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }
    }

    if channel_count == 0 || sample_rate == 0 {
        return Err(DecodeError::Unsupported(format!(
            "unable to determine the format of {}",
            path.display()
        )));
    }

    Ok(Decoded {
        samples,
        channel_count,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::audio_test_utils::write_wav;

    #[test]
    fn test_decode_wav() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("C4v9.wav");
        write_wav(&path, vec![vec![0_i16, 16384, -16384, 0]], 44100).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.channel_count, 1);
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.samples.len(), 4);
        assert!((decoded.samples[1] - 0.5).abs() < 1e-3);
        assert!((decoded.samples[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_decode_stereo_is_interleaved() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("stereo.wav");
        write_wav(&path, vec![vec![16384_i16; 8], vec![-16384_i16; 8]], 22050).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.channel_count, 2);
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.samples.len(), 16);
        assert!(decoded.samples[0] > 0.0);
        assert!(decoded.samples[1] < 0.0);
    }

    #[test]
    fn test_decode_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let result = decode_file(&tempdir.path().join("missing.wav"));
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[test]
    fn test_decode_garbage() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("garbage.wav");
        std::fs::write(&path, b"this is not audio").unwrap();
        assert!(decode_file(&path).is_err());
    }
}
