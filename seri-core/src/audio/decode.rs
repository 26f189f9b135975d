//! Container/codec decoding to interleaved f32 PCM.
//!
//! RIFF/WAVE input goes through `hound`; everything else (MP3, FLAC,
//! OGG/Vorbis, …) is probed and decoded with `symphonia`. WAV encodings
//! hound does not read (µ-law, A-law, ADPCM) also fall through to
//! `symphonia`. Either way the result is interleaved samples in
//! [-1.0, 1.0] plus the stream layout.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{Result, SeriError};

/// Decoded PCM before any channel or rate conversion.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples, `channels` values per frame.
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Average all channels into a single mono signal.
    pub fn into_mono(self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples;
        }
        let scale = 1.0 / self.channels as f32;
        self.samples
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() * scale)
            .collect()
    }
}

/// Decode an in-memory audio file.
///
/// `extension` is an optional hint such as `"mp3"`; detection still works
/// without it.
pub fn decode(bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio> {
    let decoded = if is_riff_wave(bytes) {
        match decode_wav(bytes)? {
            Some(decoded) => decoded,
            None => {
                debug!("wav encoding not handled by hound, decoding with symphonia");
                decode_with_symphonia(bytes, extension.or(Some("wav")))?
            }
        }
    } else {
        decode_with_symphonia(bytes, extension)?
    };

    if decoded.channels == 0 || decoded.sample_rate == 0 {
        return Err(SeriError::AudioLoad(format!(
            "invalid stream layout: {} channels @ {} Hz",
            decoded.channels, decoded.sample_rate
        )));
    }
    if decoded.samples.is_empty() {
        return Err(SeriError::AudioLoad("stream contains no samples".into()));
    }

    debug!(
        channels = decoded.channels,
        sample_rate = decoded.sample_rate,
        frames = decoded.samples.len() / decoded.channels,
        "decoded audio"
    );
    Ok(decoded)
}

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// `Ok(None)` when the header is valid RIFF/WAVE but the sample encoding
/// is one hound cannot read.
fn decode_wav(bytes: &[u8]) -> Result<Option<DecodedAudio>> {
    let reader = match hound::WavReader::new(Cursor::new(bytes)) {
        Ok(reader) => reader,
        Err(hound::Error::Unsupported) => return Ok(None),
        Err(e) => return Err(SeriError::AudioLoad(format!("wav header: {e}"))),
    };
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SeriError::AudioLoad(format!("wav samples: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| SeriError::AudioLoad(format!("wav samples: {e}")))?
        }
    };

    Ok(Some(DecodedAudio {
        samples,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    }))
}

fn decode_with_symphonia(bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &Default::default(), &Default::default())
        .map_err(|e| SeriError::AudioLoad(format!("unrecognized container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SeriError::AudioLoad("no decodable audio track".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SeriError::AudioLoad(format!("unsupported codec: {e}")))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(SeriError::AudioLoad(format!("read packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame; the stream itself is still usable.
                warn!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(SeriError::AudioLoad(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let needed = decoded.capacity() * channels;
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}
