//! Normalization of client utterances to the recognizer's input format
//!
//! The recognizer is fed mono 16 kHz 16-bit PCM WAV. Clients may send a WAV
//! file in any layout, or headerless 16-bit little-endian PCM that is already
//! mono at 16 kHz. Compressed containers are rejected rather than guessed at.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{FftFixedIn, Resampler as _};
use tracing::debug;

use super::stt::STTError;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

const RESAMPLE_CHUNK: usize = 1024;
const PCM_SCALE: f32 = 32768.0;

/// What an utterance looks like, judged from its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceFormat {
    Wav,
    RawPcm,
    Unsupported(&'static str),
}

pub fn detect_format(audio: &[u8]) -> UtteranceFormat {
    match audio {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => UtteranceFormat::Wav,
        [0x1A, 0x45, 0xDF, 0xA3, ..] => UtteranceFormat::Unsupported("webm"),
        [b'O', b'g', b'g', b'S', ..] => UtteranceFormat::Unsupported("ogg"),
        [b'f', b'L', b'a', b'C', ..] => UtteranceFormat::Unsupported("flac"),
        [b'I', b'D', b'3', ..] => UtteranceFormat::Unsupported("mp3"),
        _ => UtteranceFormat::RawPcm,
    }
}

fn target_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Convert one buffered utterance into mono 16 kHz 16-bit WAV bytes.
///
/// A WAV that already has the target layout is passed through untouched.
pub fn normalize_utterance(audio: &[u8]) -> Result<Vec<u8>, STTError> {
    match detect_format(audio) {
        UtteranceFormat::Wav => normalize_wav(audio),
        UtteranceFormat::RawPcm => {
            if audio.len() % 2 != 0 {
                return Err(STTError::AudioProcessingError(format!(
                    "Raw PCM must be 16-bit samples, got {} bytes",
                    audio.len()
                )));
            }
            let samples = audio
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));
            encode_wav(samples)
        }
        UtteranceFormat::Unsupported(kind) => Err(STTError::AudioProcessingError(format!(
            "Unsupported {kind} audio; send {TARGET_SAMPLE_RATE}Hz mono 16-bit PCM or WAV"
        ))),
    }
}

fn normalize_wav(audio: &[u8]) -> Result<Vec<u8>, STTError> {
    let mut reader = WavReader::new(Cursor::new(audio))
        .map_err(|e| STTError::AudioProcessingError(format!("Invalid WAV: {e}")))?;
    let spec = reader.spec();
    if spec == target_spec() {
        return Ok(audio.to_vec());
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<Vec<f32>, _>>()
        }
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>(),
    }
    .map_err(|e| STTError::AudioProcessingError(format!("WAV read error: {e}")))?;

    let mono = downmix(&samples, spec.channels);
    let resampled = if spec.sample_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, spec.sample_rate, TARGET_SAMPLE_RATE)?
    };
    debug!(
        "Normalized {}Hz {}ch {}-bit WAV to {} samples at {}Hz",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        resampled.len(),
        TARGET_SAMPLE_RATE
    );

    encode_wav(
        resampled
            .into_iter()
            .map(|s| (s * PCM_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16),
    )
}

fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, STTError> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLE_CHUNK,
        2,
        1,
    )
    .map_err(|e| STTError::AudioProcessingError(format!("Resampler setup failed: {e}")))?;

    let chunk_size = resampler.input_frames_next();
    let mut output = Vec::new();
    let mut chunks = samples.chunks_exact(chunk_size);
    for chunk in chunks.by_ref() {
        let result = resampler
            .process(&[chunk], None)
            .map_err(|e| STTError::AudioProcessingError(format!("Resampling failed: {e}")))?;
        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
    }

    let remaining = chunks.remainder();
    if !remaining.is_empty() {
        let mut padded = vec![0.0f32; chunk_size];
        padded[..remaining.len()].copy_from_slice(remaining);
        let result = resampler
            .process(&[&padded], None)
            .map_err(|e| STTError::AudioProcessingError(format!("Resampling failed: {e}")))?;
        if let Some(channel) = result.first() {
            let wanted =
                (remaining.len() as f64 * to_rate as f64 / from_rate as f64).ceil() as usize;
            output.extend_from_slice(&channel[..wanted.min(channel.len())]);
        }
    }

    Ok(output)
}

fn encode_wav(samples: impl Iterator<Item = i16>) -> Result<Vec<u8>, STTError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, target_spec())
            .map_err(|e| STTError::AudioProcessingError(format!("WAV encode failed: {e}")))?;
        for sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| STTError::AudioProcessingError(format!("WAV encode failed: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| STTError::AudioProcessingError(format!("WAV encode failed: {e}")))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn decode(wav: &[u8]) -> (WavSpec, Vec<i16>) {
        let mut reader = WavReader::new(Cursor::new(wav)).unwrap();
        let samples = reader.samples::<i16>().map(Result::unwrap).collect();
        (reader.spec(), samples)
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(&wav_bytes(target_spec(), &[0])), UtteranceFormat::Wav);
        assert_eq!(
            detect_format(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]),
            UtteranceFormat::Unsupported("webm")
        );
        assert_eq!(detect_format(b"OggS\0\0"), UtteranceFormat::Unsupported("ogg"));
        assert_eq!(detect_format(&[1, 0, 2, 0]), UtteranceFormat::RawPcm);
    }

    #[test]
    fn test_raw_pcm_is_wrapped_as_wav() {
        let wav = normalize_utterance(&[0x01, 0x00, 0xFF, 0x7F]).unwrap();
        let (spec, samples) = decode(&wav);
        assert_eq!(spec, target_spec());
        assert_eq!(samples, vec![1, i16::MAX]);
    }

    #[test]
    fn test_odd_length_pcm_is_rejected() {
        assert!(matches!(
            normalize_utterance(&[1, 2, 3]),
            Err(STTError::AudioProcessingError(_))
        ));
    }

    #[test]
    fn test_webm_is_rejected() {
        let err = normalize_utterance(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42]).unwrap_err();
        assert!(err.to_string().contains("webm"));
    }

    #[test]
    fn test_target_wav_passes_through() {
        let wav = wav_bytes(target_spec(), &[5, -5, 100]);
        assert_eq!(normalize_utterance(&wav).unwrap(), wav);
    }

    #[test]
    fn test_stereo_wav_is_downmixed() {
        let stereo = WavSpec {
            channels: 2,
            ..target_spec()
        };
        let wav = wav_bytes(stereo, &[1000, 3000, -2000, 2000]);

        let (spec, samples) = decode(&normalize_utterance(&wav).unwrap());
        assert_eq!(spec, target_spec());
        assert_eq!(samples, vec![2000, 0]);
    }

    #[test]
    fn test_high_rate_wav_is_resampled() {
        let source = WavSpec {
            sample_rate: 48_000,
            ..target_spec()
        };
        let tone: Vec<i16> = (0..4800)
            .map(|i| ((i as f32 * 0.05).sin() * 8000.0) as i16)
            .collect();
        let wav = wav_bytes(source, &tone);

        let (spec, samples) = decode(&normalize_utterance(&wav).unwrap());
        assert_eq!(spec, target_spec());
        assert!(
            (1300..=1900).contains(&samples.len()),
            "got {} samples",
            samples.len()
        );
    }

    #[test]
    fn test_truncated_wav_is_rejected() {
        let wav = wav_bytes(target_spec(), &[1, 2, 3]);
        assert!(matches!(
            normalize_utterance(&wav[..14]),
            Err(STTError::AudioProcessingError(_))
        ));
    }
}
