//! Audio decoding collaborator.
//!
//! Decoding is modelled as an ordered list of strategies. Each strategy either
//! returns a mono [`Waveform`] or an [`AudioError`]; the chain tries them in
//! order and the first success wins. The default chain reads WAV with `hound`
//! and falls back to `symphonia` for every other container it can probe.

use std::any::Any;
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::Waveform;
use crate::error::AudioError;

/// One way of turning bytes into a waveform.
pub trait AudioDecoder: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Decode `bytes` into a mono waveform.
    fn decode(&self, bytes: &[u8]) -> Result<Waveform, AudioError>;
}

/// RIFF/WAVE decoder backed by `hound`
///
/// Integer PCM is scaled by `1 / 2^(bits - 1)` into `[-1.0, 1.0)`.
pub struct WavDecoder;

impl WavDecoder {
    fn failure(&self, err: impl std::fmt::Display) -> AudioError {
        AudioError::DecodeFailed {
            decoder: self.name().to_string(),
            reason: err.to_string(),
        }
    }
}

impl AudioDecoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Waveform, AudioError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|err| self.failure(err))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(self.failure("sample rate is zero"));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|err| self.failure(err))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                match spec.bits_per_sample {
                    8 => reader
                        .samples::<i8>()
                        .map(|sample| sample.map(|value| value as f32 * scale))
                        .collect::<Result<Vec<f32>, _>>()
                        .map_err(|err| self.failure(err))?,
                    16 => reader
                        .samples::<i16>()
                        .map(|sample| sample.map(|value| value as f32 * scale))
                        .collect::<Result<Vec<f32>, _>>()
                        .map_err(|err| self.failure(err))?,
                    24 | 32 => reader
                        .samples::<i32>()
                        .map(|sample| sample.map(|value| value as f32 * scale))
                        .collect::<Result<Vec<f32>, _>>()
                        .map_err(|err| self.failure(err))?,
                    other => {
                        return Err(AudioError::UnsupportedFormat {
                            details: format!("{}-bit integer PCM", other),
                        })
                    }
                }
            }
        };

        tracing::debug!(
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            "Decoded WAV payload"
        );

        Ok(Waveform::from_interleaved(
            &interleaved,
            spec.channels as usize,
            spec.sample_rate,
        ))
    }
}

/// Format-agnostic decoder backed by `symphonia`
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    fn failure(&self, err: impl std::fmt::Display) -> AudioError {
        AudioError::DecodeFailed {
            decoder: self.name().to_string(),
            reason: err.to_string(),
        }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    /// Malformed headers can make symphonia panic (a zero sample rate
    /// builds a zero-denominator time base); those panics become
    /// `DecodeFailed`.
    fn decode(&self, bytes: &[u8]) -> Result<Waveform, AudioError> {
        catch_unwind(AssertUnwindSafe(|| self.decode_unchecked(bytes)))
            .unwrap_or_else(|payload| Err(self.failure(panic_reason(payload.as_ref()))))
    }
}

impl SymphoniaDecoder {
    fn decode_unchecked(&self, bytes: &[u8]) -> Result<Waveform, AudioError> {
        let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|err| self.failure(err))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(AudioError::NoAudioTrack)?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|err| self.failure(err))?;

        let mut interleaved: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(err) => return Err(self.failure(err)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    if sample_rate.is_none() {
                        sample_rate = Some(spec.rate);
                    }
                    if channels.is_none() {
                        channels = Some(spec.channels.count());
                    }
                    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    interleaved.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(reason)) => {
                    tracing::warn!(reason, "Skipping undecodable packet");
                }
                Err(err) => return Err(self.failure(err)),
            }
        }

        let sample_rate = sample_rate
            .filter(|&rate| rate > 0)
            .ok_or_else(|| self.failure("sample rate unknown or zero"))?;
        let channels = channels.unwrap_or(1);

        tracing::debug!(
            channels,
            sample_rate,
            frames = interleaved.len() / channels.max(1),
            "Decoded payload with symphonia"
        );

        Ok(Waveform::from_interleaved(&interleaved, channels, sample_rate))
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("decoder panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("decoder panicked: {message}")
    } else {
        "decoder panicked".to_string()
    }
}

/// Ordered decoding strategies, first success wins
pub struct DecoderChain {
    strategies: Vec<Box<dyn AudioDecoder>>,
}

impl DecoderChain {
    pub fn new(strategies: Vec<Box<dyn AudioDecoder>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Decode `bytes` with the first strategy that accepts them
    ///
    /// Empty payloads and zero-sample results are rejected so the feature
    /// extractor never sees zero-length input. When every strategy fails the
    /// last failure is returned. A strategy that panics counts as a failed
    /// strategy.
    pub fn decode(&self, bytes: &[u8]) -> Result<Waveform, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::EmptyInput);
        }

        let mut last_error = None;
        for strategy in &self.strategies {
            let outcome = catch_unwind(AssertUnwindSafe(|| strategy.decode(bytes)))
                .unwrap_or_else(|payload| {
                    Err(AudioError::DecodeFailed {
                        decoder: strategy.name().to_string(),
                        reason: panic_reason(payload.as_ref()),
                    })
                });
            match outcome {
                Ok(waveform) if !waveform.is_empty() => {
                    tracing::debug!(
                        decoder = strategy.name(),
                        samples = waveform.len(),
                        sample_rate = waveform.sample_rate(),
                        "Audio decoded"
                    );
                    return Ok(waveform);
                }
                Ok(_) => {
                    tracing::warn!(decoder = strategy.name(), "Decoder produced no samples");
                    last_error = Some(AudioError::EmptyInput);
                }
                Err(err) => {
                    tracing::warn!(
                        decoder = strategy.name(),
                        error = %err,
                        "Decoder failed, trying next strategy"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AudioError::DecodeFailed {
            decoder: "chain".to_string(),
            reason: "no decoders configured".to_string(),
        }))
    }

    /// Read a file and decode it.
    pub fn decode_file(&self, path: &Path) -> Result<Waveform, AudioError> {
        let bytes = std::fs::read(path).map_err(|err| AudioError::DecodeFailed {
            decoder: "file".to_string(),
            reason: format!("{}: {}", path.display(), err),
        })?;
        self.decode(&bytes)
    }
}

impl Default for DecoderChain {
    fn default() -> Self {
        Self::new(vec![Box::new(WavDecoder), Box::new(SymphoniaDecoder)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: &[Vec<i16>]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for frame in frames {
                for &sample in frame {
                    writer.write_sample(sample).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    /// Valid WAV whose fmt chunk claims a 0 Hz sample rate.
    fn zero_rate_wav() -> Vec<u8> {
        let mut bytes = wav_bytes(1, 16000, &[vec![1000], vec![-1000], vec![500]]);
        bytes[24..28].copy_from_slice(&0u32.to_le_bytes());
        bytes
    }

    struct PanickingDecoder;

    impl AudioDecoder for PanickingDecoder {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn decode(&self, _bytes: &[u8]) -> Result<Waveform, AudioError> {
            panic!("corrupt header");
        }
    }

    struct CountingDecoder {
        calls: Arc<AtomicUsize>,
        result: Result<Waveform, AudioError>,
    }

    impl AudioDecoder for CountingDecoder {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn decode(&self, _bytes: &[u8]) -> Result<Waveform, AudioError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[test]
    fn test_wav_mono_scaling() {
        let bytes = wav_bytes(1, 16000, &[vec![16384], vec![-32768], vec![0]]);
        let wave = WavDecoder.decode(&bytes).unwrap();
        assert_eq!(wave.sample_rate(), 16000);
        assert_eq!(wave.samples(), &[0.5, -1.0, 0.0]);
    }

    #[test]
    fn test_wav_stereo_averaged_to_mono() {
        let bytes = wav_bytes(2, 44100, &[vec![16384, 0], vec![-16384, -16384]]);
        let wave = WavDecoder.decode(&bytes).unwrap();
        assert_eq!(wave.samples(), &[0.25, -0.5]);
    }

    #[test]
    fn test_garbage_rejected_by_every_default_strategy() {
        let chain = DecoderChain::default();
        let err = chain.decode(b"definitely not audio, just text").unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailed { .. }));
    }

    #[test]
    fn test_empty_payload_rejected() {
        let chain = DecoderChain::default();
        assert_eq!(chain.decode(&[]).unwrap_err(), AudioError::EmptyInput);
    }

    #[test]
    fn test_zero_sample_wav_rejected() {
        let chain = DecoderChain::default();
        let bytes = wav_bytes(1, 16000, &[]);
        assert!(chain.decode(&bytes).is_err());
    }

    #[test]
    fn test_chain_falls_back_and_short_circuits() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let third_calls = Arc::new(AtomicUsize::new(0));

        let chain = DecoderChain::new(vec![
            Box::new(CountingDecoder {
                calls: first_calls.clone(),
                result: Err(AudioError::NoAudioTrack),
            }),
            Box::new(CountingDecoder {
                calls: second_calls.clone(),
                result: Ok(Waveform::new(vec![0.1, 0.2], 8000)),
            }),
            Box::new(CountingDecoder {
                calls: third_calls.clone(),
                result: Ok(Waveform::new(vec![0.9], 8000)),
            }),
        ]);

        let wave = chain.decode(b"payload").unwrap();
        assert_eq!(wave.samples(), &[0.1, 0.2]);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chain_reports_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = DecoderChain::new(vec![
            Box::new(CountingDecoder {
                calls: calls.clone(),
                result: Err(AudioError::NoAudioTrack),
            }),
            Box::new(CountingDecoder {
                calls: calls.clone(),
                result: Err(AudioError::UnsupportedFormat {
                    details: "x".to_string(),
                }),
            }),
        ]);
        let err = chain.decode(b"payload").unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_sample_rate_header_is_an_error() {
        let bytes = zero_rate_wav();
        assert!(WavDecoder.decode(&bytes).is_err());
        assert!(SymphoniaDecoder.decode(&bytes).is_err());

        let err = DecoderChain::default().decode(&bytes).unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailed { .. }));
    }

    #[test]
    fn test_panicking_strategy_falls_through() {
        let chain = DecoderChain::new(vec![
            Box::new(PanickingDecoder),
            Box::new(CountingDecoder {
                calls: Arc::new(AtomicUsize::new(0)),
                result: Ok(Waveform::new(vec![0.3], 8000)),
            }),
        ]);
        assert_eq!(chain.decode(b"payload").unwrap().samples(), &[0.3]);

        let only_panics = DecoderChain::new(vec![Box::new(PanickingDecoder)]);
        match only_panics.decode(b"payload").unwrap_err() {
            AudioError::DecodeFailed { decoder, reason } => {
                assert_eq!(decoder, "panicking");
                assert!(reason.contains("corrupt header"), "reason: {reason}");
            }
            other => panic!("expected DecodeFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_default_strategy_order() {
        assert_eq!(DecoderChain::default().strategy_names(), vec!["wav", "symphonia"]);
    }
}
