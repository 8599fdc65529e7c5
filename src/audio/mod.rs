// Audio input: decoded mono waveforms and the decoding strategies that
// produce them from raw bytes.

pub mod decode;
mod waveform;

pub use decode::{AudioDecoder, DecoderChain, SymphoniaDecoder, WavDecoder};
pub use waveform::Waveform;
