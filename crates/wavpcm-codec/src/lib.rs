//! WAV (RIFF/PCM) container codec
//!
//! This crate handles:
//! - Encoding/decoding the fixed RIFF + fmt + chunk header
//! - Detecting headers written in the wrong byte order
//! - Skipping non-payload chunks to find the "data" chunk
//! - Wrapping raw PCM into a container and slicing it back out
//!
//! Everything works on in-memory byte slices. Reading files, downloading
//! or any other I/O is left to the caller.

pub mod byte_order;
pub mod chunk;
pub mod header;
pub mod pcm;

use thiserror::Error;

pub use byte_order::{resolve_byte_order, MAX_PLAUSIBLE_CHANNELS};
pub use chunk::{scan_for_data, DataLocation};
pub use header::{AudioFormat, ByteOrder, ChunkDescriptor, FormatBlock, RiffBlock, WavHeader, HEADER_LEN};
pub use pcm::{pcm_to_wav, read_header, read_header_with_extra, wav_to_pcm, ParsedMetadata, PcmParams};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavError {
    #[error("Truncated input: needed {needed} bytes at offset {offset}, buffer holds {available}")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("May not be WAV format: {0}")]
    NotWavFormat(String),

    #[error("No data chunk found ({scanned} bytes scanned)")]
    MissingDataChunk { scanned: usize },

    #[error("Unsupported sample width: {0} bits per sample")]
    UnsupportedSampleWidth(u16),

    #[error("PCM payload too large for a WAV container: {0} bytes")]
    PayloadTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, WavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WavError::TruncatedInput {
            offset: 36,
            needed: 8,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "Truncated input: needed 8 bytes at offset 36, buffer holds 40"
        );
        assert_eq!(
            WavError::UnsupportedSampleWidth(0).to_string(),
            "Unsupported sample width: 0 bits per sample"
        );
    }

    #[test]
    fn test_types_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParsedMetadata>();
        assert_send_sync::<WavHeader>();
        assert_send_sync::<WavError>();
    }
}
