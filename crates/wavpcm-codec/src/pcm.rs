//! Conversion between bare PCM sample buffers and WAV containers

use serde::Serialize;
use tracing::{debug, warn};

use crate::byte_order::resolve_byte_order;
use crate::chunk::scan_for_data;
use crate::header::{AudioFormat, ByteOrder, WavHeader};
use crate::{Result, WavError};

/// Largest payload whose RIFF size (payload + 36) still fits in 32 bits
const MAX_PAYLOAD_LEN: u32 = u32::MAX - 36;

/// Decoded header plus where the samples start and how many there are
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMetadata {
    /// Header as decoded; `header.data` is the descriptor the scan found
    pub header: WavHeader,
    pub byte_order: ByteOrder,
    /// Offset of the first payload byte from the buffer start
    pub pcm_offset: usize,
    /// Payload bytes / bytes per sample, counted across all channels
    pub sample_nums: usize,
}

impl ParsedMetadata {
    /// Playback length in seconds, if channels and rate allow computing one
    pub fn duration_secs(&self) -> Option<f64> {
        let fmt = &self.header.fmt;
        if fmt.num_channels == 0 || fmt.sample_rate == 0 {
            return None;
        }
        let frames = self.sample_nums / usize::from(fmt.num_channels);
        Some(frames as f64 / f64::from(fmt.sample_rate))
    }

    /// Summary string for logging
    pub fn info_line(&self) -> String {
        let fmt = &self.header.fmt;
        format!(
            "{:?} {}ch {}Hz {}bit ({}) pcm@{} samples={} duration={}",
            fmt.kind(),
            fmt.num_channels,
            fmt.sample_rate,
            fmt.bits_per_sample,
            self.byte_order.label(),
            self.pcm_offset,
            self.sample_nums,
            self.duration_secs()
                .map(|secs| format!("{:.3}s", secs))
                .unwrap_or_else(|| "n/a".into()),
        )
    }
}

/// Encode parameters for wrapping raw samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PcmParams {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl PcmParams {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
        }
    }

    pub fn encode(&self, pcm: &[u8]) -> Result<Vec<u8>> {
        pcm_to_wav(self.channels, self.sample_rate, self.bits_per_sample, pcm)
    }
}

/// Decode the header with automatic byte-order detection.
///
/// Only the fixed 44-byte layout is read; use [`read_header_with_extra`]
/// to locate the payload.
pub fn read_header(wav: &[u8]) -> Result<WavHeader> {
    resolve_byte_order(wav).map(|(_, header)| header)
}

/// Decode the header, scan for the "data" chunk and count samples.
pub fn read_header_with_extra(wav: &[u8]) -> Result<ParsedMetadata> {
    let (byte_order, mut header) = resolve_byte_order(wav)?;

    if header.fmt.kind() != AudioFormat::Pcm {
        warn!("Audio format {:?} is not linear PCM, passing through", header.fmt.kind());
    }
    if !header.fmt.is_consistent() {
        warn!(
            "fmt block inconsistent: byte_rate={} block_align={}",
            header.fmt.byte_rate, header.fmt.block_align
        );
    }

    let location = scan_for_data(wav, &header.fmt, byte_order)?;
    header.data = location.descriptor;

    let bytes_per_sample = header.fmt.bytes_per_sample();
    if bytes_per_sample == 0 {
        return Err(WavError::UnsupportedSampleWidth(header.fmt.bits_per_sample));
    }

    let sample_nums = (wav.len() - location.pcm_offset) / usize::from(bytes_per_sample);

    Ok(ParsedMetadata {
        header,
        byte_order,
        pcm_offset: location.pcm_offset,
        sample_nums,
    })
}

/// Wrap raw samples in a canonical little-endian WAV container.
///
/// Channel count, rate and width are taken as given.
pub fn pcm_to_wav(channels: u16, sample_rate: u32, bits_per_sample: u16, pcm: &[u8]) -> Result<Vec<u8>> {
    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|&len| len <= MAX_PAYLOAD_LEN)
        .ok_or(WavError::PayloadTooLarge(pcm.len()))?;

    let header = WavHeader::new(channels, sample_rate, bits_per_sample, data_len);
    let mut wav = header.to_bytes();
    wav.reserve_exact(pcm.len());
    wav.extend_from_slice(pcm);

    debug!("Encoded {} PCM bytes into {} byte WAV", pcm.len(), wav.len());
    Ok(wav)
}

/// Split a WAV buffer into its payload and metadata.
///
/// The payload runs from the data chunk to the end of the buffer and
/// borrows from `wav`.
pub fn wav_to_pcm(wav: &[u8]) -> Result<(&[u8], ParsedMetadata)> {
    let meta = read_header_with_extra(wav)?;
    Ok((&wav[meta.pcm_offset..], meta))
}
