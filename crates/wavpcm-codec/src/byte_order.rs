//! Byte-order detection for WAV headers
//!
//! Plenty of tools write the header fields in the wrong endianness. The
//! channel count is used as a plausibility oracle: read big-endian first,
//! and if that yields more than [`MAX_PLAUSIBLE_CHANNELS`] channels, read
//! the same bytes little-endian instead.
//!
//! This is best-effort. A real file with more than 200 channels, or a
//! corrupt one whose misread count lands under the threshold, is
//! misclassified.

use tracing::debug;

use crate::header::{tag_str, ByteOrder, WavHeader};
use crate::{Result, WavError};

/// Channel counts above this are taken as a sign of the wrong byte order
pub const MAX_PLAUSIBLE_CHANNELS: u16 = 200;

fn is_plausible(header: &WavHeader) -> bool {
    header.fmt.num_channels <= MAX_PLAUSIBLE_CHANNELS
}

/// Decide the byte order of `data` and return it with the decoded header.
pub fn resolve_byte_order(data: &[u8]) -> Result<(ByteOrder, WavHeader)> {
    let header = WavHeader::decode(data, ByteOrder::BigEndian)?;

    // Tags are plain bytes, so one check covers both orders
    if !header.riff.is_wave() {
        return Err(WavError::NotWavFormat(format!(
            "expected RIFF/WAVE tags, found '{}'/'{}'",
            tag_str(&header.riff.id),
            tag_str(&header.riff.format)
        )));
    }

    if is_plausible(&header) {
        debug!("Header resolved as BE ({} channels)", header.fmt.num_channels);
        return Ok((ByteOrder::BigEndian, header));
    }

    let header = WavHeader::decode(data, ByteOrder::LittleEndian)?;
    if is_plausible(&header) {
        debug!("Header resolved as LE ({} channels)", header.fmt.num_channels);
        return Ok((ByteOrder::LittleEndian, header));
    }

    Err(WavError::NotWavFormat(format!(
        "channel count {} is implausible in either byte order",
        header.fmt.num_channels
    )))
}
