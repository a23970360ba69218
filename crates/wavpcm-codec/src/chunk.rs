//! Sub-chunk traversal after the fmt block
//!
//! Files from the wild often put LIST, fact, JUNK or vendor chunks between
//! "fmt " and "data". The scanner walks descriptors until it meets "data".

use tracing::{debug, trace};

use crate::header::{
    tag_str, ByteOrder, ChunkDescriptor, FieldReader, FormatBlock, CHUNK_HEADER_LEN, RIFF_BLOCK_LEN,
};
use crate::{Result, WavError};

/// Where the payload chunk was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLocation {
    pub descriptor: ChunkDescriptor,
    /// Offset of the first payload byte from the buffer start
    pub pcm_offset: usize,
}

/// Walk chunk descriptors until "data" is found.
///
/// Each non-data chunk is skipped by its declared length plus the 8-byte
/// descriptor. The position strictly grows and never passes the buffer end,
/// so the walk terminates on any input.
pub fn scan_for_data(data: &[u8], fmt: &FormatBlock, order: ByteOrder) -> Result<DataLocation> {
    // First descriptor sits right after the fmt body, whatever its declared size
    let fmt_body = RIFF_BLOCK_LEN + CHUNK_HEADER_LEN;
    let mut pos = fmt_body
        .checked_add(fmt.size as usize)
        .filter(|&pos| pos <= data.len())
        .ok_or(WavError::TruncatedInput {
            offset: fmt_body,
            needed: fmt.size as usize,
            available: data.len(),
        })?;

    loop {
        if pos == data.len() {
            return Err(WavError::MissingDataChunk { scanned: pos });
        }

        let mut reader = FieldReader::new(data, pos, order);
        let descriptor = ChunkDescriptor::read(&mut reader)?;
        let body = reader.pos();
        trace!("Chunk '{}' ({} bytes) at offset {}", tag_str(&descriptor.id), descriptor.size, pos);

        if descriptor.is_data() {
            let remaining = data.len() - body;
            if descriptor.size as usize != remaining {
                debug!(
                    "data chunk declares {} bytes, {} remain in buffer",
                    descriptor.size, remaining
                );
            }
            return Ok(DataLocation {
                descriptor,
                pcm_offset: body,
            });
        }

        let next = body
            .checked_add(descriptor.size as usize)
            .filter(|&next| next <= data.len())
            .ok_or(WavError::TruncatedInput {
                offset: body,
                needed: descriptor.size as usize,
                available: data.len(),
            })?;
        debug!(
            "Skipping chunk '{}' ({} bytes) at offset {}",
            tag_str(&descriptor.id),
            descriptor.size,
            pos
        );
        pos = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{WavHeader, HEADER_LEN};

    fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    /// RIFF + 16-byte fmt block without any trailing descriptor
    fn riff_and_fmt() -> Vec<u8> {
        WavHeader::new(1, 16000, 16, 0).to_bytes()[..36].to_vec()
    }

    #[test]
    fn test_data_right_after_fmt() {
        let mut wav = riff_and_fmt();
        wav.extend(chunk(b"data", &[1, 2, 3, 4]));
        let fmt = WavHeader::new(1, 16000, 16, 0).fmt;

        let loc = scan_for_data(&wav, &fmt, ByteOrder::LittleEndian).unwrap();
        assert_eq!(loc.pcm_offset, HEADER_LEN);
        assert_eq!(loc.descriptor, ChunkDescriptor::data(4));
    }

    #[test]
    fn test_skips_intervening_chunks() {
        let mut wav = riff_and_fmt();
        wav.extend(chunk(b"LIST", &[0xAA; 20]));
        wav.extend(chunk(b"fact", &[0, 0, 0, 0]));
        wav.extend(chunk(b"data", &[9; 6]));
        let fmt = WavHeader::new(1, 16000, 16, 0).fmt;

        let loc = scan_for_data(&wav, &fmt, ByteOrder::LittleEndian).unwrap();
        assert_eq!(loc.pcm_offset, 36 + 28 + 12 + 8);
        assert_eq!(&wav[loc.pcm_offset..], &[9; 6]);
    }

    #[test]
    fn test_honours_extended_fmt_size() {
        let mut fmt = WavHeader::new(2, 44100, 16, 0).fmt;
        fmt.size = 18;
        let mut wav = WavHeader::new(2, 44100, 16, 0).to_bytes()[..20].to_vec();
        wav[16..20].copy_from_slice(&18u32.to_le_bytes());
        wav.extend_from_slice(&[0u8; 18]);
        wav.extend(chunk(b"data", &[7; 8]));

        let loc = scan_for_data(&wav, &fmt, ByteOrder::LittleEndian).unwrap();
        assert_eq!(loc.pcm_offset, 20 + 18 + 8);
    }

    #[test]
    fn test_big_endian_descriptor_sizes() {
        let mut wav = WavHeader::new(1, 8000, 8, 0).encode(ByteOrder::BigEndian)[..36].to_vec();
        wav.extend_from_slice(b"JUNK");
        wav.extend_from_slice(&4u32.to_be_bytes());
        wav.extend_from_slice(&[0; 4]);
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&2u32.to_be_bytes());
        wav.extend_from_slice(&[5, 6]);
        let fmt = WavHeader::new(1, 8000, 8, 0).fmt;

        let loc = scan_for_data(&wav, &fmt, ByteOrder::BigEndian).unwrap();
        assert_eq!(loc.pcm_offset, 36 + 12 + 8);
        assert_eq!(loc.descriptor.size, 2);
    }

    #[test]
    fn test_exhausted_without_data() {
        let mut wav = riff_and_fmt();
        wav.extend(chunk(b"LIST", &[0; 4]));
        let fmt = WavHeader::new(1, 16000, 16, 0).fmt;

        assert_eq!(
            scan_for_data(&wav, &fmt, ByteOrder::LittleEndian),
            Err(WavError::MissingDataChunk { scanned: wav.len() })
        );
    }

    #[test]
    fn test_oversized_chunk_length_is_truncation() {
        let mut wav = riff_and_fmt();
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&u32::MAX.to_le_bytes());
        wav.extend_from_slice(&[0; 16]);
        let fmt = WavHeader::new(1, 16000, 16, 0).fmt;

        assert!(matches!(
            scan_for_data(&wav, &fmt, ByteOrder::LittleEndian),
            Err(WavError::TruncatedInput { offset: 44, .. })
        ));
    }

    #[test]
    fn test_partial_descriptor_is_truncation() {
        let mut wav = riff_and_fmt();
        wav.extend_from_slice(b"da");
        let fmt = WavHeader::new(1, 16000, 16, 0).fmt;

        assert!(matches!(
            scan_for_data(&wav, &fmt, ByteOrder::LittleEndian),
            Err(WavError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_fmt_size_past_buffer_end() {
        let mut fmt = WavHeader::new(1, 16000, 16, 0).fmt;
        fmt.size = u32::MAX;
        let wav = riff_and_fmt();

        assert!(matches!(
            scan_for_data(&wav, &fmt, ByteOrder::LittleEndian),
            Err(WavError::TruncatedInput { .. })
        ));
    }
}
