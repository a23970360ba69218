//! Fixed WAV header: RIFF block, fmt block and the chunk descriptor after it
//!
//! Layout (44 bytes for canonical PCM files):
//! - RIFF block:  "RIFF", size (u32), "WAVE"
//! - fmt block:   "fmt ", size (u32), format, channels, rate, byte rate, align, bits
//! - descriptor:  4-byte tag + u32 length of whatever chunk follows the fmt body
//!
//! Every field is read and written at its declared offset and width in one
//! byte order. Struct memory layout never touches the wire format.

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};
use serde::{Serialize, Serializer};

use crate::{Result, WavError};

pub const RIFF_TAG: [u8; 4] = *b"RIFF";
pub const WAVE_TAG: [u8; 4] = *b"WAVE";
pub const FMT_TAG: [u8; 4] = *b"fmt ";
pub const DATA_TAG: [u8; 4] = *b"data";

/// RIFF block: tag + size + format tag
pub const RIFF_BLOCK_LEN: usize = 12;
/// Tag + length prefix of every chunk
pub const CHUNK_HEADER_LEN: usize = 8;
/// fmt body size for uncompressed PCM
pub const PCM_FMT_LEN: u32 = 16;
/// RIFF block + 16-byte fmt block + one chunk descriptor
pub const HEADER_LEN: usize = 44;

/// Bytes between the RIFF size field and the payload of a canonical file
const CANONICAL_RIFF_OVERHEAD: u32 = 36;

// ============================================================================
// Byte order
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    pub fn label(&self) -> &'static str {
        match self {
            ByteOrder::BigEndian => "BE",
            ByteOrder::LittleEndian => "LE",
        }
    }
}

/// Order-aware, bounds-checked cursor over a byte slice
pub(crate) struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize, order: ByteOrder) -> Self {
        Self { data, pos, order }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(WavError::TruncatedInput {
                offset: self.pos,
                needed: len,
                available: self.data.len(),
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn read_tag(&mut self) -> Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(self.take(4)?);
        Ok(tag)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(match self.order {
            ByteOrder::BigEndian => BigEndian::read_u16(bytes),
            ByteOrder::LittleEndian => LittleEndian::read_u16(bytes),
        })
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(match self.order {
            ByteOrder::BigEndian => BigEndian::read_u32(bytes),
            ByteOrder::LittleEndian => LittleEndian::read_u32(bytes),
        })
    }
}

struct FieldWriter {
    buf: Vec<u8>,
    order: ByteOrder,
}

impl FieldWriter {
    fn with_capacity(capacity: usize, order: ByteOrder) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            order,
        }
    }

    fn put_tag(&mut self, tag: &[u8; 4]) {
        self.buf.extend_from_slice(tag);
    }

    fn put_u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        match self.order {
            ByteOrder::BigEndian => BigEndian::write_u16(&mut bytes, value),
            ByteOrder::LittleEndian => LittleEndian::write_u16(&mut bytes, value),
        }
        self.buf.extend_from_slice(&bytes);
    }

    fn put_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        match self.order {
            ByteOrder::BigEndian => BigEndian::write_u32(&mut bytes, value),
            ByteOrder::LittleEndian => LittleEndian::write_u32(&mut bytes, value),
        }
        self.buf.extend_from_slice(&bytes);
    }
}

/// Render a FourCC as text, replacing non-UTF-8 bytes
pub fn tag_str(tag: &[u8; 4]) -> Cow<'_, str> {
    String::from_utf8_lossy(tag)
}

fn serialize_tag<S: Serializer>(tag: &[u8; 4], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&tag_str(tag))
}

// ============================================================================
// Header blocks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiffBlock {
    /// "RIFF"
    #[serde(serialize_with = "serialize_tag")]
    pub id: [u8; 4],
    /// Total file size minus the 8 bytes of id + size
    pub size: u32,
    /// "WAVE"
    #[serde(serialize_with = "serialize_tag")]
    pub format: [u8; 4],
}

impl RiffBlock {
    pub fn is_wave(&self) -> bool {
        self.id == RIFF_TAG && self.format == WAVE_TAG
    }
}

/// Known values of the fmt block's audio-format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioFormat {
    Pcm,
    IeeeFloat,
    ALaw,
    MuLaw,
    Extensible,
    Other(u16),
}

impl From<u16> for AudioFormat {
    fn from(code: u16) -> Self {
        match code {
            0x0001 => AudioFormat::Pcm,
            0x0003 => AudioFormat::IeeeFloat,
            0x0006 => AudioFormat::ALaw,
            0x0007 => AudioFormat::MuLaw,
            0xFFFE => AudioFormat::Extensible,
            other => AudioFormat::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatBlock {
    /// "fmt "
    #[serde(serialize_with = "serialize_tag")]
    pub id: [u8; 4],
    /// Body size; 16 for PCM, larger for extended formats
    pub size: u32,
    /// 1 = linear PCM
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    /// sample_rate * num_channels * bits_per_sample / 8
    pub byte_rate: u32,
    /// num_channels * bits_per_sample / 8
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatBlock {
    /// Linear PCM format block with derived byte rate and block align.
    ///
    /// Derived fields wrap at their field width; callers own parameter sanity.
    pub fn pcm(num_channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            id: FMT_TAG,
            size: PCM_FMT_LEN,
            audio_format: 1,
            num_channels,
            sample_rate,
            byte_rate: sample_rate
                .wrapping_mul(u32::from(num_channels))
                .wrapping_mul(u32::from(bits_per_sample))
                / 8,
            block_align: num_channels.wrapping_mul(bits_per_sample) / 8,
            bits_per_sample,
        }
    }

    pub fn kind(&self) -> AudioFormat {
        AudioFormat::from(self.audio_format)
    }

    /// Whole bytes per single-channel sample (0 for widths below 8 bits)
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Whether byte rate and block align agree with channels, rate and width
    pub fn is_consistent(&self) -> bool {
        let expected = FormatBlock::pcm(self.num_channels, self.sample_rate, self.bits_per_sample);
        self.byte_rate == expected.byte_rate && self.block_align == expected.block_align
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkDescriptor {
    #[serde(serialize_with = "serialize_tag")]
    pub id: [u8; 4],
    /// Payload length, excluding this 8-byte descriptor
    pub size: u32,
}

impl ChunkDescriptor {
    pub fn data(size: u32) -> Self {
        Self { id: DATA_TAG, size }
    }

    pub fn is_data(&self) -> bool {
        self.id == DATA_TAG
    }

    pub(crate) fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            id: reader.read_tag()?,
            size: reader.read_u32()?,
        })
    }
}

// ============================================================================
// Composed header
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub riff: RiffBlock,
    pub fmt: FormatBlock,
    pub data: ChunkDescriptor,
}

impl WavHeader {
    /// Canonical PCM header for `data_len` payload bytes
    pub fn new(num_channels: u16, sample_rate: u32, bits_per_sample: u16, data_len: u32) -> Self {
        Self {
            riff: RiffBlock {
                id: RIFF_TAG,
                size: CANONICAL_RIFF_OVERHEAD.wrapping_add(data_len),
                format: WAVE_TAG,
            },
            fmt: FormatBlock::pcm(num_channels, sample_rate, bits_per_sample),
            data: ChunkDescriptor::data(data_len),
        }
    }

    /// Serialize the three blocks back to back in `order`.
    pub fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(HEADER_LEN, order);

        w.put_tag(&self.riff.id);
        w.put_u32(self.riff.size);
        w.put_tag(&self.riff.format);

        w.put_tag(&self.fmt.id);
        w.put_u32(self.fmt.size);
        w.put_u16(self.fmt.audio_format);
        w.put_u16(self.fmt.num_channels);
        w.put_u32(self.fmt.sample_rate);
        w.put_u32(self.fmt.byte_rate);
        w.put_u16(self.fmt.block_align);
        w.put_u16(self.fmt.bits_per_sample);

        w.put_tag(&self.data.id);
        w.put_u32(self.data.size);

        w.buf
    }

    /// Little-endian encoding, used for every newly synthesized file
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode(ByteOrder::LittleEndian)
    }

    /// Decode the fixed 44-byte layout under a caller-chosen byte order.
    ///
    /// The descriptor is whatever sits at offset 36; it only names the
    /// payload when the fmt body is exactly 16 bytes.
    pub fn decode(data: &[u8], order: ByteOrder) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(WavError::TruncatedInput {
                offset: 0,
                needed: HEADER_LEN,
                available: data.len(),
            });
        }

        let mut r = FieldReader::new(data, 0, order);
        let riff = RiffBlock {
            id: r.read_tag()?,
            size: r.read_u32()?,
            format: r.read_tag()?,
        };
        let fmt = FormatBlock {
            id: r.read_tag()?,
            size: r.read_u32()?,
            audio_format: r.read_u16()?,
            num_channels: r.read_u16()?,
            sample_rate: r.read_u32()?,
            byte_rate: r.read_u32()?,
            block_align: r.read_u16()?,
            bits_per_sample: r.read_u16()?,
        };
        let data = ChunkDescriptor::read(&mut r)?;

        Ok(Self { riff, fmt, data })
    }
}
