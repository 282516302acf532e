//! Binary frame envelope: fixed header plus tagged field entries.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────────────┐
//! │ BinaryHeader     │ field entries                        │
//! │ (16 bytes)       │ (tag u8, len u32 LE, bytes) repeated │
//! └──────────────────┴──────────────────────────────────────┘
//! ```

use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::error::ProtocolError;
use crate::messages::MessageType;

use super::fields::FieldTag;

/// `"WAMP"` interpreted as a big-endian u32.
pub const BINARY_MAGIC: u32 = 0x5741_4D50;

/// Envelope format version.
pub const BINARY_VERSION: u8 = 1;

/// Binary frame header (16 bytes).
///
/// Field ordering keeps natural alignment with zero padding: the u32
/// magic first for immediate protocol identification, then the four
/// single-byte fields, then the two u32 trailers. Do not reorder.
#[repr(C)]
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
pub struct BinaryHeader {
    pub magic: u32,
    pub version: u8,
    pub message_type: u8,
    pub flags: u8,
    pub reserved: u8,
    /// Field-entry bytes following the header.
    pub payload_size: u32,
    /// CRC32 of the whole frame with this field zeroed.
    pub checksum: u32,
}

impl BinaryHeader {
    pub const SIZE: usize = 16;

    /// Byte offset of the checksum field within the header.
    const CHECKSUM_OFFSET: usize = 12;

    pub fn new(message_type: MessageType) -> Self {
        BinaryHeader {
            magic: BINARY_MAGIC,
            version: BINARY_VERSION,
            message_type: message_type.into(),
            flags: 0,
            reserved: 0,
            payload_size: 0,
            checksum: 0,
        }
    }

    /// CRC32 over `frame` with the checksum field treated as zero.
    pub fn frame_checksum(frame: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&frame[..Self::CHECKSUM_OFFSET]);
        hasher.update(&[0u8; 4]);
        hasher.update(&frame[Self::SIZE..]);
        hasher.finalize()
    }

    /// Structural validation of a received frame's header.
    pub fn validate(&self, frame: &[u8]) -> Result<(), ProtocolError> {
        if self.magic != BINARY_MAGIC {
            return Err(ProtocolError::InvalidBinaryEnvelope {
                reason: format!("bad magic {:#010x}", self.magic),
                buffer_size: frame.len(),
            });
        }
        if self.version != BINARY_VERSION {
            return Err(ProtocolError::InvalidBinaryEnvelope {
                reason: format!("unsupported version {}", self.version),
                buffer_size: frame.len(),
            });
        }
        let expected_len = Self::SIZE + self.payload_size as usize;
        if frame.len() != expected_len {
            return Err(ProtocolError::InvalidBinaryEnvelope {
                reason: format!(
                    "payload_size {} disagrees with frame length",
                    self.payload_size
                ),
                buffer_size: frame.len(),
            });
        }
        let calculated = Self::frame_checksum(frame);
        if calculated != self.checksum {
            return Err(ProtocolError::ChecksumMismatch {
                expected: self.checksum,
                calculated,
                frame_size: frame.len(),
            });
        }
        Ok(())
    }
}

/// Incremental binary frame builder.
///
/// Writes a placeholder header, appends field entries, and patches the
/// size and checksum on `finish`.
pub struct BinaryBuilder {
    buf: Vec<u8>,
}

impl BinaryBuilder {
    pub fn new(message_type: MessageType) -> Self {
        let header = BinaryHeader::new(message_type);
        BinaryBuilder {
            buf: header.as_bytes().to_vec(),
        }
    }

    /// Append one `tag, len, bytes` field entry.
    pub fn push_field(&mut self, tag: FieldTag, bytes: &[u8]) {
        self.buf.push(tag.into());
        self.buf
            .extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(bytes);
    }

    /// Patch the header's payload size and checksum and return the frame.
    pub fn finish(mut self) -> Vec<u8> {
        let payload_size = (self.buf.len() - BinaryHeader::SIZE) as u32;
        self.buf[8..12].copy_from_slice(&payload_size.to_le_bytes());

        let checksum = BinaryHeader::frame_checksum(&self.buf);
        self.buf[12..16].copy_from_slice(&checksum.to_le_bytes());
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<BinaryHeader>(), BinaryHeader::SIZE);
    }

    #[test]
    fn finish_patches_size_and_checksum() {
        let mut builder = BinaryBuilder::new(MessageType::Call);
        builder.push_field(FieldTag::Request, &123u64.to_le_bytes());
        let frame = builder.finish();

        let header = BinaryHeader::read_from_prefix(&frame[..]).unwrap();
        assert_eq!(header.payload_size as usize, frame.len() - BinaryHeader::SIZE);
        assert!(header.validate(&frame).is_ok());
    }

    #[test]
    fn corruption_fails_checksum() {
        let mut builder = BinaryBuilder::new(MessageType::Call);
        builder.push_field(FieldTag::Request, &123u64.to_le_bytes());
        let mut frame = builder.finish();

        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        let header = BinaryHeader::read_from_prefix(&frame[..]).unwrap();
        assert!(matches!(
            header.validate(&frame),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn bad_magic_rejected() {
        let builder = BinaryBuilder::new(MessageType::Hello);
        let mut frame = builder.finish();
        frame[0] ^= 0xFF;
        let header = BinaryHeader::read_from_prefix(&frame[..]).unwrap();
        assert!(matches!(
            header.validate(&frame),
            Err(ProtocolError::InvalidBinaryEnvelope { .. })
        ));
    }
}
