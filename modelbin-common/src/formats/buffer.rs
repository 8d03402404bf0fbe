//! Buffer section header
//!
//! Every data-bearing section (index buffer, position buffer, normal/UV
//! buffer) is preceded by a 16-byte header. The writer emits a placeholder,
//! appends the payload, then patches `count` and `size`.
//!
//! # Layout
//! ```text
//! 0x00: count u32 (records)
//! 0x04: size u32 (payload bytes, header excluded)
//! 0x08: stride u16
//! 0x0A: element_count u16
//! 0x0C: format u32 (DXGI format id)
//! ```

use crate::packing::{INDEX_STRIDE, NORMAL_UV_STRIDE, POSITION_STRIDE};

/// Which buffer a header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Face indices, i32 each
    Indices,
    /// Quantized X/Y/Z + normal X
    Positions,
    /// Normal Y/Z + UV channels
    NormalsUvs,
}

impl BufferKind {
    /// Bytes per record
    pub const fn stride(self) -> u16 {
        match self {
            Self::Indices => INDEX_STRIDE as u16,
            Self::Positions => POSITION_STRIDE as u16,
            Self::NormalsUvs => NORMAL_UV_STRIDE as u16,
        }
    }

    /// Number of vertex elements the record is declared as
    pub const fn element_count(self) -> u16 {
        match self {
            Self::Indices | Self::Positions => 1,
            Self::NormalsUvs => 10,
        }
    }

    /// Declared element format
    pub const fn format(self) -> u32 {
        match self {
            Self::Indices => 42,    // R32_UINT
            Self::Positions => 13,  // R16G16B16A16_SNORM
            Self::NormalsUvs => 37, // R16G16_SNORM
        }
    }

    /// Header bytes written before the payload is known
    pub const fn placeholder(self) -> [u8; BufferHeader::SIZE] {
        let fill: [u8; 8] = match self {
            Self::Positions => [0x00; 8],
            Self::Indices => [0xFF; 8],
            Self::NormalsUvs => [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00],
        };
        let stride = self.stride().to_le_bytes();
        let elements = self.element_count().to_le_bytes();
        let format = self.format().to_le_bytes();
        [
            fill[0], fill[1], fill[2], fill[3], fill[4], fill[5], fill[6], fill[7], stride[0],
            stride[1], elements[0], elements[1], format[0], format[1], format[2], format[3],
        ]
    }
}

/// Buffer header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct BufferHeader {
    pub count: u32,
    pub size: u32,
    pub stride: u16,
    pub element_count: u16,
    pub format: u32,
}

impl BufferHeader {
    pub const SIZE: usize = 16;

    /// Build the final header for a payload of `payload_len` bytes.
    pub fn for_payload(kind: BufferKind, payload_len: usize) -> Self {
        Self {
            count: (payload_len / kind.stride() as usize) as u32,
            size: payload_len as u32,
            stride: kind.stride(),
            element_count: kind.element_count(),
            format: kind.format(),
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.stride.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.element_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.format.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            stride: u16::from_le_bytes([bytes[8], bytes[9]]),
            element_count: u16::from_le_bytes([bytes[10], bytes[11]]),
            format: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }

    /// Only the patchable prefix (count, size)
    pub fn counts_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.to_bytes()[0..8]);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_match_reference_bytes() {
        assert_eq!(
            BufferKind::Positions.placeholder(),
            [0, 0, 0, 0, 0, 0, 0, 0, 0x08, 0x00, 0x01, 0x00, 0x0D, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            BufferKind::Indices.placeholder(),
            [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x04, 0x00, 0x01, 0x00, 0x2A, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            BufferKind::NormalsUvs.placeholder(),
            [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x28, 0x00, 0x0A, 0x00, 0x25, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_for_payload_counts_records() {
        let header = BufferHeader::for_payload(BufferKind::NormalsUvs, 120);
        assert_eq!(header.count, 3);
        assert_eq!(header.size, 120);
        assert_eq!(header.stride, 40);

        let parsed = BufferHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_counts_bytes_prefix() {
        let header = BufferHeader::for_payload(BufferKind::Indices, 12);
        let prefix = header.counts_bytes();
        assert_eq!(&prefix[0..4], &3u32.to_le_bytes());
        assert_eq!(&prefix[4..8], &12u32.to_le_bytes());
    }
}
