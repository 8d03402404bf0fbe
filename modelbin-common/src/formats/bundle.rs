//! Bundle front matter
//!
//! # Layout
//! ```text
//! 0x00: magic "burG" (4 bytes)
//! 0x04: version major u8, version minor u8, reserved u16
//! 0x08: reserved u32
//! 0x0C: file size u32 (patched last)
//! 0x10: table entry count u32
//! 0x14: table entries (TABLE_ENTRY_COUNT × TABLE_ENTRY_SIZE)
//! ```

/// Size of the leading bundle header
pub const BUNDLE_HEADER_SIZE: usize = 20;

/// Default bundle header bytes; the file size field is a placeholder
pub const BUNDLE_HEADER_TEMPLATE: [u8; BUNDLE_HEADER_SIZE] = [
    0x62, 0x75, 0x72, 0x47, // "burG"
    0x01, 0x01, 0x00, 0x00, //
    0x39, 0x03, 0x00, 0x00, //
    0xFF, 0xFF, 0xFF, 0xFF, // file size
    0x0F, 0x00, 0x00, 0x00, // table entries
];

/// Absolute offset of the file size field
pub const FILE_SIZE_OFFSET: u64 = 0x0C;

/// Size of one section table entry
pub const TABLE_ENTRY_SIZE: usize = 24;

/// Number of section table entries
pub const TABLE_ENTRY_COUNT: usize = 15;

/// Offset of the first table entry
pub const TABLE_OFFSET: u64 = BUNDLE_HEADER_SIZE as u64;

/// Total size of header plus section table; the body starts here
pub const FRONT_MATTER_SIZE: u64 = TABLE_OFFSET + (TABLE_ENTRY_SIZE * TABLE_ENTRY_COUNT) as u64;

/// Within a table entry: offset of the metadata pointer
pub const ENTRY_METADATA_OFFSET: u64 = 8;

/// Within a table entry: offset of the (offset, size, size) data triple
pub const ENTRY_DATA_OFFSET: u64 = 12;

/// Read the file size field back out of a finished container.
pub fn read_file_size(bytes: &[u8]) -> Option<u32> {
    let at = FILE_SIZE_OFFSET as usize;
    let field = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
}
