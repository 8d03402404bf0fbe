//! Errors raised while assembling a container.

use super::directory::SectionId;

/// Error type for container writing.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("I/O error while writing container: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory slot {slot:#x} for {section} lies outside the written front matter ({written:#x} bytes)")]
    SlotOutOfRange {
        section: SectionId,
        slot: u64,
        written: u64,
    },

    #[error("Template for {section} is {actual} bytes, expected {expected}")]
    TemplateSize {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("No directory entry for section {0}")]
    UnknownSection(SectionId),

    #[error("Section {0} is a buffer section and must be written with its header")]
    BufferSection(SectionId),

    #[error("Patch at {offset:#x} ({len} bytes) runs past section end {end:#x}")]
    PatchOutOfRange { offset: u64, len: usize, end: u64 },

    #[error("Container exceeds the 4 GiB addressable by u32 offsets ({0} bytes)")]
    TooLarge(u64),
}
