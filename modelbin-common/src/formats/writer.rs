//! Append-only container writer
//!
//! Sections are appended to the end of the stream; their locations are then
//! back-patched into the directory slots of the front matter. Patching never
//! grows the stream, so the writer only needs `Write + Seek`.

use std::io::{Seek, SeekFrom, Write};

use super::buffer::BufferHeader;
use super::bundle::{BUNDLE_HEADER_SIZE, FILE_SIZE_OFFSET, TABLE_ENTRY_COUNT, TABLE_ENTRY_SIZE};
use super::directory::{DirectoryEntry, SectionId};
use super::error::ContainerError;
use super::serialization::BinarySerializable;

/// Location of an appended block, relative to the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub offset: u64,
    pub size: u64,
}

/// Writes a modelbin container into any seekable sink.
pub struct ContainerWriter<W: Write + Seek> {
    inner: W,
    end: u64,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Start writing at the current end of `inner`.
    pub fn new(mut inner: W) -> Result<Self, ContainerError> {
        let end = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, end })
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Append the bundle header followed by the section table.
    pub fn write_front_matter(
        &mut self,
        header: &[u8],
        entries: &[&[u8]],
    ) -> Result<(), ContainerError> {
        check_size("bundle header", BUNDLE_HEADER_SIZE, header.len())?;
        check_size("section table", TABLE_ENTRY_COUNT, entries.len())?;
        for entry in entries {
            check_size("table entry", TABLE_ENTRY_SIZE, entry.len())?;
        }

        self.append_raw(header)?;
        for entry in entries {
            self.append_raw(entry)?;
        }
        Ok(())
    }

    /// Append bytes without registering them anywhere.
    pub fn append_raw(&mut self, bytes: &[u8]) -> Result<SectionSpan, ContainerError> {
        let offset = self.end;
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.write_all(bytes)?;
        self.end += bytes.len() as u64;
        Ok(SectionSpan {
            offset,
            size: bytes.len() as u64,
        })
    }

    /// Append a metadata blob and store its offset in the section's metadata slot.
    pub fn append_metadata(
        &mut self,
        section: SectionId,
        bytes: &[u8],
    ) -> Result<SectionSpan, ContainerError> {
        let entry = lookup(section)?;
        let span = self.append_raw(bytes)?;
        let offset = to_u32(span.offset)?;
        self.patch_slot(section, entry.metadata_slot, &offset.to_le_bytes())?;
        tracing::debug!("{} metadata at {:#x} ({} bytes)", section, span.offset, span.size);
        Ok(span)
    }

    /// Append an opaque data blob and register `(offset, size, size)`.
    pub fn append_section(
        &mut self,
        section: SectionId,
        bytes: &[u8],
    ) -> Result<SectionSpan, ContainerError> {
        let entry = lookup(section)?;
        if entry.buffer.is_some() {
            return Err(ContainerError::BufferSection(section));
        }
        let span = self.append_raw(bytes)?;
        self.register_data(entry, span)?;
        Ok(span)
    }

    /// Append a buffer header placeholder and payload, then patch the header
    /// counts and register the block (header included) in the data slot.
    pub fn append_buffer(
        &mut self,
        section: SectionId,
        payload: &[u8],
    ) -> Result<SectionSpan, ContainerError> {
        let entry = lookup(section)?;
        let kind = entry.buffer.ok_or(ContainerError::UnknownSection(section))?;

        let header_span = self.append_raw(&kind.placeholder())?;
        self.append_raw(payload)?;

        let header = BufferHeader::for_payload(kind, payload.len());
        self.patch(header_span.offset, &header.counts_bytes())?;

        let span = SectionSpan {
            offset: header_span.offset,
            size: (BufferHeader::SIZE + payload.len()) as u64,
        };
        self.register_data(entry, span)?;
        Ok(span)
    }

    /// Overwrite already-written bytes.
    pub fn patch(&mut self, offset: u64, bytes: &[u8]) -> Result<(), ContainerError> {
        if offset + bytes.len() as u64 > self.end {
            return Err(ContainerError::PatchOutOfRange {
                offset,
                len: bytes.len(),
                end: self.end,
            });
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Overwrite already-written bytes with a serialized block.
    pub fn patch_block<T: BinarySerializable>(
        &mut self,
        offset: u64,
        block: &T,
    ) -> Result<(), ContainerError> {
        self.patch(offset, &block.serialize())
    }

    /// Write the total length into the header and hand back the sink.
    pub fn finish(mut self) -> Result<W, ContainerError> {
        let size = to_u32(self.end)?;
        self.patch(FILE_SIZE_OFFSET, &size.to_le_bytes())?;
        self.inner.seek(SeekFrom::Start(self.end))?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn register_data(
        &mut self,
        entry: &DirectoryEntry,
        span: SectionSpan,
    ) -> Result<(), ContainerError> {
        let triple = DirectoryEntry::data_triple(to_u32(span.offset)?, to_u32(span.size)?);
        self.patch_slot(entry.section, entry.data_slot, &triple)?;
        tracing::debug!("{} data at {:#x} ({} bytes)", entry.section, span.offset, span.size);
        Ok(())
    }

    fn patch_slot(
        &mut self,
        section: SectionId,
        slot: u64,
        bytes: &[u8],
    ) -> Result<(), ContainerError> {
        if slot + bytes.len() as u64 > self.end {
            return Err(ContainerError::SlotOutOfRange {
                section,
                slot,
                written: self.end,
            });
        }
        self.patch(slot, bytes)
    }
}

fn lookup(section: SectionId) -> Result<&'static DirectoryEntry, ContainerError> {
    DirectoryEntry::for_section(section).ok_or(ContainerError::UnknownSection(section))
}

fn to_u32(value: u64) -> Result<u32, ContainerError> {
    u32::try_from(value).map_err(|_| ContainerError::TooLarge(value))
}

fn check_size(
    section: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ContainerError> {
    if expected != actual {
        return Err(ContainerError::TemplateSize {
            section,
            expected,
            actual,
        });
    }
    Ok(())
}
