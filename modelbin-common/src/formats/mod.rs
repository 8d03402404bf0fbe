//! modelbin container layout
//!
//! A modelbin file is a leading header, a fixed table of section entries, and
//! an append-only body. Every section is located through absolute slots in the
//! table ("the directory"), so the table layout is fixed configuration rather
//! than something derived at write time.
//!
//! ```text
//! 0x000: bundle header (20 bytes, file size u32 at 0x0C)
//! 0x014: 15 table entries × 24 bytes (directory slots live inside them)
//! 0x17C: body (sections appended in a fixed order)
//! ```
//!
//! All format headers implement the [`BinarySerializable`] trait for consistent
//! serialization/deserialization.

pub mod buffer;
pub mod bundle;
pub mod directory;
mod error;
pub mod mesh;
mod serialization;
pub mod writer;

pub use buffer::*;
pub use bundle::*;
pub use directory::*;
pub use error::ContainerError;
pub use mesh::*;
pub use serialization::BinarySerializable;
pub use writer::{ContainerWriter, SectionSpan};
