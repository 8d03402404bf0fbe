//! Binary serialization trait for fixed-size format blocks.
//!
//! The buffer header and the mesh counts block implement `BinarySerializable`
//! so the container writer can patch either through one generic routine, while
//! each type keeps its own `to_bytes()` returning a fixed-size array.

/// Trait for binary-serializable fixed-size blocks.
///
/// Uses `Vec<u8>` for the return type because associated const generics in
/// return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use modelbin_common::formats::{BinarySerializable, BufferHeader, BufferKind};
///
/// let header = BufferHeader::for_payload(BufferKind::Positions, 64);
///
/// let bytes = header.serialize();
/// let parsed = BufferHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.count, 8);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized block in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::BufferHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::MeshCounts {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}
