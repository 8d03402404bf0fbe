//! Attribute packing utilities
//!
//! Converts f64 mesh attributes to the fixed-width fields of the modelbin
//! vertex and index buffers:
//! - position → unorm16 remapped to i16 (`round(scaled × 65535) − 32768`)
//! - normal component → snorm16 (`round(c × 32767)`, unclamped)
//! - UV component → unorm16 over the mesh's own UV range
//! - face index → i32, 0-based
//!
//! Every 16-bit field is passed through [`swap16`] and emitted big-endian. The
//! net result on disk is little-endian, matching the reference exporter byte
//! for byte. Rounding is round-half-to-even throughout.

use glam::DVec3;

// ============================================================================
// Record Layout Constants
// ============================================================================

/// Bytes per position record: X, Y, Z (quantized) + normal X (snorm16)
pub const POSITION_STRIDE: usize = 8;
/// Bytes per normal/UV record: normal Y, Z + UV + 8 replicated UV channels
pub const NORMAL_UV_STRIDE: usize = 40;
/// Number of placeholder UV channels written after the primary UV pair
pub const UV_EXTRA_CHANNELS: usize = 8;
/// Bytes per index
pub const INDEX_STRIDE: usize = 4;

/// Normal used wherever a vertex has no usable normal
pub const DEFAULT_NORMAL: [f64; 3] = [0.0, 1.0, 0.0];
/// UV used wherever a vertex has no usable texture coordinate
pub const DEFAULT_UV: [f64; 2] = [0.5, 0.5];

// ============================================================================
// Primitive Conversions
// ============================================================================

/// Round to nearest, ties to even.
#[inline]
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Exchange the two bytes of a 16-bit field.
#[inline]
pub const fn swap16(value: u16) -> u16 {
    value.swap_bytes()
}

/// Recover the logical value of a 16-bit field as stored on disk.
#[inline]
pub const fn unswap16(stored: [u8; 2]) -> u16 {
    swap16(u16::from_be_bytes(stored))
}

/// Append a 16-bit field: swap, then emit big-endian.
#[inline]
pub fn write_swapped16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&swap16(value).to_be_bytes());
}

/// Normalize to unit length; a zero-length (or non-finite) vector becomes +Y.
#[inline]
pub fn normalize_or_up(v: DVec3) -> DVec3 {
    let length = v.length();
    if length > 0.0 && length.is_finite() {
        v / length
    } else {
        DVec3::from_array(DEFAULT_NORMAL)
    }
}

// ============================================================================
// Position Packing
// ============================================================================

/// Quantize one position component against a symmetric range `R`.
///
/// `scaled = clamp(0.5 + coord / R, 0, 1)`, then mapped to
/// `round(scaled × 65535) − 32768`. A non-positive range maps everything to
/// the midpoint.
#[inline]
pub fn quantize_position(coord: f64, range: f64) -> i16 {
    let scaled = if range > 0.0 { 0.5 + coord / range } else { 0.5 };
    let scaled = scaled.clamp(0.0, 1.0);
    (round_half_even(scaled * 65535.0) - 32768.0) as i16
}

// ============================================================================
// Normal Packing
// ============================================================================

/// Pack one unit-normal component to snorm16. No clamping.
#[inline]
pub fn pack_normal_snorm16(component: f64) -> i16 {
    round_half_even(component * 32767.0) as i16
}

// ============================================================================
// UV Packing
// ============================================================================

/// Pack one UV component to unorm16 relative to the mesh's `[min, max]`.
///
/// Zero-width ranges encode mid-scale.
#[inline]
pub fn pack_uv_unorm16(value: f64, min: f64, max: f64) -> u16 {
    let range = max - min;
    let scaled = if range > 0.0 { (value - min) / range } else { 0.5 };
    round_half_even(scaled * 65535.0) as u16
}

// ============================================================================
// Index Packing
// ============================================================================

/// Pack a 0-based vertex index as little-endian i32.
#[inline]
pub fn pack_index_i32(index: u32) -> [u8; INDEX_STRIDE] {
    (index as i32).to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap16_emits_little_endian() {
        let mut out = Vec::new();
        write_swapped16(&mut out, 0x1234);
        assert_eq!(out, vec![0x34, 0x12]);
        assert_eq!(out, 0x1234u16.to_le_bytes());
        assert_eq!(unswap16([out[0], out[1]]), 0x1234);
    }

    #[test]
    fn test_swap16_negative_value() {
        let mut out = Vec::new();
        write_swapped16(&mut out, (-32768i16) as u16);
        assert_eq!(out, vec![0x00, 0x80]);
        assert_eq!(unswap16([out[0], out[1]]) as i16, -32768);
    }

    #[test]
    fn test_quantize_position_bounds() {
        // Symmetric range of 2.0 spans [-1, 1]
        assert_eq!(quantize_position(1.0, 2.0), 32767);
        assert_eq!(quantize_position(-1.0, 2.0), -32768);
        // 0.5 × 65535 = 32767.5 rounds to even (32768)
        assert_eq!(quantize_position(0.0, 2.0), 0);
    }

    #[test]
    fn test_quantize_position_clamps() {
        assert_eq!(quantize_position(10.0, 2.0), 32767);
        assert_eq!(quantize_position(-10.0, 2.0), -32768);
    }

    #[test]
    fn test_quantize_position_zero_range() {
        assert_eq!(quantize_position(3.0, 0.0), 0);
    }

    #[test]
    fn test_pack_normal_snorm16_range() {
        assert_eq!(pack_normal_snorm16(1.0), 32767);
        assert_eq!(pack_normal_snorm16(-1.0), -32767);
        assert_eq!(pack_normal_snorm16(0.0), 0);
    }

    #[test]
    fn test_pack_uv_unorm16() {
        assert_eq!(pack_uv_unorm16(0.0, 0.0, 1.0), 0);
        assert_eq!(pack_uv_unorm16(1.0, 0.0, 1.0), 65535);
        assert_eq!(pack_uv_unorm16(3.0, 2.0, 4.0), 32768);
        // Degenerate range: mid-scale
        assert_eq!(pack_uv_unorm16(0.5, 0.5, 0.5), 32768);
    }

    #[test]
    fn test_pack_index_i32() {
        assert_eq!(pack_index_i32(0), [0, 0, 0, 0]);
        assert_eq!(pack_index_i32(258), [2, 1, 0, 0]);
    }

    #[test]
    fn test_normalize_or_up() {
        let n = normalize_or_up(DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(n, DVec3::Z);
        assert_eq!(normalize_or_up(DVec3::ZERO), DVec3::Y);
    }
}
