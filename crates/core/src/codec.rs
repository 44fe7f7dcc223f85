//! Fixed-width binary packing of float vectors.
//!
//! Vectors are stored as consecutive single-precision little-endian floats,
//! the layout the `vec0` index expects for `float[N]` columns.

use crate::error::CoreError;

/// Width in bytes of one packed element.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f32>();

/// Pack a float sequence into little-endian `f32` bytes.
pub fn encode(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * ELEMENT_SIZE);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Pack double-precision values, narrowing each to `f32`.
pub fn encode_f64(values: &[f64]) -> Vec<u8> {
    let narrowed: Vec<f32> = values.iter().map(|v| *v as f32).collect();
    encode(&narrowed)
}

/// Unpack little-endian `f32` bytes.
///
/// Fails with [`CoreError::MalformedVector`] when the length is not a
/// multiple of [`ELEMENT_SIZE`].
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, CoreError> {
    if bytes.len() % ELEMENT_SIZE != 0 {
        return Err(CoreError::MalformedVector {
            len: bytes.len(),
            element_size: ELEMENT_SIZE,
        });
    }
    Ok(bytes
        .chunks_exact(ELEMENT_SIZE)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn roundtrip_preserves_values() {
        let values = [1.0f32, 2.5, -3.14, 0.0, 100.5];
        let decoded = decode(&encode(&values)).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn encoding_is_little_endian() {
        assert_eq!(encode(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
    }

    #[test]
    fn encode_f64_narrows_within_single_precision() {
        let values = [0.1f64, -0.7071067811865476, 0.7071067811865476];
        let decoded = decode(&encode_f64(&values)).unwrap();
        for (a, b) in values.iter().zip(&decoded) {
            assert!((a - *b as f64).abs() < 1e-7);
        }
    }

    #[test]
    fn empty_vector_is_empty_bytes() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_partial_element() {
        assert_matches!(
            decode(&[0u8; 7]),
            Err(CoreError::MalformedVector { len: 7, element_size: 4 })
        );
    }
}
