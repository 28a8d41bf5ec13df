//! Key and value codecs.
//!
//! The tree is generic over `Key: Ord` and `Value`, per the design note in
//! spec.md §9: keys are mapped to a fixed-width 8-byte big-endian slice for
//! on-disk storage and in-node comparison (the slice IS the on-disk key —
//! see spec.md §6's leaf/interior layout), and values are mapped to raw
//! bytes through a user-supplied [`ValueCodec`], overflowing to the
//! pager's overflow chain when the encoded value exceeds one page.
//!
//! [`KeySlice`] is implemented here for the fixed-width integer types that
//! cover the spec's test scenarios (`u64`, `i64`, `u32`, `i32`); a caller
//! with a different comparable key type implements `KeySlice` the same way,
//! as long as the mapping to `[u8; 8]` preserves `Ord`.

use crate::error::{Error, Result};

/// Width, in bytes, of an on-disk key slice.
pub const KEY_SLICE_SIZE: usize = 8;

/// Maps a comparable key to the fixed-width big-endian slice stored in
/// interior and leaf pages.
///
/// Implementations must preserve ordering: `a < b` in `Self` must imply
/// `a.to_slice() < b.to_slice()` under byte-lexicographic comparison, since
/// the B+ tree relies on slice order to binary-search nodes.
pub trait KeySlice: Ord + Copy {
    fn to_slice(&self) -> [u8; KEY_SLICE_SIZE];
    fn from_slice(bytes: [u8; KEY_SLICE_SIZE]) -> Self;
}

macro_rules! impl_key_slice_unsigned {
    ($ty:ty) => {
        impl KeySlice for $ty {
            fn to_slice(&self) -> [u8; KEY_SLICE_SIZE] {
                let mut out = [0u8; KEY_SLICE_SIZE];
                let bytes = self.to_be_bytes();
                out[KEY_SLICE_SIZE - bytes.len()..].copy_from_slice(&bytes);
                out
            }

            fn from_slice(bytes: [u8; KEY_SLICE_SIZE]) -> Self {
                let width = size_of::<$ty>();
                let mut buf = [0u8; size_of::<$ty>()];
                buf.copy_from_slice(&bytes[KEY_SLICE_SIZE - width..]);
                <$ty>::from_be_bytes(buf)
            }
        }
    };
}

impl_key_slice_unsigned!(u64);
impl_key_slice_unsigned!(u32);
impl_key_slice_unsigned!(u16);
impl_key_slice_unsigned!(u8);

impl KeySlice for i64 {
    // Bias by flipping the sign bit so two's-complement order matches
    // unsigned byte-lexicographic order.
    fn to_slice(&self) -> [u8; KEY_SLICE_SIZE] {
        ((*self as u64) ^ (1u64 << 63)).to_be_bytes()
    }

    fn from_slice(bytes: [u8; KEY_SLICE_SIZE]) -> Self {
        (u64::from_be_bytes(bytes) ^ (1u64 << 63)) as i64
    }
}

impl KeySlice for i32 {
    fn to_slice(&self) -> [u8; KEY_SLICE_SIZE] {
        (((*self as u32) ^ (1u32 << 31)) as u64).to_slice()
    }

    fn from_slice(bytes: [u8; KEY_SLICE_SIZE]) -> Self {
        let unbiased = u64::from_slice(bytes) as u32;
        (unbiased ^ (1u32 << 31)) as i32
    }
}

/// Maps a value to and from the raw bytes stored in a leaf entry (inline
/// or, for oversize values, via the pager's overflow chain).
pub trait ValueCodec<V> {
    fn encode(value: &V) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Result<V>;
}

/// Default [`ValueCodec`] built on `bincode`, for values that derive
/// `bincode::Encode`/`bincode::Decode` — the teacher crate's own
/// serialization dependency.
pub struct BincodeCodec;

impl<V> ValueCodec<V> for BincodeCodec
where
    V: bincode::Encode + bincode::Decode<()>,
{
    fn encode(value: &V) -> Vec<u8> {
        bincode::encode_to_vec(value, bincode::config::standard())
            .expect("in-memory bincode encoding is infallible for sized types")
    }

    fn decode(bytes: &[u8]) -> Result<V> {
        let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|_| Error::BadLength {
                expected: bytes.len(),
                actual: bytes.len(),
            })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_slice_round_trip_preserves_order() {
        let mut values = vec![5u64, 1, 1000, 0, u64::MAX, 42];
        let mut slices: Vec<_> = values.iter().map(|v| v.to_slice()).collect();
        values.sort();
        slices.sort();
        let decoded: Vec<u64> = slices.into_iter().map(u64::from_slice).collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn i64_slice_preserves_order_across_sign() {
        let mut values = vec![-10i64, 5, i64::MIN, i64::MAX, 0, -1];
        let mut slices: Vec<_> = values.iter().map(|v| v.to_slice()).collect();
        values.sort();
        slices.sort();
        let decoded: Vec<i64> = slices.into_iter().map(i64::from_slice).collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn bincode_codec_round_trips_strings() {
        let encoded = <BincodeCodec as ValueCodec<String>>::encode(&"hello".to_string());
        let decoded: String = <BincodeCodec as ValueCodec<String>>::decode(&encoded).unwrap();
        assert_eq!(decoded, "hello");
    }
}
