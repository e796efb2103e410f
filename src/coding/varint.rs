// Based on quinn-proto
// https://github.com/quinn-rs/quinn/blob/main/quinn-proto/src/varint.rs
// Licensed via Apache 2.0 and MIT

use std::convert::{TryFrom, TryInto};
use std::fmt;

use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use bytes::{Buf, BufMut};
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("value too large for varint encoding")]
pub struct BoundsExceeded;

/// An integer less than 2^62
///
/// Values of this type are suitable for encoding as QUIC variable-length integer.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarInt(u64);

impl VarInt {
	pub const MAX: Self = Self((1 << 62) - 1);

	/// Construct a `VarInt` infallibly using the largest available type.
	/// Larger values need to use `try_from` instead.
	pub const fn from_u32(x: u32) -> Self {
		Self(x as u64)
	}

	/// Extract the integer value
	pub const fn into_inner(self) -> u64 {
		self.0
	}
}

impl From<VarInt> for u64 {
	fn from(x: VarInt) -> Self {
		x.0
	}
}

impl From<VarInt> for usize {
	fn from(x: VarInt) -> Self {
		x.0 as usize
	}
}

impl From<u8> for VarInt {
	fn from(x: u8) -> Self {
		Self(x.into())
	}
}

impl From<u16> for VarInt {
	fn from(x: u16) -> Self {
		Self(x.into())
	}
}

impl From<u32> for VarInt {
	fn from(x: u32) -> Self {
		Self(x.into())
	}
}

impl TryFrom<u64> for VarInt {
	type Error = BoundsExceeded;

	/// Succeeds iff `x` < 2^62
	fn try_from(x: u64) -> Result<Self, BoundsExceeded> {
		if x <= Self::MAX.into_inner() {
			Ok(Self(x))
		} else {
			Err(BoundsExceeded)
		}
	}
}

impl TryFrom<usize> for VarInt {
	type Error = BoundsExceeded;

	/// Succeeds iff `x` < 2^62
	fn try_from(x: usize) -> Result<Self, BoundsExceeded> {
		Self::try_from(x as u64)
	}
}

impl fmt::Debug for VarInt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl fmt::Display for VarInt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl Decode for VarInt {
	fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let mut buf = [0u8; 8];

		Self::decode_remaining(r, 1)?;
		buf[0] = r.get_u8();

		let tag = buf[0] >> 6;
		buf[0] &= 0b0011_1111;

		let x = match tag {
			0b00 => u64::from(buf[0]),
			0b01 => {
				Self::decode_remaining(r, 1)?;
				r.copy_to_slice(buf[1..2].as_mut());
				u64::from(u16::from_be_bytes(buf[..2].try_into().unwrap()))
			}
			0b10 => {
				Self::decode_remaining(r, 3)?;
				r.copy_to_slice(buf[1..4].as_mut());
				u64::from(u32::from_be_bytes(buf[..4].try_into().unwrap()))
			}
			0b11 => {
				Self::decode_remaining(r, 7)?;
				r.copy_to_slice(buf[1..8].as_mut());
				u64::from_be_bytes(buf)
			}
			_ => unreachable!(),
		};

		Ok(Self(x))
	}
}

impl Encode for VarInt {
	/// Encode the value using the minimal-length form.
	fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		let x = self.0;
		if x < 2u64.pow(6) {
			Self::encode_remaining(w, 1)?;
			w.put_u8(x as u8);
		} else if x < 2u64.pow(14) {
			Self::encode_remaining(w, 2)?;
			w.put_u16(0b01 << 14 | x as u16);
		} else if x < 2u64.pow(30) {
			Self::encode_remaining(w, 4)?;
			w.put_u32(0b10 << 30 | x as u32);
		} else if x < 2u64.pow(62) {
			Self::encode_remaining(w, 8)?;
			w.put_u64(0b11 << 62 | x);
		} else {
			return Err(EncodeError::BoundsExceeded);
		}

		Ok(())
	}
}

impl Decode for u64 {
	fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(VarInt::decode(r)?.into_inner())
	}
}

impl Encode for u64 {
	fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		let v = VarInt::try_from(*self).map_err(|_| EncodeError::BoundsExceeded)?;
		v.encode(w)
	}
}

impl Decode for usize {
	fn decode<R: Buf>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(u64::decode(r)? as usize)
	}
}

impl Encode for usize {
	fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		(*self as u64).encode(w)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::io::Cursor;

	fn encode(v: u64) -> Vec<u8> {
		let mut buf = Vec::new();
		v.encode(&mut buf).unwrap();
		buf
	}

	#[test]
	fn minimal_length() {
		assert_eq!(encode(0).len(), 1);
		assert_eq!(encode(63).len(), 1);
		assert_eq!(encode(64).len(), 2);
		assert_eq!(encode(16383).len(), 2);
		assert_eq!(encode(16384).len(), 4);
		assert_eq!(encode(1073741823).len(), 4);
		assert_eq!(encode(1073741824).len(), 8);
		assert_eq!(encode(VarInt::MAX.into_inner()).len(), 8);
	}

	#[test]
	fn round_trip() {
		for v in [0u64, 1, 63, 64, 16383, 16384, 0xff000001, (1 << 62) - 1] {
			let buf = encode(v);
			let mut cursor = Cursor::new(&buf);
			assert_eq!(u64::decode(&mut cursor).unwrap(), v);
			assert_eq!(cursor.remaining(), 0);
		}
	}

	#[test]
	fn underflow() {
		let buf = encode(16384);
		for len in 0..buf.len() {
			let mut cursor = Cursor::new(&buf[..len]);
			assert!(matches!(u64::decode(&mut cursor), Err(DecodeError::More(_))));
		}
	}

	#[test]
	fn bounds() {
		let mut buf = Vec::new();
		assert!(matches!(
			(1u64 << 62).encode(&mut buf),
			Err(EncodeError::BoundsExceeded)
		));
	}
}
