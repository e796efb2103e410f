use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Where a subscription starts and ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterType {
	/// From the start of the current group.
	LatestGroup = 0x1,

	/// From the next object in the current group.
	LatestObject = 0x2,

	/// From an absolute start location.
	AbsoluteStart = 0x3,

	/// A closed range; the end is the last object delivered.
	AbsoluteRange = 0x4,
}

impl Decode for FilterType {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		match u64::decode(r)? {
			0x1 => Ok(Self::LatestGroup),
			0x2 => Ok(Self::LatestObject),
			0x3 => Ok(Self::AbsoluteStart),
			0x4 => Ok(Self::AbsoluteRange),
			t => Err(DecodeError::InvalidLocationType(t)),
		}
	}
}

impl Encode for FilterType {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		(*self as u64).encode(w)
	}
}
