use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The status of an object, a varint on the wire.
///
/// Anything other than [ObjectStatus::Normal] means the object has no payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObjectStatus {
	#[default]
	Normal = 0x0,

	/// The object does not exist and never will.
	DoesNotExist = 0x1,

	/// The group ended at the previous object.
	EndOfGroup = 0x2,

	/// The track and group ended at the previous object.
	EndOfTrackAndGroup = 0x3,
}

impl ObjectStatus {
	/// A terminal status closes the stream carrying it.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::EndOfGroup | Self::EndOfTrackAndGroup)
	}
}

impl Decode for ObjectStatus {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		match u64::decode(r)? {
			0x0 => Ok(Self::Normal),
			0x1 => Ok(Self::DoesNotExist),
			0x2 => Ok(Self::EndOfGroup),
			0x3 => Ok(Self::EndOfTrackAndGroup),
			t => Err(DecodeError::InvalidObjectStatus(t)),
		}
	}
}

impl Encode for ObjectStatus {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		(*self as u64).encode(w)
	}
}
