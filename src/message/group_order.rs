use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The group delivery order for a subscription, a single byte on the wire.
///
/// A subscriber may request [GroupOrder::Default] to accept the publisher's
/// preference; the publisher must resolve it to a concrete order in SUBSCRIBE_OK.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroupOrder {
	#[default]
	Default = 0x0,
	OldestFirst = 0x1,
	NewestFirst = 0x2,
}

impl GroupOrder {
	/// The concrete order for a subscription, preferring the subscriber's request.
	pub fn resolve(self, publisher: GroupOrder) -> GroupOrder {
		match self {
			Self::Default => publisher,
			_ => self,
		}
	}
}

impl TryFrom<u8> for GroupOrder {
	type Error = DecodeError;

	fn try_from(v: u8) -> Result<Self, Self::Error> {
		match v {
			0x0 => Ok(Self::Default),
			0x1 => Ok(Self::OldestFirst),
			0x2 => Ok(Self::NewestFirst),
			_ => Err(DecodeError::InvalidGroupOrder(v)),
		}
	}
}

impl Decode for GroupOrder {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		u8::decode(r)?.try_into()
	}
}

impl Encode for GroupOrder {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		(*self as u8).encode(w)
	}
}
