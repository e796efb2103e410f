use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use super::AbsoluteLocation;

/// Sent by the publisher to cleanly terminate a subscription.
///
/// No further objects will be delivered for this subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscribeDone {
	/// The ID of the subscription that ended.
	pub id: u64,

	/// A status code.
	pub code: u64,

	/// A human-readable reason.
	pub reason: String,

	/// The final object delivered, if any content was.
	pub last: Option<AbsoluteLocation>,
}

impl SubscribeDone {
	pub const UNSUBSCRIBED: u64 = 0x0;
	pub const INTERNAL_ERROR: u64 = 0x1;
	pub const UNAUTHORIZED: u64 = 0x2;
	pub const TRACK_ENDED: u64 = 0x3;
	pub const SUBSCRIPTION_ENDED: u64 = 0x4;
	pub const GOING_AWAY: u64 = 0x5;
	pub const EXPIRED: u64 = 0x6;
}

impl Decode for SubscribeDone {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let code = u64::decode(r)?;
		let reason = String::decode(r)?;

		let last = match u8::decode(r)? {
			0 => None,
			1 => Some(AbsoluteLocation::decode(r)?),
			_ => return Err(DecodeError::InvalidValue),
		};

		Ok(Self {
			id,
			code,
			reason,
			last,
		})
	}
}

impl Encode for SubscribeDone {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.id.encode(w)?;
		self.code.encode(w)?;
		self.reason.encode(w)?;

		match self.last {
			Some(last) => {
				1u8.encode(w)?;
				last.encode(w)?;
			}
			None => 0u8.encode(w)?,
		}

		Ok(())
	}
}
