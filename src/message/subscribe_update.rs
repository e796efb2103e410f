use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params};

use super::AbsoluteLocation;

/// Sent by the subscriber to narrow an existing subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscribeUpdate {
	/// The ID of the subscription being updated.
	pub id: u64,

	/// The new start and end of the subscription.
	pub start: AbsoluteLocation,
	pub end: AbsoluteLocation,

	/// The new priority for this subscription.
	pub priority: u8,

	/// Optional parameters.
	pub params: Params,
}

impl Decode for SubscribeUpdate {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let start = AbsoluteLocation::decode(r)?;
		let end = AbsoluteLocation::decode(r)?;
		let priority = u8::decode(r)?;
		let params = Params::decode(r)?;

		Ok(Self {
			id,
			start,
			end,
			priority,
			params,
		})
	}
}

impl Encode for SubscribeUpdate {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.id.encode(w)?;
		self.start.encode(w)?;
		self.end.encode(w)?;
		self.priority.encode(w)?;
		self.params.encode(w)?;

		Ok(())
	}
}
