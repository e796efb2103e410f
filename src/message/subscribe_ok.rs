use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params};

use super::{AbsoluteLocation, GroupOrder};

/// Sent by the publisher to accept a subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscribeOk {
	/// The ID of the subscription being accepted.
	pub id: u64,

	/// The subscription expires after this many milliseconds; zero means never.
	pub expires: u64,

	/// The concrete group delivery order; Default is not allowed here.
	pub group_order: GroupOrder,

	/// The largest location published so far, if any content exists.
	pub latest: Option<AbsoluteLocation>,

	/// Optional parameters.
	pub params: Params,
}

impl Decode for SubscribeOk {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let expires = u64::decode(r)?;

		// The order must be resolved by now.
		let group_order = GroupOrder::decode(r)?;
		if group_order == GroupOrder::Default {
			return Err(DecodeError::InvalidGroupOrder(0));
		}

		let latest = match u8::decode(r)? {
			0 => None,
			1 => Some(AbsoluteLocation::decode(r)?),
			_ => return Err(DecodeError::InvalidValue),
		};

		let params = Params::decode(r)?;

		Ok(Self {
			id,
			expires,
			group_order,
			latest,
			params,
		})
	}
}

impl Encode for SubscribeOk {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.id.encode(w)?;
		self.expires.encode(w)?;

		if self.group_order == GroupOrder::Default {
			return Err(EncodeError::MissingField);
		}
		self.group_order.encode(w)?;

		match self.latest {
			Some(latest) => {
				1u8.encode(w)?;
				latest.encode(w)?;
			}
			None => 0u8.encode(w)?,
		}

		self.params.encode(w)?;

		Ok(())
	}
}
