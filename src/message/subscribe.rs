use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params};

use super::{AbsoluteLocation, FilterType, GroupOrder};

/// Sent by the subscriber to request objects for the given track.
///
/// Objects will use the provided alias instead of the full track name, to save bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscribe {
	/// An ID we choose, unique for the connection.
	pub id: u64,

	/// A short identifier used instead of the full track name on data streams.
	pub track_alias: u64,

	/// The track namespace and name.
	pub track_namespace: String,
	pub track_name: String,

	/// The priority for this subscription, where smaller is better.
	pub priority: u8,

	/// The requested group delivery order; Default defers to the publisher.
	pub group_order: GroupOrder,

	/// Where the subscription starts and ends.
	pub filter_type: FilterType,
	pub start: Option<AbsoluteLocation>,
	pub end: Option<AbsoluteLocation>,

	/// Optional parameters.
	pub params: Params,
}

impl Decode for Subscribe {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let track_alias = u64::decode(r)?;
		let track_namespace = String::decode(r)?;
		let track_name = String::decode(r)?;

		let priority = u8::decode(r)?;
		let group_order = GroupOrder::decode(r)?;
		let filter_type = FilterType::decode(r)?;

		let start = match filter_type {
			FilterType::AbsoluteStart | FilterType::AbsoluteRange => Some(AbsoluteLocation::decode(r)?),
			_ => None,
		};
		let end = match filter_type {
			FilterType::AbsoluteRange => Some(AbsoluteLocation::decode(r)?),
			_ => None,
		};

		let params = Params::decode(r)?;

		Ok(Self {
			id,
			track_alias,
			track_namespace,
			track_name,
			priority,
			group_order,
			filter_type,
			start,
			end,
			params,
		})
	}
}

impl Encode for Subscribe {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.id.encode(w)?;
		self.track_alias.encode(w)?;
		self.track_namespace.encode(w)?;
		self.track_name.encode(w)?;

		self.priority.encode(w)?;
		self.group_order.encode(w)?;
		self.filter_type.encode(w)?;

		if matches!(self.filter_type, FilterType::AbsoluteStart | FilterType::AbsoluteRange) {
			self.start.ok_or(EncodeError::MissingField)?.encode(w)?;
		}
		if matches!(self.filter_type, FilterType::AbsoluteRange) {
			self.end.ok_or(EncodeError::MissingField)?.encode(w)?;
		}

		self.params.encode(w)?;

		Ok(())
	}
}
