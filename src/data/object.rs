use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use super::ObjectStatus;

/// The start of a stream carrying a single object.
///
/// The payload continues until the end of the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectHeader {
	/// The subscription this object belongs to.
	pub subscribe_id: u64,

	/// The alias agreed at subscribe time.
	pub track_alias: u64,

	/// The group and object sequence numbers.
	pub group_id: u64,
	pub object_id: u64,

	/// The priority, where smaller values are sent first.
	pub priority: u8,

	/// The status; non-normal objects have no payload.
	pub status: ObjectStatus,
}

impl Decode for ObjectHeader {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let subscribe_id = u64::decode(r)?;
		let track_alias = u64::decode(r)?;
		let group_id = u64::decode(r)?;
		let object_id = u64::decode(r)?;
		let priority = u8::decode(r)?;
		let status = ObjectStatus::decode(r)?;

		Ok(Self {
			subscribe_id,
			track_alias,
			group_id,
			object_id,
			priority,
			status,
		})
	}
}

impl Encode for ObjectHeader {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.subscribe_id.encode(w)?;
		self.track_alias.encode(w)?;
		self.group_id.encode(w)?;
		self.object_id.encode(w)?;
		self.priority.encode(w)?;
		self.status.encode(w)?;

		Ok(())
	}
}
