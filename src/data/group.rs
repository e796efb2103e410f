use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use super::ObjectStatus;

/// The start of a stream carrying a single group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupHeader {
	/// The subscription this stream belongs to.
	pub subscribe_id: u64,

	/// The alias agreed at subscribe time.
	pub track_alias: u64,

	/// The group sequence number, shared by every object on this stream.
	pub group_id: u64,

	/// The priority, where smaller values are sent first.
	pub priority: u8,
}

impl Decode for GroupHeader {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let subscribe_id = u64::decode(r)?;
		let track_alias = u64::decode(r)?;
		let group_id = u64::decode(r)?;
		let priority = u64::decode(r)?
			.try_into()
			.map_err(|_| DecodeError::InvalidValue)?;

		Ok(Self {
			subscribe_id,
			track_alias,
			group_id,
			priority,
		})
	}
}

impl Encode for GroupHeader {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.subscribe_id.encode(w)?;
		self.track_alias.encode(w)?;
		self.group_id.encode(w)?;
		(self.priority as u64).encode(w)?;

		Ok(())
	}
}

/// A sub-header within a group stream, followed by exactly `size` payload bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupObject {
	pub object_id: u64,
	pub size: usize,
	pub status: ObjectStatus,
}

impl Decode for GroupObject {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let object_id = u64::decode(r)?;
		let size = usize::decode(r)?;

		let status = match size {
			0 => ObjectStatus::decode(r)?,
			_ => ObjectStatus::Normal,
		};

		Ok(Self {
			object_id,
			size,
			status,
		})
	}
}

impl Encode for GroupObject {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.object_id.encode(w)?;
		self.size.encode(w)?;

		if self.size == 0 {
			self.status.encode(w)?;
		}

		Ok(())
	}
}
