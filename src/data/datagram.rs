use bytes::{Buf, Bytes};

use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use super::ObjectStatus;

/// A single object delivered in a datagram, header and payload together.
#[derive(Clone, Debug, PartialEq)]
pub struct Datagram {
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

	/// The payload, continuing to the end of the datagram.
	pub payload: Bytes,
}

impl Decode for Datagram {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let typ = u64::decode(r)?;
		if typ != 0x1 {
			return Err(DecodeError::InvalidStreamHeader(typ));
		}

		let subscribe_id = u64::decode(r)?;
		let track_alias = u64::decode(r)?;
		let group_id = u64::decode(r)?;
		let object_id = u64::decode(r)?;
		let priority = u8::decode(r)?;
		let status = ObjectStatus::decode(r)?;
		let payload = r.copy_to_bytes(r.remaining());

		Ok(Self {
			subscribe_id,
			track_alias,
			group_id,
			object_id,
			priority,
			status,
			payload,
		})
	}
}

impl Encode for Datagram {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		0x1_u64.encode(w)?;

		self.subscribe_id.encode(w)?;
		self.track_alias.encode(w)?;
		self.group_id.encode(w)?;
		self.object_id.encode(w)?;
		self.priority.encode(w)?;
		self.status.encode(w)?;

		Self::encode_remaining(w, self.payload.len())?;
		w.put_slice(&self.payload);

		Ok(())
	}
}
