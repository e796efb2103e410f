//! The frames sent over unidirectional data streams and datagrams.
//!
//! Every data stream starts with one of three headers, deciding how many
//! objects it carries: a single object, a group of objects, or every group
//! of a track. Datagrams carry exactly one object each.
mod datagram;
mod group;
mod object;
mod status;
mod track;

pub use datagram::*;
pub use group::*;
pub use object::*;
pub use status::*;
pub use track::*;

use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The header starting a unidirectional data stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Header {
	/// One object per stream.
	Object(ObjectHeader),

	/// Every group of the track on one stream.
	Track(TrackHeader),

	/// One group per stream.
	Group(GroupHeader),
}

impl Decode for Header {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let t = u64::decode(r)?;

		match t {
			0x0 => Ok(Self::Object(ObjectHeader::decode(r)?)),
			0x50 => Ok(Self::Track(TrackHeader::decode(r)?)),
			0x51 => Ok(Self::Group(GroupHeader::decode(r)?)),
			// An unknown header type poisons the entire session, not just this stream.
			_ => Err(DecodeError::InvalidStreamHeader(t)),
		}
	}
}

impl Encode for Header {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		match self {
			Self::Object(header) => {
				0x0_u64.encode(w)?;
				header.encode(w)
			}
			Self::Track(header) => {
				0x50_u64.encode(w)?;
				header.encode(w)
			}
			Self::Group(header) => {
				0x51_u64.encode(w)?;
				header.encode(w)
			}
		}
	}
}

impl Header {
	pub fn subscribe_id(&self) -> u64 {
		match self {
			Self::Object(header) => header.subscribe_id,
			Self::Track(header) => header.subscribe_id,
			Self::Group(header) => header.subscribe_id,
		}
	}

	pub fn track_alias(&self) -> u64 {
		match self {
			Self::Object(header) => header.track_alias,
			Self::Track(header) => header.track_alias,
			Self::Group(header) => header.track_alias,
		}
	}

	pub fn priority(&self) -> u8 {
		match self {
			Self::Object(header) => header.priority,
			Self::Track(header) => header.priority,
			Self::Group(header) => header.priority,
		}
	}
}

impl From<ObjectHeader> for Header {
	fn from(header: ObjectHeader) -> Self {
		Self::Object(header)
	}
}

impl From<TrackHeader> for Header {
	fn from(header: TrackHeader) -> Self {
		Self::Track(header)
	}
}

impl From<GroupHeader> for Header {
	fn from(header: GroupHeader) -> Self {
		Self::Group(header)
	}
}

/// How an object is framed and which stream it shares with other objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardPreference {
	/// One object per stream.
	Object,

	/// Every object in the group shares a stream.
	Group,

	/// Every object in the track shares a stream.
	Track,

	/// One object per datagram.
	Datagram,
}

#[cfg(test)]
mod test {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn header_round_trip() {
		let headers: Vec<Header> = vec![
			ObjectHeader {
				subscribe_id: 1,
				track_alias: 1,
				group_id: 0,
				object_id: 0,
				priority: 128,
				status: ObjectStatus::Normal,
			}
			.into(),
			TrackHeader {
				subscribe_id: 2,
				track_alias: 3,
				priority: 64,
			}
			.into(),
			GroupHeader {
				subscribe_id: 2,
				track_alias: 2,
				group_id: 5,
				priority: 64,
			}
			.into(),
		];

		for header in headers {
			let mut buf = Vec::new();
			header.encode(&mut buf).unwrap();
			assert_eq!(Header::decode(&mut Cursor::new(&buf)).unwrap(), header);
		}
	}

	#[test]
	fn sub_header_status() {
		// A zero size carries a status instead of a payload.
		let object = GroupObject {
			object_id: 1,
			size: 0,
			status: ObjectStatus::EndOfGroup,
		};

		let mut buf = Vec::new();
		object.encode(&mut buf).unwrap();
		assert_eq!(buf, vec![0x01, 0x00, 0x02]);
		assert_eq!(GroupObject::decode(&mut Cursor::new(&buf)).unwrap(), object);

		let object = TrackObject {
			group_id: 5,
			object_id: 0,
			size: 3,
			status: ObjectStatus::Normal,
		};

		let mut buf = Vec::new();
		object.encode(&mut buf).unwrap();
		assert_eq!(buf, vec![0x05, 0x00, 0x03]);
		assert_eq!(TrackObject::decode(&mut Cursor::new(&buf)).unwrap(), object);
	}

	#[test]
	fn status_gating() {
		let mut buf = Vec::new();
		1u64.encode(&mut buf).unwrap(); // object id
		0u64.encode(&mut buf).unwrap(); // size
		4u64.encode(&mut buf).unwrap(); // status out of range

		assert!(matches!(
			GroupObject::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidObjectStatus(4))
		));
	}

	#[test]
	fn unknown_stream_header() {
		let mut buf = Vec::new();
		0x52_u64.encode(&mut buf).unwrap();

		assert!(matches!(
			Header::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidStreamHeader(0x52))
		));
	}

	#[test]
	fn datagram_round_trip() {
		let datagram = Datagram {
			subscribe_id: 1,
			track_alias: 1,
			group_id: 2,
			object_id: 3,
			priority: 127,
			status: ObjectStatus::Normal,
			payload: bytes::Bytes::from_static(b"hello"),
		};

		let mut buf = Vec::new();
		datagram.encode(&mut buf).unwrap();
		assert_eq!(Datagram::decode(&mut Cursor::new(&buf)).unwrap(), datagram);
	}
}
