//! Every control message sent over the control stream.
//!
//! Each message is prefixed with a varint frame type.
//! The setup exchange (0x40/0x41) happens before this loop and lives in [crate::setup];
//! the data stream headers (0x0, 0x1, 0x50, 0x51) live in [crate::data].
mod announce;
mod announce_cancel;
mod announce_error;
mod announce_ok;
mod filter_type;
mod go_away;
mod group_order;
mod location;
mod publisher;
mod subscribe;
mod subscribe_done;
mod subscribe_error;
mod subscribe_ok;
mod subscribe_update;
mod subscriber;
mod track_status;
mod track_status_request;
mod unannounce;
mod unsubscribe;

pub use announce::*;
pub use announce_cancel::*;
pub use announce_error::*;
pub use announce_ok::*;
pub use filter_type::*;
pub use go_away::*;
pub use group_order::*;
pub use location::*;
pub use publisher::*;
pub use subscribe::*;
pub use subscribe_done::*;
pub use subscribe_error::*;
pub use subscribe_ok::*;
pub use subscribe_update::*;
pub use subscriber::*;
pub use track_status::*;
pub use track_status_request::*;
pub use unannounce::*;
pub use unsubscribe::*;

use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use std::fmt;

// Use a macro to generate the message types rather than copy-paste.
// This implements a decode/encode method that dispatches on the frame type.
macro_rules! message_types {
    {$($name:ident = $val:expr,)*} => {
		/// All supported control messages.
		#[derive(Clone, PartialEq)]
		pub enum Message {
			$($name($name)),*
		}

		impl Decode for Message {
			fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
				let t = u64::decode(r)?;

				match t {
					$($val => {
						let msg = $name::decode(r)?;
						Ok(Self::$name(msg))
					})*
					_ => Err(DecodeError::InvalidMessage(t)),
				}
			}
		}

		impl Encode for Message {
			fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
				match self {
					$(Self::$name(ref m) => {
						($val as u64).encode(w)?;
						m.encode(w)
					},)*
				}
			}
		}

		impl Message {
			pub fn id(&self) -> u64 {
				match self {
					$(Self::$name(_) => $val,)*
				}
			}

			pub fn name(&self) -> &'static str {
				match self {
					$(Self::$name(_) => stringify!($name),)*
				}
			}
		}

		$(impl From<$name> for Message {
			fn from(m: $name) -> Self {
				Message::$name(m)
			}
		})*

		impl fmt::Debug for Message {
			// Delegate to the message formatter
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				match self {
					$(Self::$name(ref m) => m.fmt(f),)*
				}
			}
		}
    }
}

// Each message is prefixed with the given varint type.
message_types! {
	// NOTE: Object delivery and setup are in other modules.
	// ObjectStream = 0x0
	// ObjectDatagram = 0x1
	SubscribeUpdate = 0x2,
	Subscribe = 0x3,
	SubscribeOk = 0x4,
	SubscribeError = 0x5,
	Announce = 0x6,
	AnnounceOk = 0x7,
	AnnounceError = 0x8,
	Unannounce = 0x9,
	Unsubscribe = 0xA,
	SubscribeDone = 0xB,
	AnnounceCancel = 0xC,
	TrackStatusRequest = 0xD,
	TrackStatus = 0xE,
	GoAway = 0x10,
	// ClientSetup = 0x40
	// ServerSetup = 0x41
	// StreamHeaderTrack = 0x50
	// StreamHeaderGroup = 0x51
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::coding::Params;
	use std::io::Cursor;

	fn round_trip(msg: Message) {
		let mut buf = Vec::new();
		msg.encode(&mut buf).unwrap();

		let decoded = Message::decode(&mut Cursor::new(&buf)).unwrap();
		assert_eq!(decoded, msg);
	}

	fn prefix_safe(msg: Message) {
		let mut buf = Vec::new();
		msg.encode(&mut buf).unwrap();

		// Every strict prefix must report underflow, not consume or corrupt.
		for len in 0..buf.len() {
			let mut cursor = Cursor::new(&buf[..len]);
			match Message::decode(&mut cursor) {
				Err(DecodeError::More(n)) => assert!(n > 0),
				other => panic!("expected underflow at {} bytes: {:?}", len, other),
			}
		}
	}

	fn subscribe() -> Subscribe {
		Subscribe {
			id: 1,
			track_alias: 1,
			track_namespace: "ns".to_string(),
			track_name: "t".to_string(),
			priority: 128,
			group_order: GroupOrder::OldestFirst,
			filter_type: FilterType::LatestObject,
			start: None,
			end: None,
			params: Params::new(),
		}
	}

	#[test]
	fn subscribe_round_trip() {
		round_trip(subscribe().into());
		prefix_safe(subscribe().into());

		let mut msg = subscribe();
		msg.filter_type = FilterType::AbsoluteRange;
		msg.start = Some(AbsoluteLocation::new(1, 2));
		msg.end = Some(AbsoluteLocation::new(3, 4));
		round_trip(msg.clone().into());
		prefix_safe(msg.into());
	}

	#[test]
	fn subscribe_missing_range() {
		let mut msg = subscribe();
		msg.filter_type = FilterType::AbsoluteStart;

		let mut buf = Vec::new();
		assert!(matches!(
			Message::from(msg).encode(&mut buf),
			Err(EncodeError::MissingField)
		));
	}

	#[test]
	fn subscribe_ok_round_trip() {
		let msg = SubscribeOk {
			id: 1,
			expires: 1000,
			group_order: GroupOrder::OldestFirst,
			latest: None,
			params: Params::new(),
		};
		round_trip(msg.clone().into());
		prefix_safe(msg.clone().into());

		let msg = SubscribeOk {
			latest: Some(AbsoluteLocation::new(10, 20)),
			..msg
		};
		round_trip(msg.clone().into());
		prefix_safe(msg.into());
	}

	#[test]
	fn subscribe_ok_default_order() {
		// The publisher must resolve the group order; Default on the wire is illegal.
		let mut buf = Vec::new();
		0x4_u64.encode(&mut buf).unwrap(); // SubscribeOk
		1u64.encode(&mut buf).unwrap(); // id
		0u64.encode(&mut buf).unwrap(); // expires
		0u8.encode(&mut buf).unwrap(); // group order: Default
		0u8.encode(&mut buf).unwrap(); // content exists
		Params::new().encode(&mut buf).unwrap();

		assert!(matches!(
			Message::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidGroupOrder(0))
		));
	}

	#[test]
	fn subscribe_error_retry_alias() {
		let msg = SubscribeError {
			id: 7,
			code: SubscribeError::RETRY_TRACK_ALIAS,
			reason: "retry".to_string(),
			retry_alias: Some(42),
		};
		round_trip(msg.into());

		// The alias is always on the wire but only surfaced for RETRY_TRACK_ALIAS.
		let msg = SubscribeError {
			id: 7,
			code: SubscribeError::DOES_NOT_EXIST,
			reason: "nope".to_string(),
			retry_alias: None,
		};

		let mut buf = Vec::new();
		Message::from(msg.clone()).encode(&mut buf).unwrap();
		let decoded = Message::decode(&mut Cursor::new(&buf)).unwrap();
		assert_eq!(decoded, msg.into());
	}

	#[test]
	fn subscribe_done_round_trip() {
		let msg = SubscribeDone {
			id: 3,
			code: SubscribeDone::TRACK_ENDED,
			reason: "done".to_string(),
			last: Some(AbsoluteLocation::new(5, 9)),
		};
		round_trip(msg.clone().into());
		prefix_safe(msg.into());
	}

	#[test]
	fn announce_round_trip() {
		let mut params = Params::new();
		params.insert(2, "secret".to_string()).unwrap();

		round_trip(
			Announce {
				namespace: "demo".to_string(),
				params,
			}
			.into(),
		);
		round_trip(
			AnnounceOk {
				namespace: "demo".to_string(),
			}
			.into(),
		);
		round_trip(
			AnnounceError {
				namespace: "demo".to_string(),
				code: 404,
				reason: "not found".to_string(),
			}
			.into(),
		);
		round_trip(
			Unannounce {
				namespace: "demo".to_string(),
			}
			.into(),
		);
		round_trip(
			AnnounceCancel {
				namespace: "demo".to_string(),
				code: 1,
				reason: "revoked".to_string(),
			}
			.into(),
		);
	}

	#[test]
	fn track_status_round_trip() {
		round_trip(
			TrackStatusRequest {
				track_namespace: "ns".to_string(),
				track_name: "t".to_string(),
			}
			.into(),
		);

		let msg = TrackStatus {
			track_namespace: "ns".to_string(),
			track_name: "t".to_string(),
			code: TrackStatusCode::InProgress,
			latest: AbsoluteLocation::new(8, 4),
		};
		round_trip(msg.clone().into());
		prefix_safe(msg.into());

		// The trailing location is present even when the track is not live.
		let msg = TrackStatus {
			track_namespace: "ns".to_string(),
			track_name: "t".to_string(),
			code: TrackStatusCode::Finished,
			latest: AbsoluteLocation::default(),
		};
		round_trip(msg.into());
	}

	#[test]
	fn misc_round_trip() {
		round_trip(Unsubscribe { id: 9 }.into());
		round_trip(
			SubscribeUpdate {
				id: 9,
				start: AbsoluteLocation::new(1, 0),
				end: AbsoluteLocation::new(2, 0),
				priority: 64,
				params: Params::new(),
			}
			.into(),
		);
		round_trip(
			GoAway {
				url: "https://relay.example".to_string(),
			}
			.into(),
		);
	}

	#[test]
	fn unknown_type() {
		let mut buf = Vec::new();
		0xF_u64.encode(&mut buf).unwrap();

		assert!(matches!(
			Message::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidMessage(0xF))
		));
	}

	#[test]
	fn enum_gating() {
		// locationType 5 is out of range
		let mut buf = Vec::new();
		0x3_u64.encode(&mut buf).unwrap(); // Subscribe
		1u64.encode(&mut buf).unwrap(); // id
		1u64.encode(&mut buf).unwrap(); // alias
		"ns".encode(&mut buf).unwrap();
		"t".encode(&mut buf).unwrap();
		0u8.encode(&mut buf).unwrap(); // priority
		1u8.encode(&mut buf).unwrap(); // group order
		5u64.encode(&mut buf).unwrap(); // location type

		assert!(matches!(
			Message::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidLocationType(5))
		));

		// group order 3 is out of range
		let mut buf = Vec::new();
		0x3_u64.encode(&mut buf).unwrap(); // Subscribe
		1u64.encode(&mut buf).unwrap(); // id
		1u64.encode(&mut buf).unwrap(); // alias
		"ns".encode(&mut buf).unwrap();
		"t".encode(&mut buf).unwrap();
		0u8.encode(&mut buf).unwrap(); // priority
		3u8.encode(&mut buf).unwrap(); // group order

		assert!(matches!(
			Message::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidGroupOrder(3))
		));

		// track status 5 is out of range
		let mut buf = Vec::new();
		0xE_u64.encode(&mut buf).unwrap(); // TrackStatus
		"ns".encode(&mut buf).unwrap();
		"t".encode(&mut buf).unwrap();
		5u64.encode(&mut buf).unwrap(); // status code

		assert!(matches!(
			Message::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidTrackStatus(5))
		));
	}
}
