use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use super::AbsoluteLocation;

/// The state of a track, as reported by the publisher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStatusCode {
	/// The track is live; `latest` is the last published location.
	InProgress = 0x0,
	DoesNotExist = 0x1,
	NotYetStarted = 0x2,
	Finished = 0x3,
	Unknown = 0x4,
}

impl Decode for TrackStatusCode {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		match u64::decode(r)? {
			0x0 => Ok(Self::InProgress),
			0x1 => Ok(Self::DoesNotExist),
			0x2 => Ok(Self::NotYetStarted),
			0x3 => Ok(Self::Finished),
			0x4 => Ok(Self::Unknown),
			t => Err(DecodeError::InvalidTrackStatus(t)),
		}
	}
}

impl Encode for TrackStatusCode {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		(*self as u64).encode(w)
	}
}

/// Sent by the publisher in response to a track status request.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackStatus {
	/// The track namespace and name.
	pub track_namespace: String,
	pub track_name: String,

	/// The status of the track.
	pub code: TrackStatusCode,

	/// The last published location; zeros unless the track is in progress.
	pub latest: AbsoluteLocation,
}

impl Decode for TrackStatus {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let track_namespace = String::decode(r)?;
		let track_name = String::decode(r)?;
		let code = TrackStatusCode::decode(r)?;

		// Always two trailing varints, even when the status is not in progress.
		let latest = AbsoluteLocation::decode(r)?;

		Ok(Self {
			track_namespace,
			track_name,
			code,
			latest,
		})
	}
}

impl Encode for TrackStatus {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.track_namespace.encode(w)?;
		self.track_name.encode(w)?;
		self.code.encode(w)?;
		self.latest.encode(w)?;

		Ok(())
	}
}
