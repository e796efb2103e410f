use std::string::FromUtf8Error;

use thiserror::Error;

pub trait Decode: Sized {
	fn decode<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError>;

	// Helper function to make sure we have enough bytes to decode
	fn decode_remaining<B: bytes::Buf>(buf: &mut B, required: usize) -> Result<(), DecodeError> {
		let needed = required.saturating_sub(buf.remaining());
		if needed > 0 {
			Err(DecodeError::More(needed))
		} else {
			Ok(())
		}
	}
}

/// A decode error.
#[derive(Error, Debug, Clone)]
pub enum DecodeError {
	/// Not enough bytes in the buffer; decoding can be retried once at least
	/// this many additional bytes have arrived.
	#[error("fill buffer")]
	More(usize),

	#[error("invalid string")]
	InvalidString(#[from] FromUtf8Error),

	#[error("invalid message type: {0}")]
	InvalidMessage(u64),

	#[error("invalid stream header type: {0}")]
	InvalidStreamHeader(u64),

	#[error("invalid role: {0}")]
	InvalidRole(u64),

	#[error("invalid location type: {0}")]
	InvalidLocationType(u64),

	#[error("invalid group order: {0}")]
	InvalidGroupOrder(u8),

	#[error("invalid object status: {0}")]
	InvalidObjectStatus(u64),

	#[error("invalid track status: {0}")]
	InvalidTrackStatus(u64),

	#[error("invalid value")]
	InvalidValue,

	#[error("duplicate parameter")]
	DuplicateParameter,

	#[error("missing parameter")]
	MissingParameter,

	#[error("bounds exceeded")]
	BoundsExceeded,
}

impl Decode for u8 {
	fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
		Self::decode_remaining(r, 1)?;
		Ok(r.get_u8())
	}
}

impl Decode for String {
	/// Decode a string with a varint length prefix.
	fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
		let size = usize::decode(r)?;
		Self::decode_remaining(r, size)?;

		let mut buf = vec![0; size];
		r.copy_to_slice(&mut buf);
		let str = String::from_utf8(buf)?;

		Ok(str)
	}
}

impl Decode for Vec<u8> {
	fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
		let size = usize::decode(r)?;
		Self::decode_remaining(r, size)?;

		let mut buf = vec![0; size];
		r.copy_to_slice(&mut buf);

		Ok(buf)
	}
}
