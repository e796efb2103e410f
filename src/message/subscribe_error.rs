use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the publisher to reject a subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscribeError {
	/// The ID of the subscription being rejected.
	pub id: u64,

	/// An error code.
	pub code: u64,

	/// A human-readable reason.
	pub reason: String,

	/// A track alias to use on retry.
	///
	/// Always present on the wire, but only meaningful when the error code is
	/// [SubscribeError::RETRY_TRACK_ALIAS].
	pub retry_alias: Option<u64>,
}

impl SubscribeError {
	pub const INTERNAL_ERROR: u64 = 0x0;
	pub const INVALID_RANGE: u64 = 0x1;
	pub const RETRY_TRACK_ALIAS: u64 = 0x2;
	pub const DOES_NOT_EXIST: u64 = 0x3;
	pub const UNAUTHORIZED: u64 = 0x4;
	pub const TIMEOUT: u64 = 0x5;
}

impl Decode for SubscribeError {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let id = u64::decode(r)?;
		let code = u64::decode(r)?;
		let reason = String::decode(r)?;

		let retry_alias = u64::decode(r)?;
		let retry_alias = (code == Self::RETRY_TRACK_ALIAS).then_some(retry_alias);

		Ok(Self {
			id,
			code,
			reason,
			retry_alias,
		})
	}
}

impl Encode for SubscribeError {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.id.encode(w)?;
		self.code.encode(w)?;
		self.reason.encode(w)?;
		self.retry_alias.unwrap_or(0).encode(w)?;

		Ok(())
	}
}
