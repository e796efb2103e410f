use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the server to ask the client to migrate to a new session.
///
/// The session then drains: no new subscriptions or announcements are started.
#[derive(Clone, Debug, PartialEq)]
pub struct GoAway {
	/// The URI of the replacement session; may be empty.
	pub url: String,
}

impl Decode for GoAway {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let url = String::decode(r)?;

		Ok(Self { url })
	}
}

impl Encode for GoAway {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.url.encode(w)?;

		Ok(())
	}
}
