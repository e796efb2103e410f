use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the subscriber to accept an announce.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnounceOk {
	/// The namespace being accepted.
	pub namespace: String,
}

impl Decode for AnnounceOk {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let namespace = String::decode(r)?;

		Ok(Self { namespace })
	}
}

impl Encode for AnnounceOk {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.namespace.encode(w)?;

		Ok(())
	}
}
