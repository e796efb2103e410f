use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the publisher to withdraw a previously announced namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct Unannounce {
	/// The namespace being withdrawn.
	pub namespace: String,
}

impl Decode for Unannounce {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let namespace = String::decode(r)?;

		Ok(Self { namespace })
	}
}

impl Encode for Unannounce {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.namespace.encode(w)?;

		Ok(())
	}
}
