use super::{Role, Versions};
use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params};

/// The ROLE parameter, the only setup parameter with an integer payload.
pub const PARAM_ROLE: u64 = 0x0;

/// Sent by the client, as the first frame on the control stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
	/// The list of supported versions in preferred order.
	pub versions: Versions,

	/// Indicates if the client is a publisher, a subscriber, or both.
	pub role: Role,

	/// Unknown parameters.
	pub params: Params,
}

impl Decode for Client {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let typ = u64::decode(r)?;
		if typ != 0x40 {
			return Err(DecodeError::InvalidMessage(typ));
		}

		let versions = Versions::decode(r)?;

		let mut params = Params::decode(r)?;
		let role = params
			.remove::<Role>(PARAM_ROLE)?
			.ok_or(DecodeError::MissingParameter)?;

		Ok(Self {
			versions,
			role,
			params,
		})
	}
}

impl Encode for Client {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		0x40_u64.encode(w)?;

		self.versions.encode(w)?;

		// The role param is a varint length prefix followed by the value.
		let mut params = self.params.clone();
		params.insert(PARAM_ROLE, self.role)?;
		params.encode(w)?;

		Ok(())
	}
}
