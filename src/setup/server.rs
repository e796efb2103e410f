use super::{Role, Version, PARAM_ROLE};
use crate::coding::{Decode, DecodeError, Encode, EncodeError, Params};

/// Sent by the server in response to a client setup.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
	/// The version chosen from the client's list.
	pub version: Version,

	/// Indicates if the server is a publisher, a subscriber, or both.
	pub role: Role,

	/// Unknown parameters.
	pub params: Params,
}

impl Decode for Server {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let typ = u64::decode(r)?;
		if typ != 0x41 {
			return Err(DecodeError::InvalidMessage(typ));
		}

		let version = Version::decode(r)?;

		let mut params = Params::decode(r)?;
		let role = params
			.remove::<Role>(PARAM_ROLE)?
			.ok_or(DecodeError::MissingParameter)?;

		Ok(Self {
			version,
			role,
			params,
		})
	}
}

impl Encode for Server {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		0x41_u64.encode(w)?;

		self.version.encode(w)?;

		let mut params = self.params.clone();
		params.insert(PARAM_ROLE, self.role)?;
		params.encode(w)?;

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::setup;
	use std::io::Cursor;

	#[test]
	fn round_trip() {
		let client = setup::Client {
			versions: [Version::DRAFT_01].into(),
			role: Role::Both,
			params: Params::new(),
		};

		let mut buf = Vec::new();
		client.encode(&mut buf).unwrap();
		assert_eq!(
			setup::Client::decode(&mut Cursor::new(&buf)).unwrap(),
			client
		);

		let server = Server {
			version: Version::DRAFT_01,
			role: Role::Both,
			params: Params::new(),
		};

		let mut buf = Vec::new();
		server.encode(&mut buf).unwrap();
		assert_eq!(Server::decode(&mut Cursor::new(&buf)).unwrap(), server);
	}

	#[test]
	fn role_param_shape() {
		let client = setup::Client {
			versions: [Version::DRAFT_01].into(),
			role: Role::Both,
			params: Params::new(),
		};

		let mut buf = Vec::new();
		client.encode(&mut buf).unwrap();

		// type, 1 version, version, 1 param: key=0, len=1, value=2
		assert_eq!(
			buf,
			vec![0x40, 0x40, 0x01, 0xc0, 0, 0, 0, 0, 0xff, 0, 0, 0x01, 0x01, 0x00, 0x01, 0x02]
		);
	}

	#[test]
	fn reversed_setup() {
		let server = Server {
			version: Version::DRAFT_01,
			role: Role::Publisher,
			params: Params::new(),
		};

		let mut buf = Vec::new();
		server.encode(&mut buf).unwrap();

		// A server setup is not a valid client setup.
		assert!(matches!(
			setup::Client::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidMessage(0x41))
		));
	}

	#[test]
	fn invalid_role() {
		let mut buf = Vec::new();
		0x41_u64.encode(&mut buf).unwrap();
		Version::DRAFT_01.encode(&mut buf).unwrap();
		1u64.encode(&mut buf).unwrap(); // one param
		PARAM_ROLE.encode(&mut buf).unwrap();
		1u64.encode(&mut buf).unwrap(); // length
		3u64.encode(&mut buf).unwrap(); // role out of range

		assert!(matches!(
			Server::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::InvalidRole(3))
		));
	}
}
