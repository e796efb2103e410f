use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use std::ops::Deref;

/// A version number negotiated during the setup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Version(pub u64);

impl Version {
	pub const DRAFT_01: Version = Version(0xff000001);
	pub const DRAFT_02: Version = Version(0xff000002);
	pub const DRAFT_03: Version = Version(0xff000003);
	pub const DRAFT_04: Version = Version(0xff000004);
	pub const DRAFT_05: Version = Version(0xff000005);
	pub const DRAFT_06: Version = Version(0xff000006);

	/// Every version this crate can speak, in preferred order.
	pub const SUPPORTED: [Version; 6] = [
		Version::DRAFT_06,
		Version::DRAFT_05,
		Version::DRAFT_04,
		Version::DRAFT_03,
		Version::DRAFT_02,
		Version::DRAFT_01,
	];
}

impl From<u64> for Version {
	fn from(v: u64) -> Self {
		Self(v)
	}
}

impl From<Version> for u64 {
	fn from(v: Version) -> Self {
		v.0
	}
}

impl Decode for Version {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(Self(u64::decode(r)?))
	}
}

impl Encode for Version {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.0.encode(w)
	}
}

/// A list of versions in preferred order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Versions(pub Vec<Version>);

impl Decode for Versions {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let count = u64::decode(r)?;
		let mut vs = Vec::new();

		for _ in 0..count {
			vs.push(Version::decode(r)?);
		}

		Ok(Self(vs))
	}
}

impl Encode for Versions {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.0.len().encode(w)?;

		for v in &self.0 {
			v.encode(w)?;
		}

		Ok(())
	}
}

impl Deref for Versions {
	type Target = Vec<Version>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<const N: usize> From<[Version; N]> for Versions {
	fn from(vs: [Version; N]) -> Self {
		Self(vs.to_vec())
	}
}

impl From<Vec<Version>> for Versions {
	fn from(vs: Vec<Version>) -> Self {
		Self(vs)
	}
}
