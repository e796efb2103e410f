use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// An absolute position within a track.
///
/// Ordered by group first, then object, matching the delivery order of a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AbsoluteLocation {
	pub group: u64,
	pub object: u64,
}

impl AbsoluteLocation {
	pub fn new(group: u64, object: u64) -> Self {
		Self { group, object }
	}
}

impl Decode for AbsoluteLocation {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let group = u64::decode(r)?;
		let object = u64::decode(r)?;

		Ok(Self { group, object })
	}
}

impl Encode for AbsoluteLocation {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.group.encode(w)?;
		self.object.encode(w)?;

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn ordering() {
		let a = AbsoluteLocation::new(1, 9);
		let b = AbsoluteLocation::new(2, 0);
		let c = AbsoluteLocation::new(2, 1);

		assert!(a < b);
		assert!(b < c);
		assert_eq!(c.max(a), c);
	}
}
