use std::collections::HashMap;
use std::io::Cursor;

use super::{Decode, DecodeError, Encode, EncodeError};

/// A bag of key/value parameters, each value a varint-length-prefixed byte string.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Params(HashMap<u64, Vec<u8>>);

impl Decode for Params {
	fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
		let mut params = HashMap::new();

		let count = u64::decode(r)?;
		for _ in 0..count {
			let kind = u64::decode(r)?;
			if params.contains_key(&kind) {
				return Err(DecodeError::DuplicateParameter);
			}

			let data = Vec::<u8>::decode(r)?;
			params.insert(kind, data);
		}

		Ok(Params(params))
	}
}

impl Encode for Params {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.0.len().encode(w)?;

		for (kind, value) in self.0.iter() {
			kind.encode(w)?;
			value.encode(w)?;
		}

		Ok(())
	}
}

impl Params {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn insert<P: Encode>(&mut self, kind: u64, p: P) -> Result<(), EncodeError> {
		let mut value = Vec::new();
		p.encode(&mut value)?;
		self.0.insert(kind, value);

		Ok(())
	}

	pub fn has(&self, kind: u64) -> bool {
		self.0.contains_key(&kind)
	}

	pub fn remove<P: Decode>(&mut self, kind: u64) -> Result<Option<P>, DecodeError> {
		if let Some(value) = self.0.remove(&kind) {
			let mut cursor = Cursor::new(value);
			Ok(Some(P::decode(&mut cursor)?))
		} else {
			Ok(None)
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn round_trip() {
		let mut params = Params::new();
		params.insert(2, "auth token".to_string()).unwrap();
		params.insert(3, vec![1u8, 2, 3]).unwrap();

		let mut buf = Vec::new();
		params.encode(&mut buf).unwrap();

		let decoded = Params::decode(&mut Cursor::new(&buf)).unwrap();
		assert_eq!(decoded, params);
	}

	#[test]
	fn duplicate() {
		// count=2, two params with the same key
		let mut buf = Vec::new();
		2u64.encode(&mut buf).unwrap();
		for _ in 0..2 {
			7u64.encode(&mut buf).unwrap();
			vec![0u8].encode(&mut buf).unwrap();
		}

		assert!(matches!(
			Params::decode(&mut Cursor::new(&buf)),
			Err(DecodeError::DuplicateParameter)
		));
	}
}
