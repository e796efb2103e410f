use thiserror::Error;

pub trait Encode: Sized {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError>;

	// Helper function to make sure we have enough bytes to encode
	fn encode_remaining<W: bytes::BufMut>(buf: &mut W, required: usize) -> Result<(), EncodeError> {
		let needed = required.saturating_sub(buf.remaining_mut());
		if needed > 0 {
			Err(EncodeError::More(needed))
		} else {
			Ok(())
		}
	}
}

/// An encode error.
#[derive(Error, Debug, Clone)]
pub enum EncodeError {
	#[error("short buffer")]
	More(usize),

	/// Multi-object stream framings require a known payload length up front.
	#[error("missing length")]
	MissingLength,

	#[error("missing field")]
	MissingField,

	#[error("bounds exceeded")]
	BoundsExceeded,
}

impl Encode for u8 {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		Self::encode_remaining(w, 1)?;
		w.put_u8(*self);
		Ok(())
	}
}

impl Encode for String {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.as_str().encode(w)
	}
}

impl Encode for &str {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.len().encode(w)?;
		Self::encode_remaining(w, self.len())?;
		w.put_slice(self.as_bytes());
		Ok(())
	}
}

impl Encode for Vec<u8> {
	fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
		self.len().encode(w)?;
		Self::encode_remaining(w, self.len())?;
		w.put_slice(self);
		Ok(())
	}
}
