use std::{cmp, io};

use bytes::{Buf, Bytes, BytesMut};

use crate::coding::{Decode, DecodeError};
use crate::transport;

use super::SessionError;

/// Decodes frames from a stream, buffering partial frames until more bytes arrive.
///
/// A failed decode never consumes from the buffer, so feeding the same bytes
/// again yields the same result.
pub struct Reader<S: transport::RecvStream> {
	stream: S,
	buffer: BytesMut,
}

impl<S: transport::RecvStream> Reader<S> {
	pub fn new(stream: S) -> Self {
		Self {
			stream,
			buffer: Default::default(),
		}
	}

	pub async fn decode<T: Decode>(&mut self) -> Result<T, SessionError> {
		loop {
			let mut cursor = io::Cursor::new(&self.buffer);

			// Try to decode with the current buffer.
			let mut remain = match T::decode(&mut cursor) {
				Ok(msg) => {
					self.buffer.advance(cursor.position() as usize);
					return Ok(msg);
				}
				// Rewind and try again once the shortfall has arrived.
				Err(DecodeError::More(remain)) => remain,
				Err(err) => return Err(err.into()),
			};

			// Read in more data until we reach the requested amount.
			// We always read at least once to avoid an infinite loop on remain=0.
			loop {
				let size = self
					.stream
					.read(&mut self.buffer)
					.await?
					.ok_or(DecodeError::More(remain))?;

				remain = remain.saturating_sub(size);
				if remain == 0 {
					break;
				}
			}
		}
	}

	pub async fn read_chunk(&mut self, max: usize) -> Result<Option<Bytes>, SessionError> {
		if !self.buffer.is_empty() {
			let size = cmp::min(max, self.buffer.len());
			let data = self.buffer.split_to(size).freeze();
			return Ok(Some(data));
		}

		Ok(self.stream.read_chunk(max).await?)
	}

	pub async fn done(&mut self) -> Result<bool, SessionError> {
		if !self.buffer.is_empty() {
			return Ok(false);
		}

		Ok(self.stream.read(&mut self.buffer).await?.is_none())
	}

	pub fn stop(&mut self, code: u64) {
		self.stream.stop(code)
	}
}
