use bytes::BytesMut;

use crate::coding::Encode;
use crate::transport;

use super::SessionError;

/// Encodes frames and writes them to a stream.
pub struct Writer<S: transport::SendStream> {
	stream: S,
	buffer: BytesMut,
}

impl<S: transport::SendStream> Writer<S> {
	pub fn new(stream: S) -> Self {
		Self {
			stream,
			buffer: Default::default(),
		}
	}

	pub async fn encode<T: Encode>(&mut self, msg: &T) -> Result<(), SessionError> {
		self.buffer.clear();
		msg.encode(&mut self.buffer)?;
		self.stream.write(&self.buffer).await?;

		Ok(())
	}

	pub async fn write(&mut self, buf: &[u8]) -> Result<(), SessionError> {
		self.stream.write(buf).await?;
		Ok(())
	}

	pub fn set_priority(&mut self, order: u64) {
		self.stream.set_priority(order)
	}

	pub fn finish(&mut self) {
		self.stream.finish()
	}

	pub fn reset(&mut self, code: u64) {
		self.stream.reset(code)
	}
}
