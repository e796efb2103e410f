use std::{collections::VecDeque, fmt, ops::Deref, sync::Arc};

use bytes::{Bytes, BytesMut};

use crate::data::ObjectStatus;
use crate::util::Watch;

use super::ServeError;

// Payload chunks buffered per object before the writer is suspended.
const MAX_CHUNKS: usize = 32;

/// Static information about a single received object.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
	/// The group and object sequence numbers.
	pub group_id: u64,
	pub object_id: u64,

	/// The priority, where smaller values are sent first.
	pub priority: u8,

	/// The status; non-normal objects have no payload.
	pub status: ObjectStatus,

	/// The payload size, when the framing declares it up front.
	pub size: Option<usize>,
}

impl Object {
	pub fn produce(self) -> (ObjectWriter, ObjectReader) {
		let state = Watch::new(State::default());
		let info = Arc::new(self);

		let writer = ObjectWriter {
			state: state.clone(),
			info: info.clone(),
			finished: false,
		};
		let reader = ObjectReader { state, info };

		(writer, reader)
	}
}

pub(super) struct State {
	// The chunks that have been received but not yet read.
	chunks: VecDeque<Bytes>,

	// Set once the final chunk has been written.
	done: bool,

	closed: Result<(), ServeError>,
}

impl State {
	pub(super) fn is_complete(&self) -> bool {
		self.done || self.closed.is_err()
	}

	pub(super) fn abort(&mut self, err: ServeError) {
		// A finished object keeps its payload; there is nothing left to abort.
		if !self.is_complete() {
			self.closed = Err(err);
		}
	}
}

impl Default for State {
	fn default() -> Self {
		Self {
			chunks: Default::default(),
			done: false,
			closed: Ok(()),
		}
	}
}

/// Feeds payload chunks to an [ObjectReader], suspending when the queue is full.
pub struct ObjectWriter {
	state: Watch<State>,
	info: Arc<Object>,
	finished: bool,
}

impl ObjectWriter {
	pub(super) fn shared(&self) -> Watch<State> {
		self.state.clone()
	}

	/// Append a payload chunk, waiting for queue capacity if needed.
	pub async fn write(&mut self, chunk: Bytes) -> Result<(), ServeError> {
		loop {
			let notify = {
				let state = self.state.lock();
				state.closed.clone()?;

				if state.chunks.len() < MAX_CHUNKS {
					let mut state = state.into_mut();
					state.chunks.push_back(chunk);
					return Ok(());
				}

				state.changed()
			};

			notify.await
		}
	}

	/// Mark the end of the object; no further chunks may be written.
	pub fn finish(mut self) -> Result<(), ServeError> {
		let mut state = self.state.lock_mut();
		state.closed.clone()?;
		state.done = true;
		drop(state);

		self.finished = true;
		Ok(())
	}

	/// Abort the object with an error.
	pub fn close(&mut self, err: ServeError) -> Result<(), ServeError> {
		let mut state = self.state.lock_mut();
		state.closed.clone()?;
		state.closed = Err(err);

		Ok(())
	}
}

impl Deref for ObjectWriter {
	type Target = Object;

	fn deref(&self) -> &Self::Target {
		&self.info
	}
}

impl Drop for ObjectWriter {
	fn drop(&mut self) {
		// A writer that disappears before finishing is an abort, not an end-of-object.
		if !self.finished {
			self.close(ServeError::Done).ok();
		}
	}
}

impl fmt::Debug for ObjectWriter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectWriter").field("info", &self.info).finish()
	}
}

/// Reads the payload of a single object, chunk by chunk.
pub struct ObjectReader {
	state: Watch<State>,
	info: Arc<Object>,
}

impl ObjectReader {
	/// Return the next payload chunk, or None at the end of the object.
	pub async fn chunk(&mut self) -> Result<Option<Bytes>, ServeError> {
		loop {
			let notify = {
				let state = self.state.lock();

				// Unread chunks are dropped on cancellation, not delivered.
				state.closed.clone()?;

				if !state.chunks.is_empty() {
					return Ok(state.into_mut().chunks.pop_front());
				}

				if state.done {
					return Ok(None);
				}

				state.changed()
			};

			notify.await
		}
	}

	/// Concatenate every chunk until the end of the object.
	///
	/// Non-normal objects have an empty payload.
	pub async fn payload(&mut self) -> Result<Bytes, ServeError> {
		let mut buf = BytesMut::new();

		while let Some(chunk) = self.chunk().await? {
			buf.extend_from_slice(&chunk);
		}

		Ok(buf.freeze())
	}
}

impl Deref for ObjectReader {
	type Target = Object;

	fn deref(&self) -> &Self::Target {
		&self.info
	}
}

impl fmt::Debug for ObjectReader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectReader").field("info", &self.info).finish()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn object() -> Object {
		Object {
			group_id: 0,
			object_id: 0,
			priority: 128,
			status: ObjectStatus::Normal,
			size: None,
		}
	}

	#[tokio::test]
	async fn payload_chunks() {
		let (mut writer, mut reader) = object().produce();

		writer.write(Bytes::from_static(b"hel")).await.unwrap();
		writer.write(Bytes::from_static(b"lo")).await.unwrap();
		writer.finish().unwrap();

		assert_eq!(reader.payload().await.unwrap(), Bytes::from_static(b"hello"));
	}

	#[tokio::test]
	async fn abort_before_finish() {
		let (writer, mut reader) = object().produce();
		drop(writer);

		assert_eq!(reader.payload().await, Err(ServeError::Done));
	}

	#[tokio::test]
	async fn cancelled() {
		let (mut writer, mut reader) = object().produce();
		writer.write(Bytes::from_static(b"unread")).await.unwrap();
		writer.close(ServeError::Cancelled).unwrap();

		// Buffered chunks are dropped once the object is cancelled.
		assert_eq!(reader.chunk().await, Err(ServeError::Cancelled));
	}
}
