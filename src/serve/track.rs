//! A track is the subscriber-side view of a subscription, split into a writer and reader handle.
//!
//! The session feeds received objects into the [TrackWriter]; the application
//! consumes them from the [TrackReader] in arrival order. No cross-stream
//! ordering is promised; rely on the (group, object) sequence numbers or a
//! dejitter buffer to reorder.
use std::{
	collections::{HashMap, VecDeque},
	fmt,
	ops::Deref,
	sync::Arc,
};

use crate::message::AbsoluteLocation;
use crate::util::Watch;

use super::{Object, ObjectReader, ObjectWriter, ServeError};

/// Static information about a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
	pub namespace: String,
	pub name: String,
}

impl Track {
	pub fn new(namespace: &str, name: &str) -> Self {
		Self {
			namespace: namespace.to_string(),
			name: name.to_string(),
		}
	}

	pub fn produce(self) -> (TrackWriter, TrackReader) {
		let state = Watch::new(State::default());
		let info = Arc::new(self);

		let writer = TrackWriter {
			state: state.clone(),
			info: info.clone(),
		};
		let reader = TrackReader { state, info };

		(writer, reader)
	}
}

struct State {
	// Received objects that have not been handed to the application yet.
	objects: VecDeque<ObjectReader>,

	// Objects whose payload is still in flight, for cleanup and uniqueness.
	open: HashMap<(u64, u64), Watch<super::object::State>>,

	latest: Option<AbsoluteLocation>,

	closed: Result<(), ServeError>,
}

impl Default for State {
	fn default() -> Self {
		Self {
			objects: Default::default(),
			open: Default::default(),
			latest: None,
			closed: Ok(()),
		}
	}
}

/// Feeds received objects into a track.
pub struct TrackWriter {
	state: Watch<State>,
	pub info: Arc<Track>,
}

impl TrackWriter {
	/// Create a source for a newly received object.
	///
	/// The (group, object) pair must be unique until the object completes.
	pub fn create(&mut self, object: Object) -> Result<ObjectWriter, ServeError> {
		let key = (object.group_id, object.object_id);
		let location = AbsoluteLocation::new(object.group_id, object.object_id);

		let mut state = self.state.lock_mut();
		state.closed.clone()?;

		// Completed objects release their key.
		state.open.retain(|_, shared| !shared.lock().is_complete());

		if state.open.contains_key(&key) {
			return Err(ServeError::Duplicate);
		}

		let (writer, reader) = object.produce();
		state.open.insert(key, writer.shared());
		state.objects.push_back(reader);

		if state.latest.map(|prev| prev < location).unwrap_or(true) {
			state.latest = Some(location);
		}

		Ok(writer)
	}

	/// Close the track, aborting every object still in flight.
	pub fn close(&mut self, err: ServeError) -> Result<(), ServeError> {
		let open = {
			let mut state = self.state.lock_mut();
			state.closed.clone()?;
			state.closed = Err(err.clone());
			state.open.drain().map(|(_, shared)| shared).collect::<Vec<_>>()
		};

		for shared in open {
			shared.lock_mut().abort(err.clone());
		}

		Ok(())
	}

	pub fn closed(&self) -> Result<(), ServeError> {
		self.state.lock().closed.clone()
	}
}

impl Deref for TrackWriter {
	type Target = Track;

	fn deref(&self) -> &Self::Target {
		&self.info
	}
}

impl Drop for TrackWriter {
	fn drop(&mut self) {
		self.close(ServeError::Done).ok();
	}
}

impl fmt::Debug for TrackWriter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TrackWriter").field("info", &self.info).finish()
	}
}

/// Receives the objects of a track in arrival order.
pub struct TrackReader {
	state: Watch<State>,
	pub info: Arc<Track>,
}

impl TrackReader {
	/// Block until the next object arrives, or None when the track ends.
	pub async fn next(&mut self) -> Result<Option<ObjectReader>, ServeError> {
		loop {
			let notify = {
				let state = self.state.lock();

				if !state.objects.is_empty() {
					return Ok(state.into_mut().objects.pop_front());
				}

				match &state.closed {
					Ok(()) => state.changed(),
					Err(ServeError::Done) => return Ok(None),
					Err(err) => return Err(err.clone()),
				}
			};

			notify.await
		}
	}

	/// The largest location received so far on this track.
	pub fn latest(&self) -> Option<AbsoluteLocation> {
		self.state.lock().latest
	}
}

impl Deref for TrackReader {
	type Target = Track;

	fn deref(&self) -> &Self::Target {
		&self.info
	}
}

impl fmt::Debug for TrackReader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TrackReader").field("info", &self.info).finish()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::data::ObjectStatus;
	use bytes::Bytes;

	fn object(group_id: u64, object_id: u64) -> Object {
		Object {
			group_id,
			object_id,
			priority: 0,
			status: ObjectStatus::Normal,
			size: None,
		}
	}

	#[tokio::test]
	async fn arrival_order() {
		let (mut writer, mut reader) = Track::new("ns", "t").produce();

		let first = writer.create(object(1, 0)).unwrap();
		let second = writer.create(object(0, 0)).unwrap();
		first.finish().unwrap();
		second.finish().unwrap();

		// Objects are delivered in arrival order, not sequence order.
		assert_eq!(reader.next().await.unwrap().unwrap().group_id, 1);
		assert_eq!(reader.next().await.unwrap().unwrap().group_id, 0);
		assert_eq!(reader.latest(), Some(AbsoluteLocation::new(1, 0)));
	}

	#[tokio::test]
	async fn duplicate_until_complete() {
		let (mut writer, _reader) = Track::new("ns", "t").produce();

		let first = writer.create(object(0, 0)).unwrap();
		assert_eq!(writer.create(object(0, 0)).unwrap_err(), ServeError::Duplicate);

		// Completion releases the key.
		first.finish().unwrap();
		writer.create(object(0, 0)).unwrap();
	}

	#[tokio::test]
	async fn close_aborts_open_objects() {
		let (mut writer, mut reader) = Track::new("ns", "t").produce();

		let mut open = writer.create(object(0, 0)).unwrap();
		open.write(Bytes::from_static(b"partial")).await.unwrap();

		let mut source = reader.next().await.unwrap().unwrap();
		writer.close(ServeError::Closed(404)).unwrap();

		assert_eq!(source.payload().await, Err(ServeError::Closed(404)));
		assert!(matches!(reader.next().await, Err(ServeError::Closed(404))));
	}
}
