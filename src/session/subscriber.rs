use std::{
	collections::{hash_map, HashMap},
	io,
	sync::{atomic, Arc, Mutex},
};

use bytes::Bytes;

use crate::coding::{Decode, DecodeError};
use crate::message::{self, Message};
use crate::serve::{self, ServeError};
use crate::transport;
use crate::util::{Queue, Watch};
use crate::{data, MoqError};

use super::{Announced, AnnouncedRecv, Reader, SessionError, Subscribe, SubscribeRecv, SubscribeRequest};

struct TrackStatusState {
	status: Option<message::TrackStatus>,
	closed: Result<(), SessionError>,
}

impl Default for TrackStatusState {
	fn default() -> Self {
		Self {
			status: None,
			closed: Ok(()),
		}
	}
}

pub(super) struct TrackStatusRecv {
	state: Watch<TrackStatusState>,
}

/// The subscriber half of a session: requests tracks and receives objects.
pub struct Subscriber<S: transport::Session> {
	announced: Arc<Mutex<HashMap<String, AnnouncedRecv>>>,
	announced_queue: Queue<Announced<S>, SessionError>,

	subscribes: Arc<Mutex<HashMap<u64, SubscribeRecv>>>,
	subscribe_next: Arc<atomic::AtomicU64>,

	track_statuses: Arc<Mutex<HashMap<(String, String), TrackStatusRecv>>>,

	outgoing: Queue<Message, SessionError>,
	closing: Watch<Option<message::GoAway>>,
}

impl<S: transport::Session> std::fmt::Debug for Subscriber<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscriber").finish_non_exhaustive()
	}
}

impl<S: transport::Session> Clone for Subscriber<S> {
	fn clone(&self) -> Self {
		Self {
			announced: self.announced.clone(),
			announced_queue: self.announced_queue.clone(),
			subscribes: self.subscribes.clone(),
			subscribe_next: self.subscribe_next.clone(),
			track_statuses: self.track_statuses.clone(),
			outgoing: self.outgoing.clone(),
			closing: self.closing.clone(),
		}
	}
}

impl<S: transport::Session> Subscriber<S> {
	pub(super) fn new(outgoing: Queue<Message, SessionError>, closing: Watch<Option<message::GoAway>>) -> Self {
		Self {
			announced: Default::default(),
			announced_queue: Default::default(),
			subscribes: Default::default(),
			subscribe_next: Default::default(),
			track_statuses: Default::default(),
			outgoing,
			closing,
		}
	}

	/// The next namespace announced by the publisher.
	pub async fn announced(&mut self) -> Result<Announced<S>, SessionError> {
		self.announced_queue.pop().await
	}

	/// The GOAWAY draining this session, if any.
	pub fn goaway(&self) -> Option<message::GoAway> {
		self.closing.lock().clone()
	}

	/// Subscribe to a track, assigning it a fresh subscribe ID.
	///
	/// The returned handle resolves once the publisher responds.
	pub fn subscribe(&mut self, request: SubscribeRequest) -> Result<Subscribe<S>, SessionError> {
		if self.closing.lock().is_some() {
			return Err(SessionError::GoingAway);
		}

		let id = self.subscribe_next.fetch_add(1, atomic::Ordering::Relaxed);

		let msg = message::Subscribe {
			id,
			track_alias: request.track_alias.unwrap_or(id),
			track_namespace: request.namespace,
			track_name: request.name,
			priority: request.priority,
			group_order: request.group_order,
			filter_type: request.filter_type,
			start: request.start,
			end: request.end,
			params: request.params,
		};

		let (subscribe, recv) = Subscribe::new(self.clone(), &msg);
		self.subscribes.lock().unwrap().insert(id, recv);

		self.send_message(msg)?;

		Ok(subscribe)
	}

	/// Query the status of a track, resolving on the matching TRACK_STATUS.
	pub async fn track_status(&mut self, namespace: &str, name: &str) -> Result<message::TrackStatus, SessionError> {
		if self.closing.lock().is_some() {
			return Err(SessionError::GoingAway);
		}

		let key = (namespace.to_string(), name.to_string());
		let state = {
			let mut pending = self.track_statuses.lock().unwrap();

			match pending.entry(key) {
				hash_map::Entry::Occupied(_) => return Err(SessionError::Duplicate),
				hash_map::Entry::Vacant(entry) => {
					let state = Watch::new(TrackStatusState::default());
					entry.insert(TrackStatusRecv {
						state: state.clone(),
					});
					state
				}
			}
		};

		self.send_message(message::TrackStatusRequest {
			track_namespace: namespace.to_string(),
			track_name: name.to_string(),
		})?;

		loop {
			let notify = {
				let state = state.lock();
				if let Some(status) = &state.status {
					return Ok(status.clone());
				}
				state.closed.clone()?;
				state.changed()
			};

			notify.await
		}
	}

	pub(super) fn send_message<M: Into<message::Subscriber>>(&mut self, msg: M) -> Result<(), SessionError> {
		let msg = msg.into();

		// Remove state on terminal messages.
		match &msg {
			message::Subscriber::AnnounceCancel(msg) => self.drop_announce(&msg.namespace),
			message::Subscriber::AnnounceError(msg) => self.drop_announce(&msg.namespace),
			message::Subscriber::Unsubscribe(msg) => {
				if let Some(mut subscribe) = self.subscribes.lock().unwrap().remove(&msg.id) {
					subscribe.cancel();
				}
			}
			_ => {}
		}

		log::debug!("sending message: {:?}", msg);
		self.outgoing.push(msg.into())
	}

	pub(super) fn recv_message(&mut self, msg: message::Publisher) -> Result<(), SessionError> {
		log::debug!("received message: {:?}", msg);

		match msg {
			message::Publisher::Announce(msg) => self.recv_announce(msg),
			message::Publisher::Unannounce(msg) => self.recv_unannounce(msg),
			message::Publisher::SubscribeOk(msg) => self.recv_subscribe_ok(msg),
			message::Publisher::SubscribeError(msg) => self.recv_subscribe_error(msg),
			message::Publisher::SubscribeDone(msg) => self.recv_subscribe_done(msg),
			message::Publisher::TrackStatus(msg) => self.recv_track_status(msg),
		}
	}

	fn recv_announce(&mut self, msg: message::Announce) -> Result<(), SessionError> {
		let mut announces = self.announced.lock().unwrap();

		let entry = match announces.entry(msg.namespace.clone()) {
			hash_map::Entry::Occupied(_) => return Err(SessionError::Duplicate),
			hash_map::Entry::Vacant(entry) => entry,
		};

		let (announced, recv) = Announced::new(self.clone(), msg.namespace);
		entry.insert(recv);

		self.announced_queue.push(announced)
	}

	fn recv_unannounce(&mut self, msg: message::Unannounce) -> Result<(), SessionError> {
		if let Some(mut announce) = self.announced.lock().unwrap().remove(&msg.namespace) {
			announce.recv_unannounce();
		}

		Ok(())
	}

	fn recv_subscribe_ok(&mut self, msg: message::SubscribeOk) -> Result<(), SessionError> {
		// An OK for a subscription we never started is a protocol violation.
		self.subscribes
			.lock()
			.unwrap()
			.get_mut(&msg.id)
			.ok_or(SessionError::ProtocolViolation)?
			.recv_ok(msg)
	}

	fn recv_subscribe_error(&mut self, msg: message::SubscribeError) -> Result<(), SessionError> {
		// May race with a local unsubscribe, so an unknown ID is fine.
		if let Some(mut subscribe) = self.subscribes.lock().unwrap().remove(&msg.id) {
			subscribe.recv_error(msg);
		} else {
			log::debug!("subscribe error for unknown subscription: {}", msg.id);
		}

		Ok(())
	}

	fn recv_subscribe_done(&mut self, msg: message::SubscribeDone) -> Result<(), SessionError> {
		if let Some(mut subscribe) = self.subscribes.lock().unwrap().remove(&msg.id) {
			subscribe.recv_done(msg);
		} else {
			log::debug!("subscribe done for unknown subscription: {}", msg.id);
		}

		Ok(())
	}

	fn recv_track_status(&mut self, msg: message::TrackStatus) -> Result<(), SessionError> {
		let key = (msg.track_namespace.clone(), msg.track_name.clone());

		if let Some(recv) = self.track_statuses.lock().unwrap().remove(&key) {
			recv.state.lock_mut().status = Some(msg);
		} else {
			log::debug!("unsolicited track status: {}/{}", msg.track_namespace, msg.track_name);
		}

		Ok(())
	}

	pub(super) fn drop_announce(&mut self, namespace: &str) {
		self.announced.lock().unwrap().remove(namespace);
	}

	fn create_object(&mut self, subscribe_id: u64, object: serve::Object) -> Result<serve::ObjectWriter, SessionError> {
		let mut subscribes = self.subscribes.lock().unwrap();
		let subscribe = subscribes
			.get_mut(&subscribe_id)
			.ok_or(ServeError::NotFound)?;

		Ok(subscribe.create(object)?)
	}

	/// Serve one incoming unidirectional stream until it ends.
	pub(super) async fn recv_stream(mut self, stream: S::RecvStream) -> Result<(), SessionError> {
		let mut reader = Reader::new(stream);

		match self.recv_stream_inner(&mut reader).await {
			// An unknown stream header poisons the whole session.
			Err(err @ SessionError::Decode(DecodeError::InvalidStreamHeader(_))) => Err(err),

			// Anything else only poisons this stream.
			Err(err) => {
				log::warn!("failed to serve stream: {}", err);
				reader.stop(err.code());
				Ok(())
			}

			Ok(()) => Ok(()),
		}
	}

	async fn recv_stream_inner(&mut self, reader: &mut Reader<S::RecvStream>) -> Result<(), SessionError> {
		let header: data::Header = reader.decode().await?;
		log::trace!("received stream header: {:?}", header);

		match header {
			data::Header::Track(track) => self.recv_track(track, reader).await,
			data::Header::Group(group) => self.recv_group(group, reader).await,
			data::Header::Object(object) => self.recv_object(object, reader).await,
		}
	}

	async fn recv_track(
		&mut self,
		header: data::TrackHeader,
		reader: &mut Reader<S::RecvStream>,
	) -> Result<(), SessionError> {
		while !reader.done().await? {
			let chunk: data::TrackObject = reader.decode().await?;
			log::trace!("received track object: {:?}", chunk);

			let mut object = self.create_object(
				header.subscribe_id,
				serve::Object {
					group_id: chunk.group_id,
					object_id: chunk.object_id,
					priority: header.priority,
					status: chunk.status,
					size: Some(chunk.size),
				},
			)?;

			let mut remain = chunk.size;
			while remain > 0 {
				let data = reader.read_chunk(remain).await?.ok_or(SessionError::WrongSize)?;
				log::trace!("received track payload: {:?}", data.len());
				remain -= data.len();
				object.write(data).await?;
			}

			object.finish()?;
		}

		Ok(())
	}

	async fn recv_group(
		&mut self,
		header: data::GroupHeader,
		reader: &mut Reader<S::RecvStream>,
	) -> Result<(), SessionError> {
		while !reader.done().await? {
			let chunk: data::GroupObject = reader.decode().await?;
			log::trace!("received group object: {:?}", chunk);

			let mut object = self.create_object(
				header.subscribe_id,
				serve::Object {
					group_id: header.group_id,
					object_id: chunk.object_id,
					priority: header.priority,
					status: chunk.status,
					size: Some(chunk.size),
				},
			)?;

			let mut remain = chunk.size;
			while remain > 0 {
				let data = reader.read_chunk(remain).await?.ok_or(SessionError::WrongSize)?;
				log::trace!("received group payload: {:?}", data.len());
				remain -= data.len();
				object.write(data).await?;
			}

			object.finish()?;
		}

		Ok(())
	}

	async fn recv_object(
		&mut self,
		header: data::ObjectHeader,
		reader: &mut Reader<S::RecvStream>,
	) -> Result<(), SessionError> {
		let mut object = self.create_object(
			header.subscribe_id,
			serve::Object {
				group_id: header.group_id,
				object_id: header.object_id,
				priority: header.priority,
				status: header.status,
				size: None,
			},
		)?;

		// The payload runs to the end of the stream.
		while let Some(data) = reader.read_chunk(usize::MAX).await? {
			log::trace!("received object payload: {:?}", data.len());
			object.write(data).await?;
		}

		object.finish()?;

		Ok(())
	}

	pub(super) async fn recv_datagram(&mut self, datagram: Bytes) {
		// A malformed or stale datagram is dropped; there is no stream to reset.
		if let Err(err) = self.recv_datagram_inner(datagram).await {
			log::warn!("failed to process datagram: {}", err);
		}
	}

	async fn recv_datagram_inner(&mut self, datagram: Bytes) -> Result<(), SessionError> {
		let mut cursor = io::Cursor::new(&datagram);
		let datagram = data::Datagram::decode(&mut cursor)?;
		log::trace!("received datagram: {:?}", datagram);

		let object = serve::Object {
			group_id: datagram.group_id,
			object_id: datagram.object_id,
			priority: datagram.priority,
			status: datagram.status,
			size: Some(datagram.payload.len()),
		};

		let mut object = self.create_object(datagram.subscribe_id, object)?;

		if !datagram.payload.is_empty() {
			object.write(datagram.payload).await?;
		}
		object.finish()?;

		Ok(())
	}

	pub(super) fn close(&mut self, err: SessionError) {
		self.announced_queue.close(err.clone()).ok();

		for (_, mut announce) in self.announced.lock().unwrap().drain() {
			announce.close(ServeError::Closed(err.code()));
		}

		for (_, mut subscribe) in self.subscribes.lock().unwrap().drain() {
			subscribe.close(err.clone());
		}

		for (_, recv) in self.track_statuses.lock().unwrap().drain() {
			recv.state.lock_mut().closed = Err(err.clone());
		}
	}
}
