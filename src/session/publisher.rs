use std::{
	collections::{hash_map, HashMap},
	sync::{Arc, Mutex},
};

use bytes::{Bytes, BytesMut};

use crate::coding::Encode;
use crate::data::{self, ForwardPreference, ObjectStatus};
use crate::message::{self, GroupOrder, Message};
use crate::transport;
use crate::util::{Queue, Watch};

use super::{
	Announce, AnnounceRecv, SessionError, Subscribed, SubscribedRecv, TrackStatusRequested, Writer,
};

/// The full header for one published object, independent of framing.
#[derive(Clone, Debug)]
pub struct PublishHeader {
	/// The subscription being served.
	pub subscribe_id: u64,

	/// The alias agreed at subscribe time.
	pub track_alias: u64,

	/// The group and object sequence numbers.
	pub group_id: u64,
	pub object_id: u64,

	/// The priority, where smaller values are sent first.
	pub priority: u8,

	/// The status; use [Publisher::publish_status] for anything non-normal.
	pub status: ObjectStatus,

	/// How the object is framed and which stream it reuses.
	pub forward_preference: ForwardPreference,

	/// The payload size; required up front for multi-object framings.
	pub length: Option<usize>,
}

// Streams are shared per track, per group, or not at all.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
enum PublishKey {
	Track { subscribe: u64 },
	Group { subscribe: u64, group: u64 },
	Object { subscribe: u64, group: u64, object: u64 },
}

impl PublishKey {
	fn new(header: &PublishHeader) -> Self {
		match header.forward_preference {
			ForwardPreference::Track => Self::Track {
				subscribe: header.subscribe_id,
			},
			ForwardPreference::Group => Self::Group {
				subscribe: header.subscribe_id,
				group: header.group_id,
			},
			ForwardPreference::Object | ForwardPreference::Datagram => Self::Object {
				subscribe: header.subscribe_id,
				group: header.group_id,
				object: header.object_id,
			},
		}
	}
}

// An open outbound data stream and the object currently being written to it.
struct PublishData<W: transport::SendStream> {
	stream: Writer<W>,
	group_id: u64,
	object_id: u64,
	length: Option<usize>,
	offset: usize,
}

#[derive(Clone, Copy)]
struct PubTrack {
	priority: u8,
	group_order: GroupOrder,
}

/// The publisher half of a session: accepts subscriptions and sends objects.
pub struct Publisher<S: transport::Session> {
	webtransport: S,

	announces: Arc<Mutex<HashMap<String, AnnounceRecv>>>,

	subscribed: Arc<Mutex<HashMap<u64, SubscribedRecv>>>,
	subscribed_queue: Queue<Subscribed<S>, SessionError>,

	track_status_queue: Queue<TrackStatusRequested<S>, SessionError>,

	// Priority and group order per accepted subscription, for send ordering.
	pub_tracks: Arc<Mutex<HashMap<u64, PubTrack>>>,

	publish_data: Arc<Mutex<HashMap<PublishKey, PublishData<S::SendStream>>>>,

	outgoing: Queue<Message, SessionError>,
	closing: Watch<Option<message::GoAway>>,
}

impl<S: transport::Session> std::fmt::Debug for Publisher<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Publisher").finish_non_exhaustive()
	}
}

impl<S: transport::Session> Clone for Publisher<S> {
	fn clone(&self) -> Self {
		Self {
			webtransport: self.webtransport.clone(),
			announces: self.announces.clone(),
			subscribed: self.subscribed.clone(),
			subscribed_queue: self.subscribed_queue.clone(),
			track_status_queue: self.track_status_queue.clone(),
			pub_tracks: self.pub_tracks.clone(),
			publish_data: self.publish_data.clone(),
			outgoing: self.outgoing.clone(),
			closing: self.closing.clone(),
		}
	}
}

impl<S: transport::Session> Publisher<S> {
	pub(super) fn new(
		webtransport: S,
		outgoing: Queue<Message, SessionError>,
		closing: Watch<Option<message::GoAway>>,
	) -> Self {
		Self {
			webtransport,
			announces: Default::default(),
			subscribed: Default::default(),
			subscribed_queue: Default::default(),
			track_status_queue: Default::default(),
			pub_tracks: Default::default(),
			publish_data: Default::default(),
			outgoing,
			closing,
		}
	}

	/// Advertise a namespace, resolving once the subscriber responds.
	pub fn announce(&mut self, namespace: &str) -> Result<Announce<S>, SessionError> {
		if self.closing.lock().is_some() {
			return Err(SessionError::GoingAway);
		}

		let mut announces = self.announces.lock().unwrap();

		let entry = match announces.entry(namespace.to_string()) {
			hash_map::Entry::Occupied(_) => return Err(SessionError::Duplicate),
			hash_map::Entry::Vacant(entry) => entry,
		};

		let (announce, recv) = Announce::new(self.clone(), namespace.to_string());
		entry.insert(recv);
		drop(announces);

		self.send_message(message::Announce {
			namespace: namespace.to_string(),
			params: Default::default(),
		})?;

		Ok(announce)
	}

	/// The next subscription requested by the subscriber.
	pub async fn subscribed(&mut self) -> Result<Subscribed<S>, SessionError> {
		self.subscribed_queue.pop().await
	}

	/// The GOAWAY draining this session, if any.
	pub fn goaway(&self) -> Option<message::GoAway> {
		self.closing.lock().clone()
	}

	/// The next track status request from the subscriber.
	pub async fn track_status_requested(&mut self) -> Result<TrackStatusRequested<S>, SessionError> {
		self.track_status_queue.pop().await
	}

	/// Send one chunk of an object's payload.
	///
	/// `offset` is the running payload offset; an object always starts at zero.
	/// Consecutive objects with the same publish key share a stream.
	pub async fn publish(
		&mut self,
		header: PublishHeader,
		offset: usize,
		payload: Bytes,
		eom: bool,
	) -> Result<(), SessionError> {
		if header.status != ObjectStatus::Normal {
			return Err(SessionError::InvalidStatus);
		}

		self.publish_inner(header, offset, payload, eom).await
	}

	/// Send a payload-less object carrying a status.
	pub async fn publish_status(&mut self, header: PublishHeader) -> Result<(), SessionError> {
		if header.status == ObjectStatus::Normal {
			return Err(SessionError::InvalidStatus);
		}

		self.publish_inner(header, 0, Bytes::new(), true).await
	}

	async fn publish_inner(
		&mut self,
		header: PublishHeader,
		offset: usize,
		payload: Bytes,
		eom: bool,
	) -> Result<(), SessionError> {
		log::trace!("publishing: {:?} offset={} eom={}", header, offset, eom);

		// Datagrams are framed and sent in a single call.
		if header.forward_preference == ForwardPreference::Datagram {
			if offset != 0 {
				return Err(SessionError::InvalidOffset);
			}

			let datagram = data::Datagram {
				subscribe_id: header.subscribe_id,
				track_alias: header.track_alias,
				group_id: header.group_id,
				object_id: header.object_id,
				priority: header.priority,
				status: header.status,
				payload,
			};

			let mut buf = BytesMut::new();
			datagram.encode(&mut buf)?;
			self.webtransport.send_datagram(buf.freeze()).await?;

			return Ok(());
		}

		let key = PublishKey::new(&header);

		// Take the record out of the map so the lock is not held while writing.
		let existing = self.publish_data.lock().unwrap().remove(&key);

		let mut record = match existing {
			Some(record) => record,
			None => {
				// A stream cannot pick up in the middle of an object.
				if offset != 0 {
					return Err(SessionError::InvalidOffset);
				}

				let stream = self.webtransport.open_uni().await?;
				let mut stream = Writer::new(stream);
				stream.set_priority(self.send_order(&header));

				// Multi-object framings write their stream header once.
				match header.forward_preference {
					ForwardPreference::Track => {
						let msg: data::Header = data::TrackHeader {
							subscribe_id: header.subscribe_id,
							track_alias: header.track_alias,
							priority: header.priority,
						}
						.into();
						stream.encode(&msg).await?;
						log::trace!("sent stream header: {:?}", msg);
					}
					ForwardPreference::Group => {
						let msg: data::Header = data::GroupHeader {
							subscribe_id: header.subscribe_id,
							track_alias: header.track_alias,
							group_id: header.group_id,
							priority: header.priority,
						}
						.into();
						stream.encode(&msg).await?;
						log::trace!("sent stream header: {:?}", msg);
					}
					_ => {}
				}

				PublishData {
					stream,
					group_id: header.group_id,
					object_id: header.object_id,
					length: None,
					offset: 0,
				}
			}
		};

		if offset == 0 {
			Self::start_object(&header, &mut record, payload.len(), eom).await?;
		} else if offset != record.offset {
			return Err(SessionError::InvalidOffset);
		}

		if let Some(length) = record.length {
			if record.offset + payload.len() > length {
				return Err(SessionError::WrongSize);
			}
		}

		if !payload.is_empty() {
			record.stream.write(&payload).await?;
		}
		record.offset += payload.len();

		if eom {
			if let Some(length) = record.length {
				if record.offset != length {
					return Err(SessionError::WrongSize);
				}
			}
		}

		let object_done = eom || record.length.map_or(false, |length| record.offset == length);
		let stream_done = (object_done && header.forward_preference == ForwardPreference::Object)
			|| header.status.is_terminal();

		if stream_done {
			record.stream.finish();
			return Ok(());
		}

		if object_done {
			// The stream stays open for the next object at this key.
			record.offset = 0;
			record.length = None;
		}

		self.publish_data.lock().unwrap().insert(key, record);

		Ok(())
	}

	// Write the per-object header and validate the sequence against the stream.
	async fn start_object(
		header: &PublishHeader,
		record: &mut PublishData<S::SendStream>,
		payload_len: usize,
		eom: bool,
	) -> Result<(), SessionError> {
		// Sequences must not move backwards on a shared stream.
		match header.forward_preference {
			ForwardPreference::Track => {
				if header.group_id < record.group_id {
					return Err(SessionError::InvalidSequence);
				}
				if header.group_id == record.group_id
					&& (header.object_id < record.object_id
						|| (header.object_id == record.object_id && record.offset != 0))
				{
					return Err(SessionError::InvalidSequence);
				}
			}
			ForwardPreference::Group => {
				if header.object_id < record.object_id
					|| (header.object_id == record.object_id && record.offset != 0)
				{
					return Err(SessionError::InvalidSequence);
				}
			}
			_ => {}
		}

		record.group_id = header.group_id;
		record.object_id = header.object_id;
		record.offset = 0;

		match header.forward_preference {
			ForwardPreference::Track | ForwardPreference::Group => {
				// Multi-object streams require the length up front.
				let size = match header.length {
					Some(length) => length,
					None if eom => payload_len,
					None => return Err(crate::coding::EncodeError::MissingLength.into()),
				};

				if header.forward_preference == ForwardPreference::Track {
					let msg = data::TrackObject {
						group_id: header.group_id,
						object_id: header.object_id,
						size,
						status: header.status,
					};
					record.stream.encode(&msg).await?;
					log::trace!("sent track object: {:?}", msg);
				} else {
					let msg = data::GroupObject {
						object_id: header.object_id,
						size,
						status: header.status,
					};
					record.stream.encode(&msg).await?;
					log::trace!("sent group object: {:?}", msg);
				}

				record.length = Some(size);
			}
			ForwardPreference::Object => {
				let msg: data::Header = data::ObjectHeader {
					subscribe_id: header.subscribe_id,
					track_alias: header.track_alias,
					group_id: header.group_id,
					object_id: header.object_id,
					priority: header.priority,
					status: header.status,
				}
				.into();
				record.stream.encode(&msg).await?;
				log::trace!("sent object header: {:?}", msg);

				// The payload runs to the end of the stream.
				record.length = header.length;
			}
			ForwardPreference::Datagram => unreachable!("datagrams have no stream"),
		}

		Ok(())
	}

	// The transport send order: subscriber priority, object priority, then
	// group (respecting the negotiated order) and object sequence.
	fn send_order(&self, header: &PublishHeader) -> u64 {
		const ID_MASK: u64 = 0x1FFFFF; // 21 bits

		let track = self
			.pub_tracks
			.lock()
			.unwrap()
			.get(&header.subscribe_id)
			.copied()
			.unwrap_or(PubTrack {
				priority: u8::MAX,
				group_order: GroupOrder::OldestFirst,
			});

		let group = header.group_id & ID_MASK;
		let group = match track.group_order {
			GroupOrder::NewestFirst => ID_MASK - group,
			_ => group,
		};

		(u64::from(track.priority) << 50)
			| (u64::from(header.priority) << 42)
			| (group << 21)
			| (header.object_id & ID_MASK)
	}

	pub(super) fn set_group_order(&mut self, id: u64, group_order: GroupOrder) {
		if let Some(track) = self.pub_tracks.lock().unwrap().get_mut(&id) {
			track.group_order = group_order;
		}
	}

	pub(super) fn send_message<M: Into<message::Publisher>>(&mut self, msg: M) -> Result<(), SessionError> {
		let msg = msg.into();

		// Remove state on terminal messages.
		match &msg {
			message::Publisher::SubscribeError(msg) => self.drop_subscribed(msg.id),
			message::Publisher::SubscribeDone(msg) => self.drop_subscribed(msg.id),
			message::Publisher::Unannounce(msg) => self.drop_announce(&msg.namespace),
			_ => {}
		}

		log::debug!("sending message: {:?}", msg);
		self.outgoing.push(msg.into())
	}

	pub(super) fn recv_message(&mut self, msg: message::Subscriber) -> Result<(), SessionError> {
		log::debug!("received message: {:?}", msg);

		match msg {
			message::Subscriber::Subscribe(msg) => self.recv_subscribe(msg),
			message::Subscriber::SubscribeUpdate(msg) => self.recv_subscribe_update(msg),
			message::Subscriber::Unsubscribe(msg) => self.recv_unsubscribe(msg),
			message::Subscriber::AnnounceOk(msg) => self.recv_announce_ok(msg),
			message::Subscriber::AnnounceError(msg) => self.recv_announce_error(msg),
			message::Subscriber::AnnounceCancel(msg) => self.recv_announce_cancel(msg),
			message::Subscriber::TrackStatusRequest(msg) => self.recv_track_status_request(msg),
		}
	}

	fn recv_subscribe(&mut self, msg: message::Subscribe) -> Result<(), SessionError> {
		let mut subscribed = self.subscribed.lock().unwrap();

		// Subscribe IDs must not be reused while live.
		let entry = match subscribed.entry(msg.id) {
			hash_map::Entry::Occupied(_) => return Err(SessionError::Duplicate),
			hash_map::Entry::Vacant(entry) => entry,
		};

		self.pub_tracks.lock().unwrap().insert(
			msg.id,
			PubTrack {
				priority: msg.priority,
				group_order: GroupOrder::Default,
			},
		);

		let (subscribe, recv) = Subscribed::new(self.clone(), msg);
		entry.insert(recv);

		self.subscribed_queue.push(subscribe)
	}

	fn recv_subscribe_update(&mut self, msg: message::SubscribeUpdate) -> Result<(), SessionError> {
		if let Some(track) = self.pub_tracks.lock().unwrap().get_mut(&msg.id) {
			track.priority = msg.priority;
		}

		if let Some(subscribed) = self.subscribed.lock().unwrap().get_mut(&msg.id) {
			subscribed.recv_update(msg);
		} else {
			log::debug!("subscribe update for unknown subscription: {}", msg.id);
		}

		Ok(())
	}

	fn recv_unsubscribe(&mut self, msg: message::Unsubscribe) -> Result<(), SessionError> {
		if let Some(mut subscribed) = self.subscribed.lock().unwrap().remove(&msg.id) {
			subscribed.recv_unsubscribe();
		} else {
			log::debug!("unsubscribe for unknown subscription: {}", msg.id);
			return Ok(());
		}

		// Confirm the teardown so the subscriber can forget the ID.
		self.send_message(message::SubscribeDone {
			id: msg.id,
			code: message::SubscribeDone::UNSUBSCRIBED,
			reason: "unsubscribed".to_string(),
			last: None,
		})
	}

	fn recv_announce_ok(&mut self, msg: message::AnnounceOk) -> Result<(), SessionError> {
		if let Some(announce) = self.announces.lock().unwrap().get_mut(&msg.namespace) {
			return announce.recv_ok();
		}

		log::debug!("announce ok for unknown namespace: {}", msg.namespace);
		Ok(())
	}

	fn recv_announce_error(&mut self, msg: message::AnnounceError) -> Result<(), SessionError> {
		if let Some(mut announce) = self.announces.lock().unwrap().remove(&msg.namespace) {
			announce.recv_error(msg);
		} else {
			log::debug!("announce error for unknown namespace: {}", msg.namespace);
		}

		Ok(())
	}

	fn recv_announce_cancel(&mut self, msg: message::AnnounceCancel) -> Result<(), SessionError> {
		if let Some(mut announce) = self.announces.lock().unwrap().remove(&msg.namespace) {
			announce.recv_cancel(msg);
		} else {
			log::debug!("announce cancel for unknown namespace: {}", msg.namespace);
		}

		Ok(())
	}

	fn recv_track_status_request(&mut self, msg: message::TrackStatusRequest) -> Result<(), SessionError> {
		let requested = TrackStatusRequested::new(self.clone(), msg);
		self.track_status_queue.push(requested)
	}

	pub(super) fn drop_subscribed(&mut self, id: u64) {
		self.subscribed.lock().unwrap().remove(&id);
		self.pub_tracks.lock().unwrap().remove(&id);
	}

	pub(super) fn drop_announce(&mut self, namespace: &str) {
		self.announces.lock().unwrap().remove(namespace);
	}

	pub(super) fn close(&mut self, err: SessionError) {
		self.subscribed_queue.close(err.clone()).ok();
		self.track_status_queue.close(err.clone()).ok();

		for (_, mut subscribed) in self.subscribed.lock().unwrap().drain() {
			subscribed.close(crate::serve::ServeError::Cancelled);
		}

		for (_, mut announce) in self.announces.lock().unwrap().drain() {
			announce.close(err.clone());
		}

		// Dropping the records resets any open data streams.
		self.publish_data.lock().unwrap().clear();
	}
}
