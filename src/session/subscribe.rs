use crate::coding::Params;
use crate::message::{self, AbsoluteLocation, FilterType, GroupOrder};
use crate::serve::{self, ObjectReader, ObjectWriter, ServeError, TrackReader, TrackWriter};
use crate::transport;
use crate::util::Watch;
use crate::MoqError;

use super::{SessionError, Subscriber};

/// Everything the application chooses when subscribing to a track.
#[derive(Clone, Debug)]
pub struct SubscribeRequest {
	/// The track namespace and name.
	pub namespace: String,
	pub name: String,

	/// The priority for this subscription, where smaller is better.
	pub priority: u8,

	/// The requested group delivery order; Default accepts the publisher's preference.
	pub group_order: GroupOrder,

	/// Where the subscription starts and ends.
	pub filter_type: FilterType,
	pub start: Option<AbsoluteLocation>,
	pub end: Option<AbsoluteLocation>,

	/// A track alias to reuse, from a RETRY_TRACK_ALIAS error.
	pub track_alias: Option<u64>,

	/// Optional parameters.
	pub params: Params,
}

impl SubscribeRequest {
	pub fn new(namespace: &str, name: &str) -> Self {
		Self {
			namespace: namespace.to_string(),
			name: name.to_string(),
			priority: 128,
			group_order: GroupOrder::Default,
			filter_type: FilterType::LatestGroup,
			start: None,
			end: None,
			track_alias: None,
			params: Params::new(),
		}
	}
}

#[derive(Default)]
struct State {
	ok: Option<message::SubscribeOk>,
	error: Option<message::SubscribeError>,
	done: Option<message::SubscribeDone>,
	unsubscribed: bool,
	closed: Option<SessionError>,
}

/// An active subscription, receiving objects until done or unsubscribed.
#[must_use = "unsubscribe on drop"]
pub struct Subscribe<S: transport::Session> {
	session: Subscriber<S>,
	id: u64,
	track_alias: u64,
	track: TrackReader,
	state: Watch<State>,
}

impl<S: transport::Session> std::fmt::Debug for Subscribe<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscribe").field("id", &self.id).finish_non_exhaustive()
	}
}

impl<S: transport::Session> Subscribe<S> {
	pub(super) fn new(session: Subscriber<S>, msg: &message::Subscribe) -> (Subscribe<S>, SubscribeRecv) {
		let (writer, reader) = serve::Track::new(&msg.track_namespace, &msg.track_name).produce();
		let state = Watch::new(State::default());

		let subscribe = Subscribe {
			session,
			id: msg.id,
			track_alias: msg.track_alias,
			track: reader,
			state: state.clone(),
		};
		let recv = SubscribeRecv { state, writer };

		(subscribe, recv)
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn track_alias(&self) -> u64 {
		self.track_alias
	}

	/// Wait until the publisher accepts or rejects the subscription.
	///
	/// A rejection surfaces as [SessionError::Subscribe], carrying the retry
	/// alias when the error code asks for a retry.
	pub async fn ok(&self) -> Result<(), SessionError> {
		loop {
			let notify = {
				let state = self.state.lock();

				if let Some(err) = &state.error {
					return Err(SessionError::Subscribe(err.clone()));
				}
				if state.ok.is_some() {
					return Ok(());
				}

				// The subscription can end before it was ever accepted.
				if let Some(done) = &state.done {
					return Err(SessionError::Subscribe(message::SubscribeError {
						id: done.id,
						code: done.code,
						reason: done.reason.clone(),
						retry_alias: None,
					}));
				}
				if state.unsubscribed {
					return Err(SessionError::Cancelled);
				}
				if let Some(err) = &state.closed {
					return Err(err.clone());
				}

				state.changed()
			};

			notify.await
		}
	}

	/// The group order negotiated in SUBSCRIBE_OK, once accepted.
	pub fn group_order(&self) -> Option<GroupOrder> {
		self.state.lock().ok.as_ref().map(|ok| ok.group_order)
	}

	/// The largest known location: the SUBSCRIBE_OK hint or anything received since.
	pub fn latest(&self) -> Option<AbsoluteLocation> {
		let ok = self.state.lock().ok.as_ref().and_then(|ok| ok.latest);
		let received = self.track.latest();

		match (ok, received) {
			(Some(a), Some(b)) => Some(a.max(b)),
			(a, b) => a.or(b),
		}
	}

	/// The SUBSCRIBE_DONE that ended this subscription, if any.
	pub fn done(&self) -> Option<message::SubscribeDone> {
		self.state.lock().done.clone()
	}

	/// Block until the next object arrives, or None when the subscription ends.
	pub async fn next(&mut self) -> Result<Option<ObjectReader>, ServeError> {
		self.track.next().await
	}

	/// End our interest in the track; outstanding reads unblock with [ServeError::Cancelled].
	pub fn unsubscribe(&mut self) {
		{
			let mut state = self.state.lock_mut();
			if state.unsubscribed {
				return;
			}
			state.unsubscribed = true;
		}

		self.session.send_message(message::Unsubscribe { id: self.id }).ok();
	}
}

impl<S: transport::Session> Drop for Subscribe<S> {
	fn drop(&mut self) {
		let finished = {
			let state = self.state.lock();
			state.unsubscribed || state.error.is_some() || state.done.is_some() || state.closed.is_some()
		};

		if !finished {
			self.unsubscribe();
		}
	}
}

pub(super) struct SubscribeRecv {
	state: Watch<State>,
	writer: TrackWriter,
}

impl SubscribeRecv {
	pub fn recv_ok(&mut self, msg: message::SubscribeOk) -> Result<(), SessionError> {
		let mut state = self.state.lock_mut();
		if state.ok.is_some() {
			return Err(SessionError::ProtocolViolation);
		}

		state.ok = Some(msg);
		Ok(())
	}

	pub fn recv_error(&mut self, msg: message::SubscribeError) {
		self.writer.close(ServeError::Closed(msg.code)).ok();
		self.state.lock_mut().error = Some(msg);
	}

	pub fn recv_done(&mut self, msg: message::SubscribeDone) {
		// A clean end: the reader drains anything already queued, then None.
		self.writer.close(ServeError::Done).ok();
		self.state.lock_mut().done = Some(msg);
	}

	pub fn create(&mut self, object: serve::Object) -> Result<ObjectWriter, ServeError> {
		self.writer.create(object)
	}

	pub fn cancel(&mut self) {
		self.writer.close(ServeError::Cancelled).ok();
	}

	pub fn close(&mut self, err: SessionError) {
		self.writer.close(ServeError::Closed(err.code())).ok();
		self.state.lock_mut().closed = Some(err);
	}
}
