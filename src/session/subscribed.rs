use std::ops::Deref;

use crate::coding::Params;
use crate::message::{self, AbsoluteLocation, GroupOrder};
use crate::serve::ServeError;
use crate::transport;
use crate::util::Watch;

use super::{Publisher, SessionError};

struct State {
	accepted: bool,
	update: Option<message::SubscribeUpdate>,
	closed: Result<(), ServeError>,
}

impl Default for State {
	fn default() -> Self {
		Self {
			accepted: false,
			update: None,
			closed: Ok(()),
		}
	}
}

/// A subscription received from a subscriber, waiting for our verdict.
///
/// Accept it with [Subscribed::ok] and start publishing, or reject it with
/// [Subscribed::error]. Dropping the handle terminates the subscription.
pub struct Subscribed<S: transport::Session> {
	session: Publisher<S>,
	msg: message::Subscribe,
	state: Watch<State>,
}

impl<S: transport::Session> Subscribed<S> {
	pub(super) fn new(session: Publisher<S>, msg: message::Subscribe) -> (Subscribed<S>, SubscribedRecv) {
		let state = Watch::new(State::default());
		let recv = SubscribedRecv {
			state: state.clone(),
		};

		let subscribed = Self { session, msg, state };

		(subscribed, recv)
	}

	pub fn namespace(&self) -> &str {
		&self.msg.track_namespace
	}

	pub fn name(&self) -> &str {
		&self.msg.track_name
	}

	/// Accept the subscription, resolving the group order against our preference.
	pub fn ok(
		&mut self,
		expires: u64,
		group_order: GroupOrder,
		latest: Option<AbsoluteLocation>,
	) -> Result<(), SessionError> {
		{
			let mut state = self.state.lock_mut();
			state.closed.clone().map_err(SessionError::from)?;

			if state.accepted {
				return Err(SessionError::Duplicate);
			}
			state.accepted = true;
		}

		// The subscriber's preference wins unless it deferred to ours.
		let group_order = self.msg.group_order.resolve(group_order);
		self.session.set_group_order(self.msg.id, group_order);

		self.session.send_message(message::SubscribeOk {
			id: self.msg.id,
			expires,
			group_order,
			latest,
			params: Params::new(),
		})
	}

	/// Reject the subscription.
	///
	/// Pass a retry alias together with [message::SubscribeError::RETRY_TRACK_ALIAS]
	/// to let the subscriber retry with a different alias.
	pub fn error(mut self, code: u64, reason: &str, retry_alias: Option<u64>) -> Result<(), SessionError> {
		{
			let mut state = self.state.lock_mut();
			state.closed.clone().map_err(SessionError::from)?;

			if state.accepted {
				return Err(SessionError::Duplicate);
			}
			state.closed = Err(ServeError::Cancelled);
		}

		self.session.send_message(message::SubscribeError {
			id: self.msg.id,
			code,
			reason: reason.to_string(),
			retry_alias,
		})
	}

	/// Cleanly terminate an accepted subscription.
	pub fn done(mut self, code: u64, reason: &str, last: Option<AbsoluteLocation>) -> Result<(), SessionError> {
		{
			let mut state = self.state.lock_mut();
			state.closed.clone().map_err(SessionError::from)?;

			if !state.accepted {
				return Err(SessionError::Duplicate);
			}
			state.closed = Err(ServeError::Done);
		}

		self.session.send_message(message::SubscribeDone {
			id: self.msg.id,
			code,
			reason: reason.to_string(),
			last,
		})
	}

	/// The most recent SUBSCRIBE_UPDATE, if any.
	pub fn update(&self) -> Option<message::SubscribeUpdate> {
		self.state.lock().update.clone()
	}

	/// Wait until the subscriber loses interest or the session ends.
	pub async fn closed(&self) -> Result<(), ServeError> {
		loop {
			let notify = {
				let state = self.state.lock();
				state.closed.clone()?;
				state.changed()
			};

			notify.await
		}
	}
}

impl<S: transport::Session> Drop for Subscribed<S> {
	fn drop(&mut self) {
		let (terminated, accepted) = {
			let state = self.state.lock();
			(state.closed.is_err(), state.accepted)
		};

		if terminated {
			return;
		}

		let msg = if accepted {
			message::Publisher::SubscribeDone(message::SubscribeDone {
				id: self.msg.id,
				code: message::SubscribeDone::SUBSCRIPTION_ENDED,
				reason: "dropped".to_string(),
				last: None,
			})
		} else {
			message::SubscribeError {
				id: self.msg.id,
				code: message::SubscribeError::INTERNAL_ERROR,
				reason: "dropped".to_string(),
				retry_alias: None,
			}
			.into()
		};

		self.session.send_message(msg).ok();
	}
}

impl<S: transport::Session> Deref for Subscribed<S> {
	type Target = message::Subscribe;

	fn deref(&self) -> &Self::Target {
		&self.msg
	}
}

pub(super) struct SubscribedRecv {
	state: Watch<State>,
}

impl SubscribedRecv {
	pub fn recv_unsubscribe(&mut self) {
		let mut state = self.state.lock_mut();
		if state.closed.is_ok() {
			state.closed = Err(ServeError::Cancelled);
		}
	}

	pub fn recv_update(&mut self, msg: message::SubscribeUpdate) {
		self.state.lock_mut().update = Some(msg);
	}

	pub fn close(&mut self, err: ServeError) {
		let mut state = self.state.lock_mut();
		if state.closed.is_ok() {
			state.closed = Err(err);
		}
	}
}
