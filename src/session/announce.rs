use crate::message;
use crate::transport;
use crate::util::Watch;

use super::{Publisher, SessionError};

#[derive(Default)]
struct State {
	ok: bool,
	error: Option<message::AnnounceError>,
	cancelled: Option<message::AnnounceCancel>,
	closed: Option<SessionError>,
}

/// An announced namespace, alive until dropped or revoked by the subscriber.
#[must_use = "unannounce on drop"]
pub struct Announce<S: transport::Session> {
	session: Publisher<S>,
	namespace: String,
	state: Watch<State>,
}

impl<S: transport::Session> Announce<S> {
	pub(super) fn new(session: Publisher<S>, namespace: String) -> (Announce<S>, AnnounceRecv) {
		let state = Watch::new(State::default());
		let recv = AnnounceRecv {
			state: state.clone(),
		};

		let announce = Self {
			session,
			namespace,
			state,
		};

		(announce, recv)
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Wait until the subscriber accepts or rejects the announce.
	pub async fn ok(&self) -> Result<(), SessionError> {
		loop {
			let notify = {
				let state = self.state.lock();

				if let Some(err) = &state.error {
					return Err(SessionError::Announce(err.clone()));
				}
				if state.ok {
					return Ok(());
				}
				if let Some(cancel) = &state.cancelled {
					return Err(SessionError::Announce(message::AnnounceError {
						namespace: cancel.namespace.clone(),
						code: cancel.code,
						reason: cancel.reason.clone(),
					}));
				}
				if let Some(err) = &state.closed {
					return Err(err.clone());
				}

				state.changed()
			};

			notify.await
		}
	}

	/// Wait until the announce is revoked or the session ends.
	pub async fn closed(&self) -> Result<(), SessionError> {
		loop {
			let notify = {
				let state = self.state.lock();

				if let Some(err) = &state.error {
					return Err(SessionError::Announce(err.clone()));
				}
				if let Some(cancel) = &state.cancelled {
					return Err(SessionError::Announce(message::AnnounceError {
						namespace: cancel.namespace.clone(),
						code: cancel.code,
						reason: cancel.reason.clone(),
					}));
				}
				if let Some(err) = &state.closed {
					return Err(err.clone());
				}

				state.changed()
			};

			notify.await
		}
	}
}

impl<S: transport::Session> Drop for Announce<S> {
	fn drop(&mut self) {
		let terminated = {
			let state = self.state.lock();
			state.error.is_some() || state.cancelled.is_some() || state.closed.is_some()
		};

		if !terminated {
			self.session
				.send_message(message::Unannounce {
					namespace: self.namespace.clone(),
				})
				.ok();
		}

		self.session.drop_announce(&self.namespace);
	}
}

pub(super) struct AnnounceRecv {
	state: Watch<State>,
}

impl AnnounceRecv {
	pub fn recv_ok(&mut self) -> Result<(), SessionError> {
		let mut state = self.state.lock_mut();
		if state.ok {
			return Err(SessionError::ProtocolViolation);
		}

		state.ok = true;
		Ok(())
	}

	pub fn recv_error(&mut self, msg: message::AnnounceError) {
		self.state.lock_mut().error = Some(msg);
	}

	pub fn recv_cancel(&mut self, msg: message::AnnounceCancel) {
		self.state.lock_mut().cancelled = Some(msg);
	}

	pub fn close(&mut self, err: SessionError) {
		self.state.lock_mut().closed = Some(err);
	}
}
