use crate::message;
use crate::serve::ServeError;
use crate::transport;
use crate::util::Watch;

use super::Subscriber;

struct State {
	ok: bool,
	closed: Result<(), ServeError>,
}

impl Default for State {
	fn default() -> Self {
		Self {
			ok: false,
			closed: Ok(()),
		}
	}
}

/// An announce received from the publisher, waiting for our verdict.
pub struct Announced<S: transport::Session> {
	session: Subscriber<S>,
	namespace: String,
	state: Watch<State>,
}

impl<S: transport::Session> Announced<S> {
	pub(super) fn new(session: Subscriber<S>, namespace: String) -> (Announced<S>, AnnouncedRecv) {
		let state = Watch::new(State::default());
		let recv = AnnouncedRecv {
			state: state.clone(),
		};

		let announced = Self {
			session,
			namespace,
			state,
		};

		(announced, recv)
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Accept the announce, sending an ANNOUNCE_OK.
	pub fn ok(&mut self) -> Result<(), ServeError> {
		let mut state = self.state.lock_mut();
		state.closed.clone()?;

		if state.ok {
			return Err(ServeError::Duplicate);
		}
		state.ok = true;
		drop(state);

		self.session
			.send_message(message::AnnounceOk {
				namespace: self.namespace.clone(),
			})
			.ok();

		Ok(())
	}

	/// Reject or revoke the announce.
	///
	/// Sends an ANNOUNCE_ERROR if we never accepted it, an ANNOUNCE_CANCEL otherwise.
	pub fn close(&mut self, err: ServeError) -> Result<(), ServeError> {
		let ok = {
			let mut state = self.state.lock_mut();
			state.closed.clone()?;
			state.closed = Err(err.clone());
			state.ok
		};

		let msg = if ok {
			message::AnnounceCancel {
				namespace: self.namespace.clone(),
				code: err.code(),
				reason: err.to_string(),
			}
			.into()
		} else {
			message::Subscriber::AnnounceError(message::AnnounceError {
				namespace: self.namespace.clone(),
				code: err.code(),
				reason: err.to_string(),
			})
		};
		self.session.send_message(msg).ok();

		Ok(())
	}

	/// Wait until the announce is withdrawn or the session ends.
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

impl<S: transport::Session> Drop for Announced<S> {
	fn drop(&mut self) {
		self.close(ServeError::Done).ok();
		self.session.drop_announce(&self.namespace);
	}
}

pub(super) struct AnnouncedRecv {
	state: Watch<State>,
}

impl AnnouncedRecv {
	pub fn recv_unannounce(&mut self) {
		let mut state = self.state.lock_mut();
		if state.closed.is_ok() {
			state.closed = Err(ServeError::Done);
		}
	}

	pub fn close(&mut self, err: ServeError) {
		let mut state = self.state.lock_mut();
		if state.closed.is_ok() {
			state.closed = Err(err);
		}
	}
}
