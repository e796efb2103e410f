use crate::message;
use crate::transport;

use super::{Publisher, SessionError};

/// A track status request received from the subscriber.
pub struct TrackStatusRequested<S: transport::Session> {
	session: Publisher<S>,
	pub msg: message::TrackStatusRequest,
}

impl<S: transport::Session> TrackStatusRequested<S> {
	pub(super) fn new(session: Publisher<S>, msg: message::TrackStatusRequest) -> Self {
		Self { session, msg }
	}

	pub fn namespace(&self) -> &str {
		&self.msg.track_namespace
	}

	pub fn name(&self) -> &str {
		&self.msg.track_name
	}

	/// Answer with the track's status.
	pub fn respond(mut self, status: message::TrackStatus) -> Result<(), SessionError> {
		self.session.send_message(status)
	}
}
