use crate::coding::{DecodeError, EncodeError};
use crate::serve::ServeError;
use crate::transport::TransportError;
use crate::{message, setup, MoqError};

#[derive(thiserror::Error, Debug, Clone)]
pub enum SessionError {
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),

	#[error("decode error: {0}")]
	Decode(#[from] DecodeError),

	#[error("encode error: {0}")]
	Encode(#[from] EncodeError),

	#[error("serve error: {0}")]
	Serve(#[from] ServeError),

	/// The subscription was rejected by the publisher.
	#[error("subscribe error, code={}", .0.code)]
	Subscribe(message::SubscribeError),

	/// The announce was rejected by the subscriber.
	#[error("announce error, code={}", .0.code)]
	Announce(message::AnnounceError),

	#[error("unsupported versions: client={0:?} server={1:?}")]
	Version(setup::Versions, setup::Versions),

	/// The handshake roles are incompatible; nobody would be publishing.
	#[error("incompatible roles: local={0:?} remote={1:?}")]
	RoleIncompatible(setup::Role, setup::Role),

	/// The role negotiated in the handshake was violated, e.g. a subscriber sent SUBSCRIBE_OK.
	#[error("role violation: msg={0}")]
	RoleViolation(u64),

	/// The peer referenced state it never created, e.g. SUBSCRIBE_OK for an unknown ID.
	#[error("protocol violation")]
	ProtocolViolation,

	/// The peer reused an ID that is still live.
	#[error("duplicate")]
	Duplicate,

	/// The setup exchange did not finish before the deadline.
	#[error("setup timed out")]
	SetupTimeout,

	/// The session is draining after a GOAWAY.
	#[error("going away")]
	GoingAway,

	/// The payload did not match the declared object length.
	#[error("wrong payload size")]
	WrongSize,

	/// A publish continued an object this session never started.
	#[error("publish offset must start at zero")]
	InvalidOffset,

	/// The group or object sequence moved backwards on a shared stream.
	#[error("sequence must not decrease")]
	InvalidSequence,

	/// publish was called with a status that belongs to publish_status, or vice versa.
	#[error("invalid object status")]
	InvalidStatus,

	/// The subscription or announce was torn down locally.
	#[error("cancelled")]
	Cancelled,
}

impl MoqError for SessionError {
	fn code(&self) -> u64 {
		match self {
			Self::Transport(_) => 503,
			Self::Decode(DecodeError::InvalidMessage(_)) => 3,
			Self::Decode(DecodeError::InvalidStreamHeader(_)) => 3,
			Self::Decode(_) => 1,
			Self::Encode(_) => 500,
			Self::Serve(err) => err.code(),
			Self::Subscribe(err) => err.code,
			Self::Announce(err) => err.code,
			Self::Version(..) => 406,
			Self::RoleIncompatible(..) => 406,
			Self::RoleViolation(..) => 405,
			Self::ProtocolViolation => 3,
			Self::Duplicate => 4,
			Self::SetupTimeout => 408,
			Self::GoingAway => 0x10,
			Self::WrongSize => 413,
			Self::InvalidOffset => 400,
			Self::InvalidSequence => 400,
			Self::InvalidStatus => 400,
			Self::Cancelled => 10,
		}
	}

	fn reason(&self) -> String {
		self.to_string()
	}
}
