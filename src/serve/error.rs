use thiserror::Error;

/// The reason a track, object, or handle was closed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServeError {
	/// The other side of the handle went away cleanly.
	#[error("done")]
	Done,

	/// The subscription was cancelled locally.
	#[error("cancelled")]
	Cancelled,

	/// The peer closed it with an error code.
	#[error("closed, code={0}")]
	Closed(u64),

	#[error("not found")]
	NotFound,

	#[error("duplicate")]
	Duplicate,

	/// The session is draining after a GOAWAY.
	#[error("going away")]
	GoingAway,

	#[error("wrong size")]
	WrongSize,
}

impl ServeError {
	pub fn code(&self) -> u64 {
		match self {
			Self::Done => 0,
			Self::Cancelled => 10,
			Self::Closed(code) => *code,
			Self::NotFound => 404,
			Self::Duplicate => 409,
			Self::GoingAway => 503,
			Self::WrongSize => 413,
		}
	}
}
