/// An error that can be sent over the wire when closing a session or stream.
pub trait MoqError {
	/// An integer code that is sent over the wire.
	fn code(&self) -> u64;

	/// A reason that is sent over the wire.
	fn reason(&self) -> String;
}
