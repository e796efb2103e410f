//! The WebTransport-like substrate the session runs on.
//!
//! The session only needs a narrow interface: open/accept streams, send/receive
//! datagrams, and close. Anything QUIC-shaped can implement these traits; the
//! [mem] module provides an in-memory pair used by the tests.
pub mod mem;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// An error surfaced by the transport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
	/// The connection was closed with an application error code.
	#[error("connection closed, code={0}")]
	Closed(u64),

	/// The peer reset the stream with an error code.
	#[error("stream reset, code={0}")]
	Reset(u64),

	/// The peer told us to stop sending with an error code.
	#[error("stream stopped, code={0}")]
	Stopped(u64),
}

/// A WebTransport-like connection.
#[async_trait]
pub trait Session: Clone + Send + Sync + 'static {
	type SendStream: SendStream;
	type RecvStream: RecvStream;

	async fn open_uni(&self) -> Result<Self::SendStream, TransportError>;
	async fn open_bi(&self) -> Result<(Self::SendStream, Self::RecvStream), TransportError>;

	async fn accept_uni(&self) -> Result<Self::RecvStream, TransportError>;
	async fn accept_bi(&self) -> Result<(Self::SendStream, Self::RecvStream), TransportError>;

	async fn send_datagram(&self, payload: Bytes) -> Result<(), TransportError>;
	async fn recv_datagram(&self) -> Result<Bytes, TransportError>;

	/// Close the connection, notifying the peer with a code and reason.
	fn close(&self, code: u64, reason: &str);
}

/// The outgoing half of a stream.
#[async_trait]
pub trait SendStream: Send + Unpin + 'static {
	/// Write the entire buffer to the stream.
	async fn write(&mut self, buf: &[u8]) -> Result<(), TransportError>;

	/// Cleanly finish the stream after any pending writes.
	fn finish(&mut self);

	/// Abruptly terminate the stream with an error code.
	fn reset(&mut self, code: u64);

	/// A priority hint; streams with a smaller order should be sent first.
	fn set_priority(&mut self, order: u64);
}

/// The incoming half of a stream.
#[async_trait]
pub trait RecvStream: Send + Unpin + 'static {
	/// Append any available bytes to the buffer, or None at the end of the stream.
	async fn read(&mut self, buf: &mut BytesMut) -> Result<Option<usize>, TransportError>;

	/// Read the next chunk of at most `max` bytes, or None at the end of the stream.
	async fn read_chunk(&mut self, max: usize) -> Result<Option<Bytes>, TransportError>;

	/// Tell the peer to stop sending with an error code.
	fn stop(&mut self, code: u64);
}
