//! An in-memory transport, connecting two endpoints without a network.
//!
//! Used by the tests; streams and datagrams behave like their QUIC
//! counterparts minus flow control and loss.
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

use crate::util::{Queue, Watch};

use super::TransportError;

/// Create a connected pair of sessions.
pub fn pair() -> (Session, Session) {
	let a = Arc::new(Endpoint::default());
	let b = Arc::new(Endpoint::default());

	let left = Session {
		local: a.clone(),
		remote: b.clone(),
	};
	let right = Session { local: b, remote: a };

	(left, right)
}

#[derive(Default)]
struct Endpoint {
	// Streams and datagrams the peer has opened towards us.
	uni: Queue<RecvStream, TransportError>,
	bi: Queue<(SendStream, RecvStream), TransportError>,
	datagrams: Queue<Bytes, TransportError>,
}

impl Endpoint {
	fn close(&self, err: TransportError) {
		self.uni.close(err.clone()).ok();
		self.bi.close(err.clone()).ok();
		self.datagrams.close(err).ok();
	}
}

#[derive(Clone)]
pub struct Session {
	local: Arc<Endpoint>,
	remote: Arc<Endpoint>,
}

#[async_trait]
impl super::Session for Session {
	type SendStream = SendStream;
	type RecvStream = RecvStream;

	async fn open_uni(&self) -> Result<SendStream, TransportError> {
		let (send, recv) = pipe();
		self.remote.uni.push(recv)?;
		Ok(send)
	}

	async fn open_bi(&self) -> Result<(SendStream, RecvStream), TransportError> {
		let (send_there, recv_here) = pipe();
		let (send_here, recv_there) = pipe();
		self.remote.bi.push((send_there, recv_there))?;
		Ok((send_here, recv_here))
	}

	async fn accept_uni(&self) -> Result<RecvStream, TransportError> {
		self.local.uni.pop().await
	}

	async fn accept_bi(&self) -> Result<(SendStream, RecvStream), TransportError> {
		self.local.bi.pop().await
	}

	async fn send_datagram(&self, payload: Bytes) -> Result<(), TransportError> {
		self.remote.datagrams.push(payload)
	}

	async fn recv_datagram(&self) -> Result<Bytes, TransportError> {
		self.local.datagrams.pop().await
	}

	fn close(&self, code: u64, _reason: &str) {
		self.local.close(TransportError::Closed(code));
		self.remote.close(TransportError::Closed(code));
	}
}

struct StreamState {
	buffer: BytesMut,
	fin: bool,
	reset: Option<u64>,
	stopped: Option<u64>,
}

impl Default for StreamState {
	fn default() -> Self {
		Self {
			buffer: Default::default(),
			fin: false,
			reset: None,
			stopped: None,
		}
	}
}

fn pipe() -> (SendStream, RecvStream) {
	let state = Watch::new(StreamState::default());
	let send = SendStream {
		state: state.clone(),
		finished: false,
	};
	let recv = RecvStream { state };

	(send, recv)
}

pub struct SendStream {
	state: Watch<StreamState>,
	finished: bool,
}

#[async_trait]
impl super::SendStream for SendStream {
	async fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
		let mut state = self.state.lock_mut();
		if let Some(code) = state.stopped {
			return Err(TransportError::Stopped(code));
		}

		state.buffer.extend_from_slice(buf);
		Ok(())
	}

	fn finish(&mut self) {
		self.finished = true;
		self.state.lock_mut().fin = true;
	}

	fn reset(&mut self, code: u64) {
		self.finished = true;
		self.state.lock_mut().reset = Some(code);
	}

	fn set_priority(&mut self, _order: u64) {
		// There is no contention to schedule around in memory.
	}
}

impl Drop for SendStream {
	fn drop(&mut self) {
		// An unfinished stream is implicitly reset, like QUIC.
		if !self.finished {
			self.state.lock_mut().reset = Some(0);
		}
	}
}

pub struct RecvStream {
	state: Watch<StreamState>,
}

#[async_trait]
impl super::RecvStream for RecvStream {
	async fn read(&mut self, buf: &mut BytesMut) -> Result<Option<usize>, TransportError> {
		loop {
			let notify = {
				let state = self.state.lock();

				if !state.buffer.is_empty() {
					let size = state.buffer.len();
					let mut state = state.into_mut();
					let data = state.buffer.split();
					buf.extend_from_slice(&data);
					return Ok(Some(size));
				}

				if let Some(code) = state.reset {
					return Err(TransportError::Reset(code));
				}

				if state.fin {
					return Ok(None);
				}

				state.changed()
			};

			notify.await
		}
	}

	async fn read_chunk(&mut self, max: usize) -> Result<Option<Bytes>, TransportError> {
		loop {
			let notify = {
				let state = self.state.lock();

				if !state.buffer.is_empty() {
					let size = state.buffer.len().min(max);
					return Ok(Some(state.into_mut().buffer.split_to(size).freeze()));
				}

				if let Some(code) = state.reset {
					return Err(TransportError::Reset(code));
				}

				if state.fin {
					return Ok(None);
				}

				state.changed()
			};

			notify.await
		}
	}

	fn stop(&mut self, code: u64) {
		self.state.lock_mut().stopped = Some(code);
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::transport::{RecvStream as _, SendStream as _, Session as _};

	#[tokio::test]
	async fn uni_stream() {
		let (client, server) = pair();

		let mut send = client.open_uni().await.unwrap();
		send.write(b"hello").await.unwrap();
		send.finish();

		let mut recv = server.accept_uni().await.unwrap();
		let mut buf = BytesMut::new();
		assert_eq!(recv.read(&mut buf).await.unwrap(), Some(5));
		assert_eq!(&buf[..], b"hello");
		assert_eq!(recv.read(&mut buf).await.unwrap(), None);
	}

	#[tokio::test]
	async fn reset_on_drop() {
		let (client, server) = pair();

		let send = client.open_uni().await.unwrap();
		drop(send);

		let mut recv = server.accept_uni().await.unwrap();
		let mut buf = BytesMut::new();
		assert_eq!(recv.read(&mut buf).await, Err(TransportError::Reset(0)));
	}

	#[tokio::test]
	async fn datagrams() {
		let (client, server) = pair();

		client.send_datagram(Bytes::from_static(b"dgram")).await.unwrap();
		assert_eq!(server.recv_datagram().await.unwrap(), Bytes::from_static(b"dgram"));
	}
}
