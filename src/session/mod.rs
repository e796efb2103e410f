//! The per-connection session engine.
//!
//! A [Session] owns the control stream and splits into an optional
//! [Publisher] and [Subscriber] half depending on the negotiated role.
//! Call [Session::run] to drive it; everything else happens through the halves.
mod announce;
mod announced;
mod error;
mod publisher;
mod reader;
mod subscribe;
mod subscribed;
mod subscriber;
mod track_status_requested;
mod writer;

pub use announce::*;
pub use announced::*;
pub use error::*;
pub use publisher::*;
pub use reader::*;
pub use subscribe::*;
pub use subscribed::*;
pub use subscriber::*;
pub use track_status_requested::*;
pub use writer::*;

use std::time::Duration;

use futures::{stream::FuturesUnordered, FutureExt, StreamExt};

use crate::message::{self, Message};
use crate::setup;
use crate::transport;
use crate::util::{Queue, Watch};
use crate::MoqError;

/// How long the setup exchange may take before the session is torn down.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(5);

// How long a draining session waits for in-flight activity after a GOAWAY.
const GOAWAY_TIMEOUT: Duration = Duration::from_secs(10);

// The code sent when the drain deadline passes.
const GOAWAY_CODE: u64 = 0x10;

pub struct Session<S: transport::Session> {
	webtransport: S,

	sender: Writer<S::SendStream>,
	recver: Reader<S::RecvStream>,
	outgoing: Queue<Message, SessionError>,

	publisher: Option<Publisher<S>>,
	subscriber: Option<Subscriber<S>>,

	closing: Watch<Option<message::GoAway>>,
}

impl<S: transport::Session> std::fmt::Debug for Session<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session").finish_non_exhaustive()
	}
}

impl<S: transport::Session> Session<S> {
	fn new(
		webtransport: S,
		sender: Writer<S::SendStream>,
		recver: Reader<S::RecvStream>,
		role: setup::Role,
	) -> (Self, Option<Publisher<S>>, Option<Subscriber<S>>) {
		let outgoing = Queue::default();
		let closing = Watch::new(None);

		let publisher = role
			.is_publisher()
			.then(|| Publisher::new(webtransport.clone(), outgoing.clone(), closing.clone()));
		let subscriber = role
			.is_subscriber()
			.then(|| Subscriber::new(outgoing.clone(), closing.clone()));

		let session = Self {
			webtransport,
			sender,
			recver,
			outgoing,
			publisher: publisher.clone(),
			subscriber: subscriber.clone(),
			closing,
		};

		(session, publisher, subscriber)
	}

	/// Connect as a client, with both roles and the default setup deadline.
	pub async fn connect(session: S) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		Self::connect_role(session, setup::Role::Both).await
	}

	pub async fn connect_role(
		session: S,
		role: setup::Role,
	) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		Self::connect_setup(session, role, setup::Version::SUPPORTED.into(), SETUP_TIMEOUT).await
	}

	pub async fn connect_setup(
		session: S,
		role: setup::Role,
		versions: setup::Versions,
		deadline: Duration,
	) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		let res = tokio::time::timeout(deadline, Self::connect_inner(session.clone(), role, versions))
			.await
			.unwrap_or(Err(SessionError::SetupTimeout));

		if let Err(err) = &res {
			session.close(err.code(), &err.reason());
		}

		res
	}

	async fn connect_inner(
		session: S,
		role: setup::Role,
		versions: setup::Versions,
	) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		let control = session.open_bi().await?;
		let mut sender = Writer::new(control.0);
		let mut recver = Reader::new(control.1);

		let client = setup::Client {
			versions: versions.clone(),
			role,
			params: Default::default(),
		};

		log::debug!("sending client SETUP: {:?}", client);
		sender.encode(&client).await?;

		// Only the server sends SERVER_SETUP; anything else fails to decode.
		let server: setup::Server = recver.decode().await?;
		log::debug!("received server SETUP: {:?}", server);

		if !versions.contains(&server.version) {
			return Err(SessionError::Version(versions, [server.version].into()));
		}

		let role = Self::downgrade(role, server.role)?;

		Ok(Session::new(session, sender, recver, role))
	}

	/// Accept a client, with both roles and the default setup deadline.
	pub async fn accept(session: S) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		Self::accept_role(session, setup::Role::Both).await
	}

	pub async fn accept_role(
		session: S,
		role: setup::Role,
	) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		Self::accept_setup(session, role, SETUP_TIMEOUT).await
	}

	pub async fn accept_setup(
		session: S,
		role: setup::Role,
		deadline: Duration,
	) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		let res = tokio::time::timeout(deadline, Self::accept_inner(session.clone(), role))
			.await
			.unwrap_or(Err(SessionError::SetupTimeout));

		if let Err(err) = &res {
			session.close(err.code(), &err.reason());
		}

		res
	}

	async fn accept_inner(
		session: S,
		role: setup::Role,
	) -> Result<(Self, Option<Publisher<S>>, Option<Subscriber<S>>), SessionError> {
		let control = session.accept_bi().await?;
		let mut sender = Writer::new(control.0);
		let mut recver = Reader::new(control.1);

		// Only the client sends CLIENT_SETUP; anything else fails to decode.
		let client: setup::Client = recver.decode().await?;
		log::debug!("received client SETUP: {:?}", client);

		// The client's preference order wins.
		let version = client
			.versions
			.iter()
			.copied()
			.find(|version| setup::Version::SUPPORTED.contains(version))
			.ok_or_else(|| SessionError::Version(client.versions.clone(), setup::Version::SUPPORTED.to_vec().into()))?;

		let role = Self::downgrade(role, client.role)?;

		let server = setup::Server {
			version,
			role,
			params: Default::default(),
		};

		log::debug!("sending server SETUP: {:?}", server);
		sender.encode(&server).await?;

		Ok(Session::new(session, sender, recver, role))
	}

	// Drop to a narrower role based on what the peer supports.
	fn downgrade(local: setup::Role, remote: setup::Role) -> Result<setup::Role, SessionError> {
		match remote {
			setup::Role::Both => Ok(local),
			setup::Role::Publisher => match local {
				// Both sides would only be publishing.
				setup::Role::Publisher => Err(SessionError::RoleIncompatible(local, remote)),
				_ => Ok(setup::Role::Subscriber),
			},
			setup::Role::Subscriber => match local {
				// Both sides would only be subscribing.
				setup::Role::Subscriber => Err(SessionError::RoleIncompatible(local, remote)),
				_ => Ok(setup::Role::Publisher),
			},
		}
	}

	/// Start draining the session, asking the peer to migrate.
	///
	/// No new subscriptions or announcements are accepted afterwards.
	pub fn go_away(&mut self, url: &str) -> Result<(), SessionError> {
		{
			let mut closing = self.closing.lock_mut();
			if closing.is_some() {
				return Err(SessionError::GoingAway);
			}
			*closing = Some(message::GoAway { url: url.to_string() });
		}

		self.outgoing.push(Message::GoAway(message::GoAway { url: url.to_string() }))
	}

	/// Drive the session until it fails or finishes draining.
	pub async fn run(self) -> Result<(), SessionError> {
		let Session {
			webtransport,
			sender,
			recver,
			outgoing,
			mut publisher,
			mut subscriber,
			closing,
		} = self;

		let mut tasks = FuturesUnordered::new();
		tasks.push(Self::run_send(outgoing.clone(), sender).boxed());
		tasks.push(Self::run_recv(recver, publisher.clone(), subscriber.clone(), closing.clone()).boxed());

		if let Some(subscriber) = subscriber.clone() {
			tasks.push(Self::run_streams(webtransport.clone(), subscriber.clone()).boxed());
			tasks.push(Self::run_datagrams(webtransport.clone(), subscriber).boxed());
		}

		let res = tokio::select! {
			res = tasks.next() => res.unwrap(),
			_ = Self::run_goaway(closing) => Ok(()),
		};

		// Tear down every handle so awaiters unblock.
		let err = res.clone().err().unwrap_or(SessionError::GoingAway);
		if let Some(publisher) = &mut publisher {
			publisher.close(err.clone());
		}
		if let Some(subscriber) = &mut subscriber {
			subscriber.close(err.clone());
		}
		outgoing.close(err.clone()).ok();
		webtransport.close(err.code(), &err.reason());

		res
	}

	async fn run_send(
		outgoing: Queue<Message, SessionError>,
		mut sender: Writer<S::SendStream>,
	) -> Result<(), SessionError> {
		loop {
			let msg = outgoing.pop().await?;
			sender.encode(&msg).await?;
		}
	}

	async fn run_recv(
		mut recver: Reader<S::RecvStream>,
		mut publisher: Option<Publisher<S>>,
		mut subscriber: Option<Subscriber<S>>,
		closing: Watch<Option<message::GoAway>>,
	) -> Result<(), SessionError> {
		loop {
			// Control messages are delivered in wire order; a decode error is fatal.
			let msg: Message = recver.decode().await?;
			let id = msg.id();

			// A GOAWAY starts draining the session.
			let msg = match msg {
				Message::GoAway(msg) => {
					log::info!("received goaway: url={}", msg.url);

					let mut closing = closing.lock_mut();
					if closing.is_some() {
						return Err(SessionError::ProtocolViolation);
					}
					*closing = Some(msg);
					continue;
				}
				msg => msg,
			};

			let msg = match TryInto::<message::Publisher>::try_into(msg) {
				Ok(msg) => {
					subscriber
						.as_mut()
						.ok_or(SessionError::RoleViolation(id))?
						.recv_message(msg)?;
					continue;
				}
				Err(msg) => msg,
			};

			match TryInto::<message::Subscriber>::try_into(msg) {
				Ok(msg) => {
					publisher
						.as_mut()
						.ok_or(SessionError::RoleViolation(id))?
						.recv_message(msg)?;
				}
				Err(msg) => unreachable!("unhandled message: {}", msg.name()),
			}
		}
	}

	async fn run_streams(webtransport: S, subscriber: Subscriber<S>) -> Result<(), SessionError> {
		let mut tasks = FuturesUnordered::new();

		loop {
			tokio::select! {
				res = webtransport.accept_uni() => {
					let stream = res?;
					tasks.push(Subscriber::recv_stream(subscriber.clone(), stream));
				},
				res = tasks.next(), if !tasks.is_empty() => res.unwrap()?,
			}
		}
	}

	async fn run_datagrams(webtransport: S, mut subscriber: Subscriber<S>) -> Result<(), SessionError> {
		loop {
			let datagram = webtransport.recv_datagram().await?;
			subscriber.recv_datagram(datagram).await;
		}
	}

	// Resolves once the session is draining and the deadline has passed.
	async fn run_goaway(closing: Watch<Option<message::GoAway>>) {
		loop {
			let notify = {
				let state = closing.lock();
				if state.is_some() {
					break;
				}
				state.changed()
			};

			notify.await
		}

		// Give in-flight subscriptions a chance to finish.
		tokio::time::sleep(GOAWAY_TIMEOUT).await;
		log::info!("goaway deadline passed, closing code={}", GOAWAY_CODE);
	}
}
