use bytes::{Bytes, BytesMut};

use moqt::data::{ForwardPreference, GroupHeader, GroupObject, ObjectStatus};
use moqt::message::{self, GroupOrder, Message};
use moqt::serve::ServeError;
use moqt::session::{
	Publisher, PublishHeader, Reader, Session, SessionError, SubscribeRequest, Subscriber, Writer,
};
use moqt::setup;
use moqt::transport::mem;
use moqt::transport::{RecvStream as _, SendStream as _, Session as _};
use moqt::Encode;

type Client = (
	Session<mem::Session>,
	Option<Publisher<mem::Session>>,
	Option<Subscriber<mem::Session>>,
);

// A client/server pair with both sessions running.
async fn connected() -> (Client, Client) {
	let _ = env_logger::builder().is_test(true).try_init();

	let (client, server) = mem::pair();
	let (client, server) = tokio::join!(Session::connect(client), Session::accept(server));

	(client.unwrap(), server.unwrap())
}

// A client session against a hand-rolled peer speaking the raw wire format.
async fn connected_raw() -> (Client, mem::Session, Writer<mem::SendStream>, Reader<mem::RecvStream>) {
	let _ = env_logger::builder().is_test(true).try_init();

	let (client, server) = mem::pair();

	let (client, peer) = tokio::join!(Session::connect(client), async move {
		let (send, recv) = server.accept_bi().await.unwrap();
		let mut sender = Writer::new(send);
		let mut recver = Reader::new(recv);

		let client: setup::Client = recver.decode().await.unwrap();
		assert!(client.versions.contains(&setup::Version::DRAFT_06));

		sender
			.encode(&setup::Server {
				version: setup::Version::DRAFT_06,
				role: setup::Role::Both,
				params: Default::default(),
			})
			.await
			.unwrap();

		(server, sender, recver)
	});

	let (server, sender, recver) = peer;

	(client.unwrap(), server, sender, recver)
}

#[tokio::test]
async fn setup_handshake() {
	let ((client, client_pub, client_sub), (server, server_pub, server_sub)) = connected().await;

	// Both roles survive a Both/Both handshake.
	assert!(client_pub.is_some() && client_sub.is_some());
	assert!(server_pub.is_some() && server_sub.is_some());

	drop((client, server));
}

#[tokio::test]
async fn setup_single_version() {
	let _ = env_logger::builder().is_test(true).try_init();

	let (client, server) = mem::pair();
	let (client, server) = tokio::join!(
		Session::connect_setup(
			client,
			setup::Role::Both,
			[setup::Version::DRAFT_01].into(),
			std::time::Duration::from_secs(5),
		),
		Session::accept(server)
	);

	client.unwrap();
	server.unwrap();
}

#[tokio::test]
async fn setup_incompatible_roles() {
	let _ = env_logger::builder().is_test(true).try_init();

	let (client, server) = mem::pair();
	let (client, server) = tokio::join!(
		Session::connect_role(client, setup::Role::Publisher),
		Session::accept_role(server, setup::Role::Publisher)
	);

	assert!(matches!(server.unwrap_err(), SessionError::RoleIncompatible(..)));

	// The server never responds, so the client times out or sees the close.
	assert!(client.is_err());
}

#[tokio::test]
async fn subscribe_single_object() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let mut request = SubscribeRequest::new("ns", "t");
	request.priority = 128;
	request.group_order = GroupOrder::OldestFirst;
	let mut subscribe = subscriber.subscribe(request).unwrap();

	let mut subscribed = publisher.subscribed().await.unwrap();
	assert_eq!(subscribed.namespace(), "ns");
	assert_eq!(subscribed.name(), "t");

	subscribed.ok(1000, GroupOrder::OldestFirst, None).unwrap();
	subscribe.ok().await.unwrap();
	assert_eq!(subscribe.group_order(), Some(GroupOrder::OldestFirst));

	publisher
		.publish(
			PublishHeader {
				subscribe_id: subscribed.id,
				track_alias: subscribed.track_alias,
				group_id: 0,
				object_id: 0,
				priority: 128,
				status: ObjectStatus::Normal,
				forward_preference: ForwardPreference::Object,
				length: None,
			},
			0,
			Bytes::from_static(b"hello"),
			true,
		)
		.await
		.unwrap();

	let mut object = subscribe.next().await.unwrap().unwrap();
	assert_eq!(object.group_id, 0);
	assert_eq!(object.object_id, 0);
	assert_eq!(object.priority, 128);
	assert_eq!(object.status, ObjectStatus::Normal);
	assert_eq!(object.payload().await.unwrap(), Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn subscribe_group_stream() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let mut subscribe = subscriber.subscribe(SubscribeRequest::new("ns", "t")).unwrap();
	let mut subscribed = publisher.subscribed().await.unwrap();
	subscribed.ok(0, GroupOrder::OldestFirst, None).unwrap();
	subscribe.ok().await.unwrap();

	let header = PublishHeader {
		subscribe_id: subscribed.id,
		track_alias: subscribed.track_alias,
		group_id: 5,
		object_id: 0,
		priority: 64,
		status: ObjectStatus::Normal,
		forward_preference: ForwardPreference::Group,
		length: Some(3),
	};

	publisher
		.publish(header.clone(), 0, Bytes::from_static(b"abc"), true)
		.await
		.unwrap();

	// A second, empty object ends the group and closes the stream.
	publisher
		.publish_status(PublishHeader {
			object_id: 1,
			status: ObjectStatus::EndOfGroup,
			length: None,
			..header
		})
		.await
		.unwrap();

	let mut first = subscribe.next().await.unwrap().unwrap();
	assert_eq!(first.group_id, 5);
	assert_eq!(first.object_id, 0);
	assert_eq!(first.size, Some(3));
	assert_eq!(first.payload().await.unwrap(), Bytes::from_static(b"abc"));

	let mut second = subscribe.next().await.unwrap().unwrap();
	assert_eq!(second.group_id, 5);
	assert_eq!(second.object_id, 1);
	assert_eq!(second.status, ObjectStatus::EndOfGroup);
	assert_eq!(second.payload().await.unwrap(), Bytes::new());

	// The stream closed but the subscription is still live.
	assert!(subscribe.done().is_none());
}

#[tokio::test]
async fn subscribe_datagram() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let mut subscribe = subscriber.subscribe(SubscribeRequest::new("ns", "t")).unwrap();
	let mut subscribed = publisher.subscribed().await.unwrap();
	subscribed.ok(0, GroupOrder::OldestFirst, None).unwrap();
	subscribe.ok().await.unwrap();

	publisher
		.publish(
			PublishHeader {
				subscribe_id: subscribed.id,
				track_alias: subscribed.track_alias,
				group_id: 2,
				object_id: 3,
				priority: 127,
				status: ObjectStatus::Normal,
				forward_preference: ForwardPreference::Datagram,
				length: None,
			},
			0,
			Bytes::from_static(b"dgram"),
			true,
		)
		.await
		.unwrap();

	let mut object = subscribe.next().await.unwrap().unwrap();
	assert_eq!(object.group_id, 2);
	assert_eq!(object.object_id, 3);
	assert_eq!(object.payload().await.unwrap(), Bytes::from_static(b"dgram"));
}

#[tokio::test]
async fn subscribe_retry_alias() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let first = subscriber.subscribe(SubscribeRequest::new("ns", "t")).unwrap();

	let subscribed = publisher.subscribed().await.unwrap();
	subscribed
		.error(message::SubscribeError::RETRY_TRACK_ALIAS, "use this alias", Some(42))
		.unwrap();

	let err = first.ok().await.unwrap_err();
	let err = match err {
		SessionError::Subscribe(err) => err,
		other => panic!("expected subscribe error: {:?}", other),
	};
	assert_eq!(err.code, message::SubscribeError::RETRY_TRACK_ALIAS);
	assert_eq!(err.retry_alias, Some(42));

	// Retry with the provided alias; the new subscription gets a fresh ID.
	let mut request = SubscribeRequest::new("ns", "t");
	request.track_alias = err.retry_alias;
	let second = subscriber.subscribe(request).unwrap();

	assert_ne!(first.id(), second.id());
	assert_eq!(second.track_alias(), 42);

	let retried = publisher.subscribed().await.unwrap();
	assert_eq!(retried.track_alias, 42);
}

#[tokio::test]
async fn announce() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let announce = publisher.announce("demo").unwrap();

	let mut announced = subscriber.announced().await.unwrap();
	assert_eq!(announced.namespace(), "demo");
	announced.ok().unwrap();

	announce.ok().await.unwrap();
}

#[tokio::test]
async fn announce_rejected() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let announce = publisher.announce("demo").unwrap();

	let mut announced = subscriber.announced().await.unwrap();
	announced.close(ServeError::NotFound).unwrap();

	let err = announce.ok().await.unwrap_err();
	assert!(matches!(err, SessionError::Announce(err) if err.code == 404));
}

#[tokio::test]
async fn track_status() {
	let ((client, _, client_sub), (server, server_pub, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();
	let mut publisher = server_pub.unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	let (status, _) = tokio::join!(subscriber.track_status("ns", "t"), async move {
		let requested = publisher.track_status_requested().await.unwrap();
		assert_eq!(requested.namespace(), "ns");
		assert_eq!(requested.name(), "t");

		requested
			.respond(message::TrackStatus {
				track_namespace: "ns".to_string(),
				track_name: "t".to_string(),
				code: message::TrackStatusCode::InProgress,
				latest: message::AbsoluteLocation::new(8, 4),
			})
			.unwrap();
	});

	let status = status.unwrap();
	assert_eq!(status.code, message::TrackStatusCode::InProgress);
	assert_eq!(status.latest, message::AbsoluteLocation::new(8, 4));
}

#[tokio::test]
async fn go_away() {
	let ((client, _, client_sub), (mut server, _, _)) = connected().await;
	let mut subscriber = client_sub.unwrap();

	server.go_away("https://elsewhere.example").unwrap();

	tokio::spawn(client.run());
	tokio::spawn(server.run());

	// Wait for the goaway to propagate to the client.
	let mut tries = 0;
	while subscriber.goaway().is_none() {
		tries += 1;
		assert!(tries < 100, "goaway never arrived");
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
	}

	assert_eq!(subscriber.goaway().unwrap().url, "https://elsewhere.example");

	// A draining session refuses new subscriptions.
	let err = subscriber.subscribe(SubscribeRequest::new("ns", "t")).unwrap_err();
	assert!(matches!(err, SessionError::GoingAway));
}

#[tokio::test]
async fn reject_unknown_subscribe_ok() {
	let ((session, _, subscriber), _peer, mut sender, mut recver) = connected_raw().await;
	let mut subscriber = subscriber.unwrap();

	let run = tokio::spawn(session.run());

	let _subscribe = subscriber.subscribe(SubscribeRequest::new("ns", "t")).unwrap();

	let msg: Message = recver.decode().await.unwrap();
	assert!(matches!(msg, Message::Subscribe(_)));

	// Answer with an ID that was never issued.
	sender
		.encode(&Message::SubscribeOk(message::SubscribeOk {
			id: 42,
			expires: 0,
			group_order: GroupOrder::OldestFirst,
			latest: None,
			params: Default::default(),
		}))
		.await
		.unwrap();

	let err = run.await.unwrap().unwrap_err();
	assert!(matches!(err, SessionError::ProtocolViolation));
}

#[tokio::test]
async fn publish_stream_reuse() {
	let ((session, publisher, _), peer, mut sender, mut recver) = connected_raw().await;
	let mut publisher = publisher.unwrap();

	tokio::spawn(session.run());

	// The raw peer subscribes with its own ID.
	sender
		.encode(&Message::Subscribe(message::Subscribe {
			id: 9,
			track_alias: 9,
			track_namespace: "ns".to_string(),
			track_name: "t".to_string(),
			priority: 64,
			group_order: GroupOrder::Default,
			filter_type: message::FilterType::LatestGroup,
			start: None,
			end: None,
			params: Default::default(),
		}))
		.await
		.unwrap();

	let mut subscribed = publisher.subscribed().await.unwrap();
	subscribed.ok(0, GroupOrder::OldestFirst, None).unwrap();

	let ok: Message = recver.decode().await.unwrap();
	assert!(matches!(ok, Message::SubscribeOk(_)));

	let header = PublishHeader {
		subscribe_id: 9,
		track_alias: 9,
		group_id: 5,
		object_id: 0,
		priority: 64,
		status: ObjectStatus::Normal,
		forward_preference: ForwardPreference::Group,
		length: Some(3),
	};

	publisher
		.publish(header.clone(), 0, Bytes::from_static(b"abc"), true)
		.await
		.unwrap();
	publisher
		.publish(
			PublishHeader {
				object_id: 1,
				length: Some(2),
				..header
			},
			0,
			Bytes::from_static(b"de"),
			true,
		)
		.await
		.unwrap();

	// Contiguous objects at the same key share a single stream,
	// byte-for-byte: header, sub-header, payload, sub-header, payload.
	let mut expected = Vec::new();
	moqt::data::Header::Group(GroupHeader {
		subscribe_id: 9,
		track_alias: 9,
		group_id: 5,
		priority: 64,
	})
	.encode(&mut expected)
	.unwrap();
	GroupObject {
		object_id: 0,
		size: 3,
		status: ObjectStatus::Normal,
	}
	.encode(&mut expected)
	.unwrap();
	expected.extend_from_slice(b"abc");
	GroupObject {
		object_id: 1,
		size: 2,
		status: ObjectStatus::Normal,
	}
	.encode(&mut expected)
	.unwrap();
	expected.extend_from_slice(b"de");

	let mut stream = peer.accept_uni().await.unwrap();
	let mut buf = BytesMut::new();
	while buf.len() < expected.len() {
		stream.read(&mut buf).await.unwrap().expect("stream ended early");
	}
	assert_eq!(&buf[..], &expected[..]);

	// No second stream was opened.
	let another = tokio::time::timeout(std::time::Duration::from_millis(50), peer.accept_uni()).await;
	assert!(another.is_err());
}

#[tokio::test]
async fn underflow_replay() {
	let _ = env_logger::builder().is_test(true).try_init();

	let (client, server) = mem::pair();

	let mut send = client.open_uni().await.unwrap();
	let recv = server.accept_uni().await.unwrap();

	let msg: Message = message::Subscribe {
		id: 1,
		track_alias: 1,
		track_namespace: "ns".to_string(),
		track_name: "t".to_string(),
		priority: 128,
		group_order: GroupOrder::OldestFirst,
		filter_type: message::FilterType::LatestObject,
		start: None,
		end: None,
		params: Default::default(),
	}
	.into();

	let mut buf = Vec::new();
	msg.encode(&mut buf).unwrap();

	let mut reader = Reader::new(recv);
	let decode = tokio::spawn(async move { reader.decode::<Message>().await });

	// Feed every byte but the last; the decoder must keep waiting.
	let (head, tail) = buf.split_at(buf.len() - 1);
	for byte in head {
		send.write(&[*byte]).await.unwrap();
		tokio::task::yield_now().await;
	}
	for _ in 0..16 {
		tokio::task::yield_now().await;
	}
	assert!(!decode.is_finished());

	// The final byte completes the frame, emitted exactly once.
	send.write(tail).await.unwrap();
	let decoded = decode.await.unwrap().unwrap();
	assert_eq!(decoded, msg);
}
