mod common;

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use common::{open_connection, pair, tune, Broker};
use ferrule_amqp::{
    channel::AllocError,
    connection::{Builder, Error},
    frames::{Frame, FrameBody},
    types::{
        methods::{basic::Publish, channel, connection},
        BasicProperties, ContentHeader, Method,
    },
    ConnectionState,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn handshake_happy_path() {
    let (connection, stream) = pair(Builder::new().credentials("alice", "secret").vhost("orders"));

    let (result, mut broker) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        let start_ok = broker.start().await;
        assert_eq!(start_ok.mechanism, "PLAIN");
        assert_eq!(&start_ok.response[..], b"\0alice\0secret");
        assert_eq!(start_ok.locale, "en_US");

        let tune_ok = broker.tune(tune(100, 8192, 60)).await;
        assert_eq!(tune_ok.channel_max, 100);
        assert_eq!(tune_ok.frame_max, 8192);
        assert_eq!(tune_ok.heartbeat, 0);

        let open = broker.expect_open().await;
        assert_eq!(open.virtual_host, "orders");
        broker.send(0, connection::OpenOk).await;
        assert_eq!(broker.accept_channel().await, 1);
        broker
    });
    result.unwrap();

    assert_eq!(connection.state(), ConnectionState::Open);
    assert!(connection.is_open());
    assert_eq!(connection.frame_max(), 8192);
    assert_eq!(connection.channel_max(), 100);
    assert_eq!(connection.heartbeat(), 0);
    assert!(!connection.is_sending_heartbeats());
    assert_eq!(connection.channel_ids(), vec![1]);
    assert_eq!(connection.default_channel().unwrap().id(), 1);
    assert_eq!(connection.mechanisms(), vec![String::from("PLAIN")]);
    assert_eq!(connection.locales(), vec![String::from("en_US")]);
    assert!(connection.channel(0).is_some());

    let (result, _) = tokio::join!(connection.close(), async {
        assert_eq!(broker.accept_channel_close().await, 1);
        broker.accept_close().await;
        assert!(broker.recv().await.is_none());
    });
    result.unwrap();
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.channel_ids().is_empty());
    assert!(connection.channel(0).is_some());

    // already closed
    connection.close().await.unwrap();
}

#[tokio::test]
async fn heartbeat_taken_from_broker_when_not_requested() {
    let (connection, mut broker) =
        open_connection(Builder::new().heartbeat_from_server(), tune(0, 0, 30)).await;
    assert_eq!(connection.heartbeat(), 30);
    assert_eq!(connection.frame_max(), 131_072);
    assert!(connection.is_sending_heartbeats());

    let (result, _) = tokio::join!(connection.close(), async {
        broker.accept_channel_close().await;
        broker.accept_close().await;
    });
    result.unwrap();
    assert!(!connection.is_sending_heartbeats());
}

#[tokio::test]
async fn silent_disconnect_after_start_is_possible_authentication_failure() {
    let (connection, stream) = pair(Builder::new().credentials("bob", "hunter2"));

    let (result, _) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        broker.start().await;
        drop(broker);
    });

    match result {
        Err(Error::PossibleAuthenticationFailure {
            username,
            vhost,
            password_length,
        }) => {
            assert_eq!(username, "bob");
            assert_eq!(vhost, "/");
            assert_eq!(password_length, 7);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.channel_ids().is_empty());
    assert!(matches!(
        connection.send_frame(Frame::heartbeat()).await,
        Err(Error::ConnectionClosed)
    ));
    // a failed handshake is not retried on the same connection
    assert!(matches!(
        connection.start().await,
        Err(Error::IllegalState {
            expected: ConnectionState::Connecting,
            found: ConnectionState::Closed,
        })
    ));
}

#[tokio::test]
async fn silent_disconnect_after_open_is_possible_authentication_failure() {
    let (connection, stream) = pair(Builder::new());

    let (result, _) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        broker.start().await;
        broker.tune(tune(0, 0, 0)).await;
        broker.expect_open().await;
        drop(broker);
    });

    assert!(matches!(
        result,
        Err(Error::PossibleAuthenticationFailure { .. })
    ));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.channel_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unanswered_start_ok_times_out_as_possible_authentication_failure() {
    let (connection, stream) =
        pair(Builder::new().disconnect_timeout(Duration::from_secs(5)));

    let (result, _broker) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        broker.start().await;
        broker
    });

    assert!(matches!(
        result,
        Err(Error::PossibleAuthenticationFailure { .. })
    ));
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn broker_close_during_handshake() {
    let (connection, stream) = pair(Builder::new());

    let (result, _) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        broker.start().await;
        broker
            .send(
                0,
                connection::Close {
                    reply_code: 403,
                    reply_text: "ACCESS_REFUSED".into(),
                    class_id: 10,
                    method_id: 11,
                },
            )
            .await;
        let (channel, method) = broker.recv_method().await;
        assert_eq!(channel, 0);
        assert!(matches!(method, Method::ConnectionCloseOk(_)));
    });

    match result {
        Err(Error::RemoteClose {
            reply_code,
            class_id,
            method_id,
            ..
        }) => {
            assert_eq!(reply_code, 403);
            assert_eq!((class_id, method_id), (10, 11));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn plain_not_offered() {
    let (connection, stream) = pair(Builder::new());

    let (result, _broker) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        broker
            .send(
                0,
                connection::Start {
                    mechanisms: "AMQPLAIN EXTERNAL".into(),
                    ..Default::default()
                },
            )
            .await;
        broker
    });

    match result {
        Err(Error::UnsupportedMechanism { offered }) => {
            assert_eq!(offered, vec!["AMQPLAIN", "EXTERNAL"]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn protocol_version_rejected() {
    let (connection, mut stream) = pair(Builder::new());

    let (result, _) = tokio::join!(connection.start(), async move {
        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await.unwrap();
        stream.write_all(b"AMQP\x01\x01\x00\x0a").await.unwrap();
        stream
    });

    assert!(matches!(
        result,
        Err(Error::Framing(ferrule_amqp::frames::Error::ProtocolHeaderMismatch(_)))
    ));
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn create_and_close_channels() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;

    let (explicit, id) = tokio::join!(connection.create_channel(Some(5)), broker.accept_channel());
    let explicit = explicit.unwrap();
    assert_eq!((explicit.id(), id), (5, 5));
    assert!(explicit.is_open());

    // already registered, no exchange with the broker
    let again = connection.create_channel(Some(5)).await.unwrap();
    assert!(Arc::ptr_eq(&explicit, &again));

    let (next, id) = tokio::join!(connection.create_channel(None), broker.accept_channel());
    assert_eq!((next.unwrap().id(), id), (2, 2));
    assert_eq!(connection.channel_ids(), vec![1, 2, 5]);

    let (result, id) = tokio::join!(connection.close_channel(&explicit), broker.accept_channel_close());
    result.unwrap();
    assert_eq!(id, 5);
    assert!(!explicit.is_open());
    assert_eq!(connection.channel_ids(), vec![1, 2]);

    // no longer registered
    connection.close_channel(&explicit).await.unwrap();

    assert!(matches!(
        connection.create_channel(Some(0)).await,
        Err(Error::ChannelAlloc(_))
    ));
}

#[tokio::test]
async fn broker_refuses_channel() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;

    let (result, _) = tokio::join!(connection.create_channel(None), async {
        let id = broker.expect_channel_open().await;
        broker
            .send(
                id,
                channel::Close {
                    reply_code: 504,
                    reply_text: "CHANNEL_ERROR".into(),
                    class_id: 20,
                    method_id: 10,
                },
            )
            .await;
        let (channel, method) = broker.recv_method().await;
        assert_eq!(channel, id);
        assert!(matches!(method, Method::ChannelCloseOk(_)));
    });

    assert!(matches!(
        result,
        Err(Error::ChannelClosedByBroker {
            channel: 2,
            reply_code: 504,
            ..
        })
    ));
    assert_eq!(connection.channel_ids(), vec![1]);

    // id 2 went back to the pool
    let (next, _) = tokio::join!(connection.create_channel(None), broker.accept_channel());
    assert_eq!(next.unwrap().id(), 2);
}

#[tokio::test(start_paused = true)]
async fn unanswered_channel_open_times_out() {
    let (connection, mut broker) = open_connection(
        Builder::new().disconnect_timeout(Duration::from_secs(5)),
        tune(0, 0, 0),
    )
    .await;

    let (result, id) = tokio::join!(connection.create_channel(None), broker.expect_channel_open());
    assert_eq!(id, 2);
    assert!(matches!(result, Err(Error::ClientTimeout)));
    assert_eq!(connection.channel_ids(), vec![1]);
    assert_eq!(connection.state(), ConnectionState::Open);
}

#[tokio::test]
async fn broker_closes_connection_while_open() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;

    let (result, _) = tokio::join!(connection.create_channel(None), async {
        broker.expect_channel_open().await;
        broker
            .send(
                0,
                connection::Close {
                    reply_code: 320,
                    reply_text: "CONNECTION_FORCED".into(),
                    class_id: 0,
                    method_id: 0,
                },
            )
            .await;
        let (channel, method) = broker.recv_method().await;
        assert_eq!(channel, 0);
        assert!(matches!(method, Method::ConnectionCloseOk(_)));
    });

    assert!(matches!(
        result,
        Err(Error::RemoteClose {
            reply_code: 320,
            ..
        })
    ));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.channel_ids().is_empty());
    assert!(connection.default_channel().is_none());
}

#[tokio::test]
async fn blocked_notifications_are_recorded() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;
    assert!(!connection.is_blocked());

    let (result, _) = tokio::join!(connection.create_channel(None), async {
        let id = broker.expect_channel_open().await;
        broker
            .send(
                0,
                connection::Blocked {
                    reason: "low on memory".into(),
                },
            )
            .await;
        broker.send_frame(Frame::heartbeat()).await;
        broker.send(id, channel::OpenOk).await;
    });
    result.unwrap();
    assert!(connection.is_blocked());

    let (result, _) = tokio::join!(connection.create_channel(None), async {
        let id = broker.expect_channel_open().await;
        broker.send(0, connection::Unblocked).await;
        broker.send(id, channel::OpenOk).await;
    });
    result.unwrap();
    assert!(!connection.is_blocked());
}

#[tokio::test]
async fn frames_for_other_channels_are_kept() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;

    let (result, _) = tokio::join!(connection.create_channel(Some(3)), async {
        let id = broker.expect_channel_open().await;
        broker
            .send_frame(Frame::new(1u16, FrameBody::Body(Bytes::from_static(b"early"))))
            .await;
        broker.send(id, channel::OpenOk).await;
    });
    assert_eq!(result.unwrap().id(), 3);

    let channel = connection.channel(1).unwrap();
    let frame = connection
        .read_next_frame(&channel, Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(frame.channel, 1);
    assert_eq!(frame.body, FrameBody::Body(Bytes::from_static(b"early")));
}

#[tokio::test]
async fn close_all_channels_continues_past_channel_errors() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;
    for _ in 0..2 {
        let (result, _) = tokio::join!(connection.create_channel(None), broker.accept_channel());
        result.unwrap();
    }
    assert_eq!(connection.channel_ids(), vec![1, 2, 3]);

    let (result, _) = tokio::join!(connection.close_all_channels(), async {
        // channel 1 gets a reply it cannot make sense of
        let id = broker.expect_channel_close().await;
        assert_eq!(id, 1);
        broker.send(id, channel::FlowOk { active: true }).await;
        assert_eq!(broker.accept_channel_close().await, 2);
        assert_eq!(broker.accept_channel_close().await, 3);
    });

    assert!(matches!(
        result,
        Err(Error::UnexpectedFrame { channel: 1, .. })
    ));
    assert_eq!(connection.channel_ids(), vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn framesets_on_one_channel_do_not_interleave() {
    const ROUNDS: usize = 20;

    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;
    let connection = Arc::new(connection);
    let channel = connection.default_channel().unwrap();

    let senders: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|tag| {
            let connection = connection.clone();
            let channel = channel.clone();
            tokio::spawn(async move {
                for _ in 0..ROUNDS {
                    let frames = vec![
                        Frame::method(
                            1,
                            Publish {
                                routing_key: tag.into(),
                                ..Default::default()
                            },
                        ),
                        Frame::new(
                            1u16,
                            FrameBody::Header(ContentHeader::basic(1, BasicProperties::default())),
                        ),
                        Frame::new(1u16, FrameBody::Body(Bytes::from(tag))),
                    ];
                    connection.send_frameset(frames, &channel).await.unwrap();
                }
            })
        })
        .collect();

    for _ in 0..(2 * ROUNDS) {
        let tag = match broker.recv().await.unwrap().body {
            FrameBody::Method(Method::BasicPublish(publish)) => publish.routing_key,
            other => panic!("expected basic.publish, found {:?}", other),
        };
        assert!(matches!(
            broker.recv().await.unwrap().body,
            FrameBody::Header(_)
        ));
        match broker.recv().await.unwrap().body {
            FrameBody::Body(body) => assert_eq!(&body[..], tag.as_bytes()),
            other => panic!("expected content body, found {:?}", other),
        }
    }
    for sender in senders {
        sender.await.unwrap();
    }
}

#[tokio::test]
async fn content_is_split_to_frame_max() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 4096, 0)).await;
    let channel = connection.default_channel().unwrap();
    let body = Bytes::from(vec![7u8; 10_000]);

    let (result, frames) = tokio::join!(
        connection.send_content(
            &channel,
            Publish::default(),
            BasicProperties::default(),
            body.clone()
        ),
        async {
            let mut frames = Vec::new();
            for _ in 0..5 {
                frames.push(broker.recv().await.unwrap());
            }
            frames
        }
    );
    result.unwrap();

    let chunks: Vec<usize> = frames[2..]
        .iter()
        .map(|frame| match &frame.body {
            FrameBody::Body(chunk) => chunk.len(),
            other => panic!("expected content body, found {:?}", other),
        })
        .collect();
    assert_eq!(chunks, vec![4088, 4088, 1824]);
}

#[tokio::test]
async fn send_frame_requires_a_live_connection() {
    let (connection, _stream) = pair(Builder::new());
    assert_eq!(connection.state(), ConnectionState::NotConnected);
    assert!(matches!(
        connection.send_frame(Frame::heartbeat()).await,
        Err(Error::ConnectionClosed)
    ));
    assert!(matches!(
        connection.create_channel(None).await,
        Err(Error::IllegalState { .. })
    ));

    connection.force_close().await;
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(matches!(
        connection.start().await,
        Err(Error::IllegalState { .. })
    ));
}

#[tokio::test]
async fn reader_on_one_channel_leaves_other_replies_alone() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;
    let connection = Arc::new(connection);
    let consumer_channel = connection.default_channel().unwrap();

    let consumer = {
        let connection = connection.clone();
        tokio::spawn(async move {
            connection
                .read_next_frame(&consumer_channel, Some(Duration::from_secs(5)))
                .await
        })
    };
    // the consumer now waits on the socket
    tokio::task::yield_now().await;

    let (result, _) = tokio::join!(connection.create_channel(None), async {
        let id = broker.expect_channel_open().await;
        assert_eq!(id, 2);
        broker.send(id, channel::OpenOk).await;
        broker
            .send_frame(Frame::new(1u16, FrameBody::Body(Bytes::from_static(b"late"))))
            .await;
    });
    assert_eq!(result.unwrap().id(), 2);
    assert_eq!(connection.channel_ids(), vec![1, 2]);

    let frame = consumer.await.unwrap().unwrap();
    assert_eq!(frame.channel, 1);
    assert_eq!(frame.body, FrameBody::Body(Bytes::from_static(b"late")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn channels_are_driven_from_concurrent_tasks() {
    const TASKS: usize = 8;

    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;
    let connection = Arc::new(connection);

    let broker = tokio::spawn(async move {
        let mut opened = Vec::new();
        let mut closed = Vec::new();
        while closed.len() < TASKS {
            match broker.recv_method().await {
                (id, Method::ChannelOpen(_)) => {
                    opened.push(id);
                    broker.send(id, channel::OpenOk).await;
                    let payload = Bytes::from(id.to_be_bytes().to_vec());
                    broker
                        .send_frame(Frame::new(id, FrameBody::Body(payload)))
                        .await;
                }
                (id, Method::ChannelClose(_)) => {
                    closed.push(id);
                    broker.send(id, channel::CloseOk).await;
                }
                other => panic!("unexpected method {:?}", other),
            }
        }
        (broker, opened, closed)
    });

    let drivers: Vec<_> = (0..TASKS)
        .map(|_| {
            let connection = connection.clone();
            tokio::spawn(async move {
                let channel = connection.create_channel(None).await.unwrap();
                let frame = connection
                    .read_next_frame(&channel, Some(Duration::from_secs(5)))
                    .await
                    .unwrap();
                assert_eq!(frame.channel, channel.id());
                assert_eq!(
                    frame.body,
                    FrameBody::Body(Bytes::from(channel.id().to_be_bytes().to_vec()))
                );
                connection.close_channel(&channel).await.unwrap();
                assert!(!channel.is_open());
                channel.id()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for driver in drivers {
        ids.push(driver.await.unwrap());
    }
    let (mut broker, mut opened, mut closed) = broker.await.unwrap();
    ids.sort_unstable();
    opened.sort_unstable();
    closed.sort_unstable();
    assert_eq!(ids.len(), TASKS);
    assert!(ids.iter().all(|&id| id > 1));
    assert_eq!(opened, ids);
    assert_eq!(closed, ids);
    assert_eq!(connection.channel_ids(), vec![1]);

    let (result, _) = tokio::join!(connection.close(), async {
        assert_eq!(broker.accept_channel_close().await, 1);
        broker.accept_close().await;
    });
    result.unwrap();
}

#[tokio::test]
async fn explicit_id_while_its_open_is_in_flight() {
    let (connection, mut broker) = open_connection(Builder::new(), tune(0, 0, 0)).await;

    let (first, second, _) = tokio::join!(
        connection.create_channel(Some(5)),
        connection.create_channel(Some(5)),
        async {
            assert_eq!(broker.expect_channel_open().await, 5);
            broker.send(5, channel::OpenOk).await;
        }
    );
    let first = first.unwrap();
    assert!(matches!(
        second,
        Err(Error::ChannelAlloc(AllocError::InUse(5)))
    ));

    let again = connection.create_channel(Some(5)).await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(connection.channel_ids(), vec![1, 5]);
}
