#![allow(dead_code)]

use ferrule_amqp::{
    connection::Builder,
    frames::{Frame, FrameBody, FrameCodec},
    types::{
        methods::{channel, connection},
        Method,
    },
    Connection,
};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, DuplexStream};
use tokio_util::codec::Framed;

pub const PROTOCOL_HEADER: [u8; 8] = *b"AMQP\x00\x00\x09\x01";

/// A connection over an in-memory stream, and the broker end of that stream
pub fn pair(builder: Builder) -> (Connection, DuplexStream) {
    pair_with_capacity(builder, 64 * 1024)
}

/// Like [`pair`] with `capacity` octets of buffering in each direction
pub fn pair_with_capacity(builder: Builder, capacity: usize) -> (Connection, DuplexStream) {
    let (client, server) = tokio::io::duplex(capacity);
    (builder.build_with_stream(client), server)
}

/// Scripted broker driven step by step by a test
pub struct Broker {
    framed: Framed<DuplexStream, FrameCodec>,
}

impl Broker {
    /// Reads the protocol header and switches to frames
    pub async fn accept(mut stream: DuplexStream) -> Self {
        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await.unwrap();
        assert_eq!(header, PROTOCOL_HEADER);
        Self {
            framed: Framed::new(stream, FrameCodec::new()),
        }
    }

    pub async fn send(&mut self, channel: u16, method: impl Into<Method>) {
        self.send_frame(Frame::method(channel, method)).await;
    }

    pub async fn send_frame(&mut self, frame: Frame) {
        self.framed.send(frame).await.unwrap();
    }

    /// Next frame, `None` once the client shut its side down
    pub async fn recv(&mut self) -> Option<Frame> {
        self.framed.next().await.map(|frame| frame.unwrap())
    }

    /// Next method, skipping heartbeats
    pub async fn recv_method(&mut self) -> (u16, Method) {
        loop {
            let frame = self.recv().await.expect("client closed the stream");
            match frame.body {
                FrameBody::Heartbeat => continue,
                FrameBody::Method(method) => return (frame.channel, method),
                other => panic!("expected a method, found {:?}", other),
            }
        }
    }

    pub async fn start(&mut self) -> connection::StartOk {
        self.send(0, connection::Start::default()).await;
        match self.recv_method().await {
            (0, Method::ConnectionStartOk(start_ok)) => start_ok,
            other => panic!("expected connection.start-ok, found {:?}", other),
        }
    }

    pub async fn tune(&mut self, tune: connection::Tune) -> connection::TuneOk {
        self.send(0, tune).await;
        match self.recv_method().await {
            (0, Method::ConnectionTuneOk(tune_ok)) => tune_ok,
            other => panic!("expected connection.tune-ok, found {:?}", other),
        }
    }

    pub async fn expect_open(&mut self) -> connection::Open {
        match self.recv_method().await {
            (0, Method::ConnectionOpen(open)) => open,
            other => panic!("expected connection.open, found {:?}", other),
        }
    }

    /// Start, Tune, Open and the default channel
    pub async fn handshake(&mut self, tune: connection::Tune) -> connection::TuneOk {
        self.start().await;
        let tune_ok = self.tune(tune).await;
        self.expect_open().await;
        self.send(0, connection::OpenOk).await;
        self.accept_channel().await;
        tune_ok
    }

    /// Answers the next channel.open
    pub async fn accept_channel(&mut self) -> u16 {
        let id = self.expect_channel_open().await;
        self.send(id, channel::OpenOk).await;
        id
    }

    pub async fn expect_channel_open(&mut self) -> u16 {
        match self.recv_method().await {
            (id, Method::ChannelOpen(_)) => id,
            other => panic!("expected channel.open, found {:?}", other),
        }
    }

    /// Answers the next channel.close
    pub async fn accept_channel_close(&mut self) -> u16 {
        let id = self.expect_channel_close().await;
        self.send(id, channel::CloseOk).await;
        id
    }

    pub async fn expect_channel_close(&mut self) -> u16 {
        match self.recv_method().await {
            (id, Method::ChannelClose(close)) => {
                assert_eq!(close.reply_code, 200);
                id
            }
            other => panic!("expected channel.close, found {:?}", other),
        }
    }

    /// Answers the connection.close
    pub async fn accept_close(&mut self) {
        match self.recv_method().await {
            (0, Method::ConnectionClose(close)) => {
                assert_eq!(close.reply_code, 200);
                assert_eq!(close.reply_text, "Goodbye");
            }
            other => panic!("expected connection.close, found {:?}", other),
        }
        self.send(0, connection::CloseOk).await;
    }
}

pub fn tune(channel_max: u16, frame_max: u32, heartbeat: u16) -> connection::Tune {
    connection::Tune {
        channel_max,
        frame_max,
        heartbeat,
    }
}

/// A connection that went through the whole handshake
pub async fn open_connection(builder: Builder, tune: connection::Tune) -> (Connection, Broker) {
    let (connection, stream) = pair(builder);
    handshake(connection, stream, tune).await
}

/// Runs the handshake of `connection` against a broker on `stream`
pub async fn handshake(
    connection: Connection,
    stream: DuplexStream,
    tune: connection::Tune,
) -> (Connection, Broker) {
    let (result, broker) = tokio::join!(connection.start(), async move {
        let mut broker = Broker::accept(stream).await;
        broker.handshake(tune).await;
        broker
    });
    result.unwrap();
    (connection, broker)
}
