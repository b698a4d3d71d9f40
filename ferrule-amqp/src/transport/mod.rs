//! Implements low level transport framing
//!
//! The byte stream is split into a read half and a write half, each wrapped by the
//! [`FrameCodec`] and guarded by its own async mutex. Readers and writers therefore
//! never block each other, and every frame is written to the socket as a whole.
//!
//! Until a frame-max is negotiated both directions are limited to
//! [`FRAME_MIN_SIZE`] octets per frame.

pub mod error;
pub mod protocol_header;

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use ferrule_amqp_types::definitions::FRAME_MIN_SIZE;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{instrument, trace};

use crate::frames::{Frame, FrameCodec};

pub use error::Error;
use protocol_header::ProtocolHeader;

type BoxedRead = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;

/// A framed byte stream to the broker
pub struct Transport {
    reader: Mutex<FramedRead<BoxedRead, FrameCodec>>,
    writer: Mutex<FramedWrite<BoxedWrite, FrameCodec>>,
    open: AtomicBool,
    tls: bool,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("open", &self.is_open())
            .field("tls", &self.tls)
            .finish()
    }
}

impl Transport {
    /// Opens a TCP connection to `host:port`
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, Error> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Error::Timeout)??;
        stream.set_nodelay(true)?;
        Ok(Self::bind(stream, false))
    }

    /// Wraps an established byte stream. `uses_tls` records whether the stream
    /// is encrypted.
    pub fn bind<Io>(io: Io, uses_tls: bool) -> Self
    where
        Io: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(io);
        let reader: BoxedRead = Box::new(reader);
        let writer: BoxedWrite = Box::new(writer);
        // Prior to any explicit negotiation
        let codec = FrameCodec::with_max_frame_size(FRAME_MIN_SIZE as usize);
        Self {
            reader: Mutex::new(FramedRead::new(reader, codec.clone())),
            writer: Mutex::new(FramedWrite::new(writer, codec)),
            open: AtomicBool::new(true),
            tls: uses_tls,
        }
    }

    /// Whether the transport has not been closed locally
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Whether the underlying stream is encrypted
    pub fn uses_tls(&self) -> bool {
        self.tls
    }

    /// Writes the raw protocol header that starts every connection
    pub async fn send_protocol_header(&self, header: ProtocolHeader) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::Closed);
        }
        let buf: [u8; 8] = header.into();
        let mut writer = self.writer.lock().await;
        writer.get_mut().write_all(&buf).await?;
        writer.get_mut().flush().await?;
        trace!(header = ?header, "protocol header sent");
        Ok(())
    }

    /// Applies a negotiated frame-max to both directions. `None` removes the limit.
    pub async fn set_max_frame_size(&self, max_frame_size: Option<usize>) {
        self.writer
            .lock()
            .await
            .encoder_mut()
            .set_max_frame_size(max_frame_size);
        self.reader
            .lock()
            .await
            .decoder_mut()
            .set_max_frame_size(max_frame_size);
    }

    /// Encodes and writes one frame
    #[instrument(name = "SEND", skip_all)]
    pub async fn write_frame(&self, frame: Frame) -> Result<(), Error> {
        if !self.is_open() {
            return Err(Error::Closed);
        }
        trace!(channel = frame.channel, frame = ?frame.body);
        let mut writer = self.writer.lock().await;
        writer.send(frame).await.map_err(Into::into)
    }

    /// Reads the next complete frame, waiting at most `timeout` if one is given
    #[instrument(name = "RECV", skip_all)]
    pub async fn read_next_frame(&self, timeout: Option<Duration>) -> Result<Frame, Error> {
        let mut reader = self.reader.lock().await;
        let next = match timeout {
            Some(duration) => tokio::time::timeout(duration, reader.next())
                .await
                .map_err(|_| Error::Timeout)?,
            None => reader.next().await,
        };
        match next {
            Some(Ok(frame)) => {
                trace!(channel = frame.channel, frame = ?frame.body);
                Ok(frame)
            }
            Some(Err(err)) => Err(err.into()),
            None => Err(Error::EmptyResponse),
        }
    }

    /// Flushes and shuts down the write half, giving up after `timeout` if a
    /// writer is stuck on a peer that stopped reading. Closing an already closed
    /// transport is a no-op.
    pub async fn close(&self, timeout: Duration) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        let shutdown = async {
            let mut writer = self.writer.lock().await;
            SinkExt::<Frame>::close(&mut *writer).await
        };
        match tokio::time::timeout(timeout, shutdown).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => trace!(error = ?err, "error while shutting down transport"),
            Err(_) => trace!(?timeout, "transport shutdown timed out"),
        }
    }
}
