//! Implements the AMQP 0.9.1 connection
//!
//! A [`Connection`] owns the [`Transport`], the channel registry, the channel id
//! allocator and, once a non-zero heartbeat is negotiated, the heartbeat sender.
//! Every method takes `&self` so that one connection can be shared behind an `Arc`
//! by tasks driving independent channels.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use bytes::Bytes;
use ferrule_amqp_types::{
    definitions::reply_code::REPLY_SUCCESS,
    methods::{basic::Publish, channel, connection},
    BasicProperties, FieldTable, FieldValue, Method,
};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, instrument, trace, warn};

use crate::{
    channel::{AllocError, Channel, ChannelIdAllocator, ChannelRegistry},
    frames::{content_frameset, Frame, FrameBody},
    sasl_profile::PLAIN,
    transport::{protocol_header::ProtocolHeader, Transport},
    util::with_timeout,
};

mod builder;
pub use builder::*;

mod error;
pub use error::*;

pub mod heartbeat;
use heartbeat::HeartbeatSender;

mod state;
pub use state::ConnectionState;
use state::StateCell;

const CLOSE_REPLY_TEXT: &str = "Goodbye";

/// Values agreed with the broker in Connection.Tune / Connection.TuneOk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// Highest usable channel id, 0 means no limit
    pub channel_max: u16,

    /// Largest frame either side may send, 0 means no limit
    pub frame_max: u32,

    /// Heartbeat period in seconds, 0 disables heartbeats
    pub heartbeat: u16,
}

impl Tuning {
    fn requested(options: &OpenOptions) -> Self {
        Self {
            channel_max: options.channel_max,
            frame_max: options.frame_max,
            heartbeat: options.heartbeat.unwrap_or(0),
        }
    }

    /// frame-max: the broker's value, or the client's when the broker sends 0.
    /// channel-max: the smaller of the non-zero values.
    /// heartbeat: the client's value unless the client left it to the broker.
    pub fn negotiate(options: &OpenOptions, tune: &connection::Tune) -> Self {
        let frame_max = match tune.frame_max {
            0 => options.frame_max,
            server => server,
        };
        let channel_max = match (options.channel_max, tune.channel_max) {
            (0, server) => server,
            (client, 0) => client,
            (client, server) => client.min(server),
        };
        let heartbeat = options.heartbeat.unwrap_or(tune.heartbeat);
        Self {
            channel_max,
            frame_max,
            heartbeat,
        }
    }
}

/// What the broker announced in Connection.Start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerProperties {
    /// Protocol major version
    pub version_major: u8,

    /// Protocol minor version
    pub version_minor: u8,

    /// Server properties table
    pub properties: FieldTable,

    /// Offered SASL mechanisms
    pub mechanisms: Vec<String>,

    /// Offered locales
    pub locales: Vec<String>,
}

impl ServerProperties {
    fn from_start(start: connection::Start) -> Self {
        Self {
            version_major: start.version_major,
            version_minor: start.version_minor,
            mechanisms: start.mechanism_list(),
            locales: start.locale_list(),
            properties: start.server_properties,
        }
    }

    /// The `capabilities` table nested in the server properties
    pub fn capabilities(&self) -> FieldTable {
        match self.properties.get("capabilities") {
            Some(FieldValue::FieldTable(table)) => table.clone(),
            _ => FieldTable::new(),
        }
    }

    /// Whether the broker announces `capability` as enabled
    pub fn has_capability(&self, capability: &str) -> bool {
        matches!(
            self.capabilities().get(capability),
            Some(FieldValue::Boolean(true))
        )
    }
}

/// An AMQP 0.9.1 connection
#[derive(Debug)]
pub struct Connection {
    options: OpenOptions,
    transport: Arc<Transport>,
    state: StateCell,
    channels: ChannelRegistry,
    allocator: ChannelIdAllocator,
    tuning: Mutex<Tuning>,
    server: Mutex<ServerProperties>,
    heartbeat: Mutex<Option<HeartbeatSender>>,
    default_channel: Mutex<Option<Arc<Channel>>>,
    blocked: AtomicBool,

    // One reader at a time. Frames read on behalf of another channel wait in
    // `pending` and `queued` wakes their readers
    read_gate: tokio::sync::Mutex<()>,
    pending: Mutex<VecDeque<Frame>>,
    queued: Notify,
}

impl Connection {
    /// Creates a builder for [`Connection`]
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Creates a connection in state [`ConnectionState::NotConnected`] over `transport`.
    /// Nothing is sent until [`Connection::start`].
    pub fn new(options: OpenOptions, transport: Transport) -> Self {
        Self {
            tuning: Mutex::new(Tuning::requested(&options)),
            allocator: ChannelIdAllocator::with_channel_max(options.channel_max),
            options,
            transport: Arc::new(transport),
            state: StateCell::new(),
            channels: ChannelRegistry::new(),
            server: Mutex::new(ServerProperties::default()),
            heartbeat: Mutex::new(None),
            default_channel: Mutex::new(None),
            blocked: AtomicBool::new(false),
            read_gate: tokio::sync::Mutex::new(()),
            pending: Mutex::new(VecDeque::new()),
            queued: Notify::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether the handshake completed and the connection has not been closed since
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Options the connection was created with
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    /// Whether the underlying stream is encrypted
    pub fn uses_tls(&self) -> bool {
        self.transport.uses_tls()
    }

    /// Negotiated values. Before Connection.Tune these are the requested ones.
    pub fn tuning(&self) -> Tuning {
        *self.tuning.lock()
    }

    /// Negotiated frame-max
    pub fn frame_max(&self) -> u32 {
        self.tuning().frame_max
    }

    /// Negotiated channel-max
    pub fn channel_max(&self) -> u16 {
        self.tuning().channel_max
    }

    /// Negotiated heartbeat period in seconds
    pub fn heartbeat(&self) -> u16 {
        self.tuning().heartbeat
    }

    /// What the broker announced in Connection.Start
    pub fn server_properties(&self) -> ServerProperties {
        self.server.lock().clone()
    }

    /// Capabilities announced by the broker
    pub fn capabilities(&self) -> FieldTable {
        self.server.lock().capabilities()
    }

    /// SASL mechanisms offered by the broker
    pub fn mechanisms(&self) -> Vec<String> {
        self.server.lock().mechanisms.clone()
    }

    /// Locales offered by the broker
    pub fn locales(&self) -> Vec<String> {
        self.server.lock().locales.clone()
    }

    /// Whether the broker reported with Connection.Blocked that it stopped
    /// accepting publishes
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Whether the heartbeat sender is running
    pub fn is_sending_heartbeats(&self) -> bool {
        self.heartbeat
            .lock()
            .as_ref()
            .map(HeartbeatSender::is_running)
            .unwrap_or(false)
    }

    /// Looks up a registered channel. Channel 0 is always present.
    pub fn channel(&self, id: u16) -> Option<Arc<Channel>> {
        self.channels.get(id)
    }

    /// Ids of the registered channels other than 0
    pub fn channel_ids(&self) -> Vec<u16> {
        self.channels.channel_ids()
    }

    /// The channel opened at the end of the handshake
    pub fn default_channel(&self) -> Option<Arc<Channel>> {
        self.default_channel.lock().clone()
    }

    /// Performs the handshake: protocol header, Start/StartOk, Tune/TuneOk and
    /// Open/OpenOk. Then starts the heartbeat sender if a heartbeat was agreed
    /// and opens the default channel.
    ///
    /// On failure the connection is torn down and left [`ConnectionState::Closed`].
    #[instrument(skip_all, fields(host = %self.options.host, vhost = %self.options.vhost))]
    pub async fn start(&self) -> Result<(), Error> {
        self.state.transition(ConnectionState::Connecting)?;
        match self.handshake().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "handshake failed");
                self.force_close().await;
                Err(err)
            }
        }
    }

    async fn handshake(&self) -> Result<(), Error> {
        let timeout = self.options.disconnect_timeout;
        self.transport
            .send_protocol_header(ProtocolHeader::amqp())
            .await?;

        let start = match with_timeout(timeout, self.read_method(0, "connection.start")).await? {
            Method::ConnectionStart(start) => start,
            other => return Err(unexpected_method(0, "connection.start", &other)),
        };
        let server = ServerProperties::from_start(start);
        if !server.mechanisms.iter().any(|m| m == PLAIN) {
            return Err(Error::UnsupportedMechanism {
                offered: server.mechanisms,
            });
        }
        *self.server.lock() = server;
        self.state.transition(ConnectionState::Connected)?;

        let profile = &self.options.sasl_profile;
        let start_ok = connection::StartOk {
            client_properties: self.options.client_properties.clone(),
            mechanism: profile.mechanism().to_string(),
            response: profile.initial_response(),
            locale: self.options.locale.clone(),
        };
        let tune = self
            .handshake_step(Frame::method(0, start_ok), "connection.tune")
            .await?;
        let tune = match tune {
            Method::ConnectionTune(tune) => tune,
            other => return Err(unexpected_method(0, "connection.tune", &other)),
        };

        let tuning = Tuning::negotiate(&self.options, &tune);
        debug!(?tuning, "tuned");
        *self.tuning.lock() = tuning;
        self.transport
            .set_max_frame_size(match tuning.frame_max {
                0 => None,
                frame_max => Some(frame_max as usize),
            })
            .await;
        self.allocator.set_channel_max(tuning.channel_max);
        self.send_frame(Frame::method(
            0,
            connection::TuneOk {
                channel_max: tuning.channel_max,
                frame_max: tuning.frame_max,
                heartbeat: tuning.heartbeat,
            },
        ))
        .await
        .map_err(|err| self.possible_authentication_failure(err))?;

        let open = connection::Open {
            virtual_host: self.options.vhost.clone(),
        };
        match self
            .handshake_step(Frame::method(0, open), "connection.open-ok")
            .await?
        {
            Method::ConnectionOpenOk(_) => {}
            other => return Err(unexpected_method(0, "connection.open-ok", &other)),
        }
        self.state.transition(ConnectionState::Open)?;

        if tuning.heartbeat > 0 {
            let period = Duration::from_secs(u64::from(tuning.heartbeat));
            let sender = HeartbeatSender::start(self.transport.clone(), period);
            *self.heartbeat.lock() = Some(sender);
        }

        let channel = self.create_channel(None).await?;
        *self.default_channel.lock() = Some(channel);
        Ok(())
    }

    /// Sends `frame` and waits for the reply on channel 0. A broker that rejects
    /// the credentials closes the socket instead of replying.
    async fn handshake_step(&self, frame: Frame, expected: &'static str) -> Result<Method, Error> {
        let step = async {
            self.send_frame(frame).await?;
            self.read_method(0, expected).await
        };
        with_timeout(self.options.disconnect_timeout, step)
            .await
            .map_err(|err| self.possible_authentication_failure(err))
    }

    fn possible_authentication_failure(&self, err: Error) -> Error {
        match err.is_silent_disconnect() {
            true => Error::PossibleAuthenticationFailure {
                username: self.options.sasl_profile.username().to_string(),
                vhost: self.options.vhost.clone(),
                password_length: self.options.sasl_profile.password_len(),
            },
            false => err,
        }
    }

    /// Opens a channel. With `Some(id)` the channel number is chosen by the caller
    /// and an already registered channel with that number is returned as is. An id
    /// whose Channel.Open is still in flight on another task fails with
    /// [`AllocError::InUse`].
    ///
    /// Failure to get Channel.OpenOk in time is reported as [`Error::ClientTimeout`];
    /// the id is released and nothing is registered.
    pub async fn create_channel(&self, id: Option<u16>) -> Result<Arc<Channel>, Error> {
        self.state.expect(ConnectionState::Open)?;
        let id = match id {
            Some(0) => return Err(AllocError::Reserved.into()),
            Some(id) => {
                if let Some(channel) = self.channels.get(id) {
                    return Ok(channel);
                }
                match self.allocator.reserve(id) {
                    Ok(()) => id,
                    // Opened by another task since the lookup above
                    Err(err @ AllocError::InUse(_)) => {
                        return self.channels.get(id).ok_or_else(|| err.into())
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            None => self.allocator.allocate()?,
        };

        match self.open_channel(id).await {
            Ok(()) => {
                let channel = Arc::new(Channel::new(id));
                channel.set_open(true);
                debug!(channel = id, "channel opened");
                Ok(self.channels.insert(channel))
            }
            Err(err) => {
                if let Err(release) = self.allocator.release(id) {
                    trace!(channel = id, error = %release, "channel id already released");
                }
                match err.is_silent_disconnect() {
                    true => Err(Error::ClientTimeout),
                    false => Err(err),
                }
            }
        }
    }

    async fn open_channel(&self, id: u16) -> Result<(), Error> {
        let step = async {
            self.send_frame(Frame::method(id, channel::Open)).await?;
            self.read_method(id, "channel.open-ok").await
        };
        match with_timeout(self.options.disconnect_timeout, step).await? {
            Method::ChannelOpenOk(_) => Ok(()),
            other => Err(unexpected_method(id, "channel.open-ok", &other)),
        }
    }

    /// Closes a channel with reply code 200, then unregisters it and releases its
    /// id. Closing a channel that is no longer registered is a no-op.
    pub async fn close_channel(&self, channel: &Channel) -> Result<(), Error> {
        let id = channel.id();
        if id == 0 {
            return Err(AllocError::Reserved.into());
        }
        if !self.channels.contains(id) {
            return Ok(());
        }
        self.state.expect(ConnectionState::Open)?;

        let close = channel::Close {
            reply_code: REPLY_SUCCESS,
            reply_text: CLOSE_REPLY_TEXT.to_string(),
            class_id: 0,
            method_id: 0,
        };
        let step = async {
            self.send_frame(Frame::method(id, close)).await?;
            self.read_method(id, "channel.close-ok").await
        };
        match with_timeout(self.options.disconnect_timeout, step).await {
            Ok(Method::ChannelCloseOk(_)) => {}
            // Both sides closed at the same time
            Err(Error::ChannelClosedByBroker { .. }) => {}
            Ok(other) => return Err(unexpected_method(id, "channel.close-ok", &other)),
            Err(err) => return Err(err),
        }

        self.forget_channel(id);
        debug!(channel = id, "channel closed");
        Ok(())
    }

    fn forget_channel(&self, id: u16) {
        if let Some(channel) = self.channels.remove(id) {
            channel.set_open(false);
        }
        if let Err(err) = self.allocator.release(id) {
            trace!(channel = id, error = %err, "channel id already released");
        }
        let mut default_channel = self.default_channel.lock();
        if default_channel.as_ref().map(|c| c.id()) == Some(id) {
            *default_channel = None;
        }
    }

    /// Closes every open channel other than 0.
    ///
    /// A channel level failure does not stop the remaining channels from being
    /// closed. A connection level failure (timeout, reset, framing) does, since
    /// the remaining exchanges could not succeed either. The first error is returned.
    pub async fn close_all_channels(&self) -> Result<(), Error> {
        let mut first_error = None;
        for id in self.channels.channel_ids() {
            let channel = match self.channels.get(id) {
                Some(channel) if channel.is_open() => channel,
                _ => continue,
            };
            if let Err(err) = self.close_channel(&channel).await {
                warn!(channel = id, error = %err, "failed to close channel");
                let abort = err.is_connection_level();
                first_error.get_or_insert(err);
                if abort {
                    break;
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Closes the connection: every channel, then Connection.Close / CloseOk,
    /// then the heartbeat sender and the transport. A no-op if the transport is
    /// already closed.
    ///
    /// The connection always ends [`ConnectionState::Closed`]. The first error met
    /// on the way is returned.
    #[instrument(skip_all)]
    pub async fn close(&self) -> Result<(), Error> {
        if !self.transport.is_open() {
            return Ok(());
        }

        let mut result = Ok(());
        if self.state() == ConnectionState::Open {
            let channels = self.close_all_channels().await;
            let proceed = !matches!(&channels, Err(err) if err.is_connection_level());
            result = channels;

            if proceed && self.state.transition(ConnectionState::Closing).is_ok() {
                result = result.and(self.exchange_close().await);
            }
        }

        self.teardown().await;
        result
    }

    async fn exchange_close(&self) -> Result<(), Error> {
        let close = connection::Close {
            reply_code: REPLY_SUCCESS,
            reply_text: CLOSE_REPLY_TEXT.to_string(),
            class_id: 0,
            method_id: 0,
        };
        self.send_frame(Frame::method(0, close)).await?;

        let wait_close_ok = async {
            loop {
                let frame = self.next_frame_for(0).await?;
                let channel = frame.channel;
                match frame.body {
                    FrameBody::Method(Method::ConnectionCloseOk(_)) if channel == 0 => {
                        return Ok(())
                    }
                    FrameBody::Method(Method::ConnectionClose(_)) if channel == 0 => {
                        self.send_frame(Frame::method(0, connection::CloseOk))
                            .await?;
                        return Ok(());
                    }
                    body => trace!(channel, frame = ?body, "discarding frame while closing"),
                }
            }
        };
        with_timeout(self.options.disconnect_timeout, wait_close_ok).await
    }

    /// Tears the connection down without talking to the broker: unregisters
    /// every channel, stops the heartbeat sender and closes the transport.
    pub async fn force_close(&self) {
        if self.state() != ConnectionState::Closed {
            warn!("forcing connection close");
        }
        self.teardown().await;
    }

    async fn teardown(&self) {
        self.state.close();
        // Stop the heartbeat before the transport goes away
        let heartbeat = self.heartbeat.lock().take();
        if let Some(mut heartbeat) = heartbeat {
            heartbeat.stop().await;
        }
        self.transport.close(self.options.disconnect_timeout).await;
        self.channels.clear();
        self.allocator.reset();
        self.pending.lock().clear();
        *self.default_channel.lock() = None;
    }

    /// Writes one frame. Fails with [`Error::ConnectionClosed`] before any I/O if
    /// the connection is not started or already closed.
    pub async fn send_frame(&self, frame: Frame) -> Result<(), Error> {
        if !self.state().can_send() {
            return Err(Error::ConnectionClosed);
        }
        self.transport.write_frame(frame).await.map_err(Into::into)
    }

    /// Writes frames as one unit. No other frameset on the same channel is
    /// written in between.
    pub async fn send_frameset(
        &self,
        frames: impl IntoIterator<Item = Frame>,
        channel: &Channel,
    ) -> Result<(), Error> {
        if !self.state().can_send() {
            return Err(Error::ConnectionClosed);
        }
        let _frameset = channel.lock_frameset().await;
        for frame in frames {
            debug_assert_eq!(frame.channel, channel.id());
            self.send_frame(frame).await?;
        }
        Ok(())
    }

    /// Writes a Basic.Publish followed by its content header and body, splitting
    /// the body to fit the negotiated frame-max
    pub async fn send_content(
        &self,
        channel: &Channel,
        publish: Publish,
        properties: BasicProperties,
        body: Bytes,
    ) -> Result<(), Error> {
        let frames = content_frameset(channel.id(), publish, properties, body, self.frame_max());
        self.send_frameset(frames, channel).await
    }

    /// Reads the next frame sent on `channel`, waiting at most `timeout` if one
    /// is given. Frames for other channels stay queued for their own readers.
    ///
    /// Frames on `channel` are returned as they are. Reading on any other channel
    /// answers the connection level notices on channel 0 along the way: heartbeats
    /// are skipped, Blocked/Unblocked are recorded and a Connection.Close is
    /// acknowledged and reported as [`Error::RemoteClose`].
    pub async fn read_next_frame(
        &self,
        channel: &Channel,
        timeout: Option<Duration>,
    ) -> Result<Frame, Error> {
        let id = channel.id();
        let read = async {
            loop {
                let frame = self.next_frame_for(id).await?;
                if frame.channel == id {
                    return Ok(frame);
                }
                self.on_connection_notice(frame).await?;
            }
        };
        match timeout {
            Some(timeout) => with_timeout(timeout, read).await,
            None => read.await,
        }
    }

    /// Reads until a frame for `channel` or a connection level notice arrives.
    /// Frames for other channels are kept for their readers.
    ///
    /// Only the holder of the read gate reads from the socket, one frame at a
    /// time. The others wait for either the gate or a frame being queued, so a
    /// reader blocked on a quiet channel never holds back a reply it queued.
    async fn next_frame_for(&self, channel: u16) -> Result<Frame, Error> {
        loop {
            let queued = self.queued.notified();
            tokio::pin!(queued);
            // Registered before looking so that no notification is missed
            queued.as_mut().enable();
            if let Some(frame) = self.take_pending(channel) {
                return Ok(frame);
            }

            tokio::select! {
                _gate = self.read_gate.lock() => {
                    if let Some(frame) = self.take_pending(channel) {
                        return Ok(frame);
                    }
                    let frame = self.transport.read_next_frame(None).await?;
                    if frame.channel == channel || is_connection_notice(&frame) {
                        return Ok(frame);
                    }
                    trace!(channel = frame.channel, "keeping frame for another reader");
                    self.pending.lock().push_back(frame);
                    self.queued.notify_waiters();
                }
                _ = &mut queued => {}
            }
        }
    }

    fn take_pending(&self, channel: u16) -> Option<Frame> {
        let mut pending = self.pending.lock();
        let index = pending.iter().position(|frame| frame.channel == channel)?;
        pending.remove(index)
    }

    /// Waits for the next method on `channel`, answering what the broker may
    /// send at any time: heartbeats are skipped, Blocked/Unblocked are recorded,
    /// Connection.Close and Channel.Close are acknowledged and reported as errors.
    async fn read_method(&self, channel: u16, expected: &'static str) -> Result<Method, Error> {
        loop {
            let frame = self.next_frame_for(channel).await?;
            let frame_channel = frame.channel;
            let method = match frame.body {
                FrameBody::Heartbeat => continue,
                FrameBody::Method(method) => method,
                body => {
                    return Err(Error::UnexpectedFrame {
                        channel: frame_channel,
                        expected,
                        found: describe_body(&body),
                    })
                }
            };

            match method {
                method @ (Method::ConnectionClose(_)
                | Method::ConnectionBlocked(_)
                | Method::ConnectionUnblocked(_))
                    if frame_channel == 0 =>
                {
                    self.on_connection_notice(Frame::method(0, method)).await?
                }
                Method::ChannelClose(close) if frame_channel != 0 => {
                    debug!(
                        channel = frame_channel,
                        reply_code = close.reply_code,
                        reply_text = %close.reply_text,
                        "channel closed by broker"
                    );
                    self.send_frame(Frame::method(frame_channel, channel::CloseOk))
                        .await?;
                    if let Some(channel) = self.channels.get(frame_channel) {
                        channel.set_open(false);
                    }
                    return Err(Error::ChannelClosedByBroker {
                        channel: frame_channel,
                        reply_code: close.reply_code,
                        reply_text: close.reply_text,
                    });
                }
                method => return Ok(method),
            }
        }
    }

    /// Handles a frame that [`is_connection_notice`] accepts
    async fn on_connection_notice(&self, frame: Frame) -> Result<(), Error> {
        match frame.body {
            FrameBody::Method(Method::ConnectionClose(close)) => {
                warn!(
                    reply_code = close.reply_code,
                    reply_text = %close.reply_text,
                    "connection closed by broker"
                );
                if let Err(err) = self
                    .send_frame(Frame::method(0, connection::CloseOk))
                    .await
                {
                    trace!(error = %err, "could not acknowledge connection.close");
                }
                self.teardown().await;
                Err(Error::RemoteClose {
                    reply_code: close.reply_code,
                    reply_text: close.reply_text,
                    class_id: close.class_id,
                    method_id: close.method_id,
                })
            }
            FrameBody::Method(Method::ConnectionBlocked(blocked)) => {
                debug!(reason = %blocked.reason, "connection blocked");
                self.blocked.store(true, Ordering::Release);
                Ok(())
            }
            FrameBody::Method(Method::ConnectionUnblocked(_)) => {
                debug!("connection unblocked");
                self.blocked.store(false, Ordering::Release);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn is_connection_notice(frame: &Frame) -> bool {
    frame.channel == 0
        && matches!(
            frame.body,
            FrameBody::Heartbeat
                | FrameBody::Method(Method::ConnectionClose(_))
                | FrameBody::Method(Method::ConnectionBlocked(_))
                | FrameBody::Method(Method::ConnectionUnblocked(_))
        )
}

fn describe_body(body: &FrameBody) -> String {
    match body {
        FrameBody::Method(method) => method.name().to_string(),
        FrameBody::Header(_) => String::from("content header"),
        FrameBody::Body(_) => String::from("content body"),
        FrameBody::Heartbeat => String::from("heartbeat"),
    }
}

fn unexpected_method(channel: u16, expected: &'static str, found: &Method) -> Error {
    Error::UnexpectedFrame {
        channel,
        expected,
        found: found.name().to_string(),
    }
}
