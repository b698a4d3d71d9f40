//! Implements an asynchronous heartbeat

use std::{sync::Arc, task::Poll, time::Duration};

use futures_util::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio::{sync::oneshot, task::JoinHandle, time::Instant};
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, trace};

use crate::{frames::Frame, transport::Transport};

pin_project! {
    /// A wrapper over an `Option<IntervalStream>` which will never tick ready if the underlying
    /// `Interval` is `None`
    #[derive(Debug)]
    pub struct HeartBeat {
        #[pin]
        interval: Option<IntervalStream>
    }
}

impl HeartBeat {
    /// A [`HeartBeat`] that will never yield `Poll::Ready(_)` with `StreamExt::next()`
    pub fn never() -> Self {
        Self { interval: None }
    }

    /// A [`HeartBeat`] that first yields one `period` from now and then once per `period`.
    /// A zero period gives [`HeartBeat::never`].
    pub fn new(period: Duration) -> Self {
        if period.is_zero() {
            return Self::never();
        }
        let interval = tokio::time::interval_at(Instant::now() + period, period);
        Self {
            interval: Some(IntervalStream::new(interval)),
        }
    }

    /// Whether this heartbeat ever ticks
    pub fn is_never(&self) -> bool {
        self.interval.is_none()
    }
}

impl Stream for HeartBeat {
    type Item = Instant;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.project();
        match this.interval.as_pin_mut() {
            Some(stream) => stream.poll_next(cx),
            None => Poll::Pending,
        }
    }
}

/// Background task writing a heartbeat frame on channel 0 at every tick of a
/// [`HeartBeat`]
#[derive(Debug)]
pub struct HeartbeatSender {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatSender {
    /// Spawns the sender. Must be called within a tokio runtime.
    pub fn start(transport: Arc<Transport>, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel();
        let mut heartbeat = HeartBeat::new(period);
        debug!(?period, "starting heartbeat sender");

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stopped => break,
                    tick = heartbeat.next() => {
                        if tick.is_none() {
                            break;
                        }
                        if !transport.is_open() {
                            break;
                        }
                        // A peer that stopped reading must not keep the stop signal waiting
                        tokio::select! {
                            biased;
                            _ = &mut stopped => break,
                            result = transport.write_frame(Frame::heartbeat()) => {
                                if let Err(err) = result {
                                    trace!(error = ?err, "heartbeat not sent, stopping");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Whether the background task is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stops the sender and waits for the task to finish. A heartbeat write in
    /// flight is abandoned. Stopping twice is a no-op.
    pub async fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                trace!(error = ?err, "heartbeat task did not finish cleanly");
            }
            debug!("heartbeat sender stopped");
        }
    }
}

impl Drop for HeartbeatSender {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
