//! Connection states and the transitions between them

use std::fmt;

use parking_lot::Mutex;
use tracing::debug;

use super::Error;

/// Connection states
///
/// ```text
/// NotConnected -> Connecting -> Connected -> Open -> Closing -> Closed
///                      |             |         |
///                      +-------------+---------+------------> Closed
/// ```
///
/// `Closed` is terminal for a session. A forced teardown reaches it from any state,
/// including a handshake that failed: such a connection reports `Closed`, never
/// `NotConnected` again, and a new [`Connection`](super::Connection) is needed to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Constructed, nothing sent yet
    NotConnected,

    /// Protocol header sent, waiting for Connection.Start
    Connecting,

    /// Connection.Start received, tuning and opening in progress
    Connected,

    /// Connection.OpenOk received
    Open,

    /// Connection.Close sent
    Closing,

    /// Transport closed
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotConnected => "not_connected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl ConnectionState {
    /// Whether `next` may directly follow `self`
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (NotConnected, Connecting)
                | (Connecting, Connected)
                | (Connected, Open)
                | (Open, Closing)
                | (_, Closed)
        )
    }

    /// Whether frames may still be written in this state
    pub fn can_send(&self) -> bool {
        !matches!(self, Self::NotConnected | Self::Closed)
    }
}

/// The single mutable source of truth for the state of a connection
#[derive(Debug)]
pub(crate) struct StateCell {
    inner: Mutex<ConnectionState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ConnectionState::NotConnected),
        }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.inner.lock()
    }

    /// Moves to `next` if the current state is a legal predecessor
    pub(crate) fn transition(&self, next: ConnectionState) -> Result<ConnectionState, Error> {
        let mut state = self.inner.lock();
        if !state.can_transition_to(next) {
            return Err(Error::IllegalState {
                expected: next,
                found: *state,
            });
        }
        let prev = std::mem::replace(&mut *state, next);
        debug!(from = %prev, to = %next, "connection state");
        Ok(prev)
    }

    /// Moves to `Closed` from whatever state, returning the previous one
    pub(crate) fn close(&self) -> ConnectionState {
        let prev = std::mem::replace(&mut *self.inner.lock(), ConnectionState::Closed);
        if prev != ConnectionState::Closed {
            debug!(from = %prev, to = %ConnectionState::Closed, "connection state");
        }
        prev
    }

    /// Fails unless the current state is `expected`
    pub(crate) fn expect(&self, expected: ConnectionState) -> Result<(), Error> {
        match self.get() {
            found if found == expected => Ok(()),
            found => Err(Error::IllegalState { expected, found }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionState::*, StateCell};
    use crate::connection::Error;

    #[test]
    fn handshake_progression() {
        let state = StateCell::new();
        assert_eq!(state.get(), NotConnected);
        state.transition(Connecting).unwrap();
        state.transition(Connected).unwrap();
        state.transition(Open).unwrap();
        state.transition(Closing).unwrap();
        state.transition(Closed).unwrap();
        assert!(!state.get().can_send());
    }

    #[test]
    fn close_from_any_state() {
        let state = StateCell::new();
        state.transition(Connecting).unwrap();
        assert_eq!(state.close(), Connecting);
        assert_eq!(state.close(), Closed);
        assert_eq!(state.get(), Closed);
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let state = StateCell::new();
        let err = state.transition(Open).unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalState {
                expected: Open,
                found: NotConnected
            }
        ));
        assert_eq!(state.get(), NotConnected);
    }

    #[test]
    fn closed_is_reachable_from_anywhere_and_terminal() {
        for from in [NotConnected, Connecting, Connected, Open, Closing, Closed] {
            assert!(from.can_transition_to(Closed));
        }
        for next in [NotConnected, Connecting, Connected, Open, Closing] {
            assert!(!Closed.can_transition_to(next));
        }
    }

    #[test]
    fn expect_reports_found_state() {
        let state = StateCell::new();
        assert!(state.expect(NotConnected).is_ok());
        assert!(matches!(
            state.expect(Open),
            Err(Error::IllegalState {
                expected: Open,
                found: NotConnected
            })
        ));
    }
}
