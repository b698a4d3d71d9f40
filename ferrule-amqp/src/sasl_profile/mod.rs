//! SASL profile used in Connection.StartOk

use bytes::{BufMut, Bytes, BytesMut};
use percent_encoding::percent_decode_str;
use url::Url;

/// Name of the PLAIN mechanism
pub const PLAIN: &str = "PLAIN";

/// Default username used by brokers out of the box
pub const DEFAULT_USERNAME: &str = "guest";

/// Default password used by brokers out of the box
pub const DEFAULT_PASSWORD: &str = "guest";

/// SASL profile
#[derive(Clone, PartialEq, Eq)]
pub enum SaslProfile {
    /// SASL profile for PLAIN mechanism
    Plain {
        /// Username
        username: String,
        /// Password
        password: String,
    },
}

impl std::fmt::Debug for SaslProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain { username, .. } => f
                .debug_struct("Plain")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

impl Default for SaslProfile {
    fn default() -> Self {
        Self::plain(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl<'a> TryFrom<&'a Url> for SaslProfile {
    type Error = ();

    /// Reads percent-encoded credentials from the userinfo part of the url
    fn try_from(value: &'a Url) -> Result<Self, Self::Error> {
        match (value.username(), value.password()) {
            ("", _) | (_, None) => Err(()),
            (username, Some(password)) => {
                let username = percent_decode_str(username)
                    .decode_utf8()
                    .map_err(|_| ())?;
                let password = percent_decode_str(password)
                    .decode_utf8()
                    .map_err(|_| ())?;
                Ok(Self::plain(username, password))
            }
        }
    }
}

impl SaslProfile {
    /// Creates a PLAIN profile
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Plain {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Mechanism name sent in Connection.StartOk
    pub fn mechanism(&self) -> &'static str {
        match self {
            Self::Plain { .. } => PLAIN,
        }
    }

    /// Username carried by the profile
    pub fn username(&self) -> &str {
        match self {
            Self::Plain { username, .. } => username,
        }
    }

    /// Length of the password in octets. The password itself is never exposed
    /// in errors.
    pub fn password_len(&self) -> usize {
        match self {
            Self::Plain { password, .. } => password.len(),
        }
    }

    /// Response sent in Connection.StartOk, `\0username\0password` for PLAIN
    pub fn initial_response(&self) -> Bytes {
        match self {
            Self::Plain { username, password } => {
                let username = username.as_bytes();
                let password = password.as_bytes();
                let mut buf = BytesMut::with_capacity(username.len() + password.len() + 2);
                buf.put_u8(0);
                buf.put_slice(username);
                buf.put_u8(0);
                buf.put_slice(password);
                buf.freeze()
            }
        }
    }
}
