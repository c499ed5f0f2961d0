//! All the errors defined by this crate.

use crate::Session;
use std::io::{self, ErrorKind};
use thiserror::Error;

/// An error decoding an RCON frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RconProtocolError {
    /// Fewer bytes were read than the 12 byte frame header.
    #[error("truncated header: {available} bytes available")]
    TruncatedHeader {
        /// Number of valid bytes that were supplied.
        available: usize,
    },

    /// The length field implies a negative payload, or one longer than the bytes read.
    #[error("invalid packet length {length} ({available} bytes available after header)")]
    MalformedLength {
        /// Value of the length field.
        length: i32,
        /// Bytes remaining after the header.
        available: usize,
    },

    /// Exactly two bytes must follow the payload.
    #[error("missing terminator bytes ({remaining} bytes after payload)")]
    MissingTerminator {
        /// Bytes that followed the payload.
        remaining: usize,
    },

    /// The valid length is larger than the buffer it describes.
    #[error("valid length {valid_len} exceeds buffer of {capacity} bytes")]
    BufferOverrun {
        /// Requested number of valid bytes.
        valid_len: usize,
        /// Actual size of the buffer.
        capacity: usize,
    },
}

impl From<RconProtocolError> for io::Error {
    fn from(err: RconProtocolError) -> Self {
        io::Error::new(ErrorKind::InvalidData, err)
    }
}

/// An error from an RCON session.
#[derive(Error, Debug)]
pub enum RconError {
    /// Invalid host or payload supplied by the caller. No I/O was performed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport failure while connecting, writing, reading or closing.
    ///
    /// Timeouts are reported with [`ErrorKind::TimedOut`], and use of a
    /// disconnected session with [`ErrorKind::NotConnected`].
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The server rejected the password.
    ///
    /// The connection is left open; the session is handed back so the caller
    /// can [`disconnect`](Session::disconnect) it.
    #[error("server rejected authentication")]
    AuthRejected(Box<Session>),

    /// The response did not have the expected frame shape.
    #[error(transparent)]
    Protocol(#[from] RconProtocolError),
}

impl RconError {
    /// Take the still-open session out of an [`RconError::AuthRejected`].
    #[must_use]
    pub fn into_rejected_session(self) -> Option<Session> {
        match self {
            RconError::AuthRejected(session) => Some(*session),
            _ => None,
        }
    }
}

impl From<RconError> for io::Error {
    fn from(err: RconError) -> Self {
        match err {
            RconError::Io(err) => err,
            RconError::Protocol(err) => err.into(),
            other @ RconError::InvalidArgument(_) => io::Error::new(ErrorKind::InvalidInput, other),
            other @ RconError::AuthRejected(_) => io::Error::new(ErrorKind::PermissionDenied, other),
        }
    }
}

pub(crate) fn timeout_err<T>() -> io::Result<T> {
    Err(io::Error::new(ErrorKind::TimedOut, "timed out"))
}

pub(crate) fn not_connected_err() -> io::Error {
    io::Error::new(ErrorKind::NotConnected, "session is disconnected")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_maps_to_invalid_data() {
        let err: io::Error = RconProtocolError::MissingTerminator { remaining: 1 }.into();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("terminator"));
    }

    #[test]
    fn rcon_error_io_kinds() {
        let err: io::Error = RconError::InvalidArgument("host".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err: io::Error = RconError::Io(not_connected_err()).into();
        assert_eq!(err.kind(), ErrorKind::NotConnected);

        let err: io::Error = RconError::Protocol(RconProtocolError::MalformedLength {
            length: 4,
            available: 0,
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn timeout_is_timed_out() {
        let err = timeout_err::<()>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[test]
    fn non_auth_error_has_no_session() {
        assert!(RconError::InvalidArgument(String::new())
            .into_rejected_session()
            .is_none());
    }
}
