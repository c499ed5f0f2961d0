//! Implementation of an authenticated RCON session.

use crate::{
    errors::{not_connected_err, timeout_err, RconError},
    packet::{self, RconPacketType, Response},
    socket::ReadWriteRconFrame,
    AUTH_FAILURE_ID,
};
use std::{
    sync::atomic::{AtomicI32, Ordering},
    time::Duration,
};
use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    sync::Mutex,
    time::{timeout, timeout_at, Instant},
};
use tracing::{debug, trace};

/// Process-wide source of session request ids.
static REQUEST_ID: AtomicI32 = AtomicI32::new(0);

/// Next request id. Never negative, so it cannot collide with [`AUTH_FAILURE_ID`].
fn next_request_id() -> i32 {
    REQUEST_ID.fetch_add(1, Ordering::Relaxed) & i32::MAX
}

/// Whether `value` contains at least one character above the space character.
///
/// ```
/// assert!(!source_rcon::is_usable(""));
/// assert!(!source_rcon::is_usable("   "));
/// assert!(source_rcon::is_usable(" a "));
/// ```
#[must_use]
pub fn is_usable(value: &str) -> bool {
    value.chars().any(|c| c > ' ')
}

/// Connect to an RCON server and authenticate with `password`.
///
/// # Arguments
/// * `host` - A string slice that holds the hostname of the server to connect to.
/// * `port` - The port to connect to.
/// * `password` - The RCON password.
///
/// # Errors
/// Returns [`RconError::InvalidArgument`] if `host` is blank, [`RconError::Io`] if the
/// connection or the authentication transaction fails, and [`RconError::AuthRejected`]
/// if the server rejects the password. In that last case the connection is still open
/// and must be closed by the caller.
pub async fn open(host: &str, port: u16, password: &str) -> Result<Session, RconError> {
    open_inner(host, port, password, None).await
}

/// Similar to [`open`], but connecting and authenticating must finish within `dur`.
///
/// The returned session uses `dur` as its per-transaction timeout as well.
/// Note that timeouts are not precise, and may vary on the order of milliseconds,
/// because of the way the async event loop works.
///
/// # Errors
/// Returns `Err` on any condition that [`open`] does, and an [`RconError::Io`] with
/// [`std::io::ErrorKind::TimedOut`] if `dur` elapses first.
pub async fn open_with_timeout(
    host: &str,
    port: u16,
    password: &str,
    dur: Duration,
) -> Result<Session, RconError> {
    timeout(dur, open_inner(host, port, password, Some(dur)))
        .await
        .unwrap_or_else(|_| timeout_err().map_err(RconError::from))
}

async fn open_inner(
    host: &str,
    port: u16,
    password: &str,
    dur: Option<Duration>,
) -> Result<Session, RconError> {
    if !is_usable(host) {
        return Err(RconError::InvalidArgument(format!("invalid host: {host:?}")));
    }

    let socket = TcpStream::connect((host, port)).await?;
    let mut session = Session::new(next_request_id(), socket);
    session.set_timeout(dur);

    debug!(host, port, request_id = session.request_id, "connected to rcon server");

    let response = session
        .send(RconPacketType::Auth, password.as_bytes())
        .await?;

    if response.request_id() == AUTH_FAILURE_ID {
        return Err(RconError::AuthRejected(Box::new(session)));
    }

    debug!(request_id = session.request_id, "authenticated");

    Ok(session)
}

/// Struct that stores the connection and request id of an authenticated RCON session.
///
/// Sessions are created with [`open`]. Every request sent on a session carries the
/// same request id. Transactions are serialized: while one write-then-read is in
/// flight, other callers wait for it to finish, so a session can be shared
/// between tasks behind an [`Arc`](std::sync::Arc).
///
/// # Examples
///
/// ```no_run
/// use source_rcon::RconError;
///
/// # async fn run() -> Result<(), RconError> {
/// let session = source_rcon::open("localhost", 27015, "password").await?;
/// let output = session.command("status").await?;
/// println!("{output}");
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    request_id: i32,
    socket: Mutex<Option<TcpStream>>,
    timeout: Option<Duration>,
}

impl Session {
    fn new(request_id: i32, socket: TcpStream) -> Self {
        Self {
            request_id,
            socket: Mutex::new(Some(socket)),
            timeout: None,
        }
    }

    /// The request id used for every packet sent on this session.
    #[must_use]
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// The current per-transaction timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Change the timeout for future transactions.
    ///
    /// This takes `&mut self`, so set the timeout before sharing the session
    /// behind an [`Arc`](std::sync::Arc), or open it with [`open_with_timeout`].
    ///
    /// # Arguments
    /// * `timeout` - an option specifying the duration to wait for a response.
    ///   if none, the session may wait forever.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Run the given command on the server and return its output.
    ///
    /// # Arguments
    /// * `payload` - The command to run. Must contain a non-whitespace character.
    ///
    /// # Errors
    /// Returns [`RconError::InvalidArgument`] for a blank command, otherwise any error
    /// [`send`](Session::send) returns.
    pub async fn command(&self, payload: &str) -> Result<String, RconError> {
        if !is_usable(payload) {
            return Err(RconError::InvalidArgument(format!(
                "invalid payload: {payload:?}"
            )));
        }

        let response = self
            .send(RconPacketType::ExecCommand, payload.as_bytes())
            .await?;

        Ok(response.text().into_owned())
    }

    /// Send one packet of any type and read the response.
    ///
    /// The write and the following read form one transaction; at most one
    /// transaction runs on a session at a time. The response is taken from a
    /// single read of at most [`RECEIVE_BUFFER_SIZE`](crate::RECEIVE_BUFFER_SIZE) bytes.
    ///
    /// If a timeout is set and it elapses once the request is on its way, the
    /// connection is closed, since a late reply would otherwise be read by the
    /// next transaction. Later calls fail with [`std::io::ErrorKind::NotConnected`].
    ///
    /// # Errors
    /// Returns [`RconError::Io`] on a network error, a timeout, or if the session was
    /// disconnected, and [`RconError::Protocol`] if the response is malformed.
    pub async fn send(
        &self,
        packet_type: impl Into<RconPacketType>,
        payload: &[u8],
    ) -> Result<Response, RconError> {
        let packet_type = packet_type.into();
        let deadline = self.timeout.map(|d| Instant::now() + d);

        let mut guard = match deadline {
            None => self.socket.lock().await,
            Some(at) => timeout_at(at, self.socket.lock())
                .await
                .or_else(|_| timeout_err())?,
        };
        let socket = guard.as_mut().ok_or_else(not_connected_err)?;

        let frame = packet::encode(packet_type, payload, self.request_id);
        let transaction = async {
            socket.write_frame(&frame).await?;

            trace!(
                request_id = self.request_id,
                packet_type = i32::from(packet_type),
                bytes = frame.len(),
                "sent rcon packet"
            );

            socket.read_frame().await
        };

        let result = match deadline {
            None => Ok(transaction.await),
            Some(at) => timeout_at(at, transaction).await,
        };

        let Ok(raw) = result else {
            // the reply may still arrive; never let another transaction read it
            drop(guard.take());
            return timeout_err().map_err(RconError::from);
        };
        let raw = raw?;

        trace!(bytes = raw.len(), "received rcon packet");

        Ok(packet::decode(&raw, raw.len())?)
    }

    /// Disconnect from the server and close the RCON connection.
    ///
    /// Waits for an in-flight transaction to finish first.
    ///
    /// # Errors
    /// Returns `Err` if there was an issue closing the connection, or if the
    /// session was already disconnected.
    pub async fn disconnect(&self) -> Result<(), RconError> {
        let mut guard = self.socket.lock().await;
        let mut socket = guard.take().ok_or_else(not_connected_err)?;

        socket.shutdown().await?;

        debug!(request_id = self.request_id, "disconnected from rcon server");

        Ok(())
    }
}
